use serde::{Deserialize, Serialize};

/// Pointer travel below which a press is not yet a drag.
pub const DRAG_HYSTERESIS_PX: f64 = 3.0;

/// Rectangle the dragged content origin may occupy.
///
/// The content origin sits at `(-start_pixel, -y_pixel)`, so panning to the
/// far end puts it at `-full + viewport`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct DragLimits {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl DragLimits {
    #[must_use]
    pub fn for_viewport(full_width: f64, viewport_width: f64, full_height: f64, viewport_height: f64) -> Self {
        let width = (full_width - viewport_width).max(0.0);
        let height = (full_height - viewport_height).max(0.0);
        Self {
            left: -width,
            top: -height,
            width,
            height,
        }
    }

    fn clamp(self, x: f64, y: f64) -> (f64, f64) {
        (
            x.clamp(self.left, self.left + self.width),
            y.clamp(self.top, self.top + self.height),
        )
    }
}

/// Viewport target produced by one drag frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DragFrame {
    pub start_pixel: f64,
    pub y_pixel: f64,
}

/// One pointer drag from press to release.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragSession {
    pointer_start: (f64, f64),
    origin: (f64, f64),
    limits: DragLimits,
    active: bool,
    last_sample: Option<(f64, f64)>,
    velocity_px_per_sec: f64,
}

impl DragSession {
    #[must_use]
    pub fn start(pointer_x: f64, pointer_y: f64, start_pixel: f64, y_pixel: f64, limits: DragLimits) -> Self {
        Self {
            pointer_start: (pointer_x, pointer_y),
            origin: (-start_pixel, -y_pixel),
            limits,
            active: false,
            last_sample: None,
            velocity_px_per_sec: 0.0,
        }
    }

    #[must_use]
    pub fn limits(&self) -> DragLimits {
        self.limits
    }

    /// `true` once the pointer left the hysteresis radius.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Viewport target for the pointer at `(x, y)` sampled at `time_seconds`.
    pub fn update(&mut self, pointer_x: f64, pointer_y: f64, time_seconds: f64) -> Option<DragFrame> {
        let dx = pointer_x - self.pointer_start.0;
        let dy = pointer_y - self.pointer_start.1;
        if !dx.is_finite() || !dy.is_finite() {
            return None;
        }
        if !self.active {
            if dx * dx + dy * dy <= DRAG_HYSTERESIS_PX * DRAG_HYSTERESIS_PX {
                return None;
            }
            self.active = true;
        }
        let (x, y) = self.limits.clamp(self.origin.0 + dx, self.origin.1 + dy);
        let frame = DragFrame {
            start_pixel: -x,
            y_pixel: -y,
        };
        if let Some((last_time, last_pixel)) = self.last_sample {
            let elapsed = time_seconds - last_time;
            if elapsed > 0.0 {
                self.velocity_px_per_sec = (frame.start_pixel - last_pixel) / elapsed;
            }
        }
        self.last_sample = Some((time_seconds, frame.start_pixel));
        Some(frame)
    }

    /// Horizontal start-pixel velocity between the last two samples.
    #[must_use]
    pub fn release_velocity(&self) -> f64 {
        if self.active {
            self.velocity_px_per_sec
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{DragLimits, DragSession};

    #[test]
    fn limits_cover_the_scrollable_range() {
        let limits = DragLimits::for_viewport(1000.0, 800.0, 300.0, 400.0);
        assert_eq!(limits.left, -200.0);
        assert_eq!(limits.width, 200.0);
        assert_eq!(limits.top, 0.0);
        assert_eq!(limits.height, 0.0);
    }

    #[test]
    fn small_moves_stay_below_hysteresis() {
        let limits = DragLimits::for_viewport(1000.0, 800.0, 0.0, 0.0);
        let mut session = DragSession::start(100.0, 100.0, 50.0, 0.0, limits);
        assert!(session.update(102.0, 101.0, 0.0).is_none());
        assert!(!session.is_active());
    }

    #[test]
    fn dragging_right_moves_the_viewport_left_and_clamps() {
        let limits = DragLimits::for_viewport(1000.0, 800.0, 0.0, 0.0);
        let mut session = DragSession::start(100.0, 100.0, 50.0, 0.0, limits);
        let frame = session.update(120.0, 100.0, 0.0).expect("frame");
        assert_eq!(frame.start_pixel, 30.0);
        let frame = session.update(400.0, 100.0, 0.1).expect("frame");
        assert_eq!(frame.start_pixel, 0.0);
        let frame = session.update(-400.0, 100.0, 0.2).expect("frame");
        assert_eq!(frame.start_pixel, 200.0);
        assert!((session.release_velocity() - 2000.0).abs() <= 1e-9);
    }
}
