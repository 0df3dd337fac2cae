use serde::{Deserialize, Serialize};

/// Visible sub-range of the scrollable resource content.
///
/// `current_start_pixel` and `current_y_pixel` are measured from the content
/// origin; both stay inside `[0, full - viewport]` after every draw.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct ViewportState {
    /// Date at the left edge; `None` until the first range pass.
    pub current_start_value: Option<f64>,
    pub current_start_pixel: f64,
    pub full_pixel_extent: f64,
    pub current_y_pixel: f64,
    pub current_y_ratio: f64,
    pub full_pixel_height: f64,
    pub viewport_width: f64,
    pub viewport_height: f64,
}

impl ViewportState {
    #[must_use]
    pub fn max_start_pixel(&self) -> f64 {
        (self.full_pixel_extent - self.viewport_width).max(0.0)
    }

    #[must_use]
    pub fn max_y_pixel(&self) -> f64 {
        (self.full_pixel_height - self.viewport_height).max(0.0)
    }

    /// Horizontal thumb range as content fractions.
    #[must_use]
    pub fn x_ratios(&self) -> (f64, f64) {
        let end = (self.current_start_pixel + self.viewport_width).min(self.full_pixel_extent);
        (
            ratio_or_zero(self.current_start_pixel, self.full_pixel_extent),
            ratio_or_zero(end, self.full_pixel_extent),
        )
    }

    #[must_use]
    pub fn y_ratios(&self) -> (f64, f64) {
        let end = (self.current_y_pixel + self.viewport_height).min(self.full_pixel_height);
        (
            ratio_or_zero(self.current_y_pixel, self.full_pixel_height),
            ratio_or_zero(end, self.full_pixel_height),
        )
    }
}

/// Clamps a window start so `[start, start + viewport]` stays inside
/// `[0, full]`; a viewport at least as large as the content pins to 0.
#[must_use]
pub fn clamp_start_pixel(start: f64, full: f64, viewport: f64) -> f64 {
    if !start.is_finite() || !full.is_finite() || viewport >= full {
        return 0.0;
    }
    start.clamp(0.0, full - viewport)
}

/// `value / full`, or 0 when the extent is empty.
#[must_use]
pub fn ratio_or_zero(value: f64, full: f64) -> f64 {
    if full > 0.0 && value.is_finite() && full.is_finite() {
        value / full
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::{ViewportState, clamp_start_pixel, ratio_or_zero};

    #[test]
    fn start_is_clamped_to_the_trailing_edge() {
        assert_eq!(clamp_start_pixel(-5.0, 1000.0, 800.0), 0.0);
        assert_eq!(clamp_start_pixel(150.0, 1000.0, 800.0), 150.0);
        assert_eq!(clamp_start_pixel(250.0, 1000.0, 800.0), 200.0);
        assert_eq!(clamp_start_pixel(250.0, 500.0, 800.0), 0.0);
        assert_eq!(clamp_start_pixel(f64::NAN, 1000.0, 800.0), 0.0);
    }

    #[test]
    fn zero_extent_ratio_is_zero() {
        assert_eq!(ratio_or_zero(10.0, 0.0), 0.0);
        assert_eq!(ratio_or_zero(250.0, 1000.0), 0.25);
    }

    #[test]
    fn ratios_follow_the_window() {
        let viewport = ViewportState {
            current_start_pixel: 100.0,
            full_pixel_extent: 1000.0,
            viewport_width: 800.0,
            full_pixel_height: 100.0,
            viewport_height: 300.0,
            ..ViewportState::default()
        };
        assert_eq!(viewport.x_ratios(), (0.1, 0.9));
        assert_eq!(viewport.y_ratios(), (0.0, 1.0));
        assert_eq!(viewport.max_start_pixel(), 200.0);
        assert_eq!(viewport.max_y_pixel(), 0.0);
    }
}
