mod deferred;
mod drag;
mod frame;
mod wheel;

pub use deferred::{DeferredRetry, RetryStatus};
pub use drag::{DRAG_HYSTERESIS_PX, DragFrame, DragLimits, DragSession};
pub use frame::FrameCoalescer;
pub use wheel::{WINDOWS_WHEEL_MULTIPLIER, WheelInput, WheelPlatform, normalize_wheel_deltas};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InteractionMode {
    Idle,
    Dragging,
}

/// Tuning for deterministic kinetic pan stepping.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KineticPanConfig {
    /// Multiplicative velocity decay per second.
    pub decay_per_second: f64,
    /// Kinetic pan stops when `abs(velocity)` drops below this threshold.
    pub stop_velocity_abs: f64,
}

impl Default for KineticPanConfig {
    fn default() -> Self {
        Self {
            decay_per_second: 0.85,
            stop_velocity_abs: 0.01,
        }
    }
}

/// Public kinetic pan runtime state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct KineticPanState {
    pub active: bool,
    pub velocity_px_per_sec: f64,
}

/// Pointer and inertia state shared by every pannable element.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InteractionState {
    mode: InteractionMode,
    kinetic_pan_config: KineticPanConfig,
    kinetic_pan: KineticPanState,
    cursor_x: f64,
    cursor_y: f64,
    pointer_inside: bool,
}

impl Default for InteractionState {
    fn default() -> Self {
        Self {
            mode: InteractionMode::Idle,
            kinetic_pan_config: KineticPanConfig::default(),
            kinetic_pan: KineticPanState::default(),
            cursor_x: 0.0,
            cursor_y: 0.0,
            pointer_inside: false,
        }
    }
}

impl InteractionState {
    #[must_use]
    pub fn mode(self) -> InteractionMode {
        self.mode
    }

    #[must_use]
    pub fn kinetic_pan_config(self) -> KineticPanConfig {
        self.kinetic_pan_config
    }

    pub fn set_kinetic_pan_config(&mut self, config: KineticPanConfig) {
        self.kinetic_pan_config = config;
    }

    #[must_use]
    pub fn kinetic_pan_state(self) -> KineticPanState {
        self.kinetic_pan
    }

    pub fn start_kinetic_pan(&mut self, velocity_px_per_sec: f64) {
        if !velocity_px_per_sec.is_finite()
            || velocity_px_per_sec.abs() < self.kinetic_pan_config.stop_velocity_abs
        {
            self.stop_kinetic_pan();
            return;
        }
        self.kinetic_pan.active = true;
        self.kinetic_pan.velocity_px_per_sec = velocity_px_per_sec;
    }

    pub fn stop_kinetic_pan(&mut self) {
        self.kinetic_pan.active = false;
        self.kinetic_pan.velocity_px_per_sec = 0.0;
    }

    /// Advances kinetic pan and returns the pixel displacement to apply.
    ///
    /// Returns `None` when kinetic pan is not active.
    pub fn step_kinetic_pan(&mut self, delta_seconds: f64) -> Option<f64> {
        if !self.kinetic_pan.active {
            return None;
        }

        let displacement = self.kinetic_pan.velocity_px_per_sec * delta_seconds;
        let decay = self.kinetic_pan_config.decay_per_second.powf(delta_seconds);
        self.kinetic_pan.velocity_px_per_sec *= decay;

        if self.kinetic_pan.velocity_px_per_sec.abs() < self.kinetic_pan_config.stop_velocity_abs {
            self.stop_kinetic_pan();
        }

        Some(displacement)
    }

    #[must_use]
    pub fn cursor(self) -> (f64, f64) {
        (self.cursor_x, self.cursor_y)
    }

    #[must_use]
    pub fn pointer_inside(self) -> bool {
        self.pointer_inside
    }

    pub fn on_pointer_move(&mut self, x: f64, y: f64) {
        self.cursor_x = x;
        self.cursor_y = y;
        self.pointer_inside = true;
    }

    pub fn on_pointer_leave(&mut self) {
        self.pointer_inside = false;
    }

    pub fn on_drag_start(&mut self) {
        self.stop_kinetic_pan();
        self.mode = InteractionMode::Dragging;
    }

    pub fn on_drag_end(&mut self) {
        self.mode = InteractionMode::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::{InteractionMode, InteractionState, KineticPanConfig};

    #[test]
    fn kinetic_pan_decays_and_stops() {
        let mut state = InteractionState::default();
        state.set_kinetic_pan_config(KineticPanConfig {
            decay_per_second: 0.5,
            stop_velocity_abs: 15.0,
        });
        state.start_kinetic_pan(40.0);

        let first = state.step_kinetic_pan(1.0).expect("active");
        assert!((first - 40.0).abs() <= 1e-9);
        assert!((state.kinetic_pan_state().velocity_px_per_sec - 20.0).abs() <= 1e-9);

        let second = state.step_kinetic_pan(1.0).expect("still active");
        assert!((second - 20.0).abs() <= 1e-9);
        assert!(!state.kinetic_pan_state().active);
        assert!(state.step_kinetic_pan(1.0).is_none());
    }

    #[test]
    fn slow_release_does_not_start_inertia() {
        let mut state = InteractionState::default();
        state.start_kinetic_pan(0.001);
        assert!(!state.kinetic_pan_state().active);
        state.start_kinetic_pan(f64::NAN);
        assert!(!state.kinetic_pan_state().active);
    }

    #[test]
    fn drag_start_cancels_inertia() {
        let mut state = InteractionState::default();
        state.start_kinetic_pan(300.0);
        state.on_drag_start();
        assert_eq!(state.mode(), InteractionMode::Dragging);
        assert!(!state.kinetic_pan_state().active);
        state.on_drag_end();
        assert_eq!(state.mode(), InteractionMode::Idle);
    }
}
