use serde::{Deserialize, Serialize};

use crate::error::{ChartError, ChartResult};

/// Windows reports wheel deltas in lines rather than pixels.
pub const WINDOWS_WHEEL_MULTIPLIER: f64 = 15.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum WheelPlatform {
    Windows,
    #[default]
    Other,
}

/// Raw wheel event as delivered by the host.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WheelInput {
    pub delta_x: f64,
    pub delta_y: f64,
    #[serde(default)]
    pub platform: WheelPlatform,
}

impl WheelInput {
    #[must_use]
    pub const fn new(delta_x: f64, delta_y: f64, platform: WheelPlatform) -> Self {
        Self {
            delta_x,
            delta_y,
            platform,
        }
    }
}

/// Pixel deltas with the platform scaling applied.
pub fn normalize_wheel_deltas(input: WheelInput) -> ChartResult<(f64, f64)> {
    if !input.delta_x.is_finite() || !input.delta_y.is_finite() {
        return Err(ChartError::InvalidData(
            "wheel deltas must be finite".to_owned(),
        ));
    }
    let scale = match input.platform {
        WheelPlatform::Windows => WINDOWS_WHEEL_MULTIPLIER,
        WheelPlatform::Other => 1.0,
    };
    Ok((input.delta_x * scale, input.delta_y * scale))
}

#[cfg(test)]
mod tests {
    use super::{WheelInput, WheelPlatform, normalize_wheel_deltas};

    #[test]
    fn windows_deltas_are_scaled() {
        let deltas =
            normalize_wheel_deltas(WheelInput::new(2.0, -1.0, WheelPlatform::Windows)).expect("deltas");
        assert_eq!(deltas, (30.0, -15.0));
        let deltas =
            normalize_wheel_deltas(WheelInput::new(2.0, -1.0, WheelPlatform::Other)).expect("deltas");
        assert_eq!(deltas, (2.0, -1.0));
    }

    #[test]
    fn non_finite_deltas_are_rejected() {
        let err = normalize_wheel_deltas(WheelInput::new(f64::NAN, 0.0, WheelPlatform::Other))
            .expect_err("finite");
        assert!(format!("{err}").contains("wheel deltas"));
    }
}
