use serde::{Deserialize, Serialize};

use crate::axis::{OverlapMode, TickPosition};
use crate::core::bounds::{Orientation, Padding, SizeSpec};
use crate::error::{ChartError, ChartResult};
use crate::render::{Color, Stroke};

/// Axis appearance and label layout, as accepted from JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AxisConfig {
    pub enabled: bool,
    pub orientation: Orientation,
    pub labels_enabled: bool,
    pub minor_labels_enabled: bool,
    pub overlap_mode: OverlapMode,
    pub stagger_mode: bool,
    /// Fixed number of label lines; auto-detected when absent.
    pub stagger_lines: Option<usize>,
    pub stagger_max_lines: Option<usize>,
    pub draw_first_label: bool,
    pub draw_last_label: bool,
    pub ticks_enabled: bool,
    pub tick_length: f64,
    pub minor_ticks_enabled: bool,
    pub minor_tick_length: f64,
    pub tick_position: TickPosition,
    pub width: SizeSpec,
    pub padding: Padding,
    pub title: Option<String>,
    pub stroke: Stroke,
    pub label_color: Color,
    pub font_size_px: f64,
}

impl Default for AxisConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            orientation: Orientation::Bottom,
            labels_enabled: true,
            minor_labels_enabled: false,
            overlap_mode: OverlapMode::NoOverlap,
            stagger_mode: false,
            stagger_lines: None,
            stagger_max_lines: None,
            draw_first_label: true,
            draw_last_label: true,
            ticks_enabled: true,
            tick_length: 6.0,
            minor_ticks_enabled: false,
            minor_tick_length: 4.0,
            tick_position: TickPosition::Outside,
            width: SizeSpec::Auto,
            padding: Padding::default(),
            title: None,
            stroke: Stroke::new(Color::rgb(0.8, 0.8, 0.8), 1.0),
            label_color: Color::rgb(0.13, 0.13, 0.13),
            font_size_px: 11.0,
        }
    }
}

impl AxisConfig {
    #[must_use]
    pub fn with_orientation(mut self, orientation: Orientation) -> Self {
        self.orientation = orientation;
        self
    }

    #[must_use]
    pub fn with_overlap_mode(mut self, mode: OverlapMode) -> Self {
        self.overlap_mode = mode;
        self
    }

    #[must_use]
    pub fn with_stagger(mut self, lines: Option<usize>, max_lines: Option<usize>) -> Self {
        self.stagger_mode = true;
        self.stagger_lines = lines;
        self.stagger_max_lines = max_lines;
        self
    }

    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn from_json_str(input: &str) -> ChartResult<Self> {
        let config: Self = serde_json::from_str(input)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json_pretty(&self) -> ChartResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> ChartResult<()> {
        for (name, length) in [
            ("tick_length", self.tick_length),
            ("minor_tick_length", self.minor_tick_length),
        ] {
            if !length.is_finite() || length < 0.0 {
                return Err(ChartError::InvalidConfig(format!(
                    "{name} must be finite and >= 0"
                )));
            }
        }
        if !self.font_size_px.is_finite() || self.font_size_px <= 0.0 {
            return Err(ChartError::InvalidConfig(
                "font_size_px must be finite and > 0".to_owned(),
            ));
        }
        if self.stagger_lines == Some(0) || self.stagger_max_lines == Some(0) {
            return Err(ChartError::InvalidConfig(
                "stagger line counts must be >= 1".to_owned(),
            ));
        }
        if let SizeSpec::Pixels(width) | SizeSpec::Percent(width) = self.width {
            if !width.is_finite() || width < 0.0 {
                return Err(ChartError::InvalidConfig(
                    "width must be finite and >= 0".to_owned(),
                ));
            }
        }
        self.stroke.validate()?;
        self.label_color.validate()?;
        Ok(())
    }
}
