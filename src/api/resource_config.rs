use serde::{Deserialize, Serialize};

use crate::core::bounds::{Padding, SizeSpec};
use crate::core::time_scale::TimeUnit;
use crate::error::{ChartError, ChartResult};
use crate::interaction::KineticPanConfig;
use crate::resource::{Calendar, TimeTrackingMode, ZoomLevelRef};

/// One header row of a zoom level, as written by the user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct LevelSpecConfig {
    #[serde(default)]
    pub unit: Option<TimeUnit>,
    #[serde(default)]
    pub count: Option<u32>,
    /// strftime patterns, widest first.
    #[serde(default)]
    pub formats: Vec<String>,
    #[serde(default)]
    pub height: Option<f64>,
}

impl LevelSpecConfig {
    #[must_use]
    pub fn new(unit: TimeUnit) -> Self {
        Self {
            unit: Some(unit),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_formats<I, S>(mut self, formats: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.formats = formats.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_height(mut self, height: f64) -> Self {
        self.height = Some(height);
        self
    }
}

/// Zoom level definition. Missing unit and count fall back to the first
/// header level, a missing or zero pixel size to 50.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ZoomLevelConfig {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub unit: Option<TimeUnit>,
    #[serde(default)]
    pub count: Option<u32>,
    #[serde(default)]
    pub unit_pix_size: Option<f64>,
    #[serde(default)]
    pub levels: Vec<LevelSpecConfig>,
}

impl ZoomLevelConfig {
    #[must_use]
    pub fn new(levels: Vec<LevelSpecConfig>) -> Self {
        Self {
            levels,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    #[must_use]
    pub fn with_unit(mut self, unit: TimeUnit, count: u32) -> Self {
        self.unit = Some(unit);
        self.count = Some(count);
        self
    }

    #[must_use]
    pub fn with_unit_pix_size(mut self, unit_pix_size: f64) -> Self {
        self.unit_pix_size = Some(unit_pix_size);
        self
    }
}

/// Resource chart bootstrap configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceChartConfig {
    #[serde(default = "default_timeline_height")]
    pub timeline_height: SizeSpec,
    #[serde(default = "default_pix_per_hour")]
    pub pix_per_hour: f64,
    #[serde(default = "default_min_row_height")]
    pub min_row_height: f64,
    #[serde(default = "default_cell_padding")]
    pub cell_padding: Padding,
    /// Every row is sized by the busiest resource.
    #[serde(default = "default_shared_y_scale")]
    pub shared_y_scale: bool,
    /// Rows are sized by working time when it exceeds the booked load.
    #[serde(default)]
    pub track_availability: bool,
    /// Height of the strip marking over-allocated days.
    #[serde(default = "default_conflicts_height")]
    pub conflicts_height: f64,
    #[serde(default)]
    pub calendar: Calendar,
    #[serde(default = "default_scrollbar_size")]
    pub scrollbar_size: f64,
    #[serde(default = "default_zoom_levels")]
    pub zoom_levels: Vec<ZoomLevelConfig>,
    #[serde(default)]
    pub zoom_level: Option<ZoomLevelRef>,
    #[serde(default)]
    pub current_start_date: Option<f64>,
    #[serde(default)]
    pub kinetic_pan: KineticPanConfig,
}

impl Default for ResourceChartConfig {
    fn default() -> Self {
        Self {
            timeline_height: default_timeline_height(),
            pix_per_hour: default_pix_per_hour(),
            min_row_height: default_min_row_height(),
            cell_padding: default_cell_padding(),
            shared_y_scale: default_shared_y_scale(),
            track_availability: false,
            conflicts_height: default_conflicts_height(),
            calendar: Calendar::default(),
            scrollbar_size: default_scrollbar_size(),
            zoom_levels: default_zoom_levels(),
            zoom_level: None,
            current_start_date: None,
            kinetic_pan: KineticPanConfig::default(),
        }
    }
}

impl ResourceChartConfig {
    #[must_use]
    pub fn with_timeline_height(mut self, height: SizeSpec) -> Self {
        self.timeline_height = height;
        self
    }

    #[must_use]
    pub fn with_row_sizing(mut self, pix_per_hour: f64, min_row_height: f64) -> Self {
        self.pix_per_hour = pix_per_hour;
        self.min_row_height = min_row_height;
        self
    }

    #[must_use]
    pub fn with_time_tracking_mode(mut self, mode: TimeTrackingMode) -> Self {
        self.shared_y_scale = mode.per_chart();
        self.track_availability = mode.tracks_availability();
        self
    }

    #[must_use]
    pub fn time_tracking_mode(&self) -> TimeTrackingMode {
        TimeTrackingMode::from_flags(self.shared_y_scale, self.track_availability)
    }

    #[must_use]
    pub fn with_calendar(mut self, calendar: Calendar) -> Self {
        self.calendar = calendar;
        self
    }

    #[must_use]
    pub fn with_zoom_levels(mut self, zoom_levels: Vec<ZoomLevelConfig>) -> Self {
        self.zoom_levels = zoom_levels;
        self
    }

    #[must_use]
    pub fn with_zoom_level(mut self, zoom_level: ZoomLevelRef) -> Self {
        self.zoom_level = Some(zoom_level);
        self
    }

    #[must_use]
    pub fn with_current_start_date(mut self, date: f64) -> Self {
        self.current_start_date = Some(date);
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
        if !self.pix_per_hour.is_finite() || self.pix_per_hour < 0.0 {
            return Err(ChartError::InvalidConfig(
                "pix_per_hour must be finite and >= 0".to_owned(),
            ));
        }
        if !self.min_row_height.is_finite() || self.min_row_height < 0.0 {
            return Err(ChartError::InvalidConfig(
                "min_row_height must be finite and >= 0".to_owned(),
            ));
        }
        if !self.conflicts_height.is_finite() || self.conflicts_height < 0.0 {
            return Err(ChartError::InvalidConfig(
                "conflicts_height must be finite and >= 0".to_owned(),
            ));
        }
        self.calendar.validate()?;
        if !self.scrollbar_size.is_finite() || self.scrollbar_size < 0.0 {
            return Err(ChartError::InvalidConfig(
                "scrollbar_size must be finite and >= 0".to_owned(),
            ));
        }
        if let SizeSpec::Pixels(height) | SizeSpec::Percent(height) = self.timeline_height {
            if !height.is_finite() || height < 0.0 {
                return Err(ChartError::InvalidConfig(
                    "timeline_height must be finite and >= 0".to_owned(),
                ));
            }
        }
        if let Some(date) = self.current_start_date {
            if !date.is_finite() {
                return Err(ChartError::InvalidConfig(
                    "current_start_date must be finite".to_owned(),
                ));
            }
        }
        let config = self.kinetic_pan;
        if !config.decay_per_second.is_finite()
            || config.decay_per_second <= 0.0
            || config.decay_per_second >= 1.0
        {
            return Err(ChartError::InvalidConfig(
                "kinetic pan decay must be in (0, 1)".to_owned(),
            ));
        }
        Ok(())
    }
}

fn default_timeline_height() -> SizeSpec {
    SizeSpec::Pixels(52.0)
}

fn default_pix_per_hour() -> f64 {
    25.0
}

fn default_min_row_height() -> f64 {
    50.0
}

fn default_cell_padding() -> Padding {
    Padding::uniform(2.0)
}

fn default_shared_y_scale() -> bool {
    true
}

fn default_conflicts_height() -> f64 {
    15.0
}

fn default_scrollbar_size() -> f64 {
    10.0
}

/// Days, weeks and months, from the closest zoom out.
#[must_use]
pub fn default_zoom_levels() -> Vec<ZoomLevelConfig> {
    vec![
        ZoomLevelConfig::new(vec![
            LevelSpecConfig::new(TimeUnit::Day).with_formats(["%b %d %A", "%d %a", "%d"]),
        ])
        .with_id("days")
        .with_unit(TimeUnit::Day, 1)
        .with_unit_pix_size(220.0),
        ZoomLevelConfig::new(vec![
            LevelSpecConfig::new(TimeUnit::Day)
                .with_formats(["%d %a", "%d"])
                .with_height(30.0),
            LevelSpecConfig::new(TimeUnit::Week).with_formats(["W%V %b", "W%V"]),
        ])
        .with_id("weeks")
        .with_unit(TimeUnit::Day, 1)
        .with_unit_pix_size(100.0),
        ZoomLevelConfig::new(vec![
            LevelSpecConfig::new(TimeUnit::Day)
                .with_formats(["%d %a", "%d"])
                .with_height(30.0),
            LevelSpecConfig::new(TimeUnit::Week).with_formats(["W%V %b", "W%V"]),
        ])
        .with_id("months")
        .with_unit(TimeUnit::Day, 1)
        .with_unit_pix_size(25.0),
    ]
}

#[cfg(test)]
mod tests {
    use super::{ResourceChartConfig, ZoomLevelConfig};
    use crate::core::bounds::SizeSpec;
    use crate::resource::{Calendar, TimeTrackingMode, ZoomLevelRef};

    #[test]
    fn json_defaults_fill_missing_fields() {
        let config = ResourceChartConfig::from_json_str(r#"{"timeline_height": "10%"}"#)
            .expect("config");
        assert_eq!(config.timeline_height, SizeSpec::Percent(10.0));
        assert_eq!(config.pix_per_hour, 25.0);
        assert_eq!(config.zoom_levels.len(), 3);
    }

    #[test]
    fn zoom_level_ref_accepts_ids_and_indices() {
        let config = ResourceChartConfig::from_json_str(r#"{"zoom_level": "weeks"}"#)
            .expect("config");
        assert_eq!(config.zoom_level, Some(ZoomLevelRef::Id("weeks".to_owned())));
        let config =
            ResourceChartConfig::from_json_str(r#"{"zoom_level": 2}"#).expect("config");
        assert_eq!(config.zoom_level, Some(ZoomLevelRef::Index(2)));
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert!(ResourceChartConfig::from_json_str(r#"{"pix_per_hour": -1}"#).is_err());
        let config = ResourceChartConfig {
            current_start_date: Some(f64::NAN),
            ..ResourceChartConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn calendar_and_tracking_mode_read_from_json() {
        let config = ResourceChartConfig::from_json_str(
            r#"{"shared_y_scale": false, "track_availability": true,
                "calendar": {"weekend_range": [6, 6], "working_minutes": 480}}"#,
        )
        .expect("config");
        assert_eq!(config.time_tracking_mode(), TimeTrackingMode::AvailabilityPerResource);
        assert_eq!(config.calendar.weekend_range, Some((6, 6)));
        assert_eq!(config.calendar.working_minutes, 480.0);
        assert_eq!(config.conflicts_height, 15.0);

        let config = ResourceChartConfig::default()
            .with_time_tracking_mode(TimeTrackingMode::ActivityPerChart);
        assert!(config.shared_y_scale);
        assert!(!config.track_availability);
        assert!(
            ResourceChartConfig::from_json_str(r#"{"calendar": {"working_minutes": 5000}}"#)
                .is_err()
        );
        assert!(ResourceChartConfig::from_json_str(r#"{"conflicts_height": -2}"#).is_err());
    }

    #[test]
    fn level_config_round_trips_through_json() {
        let level = ZoomLevelConfig::default().with_id("x").with_unit_pix_size(10.0);
        let json = serde_json::to_string(&level).expect("json");
        let parsed: ZoomLevelConfig = serde_json::from_str(&json).expect("parse");
        assert_eq!(parsed, level);
    }
}
