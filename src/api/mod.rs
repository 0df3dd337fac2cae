//! Serializable configuration for the chart elements.
//!
//! Every config deserializes with defaults for missing fields, validates
//! before use, and is applied by the element's `setup` in one signal batch.

mod axis_config;
mod grid_config;
mod resource_config;

pub use axis_config::AxisConfig;
pub use grid_config::{ColumnConfig, DataGridConfig};
pub use resource_config::{
    LevelSpecConfig, ResourceChartConfig, ZoomLevelConfig, default_zoom_levels,
};
