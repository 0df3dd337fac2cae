//! chart-pipeline: invalidation-driven layout and rendering for chart
//! elements.
//!
//! Elements track which derived states are stale, recompute only those on
//! `draw()`, and notify owners through typed signals. On top of that core
//! sit a linear axis with label overlap and stagger resolution, a
//! virtualized data grid, and a scrollable resource chart.

pub mod api;
pub mod axis;
pub mod core;
pub mod error;
pub mod grid;
pub mod interaction;
pub mod render;
pub mod resource;
pub mod telemetry;

pub use api::{AxisConfig, DataGridConfig, ResourceChartConfig};
pub use error::{ChartError, ChartResult};
