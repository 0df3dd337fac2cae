use serde::{Deserialize, Serialize};

use crate::error::{ChartError, ChartResult};
use crate::grid::{DEFAULT_HEADER_HEIGHT, DEFAULT_ROW_HEIGHT};
use crate::render::Color;

/// Column of a data grid. Existing columns with the same id are resized
/// rather than replaced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnConfig {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    /// Row field rendered in the cells.
    pub field: String,
    #[serde(default = "default_column_width")]
    pub width: f64,
}

impl ColumnConfig {
    #[must_use]
    pub fn new(id: impl Into<String>, field: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: None,
            field: field.into(),
            width: default_column_width(),
        }
    }

    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    #[must_use]
    pub fn with_width(mut self, width: f64) -> Self {
        self.width = width;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataGridConfig {
    #[serde(default = "default_header_height")]
    pub header_height: f64,
    #[serde(default = "default_row_height")]
    pub default_row_height: f64,
    /// Row field holding a per-row height override.
    #[serde(default = "default_height_field")]
    pub height_field: String,
    #[serde(default = "default_row_stroke_thickness")]
    pub row_stroke_thickness: f64,
    #[serde(default = "default_row_stroke_color")]
    pub row_stroke_color: Color,
    #[serde(default = "default_odd_fill")]
    pub odd_fill: Color,
    #[serde(default = "default_even_fill")]
    pub even_fill: Color,
    #[serde(default = "default_selected_fill")]
    pub selected_fill: Color,
    #[serde(default)]
    pub columns: Vec<ColumnConfig>,
}

impl Default for DataGridConfig {
    fn default() -> Self {
        Self {
            header_height: default_header_height(),
            default_row_height: default_row_height(),
            height_field: default_height_field(),
            row_stroke_thickness: default_row_stroke_thickness(),
            row_stroke_color: default_row_stroke_color(),
            odd_fill: default_odd_fill(),
            even_fill: default_even_fill(),
            selected_fill: default_selected_fill(),
            columns: Vec::new(),
        }
    }
}

impl DataGridConfig {
    #[must_use]
    pub fn with_column(mut self, column: ColumnConfig) -> Self {
        self.columns.push(column);
        self
    }

    #[must_use]
    pub fn with_row_heights(mut self, header_height: f64, default_row_height: f64) -> Self {
        self.header_height = header_height;
        self.default_row_height = default_row_height;
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
        for (name, value) in [
            ("header_height", self.header_height),
            ("default_row_height", self.default_row_height),
            ("row_stroke_thickness", self.row_stroke_thickness),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ChartError::InvalidConfig(format!(
                    "{name} must be finite and >= 0"
                )));
            }
        }
        if self.height_field.is_empty() {
            return Err(ChartError::InvalidConfig(
                "height_field must not be empty".to_owned(),
            ));
        }
        for color in [
            self.row_stroke_color,
            self.odd_fill,
            self.even_fill,
            self.selected_fill,
        ] {
            color.validate()?;
        }
        for (index, column) in self.columns.iter().enumerate() {
            if column.id.is_empty() {
                return Err(ChartError::InvalidConfig(format!(
                    "column {index} has an empty id"
                )));
            }
            if !column.width.is_finite() || column.width < 0.0 {
                return Err(ChartError::InvalidConfig(format!(
                    "column `{}` width must be finite and >= 0",
                    column.id
                )));
            }
            if self.columns[..index].iter().any(|other| other.id == column.id) {
                return Err(ChartError::InvalidConfig(format!(
                    "duplicate column id `{}`",
                    column.id
                )));
            }
        }
        Ok(())
    }
}

fn default_header_height() -> f64 {
    DEFAULT_HEADER_HEIGHT
}

fn default_row_height() -> f64 {
    DEFAULT_ROW_HEIGHT
}

fn default_height_field() -> String {
    "height".to_owned()
}

fn default_row_stroke_thickness() -> f64 {
    1.0
}

fn default_row_stroke_color() -> Color {
    Color::rgb(0.8, 0.8, 0.8)
}

fn default_odd_fill() -> Color {
    Color::rgb(1.0, 1.0, 1.0)
}

fn default_even_fill() -> Color {
    Color::rgb(0.98, 0.98, 0.98)
}

fn default_selected_fill() -> Color {
    Color::rgb(0.85, 0.91, 0.98)
}

fn default_column_width() -> f64 {
    100.0
}
