use serde_json::Value;
use tracing::trace;

use crate::core::bounds::Bounds;
use crate::core::consistency::{ConsistencyState, ConsistencyStates, Signal, Signals};
use crate::core::data::TableDataSource;
use crate::core::invalidation::{Invalidatable, InvalidationState};
use crate::error::{ChartResult, WarningCode, report_warning};
use crate::render::{Color, LayerId, TextHAlign, TextPrimitive, VectorSurface};

const COLUMN_STATES: ConsistencyStates = ConsistencyStates::from_state(ConsistencyState::GridPosition)
    .with_state(ConsistencyState::Appearance);

pub const MIN_COLUMN_WIDTH: f64 = 2.0;
const CELL_PADDING_PX: f64 = 5.0;

/// One realized row as laid out by the grid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VisibleRow {
    pub index: usize,
    pub top: f64,
    pub height: f64,
}

/// Independently positioned, independently clipped grid column.
#[derive(Debug)]
pub struct Column {
    id: String,
    title: String,
    field: String,
    width: f64,
    bounds: Option<Bounds>,
    layer: Option<LayerId>,
    detached: bool,
    font_size_px: f64,
    text_color: Color,
    draws: u64,
    invalidation: InvalidationState,
}

impl Column {
    #[must_use]
    pub fn new(id: impl Into<String>, field: impl Into<String>, width: f64) -> Self {
        let id = id.into();
        Self {
            title: id.clone(),
            id,
            field: field.into(),
            width: width.max(MIN_COLUMN_WIDTH),
            bounds: None,
            layer: None,
            detached: false,
            font_size_px: 11.0,
            text_color: Color::rgb(0.13, 0.13, 0.13),
            draws: 0,
            invalidation: InvalidationState::new(
                "grid_column",
                COLUMN_STATES,
                Signals::from_signal(Signal::NeedsRedraw),
            ),
        }
    }

    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn field(&self) -> &str {
        &self.field
    }

    #[must_use]
    pub fn width(&self) -> f64 {
        self.width
    }

    /// Changes the width, invalidating this column only.
    pub fn set_width(&mut self, width: f64) -> bool {
        if !width.is_finite() {
            report_warning(WarningCode::IgnoredInvalidValue, self.invalidation.source());
            return false;
        }
        let width = width.max(MIN_COLUMN_WIDTH);
        if self.width == width {
            return false;
        }
        self.width = width;
        self.invalidation
            .invalidate(ConsistencyState::GridPosition, Signal::NeedsRedraw);
        true
    }

    #[must_use]
    pub fn bounds(&self) -> Option<Bounds> {
        self.bounds
    }

    /// Places the column; only an actual move invalidates it.
    pub fn set_bounds(&mut self, bounds: Bounds) {
        if self.bounds != Some(bounds) {
            self.bounds = Some(bounds);
            self.invalidation
                .invalidate(ConsistencyState::GridPosition, Signals::none());
        }
    }

    /// Redraw passes performed so far.
    #[must_use]
    pub fn draws(&self) -> u64 {
        self.draws
    }

    fn cell_text(value: Option<&Value>) -> String {
        match value {
            None | Some(Value::Null) => String::new(),
            Some(Value::String(text)) => text.clone(),
            Some(other) => other.to_string(),
        }
    }

    /// Draws header and cells. `rows_changed` forces a redraw even when the
    /// column itself is consistent.
    pub fn draw(
        &mut self,
        surface: &mut dyn VectorSurface,
        parent: LayerId,
        header_height: f64,
        rows: &[VisibleRow],
        data: &TableDataSource,
        rows_changed: bool,
    ) -> ChartResult<()> {
        if self.invalidation.is_consistent() && !rows_changed {
            return Ok(());
        }
        let Some(bounds) = self.bounds else {
            return Ok(());
        };
        let layer = *self
            .layer
            .get_or_insert_with(|| surface.create_layer(Some(parent)));
        if self.detached {
            surface.set_parent(layer, Some(parent));
            self.detached = false;
        }
        surface.set_clip(layer, Some(bounds));
        surface.clear_texts(layer);

        let x = bounds.left + CELL_PADDING_PX;
        if !self.title.is_empty() && header_height > 0.0 {
            surface.draw_text(
                layer,
                TextPrimitive::new(
                    self.title.clone(),
                    x,
                    bounds.top + (header_height - self.font_size_px).max(0.0) / 2.0,
                    self.font_size_px,
                    self.text_color,
                    TextHAlign::Left,
                ),
            )?;
        }
        for row in rows {
            let text = Self::cell_text(data.field(row.index, &self.field));
            if text.is_empty() {
                continue;
            }
            surface.draw_text(
                layer,
                TextPrimitive::new(
                    text,
                    x,
                    row.top + (row.height - self.font_size_px).max(0.0) / 2.0,
                    self.font_size_px,
                    self.text_color,
                    TextHAlign::Left,
                ),
            )?;
        }
        self.draws = self.draws.saturating_add(1);
        trace!(column = %self.id, rows = rows.len(), "drew grid column");
        self.invalidation.mark_consistent(COLUMN_STATES);
        Ok(())
    }

    /// Detaches the column layer; the next draw re-parents it.
    pub fn remove(&mut self, surface: &mut dyn VectorSurface) {
        if let Some(layer) = self.layer {
            surface.remove_layer(layer);
            self.detached = true;
            self.invalidation
                .invalidate(ConsistencyState::GridPosition, Signals::none());
        }
    }
}

impl Invalidatable for Column {
    fn invalidation(&self) -> &InvalidationState {
        &self.invalidation
    }

    fn invalidation_mut(&mut self) -> &mut InvalidationState {
        &mut self.invalidation
    }
}
