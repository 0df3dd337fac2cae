//! Virtualized data grid: only the rows inside the visible window are laid
//! out, batched into a few fill paths, and hit-tested through a cumulative
//! height cache.

mod column;
mod height_cache;
mod row_fills;

pub use column::{Column, MIN_COLUMN_WIDTH, VisibleRow};
pub use height_cache::RowHeightCache;
pub use row_fills::{RowFillPaths, RowFills};

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, trace};

use crate::api::DataGridConfig;
use crate::core::bounds::Bounds;
use crate::core::consistency::{ConsistencyState, ConsistencyStates, Signal, Signals};
use crate::core::data::TableDataSource;
use crate::core::element::{Boundable, Drawable, ElementState};
use crate::core::invalidation::{Invalidatable, InvalidationState};
use crate::core::signal::SignalQueue;
use crate::error::{ChartResult, WarningCode, report_warning};
use crate::render::{Color, Fill, LayerId, PathId, Stroke, VectorSurface};

const SOURCE: &str = "data_grid";

/// Meta key toggled by row selection.
pub const SELECTED_META: &str = "selected";

const GRID_STATES: ConsistencyStates = ConsistencyStates::from_state(ConsistencyState::GridRedraw)
    .with_state(ConsistencyState::GridPosition)
    .with_state(ConsistencyState::GridHover)
    .with_state(ConsistencyState::GridClick);

const ALL_GRID_STATES: ConsistencyStates = GRID_STATES
    .with_state(ConsistencyState::Appearance)
    .with_state(ConsistencyState::Bounds);

const ROWS_STATES: ConsistencyStates = ConsistencyStates::from_state(ConsistencyState::GridRedraw)
    .with_state(ConsistencyState::GridPosition);

pub const DEFAULT_ROW_HEIGHT: f64 = 20.0;
pub const DEFAULT_HEADER_HEIGHT: f64 = 25.0;

/// Extents of the highlighted row.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RowHover {
    pub index: usize,
    pub start_y: f64,
    pub end_y: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RowEvent {
    Hover { index: usize, start_y: f64, end_y: f64 },
    Click { index: usize, selected: bool },
}

#[derive(Debug, Default)]
struct GridLayers {
    rows: Option<LayerId>,
    cells: Option<LayerId>,
    hover: Option<PathId>,
}

pub struct DataGrid {
    element: ElementState,
    data: TableDataSource,
    data_queue: SignalQueue,
    columns: IndexMap<String, Column>,
    header_height: f64,
    default_row_height: f64,
    height_field: String,
    fills: RowFills,
    hover_fill: Fill,
    scroll_position: f64,
    start_index: usize,
    end_index: Option<usize>,
    vertical_offset: f64,
    content_cache: RowHeightCache,
    content_dirty: bool,
    height_cache: RowHeightCache,
    visible_rows: Vec<VisibleRow>,
    hovered: Option<RowHover>,
    selected: Option<usize>,
    row_paths: RowFillPaths,
    layers: GridLayers,
    pixel_bounds: Option<Bounds>,
    row_passes: u64,
}

impl fmt::Debug for DataGrid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataGrid")
            .field("rows", &self.data.len())
            .field("columns", &self.columns.len())
            .field("start_index", &self.start_index)
            .field("end_index", &self.end_index)
            .field("dirty", &self.element.invalidation().dirty_states())
            .finish_non_exhaustive()
    }
}

impl Default for DataGrid {
    fn default() -> Self {
        Self::new(TableDataSource::default())
    }
}

impl DataGrid {
    #[must_use]
    pub fn new(mut data: TableDataSource) -> Self {
        let data_queue = SignalQueue::new();
        data.listen_signals(Box::new(data_queue.clone()));
        Self {
            element: ElementState::new(SOURCE, GRID_STATES, Signals::none()),
            data,
            data_queue,
            columns: IndexMap::new(),
            header_height: DEFAULT_HEADER_HEIGHT,
            default_row_height: DEFAULT_ROW_HEIGHT,
            height_field: "height".to_owned(),
            fills: RowFills {
                odd: Fill::solid(Color::rgb(1.0, 1.0, 1.0)),
                even: Fill::solid(Color::rgb(0.98, 0.98, 0.98)),
                selected: Fill::solid(Color::rgb(0.85, 0.91, 0.98)),
                row_stroke: Stroke::new(Color::rgb(0.8, 0.8, 0.8), 1.0),
            },
            hover_fill: Fill::solid(Color::rgba(0.93, 0.93, 0.93, 0.8)),
            scroll_position: 0.0,
            start_index: 0,
            end_index: None,
            vertical_offset: 0.0,
            content_cache: RowHeightCache::new(),
            content_dirty: true,
            height_cache: RowHeightCache::new(),
            visible_rows: Vec::new(),
            hovered: None,
            selected: None,
            row_paths: RowFillPaths::new(),
            layers: GridLayers::default(),
            pixel_bounds: None,
            row_passes: 0,
        }
    }

    fn drain_data_signals(&mut self) {
        for event in self.data_queue.drain() {
            if event.target_data_changed() {
                debug!(rows = self.data.len(), "grid data changed");
                self.content_dirty = true;
                self.hovered = None;
                self.element.invalidate(
                    ROWS_STATES.with_state(ConsistencyState::GridHover),
                    Signal::NeedsRedraw,
                );
            } else if event.target_meta_changed() {
                self.element
                    .invalidate(ConsistencyState::GridRedraw, Signal::NeedsRedraw);
            }
        }
    }

    #[must_use]
    pub fn data(&self) -> &TableDataSource {
        &self.data
    }

    /// Mutates the rows and applies the resulting signals right away.
    pub fn with_data_mut<R>(&mut self, mutate: impl FnOnce(&mut TableDataSource) -> R) -> R {
        let result = mutate(&mut self.data);
        self.drain_data_signals();
        result
    }

    pub fn add_column(&mut self, column: Column) {
        self.columns.insert(column.id().to_owned(), column);
        self.element
            .invalidate(ConsistencyState::GridPosition, Signal::NeedsRedraw);
    }

    #[must_use]
    pub fn column(&self, id: &str) -> Option<&Column> {
        self.columns.get(id)
    }

    pub fn columns(&self) -> impl Iterator<Item = &Column> {
        self.columns.values()
    }

    /// Splitter drag: re-lays out the columns, leaves the row cache alone.
    pub fn resize_column(&mut self, id: &str, width: f64) -> bool {
        let Some(column) = self.columns.get_mut(id) else {
            report_warning(WarningCode::IgnoredInvalidValue, SOURCE);
            return false;
        };
        if !column.set_width(width) {
            return false;
        }
        self.element
            .invalidate(ConsistencyState::GridPosition, Signal::NeedsRedraw);
        true
    }

    fn invalidate_rows(&mut self) {
        self.content_dirty = true;
        self.element.invalidate(ROWS_STATES, Signal::NeedsRedraw);
    }

    #[must_use]
    pub fn header_height(&self) -> f64 {
        self.header_height
    }

    pub fn set_header_height(&mut self, height: f64) {
        if !height.is_finite() || height < 0.0 {
            report_warning(WarningCode::IgnoredInvalidValue, SOURCE);
            return;
        }
        if self.header_height != height {
            self.header_height = height;
            self.invalidate_rows();
        }
    }

    #[must_use]
    pub fn default_row_height(&self) -> f64 {
        self.default_row_height
    }

    pub fn set_default_row_height(&mut self, height: f64) {
        if !height.is_finite() || height <= 0.0 {
            report_warning(WarningCode::IgnoredInvalidValue, SOURCE);
            return;
        }
        if self.default_row_height != height {
            self.default_row_height = height;
            self.invalidate_rows();
        }
    }

    /// Row field holding a per-row height override.
    pub fn set_height_field(&mut self, field: impl Into<String>) {
        let field = field.into();
        if self.height_field != field {
            self.height_field = field;
            self.invalidate_rows();
        }
    }

    #[must_use]
    pub fn fills(&self) -> RowFills {
        self.fills
    }

    pub fn set_fills(&mut self, fills: RowFills) -> ChartResult<()> {
        fills.odd.color.validate()?;
        fills.even.color.validate()?;
        fills.selected.color.validate()?;
        fills.row_stroke.validate()?;
        if self.fills == fills {
            return Ok(());
        }
        if self.fills.row_stroke.thickness != fills.row_stroke.thickness {
            self.content_dirty = true;
        }
        self.fills = fills;
        self.element.invalidate(
            ROWS_STATES.with_state(ConsistencyState::Appearance),
            Signal::NeedsRedraw,
        );
        Ok(())
    }

    pub fn set_hover_fill(&mut self, fill: Fill) -> ChartResult<()> {
        fill.color.validate()?;
        if self.hover_fill != fill {
            self.hover_fill = fill;
            self.element
                .invalidate(ConsistencyState::GridHover, Signal::NeedsRedraw);
        }
        Ok(())
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.element.set_enabled(enabled);
    }

    pub fn set_z_index(&mut self, z_index: i32) {
        self.element.set_z_index(z_index);
    }

    pub fn set_container(&mut self, container: Option<LayerId>) {
        self.element.set_container(container);
    }

    fn row_stroke_thickness(&self) -> f64 {
        self.fills.row_stroke.thickness
    }

    /// Height of a data row, without its separator.
    #[must_use]
    pub fn row_height(&self, index: usize) -> f64 {
        self.data
            .field_f64(index, &self.height_field)
            .filter(|height| height.is_finite() && *height > 0.0)
            .unwrap_or(self.default_row_height)
    }

    fn ensure_content_cache(&mut self) {
        if !self.content_dirty {
            return;
        }
        let stroke = self.row_stroke_thickness();
        let heights: Vec<f64> = (0..self.data.len())
            .map(|index| self.row_height(index) + stroke)
            .collect();
        self.content_cache.rebuild(heights);
        self.content_dirty = false;
    }

    fn content_height(&self, bounds: Bounds) -> f64 {
        (bounds.height - self.header_height - 1.0).max(0.0)
    }

    /// Height of every row including separators.
    pub fn total_content_height(&mut self) -> f64 {
        self.ensure_content_cache();
        self.content_cache.total_height()
    }

    #[must_use]
    pub fn scroll_position(&self) -> f64 {
        self.scroll_position
    }

    /// Scrolls the content to `position` pixels from its top.
    pub fn set_vertical_scroll(&mut self, position: f64) {
        if !position.is_finite() {
            report_warning(WarningCode::IgnoredInvalidValue, SOURCE);
            return;
        }
        let position = position.max(0.0);
        if self.scroll_position != position {
            self.scroll_position = position;
            self.element.invalidate(ROWS_STATES, Signal::NeedsRedraw);
        }
    }

    /// Recomputes `start_index`, `end_index` and the inner offset of the first
    /// visible row from the scroll position.
    fn update_window(&mut self, bounds: Bounds) {
        self.ensure_content_cache();
        let visible = self.content_height(bounds);
        let max_scroll = (self.content_cache.total_height() - visible).max(0.0);
        self.scroll_position = self.scroll_position.clamp(0.0, max_scroll);
        match self.content_cache.row_at_offset(self.scroll_position) {
            Some((start, offset)) => {
                let limit = self.scroll_position + visible;
                let bottoms = self.content_cache.cumulative_bottoms();
                let end = bottoms
                    .partition_point(|bottom| *bottom < limit)
                    .min(bottoms.len() - 1);
                self.start_index = start;
                self.vertical_offset = offset;
                self.end_index = Some(end.max(start));
            }
            None => {
                self.start_index = 0;
                self.vertical_offset = 0.0;
                self.end_index = None;
            }
        }
    }

    #[must_use]
    pub fn start_index(&self) -> usize {
        self.start_index
    }

    #[must_use]
    pub fn end_index(&self) -> Option<usize> {
        self.end_index
    }

    /// Distance the first visible row is scrolled past the header.
    #[must_use]
    pub fn vertical_offset(&self) -> f64 {
        self.vertical_offset
    }

    /// Cumulative bottoms of the realized rows, relative to the content top.
    #[must_use]
    pub fn height_cache(&self) -> &RowHeightCache {
        &self.height_cache
    }

    #[must_use]
    pub fn visible_rows(&self) -> &[VisibleRow] {
        &self.visible_rows
    }

    #[must_use]
    pub fn hovered(&self) -> Option<RowHover> {
        self.hovered
    }

    #[must_use]
    pub fn selected_row(&self) -> Option<usize> {
        self.selected
    }

    /// Row layout passes performed so far.
    #[must_use]
    pub fn row_passes(&self) -> u64 {
        self.row_passes
    }

    fn content_top(&self, bounds: Bounds) -> f64 {
        bounds.top + self.header_height + 1.0
    }

    /// Row under a pointer at `y`, `None` above or below the realized rows.
    #[must_use]
    pub fn hit_row(&self, y: f64) -> Option<RowHover> {
        let bounds = self.pixel_bounds?;
        let content_top = self.content_top(bounds);
        let local = self.height_cache.row_at(y - content_top)?;
        let (top, bottom) = self.height_cache.row_span(local)?;
        let index = self.start_index + local;
        if index >= self.data.len() {
            return None;
        }
        let start_y = content_top + top;
        Some(RowHover {
            index,
            start_y,
            end_y: start_y + (bottom - top - self.row_stroke_thickness()).max(0.0),
        })
    }

    /// Highlights a row; only changed extents schedule a hover redraw.
    pub fn highlight(&mut self, hover: Option<RowHover>) -> bool {
        let Some(hover) = hover else {
            return self.clear_hover();
        };
        let unchanged = self
            .hovered
            .is_some_and(|current| current.start_y == hover.start_y && current.end_y == hover.end_y);
        if unchanged {
            return false;
        }
        self.hovered = Some(hover);
        self.element
            .invalidate(ConsistencyState::GridHover, Signal::NeedsRedraw);
        true
    }

    pub fn clear_hover(&mut self) -> bool {
        if self.hovered.take().is_none() {
            return false;
        }
        self.element
            .invalidate(ConsistencyState::GridHover, Signal::NeedsRedraw);
        true
    }

    pub fn handle_pointer_move(&mut self, y: f64) -> Option<RowEvent> {
        self.drain_data_signals();
        match self.hit_row(y) {
            Some(hover) => self.highlight(Some(hover)).then_some(RowEvent::Hover {
                index: hover.index,
                start_y: hover.start_y,
                end_y: hover.end_y,
            }),
            None => {
                self.clear_hover();
                None
            }
        }
    }

    pub fn handle_pointer_leave(&mut self) {
        self.clear_hover();
    }

    /// Toggles the selection of the clicked row.
    pub fn handle_click(&mut self, y: f64) -> Option<RowEvent> {
        self.drain_data_signals();
        let hover = self.hit_row(y)?;
        if self.selected == Some(hover.index) {
            self.unselect_row();
            return Some(RowEvent::Click {
                index: hover.index,
                selected: false,
            });
        }
        self.select_row(hover.index).then_some(RowEvent::Click {
            index: hover.index,
            selected: true,
        })
    }

    /// Selects `index`, clearing any previous selection.
    pub fn select_row(&mut self, index: usize) -> bool {
        if index >= self.data.len() || self.selected == Some(index) {
            return false;
        }
        self.data.suspend_signals_dispatching();
        self.data.set_row_meta(index, SELECTED_META, Value::Bool(true));
        if let Some(previous) = self.selected {
            self.data.set_row_meta(previous, SELECTED_META, Value::Bool(false));
        }
        self.data.resume_signals_dispatching(false);
        self.selected = Some(index);
        self.element
            .invalidate(ConsistencyState::GridClick, Signal::NeedsRedraw);
        true
    }

    pub fn unselect_row(&mut self) -> bool {
        let Some(previous) = self.selected.take() else {
            return false;
        };
        self.data.suspend_signals_dispatching();
        self.data.set_row_meta(previous, SELECTED_META, Value::Bool(false));
        self.data.resume_signals_dispatching(false);
        self.element
            .invalidate(ConsistencyState::GridClick, Signal::NeedsRedraw);
        true
    }

    /// Applies a configuration in one batch: one signal at most.
    pub fn setup(&mut self, config: &DataGridConfig) -> ChartResult<()> {
        config.validate()?;
        self.suspend_signals_dispatching();
        self.set_header_height(config.header_height);
        self.set_default_row_height(config.default_row_height);
        self.set_height_field(config.height_field.clone());
        let applied = self.set_fills(RowFills {
            odd: Fill::solid(config.odd_fill),
            even: Fill::solid(config.even_fill),
            selected: Fill::solid(config.selected_fill),
            row_stroke: Stroke::new(config.row_stroke_color, config.row_stroke_thickness),
        });
        for column in &config.columns {
            match self.columns.get_mut(&column.id) {
                Some(existing) => {
                    existing.set_width(column.width);
                }
                None => {
                    let mut created = Column::new(column.id.clone(), column.field.clone(), column.width);
                    if let Some(title) = &column.title {
                        created = created.with_title(title.clone());
                    }
                    self.columns.insert(column.id.clone(), created);
                }
            }
        }
        self.element
            .invalidate(ConsistencyState::GridPosition, Signal::NeedsRedraw);
        self.resume_signals_dispatching(true);
        applied
    }

    fn ensure_layers(&mut self, surface: &mut dyn VectorSurface, root: LayerId) -> (LayerId, LayerId) {
        let rows = *self
            .layers
            .rows
            .get_or_insert_with(|| surface.create_layer(Some(root)));
        let cells = *self
            .layers
            .cells
            .get_or_insert_with(|| surface.create_layer(Some(root)));
        (rows, cells)
    }

    fn draw_rows(&mut self, surface: &mut dyn VectorSurface, layer: LayerId, bounds: Bounds) -> ChartResult<()> {
        self.update_window(bounds);
        let content_top = self.content_top(bounds);
        let stroke = self.row_stroke_thickness();
        let (left, width) = (bounds.left, bounds.width);

        self.height_cache.clear();
        self.visible_rows.clear();
        self.row_paths.begin(surface, layer);
        self.selected = None;

        let mut total_top = content_top - self.vertical_offset;
        if let Some(end) = self.end_index {
            for index in self.start_index..=end.min(self.data.len().saturating_sub(1)) {
                let first = index == self.start_index;
                let top = if first { content_top } else { total_top };
                let mut height = self.row_height(index);
                if first {
                    height = (height - self.vertical_offset).max(0.0);
                }
                self.row_paths
                    .append_row(surface, index, Bounds::new(left, top, width, height));
                if self.data.row_flag(index, SELECTED_META) {
                    self.selected = Some(index);
                    self.row_paths
                        .append_selected(surface, Bounds::new(left, top, width, height));
                }
                total_top = top + height + stroke;
                self.row_paths
                    .append_separator(surface, left, left + width, total_top - stroke / 2.0, stroke);
                self.height_cache.push(height + stroke);
                self.visible_rows.push(VisibleRow { index, top, height });
            }
        }
        self.row_paths.finish(surface, &self.fills)?;

        let clip_bottom = total_top.max(content_top);
        surface.set_clip(
            layer,
            Some(Bounds::new(left, bounds.top, width, clip_bottom - bounds.top)),
        );
        self.row_passes = self.row_passes.saturating_add(1);
        trace!(
            start = self.start_index,
            end = ?self.end_index,
            rows = self.row_paths.rows(),
            "drew grid rows"
        );
        Ok(())
    }

    fn draw_selection(&mut self, surface: &mut dyn VectorSurface, layer: LayerId, bounds: Bounds) -> ChartResult<()> {
        self.row_paths.begin_selection(surface, layer);
        self.selected = None;
        for row in &self.visible_rows {
            if self.data.row_flag(row.index, SELECTED_META) {
                self.selected = Some(row.index);
                self.row_paths.append_selected(
                    surface,
                    Bounds::new(bounds.left, row.top, bounds.width, row.height),
                );
            }
        }
        self.row_paths.finish_selection(surface, &self.fills)
    }

    fn draw_hover(&mut self, surface: &mut dyn VectorSurface, layer: LayerId, bounds: Bounds) -> ChartResult<()> {
        if self.hovered.is_none() && self.layers.hover.is_none() {
            return Ok(());
        }
        let path = *self
            .layers
            .hover
            .get_or_insert_with(|| surface.create_path(layer));
        surface.clear(path);
        if let Some(hover) = self.hovered {
            surface.append_rect(
                path,
                Bounds::new(bounds.left, hover.start_y, bounds.width, hover.end_y - hover.start_y),
            );
        }
        surface.fill(path, Some(self.hover_fill))
    }

    fn draw_columns(&mut self, surface: &mut dyn VectorSurface, layer: LayerId, bounds: Bounds, rows_changed: bool) -> ChartResult<()> {
        let mut left = bounds.left;
        for column in self.columns.values_mut() {
            column.set_bounds(Bounds::new(left, bounds.top, column.width(), bounds.height));
            left += column.width();
        }
        for column in self.columns.values_mut() {
            column.draw(
                surface,
                layer,
                self.header_height,
                &self.visible_rows,
                &self.data,
                rows_changed,
            )?;
        }
        Ok(())
    }
}

impl Boundable for DataGrid {
    fn parent_bounds(&self) -> Option<Bounds> {
        self.element.parent_bounds()
    }

    fn set_parent_bounds(&mut self, bounds: Option<Bounds>) {
        if self.element.set_parent_bounds(bounds) {
            self.element.invalidate(ROWS_STATES, Signals::none());
        }
    }

    fn pixel_bounds(&mut self) -> Bounds {
        if let Some(bounds) = self.pixel_bounds {
            if !self.element.has_invalidation_state(ConsistencyState::Bounds) {
                return bounds;
            }
        }
        let bounds = self.element.parent_bounds().map_or(Bounds::empty(), Bounds::round);
        self.pixel_bounds = Some(bounds);
        self.element.mark_consistent(ConsistencyState::Bounds);
        bounds
    }
}

impl Drawable for DataGrid {
    fn draw(&mut self, surface: &mut dyn VectorSurface) -> ChartResult<()> {
        self.drain_data_signals();
        if !self.element.check_drawing_needed(surface, ALL_GRID_STATES) {
            return Ok(());
        }
        let root = self.element.apply_layer_states(surface);
        let bounds = self.pixel_bounds();
        let (rows_layer, cells_layer) = self.ensure_layers(surface, root);

        let rows_changed = self
            .element
            .has_invalidation_state(ConsistencyStates::from_state(ConsistencyState::GridRedraw).with_state(ConsistencyState::Appearance));
        if rows_changed {
            self.draw_rows(surface, rows_layer, bounds)?;
            self.element.mark_consistent(
                ConsistencyStates::from_state(ConsistencyState::GridRedraw)
                    .with_state(ConsistencyState::Appearance)
                    .with_state(ConsistencyState::GridClick),
            );
        } else if self.element.has_invalidation_state(ConsistencyState::GridClick) {
            self.draw_selection(surface, rows_layer, bounds)?;
            self.element.mark_consistent(ConsistencyState::GridClick);
        }
        if rows_changed || self.element.has_invalidation_state(ConsistencyState::GridPosition) {
            self.draw_columns(surface, cells_layer, bounds, rows_changed)?;
            self.element.mark_consistent(ConsistencyState::GridPosition);
        }
        if self.element.has_invalidation_state(ConsistencyState::GridHover) {
            self.draw_hover(surface, rows_layer, bounds)?;
            self.element.mark_consistent(ConsistencyState::GridHover);
        }
        Ok(())
    }

    fn remove(&mut self, surface: &mut dyn VectorSurface) {
        for column in self.columns.values_mut() {
            column.remove(surface);
        }
        self.element.remove_root(surface);
        self.element
            .invalidate(ConsistencyState::GridPosition, Signals::none());
    }
}

impl Invalidatable for DataGrid {
    fn invalidation(&self) -> &InvalidationState {
        self.element.invalidation()
    }

    fn invalidation_mut(&mut self) -> &mut InvalidationState {
        self.element.invalidation_mut()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{Column, DataGrid, RowEvent};
    use crate::core::bounds::Bounds;
    use crate::core::consistency::ConsistencyState;
    use crate::core::data::TableDataSource;
    use crate::core::element::{Boundable, Drawable};
    use crate::core::invalidation::Invalidatable;
    use crate::render::{RecordingSurface, VectorSurface};

    fn build_grid(rows: usize) -> (DataGrid, RecordingSurface) {
        let data = TableDataSource::from_fields(
            (0..rows).map(|index| vec![("name", json!(format!("row {index}")))]),
        );
        let mut grid = DataGrid::new(data);
        grid.set_header_height(19.0);
        grid.add_column(Column::new("name", "name", 120.0));
        let mut surface = RecordingSurface::new();
        let stage = surface.create_layer(None);
        grid.set_container(Some(stage));
        grid.set_parent_bounds(Some(Bounds::new(0.0, 0.0, 300.0, 200.0)));
        (grid, surface)
    }

    #[test]
    fn draw_realizes_only_the_visible_window() {
        let (mut grid, mut surface) = build_grid(100);
        grid.draw(&mut surface).expect("draw");
        // 180px of content, 21px per row including the separator.
        assert_eq!(grid.start_index(), 0);
        assert_eq!(grid.end_index(), Some(8));
        assert_eq!(grid.visible_rows().len(), 9);
        assert_eq!(surface.fill_calls(), 3);
        assert!(grid.is_consistent());
    }

    #[test]
    fn scrolling_reduces_the_first_row() {
        let (mut grid, mut surface) = build_grid(100);
        grid.set_vertical_scroll(30.0);
        grid.draw(&mut surface).expect("draw");
        assert_eq!(grid.start_index(), 1);
        assert!((grid.vertical_offset() - 9.0).abs() <= 1e-9);
        assert_eq!(grid.visible_rows()[0].height, 11.0);
        assert_eq!(grid.height_cache().cumulative_bottoms()[0], 12.0);
    }

    #[test]
    fn hover_reports_row_extents_once() {
        let (mut grid, mut surface) = build_grid(10);
        grid.draw(&mut surface).expect("draw");
        let event = grid.handle_pointer_move(45.0).expect("hover");
        assert_eq!(
            event,
            RowEvent::Hover {
                index: 1,
                start_y: 41.0,
                end_y: 61.0
            }
        );
        assert!(grid.has_invalidation_state(ConsistencyState::GridHover));
        assert!(!grid.has_invalidation_state(ConsistencyState::GridRedraw));
        assert!(grid.handle_pointer_move(50.0).is_none());

        let passes = grid.row_passes();
        grid.draw(&mut surface).expect("hover draw");
        assert_eq!(grid.row_passes(), passes);
        assert!(grid.handle_pointer_move(500.0).is_none());
        assert!(grid.hovered().is_none());
    }

    #[test]
    fn click_selects_exclusively_and_toggles() {
        let (mut grid, mut surface) = build_grid(10);
        grid.draw(&mut surface).expect("draw");
        assert_eq!(
            grid.handle_click(25.0),
            Some(RowEvent::Click {
                index: 0,
                selected: true
            })
        );
        grid.draw(&mut surface).expect("draw");
        assert_eq!(
            grid.handle_click(45.0),
            Some(RowEvent::Click {
                index: 1,
                selected: true
            })
        );
        assert!(!grid.data().row_flag(0, "selected"));
        assert!(grid.data().row_flag(1, "selected"));
        assert_eq!(
            grid.handle_click(45.0),
            Some(RowEvent::Click {
                index: 1,
                selected: false
            })
        );
        assert_eq!(grid.selected_row(), None);
    }

    #[test]
    fn column_resize_keeps_the_row_cache() {
        let (mut grid, mut surface) = build_grid(10);
        grid.add_column(Column::new("other", "name", 80.0));
        grid.draw(&mut surface).expect("draw");
        let passes = grid.row_passes();
        let fills = surface.fill_calls();

        assert!(grid.resize_column("name", 150.0));
        assert!(!grid.has_invalidation_state(ConsistencyState::GridRedraw));
        grid.draw(&mut surface).expect("resize draw");
        assert_eq!(grid.row_passes(), passes);
        assert_eq!(surface.fill_calls(), fills);
        let other = grid.column("other").expect("column");
        assert_eq!(other.bounds().map(|bounds| bounds.left), Some(150.0));
        assert!(!grid.resize_column("missing", 10.0));
    }

    #[test]
    fn remounted_grid_shows_its_cells_again() {
        let data = TableDataSource::from_fields(
            (0..3).map(|index| vec![("name", json!(format!("row {index}")))]),
        );
        let mut grid = DataGrid::new(data);
        grid.set_header_height(19.0);
        grid.add_column(Column::new("name", "name", 120.0));
        let mut surface = RecordingSurface::new();
        let stage = surface.create_layer(None);
        grid.set_container(Some(stage));
        grid.set_parent_bounds(Some(Bounds::new(0.0, 0.0, 300.0, 200.0)));
        grid.draw(&mut surface).expect("draw");
        assert_eq!(surface.visible_texts().len(), 4);

        grid.remove(&mut surface);
        assert!(surface.visible_texts().is_empty());

        grid.set_container(None);
        grid.set_container(Some(stage));
        grid.draw(&mut surface).expect("remount draw");
        assert_eq!(surface.visible_texts().len(), 4);
        assert!(grid.is_consistent());
    }
}
