use std::fmt::{self, Write as _};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::axis::{CharWidthMeasurer, LabelMeasurer};
use crate::core::bounds::Bounds;
use crate::core::consistency::{ConsistencyState, ConsistencyStates, Signal, Signals};
use crate::core::element::{Boundable, ElementState};
use crate::core::invalidation::{Invalidatable, InvalidationState};
use crate::core::time_scale::DateTimeScale;
use crate::error::ChartResult;
use crate::render::{Color, Fill, LayerId, PathId, Stroke, TextHAlign, TextPrimitive, VectorSurface};

use super::zoom::LevelSpec;

const TIMELINE_STATES: ConsistencyStates =
    ConsistencyStates::from_state(ConsistencyState::TimeLineLevels);

const DEFAULT_FONT_SIZE_PX: f64 = 11.0;
const DEFAULT_LABEL_COLOR: Color = Color::rgb(0.25, 0.25, 0.25);

/// Label placed in one header cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeLineLabel {
    pub level: usize,
    pub text: String,
    pub cell: Bounds,
}

struct LevelRow {
    top: f64,
    bottom: f64,
    separators: Vec<f64>,
}

/// Formats with a strftime pattern; `None` for patterns chrono rejects.
#[must_use]
pub fn format_with_pattern(timestamp: f64, pattern: &str) -> Option<String> {
    let moment = DateTime::<Utc>::from_timestamp_millis(timestamp.round() as i64)?;
    let mut text = String::new();
    write!(text, "{}", moment.format(pattern)).ok()?;
    Some(text)
}

/// Stacked header rows above the resource list, one per [`LevelSpec`].
///
/// Level 0 sits at the bottom, next to the rows, and each further level
/// stacks above it.
pub struct TimeLine {
    element: ElementState,
    levels: Vec<LevelSpec>,
    measurer: Box<dyn LabelMeasurer>,
    background: Fill,
    separator: Stroke,
    label_color: Color,
    font_size_px: f64,
    labels: Vec<TimeLineLabel>,
    paths: Option<(PathId, PathId)>,
    text_layer: Option<LayerId>,
}

impl fmt::Debug for TimeLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimeLine")
            .field("levels", &self.levels.len())
            .field("labels", &self.labels.len())
            .field("dirty", &self.element.invalidation().dirty_states())
            .finish_non_exhaustive()
    }
}

impl Default for TimeLine {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeLine {
    #[must_use]
    pub fn new() -> Self {
        Self {
            element: ElementState::new("time_line", TIMELINE_STATES, Signals::none()),
            levels: Vec::new(),
            measurer: Box::new(CharWidthMeasurer::default()),
            background: Fill::solid(Color::rgb(0.97, 0.97, 0.97)),
            separator: Stroke::new(Color::rgb(0.8, 0.8, 0.8), 1.0),
            label_color: DEFAULT_LABEL_COLOR,
            font_size_px: DEFAULT_FONT_SIZE_PX,
            labels: Vec::new(),
            paths: None,
            text_layer: None,
        }
    }

    #[must_use]
    pub fn levels(&self) -> &[LevelSpec] {
        &self.levels
    }

    pub fn set_levels(&mut self, levels: Vec<LevelSpec>) {
        if self.levels != levels {
            self.levels = levels;
            self.element
                .invalidate(ConsistencyState::TimeLineLevels, Signal::NeedsRedraw);
        }
    }

    pub fn set_measurer(&mut self, measurer: Box<dyn LabelMeasurer>) {
        self.measurer = measurer;
        self.element
            .invalidate(ConsistencyState::Appearance, Signal::NeedsRedraw);
    }

    /// The scale moved or changed its units; labels must be rebuilt.
    pub fn scale_changed(&mut self) {
        self.element
            .invalidate(ConsistencyState::Appearance, Signal::NeedsRedraw);
    }

    pub fn set_container(&mut self, container: Option<LayerId>) {
        self.element.set_container(container);
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.element.set_enabled(enabled);
    }

    /// Labels placed by the last draw, bottom level first.
    #[must_use]
    pub fn labels(&self) -> &[TimeLineLabel] {
        &self.labels
    }

    /// Explicit heights are honored first; levels without one share what is
    /// left equally.
    #[must_use]
    pub fn level_heights(&self, total: f64) -> Vec<f64> {
        let fixed: f64 = self.levels.iter().filter_map(|level| level.height).sum();
        let flexible = self.levels.iter().filter(|level| level.height.is_none()).count();
        let share = if flexible == 0 {
            0.0
        } else {
            ((total - fixed).max(0.0)) / flexible as f64
        };
        self.levels
            .iter()
            .map(|level| level.height.unwrap_or(share))
            .collect()
    }

    /// First format whose label fits in `cell_width`, the last one otherwise.
    fn pick_label(&self, timestamp: f64, level: &LevelSpec, cell_width: f64) -> Option<String> {
        let fallback = [level.unit.label_pattern().to_owned()];
        let formats = if level.formats.is_empty() {
            &fallback[..]
        } else {
            &level.formats[..]
        };
        let mut last = None;
        for pattern in formats {
            let Some(text) = format_with_pattern(timestamp, pattern) else {
                continue;
            };
            if self.measurer.measure(&text).width < cell_width {
                return Some(text);
            }
            last = Some(text);
        }
        last
    }

    fn layout_rows(&mut self, bounds: Bounds, scale: &DateTimeScale) -> Vec<LevelRow> {
        self.labels.clear();
        let heights = self.level_heights(bounds.height);
        let mut rows = Vec::with_capacity(self.levels.len());
        let mut bottom = bounds.bottom();
        for (index, level) in self.levels.iter().enumerate() {
            let height = heights[index];
            let top = bottom - height;
            let mut separators = Vec::new();
            let ticks = scale.ticks_between(0.0, bounds.width, Some(level.unit), Some(level.count));
            for tick in ticks {
                let start = bounds.left + scale.date_to_pix(tick.start);
                let end = bounds.left + scale.date_to_pix(tick.end);
                if start > bounds.left {
                    separators.push(start);
                }
                let visible_start = start.max(bounds.left);
                let width = end.min(bounds.right()) - visible_start;
                if width <= 0.0 {
                    continue;
                }
                if let Some(text) = self.pick_label(tick.start, level, width) {
                    self.labels.push(TimeLineLabel {
                        level: index,
                        text,
                        cell: Bounds::new(visible_start, top, width, height),
                    });
                }
            }
            rows.push(LevelRow {
                top,
                bottom,
                separators,
            });
            bottom = top;
        }
        rows
    }

    /// Draws the header rows for the current scale window.
    pub fn draw(&mut self, surface: &mut dyn VectorSurface, scale: &DateTimeScale) -> ChartResult<()> {
        if !self.element.check_drawing_needed(
            surface,
            TIMELINE_STATES.with_state(ConsistencyState::Appearance),
        ) {
            return Ok(());
        }
        let layer = self.element.apply_layer_states(surface);
        let bounds = self.pixel_bounds();
        let (background, lines) = *self
            .paths
            .get_or_insert_with(|| (surface.create_path(layer), surface.create_path(layer)));
        let text_layer = *self
            .text_layer
            .get_or_insert_with(|| surface.create_layer(Some(layer)));

        let rows = self.layout_rows(bounds, scale);
        surface.clear(background);
        surface.append_rect(background, bounds);
        surface.fill(background, Some(self.background))?;

        surface.clear(lines);
        for row in &rows {
            surface.move_to(lines, bounds.left, row.top);
            surface.line_to(lines, bounds.right(), row.top);
            for x in &row.separators {
                surface.move_to(lines, *x, row.top);
                surface.line_to(lines, *x, row.bottom);
            }
        }
        surface.stroke(lines, Some(self.separator))?;

        surface.clear_texts(text_layer);
        for label in &self.labels {
            surface.draw_text(
                text_layer,
                TextPrimitive::new(
                    label.text.clone(),
                    label.cell.left + label.cell.width / 2.0,
                    label.cell.top + label.cell.height / 2.0,
                    self.font_size_px,
                    self.label_color,
                    TextHAlign::Center,
                ),
            )?;
        }
        trace!(labels = self.labels.len(), "drew time line");
        self.element.mark_consistent(
            TIMELINE_STATES
                .with_state(ConsistencyState::Appearance)
                .with_state(ConsistencyState::Bounds),
        );
        Ok(())
    }

    pub fn remove(&mut self, surface: &mut dyn VectorSurface) {
        debug!(labels = self.labels.len(), "removing time line");
        self.element.remove_root(surface);
    }
}

impl Boundable for TimeLine {
    fn parent_bounds(&self) -> Option<Bounds> {
        self.element.parent_bounds()
    }

    fn set_parent_bounds(&mut self, bounds: Option<Bounds>) {
        self.element.set_parent_bounds(bounds);
    }

    fn pixel_bounds(&mut self) -> Bounds {
        self.element.parent_bounds().map_or(Bounds::empty(), Bounds::round)
    }
}

impl Invalidatable for TimeLine {
    fn invalidation(&self) -> &InvalidationState {
        self.element.invalidation()
    }

    fn invalidation_mut(&mut self) -> &mut InvalidationState {
        self.element.invalidation_mut()
    }
}
