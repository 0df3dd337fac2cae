//! Linear axis: line, ticks and labels laid out against a scale.
//!
//! Label boxes are measured once per geometry generation in a zero-origin
//! placement and translated into the final pixel bounds at draw time, so
//! overlap and stagger decisions never depend on where the axis is docked.

mod labels;
mod layout;
mod overlap;
mod stagger;

pub use labels::{
    CharWidthMeasurer, FixedSizeMeasurer, LabelBoundsCache, LabelBoundsCacheStats, LabelMeasurer,
    LabelPlacement, LabelSize, TickKind, label_bounds,
};
pub use layout::{
    TickExtent, TickPosition, axis_length, axis_pixel_bounds, calc_size, line_coordinate, outward,
};
pub use overlap::{
    ContinuousTicks, OverlapMode, OverlapResult, resolve_continuous_overlap,
    resolve_ordinal_overlap,
};
pub use stagger::{StaggerLayout, StaggerSettings, resolve_stagger};

use std::fmt;

use tracing::{debug, trace};

use crate::api::AxisConfig;
use crate::core::bounds::{
    Bounds, Orientation, Padding, SizeSpec, apply_pixel_shift, pixel_shift_for_index,
    remaining_bounds,
};
use crate::core::consistency::{ConsistencyState, ConsistencyStates, Signal, Signals};
use crate::core::element::{Boundable, Drawable, ElementState};
use crate::core::invalidation::{Invalidatable, InvalidationState};
use crate::core::scale::{Scale, ScaleKind};
use crate::core::signal::{ListenerId, SignalQueue};
use crate::error::{ChartResult, ErrorCode, WarningCode, report_error, report_warning};
use crate::render::{Color, LayerId, PathId, Stroke, TextHAlign, TextPrimitive, VectorSurface};

const SOURCE: &str = "axis";

const AXIS_STATES: ConsistencyStates = ConsistencyStates::from_state(ConsistencyState::AxisTitle)
    .with_state(ConsistencyState::AxisLabels)
    .with_state(ConsistencyState::AxisTicks)
    .with_state(ConsistencyState::AxisOverlap);

/// Everything that depends on the axis geometry.
pub const ALL_VISUAL_STATES: ConsistencyStates = AXIS_STATES
    .with_state(ConsistencyState::Appearance)
    .with_state(ConsistencyState::Bounds);

const LAYOUT_SIGNALS: Signals =
    Signals::from_signal(Signal::NeedsRedraw).with_signal(Signal::BoundsChanged);

const DEFAULT_TICK_LENGTH: f64 = 6.0;
const DEFAULT_MINOR_TICK_LENGTH: f64 = 4.0;
const DEFAULT_FONT_SIZE_PX: f64 = 11.0;
const DEFAULT_TITLE_GAP_PX: f64 = 4.0;
const DEFAULT_LINE_COLOR: Color = Color::rgb(0.8, 0.8, 0.8);
const DEFAULT_LABEL_COLOR: Color = Color::rgb(0.13, 0.13, 0.13);

/// Labels chosen by the last overlap or stagger pass.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LabelsToDraw {
    pub labels: Vec<bool>,
    pub minor_labels: Vec<bool>,
    pub stagger: Option<StaggerLayout>,
}

impl LabelsToDraw {
    #[must_use]
    pub fn drawn_count(&self) -> usize {
        self.labels.iter().filter(|drawn| **drawn).count()
    }
}

#[derive(Debug, Default)]
struct AxisPaths {
    line: Option<PathId>,
    ticks: Option<PathId>,
    minor_ticks: Option<PathId>,
    labels: Option<LayerId>,
    title: Option<LayerId>,
}

/// Measured ticks in zero-origin placement.
struct MeasuredTicks {
    major_values: Vec<f64>,
    major_ratios: Vec<f64>,
    major_bounds: Vec<Option<Bounds>>,
    minor_values: Vec<f64>,
    minor_ratios: Vec<f64>,
    minor_bounds: Vec<Option<Bounds>>,
}

pub struct Axis {
    element: ElementState,
    scale: Option<Box<dyn Scale>>,
    scale_queue: SignalQueue,
    scale_listener: Option<ListenerId>,
    measurer: Box<dyn LabelMeasurer>,
    orientation: Orientation,
    labels_enabled: bool,
    minor_labels_enabled: bool,
    overlap_mode: OverlapMode,
    stagger_mode: bool,
    stagger_lines: Option<usize>,
    stagger_max_lines: Option<usize>,
    draw_first_label: bool,
    draw_last_label: bool,
    stroke: Stroke,
    ticks_enabled: bool,
    tick_length: f64,
    minor_ticks_enabled: bool,
    minor_tick_length: f64,
    tick_position: TickPosition,
    width: SizeSpec,
    padding: Padding,
    title: Option<String>,
    label_color: Color,
    font_size_px: f64,
    bounds_cache: LabelBoundsCache,
    labels_to_draw: Option<LabelsToDraw>,
    pixel_bounds: Option<Bounds>,
    paths: AxisPaths,
    measure_calls: u64,
}

impl fmt::Debug for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Axis")
            .field("orientation", &self.orientation)
            .field("has_scale", &self.scale.is_some())
            .field("overlap_mode", &self.overlap_mode)
            .field("stagger_mode", &self.stagger_mode)
            .field("dirty", &self.element.invalidation().dirty_states())
            .finish_non_exhaustive()
    }
}

impl Default for Axis {
    fn default() -> Self {
        Self::new()
    }
}

impl Axis {
    #[must_use]
    pub fn new() -> Self {
        Self {
            element: ElementState::new(SOURCE, AXIS_STATES, Signals::none()),
            scale: None,
            scale_queue: SignalQueue::new(),
            scale_listener: None,
            measurer: Box::new(CharWidthMeasurer::default()),
            orientation: Orientation::Bottom,
            labels_enabled: true,
            minor_labels_enabled: false,
            overlap_mode: OverlapMode::NoOverlap,
            stagger_mode: false,
            stagger_lines: None,
            stagger_max_lines: None,
            draw_first_label: true,
            draw_last_label: true,
            stroke: Stroke::new(DEFAULT_LINE_COLOR, 1.0),
            ticks_enabled: true,
            tick_length: DEFAULT_TICK_LENGTH,
            minor_ticks_enabled: false,
            minor_tick_length: DEFAULT_MINOR_TICK_LENGTH,
            tick_position: TickPosition::Outside,
            width: SizeSpec::Auto,
            padding: Padding::default(),
            title: None,
            label_color: DEFAULT_LABEL_COLOR,
            font_size_px: DEFAULT_FONT_SIZE_PX,
            bounds_cache: LabelBoundsCache::new(),
            labels_to_draw: None,
            pixel_bounds: None,
            paths: AxisPaths::default(),
            measure_calls: 0,
        }
    }

    /// Marks every geometry-derived state dirty and drops label caches.
    fn invalidate_layout(&mut self) {
        self.bounds_cache.invalidate();
        self.labels_to_draw = None;
        self.element.invalidate(ALL_VISUAL_STATES, LAYOUT_SIGNALS);
    }

    /// Translates queued scale signals into axis invalidation.
    fn drain_scale_signals(&mut self) {
        let events = self.scale_queue.drain();
        if events
            .iter()
            .any(|event| event.target_needs_reapplication() || event.target_needs_recalculation())
        {
            debug!(events = events.len(), "scale changed, relayout axis");
            self.invalidate_layout();
        }
    }

    #[must_use]
    pub fn scale(&self) -> Option<&dyn Scale> {
        self.scale.as_deref()
    }

    /// Takes ownership of `scale` and listens to its signals.
    pub fn set_scale(&mut self, scale: Option<Box<dyn Scale>>) {
        if let (Some(old), Some(id)) = (self.scale.as_mut(), self.scale_listener.take()) {
            old.unlisten_signals(id);
        }
        self.scale = scale;
        if let Some(scale) = self.scale.as_mut() {
            self.scale_listener = Some(scale.listen_signals(Box::new(self.scale_queue.clone())));
        }
        self.scale_queue.clear();
        self.invalidate_layout();
    }

    /// Mutates the owned scale and applies the resulting signals right away.
    pub fn with_scale_mut<R>(&mut self, mutate: impl FnOnce(&mut dyn Scale) -> R) -> Option<R> {
        let result = self.scale.as_mut().map(|scale| mutate(&mut **scale));
        self.drain_scale_signals();
        result
    }

    pub fn set_measurer(&mut self, measurer: Box<dyn LabelMeasurer>) {
        self.measurer = measurer;
        self.invalidate_layout();
    }

    #[must_use]
    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    pub fn set_orientation(&mut self, orientation: Orientation) {
        if self.orientation != orientation {
            self.orientation = orientation;
            self.invalidate_layout();
        }
    }

    #[must_use]
    pub fn labels_enabled(&self) -> bool {
        self.labels_enabled
    }

    pub fn set_labels_enabled(&mut self, enabled: bool) {
        if self.labels_enabled != enabled {
            self.labels_enabled = enabled;
            self.invalidate_layout();
        }
    }

    #[must_use]
    pub fn minor_labels_enabled(&self) -> bool {
        self.minor_labels_enabled
    }

    pub fn set_minor_labels_enabled(&mut self, enabled: bool) {
        if self.minor_labels_enabled != enabled {
            self.minor_labels_enabled = enabled;
            self.invalidate_layout();
        }
    }

    #[must_use]
    pub fn overlap_mode(&self) -> OverlapMode {
        self.overlap_mode
    }

    pub fn set_overlap_mode(&mut self, mode: OverlapMode) {
        if self.overlap_mode != mode {
            self.overlap_mode = mode;
            self.invalidate_layout();
        }
    }

    #[must_use]
    pub fn stagger_mode(&self) -> bool {
        self.stagger_mode
    }

    pub fn set_stagger_mode(&mut self, enabled: bool) {
        if self.stagger_mode != enabled {
            self.stagger_mode = enabled;
            self.invalidate_layout();
        }
    }

    #[must_use]
    pub fn stagger_lines(&self) -> Option<usize> {
        self.stagger_lines
    }

    /// Zero lines is not a line count and resets to auto-detection.
    pub fn set_stagger_lines(&mut self, lines: Option<usize>) {
        let lines = match lines {
            Some(0) => {
                report_warning(WarningCode::IgnoredInvalidValue, SOURCE);
                None
            }
            other => other,
        };
        if self.stagger_lines != lines {
            self.stagger_lines = lines;
            self.invalidate_layout();
        }
    }

    #[must_use]
    pub fn stagger_max_lines(&self) -> Option<usize> {
        self.stagger_max_lines
    }

    pub fn set_stagger_max_lines(&mut self, max_lines: Option<usize>) {
        let max_lines = match max_lines {
            Some(0) => {
                report_warning(WarningCode::IgnoredInvalidValue, SOURCE);
                None
            }
            other => other,
        };
        if self.stagger_max_lines != max_lines {
            self.stagger_max_lines = max_lines;
            self.invalidate_layout();
        }
    }

    #[must_use]
    pub fn draw_first_label(&self) -> bool {
        self.draw_first_label
    }

    pub fn set_draw_first_label(&mut self, draw: bool) {
        if self.draw_first_label != draw {
            self.draw_first_label = draw;
            self.invalidate_layout();
        }
    }

    #[must_use]
    pub fn draw_last_label(&self) -> bool {
        self.draw_last_label
    }

    pub fn set_draw_last_label(&mut self, draw: bool) {
        if self.draw_last_label != draw {
            self.draw_last_label = draw;
            self.invalidate_layout();
        }
    }

    #[must_use]
    pub fn stroke(&self) -> Stroke {
        self.stroke
    }

    pub fn set_stroke(&mut self, stroke: Stroke) -> ChartResult<()> {
        stroke.validate()?;
        if self.stroke != stroke {
            self.stroke = stroke;
            self.invalidate_layout();
        }
        Ok(())
    }

    pub fn set_ticks_enabled(&mut self, enabled: bool) {
        if self.ticks_enabled != enabled {
            self.ticks_enabled = enabled;
            self.invalidate_layout();
        }
    }

    pub fn set_minor_ticks_enabled(&mut self, enabled: bool) {
        if self.minor_ticks_enabled != enabled {
            self.minor_ticks_enabled = enabled;
            self.invalidate_layout();
        }
    }

    #[must_use]
    pub fn tick_length(&self) -> f64 {
        self.tick_length
    }

    pub fn set_tick_length(&mut self, length: f64) {
        if !length.is_finite() || length < 0.0 {
            report_warning(WarningCode::IgnoredInvalidValue, SOURCE);
            return;
        }
        if self.tick_length != length {
            self.tick_length = length;
            self.invalidate_layout();
        }
    }

    pub fn set_minor_tick_length(&mut self, length: f64) {
        if !length.is_finite() || length < 0.0 {
            report_warning(WarningCode::IgnoredInvalidValue, SOURCE);
            return;
        }
        if self.minor_tick_length != length {
            self.minor_tick_length = length;
            self.invalidate_layout();
        }
    }

    #[must_use]
    pub fn tick_position(&self) -> TickPosition {
        self.tick_position
    }

    pub fn set_tick_position(&mut self, position: TickPosition) {
        if self.tick_position != position {
            self.tick_position = position;
            self.invalidate_layout();
        }
    }

    #[must_use]
    pub fn width(&self) -> SizeSpec {
        self.width
    }

    pub fn set_width(&mut self, width: SizeSpec) {
        if self.width != width {
            self.width = width;
            self.invalidate_layout();
        }
    }

    #[must_use]
    pub fn padding(&self) -> Padding {
        self.padding
    }

    pub fn set_padding(&mut self, padding: Padding) {
        if self.padding != padding {
            self.padding = padding;
            self.invalidate_layout();
        }
    }

    #[must_use]
    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn set_title(&mut self, title: Option<String>) {
        let title = title.filter(|text| !text.is_empty());
        if self.title != title {
            self.title = title;
            self.invalidate_layout();
        }
    }

    pub fn set_label_style(&mut self, color: Color, font_size_px: f64) -> ChartResult<()> {
        color.validate()?;
        if self.label_color != color || self.font_size_px != font_size_px {
            self.label_color = color;
            self.font_size_px = font_size_px;
            self.element
                .invalidate(ConsistencyState::AxisLabels, Signal::NeedsRedraw);
        }
        Ok(())
    }

    #[must_use]
    pub fn enabled(&self) -> bool {
        self.element.enabled()
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

    /// Applies a configuration in one batch: one signal at most.
    pub fn setup(&mut self, config: &AxisConfig) -> ChartResult<()> {
        config.validate()?;
        self.suspend_signals_dispatching();
        self.set_enabled(config.enabled);
        self.set_orientation(config.orientation);
        self.set_labels_enabled(config.labels_enabled);
        self.set_minor_labels_enabled(config.minor_labels_enabled);
        self.set_overlap_mode(config.overlap_mode);
        self.set_stagger_mode(config.stagger_mode);
        self.set_stagger_lines(config.stagger_lines);
        self.set_stagger_max_lines(config.stagger_max_lines);
        self.set_draw_first_label(config.draw_first_label);
        self.set_draw_last_label(config.draw_last_label);
        self.set_ticks_enabled(config.ticks_enabled);
        self.set_tick_length(config.tick_length);
        self.set_minor_ticks_enabled(config.minor_ticks_enabled);
        self.set_minor_tick_length(config.minor_tick_length);
        self.set_tick_position(config.tick_position);
        self.set_width(config.width);
        self.set_padding(config.padding);
        self.set_title(config.title.clone());
        let applied = self
            .set_stroke(config.stroke)
            .and_then(|()| self.set_label_style(config.label_color, config.font_size_px));
        self.resume_signals_dispatching(true);
        applied
    }

    /// Number of label measurements performed so far.
    #[must_use]
    pub fn measure_calls(&self) -> u64 {
        self.measure_calls
    }

    #[must_use]
    pub fn bounds_cache_stats(&self) -> LabelBoundsCacheStats {
        self.bounds_cache.stats()
    }

    fn label_offset(&self) -> f64 {
        let ticks = if self.tick_position == TickPosition::Outside && self.ticks_enabled {
            self.tick_length
        } else {
            0.0
        };
        self.stroke.thickness / 2.0 + ticks
    }

    fn current_length(&self) -> f64 {
        self.element
            .parent_bounds()
            .map_or(0.0, |parent| axis_length(parent.round(), self.padding, self.orientation))
    }

    fn title_size(&mut self) -> f64 {
        match self.title.as_deref() {
            Some(title) => {
                self.measure_calls = self.measure_calls.saturating_add(1);
                self.measurer.measure(title).height + DEFAULT_TITLE_GAP_PX
            }
            None => 0.0,
        }
    }

    fn measure_ticks(&mut self, length: f64) -> Option<MeasuredTicks> {
        let scale = self.scale.as_deref()?;
        let placement = LabelPlacement::measuring(self.orientation, length, self.label_offset());
        let continuous = scale.kind() == ScaleKind::Continuous;
        let major_values = scale.ticks();
        let minor_values = if continuous {
            scale.minor_ticks()
        } else {
            Vec::new()
        };
        let major_ratios: Vec<f64> = major_values
            .iter()
            .map(|value| scale.transform(*value))
            .collect();
        let minor_ratios: Vec<f64> = minor_values
            .iter()
            .map(|value| scale.transform(*value))
            .collect();

        let measurer = self.measurer.as_ref();
        let cache = &mut self.bounds_cache;
        let calls = &mut self.measure_calls;
        let mut measure = |kind: TickKind, index: usize, value: f64, ratio: f64| {
            cache.get_or_measure(kind, index, || {
                *calls = calls.saturating_add(1);
                label_bounds(&placement, ratio, measurer.measure(&scale.tick_label(value)))
            })
        };
        let major_bounds = major_values
            .iter()
            .zip(&major_ratios)
            .enumerate()
            .map(|(index, (value, ratio))| measure(TickKind::Major, index, *value, *ratio))
            .collect();
        let minor_bounds = if self.minor_labels_enabled {
            minor_values
                .iter()
                .zip(&minor_ratios)
                .enumerate()
                .map(|(index, (value, ratio))| measure(TickKind::Minor, index, *value, *ratio))
                .collect()
        } else {
            vec![None; minor_values.len()]
        };

        Some(MeasuredTicks {
            major_values,
            major_ratios,
            major_bounds,
            minor_values,
            minor_ratios,
            minor_bounds,
        })
    }

    fn resolve_labels(&self, measured: &MeasuredTicks, continuous: bool) -> LabelsToDraw {
        let majors = measured.major_bounds.len();
        let minors = measured.minor_bounds.len();
        if !self.labels_enabled {
            return LabelsToDraw {
                labels: vec![false; majors],
                minor_labels: vec![false; minors],
                stagger: None,
            };
        }
        if self.stagger_mode {
            let layout = resolve_stagger(
                &measured.major_bounds,
                &StaggerSettings {
                    lines: self.stagger_lines,
                    max_lines: self.stagger_max_lines,
                    overlap_mode: self.overlap_mode,
                    draw_first: self.draw_first_label,
                    draw_last: self.draw_last_label,
                    orientation: self.orientation,
                },
            );
            return LabelsToDraw {
                labels: layout.states.clone(),
                minor_labels: vec![false; minors],
                stagger: Some(layout),
            };
        }
        if self.overlap_mode == OverlapMode::AllowOverlap {
            return LabelsToDraw {
                labels: vec![true; majors],
                minor_labels: vec![self.minor_labels_enabled; minors],
                stagger: None,
            };
        }
        if continuous {
            let result = resolve_continuous_overlap(
                &ContinuousTicks {
                    major_ratios: &measured.major_ratios,
                    major_bounds: &measured.major_bounds,
                    minor_ratios: &measured.minor_ratios,
                    minor_bounds: &measured.minor_bounds,
                },
                self.draw_first_label,
                self.draw_last_label,
                self.minor_labels_enabled,
            );
            LabelsToDraw {
                labels: result.labels,
                minor_labels: result.minor_labels,
                stagger: None,
            }
        } else {
            LabelsToDraw {
                labels: resolve_ordinal_overlap(
                    &measured.major_bounds,
                    self.draw_first_label,
                    self.draw_last_label,
                ),
                minor_labels: Vec::new(),
                stagger: None,
            }
        }
    }

    /// Labels to draw, recomputed only while `AxisOverlap` is dirty.
    pub fn labels_to_draw(&mut self) -> LabelsToDraw {
        self.drain_scale_signals();
        if let Some(cached) = &self.labels_to_draw {
            if !self
                .element
                .has_invalidation_state(ConsistencyState::AxisOverlap)
            {
                return cached.clone();
            }
        }
        let length = self.current_length();
        let continuous = self
            .scale
            .as_deref()
            .is_some_and(|scale| scale.kind() == ScaleKind::Continuous);
        let resolved = match self.measure_ticks(length) {
            Some(measured) => self.resolve_labels(&measured, continuous),
            None => LabelsToDraw::default(),
        };
        trace!(
            drawn = resolved.drawn_count(),
            total = resolved.labels.len(),
            "resolved axis labels"
        );
        self.labels_to_draw = Some(resolved.clone());
        self.element.mark_consistent(ConsistencyState::AxisOverlap);
        resolved
    }

    fn content_size(&mut self, length: f64) -> f64 {
        let Some(measured) = self.measure_ticks(length) else {
            return self.title_size();
        };
        let decisions = self.labels_to_draw();
        let orientation = self.orientation;
        let across = |bounds: &Option<Bounds>| {
            bounds.map_or(0.0, |bounds| bounds.extent_across(orientation))
        };
        let max_label = match &decisions.stagger {
            Some(layout) => layout.total_size(),
            None => measured
                .major_bounds
                .iter()
                .zip(&decisions.labels)
                .filter(|(_, drawn)| **drawn)
                .map(|(bounds, _)| across(bounds))
                .fold(0.0, f64::max),
        };
        let max_minor = if decisions.stagger.is_some() {
            0.0
        } else {
            measured
                .minor_bounds
                .iter()
                .zip(&decisions.minor_labels)
                .filter(|(_, drawn)| **drawn)
                .map(|(bounds, _)| across(bounds))
                .fold(0.0, f64::max)
        };
        let size = calc_size(
            max_label,
            max_minor,
            TickExtent {
                enabled: self.ticks_enabled,
                length: self.tick_length,
                position: self.tick_position,
            },
            TickExtent {
                enabled: self.minor_ticks_enabled,
                length: self.minor_tick_length,
                position: self.tick_position,
            },
        );
        size + self.title_size()
    }

    /// Parent bounds without the room this axis occupies.
    pub fn remaining_bounds(&mut self) -> Bounds {
        let Some(parent) = self.element.parent_bounds() else {
            return Bounds::empty();
        };
        if self.scale.is_none() || !self.element.enabled() {
            return parent;
        }
        let occupied = self.pixel_bounds();
        remaining_bounds(parent, occupied, self.padding, self.orientation)
    }

    fn draw_line(&mut self, surface: &mut dyn VectorSurface, root: LayerId, bounds: Bounds) -> ChartResult<()> {
        let path = *self.paths.line.get_or_insert_with(|| surface.create_path(root));
        surface.clear(path);
        let thickness = self.stroke.thickness;
        let line = apply_pixel_shift(line_coordinate(bounds, self.orientation), thickness);
        if self.orientation.is_horizontal() {
            surface.move_to(path, bounds.left, line);
            surface.line_to(path, bounds.right(), line);
        } else {
            surface.move_to(path, line, bounds.top);
            surface.line_to(path, line, bounds.bottom());
        }
        surface.stroke(path, Some(self.stroke))
    }

    fn draw_tick_set(
        &self,
        surface: &mut dyn VectorSurface,
        path: PathId,
        bounds: Bounds,
        ratios: &[f64],
        length: f64,
    ) -> ChartResult<()> {
        surface.clear(path);
        let shift = if (self.stroke.thickness.round() as i64) & 1 == 1 {
            0.5
        } else {
            0.0
        };
        let line = line_coordinate(bounds, self.orientation);
        let (start, end) = self.tick_position.span(length);
        let (ox, oy) = outward(self.orientation);
        let count = ratios.len();
        for (index, ratio) in ratios.iter().enumerate() {
            if !(0.0..=1.0).contains(ratio) {
                continue;
            }
            let along = pixel_shift_for_index(index, count, shift);
            if self.orientation.is_horizontal() {
                let x = (bounds.left + ratio * bounds.width).round() + along;
                surface.move_to(path, x, line + oy * start);
                surface.line_to(path, x, line + oy * end);
            } else {
                let y = (bounds.bottom() - ratio * bounds.height).round() - along;
                surface.move_to(path, line + ox * start, y);
                surface.line_to(path, line + ox * end, y);
            }
        }
        surface.stroke(path, Some(self.stroke))
    }

    fn draw_ticks(&mut self, surface: &mut dyn VectorSurface, root: LayerId, bounds: Bounds) -> ChartResult<()> {
        let Some(scale) = self.scale.as_deref() else {
            return Ok(());
        };
        let major: Vec<f64> = scale.ticks().iter().map(|v| scale.transform(*v)).collect();
        let minor: Vec<f64> = if scale.kind() == ScaleKind::Continuous {
            scale.minor_ticks().iter().map(|v| scale.transform(*v)).collect()
        } else {
            Vec::new()
        };
        let ticks_path = *self.paths.ticks.get_or_insert_with(|| surface.create_path(root));
        if self.ticks_enabled {
            self.draw_tick_set(surface, ticks_path, bounds, &major, self.tick_length)?;
        } else {
            surface.clear(ticks_path);
        }
        let minor_path = *self
            .paths
            .minor_ticks
            .get_or_insert_with(|| surface.create_path(root));
        if self.minor_ticks_enabled {
            self.draw_tick_set(surface, minor_path, bounds, &minor, self.minor_tick_length)?;
        } else {
            surface.clear(minor_path);
        }
        Ok(())
    }

    fn draw_labels(&mut self, surface: &mut dyn VectorSurface, root: LayerId, bounds: Bounds) -> ChartResult<()> {
        let layer = *self
            .paths
            .labels
            .get_or_insert_with(|| surface.create_layer(Some(root)));
        surface.clear_texts(layer);
        let decisions = self.labels_to_draw();
        let Some(measured) = self.measure_ticks(self.current_length()) else {
            return Ok(());
        };
        let Some(scale) = self.scale.as_deref() else {
            return Ok(());
        };
        let placement = LabelPlacement {
            orientation: self.orientation,
            area: bounds,
            line: line_coordinate(bounds, self.orientation),
            offset: self.label_offset(),
        };
        let (dx, dy) = placement.origin();
        let (ox, oy) = outward(self.orientation);

        let majors = measured
            .major_values
            .iter()
            .zip(&measured.major_bounds)
            .zip(&decisions.labels)
            .enumerate()
            .map(|(index, ((value, bounds), drawn))| (Some(index), *value, *bounds, *drawn));
        let minors = measured
            .minor_values
            .iter()
            .zip(&measured.minor_bounds)
            .zip(&decisions.minor_labels)
            .map(|((value, bounds), drawn)| (None, *value, *bounds, *drawn));
        for (major_index, value, label_box, drawn) in majors.chain(minors) {
            let Some(label_box) = label_box.filter(|_| drawn) else {
                continue;
            };
            let text = scale.tick_label(value);
            if text.is_empty() {
                continue;
            }
            let line_shift = match (&decisions.stagger, major_index) {
                (Some(layout), Some(index)) => layout
                    .line_of(index)
                    .map_or(0.0, |line| layout.line_offset(line)),
                _ => 0.0,
            };
            let placed = label_box.translate(dx + ox * line_shift, dy + oy * line_shift);
            surface.draw_text(
                layer,
                TextPrimitive::new(
                    text,
                    placed.left + placed.width / 2.0,
                    placed.top,
                    self.font_size_px,
                    self.label_color,
                    TextHAlign::Center,
                ),
            )?;
        }
        Ok(())
    }

    fn draw_title(&mut self, surface: &mut dyn VectorSurface, root: LayerId, bounds: Bounds) -> ChartResult<()> {
        let layer = *self
            .paths
            .title
            .get_or_insert_with(|| surface.create_layer(Some(root)));
        surface.clear_texts(layer);
        let Some(title) = self.title.clone() else {
            return Ok(());
        };
        let size = self.measurer.measure(&title);
        let (x, y) = match self.orientation {
            Orientation::Top => (bounds.left + bounds.width / 2.0, bounds.top),
            Orientation::Bottom => (
                bounds.left + bounds.width / 2.0,
                bounds.bottom() - size.height,
            ),
            Orientation::Left => (bounds.left, bounds.top + bounds.height / 2.0),
            Orientation::Right => (
                bounds.right() - size.height,
                bounds.top + bounds.height / 2.0,
            ),
        };
        surface.draw_text(
            layer,
            TextPrimitive::new(
                title,
                x,
                y,
                self.font_size_px,
                self.label_color,
                TextHAlign::Center,
            ),
        )
    }
}

impl Boundable for Axis {
    fn parent_bounds(&self) -> Option<Bounds> {
        self.element.parent_bounds()
    }

    fn set_parent_bounds(&mut self, bounds: Option<Bounds>) {
        if self.element.set_parent_bounds(bounds) {
            self.invalidate_layout();
        }
    }

    fn pixel_bounds(&mut self) -> Bounds {
        self.drain_scale_signals();
        if let Some(bounds) = self.pixel_bounds {
            if !self.element.has_invalidation_state(ConsistencyState::Bounds) {
                return bounds;
            }
        }
        let bounds = match self.element.parent_bounds() {
            Some(parent) => {
                let (padding, orientation, width) = (self.padding, self.orientation, self.width);
                axis_pixel_bounds(parent, padding, orientation, width, |length| {
                    self.content_size(length)
                })
            }
            None => Bounds::empty(),
        };
        self.pixel_bounds = Some(bounds);
        self.element.mark_consistent(ConsistencyState::Bounds);
        bounds
    }
}

impl Drawable for Axis {
    fn draw(&mut self, surface: &mut dyn VectorSurface) -> ChartResult<()> {
        self.drain_scale_signals();
        if self.scale.is_none() {
            report_error(ErrorCode::ScaleNotSet, SOURCE);
            return Ok(());
        }
        if !self
            .element
            .check_drawing_needed(surface, ALL_VISUAL_STATES)
        {
            return Ok(());
        }
        let dirty = self.element.invalidation().dirty_states();
        trace!(states = dirty.bits(), "drawing axis");
        let root = self.element.apply_layer_states(surface);
        let bounds = self.pixel_bounds();

        if self.element.has_invalidation_state(ConsistencyState::Appearance) {
            self.draw_line(surface, root, bounds)?;
            self.element.mark_consistent(ConsistencyState::Appearance);
        }
        if self.element.has_invalidation_state(ConsistencyState::AxisTitle) {
            self.draw_title(surface, root, bounds)?;
            self.element.mark_consistent(ConsistencyState::AxisTitle);
        }
        if self.element.has_invalidation_state(ConsistencyState::AxisTicks) {
            self.draw_ticks(surface, root, bounds)?;
            self.element.mark_consistent(ConsistencyState::AxisTicks);
        }
        if self.element.has_invalidation_state(ConsistencyState::AxisLabels) {
            self.draw_labels(surface, root, bounds)?;
            self.element.mark_consistent(ConsistencyState::AxisLabels);
        }
        // Overlap is resolved lazily; a disabled label set still settles it.
        self.element.mark_consistent(ConsistencyState::AxisOverlap);
        Ok(())
    }

    fn remove(&mut self, surface: &mut dyn VectorSurface) {
        self.element.remove_root(surface);
    }
}

impl Invalidatable for Axis {
    fn invalidation(&self) -> &InvalidationState {
        self.element.invalidation()
    }

    fn invalidation_mut(&mut self) -> &mut InvalidationState {
        self.element.invalidation_mut()
    }
}
