//! Resource chart: a scrollable time window over resource rows.
//!
//! The chart is the only writer of [`ViewportState`]. Scrollbars, drags,
//! wheel input and pan-by-value all funnel into `set_current_start_date` or
//! the vertical ratio, and the draw pass turns those into clamped pixels,
//! scale origin and scrollbar ratios in a fixed order.

mod activities;
mod calendar;
mod rows;
mod schedule;
mod scrollbar;
mod selection;
mod timeline;
mod viewport;
mod zoom;

pub use activities::{ActivityIterator, ActivityRegistry};
pub use calendar::{Calendar, FULL_WORKING_DAY_MINUTES, TimeTrackingMode, day_number};
pub use rows::{ACTIVITIES_SPACING, Activity, Resource, ResourceRows, RowLayout};
pub use schedule::{ConflictSpan, DayAllocation, ResourceSchedule, overtime_label};
pub use scrollbar::{DEFAULT_SCROLLBAR_SIZE, MAX_RATIO, RangeChange, Scrollbar, ScrollbarLayout};
pub use selection::{ActivityEvent, ActivitySelection};
pub use timeline::{TimeLine, TimeLineLabel, format_with_pattern};
pub use viewport::{ViewportState, clamp_start_pixel, ratio_or_zero};
pub use zoom::{DEFAULT_UNIT_PIX_SIZE, LevelSpec, ZoomLevel, ZoomLevelRef, ZoomLevels};

use std::fmt;

use tracing::{debug, trace, warn};

use crate::api::{ResourceChartConfig, ZoomLevelConfig};
use crate::core::bounds::{Bounds, SizeSpec, resolve_size_or_zero};
use crate::core::consistency::{ConsistencyState, ConsistencyStates, Signal, Signals};
use crate::core::element::{Boundable, Drawable, ElementState};
use crate::core::invalidation::{Invalidatable, InvalidationState, resume_all, suspend_all};
use crate::core::scale::Scale;
use crate::core::signal::SignalQueue;
use crate::core::time_scale::DateTimeScale;
use crate::error::{ChartResult, WarningCode, report_warning};
use crate::interaction::{
    DeferredRetry, DragFrame, DragLimits, DragSession, FrameCoalescer, InteractionState,
    KineticPanConfig, RetryStatus, WheelInput, WheelPlatform, normalize_wheel_deltas,
};
use crate::render::{Color, Fill, LayerId, PathId, Stroke, TextHAlign, TextPrimitive, VectorSurface};

const SOURCE: &str = "resource_chart";
const CONFLICT_FONT_PX: f64 = 10.0;

const CHART_STATES: ConsistencyStates =
    ConsistencyStates::from_state(ConsistencyState::ChartXScalePosition)
        .with_state(ConsistencyState::ChartXScaleRange)
        .with_state(ConsistencyState::ChartYRange)
        .with_state(ConsistencyState::ChartTimeLine)
        .with_state(ConsistencyState::ChartXScroll)
        .with_state(ConsistencyState::ChartYScroll)
        .with_state(ConsistencyState::ChartGrid)
        .with_state(ConsistencyState::ChartData)
        .with_state(ConsistencyState::ChartConflicts)
        .with_state(ConsistencyState::ChartActivityStates);

/// States that depend on the content bounds.
const LAYOUT_STATES: ConsistencyStates =
    ConsistencyStates::from_state(ConsistencyState::ChartXScaleRange)
        .with_state(ConsistencyState::ChartYRange)
        .with_state(ConsistencyState::ChartTimeLine)
        .with_state(ConsistencyState::ChartXScroll)
        .with_state(ConsistencyState::ChartYScroll)
        .with_state(ConsistencyState::ChartGrid);

/// Overlays positioned over the grid rows.
const ROW_OVERLAY_STATES: ConsistencyStates =
    ConsistencyStates::from_state(ConsistencyState::ChartConflicts)
        .with_state(ConsistencyState::ChartActivityStates);

const X_POSITION_STATES: ConsistencyStates =
    ConsistencyStates::from_state(ConsistencyState::ChartXScalePosition)
        .with_state(ConsistencyState::ChartXScaleRange);

const X_REAPPLICATION_STATES: ConsistencyStates =
    ConsistencyStates::from_state(ConsistencyState::ChartTimeLine)
        .with_state(ConsistencyState::ChartXScroll)
        .with_state(ConsistencyState::ChartGrid);

/// Bounds of the chart parts, resolved from the parent bounds.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ChartLayout {
    pub timeline: Bounds,
    pub content: Bounds,
}

#[derive(Debug, Default)]
struct ChartPaths {
    grid: Option<PathId>,
    activities: Option<PathId>,
    content: Option<LayerId>,
    conflicts_layer: Option<LayerId>,
    conflicts: Option<PathId>,
    states_layer: Option<LayerId>,
    selected: Option<PathId>,
    hovered: Option<PathId>,
}

/// Fills of the conflict strips and activity states.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActivityFills {
    pub conflict: Fill,
    pub conflict_label: Color,
    pub hovered: Fill,
    pub selected: Fill,
}

impl Default for ActivityFills {
    fn default() -> Self {
        Self {
            conflict: Fill::solid(Color::rgb(0.867, 0.173, 0.0)),
            conflict_label: Color::rgb(0.957, 0.957, 0.957),
            hovered: Fill::solid(Color::rgba(1.0, 1.0, 1.0, 0.3)),
            selected: Fill::solid(Color::rgb(0.2, 0.36, 0.66)),
        }
    }
}

pub struct ResourceChart {
    element: ElementState,
    x_scale: DateTimeScale,
    scale_queue: SignalQueue,
    timeline: TimeLine,
    timeline_queue: SignalQueue,
    x_scroll: Scrollbar,
    y_scroll: Scrollbar,
    resources: Vec<Resource>,
    row_layout: RowLayout,
    calendar: Calendar,
    rows: ResourceRows,
    selection: ActivitySelection,
    viewport: ViewportState,
    timeline_height: SizeSpec,
    zoom: ZoomLevels,
    requested_zoom: ZoomLevelRef,
    interaction: InteractionState,
    drag: Option<DragSession>,
    frames: FrameCoalescer<DragFrame>,
    wheel_attach: DeferredRetry,
    wheel_attached: bool,
    layout: ChartLayout,
    grid_stroke: Stroke,
    activity_fill: Fill,
    fills: ActivityFills,
    paths: ChartPaths,
    position_passes: u64,
}

impl fmt::Debug for ResourceChart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceChart")
            .field("resources", &self.resources.len())
            .field("viewport", &self.viewport)
            .field("zoom_level", &self.zoom.current_index())
            .field("dirty", &self.element.invalidation().dirty_states())
            .finish_non_exhaustive()
    }
}

impl Default for ResourceChart {
    fn default() -> Self {
        Self::new()
    }
}

impl ResourceChart {
    #[must_use]
    pub fn new() -> Self {
        let scale_queue = SignalQueue::new();
        let timeline_queue = SignalQueue::new();
        let mut x_scale = DateTimeScale::new();
        x_scale.listen_signals(Box::new(scale_queue.clone()));
        let mut timeline = TimeLine::new();
        timeline.listen_signals(Box::new(timeline_queue.clone()));
        let mut chart = Self {
            element: ElementState::new(SOURCE, CHART_STATES, Signals::none()),
            x_scale,
            scale_queue,
            timeline,
            timeline_queue,
            x_scroll: Scrollbar::new(ScrollbarLayout::Horizontal),
            y_scroll: Scrollbar::new(ScrollbarLayout::Vertical),
            resources: Vec::new(),
            row_layout: RowLayout::default(),
            calendar: Calendar::default(),
            rows: ResourceRows::default(),
            selection: ActivitySelection::new(),
            viewport: ViewportState::default(),
            timeline_height: SizeSpec::Pixels(52.0),
            zoom: ZoomLevels::new(),
            requested_zoom: ZoomLevelRef::Index(0),
            interaction: InteractionState::default(),
            drag: None,
            frames: FrameCoalescer::new(),
            wheel_attach: DeferredRetry::new("resource_chart_wheel"),
            wheel_attached: false,
            layout: ChartLayout::default(),
            grid_stroke: Stroke::new(Color::rgb(0.87, 0.87, 0.87), 1.0),
            activity_fill: Fill::solid(Color::rgb(0.39, 0.58, 0.93)),
            fills: ActivityFills::default(),
            paths: ChartPaths::default(),
            position_passes: 0,
        };
        chart.set_zoom_levels(&crate::api::default_zoom_levels());
        chart
    }

    /// Translates queued child signals into chart invalidation.
    fn drain_child_signals(&mut self) {
        let mut states = ConsistencyStates::none();
        for event in self.scale_queue.drain() {
            if event.target_needs_recalculation() {
                states = states.union(X_POSITION_STATES);
            }
            if event.target_needs_reapplication() {
                states = states.union(X_REAPPLICATION_STATES);
                self.timeline.scale_changed();
            }
        }
        if self
            .timeline_queue
            .drain()
            .iter()
            .any(|event| event.target_needs_redraw())
        {
            states = states.with_state(ConsistencyState::ChartTimeLine);
        }
        if states != ConsistencyStates::none() {
            trace!(?states, "child signals translated");
            self.element.invalidate(states, Signal::NeedsRedraw);
        }
    }

    #[must_use]
    pub fn viewport(&self) -> ViewportState {
        self.viewport
    }

    #[must_use]
    pub fn x_scale(&self) -> &DateTimeScale {
        &self.x_scale
    }

    #[must_use]
    pub fn timeline(&self) -> &TimeLine {
        &self.timeline
    }

    #[must_use]
    pub fn x_scrollbar(&self) -> &Scrollbar {
        &self.x_scroll
    }

    #[must_use]
    pub fn y_scrollbar(&self) -> &Scrollbar {
        &self.y_scroll
    }

    #[must_use]
    pub fn layout(&self) -> ChartLayout {
        self.layout
    }

    #[must_use]
    pub fn rows(&self) -> &ResourceRows {
        &self.rows
    }

    #[must_use]
    pub fn resources(&self) -> &[Resource] {
        &self.resources
    }

    /// Cursor over every activity of the last calculation.
    #[must_use]
    pub fn activities(&self) -> ActivityIterator<'_> {
        ActivityIterator::new(&self.rows.registry)
    }

    /// Number of times the horizontal position was resolved.
    #[must_use]
    pub fn position_passes(&self) -> u64 {
        self.position_passes
    }

    pub fn set_resources(&mut self, resources: Vec<Resource>) {
        self.resources = resources;
        self.element
            .invalidate(ConsistencyState::ChartData, Signal::NeedsRedraw);
    }

    pub fn set_row_layout(&mut self, layout: RowLayout) {
        if self.row_layout != layout {
            self.row_layout = layout;
            self.element
                .invalidate(ConsistencyState::ChartData, Signal::NeedsRedraw);
        }
    }

    #[must_use]
    pub fn calendar(&self) -> &Calendar {
        &self.calendar
    }

    /// Working days change the daily allocation, so rows are recalculated.
    pub fn set_calendar(&mut self, calendar: Calendar) -> ChartResult<()> {
        calendar.validate()?;
        self.replace_calendar(calendar);
        Ok(())
    }

    fn replace_calendar(&mut self, calendar: Calendar) {
        if self.calendar != calendar {
            self.calendar = calendar;
            self.element
                .invalidate(ConsistencyState::ChartData, Signal::NeedsRedraw);
        }
    }

    #[must_use]
    pub fn time_tracking_mode(&self) -> TimeTrackingMode {
        TimeTrackingMode::from_flags(self.row_layout.shared_y_scale, self.row_layout.track_availability)
    }

    pub fn set_time_tracking_mode(&mut self, mode: TimeTrackingMode) {
        self.set_row_layout(RowLayout {
            shared_y_scale: mode.per_chart(),
            track_availability: mode.tracks_availability(),
            ..self.row_layout
        });
    }

    pub fn set_conflicts_height(&mut self, height: f64) {
        if !height.is_finite() || height < 0.0 {
            warn!(height, "ignoring invalid conflicts height");
            report_warning(WarningCode::IgnoredInvalidValue, SOURCE);
            return;
        }
        self.set_row_layout(RowLayout {
            conflict_height: height,
            ..self.row_layout
        });
    }

    #[must_use]
    pub fn activity_fills(&self) -> ActivityFills {
        self.fills
    }

    pub fn set_activity_fills(&mut self, fills: ActivityFills) -> ChartResult<()> {
        fills.conflict.color.validate()?;
        fills.conflict_label.validate()?;
        fills.hovered.color.validate()?;
        fills.selected.color.validate()?;
        if self.fills != fills {
            self.fills = fills;
            self.element.invalidate(ROW_OVERLAY_STATES, Signal::NeedsRedraw);
        }
        Ok(())
    }

    pub fn set_timeline_height(&mut self, height: SizeSpec) {
        if self.timeline_height != height {
            self.timeline_height = height;
            self.element.invalidate(
                ConsistencyState::Bounds,
                Signals::from_signal(Signal::NeedsRedraw).with_signal(Signal::BoundsChanged),
            );
        }
    }

    pub fn set_scrollbar_size(&mut self, size: f64) {
        self.x_scroll.set_size(size);
        self.y_scroll.set_size(size);
        self.element.invalidate(ConsistencyState::Bounds, Signal::NeedsRedraw);
    }

    pub fn set_kinetic_pan_config(&mut self, config: KineticPanConfig) {
        self.interaction.set_kinetic_pan_config(config);
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.element.set_enabled(enabled);
    }

    pub fn set_container(&mut self, container: Option<LayerId>) {
        self.element.set_container(container);
    }

    /// Date at the left edge of the viewport, once resolved.
    #[must_use]
    pub fn current_start_date(&self) -> Option<f64> {
        self.viewport.current_start_value
    }

    /// Pans to `date`; clamping happens on the next draw.
    pub fn set_current_start_date(&mut self, date: f64) {
        if !date.is_finite() {
            warn!(date, "ignoring non-finite start date");
            report_warning(WarningCode::IgnoredInvalidValue, SOURCE);
            return;
        }
        if self.viewport.current_start_value != Some(date) {
            self.viewport.current_start_value = Some(date);
            self.element
                .invalidate(ConsistencyState::ChartXScalePosition, Signal::NeedsRedraw);
        }
    }

    fn set_y_ratio(&mut self, ratio: f64) {
        if !ratio.is_finite() {
            report_warning(WarningCode::IgnoredInvalidValue, SOURCE);
            return;
        }
        if self.viewport.current_y_ratio != ratio {
            self.viewport.current_y_ratio = ratio;
            self.element
                .invalidate(ConsistencyState::ChartYRange, Signal::NeedsRedraw);
        }
    }

    /// Horizontal scrollbar moved so its thumb starts at `start_ratio`.
    pub fn handle_x_scroll(&mut self, start_ratio: f64) {
        let pixel = start_ratio * self.viewport.full_pixel_extent;
        let date = self
            .x_scale
            .pix_to_date(pixel - self.viewport.current_start_pixel);
        self.set_current_start_date(date);
    }

    pub fn handle_y_scroll(&mut self, start_ratio: f64) {
        self.set_y_ratio(start_ratio);
    }

    /// User drag of the horizontal thumb.
    pub fn scroll_x_thumb(&mut self, start_ratio: f64) -> Option<RangeChange> {
        let change = self.x_scroll.user_scroll(start_ratio)?;
        self.handle_x_scroll(change.start_ratio);
        Some(change)
    }

    /// User drag of the vertical thumb.
    pub fn scroll_y_thumb(&mut self, start_ratio: f64) -> Option<RangeChange> {
        let change = self.y_scroll.user_scroll(start_ratio)?;
        self.handle_y_scroll(change.start_ratio);
        Some(change)
    }

    /// Moves the viewport so it starts at content pixel `(x, y)`; both axes
    /// change in one batch.
    pub fn apply_pixel_target(&mut self, x: f64, y: f64) {
        self.suspend_signals_dispatching();
        let date = self.x_scale.pix_to_date(x - self.viewport.current_start_pixel);
        self.set_current_start_date(date);
        self.set_y_ratio(ratio_or_zero(y, self.viewport.full_pixel_height));
        self.resume_signals_dispatching(true);
    }

    #[must_use]
    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    #[must_use]
    pub fn drag_frames(&self) -> &FrameCoalescer<DragFrame> {
        &self.frames
    }

    #[must_use]
    pub fn interaction(&self) -> InteractionState {
        self.interaction
    }

    /// Press inside the content area. Returns `false` outside of it.
    pub fn start_drag(&mut self, pointer_x: f64, pointer_y: f64) -> bool {
        if !self.layout.content.contains_point(pointer_x, pointer_y) {
            return false;
        }
        let viewport = self.viewport;
        let limits = DragLimits::for_viewport(
            viewport.full_pixel_extent,
            viewport.viewport_width,
            viewport.full_pixel_height,
            viewport.viewport_height,
        );
        self.drag = Some(DragSession::start(
            pointer_x,
            pointer_y,
            viewport.current_start_pixel,
            viewport.current_y_pixel,
            limits,
        ));
        self.frames.cancel();
        self.interaction.on_drag_start();
        debug!(pointer_x, pointer_y, "resource chart drag started");
        true
    }

    /// Records a drag target. Returns `true` when the host has to schedule a
    /// frame; later targets before that frame replace the pending one.
    pub fn drag_to(&mut self, pointer_x: f64, pointer_y: f64, time_seconds: f64) -> bool {
        let Some(frame) = self
            .drag
            .as_mut()
            .and_then(|session| session.update(pointer_x, pointer_y, time_seconds))
        else {
            return false;
        };
        self.frames.request(frame)
    }

    /// Frame callback: applies the latest drag target.
    pub fn flush_drag_frame(&mut self) -> bool {
        let Some(frame) = self.frames.take() else {
            return false;
        };
        self.apply_pixel_target(frame.start_pixel, frame.y_pixel);
        true
    }

    /// Release: flushes the pending frame and hands the release velocity to
    /// kinetic pan.
    pub fn end_drag(&mut self) {
        self.flush_drag_frame();
        let Some(session) = self.drag.take() else {
            return;
        };
        self.interaction.on_drag_end();
        self.interaction.start_kinetic_pan(session.release_velocity());
        debug!(
            velocity = session.release_velocity(),
            "resource chart drag ended"
        );
    }

    /// Advances kinetic pan by `delta_seconds`. Returns `true` when the
    /// viewport moved.
    pub fn step_inertia(&mut self, delta_seconds: f64) -> bool {
        let Some(displacement) = self.interaction.step_kinetic_pan(delta_seconds) else {
            return false;
        };
        let viewport = self.viewport;
        let target = clamp_start_pixel(
            viewport.current_start_pixel + displacement,
            viewport.full_pixel_extent,
            viewport.viewport_width,
        );
        if target == viewport.current_start_pixel {
            self.interaction.stop_kinetic_pan();
            return false;
        }
        self.apply_pixel_target(target, viewport.current_y_pixel);
        true
    }

    #[must_use]
    pub fn wheel_attached(&self) -> bool {
        self.wheel_attached
    }

    /// Attaches the wheel listener once the host stage exists. Hosts keep
    /// polling from a zero-delay timer while this returns `Pending`.
    pub fn attach_wheel(&mut self, stage_ready: bool) -> RetryStatus {
        let attached = &mut self.wheel_attached;
        self.wheel_attach.poll(stage_ready, || *attached = true)
    }

    /// Pans by wheel deltas. Returns whether the host should prevent the
    /// default scrolling behavior.
    pub fn handle_wheel(&mut self, input: WheelInput) -> bool {
        if !self.wheel_attached {
            return false;
        }
        let (dx, dy) = match normalize_wheel_deltas(input) {
            Ok(deltas) => deltas,
            Err(error) => {
                warn!(%error, "ignoring wheel event");
                report_warning(WarningCode::IgnoredInvalidValue, SOURCE);
                return false;
            }
        };
        let viewport = self.viewport;
        let x = clamp_start_pixel(
            viewport.current_start_pixel + dx,
            viewport.full_pixel_extent,
            viewport.viewport_width,
        );
        let y = clamp_start_pixel(
            viewport.current_y_pixel + dy,
            viewport.full_pixel_height,
            viewport.viewport_height,
        );
        let changed = x != viewport.current_start_pixel || y != viewport.current_y_pixel;
        if changed {
            self.apply_pixel_target(x, y);
        }
        let horizontal = input.platform != WheelPlatform::Windows && dx != 0.0;
        horizontal || changed
    }

    #[must_use]
    pub fn zoom_levels(&self) -> &ZoomLevels {
        &self.zoom
    }

    /// Replaces the zoom levels and re-applies the requested level. Invalid
    /// definitions are dropped.
    pub fn set_zoom_levels(&mut self, configs: &[ZoomLevelConfig]) -> bool {
        if !self.zoom.replace(configs) {
            return false;
        }
        let requested = self.requested_zoom.clone();
        if self.zoom.select(&requested).is_none() {
            self.zoom.select(&ZoomLevelRef::Index(0));
        }
        self.apply_zoom_level();
        true
    }

    /// Selects a zoom level by id or index. Unknown ids leave the chart
    /// unchanged; indices clamp into range.
    pub fn set_zoom_level(&mut self, reference: ZoomLevelRef) -> bool {
        if self.zoom.select(&reference).is_none() {
            warn!(?reference, "unknown zoom level");
            report_warning(WarningCode::IgnoredInvalidValue, SOURCE);
            return false;
        }
        self.requested_zoom = reference;
        self.apply_zoom_level();
        true
    }

    /// Id of the current level when it has one, its index otherwise.
    #[must_use]
    pub fn zoom_level(&self) -> ZoomLevelRef {
        self.zoom.current_ref()
    }

    fn apply_zoom_level(&mut self) {
        let Some(level) = self.zoom.current().cloned() else {
            return;
        };
        self.suspend_signals_dispatching();
        self.x_scale
            .set_unit_spec(level.unit, level.count, level.unit_pix_size);
        self.timeline.set_levels(level.levels);
        self.drain_child_signals();
        self.resume_signals_dispatching(true);
        debug!(
            unit = ?level.unit,
            count = level.count,
            unit_pix_size = level.unit_pix_size,
            "zoom level applied"
        );
    }

    /// Applies a configuration in one batch.
    pub fn setup(&mut self, config: &ResourceChartConfig) -> ChartResult<()> {
        config.validate()?;
        self.suspend_signals_dispatching();
        self.set_timeline_height(config.timeline_height);
        self.set_row_layout(RowLayout {
            pix_per_hour: config.pix_per_hour,
            min_row_height: config.min_row_height,
            cell_padding: config.cell_padding,
            shared_y_scale: config.shared_y_scale,
            track_availability: config.track_availability,
            conflict_height: config.conflicts_height,
        });
        self.replace_calendar(config.calendar.clone());
        self.set_scrollbar_size(config.scrollbar_size);
        self.set_kinetic_pan_config(config.kinetic_pan);
        if let Some(reference) = &config.zoom_level {
            self.requested_zoom = reference.clone();
        }
        self.set_zoom_levels(&config.zoom_levels);
        if let Some(date) = config.current_start_date {
            self.set_current_start_date(date);
        }
        self.resume_signals_dispatching(true);
        Ok(())
    }

    fn resolve_layout(&mut self, parent: Bounds) {
        let without_y = self.y_scroll.remaining_bounds(parent);
        let inner = self.x_scroll.remaining_bounds(without_y);
        let timeline_height =
            resolve_size_or_zero(self.timeline_height, parent.height).clamp(0.0, inner.height.max(0.0));
        self.layout = ChartLayout {
            timeline: Bounds::new(inner.left, inner.top, inner.width, timeline_height),
            content: Bounds::new(
                inner.left,
                inner.top + timeline_height,
                inner.width,
                inner.height - timeline_height,
            ),
        };
        self.x_scroll.set_parent_bounds(Some(without_y));
        self.y_scroll.set_parent_bounds(Some(Bounds::new(
            parent.left,
            self.layout.content.top,
            parent.width,
            self.layout.content.height,
        )));
        self.timeline.set_parent_bounds(Some(self.layout.timeline));
        self.viewport.viewport_width = self.layout.content.width;
        self.viewport.viewport_height = self.layout.content.height;
    }

    fn calculate(&mut self) -> ChartResult<()> {
        self.rows = ResourceRows::compute(&self.resources, &self.row_layout, &self.calendar);
        if self.selection.prune(self.rows.registry.total()) {
            debug!("stale activity states dropped");
        }
        if let Some((minimum, maximum)) = self.rows.time_range {
            self.x_scale.set_range(minimum, maximum)?;
        }
        self.viewport.full_pixel_height = self.rows.full_pixel_height();
        self.element.invalidate(
            ConsistencyStates::from_state(ConsistencyState::ChartXScaleRange)
                .with_state(ConsistencyState::ChartYRange)
                .with_state(ConsistencyState::ChartGrid)
                .union(ROW_OVERLAY_STATES),
            Signals::none(),
        );
        Ok(())
    }

    /// Full extent from the scale domain; an unset start falls back to the
    /// scale minimum.
    fn apply_x_range(&mut self) {
        let minimum = self.x_scale.minimum();
        let maximum = self.x_scale.maximum();
        if self.viewport.current_start_value.is_none() {
            self.viewport.current_start_value = Some(minimum);
        }
        self.viewport.full_pixel_extent =
            (self.x_scale.date_to_pix(maximum) - self.x_scale.date_to_pix(minimum)).max(0.0);
        self.element
            .invalidate(ConsistencyState::ChartXScalePosition, Signals::none());
    }

    /// Pixel from value, clamped, then scale origin and scrollbar ratios.
    fn apply_x_position(&mut self) {
        let minimum = self.x_scale.minimum();
        let minimum_pixel = self.x_scale.date_to_pix(minimum);
        let current = self.viewport.current_start_value.unwrap_or(minimum);
        let start_pixel = self.x_scale.date_to_pix(current) - minimum_pixel;
        let clamped = clamp_start_pixel(
            start_pixel,
            self.viewport.full_pixel_extent,
            self.viewport.viewport_width,
        );
        let current = if clamped == start_pixel {
            current
        } else {
            self.x_scale.pix_to_date(minimum_pixel + clamped)
        };
        self.viewport.current_start_value = Some(current);
        self.x_scale.set_start_date(current);
        self.viewport.current_start_pixel = -self.x_scale.date_to_pix(minimum);
        let (start, end) = self.viewport.x_ratios();
        self.x_scroll.set_range_internal(start, end);
        self.position_passes = self.position_passes.saturating_add(1);
        trace!(
            start_pixel = self.viewport.current_start_pixel,
            full = self.viewport.full_pixel_extent,
            "x position resolved"
        );
    }

    fn apply_y_range(&mut self) {
        let viewport = &mut self.viewport;
        viewport.full_pixel_height = self.rows.full_pixel_height();
        let y = clamp_start_pixel(
            viewport.current_y_ratio * viewport.full_pixel_height,
            viewport.full_pixel_height,
            viewport.viewport_height,
        );
        viewport.current_y_pixel = y;
        viewport.current_y_ratio = ratio_or_zero(y, viewport.full_pixel_height);
        let (start, end) = viewport.y_ratios();
        self.y_scroll.set_range_internal(start, end);
        self.element.invalidate(
            ConsistencyStates::from_state(ConsistencyState::ChartYScroll)
                .with_state(ConsistencyState::ChartGrid),
            Signals::none(),
        );
    }

    /// Children redraw as part of the chart pass; their own signals are
    /// dropped on resume.
    fn set_children_suspended(&mut self, suspended: bool) {
        let mut children: [&mut dyn Invalidatable; 3] =
            [&mut self.timeline, &mut self.x_scroll, &mut self.y_scroll];
        if suspended {
            suspend_all(&mut children);
        } else {
            resume_all(&mut children, false);
        }
    }

    /// Row separators, unit separators and activity bars, clipped to the
    /// content area.
    fn draw_grid(&mut self, surface: &mut dyn VectorSurface, root: LayerId) -> ChartResult<()> {
        let content = self.layout.content;
        let layer = *self
            .paths
            .content
            .get_or_insert_with(|| surface.create_layer(Some(root)));
        let grid = *self
            .paths
            .grid
            .get_or_insert_with(|| surface.create_path(layer));
        let bars = *self
            .paths
            .activities
            .get_or_insert_with(|| surface.create_path(layer));
        surface.clear(grid);
        surface.clear(bars);
        surface.set_clip(layer, Some(content));

        let top = content.top - self.viewport.current_y_pixel;
        for bottom in self.rows.heights.cumulative_bottoms() {
            let y = top + bottom;
            if y >= content.top && y <= content.bottom() {
                surface.move_to(grid, content.left, y);
                surface.line_to(grid, content.right(), y);
            }
        }
        for tick in self.x_scale.ticks_between(0.0, content.width, None, None) {
            let x = content.left + self.x_scale.date_to_pix(tick.start);
            if x > content.left {
                surface.move_to(grid, x, content.top);
                surface.line_to(grid, x, content.bottom());
            }
        }
        surface.stroke(grid, Some(self.grid_stroke))?;

        for (index, resource) in self.resources.iter().enumerate() {
            let Some(row) = self.row_bounds(index) else {
                continue;
            };
            if row.bottom() < content.top || row.top > content.bottom() {
                continue;
            }
            for activity in &resource.activities {
                if let Some(bar) = self.activity_bounds(index, activity).filter(|bar| overlaps_x(*bar, content)) {
                    surface.append_rect(bars, bar);
                }
            }
        }
        surface.fill(bars, Some(self.activity_fill))
    }

    /// Row `index` in surface pixels, scrolled with the viewport.
    fn row_bounds(&self, index: usize) -> Option<Bounds> {
        let content = self.layout.content;
        let (row_top, row_bottom) = self.rows.heights.row_span(index)?;
        Some(Bounds::new(
            content.left,
            content.top - self.viewport.current_y_pixel + row_top,
            content.width,
            row_bottom - row_top,
        ))
    }

    /// Horizontal pixels of a time interval; `None` when not finite.
    fn date_span(&self, start: f64, end: f64) -> Option<(f64, f64)> {
        let left = self.layout.content.left + self.x_scale.date_to_pix(start);
        let right = self.layout.content.left + self.x_scale.date_to_pix(end);
        (left.is_finite() && right.is_finite()).then_some((left, right))
    }

    /// Bar of an activity of `resource`, below the conflicts strip when the
    /// resource has one.
    fn activity_bounds(&self, resource: usize, activity: &Activity) -> Option<Bounds> {
        let row = self.row_bounds(resource)?;
        let (left, right) = self.date_span(activity.start, activity.end)?;
        let inset = self.row_layout.cell_padding.resolve(row);
        let top = row.top + inset.top + self.row_layout.conflicts_strip(self.rows.has_conflicts(resource));
        Some(Bounds::new(
            left,
            top,
            right - left,
            (row.bottom() - inset.bottom - top).max(0.0),
        ))
    }

    fn located_activity_bounds(&self, global_index: usize) -> Option<Bounds> {
        let (resource, activity) = self.rows.registry.locate(global_index)?;
        let activity = self.resources.get(resource)?.activities.get(activity)?;
        self.activity_bounds(resource, activity)
    }

    /// Conflict strips with their overtime labels, at the top of each
    /// over-allocated row.
    fn draw_conflicts(&mut self, surface: &mut dyn VectorSurface, root: LayerId) -> ChartResult<()> {
        let content = self.layout.content;
        let layer = *self
            .paths
            .conflicts_layer
            .get_or_insert_with(|| surface.create_layer(Some(root)));
        let path = *self
            .paths
            .conflicts
            .get_or_insert_with(|| surface.create_path(layer));
        surface.clear(path);
        surface.clear_texts(layer);
        surface.set_clip(layer, Some(content));

        let height = self.row_layout.conflict_height.max(0.0);
        let mut drawn = 0usize;
        for span in &self.rows.conflicts {
            let (Some(row), Some((left, right))) = (self.row_bounds(span.resource), self.date_span(span.start, span.end))
            else {
                continue;
            };
            let inset = self.row_layout.cell_padding.resolve(row);
            let strip = Bounds::new(left, row.top + inset.top, right - left, height);
            if !overlaps_x(strip, content) || strip.bottom() < content.top || strip.top > content.bottom() {
                continue;
            }
            surface.append_rect(path, strip);
            if height > 0.0 {
                surface.draw_text(
                    layer,
                    TextPrimitive::new(
                        span.label.clone(),
                        strip.left + strip.width / 2.0,
                        strip.top + strip.height / 2.0,
                        CONFLICT_FONT_PX,
                        self.fills.conflict_label,
                        TextHAlign::Center,
                    ),
                )?;
            }
            drawn += 1;
        }
        trace!(spans = drawn, "conflicts drawn");
        surface.fill(path, Some(self.fills.conflict))
    }

    /// Selected and hovered bars drawn over the activity bars.
    fn draw_activity_states(&mut self, surface: &mut dyn VectorSurface, root: LayerId) -> ChartResult<()> {
        let layer = *self
            .paths
            .states_layer
            .get_or_insert_with(|| surface.create_layer(Some(root)));
        let selected = *self
            .paths
            .selected
            .get_or_insert_with(|| surface.create_path(layer));
        let hovered = *self
            .paths
            .hovered
            .get_or_insert_with(|| surface.create_path(layer));
        surface.clear(selected);
        surface.clear(hovered);
        surface.set_clip(layer, Some(self.layout.content));

        for index in self.selection.selected() {
            if let Some(bar) = self.located_activity_bounds(index) {
                surface.append_rect(selected, bar);
            }
        }
        if let Some(bar) = self
            .selection
            .hovered()
            .and_then(|index| self.located_activity_bounds(index))
        {
            surface.append_rect(hovered, bar);
        }
        surface.fill(selected, Some(self.fills.selected))?;
        surface.fill(hovered, Some(self.fills.hovered))
    }

    fn activity_states_changed(&mut self, changed: bool) -> bool {
        if changed {
            self.element
                .invalidate(ConsistencyState::ChartActivityStates, Signal::NeedsRedraw);
        }
        changed
    }

    /// Global index of an activity; warns on unknown pairs.
    fn checked_global_index(&self, resource: usize, activity: usize) -> Option<usize> {
        let index = self.rows.registry.global_index(resource, activity);
        if index.is_none() {
            warn!(resource, activity, "unknown activity");
            report_warning(WarningCode::IgnoredInvalidValue, SOURCE);
        }
        index
    }

    /// Position of activity `activity` of resource `resource` in the flat
    /// activity list of the last calculation.
    #[must_use]
    pub fn global_activity_index(&self, resource: usize, activity: usize) -> Option<usize> {
        self.rows.registry.global_index(resource, activity)
    }

    /// `(resource, activity)` under the hover.
    #[must_use]
    pub fn hovered_activity(&self) -> Option<(usize, usize)> {
        self.selection
            .hovered()
            .and_then(|index| self.rows.registry.locate(index))
    }

    /// `(resource, activity)` pairs of the selection, in activity order.
    #[must_use]
    pub fn selected_activities(&self) -> Vec<(usize, usize)> {
        self.selection
            .selected()
            .filter_map(|index| self.rows.registry.locate(index))
            .collect()
    }

    /// Hovers one activity, releasing the previous hover.
    pub fn hover_activity(&mut self, resource: usize, activity: usize) -> bool {
        let Some(index) = self.checked_global_index(resource, activity) else {
            return false;
        };
        let changed = self.selection.hover(index);
        self.activity_states_changed(changed)
    }

    pub fn unhover_activity(&mut self) -> bool {
        let changed = self.selection.unhover();
        self.activity_states_changed(changed)
    }

    /// Selects one activity. The previous selection is dropped unless
    /// `keep_existing` is set.
    pub fn select_activity(&mut self, resource: usize, activity: usize, keep_existing: bool) -> bool {
        let Some(index) = self.checked_global_index(resource, activity) else {
            return false;
        };
        let changed = self.selection.select(index, keep_existing);
        self.activity_states_changed(changed)
    }

    /// Unselects one activity, or every activity for `None`.
    pub fn unselect_activity(&mut self, target: Option<(usize, usize)>) -> bool {
        let index = match target {
            Some((resource, activity)) => match self.checked_global_index(resource, activity) {
                Some(index) => Some(index),
                None => return false,
            },
            None => None,
        };
        let changed = self.selection.unselect(index);
        self.activity_states_changed(changed)
    }

    /// Topmost activity bar under a pointer.
    #[must_use]
    pub fn activity_at(&self, x: f64, y: f64) -> Option<(usize, usize)> {
        let content = self.layout.content;
        if !content.contains_point(x, y) {
            return None;
        }
        let resource = self
            .rows
            .heights
            .row_at(y - content.top + self.viewport.current_y_pixel)?;
        self.resources
            .get(resource)?
            .activities
            .iter()
            .enumerate()
            .rev()
            .find(|(_, activity)| {
                self.activity_bounds(resource, activity)
                    .is_some_and(|bar| bar.contains_point(x, y))
            })
            .map(|(activity, _)| (resource, activity))
    }

    /// Moves the hover to the bar under the pointer.
    pub fn handle_pointer_move(&mut self, x: f64, y: f64) -> Option<ActivityEvent> {
        let Some((resource, activity)) = self.activity_at(x, y) else {
            self.unhover_activity();
            return None;
        };
        let global_index = self.rows.registry.global_index(resource, activity)?;
        let changed = self.selection.hover(global_index);
        self.activity_states_changed(changed).then_some(ActivityEvent::Hover {
            resource,
            activity,
            global_index,
        })
    }

    pub fn handle_pointer_leave(&mut self) {
        self.unhover_activity();
    }

    /// Selects the clicked bar. With `keep_existing` a selected bar is
    /// toggled off instead; a click on empty space clears the selection.
    pub fn handle_click(&mut self, x: f64, y: f64, keep_existing: bool) -> Option<ActivityEvent> {
        let Some((resource, activity)) = self.activity_at(x, y) else {
            if !keep_existing {
                let changed = self.selection.unselect(None);
                self.activity_states_changed(changed);
            }
            return None;
        };
        let global_index = self.rows.registry.global_index(resource, activity)?;
        let selected = if keep_existing && self.selection.is_selected(global_index) {
            self.selection.unselect(Some(global_index));
            false
        } else {
            self.selection.select(global_index, keep_existing);
            true
        };
        self.activity_states_changed(true);
        debug!(resource, activity, selected, "activity clicked");
        Some(ActivityEvent::Click {
            resource,
            activity,
            global_index,
            selected,
        })
    }
}

fn overlaps_x(bounds: Bounds, content: Bounds) -> bool {
    bounds.right() >= content.left && bounds.left <= content.right()
}

impl Boundable for ResourceChart {
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

impl Drawable for ResourceChart {
    fn draw(&mut self, surface: &mut dyn VectorSurface) -> ChartResult<()> {
        self.drain_child_signals();
        let stage_ready = self.element.container().is_some();
        self.attach_wheel(stage_ready);
        if !self.element.check_drawing_needed(surface, CHART_STATES) {
            return Ok(());
        }
        let root = self.element.apply_layer_states(surface);
        self.timeline.set_container(Some(root));
        self.x_scroll.set_container(Some(root));
        self.y_scroll.set_container(Some(root));
        self.set_children_suspended(true);

        if self.element.has_invalidation_state(ConsistencyState::Bounds) {
            let bounds = self.pixel_bounds();
            self.resolve_layout(bounds);
            self.element.invalidate(LAYOUT_STATES, Signals::none());
            self.element.mark_consistent(ConsistencyState::Bounds);
        }
        if self.element.has_invalidation_state(ConsistencyState::ChartData) {
            self.calculate()?;
            self.element.mark_consistent(ConsistencyState::ChartData);
        }
        self.drain_child_signals();
        if self
            .element
            .has_invalidation_state(ConsistencyState::ChartXScaleRange)
        {
            self.apply_x_range();
            self.element
                .mark_consistent(ConsistencyState::ChartXScaleRange);
        }
        if self
            .element
            .has_invalidation_state(ConsistencyState::ChartXScalePosition)
        {
            self.apply_x_position();
            self.element
                .mark_consistent(ConsistencyState::ChartXScalePosition);
        }
        self.drain_child_signals();
        if self.element.has_invalidation_state(ConsistencyState::ChartYRange) {
            self.apply_y_range();
            self.element.mark_consistent(ConsistencyState::ChartYRange);
        }
        if self.element.has_invalidation_state(ConsistencyState::ChartXScroll) {
            self.x_scroll.draw(surface)?;
            self.element.mark_consistent(ConsistencyState::ChartXScroll);
        }
        if self.element.has_invalidation_state(ConsistencyState::ChartYScroll) {
            self.y_scroll.draw(surface)?;
            self.element.mark_consistent(ConsistencyState::ChartYScroll);
        }
        if self.element.has_invalidation_state(ConsistencyState::ChartTimeLine) {
            self.timeline.draw(surface, &self.x_scale)?;
            self.element.mark_consistent(ConsistencyState::ChartTimeLine);
        }
        if self.element.has_invalidation_state(ConsistencyState::ChartGrid) {
            self.draw_grid(surface, root)?;
            self.element.invalidate(ROW_OVERLAY_STATES, Signals::none());
            self.element.mark_consistent(ConsistencyState::ChartGrid);
        }
        if self.element.has_invalidation_state(ConsistencyState::ChartConflicts) {
            self.draw_conflicts(surface, root)?;
            self.element.mark_consistent(ConsistencyState::ChartConflicts);
        }
        if self
            .element
            .has_invalidation_state(ConsistencyState::ChartActivityStates)
        {
            self.draw_activity_states(surface, root)?;
            self.element
                .mark_consistent(ConsistencyState::ChartActivityStates);
        }
        self.set_children_suspended(false);
        self.timeline_queue.clear();
        self.element.mark_consistent(ConsistencyState::Appearance);
        Ok(())
    }

    fn remove(&mut self, surface: &mut dyn VectorSurface) {
        self.timeline.remove(surface);
        self.x_scroll.remove(surface);
        self.y_scroll.remove(surface);
        self.element.remove_root(surface);
        self.element.invalidate(
            ConsistencyStates::from_state(ConsistencyState::ChartXScroll)
                .with_state(ConsistencyState::ChartYScroll)
                .with_state(ConsistencyState::ChartTimeLine),
            Signals::none(),
        );
    }
}

impl Invalidatable for ResourceChart {
    fn invalidation(&self) -> &InvalidationState {
        self.element.invalidation()
    }

    fn invalidation_mut(&mut self) -> &mut InvalidationState {
        self.element.invalidation_mut()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::{Activity, ActivityEvent, Calendar, Resource, ResourceChart, TimeTrackingMode, ZoomLevelRef};
    use crate::api::{LevelSpecConfig, ZoomLevelConfig};
    use crate::core::bounds::Bounds;
    use crate::core::consistency::ConsistencyState;
    use crate::core::data::DataSource;
    use crate::core::element::{Boundable, Drawable};
    use crate::core::invalidation::Invalidatable;
    use crate::core::signal::SignalEvent;
    use crate::core::time_scale::TimeUnit;
    use crate::interaction::{RetryStatus, WheelInput, WheelPlatform};
    use crate::render::{RecordingSurface, VectorSurface};

    const DAY: f64 = 86_400_000.0;
    const JAN_1_2024: f64 = 1_704_067_200_000.0;

    /// Twenty days at 50px per day in an 800x300 content area; eight rows
    /// of 54px.
    fn chart(surface: &mut RecordingSurface) -> ResourceChart {
        let mut chart = ResourceChart::new();
        chart.set_zoom_levels(&[ZoomLevelConfig::new(vec![LevelSpecConfig::new(TimeUnit::Day)])
            .with_unit_pix_size(50.0)]);
        chart.set_resources(
            (0..8)
                .map(|index| {
                    Resource::new(format!("r{index}")).with_activity(
                        Activity::new(JAN_1_2024 + 0.25 * DAY, JAN_1_2024 + 19.5 * DAY)
                            .with_minutes_per_day(60.0),
                    )
                })
                .collect(),
        );
        chart.set_parent_bounds(Some(Bounds::new(0.0, 0.0, 810.0, 362.0)));
        let stage = surface.create_layer(None);
        chart.set_container(Some(stage));
        chart.draw(surface).expect("draw");
        chart
    }

    #[test]
    fn first_draw_resolves_the_viewport() {
        let mut surface = RecordingSurface::new();
        let chart = chart(&mut surface);
        let viewport = chart.viewport();
        assert_eq!(chart.layout().content, Bounds::new(0.0, 52.0, 800.0, 300.0));
        assert_eq!(viewport.full_pixel_extent, 1000.0);
        assert_eq!(viewport.full_pixel_height, 432.0);
        assert_eq!(viewport.current_start_pixel, 0.0);
        assert_eq!(chart.current_start_date(), Some(JAN_1_2024));
        assert_eq!(chart.x_scrollbar().end_ratio(), 0.8);
        assert!(chart.is_consistent());
        assert!(chart.wheel_attached());
        assert_eq!(chart.activities().rows_count(), 8);
    }

    #[test]
    fn wheel_pan_clamps_and_round_trips() {
        let mut surface = RecordingSurface::new();
        let mut chart = chart(&mut surface);
        assert!(chart.handle_wheel(WheelInput::new(100.0, 0.0, WheelPlatform::Other)));
        chart.draw(&mut surface).expect("draw");

        let viewport = chart.viewport();
        assert!((viewport.current_start_pixel - 100.0).abs() <= 1e-9);
        let date = chart.current_start_date().expect("start date");
        assert!((date - (JAN_1_2024 + 2.0 * DAY)).abs() <= 1e-3);
        let scale = chart.x_scale();
        assert!((scale.pix_to_date(scale.date_to_pix(date)) - date).abs() <= 1e-3);
        assert!((chart.x_scrollbar().start_ratio() - 0.1).abs() <= 1e-6);
        assert!((chart.x_scrollbar().end_ratio() - 0.9).abs() <= 1e-6);

        assert!(chart.handle_wheel(WheelInput::new(500.0, 0.0, WheelPlatform::Other)));
        chart.draw(&mut surface).expect("draw");
        assert!((chart.viewport().current_start_pixel - 200.0).abs() <= 1e-9);

        assert!(chart.handle_wheel(WheelInput::new(10.0, 0.0, WheelPlatform::Other)));
        assert!(!chart.handle_wheel(WheelInput::new(1.0, 0.0, WheelPlatform::Windows)));
        assert!(chart.is_consistent());
    }

    #[test]
    fn wheel_is_ignored_until_the_stage_exists() {
        let mut chart = ResourceChart::new();
        assert!(!chart.handle_wheel(WheelInput::new(10.0, 0.0, WheelPlatform::Other)));
        assert_eq!(chart.attach_wheel(false), RetryStatus::Pending);
        assert_eq!(chart.attach_wheel(true), RetryStatus::Completed);
        assert_eq!(chart.attach_wheel(true), RetryStatus::Idle);
        assert!(chart.wheel_attached());
    }

    #[test]
    fn drag_frames_coalesce_and_hand_over_to_inertia() {
        let mut surface = RecordingSurface::new();
        let mut chart = chart(&mut surface);
        assert!(!chart.start_drag(400.0, 20.0));
        assert!(chart.start_drag(400.0, 200.0));
        assert!(!chart.drag_to(401.0, 200.0, 0.0));
        assert!(chart.drag_to(350.0, 200.0, 0.1));
        assert!(!chart.drag_to(300.0, 200.0, 0.2));
        assert!(chart.flush_drag_frame());
        assert!(!chart.flush_drag_frame());
        assert_eq!(chart.drag_frames().frames(), 1);
        chart.draw(&mut surface).expect("draw");
        assert!((chart.viewport().current_start_pixel - 100.0).abs() <= 1e-9);

        chart.end_drag();
        assert!(!chart.is_dragging());
        assert!(chart.step_inertia(0.1));
        chart.draw(&mut surface).expect("draw");
        assert!((chart.viewport().current_start_pixel - 150.0).abs() <= 1e-9);
    }

    #[test]
    fn vertical_scroll_is_clamped_and_republished() {
        let mut surface = RecordingSurface::new();
        let mut chart = chart(&mut surface);
        chart.handle_y_scroll(0.5);
        chart.draw(&mut surface).expect("draw");
        let viewport = chart.viewport();
        assert_eq!(viewport.current_y_pixel, 132.0);
        assert!((viewport.current_y_ratio - 132.0 / 432.0).abs() <= 1e-12);
        assert!((chart.y_scrollbar().start_ratio() - 132.0 / 432.0).abs() <= 1e-6);
        assert_eq!(chart.y_scrollbar().end_ratio(), 1.0);
    }

    #[test]
    fn thumb_drag_pans_by_ratio() {
        let mut surface = RecordingSurface::new();
        let mut chart = chart(&mut surface);
        let change = chart.scroll_x_thumb(0.5).expect("change");
        assert!((change.start_ratio - 0.2).abs() <= 1e-9);
        chart.draw(&mut surface).expect("draw");
        assert!((chart.viewport().current_start_pixel - 200.0).abs() <= 1e-6);
    }

    #[test]
    fn pan_by_value_is_clamped_on_draw() {
        let mut surface = RecordingSurface::new();
        let mut chart = chart(&mut surface);
        chart.set_current_start_date(JAN_1_2024 + 30.0 * DAY);
        chart.set_current_start_date(f64::NAN);
        chart.draw(&mut surface).expect("draw");
        assert!((chart.viewport().current_start_pixel - 200.0).abs() <= 1e-9);
        let date = chart.current_start_date().expect("start date");
        assert!((date - (JAN_1_2024 + 4.0 * DAY)).abs() <= 1e-3);
    }

    #[test]
    fn second_draw_is_free() {
        let mut surface = RecordingSurface::new();
        let mut chart = chart(&mut surface);
        let passes = chart.position_passes();
        let commands = surface.commands().len();
        chart.draw(&mut surface).expect("draw");
        assert_eq!(chart.position_passes(), passes);
        assert_eq!(surface.commands().len(), commands);
    }

    #[test]
    fn zoom_levels_apply_in_one_batch() {
        let mut chart = ResourceChart::new();
        let signals = Rc::new(Cell::new(0usize));
        let seen = signals.clone();
        chart.listen_signals(Box::new(move |_: &SignalEvent| seen.set(seen.get() + 1)));

        assert!(chart.set_zoom_level(ZoomLevelRef::from("weeks")));
        assert_eq!(signals.get(), 1);
        assert_eq!(chart.zoom_level(), ZoomLevelRef::from("weeks"));
        assert_eq!(chart.x_scale().unit_pix_size(), 100.0);
        assert_eq!(chart.timeline().levels().len(), 2);

        assert!(chart.set_zoom_level(ZoomLevelRef::Index(7)));
        assert_eq!(chart.zoom_level(), ZoomLevelRef::from("months"));
        assert!(!chart.set_zoom_level(ZoomLevelRef::from("decades")));
        assert_eq!(chart.zoom_level(), ZoomLevelRef::from("months"));
        assert_eq!(chart.x_scale().unit_pix_size(), 25.0);
    }

    #[test]
    fn pointer_hovers_and_selects_activity_bars() {
        let mut surface = RecordingSurface::new();
        let mut chart = chart(&mut surface);
        let signals = Rc::new(Cell::new(0usize));
        let seen = signals.clone();
        chart.listen_signals(Box::new(move |_: &SignalEvent| seen.set(seen.get() + 1)));

        // Row 2 spans 160..214 on the surface; its bar starts at x = 12.5.
        let event = chart.handle_pointer_move(100.0, 180.0).expect("hover");
        assert_eq!(
            event,
            ActivityEvent::Hover {
                resource: 2,
                activity: 0,
                global_index: 2,
            }
        );
        assert_eq!(signals.get(), 1);
        assert_eq!(chart.hovered_activity(), Some((2, 0)));
        assert!(chart.handle_pointer_move(120.0, 185.0).is_none());
        assert_eq!(signals.get(), 1);
        assert!(chart.has_invalidation_state(ConsistencyState::ChartActivityStates));
        assert!(!chart.has_invalidation_state(ConsistencyState::ChartGrid));
        chart.draw(&mut surface).expect("draw");
        assert!(chart.is_consistent());

        assert!(chart.handle_pointer_move(5.0, 180.0).is_none());
        assert_eq!(chart.hovered_activity(), None);

        assert!(matches!(
            chart.handle_click(100.0, 180.0, false),
            Some(ActivityEvent::Click { resource: 2, selected: true, .. })
        ));
        assert!(chart.handle_click(100.0, 240.0, true).is_some());
        assert_eq!(chart.selected_activities(), vec![(2, 0), (3, 0)]);
        assert!(matches!(
            chart.handle_click(100.0, 240.0, true),
            Some(ActivityEvent::Click { resource: 3, selected: false, .. })
        ));
        assert_eq!(chart.selected_activities(), vec![(2, 0)]);
        assert!(chart.handle_click(5.0, 180.0, false).is_none());
        assert!(chart.selected_activities().is_empty());
    }

    #[test]
    fn activities_are_addressed_by_resource_and_position() {
        let mut surface = RecordingSurface::new();
        let mut chart = chart(&mut surface);
        assert_eq!(chart.global_activity_index(5, 0), Some(5));
        assert_eq!(chart.global_activity_index(5, 1), None);

        assert!(chart.select_activity(1, 0, false));
        assert!(chart.select_activity(4, 0, true));
        assert!(!chart.select_activity(4, 0, true));
        assert!(!chart.select_activity(9, 0, false));
        assert!(chart.select_activity(6, 0, false));
        assert_eq!(chart.selected_activities(), vec![(6, 0)]);
        assert!(chart.hover_activity(6, 0));
        chart.draw(&mut surface).expect("draw");

        // Dropping resources forgets the states of the activities gone.
        chart.set_resources(chart.resources()[..3].to_vec());
        chart.draw(&mut surface).expect("draw");
        assert!(chart.selected_activities().is_empty());
        assert_eq!(chart.hovered_activity(), None);
        assert!(chart.select_activity(0, 0, false));
        assert!(chart.unselect_activity(Some((0, 0))));
        assert!(!chart.unselect_activity(None));
    }

    #[test]
    fn conflicts_grow_the_row_and_draw_their_overtime() {
        let mut surface = RecordingSurface::new();
        let mut chart = chart(&mut surface);
        let tuesday = JAN_1_2024 + DAY;
        let double_booked = Resource::new("crane")
            .with_activity(Activity::new(tuesday, tuesday + DAY).with_minutes_per_day(1_000.0))
            .with_activity(Activity::new(tuesday, tuesday + DAY).with_minutes_per_day(1_000.0));
        let mut resources = chart.resources().to_vec();
        resources[0] = double_booked;
        chart.set_resources(resources);
        chart.set_time_tracking_mode(TimeTrackingMode::ActivityPerResource);
        chart.draw(&mut surface).expect("draw");

        let rows = chart.rows();
        assert!(rows.has_conflicts(0));
        assert!(!rows.has_conflicts(1));
        assert_eq!(rows.conflicts.len(), 1);
        let heights = rows.heights.heights();
        assert!((heights[0] - (2_000.0 * 25.0 / 60.0 + 4.0 + 16.0)).abs() <= 1e-9);
        assert_eq!(heights[1], 54.0);
        assert!(
            surface
                .visible_texts()
                .iter()
                .any(|text| text.text == "9.35h (38.99%)")
        );
        // The strip covers 54..69; bars start below it.
        assert_eq!(chart.activity_at(75.0, 60.0), None);
        assert_eq!(chart.activity_at(75.0, 75.0), Some((0, 1)));

        let full = chart.viewport().full_pixel_height;
        chart.set_conflicts_height(0.0);
        chart.set_conflicts_height(f64::NAN);
        chart.draw(&mut surface).expect("draw");
        assert!((chart.viewport().full_pixel_height - (full - 15.0)).abs() <= 1e-9);
        assert!(!surface.visible_texts().iter().any(|text| text.text.ends_with("%)")));

        chart
            .set_calendar(Calendar::default().with_holiday(tuesday))
            .expect("calendar");
        assert!(chart.set_calendar(Calendar::default().with_working_minutes(-1.0)).is_err());
        chart.draw(&mut surface).expect("draw");
        assert!(!chart.rows().has_conflicts(0));
        assert!(chart.rows().conflicts.is_empty());
        assert!(chart.is_consistent());
    }

    #[test]
    fn removed_chart_comes_back_on_the_next_draw() {
        let mut surface = RecordingSurface::new();
        let mut chart = chart(&mut surface);
        let texts = surface.visible_texts().len();
        assert!(texts > 0);

        chart.remove(&mut surface);
        assert!(surface.visible_texts().is_empty());
        chart.draw(&mut surface).expect("redraw");
        assert_eq!(surface.visible_texts().len(), texts);
        assert!(chart.is_consistent());
    }
}
