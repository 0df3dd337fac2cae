use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::core::bounds::{Bounds, Orientation, Padding, remaining_bounds};
use crate::core::consistency::{ConsistencyState, ConsistencyStates, Signal, Signals};
use crate::core::element::{Boundable, Drawable, ElementState};
use crate::core::invalidation::{Invalidatable, InvalidationState};
use crate::error::{ChartResult, WarningCode, report_warning};
use crate::render::{Color, Fill, LayerId, PathId, VectorSurface};

/// Ratios are stored as integers in `[0, MAX_RATIO]` so repeated
/// float round trips cannot drift the thumb.
pub const MAX_RATIO: u32 = 1_000_000;
pub const DEFAULT_SCROLLBAR_SIZE: f64 = 10.0;

const SCROLLBAR_STATES: ConsistencyStates =
    ConsistencyStates::from_state(ConsistencyState::ScrollbarRange);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScrollbarLayout {
    Horizontal,
    Vertical,
}

impl ScrollbarLayout {
    const fn orientation(self) -> Orientation {
        match self {
            Self::Horizontal => Orientation::Bottom,
            Self::Vertical => Orientation::Right,
        }
    }
}

/// Thumb range expressed as content fractions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RangeChange {
    pub start_ratio: f64,
    pub end_ratio: f64,
}

fn to_units(ratio: f64) -> u32 {
    if !ratio.is_finite() {
        return 0;
    }
    (ratio.clamp(0.0, 1.0) * f64::from(MAX_RATIO)).round() as u32
}

fn to_ratio(units: u32) -> f64 {
    f64::from(units) / f64::from(MAX_RATIO)
}

/// Track plus thumb docked on one edge of the resource chart.
#[derive(Debug)]
pub struct Scrollbar {
    element: ElementState,
    layout: ScrollbarLayout,
    size: f64,
    start: u32,
    end: u32,
    track_fill: Fill,
    thumb_fill: Fill,
    paths: Option<(PathId, PathId)>,
}

impl Scrollbar {
    #[must_use]
    pub fn new(layout: ScrollbarLayout) -> Self {
        Self {
            element: ElementState::new("scrollbar", SCROLLBAR_STATES, Signals::none()),
            layout,
            size: DEFAULT_SCROLLBAR_SIZE,
            start: 0,
            end: MAX_RATIO,
            track_fill: Fill::solid(Color::rgb(0.94, 0.94, 0.94)),
            thumb_fill: Fill::solid(Color::rgb(0.75, 0.75, 0.75)),
            paths: None,
        }
    }

    #[must_use]
    pub fn layout(&self) -> ScrollbarLayout {
        self.layout
    }

    #[must_use]
    pub fn size(&self) -> f64 {
        self.size
    }

    pub fn set_size(&mut self, size: f64) {
        if !size.is_finite() || size < 0.0 {
            report_warning(WarningCode::IgnoredInvalidValue, "scrollbar");
            return;
        }
        if self.size != size {
            self.size = size;
            self.element.invalidate(
                ConsistencyState::Bounds,
                Signals::from_signal(Signal::NeedsRedraw).with_signal(Signal::BoundsChanged),
            );
        }
    }

    pub fn set_fills(&mut self, track: Fill, thumb: Fill) -> ChartResult<()> {
        track.color.validate()?;
        thumb.color.validate()?;
        if self.track_fill != track || self.thumb_fill != thumb {
            self.track_fill = track;
            self.thumb_fill = thumb;
            self.element
                .invalidate(ConsistencyState::Appearance, Signal::NeedsRedraw);
        }
        Ok(())
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.element.set_enabled(enabled);
    }

    pub fn set_container(&mut self, container: Option<LayerId>) {
        self.element.set_container(container);
    }

    #[must_use]
    pub fn start_ratio(&self) -> f64 {
        to_ratio(self.start)
    }

    #[must_use]
    pub fn end_ratio(&self) -> f64 {
        to_ratio(self.end)
    }

    /// Moves the thumb without reporting a user scroll. Reversed ratios are
    /// swapped. Returns `true` when the stored range changed.
    pub fn set_range_internal(&mut self, start_ratio: f64, end_ratio: f64) -> bool {
        let mut start = to_units(start_ratio);
        let mut end = to_units(end_ratio);
        if start > end {
            std::mem::swap(&mut start, &mut end);
        }
        if self.start == start && self.end == end {
            return false;
        }
        self.start = start;
        self.end = end;
        self.element
            .invalidate(ConsistencyState::ScrollbarRange, Signal::NeedsRedraw);
        true
    }

    /// Thumb dragged so it starts at `start_ratio`; the thumb keeps its size.
    pub fn user_scroll(&mut self, start_ratio: f64) -> Option<RangeChange> {
        if !start_ratio.is_finite() {
            report_warning(WarningCode::IgnoredInvalidValue, "scrollbar");
            return None;
        }
        let span = self.end - self.start;
        let start = to_units(start_ratio).min(MAX_RATIO - span);
        if !self.set_range_internal(to_ratio(start), to_ratio(start + span)) {
            return None;
        }
        Some(RangeChange {
            start_ratio: self.start_ratio(),
            end_ratio: self.end_ratio(),
        })
    }

    /// Strip of `parent` the bar occupies.
    #[must_use]
    pub fn bar_bounds(&self, parent: Bounds) -> Bounds {
        match self.layout {
            ScrollbarLayout::Horizontal => Bounds::new(
                parent.left,
                parent.bottom() - self.size,
                parent.width,
                self.size,
            ),
            ScrollbarLayout::Vertical => Bounds::new(
                parent.right() - self.size,
                parent.top,
                self.size,
                parent.height,
            ),
        }
    }

    /// `parent` minus the bar.
    #[must_use]
    pub fn remaining_bounds(&self, parent: Bounds) -> Bounds {
        if !self.element.enabled() {
            return parent;
        }
        remaining_bounds(
            parent,
            self.bar_bounds(parent),
            Padding::default(),
            self.layout.orientation(),
        )
    }

    fn thumb_bounds(&self, track: Bounds) -> Bounds {
        let (start, end) = (self.start_ratio(), self.end_ratio());
        match self.layout {
            ScrollbarLayout::Horizontal => Bounds::new(
                track.left + track.width * start,
                track.top,
                track.width * (end - start),
                track.height,
            ),
            ScrollbarLayout::Vertical => Bounds::new(
                track.left,
                track.top + track.height * start,
                track.width,
                track.height * (end - start),
            ),
        }
    }
}

impl Boundable for Scrollbar {
    fn parent_bounds(&self) -> Option<Bounds> {
        self.element.parent_bounds()
    }

    fn set_parent_bounds(&mut self, bounds: Option<Bounds>) {
        self.element.set_parent_bounds(bounds);
    }

    fn pixel_bounds(&mut self) -> Bounds {
        let parent = self.element.parent_bounds().unwrap_or_default();
        self.bar_bounds(parent).round()
    }
}

impl Drawable for Scrollbar {
    fn draw(&mut self, surface: &mut dyn VectorSurface) -> ChartResult<()> {
        if !self
            .element
            .check_drawing_needed(surface, SCROLLBAR_STATES.with_state(ConsistencyState::Appearance))
        {
            return Ok(());
        }
        let layer = self.element.apply_layer_states(surface);
        let (track, thumb) = *self
            .paths
            .get_or_insert_with(|| (surface.create_path(layer), surface.create_path(layer)));
        let bounds = self.pixel_bounds();
        surface.clear(track);
        surface.clear(thumb);
        surface.append_rect(track, bounds);
        surface.append_rect(thumb, self.thumb_bounds(bounds));
        surface.fill(track, Some(self.track_fill))?;
        surface.fill(thumb, Some(self.thumb_fill))?;
        trace!(
            start = self.start_ratio(),
            end = self.end_ratio(),
            "drew scrollbar"
        );
        self.element.mark_consistent(
            SCROLLBAR_STATES
                .with_state(ConsistencyState::Appearance)
                .with_state(ConsistencyState::Bounds),
        );
        Ok(())
    }

    fn remove(&mut self, surface: &mut dyn VectorSurface) {
        self.element.remove_root(surface);
    }
}

impl Invalidatable for Scrollbar {
    fn invalidation(&self) -> &InvalidationState {
        self.element.invalidation()
    }

    fn invalidation_mut(&mut self) -> &mut InvalidationState {
        self.element.invalidation_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::{Scrollbar, ScrollbarLayout};
    use crate::core::bounds::Bounds;
    use crate::core::consistency::ConsistencyState;
    use crate::core::element::{Boundable, Drawable};
    use crate::core::invalidation::Invalidatable;
    use crate::render::{RecordingSurface, VectorSurface};

    #[test]
    fn internal_range_is_rounded_clamped_and_ordered() {
        let mut bar = Scrollbar::new(ScrollbarLayout::Horizontal);
        bar.mark_consistent(ConsistencyState::ScrollbarRange);
        assert!(bar.set_range_internal(0.9, 0.1 + 1e-9));
        assert_eq!(bar.start_ratio(), 0.1);
        assert_eq!(bar.end_ratio(), 0.9);
        assert!(bar.has_invalidation_state(ConsistencyState::ScrollbarRange));

        bar.mark_consistent(ConsistencyState::ScrollbarRange);
        assert!(!bar.set_range_internal(0.1 + 1e-8, 0.9));
        assert!(!bar.has_invalidation_state(ConsistencyState::ScrollbarRange));
        assert!(bar.set_range_internal(-1.0, 4.0));
        assert_eq!((bar.start_ratio(), bar.end_ratio()), (0.0, 1.0));
    }

    #[test]
    fn user_scroll_keeps_the_thumb_size() {
        let mut bar = Scrollbar::new(ScrollbarLayout::Horizontal);
        bar.set_range_internal(0.0, 0.25);
        let change = bar.user_scroll(0.9).expect("change");
        assert_eq!(change.start_ratio, 0.75);
        assert_eq!(change.end_ratio, 1.0);
        assert!(bar.user_scroll(0.9).is_none());
        assert_eq!(bar.end_ratio(), 1.0);
        assert!(bar.user_scroll(f64::NAN).is_none());
    }

    #[test]
    fn bar_docks_on_its_edge() {
        let mut bar = Scrollbar::new(ScrollbarLayout::Vertical);
        let parent = Bounds::new(0.0, 0.0, 200.0, 100.0);
        assert_eq!(bar.bar_bounds(parent), Bounds::new(190.0, 0.0, 10.0, 100.0));
        assert_eq!(bar.remaining_bounds(parent), Bounds::new(0.0, 0.0, 190.0, 100.0));
        bar.set_parent_bounds(Some(parent));

        let mut surface = RecordingSurface::new();
        let stage = surface.create_layer(None);
        bar.set_container(Some(stage));
        bar.set_range_internal(0.5, 1.0);
        bar.draw(&mut surface).expect("draw");
        assert_eq!(surface.fill_calls(), 2);
        assert!(bar.is_consistent());
    }
}
