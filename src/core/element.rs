use tracing::debug;

use crate::error::{ChartResult, ErrorCode, report_error};
use crate::render::{LayerId, VectorSurface};

use super::bounds::Bounds;
use super::consistency::{ConsistencyState, ConsistencyStates, Signal, Signals};
use super::invalidation::{Invalidatable, InvalidationState};

/// Something that renders into a [`VectorSurface`] when its state is dirty.
pub trait Drawable: Invalidatable {
    /// Services every dirty consistency state. Configuration problems are
    /// reported on the error channel and leave the element blank instead of
    /// failing the whole pass.
    fn draw(&mut self, surface: &mut dyn VectorSurface) -> ChartResult<()>;

    /// Detaches everything the element drew.
    fn remove(&mut self, surface: &mut dyn VectorSurface);
}

/// Element laid out inside parent-provided bounds.
pub trait Boundable {
    fn parent_bounds(&self) -> Option<Bounds>;

    fn set_parent_bounds(&mut self, bounds: Option<Bounds>);

    /// Resolved pixel rectangle; recomputed lazily while `Bounds` is dirty.
    fn pixel_bounds(&mut self) -> Bounds;
}

/// Base state every drawable element composes: enabled flag, z-index,
/// container layer, parent bounds and consistency bookkeeping.
#[derive(Debug)]
pub struct ElementState {
    enabled: bool,
    z_index: i32,
    container: Option<LayerId>,
    root_layer: Option<LayerId>,
    parent_bounds: Option<Bounds>,
    invalidation: InvalidationState,
}

impl ElementState {
    #[must_use]
    pub fn new(source: &'static str, states: ConsistencyStates, signals: Signals) -> Self {
        Self {
            enabled: true,
            z_index: 0,
            container: None,
            root_layer: None,
            parent_bounds: None,
            invalidation: InvalidationState::new(
                source,
                ConsistencyStates::ELEMENT.union(states),
                Signals::ELEMENT.union(signals),
            ),
        }
    }

    #[must_use]
    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        if self.enabled != enabled {
            self.enabled = enabled;
            self.invalidation.invalidate(
                ConsistencyState::Enabled,
                Signals::from_signal(Signal::NeedsRedraw).with_signal(Signal::EnabledStateChanged),
            );
        }
    }

    #[must_use]
    pub fn z_index(&self) -> i32 {
        self.z_index
    }

    pub fn set_z_index(&mut self, z_index: i32) {
        if self.z_index != z_index {
            self.z_index = z_index;
            self.invalidation
                .invalidate(ConsistencyState::ZIndex, Signal::NeedsRedraw);
        }
    }

    #[must_use]
    pub fn container(&self) -> Option<LayerId> {
        self.container
    }

    pub fn set_container(&mut self, container: Option<LayerId>) {
        if self.container != container {
            self.container = container;
            self.invalidation
                .invalidate(ConsistencyState::Container, Signal::NeedsRedraw);
        }
    }

    #[must_use]
    pub fn parent_bounds(&self) -> Option<Bounds> {
        self.parent_bounds
    }

    /// Returns `true` when the bounds actually changed and `Bounds` got dirty.
    pub fn set_parent_bounds(&mut self, bounds: Option<Bounds>) -> bool {
        if self.parent_bounds == bounds {
            return false;
        }
        self.parent_bounds = bounds;
        self.invalidation.invalidate(
            ConsistencyState::Bounds,
            Signals::from_signal(Signal::NeedsRedraw).with_signal(Signal::BoundsChanged),
        );
        true
    }

    #[must_use]
    pub fn root_layer(&self) -> Option<LayerId> {
        self.root_layer
    }

    /// Layer holding everything the element draws, created on first use.
    pub fn ensure_root_layer(&mut self, surface: &mut dyn VectorSurface) -> LayerId {
        if let Some(layer) = self.root_layer {
            return layer;
        }
        let layer = surface.create_layer(self.container);
        self.root_layer = Some(layer);
        layer
    }

    /// Gate run at the top of every `draw()`.
    ///
    /// Disabling removes the element once and keeps `Container` plus
    /// `reentry` dirty so re-enabling redraws it from scratch.
    pub fn check_drawing_needed(
        &mut self,
        surface: &mut dyn VectorSurface,
        reentry: ConsistencyStates,
    ) -> bool {
        if self.invalidation.is_consistent() {
            return false;
        }
        if !self.enabled {
            if self
                .invalidation
                .has_invalidation_state(ConsistencyState::Enabled)
            {
                self.remove_root(surface);
                self.invalidation.mark_consistent(ConsistencyState::Enabled);
                self.invalidation.invalidate(
                    reentry.with_state(ConsistencyState::Container),
                    Signals::none(),
                );
                debug!(source = self.invalidation.source(), "element disabled, removed");
            }
            return false;
        }
        if self.container.is_none() {
            self.remove_root(surface);
            self.invalidation
                .invalidate(ConsistencyState::Container, Signals::none());
            report_error(ErrorCode::ContainerNotSet, self.invalidation.source());
            return false;
        }
        if self
            .invalidation
            .has_invalidation_state(ConsistencyState::Enabled)
        {
            self.invalidation.mark_consistent(ConsistencyState::Enabled);
            self.invalidation
                .invalidate(ConsistencyState::Container, Signals::none());
        }
        true
    }

    /// Services `ZIndex` and `Container` on the root layer.
    pub fn apply_layer_states(&mut self, surface: &mut dyn VectorSurface) -> LayerId {
        let layer = self.ensure_root_layer(surface);
        if self
            .invalidation
            .has_invalidation_state(ConsistencyState::ZIndex)
        {
            surface.set_z_index(layer, self.z_index);
            self.invalidation.mark_consistent(ConsistencyState::ZIndex);
        }
        if self
            .invalidation
            .has_invalidation_state(ConsistencyState::Container)
        {
            surface.set_parent(layer, self.container);
            self.invalidation.mark_consistent(ConsistencyState::Container);
        }
        layer
    }

    /// Detaches the root layer. `Container` turns dirty so the next draw
    /// re-parents it.
    pub fn remove_root(&mut self, surface: &mut dyn VectorSurface) {
        if let Some(layer) = self.root_layer {
            surface.remove_layer(layer);
            self.invalidation
                .invalidate(ConsistencyState::Container, Signals::none());
        }
    }
}

impl Invalidatable for ElementState {
    fn invalidation(&self) -> &InvalidationState {
        &self.invalidation
    }

    fn invalidation_mut(&mut self) -> &mut InvalidationState {
        &mut self.invalidation
    }
}
