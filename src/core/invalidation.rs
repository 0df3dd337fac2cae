use tracing::trace;

use crate::error::{WarningCode, report_warning};

use super::consistency::{ConsistencyStates, Signals};
use super::signal::{ListenerId, SignalEvent, SignalListener, SignalListeners};

/// Dirty-state bookkeeping plus signal dispatch for one object.
///
/// Pure state machine: nothing here fails. Bits outside the supported masks
/// are dropped silently.
#[derive(Debug)]
pub struct InvalidationState {
    source: &'static str,
    supported_states: ConsistencyStates,
    supported_signals: Signals,
    dirty: ConsistencyStates,
    suspension_level: u32,
    pending: Signals,
    listeners: SignalListeners,
}

impl InvalidationState {
    /// Creates a state with every supported bit dirty, so the first draw
    /// services everything.
    #[must_use]
    pub fn new(
        source: &'static str,
        supported_states: ConsistencyStates,
        supported_signals: Signals,
    ) -> Self {
        Self {
            source,
            supported_states,
            supported_signals,
            dirty: supported_states,
            suspension_level: 0,
            pending: Signals::none(),
            listeners: SignalListeners::default(),
        }
    }

    #[must_use]
    pub fn source(&self) -> &'static str {
        self.source
    }

    #[must_use]
    pub fn supported_states(&self) -> ConsistencyStates {
        self.supported_states
    }

    #[must_use]
    pub fn supported_signals(&self) -> Signals {
        self.supported_signals
    }

    #[must_use]
    pub fn dirty_states(&self) -> ConsistencyStates {
        self.dirty
    }

    /// Marks `states` dirty and dispatches `signals`.
    ///
    /// Returns the bits that were clean before this call.
    pub fn invalidate(
        &mut self,
        states: impl Into<ConsistencyStates>,
        signals: impl Into<Signals>,
    ) -> ConsistencyStates {
        let states = states.into().intersection(self.supported_states);
        let effective = states.difference(self.dirty);
        self.dirty = self.dirty.union(states);
        self.dispatch_signal(signals.into());
        effective
    }

    /// Clears `states`. Clearing a clean bit is a no-op.
    pub fn mark_consistent(&mut self, states: impl Into<ConsistencyStates>) {
        self.dirty = self.dirty.difference(states.into());
    }

    #[must_use]
    pub fn has_invalidation_state(&self, states: impl Into<ConsistencyStates>) -> bool {
        self.dirty.intersects(states.into())
    }

    #[must_use]
    pub fn is_consistent(&self) -> bool {
        self.dirty.is_none()
    }

    pub fn dispatch_signal(&mut self, signals: Signals) {
        let signals = signals.intersection(self.supported_signals);
        if signals.is_none() {
            return;
        }
        if self.suspension_level > 0 {
            self.pending = self.pending.union(signals);
            return;
        }
        trace!(source = self.source, signals = signals.bits(), "dispatching signal");
        self.listeners.emit(&SignalEvent::new(self.source, signals));
    }

    pub fn suspend_signals_dispatching(&mut self) {
        self.suspension_level = self.suspension_level.saturating_add(1);
    }

    /// Leaves one suspension level. On the last level, the signals accumulated
    /// while suspended are dispatched once when `dispatch_pending` is set and
    /// dropped otherwise.
    pub fn resume_signals_dispatching(&mut self, dispatch_pending: bool) {
        if self.suspension_level == 0 {
            report_warning(WarningCode::NotSuspended, self.source);
            return;
        }
        self.suspension_level -= 1;
        if self.suspension_level > 0 {
            return;
        }
        let pending = std::mem::take(&mut self.pending);
        if dispatch_pending && !pending.is_none() {
            self.dispatch_signal(pending);
        }
    }

    #[must_use]
    pub fn is_suspended(&self) -> bool {
        self.suspension_level > 0
    }

    #[must_use]
    pub fn suspension_level(&self) -> u32 {
        self.suspension_level
    }

    #[must_use]
    pub fn pending_signals(&self) -> Signals {
        self.pending
    }

    pub fn listen_signals(&mut self, listener: Box<dyn SignalListener>) -> ListenerId {
        self.listeners.listen(listener)
    }

    pub fn unlisten_signals(&mut self, id: ListenerId) -> bool {
        self.listeners.unlisten(id)
    }

    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }
}

/// Capability of every object that tracks consistency states.
pub trait Invalidatable {
    fn invalidation(&self) -> &InvalidationState;
    fn invalidation_mut(&mut self) -> &mut InvalidationState;

    fn invalidate(
        &mut self,
        states: impl Into<ConsistencyStates>,
        signals: impl Into<Signals>,
    ) -> ConsistencyStates
    where
        Self: Sized,
    {
        self.invalidation_mut().invalidate(states, signals)
    }

    fn mark_consistent(&mut self, states: impl Into<ConsistencyStates>)
    where
        Self: Sized,
    {
        self.invalidation_mut().mark_consistent(states);
    }

    fn has_invalidation_state(&self, states: impl Into<ConsistencyStates>) -> bool
    where
        Self: Sized,
    {
        self.invalidation().has_invalidation_state(states)
    }

    fn is_consistent(&self) -> bool {
        self.invalidation().is_consistent()
    }

    fn suspend_signals_dispatching(&mut self) {
        self.invalidation_mut().suspend_signals_dispatching();
    }

    fn resume_signals_dispatching(&mut self, dispatch_pending: bool) {
        self.invalidation_mut()
            .resume_signals_dispatching(dispatch_pending);
    }

    fn listen_signals(&mut self, listener: Box<dyn SignalListener>) -> ListenerId {
        self.invalidation_mut().listen_signals(listener)
    }

    fn unlisten_signals(&mut self, id: ListenerId) -> bool {
        self.invalidation_mut().unlisten_signals(id)
    }
}

/// Suspends dispatching on every object of a batch.
pub fn suspend_all(objects: &mut [&mut dyn Invalidatable]) {
    for object in objects.iter_mut() {
        object.suspend_signals_dispatching();
    }
}

/// Resumes dispatching on every object of a batch, in order.
pub fn resume_all(objects: &mut [&mut dyn Invalidatable], dispatch_pending: bool) {
    for object in objects.iter_mut() {
        object.resume_signals_dispatching(dispatch_pending);
    }
}
