use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;

use serde::Serialize;

use super::consistency::{Signal, Signals};

/// Change notification dispatched by an invalidatable object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SignalEvent {
    pub source: &'static str,
    pub signals: Signals,
}

impl SignalEvent {
    #[must_use]
    pub const fn new(source: &'static str, signals: Signals) -> Self {
        Self { source, signals }
    }

    #[must_use]
    pub const fn has_signal(self, signals: Signals) -> bool {
        self.signals.intersects(signals)
    }

    #[must_use]
    pub const fn target_needs_redraw(self) -> bool {
        self.signals.contains_signal(Signal::NeedsRedraw)
    }

    #[must_use]
    pub const fn target_needs_reapplication(self) -> bool {
        self.signals.contains_signal(Signal::NeedsReapplication)
    }

    #[must_use]
    pub const fn target_needs_recalculation(self) -> bool {
        self.signals.contains_signal(Signal::NeedsRecalculation)
    }

    #[must_use]
    pub const fn target_bounds_changed(self) -> bool {
        self.signals.contains_signal(Signal::BoundsChanged)
    }

    #[must_use]
    pub const fn target_data_changed(self) -> bool {
        self.signals.contains_signal(Signal::DataChanged)
    }

    #[must_use]
    pub const fn target_meta_changed(self) -> bool {
        self.signals.contains_signal(Signal::MetaChanged)
    }

    #[must_use]
    pub const fn target_enabled_changed(self) -> bool {
        self.signals.contains_signal(Signal::EnabledStateChanged)
    }
}

/// Receiver of signal events.
///
/// Implemented for every `FnMut(&SignalEvent)` so hosts can listen with a
/// closure; parents listening on owned children use [`SignalQueue`].
pub trait SignalListener {
    fn on_signal(&mut self, event: &SignalEvent);
}

impl<F> SignalListener for F
where
    F: FnMut(&SignalEvent),
{
    fn on_signal(&mut self, event: &SignalEvent) {
        self(event);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

impl ListenerId {
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

/// Listener registry owned by each invalidatable object.
#[derive(Default)]
pub struct SignalListeners {
    entries: Vec<(ListenerId, Box<dyn SignalListener>)>,
    next_id: u64,
}

impl fmt::Debug for SignalListeners {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignalListeners")
            .field("len", &self.entries.len())
            .field("next_id", &self.next_id)
            .finish()
    }
}

impl SignalListeners {
    pub fn listen(&mut self, listener: Box<dyn SignalListener>) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id = self.next_id.saturating_add(1);
        self.entries.push((id, listener));
        id
    }

    /// Removes a listener. Returns `true` when it was registered.
    pub fn unlisten(&mut self, id: ListenerId) -> bool {
        if let Some(position) = self.entries.iter().position(|(entry, _)| *entry == id) {
            self.entries.remove(position);
            return true;
        }
        false
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn emit(&mut self, event: &SignalEvent) {
        for (_, listener) in &mut self.entries {
            listener.on_signal(event);
        }
    }
}

/// Shared single-threaded inbox a parent registers on an owned child.
///
/// The child pushes into it during dispatch; the parent drains it right after
/// mutating the child and translates each event into its own invalidation.
#[derive(Debug, Clone, Default)]
pub struct SignalQueue {
    inner: Rc<RefCell<VecDeque<SignalEvent>>>,
}

impl SignalQueue {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn drain(&self) -> Vec<SignalEvent> {
        self.inner.borrow_mut().drain(..).collect()
    }

    /// Discards every queued event.
    pub fn clear(&self) {
        self.inner.borrow_mut().clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.borrow().is_empty()
    }
}

impl SignalListener for SignalQueue {
    fn on_signal(&mut self, event: &SignalEvent) {
        self.inner.borrow_mut().push_back(*event);
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::{SignalEvent, SignalListeners, SignalQueue};
    use crate::core::consistency::{Signal, Signals};

    #[test]
    fn closure_listeners_receive_events_until_removed() {
        let count = Rc::new(Cell::new(0usize));
        let mut listeners = SignalListeners::default();
        let seen = count.clone();
        let id = listeners.listen(Box::new(move |_: &SignalEvent| seen.set(seen.get() + 1)));

        let event = SignalEvent::new("test", Signal::NeedsRedraw.into());
        listeners.emit(&event);
        assert_eq!(count.get(), 1);

        assert!(listeners.unlisten(id));
        assert!(!listeners.unlisten(id));
        listeners.emit(&event);
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn queue_clones_share_one_inbox() {
        let queue = SignalQueue::new();
        let mut listeners = SignalListeners::default();
        listeners.listen(Box::new(queue.clone()));

        listeners.emit(&SignalEvent::new(
            "scale",
            Signals::from_signal(Signal::NeedsReapplication),
        ));
        assert_eq!(queue.len(), 1);

        let drained = queue.drain();
        assert_eq!(drained.len(), 1);
        assert!(drained[0].target_needs_reapplication());
        assert!(!drained[0].target_needs_redraw());
        assert!(queue.is_empty());

        listeners.emit(&SignalEvent::new("scale", Signals::from_signal(Signal::NeedsRedraw)));
        queue.clear();
        assert!(queue.is_empty());
    }
}
