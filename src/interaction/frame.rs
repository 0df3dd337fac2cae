/// At most one pending frame target; newer requests overwrite older ones.
///
/// The host schedules a frame callback when [`FrameCoalescer::request`]
/// returns `true` and calls [`FrameCoalescer::take`] from it.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameCoalescer<T> {
    pending: Option<T>,
    requests: u64,
    frames: u64,
}

impl<T> Default for FrameCoalescer<T> {
    fn default() -> Self {
        Self {
            pending: None,
            requests: 0,
            frames: 0,
        }
    }
}

impl<T> FrameCoalescer<T> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `target`; returns `true` when no frame was pending yet.
    pub fn request(&mut self, target: T) -> bool {
        self.requests = self.requests.saturating_add(1);
        self.pending.replace(target).is_none()
    }

    /// Latest target, clearing the pending frame.
    pub fn take(&mut self) -> Option<T> {
        let target = self.pending.take();
        if target.is_some() {
            self.frames = self.frames.saturating_add(1);
        }
        target
    }

    pub fn cancel(&mut self) {
        self.pending = None;
    }

    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    #[must_use]
    pub fn requests(&self) -> u64 {
        self.requests
    }

    #[must_use]
    pub fn frames(&self) -> u64 {
        self.frames
    }
}
