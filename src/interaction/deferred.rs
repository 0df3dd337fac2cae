use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryStatus {
    /// Not ready yet; poll again on the next tick.
    Pending,
    /// The operation ran on this poll.
    Completed,
    /// Already completed earlier or gave up.
    Idle,
}

/// Operation that reschedules itself until a host resource exists.
///
/// Hosts call [`DeferredRetry::poll`] from a zero-delay timer while it keeps
/// returning [`RetryStatus::Pending`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeferredRetry {
    name: &'static str,
    attempts: u32,
    max_attempts: Option<u32>,
    armed: bool,
}

impl DeferredRetry {
    #[must_use]
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            attempts: 0,
            max_attempts: None,
            armed: true,
        }
    }

    #[must_use]
    pub const fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = Some(max_attempts);
        self
    }

    /// Runs `run` once `ready` reports the resource exists.
    pub fn poll(&mut self, ready: bool, run: impl FnOnce()) -> RetryStatus {
        if !self.armed {
            return RetryStatus::Idle;
        }
        self.attempts = self.attempts.saturating_add(1);
        if ready {
            self.armed = false;
            run();
            debug!(operation = self.name, attempts = self.attempts, "deferred operation completed");
            return RetryStatus::Completed;
        }
        if self.max_attempts.is_some_and(|max| self.attempts >= max) {
            self.armed = false;
            debug!(operation = self.name, attempts = self.attempts, "deferred operation gave up");
            return RetryStatus::Idle;
        }
        RetryStatus::Pending
    }

    /// Arms the retry again, e.g. after the host stage was replaced.
    pub fn rearm(&mut self) {
        self.attempts = 0;
        self.armed = true;
    }

    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.armed
    }

    #[must_use]
    pub fn attempts(&self) -> u32 {
        self.attempts
    }
}

#[cfg(test)]
mod tests {
    use super::{DeferredRetry, RetryStatus};

    #[test]
    fn runs_once_when_the_resource_appears() {
        let mut retry = DeferredRetry::new("attach");
        let mut runs = 0;
        assert_eq!(retry.poll(false, || runs += 1), RetryStatus::Pending);
        assert_eq!(retry.poll(false, || runs += 1), RetryStatus::Pending);
        assert_eq!(retry.poll(true, || runs += 1), RetryStatus::Completed);
        assert_eq!(retry.poll(true, || runs += 1), RetryStatus::Idle);
        assert_eq!(runs, 1);
        assert_eq!(retry.attempts(), 3);
    }

    #[test]
    fn bounded_retry_gives_up() {
        let mut retry = DeferredRetry::new("attach").with_max_attempts(2);
        assert_eq!(retry.poll(false, || {}), RetryStatus::Pending);
        assert_eq!(retry.poll(false, || {}), RetryStatus::Idle);
        assert!(!retry.is_pending());
        retry.rearm();
        assert!(retry.is_pending());
    }
}
