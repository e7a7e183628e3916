//! Bounded waiting and cooperative cancellation for locked work

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::domain::result::{Error, Result};

/// Shared flag a caller flips to abandon a transfer that has not committed yet
#[derive(Debug, Clone, Default)]
pub struct CancelHandle(Arc<AtomicBool>);

impl CancelHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Point in time after which lock waits and commits give up
#[derive(Debug, Clone)]
pub struct Deadline {
    started: Instant,
    at: Instant,
    cancel: Option<CancelHandle>,
}

impl Deadline {
    pub fn after(timeout: Duration) -> Self {
        let started = Instant::now();
        Self {
            started,
            at: started + timeout,
            cancel: None,
        }
    }

    pub fn with_cancel(mut self, cancel: CancelHandle) -> Self {
        self.cancel = Some(cancel);
        self
    }

    /// Time left, or `None` once expired
    pub fn remaining(&self) -> Option<Duration> {
        self.at
            .checked_duration_since(Instant::now())
            .filter(|d| !d.is_zero())
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(CancelHandle::is_cancelled)
    }

    /// Error describing why work must stop now
    pub fn timeout_error(&self) -> Error {
        Error::ConcurrencyTimeout {
            waited_ms: self.started.elapsed().as_millis() as u64,
        }
    }

    /// Fails if the caller cancelled or the deadline has passed
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            return Err(Error::Cancelled);
        }
        if self.remaining().is_none() {
            return Err(self.timeout_error());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deadline_expires() {
        let deadline = Deadline::after(Duration::ZERO);
        assert!(deadline.remaining().is_none());
        assert!(matches!(deadline.check(), Err(Error::ConcurrencyTimeout { .. })));

        let generous = Deadline::after(Duration::from_secs(60));
        assert!(generous.check().is_ok());
    }

    #[test]
    fn test_cancel_takes_priority() {
        let cancel = CancelHandle::new();
        let deadline = Deadline::after(Duration::ZERO).with_cancel(cancel.clone());
        cancel.cancel();
        assert!(matches!(deadline.check(), Err(Error::Cancelled)));
    }
}
