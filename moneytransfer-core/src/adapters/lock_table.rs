//! Per-account exclusive locks with ordered acquisition
//!
//! Every caller locks account names in ascending byte order, one at a time.
//! Two transfers over the same pair in opposite directions therefore queue on
//! the same first lock instead of deadlocking. Transfers over disjoint
//! accounts never wait on each other.

use std::collections::HashSet;
use std::sync::{Condvar, Mutex};
use std::time::Duration;

use crate::domain::result::{Error, Result};
use crate::ports::Deadline;

/// Upper bound on one condvar wait so a cancelled caller notices promptly
const CANCEL_POLL: Duration = Duration::from_millis(25);

#[derive(Debug, Default)]
pub struct LockTable {
    held: Mutex<HashSet<String>>,
    released: Condvar,
}

/// Releases every lock it holds when dropped
#[derive(Debug)]
pub struct PairGuard<'a> {
    table: &'a LockTable,
    names: Vec<String>,
}

impl Drop for PairGuard<'_> {
    fn drop(&mut self) {
        self.table.release(&self.names);
    }
}

/// Canonical acquisition order for a pair of names
pub fn lock_order<'n>(a: &'n str, b: &'n str) -> Vec<&'n str> {
    let mut order = vec![a, b];
    order.sort_unstable();
    order.dedup();
    order
}

impl LockTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lock both names in canonical order, waiting until `deadline`
    ///
    /// If the second lock cannot be taken in time the first is released
    /// before returning the error.
    pub fn lock_pair(&self, a: &str, b: &str, deadline: &Deadline) -> Result<PairGuard<'_>> {
        let mut guard = PairGuard {
            table: self,
            names: Vec::with_capacity(2),
        };
        for name in lock_order(a, b) {
            self.acquire(name, deadline)?;
            guard.names.push(name.to_string());
        }
        Ok(guard)
    }

    pub fn is_locked(&self, name: &str) -> bool {
        match self.held.lock() {
            Ok(held) => held.contains(name),
            Err(poisoned) => poisoned.into_inner().contains(name),
        }
    }

    fn acquire(&self, name: &str, deadline: &Deadline) -> Result<()> {
        let mut held = self.held.lock()?;
        while held.contains(name) {
            if deadline.is_cancelled() {
                return Err(Error::Cancelled);
            }
            let Some(remaining) = deadline.remaining() else {
                return Err(deadline.timeout_error());
            };
            let (next, _) = self.released.wait_timeout(held, remaining.min(CANCEL_POLL))?;
            held = next;
        }
        held.insert(name.to_string());
        Ok(())
    }

    fn release(&self, names: &[String]) {
        if names.is_empty() {
            return;
        }
        let mut held = match self.held.lock() {
            Ok(held) => held,
            Err(poisoned) => poisoned.into_inner(),
        };
        for name in names {
            held.remove(name);
        }
        drop(held);
        self.released.notify_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;
    use std::sync::Arc;
    use std::thread;

    use crate::ports::CancelHandle;

    fn patient() -> Deadline {
        Deadline::after(Duration::from_secs(5))
    }

    #[test]
    fn test_order_is_independent_of_arguments() {
        assert_eq!(lock_order("Bob", "Alice"), vec!["Alice", "Bob"]);
        assert_eq!(lock_order("Alice", "Bob"), vec!["Alice", "Bob"]);
        // Case-sensitive: uppercase sorts first
        assert_eq!(lock_order("alice", "Bob"), vec!["Bob", "alice"]);
        assert_eq!(lock_order("Alice", "Alice"), vec!["Alice"]);
    }

    #[test]
    fn test_guard_releases_on_drop() {
        let table = LockTable::new();
        {
            let _guard = table.lock_pair("Bob", "Alice", &patient()).unwrap();
            assert!(table.is_locked("Alice"));
            assert!(table.is_locked("Bob"));
        }
        assert!(!table.is_locked("Alice"));
        assert!(!table.is_locked("Bob"));
    }

    #[test]
    fn test_timeout_releases_partial_acquisition() {
        let table = LockTable::new();
        let _held = table.lock_pair("Bob", "Carol", &patient()).unwrap();

        // Alice is free and taken first, Bob is busy
        let result = table.lock_pair("Alice", "Bob", &Deadline::after(Duration::from_millis(50)));
        assert!(matches!(result, Err(Error::ConcurrencyTimeout { .. })));
        assert!(!table.is_locked("Alice"));
    }

    #[test]
    fn test_cancel_while_waiting() {
        let table = LockTable::new();
        let _held = table.lock_pair("Alice", "Bob", &patient()).unwrap();

        let cancel = CancelHandle::new();
        cancel.cancel();
        let deadline = patient().with_cancel(cancel);
        assert!(matches!(table.lock_pair("Bob", "Alice", &deadline), Err(Error::Cancelled)));
    }

    #[test]
    fn test_waiter_proceeds_after_release() {
        let table = Arc::new(LockTable::new());
        let (locked_tx, locked_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel::<()>();

        let holder = {
            let table = Arc::clone(&table);
            thread::spawn(move || {
                let _guard = table.lock_pair("Alice", "Bob", &patient()).unwrap();
                locked_tx.send(()).unwrap();
                release_rx.recv().unwrap();
            })
        };

        locked_rx.recv().unwrap();
        let waiter = {
            let table = Arc::clone(&table);
            thread::spawn(move || {
                let guard = table.lock_pair("Bob", "Alice", &patient())?;
                let held = table.is_locked("Alice") && table.is_locked("Bob");
                drop(guard);
                Ok::<_, Error>(held)
            })
        };

        release_tx.send(()).unwrap();
        holder.join().unwrap();
        assert!(waiter.join().unwrap().unwrap());
    }
}
