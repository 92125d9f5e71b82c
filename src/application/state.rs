//! Snapshot cells and request sequencing shared by the loaders.

use std::sync::{
    Arc, RwLock,
    atomic::{AtomicU64, Ordering},
};

use crate::cache::{rw_read, rw_write};

const SOURCE: &str = "application::state";

/// Holds the current state as an immutable snapshot that is swapped whole.
pub struct StateCell<S> {
    current: RwLock<Arc<S>>,
}

impl<S> StateCell<S> {
    pub fn new(initial: S) -> Self {
        Self {
            current: RwLock::new(Arc::new(initial)),
        }
    }

    pub fn snapshot(&self) -> Arc<S> {
        rw_read(&self.current, SOURCE, "snapshot").clone()
    }

    pub fn replace(&self, next: S) -> Arc<S> {
        let next = Arc::new(next);
        *rw_write(&self.current, SOURCE, "replace") = next.clone();
        next
    }

    /// Computes the next state from the current one under the write lock.
    ///
    /// Returning `None` leaves the state untouched.
    pub fn replace_with(&self, f: impl FnOnce(&S) -> Option<S>) -> Option<Arc<S>> {
        let mut current = rw_write(&self.current, SOURCE, "replace_with");
        let next = Arc::new(f(&**current)?);
        *current = next.clone();
        Some(next)
    }
}

/// Sequence number handed to one in-flight request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Ticket(u64);

impl Ticket {
    pub fn value(self) -> u64 {
        self.0
    }
}

/// Monotonic request counter; only the most recently issued ticket may apply its result.
#[derive(Debug, Default)]
pub struct RequestSequence {
    issued: AtomicU64,
}

impl RequestSequence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn issue(&self) -> Ticket {
        Ticket(self.issued.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub fn latest(&self) -> u64 {
        self.issued.load(Ordering::SeqCst)
    }

    pub fn is_latest(&self, ticket: Ticket) -> bool {
        ticket.0 == self.latest()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tickets_are_monotonic() {
        let sequence = RequestSequence::new();
        let first = sequence.issue();
        let second = sequence.issue();
        assert!(first < second);
        assert!(!sequence.is_latest(first));
        assert!(sequence.is_latest(second));
    }

    #[test]
    fn replace_with_can_decline() {
        let cell = StateCell::new(1u32);
        assert!(cell.replace_with(|_| None).is_none());
        assert_eq!(*cell.snapshot(), 1);

        let next = cell.replace_with(|current| Some(current + 1));
        assert_eq!(next.as_deref(), Some(&2));
        assert_eq!(*cell.snapshot(), 2);
    }

    #[test]
    fn snapshots_are_not_affected_by_later_swaps() {
        let cell = StateCell::new(vec!["a"]);
        let before = cell.snapshot();
        cell.replace(vec!["b"]);
        assert_eq!(*before, vec!["a"]);
        assert_eq!(*cell.snapshot(), vec!["b"]);
    }
}
