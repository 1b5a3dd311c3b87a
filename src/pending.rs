//! Pending-request registry: coalesces concurrent requests for the same
//! content identity into a single generation enqueue.
//!
//! The registry keys waiters by identity only. The first waiter for an
//! identity opens the set (and its caller enqueues generation); everyone
//! else just joins the set. Draining is atomic, so a second concurrent
//! notification for the same identity cannot double-deliver, and a waiter
//! registering after a drain opens a fresh set and triggers its own enqueue.

use std::collections::HashMap;
use std::sync::Mutex;
use tracing::trace;

use crate::request::{RequestId, Waiter};

/// Registry of in-flight waiters, keyed by content identity.
///
/// Guarded by its own lock, independent of the image cache. Waiter delivery
/// never happens under this lock.
#[derive(Default)]
pub struct PendingRequests {
    inner: Mutex<HashMap<String, Vec<Waiter>>>,
}

impl PendingRequests {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a waiter. Returns `true` when this waiter opened the set for
    /// its identity, i.e. the caller is responsible for enqueueing
    /// generation. Check and insert happen in one critical section.
    pub fn add_waiter(&self, waiter: Waiter) -> bool {
        let mut inner = self.inner.lock().unwrap();
        let set = inner.entry(waiter.identity.clone()).or_default();
        let first = set.is_empty();
        trace!(identity = %waiter.identity, id = waiter.id(), first, "waiter registered");
        set.push(waiter);
        first
    }

    /// Deregister a waiter (cancellation). Dropping the last waiter for an
    /// identity removes the identity entry entirely.
    pub fn remove_waiter(&self, identity: &str, id: RequestId) {
        let mut inner = self.inner.lock().unwrap();
        if let Some(set) = inner.get_mut(identity) {
            set.retain(|w| w.id() != id);
            if set.is_empty() {
                inner.remove(identity);
            }
            trace!(identity = %identity, id, "waiter removed");
        }
    }

    /// Atomically drain every waiter for an identity. Returns an empty list
    /// for unknown identities (late or duplicate notifications are no-ops).
    /// Delivery to the drained waiters is the caller's job, outside the lock.
    pub fn notify_and_clear(&self, identity: &str) -> Vec<Waiter> {
        let mut inner = self.inner.lock().unwrap();
        inner.remove(identity).unwrap_or_default()
    }

    /// Number of waiters currently registered for an identity.
    pub fn waiter_count(&self, identity: &str) -> usize {
        self.inner
            .lock()
            .unwrap()
            .get(identity)
            .map_or(0, |set| set.len())
    }

    /// Number of identities with at least one open waiter.
    pub fn open_identities(&self) -> usize {
        self.inner.lock().unwrap().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::size::SizeClass;
    use std::sync::mpsc::channel;

    fn waiter(identity: &str) -> Waiter {
        let (tx, _rx) = channel();
        Waiter::new(identity.to_string(), None, SizeClass::Medium, None, tx)
    }

    #[test]
    fn first_waiter_opens_the_set() {
        let pending = PendingRequests::new();
        assert!(pending.add_waiter(waiter("h1")));
        assert!(!pending.add_waiter(waiter("h1")));
        assert_eq!(pending.waiter_count("h1"), 2);
    }

    #[test]
    fn distinct_identities_are_independent() {
        let pending = PendingRequests::new();
        assert!(pending.add_waiter(waiter("h1")));
        assert!(pending.add_waiter(waiter("h2")));
        assert_eq!(pending.open_identities(), 2);
    }

    #[test]
    fn removing_last_waiter_drops_the_identity_entry() {
        let pending = PendingRequests::new();
        let w = waiter("h1");
        let id = w.id();
        pending.add_waiter(w);

        pending.remove_waiter("h1", id);
        assert_eq!(pending.open_identities(), 0);
        // A fresh waiter opens a new set again.
        assert!(pending.add_waiter(waiter("h1")));
    }

    #[test]
    fn remove_keeps_other_waiters_for_same_identity() {
        let pending = PendingRequests::new();
        let a = waiter("h1");
        let a_id = a.id();
        pending.add_waiter(a);
        pending.add_waiter(waiter("h1"));

        pending.remove_waiter("h1", a_id);
        assert_eq!(pending.waiter_count("h1"), 1);
    }

    #[test]
    fn remove_of_unknown_waiter_is_a_noop() {
        let pending = PendingRequests::new();
        pending.remove_waiter("h1", 42);
        assert_eq!(pending.open_identities(), 0);
    }

    #[test]
    fn notify_and_clear_drains_every_waiter_once() {
        let pending = PendingRequests::new();
        pending.add_waiter(waiter("h1"));
        pending.add_waiter(waiter("h1"));
        pending.add_waiter(waiter("h2"));

        let drained = pending.notify_and_clear("h1");
        assert_eq!(drained.len(), 2);
        assert_eq!(pending.waiter_count("h1"), 0);
        assert_eq!(pending.waiter_count("h2"), 1);

        // Second notification for the same identity finds nothing.
        assert!(pending.notify_and_clear("h1").is_empty());
    }

    #[test]
    fn waiter_registering_after_drain_opens_a_fresh_set() {
        let pending = PendingRequests::new();
        pending.add_waiter(waiter("h1"));
        let _ = pending.notify_and_clear("h1");
        assert!(pending.add_waiter(waiter("h1")));
    }
}
