//! Completion router: the subsystem's serialization point.
//!
//! Engine completion notifications can arrive on any producer thread; they
//! are posted into a channel and consumed by one dedicated router thread.
//! The router drains the matching waiter set atomically and resolves each
//! waiter after the registry lock is released, so delivery can never
//! re-enter the registry (or the cache) under lock. Deferred disk-store
//! decodes ride the same channel, which is what keeps `request()`
//! non-blocking for the caller.

use std::path::PathBuf;
use std::sync::mpsc::Receiver;
use std::sync::Arc;
use std::thread;
use tracing::debug;

use crate::cache::ImageCache;
use crate::engine::CompletionEvent;
use crate::pending::PendingRequests;
use crate::request::{self, Waiter};

/// Work items consumed by the router thread.
pub(crate) enum RouterMsg {
    /// Engine-originated "thumbnail ready" notification.
    Completion(CompletionEvent),
    /// A request that found a finished artifact during its disk check; the
    /// decode is deferred here so the requesting thread returns immediately.
    DiskHit { waiter: Waiter, path: PathBuf },
}

/// Spawn the router thread. It exits when every sender is gone (service
/// teardown closes the channel).
pub(crate) fn spawn(
    rx: Receiver<RouterMsg>,
    cache: Arc<ImageCache>,
    pending: Arc<PendingRequests>,
) -> thread::JoinHandle<()> {
    thread::Builder::new()
        .name("thumb-router".to_string())
        .spawn(move || run(rx, cache, pending))
        .expect("failed to spawn thumbnail router thread")
}

fn run(rx: Receiver<RouterMsg>, cache: Arc<ImageCache>, pending: Arc<PendingRequests>) {
    while let Ok(msg) = rx.recv() {
        match msg {
            RouterMsg::Completion(event) => route_completion(event, &cache, &pending),
            RouterMsg::DiskHit { waiter, path } => request::resolve_disk(waiter, &path, &cache),
        }
    }
    debug!("thumbnail router stopped");
}

/// Fan a completion out to every waiter registered for its identity.
///
/// Fan-out is per identity: waiters registered under other size classes
/// receive the same payload and cache the result under their own key. An
/// event with no matching waiters (all cancelled, or a duplicate) is
/// discarded.
fn route_completion(event: CompletionEvent, cache: &ImageCache, pending: &PendingRequests) {
    let waiters = pending.notify_and_clear(&event.identity);
    if waiters.is_empty() {
        debug!(identity = %event.identity, size = %event.size, "completion with no waiters, discarding");
        return;
    }
    debug!(
        identity = %event.identity,
        size = %event.size,
        waiters = waiters.len(),
        "routing completion"
    );
    for waiter in waiters {
        request::resolve_completion(waiter, &event, cache);
    }
}
