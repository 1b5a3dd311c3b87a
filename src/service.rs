//! Provider façade: the entry point a view calls to obtain a lazily
//! produced thumbnail.
//!
//! `ThumbnailService` owns the shared image cache, the pending-request
//! registry, and the router thread. It is constructed once at the
//! application's composition root and shared by reference (or `Arc`); there
//! are no global singletons. `request()` never blocks: a cache hit resolves
//! from a pre-filled channel, disk-store decodes are deferred to the router
//! thread, and generation waits are registered with the registry.

use std::path::Path;
use std::sync::mpsc::{channel, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::cache::{CacheKey, ImageCache};
use crate::config::Config;
use crate::engine::{CompletionEvent, GenerationEngine, GenerationJob};
use crate::error::ThumbnailError;
use crate::pending::PendingRequests;
use crate::request::{self, Outcome, RequestId, Waiter};
use crate::router::{self, RouterMsg};
use crate::size::SizeClass;
use crate::token::RequestToken;

/// Thumbnail provider: bounded cache + coalesced generation requests.
pub struct ThumbnailService {
    cache: Arc<ImageCache>,
    pending: Arc<PendingRequests>,
    engine: Arc<dyn GenerationEngine>,
    router_tx: Sender<RouterMsg>,
    default_size: SizeClass,
}

impl ThumbnailService {
    /// Build a service with default configuration.
    pub fn new(engine: Arc<dyn GenerationEngine>) -> Self {
        Self::with_config(engine, Config::default())
    }

    /// Build a service, wiring the cache bound and default size tier from
    /// configuration. Spawns the router thread; it stops when the service
    /// is dropped.
    pub fn with_config(engine: Arc<dyn GenerationEngine>, config: Config) -> Self {
        let cache = Arc::new(ImageCache::new(config.cache_capacity));
        let pending = Arc::new(PendingRequests::new());
        let (router_tx, router_rx) = channel();
        router::spawn(router_rx, Arc::clone(&cache), Arc::clone(&pending));
        Self {
            cache,
            pending,
            engine,
            router_tx,
            default_size: config.default_size,
        }
    }

    /// Request a thumbnail for `identity` at `size`, optionally decoding
    /// down to `target_dim` pixels. Returns immediately; the handle resolves
    /// asynchronously with exactly one outcome unless cancelled.
    pub fn request(
        &self,
        identity: &str,
        locator: Option<&Path>,
        size: SizeClass,
        target_dim: Option<u32>,
    ) -> ThumbnailHandle {
        let key = CacheKey::new(identity, size);
        if let Some(thumb) = self.cache.get(&key) {
            debug!(identity, size = %size, "cache hit");
            return ThumbnailHandle::ready(identity, Ok(thumb));
        }

        let (tx, rx) = channel();
        let waiter = Waiter::new(
            identity.to_string(),
            locator.map(Path::to_path_buf),
            size,
            target_dim,
            tx,
        );
        let id = waiter.id();

        if let Some(path) = self.engine.probe_artifact(identity, size) {
            debug!(identity, size = %size, path = %path.display(), "disk store hit");
            let _ = self.router_tx.send(RouterMsg::DiskHit { waiter, path });
            return ThumbnailHandle::unregistered(id, identity, rx);
        }

        let Some(locator) = locator else {
            request::fail(waiter, ThumbnailError::SourceMissing);
            return ThumbnailHandle::unregistered(id, identity, rx);
        };

        // Coalescing: only the waiter that opened the identity's set
        // enqueues; later waiters for the same identity just join it.
        let first = self.pending.add_waiter(waiter);
        if first {
            let job = GenerationJob {
                locator: locator.to_path_buf(),
                identity: identity.to_string(),
                size,
            };
            debug!(identity, size = %size, "enqueueing generation");
            if let Err(e) = self.engine.enqueue_batch(&[job]) {
                warn!(identity, error = %e, "generation enqueue failed");
                // Everything currently coalesced on this identity was
                // relying on that enqueue.
                for w in self.pending.notify_and_clear(identity) {
                    request::fail(w, ThumbnailError::EngineUnavailable(e.to_string()));
                }
            }
        }

        ThumbnailHandle::registered(id, identity, rx, Arc::clone(&self.pending))
    }

    /// Request via the opaque token format
    /// `"<identity>[|<escaped-locator>]/<size>"`. An unspecified size uses
    /// the configured default tier; a malformed token fails immediately.
    pub fn request_token(&self, token: &str) -> ThumbnailHandle {
        match RequestToken::parse(token) {
            Ok(parsed) => self.request(
                &parsed.identity,
                parsed.locator.as_deref(),
                parsed.size.unwrap_or(self.default_size),
                None,
            ),
            Err(e) => ThumbnailHandle::failed(token, e),
        }
    }

    /// Ingress for engine completion notifications; safe to post from any
    /// thread. Hand one of these to the engine bridge at wiring time.
    pub fn completion_sink(&self) -> CompletionSink {
        CompletionSink {
            tx: self.router_tx.clone(),
        }
    }

    /// Shared image cache (inspection, settings-driven maintenance).
    pub fn cache(&self) -> &ImageCache {
        &self.cache
    }

    /// Pending-request registry (inspection).
    pub fn pending(&self) -> &PendingRequests {
        &self.pending
    }

    /// Drop every cached image (the "clear cache" user action).
    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    /// Adjust the cache bound at runtime.
    pub fn set_cache_capacity(&self, capacity: usize) {
        self.cache.set_capacity(capacity);
    }
}

/// Thread-safe sender the generation engine uses to post completion events.
#[derive(Clone)]
pub struct CompletionSink {
    tx: Sender<RouterMsg>,
}

impl CompletionSink {
    /// Post a completion event to the router. Events posted after the
    /// owning service is gone are dropped.
    pub fn post(&self, event: CompletionEvent) {
        let _ = self.tx.send(RouterMsg::Completion(event));
    }
}

/// A caller's handle to one in-flight thumbnail request.
///
/// Exactly one terminal outcome (image or error) arrives per handle unless
/// it is dropped first; dropping an unresolved handle cancels the request
/// and suppresses any later delivery.
pub struct ThumbnailHandle {
    id: RequestId,
    identity: String,
    rx: Receiver<Outcome>,
    /// Present only while this request is registered as a generation waiter.
    pending: Option<Arc<PendingRequests>>,
    done: bool,
}

impl ThumbnailHandle {
    fn ready(identity: &str, outcome: Outcome) -> Self {
        let (tx, rx) = channel();
        let _ = tx.send(outcome);
        Self {
            id: request::next_request_id(),
            identity: identity.to_string(),
            rx,
            pending: None,
            done: false,
        }
    }

    fn failed(identity: &str, error: ThumbnailError) -> Self {
        Self::ready(identity, Err(error))
    }

    fn unregistered(id: RequestId, identity: &str, rx: Receiver<Outcome>) -> Self {
        Self {
            id,
            identity: identity.to_string(),
            rx,
            pending: None,
            done: false,
        }
    }

    fn registered(
        id: RequestId,
        identity: &str,
        rx: Receiver<Outcome>,
        pending: Arc<PendingRequests>,
    ) -> Self {
        Self {
            id,
            identity: identity.to_string(),
            rx,
            pending: Some(pending),
            done: false,
        }
    }

    /// Opaque id of this request.
    pub fn id(&self) -> RequestId {
        self.id
    }

    /// Content identity this request was made for.
    pub fn identity(&self) -> &str {
        &self.identity
    }

    /// Block until the terminal outcome arrives, consuming the handle.
    pub fn recv(mut self) -> Outcome {
        self.done = true;
        self.rx.recv().unwrap_or(Err(ThumbnailError::Cancelled))
    }

    /// Wait up to `timeout` for the outcome. `None` means still pending.
    pub fn recv_timeout(&mut self, timeout: Duration) -> Option<Outcome> {
        if self.done {
            return None;
        }
        match self.rx.recv_timeout(timeout) {
            Ok(outcome) => {
                self.done = true;
                Some(outcome)
            }
            Err(RecvTimeoutError::Timeout) => None,
            Err(RecvTimeoutError::Disconnected) => {
                self.done = true;
                Some(Err(ThumbnailError::Cancelled))
            }
        }
    }

    /// Non-blocking poll for the outcome. `None` means still pending.
    pub fn try_recv(&mut self) -> Option<Outcome> {
        if self.done {
            return None;
        }
        match self.rx.try_recv() {
            Ok(outcome) => {
                self.done = true;
                Some(outcome)
            }
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                self.done = true;
                Some(Err(ThumbnailError::Cancelled))
            }
        }
    }

    /// Cancel the request. Equivalent to dropping the handle.
    pub fn cancel(self) {}
}

impl Drop for ThumbnailHandle {
    fn drop(&mut self) {
        if !self.done {
            if let Some(pending) = &self.pending {
                pending.remove_waiter(&self.identity, self.id);
            }
        }
    }
}
