//! Per-request plumbing: waiter records, opaque request ids, and the
//! resolution steps that turn a completion payload or disk artifact into a
//! delivered thumbnail.
//!
//! A request moves through: cache check, disk check, awaiting generation,
//! then exactly one of delivered or failed. The early checks run inside
//! [`crate::service::ThumbnailService::request`]; the late steps run on the
//! router thread via [`resolve_completion`] / [`resolve_disk`].

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::Sender;
use std::sync::Arc;
use tracing::debug;

use crate::cache::{CacheKey, ImageCache};
use crate::engine::CompletionEvent;
use crate::error::ThumbnailError;
use crate::size::SizeClass;
use crate::thumb::{self, Thumbnail};

/// Stable opaque handle identifying one waiter in the pending registry.
/// Never a live reference, so destruction order cannot dangle.
pub type RequestId = u64;

static NEXT_REQUEST_ID: AtomicU64 = AtomicU64::new(1);

/// Allocate a process-unique request id.
pub(crate) fn next_request_id() -> RequestId {
    NEXT_REQUEST_ID.fetch_add(1, Ordering::Relaxed)
}

/// Terminal outcome delivered to a request's handle.
pub type Outcome = Result<Arc<Thumbnail>, ThumbnailError>;

/// One caller's outstanding interest in a thumbnail.
///
/// Owned by the pending registry while a generation enqueue is in flight,
/// or carried directly to the router for deferred disk decodes.
pub struct Waiter {
    pub(crate) id: RequestId,
    pub(crate) identity: String,
    pub(crate) locator: Option<PathBuf>,
    pub(crate) size: SizeClass,
    pub(crate) target_dim: Option<u32>,
    pub(crate) tx: Sender<Outcome>,
}

impl Waiter {
    pub(crate) fn new(
        identity: String,
        locator: Option<PathBuf>,
        size: SizeClass,
        target_dim: Option<u32>,
        tx: Sender<Outcome>,
    ) -> Self {
        Self {
            id: next_request_id(),
            identity,
            locator,
            size,
            target_dim,
            tx,
        }
    }

    pub(crate) fn id(&self) -> RequestId {
        self.id
    }

    /// Send the terminal outcome. A closed channel means the caller has
    /// released its handle; cancellation is silent.
    fn deliver(self, outcome: Outcome) {
        let _ = self.tx.send(outcome);
    }
}

/// Decode policy for a completion payload: inline placeholder takes
/// precedence over a finished artifact; the `use_original` flag redirects
/// the decode at the waiter's own source asset.
fn decode_completion(waiter: &Waiter, event: &CompletionEvent) -> Result<Thumbnail, ThumbnailError> {
    if let Some(payload) = event
        .placeholder_base64
        .as_deref()
        .filter(|p| !p.is_empty())
    {
        return thumb::decode_placeholder(payload, waiter.target_dim);
    }
    if event.use_original {
        if let Some(locator) = &waiter.locator {
            return thumb::decode_file(locator, waiter.target_dim);
        }
    }
    match &event.artifact_path {
        Some(path) => thumb::decode_file(path, waiter.target_dim),
        None => Err(ThumbnailError::NoArtifact),
    }
}

/// Resolve one drained waiter with a completion payload. Runs on the router
/// thread, after the registry lock has been released.
pub(crate) fn resolve_completion(waiter: Waiter, event: &CompletionEvent, cache: &ImageCache) {
    let outcome = decode_completion(&waiter, event);
    finish(waiter, outcome, cache);
}

/// Resolve a deferred disk-store hit. Runs on the router thread.
pub(crate) fn resolve_disk(waiter: Waiter, path: &Path, cache: &ImageCache) {
    let outcome = thumb::decode_file(path, waiter.target_dim);
    finish(waiter, outcome, cache);
}

/// Short-circuit delivery for requests that fail before any decode work.
pub(crate) fn fail(waiter: Waiter, error: ThumbnailError) {
    debug!(identity = %waiter.identity, %error, "thumbnail request failed");
    waiter.deliver(Err(error));
}

fn finish(waiter: Waiter, outcome: Result<Thumbnail, ThumbnailError>, cache: &ImageCache) {
    match outcome {
        Ok(thumbnail) => {
            let thumbnail = Arc::new(thumbnail);
            // Every delivery fills the cache under the request's own size
            // key, whichever path produced the image.
            cache.put(
                CacheKey::new(waiter.identity.clone(), waiter.size),
                Arc::clone(&thumbnail),
            );
            debug!(
                identity = %waiter.identity,
                size = %waiter.size,
                width = thumbnail.width,
                height = thumbnail.height,
                "thumbnail delivered"
            );
            waiter.deliver(Ok(thumbnail));
        }
        Err(error) => {
            debug!(identity = %waiter.identity, %error, "thumbnail request failed");
            waiter.deliver(Err(error));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc::channel;

    fn waiter(identity: &str, locator: Option<PathBuf>) -> (Waiter, std::sync::mpsc::Receiver<Outcome>) {
        let (tx, rx) = channel();
        let w = Waiter::new(identity.to_string(), locator, SizeClass::Medium, None, tx);
        (w, rx)
    }

    #[test]
    fn request_ids_are_unique_and_increasing() {
        let a = next_request_id();
        let b = next_request_id();
        assert!(b > a);
    }

    #[test]
    fn completion_without_payload_or_path_fails_with_no_artifact() {
        let cache = ImageCache::new(4);
        let (w, rx) = waiter("h1", None);
        let event = CompletionEvent {
            identity: "h1".to_string(),
            size: SizeClass::Medium,
            artifact_path: None,
            placeholder_base64: None,
            use_original: false,
        };

        resolve_completion(w, &event, &cache);
        let outcome = rx.recv().unwrap();
        assert!(matches!(outcome, Err(ThumbnailError::NoArtifact)));
        assert!(cache.is_empty());
    }

    #[test]
    fn empty_placeholder_string_falls_through_to_artifact_path() {
        let cache = ImageCache::new(4);
        let (w, rx) = waiter("h1", None);
        // Empty placeholder plus no path: must report the missing artifact,
        // not a placeholder decode failure.
        let event = CompletionEvent {
            identity: "h1".to_string(),
            size: SizeClass::Medium,
            artifact_path: None,
            placeholder_base64: Some(String::new()),
            use_original: false,
        };

        resolve_completion(w, &event, &cache);
        assert!(matches!(rx.recv().unwrap(), Err(ThumbnailError::NoArtifact)));
    }

    #[test]
    fn use_original_without_locator_falls_back_to_artifact_path() {
        let cache = ImageCache::new(4);
        let (w, rx) = waiter("h1", None);
        let event = CompletionEvent {
            identity: "h1".to_string(),
            size: SizeClass::Medium,
            artifact_path: None,
            placeholder_base64: None,
            use_original: true,
        };

        resolve_completion(w, &event, &cache);
        assert!(matches!(rx.recv().unwrap(), Err(ThumbnailError::NoArtifact)));
    }

    #[test]
    fn delivery_to_released_handle_is_silent() {
        let cache = ImageCache::new(4);
        let (w, rx) = waiter("h1", None);
        drop(rx);
        let event = CompletionEvent {
            identity: "h1".to_string(),
            size: SizeClass::Medium,
            artifact_path: None,
            placeholder_base64: None,
            use_original: false,
        };
        // Must not panic.
        resolve_completion(w, &event, &cache);
    }
}
