//! Contract with the external generation engine.
//!
//! The engine (the photo-management core) produces thumbnail artifacts
//! asynchronously. This crate only enqueues work, probes the engine's disk
//! store, and consumes completion events; rendering and the on-disk naming
//! scheme belong to the engine.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::size::SizeClass;

/// One generation request inside an enqueue batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationJob {
    /// Source asset to generate from.
    pub locator: PathBuf,
    /// Content hash identifying the asset independent of its path.
    pub identity: String,
    pub size: SizeClass,
}

/// Asynchronous "thumbnail ready" notification from the engine.
///
/// Exactly one event is expected per enqueued `(identity, size)` pair, but
/// duplicates and unmatched events must be tolerated. The payload carries
/// either an inline placeholder (low-fidelity preview, base64-encoded image
/// bytes), a path to a finished artifact, or the `use_original` flag telling
/// the consumer to decode the source asset directly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionEvent {
    pub identity: String,
    pub size: SizeClass,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artifact_path: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder_base64: Option<String>,
    #[serde(default)]
    pub use_original: bool,
}

impl CompletionEvent {
    /// Event pointing at a finished artifact on the engine's disk store.
    pub fn artifact(identity: impl Into<String>, size: SizeClass, path: impl Into<PathBuf>) -> Self {
        Self {
            identity: identity.into(),
            size,
            artifact_path: Some(path.into()),
            placeholder_base64: None,
            use_original: false,
        }
    }

    /// Event carrying an inline low-fidelity placeholder.
    pub fn placeholder(
        identity: impl Into<String>,
        size: SizeClass,
        base64_payload: impl Into<String>,
    ) -> Self {
        Self {
            identity: identity.into(),
            size,
            artifact_path: None,
            placeholder_base64: Some(base64_payload.into()),
            use_original: false,
        }
    }

    /// Event telling the consumer the source asset itself is small enough
    /// to decode directly.
    pub fn use_original(identity: impl Into<String>, size: SizeClass) -> Self {
        Self {
            identity: identity.into(),
            size,
            artifact_path: None,
            placeholder_base64: None,
            use_original: true,
        }
    }
}

/// Failure to hand work to the engine. Terminal for the affected requests.
#[derive(Debug, Clone, thiserror::Error)]
pub enum EngineError {
    #[error("engine not connected: {0}")]
    NotConnected(String),

    #[error("engine rejected batch: {0}")]
    Rejected(String),
}

/// The generation engine seam.
///
/// Production wires this to the core's bridge; tests substitute a recording
/// mock. Both calls are cheap: `enqueue_batch` is fire-and-forget and
/// `probe_artifact` is an existence check that never generates.
pub trait GenerationEngine: Send + Sync {
    /// Queue generation for a batch of `(locator, identity, size)` jobs.
    /// Zero or more completion events follow asynchronously.
    fn enqueue_batch(&self, jobs: &[GenerationJob]) -> Result<(), EngineError>;

    /// Path of an already-generated artifact in the engine's disk store,
    /// if one exists.
    fn probe_artifact(&self, identity: &str, size: SizeClass) -> Option<PathBuf>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn completion_event_wire_format_is_camel_case() {
        let event = CompletionEvent::artifact("h1", SizeClass::Medium, "/cache/h1_m.webp");
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"identity\":\"h1\""));
        assert!(json.contains("\"size\":\"medium\""));
        assert!(json.contains("\"artifactPath\":\"/cache/h1_m.webp\""));
        assert!(json.contains("\"useOriginal\":false"));
        assert!(!json.contains("placeholderBase64"));
    }

    #[test]
    fn completion_event_tolerates_sparse_payloads() {
        let event: CompletionEvent =
            serde_json::from_str(r#"{"identity":"h2","size":"small"}"#).unwrap();
        assert_eq!(event.identity, "h2");
        assert_eq!(event.size, SizeClass::Small);
        assert!(event.artifact_path.is_none());
        assert!(event.placeholder_base64.is_none());
        assert!(!event.use_original);
    }

    #[test]
    fn generation_job_round_trips_through_json() {
        let job = GenerationJob {
            locator: PathBuf::from("/photos/a.jpg"),
            identity: "h1".to_string(),
            size: SizeClass::Large,
        };
        let json = serde_json::to_string(&job).unwrap();
        let back: GenerationJob = serde_json::from_str(&json).unwrap();
        assert_eq!(back, job);
    }
}
