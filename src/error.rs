//! Request failure taxonomy.
//!
//! A cache miss is not an error here; it drives fallthrough inside the
//! request flow. Everything in this enum is terminal for one request and
//! surfaces through its handle. Nothing panics across the crate boundary.

use std::path::PathBuf;

/// Terminal failure of a single thumbnail request.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ThumbnailError {
    /// Neither the cache nor the disk store had the image, and the request
    /// carried no source locator to generate from.
    #[error("missing source path for thumbnail request")]
    SourceMissing,

    /// A located file (disk artifact or original source) failed to decode.
    #[error("failed to decode {path:?}: {reason}")]
    Decode { path: PathBuf, reason: String },

    /// Inline placeholder payload was present but not decodable.
    #[error("bad placeholder data: {0}")]
    BadPlaceholder(String),

    /// The generation engine could not be reached when enqueueing.
    #[error("generation engine unavailable: {0}")]
    EngineUnavailable(String),

    /// A completion event arrived carrying neither a placeholder payload
    /// nor an artifact path.
    #[error("no thumbnail available")]
    NoArtifact,

    /// A request token did not parse (empty identity, malformed escape).
    #[error("invalid request token: {0}")]
    InvalidToken(String),

    /// The delivery channel closed without a result. Only observable when
    /// the owning service is torn down while the request is in flight.
    #[error("request dropped before delivery")]
    Cancelled,
}
