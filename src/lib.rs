//! Thumbfetch Library
//!
//! Thumbnail acquisition layer for a photo browser: a bounded in-memory
//! cache of decoded images, a pending-request registry that coalesces
//! concurrent requests per content identity, and a router that fans
//! asynchronous generation completions out to every interested caller.
//! Generation itself happens in an external engine reached through the
//! [`engine::GenerationEngine`] seam.

pub mod cache;
pub mod config;
pub mod engine;
pub mod error;
pub mod pending;
pub mod request;
mod router;
pub mod service;
pub mod size;
pub mod thumb;
pub mod token;

pub use cache::{CacheKey, ImageCache, DEFAULT_CACHE_CAPACITY};
pub use config::Config;
pub use engine::{CompletionEvent, EngineError, GenerationEngine, GenerationJob};
pub use error::ThumbnailError;
pub use pending::PendingRequests;
pub use request::{Outcome, RequestId};
pub use service::{CompletionSink, ThumbnailHandle, ThumbnailService};
pub use size::SizeClass;
pub use thumb::Thumbnail;
pub use token::RequestToken;
