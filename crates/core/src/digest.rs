//! Digest orchestration.
//!
//! [`Digester`] sits between extracted text and an expensive external
//! summarizer (the [`Transform`] capability). Every request first consults
//! the [`DigestCache`](crate::cache::DigestCache); the summarizer is only
//! called on a miss, and its normalized output is cached under
//! `(text, mode)`.
//!
//! Transform failures are classified by the transform itself as a
//! [`TransformError`] and propagated unmodified. Nothing is retried and a
//! failed attempt is never cached.
//!
//! # Example
//!
//! ```rust
//! use precis_core::cache::{self, CacheConfig};
//! use precis_core::digest::{Digester, Transform, TransformError};
//! use precis_core::store::MemoryStore;
//!
//! struct Shout;
//!
//! impl Transform for Shout {
//!     async fn transform(&self, text: &str, _mode: &str) -> Result<String, TransformError> {
//!         Ok(text.to_uppercase())
//!     }
//! }
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let (cache, _autosave) = cache::init(MemoryStore::new(), CacheConfig::default()).await.unwrap();
//! let digester = Digester::new(cache, Shout);
//!
//! assert_eq!(digester.digest("hello", "summary").await.unwrap(), "HELLO");
//! assert!(digester.is_cached("hello", "summary").await);
//! # });
//! ```

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::Result;
use crate::cache::SharedCache;
use crate::store::KeyValueStore;

/// Separator used when the summarizer answers with a list of paragraphs.
pub const PARAGRAPH_SEPARATOR: &str = "\n\n";

/// Failure classification reported by a [`Transform`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransformError {
    /// The summarizer could not be reached.
    #[error("network error: {0}")]
    Network(String),

    /// The summarizer rejected the credentials.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// The summarizer asked to slow down.
    #[error("rate limited{}", .retry_after.map(|s| format!(" (retry after {}s)", s)).unwrap_or_default())]
    RateLimited { retry_after: Option<u64> },

    /// The summarizer answered, but the answer was cut short or empty.
    #[error("incomplete response: {0}")]
    IncompleteResponse(String),

    /// Any other failure reported by the summarizer.
    #[error("{0}")]
    Provider(String),
}

impl TransformError {
    /// Stable tag identifying the kind of failure.
    pub fn code(&self) -> &'static str {
        match self {
            TransformError::Network(_) => "network",
            TransformError::Auth(_) => "auth",
            TransformError::RateLimited { .. } => "rate_limited",
            TransformError::IncompleteResponse(_) => "incomplete_response",
            TransformError::Provider(_) => "provider",
        }
    }
}

/// The external summarization capability.
pub trait Transform: Send + Sync {
    /// Produces the raw digest of `text` for `mode`.
    fn transform(&self, text: &str, mode: &str) -> impl Future<Output = std::result::Result<String, TransformError>> + Send;
}

/// Cleans a raw summarizer response.
///
/// A surrounding code fence (with or without a language tag) is stripped.
/// The remainder is then read as JSON: an array of strings is joined with
/// blank lines and a string is used as-is. Anything else, including invalid
/// JSON, falls back to the fence-stripped text.
///
/// # Example
///
/// ```rust
/// use precis_core::digest::normalize_response;
///
/// assert_eq!(normalize_response("```json\n[\"One.\", \"Two.\"]\n```"), "One.\n\nTwo.");
/// assert_eq!(normalize_response("\"Quoted\""), "Quoted");
/// assert_eq!(normalize_response("Plain text"), "Plain text");
/// ```
pub fn normalize_response(raw: &str) -> String {
    let cleaned = strip_code_fence(raw);

    match serde_json::from_str::<Value>(cleaned) {
        Ok(Value::String(text)) => text,
        Ok(Value::Array(items)) if items.iter().all(Value::is_string) => items
            .iter()
            .filter_map(Value::as_str)
            .collect::<Vec<_>>()
            .join(PARAGRAPH_SEPARATOR),
        _ => cleaned.to_string(),
    }
}

fn strip_code_fence(raw: &str) -> &str {
    let mut text = raw.trim();
    if let Some(rest) = text.strip_prefix("```") {
        // A language tag only counts when a newline ends it.
        let tag_end = rest
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '-' || c == '_'))
            .unwrap_or(rest.len());
        let after_tag = rest[tag_end..].trim_start_matches([' ', '\t']);
        let body = after_tag.strip_prefix("\r\n").or_else(|| after_tag.strip_prefix('\n'));
        text = body.unwrap_or(rest).trim_start();
    }
    if let Some(rest) = text.strip_suffix("```") {
        text = rest.trim_end();
    }
    text
}

/// Usage counters of a [`Digester`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DigestStats {
    pub requests: u64,
    pub cache_hits: u64,
    pub transform_calls: u64,
    /// Characters sent to the transform.
    pub input_chars: u64,
    /// Characters of normalized transform output.
    pub output_chars: u64,
}

#[derive(Debug, Default)]
struct Counters {
    requests: AtomicU64,
    cache_hits: AtomicU64,
    transform_calls: AtomicU64,
    input_chars: AtomicU64,
    output_chars: AtomicU64,
}

/// Cache-first front end to a [`Transform`].
pub struct Digester<S, T> {
    cache: SharedCache<S>,
    transform: T,
    counters: Counters,
}

impl<S, T> Digester<S, T>
where
    S: KeyValueStore,
    T: Transform,
{
    pub fn new(cache: SharedCache<S>, transform: T) -> Self {
        Self { cache, transform, counters: Counters::default() }
    }

    /// Returns the digest of `text` for `mode`.
    ///
    /// A cached result is returned without calling the transform. Otherwise
    /// the transform output is normalized with [`normalize_response`],
    /// cached and returned.
    ///
    /// Overlapping calls for the same key are not coordinated; each miss calls
    /// the transform.
    ///
    /// # Errors
    ///
    /// [`PrecisError::Transform`](crate::PrecisError::Transform) with the
    /// transform's own classification. A failed cache write is logged and
    /// does not discard the result.
    pub async fn digest(&self, text: &str, mode: &str) -> Result<String> {
        self.counters.requests.fetch_add(1, Ordering::Relaxed);

        if let Some(entry) = self.cache.lock().await.get(text, mode) {
            self.counters.cache_hits.fetch_add(1, Ordering::Relaxed);
            debug!(mode, "digest cache hit");
            return Ok(entry.result.clone());
        }

        self.counters.transform_calls.fetch_add(1, Ordering::Relaxed);
        self.counters.input_chars.fetch_add(text.chars().count() as u64, Ordering::Relaxed);
        debug!(mode, chars = text.chars().count(), "digest cache miss, calling transform");

        let raw = self.transform.transform(text, mode).await.inspect_err(|e| {
            warn!(mode, code = e.code(), error = %e, "transform failed");
        })?;
        let result = normalize_response(&raw);
        self.counters.output_chars.fetch_add(result.chars().count() as u64, Ordering::Relaxed);

        // The entry stays in memory and dirty, so the next save retries.
        if let Err(e) = self.cache.lock().await.set(text, mode, &result).await {
            warn!(mode, error = %e, "failed to persist digest cache");
        }
        Ok(result)
    }

    /// Whether a digest of `text` for `mode` is already cached.
    pub async fn is_cached(&self, text: &str, mode: &str) -> bool {
        self.cache.lock().await.contains(text, mode)
    }

    pub fn stats(&self) -> DigestStats {
        DigestStats {
            requests: self.counters.requests.load(Ordering::Relaxed),
            cache_hits: self.counters.cache_hits.load(Ordering::Relaxed),
            transform_calls: self.counters.transform_calls.load(Ordering::Relaxed),
            input_chars: self.counters.input_chars.load(Ordering::Relaxed),
            output_chars: self.counters.output_chars.load(Ordering::Relaxed),
        }
    }

    pub fn cache(&self) -> &SharedCache<S> {
        &self.cache
    }

    pub fn transform(&self) -> &T {
        &self.transform
    }
}
