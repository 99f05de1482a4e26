//! Bounded digest cache with deferred persistence.
//!
//! The cache maps `(text, mode)` to a previously computed digest. Keys are the
//! plain concatenation `mode + ":" + text`, so two different inputs can never
//! collide, at the cost of keys as large as the input.
//!
//! Writes only mark the cache dirty; a periodic autosave task (see [`init`])
//! persists the whole map as one JSON object. When an insert pushes the cache
//! past [`CacheConfig::limit`] entries, only the [`CacheConfig::trim_to`] most
//! recently written entries are kept and the trimmed map is persisted right
//! away. Reads never refresh an entry's timestamp.
//!
//! Persisted format:
//!
//! ```json
//! { "summary:Full input text": { "result": "Digest", "timestamp": 1700000000000 } }
//! ```

use std::collections::HashMap;
use std::sync::{Arc, Weak};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::store::KeyValueStore;
use crate::{PrecisError, Result};

/// Entry count above which the cache is trimmed.
pub const CACHE_LIMIT: usize = 50;

/// Entry count kept after trimming.
pub const CACHE_TRIM_TO: usize = 30;

/// Default storage key of the persisted map.
pub const CACHE_STORAGE_KEY: &str = "digest_cache";

/// Default interval between autosave attempts.
pub const DEFAULT_FLUSH_INTERVAL: Duration = Duration::from_secs(30);

/// A cached digest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub result: String,
    /// Milliseconds since the Unix epoch at which the entry was written.
    pub timestamp: u64,
}

/// Cache sizing and persistence settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    pub limit: usize,
    pub trim_to: usize,
    pub flush_interval: Duration,
    pub storage_key: String,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            limit: CACHE_LIMIT,
            trim_to: CACHE_TRIM_TO,
            flush_interval: DEFAULT_FLUSH_INTERVAL,
            storage_key: CACHE_STORAGE_KEY.to_string(),
        }
    }
}

impl CacheConfig {
    fn validate(&self) -> Result<()> {
        if self.trim_to > self.limit {
            return Err(PrecisError::ConfigError(format!(
                "cache trim_to ({}) must not exceed limit ({})",
                self.trim_to, self.limit
            )));
        }
        if self.flush_interval.is_zero() {
            return Err(PrecisError::ConfigError("cache flush interval must be non-zero".to_string()));
        }
        Ok(())
    }
}

/// Source of entry timestamps, in milliseconds since the Unix epoch.
pub type Clock = Arc<dyn Fn() -> u64 + Send + Sync>;

fn system_clock() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as u64)
        .unwrap_or_default()
}

/// Cache shared between the orchestrator and the autosave task.
pub type SharedCache<S> = Arc<Mutex<DigestCache<S>>>;

/// The digest cache.
pub struct DigestCache<S> {
    store: S,
    config: CacheConfig,
    entries: HashMap<String, CacheEntry>,
    dirty: bool,
    clock: Clock,
}

impl<S: KeyValueStore> DigestCache<S> {
    /// Creates an empty cache. Call [`DigestCache::load`] to read the
    /// persisted map.
    ///
    /// # Errors
    ///
    /// [`PrecisError::ConfigError`] if `trim_to` exceeds `limit` or the flush
    /// interval is zero.
    pub fn new(store: S, config: CacheConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { store, config, entries: HashMap::new(), dirty: false, clock: Arc::new(system_clock) })
    }

    /// Replaces the timestamp source.
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Cache key for `(text, mode)`.
    pub fn key(text: &str, mode: &str) -> String {
        format!("{}:{}", mode, text)
    }

    /// Replaces the in-memory map with the persisted one.
    ///
    /// A missing or malformed blob yields an empty cache.
    ///
    /// # Errors
    ///
    /// Only storage read failures are returned.
    pub async fn load(&mut self) -> Result<()> {
        let raw = self.store.get(&self.config.storage_key).await?;
        self.entries = match raw {
            None => HashMap::new(),
            Some(raw) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                warn!(key = %self.config.storage_key, error = %e, "discarding malformed digest cache");
                HashMap::new()
            }),
        };
        self.dirty = false;
        debug!(entries = self.entries.len(), "digest cache loaded");
        Ok(())
    }

    pub fn get(&self, text: &str, mode: &str) -> Option<&CacheEntry> {
        self.entries.get(&Self::key(text, mode))
    }

    pub fn contains(&self, text: &str, mode: &str) -> bool {
        self.entries.contains_key(&Self::key(text, mode))
    }

    /// Stores `result` for `(text, mode)`, replacing any previous entry.
    ///
    /// # Errors
    ///
    /// Storage failures while persisting a trimmed map.
    pub async fn set(&mut self, text: &str, mode: &str, result: &str) -> Result<()> {
        let timestamp = (self.clock)();
        self.entries.insert(Self::key(text, mode), CacheEntry { result: result.to_string(), timestamp });
        self.dirty = true;

        if self.entries.len() > self.config.limit {
            self.evict();
            self.save().await?;
        }
        Ok(())
    }

    /// Keeps only the `trim_to` most recently written entries.
    fn evict(&mut self) {
        let before = self.entries.len();
        let mut keys: Vec<(u64, String)> =
            self.entries.iter().map(|(key, entry)| (entry.timestamp, key.clone())).collect();
        keys.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.cmp(&b.1)));

        for (_, key) in keys.into_iter().skip(self.config.trim_to) {
            self.entries.remove(&key);
        }
        info!(before, after = self.entries.len(), "digest cache trimmed");
    }

    /// Empties the cache and deletes the persisted map.
    ///
    /// # Errors
    ///
    /// Storage failures while deleting.
    pub async fn clear(&mut self) -> Result<()> {
        self.entries.clear();
        self.dirty = false;
        self.store.delete(&self.config.storage_key).await?;
        info!("digest cache cleared");
        Ok(())
    }

    /// Persists the map if it changed since the last save.
    ///
    /// Returns whether anything was written.
    ///
    /// # Errors
    ///
    /// Storage failures; the cache stays dirty so the next save retries.
    pub async fn save(&mut self) -> Result<bool> {
        if !self.dirty {
            return Ok(false);
        }
        let json = serde_json::to_string(&self.entries)
            .map_err(|e| PrecisError::Storage(format!("Failed to encode digest cache: {}", e)))?;
        self.store.set(&self.config.storage_key, &json).await?;
        self.dirty = false;
        debug!(entries = self.entries.len(), "digest cache saved");
        Ok(true)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}

/// Loads a cache, wraps it for sharing and starts its autosave task.
///
/// The task saves every [`CacheConfig::flush_interval`] and stops once every
/// [`SharedCache`] handle has been dropped.
///
/// # Errors
///
/// Invalid configuration or a storage read failure.
pub async fn init<S>(store: S, config: CacheConfig) -> Result<(SharedCache<S>, JoinHandle<()>)>
where
    S: KeyValueStore + 'static,
{
    let mut cache = DigestCache::new(store, config)?;
    cache.load().await?;
    let period = cache.config.flush_interval;
    let shared = Arc::new(Mutex::new(cache));
    let handle = spawn_autosave(Arc::downgrade(&shared), period);
    Ok((shared, handle))
}

/// Starts a task that saves the cache every `period`.
pub fn spawn_autosave<S>(cache: Weak<Mutex<DigestCache<S>>>, period: Duration) -> JoinHandle<()>
where
    S: KeyValueStore + 'static,
{
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let Some(cache) = cache.upgrade() else {
                debug!("digest cache dropped, autosave stopping");
                break;
            };
            let mut guard = cache.lock().await;
            if let Err(e) = guard.save().await {
                warn!(error = %e, "digest cache autosave failed");
            }
        }
    })
}
