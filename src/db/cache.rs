//! TTL cache for database handles.
//!
//! Connecting is the expensive step of session start, so handles are memoized
//! by connection config: asking for the same (mode, credentials) within the
//! TTL window returns the already-open handle instead of reconnecting.

use crate::config::ConnectionConfig;
use crate::db::{self, DatabaseHandle};
use crate::error::Result;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

/// Default time-to-live for cached handles: two hours.
pub const DEFAULT_TTL: Duration = Duration::from_secs(2 * 60 * 60);

struct CacheEntry {
    handle: Arc<dyn DatabaseHandle>,
    created_at: Instant,
}

/// Cache of open database handles keyed by canonical connection config.
pub struct HandleCache {
    ttl: Duration,
    entries: HashMap<String, CacheEntry>,
}

impl HandleCache {
    /// Creates a cache with the default two-hour TTL.
    pub fn new() -> Self {
        Self::with_ttl(DEFAULT_TTL)
    }

    /// Creates a cache with a custom TTL.
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: HashMap::new(),
        }
    }

    /// Returns the cached handle for this config if it has not expired.
    ///
    /// Expired entries are removed on lookup.
    pub fn get(&mut self, config: &ConnectionConfig) -> Option<Arc<dyn DatabaseHandle>> {
        let key = config.cache_key();

        match self.entries.get(&key) {
            Some(entry) if entry.created_at.elapsed() < self.ttl => {
                debug!("Handle cache hit for {}", config.mode());
                Some(Arc::clone(&entry.handle))
            }
            Some(_) => {
                debug!("Handle cache entry expired for {}", config.mode());
                self.entries.remove(&key);
                None
            }
            None => None,
        }
    }

    /// Stores a handle for this config, replacing any previous entry.
    pub fn insert(&mut self, config: &ConnectionConfig, handle: Arc<dyn DatabaseHandle>) {
        self.entries.insert(
            config.cache_key(),
            CacheEntry {
                handle,
                created_at: Instant::now(),
            },
        );
    }

    /// Returns the cached handle or connects and caches a new one.
    ///
    /// Within the TTL window the exact same handle instance is returned, so
    /// repeated session starts against the same database do not reopen it.
    pub async fn get_or_connect(
        &mut self,
        config: &ConnectionConfig,
    ) -> Result<Arc<dyn DatabaseHandle>> {
        if let Some(handle) = self.get(config) {
            return Ok(handle);
        }

        let handle = db::connect(config).await?;
        self.insert(config, Arc::clone(&handle));
        Ok(handle)
    }

    /// Number of live entries (expired ones included until next lookup).
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for HandleCache {
    fn default() -> Self {
        Self::new()
    }
}
