//! Response Cache
//!
//! Bounded in-memory store for optimized responses.
//!
//! - Entries expire `ttl` after they were stored; expired entries are removed
//!   lazily on lookup and by [`purge_expired`](ResponseCache::purge_expired).
//! - Under capacity pressure the oldest *inserted* entry is evicted (FIFO).
//!   Reads do not promote entries, and re-storing an existing key keeps its
//!   position.
//! - Every read-check-write sequence runs under one mutex, including sweeps.

use indexmap::IndexMap;
use parking_lot::Mutex;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::{Duration, Instant};
use tracing::{debug, trace, warn};

use super::key::CacheKey;
use crate::config::OptimizationConfig;
use crate::tokenizer::serialized_len;
use crate::{Error, Result};

/// Configuration for the response cache
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseCacheConfig {
    /// Maximum number of entries
    pub max_entries: usize,
    /// TTL used when a caller does not supply one
    pub default_ttl_secs: u64,
    /// Largest serialized entry accepted (0 = unlimited)
    pub max_entry_bytes: usize,
}

impl Default for ResponseCacheConfig {
    fn default() -> Self {
        Self {
            max_entries: 1_000,
            default_ttl_secs: 300,
            max_entry_bytes: 0,
        }
    }
}

impl From<&OptimizationConfig> for ResponseCacheConfig {
    fn from(config: &OptimizationConfig) -> Self {
        Self {
            max_entries: config.cache_max_size,
            default_ttl_secs: config.cache_default_ttl_secs,
            max_entry_bytes: config.cache_max_entry_bytes,
        }
    }
}

/// Cached response entry
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub key: String,
    pub operation: String,
    pub value: Value,
    pub created_at: Instant,
    pub ttl: Duration,
    /// Serialized size of `value`
    pub size_bytes: usize,
}

impl CacheEntry {
    /// A TTL too large to add to `created_at` never expires
    pub fn is_expired_at(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.created_at) > self.ttl
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Instant::now())
    }
}

#[derive(Debug, Default)]
struct Inner {
    entries: IndexMap<String, CacheEntry>,
    hits: u64,
    misses: u64,
    evictions: u64,
    expirations: u64,
    stored_bytes: usize,
}

impl Inner {
    fn remove_at(&mut self, index: usize) -> Option<CacheEntry> {
        let (_, entry) = self.entries.shift_remove_index(index)?;
        self.stored_bytes = self.stored_bytes.saturating_sub(entry.size_bytes);
        Some(entry)
    }

    fn retain<F>(&mut self, mut keep: F) -> usize
    where
        F: FnMut(&String, &CacheEntry) -> bool,
    {
        let before = self.entries.len();
        let mut freed = 0;
        self.entries.retain(|key, entry| {
            let kept = keep(key, entry);
            if !kept {
                freed += entry.size_bytes;
            }
            kept
        });
        self.stored_bytes = self.stored_bytes.saturating_sub(freed);
        before - self.entries.len()
    }
}

/// Response cache shared between the optimizer and its sweeper
///
/// # Example
///
/// ```rust,ignore
/// let cache = ResponseCache::new(100);
///
/// if let Some(value) = cache.get("get_card", &params, &variant) {
///     return value;
/// }
///
/// let value = fetch_and_optimize().await?;
/// cache.set("get_card", &params, &variant, value.clone(), None)?;
/// ```
#[derive(Debug)]
pub struct ResponseCache {
    config: ResponseCacheConfig,
    inner: Mutex<Inner>,
}

impl ResponseCache {
    /// Create a cache with default TTL and no entry size limit
    pub fn new(max_entries: usize) -> Self {
        Self::with_config(ResponseCacheConfig {
            max_entries,
            ..Default::default()
        })
    }

    pub fn with_config(config: ResponseCacheConfig) -> Self {
        Self {
            config,
            inner: Mutex::new(Inner::default()),
        }
    }

    pub fn config(&self) -> &ResponseCacheConfig {
        &self.config
    }

    pub fn default_ttl(&self) -> Duration {
        Duration::from_secs(self.config.default_ttl_secs)
    }

    // ========================================================================
    // Lookup
    // ========================================================================

    /// Look up a response. A key that cannot be derived counts as a miss.
    pub fn get(&self, operation: &str, params: &Value, variant: &Value) -> Option<Value> {
        match CacheKey::new(operation, params, variant) {
            Ok(key) => self.get_key(&key),
            Err(e) => {
                warn!(operation, error = %e, "Failed to derive cache key");
                self.inner.lock().misses += 1;
                None
            }
        }
    }

    pub fn get_key(&self, key: &CacheKey) -> Option<Value> {
        let now = Instant::now();
        let mut inner = self.inner.lock();

        let Some(index) = inner.entries.get_index_of(key.as_str()) else {
            inner.misses += 1;
            return None;
        };

        let expired = inner
            .entries
            .get_index(index)
            .map(|(_, entry)| entry.is_expired_at(now))
            .unwrap_or(true);

        if expired {
            inner.remove_at(index);
            inner.expirations += 1;
            inner.misses += 1;
            trace!(key = key.as_str(), "Cache entry expired on lookup");
            return None;
        }

        inner.hits += 1;
        inner.entries.get_index(index).map(|(_, entry)| entry.value.clone())
    }

    // ========================================================================
    // Store
    // ========================================================================

    /// Store a response. `ttl = None` uses the configured default.
    pub fn set(
        &self,
        operation: &str,
        params: &Value,
        variant: &Value,
        value: Value,
        ttl: Option<Duration>,
    ) -> Result<()> {
        let key = CacheKey::new(operation, params, variant)?;
        self.insert(key, value, ttl)
    }

    pub fn insert(&self, key: CacheKey, value: Value, ttl: Option<Duration>) -> Result<()> {
        if self.config.max_entries == 0 {
            return Err(Error::cache_rejected(
                key.operation(),
                "cache capacity is zero",
            ));
        }

        let size_bytes = serialized_len(&value);
        if self.config.max_entry_bytes > 0 && size_bytes > self.config.max_entry_bytes {
            return Err(Error::cache_rejected(
                key.operation(),
                format!(
                    "entry of {} bytes exceeds limit of {} bytes",
                    size_bytes, self.config.max_entry_bytes
                ),
            ));
        }

        let entry = CacheEntry {
            key: key.as_str().to_string(),
            operation: key.operation().to_string(),
            value,
            created_at: Instant::now(),
            ttl: ttl.unwrap_or_else(|| self.default_ttl()),
            size_bytes,
        };

        let mut inner = self.inner.lock();

        if !inner.entries.contains_key(key.as_str())
            && inner.entries.len() >= self.config.max_entries
        {
            if let Some(evicted) = inner.remove_at(0) {
                inner.evictions += 1;
                debug!(
                    key = %evicted.key,
                    operation = %evicted.operation,
                    "Evicted oldest cache entry"
                );
            }
        }

        // IndexMap::insert keeps the original slot for an existing key
        if let Some(previous) = inner.entries.insert(entry.key.clone(), entry) {
            inner.stored_bytes = inner.stored_bytes.saturating_sub(previous.size_bytes);
        }
        inner.stored_bytes += size_bytes;

        Ok(())
    }

    // ========================================================================
    // Invalidation
    // ========================================================================

    /// Remove every entry stored for `operation`
    pub fn invalidate_by_operation(&self, operation: &str) -> usize {
        let removed = self.inner.lock().retain(|_, entry| entry.operation != operation);
        if removed > 0 {
            debug!(operation, removed, "Invalidated cache entries");
        }
        removed
    }

    /// Remove every entry whose key matches `pattern`
    pub fn invalidate_matching(&self, pattern: &Regex) -> usize {
        let removed = self.inner.lock().retain(|key, _| !pattern.is_match(key));
        if removed > 0 {
            debug!(pattern = pattern.as_str(), removed, "Invalidated cache entries");
        }
        removed
    }

    /// Remove all expired entries, returning how many were dropped
    pub fn purge_expired(&self) -> usize {
        self.purge_expired_at(Instant::now())
    }

    pub fn purge_expired_at(&self, now: Instant) -> usize {
        let mut inner = self.inner.lock();
        let removed = inner.retain(|_, entry| !entry.is_expired_at(now));
        inner.expirations += removed as u64;
        removed
    }

    /// Drop all entries. Counters are kept.
    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        inner.entries.clear();
        inner.stored_bytes = 0;
    }

    // ========================================================================
    // Introspection
    // ========================================================================

    pub fn contains(&self, key: &CacheKey) -> bool {
        self.inner.lock().entries.contains_key(key.as_str())
    }

    /// Keys in insertion order, oldest first
    pub fn keys(&self) -> Vec<String> {
        self.inner.lock().entries.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().entries.is_empty()
    }

    pub fn stats(&self) -> ResponseCacheStats {
        let inner = self.inner.lock();
        let total_requests = inner.hits + inner.misses;
        let hit_rate = if total_requests > 0 {
            inner.hits as f64 / total_requests as f64
        } else {
            0.0
        };

        ResponseCacheStats {
            entries: inner.entries.len(),
            capacity: self.config.max_entries,
            hits: inner.hits,
            misses: inner.misses,
            evictions: inner.evictions,
            expirations: inner.expirations,
            hit_rate,
            memory_bytes: inner.stored_bytes,
        }
    }
}

/// Response cache statistics
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseCacheStats {
    pub entries: usize,
    pub capacity: usize,
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub expirations: u64,
    /// Fraction of lookups served from the cache (0.0 - 1.0)
    pub hit_rate: f64,
    /// Serialized bytes currently held
    pub memory_bytes: usize,
}
