//! In-memory TTL cache backend.
//!
//! # Purpose
//! `DashMap`-based implementation of the `CacheStore` trait for local
//! development, tests, and single-process deployments. Entries carry an
//! absolute expiry instant and are reaped lazily on read.
//!
//! # Notes
//! Expiry is lazy: an expired entry occupies memory until the next read or a
//! matching pattern delete touches it. Workloads here are small keyspaces of
//! permission data, so no background sweeper is needed.
use super::{CacheResult, CacheStore};
use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::Value;
use std::time::{Duration, Instant};
use vigil_authz::wildcard_match;

#[derive(Clone)]
struct CacheEntry {
    value: Value,
    expires_at: Instant,
}

impl CacheEntry {
    fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }
}

#[derive(Default)]
pub struct InMemoryCacheStore {
    entries: DashMap<String, CacheEntry>,
}

impl InMemoryCacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live (unexpired) entries, for diagnostics and tests.
    pub fn live_len(&self) -> usize {
        self.entries
            .iter()
            .filter(|entry| !entry.value().is_expired())
            .count()
    }

    /// Whether a key currently holds a live entry.
    pub fn contains_live(&self, key: &str) -> bool {
        self.entries
            .get(key)
            .is_some_and(|entry| !entry.value().is_expired())
    }
}

#[async_trait]
impl CacheStore for InMemoryCacheStore {
    async fn get(&self, key: &str) -> CacheResult<Option<Value>> {
        if let Some(entry) = self.entries.get(key) {
            if !entry.value().is_expired() {
                return Ok(Some(entry.value().value.clone()));
            }
        }
        // Reap the expired entry so repeated misses don't keep it around.
        self.entries
            .remove_if(key, |_, entry| entry.is_expired());
        Ok(None)
    }

    async fn set(&self, key: &str, value: Value, ttl: Duration) -> CacheResult<()> {
        self.entries.insert(
            key.to_string(),
            CacheEntry {
                value,
                expires_at: Instant::now() + ttl,
            },
        );
        Ok(())
    }

    async fn delete(&self, key: &str) -> CacheResult<()> {
        self.entries.remove(key);
        Ok(())
    }

    async fn delete_pattern(&self, pattern: &str) -> CacheResult<usize> {
        let before = self.entries.len();
        self.entries
            .retain(|key, entry| !entry.is_expired() && !wildcard_match(pattern, key));
        Ok(before - self.entries.len())
    }
}
