//! Read-through cache coordination and invalidation.
//!
//! # Purpose and responsibility
//! Wraps the cache store with the read-through pattern used by every cached
//! lookup in the engine, and owns the invalidation API called whenever the
//! underlying grants change. The coordinator is the only writer of
//! permission-cache keys.
//!
//! # Key invariants and assumptions
//! - Cache errors on read or write never propagate as failures: the
//!   coordinator logs, counts a metric, and falls through to the compute
//!   function, so the engine degrades to slow-but-correct.
//! - Invalidation is eager and synchronous with the mutation that caused it;
//!   there is no dirty or pending state. The residual window between a
//!   mutation and the delete taking effect is bounded by the short TTLs on
//!   permission data.
use super::{keys, CacheError, CacheResult, CacheStore};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use vigil_authz::{Role, UserId};

/// Invalidation request naming the narrowest scopes that must go.
///
/// Scopes combine: a role mutation typically invalidates the role's own keys
/// plus the listing family, while a systemadmin flip touches exactly one user
/// key and nothing else.
#[derive(Debug, Clone, Default)]
pub struct InvalidationScope {
    pub role: Option<Role>,
    pub user_id: Option<UserId>,
    pub resource: Option<String>,
    pub clear_all: bool,
}

impl InvalidationScope {
    pub fn role(role: Role) -> Self {
        Self {
            role: Some(role),
            ..Self::default()
        }
    }

    pub fn user(user_id: UserId) -> Self {
        Self {
            user_id: Some(user_id),
            ..Self::default()
        }
    }

    pub fn resource(resource: impl Into<String>) -> Self {
        Self {
            resource: Some(resource.into()),
            ..Self::default()
        }
    }

    pub fn with_clear_all(mut self) -> Self {
        self.clear_all = true;
        self
    }
}

#[derive(Clone)]
pub struct CacheCoordinator {
    store: Arc<dyn CacheStore>,
    timeout: Duration,
}

impl CacheCoordinator {
    pub fn new(store: Arc<dyn CacheStore>, timeout: Duration) -> Self {
        Self { store, timeout }
    }

    /// Read a raw value, treating every cache failure as a miss.
    pub async fn get(&self, key: &str) -> Option<Value> {
        match self.fetch(key).await {
            Ok(Some(value)) => {
                metrics::counter!("vigil_cache_hits_total").increment(1);
                Some(value)
            }
            Ok(None) => {
                metrics::counter!("vigil_cache_misses_total").increment(1);
                None
            }
            Err(err) => {
                metrics::counter!("vigil_cache_errors_total", "op" => "get").increment(1);
                tracing::warn!(key, error = %err, "cache read failed, treating as miss");
                None
            }
        }
    }

    /// Write a value best-effort; failures are logged and swallowed.
    pub async fn put(&self, key: &str, value: Value, ttl: Duration) {
        if let Err(err) = self.store_value(key, value, ttl).await {
            metrics::counter!("vigil_cache_errors_total", "op" => "set").increment(1);
            tracing::warn!(key, error = %err, "cache write failed, value not cached");
        }
    }

    /// Standard read-through: hit returns immediately, miss computes, stores
    /// with the given TTL, and returns. Only the compute function can fail;
    /// the cache cannot.
    pub async fn get_or_compute<T, E, F, Fut>(
        &self,
        key: &str,
        ttl: Duration,
        compute: F,
    ) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if let Some(value) = self.get(key).await {
            match serde_json::from_value(value) {
                Ok(decoded) => return Ok(decoded),
                Err(err) => {
                    // A payload we cannot decode is as good as absent; drop it
                    // so the recomputed value replaces it.
                    tracing::warn!(key, error = %err, "cache payload undecodable, recomputing");
                    let _ = self.remove(key).await;
                }
            }
        }

        let computed = compute().await?;
        match serde_json::to_value(&computed) {
            Ok(value) => self.put(key, value, ttl).await,
            Err(err) => {
                tracing::warn!(key, error = %err, "cache encode failed, value not cached")
            }
        }
        Ok(computed)
    }

    /// Delete every key the scope names. All deletes are best-effort: a cache
    /// that cannot delete also cannot serve hits for long, because permission
    /// TTLs stay bounded.
    pub async fn invalidate(&self, scope: InvalidationScope) {
        if let Some(role) = scope.role {
            self.remove_logged(&keys::role_key(role), "role").await;
            self.remove_logged(&keys::role_simplified_key(role), "role")
                .await;
            // User decision maps embed role-derived grants, so a role change
            // sweeps them all. Broad, but only mutations pay for it.
            self.remove_pattern_logged(keys::user_pattern(), "role")
                .await;
        }
        if let Some(user_id) = &scope.user_id {
            self.remove_logged(&keys::user_key(user_id), "user").await;
        }
        if let Some(resource) = &scope.resource {
            self.remove_pattern_logged(&keys::resource_pattern(resource), "resource")
                .await;
        }
        if scope.clear_all {
            self.remove_logged(&keys::catalog_key(), "all").await;
            self.remove_pattern_logged(keys::listing_pattern(), "all")
                .await;
        }
    }

    async fn remove_logged(&self, key: &str, scope: &'static str) {
        metrics::counter!("vigil_cache_invalidations_total", "scope" => scope).increment(1);
        if let Err(err) = self.remove(key).await {
            metrics::counter!("vigil_cache_errors_total", "op" => "delete").increment(1);
            tracing::warn!(key, error = %err, "cache delete failed");
        }
    }

    async fn remove_pattern_logged(&self, pattern: &str, scope: &'static str) {
        metrics::counter!("vigil_cache_invalidations_total", "scope" => scope).increment(1);
        match self.remove_pattern(pattern).await {
            Ok(removed) => {
                tracing::debug!(pattern, removed, "cache pattern delete");
            }
            Err(err) => {
                metrics::counter!("vigil_cache_errors_total", "op" => "delete_pattern")
                    .increment(1);
                tracing::warn!(pattern, error = %err, "cache pattern delete failed");
            }
        }
    }

    async fn fetch(&self, key: &str) -> CacheResult<Option<Value>> {
        match tokio::time::timeout(self.timeout, self.store.get(key)).await {
            Ok(result) => result,
            Err(_) => Err(CacheError::Timeout(self.timeout)),
        }
    }

    async fn store_value(&self, key: &str, value: Value, ttl: Duration) -> CacheResult<()> {
        match tokio::time::timeout(self.timeout, self.store.set(key, value, ttl)).await {
            Ok(result) => result,
            Err(_) => Err(CacheError::Timeout(self.timeout)),
        }
    }

    async fn remove(&self, key: &str) -> CacheResult<()> {
        match tokio::time::timeout(self.timeout, self.store.delete(key)).await {
            Ok(result) => result,
            Err(_) => Err(CacheError::Timeout(self.timeout)),
        }
    }

    async fn remove_pattern(&self, pattern: &str) -> CacheResult<usize> {
        match tokio::time::timeout(self.timeout, self.store.delete_pattern(pattern)).await {
            Ok(result) => result,
            Err(_) => Err(CacheError::Timeout(self.timeout)),
        }
    }
}
