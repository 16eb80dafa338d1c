//! Per-role version counters.
//!
//! # Purpose
//! Maintains one monotonically increasing counter per role, persisted in the
//! cache store under a long TTL. External clients compare the counter against
//! their last-seen value to cheaply detect that a locally cached permission
//! set went stale, without transmitting the set itself.
//!
//! # Key invariants
//! - Counters start at 1 on first read and increase by exactly 1 per bump.
//! - Bumps happen after the underlying grant mutation has committed and after
//!   the matching cache invalidation, so a client that reacts to a new
//!   version recomputes against fresh authority data.
//! - A version number is a staleness signal, not a correctness guarantee:
//!   concurrent bumps may lose an increment, and a degraded cache store may
//!   even regress the counter. Both only cause clients to refetch.
use crate::cache::{keys, CacheError, CacheStore};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use vigil_authz::{AuthzError, AuthzResult, Role};

/// The initial version every role reports before any mutation.
pub const INITIAL_VERSION: u64 = 1;

#[derive(Clone)]
pub struct VersionLedger {
    store: Arc<dyn CacheStore>,
    ttl: Duration,
    timeout: Duration,
}

impl VersionLedger {
    pub fn new(store: Arc<dyn CacheStore>, ttl: Duration, timeout: Duration) -> Self {
        Self {
            store,
            ttl,
            timeout,
        }
    }

    /// Current counter for a role, initializing to 1 when absent.
    ///
    /// Fails open: if the cache store cannot answer, the role reports the
    /// initial version, which at worst makes a client refetch.
    pub async fn current_version(&self, role: Role) -> u64 {
        match self.read(role).await {
            Ok(Some(version)) => version,
            Ok(None) => {
                self.persist(role, INITIAL_VERSION).await.unwrap_or_else(|err| {
                    tracing::warn!(role = role.as_str(), error = %err, "version init not persisted");
                });
                INITIAL_VERSION
            }
            Err(err) => {
                tracing::warn!(role = role.as_str(), error = %err, "version read failed, reporting initial");
                INITIAL_VERSION
            }
        }
    }

    /// Increment the role's counter by exactly 1 and return the new value.
    ///
    /// # Errors
    /// - [`AuthzError::Internal`] when the new value cannot be persisted; the
    ///   caller's mutation has already committed at that point and remains
    ///   valid, only the staleness signal is lost.
    pub async fn bump(&self, role: Role) -> AuthzResult<u64> {
        let current = match self.read(role).await {
            Ok(Some(version)) => version,
            Ok(None) => INITIAL_VERSION,
            Err(err) => {
                tracing::warn!(role = role.as_str(), error = %err, "version read failed during bump");
                INITIAL_VERSION
            }
        };
        let next = current + 1;
        self.persist(role, next)
            .await
            .map_err(|err| AuthzError::Internal(format!("persist version for {role}: {err}")))?;
        metrics::counter!("vigil_version_bumps_total", "role" => role.as_str()).increment(1);
        Ok(next)
    }

    async fn read(&self, role: Role) -> Result<Option<u64>, CacheError> {
        let key = keys::version_key(role);
        let value = match tokio::time::timeout(self.timeout, self.store.get(&key)).await {
            Ok(result) => result?,
            Err(_) => return Err(CacheError::Timeout(self.timeout)),
        };
        // A payload that is not a number is treated as absent and re-initialized.
        Ok(value.and_then(|value| value.as_u64()))
    }

    async fn persist(&self, role: Role, version: u64) -> Result<(), CacheError> {
        let key = keys::version_key(role);
        match tokio::time::timeout(self.timeout, self.store.set(&key, json!(version), self.ttl))
            .await
        {
            Ok(result) => result,
            Err(_) => Err(CacheError::Timeout(self.timeout)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::InMemoryCacheStore;
    use crate::test_support::FailingCacheStore;

    fn ledger(store: Arc<dyn CacheStore>) -> VersionLedger {
        VersionLedger::new(store, Duration::from_secs(3_600), Duration::from_secs(1))
    }

    #[tokio::test]
    async fn first_read_initializes_to_one() {
        let store = Arc::new(InMemoryCacheStore::new());
        let ledger = ledger(store.clone());
        assert_eq!(ledger.current_version(Role::Support).await, 1);
        // The initial value was persisted, not just reported.
        assert!(store.contains_live("permissions:version:support"));
    }

    #[tokio::test]
    async fn bump_increments_by_exactly_one() {
        let ledger = ledger(Arc::new(InMemoryCacheStore::new()));
        assert_eq!(ledger.current_version(Role::Support).await, 1);
        assert_eq!(ledger.bump(Role::Support).await.expect("bump"), 2);
        assert_eq!(ledger.bump(Role::Support).await.expect("bump"), 3);
        assert_eq!(ledger.current_version(Role::Support).await, 3);
    }

    #[tokio::test]
    async fn bump_without_prior_read_starts_from_initial() {
        let ledger = ledger(Arc::new(InMemoryCacheStore::new()));
        assert_eq!(ledger.bump(Role::Viewer).await.expect("bump"), 2);
    }

    #[tokio::test]
    async fn versions_are_per_role() {
        let ledger = ledger(Arc::new(InMemoryCacheStore::new()));
        ledger.bump(Role::Reseller).await.expect("bump");
        assert_eq!(ledger.current_version(Role::Reseller).await, 2);
        assert_eq!(ledger.current_version(Role::Consumer).await, 1);
    }

    #[tokio::test]
    async fn failed_store_reads_fail_open() {
        let ledger = ledger(Arc::new(FailingCacheStore));
        assert_eq!(ledger.current_version(Role::Admin).await, 1);
        let err = ledger.bump(Role::Admin).await.expect_err("persist fails");
        assert!(matches!(err, AuthzError::Internal(_)));
    }
}
