//! Cache store abstraction.
//!
//! # Purpose
//! Defines the key/value cache seam the engine accelerates through. The cache
//! is never authoritative: every value it holds can be recomputed from the
//! authority store, and every operation here is allowed to fail without
//! affecting correctness.
//!
//! # Key invariants
//! - Single-key get/set/delete are atomic at the key level; the engine holds
//!   no lock of its own and relies on that.
//! - `delete_pattern` is O(keys scanned); callers prefer exact deletes
//!   wherever the scope is known.
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

pub mod coordinator;
pub mod keys;
pub mod memory;

pub use coordinator::{CacheCoordinator, InvalidationScope};
pub use memory::InMemoryCacheStore;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache timeout after {0:?}")]
    Timeout(Duration),
    #[error("cache backend: {0}")]
    Backend(String),
}

pub type CacheResult<T> = Result<T, CacheError>;

/// TTL'd key/value store used as a pure accelerator.
///
/// Implementations expire entries on their own; an expired entry must read as
/// absent, never as a stale hit.
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, key: &str) -> CacheResult<Option<Value>>;

    async fn set(&self, key: &str, value: Value, ttl: Duration) -> CacheResult<()>;

    async fn delete(&self, key: &str) -> CacheResult<()>;

    /// Delete every key matching a `*` glob, returning how many were removed.
    async fn delete_pattern(&self, pattern: &str) -> CacheResult<usize>;
}
