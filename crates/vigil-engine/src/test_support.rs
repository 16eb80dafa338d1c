// Shared test helpers:
// - a cache store that always fails, for exercising the fail-open paths
// - an authority store wrapper that counts lookups, for asserting shortcuts
// - a seeded fixture matching the canonical reseller scenario
// - an env guard that restores variables on drop
use crate::cache::{CacheError, CacheResult, CacheStore};
use crate::store::memory::InMemoryAuthorityStore;
use crate::store::{AuthorityStore, StoreResult, UserGrant};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use vigil_authz::{
    ActorProfile, Permission, PermissionId, PermissionName, Role, RoleSet, UserId,
};

/// Cache store where every operation fails, simulating an unreachable
/// backend.
pub struct FailingCacheStore;

#[async_trait]
impl CacheStore for FailingCacheStore {
    async fn get(&self, _key: &str) -> CacheResult<Option<Value>> {
        Err(CacheError::Backend("injected failure".into()))
    }

    async fn set(&self, _key: &str, _value: Value, _ttl: Duration) -> CacheResult<()> {
        Err(CacheError::Backend("injected failure".into()))
    }

    async fn delete(&self, _key: &str) -> CacheResult<()> {
        Err(CacheError::Backend("injected failure".into()))
    }

    async fn delete_pattern(&self, _pattern: &str) -> CacheResult<usize> {
        Err(CacheError::Backend("injected failure".into()))
    }
}

/// Delegating authority store that counts `user_has_permission` calls so
/// tests can assert that shortcut paths perform zero lookups.
pub struct CountingAuthorityStore {
    inner: Arc<dyn AuthorityStore>,
    lookups: AtomicUsize,
}

impl CountingAuthorityStore {
    pub fn new(inner: Arc<dyn AuthorityStore>) -> Self {
        Self {
            inner,
            lookups: AtomicUsize::new(0),
        }
    }

    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AuthorityStore for CountingAuthorityStore {
    async fn user_has_permission(
        &self,
        user_id: &UserId,
        name: &PermissionName,
    ) -> StoreResult<bool> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        self.inner.user_has_permission(user_id, name).await
    }

    async fn role_permissions(&self, role: Role) -> StoreResult<Vec<Permission>> {
        self.inner.role_permissions(role).await
    }

    async fn permission_catalog(&self) -> StoreResult<Vec<Permission>> {
        self.inner.permission_catalog().await
    }

    async fn grant_role_permission(
        &self,
        role: Role,
        permission_id: PermissionId,
    ) -> StoreResult<()> {
        self.inner.grant_role_permission(role, permission_id).await
    }

    async fn revoke_role_permission(
        &self,
        role: Role,
        permission_id: PermissionId,
    ) -> StoreResult<()> {
        self.inner.revoke_role_permission(role, permission_id).await
    }

    async fn replace_user_permissions(
        &self,
        user_id: &UserId,
        grants: Vec<UserGrant>,
    ) -> StoreResult<()> {
        self.inner.replace_user_permissions(user_id, grants).await
    }

    async fn health_check(&self) -> StoreResult<()> {
        self.inner.health_check().await
    }

    fn backend_name(&self) -> &'static str {
        "counting"
    }
}

/// Seeded authority data for the canonical scenario: a catalog of three
/// permissions, the reseller role granted `invoices.view`, and one reseller
/// user.
pub struct Fixture {
    pub store: Arc<InMemoryAuthorityStore>,
    pub invoices_view: Permission,
    pub invoices_delete: Permission,
    pub products_view: Permission,
}

impl Fixture {
    pub fn reseller_actor(&self) -> ActorProfile {
        ActorProfile::new(UserId::new("reseller-1"), RoleSet::from(Role::Reseller))
    }
}

pub async fn seeded_fixture() -> Fixture {
    let store = Arc::new(InMemoryAuthorityStore::new());
    let invoices_view = test_permission("invoices.view");
    let invoices_delete = test_permission("invoices.delete");
    let products_view = test_permission("products.view");
    store.insert_permission(invoices_view.clone()).await;
    store.insert_permission(invoices_delete.clone()).await;
    store.insert_permission(products_view.clone()).await;
    store
        .grant_role_permission(Role::Reseller, invoices_view.id)
        .await
        .expect("seed grant");
    store
        .set_user_roles(UserId::new("reseller-1"), RoleSet::from(Role::Reseller))
        .await;
    Fixture {
        store,
        invoices_view,
        invoices_delete,
        products_view,
    }
}

pub fn test_permission(name: &str) -> Permission {
    Permission::new(
        PermissionId::new(),
        PermissionName::parse(name).expect("permission name"),
        format!("{name} (test catalog)"),
    )
}

/// Restores an environment variable to its previous value on drop.
pub struct EnvGuard {
    key: &'static str,
    prev: Option<String>,
}

impl EnvGuard {
    pub fn set(key: &'static str, value: &str) -> Self {
        let prev = std::env::var(key).ok();
        std::env::set_var(key, value);
        Self { key, prev }
    }

    pub fn unset(key: &'static str) -> Self {
        let prev = std::env::var(key).ok();
        std::env::remove_var(key);
        Self { key, prev }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        match &self.prev {
            Some(value) => std::env::set_var(self.key, value),
            None => std::env::remove_var(self.key),
        }
    }
}
