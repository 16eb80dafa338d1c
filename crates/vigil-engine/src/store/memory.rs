//! In-memory implementation of the authority store.
//!
//! # Purpose
//! This store implements the `AuthorityStore` trait entirely in memory using
//! `HashMap`s guarded by `tokio::sync::RwLock`. It exists for:
//! - local development and tests (no external dependencies)
//! - embedding services that seed a fixed permission model at startup
//!
//! # Durability and consistency
//! - **Not durable**: all state is lost on process restart.
//! - **Single-process consistency**: write locks for mutations, read locks
//!   for reads.
//!
//! # Decision semantics
//! `user_has_permission` is the authoritative decision for a pair:
//! 1. A per-user override row wins outright, whether it grants or denies.
//! 2. Otherwise any of the user's roles granting the permission wins.
//! 3. Otherwise deny.
//!
//! A permission name absent from the catalog resolves to deny rather than an
//! error; catalog membership is not the caller's problem at check time.
//!
//! # Performance characteristics
//! - Name lookups scan the catalog; acceptable for the small, immutable
//!   reference data this store holds.
use super::{AuthorityStore, StoreError, StoreResult, UserGrant};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;
use vigil_authz::{Permission, PermissionId, PermissionName, Role, RoleSet, UserId};

/// In-memory authority store.
///
/// All maps are wrapped in `Arc<RwLock<...>>` so the store can be cloned and
/// shared across async tasks, reads proceed concurrently, and writes are
/// serialized to preserve invariants.
#[derive(Default, Clone)]
pub struct InMemoryAuthorityStore {
    /// Permission catalog keyed by id.
    permissions: Arc<RwLock<HashMap<PermissionId, Permission>>>,
    /// Role grant rows, unique per `(role, permission_id)` pair.
    role_grants: Arc<RwLock<HashMap<Role, HashSet<PermissionId>>>>,
    /// Per-user override rows keyed by `(user, permission_id)`.
    user_overrides: Arc<RwLock<HashMap<UserId, HashMap<PermissionId, bool>>>>,
    /// Role membership consulted by the authoritative decision.
    user_roles: Arc<RwLock<HashMap<UserId, RoleSet>>>,
}

impl InMemoryAuthorityStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a catalog entry. Permissions are immutable reference data; there
    /// is deliberately no update or delete counterpart.
    pub async fn insert_permission(&self, permission: Permission) {
        let mut permissions = self.permissions.write().await;
        permissions.insert(permission.id, permission);
        metrics::gauge!("vigil_catalog_permissions").set(permissions.len() as f64);
    }

    /// Record role membership for a user so the authoritative decision can
    /// consult role grants.
    pub async fn set_user_roles(&self, user_id: UserId, roles: RoleSet) {
        self.user_roles.write().await.insert(user_id, roles);
    }

    async fn find_by_name(&self, name: &PermissionName) -> Option<PermissionId> {
        self.permissions
            .read()
            .await
            .values()
            .find(|permission| &permission.name == name)
            .map(|permission| permission.id)
    }

    async fn require_permission(&self, permission_id: PermissionId) -> StoreResult<()> {
        if self.permissions.read().await.contains_key(&permission_id) {
            Ok(())
        } else {
            Err(StoreError::NotFound("permission".into()))
        }
    }
}

#[async_trait]
impl AuthorityStore for InMemoryAuthorityStore {
    async fn user_has_permission(
        &self,
        user_id: &UserId,
        name: &PermissionName,
    ) -> StoreResult<bool> {
        let Some(permission_id) = self.find_by_name(name).await else {
            // Unknown names deny rather than error; the catalog is reference
            // data and check callers cannot be expected to pre-validate.
            return Ok(false);
        };

        // An override row decides outright, whether it grants or denies.
        if let Some(overrides) = self.user_overrides.read().await.get(user_id) {
            if let Some(granted) = overrides.get(&permission_id) {
                return Ok(*granted);
            }
        }

        let user_roles = self.user_roles.read().await;
        let Some(roles) = user_roles.get(user_id) else {
            return Ok(false);
        };
        let role_grants = self.role_grants.read().await;
        let granted = roles.iter().any(|role| {
            role_grants
                .get(&role)
                .is_some_and(|grants| grants.contains(&permission_id))
        });
        Ok(granted)
    }

    async fn role_permissions(&self, role: Role) -> StoreResult<Vec<Permission>> {
        let role_grants = self.role_grants.read().await;
        let permissions = self.permissions.read().await;
        let mut items: Vec<Permission> = role_grants
            .get(&role)
            .map(|grants| {
                grants
                    .iter()
                    .filter_map(|id| permissions.get(id).cloned())
                    .collect()
            })
            .unwrap_or_default();
        // Deterministic order keeps cached payloads stable across reads.
        items.sort_by(|a, b| a.name.as_str().cmp(b.name.as_str()));
        Ok(items)
    }

    async fn permission_catalog(&self) -> StoreResult<Vec<Permission>> {
        let mut items: Vec<Permission> = self.permissions.read().await.values().cloned().collect();
        items.sort_by(|a, b| a.name.as_str().cmp(b.name.as_str()));
        Ok(items)
    }

    async fn grant_role_permission(
        &self,
        role: Role,
        permission_id: PermissionId,
    ) -> StoreResult<()> {
        self.require_permission(permission_id).await?;
        self.role_grants
            .write()
            .await
            .entry(role)
            .or_default()
            .insert(permission_id);
        metrics::counter!("vigil_role_grant_changes_total", "op" => "granted").increment(1);
        Ok(())
    }

    async fn revoke_role_permission(
        &self,
        role: Role,
        permission_id: PermissionId,
    ) -> StoreResult<()> {
        let mut role_grants = self.role_grants.write().await;
        let removed = role_grants
            .get_mut(&role)
            .is_some_and(|grants| grants.remove(&permission_id));
        if !removed {
            return Err(StoreError::NotFound("role permission".into()));
        }
        metrics::counter!("vigil_role_grant_changes_total", "op" => "revoked").increment(1);
        Ok(())
    }

    async fn replace_user_permissions(
        &self,
        user_id: &UserId,
        grants: Vec<UserGrant>,
    ) -> StoreResult<()> {
        for grant in &grants {
            self.require_permission(grant.permission_id).await?;
        }
        // Full replace: the entire override map for the user is swapped out,
        // so no stale rows survive and repeats are idempotent.
        let mut rows = HashMap::with_capacity(grants.len());
        for grant in grants {
            rows.insert(grant.permission_id, grant.granted);
        }
        self.user_overrides
            .write()
            .await
            .insert(user_id.clone(), rows);
        metrics::counter!("vigil_user_grant_replacements_total").increment(1);
        Ok(())
    }

    async fn health_check(&self) -> StoreResult<()> {
        // In-memory backend is always "healthy" if the process is running.
        // Durable backends should probe connectivity instead.
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vigil_authz::{PermissionId, PermissionName};

    fn permission(name: &str) -> Permission {
        Permission::new(
            PermissionId::new(),
            PermissionName::parse(name).expect("name"),
            format!("{name} for tests"),
        )
    }

    #[tokio::test]
    async fn role_grant_and_override_precedence() {
        let store = InMemoryAuthorityStore::new();
        let view = permission("invoices.view");
        store.insert_permission(view.clone()).await;

        let user = UserId::new("u-1");
        store
            .set_user_roles(user.clone(), RoleSet::from(Role::Reseller))
            .await;

        let name = view.name.clone();
        assert!(!store.user_has_permission(&user, &name).await.expect("check"));

        store
            .grant_role_permission(Role::Reseller, view.id)
            .await
            .expect("grant");
        assert!(store.user_has_permission(&user, &name).await.expect("check"));

        // A deny override beats the role grant.
        store
            .replace_user_permissions(
                &user,
                vec![UserGrant {
                    permission_id: view.id,
                    granted: false,
                }],
            )
            .await
            .expect("replace");
        assert!(!store.user_has_permission(&user, &name).await.expect("check"));
    }

    #[tokio::test]
    async fn replace_user_permissions_is_a_full_replace() {
        let store = InMemoryAuthorityStore::new();
        let view = permission("invoices.view");
        let delete = permission("invoices.delete");
        store.insert_permission(view.clone()).await;
        store.insert_permission(delete.clone()).await;

        let user = UserId::new("u-2");
        store
            .replace_user_permissions(
                &user,
                vec![UserGrant {
                    permission_id: view.id,
                    granted: true,
                }],
            )
            .await
            .expect("first");

        // The second assignment names a different set; nothing from the first
        // survives.
        let second = vec![UserGrant {
            permission_id: delete.id,
            granted: true,
        }];
        store
            .replace_user_permissions(&user, second.clone())
            .await
            .expect("second");
        assert!(!store
            .user_has_permission(&user, &view.name)
            .await
            .expect("view"));
        assert!(store
            .user_has_permission(&user, &delete.name)
            .await
            .expect("delete"));

        // Repeating the same assignment is idempotent.
        store
            .replace_user_permissions(&user, second)
            .await
            .expect("repeat");
        assert!(store
            .user_has_permission(&user, &delete.name)
            .await
            .expect("delete again"));
        let overrides = store.user_overrides.read().await;
        assert_eq!(overrides.get(&user).map(HashMap::len), Some(1));
    }

    #[tokio::test]
    async fn unknown_permission_name_denies() {
        let store = InMemoryAuthorityStore::new();
        let user = UserId::new("u-3");
        let name = PermissionName::parse("ghosts.summon").expect("name");
        assert!(!store.user_has_permission(&user, &name).await.expect("check"));
    }

    #[tokio::test]
    async fn grants_require_catalog_membership() {
        let store = InMemoryAuthorityStore::new();
        let err = store
            .grant_role_permission(Role::Viewer, PermissionId::new())
            .await
            .expect_err("missing permission");
        assert!(matches!(err, StoreError::NotFound(_)));

        let err = store
            .revoke_role_permission(Role::Viewer, PermissionId::new())
            .await
            .expect_err("missing pair");
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn role_permissions_sorted_and_scoped() {
        let store = InMemoryAuthorityStore::new();
        let b = permission("invoices.view");
        let a = permission("invoices.delete");
        let other = permission("products.view");
        store.insert_permission(a.clone()).await;
        store.insert_permission(b.clone()).await;
        store.insert_permission(other.clone()).await;
        store
            .grant_role_permission(Role::Reseller, b.id)
            .await
            .expect("grant");
        store
            .grant_role_permission(Role::Reseller, a.id)
            .await
            .expect("grant");
        store
            .grant_role_permission(Role::Viewer, other.id)
            .await
            .expect("grant");

        let items = store.role_permissions(Role::Reseller).await.expect("list");
        let names: Vec<&str> = items.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["invoices.delete", "invoices.view"]);

        assert_eq!(store.backend_name(), "memory");
        store.health_check().await.expect("health");
    }
}
