use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use vigil_authz::{Permission, PermissionId, PermissionName, Role, UserId};

pub mod memory;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("authority unavailable: {0}")]
    Unavailable(String),
    #[error(transparent)]
    Unexpected(#[from] anyhow::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

impl From<StoreError> for vigil_authz::AuthzError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(what) => vigil_authz::AuthzError::NotFound(what),
            StoreError::Unavailable(why) => vigil_authz::AuthzError::AuthorityUnavailable(why),
            StoreError::Unexpected(err) => vigil_authz::AuthzError::Internal(err.to_string()),
        }
    }
}

/// One per-user grant row: an explicit allow or deny for a permission.
///
/// A `granted: false` row is a deny override that wins over any role grant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserGrant {
    pub permission_id: PermissionId,
    pub granted: bool,
}

/// Ground-truth source for permission grants.
///
/// The store is authoritative and assumed slow (a network round trip per
/// call); the engine layers its cache on top and falls back here whenever the
/// cache cannot answer. Implementations must keep `user_has_permission` the
/// single authoritative decision for a `(user, permission)` pair: per-user
/// override rows win over role grants, which win over the default deny.
///
/// `replace_user_permissions` is a full replace, never an incremental add:
/// all existing rows for the user are cleared before the new set is written,
/// so repeating a call with the same input is idempotent.
#[async_trait]
pub trait AuthorityStore: Send + Sync {
    async fn user_has_permission(
        &self,
        user_id: &UserId,
        name: &PermissionName,
    ) -> StoreResult<bool>;

    async fn role_permissions(&self, role: Role) -> StoreResult<Vec<Permission>>;

    async fn permission_catalog(&self) -> StoreResult<Vec<Permission>>;

    async fn grant_role_permission(
        &self,
        role: Role,
        permission_id: PermissionId,
    ) -> StoreResult<()>;

    async fn revoke_role_permission(
        &self,
        role: Role,
        permission_id: PermissionId,
    ) -> StoreResult<()>;

    async fn replace_user_permissions(
        &self,
        user_id: &UserId,
        grants: Vec<UserGrant>,
    ) -> StoreResult<()>;

    async fn health_check(&self) -> StoreResult<()>;

    /// Human-readable backend identifier used in logs and diagnostics.
    fn backend_name(&self) -> &'static str;
}
