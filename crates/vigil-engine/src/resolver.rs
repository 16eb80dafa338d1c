//! Core permission decision function.
//!
//! # Purpose and responsibility
//! Merges the three independent authority sources into one boolean: the
//! systemadmin override, the admin-role shortcut, and the per-user
//! authoritative lookup. Exposes single, any-of, and all-of check modes.
//!
//! # Key invariants and assumptions
//! - The evaluation order is strict and short-circuits on the first match:
//!   systemadmin, then admin role, then the store lookup.
//! - The admin role means "all permissions" by definition, not by table
//!   lookup; some permissions are never wired to admin in the underlying
//!   rows, so replacing the shortcut with a store query would break them.
//! - Callers reject deactivated reseller/consumer accounts before profiles
//!   reach this type; see `ActorProfile::is_deactivated_tenant`.
//!
//! # Error behavior
//! A single check that cannot reach the store fails with
//! `AuthorityUnavailable`; the caller should deny, never grant. Inside the
//! any/all fan-out, a per-item failure counts as false for that item only.
use crate::store::{AuthorityStore, StoreError};
use futures::stream::{FuturesUnordered, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use vigil_authz::{ActorProfile, AuthzError, AuthzResult, PermissionName, Role, UserId};

#[derive(Clone)]
pub struct AuthorityResolver {
    store: Arc<dyn AuthorityStore>,
    timeout: Duration,
}

impl AuthorityResolver {
    pub fn new(store: Arc<dyn AuthorityStore>, timeout: Duration) -> Self {
        Self { store, timeout }
    }

    /// Decide whether the actor may perform the named action.
    ///
    /// # Errors
    /// - [`AuthzError::AuthorityUnavailable`] when the authority store cannot
    ///   be reached or times out. Treat as "cannot determine access, deny".
    pub async fn check(&self, actor: &ActorProfile, name: &PermissionName) -> AuthzResult<bool> {
        // Systemadmin is an absolute override; it bypasses every other rule
        // and grants even names that do not exist in the catalog.
        if actor.is_system_admin {
            return Ok(true);
        }
        // The admin role is "all permissions" by definition; no store lookup.
        if actor.has_role(Role::Admin) {
            return Ok(true);
        }
        self.authority_check(&actor.user_id, name).await
    }

    /// True as soon as any name resolves true.
    ///
    /// Lookups run concurrently; the first grant wins and dropping the
    /// remaining futures cancels them best-effort. Per-item failures count as
    /// false for that item.
    pub async fn check_any(
        &self,
        actor: &ActorProfile,
        names: &[PermissionName],
    ) -> AuthzResult<bool> {
        if names.is_empty() {
            return Ok(false);
        }
        if actor.is_system_admin || actor.has_role(Role::Admin) {
            return Ok(true);
        }

        let mut pending: FuturesUnordered<_> = names
            .iter()
            .map(|name| self.checked_item(&actor.user_id, name))
            .collect();
        while let Some(granted) = pending.next().await {
            if granted {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// True only if every name resolves true.
    ///
    /// Every lookup runs, concurrently and independently; a failure for one
    /// name counts as false for that name without aborting the rest.
    pub async fn check_all(
        &self,
        actor: &ActorProfile,
        names: &[PermissionName],
    ) -> AuthzResult<bool> {
        if actor.is_system_admin || actor.has_role(Role::Admin) {
            return Ok(true);
        }

        let results = futures::future::join_all(
            names
                .iter()
                .map(|name| self.checked_item(&actor.user_id, name)),
        )
        .await;
        Ok(results.into_iter().all(|granted| granted))
    }

    /// The authoritative per-user lookup, with the store timeout applied.
    pub(crate) async fn authority_check(
        &self,
        user_id: &UserId,
        name: &PermissionName,
    ) -> AuthzResult<bool> {
        match tokio::time::timeout(self.timeout, self.store.user_has_permission(user_id, name))
            .await
        {
            Ok(Ok(granted)) => Ok(granted),
            // Unknown users and unknown names deny; they are lookup outcomes,
            // not infrastructure failures.
            Ok(Err(StoreError::NotFound(_))) => Ok(false),
            Ok(Err(err)) => Err(AuthzError::AuthorityUnavailable(err.to_string())),
            Err(_) => Err(AuthzError::AuthorityUnavailable(format!(
                "permission lookup timed out after {:?}",
                self.timeout
            ))),
        }
    }

    /// Fan-out item: failures become a deny for that item only.
    async fn checked_item(&self, user_id: &UserId, name: &PermissionName) -> bool {
        match self.authority_check(user_id, name).await {
            Ok(granted) => granted,
            Err(err) => {
                tracing::warn!(
                    user = %user_id,
                    permission = %name,
                    error = %err,
                    "lookup failed inside fan-out, denying this item"
                );
                false
            }
        }
    }
}
