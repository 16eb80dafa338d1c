//! Engine facade wiring the collaborators together.
//!
//! # Purpose
//! Owns the shared handles (authority store, cache coordinator, version
//! ledger, resolver, bulk checker, event channel) and exposes the public
//! surface: single and bulk checks, cached catalog reads, the conditional
//! role-permission sync, the invalidation triggers, and the mutation facades
//! that pair an authoritative write with the coherence protocol in the
//! required order.
//!
//! # Notes
//! Mutation facades exist so no call site can commit a grant change and
//! forget its invalidation: commit first, then invalidate, then bump the
//! version, then emit the activity event.
use crate::bulk::BulkPermissionChecker;
use crate::cache::{keys, CacheCoordinator, CacheStore, InvalidationScope};
use crate::config::EngineConfig;
use crate::events::{activity_channel, ActivityEvent, ActivityFeed, ActivitySender};
use crate::ledger::VersionLedger;
use crate::resolver::AuthorityResolver;
use crate::store::{AuthorityStore, StoreResult, UserGrant};
use crate::sync::RoleSyncResponse;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use vigil_authz::{
    ActorProfile, AuthzError, AuthzResult, Permission, PermissionId, PermissionName, Role, UserId,
};

pub struct AuthorizationEngine {
    store: Arc<dyn AuthorityStore>,
    cache: CacheCoordinator,
    ledger: VersionLedger,
    resolver: AuthorityResolver,
    bulk: BulkPermissionChecker,
    config: EngineConfig,
    events: ActivitySender,
}

impl AuthorizationEngine {
    /// Wire an engine over the given stores. The returned feed carries the
    /// fire-and-forget activity events; hand it to
    /// [`crate::events::spawn_activity_logger`] or drop it to discard them.
    pub fn new(
        store: Arc<dyn AuthorityStore>,
        cache_store: Arc<dyn CacheStore>,
        config: EngineConfig,
    ) -> (Self, ActivityFeed) {
        let cache = CacheCoordinator::new(cache_store.clone(), config.cache_timeout);
        let ledger = VersionLedger::new(cache_store, config.version_ttl, config.cache_timeout);
        let resolver = AuthorityResolver::new(store.clone(), config.authority_timeout);
        let bulk = BulkPermissionChecker::new(resolver.clone(), config.max_batch);
        let (events, feed) = activity_channel();
        (
            Self {
                store,
                cache,
                ledger,
                resolver,
                bulk,
                config,
                events,
            },
            feed,
        )
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Cached single check: may the actor perform the named action?
    ///
    /// Shortcut actors (systemadmin, admin role) are answered without
    /// touching the cache; their answer is constant and caching it would only
    /// add an invalidation obligation. For everyone else the per-user
    /// decision map is consulted first, and misses are resolved against the
    /// authority store and merged back in.
    pub async fn check(&self, actor: &ActorProfile, name: &PermissionName) -> AuthzResult<bool> {
        if actor.is_system_admin || actor.has_role(Role::Admin) {
            return self.resolver.check(actor, name).await;
        }

        let key = keys::user_key(&actor.user_id);
        let mut decisions: HashMap<String, bool> = match self.cache.get(&key).await {
            Some(value) => serde_json::from_value(value).unwrap_or_default(),
            None => HashMap::new(),
        };
        if let Some(granted) = decisions.get(name.as_str()) {
            return Ok(*granted);
        }

        let granted = self.resolver.check(actor, name).await?;
        decisions.insert(name.as_str().to_string(), granted);
        match serde_json::to_value(&decisions) {
            Ok(value) => self.cache.put(&key, value, self.config.permission_ttl).await,
            Err(err) => tracing::warn!(key, error = %err, "decision map encode failed"),
        }
        Ok(granted)
    }

    /// True as soon as any of the names resolves true.
    pub async fn check_any(
        &self,
        actor: &ActorProfile,
        names: &[PermissionName],
    ) -> AuthzResult<bool> {
        self.resolver.check_any(actor, names).await
    }

    /// True only if every name resolves true.
    pub async fn check_all(
        &self,
        actor: &ActorProfile,
        names: &[PermissionName],
    ) -> AuthzResult<bool> {
        self.resolver.check_all(actor, names).await
    }

    /// Bounded per-name evaluation; see [`BulkPermissionChecker::check_bulk`].
    pub async fn check_bulk(
        &self,
        actor: &ActorProfile,
        names: &[PermissionName],
    ) -> AuthzResult<HashMap<PermissionName, bool>> {
        self.bulk.check_bulk(actor, names).await
    }

    /// Full permission records granted to a role, read-through cached.
    pub async fn role_permissions(&self, role: Role) -> AuthzResult<Vec<Permission>> {
        let store = self.store.clone();
        let timeout = self.config.authority_timeout;
        self.cache
            .get_or_compute(
                &keys::role_key(role),
                self.config.permission_ttl,
                || async move { authority_call(timeout, store.role_permissions(role)).await },
            )
            .await
    }

    /// Just the permission names for a role, the shape sync clients store.
    pub async fn role_permission_names(&self, role: Role) -> AuthzResult<Vec<String>> {
        let store = self.store.clone();
        let timeout = self.config.authority_timeout;
        self.cache
            .get_or_compute(
                &keys::role_simplified_key(role),
                self.config.permission_ttl,
                || async move {
                    let permissions = authority_call(timeout, store.role_permissions(role)).await?;
                    Ok(permissions
                        .into_iter()
                        .map(|permission| permission.name.as_str().to_string())
                        .collect())
                },
            )
            .await
    }

    /// The unfiltered permission catalog, read-through cached.
    ///
    /// Catalog reads return what the store actually holds; the admin-role
    /// shortcut does not apply here, only to checks.
    pub async fn permission_catalog(&self) -> AuthzResult<Vec<Permission>> {
        let store = self.store.clone();
        let timeout = self.config.authority_timeout;
        self.cache
            .get_or_compute(&keys::catalog_key(), self.config.listing_ttl, || async move {
                authority_call(timeout, store.permission_catalog()).await
            })
            .await
    }

    /// One page of the catalog filtered by resource and action; `*` leaves a
    /// dimension unfiltered. Pages are 1-based.
    pub async fn list_permissions(
        &self,
        resource: &str,
        action: &str,
        page: u32,
        limit: u32,
    ) -> AuthzResult<Vec<Permission>> {
        if page == 0 || limit == 0 {
            return Err(AuthzError::InvalidArgument(
                "page and limit must be at least 1".into(),
            ));
        }

        let store = self.store.clone();
        let timeout = self.config.authority_timeout;
        let (resource_filter, action_filter) = (resource.to_string(), action.to_string());
        self.cache
            .get_or_compute(
                &keys::listing_key(resource, action, page, limit),
                self.config.listing_ttl,
                || async move {
                    let catalog = authority_call(timeout, store.permission_catalog()).await?;
                    let offset = (page as usize - 1) * limit as usize;
                    Ok(catalog
                        .into_iter()
                        .filter(|permission| {
                            (resource_filter == "*" || permission.resource == resource_filter)
                                && (action_filter == "*" || permission.action == action_filter)
                        })
                        .skip(offset)
                        .take(limit as usize)
                        .collect())
                },
            )
            .await
    }

    /// Current version counter for a role, for clients polling staleness.
    pub async fn role_version(&self, role: Role) -> u64 {
        self.ledger.current_version(role).await
    }

    /// Conditional role-permission fetch for clients that cache locally.
    pub async fn sync_role_permissions(
        &self,
        actor: &ActorProfile,
        role: Role,
        client_version: u64,
    ) -> AuthzResult<RoleSyncResponse> {
        if actor.is_system_admin {
            let names = self
                .permission_catalog()
                .await?
                .into_iter()
                .map(|permission| permission.name.as_str().to_string())
                .collect();
            return Ok(RoleSyncResponse::catalog(names));
        }

        let current = self.ledger.current_version(role).await;
        if client_version > 0 && client_version == current {
            return Ok(RoleSyncResponse::unchanged(current));
        }
        let names = self.role_permission_names(role).await?;
        Ok(RoleSyncResponse::fresh(names, current))
    }

    /// Invalidation trigger for a committed role-grant mutation.
    ///
    /// Order is load-bearing: the caches go first, the version bump second,
    /// so a client that reacts to the new version cannot be served a
    /// not-yet-invalidated entry. Returns the new version.
    pub async fn role_permissions_changed(&self, role: Role) -> AuthzResult<u64> {
        self.cache
            .invalidate(InvalidationScope::role(role).with_clear_all())
            .await;
        let version = self.ledger.bump(role).await?;
        self.events
            .emit(ActivityEvent::RolePermissionsChanged { role, version });
        Ok(version)
    }

    /// Invalidation trigger for a committed user-grant mutation.
    ///
    /// Listing caches embed permission-derived fields, so they go too. No
    /// version moves: versions track role sets only.
    pub async fn user_permissions_changed(&self, user_id: &UserId) {
        self.cache
            .invalidate(InvalidationScope::user(user_id.clone()).with_clear_all())
            .await;
        self.events.emit(ActivityEvent::UserPermissionsChanged {
            user_id: user_id.clone(),
        });
    }

    /// Invalidation trigger for a flipped systemadmin flag.
    ///
    /// The narrowest correct scope is exactly one user key: systemadmin is
    /// orthogonal to role permission sets, so neither versions nor catalog
    /// caches are touched.
    pub async fn system_admin_flag_changed(&self, user_id: &UserId) {
        self.cache
            .invalidate(InvalidationScope::user(user_id.clone()))
            .await;
        self.events.emit(ActivityEvent::SystemAdminFlagChanged {
            user_id: user_id.clone(),
        });
    }

    /// Commit a role grant and run the coherence protocol. Returns the new
    /// role version.
    pub async fn grant_role_permission(
        &self,
        role: Role,
        permission_id: PermissionId,
    ) -> AuthzResult<u64> {
        authority_call(
            self.config.authority_timeout,
            self.store.grant_role_permission(role, permission_id),
        )
        .await?;
        self.role_permissions_changed(role).await
    }

    /// Remove a role grant and run the coherence protocol. Returns the new
    /// role version.
    pub async fn revoke_role_permission(
        &self,
        role: Role,
        permission_id: PermissionId,
    ) -> AuthzResult<u64> {
        authority_call(
            self.config.authority_timeout,
            self.store.revoke_role_permission(role, permission_id),
        )
        .await?;
        self.role_permissions_changed(role).await
    }

    /// Replace a user's grant rows wholesale and invalidate that user.
    pub async fn replace_user_permissions(
        &self,
        user_id: &UserId,
        grants: Vec<UserGrant>,
    ) -> AuthzResult<()> {
        authority_call(
            self.config.authority_timeout,
            self.store.replace_user_permissions(user_id, grants),
        )
        .await?;
        self.user_permissions_changed(user_id).await;
        Ok(())
    }

    /// Probe the authority store.
    pub async fn health_check(&self) -> AuthzResult<()> {
        authority_call(self.config.authority_timeout, self.store.health_check()).await
    }
}

/// Apply the authority timeout and map store failures into the public
/// taxonomy. Timeouts read as "authority unavailable": there is no deeper
/// fallback once the ground truth cannot be reached.
async fn authority_call<T>(
    timeout: Duration,
    call: impl Future<Output = StoreResult<T>>,
) -> AuthzResult<T> {
    match tokio::time::timeout(timeout, call).await {
        Ok(result) => result.map_err(AuthzError::from),
        Err(_) => Err(AuthzError::AuthorityUnavailable(format!(
            "authority store timed out after {timeout:?}"
        ))),
    }
}
