//! Bounded bulk permission evaluation.
//!
//! Evaluates a batch of permission names for one actor in a single call, with
//! the batch size capped up front. Middleware uses this to answer "which of
//! these N buttons may I render" without N round trips.
use crate::resolver::AuthorityResolver;
use std::collections::HashMap;
use vigil_authz::{ActorProfile, AuthzError, AuthzResult, PermissionName};

#[derive(Clone)]
pub struct BulkPermissionChecker {
    resolver: AuthorityResolver,
    max_batch: usize,
}

impl BulkPermissionChecker {
    pub fn new(resolver: AuthorityResolver, max_batch: usize) -> Self {
        Self {
            resolver,
            max_batch,
        }
    }

    /// Evaluate every name independently and return the per-name outcomes.
    ///
    /// # Errors
    /// - [`AuthzError::BatchTooLarge`] when the batch exceeds the cap; the
    ///   batch is rejected outright rather than truncated, and no lookups
    ///   run.
    ///
    /// A lookup failure for one name records `false` for that name only; the
    /// batch itself never fails once the size guard has passed.
    pub async fn check_bulk(
        &self,
        actor: &ActorProfile,
        names: &[PermissionName],
    ) -> AuthzResult<HashMap<PermissionName, bool>> {
        if names.len() > self.max_batch {
            return Err(AuthzError::BatchTooLarge {
                len: names.len(),
                max: self.max_batch,
            });
        }

        // Pure fast path: systemadmin grants every name without any lookup.
        if actor.is_system_admin {
            return Ok(names
                .iter()
                .map(|name| (name.clone(), true))
                .collect());
        }

        let outcomes = futures::future::join_all(names.iter().map(|name| async move {
            let granted = match self.resolver.check(actor, name).await {
                Ok(granted) => granted,
                Err(err) => {
                    tracing::warn!(
                        user = %actor.user_id,
                        permission = %name,
                        error = %err,
                        "bulk item lookup failed, recording deny"
                    );
                    false
                }
            };
            (name.clone(), granted)
        }))
        .await;
        Ok(outcomes.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{seeded_fixture, CountingAuthorityStore};
    use std::sync::Arc;
    use std::time::Duration;
    use vigil_authz::{RoleSet, UserId};

    fn names(values: &[&str]) -> Vec<PermissionName> {
        values
            .iter()
            .map(|value| PermissionName::parse(*value).expect("name"))
            .collect()
    }

    #[tokio::test]
    async fn oversized_batch_is_rejected_before_any_lookup() {
        let fixture = seeded_fixture().await;
        let counting = Arc::new(CountingAuthorityStore::new(fixture.store.clone()));
        let checker = BulkPermissionChecker::new(
            AuthorityResolver::new(counting.clone(), Duration::from_secs(1)),
            50,
        );
        let actor = fixture.reseller_actor();

        let batch: Vec<PermissionName> = (0..51)
            .map(|i| PermissionName::parse(format!("invoices.action{i}")).expect("name"))
            .collect();
        let err = checker
            .check_bulk(&actor, &batch)
            .await
            .expect_err("too large");
        assert!(matches!(err, AuthzError::BatchTooLarge { len: 51, max: 50 }));
        assert_eq!(counting.lookups(), 0);
    }

    #[tokio::test]
    async fn systemadmin_fast_path_maps_all_true() {
        let fixture = seeded_fixture().await;
        let counting = Arc::new(CountingAuthorityStore::new(fixture.store.clone()));
        let checker = BulkPermissionChecker::new(
            AuthorityResolver::new(counting.clone(), Duration::from_secs(1)),
            50,
        );
        let actor =
            ActorProfile::new(UserId::new("root"), RoleSet::new()).with_system_admin(true);

        let batch = names(&["invoices.view", "no.such"]);
        let outcomes = checker.check_bulk(&actor, &batch).await.expect("bulk");
        assert!(outcomes.values().all(|granted| *granted));
        assert_eq!(outcomes.len(), 2);
        assert_eq!(counting.lookups(), 0);
    }

    #[tokio::test]
    async fn per_name_outcomes_for_a_plain_actor() {
        let fixture = seeded_fixture().await;
        let checker = BulkPermissionChecker::new(
            AuthorityResolver::new(fixture.store.clone(), Duration::from_secs(1)),
            50,
        );
        let actor = fixture.reseller_actor();

        let batch = names(&["invoices.view", "invoices.delete", "products.view"]);
        let outcomes = checker.check_bulk(&actor, &batch).await.expect("bulk");
        assert_eq!(outcomes.len(), 3);
        assert!(outcomes[&batch[0]]);
        assert!(!outcomes[&batch[1]]);
        assert!(!outcomes[&batch[2]]);
    }
}
