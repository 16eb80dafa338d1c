use crate::{Role, RoleSet, UserId};
use serde::{Deserialize, Serialize};

/// Account lifecycle state carried on the actor profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountStatus {
    Active,
    Deactive,
}

/// The authenticated entity whose access is being evaluated.
///
/// Profiles are assembled by the surrounding session layer and handed to the
/// engine as input; the engine never loads or mutates them.
///
/// Precondition for check calls: deactivated reseller and consumer accounts
/// must be rejected by the session layer before a profile reaches the engine.
/// [`ActorProfile::is_deactivated_tenant`] is the gate the session layer
/// applies; the resolver itself does not re-check it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActorProfile {
    pub user_id: UserId,
    pub roles: RoleSet,
    pub is_system_admin: bool,
    pub account_status: AccountStatus,
}

impl ActorProfile {
    pub fn new(user_id: UserId, roles: RoleSet) -> Self {
        Self {
            user_id,
            roles,
            is_system_admin: false,
            account_status: AccountStatus::Active,
        }
    }

    pub fn with_system_admin(mut self, is_system_admin: bool) -> Self {
        self.is_system_admin = is_system_admin;
        self
    }

    pub fn with_status(mut self, status: AccountStatus) -> Self {
        self.account_status = status;
        self
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(role)
    }

    /// Whether the session layer must treat this actor as having zero
    /// permissions: a deactivated account holding the reseller or consumer
    /// role.
    pub fn is_deactivated_tenant(&self) -> bool {
        self.account_status == AccountStatus::Deactive
            && (self.roles.contains(Role::Reseller) || self.roles.contains(Role::Consumer))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_defaults() {
        let actor = ActorProfile::new(UserId::new("u-1"), RoleSet::from(Role::Viewer));
        assert!(!actor.is_system_admin);
        assert_eq!(actor.account_status, AccountStatus::Active);
        assert!(actor.has_role(Role::Viewer));
        assert!(!actor.has_role(Role::Admin));
    }

    #[test]
    fn deactivated_tenant_gate() {
        let reseller = ActorProfile::new(UserId::new("u-1"), RoleSet::from(Role::Reseller))
            .with_status(AccountStatus::Deactive);
        assert!(reseller.is_deactivated_tenant());

        let consumer = ActorProfile::new(UserId::new("u-2"), RoleSet::from(Role::Consumer))
            .with_status(AccountStatus::Deactive);
        assert!(consumer.is_deactivated_tenant());

        // Deactivation only locks out the tenant-facing roles.
        let support = ActorProfile::new(UserId::new("u-3"), RoleSet::from(Role::Support))
            .with_status(AccountStatus::Deactive);
        assert!(!support.is_deactivated_tenant());

        let active = ActorProfile::new(UserId::new("u-4"), RoleSet::from(Role::Reseller));
        assert!(!active.is_deactivated_tenant());
    }

    #[test]
    fn profile_deserializes_legacy_role_shapes() {
        let scalar: ActorProfile = serde_json::from_value(serde_json::json!({
            "user_id": "u-9",
            "roles": "reseller",
            "is_system_admin": false,
            "account_status": "active"
        }))
        .expect("scalar roles");
        let list: ActorProfile = serde_json::from_value(serde_json::json!({
            "user_id": "u-9",
            "roles": ["reseller"],
            "is_system_admin": false,
            "account_status": "active"
        }))
        .expect("list roles");
        assert_eq!(scalar, list);
    }
}
