//! Structured cache-key builders.
//!
//! Keys share the `permissions:` namespace and encode their scope in the
//! segment layout so invalidation can use exact deletes for known scopes and
//! a single glob for the listing family:
//!
//! - `permissions:role:<role>` — full permission records for a role
//! - `permissions:role:<role>:simplified` — just the names, for sync clients
//! - `permissions:user:<user>` — a user's resolved decision map
//! - `permissions:version:<role>` — the role's version counter
//! - `permissions:all` — the unfiltered catalog
//! - `permissions:<resource>:<action>:<page>:<limit>` — listing variants
//!
//! The listing family is the only four-colon layout, which is what keeps the
//! `permissions:*:*:*:*` glob from sweeping up scoped keys.
use vigil_authz::{Role, UserId};

pub fn role_key(role: Role) -> String {
    format!("permissions:role:{role}")
}

pub fn role_simplified_key(role: Role) -> String {
    format!("permissions:role:{role}:simplified")
}

pub fn user_key(user_id: &UserId) -> String {
    format!("permissions:user:{user_id}")
}

pub fn version_key(role: Role) -> String {
    format!("permissions:version:{role}")
}

pub fn catalog_key() -> String {
    "permissions:all".to_string()
}

pub fn listing_key(resource: &str, action: &str, page: u32, limit: u32) -> String {
    format!("permissions:{resource}:{action}:{page}:{limit}")
}

/// Glob covering every paginated listing variant.
pub fn listing_pattern() -> &'static str {
    "permissions:*:*:*:*"
}

/// Glob covering every user decision map.
pub fn user_pattern() -> &'static str {
    "permissions:user:*"
}

/// Glob covering the listing variants of a single resource.
pub fn resource_pattern(resource: &str) -> String {
    format!("permissions:{resource}:*:*:*")
}

#[cfg(test)]
mod tests {
    use super::*;
    use vigil_authz::wildcard_match;

    #[test]
    fn key_layouts() {
        assert_eq!(role_key(Role::Reseller), "permissions:role:reseller");
        assert_eq!(
            role_simplified_key(Role::Reseller),
            "permissions:role:reseller:simplified"
        );
        assert_eq!(user_key(&UserId::new("42")), "permissions:user:42");
        assert_eq!(version_key(Role::Support), "permissions:version:support");
        assert_eq!(
            listing_key("invoices", "view", 1, 25),
            "permissions:invoices:view:1:25"
        );
    }

    #[test]
    fn listing_glob_covers_only_the_listing_family() {
        assert!(wildcard_match(listing_pattern(), &listing_key("invoices", "view", 1, 25)));
        assert!(wildcard_match(
            &resource_pattern("invoices"),
            &listing_key("invoices", "delete", 2, 50)
        ));
        assert!(!wildcard_match(
            &resource_pattern("invoices"),
            &listing_key("products", "view", 1, 25)
        ));
        for scoped in [
            role_key(Role::Admin),
            role_simplified_key(Role::Admin),
            user_key(&UserId::new("42")),
            version_key(Role::Admin),
            catalog_key(),
        ] {
            assert!(!wildcard_match(listing_pattern(), &scoped), "{scoped}");
        }
    }
}
