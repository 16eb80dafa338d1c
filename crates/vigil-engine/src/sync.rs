//! Conditional role-permission fetch for clients that cache locally.
//!
//! Clients remember the version they last synced at and send it back; when it
//! still matches the role's current version the response carries no
//! permission list at all. Systemadmin actors always receive the full catalog
//! tagged with the sentinel version 0, which tells the client not to attempt
//! conditional caching for that actor.
use serde::{Deserialize, Serialize};

/// Sentinel version marking a response that must not be conditionally cached.
pub const NO_CONDITIONAL_CACHING: u64 = 0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoleSyncResponse {
    pub unchanged: bool,
    pub version: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub permissions: Option<Vec<String>>,
}

impl RoleSyncResponse {
    /// The client's copy is still current; keep it.
    pub fn unchanged(version: u64) -> Self {
        Self {
            unchanged: true,
            version,
            permissions: None,
        }
    }

    /// Fresh permission set the client should store along with the version.
    pub fn fresh(permissions: Vec<String>, version: u64) -> Self {
        Self {
            unchanged: false,
            version,
            permissions: Some(permissions),
        }
    }

    /// Full catalog for a systemadmin actor, with the sentinel version.
    pub fn catalog(permissions: Vec<String>) -> Self {
        Self {
            unchanged: false,
            version: NO_CONDITIONAL_CACHING,
            permissions: Some(permissions),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn response_shapes() {
        let unchanged = RoleSyncResponse::unchanged(4);
        assert!(unchanged.unchanged);
        assert_eq!(unchanged.version, 4);
        assert!(unchanged.permissions.is_none());

        let fresh = RoleSyncResponse::fresh(vec!["invoices.view".into()], 5);
        assert!(!fresh.unchanged);
        assert_eq!(fresh.permissions.as_deref().map(<[String]>::len), Some(1));

        let catalog = RoleSyncResponse::catalog(vec!["invoices.view".into()]);
        assert_eq!(catalog.version, NO_CONDITIONAL_CACHING);
        assert!(!catalog.unchanged);
    }

    #[test]
    fn unchanged_serializes_without_permissions_field() {
        let rendered = serde_json::to_string(&RoleSyncResponse::unchanged(3)).expect("json");
        assert!(!rendered.contains("permissions"));
    }
}
