//! Permission naming primitives.
//!
//! # Purpose
//! Defines the parseable dotted permission name and the immutable catalog
//! record describing a permission.
//!
//! # How it fits
//! Check calls and cache keys are expressed in terms of [`PermissionName`];
//! catalog and listing reads return [`Permission`] records.
//!
//! # Key invariants
//! - Permission names are `resource.action`, both segments non-empty.
//! - A [`Permission`]'s `resource` and `action` fields always agree with its
//!   `name`.
use crate::{AuthzError, AuthzResult, PermissionId};
use serde::{Deserialize, Serialize};

/// Dotted permission name in `resource.action` form, e.g. `invoices.delete`.
///
/// # Invariants
/// - Contains exactly one separating dot; the action segment may itself be
///   dotted (`reports.export.csv` reads as resource `reports`, action
///   `export.csv`).
///
/// # Example
/// ```rust
/// use vigil_authz::PermissionName;
///
/// let name = PermissionName::parse("invoices.delete").expect("parse");
/// assert_eq!(name.resource(), "invoices");
/// assert_eq!(name.action(), "delete");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PermissionName(String);

impl PermissionName {
    /// Parse a permission name from a string.
    ///
    /// # Errors
    /// - [`AuthzError::InvalidPermission`] if the dot separator is missing or
    ///   either segment is empty.
    pub fn parse(value: impl Into<String>) -> AuthzResult<Self> {
        let value = value.into();
        match value.split_once('.') {
            Some((resource, action)) if !resource.is_empty() && !action.is_empty() => {
                Ok(Self(value))
            }
            _ => Err(AuthzError::InvalidPermission(value)),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The resource segment, everything before the first dot.
    pub fn resource(&self) -> &str {
        self.0.split_once('.').map(|(resource, _)| resource).unwrap_or(&self.0)
    }

    /// The action segment, everything after the first dot.
    pub fn action(&self) -> &str {
        self.0.split_once('.').map(|(_, action)| action).unwrap_or("")
    }
}

impl std::fmt::Display for PermissionName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for PermissionName {
    type Err = AuthzError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::parse(value)
    }
}

impl TryFrom<String> for PermissionName {
    type Error = AuthzError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<PermissionName> for String {
    fn from(name: PermissionName) -> Self {
        name.0
    }
}

/// Immutable catalog record for a permission.
///
/// Created and deleted by administrative tooling outside the engine; the
/// engine only ever reads these.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permission {
    pub id: PermissionId,
    pub name: PermissionName,
    pub resource: String,
    pub action: String,
    pub description: String,
}

impl Permission {
    /// Build a record from a name, deriving the resource and action fields.
    pub fn new(id: PermissionId, name: PermissionName, description: impl Into<String>) -> Self {
        let resource = name.resource().to_string();
        let action = name.action().to_string();
        Self {
            id,
            name,
            resource,
            action,
            description: description.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn permission_name_parse_roundtrip() {
        let name = PermissionName::parse("invoices.delete").expect("parse");
        assert_eq!(name.as_str(), "invoices.delete");
        assert_eq!(name.resource(), "invoices");
        assert_eq!(name.action(), "delete");
        assert_eq!(name.to_string(), "invoices.delete");
    }

    #[test]
    fn permission_name_nested_action() {
        let name = PermissionName::parse("reports.export.csv").expect("parse");
        assert_eq!(name.resource(), "reports");
        assert_eq!(name.action(), "export.csv");
    }

    #[test]
    fn permission_name_rejects_malformed() {
        for bad in ["invoices", ".delete", "invoices.", "", "."] {
            let err = PermissionName::parse(bad).expect_err("malformed");
            assert!(matches!(err, AuthzError::InvalidPermission(_)));
        }
    }

    #[test]
    fn permission_name_serde_validates() {
        let name: PermissionName = serde_json::from_str("\"products.view\"").expect("valid");
        assert_eq!(name.action(), "view");
        assert!(serde_json::from_str::<PermissionName>("\"products\"").is_err());
    }

    #[test]
    fn permission_record_derives_segments() {
        let name = PermissionName::parse("invoices.view").expect("parse");
        let permission = Permission::new(PermissionId::new(), name, "Read invoices");
        assert_eq!(permission.resource, "invoices");
        assert_eq!(permission.action, "view");
    }
}
