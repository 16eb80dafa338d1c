// Strongly typed identifiers to avoid mixing namespaces at compile time.
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque permission identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PermissionId(Uuid);

impl PermissionId {
    /// Generate a new random identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap an existing UUID when decoding from storage.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for PermissionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for PermissionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// User identifier wrapper.
///
/// The engine treats user identifiers as opaque strings supplied by the
/// surrounding session layer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserId(String);

impl UserId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::{PermissionId, UserId};

    #[test]
    fn permission_ids_are_unique() {
        assert_ne!(PermissionId::new(), PermissionId::new());
    }

    #[test]
    fn user_id_display_passthrough() {
        let user = UserId::new("u-42");
        assert_eq!(user.as_str(), "u-42");
        assert_eq!(user.to_string(), "u-42");
    }
}
