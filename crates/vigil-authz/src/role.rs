use crate::{AuthzError, AuthzResult};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeSet;

/// Closed role enumeration.
///
/// Roles are reference data, not rows with a lifecycle; they are referenced by
/// name everywhere and never created or deleted at runtime.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Reseller,
    Consumer,
    Viewer,
    Support,
}

impl Role {
    pub const ALL: [Role; 5] = [
        Role::Admin,
        Role::Reseller,
        Role::Consumer,
        Role::Viewer,
        Role::Support,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Reseller => "reseller",
            Role::Consumer => "consumer",
            Role::Viewer => "viewer",
            Role::Support => "support",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = ();

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "admin" => Ok(Role::Admin),
            "reseller" => Ok(Role::Reseller),
            "consumer" => Ok(Role::Consumer),
            "viewer" => Ok(Role::Viewer),
            "support" => Ok(Role::Support),
            _ => Err(()),
        }
    }
}

/// Normalized set of roles attached to an actor.
///
/// Legacy callers hand over either a single role string or a list of role
/// strings; both deserialize into the same set here so nothing downstream
/// ever branches on the representation. Unknown role names are rejected at
/// this boundary.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RoleSet(BTreeSet<Role>);

impl RoleSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a set from raw role names, rejecting unknown names.
    pub fn from_names<I, S>(names: I) -> AuthzResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut roles = BTreeSet::new();
        for name in names {
            let name = name.as_ref();
            let role = name
                .parse::<Role>()
                .map_err(|_| AuthzError::InvalidRole(name.to_string()))?;
            roles.insert(role);
        }
        Ok(Self(roles))
    }

    pub fn insert(&mut self, role: Role) {
        self.0.insert(role);
    }

    pub fn contains(&self, role: Role) -> bool {
        self.0.contains(&role)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = Role> + '_ {
        self.0.iter().copied()
    }
}

impl From<Role> for RoleSet {
    fn from(role: Role) -> Self {
        let mut set = BTreeSet::new();
        set.insert(role);
        Self(set)
    }
}

impl FromIterator<Role> for RoleSet {
    fn from_iter<I: IntoIterator<Item = Role>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'de> Deserialize<'de> for RoleSet {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        // Accept both the scalar and the list shape used by older callers.
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            One(Role),
            Many(Vec<Role>),
        }

        match Repr::deserialize(deserializer)? {
            Repr::One(role) => Ok(RoleSet::from(role)),
            Repr::Many(roles) => Ok(roles.into_iter().collect()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Role, RoleSet};

    #[test]
    fn role_string_roundtrip() {
        for role in Role::ALL {
            let as_str = role.as_str();
            assert_eq!(as_str.parse::<Role>().ok(), Some(role));
            assert_eq!(role.to_string(), as_str);
        }
    }

    #[test]
    fn role_from_str_invalid() {
        assert!("owner".parse::<Role>().is_err());
        assert!("Admin".parse::<Role>().is_err());
    }

    #[test]
    fn role_set_scalar_and_list_deserialize_alike() {
        let scalar: RoleSet = serde_json::from_str("\"admin\"").expect("scalar");
        let list: RoleSet = serde_json::from_str("[\"admin\"]").expect("list");
        assert_eq!(scalar, list);
        assert!(scalar.contains(Role::Admin));
    }

    #[test]
    fn role_set_deduplicates() {
        let set: RoleSet =
            serde_json::from_str("[\"viewer\", \"viewer\", \"support\"]").expect("list");
        assert_eq!(set.len(), 2);
        assert!(set.contains(Role::Viewer));
        assert!(set.contains(Role::Support));
    }

    #[test]
    fn role_set_rejects_unknown_names() {
        let err = RoleSet::from_names(["reseller", "owner"]).expect_err("unknown role");
        assert!(err.to_string().contains("owner"));
        assert!(serde_json::from_str::<RoleSet>("[\"owner\"]").is_err());
    }
}
