//! Vigil authorization primitives shared by the engine and embedding services.
//!
//! # Purpose
//! Centralizes the authorization data model (roles, permission names, actor
//! profiles), the error taxonomy, and the glob matcher used for cache-key
//! pattern deletion.
//!
//! # How it fits
//! Embedding services build [`ActorProfile`] values from their own session
//! layer and hand them to the engine crate, which resolves permission checks
//! against an authority store and a coherence-managed cache.
//!
//! # Key invariants
//! - Permission names follow the dotted `resource.action` pattern.
//! - Roles are a closed enumeration; unknown role names are rejected at the
//!   boundary rather than carried around as strings.
//!
//! # Common pitfalls
//! - Building a [`RoleSet`] by hand instead of deserializing through it loses
//!   the string-or-list normalization that legacy callers rely on.

mod actor;
mod errors;
mod ids;
mod matcher;
mod permission;
mod role;

pub use actor::{AccountStatus, ActorProfile};
pub use errors::{AuthzError, AuthzResult, ErrorCode};
pub use ids::{PermissionId, UserId};
pub use matcher::wildcard_match;
pub use permission::{Permission, PermissionName};
pub use role::{Role, RoleSet};
