//! Authorization engine library crate.
//!
//! # Purpose
//! Resolves whether an actor may perform a named action by combining three
//! independent authority sources (systemadmin override, role grants, per-user
//! overrides) and layers a coherence-managed cache on top. The cache is a pure
//! accelerator: on any cache failure the engine falls through to the authority
//! store, degrading to slow-but-correct rather than fast-but-wrong.
//!
//! # Notes
//! Module boundaries mirror the engine's collaborators: the authority store
//! (ground truth), the cache store (accelerator), the version ledger
//! (staleness signals), and the resolution/bulk/sync surfaces built on them.
pub mod bulk;
pub mod cache;
pub mod config;
pub mod engine;
pub mod events;
pub mod ledger;
pub mod observability;
pub mod resolver;
pub mod store;
pub mod sync;
pub mod test_support;
