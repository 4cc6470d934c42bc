//! Gatehouse Core — shared domain models, errors, and repository
//! traits.
//!
//! Holds everything the policy and storage layers agree on: the module
//! and action catalog, roles and permission sets, per-user overrides,
//! invitations, session records, and the async repository traits the
//! storage crate implements.

pub mod error;
pub mod models;
pub mod repository;

pub use error::{GatehouseError, GatehouseResult};
