//! Domain models for Gatehouse.
//!
//! These are the core types shared across all crates.

pub mod invitation;
pub mod module;
pub mod overrides;
pub mod role;
pub mod session;
pub mod user;
