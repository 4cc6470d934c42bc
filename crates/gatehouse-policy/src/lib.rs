//! Gatehouse Policy — authorization resolution, session idle
//! enforcement, and invitation lifecycle.
//!
//! Generic over the `gatehouse-core` repository traits so that the
//! policy layer has no dependency on the database crate. Every
//! privileged request passes the [`SessionGate`] first, then the
//! resolver ([`authorize`] / [`authorize_role`]).

pub mod config;
pub mod error;
pub mod invitation;
pub mod resolver;
pub mod session;
pub mod token;

pub use config::PolicyConfig;
pub use error::PolicyError;
pub use invitation::{InvitationService, NewAccount};
pub use resolver::{Subject, Verdict, authorize, authorize_role, can, check, has_role};
pub use session::SessionGate;
