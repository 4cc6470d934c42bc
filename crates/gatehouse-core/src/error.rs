//! Error types for the Gatehouse system.
//!
//! Policy failures (`Unauthenticated`, `InsufficientPermissions`,
//! `IdleTimeout`, and the invitation errors) are terminal for the
//! triggering request; callers re-authenticate or re-request an
//! invitation rather than retry. Store failures surface as
//! [`GatehouseError::Database`] so clients never conflate "access
//! denied" with "system unavailable".

use thiserror::Error;

#[derive(Debug, Error)]
pub enum GatehouseError {
    #[error("no authenticated subject")]
    Unauthenticated,

    #[error("insufficient permissions: {reason}")]
    InsufficientPermissions { reason: String },

    #[error("session terminated after idle timeout")]
    IdleTimeout,

    #[error("invitation token not found")]
    TokenNotFound,

    #[error("invitation token has expired")]
    TokenExpired,

    #[error("invitation has already been accepted")]
    AlreadyAccepted,

    #[error("entity not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("entity already exists: {entity}")]
    AlreadyExists { entity: String },

    #[error("validation error: {message}")]
    Validation { message: String },

    #[error("database error: {0}")]
    Database(String),

    #[error("cryptography error: {0}")]
    Crypto(String),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type GatehouseResult<T> = Result<T, GatehouseError>;
