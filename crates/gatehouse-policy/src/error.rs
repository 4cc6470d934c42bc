//! Policy error types.

use gatehouse_core::error::GatehouseError;
use thiserror::Error;

use gatehouse_core::models::module::{Action, ModuleKey};

#[derive(Debug, Error)]
pub enum PolicyError {
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

    #[error("password must be at least {min} characters")]
    PasswordTooShort { min: usize },
}

impl PolicyError {
    pub(crate) fn denied_action(module: ModuleKey, action: Action) -> Self {
        PolicyError::InsufficientPermissions {
            reason: format!("{module}.{action} is not granted"),
        }
    }

    pub(crate) fn denied_role(role_name: &str) -> Self {
        PolicyError::InsufficientPermissions {
            reason: format!("role '{role_name}' is required"),
        }
    }

    /// HTTP status class the host transport should map this failure
    /// to. `Unauthenticated` and `IdleTimeout` are 401-class (the
    /// latter distinguished by its reason so the caller can tell
    /// "never logged in" from "logged out due to inactivity");
    /// `InsufficientPermissions` is 403-class.
    pub fn status_hint(&self) -> u16 {
        match self {
            PolicyError::Unauthenticated | PolicyError::IdleTimeout => 401,
            PolicyError::InsufficientPermissions { .. } => 403,
            PolicyError::TokenNotFound => 404,
            PolicyError::AlreadyAccepted => 409,
            PolicyError::TokenExpired => 410,
            PolicyError::PasswordTooShort { .. } => 422,
        }
    }
}

impl From<PolicyError> for GatehouseError {
    fn from(err: PolicyError) -> Self {
        match err {
            PolicyError::Unauthenticated => GatehouseError::Unauthenticated,
            PolicyError::InsufficientPermissions { reason } => {
                GatehouseError::InsufficientPermissions { reason }
            }
            PolicyError::IdleTimeout => GatehouseError::IdleTimeout,
            PolicyError::TokenNotFound => GatehouseError::TokenNotFound,
            PolicyError::TokenExpired => GatehouseError::TokenExpired,
            PolicyError::AlreadyAccepted => GatehouseError::AlreadyAccepted,
            PolicyError::PasswordTooShort { min } => GatehouseError::Validation {
                message: format!("password must be at least {min} characters"),
            },
        }
    }
}
