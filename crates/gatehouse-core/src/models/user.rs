//! User (subject) domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::overrides::OverrideSet;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum AccountStatus {
    /// Invited but not yet accepted.
    Pending,
    Active,
    /// Soft-deleted. Inactive accounts never authenticate.
    Inactive,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    /// Normalized lowercase, unique.
    pub email: String,
    pub display_name: String,
    /// Argon2id PHC-format hash.
    pub password_hash: String,
    pub status: AccountStatus,
    /// Explicit per-user allow/deny exceptions. Takes precedence over
    /// role-derived grants, never over full-access roles.
    pub overrides: OverrideSet,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUser {
    pub email: String,
    pub display_name: String,
    /// Raw password; hashed with Argon2id before storage.
    pub password: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateUser {
    pub display_name: Option<String>,
    pub status: Option<AccountStatus>,
    pub overrides: Option<OverrideSet>,
    /// Raw replacement password; rehashed before storage.
    pub password: Option<String>,
}
