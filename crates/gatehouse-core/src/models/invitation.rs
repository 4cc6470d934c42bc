//! Invitation domain model.
//!
//! An invitation binds an email address to a proposed role set for a
//! limited time. The raw token is returned once at issue time; only
//! its SHA-256 hash is persisted. Accepted invitations are kept (with
//! `accepted = true`) until the reaper deletes them after expiry.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Invitation {
    pub id: Uuid,
    /// Normalized lowercase.
    pub email: String,
    /// SHA-256 hex hash of the opaque bearer token.
    pub token_hash: String,
    /// Roles bound to the subject on acceptance.
    pub role_ids: Vec<Uuid>,
    /// The administrator who issued the invitation.
    pub invited_by: Uuid,
    pub accepted: bool,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateInvitation {
    pub email: String,
    pub token_hash: String,
    pub role_ids: Vec<Uuid>,
    pub invited_by: Uuid,
    pub expires_at: DateTime<Utc>,
}
