//! Repository trait definitions for data access abstraction.
//!
//! All repository operations are async. Role and override data are
//! read-mostly; implementations may cache within a single request
//! lifetime but must re-fetch across requests.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::GatehouseResult;
use crate::models::{
    invitation::{CreateInvitation, Invitation},
    role::{CreateRole, Role, UpdateRole},
    session::SessionRecord,
    user::{CreateUser, UpdateUser, User},
};

/// Pagination parameters for list queries.
#[derive(Debug, Clone)]
pub struct Pagination {
    pub offset: u64,
    pub limit: u64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: 50,
        }
    }
}

/// A paginated result set.
#[derive(Debug, Clone)]
pub struct PaginatedResult<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub offset: u64,
    pub limit: u64,
}

pub trait UserRepository: Send + Sync {
    fn create(&self, input: CreateUser) -> impl Future<Output = GatehouseResult<User>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = GatehouseResult<User>> + Send;
    fn get_by_email(&self, email: &str) -> impl Future<Output = GatehouseResult<User>> + Send;
    fn update(
        &self,
        id: Uuid,
        input: UpdateUser,
    ) -> impl Future<Output = GatehouseResult<User>> + Send;
    /// Soft-delete: sets status to Inactive.
    fn delete(&self, id: Uuid) -> impl Future<Output = GatehouseResult<()>> + Send;
    fn list(
        &self,
        pagination: Pagination,
    ) -> impl Future<Output = GatehouseResult<PaginatedResult<User>>> + Send;

    /// Assign a role to a user. Idempotent for an existing assignment.
    fn assign_role(
        &self,
        user_id: Uuid,
        role_id: Uuid,
    ) -> impl Future<Output = GatehouseResult<()>> + Send;

    /// Remove a role assignment from a user.
    fn unassign_role(
        &self,
        user_id: Uuid,
        role_id: Uuid,
    ) -> impl Future<Output = GatehouseResult<()>> + Send;

    /// All roles the user holds.
    fn get_user_roles(
        &self,
        user_id: Uuid,
    ) -> impl Future<Output = GatehouseResult<Vec<Role>>> + Send;
}

pub trait RoleRepository: Send + Sync {
    fn create(&self, input: CreateRole) -> impl Future<Output = GatehouseResult<Role>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = GatehouseResult<Role>> + Send;
    /// Lookup by the role's unique stable name.
    fn get_by_name(&self, name: &str) -> impl Future<Output = GatehouseResult<Role>> + Send;
    fn update(
        &self,
        id: Uuid,
        input: UpdateRole,
    ) -> impl Future<Output = GatehouseResult<Role>> + Send;
    fn delete(&self, id: Uuid) -> impl Future<Output = GatehouseResult<()>> + Send;
    fn list(
        &self,
        pagination: Pagination,
    ) -> impl Future<Output = GatehouseResult<PaginatedResult<Role>>> + Send;
}

pub trait InvitationRepository: Send + Sync {
    fn create(
        &self,
        input: CreateInvitation,
    ) -> impl Future<Output = GatehouseResult<Invitation>> + Send;
    fn get_by_token_hash(
        &self,
        token_hash: &str,
    ) -> impl Future<Output = GatehouseResult<Invitation>> + Send;
    /// Flip `accepted` to true. The record is kept until reaped.
    fn mark_accepted(&self, id: Uuid) -> impl Future<Output = GatehouseResult<()>> + Send;
    /// Hard-delete every invitation with `expires_at < now`, accepted
    /// or not. Returns the number of records removed.
    fn delete_expired(
        &self,
        now: DateTime<Utc>,
    ) -> impl Future<Output = GatehouseResult<u64>> + Send;
    fn list(
        &self,
        pagination: Pagination,
    ) -> impl Future<Output = GatehouseResult<PaginatedResult<Invitation>>> + Send;
}

/// Session activity storage, keyed by an opaque session key supplied
/// by the host transport. The idle monitor is the only writer.
pub trait SessionStore: Send + Sync {
    fn get(
        &self,
        session_key: &str,
    ) -> impl Future<Output = GatehouseResult<Option<SessionRecord>>> + Send;
    fn put(
        &self,
        session_key: &str,
        record: SessionRecord,
    ) -> impl Future<Output = GatehouseResult<()>> + Send;
    fn delete(&self, session_key: &str) -> impl Future<Output = GatehouseResult<()>> + Send;
}
