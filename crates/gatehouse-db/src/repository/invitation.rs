//! SurrealDB implementation of [`InvitationRepository`].

use chrono::{DateTime, Utc};
use gatehouse_core::error::GatehouseResult;
use gatehouse_core::models::invitation::{CreateInvitation, Invitation};
use gatehouse_core::repository::{InvitationRepository, PaginatedResult, Pagination};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct InvitationRow {
    email: String,
    token_hash: String,
    role_ids: Vec<String>,
    invited_by: String,
    accepted: bool,
    expires_at: DateTime<Utc>,
    created_at: DateTime<Utc>,
}

/// DB-side row struct that includes the record ID via `meta::id(id)`.
#[derive(Debug, SurrealValue)]
struct InvitationRowWithId {
    record_id: String,
    email: String,
    token_hash: String,
    role_ids: Vec<String>,
    invited_by: String,
    accepted: bool,
    expires_at: DateTime<Utc>,
    created_at: DateTime<Utc>,
}

#[derive(Debug, SurrealValue)]
struct CountRow {
    total: u64,
}

fn parse_role_ids(raw: Vec<String>) -> Result<Vec<Uuid>, DbError> {
    raw.iter()
        .map(|s| {
            Uuid::parse_str(s).map_err(|e| DbError::Corrupt(format!("invalid role UUID: {e}")))
        })
        .collect()
}

impl InvitationRow {
    fn into_invitation(self, id: Uuid) -> Result<Invitation, DbError> {
        let invited_by = Uuid::parse_str(&self.invited_by)
            .map_err(|e| DbError::Corrupt(format!("invalid issuer UUID: {e}")))?;
        Ok(Invitation {
            id,
            email: self.email,
            token_hash: self.token_hash,
            role_ids: parse_role_ids(self.role_ids)?,
            invited_by,
            accepted: self.accepted,
            expires_at: self.expires_at,
            created_at: self.created_at,
        })
    }
}

impl InvitationRowWithId {
    fn try_into_invitation(self) -> Result<Invitation, DbError> {
        let id = Uuid::parse_str(&self.record_id)
            .map_err(|e| DbError::Corrupt(format!("invalid UUID: {e}")))?;
        let invited_by = Uuid::parse_str(&self.invited_by)
            .map_err(|e| DbError::Corrupt(format!("invalid issuer UUID: {e}")))?;
        Ok(Invitation {
            id,
            email: self.email,
            token_hash: self.token_hash,
            role_ids: parse_role_ids(self.role_ids)?,
            invited_by,
            accepted: self.accepted,
            expires_at: self.expires_at,
            created_at: self.created_at,
        })
    }
}

/// SurrealDB implementation of the Invitation repository.
#[derive(Clone)]
pub struct SurrealInvitationRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealInvitationRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> InvitationRepository for SurrealInvitationRepository<C> {
    async fn create(&self, input: CreateInvitation) -> GatehouseResult<Invitation> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();
        let role_ids: Vec<String> = input.role_ids.iter().map(Uuid::to_string).collect();

        let result = self
            .db
            .query(
                "CREATE type::record('invitation', $id) SET \
                 email = $email, \
                 token_hash = $token_hash, \
                 role_ids = $role_ids, \
                 invited_by = $invited_by, \
                 accepted = false, \
                 expires_at = $expires_at",
            )
            .bind(("id", id_str.clone()))
            .bind(("email", input.email))
            .bind(("token_hash", input.token_hash))
            .bind(("role_ids", role_ids))
            .bind(("invited_by", input.invited_by.to_string()))
            .bind(("expires_at", input.expires_at))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::Migration(e.to_string()))?;

        let rows: Vec<InvitationRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "invitation".into(),
            id: id_str,
        })?;

        row.into_invitation(id).map_err(Into::into)
    }

    async fn get_by_token_hash(&self, token_hash: &str) -> GatehouseResult<Invitation> {
        let token_hash_owned = token_hash.to_string();

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM invitation \
                 WHERE token_hash = $token_hash",
            )
            .bind(("token_hash", token_hash_owned.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<InvitationRowWithId> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "invitation".into(),
            id: format!("token_hash={token_hash_owned}"),
        })?;

        row.try_into_invitation().map_err(Into::into)
    }

    async fn mark_accepted(&self, id: Uuid) -> GatehouseResult<()> {
        self.db
            .query("UPDATE type::record('invitation', $id) SET accepted = true")
            .bind(("id", id.to_string()))
            .await
            .map_err(DbError::from)?;

        Ok(())
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> GatehouseResult<u64> {
        // Count expired invitations first, then delete.
        let mut count_result = self
            .db
            .query(
                "SELECT count() AS total FROM invitation \
                 WHERE expires_at < $now GROUP ALL",
            )
            .bind(("now", now))
            .await
            .map_err(DbError::from)?;
        let count_rows: Vec<CountRow> = count_result.take(0).map_err(DbError::from)?;
        let total = count_rows.first().map(|r| r.total).unwrap_or(0);

        self.db
            .query("DELETE invitation WHERE expires_at < $now")
            .bind(("now", now))
            .await
            .map_err(DbError::from)?;

        Ok(total)
    }

    async fn list(&self, pagination: Pagination) -> GatehouseResult<PaginatedResult<Invitation>> {
        let mut count_result = self
            .db
            .query("SELECT count() AS total FROM invitation GROUP ALL")
            .await
            .map_err(DbError::from)?;
        let count_rows: Vec<CountRow> = count_result.take(0).map_err(DbError::from)?;
        let total = count_rows.first().map(|r| r.total).unwrap_or(0);

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM invitation \
                 ORDER BY created_at ASC \
                 LIMIT $limit START $offset",
            )
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<InvitationRowWithId> = result.take(0).map_err(DbError::from)?;

        let items = rows
            .into_iter()
            .map(|row| row.try_into_invitation())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total,
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }
}
