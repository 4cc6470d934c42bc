//! SurrealDB implementation of [`SessionStore`].
//!
//! Session keys are opaque strings supplied by the host transport and
//! used directly as record IDs. `put` is an upsert: last-writer-wins
//! on concurrent touches of the same session.

use chrono::{DateTime, Utc};
use gatehouse_core::error::GatehouseResult;
use gatehouse_core::models::session::SessionRecord;
use gatehouse_core::repository::SessionStore;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct SessionRow {
    user_id: String,
    last_activity: DateTime<Utc>,
}

impl SessionRow {
    fn try_into_record(self) -> Result<SessionRecord, DbError> {
        let user_id = Uuid::parse_str(&self.user_id)
            .map_err(|e| DbError::Corrupt(format!("invalid user UUID: {e}")))?;
        Ok(SessionRecord {
            user_id,
            last_activity: self.last_activity,
        })
    }
}

/// SurrealDB implementation of the session activity store.
#[derive(Clone)]
pub struct SurrealSessionStore<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealSessionStore<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> SessionStore for SurrealSessionStore<C> {
    async fn get(&self, session_key: &str) -> GatehouseResult<Option<SessionRecord>> {
        let mut result = self
            .db
            .query("SELECT * FROM type::record('session', $key)")
            .bind(("key", session_key.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<SessionRow> = result.take(0).map_err(DbError::from)?;
        match rows.into_iter().next() {
            Some(row) => Ok(Some(row.try_into_record()?)),
            None => Ok(None),
        }
    }

    async fn put(&self, session_key: &str, record: SessionRecord) -> GatehouseResult<()> {
        self.db
            .query(
                "UPSERT type::record('session', $key) SET \
                 user_id = $user_id, \
                 last_activity = $last_activity",
            )
            .bind(("key", session_key.to_string()))
            .bind(("user_id", record.user_id.to_string()))
            .bind(("last_activity", record.last_activity))
            .await
            .map_err(DbError::from)?;

        Ok(())
    }

    async fn delete(&self, session_key: &str) -> GatehouseResult<()> {
        self.db
            .query("DELETE type::record('session', $key)")
            .bind(("key", session_key.to_string()))
            .await
            .map_err(DbError::from)?;

        Ok(())
    }
}
