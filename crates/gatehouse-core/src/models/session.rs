//! Session activity record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Ephemeral per-session state, keyed externally by an opaque session
/// key. Created on first authenticated activity, refreshed on every
/// authorized request, deleted on idle timeout or logout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRecord {
    pub user_id: Uuid,
    pub last_activity: DateTime<Utc>,
}
