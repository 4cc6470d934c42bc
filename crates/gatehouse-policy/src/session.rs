//! Session idle enforcement.
//!
//! Per-session state machine, run before the authorization resolver on
//! every privileged request:
//!
//! ```text
//! {no record} --first touch--> active (last_activity = now)
//! active --touch within threshold--> active (last_activity refreshed)
//! active --idle > threshold--> terminated (record deleted, IdleTimeout)
//! ```
//!
//! Termination is destructive: the record is deleted and the request
//! fails with the distinguished `IdleTimeout` reason, never a generic
//! `Unauthenticated`. Concurrent touches of one session are
//! last-writer-wins; a lost update shifts the timeout slightly, which
//! is acceptable.

use chrono::{DateTime, Duration, Utc};
use gatehouse_core::error::GatehouseResult;
use gatehouse_core::models::session::SessionRecord;
use gatehouse_core::repository::SessionStore;
use tracing::info;
use uuid::Uuid;

use crate::config::PolicyConfig;
use crate::error::PolicyError;

/// Idle-session gate over an externally supplied session store.
pub struct SessionGate<S: SessionStore> {
    store: S,
    idle_timeout: Duration,
}

impl<S: SessionStore> SessionGate<S> {
    pub fn new(store: S, config: &PolicyConfig) -> Self {
        Self {
            store,
            idle_timeout: Duration::milliseconds(config.idle_timeout_ms as i64),
        }
    }

    /// Record activity for `session_key`, terminating the session if
    /// it has been idle beyond the threshold.
    pub async fn touch(&self, session_key: &str, user_id: Uuid) -> GatehouseResult<()> {
        self.touch_at(session_key, user_id, Utc::now()).await
    }

    /// [`touch`](Self::touch) with an explicit clock.
    pub async fn touch_at(
        &self,
        session_key: &str,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> GatehouseResult<()> {
        match self.store.get(session_key).await? {
            None => {
                // First touch is never itself a timeout.
                self.store
                    .put(
                        session_key,
                        SessionRecord {
                            user_id,
                            last_activity: now,
                        },
                    )
                    .await
            }
            Some(record) => {
                let idle = now - record.last_activity;
                if idle > self.idle_timeout {
                    self.store.delete(session_key).await?;
                    info!(
                        user_id = %record.user_id,
                        idle_secs = idle.num_seconds(),
                        "session terminated after idle timeout"
                    );
                    Err(PolicyError::IdleTimeout.into())
                } else {
                    self.store
                        .put(
                            session_key,
                            SessionRecord {
                                user_id: record.user_id,
                                last_activity: now,
                            },
                        )
                        .await
                }
            }
        }
    }

    /// Voluntary logout: destroy the session record.
    pub async fn logout(&self, session_key: &str) -> GatehouseResult<()> {
        self.store.delete(session_key).await
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use gatehouse_core::error::GatehouseError;

    use super::*;

    #[derive(Default)]
    struct MemStore {
        records: Mutex<HashMap<String, SessionRecord>>,
    }

    impl SessionStore for MemStore {
        async fn get(&self, session_key: &str) -> GatehouseResult<Option<SessionRecord>> {
            Ok(self.records.lock().unwrap().get(session_key).cloned())
        }

        async fn put(&self, session_key: &str, record: SessionRecord) -> GatehouseResult<()> {
            self.records
                .lock()
                .unwrap()
                .insert(session_key.into(), record);
            Ok(())
        }

        async fn delete(&self, session_key: &str) -> GatehouseResult<()> {
            self.records.lock().unwrap().remove(session_key);
            Ok(())
        }
    }

    fn gate_with_timeout_ms(ms: u64) -> SessionGate<MemStore> {
        let config = PolicyConfig {
            idle_timeout_ms: ms,
            ..Default::default()
        };
        SessionGate::new(MemStore::default(), &config)
    }

    #[tokio::test]
    async fn first_touch_creates_record_and_proceeds() {
        let gate = gate_with_timeout_ms(30_000);
        let user = Uuid::new_v4();
        let now = Utc::now();

        gate.touch_at("sess-1", user, now).await.unwrap();

        let record = gate.store.get("sess-1").await.unwrap().unwrap();
        assert_eq!(record.user_id, user);
        assert_eq!(record.last_activity, now);
    }

    #[tokio::test]
    async fn touch_just_inside_threshold_refreshes() {
        let gate = gate_with_timeout_ms(30_000);
        let user = Uuid::new_v4();
        let t0 = Utc::now();

        gate.touch_at("sess-1", user, t0).await.unwrap();
        let t1 = t0 + Duration::milliseconds(29_999);
        gate.touch_at("sess-1", user, t1).await.unwrap();

        let record = gate.store.get("sess-1").await.unwrap().unwrap();
        assert_eq!(record.last_activity, t1);
    }

    #[tokio::test]
    async fn touch_at_exact_threshold_still_proceeds() {
        // Termination requires idle strictly greater than the
        // threshold.
        let gate = gate_with_timeout_ms(30_000);
        let user = Uuid::new_v4();
        let t0 = Utc::now();

        gate.touch_at("sess-1", user, t0).await.unwrap();
        gate.touch_at("sess-1", user, t0 + Duration::milliseconds(30_000))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn touch_past_threshold_terminates_and_deletes() {
        let gate = gate_with_timeout_ms(30_000);
        let user = Uuid::new_v4();
        let t0 = Utc::now();

        gate.touch_at("sess-1", user, t0).await.unwrap();
        let err = gate
            .touch_at("sess-1", user, t0 + Duration::milliseconds(30_001))
            .await
            .unwrap_err();

        // Distinguished from a generic Unauthenticated.
        assert!(matches!(err, GatehouseError::IdleTimeout));
        assert!(gate.store.get("sess-1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn terminated_session_starts_fresh_on_next_touch() {
        let gate = gate_with_timeout_ms(1_000);
        let user = Uuid::new_v4();
        let t0 = Utc::now();

        gate.touch_at("sess-1", user, t0).await.unwrap();
        let t1 = t0 + Duration::milliseconds(5_000);
        gate.touch_at("sess-1", user, t1).await.unwrap_err();

        // After destructive logout the next touch is a first touch.
        gate.touch_at("sess-1", user, t1).await.unwrap();
        let record = gate.store.get("sess-1").await.unwrap().unwrap();
        assert_eq!(record.last_activity, t1);
    }

    #[tokio::test]
    async fn intervening_activity_keeps_session_alive() {
        let gate = gate_with_timeout_ms(30_000);
        let user = Uuid::new_v4();
        let t0 = Utc::now();

        gate.touch_at("sess-1", user, t0).await.unwrap();
        // Regular activity, each step inside the threshold, total far
        // beyond it.
        for i in 1..=10 {
            let t = t0 + Duration::milliseconds(i * 20_000);
            gate.touch_at("sess-1", user, t).await.unwrap();
        }
    }

    #[tokio::test]
    async fn logout_deletes_record() {
        let gate = gate_with_timeout_ms(30_000);
        let user = Uuid::new_v4();

        gate.touch_at("sess-1", user, Utc::now()).await.unwrap();
        gate.logout("sess-1").await.unwrap();
        assert!(gate.store.get("sess-1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn sessions_are_independent() {
        let gate = gate_with_timeout_ms(30_000);
        let user = Uuid::new_v4();
        let t0 = Utc::now();

        gate.touch_at("sess-1", user, t0).await.unwrap();
        gate.touch_at("sess-2", user, t0 + Duration::milliseconds(40_000))
            .await
            .unwrap();

        // sess-1 expired, sess-2 untouched by that.
        gate.touch_at("sess-1", user, t0 + Duration::milliseconds(80_000))
            .await
            .unwrap_err();
        gate.touch_at("sess-2", user, t0 + Duration::milliseconds(50_000))
            .await
            .unwrap();
    }
}
