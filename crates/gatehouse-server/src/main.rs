//! Gatehouse Server — application entry point.
//!
//! Connects to SurrealDB, applies migrations, seeds the full-access
//! role, and runs the scheduled invitation reaper until shutdown.
//! The HTTP surface consuming the gates lives in the portal host, not
//! here.

use std::collections::BTreeMap;
use std::time::Duration;

use gatehouse_core::error::GatehouseError;
use gatehouse_core::models::role::CreateRole;
use gatehouse_core::repository::RoleRepository;
use gatehouse_db::repository::{
    SurrealInvitationRepository, SurrealRoleRepository, SurrealUserRepository,
};
use gatehouse_db::{DbConfig, DbManager};
use gatehouse_policy::{InvitationService, PolicyConfig};
use tracing_subscriber::EnvFilter;

/// How often the invitation reaper runs.
const REAP_INTERVAL: Duration = Duration::from_secs(3600);

/// Ensure the full-access role exists. Its bypass comes from the
/// `grants_full_access` flag, not from the name.
async fn seed_admin_role<R: RoleRepository>(roles: &R) -> Result<(), GatehouseError> {
    match roles.get_by_name("admin").await {
        Ok(_) => Ok(()),
        Err(GatehouseError::NotFound { .. }) => {
            roles
                .create(CreateRole {
                    name: "admin".into(),
                    label: "Administrator".into(),
                    color: "#d32f2f".into(),
                    grants_full_access: true,
                    permissions: BTreeMap::new(),
                })
                .await?;
            tracing::info!("seeded full-access admin role");
            Ok(())
        }
        Err(other) => Err(other),
    }
}

fn policy_config_from_env() -> PolicyConfig {
    let mut config = PolicyConfig::default();
    if let Ok(ms) = std::env::var("GATEHOUSE_IDLE_TIMEOUT_MS")
        && let Ok(ms) = ms.parse()
    {
        config.idle_timeout_ms = ms;
    }
    if let Ok(secs) = std::env::var("GATEHOUSE_INVITATION_TTL_SECS")
        && let Ok(secs) = secs.parse()
    {
        config.invitation_ttl_secs = secs;
    }
    config
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("gatehouse=info".parse().unwrap()),
        )
        .json()
        .init();

    tracing::info!("Starting Gatehouse server...");

    let db_config = DbConfig::from_env();
    let manager = match DbManager::connect(&db_config).await {
        Ok(manager) => manager,
        Err(e) => {
            tracing::error!(error = %e, "failed to connect to SurrealDB");
            std::process::exit(1);
        }
    };

    if let Err(e) = gatehouse_db::run_migrations(manager.client()).await {
        tracing::error!(error = %e, "migrations failed");
        std::process::exit(1);
    }

    let db = manager.client().clone();
    let roles = SurrealRoleRepository::new(db.clone());
    if let Err(e) = seed_admin_role(&roles).await {
        tracing::error!(error = %e, "seeding admin role failed");
        std::process::exit(1);
    }

    let invitations = InvitationService::new(
        SurrealInvitationRepository::new(db.clone()),
        roles,
        SurrealUserRepository::new(db),
        policy_config_from_env(),
    );

    let reaper = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(REAP_INTERVAL);
        loop {
            ticker.tick().await;
            if let Err(e) = invitations.reap_expired().await {
                tracing::warn!(error = %e, "invitation reaping failed");
            }
        }
    });

    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
    }
    reaper.abort();

    tracing::info!("Gatehouse server stopped.");
}
