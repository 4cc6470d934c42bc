//! Integration tests for the invitation lifecycle and the full
//! request path (session gate + resolver) against in-memory
//! SurrealDB.

use std::collections::BTreeMap;

use chrono::Duration;
use gatehouse_core::error::GatehouseError;
use gatehouse_core::models::module::{Action, ModuleKey, PermissionSet};
use gatehouse_core::models::role::CreateRole;
use gatehouse_core::models::user::AccountStatus;
use gatehouse_core::repository::{RoleRepository, UserRepository};
use gatehouse_db::repository::{
    SurrealInvitationRepository, SurrealRoleRepository, SurrealUserRepository,
};
use gatehouse_policy::{
    InvitationService, NewAccount, PolicyConfig, Subject, authorize, can,
};
use surrealdb::Surreal;
use surrealdb::engine::local::Mem;
use uuid::Uuid;

type Db = surrealdb::engine::local::Db;

/// Spin up in-memory DB, run migrations, create teacher + registrar
/// roles.
async fn setup() -> (
    Surreal<Db>,
    InvitationService<
        SurrealInvitationRepository<Db>,
        SurrealRoleRepository<Db>,
        SurrealUserRepository<Db>,
    >,
    Uuid, // teacher role id
    Uuid, // registrar role id
) {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    gatehouse_db::run_migrations(&db).await.unwrap();

    let roles = SurrealRoleRepository::new(db.clone());
    let teacher = roles
        .create(CreateRole {
            name: "teacher".into(),
            label: "Teacher".into(),
            color: "#2e7d32".into(),
            grants_full_access: false,
            permissions: BTreeMap::from([(
                ModuleKey::Students,
                PermissionSet {
                    view: true,
                    ..Default::default()
                },
            )]),
        })
        .await
        .unwrap();
    let registrar = roles
        .create(CreateRole {
            name: "registrar".into(),
            label: "Registrar".into(),
            color: "#1565c0".into(),
            grants_full_access: false,
            permissions: BTreeMap::from([(
                ModuleKey::Students,
                PermissionSet {
                    create: true,
                    ..Default::default()
                },
            )]),
        })
        .await
        .unwrap();

    let service = InvitationService::new(
        SurrealInvitationRepository::new(db.clone()),
        SurrealRoleRepository::new(db.clone()),
        SurrealUserRepository::new(db.clone()),
        PolicyConfig::default(),
    );

    (db, service, teacher.id, registrar.id)
}

fn account() -> NewAccount {
    NewAccount {
        display_name: "Jane Doe".into(),
        password: "correct-horse-battery".into(),
    }
}

#[tokio::test]
async fn issue_and_accept_happy_path() {
    let (db, service, teacher_id, registrar_id) = setup().await;
    let issuer = Uuid::new_v4();

    let (invitation, raw_token) = service
        .issue(
            "  Jane.Doe@School.EDU ",
            vec![teacher_id, registrar_id],
            issuer,
            None,
        )
        .await
        .unwrap();

    // Email normalized, token never stored raw.
    assert_eq!(invitation.email, "jane.doe@school.edu");
    assert_ne!(invitation.token_hash, raw_token);
    assert_eq!(invitation.invited_by, issuer);

    let user = service.accept(&raw_token, account()).await.unwrap();
    assert_eq!(user.email, "jane.doe@school.edu");
    assert_eq!(user.status, AccountStatus::Active);

    // Proposed roles are bound to the subject.
    let users = SurrealUserRepository::new(db);
    let roles = users.get_user_roles(user.id).await.unwrap();
    assert_eq!(roles.len(), 2);

    // The accepted subject passes authorization via its new roles.
    let subject = Subject::new(user.id, roles, user.overrides);
    assert!(can(&subject, ModuleKey::Students, Action::View));
    assert!(can(&subject, ModuleKey::Students, Action::Create));
    assert!(!can(&subject, ModuleKey::Students, Action::Delete));
    assert!(authorize(Some(&subject), ModuleKey::Students, Action::View).is_ok());
}

#[tokio::test]
async fn issue_rejects_unknown_roles_and_bad_email() {
    let (_db, service, teacher_id, _) = setup().await;

    let err = service
        .issue("x@school.edu", vec![Uuid::new_v4()], Uuid::new_v4(), None)
        .await
        .unwrap_err();
    assert!(matches!(err, GatehouseError::NotFound { .. }));

    let err = service
        .issue("not-an-email", vec![teacher_id], Uuid::new_v4(), None)
        .await
        .unwrap_err();
    assert!(matches!(err, GatehouseError::Validation { .. }));
}

#[tokio::test]
async fn accept_with_unknown_token_fails() {
    let (_db, service, _, _) = setup().await;

    let err = service
        .accept("bogus-token", account())
        .await
        .unwrap_err();
    assert!(matches!(err, GatehouseError::TokenNotFound));
}

#[tokio::test]
async fn accept_twice_fails_with_already_accepted() {
    let (_db, service, teacher_id, _) = setup().await;

    let (_, raw_token) = service
        .issue("twice@school.edu", vec![teacher_id], Uuid::new_v4(), None)
        .await
        .unwrap();

    service.accept(&raw_token, account()).await.unwrap();
    let err = service.accept(&raw_token, account()).await.unwrap_err();
    assert!(matches!(err, GatehouseError::AlreadyAccepted));
}

#[tokio::test]
async fn accept_after_expiry_fails_before_reaping() {
    let (_db, service, teacher_id, _) = setup().await;

    // Issue with a TTL already in the past; the record physically
    // exists until the reaper runs.
    let (_, raw_token) = service
        .issue(
            "late@school.edu",
            vec![teacher_id],
            Uuid::new_v4(),
            Some(Duration::seconds(-1)),
        )
        .await
        .unwrap();

    let err = service.accept(&raw_token, account()).await.unwrap_err();
    assert!(matches!(err, GatehouseError::TokenExpired));
}

#[tokio::test]
async fn accept_rejects_short_password() {
    let (_db, service, teacher_id, _) = setup().await;

    let (_, raw_token) = service
        .issue("short@school.edu", vec![teacher_id], Uuid::new_v4(), None)
        .await
        .unwrap();

    let err = service
        .accept(
            &raw_token,
            NewAccount {
                display_name: "Shorty".into(),
                password: "tiny".into(),
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, GatehouseError::Validation { .. }));

    // The invitation stays redeemable after the failed attempt.
    service.accept(&raw_token, account()).await.unwrap();
}

#[tokio::test]
async fn accept_claims_pending_account_with_same_email() {
    let (db, service, teacher_id, _) = setup().await;

    let users = SurrealUserRepository::new(db);
    let pending = users
        .create(gatehouse_core::models::user::CreateUser {
            email: "pending@school.edu".into(),
            display_name: "Placeholder".into(),
            password: "placeholder-password".into(),
        })
        .await
        .unwrap();
    assert_eq!(pending.status, AccountStatus::Pending);

    let (_, raw_token) = service
        .issue("pending@school.edu", vec![teacher_id], Uuid::new_v4(), None)
        .await
        .unwrap();
    let user = service.accept(&raw_token, account()).await.unwrap();

    // Same record, now active with the invitee's details.
    assert_eq!(user.id, pending.id);
    assert_eq!(user.status, AccountStatus::Active);
    assert_eq!(user.display_name, "Jane Doe");
}

#[tokio::test]
async fn accept_refuses_active_account_with_same_email() {
    let (_db, service, teacher_id, _) = setup().await;

    let (_, first_token) = service
        .issue("taken@school.edu", vec![teacher_id], Uuid::new_v4(), None)
        .await
        .unwrap();
    service.accept(&first_token, account()).await.unwrap();

    let (_, second_token) = service
        .issue("taken@school.edu", vec![teacher_id], Uuid::new_v4(), None)
        .await
        .unwrap();
    let err = service.accept(&second_token, account()).await.unwrap_err();
    assert!(matches!(err, GatehouseError::AlreadyExists { .. }));
}

#[tokio::test]
async fn reaper_purges_expired_only() {
    let (_db, service, teacher_id, _) = setup().await;

    service
        .issue("fresh@school.edu", vec![teacher_id], Uuid::new_v4(), None)
        .await
        .unwrap();
    let (_, stale_token) = service
        .issue(
            "stale@school.edu",
            vec![teacher_id],
            Uuid::new_v4(),
            Some(Duration::seconds(-1)),
        )
        .await
        .unwrap();

    let purged = service.reap_expired().await.unwrap();
    assert_eq!(purged, 1);

    // Post-reap, the expired token reads as not-found rather than
    // expired; the distinction only exists while the record is
    // physically present.
    let err = service.accept(&stale_token, account()).await.unwrap_err();
    assert!(matches!(err, GatehouseError::TokenNotFound));
}
