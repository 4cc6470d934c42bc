//! SurrealDB implementation of [`UserRepository`].
//!
//! Password hashing uses Argon2id with OWASP-recommended parameters
//! (memory: 19 MiB, iterations: 2, parallelism: 1). Salt is randomly
//! generated per hash. An optional pepper (server-side secret) can be
//! provided at construction time.

use argon2::password_hash::SaltString;
use argon2::password_hash::rand_core::OsRng;
use argon2::{Argon2, PasswordHasher, PasswordVerifier};
use chrono::{DateTime, Utc};
use gatehouse_core::error::GatehouseResult;
use gatehouse_core::models::overrides::OverrideSet;
use gatehouse_core::models::role::Role;
use gatehouse_core::models::user::{AccountStatus, CreateUser, UpdateUser, User};
use gatehouse_core::repository::{PaginatedResult, Pagination, UserRepository};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct UserRow {
    email: String,
    display_name: String,
    password_hash: String,
    status: String,
    permissions_override: serde_json::Value,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// DB-side row struct that includes the record ID via `meta::id(id)`.
#[derive(Debug, SurrealValue)]
struct UserRowWithId {
    record_id: String,
    email: String,
    display_name: String,
    password_hash: String,
    status: String,
    permissions_override: serde_json::Value,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, SurrealValue)]
struct RoleRowWithId {
    record_id: String,
    name: String,
    label: String,
    color: String,
    grants_full_access: bool,
    permissions: serde_json::Value,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, SurrealValue)]
struct CountRow {
    total: u64,
}

fn parse_status(s: &str) -> Result<AccountStatus, DbError> {
    match s {
        "Pending" => Ok(AccountStatus::Pending),
        "Active" => Ok(AccountStatus::Active),
        "Inactive" => Ok(AccountStatus::Inactive),
        other => Err(DbError::Corrupt(format!("unknown account status: {other}"))),
    }
}

fn status_to_string(s: &AccountStatus) -> &'static str {
    match s {
        AccountStatus::Pending => "Pending",
        AccountStatus::Active => "Active",
        AccountStatus::Inactive => "Inactive",
    }
}

fn parse_overrides(value: serde_json::Value) -> Result<OverrideSet, DbError> {
    let keyed: std::collections::BTreeMap<String, bool> = serde_json::from_value(value)
        .map_err(|e| DbError::Corrupt(format!("invalid override map: {e}")))?;
    OverrideSet::from_keyed_entries(keyed)
        .map_err(|e| DbError::Corrupt(format!("invalid override entry: {e}")))
}

fn overrides_to_value(overrides: &OverrideSet) -> Result<serde_json::Value, DbError> {
    serde_json::to_value(overrides.to_keyed_entries())
        .map_err(|e| DbError::Corrupt(format!("unserializable override map: {e}")))
}

impl UserRow {
    fn into_user(self, id: Uuid) -> Result<User, DbError> {
        Ok(User {
            id,
            email: self.email,
            display_name: self.display_name,
            password_hash: self.password_hash,
            status: parse_status(&self.status)?,
            overrides: parse_overrides(self.permissions_override)?,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

impl UserRowWithId {
    fn try_into_user(self) -> Result<User, DbError> {
        let id = Uuid::parse_str(&self.record_id)
            .map_err(|e| DbError::Corrupt(format!("invalid UUID: {e}")))?;
        Ok(User {
            id,
            email: self.email,
            display_name: self.display_name,
            password_hash: self.password_hash,
            status: parse_status(&self.status)?,
            overrides: parse_overrides(self.permissions_override)?,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

impl RoleRowWithId {
    fn try_into_role(self) -> Result<Role, DbError> {
        let id = Uuid::parse_str(&self.record_id)
            .map_err(|e| DbError::Corrupt(format!("invalid UUID: {e}")))?;
        let permissions = serde_json::from_value(self.permissions)
            .map_err(|e| DbError::Corrupt(format!("invalid role permissions: {e}")))?;
        Ok(Role {
            id,
            name: self.name,
            label: self.label,
            color: self.color,
            grants_full_access: self.grants_full_access,
            permissions,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// SurrealDB implementation of the User repository.
#[derive(Clone)]
pub struct SurrealUserRepository<C: Connection> {
    db: Surreal<C>,
    pepper: Option<String>,
}

impl<C: Connection> SurrealUserRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db, pepper: None }
    }

    /// Attach a server-side pepper prepended to every password before
    /// hashing.
    pub fn with_pepper(mut self, pepper: impl Into<String>) -> Self {
        self.pepper = Some(pepper.into());
        self
    }

    fn hash_password(&self, password: &str) -> Result<String, DbError> {
        let peppered: String;
        let input = match &self.pepper {
            Some(p) => {
                peppered = format!("{p}{password}");
                peppered.as_bytes()
            }
            None => password.as_bytes(),
        };

        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(input, &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| DbError::Corrupt(format!("password hashing failed: {e}")))
    }

    /// Verify a plaintext password against a stored PHC-format hash,
    /// applying this repository's pepper if one is configured.
    ///
    /// Returns `Ok(true)` on match, `Ok(false)` on mismatch, an error
    /// only if the stored hash is malformed.
    pub fn verify_password(&self, password: &str, hash: &str) -> GatehouseResult<bool> {
        let peppered: String;
        let input = match &self.pepper {
            Some(p) => {
                peppered = format!("{p}{password}");
                peppered.as_bytes()
            }
            None => password.as_bytes(),
        };

        let parsed_hash = argon2::PasswordHash::new(hash)
            .map_err(|e| DbError::Corrupt(format!("invalid hash format: {e}")))?;

        match Argon2::default().verify_password(input, &parsed_hash) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(DbError::Corrupt(format!("verify error: {e}")).into()),
        }
    }
}

impl<C: Connection> UserRepository for SurrealUserRepository<C> {
    async fn create(&self, input: CreateUser) -> GatehouseResult<User> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();
        let password_hash = self.hash_password(&input.password)?;

        let result = self
            .db
            .query(
                "CREATE type::record('user', $id) SET \
                 email = $email, \
                 display_name = $display_name, \
                 password_hash = $password_hash, \
                 status = 'Pending', \
                 permissions_override = {}",
            )
            .bind(("id", id_str.clone()))
            .bind(("email", input.email))
            .bind(("display_name", input.display_name))
            .bind(("password_hash", password_hash))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::Migration(e.to_string()))?;

        let rows: Vec<UserRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "user".into(),
            id: id_str,
        })?;

        row.into_user(id).map_err(Into::into)
    }

    async fn get_by_id(&self, id: Uuid) -> GatehouseResult<User> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM type::record('user', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<UserRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "user".into(),
            id: id_str,
        })?;

        row.into_user(id).map_err(Into::into)
    }

    async fn get_by_email(&self, email: &str) -> GatehouseResult<User> {
        let email_owned = email.to_string();

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM user \
                 WHERE email = $email",
            )
            .bind(("email", email_owned.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<UserRowWithId> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "user".into(),
            id: format!("email={email_owned}"),
        })?;

        row.try_into_user().map_err(Into::into)
    }

    async fn update(&self, id: Uuid, input: UpdateUser) -> GatehouseResult<User> {
        let id_str = id.to_string();

        let mut sets = Vec::new();
        if input.display_name.is_some() {
            sets.push("display_name = $display_name");
        }
        if input.status.is_some() {
            sets.push("status = $status");
        }
        if input.overrides.is_some() {
            sets.push("permissions_override = $permissions_override");
        }
        if input.password.is_some() {
            sets.push("password_hash = $password_hash");
        }
        sets.push("updated_at = time::now()");

        let query = format!(
            "UPDATE type::record('user', $id) SET {}",
            sets.join(", ")
        );

        let mut builder = self.db.query(&query).bind(("id", id_str.clone()));

        if let Some(display_name) = input.display_name {
            builder = builder.bind(("display_name", display_name));
        }
        if let Some(status) = input.status {
            builder = builder.bind(("status", status_to_string(&status)));
        }
        if let Some(overrides) = input.overrides {
            builder = builder.bind(("permissions_override", overrides_to_value(&overrides)?));
        }
        if let Some(password) = input.password {
            builder = builder.bind(("password_hash", self.hash_password(&password)?));
        }

        let result = builder.await.map_err(DbError::from)?;
        let mut result = result
            .check()
            .map_err(|e| DbError::Migration(e.to_string()))?;

        let rows: Vec<UserRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "user".into(),
            id: id_str,
        })?;

        row.into_user(id).map_err(Into::into)
    }

    async fn delete(&self, id: Uuid) -> GatehouseResult<()> {
        // Soft-delete; the record and its role assignments remain.
        self.db
            .query(
                "UPDATE type::record('user', $id) SET \
                 status = 'Inactive', updated_at = time::now()",
            )
            .bind(("id", id.to_string()))
            .await
            .map_err(DbError::from)?;

        Ok(())
    }

    async fn list(&self, pagination: Pagination) -> GatehouseResult<PaginatedResult<User>> {
        let mut count_result = self
            .db
            .query("SELECT count() AS total FROM user GROUP ALL")
            .await
            .map_err(DbError::from)?;
        let count_rows: Vec<CountRow> = count_result.take(0).map_err(DbError::from)?;
        let total = count_rows.first().map(|r| r.total).unwrap_or(0);

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM user \
                 ORDER BY created_at ASC \
                 LIMIT $limit START $offset",
            )
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<UserRowWithId> = result.take(0).map_err(DbError::from)?;

        let items = rows
            .into_iter()
            .map(|row| row.try_into_user())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total,
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }

    async fn assign_role(&self, user_id: Uuid, role_id: Uuid) -> GatehouseResult<()> {
        let user_id_str = user_id.to_string();
        let role_id_str = role_id.to_string();

        // Drop any existing edge first so repeated assignment stays
        // idempotent.
        let query = format!(
            "DELETE holds WHERE \
             in = type::record('user', $user_id) AND \
             out = type::record('role', $role_id); \
             RELATE user:`{user_id_str}` -> holds -> role:`{role_id_str}`;"
        );

        self.db
            .query(query)
            .bind(("user_id", user_id_str.clone()))
            .bind(("role_id", role_id_str.clone()))
            .await
            .map_err(DbError::from)?;

        Ok(())
    }

    async fn unassign_role(&self, user_id: Uuid, role_id: Uuid) -> GatehouseResult<()> {
        self.db
            .query(
                "DELETE holds WHERE \
                 in = type::record('user', $user_id) AND \
                 out = type::record('role', $role_id)",
            )
            .bind(("user_id", user_id.to_string()))
            .bind(("role_id", role_id.to_string()))
            .await
            .map_err(DbError::from)?;

        Ok(())
    }

    async fn get_user_roles(&self, user_id: Uuid) -> GatehouseResult<Vec<Role>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM role \
                 WHERE id IN (\
                     SELECT VALUE out FROM holds \
                     WHERE in = type::record('user', $user_id)\
                 )",
            )
            .bind(("user_id", user_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<RoleRowWithId> = result.take(0).map_err(DbError::from)?;

        let roles = rows
            .into_iter()
            .map(|row| row.try_into_role())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(roles)
    }
}
