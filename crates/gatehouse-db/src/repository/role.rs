//! SurrealDB implementation of [`RoleRepository`].

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use gatehouse_core::error::GatehouseResult;
use gatehouse_core::models::module::{ModuleKey, PermissionSet};
use gatehouse_core::models::role::{CreateRole, Role, UpdateRole};
use gatehouse_core::repository::{PaginatedResult, Pagination, RoleRepository};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct RoleRow {
    name: String,
    label: String,
    color: String,
    grants_full_access: bool,
    permissions: serde_json::Value,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// DB-side row struct that includes the record ID via `meta::id(id)`.
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

fn parse_permissions(
    value: serde_json::Value,
) -> Result<BTreeMap<ModuleKey, PermissionSet>, DbError> {
    serde_json::from_value(value)
        .map_err(|e| DbError::Corrupt(format!("invalid role permissions: {e}")))
}

fn permissions_to_value(
    permissions: &BTreeMap<ModuleKey, PermissionSet>,
) -> Result<serde_json::Value, DbError> {
    serde_json::to_value(permissions)
        .map_err(|e| DbError::Corrupt(format!("unserializable role permissions: {e}")))
}

impl RoleRow {
    fn into_role(self, id: Uuid) -> Result<Role, DbError> {
        Ok(Role {
            id,
            name: self.name,
            label: self.label,
            color: self.color,
            grants_full_access: self.grants_full_access,
            permissions: parse_permissions(self.permissions)?,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

impl RoleRowWithId {
    fn try_into_role(self) -> Result<Role, DbError> {
        let id = Uuid::parse_str(&self.record_id)
            .map_err(|e| DbError::Corrupt(format!("invalid UUID: {e}")))?;
        Ok(Role {
            id,
            name: self.name,
            label: self.label,
            color: self.color,
            grants_full_access: self.grants_full_access,
            permissions: parse_permissions(self.permissions)?,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Debug, SurrealValue)]
struct CountRow {
    total: u64,
}

/// SurrealDB implementation of the Role repository.
#[derive(Clone)]
pub struct SurrealRoleRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealRoleRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> RoleRepository for SurrealRoleRepository<C> {
    async fn create(&self, input: CreateRole) -> GatehouseResult<Role> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();
        let permissions = permissions_to_value(&input.permissions)?;

        let result = self
            .db
            .query(
                "CREATE type::record('role', $id) SET \
                 name = $name, label = $label, color = $color, \
                 grants_full_access = $grants_full_access, \
                 permissions = $permissions",
            )
            .bind(("id", id_str.clone()))
            .bind(("name", input.name))
            .bind(("label", input.label))
            .bind(("color", input.color))
            .bind(("grants_full_access", input.grants_full_access))
            .bind(("permissions", permissions))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::Migration(e.to_string()))?;

        let rows: Vec<RoleRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "role".into(),
            id: id_str,
        })?;

        row.into_role(id).map_err(Into::into)
    }

    async fn get_by_id(&self, id: Uuid) -> GatehouseResult<Role> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM type::record('role', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<RoleRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "role".into(),
            id: id_str,
        })?;

        row.into_role(id).map_err(Into::into)
    }

    async fn get_by_name(&self, name: &str) -> GatehouseResult<Role> {
        let name_owned = name.to_string();

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM role \
                 WHERE name = $name",
            )
            .bind(("name", name_owned.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<RoleRowWithId> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "role".into(),
            id: format!("name={name_owned}"),
        })?;

        row.try_into_role().map_err(Into::into)
    }

    async fn update(&self, id: Uuid, input: UpdateRole) -> GatehouseResult<Role> {
        let id_str = id.to_string();

        let mut sets = Vec::new();
        if input.label.is_some() {
            sets.push("label = $label");
        }
        if input.color.is_some() {
            sets.push("color = $color");
        }
        if input.grants_full_access.is_some() {
            sets.push("grants_full_access = $grants_full_access");
        }
        if input.permissions.is_some() {
            sets.push("permissions = $permissions");
        }
        sets.push("updated_at = time::now()");

        let query = format!(
            "UPDATE type::record('role', $id) SET {}",
            sets.join(", ")
        );

        let mut builder = self.db.query(&query).bind(("id", id_str.clone()));

        if let Some(label) = input.label {
            builder = builder.bind(("label", label));
        }
        if let Some(color) = input.color {
            builder = builder.bind(("color", color));
        }
        if let Some(grants_full_access) = input.grants_full_access {
            builder = builder.bind(("grants_full_access", grants_full_access));
        }
        if let Some(permissions) = input.permissions {
            builder = builder.bind(("permissions", permissions_to_value(&permissions)?));
        }

        let result = builder.await.map_err(DbError::from)?;
        let mut result = result
            .check()
            .map_err(|e| DbError::Migration(e.to_string()))?;

        let rows: Vec<RoleRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "role".into(),
            id: id_str,
        })?;

        row.into_role(id).map_err(Into::into)
    }

    async fn delete(&self, id: Uuid) -> GatehouseResult<()> {
        let id_str = id.to_string();

        // Remove assignment edges first, then the role record.
        let query = format!(
            "DELETE holds WHERE out = role:`{id_str}`; \
             DELETE type::record('role', $id);"
        );

        self.db
            .query(query)
            .bind(("id", id_str))
            .await
            .map_err(DbError::from)?;

        Ok(())
    }

    async fn list(&self, pagination: Pagination) -> GatehouseResult<PaginatedResult<Role>> {
        let mut count_result = self
            .db
            .query("SELECT count() AS total FROM role GROUP ALL")
            .await
            .map_err(DbError::from)?;
        let count_rows: Vec<CountRow> = count_result.take(0).map_err(DbError::from)?;
        let total = count_rows.first().map(|r| r.total).unwrap_or(0);

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM role \
                 ORDER BY name ASC \
                 LIMIT $limit START $offset",
            )
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<RoleRowWithId> = result.take(0).map_err(DbError::from)?;

        let items = rows
            .into_iter()
            .map(|row| row.try_into_role())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total,
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }
}
