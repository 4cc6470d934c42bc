//! Role domain model.
//!
//! Roles are referenced by users many-to-many, never copied into the
//! user record, and are immutable for the duration of a single
//! authorization decision.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::module::{ModuleKey, PermissionSet};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Role {
    pub id: Uuid,
    /// Globally unique stable key, e.g. `"admin"`, `"teacher"`.
    pub name: String,
    /// Human-readable label shown in the UI.
    pub label: String,
    /// Display color (hex string) for role chips in the UI.
    pub color: String,
    /// Unconditional bypass: a subject holding any role with this flag
    /// passes every permission check, before overrides are consulted.
    /// Decided at role-definition time rather than by matching the
    /// role name against a magic string.
    pub grants_full_access: bool,
    /// Per-module grants. A module with no entry grants nothing.
    pub permissions: BTreeMap<ModuleKey, PermissionSet>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Role {
    /// The role's permission set for one module, if any.
    pub fn permission_set(&self, module: ModuleKey) -> Option<&PermissionSet> {
        self.permissions.get(&module)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateRole {
    pub name: String,
    pub label: String,
    pub color: String,
    pub grants_full_access: bool,
    pub permissions: BTreeMap<ModuleKey, PermissionSet>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateRole {
    pub label: Option<String>,
    pub color: Option<String>,
    pub grants_full_access: Option<bool>,
    pub permissions: Option<BTreeMap<ModuleKey, PermissionSet>>,
}
