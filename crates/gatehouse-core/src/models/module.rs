//! The fixed module-key enumeration and per-module permission sets.
//!
//! [`ModuleKey::ALL`] is the single shared enumeration of functional
//! areas consumed by both the authorization resolver and the UI layer.
//! Adding a module key here is the only step needed to make it visible
//! to both; a key missing from this enum cannot be gated at all, which
//! is exactly the point.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::GatehouseError;

/// A functional area of the portal to which permissions apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModuleKey {
    // Academic
    Students,
    Classes,
    Grades,
    Attendance,
    // Admissions
    Admissions,
    Applications,
    Enrollments,
    // Communications
    CommunicationsEmail,
    CommunicationsSms,
    Announcements,
    // Financial
    Invoices,
    Payments,
    FinancialAid,
    // Administrative
    Documents,
    Media,
    Users,
    Roles,
    Settings,
    // Reporting
    Reports,
    AuditLog,
}

impl ModuleKey {
    /// All module keys, in the order the UI renders them.
    pub const ALL: [ModuleKey; 20] = [
        ModuleKey::Students,
        ModuleKey::Classes,
        ModuleKey::Grades,
        ModuleKey::Attendance,
        ModuleKey::Admissions,
        ModuleKey::Applications,
        ModuleKey::Enrollments,
        ModuleKey::CommunicationsEmail,
        ModuleKey::CommunicationsSms,
        ModuleKey::Announcements,
        ModuleKey::Invoices,
        ModuleKey::Payments,
        ModuleKey::FinancialAid,
        ModuleKey::Documents,
        ModuleKey::Media,
        ModuleKey::Users,
        ModuleKey::Roles,
        ModuleKey::Settings,
        ModuleKey::Reports,
        ModuleKey::AuditLog,
    ];

    /// Stable snake_case wire name. Never contains a dot.
    pub fn as_str(&self) -> &'static str {
        match self {
            ModuleKey::Students => "students",
            ModuleKey::Classes => "classes",
            ModuleKey::Grades => "grades",
            ModuleKey::Attendance => "attendance",
            ModuleKey::Admissions => "admissions",
            ModuleKey::Applications => "applications",
            ModuleKey::Enrollments => "enrollments",
            ModuleKey::CommunicationsEmail => "communications_email",
            ModuleKey::CommunicationsSms => "communications_sms",
            ModuleKey::Announcements => "announcements",
            ModuleKey::Invoices => "invoices",
            ModuleKey::Payments => "payments",
            ModuleKey::FinancialAid => "financial_aid",
            ModuleKey::Documents => "documents",
            ModuleKey::Media => "media",
            ModuleKey::Users => "users",
            ModuleKey::Roles => "roles",
            ModuleKey::Settings => "settings",
            ModuleKey::Reports => "reports",
            ModuleKey::AuditLog => "audit_log",
        }
    }
}

impl fmt::Display for ModuleKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModuleKey {
    type Err = GatehouseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ModuleKey::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| GatehouseError::Validation {
                message: format!("unknown module key: {s}"),
            })
    }
}

/// One of the four actions a permission set can grant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    View,
    Create,
    Edit,
    Delete,
}

impl Action {
    pub const ALL: [Action; 4] = [Action::View, Action::Create, Action::Edit, Action::Delete];

    pub fn as_str(&self) -> &'static str {
        match self {
            Action::View => "view",
            Action::Create => "create",
            Action::Edit => "edit",
            Action::Delete => "delete",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = GatehouseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Action::ALL
            .into_iter()
            .find(|a| a.as_str() == s)
            .ok_or_else(|| GatehouseError::Validation {
                message: format!("unknown action: {s}"),
            })
    }
}

/// The four-action capability tuple for one module.
///
/// A module key absent from a role's permission map and a present
/// entry with all four actions false are treated uniformly as
/// "no grant".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionSet {
    #[serde(default)]
    pub view: bool,
    #[serde(default)]
    pub create: bool,
    #[serde(default)]
    pub edit: bool,
    #[serde(default)]
    pub delete: bool,
}

impl PermissionSet {
    pub fn allows(&self, action: Action) -> bool {
        match action {
            Action::View => self.view,
            Action::Create => self.create,
            Action::Edit => self.edit,
            Action::Delete => self.delete,
        }
    }

    pub fn is_empty(&self) -> bool {
        !(self.view || self.create || self.edit || self.delete)
    }
}
