//! Authorization resolution.
//!
//! [`can`] combines a subject's roles, per-user overrides, and the
//! full-access bypass into a single decision. The evaluation order is
//! fixed: full-access roles first, then the exact-key override, then a
//! union scan of role grants. [`has_role`] is a separate, coarser gate
//! on role identity and is not a special case of [`can`].

use gatehouse_core::models::module::{Action, ModuleKey};
use gatehouse_core::models::overrides::OverrideSet;
use gatehouse_core::models::role::Role;
use uuid::Uuid;

use crate::error::PolicyError;

/// The authenticated principal of one request: the user plus their
/// resolved roles and overrides.
///
/// Assembled per request from the repositories and handed to the
/// resolver; nothing here is read from ambient state. The role data
/// is a snapshot valid for this one decision.
#[derive(Debug, Clone)]
pub struct Subject {
    pub user_id: Uuid,
    pub roles: Vec<Role>,
    pub overrides: OverrideSet,
}

impl Subject {
    pub fn new(user_id: Uuid, roles: Vec<Role>, overrides: OverrideSet) -> Self {
        Self {
            user_id,
            roles,
            overrides,
        }
    }

    /// Whether any held role carries the unconditional bypass.
    pub fn has_full_access(&self) -> bool {
        self.roles.iter().any(|role| role.grants_full_access)
    }
}

/// Decision plus reason code, as consumed by request gates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Ok,
    Unauthenticated,
    InsufficientPermissions,
}

/// Whether `subject` may perform `action` on `module`.
///
/// Evaluation order (deterministic, order matters):
/// 1. any full-access role allows unconditionally, bypassing both
///    overrides and per-module grants;
/// 2. an override for the exact pair is the final decision, with no
///    role scan;
/// 3. otherwise, the union across roles: one permissive role is
///    sufficient regardless of how many restrictive roles the subject
///    also holds.
pub fn can(subject: &Subject, module: ModuleKey, action: Action) -> bool {
    if subject.has_full_access() {
        return true;
    }

    if let Some(rule) = subject.overrides.lookup(module, action) {
        return rule.permits();
    }

    subject
        .roles
        .iter()
        .any(|role| role.permission_set(module).is_some_and(|set| set.allows(action)))
}

/// Whether `subject` holds a role with the given name.
///
/// Used for gating by role identity rather than by declared
/// capability; overrides and permission sets play no part here.
pub fn has_role(subject: &Subject, role_name: &str) -> bool {
    subject.roles.iter().any(|role| role.name == role_name)
}

/// Gate form of [`can`] for a possibly-unauthenticated request.
pub fn check(subject: Option<&Subject>, module: ModuleKey, action: Action) -> Verdict {
    match subject {
        None => Verdict::Unauthenticated,
        Some(subject) if can(subject, module, action) => Verdict::Ok,
        Some(_) => Verdict::InsufficientPermissions,
    }
}

/// Request-gating variant: proceeds or fails with a terminal error.
/// `Unauthenticated` is 401-class, `InsufficientPermissions`
/// 403-class; neither is retried.
pub fn authorize(
    subject: Option<&Subject>,
    module: ModuleKey,
    action: Action,
) -> Result<(), PolicyError> {
    match check(subject, module, action) {
        Verdict::Ok => Ok(()),
        Verdict::Unauthenticated => Err(PolicyError::Unauthenticated),
        Verdict::InsufficientPermissions => Err(PolicyError::denied_action(module, action)),
    }
}

/// Request-gating variant of [`has_role`].
pub fn authorize_role(subject: Option<&Subject>, role_name: &str) -> Result<(), PolicyError> {
    match subject {
        None => Err(PolicyError::Unauthenticated),
        Some(subject) if has_role(subject, role_name) => Ok(()),
        Some(_) => Err(PolicyError::denied_role(role_name)),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use chrono::Utc;
    use gatehouse_core::models::module::PermissionSet;
    use gatehouse_core::models::overrides::{OverrideRule, OverrideSet};

    use super::*;

    fn role(name: &str, full_access: bool, permissions: &[(ModuleKey, PermissionSet)]) -> Role {
        let now = Utc::now();
        Role {
            id: Uuid::new_v4(),
            name: name.into(),
            label: name.into(),
            color: "#336699".into(),
            grants_full_access: full_access,
            permissions: permissions.iter().cloned().collect::<BTreeMap<_, _>>(),
            created_at: now,
            updated_at: now,
        }
    }

    fn view_only() -> PermissionSet {
        PermissionSet {
            view: true,
            ..Default::default()
        }
    }

    fn create_only() -> PermissionSet {
        PermissionSet {
            create: true,
            ..Default::default()
        }
    }

    fn subject(roles: Vec<Role>, overrides: OverrideSet) -> Subject {
        Subject::new(Uuid::new_v4(), roles, overrides)
    }

    #[test]
    fn full_access_role_allows_everything() {
        let admin = role("admin", true, &[]);
        let subject = subject(vec![admin], OverrideSet::new());

        for module in ModuleKey::ALL {
            for action in Action::ALL {
                assert!(can(&subject, module, action));
            }
        }
    }

    #[test]
    fn full_access_beats_deny_override() {
        let admin = role("admin", true, &[]);
        let mut overrides = OverrideSet::new();
        overrides.set(ModuleKey::Students, Action::View, OverrideRule::Deny);
        let subject = subject(vec![admin], overrides);

        assert!(can(&subject, ModuleKey::Students, Action::View));
    }

    #[test]
    fn roles_union_across_modules() {
        // teacher grants students.view; registrar grants
        // students.create; together they grant both, but not delete.
        let teacher = role("teacher", false, &[(ModuleKey::Students, view_only())]);
        let registrar = role("registrar", false, &[(ModuleKey::Students, create_only())]);
        let subject = subject(vec![teacher, registrar], OverrideSet::new());

        assert!(can(&subject, ModuleKey::Students, Action::View));
        assert!(can(&subject, ModuleKey::Students, Action::Create));
        assert!(!can(&subject, ModuleKey::Students, Action::Delete));
    }

    #[test]
    fn deny_override_wins_over_role_grant() {
        let teacher = role("teacher", false, &[(ModuleKey::Students, view_only())]);
        let mut overrides = OverrideSet::new();
        overrides.set(ModuleKey::Students, Action::View, OverrideRule::Deny);
        let subject = subject(vec![teacher], overrides);

        assert!(!can(&subject, ModuleKey::Students, Action::View));
    }

    #[test]
    fn allow_override_wins_over_missing_grant() {
        let teacher = role("teacher", false, &[(ModuleKey::Students, view_only())]);
        let mut overrides = OverrideSet::new();
        overrides.set(ModuleKey::Reports, Action::View, OverrideRule::Allow);
        let subject = subject(vec![teacher], overrides);

        assert!(can(&subject, ModuleKey::Reports, Action::View));
    }

    #[test]
    fn override_is_exact_key_only() {
        let mut overrides = OverrideSet::new();
        overrides.set(ModuleKey::Students, Action::View, OverrideRule::Allow);
        let subject = subject(vec![], overrides);

        assert!(can(&subject, ModuleKey::Students, Action::View));
        // Neighboring actions of the same module are untouched.
        assert!(!can(&subject, ModuleKey::Students, Action::Edit));
    }

    #[test]
    fn no_roles_no_overrides_denies() {
        let subject = subject(vec![], OverrideSet::new());
        assert!(!can(&subject, ModuleKey::Students, Action::View));
    }

    #[test]
    fn all_false_entry_equals_absent_entry() {
        let with_entry = role("a", false, &[(ModuleKey::Grades, PermissionSet::default())]);
        let without_entry = role("b", false, &[]);

        let s1 = subject(vec![with_entry], OverrideSet::new());
        let s2 = subject(vec![without_entry], OverrideSet::new());
        assert_eq!(
            can(&s1, ModuleKey::Grades, Action::View),
            can(&s2, ModuleKey::Grades, Action::View)
        );
    }

    #[test]
    fn has_role_matches_name_not_capability() {
        let teacher = role("teacher", false, &[(ModuleKey::Students, view_only())]);
        let subject = subject(vec![teacher], OverrideSet::new());

        assert!(has_role(&subject, "teacher"));
        assert!(!has_role(&subject, "admin"));
        // Capability does not imply role identity.
        assert!(can(&subject, ModuleKey::Students, Action::View));
        assert!(!has_role(&subject, "registrar"));
    }

    #[test]
    fn check_distinguishes_unauthenticated_from_denied() {
        let subject = subject(vec![], OverrideSet::new());

        assert_eq!(
            check(None, ModuleKey::Students, Action::View),
            Verdict::Unauthenticated
        );
        assert_eq!(
            check(Some(&subject), ModuleKey::Students, Action::View),
            Verdict::InsufficientPermissions
        );
    }

    #[test]
    fn authorize_maps_to_status_classes() {
        let bare = subject(vec![], OverrideSet::new());

        let err = authorize(None, ModuleKey::Students, Action::View).unwrap_err();
        assert_eq!(err.status_hint(), 401);

        let err = authorize(Some(&bare), ModuleKey::Students, Action::View).unwrap_err();
        assert_eq!(err.status_hint(), 403);
    }

    #[test]
    fn authorize_role_gate() {
        let registrar = role("registrar", false, &[]);
        let subject = subject(vec![registrar], OverrideSet::new());

        assert!(authorize_role(Some(&subject), "registrar").is_ok());
        let err = authorize_role(Some(&subject), "admin").unwrap_err();
        assert_eq!(err.status_hint(), 403);
        let err = authorize_role(None, "admin").unwrap_err();
        assert_eq!(err.status_hint(), 401);
    }
}
