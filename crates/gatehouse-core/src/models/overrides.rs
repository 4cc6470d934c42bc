//! Per-user permission overrides.
//!
//! An override forces an allow or deny for one exact module+action
//! pair, taking precedence over role-derived grants. Overrides never
//! take precedence over a role with full access (that bypass is
//! evaluated first in the resolver).
//!
//! Overrides are stored as a `"<module>.<action>" -> bool` object on
//! the user record. In memory they are a typed map keyed by
//! `(ModuleKey, Action)`, validated against the fixed enumerations at
//! construction so a malformed or dotted key can never alias another
//! entry.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{GatehouseError, GatehouseResult};
use crate::models::module::{Action, ModuleKey};

/// The value of a single override entry. Absence of an entry means
/// "no override".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OverrideRule {
    Allow,
    Deny,
}

impl OverrideRule {
    pub fn permits(&self) -> bool {
        matches!(self, OverrideRule::Allow)
    }
}

/// A subject's full set of permission overrides.
///
/// Serializes as the stored `"<module>.<action>" -> bool` object, so
/// the wire shape matches what the front-end and the user table hold.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OverrideSet {
    entries: BTreeMap<(ModuleKey, Action), OverrideRule>,
}

impl Serialize for OverrideSet {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_keyed_entries().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for OverrideSet {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let keyed = BTreeMap::<String, bool>::deserialize(deserializer)?;
        OverrideSet::from_keyed_entries(keyed).map_err(serde::de::Error::custom)
    }
}

impl OverrideSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, module: ModuleKey, action: Action, rule: OverrideRule) {
        self.entries.insert((module, action), rule);
    }

    pub fn clear(&mut self, module: ModuleKey, action: Action) {
        self.entries.remove(&(module, action));
    }

    /// Exact-key lookup. `None` means no override applies.
    pub fn lookup(&self, module: ModuleKey, action: Action) -> Option<OverrideRule> {
        self.entries.get(&(module, action)).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Build a validated set from stored `"<module>.<action>"` keys.
    ///
    /// `true` forces allow, `false` forces deny. Keys that do not
    /// split into a known module and action are rejected rather than
    /// silently dropped.
    pub fn from_keyed_entries<I, S>(entries: I) -> GatehouseResult<Self>
    where
        I: IntoIterator<Item = (S, bool)>,
        S: AsRef<str>,
    {
        let mut set = OverrideSet::new();
        for (key, allowed) in entries {
            let key = key.as_ref();
            let (module, action) =
                key.split_once('.')
                    .ok_or_else(|| GatehouseError::Validation {
                        message: format!("override key missing separator: {key}"),
                    })?;
            let module: ModuleKey = module.parse()?;
            let action: Action = action.parse()?;
            let rule = if allowed {
                OverrideRule::Allow
            } else {
                OverrideRule::Deny
            };
            set.set(module, action, rule);
        }
        Ok(set)
    }

    /// Flatten back to the stored string-keyed representation.
    pub fn to_keyed_entries(&self) -> BTreeMap<String, bool> {
        self.entries
            .iter()
            .map(|((module, action), rule)| {
                (format!("{}.{}", module, action), rule.permits())
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyed_entries_round_trip() {
        let stored = [
            ("students.view".to_string(), false),
            ("reports.create".to_string(), true),
        ];
        let set = OverrideSet::from_keyed_entries(stored.clone()).unwrap();
        assert_eq!(
            set.lookup(ModuleKey::Students, Action::View),
            Some(OverrideRule::Deny)
        );
        assert_eq!(
            set.lookup(ModuleKey::Reports, Action::Create),
            Some(OverrideRule::Allow)
        );
        assert_eq!(set.lookup(ModuleKey::Students, Action::Delete), None);

        let back = set.to_keyed_entries();
        assert_eq!(back.len(), 2);
        assert_eq!(back["students.view"], false);
        assert_eq!(back["reports.create"], true);
    }

    #[test]
    fn rejects_key_without_separator() {
        let err = OverrideSet::from_keyed_entries([("studentsview", true)]).unwrap_err();
        assert!(matches!(err, GatehouseError::Validation { .. }));
    }

    #[test]
    fn rejects_unknown_module_or_action() {
        assert!(OverrideSet::from_keyed_entries([("timetables.view", true)]).is_err());
        assert!(OverrideSet::from_keyed_entries([("students.publish", true)]).is_err());
    }

    #[test]
    fn rejects_extra_dotted_segments() {
        // "students.view.extra" would have collided under plain string
        // concatenation; the typed parse rejects it.
        assert!(OverrideSet::from_keyed_entries([("students.view.extra", true)]).is_err());
    }

    #[test]
    fn set_and_clear() {
        let mut set = OverrideSet::new();
        set.set(ModuleKey::Invoices, Action::Delete, OverrideRule::Deny);
        assert_eq!(set.len(), 1);
        set.clear(ModuleKey::Invoices, Action::Delete);
        assert!(set.is_empty());
    }
}
