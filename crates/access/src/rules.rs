//! Static authorization rules declared per endpoint.
//!
//! Each protected endpoint carries a [`GrantRuleSet`]: an optional type-level
//! [`GrantRule`], optional per-operation rules, and flat permission names
//! required at type level and per operation. Rule sets are fixed at startup.

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use crate::level::AccessLevel;
use crate::permissions::FlatCapabilitySet;

/// A required grant: a capability held at or above a minimum level.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GrantRule {
    /// Capability name, e.g. `billing`.
    pub capability: String,
    /// Minimum level required.
    #[serde(alias = "level")]
    pub required_level: AccessLevel,
}

impl GrantRule {
    /// Creates a rule.
    pub fn new(capability: impl Into<String>, required_level: AccessLevel) -> Self {
        Self {
            capability: capability.into(),
            required_level,
        }
    }
}

/// The rules protecting one endpoint.
///
/// # Examples
///
/// ```
/// use facility_access::{AccessLevel, GrantRule, GrantRuleSet};
///
/// let rules = GrantRuleSet::new()
///     .with_grant("resident", AccessLevel::View)
///     .with_operation_grant("delete", "resident", AccessLevel::Delete);
///
/// assert_eq!(
///     rules.effective_rule("list"),
///     Some(GrantRule::new("resident", AccessLevel::View))
/// );
/// assert_eq!(
///     rules.effective_rule("delete"),
///     Some(GrantRule::new("resident", AccessLevel::Delete))
/// );
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrantRuleSet {
    /// Type-level rule, applying to every operation.
    #[serde(default)]
    pub grant: Option<GrantRule>,

    /// Operation-level rules, keyed by operation name.
    #[serde(default)]
    pub operation_grants: HashMap<String, GrantRule>,

    /// Flat permissions required for every operation.
    #[serde(default)]
    pub permissions: BTreeSet<String>,

    /// Extra flat permissions required per operation.
    #[serde(default)]
    pub operation_permissions: HashMap<String, BTreeSet<String>>,
}

impl GrantRuleSet {
    /// Creates an empty rule set, which allows everything.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the type-level rule.
    pub fn with_grant(mut self, capability: impl Into<String>, level: AccessLevel) -> Self {
        self.grant = Some(GrantRule::new(capability, level));
        self
    }

    /// Adds an operation-level rule.
    pub fn with_operation_grant(
        mut self,
        operation: impl Into<String>,
        capability: impl Into<String>,
        level: AccessLevel,
    ) -> Self {
        self.operation_grants
            .insert(operation.into(), GrantRule::new(capability, level));
        self
    }

    /// Adds type-level flat permissions.
    pub fn with_permissions<I, S>(mut self, permissions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.permissions.extend(permissions.into_iter().map(Into::into));
        self
    }

    /// Adds flat permissions for one operation.
    pub fn with_operation_permissions<I, S>(mut self, operation: impl Into<String>, permissions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.operation_permissions
            .entry(operation.into())
            .or_default()
            .extend(permissions.into_iter().map(Into::into));
        self
    }

    /// Returns the grant rule that applies to `operation`.
    ///
    /// - With only a type-level rule, or only an operation-level one, that rule applies.
    /// - When both name the same capability, the higher level applies.
    /// - When they name different capabilities, the operation-level rule applies.
    /// - With neither, `None` is returned and the grant check passes.
    pub fn effective_rule(&self, operation: &str) -> Option<GrantRule> {
        match (&self.grant, self.operation_grants.get(operation)) {
            (Some(type_rule), Some(op_rule)) if type_rule.capability == op_rule.capability => {
                Some(GrantRule {
                    capability: op_rule.capability.clone(),
                    required_level: type_rule.required_level.max(op_rule.required_level),
                })
            }
            (_, Some(op_rule)) => Some(op_rule.clone()),
            (Some(type_rule), None) => Some(type_rule.clone()),
            (None, None) => None,
        }
    }

    /// Returns the union of type-level and `operation`-level permissions.
    pub fn required_permissions(&self, operation: &str) -> FlatCapabilitySet {
        self.permissions
            .iter()
            .chain(self.operation_permissions.get(operation).into_iter().flatten())
            .cloned()
            .collect()
    }

    /// Returns `true` if no rule or permission is declared at all.
    pub fn is_unrestricted(&self) -> bool {
        self.grant.is_none()
            && self.operation_grants.is_empty()
            && self.permissions.is_empty()
            && self.operation_permissions.values().all(BTreeSet::is_empty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_same_capability_takes_higher_level() {
        let rules = GrantRuleSet::new()
            .with_grant("billing", AccessLevel::Edit)
            .with_operation_grant("export", "billing", AccessLevel::View);

        assert_eq!(
            rules.effective_rule("export"),
            Some(GrantRule::new("billing", AccessLevel::Edit))
        );
    }

    #[test]
    fn test_different_capability_replaces_type_rule() {
        let rules = GrantRuleSet::new()
            .with_grant("resident", AccessLevel::View)
            .with_operation_grant("export", "reports", AccessLevel::Create);

        assert_eq!(
            rules.effective_rule("export"),
            Some(GrantRule::new("reports", AccessLevel::Create))
        );
        assert_eq!(
            rules.effective_rule("list"),
            Some(GrantRule::new("resident", AccessLevel::View))
        );
    }

    #[test]
    fn test_operation_rule_only() {
        let rules = GrantRuleSet::new().with_operation_grant("purge", "admin", AccessLevel::Delete);
        assert_eq!(rules.effective_rule("list"), None);
        assert!(rules.effective_rule("purge").is_some());
    }

    #[test]
    fn test_required_permissions_union() {
        let rules = GrantRuleSet::new()
            .with_permissions(["residents.read"])
            .with_operation_permissions("export", ["residents.export", "residents.read"]);

        let required = rules.required_permissions("export");
        assert_eq!(required.len(), 2);
        assert!(required.contains("residents.export"));
        assert_eq!(rules.required_permissions("list").len(), 1);
    }

    #[test]
    fn test_is_unrestricted() {
        assert!(GrantRuleSet::new().is_unrestricted());
        assert!(!GrantRuleSet::new().with_permissions(["x"]).is_unrestricted());
    }

    #[test]
    fn test_deserialize_declaration() {
        let rules: GrantRuleSet = serde_json::from_value(json!({
            "grant": {"capability": "billing", "level": "edit"},
            "operation_grants": {"void": {"capability": "billing", "required_level": 4}},
            "operation_permissions": {"void": ["billing.void"]}
        }))
        .unwrap();

        assert_eq!(
            rules.effective_rule("void"),
            Some(GrantRule::new("billing", AccessLevel::Delete))
        );
        assert!(rules.required_permissions("void").contains("billing.void"));
    }
}
