//! Level-based grant resolution.
//!
//! A caller's roles are folded into an [`EffectiveGrantMap`]: one entry per
//! capability, holding the highest level any enabled grant confers. The
//! [`GrantResolver`] then compares that map with an endpoint's effective
//! [`GrantRule`].

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::debug;

use crate::decision::Decision;
use crate::level::AccessLevel;
use crate::roles::{Caller, Role};
use crate::rules::{GrantRule, GrantRuleSet};

/// A caller's effective hold on one capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GrantEntry {
    /// Highest enabled level.
    pub level: AccessLevel,
    /// `false` when every grant of this capability is disabled.
    pub enabled: bool,
}

/// Capability to effective grant, aggregated across a caller's roles.
///
/// Aggregation is commutative: the order roles are visited in does not
/// matter, and the highest enabled level wins.
///
/// # Examples
///
/// ```
/// use facility_access::{AccessLevel, EffectiveGrantMap, Role};
///
/// let roles = [
///     Role::new("clerk").with_grant("billing", AccessLevel::View),
///     Role::new("editor").with_grant("billing", AccessLevel::Edit),
/// ];
///
/// let grants = EffectiveGrantMap::compute(&roles);
/// assert_eq!(grants.level("billing"), Some(AccessLevel::Edit));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct EffectiveGrantMap(BTreeMap<String, GrantEntry>);

impl EffectiveGrantMap {
    /// Folds the grants of `roles` into one map.
    pub fn compute<'a, I>(roles: I) -> Self
    where
        I: IntoIterator<Item = &'a Role>,
    {
        let mut map: BTreeMap<String, GrantEntry> = BTreeMap::new();

        for grant in roles.into_iter().flat_map(|role| role.grants.iter()) {
            let entry = map.entry(grant.capability.clone()).or_insert(GrantEntry {
                level: AccessLevel::None,
                enabled: false,
            });
            if grant.enabled {
                entry.enabled = true;
                entry.level = entry.level.max(grant.level);
            }
        }

        Self(map)
    }

    /// Computes the map for the roles that apply in the caller's tenant context.
    pub fn for_caller(caller: &Caller) -> Self {
        Self::compute(caller.roles())
    }

    /// Returns the entry for a capability.
    pub fn get(&self, capability: &str) -> Option<&GrantEntry> {
        self.0.get(capability)
    }

    /// Returns the effective level, if the capability is held and enabled.
    pub fn level(&self, capability: &str) -> Option<AccessLevel> {
        self.get(capability)
            .filter(|entry| entry.enabled)
            .map(|entry| entry.level)
    }

    /// Returns `true` if the map satisfies `rule`.
    pub fn satisfies(&self, rule: &GrantRule) -> bool {
        self.level(&rule.capability)
            .is_some_and(|level| level >= rule.required_level)
    }

    /// Iterates over capabilities and entries, in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &GrantEntry)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Returns the number of capabilities.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if no capability is held.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// The result of a grant check, with the map it was decided on.
///
/// The map is kept for downstream handlers; it must never be echoed back on
/// a denial.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrantOutcome {
    /// Allow or deny.
    pub decision: Decision,
    /// The caller's effective grants.
    pub grants: EffectiveGrantMap,
}

/// Resolves level-based grant rules.
#[derive(Debug, Clone, Copy, Default)]
pub struct GrantResolver;

impl GrantResolver {
    /// Decides a single rule against a precomputed map.
    pub fn resolve(grants: &EffectiveGrantMap, rule: &GrantRule) -> Decision {
        Decision::from_bool(grants.satisfies(rule))
    }

    /// Decides whether `caller` may perform `operation` under `rules`.
    ///
    /// With no effective rule the decision is [`Decision::Allow`].
    pub fn authorize(caller: &Caller, rules: &GrantRuleSet, operation: &str) -> GrantOutcome {
        let grants = EffectiveGrantMap::for_caller(caller);
        let decision = match rules.effective_rule(operation) {
            Some(rule) => Self::resolve(&grants, &rule),
            None => Decision::Allow,
        };

        if !decision.is_allowed() {
            debug!(user = %caller.user_id, operation, "Grant check denied");
        }

        GrantOutcome { decision, grants }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roles::RoleAssignment;

    #[test]
    fn test_disabled_grant_confers_nothing() {
        let roles = [Role::new("r").with_disabled_grant("payroll", AccessLevel::Delete)];
        let grants = EffectiveGrantMap::compute(&roles);

        assert_eq!(
            grants.get("payroll"),
            Some(&GrantEntry {
                level: AccessLevel::None,
                enabled: false
            })
        );
        assert_eq!(grants.level("payroll"), None);
        assert!(!grants.satisfies(&GrantRule::new("payroll", AccessLevel::None)));
    }

    #[test]
    fn test_disabled_grant_does_not_mask_enabled_one() {
        let roles = [
            Role::new("a").with_disabled_grant("payroll", AccessLevel::Delete),
            Role::new("b").with_grant("payroll", AccessLevel::View),
        ];
        let grants = EffectiveGrantMap::compute(&roles);
        assert_eq!(grants.level("payroll"), Some(AccessLevel::View));
    }

    #[test]
    fn test_aggregation_is_order_independent() {
        let a = Role::new("a").with_grant("billing", AccessLevel::Create);
        let b = Role::new("b").with_grant("billing", AccessLevel::View);

        assert_eq!(
            EffectiveGrantMap::compute([&a, &b]),
            EffectiveGrantMap::compute([&b, &a])
        );
    }

    #[test]
    fn test_resolve_levels() {
        let roles = [Role::new("r").with_grant("billing", AccessLevel::Edit)];
        let grants = EffectiveGrantMap::compute(&roles);

        assert!(GrantResolver::resolve(&grants, &GrantRule::new("billing", AccessLevel::View)).is_allowed());
        assert!(GrantResolver::resolve(&grants, &GrantRule::new("billing", AccessLevel::Edit)).is_allowed());
        assert!(!GrantResolver::resolve(&grants, &GrantRule::new("billing", AccessLevel::Create)).is_allowed());
        assert!(!GrantResolver::resolve(&grants, &GrantRule::new("payroll", AccessLevel::View)).is_allowed());
    }

    #[test]
    fn test_no_rule_allows() {
        let outcome = GrantResolver::authorize(&Caller::new("u"), &GrantRuleSet::new(), "list");
        assert_eq!(outcome.decision, Decision::Allow);
        assert!(outcome.grants.is_empty());
    }

    #[test]
    fn test_authorize_respects_tenant_scope() {
        let caller = Caller::new("u").in_tenant("south").with_assignment(RoleAssignment::scoped(
            Role::new("nurse").with_grant("resident", AccessLevel::Edit),
            "north",
        ));
        let rules = GrantRuleSet::new().with_grant("resident", AccessLevel::View);

        assert_eq!(
            GrantResolver::authorize(&caller, &rules, "list").decision,
            Decision::Deny
        );
        let caller = caller.in_tenant("north");
        assert_eq!(
            GrantResolver::authorize(&caller, &rules, "list").decision,
            Decision::Allow
        );
    }
}
