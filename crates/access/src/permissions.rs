//! Flat permission resolution.
//!
//! Independent of grant levels, an endpoint may require a set of plain
//! permission names. The caller must hold every one of them through the
//! roles that apply in its tenant context.

use std::collections::BTreeSet;
use std::collections::btree_set;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::decision::Decision;
use crate::roles::Caller;
use crate::rules::GrantRuleSet;

/// A set of flat permission names.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FlatCapabilitySet(BTreeSet<String>);

impl FlatCapabilitySet {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the union of permissions over the caller's applicable roles.
    pub fn for_caller(caller: &Caller) -> Self {
        caller
            .roles()
            .flat_map(|role| role.permissions.iter().cloned())
            .collect()
    }

    /// Adds a permission.
    pub fn insert(&mut self, permission: impl Into<String>) -> bool {
        self.0.insert(permission.into())
    }

    /// Returns `true` if the permission is present.
    pub fn contains(&self, permission: &str) -> bool {
        self.0.contains(permission)
    }

    /// Returns `true` if every permission in `self` is also in `other`.
    pub fn is_subset_of(&self, other: &FlatCapabilitySet) -> bool {
        self.0.is_subset(&other.0)
    }

    /// Returns the number of permissions.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if the set is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over permissions in name order.
    pub fn iter(&self) -> btree_set::Iter<'_, String> {
        self.0.iter()
    }
}

impl<S: Into<String>> FromIterator<S> for FlatCapabilitySet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

impl<'a> IntoIterator for &'a FlatCapabilitySet {
    type Item = &'a String;
    type IntoIter = btree_set::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Resolves flat permission requirements.
#[derive(Debug, Clone, Copy, Default)]
pub struct PermissionResolver;

impl PermissionResolver {
    /// Allows when `required` is a subset of `held`.
    ///
    /// An empty requirement always allows.
    pub fn resolve(held: &FlatCapabilitySet, required: &FlatCapabilitySet) -> Decision {
        Decision::from_bool(required.is_subset_of(held))
    }

    /// Decides whether `caller` holds every permission `operation` requires.
    pub fn authorize(caller: &Caller, rules: &GrantRuleSet, operation: &str) -> Decision {
        let required = rules.required_permissions(operation);
        if required.is_empty() {
            return Decision::Allow;
        }

        let decision = Self::resolve(&FlatCapabilitySet::for_caller(caller), &required);
        if !decision.is_allowed() {
            debug!(user = %caller.user_id, operation, "Permission check denied");
        }
        decision
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roles::{Role, RoleAssignment};

    #[test]
    fn test_subset_semantics() {
        let held: FlatCapabilitySet = ["a", "b", "c"].into_iter().collect();
        let required: FlatCapabilitySet = ["a", "c"].into_iter().collect();

        assert!(PermissionResolver::resolve(&held, &required).is_allowed());
        assert!(!PermissionResolver::resolve(&required, &held).is_allowed());
        assert!(PermissionResolver::resolve(&FlatCapabilitySet::new(), &FlatCapabilitySet::new()).is_allowed());
    }

    #[test]
    fn test_union_across_roles() {
        let caller = Caller::new("u")
            .with_assignment(RoleAssignment::global(Role::new("a").with_permission("residents.read")))
            .with_assignment(RoleAssignment::global(Role::new("b").with_permission("residents.export")));
        let rules = GrantRuleSet::new()
            .with_permissions(["residents.read"])
            .with_operation_permissions("export", ["residents.export"]);

        assert!(PermissionResolver::authorize(&caller, &rules, "export").is_allowed());
    }

    #[test]
    fn test_missing_one_permission_denies() {
        let caller = Caller::new("u")
            .with_assignment(RoleAssignment::global(Role::new("a").with_permission("residents.read")));
        let rules = GrantRuleSet::new().with_operation_permissions("export", ["residents.read", "residents.export"]);

        assert_eq!(PermissionResolver::authorize(&caller, &rules, "export"), Decision::Deny);
        assert_eq!(PermissionResolver::authorize(&caller, &rules, "list"), Decision::Allow);
    }
}
