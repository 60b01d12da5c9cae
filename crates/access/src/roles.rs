//! Roles, role assignments and the authenticated caller.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::error::RoleStoreError;
use crate::level::AccessLevel;
use crate::store::RoleStore;
use crate::tenant::TenantId;

fn enabled_by_default() -> bool {
    true
}

/// A grant carried by a role.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RoleGrant {
    /// Capability name.
    pub capability: String,
    /// Level granted.
    pub level: AccessLevel,
    /// Disabled grants are recorded but confer no access.
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
}

impl RoleGrant {
    /// Creates an enabled grant.
    pub fn new(capability: impl Into<String>, level: AccessLevel) -> Self {
        Self {
            capability: capability.into(),
            level,
            enabled: true,
        }
    }

    /// Creates a disabled grant.
    pub fn disabled(capability: impl Into<String>, level: AccessLevel) -> Self {
        Self {
            enabled: false,
            ..Self::new(capability, level)
        }
    }
}

/// A named bundle of grants and flat permissions.
///
/// # Examples
///
/// ```
/// use facility_access::{AccessLevel, Role};
///
/// let role = Role::new("billing-clerk")
///     .with_grant("billing", AccessLevel::Edit)
///     .with_permission("invoices.export");
///
/// assert_eq!(role.grants.len(), 1);
/// assert!(role.permissions.contains("invoices.export"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    /// Role name.
    pub name: String,
    /// Capability grants.
    #[serde(default)]
    pub grants: Vec<RoleGrant>,
    /// Flat permission names.
    #[serde(default)]
    pub permissions: BTreeSet<String>,
}

impl Role {
    /// Creates a role with no grants or permissions.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            grants: Vec::new(),
            permissions: BTreeSet::new(),
        }
    }

    /// Adds an enabled grant.
    pub fn with_grant(mut self, capability: impl Into<String>, level: AccessLevel) -> Self {
        self.grants.push(RoleGrant::new(capability, level));
        self
    }

    /// Adds a disabled grant.
    pub fn with_disabled_grant(mut self, capability: impl Into<String>, level: AccessLevel) -> Self {
        self.grants.push(RoleGrant::disabled(capability, level));
        self
    }

    /// Adds a flat permission.
    pub fn with_permission(mut self, permission: impl Into<String>) -> Self {
        self.permissions.insert(permission.into());
        self
    }
}

/// A role held by a user, globally or within one tenant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleAssignment {
    /// The assigned role.
    pub role: Role,
    /// Tenant scope; `None` means the assignment applies everywhere.
    #[serde(default)]
    pub tenant: Option<TenantId>,
}

impl RoleAssignment {
    /// Creates a global assignment.
    pub fn global(role: Role) -> Self {
        Self { role, tenant: None }
    }

    /// Creates an assignment scoped to `tenant`.
    pub fn scoped(role: Role, tenant: impl Into<TenantId>) -> Self {
        Self {
            role,
            tenant: Some(tenant.into()),
        }
    }

    /// Returns `true` if this assignment applies in the given tenant context.
    pub fn applies_in(&self, tenant: Option<&TenantId>) -> bool {
        match &self.tenant {
            None => true,
            Some(scope) => tenant == Some(scope),
        }
    }
}

/// The authenticated principal of a request.
///
/// # Examples
///
/// ```
/// use facility_access::{Caller, Role, RoleAssignment};
///
/// let caller = Caller::new("u-17")
///     .in_tenant("north")
///     .with_assignment(RoleAssignment::global(Role::new("staff")))
///     .with_assignment(RoleAssignment::scoped(Role::new("charge-nurse"), "north"))
///     .with_assignment(RoleAssignment::scoped(Role::new("charge-nurse"), "south"));
///
/// assert_eq!(caller.roles().count(), 2);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Caller {
    /// User identifier.
    pub user_id: String,
    /// Tenant context of the request, if any.
    #[serde(default)]
    pub tenant: Option<TenantId>,
    /// All role assignments held by the user.
    #[serde(default)]
    pub assignments: Vec<RoleAssignment>,
}

impl Caller {
    /// Creates a caller with no assignments and no tenant context.
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            tenant: None,
            assignments: Vec::new(),
        }
    }

    /// Loads the caller's assignments from a role store.
    pub async fn load(
        store: &dyn RoleStore,
        user_id: impl Into<String>,
        tenant: Option<TenantId>,
    ) -> Result<Self, RoleStoreError> {
        let user_id = user_id.into();
        let assignments = store.assignments(&user_id).await?;
        Ok(Self {
            user_id,
            tenant,
            assignments,
        })
    }

    /// Sets the tenant context.
    pub fn in_tenant(mut self, tenant: impl Into<TenantId>) -> Self {
        self.tenant = Some(tenant.into());
        self
    }

    /// Adds an assignment.
    pub fn with_assignment(mut self, assignment: RoleAssignment) -> Self {
        self.assignments.push(assignment);
        self
    }

    /// Iterates over the roles that apply in the caller's tenant context.
    ///
    /// Global assignments always apply; tenant-scoped ones only when the
    /// request is made in that tenant.
    pub fn roles(&self) -> impl Iterator<Item = &Role> {
        self.assignments
            .iter()
            .filter(|a| a.applies_in(self.tenant.as_ref()))
            .map(|a| &a.role)
    }
}
