//! Role store abstraction.
//!
//! The authorization core only reads role data. [`RoleStore`] is the seam to
//! whatever holds users' role assignments; [`InMemoryRoleStore`] serves tests
//! and statically configured deployments.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;
use tracing::debug;

use crate::error::RoleStoreError;
use crate::roles::{Role, RoleAssignment};
use crate::tenant::TenantId;

/// Read-only source of role assignments.
#[async_trait]
pub trait RoleStore: Send + Sync {
    /// Returns every assignment held by `user_id`, in any tenant.
    ///
    /// An unknown user has no assignments.
    async fn assignments(&self, user_id: &str) -> Result<Vec<RoleAssignment>, RoleStoreError>;
}

#[derive(Debug, Clone)]
struct AssignmentRecord {
    role: String,
    tenant: Option<TenantId>,
}

/// A role store held in memory.
///
/// # Examples
///
/// ```
/// use facility_access::{AccessLevel, InMemoryRoleStore, Role, RoleStore};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let store = InMemoryRoleStore::new()
///     .with_role(Role::new("clerk").with_grant("billing", AccessLevel::View));
/// store.assign("u-1", "clerk", None).unwrap();
///
/// let assignments = store.assignments("u-1").await.unwrap();
/// assert_eq!(assignments[0].role.name, "clerk");
/// # }
/// ```
#[derive(Debug, Default)]
pub struct InMemoryRoleStore {
    roles: HashMap<String, Role>,
    assignments: RwLock<HashMap<String, Vec<AssignmentRecord>>>,
}

impl InMemoryRoleStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a role definition, replacing any role of the same name.
    pub fn with_role(mut self, role: Role) -> Self {
        self.roles.insert(role.name.clone(), role);
        self
    }

    /// Assigns a registered role to a user.
    pub fn assign(
        &self,
        user_id: impl Into<String>,
        role: &str,
        tenant: Option<TenantId>,
    ) -> Result<(), RoleStoreError> {
        if !self.roles.contains_key(role) {
            return Err(RoleStoreError::UnknownRole {
                role: role.to_string(),
            });
        }

        self.assignments
            .write()
            .entry(user_id.into())
            .or_default()
            .push(AssignmentRecord {
                role: role.to_string(),
                tenant,
            });
        Ok(())
    }

    /// Removes every assignment of a user.
    pub fn revoke_all(&self, user_id: &str) {
        self.assignments.write().remove(user_id);
    }

    /// Returns the number of registered roles.
    pub fn role_count(&self) -> usize {
        self.roles.len()
    }
}

#[async_trait]
impl RoleStore for InMemoryRoleStore {
    async fn assignments(&self, user_id: &str) -> Result<Vec<RoleAssignment>, RoleStoreError> {
        let guard = self.assignments.read();
        let Some(records) = guard.get(user_id) else {
            debug!(user = user_id, "No role assignments for user");
            return Ok(Vec::new());
        };

        records
            .iter()
            .map(|record| -> Result<RoleAssignment, RoleStoreError> {
                let role = self.roles.get(&record.role).ok_or_else(|| {
                    RoleStoreError::UnknownRole {
                        role: record.role.clone(),
                    }
                })?;
                Ok(RoleAssignment {
                    role: role.clone(),
                    tenant: record.tenant.clone(),
                })
            })
            .collect()
    }
}
