//! The declarations document.
//!
//! One JSON document describes everything the gate needs at startup:
//!
//! ```json
//! {
//!   "enum_sources": { "resident.status": [[0, "Active"], [1, "Discharged"]] },
//!   "entities": {
//!     "resident": [
//!       { "name": "name", "type": "text", "sortable": true, "filterable": true,
//!         "storage_ref": "r.name" }
//!     ]
//!   },
//!   "endpoints": {
//!     "resident-grid": {
//!       "entity": "resident",
//!       "grant": { "capability": "resident", "level": "view" }
//!     }
//!   },
//!   "roles": [ { "name": "nurse", "grants": [ { "capability": "resident", "level": "edit" } ] } ],
//!   "assignments": [ { "user": "u-1", "role": "nurse", "tenant": "north" } ]
//! }
//! ```
//!
//! `roles` and `assignments` are optional and only feed the in-memory role
//! store used by the command-line driver.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use facility_access::{GrantRuleSet, InMemoryRoleStore, Role, TenantId};
use facility_grid::{FieldDeclaration, StaticEnumSource};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::DeclarationError;

/// An endpoint: the entity it lists plus its authorization rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointDeclaration {
    /// Entity whose catalogue the endpoint queries.
    pub entity: String,
    /// Grant and permission rules.
    #[serde(flatten)]
    pub rules: GrantRuleSet,
}

/// A user's role assignment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignmentDeclaration {
    /// User identifier.
    pub user: String,
    /// Role name.
    pub role: String,
    /// Tenant scope; omitted for global assignments.
    #[serde(default)]
    pub tenant: Option<TenantId>,
}

/// The parsed declarations document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Declarations {
    /// Enum value tables, by source name.
    #[serde(default)]
    pub enum_sources: StaticEnumSource,

    /// Field declarations, by entity.
    #[serde(default)]
    pub entities: BTreeMap<String, Vec<FieldDeclaration>>,

    /// Endpoints, by name.
    #[serde(default)]
    pub endpoints: BTreeMap<String, EndpointDeclaration>,

    /// Role definitions.
    #[serde(default)]
    pub roles: Vec<Role>,

    /// Role assignments.
    #[serde(default)]
    pub assignments: Vec<AssignmentDeclaration>,
}

impl Declarations {
    /// Parses a declarations document.
    pub fn from_json(json: &str) -> Result<Self, DeclarationError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads and parses a declarations file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, DeclarationError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| DeclarationError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let declarations = Self::from_json(&contents)?;
        debug!(
            path = %path.display(),
            entities = declarations.entities.len(),
            endpoints = declarations.endpoints.len(),
            "Loaded declarations"
        );
        Ok(declarations)
    }

    /// Builds an in-memory role store from the declared roles and assignments.
    pub fn role_store(&self) -> Result<InMemoryRoleStore, DeclarationError> {
        let store = self
            .roles
            .iter()
            .cloned()
            .fold(InMemoryRoleStore::new(), InMemoryRoleStore::with_role);

        for assignment in &self.assignments {
            store.assign(
                assignment.user.clone(),
                &assignment.role,
                assignment.tenant.clone(),
            )?;
        }
        Ok(store)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use facility_access::{AccessLevel, GrantRule, RoleStore};
    use facility_grid::{EnumValueSource, SemanticType};
    use serde_json::json;

    fn sample() -> String {
        json!({
            "enum_sources": {"resident.status": [[0, "Active"], [1, "Discharged"]]},
            "entities": {
                "resident": [
                    {"name": "name", "type": "text", "sortable": true, "filterable": true, "storage_ref": "r.name"},
                    {"name": "status", "type": "enum", "filterable": true, "storage_ref": "r.status", "enum_source": "resident.status"}
                ]
            },
            "endpoints": {
                "resident-grid": {
                    "entity": "resident",
                    "grant": {"capability": "resident", "level": "view"},
                    "operation_permissions": {"export": ["residents.export"]}
                }
            },
            "roles": [{"name": "nurse", "grants": [{"capability": "resident", "level": "edit"}]}],
            "assignments": [{"user": "u-1", "role": "nurse", "tenant": "north"}]
        })
        .to_string()
    }

    #[test]
    fn test_parse_document() {
        let declarations = Declarations::from_json(&sample()).unwrap();

        let fields = &declarations.entities["resident"];
        assert_eq!(fields[1].semantic_type, SemanticType::Enum);
        assert_eq!(declarations.enum_sources.values("resident.status").unwrap().len(), 2);

        let endpoint = &declarations.endpoints["resident-grid"];
        assert_eq!(endpoint.entity, "resident");
        assert_eq!(
            endpoint.rules.effective_rule("list"),
            Some(GrantRule::new("resident", AccessLevel::View))
        );
        assert!(endpoint.rules.required_permissions("export").contains("residents.export"));
    }

    #[test]
    fn test_empty_document() {
        let declarations = Declarations::from_json("{}").unwrap();
        assert!(declarations.entities.is_empty());
        assert!(declarations.endpoints.is_empty());
    }

    #[test]
    fn test_malformed_document() {
        let err = Declarations::from_json(r#"{"entities": 3}"#).unwrap_err();
        assert!(matches!(err, DeclarationError::Json(_)));
    }

    #[tokio::test]
    async fn test_role_store() {
        let store = Declarations::from_json(&sample()).unwrap().role_store().unwrap();
        let assignments = store.assignments("u-1").await.unwrap();
        assert_eq!(assignments.len(), 1);
        assert_eq!(assignments[0].tenant, Some(TenantId::new("north")));
    }

    #[test]
    fn test_assignment_to_undeclared_role_fails() {
        let declarations = Declarations {
            assignments: vec![AssignmentDeclaration {
                user: "u-1".to_string(),
                role: "ghost".to_string(),
                tenant: None,
            }],
            ..Default::default()
        };
        assert!(matches!(
            declarations.role_store(),
            Err(DeclarationError::RoleAssignment(_))
        ));
    }
}
