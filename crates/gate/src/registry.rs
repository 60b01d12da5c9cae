//! Endpoint registry.
//!
//! The registry is built once at startup from [`Declarations`] and is
//! immutable afterwards. Each entity's [`FieldCatalogue`] is built exactly
//! once and shared by every endpoint that lists that entity.

use std::collections::BTreeMap;
use std::sync::Arc;

use facility_access::GrantRuleSet;
use facility_grid::FieldCatalogue;
use tracing::info;

use crate::declarations::Declarations;
use crate::error::DeclarationError;

/// A registered endpoint.
#[derive(Debug, Clone)]
pub struct Endpoint {
    /// Endpoint name.
    pub name: String,
    /// Catalogue of the listed entity.
    pub catalogue: Arc<FieldCatalogue>,
    /// Authorization rules.
    pub rules: GrantRuleSet,
}

/// Immutable lookup of catalogues and endpoints.
#[derive(Debug, Clone, Default)]
pub struct EndpointRegistry {
    catalogues: BTreeMap<String, Arc<FieldCatalogue>>,
    endpoints: BTreeMap<String, Endpoint>,
}

impl EndpointRegistry {
    /// Builds every catalogue and endpoint.
    ///
    /// Fails on the first catalogue that does not build and on endpoints
    /// that reference an undeclared entity.
    pub fn build(declarations: &Declarations) -> Result<Self, DeclarationError> {
        let mut catalogues = BTreeMap::new();
        for (entity, fields) in &declarations.entities {
            let catalogue =
                FieldCatalogue::build(entity.clone(), fields.iter().cloned(), &declarations.enum_sources)
                    .map_err(|source| DeclarationError::Catalogue {
                        entity: entity.clone(),
                        source,
                    })?;
            catalogues.insert(entity.clone(), Arc::new(catalogue));
        }

        let mut endpoints = BTreeMap::new();
        for (name, declaration) in &declarations.endpoints {
            let catalogue = catalogues.get(&declaration.entity).cloned().ok_or_else(|| {
                DeclarationError::UnknownEntity {
                    endpoint: name.clone(),
                    entity: declaration.entity.clone(),
                }
            })?;
            endpoints.insert(
                name.clone(),
                Endpoint {
                    name: name.clone(),
                    catalogue,
                    rules: declaration.rules.clone(),
                },
            );
        }

        info!(
            entities = catalogues.len(),
            endpoints = endpoints.len(),
            "Built endpoint registry"
        );

        Ok(Self {
            catalogues,
            endpoints,
        })
    }

    /// Returns an endpoint by name.
    pub fn endpoint(&self, name: &str) -> Option<&Endpoint> {
        self.endpoints.get(name)
    }

    /// Returns an entity's catalogue.
    pub fn catalogue(&self, entity: &str) -> Option<&Arc<FieldCatalogue>> {
        self.catalogues.get(entity)
    }

    /// Iterates over endpoints in name order.
    pub fn endpoints(&self) -> impl Iterator<Item = &Endpoint> {
        self.endpoints.values()
    }

    /// Iterates over catalogues in entity order.
    pub fn catalogues(&self) -> impl Iterator<Item = &Arc<FieldCatalogue>> {
        self.catalogues.values()
    }

    /// Returns the number of endpoints.
    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    /// Returns `true` if no endpoint is registered.
    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::declarations::EndpointDeclaration;
    use facility_grid::{CatalogueBuildError, FieldDeclaration};

    fn declarations() -> Declarations {
        let mut declarations = Declarations::default();
        declarations.entities.insert(
            "resident".to_string(),
            vec![FieldDeclaration::text("name").sortable().filterable().storage("r.name")],
        );
        for name in ["resident-grid", "resident-export"] {
            declarations.endpoints.insert(
                name.to_string(),
                EndpointDeclaration {
                    entity: "resident".to_string(),
                    rules: GrantRuleSet::new(),
                },
            );
        }
        declarations
    }

    #[test]
    fn test_catalogue_shared_between_endpoints() {
        let registry = EndpointRegistry::build(&declarations()).unwrap();

        let grid = registry.endpoint("resident-grid").unwrap();
        let export = registry.endpoint("resident-export").unwrap();
        assert!(Arc::ptr_eq(&grid.catalogue, &export.catalogue));
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.catalogues().count(), 1);
    }

    #[test]
    fn test_unknown_entity_fails() {
        let mut declarations = declarations();
        declarations.endpoints.insert(
            "lead-grid".to_string(),
            EndpointDeclaration {
                entity: "lead".to_string(),
                rules: GrantRuleSet::new(),
            },
        );

        let err = EndpointRegistry::build(&declarations).unwrap_err();
        assert!(matches!(err, DeclarationError::UnknownEntity { ref entity, .. } if entity == "lead"));
    }

    #[test]
    fn test_catalogue_failure_names_entity() {
        let mut declarations = declarations();
        declarations.entities.insert(
            "lead".to_string(),
            vec![
                FieldDeclaration::text("email").storage("l.email"),
                FieldDeclaration::text("EMAIL").storage("l.email2"),
            ],
        );

        match EndpointRegistry::build(&declarations) {
            Err(DeclarationError::Catalogue { entity, source }) => {
                assert_eq!(entity, "lead");
                assert!(matches!(source, CatalogueBuildError::DuplicateField { .. }));
            }
            other => panic!("expected catalogue error, got {:?}", other),
        }
    }
}
