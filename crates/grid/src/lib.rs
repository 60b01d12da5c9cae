//! Facility grid query engine.
//!
//! This crate turns a per-entity declarative field catalogue plus untrusted,
//! client-supplied pagination/sort/filter parameters into a safe,
//! parameterised query plan for the persistence layer.
//!
//! # Architecture
//!
//! - [`catalogue`] - [`FieldCatalogue`], built once at startup from [`FieldDeclaration`]s
//! - [`params`] - structural parse of raw request parameters into [`GridParams`]
//! - [`filter`] - typed per-field filters ([`FieldFilter`])
//! - [`handlers`] - SQL predicate generation per semantic type
//! - [`sql`] - [`SqlFragment`] and named bound parameters
//! - [`compiler`] - [`QueryCompiler`] and [`QueryPlan`]
//! - [`error`] - error types
//!
//! # Injection safety
//!
//! Identifiers in generated SQL come only from catalogue storage references,
//! which are declared by the application and validated at build time. Client
//! values are always carried as bound parameters, including the wildcards of
//! substring matches.
//!
//! # Quick Start
//!
//! ```
//! use facility_grid::{
//!     FieldCatalogue, FieldDeclaration, QueryCompiler, SqlParam, StaticEnumSource,
//! };
//! use serde_json::json;
//!
//! let enums = StaticEnumSource::new()
//!     .with_table("resident.status", [(0, "Active"), (1, "On leave"), (2, "Discharged")]);
//!
//! let catalogue = FieldCatalogue::build(
//!     "resident",
//!     vec![
//!         FieldDeclaration::text("name").sortable().filterable().storage("r.name"),
//!         FieldDeclaration::enumeration("status", "resident.status")
//!             .filterable()
//!             .storage("r.status"),
//!     ],
//!     &enums,
//! )
//! .unwrap();
//!
//! let plan = QueryCompiler::new()
//!     .compile(&catalogue, &json!({
//!         "per_page": 25,
//!         "sort": {"name": "desc"},
//!         "filter": {"status": {"c": 0, "v": [0, 2]}}
//!     }))
//!     .unwrap();
//!
//! assert_eq!(plan.limit, 25);
//! assert_eq!(
//!     plan.where_clause().unwrap(),
//!     "((r.status = :p1_enum OR r.status = :p2_enum))"
//! );
//! let values: Vec<_> = plan.parameters().map(|p| p.value.clone()).collect();
//! assert_eq!(values, vec![SqlParam::Integer(0), SqlParam::Integer(2)]);
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod catalogue;
pub mod compiler;
pub mod error;
pub mod filter;
pub mod handlers;
pub mod params;
pub mod sql;

pub use catalogue::{
    EnumValueSource, EnumValues, FieldCatalogue, FieldDeclaration, FieldDescriptor,
    NoEnumSources, SemanticType, StaticEnumSource,
};
pub use compiler::{
    DEFAULT_PER_PAGE, MAX_OFFSET, OrderClause, QueryCompiler, QueryPlan, SortDirection,
};
pub use error::{CatalogueBuildError, GridError, GridResult};
pub use filter::FieldFilter;
pub use params::{FilterClause, FilterEntry, GridParams, SortEntry};
pub use sql::{BoundParam, ParamBinder, SqlFragment, SqlParam};
