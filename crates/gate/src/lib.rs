//! # facility-gate - Endpoint Authorization and Grid Dispatch
//!
//! This crate glues [`facility_access`] and [`facility_grid`] together: it
//! loads a declarations document once at startup, builds an immutable
//! [`EndpointRegistry`], and routes every grid request through a
//! [`RequestGate`] that authorizes before it compiles.
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use facility_access::{AccessLevel, Caller, Role, RoleAssignment};
//! use facility_gate::{Declarations, EndpointRegistry, GateError, RequestGate};
//! use serde_json::json;
//!
//! let declarations = Declarations::from_json(&json!({
//!     "entities": {
//!         "resident": [
//!             {"name": "name", "type": "text", "sortable": true, "filterable": true,
//!              "storage_ref": "r.name"}
//!         ]
//!     },
//!     "endpoints": {
//!         "residents": {"entity": "resident", "grant": {"capability": "resident", "level": "view"}}
//!     }
//! }).to_string())
//! .unwrap();
//!
//! let gate = RequestGate::new(Arc::new(EndpointRegistry::build(&declarations).unwrap()));
//!
//! let nurse = Caller::new("u-1").with_assignment(RoleAssignment::global(
//!     Role::new("nurse").with_grant("resident", AccessLevel::Edit),
//! ));
//! let plan = gate
//!     .handle("residents", "list", &nurse, &json!({"sort": {"name": "asc"}}))
//!     .unwrap();
//! assert_eq!(plan.order_by_clause().unwrap(), "r.name ASC");
//!
//! let visitor = Caller::new("u-2");
//! assert_eq!(
//!     gate.handle("residents", "list", &visitor, &json!({})),
//!     Err(GateError::Forbidden)
//! );
//! ```
//!
//! ## Configuration
//!
//! See [`GateConfig`] for the supported environment variables.

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod config;
pub mod declarations;
pub mod error;
pub mod gate;
pub mod registry;

pub use config::GateConfig;
pub use declarations::{AssignmentDeclaration, Declarations, EndpointDeclaration};
pub use error::{DeclarationError, GateError, GateResult};
pub use gate::RequestGate;
pub use registry::{Endpoint, EndpointRegistry};

/// Initializes the tracing subscriber for logging.
///
/// `RUST_LOG` takes precedence when set. This should be called once at
/// application startup.
///
/// # Arguments
///
/// * `level` - The log level (error, warn, info, debug, trace)
pub fn init_logging(level: &str) {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "facility_gate={level},facility_grid={level},facility_access={level}"
        ))
    });

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}
