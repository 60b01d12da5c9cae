//! Error types for the request gate.
//!
//! # Error Mapping
//!
//! | Gate Error | HTTP Status |
//! |------------|-------------|
//! | Forbidden | 403 |
//! | InvalidRequest | 400 |
//! | UnknownEndpoint | 404 |
//! | RoleStore (unavailable) | 503 |
//! | RoleStore (other) | 500 |
//!
//! A [`GateError::Forbidden`] response body is always the bare word
//! `forbidden`; nothing about the rule that failed is carried.

// Error enum variant fields are self-documenting via their #[error(...)] messages
#![allow(missing_docs)]

use std::io;
use std::path::PathBuf;

use facility_access::{Forbidden, RoleStoreError};
use facility_grid::{CatalogueBuildError, GridError};
use http::StatusCode;
use thiserror::Error;

/// Errors returned while handling one request.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GateError {
    /// The caller may not invoke the operation.
    #[error("forbidden")]
    Forbidden,

    /// The grid parameters are structurally malformed.
    #[error("invalid request: {0}")]
    InvalidRequest(#[from] GridError),

    /// No endpoint is registered under this name.
    #[error("unknown endpoint: {endpoint}")]
    UnknownEndpoint { endpoint: String },

    /// The caller's roles could not be loaded.
    #[error(transparent)]
    RoleStore(#[from] RoleStoreError),
}

impl From<Forbidden> for GateError {
    fn from(_: Forbidden) -> Self {
        GateError::Forbidden
    }
}

impl GateError {
    /// Returns the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            GateError::Forbidden => StatusCode::FORBIDDEN,
            GateError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            GateError::UnknownEndpoint { .. } => StatusCode::NOT_FOUND,
            GateError::RoleStore(RoleStoreError::Unavailable { .. }) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            GateError::RoleStore(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns `true` for authorization failures.
    pub fn is_forbidden(&self) -> bool {
        matches!(self, GateError::Forbidden)
    }
}

/// Errors raised while loading declarations and building the registry.
#[derive(Error, Debug)]
pub enum DeclarationError {
    /// The declarations file could not be read.
    #[error("failed to read declarations from {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The declarations document is not valid JSON for its schema.
    #[error("invalid declarations document: {0}")]
    Json(#[from] serde_json::Error),

    /// A field catalogue failed to build.
    #[error("catalogue for entity '{entity}' failed to build: {source}")]
    Catalogue {
        entity: String,
        #[source]
        source: CatalogueBuildError,
    },

    /// An endpoint references an entity with no catalogue.
    #[error("endpoint '{endpoint}' references unknown entity '{entity}'")]
    UnknownEntity { endpoint: String, entity: String },

    /// A role assignment could not be registered.
    #[error("invalid role assignment: {0}")]
    RoleAssignment(#[from] RoleStoreError),
}

/// Result type for request handling.
pub type GateResult<T> = Result<T, GateError>;
