//! Error types for catalogue construction and grid query compilation.
//!
//! Only two conditions ever surface as errors from this crate:
//!
//! - [`CatalogueBuildError`] - raised while building a [`FieldCatalogue`](crate::FieldCatalogue)
//!   at startup. These are fatal and should halt initialization.
//! - [`GridError::InvalidFilterShape`] - raised when the raw request parameters
//!   are structurally malformed.
//!
//! Unknown, non-sortable or non-filterable fields and inapplicable values are
//! never errors; the compiler skips them.

// Error enum variant fields are self-documenting via their #[error(...)] messages
#![allow(missing_docs)]

use thiserror::Error;

/// The error type for grid operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GridError {
    /// The raw sort/filter input has a shape no client could legitimately send.
    #[error("invalid filter shape: {message}")]
    InvalidFilterShape { message: String },

    /// Catalogue construction failed.
    #[error(transparent)]
    Catalogue(#[from] CatalogueBuildError),
}

impl GridError {
    /// Creates an [`GridError::InvalidFilterShape`] with the given message.
    pub fn invalid_shape(message: impl Into<String>) -> Self {
        GridError::InvalidFilterShape {
            message: message.into(),
        }
    }
}

/// Errors raised while building a field catalogue.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CatalogueBuildError {
    /// Two declarations share a name (compared case-insensitively).
    #[error("duplicate field '{name}' in catalogue for {entity}")]
    DuplicateField { entity: String, name: String },

    /// A declaration has an empty or whitespace-only name.
    #[error("field declaration with empty name in catalogue for {entity}")]
    EmptyName { entity: String },

    /// The storage reference is not a dotted SQL identifier.
    #[error("invalid storage reference '{storage_ref}' for field '{name}'")]
    InvalidStorageRef { name: String, storage_ref: String },

    /// The named enum value source could not be resolved.
    #[error("enum source '{source_name}' for field '{name}' could not be resolved: {message}")]
    EnumSource {
        name: String,
        source_name: String,
        message: String,
    },
}

/// Result type for grid operations.
pub type GridResult<T> = Result<T, GridError>;
