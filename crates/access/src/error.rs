//! Error types for authorization.
//!
//! Denials are deliberately uninformative: [`Forbidden`] carries no
//! capability name, level or rule, so callers cannot probe which internal
//! capability an endpoint requires.

// Error enum variant fields are self-documenting via their #[error(...)] messages
#![allow(missing_docs)]

use thiserror::Error;

/// The single, opaque denial outcome.
#[derive(Error, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[error("forbidden")]
pub struct Forbidden;

/// Errors from a [`RoleStore`](crate::RoleStore).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RoleStoreError {
    /// An assignment references a role the store does not know.
    #[error("unknown role: {role}")]
    UnknownRole { role: String },

    /// The backing store could not be reached.
    #[error("role store unavailable: {message}")]
    Unavailable { message: String },
}

/// Errors in static rule declarations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RuleError {
    /// The access level name or rank is not recognised.
    #[error("unknown access level: {value}")]
    UnknownLevel { value: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forbidden_carries_no_detail() {
        assert_eq!(Forbidden.to_string(), "forbidden");
        assert_eq!(format!("{:?}", Forbidden), "Forbidden");
    }

    #[test]
    fn test_role_store_error_display() {
        let err = RoleStoreError::UnknownRole {
            role: "nurse".to_string(),
        };
        assert_eq!(err.to_string(), "unknown role: nurse");
    }
}
