//! Tenant identifiers for scoping role assignments.

use std::fmt;

use serde::{Deserialize, Serialize};

/// An opaque tenant identifier.
///
/// Role assignments may be global or scoped to one tenant; a request made in
/// a tenant's context sees the global assignments plus that tenant's.
///
/// # Examples
///
/// ```
/// use facility_access::TenantId;
///
/// let tenant = TenantId::new("north-wing");
/// assert_eq!(tenant.as_str(), "north-wing");
/// assert_eq!(tenant.to_string(), "north-wing");
/// ```
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TenantId(String);

impl TenantId {
    /// Creates a tenant ID.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the tenant ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for TenantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TenantId({:?})", self.0)
    }
}

impl fmt::Display for TenantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TenantId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for TenantId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl AsRef<str> for TenantId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
