//! Authorization decisions.

use serde::Serialize;

use crate::error::Forbidden;

/// The outcome of an authorization check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    /// The request may proceed.
    Allow,
    /// The request is refused.
    Deny,
}

impl Decision {
    /// Converts a boolean check into a decision.
    pub fn from_bool(allowed: bool) -> Self {
        if allowed { Decision::Allow } else { Decision::Deny }
    }

    /// Returns `true` for [`Decision::Allow`].
    pub fn is_allowed(self) -> bool {
        self == Decision::Allow
    }

    /// Combines two decisions; both must allow.
    pub fn and(self, other: Decision) -> Decision {
        Decision::from_bool(self.is_allowed() && other.is_allowed())
    }

    /// Converts the decision into a result carrying the opaque [`Forbidden`].
    pub fn into_result(self) -> Result<(), Forbidden> {
        match self {
            Decision::Allow => Ok(()),
            Decision::Deny => Err(Forbidden),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_and() {
        assert_eq!(Decision::Allow.and(Decision::Allow), Decision::Allow);
        assert_eq!(Decision::Allow.and(Decision::Deny), Decision::Deny);
        assert_eq!(Decision::Deny.and(Decision::Allow), Decision::Deny);
    }

    #[test]
    fn test_into_result() {
        assert!(Decision::Allow.into_result().is_ok());
        assert_eq!(Decision::Deny.into_result(), Err(Forbidden));
    }
}
