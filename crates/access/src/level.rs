//! The access-level hierarchy.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::RuleError;

/// How much access a capability grants, in ascending order.
///
/// Levels are totally ordered: a grant at a higher level satisfies any
/// requirement at a lower one.
///
/// # Examples
///
/// ```
/// use facility_access::AccessLevel;
///
/// assert!(AccessLevel::Delete > AccessLevel::Edit);
/// assert_eq!("create".parse::<AccessLevel>(), Ok(AccessLevel::Create));
/// assert_eq!("4".parse::<AccessLevel>(), Ok(AccessLevel::Delete));
/// ```
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase", try_from = "LevelRepr")]
pub enum AccessLevel {
    /// No access.
    #[default]
    None = 0,
    /// Read access.
    View = 1,
    /// Modify existing records.
    Edit = 2,
    /// Create records.
    Create = 3,
    /// Delete records.
    Delete = 4,
    /// Restore deleted records.
    Undelete = 5,
}

impl AccessLevel {
    /// All levels, lowest first.
    pub const ALL: [AccessLevel; 6] = [
        AccessLevel::None,
        AccessLevel::View,
        AccessLevel::Edit,
        AccessLevel::Create,
        AccessLevel::Delete,
        AccessLevel::Undelete,
    ];

    /// Returns the numeric rank.
    pub fn rank(self) -> u8 {
        self as u8
    }

    /// Returns the level with the given rank.
    pub fn from_rank(rank: u8) -> Option<Self> {
        Self::ALL.get(usize::from(rank)).copied()
    }

    /// Returns the lowercase level name.
    pub fn as_str(self) -> &'static str {
        match self {
            AccessLevel::None => "none",
            AccessLevel::View => "view",
            AccessLevel::Edit => "edit",
            AccessLevel::Create => "create",
            AccessLevel::Delete => "delete",
            AccessLevel::Undelete => "undelete",
        }
    }
}

impl fmt::Display for AccessLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccessLevel {
    type Err = RuleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Ok(rank) = s.parse::<u8>() {
            return Self::from_rank(rank).ok_or_else(|| RuleError::UnknownLevel {
                value: s.to_string(),
            });
        }
        Self::ALL
            .into_iter()
            .find(|level| level.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| RuleError::UnknownLevel {
                value: s.to_string(),
            })
    }
}

/// Declarations may spell a level by name or by rank.
#[derive(Deserialize)]
#[serde(untagged)]
enum LevelRepr {
    Rank(u8),
    Name(String),
}

impl TryFrom<LevelRepr> for AccessLevel {
    type Error = RuleError;

    fn try_from(repr: LevelRepr) -> Result<Self, Self::Error> {
        match repr {
            LevelRepr::Rank(rank) => Self::from_rank(rank).ok_or_else(|| RuleError::UnknownLevel {
                value: rank.to_string(),
            }),
            LevelRepr::Name(name) => name.parse(),
        }
    }
}
