//! Declarative authorization for facility back-end endpoints.
//!
//! Two independent resolvers decide whether a caller may invoke an endpoint
//! operation:
//!
//! - [`GrantResolver`] - level-based: the caller must hold a capability at or
//!   above the level the endpoint's [`GrantRuleSet`] requires. Grants from
//!   all of a caller's roles are aggregated, highest level wins.
//! - [`PermissionResolver`] - flat: the caller must hold every permission
//!   name the endpoint requires.
//!
//! Both yield a [`Decision`]. A denial surfaces as the opaque [`Forbidden`],
//! which names neither the capability nor the level involved.
//!
//! Role data comes from a [`RoleStore`]; the resolvers never write to it.
//!
//! # Example
//!
//! ```
//! use facility_access::{
//!     AccessLevel, Caller, GrantResolver, GrantRuleSet, Role, RoleAssignment,
//! };
//!
//! let rules = GrantRuleSet::new()
//!     .with_grant("billing", AccessLevel::View)
//!     .with_operation_grant("void", "billing", AccessLevel::Delete);
//!
//! let caller = Caller::new("u-42")
//!     .with_assignment(RoleAssignment::global(
//!         Role::new("clerk").with_grant("billing", AccessLevel::Edit),
//!     ));
//!
//! assert!(GrantResolver::authorize(&caller, &rules, "list").decision.is_allowed());
//! assert!(GrantResolver::authorize(&caller, &rules, "void").decision.into_result().is_err());
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod decision;
pub mod error;
pub mod grants;
pub mod level;
pub mod permissions;
pub mod roles;
pub mod rules;
pub mod store;
pub mod tenant;

pub use decision::Decision;
pub use error::{Forbidden, RoleStoreError, RuleError};
pub use grants::{EffectiveGrantMap, GrantEntry, GrantOutcome, GrantResolver};
pub use level::AccessLevel;
pub use permissions::{FlatCapabilitySet, PermissionResolver};
pub use roles::{Caller, Role, RoleAssignment, RoleGrant};
pub use rules::{GrantRule, GrantRuleSet};
pub use store::{InMemoryRoleStore, RoleStore};
pub use tenant::TenantId;
