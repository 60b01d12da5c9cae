//! Enum predicate handler.

use crate::filter::EnumFilter;
use crate::sql::{ParamBinder, SqlFragment, SqlParam};

/// Handles enum predicate generation.
pub struct EnumHandler;

impl EnumHandler {
    /// Builds an OR-group of equality predicates, one per selected index.
    ///
    /// Only indices are compared; labels never reach the query.
    pub fn build_sql(column: &str, filter: &EnumFilter, binder: &mut ParamBinder) -> SqlFragment {
        SqlFragment::any(
            filter
                .selected
                .iter()
                .map(|index| {
                    SqlFragment::comparison(column, "=", binder.bind("enum", SqlParam::integer(*index)))
                })
                .collect(),
        )
    }
}
