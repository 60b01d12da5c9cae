//! Text predicate handler.

use crate::filter::{TextComparator, TextFilter};
use crate::sql::{ParamBinder, SqlFragment, SqlParam};

/// Handles text predicate generation.
pub struct TextHandler;

impl TextHandler {
    /// Builds SQL for a text filter.
    pub fn build_sql(column: &str, filter: &TextFilter, binder: &mut ParamBinder) -> SqlFragment {
        match filter.comparator {
            TextComparator::Equals => Self::build_equals(column, &filter.value, binder),
            TextComparator::Contains => Self::build_contains(column, &filter.value, binder),
        }
    }

    fn build_equals(column: &str, value: &str, binder: &mut ParamBinder) -> SqlFragment {
        let param = binder.bind("eq", SqlParam::string(value));
        SqlFragment::comparison(column, "=", param)
    }

    /// Substring match. The wildcards are part of the bound value.
    fn build_contains(column: &str, value: &str, binder: &mut ParamBinder) -> SqlFragment {
        let param = binder.bind("like", SqlParam::string(format!("%{}%", value)));
        SqlFragment::comparison(column, "LIKE", param)
    }
}
