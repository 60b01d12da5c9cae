//! Date predicate handler.

use chrono::NaiveDateTime;

use crate::filter::{DateComparator, DateFilter};
use crate::sql::{ParamBinder, SqlFragment, SqlParam};

/// Handles date predicate generation.
pub struct DateHandler;

impl DateHandler {
    /// Builds SQL for a date filter.
    ///
    /// Operands are bound as date/time values; the persistence layer decides
    /// how they are rendered for its column type.
    pub fn build_sql(column: &str, filter: &DateFilter, binder: &mut ParamBinder) -> SqlFragment {
        match filter {
            DateFilter::Compare { comparator, value } => {
                let (operator, tag) = match comparator {
                    DateComparator::Equals => ("=", "eq"),
                    DateComparator::OnOrBefore => ("<=", "le"),
                    DateComparator::OnOrAfter => (">=", "ge"),
                };
                SqlFragment::comparison(column, operator, binder.bind(tag, SqlParam::timestamp(*value)))
            }
            DateFilter::Between { from, to } => Self::build_range(column, *from, *to, binder),
        }
    }

    fn build_range(
        column: &str,
        from: NaiveDateTime,
        to: NaiveDateTime,
        binder: &mut ParamBinder,
    ) -> SqlFragment {
        SqlFragment::all(vec![
            SqlFragment::comparison(column, ">=", binder.bind("from", SqlParam::timestamp(from))),
            SqlFragment::comparison(column, "<=", binder.bind("to", SqlParam::timestamp(to))),
        ])
    }
}
