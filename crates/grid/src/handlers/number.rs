//! Number predicate handler.

use crate::filter::{NumberComparator, NumberFilter, NumberValue};
use crate::sql::{ParamBinder, SqlFragment};

/// Handles number predicate generation.
pub struct NumberHandler;

impl NumberHandler {
    /// Builds SQL for a number filter.
    pub fn build_sql(column: &str, filter: &NumberFilter, binder: &mut ParamBinder) -> SqlFragment {
        match filter {
            NumberFilter::Compare { comparator, value } => {
                let (operator, tag) = match comparator {
                    NumberComparator::Equals => ("=", "eq"),
                    NumberComparator::LessThan => ("<", "lt"),
                    NumberComparator::GreaterThan => (">", "gt"),
                    NumberComparator::LessOrEqual => ("<=", "le"),
                    NumberComparator::GreaterOrEqual => (">=", "ge"),
                };
                SqlFragment::comparison(column, operator, binder.bind(tag, (*value).into()))
            }
            NumberFilter::Between { from, to } => Self::build_range(column, *from, *to, binder),
        }
    }

    /// Inclusive range, one parameter per bound.
    fn build_range(
        column: &str,
        from: NumberValue,
        to: NumberValue,
        binder: &mut ParamBinder,
    ) -> SqlFragment {
        SqlFragment::all(vec![
            SqlFragment::comparison(column, ">=", binder.bind("from", from.into())),
            SqlFragment::comparison(column, "<=", binder.bind("to", to.into())),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sql::SqlParam;

    #[test]
    fn test_number_lt() {
        let filter = NumberFilter::Compare {
            comparator: NumberComparator::LessThan,
            value: NumberValue::Integer(100),
        };
        let frag = NumberHandler::build_sql("b.amount", &filter, &mut ParamBinder::new());

        assert_eq!(frag.sql, "b.amount < :p1_lt");
        assert_eq!(frag.params.len(), 1);
    }

    #[test]
    fn test_number_ge_float() {
        let filter = NumberFilter::Compare {
            comparator: NumberComparator::GreaterOrEqual,
            value: NumberValue::Float(2.5),
        };
        let frag = NumberHandler::build_sql("b.amount", &filter, &mut ParamBinder::new());

        assert_eq!(frag.sql, "b.amount >= :p1_ge");
        assert_eq!(frag.param("p1_ge"), Some(&SqlParam::Float(2.5)));
    }

    #[test]
    fn test_number_range() {
        let filter = NumberFilter::Between {
            from: NumberValue::Integer(10),
            to: NumberValue::Integer(20),
        };
        let frag = NumberHandler::build_sql("b.amount", &filter, &mut ParamBinder::new());

        assert_eq!(frag.sql, "(b.amount >= :p1_from AND b.amount <= :p2_to)");
        assert_eq!(frag.param("p1_from"), Some(&SqlParam::Integer(10)));
        assert_eq!(frag.param("p2_to"), Some(&SqlParam::Integer(20)));
    }
}
