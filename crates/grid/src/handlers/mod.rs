//! Type-specific predicate handlers.
//!
//! Each handler knows how to turn its typed filter into a [`SqlFragment`]
//! against a catalogue storage reference.
//!
//! [`SqlFragment`]: crate::sql::SqlFragment

mod date;
mod enumeration;
mod number;
mod text;

pub use date::DateHandler;
pub use enumeration::EnumHandler;
pub use number::NumberHandler;
pub use text::TextHandler;

use crate::filter::FieldFilter;
use crate::sql::{ParamBinder, SqlFragment};

/// Dispatches `filter` to the handler for its type.
pub fn build_predicate(column: &str, filter: &FieldFilter, binder: &mut ParamBinder) -> SqlFragment {
    match filter {
        FieldFilter::Text(f) => TextHandler::build_sql(column, f, binder),
        FieldFilter::Number(f) => NumberHandler::build_sql(column, f, binder),
        FieldFilter::Date(f) => DateHandler::build_sql(column, f, binder),
        FieldFilter::Enum(f) => EnumHandler::build_sql(column, f, binder),
    }
}
