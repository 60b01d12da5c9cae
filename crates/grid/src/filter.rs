//! Typed filters.
//!
//! A [`FilterClause`] carries an integer comparator code and loosely typed
//! operands. [`FieldFilter::parse`] turns it into a variant specific to the
//! field's [`SemanticType`], or discards it when the code or operands do not
//! apply. Discarding is never an error.
//!
//! | Type   | `c` | Meaning                         |
//! |--------|-----|---------------------------------|
//! | Text   | 0   | equals                          |
//! | Text   | 1   | contains (`%v%`)                |
//! | Text   | 2   | regex; disabled, ignored        |
//! | Number | 0-4 | `=`, `<`, `>`, `<=`, `>=`        |
//! | Number | 5   | inclusive range `[from, to]`    |
//! | Date   | 0-2 | `=`, `<=`, `>=`                 |
//! | Date   | 3   | inclusive range `[from, to]`    |
//! | Enum   | any | OR over selected indices        |

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde_json::Value;
use tracing::{debug, warn};

use crate::catalogue::{FieldDescriptor, SemanticType};
use crate::params::{FilterClause, coerce_int};
use crate::sql::SqlParam;

/// Comparator code of the disabled text regex comparator.
pub const TEXT_REGEX_COMPARATOR: i64 = 2;

/// Text comparators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextComparator {
    /// Exact equality.
    Equals,
    /// Substring match.
    Contains,
}

/// A text filter.
#[derive(Debug, Clone, PartialEq)]
pub struct TextFilter {
    /// The comparator.
    pub comparator: TextComparator,
    /// The operand.
    pub value: String,
}

/// Single-operand relational comparators for numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumberComparator {
    /// `=`
    Equals,
    /// `<`
    LessThan,
    /// `>`
    GreaterThan,
    /// `<=`
    LessOrEqual,
    /// `>=`
    GreaterOrEqual,
}

/// A numeric operand.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NumberValue {
    /// Integral operand.
    Integer(i64),
    /// Fractional operand.
    Float(f64),
}

impl From<NumberValue> for SqlParam {
    fn from(value: NumberValue) -> Self {
        match value {
            NumberValue::Integer(i) => SqlParam::integer(i),
            NumberValue::Float(f) => SqlParam::float(f),
        }
    }
}

/// A number filter.
#[derive(Debug, Clone, PartialEq)]
pub enum NumberFilter {
    /// Single-operand comparison.
    Compare {
        /// The comparator.
        comparator: NumberComparator,
        /// The operand.
        value: NumberValue,
    },
    /// Inclusive range.
    Between {
        /// Lower bound.
        from: NumberValue,
        /// Upper bound.
        to: NumberValue,
    },
}

/// Single-operand comparators for dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateComparator {
    /// `=`
    Equals,
    /// `<=`
    OnOrBefore,
    /// `>=`
    OnOrAfter,
}

/// A date filter.
#[derive(Debug, Clone, PartialEq)]
pub enum DateFilter {
    /// Single-operand comparison.
    Compare {
        /// The comparator.
        comparator: DateComparator,
        /// The operand.
        value: NaiveDateTime,
    },
    /// Inclusive range.
    Between {
        /// Lower bound.
        from: NaiveDateTime,
        /// Upper bound.
        to: NaiveDateTime,
    },
}

/// An enum filter: the selected index values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumFilter {
    /// Selected indices, deduplicated, in client order.
    pub selected: Vec<i64>,
}

/// A filter typed by the field's semantic type.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldFilter {
    /// Text filter.
    Text(TextFilter),
    /// Number filter.
    Number(NumberFilter),
    /// Date filter.
    Date(DateFilter),
    /// Enum filter.
    Enum(EnumFilter),
}

impl FieldFilter {
    /// Interprets `clause` against `field`.
    ///
    /// Returns `None` when the comparator code is unknown for the type, an
    /// operand is missing or unparsable, or an enum selection is empty.
    pub fn parse(field: &FieldDescriptor, clause: &FilterClause) -> Option<Self> {
        let filter = match field.semantic_type {
            SemanticType::Text => Self::parse_text(clause).map(FieldFilter::Text),
            SemanticType::Number => Self::parse_number(clause).map(FieldFilter::Number),
            SemanticType::Date => Self::parse_date(field, clause).map(FieldFilter::Date),
            SemanticType::Enum => Self::parse_enum(field, clause).map(FieldFilter::Enum),
        };

        if filter.is_none() {
            debug!(
                field = %field.name,
                comparator = clause.comparator,
                "Discarding inapplicable filter clause"
            );
        }
        filter
    }

    fn parse_text(clause: &FilterClause) -> Option<TextFilter> {
        let comparator = match clause.comparator {
            0 => TextComparator::Equals,
            1 => TextComparator::Contains,
            TEXT_REGEX_COMPARATOR => {
                debug!("Text regex comparator is disabled");
                return None;
            }
            _ => return None,
        };

        let value = match clause.operands.first()? {
            Value::String(s) => s.clone(),
            Value::Number(n) => n.to_string(),
            _ => return None,
        };

        Some(TextFilter { comparator, value })
    }

    fn parse_number(clause: &FilterClause) -> Option<NumberFilter> {
        let comparator = match clause.comparator {
            0 => NumberComparator::Equals,
            1 => NumberComparator::LessThan,
            2 => NumberComparator::GreaterThan,
            3 => NumberComparator::LessOrEqual,
            4 => NumberComparator::GreaterOrEqual,
            5 => {
                let from = parse_number(clause.operands.first()?)?;
                let to = parse_number(clause.operands.get(1)?)?;
                return Some(NumberFilter::Between { from, to });
            }
            _ => return None,
        };

        let value = parse_number(clause.operands.first()?)?;
        Some(NumberFilter::Compare { comparator, value })
    }

    fn parse_date(field: &FieldDescriptor, clause: &FilterClause) -> Option<DateFilter> {
        let parse = |value: &Value| {
            let parsed = parse_date_time(value);
            if parsed.is_none() {
                warn!(field = %field.name, "Dropping filter clause with unparsable date operand");
            }
            parsed
        };

        let comparator = match clause.comparator {
            0 => DateComparator::Equals,
            1 => DateComparator::OnOrBefore,
            2 => DateComparator::OnOrAfter,
            3 => {
                let from = parse(clause.operands.first()?)?;
                let to = parse(clause.operands.get(1)?)?;
                return Some(DateFilter::Between { from, to });
            }
            _ => return None,
        };

        let value = parse(clause.operands.first()?)?;
        Some(DateFilter::Compare { comparator, value })
    }

    fn parse_enum(field: &FieldDescriptor, clause: &FilterClause) -> Option<EnumFilter> {
        let mut selected = Vec::new();
        for index in clause.operands.iter().filter_map(coerce_int) {
            let in_domain = field
                .enum_values
                .as_ref()
                .is_none_or(|values| values.contains(index));
            if in_domain && !selected.contains(&index) {
                selected.push(index);
            }
        }

        if selected.is_empty() {
            None
        } else {
            Some(EnumFilter { selected })
        }
    }
}

fn parse_number(value: &Value) -> Option<NumberValue> {
    match value {
        Value::Number(n) => match n.as_i64() {
            Some(i) => Some(NumberValue::Integer(i)),
            None => n.as_f64().filter(|f| f.is_finite()).map(NumberValue::Float),
        },
        Value::String(s) => {
            let s = s.trim();
            if let Ok(i) = s.parse::<i64>() {
                Some(NumberValue::Integer(i))
            } else {
                s.parse::<f64>()
                    .ok()
                    .filter(|f| f.is_finite())
                    .map(NumberValue::Float)
            }
        }
        _ => None,
    }
}

/// Parses a date/time operand.
///
/// Accepts RFC 3339 (converted to UTC), `YYYY-MM-DD HH:MM:SS`,
/// `YYYY-MM-DDTHH:MM:SS` and `YYYY-MM-DD` (midnight).
pub fn parse_date_time(value: &Value) -> Option<NaiveDateTime> {
    let s = value.as_str()?.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_utc());
    }
    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, format) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}
