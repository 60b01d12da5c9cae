//! Raw grid request parameters.
//!
//! [`GridParams`] is the structural parse of what the HTTP layer hands over:
//!
//! ```text
//! page      int
//! per_page  int
//! sort      { fieldName: "asc" | "desc", ... }          (ordered)
//! filter    { fieldName: { "c": int, "v": [values] } }  (ordered)
//! ```
//!
//! Parsing only rejects shapes that are structurally impossible (a `filter`
//! that is not an object, an operand list that is not an array). Everything
//! else is kept loosely typed here and judged per field by the compiler.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::error::{GridError, GridResult};

/// One `sort` entry, in client order.
#[derive(Debug, Clone, PartialEq)]
pub struct SortEntry {
    /// Client field key.
    pub field: String,
    /// Direction text, if the client sent a string.
    pub direction: Option<String>,
}

/// One `filter` entry, in client order.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterEntry {
    /// Client field key (a field name, or a numeric field id).
    pub field: String,
    /// Comparator code `c`, if present and integral.
    pub comparator: Option<i64>,
    /// Operand list `v`, if present.
    pub operands: Option<Vec<Value>>,
}

impl FilterEntry {
    /// Returns the clause if both comparator and operands are present.
    pub fn clause(&self) -> Option<FilterClause> {
        match (self.comparator, &self.operands) {
            (Some(comparator), Some(operands)) => Some(FilterClause {
                field_name: self.field.clone(),
                comparator,
                operands: operands.clone(),
            }),
            _ => None,
        }
    }
}

/// A complete filter clause: field key, comparator code and operands.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterClause {
    /// Client field key.
    pub field_name: String,
    /// Comparator code, interpreted per semantic type.
    pub comparator: i64,
    /// Operands (one or two, depending on the comparator).
    pub operands: Vec<Value>,
}

/// Structurally validated grid request parameters.
///
/// # Examples
///
/// ```
/// use facility_grid::GridParams;
/// use serde_json::json;
///
/// let params = GridParams::from_value(&json!({
///     "page": "2",
///     "per_page": 25,
///     "sort": {"name": "asc"},
///     "filter": {"name": {"c": 1, "v": ["jo"]}}
/// }))
/// .unwrap();
///
/// assert_eq!(params.page, Some(2));
/// assert_eq!(params.sort.len(), 1);
///
/// assert!(GridParams::from_value(&json!({"filter": ["name"]})).is_err());
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GridParams {
    /// Requested page (1-based), if given.
    pub page: Option<i64>,
    /// Requested page size, if given.
    pub per_page: Option<i64>,
    /// Sort entries, in client order.
    pub sort: Vec<SortEntry>,
    /// Filter entries, in client order.
    pub filter: Vec<FilterEntry>,
}

impl GridParams {
    /// Creates empty parameters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses parameters from the HTTP layer's JSON rendition.
    ///
    /// `null` is treated as empty parameters.
    pub fn from_value(value: &Value) -> GridResult<Self> {
        let object = match value {
            Value::Null => return Ok(Self::default()),
            Value::Object(object) => object,
            _ => return Err(GridError::invalid_shape("grid parameters must be an object")),
        };

        let mut params = Self {
            page: object.get("page").and_then(coerce_int),
            per_page: object.get("per_page").and_then(coerce_int),
            ..Self::default()
        };

        match object.get("sort") {
            None | Some(Value::Null) => {}
            Some(Value::Object(sort)) => {
                for (field, direction) in sort {
                    params.sort.push(SortEntry {
                        field: field.clone(),
                        direction: direction.as_str().map(str::to_string),
                    });
                }
            }
            Some(_) => return Err(GridError::invalid_shape("sort must be an object")),
        }

        match object.get("filter") {
            None | Some(Value::Null) => {}
            Some(Value::Object(filter)) => {
                for (field, spec) in filter {
                    params.filter.push(parse_filter_entry(field, spec)?);
                }
            }
            Some(_) => return Err(GridError::invalid_shape("filter must be an object")),
        }

        Ok(params)
    }

    /// Sets the page.
    pub fn page(mut self, page: i64) -> Self {
        self.page = Some(page);
        self
    }

    /// Sets the page size.
    pub fn per_page(mut self, per_page: i64) -> Self {
        self.per_page = Some(per_page);
        self
    }

    /// Appends a sort entry.
    pub fn sort(mut self, field: impl Into<String>, direction: impl Into<String>) -> Self {
        self.sort.push(SortEntry {
            field: field.into(),
            direction: Some(direction.into()),
        });
        self
    }

    /// Appends a filter entry.
    pub fn filter(mut self, field: impl Into<String>, comparator: i64, operands: Vec<Value>) -> Self {
        self.filter.push(FilterEntry {
            field: field.into(),
            comparator: Some(comparator),
            operands: Some(operands),
        });
        self
    }
}

impl<'de> Deserialize<'de> for GridParams {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        GridParams::from_value(&value).map_err(serde::de::Error::custom)
    }
}

fn parse_filter_entry(field: &str, spec: &Value) -> GridResult<FilterEntry> {
    let spec = spec.as_object().ok_or_else(|| {
        GridError::invalid_shape(format!("filter '{}' must be an object with c and v", field))
    })?;

    let operands = match spec.get("v") {
        None | Some(Value::Null) => None,
        Some(Value::Array(values)) => Some(values.clone()),
        Some(_) => {
            return Err(GridError::invalid_shape(format!(
                "filter '{}': operand list v must be an array",
                field
            )));
        }
    };

    Ok(FilterEntry {
        field: field.to_string(),
        comparator: spec.get("c").and_then(coerce_int),
        operands,
    })
}

/// Reads an integer from a JSON number or a numeric string.
pub(crate) fn coerce_int(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64)
                .map(|f| f as i64)
        }),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
