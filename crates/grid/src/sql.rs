//! SQL fragments with named bound parameters.
//!
//! Every client-supplied value travels as a [`BoundParam`]; the SQL text of a
//! [`SqlFragment`] only ever contains catalogue storage references, operators
//! and `:name` placeholders.

use chrono::NaiveDateTime;
use serde::Serialize;

/// A bound SQL parameter value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SqlParam {
    /// String parameter.
    String(String),
    /// Integer parameter.
    Integer(i64),
    /// Float parameter.
    Float(f64),
    /// Date/time parameter.
    Timestamp(NaiveDateTime),
}

impl SqlParam {
    /// Creates a string parameter.
    pub fn string(s: impl Into<String>) -> Self {
        SqlParam::String(s.into())
    }

    /// Creates an integer parameter.
    pub fn integer(i: i64) -> Self {
        SqlParam::Integer(i)
    }

    /// Creates a float parameter.
    pub fn float(f: f64) -> Self {
        SqlParam::Float(f)
    }

    /// Creates a date/time parameter.
    pub fn timestamp(t: NaiveDateTime) -> Self {
        SqlParam::Timestamp(t)
    }
}

/// A named parameter bound to a value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoundParam {
    /// Parameter name, without the leading colon.
    pub name: String,
    /// Bound value.
    pub value: SqlParam,
}

impl BoundParam {
    /// Returns the placeholder used in SQL text, e.g. `:p1_eq`.
    pub fn placeholder(&self) -> String {
        format!(":{}", self.name)
    }
}

/// Allocates bound-parameter names that are unique within one compilation.
///
/// Names have the form `p{n}_{tag}`, where `n` is a counter starting at 1 and
/// `tag` names the clause kind. A fresh binder is used for every compilation,
/// so compiling the same input twice yields the same names.
#[derive(Debug, Default)]
pub struct ParamBinder {
    counter: usize,
}

impl ParamBinder {
    /// Creates a binder whose first name uses counter 1.
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `value` under a fresh name tagged with `tag`.
    pub fn bind(&mut self, tag: &str, value: SqlParam) -> BoundParam {
        self.counter += 1;
        BoundParam {
            name: format!("p{}_{}", self.counter, tag),
            value,
        }
    }

    /// Returns how many parameters have been bound.
    pub fn bound(&self) -> usize {
        self.counter
    }
}

/// A fragment of SQL with bound parameters.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SqlFragment {
    /// The SQL clause.
    pub sql: String,
    /// Bound parameters, in placeholder order.
    pub params: Vec<BoundParam>,
}

impl SqlFragment {
    /// Creates a new SQL fragment.
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            params: Vec::new(),
        }
    }

    /// Creates a fragment with parameters.
    pub fn with_params(sql: impl Into<String>, params: Vec<BoundParam>) -> Self {
        Self {
            sql: sql.into(),
            params,
        }
    }

    /// Creates `column <operator> :param`.
    pub fn comparison(column: &str, operator: &str, param: BoundParam) -> Self {
        Self::with_params(
            format!("{} {} {}", column, operator, param.placeholder()),
            vec![param],
        )
    }

    /// Combines fragments with OR, parenthesised. Empty fragments are dropped.
    pub fn any(fragments: Vec<SqlFragment>) -> Self {
        Self::join(fragments, " OR ")
    }

    /// Combines fragments with AND, parenthesised. Empty fragments are dropped.
    pub fn all(fragments: Vec<SqlFragment>) -> Self {
        Self::join(fragments, " AND ")
    }

    fn join(fragments: Vec<SqlFragment>, separator: &str) -> Self {
        let mut parts = Vec::new();
        let mut params = Vec::new();
        for fragment in fragments.into_iter().filter(|f| !f.is_empty()) {
            parts.push(fragment.sql);
            params.extend(fragment.params);
        }

        match parts.len() {
            0 => Self::new(""),
            1 => Self::with_params(parts.remove(0), params),
            _ => Self::with_params(format!("({})", parts.join(separator)), params),
        }
    }

    /// Returns the value bound under `name`.
    pub fn param(&self, name: &str) -> Option<&SqlParam> {
        self.params.iter().find(|p| p.name == name).map(|p| &p.value)
    }

    /// Returns true if this fragment is empty.
    pub fn is_empty(&self) -> bool {
        self.sql.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_binder_names_are_unique() {
        let mut binder = ParamBinder::new();
        let a = binder.bind("eq", SqlParam::integer(1));
        let b = binder.bind("eq", SqlParam::integer(1));
        assert_eq!(a.name, "p1_eq");
        assert_eq!(b.name, "p2_eq");
        assert_eq!(binder.bound(), 2);
    }

    #[test]
    fn test_comparison() {
        let mut binder = ParamBinder::new();
        let frag = SqlFragment::comparison("r.age", ">=", binder.bind("ge", SqlParam::integer(65)));
        assert_eq!(frag.sql, "r.age >= :p1_ge");
        assert_eq!(frag.param("p1_ge"), Some(&SqlParam::Integer(65)));
    }

    #[test]
    fn test_any_wraps_multiple() {
        let mut binder = ParamBinder::new();
        let frag = SqlFragment::any(vec![
            SqlFragment::comparison("s", "=", binder.bind("enum", SqlParam::integer(0))),
            SqlFragment::new(""),
            SqlFragment::comparison("s", "=", binder.bind("enum", SqlParam::integer(2))),
        ]);
        assert_eq!(frag.sql, "(s = :p1_enum OR s = :p2_enum)");
        assert_eq!(frag.params.len(), 2);
    }

    #[test]
    fn test_single_fragment_not_wrapped() {
        let frag = SqlFragment::all(vec![SqlFragment::new("a = 1")]);
        assert_eq!(frag.sql, "a = 1");
        assert!(SqlFragment::all(vec![]).is_empty());
    }
}
