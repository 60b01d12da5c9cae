//! Grid query compilation.
//!
//! [`QueryCompiler`] turns a [`FieldCatalogue`] plus untrusted [`GridParams`]
//! into a [`QueryPlan`]: offset/limit, order clauses and parameterised
//! predicates. Unknown fields, fields that are not sortable or filterable,
//! bad directions and inapplicable filter values are skipped, not reported.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::catalogue::{FieldCatalogue, FieldDescriptor};
use crate::error::GridResult;
use crate::filter::FieldFilter;
use crate::handlers::build_predicate;
use crate::params::{FilterEntry, GridParams, SortEntry};
use crate::sql::{BoundParam, ParamBinder, SqlFragment};

/// Page size used when the request gives none (or one not greater than 1).
pub const DEFAULT_PER_PAGE: u64 = 10;

/// Largest offset a plan carries; the signed 64-bit range of SQL `BIGINT`.
pub const MAX_OFFSET: u64 = i64::MAX as u64;

/// Offset of the first row of `page` (1-based), clamped to [`MAX_OFFSET`].
fn page_offset(page: u64, per_page: u64) -> u64 {
    page.saturating_sub(1).saturating_mul(per_page).min(MAX_OFFSET)
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SortDirection {
    /// Ascending.
    Asc,
    /// Descending.
    Desc,
}

impl SortDirection {
    /// Parses `asc`/`desc`, case-insensitively.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "asc" => Some(SortDirection::Asc),
            "desc" => Some(SortDirection::Desc),
            _ => None,
        }
    }

    /// Returns the SQL keyword.
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

/// One ORDER BY term.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderClause {
    /// Catalogue storage reference.
    pub storage_ref: String,
    /// Direction.
    pub direction: SortDirection,
}

/// A compiled grid query, handed to the persistence layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryPlan {
    /// Requested page, 1-based.
    pub page: u64,
    /// Rows to skip.
    pub offset: u64,
    /// Rows to return.
    pub limit: u64,
    /// ORDER BY terms, in client order.
    pub order: Vec<OrderClause>,
    /// Predicates, combined with AND.
    pub predicates: Vec<SqlFragment>,
}

impl QueryPlan {
    /// Changes the page size, keeping the requested page.
    pub fn set_limit(&mut self, limit: u64) {
        self.limit = limit.max(1);
        self.offset = page_offset(self.page, self.limit);
    }

    /// Renders the predicates as one AND-combined condition.
    ///
    /// Returns `None` if there are no predicates.
    pub fn where_clause(&self) -> Option<String> {
        if self.predicates.is_empty() {
            return None;
        }
        Some(
            self.predicates
                .iter()
                .map(|p| format!("({})", p.sql))
                .collect::<Vec<_>>()
                .join(" AND "),
        )
    }

    /// Renders the ORDER BY list, e.g. `r.name ASC, r.admitted_at DESC`.
    pub fn order_by_clause(&self) -> Option<String> {
        if self.order.is_empty() {
            return None;
        }
        Some(
            self.order
                .iter()
                .map(|o| format!("{} {}", o.storage_ref, o.direction.as_sql()))
                .collect::<Vec<_>>()
                .join(", "),
        )
    }

    /// Iterates over every bound parameter, in predicate order.
    pub fn parameters(&self) -> impl Iterator<Item = &BoundParam> {
        self.predicates.iter().flat_map(|p| p.params.iter())
    }
}

/// Compiles grid requests against field catalogues.
///
/// The compiler holds no per-request state; a new parameter binder is created
/// for every call, which keeps compilation deterministic.
///
/// # Examples
///
/// ```
/// use facility_grid::{FieldCatalogue, FieldDeclaration, NoEnumSources, QueryCompiler};
/// use serde_json::json;
///
/// let catalogue = FieldCatalogue::build(
///     "resident",
///     vec![FieldDeclaration::text("name").sortable().filterable().storage("r.name")],
///     &NoEnumSources,
/// )
/// .unwrap();
///
/// let plan = QueryCompiler::new()
///     .compile(&catalogue, &json!({
///         "page": 3,
///         "filter": {"name": {"c": 1, "v": ["jo"]}},
///         "sort": {"name": "asc"}
///     }))
///     .unwrap();
///
/// assert_eq!(plan.offset, 20);
/// assert_eq!(plan.where_clause().unwrap(), "(r.name LIKE :p1_like)");
/// assert_eq!(plan.order_by_clause().unwrap(), "r.name ASC");
/// ```
#[derive(Debug, Clone, Copy)]
pub struct QueryCompiler {
    default_per_page: u64,
}

impl Default for QueryCompiler {
    fn default() -> Self {
        Self {
            default_per_page: DEFAULT_PER_PAGE,
        }
    }
}

impl QueryCompiler {
    /// Creates a compiler with the default page size.
    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides the fallback page size.
    pub fn with_default_per_page(mut self, per_page: u64) -> Self {
        self.default_per_page = per_page.max(1);
        self
    }

    /// Returns the fallback page size.
    pub fn default_per_page(&self) -> u64 {
        self.default_per_page
    }

    /// Parses raw request parameters and compiles them.
    ///
    /// Fails only with [`GridError::InvalidFilterShape`](crate::GridError::InvalidFilterShape).
    pub fn compile(&self, catalogue: &FieldCatalogue, raw: &Value) -> GridResult<QueryPlan> {
        let params = GridParams::from_value(raw)?;
        Ok(self.compile_params(catalogue, &params))
    }

    /// Compiles already-parsed parameters.
    pub fn compile_params(&self, catalogue: &FieldCatalogue, params: &GridParams) -> QueryPlan {
        let (page, limit) = self.paginate(params);

        let mut seen = HashSet::new();
        let order = params
            .sort
            .iter()
            .filter_map(|entry| Self::order_clause(catalogue, entry))
            .filter(|clause| {
                let first = seen.insert(clause.storage_ref.clone());
                if !first {
                    debug!(storage_ref = %clause.storage_ref, "Skipping repeated sort field");
                }
                first
            })
            .collect();

        let mut binder = ParamBinder::new();
        let predicates = params
            .filter
            .iter()
            .filter_map(|entry| Self::predicate(catalogue, entry, &mut binder))
            .collect();

        let plan = QueryPlan {
            page,
            offset: page_offset(page, limit),
            limit,
            order,
            predicates,
        };

        debug!(
            entity = %catalogue.entity(),
            offset = plan.offset,
            limit = plan.limit,
            order_terms = plan.order.len(),
            predicates = plan.predicates.len(),
            "Compiled grid query"
        );

        plan
    }

    /// Returns `(page, per_page)`.
    fn paginate(&self, params: &GridParams) -> (u64, u64) {
        let page = params
            .page
            .filter(|p| *p >= 1)
            .map(|p| p as u64)
            .unwrap_or(1);
        let per_page = params
            .per_page
            .filter(|p| *p > 1)
            .map(|p| p as u64)
            .unwrap_or(self.default_per_page);

        (page, per_page)
    }

    fn order_clause(catalogue: &FieldCatalogue, entry: &SortEntry) -> Option<OrderClause> {
        let Some(direction) = entry.direction.as_deref().and_then(SortDirection::parse) else {
            debug!(field = %entry.field, "Skipping sort entry with invalid direction");
            return None;
        };

        match catalogue.lookup(&entry.field) {
            Some(field) if field.can_sort() => Some(OrderClause {
                storage_ref: field.storage_ref.clone(),
                direction,
            }),
            _ => {
                debug!(field = %entry.field, "Skipping sort on unknown or unsortable field");
                None
            }
        }
    }

    fn predicate(
        catalogue: &FieldCatalogue,
        entry: &FilterEntry,
        binder: &mut ParamBinder,
    ) -> Option<SqlFragment> {
        let field = match Self::filter_field(catalogue, &entry.field) {
            Some(field) if field.can_filter() => field,
            _ => {
                debug!(field = %entry.field, "Skipping filter on unknown or unfilterable field");
                return None;
            }
        };

        let clause = entry.clause()?;
        let filter = FieldFilter::parse(field, &clause)?;
        let fragment = build_predicate(&field.storage_ref, &filter, binder);

        (!fragment.is_empty()).then_some(fragment)
    }

    /// Resolves a filter key by name, then by numeric id.
    fn filter_field<'a>(catalogue: &'a FieldCatalogue, key: &str) -> Option<&'a FieldDescriptor> {
        catalogue.lookup(key).or_else(|| {
            key.trim()
                .parse::<usize>()
                .ok()
                .and_then(|id| catalogue.lookup_by_id(id))
        })
    }
}
