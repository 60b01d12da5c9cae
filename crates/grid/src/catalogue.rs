//! Per-entity field catalogues.
//!
//! A [`FieldCatalogue`] is the declarative list of fields a client may sort
//! and filter an entity's grid by. It is built once at startup from
//! [`FieldDeclaration`]s and is immutable afterwards, so it can be shared
//! across request handlers without locking.
//!
//! Storage references in the catalogue are the only identifiers that ever
//! reach a SQL fragment. They come from trusted declarations, never from
//! client input, and are validated as dotted SQL identifiers at build time.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::CatalogueBuildError;

static STORAGE_REF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*(\.[A-Za-z_][A-Za-z0-9_]*)*$")
        .expect("storage reference pattern is valid")
});

/// The semantic type of a catalogue field.
///
/// The type selects how comparator codes in a filter are interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SemanticType {
    /// Free text; equality and substring comparators.
    Text,
    /// Numeric; relational comparators and inclusive ranges.
    Number,
    /// Date/time; equality, on-or-before, on-or-after and ranges.
    Date,
    /// Enumerated; filters select index values.
    Enum,
}

impl fmt::Display for SemanticType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SemanticType::Text => write!(f, "text"),
            SemanticType::Number => write!(f, "number"),
            SemanticType::Date => write!(f, "date"),
            SemanticType::Enum => write!(f, "enum"),
        }
    }
}

impl FromStr for SemanticType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "string" => Ok(SemanticType::Text),
            "number" => Ok(SemanticType::Number),
            "date" | "datetime" => Ok(SemanticType::Date),
            "enum" => Ok(SemanticType::Enum),
            _ => Err(format!("unknown field type: {}", s)),
        }
    }
}

/// A static field declaration, as supplied by the entity metadata layer.
///
/// # Examples
///
/// ```
/// use facility_grid::FieldDeclaration;
///
/// let name = FieldDeclaration::text("name")
///     .sortable()
///     .filterable()
///     .storage("r.last_name");
/// assert!(name.sortable && name.filterable);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDeclaration {
    /// Client-facing key.
    pub name: String,

    /// Semantic type of the field.
    #[serde(rename = "type")]
    pub semantic_type: SemanticType,

    /// Whether clients may sort by this field.
    #[serde(default)]
    pub sortable: bool,

    /// Whether clients may filter by this field.
    #[serde(default)]
    pub filterable: bool,

    /// Opaque storage reference, e.g. `r.last_name`. Empty means the field is
    /// declared but not queryable.
    #[serde(default)]
    pub storage_ref: String,

    /// Name of the enum value source to resolve at build time.
    #[serde(default)]
    pub enum_source: Option<String>,
}

impl FieldDeclaration {
    /// Creates a declaration that is neither sortable nor filterable.
    pub fn new(name: impl Into<String>, semantic_type: SemanticType) -> Self {
        Self {
            name: name.into(),
            semantic_type,
            sortable: false,
            filterable: false,
            storage_ref: String::new(),
            enum_source: None,
        }
    }

    /// Declares a text field.
    pub fn text(name: impl Into<String>) -> Self {
        Self::new(name, SemanticType::Text)
    }

    /// Declares a number field.
    pub fn number(name: impl Into<String>) -> Self {
        Self::new(name, SemanticType::Number)
    }

    /// Declares a date field.
    pub fn date(name: impl Into<String>) -> Self {
        Self::new(name, SemanticType::Date)
    }

    /// Declares an enum field whose values come from the named source.
    pub fn enumeration(name: impl Into<String>, source: impl Into<String>) -> Self {
        Self::new(name, SemanticType::Enum).with_enum_source(source)
    }

    /// Marks the field sortable.
    pub fn sortable(mut self) -> Self {
        self.sortable = true;
        self
    }

    /// Marks the field filterable.
    pub fn filterable(mut self) -> Self {
        self.filterable = true;
        self
    }

    /// Sets the storage reference.
    pub fn storage(mut self, storage_ref: impl Into<String>) -> Self {
        self.storage_ref = storage_ref.into();
        self
    }

    /// Sets the enum value source.
    pub fn with_enum_source(mut self, source: impl Into<String>) -> Self {
        self.enum_source = Some(source.into());
        self
    }
}

/// Ordered index-to-label mapping of an enum field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EnumValues(Vec<(i64, String)>);

impl EnumValues {
    /// Creates the mapping, preserving the order given.
    pub fn new(values: Vec<(i64, String)>) -> Self {
        Self(values)
    }

    /// Returns `true` if `index` is part of the domain.
    pub fn contains(&self, index: i64) -> bool {
        self.0.iter().any(|(i, _)| *i == index)
    }

    /// Returns the label for `index`.
    pub fn label(&self, index: i64) -> Option<&str> {
        self.0
            .iter()
            .find(|(i, _)| *i == index)
            .map(|(_, label)| label.as_str())
    }

    /// Iterates over `(index, label)` pairs in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (i64, &str)> {
        self.0.iter().map(|(i, label)| (*i, label.as_str()))
    }

    /// Returns the number of values.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if there are no values.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Resolves enum value tables by name.
///
/// Implementations are consulted exactly once per enum field, while the
/// catalogue is built. They are never called at request time.
pub trait EnumValueSource {
    /// Returns the ordered `(index, label)` values of `source`.
    fn values(&self, source: &str) -> Result<Vec<(i64, String)>, String>;
}

/// An [`EnumValueSource`] that knows no sources.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoEnumSources;

impl EnumValueSource for NoEnumSources {
    fn values(&self, source: &str) -> Result<Vec<(i64, String)>, String> {
        Err(format!("no enum sources are registered (requested '{}')", source))
    }
}

/// A table-backed [`EnumValueSource`].
///
/// # Examples
///
/// ```
/// use facility_grid::{EnumValueSource, StaticEnumSource};
///
/// let source = StaticEnumSource::new()
///     .with_table("resident.status", [(0, "Active"), (1, "Discharged")]);
/// assert_eq!(source.values("resident.status").unwrap().len(), 2);
/// assert!(source.values("lead.stage").is_err());
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StaticEnumSource {
    tables: HashMap<String, Vec<(i64, String)>>,
}

impl StaticEnumSource {
    /// Creates an empty source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a table.
    pub fn with_table<I, S>(mut self, name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = (i64, S)>,
        S: Into<String>,
    {
        self.tables.insert(
            name.into(),
            values.into_iter().map(|(i, s)| (i, s.into())).collect(),
        );
        self
    }
}

impl EnumValueSource for StaticEnumSource {
    fn values(&self, source: &str) -> Result<Vec<(i64, String)>, String> {
        self.tables
            .get(source)
            .cloned()
            .ok_or_else(|| format!("unknown enum source '{}'", source))
    }
}

/// A resolved catalogue field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldDescriptor {
    /// Dense index assigned in declaration order.
    pub id: usize,
    /// Lowercased client-facing key.
    pub name: String,
    /// Semantic type.
    pub semantic_type: SemanticType,
    /// Declared sortable.
    pub sortable: bool,
    /// Declared filterable.
    pub filterable: bool,
    /// Storage reference handed to the persistence layer.
    pub storage_ref: String,
    /// Enum values, resolved at build time.
    pub enum_values: Option<EnumValues>,
}

impl FieldDescriptor {
    /// Returns `true` if the field can appear in an ORDER BY.
    pub fn can_sort(&self) -> bool {
        self.sortable && !self.storage_ref.is_empty()
    }

    /// Returns `true` if the field can appear in a predicate.
    pub fn can_filter(&self) -> bool {
        self.filterable && !self.storage_ref.is_empty()
    }
}

/// The immutable field catalogue of one entity.
///
/// # Examples
///
/// ```
/// use facility_grid::{FieldCatalogue, FieldDeclaration, NoEnumSources};
///
/// let catalogue = FieldCatalogue::build(
///     "resident",
///     vec![
///         FieldDeclaration::text("Name").sortable().filterable().storage("r.name"),
///         FieldDeclaration::date("admitted").sortable().storage("r.admitted_at"),
///     ],
///     &NoEnumSources,
/// )
/// .unwrap();
///
/// assert_eq!(catalogue.lookup("NAME").unwrap().id, 0);
/// assert_eq!(catalogue.lookup_by_id(1).unwrap().name, "admitted");
/// assert!(catalogue.lookup("room").is_none());
/// ```
#[derive(Debug, Clone)]
pub struct FieldCatalogue {
    entity: String,
    fields: Vec<FieldDescriptor>,
    by_name: HashMap<String, usize>,
}

impl FieldCatalogue {
    /// Builds a catalogue from ordered declarations.
    ///
    /// Fails on duplicate (case-insensitive) or empty names, storage
    /// references that are not dotted identifiers, and enum sources the
    /// `enums` collaborator cannot resolve.
    pub fn build<I>(
        entity: impl Into<String>,
        declarations: I,
        enums: &dyn EnumValueSource,
    ) -> Result<Self, CatalogueBuildError>
    where
        I: IntoIterator<Item = FieldDeclaration>,
    {
        let entity = entity.into();
        let mut fields = Vec::new();
        let mut by_name = HashMap::new();

        for declaration in declarations {
            let name = declaration.name.trim().to_lowercase();
            if name.is_empty() {
                return Err(CatalogueBuildError::EmptyName { entity });
            }
            if by_name.contains_key(&name) {
                return Err(CatalogueBuildError::DuplicateField { entity, name });
            }

            let storage_ref = declaration.storage_ref.trim().to_string();
            if !storage_ref.is_empty() && !STORAGE_REF.is_match(&storage_ref) {
                return Err(CatalogueBuildError::InvalidStorageRef { name, storage_ref });
            }

            let enum_values = match &declaration.enum_source {
                Some(source) => {
                    let values =
                        enums
                            .values(source)
                            .map_err(|message| CatalogueBuildError::EnumSource {
                                name: name.clone(),
                                source_name: source.clone(),
                                message,
                            })?;
                    Some(EnumValues::new(values))
                }
                None => None,
            };

            let id = fields.len();
            by_name.insert(name.clone(), id);
            fields.push(FieldDescriptor {
                id,
                name,
                semantic_type: declaration.semantic_type,
                sortable: declaration.sortable,
                filterable: declaration.filterable,
                storage_ref,
                enum_values,
            });
        }

        debug!(entity = %entity, fields = fields.len(), "Built field catalogue");

        Ok(Self {
            entity,
            fields,
            by_name,
        })
    }

    /// Looks up a field by client key, case-insensitively.
    pub fn lookup(&self, name: &str) -> Option<&FieldDescriptor> {
        self.by_name
            .get(&name.trim().to_lowercase())
            .map(|&id| &self.fields[id])
    }

    /// Looks up a field by its dense id.
    pub fn lookup_by_id(&self, id: usize) -> Option<&FieldDescriptor> {
        self.fields.get(id)
    }

    /// Returns the entity this catalogue describes.
    pub fn entity(&self) -> &str {
        &self.entity
    }

    /// Returns the number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns `true` if the catalogue has no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterates over fields in id order.
    pub fn iter(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.fields.iter()
    }

    /// Iterates over fields usable in ORDER BY.
    pub fn sortable_fields(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.fields.iter().filter(|f| f.can_sort())
    }

    /// Iterates over fields usable in predicates.
    pub fn filterable_fields(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.fields.iter().filter(|f| f.can_filter())
    }
}
