//! Table schema definitions for tabula
//!
//! A schema describes one table:
//! - Table id and display name
//! - Ordered field list with types, constraints and relations
//! - FlowField descriptors (computed aggregates over another table)
//! - Secondary keys used for indexing and sorting
//!
//! Schemas are YAML files with a top-level `table:` key, one per table,
//! collected into a [`SchemaRegistry`] before generation.

pub(crate) mod check;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use convert_case::Case;
use walkdir::WalkDir;

use crate::error::{Error, Result};
use crate::validation;

pub use check::check_table;

/// The semantic type of a field
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    #[default]
    Text,
    /// Uppercased, trimmed identifier text
    Code,
    Decimal,
    Date,
    #[serde(alias = "date_time")]
    DateTime,
    #[serde(alias = "bool")]
    Boolean,
    #[serde(alias = "int")]
    Integer,
    Blob,
    /// Enumerated value stored as its index
    Option,
}

impl FieldType {
    /// Storage class used in DDL
    pub fn sql_type(self) -> &'static str {
        match self {
            FieldType::Text
            | FieldType::Code
            | FieldType::Decimal
            | FieldType::Date
            | FieldType::DateTime => "TEXT",
            FieldType::Boolean | FieldType::Integer | FieldType::Option => "INTEGER",
            FieldType::Blob => "BLOB",
        }
    }

    /// Text-backed types whose length constraint applies
    pub fn has_length(self) -> bool {
        matches!(self, FieldType::Text | FieldType::Code)
    }

    /// Types compared numerically
    pub fn is_numeric(self) -> bool {
        matches!(self, FieldType::Decimal | FieldType::Integer)
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FieldType::Text => "Text",
            FieldType::Code => "Code",
            FieldType::Decimal => "Decimal",
            FieldType::Date => "Date",
            FieldType::DateTime => "DateTime",
            FieldType::Boolean => "Boolean",
            FieldType::Integer => "Integer",
            FieldType::Blob => "Blob",
            FieldType::Option => "Option",
        };
        write!(f, "{}", name)
    }
}

/// Aggregate computed by a FlowField
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CalcFormula {
    Sum,
    Count,
    #[serde(alias = "avg")]
    Average,
    Min,
    Max,
    Lookup,
    #[serde(alias = "exists")]
    Exist,
}

impl CalcFormula {
    /// Formulas that read a source field
    pub fn needs_source_field(self) -> bool {
        !matches!(self, CalcFormula::Count | CalcFormula::Exist)
    }
}

/// How a flow filter obtains its value
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FlowFilterKind {
    /// A literal value
    Const,
    /// The current record's value of the named field
    Field,
    /// A filter expression
    Filter,
}

/// One condition on the source table of a FlowField
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FlowFilter {
    /// Field of the source table
    pub field: String,
    #[serde(rename = "type")]
    pub kind: FlowFilterKind,
    /// Literal, field name of this table, or filter expression
    pub value: String,
}

/// Foreign table this field's value must exist in
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TableRelation {
    pub table: String,
    pub field: String,
}

/// Numeric bounds checked by `validate()`
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct FieldRange {
    #[serde(default)]
    pub min: Option<f64>,
    #[serde(default)]
    pub max: Option<f64>,
}

/// Definition of a single field
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct FieldDef {
    /// Display name
    pub name: String,
    /// Field type
    #[serde(rename = "type", default)]
    pub field_type: FieldType,
    /// Column name override (defaults to snake_case of the name)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub db_name: Option<String>,
    #[serde(default)]
    pub primary_key: bool,
    /// Maximum length for text and code fields
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length: Option<usize>,
    #[serde(default)]
    pub required: bool,
    /// Default value (as YAML)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<serde_yaml::Value>,
    /// Stamped with the current time on insert and modify
    #[serde(default)]
    pub auto_timestamp: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation: Option<FieldRange>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table_relation: Option<TableRelation>,
    /// Labels of an option field, in index order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub precision: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<u32>,
    #[serde(default)]
    pub flow_field: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calc_formula: Option<CalcFormula>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_table: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_field: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub flow_filters: Vec<FlowFilter>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Default number of decimal places for decimal fields
pub const DEFAULT_SCALE: u32 = 2;

impl FieldDef {
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            ..Default::default()
        }
    }

    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    pub fn length(mut self, length: usize) -> Self {
        self.length = Some(length);
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn relation(mut self, table: impl Into<String>, field: impl Into<String>) -> Self {
        self.table_relation = Some(TableRelation {
            table: table.into(),
            field: field.into(),
        });
        self
    }

    /// Column name: the override, else derived from the display name
    pub fn db_name(&self) -> String {
        self.db_name
            .clone()
            .or_else(|| validation::to_db_name(&self.name))
            .unwrap_or_default()
    }

    /// Whether the field is a physical column
    pub fn is_stored(&self) -> bool {
        !self.flow_field
    }

    pub fn scale(&self) -> u32 {
        self.scale.unwrap_or(DEFAULT_SCALE)
    }

    /// True if `name` refers to this field by display name or column name
    pub fn matches(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name) || self.db_name().eq_ignore_ascii_case(name)
    }
}

/// A secondary key
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct KeyDef {
    pub name: String,
    /// Field names (display or column names) in key order
    pub fields: Vec<String>,
    #[serde(default)]
    pub unique: bool,
    #[serde(default)]
    pub clustered: bool,
}

/// Schema for a table
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct TableDef {
    /// Numeric table id
    pub id: u32,
    /// Display name, also the physical table name suffix
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Field definitions, in column order
    #[serde(default)]
    pub fields: Vec<FieldDef>,
    #[serde(default)]
    pub keys: Vec<KeyDef>,
}

/// On-disk layout: the table sits under a `table:` key
#[derive(Debug, Serialize, Deserialize)]
struct SchemaFile {
    table: TableDef,
}

impl TableDef {
    /// Create a new table definition
    pub fn new(id: u32, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            ..Default::default()
        }
    }

    /// Add a field definition
    pub fn field(mut self, def: FieldDef) -> Self {
        self.fields.push(def);
        self
    }

    /// Add a secondary key
    pub fn key(mut self, name: impl Into<String>, fields: &[&str], unique: bool) -> Self {
        self.keys.push(KeyDef {
            name: name.into(),
            fields: fields.iter().map(|f| f.to_string()).collect(),
            unique,
            clustered: false,
        });
        self
    }

    /// Parse a schema document
    pub fn from_yaml(content: &str) -> Result<Self> {
        let file: SchemaFile = serde_yaml::from_str(content)?;
        Ok(file.table)
    }

    /// Serialize back to the on-disk layout
    pub fn to_yaml(&self) -> Result<String> {
        let file = SchemaFile { table: self.clone() };
        serde_yaml::to_string(&file).map_err(Error::from)
    }

    /// Load a schema file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| Error::FileReadError {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&content)
    }

    /// Rust type name of the generated record
    pub fn struct_name(&self) -> String {
        validation::convert_display_name(&self.name, Case::Pascal)
    }

    /// Rust module (and file) name of the generated record
    pub fn module_name(&self) -> String {
        validation::to_db_name(&self.name).unwrap_or_else(|| format!("table_{}", self.id))
    }

    pub fn get_field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.matches(name))
    }

    pub fn primary_key(&self) -> Vec<&FieldDef> {
        self.fields.iter().filter(|f| f.primary_key).collect()
    }

    pub fn stored_fields(&self) -> impl Iterator<Item = &FieldDef> {
        self.fields.iter().filter(|f| f.is_stored())
    }

    pub fn flow_fields(&self) -> impl Iterator<Item = &FieldDef> {
        self.fields.iter().filter(|f| f.flow_field)
    }

    /// Check this table on its own, without resolving references
    pub fn validate(&self) -> Result<()> {
        check_table(self)
    }
}

/// Registry of all table schemas known to the generator
#[derive(Debug, Default)]
pub struct SchemaRegistry {
    tables: BTreeMap<String, TableDef>,
    sources: BTreeMap<String, PathBuf>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every `*.yaml` / `*.yml` file below a directory
    pub fn load(dir: &Path) -> Result<Self> {
        let mut registry = Self::new();

        if !dir.exists() {
            return Err(Error::FileReadError {
                path: dir.to_path_buf(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "schema directory not found"),
            });
        }

        let mut paths: Vec<PathBuf> = WalkDir::new(dir)
            .into_iter()
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.into_path())
            .filter(|path| {
                path.extension()
                    .map(|e| e == "yaml" || e == "yml")
                    .unwrap_or(false)
            })
            .collect();
        paths.sort();

        for path in paths {
            let table = TableDef::load(&path)?;
            tracing::debug!(table = %table.name, path = %path.display(), "loaded schema");
            registry.sources.insert(table.name.to_lowercase(), path);
            registry.insert(table)?;
        }

        Ok(registry)
    }

    /// Register a table; names and ids must be unique
    pub fn insert(&mut self, table: TableDef) -> Result<()> {
        let key = table.name.to_lowercase();
        if self.tables.contains_key(&key) {
            return Err(Error::schema(&table.name, "table is defined more than once"));
        }
        if let Some(other) = self.tables.values().find(|t| t.id == table.id) {
            return Err(Error::schema(
                &table.name,
                format!("table id {} is already used by '{}'", table.id, other.name),
            ));
        }
        self.tables.insert(key, table);
        Ok(())
    }

    /// Get a table by display name (case-insensitive)
    pub fn get(&self, name: &str) -> Option<&TableDef> {
        self.tables.get(&name.to_lowercase())
    }

    /// Get a table or fail with `TableNotFound`
    pub fn require(&self, name: &str) -> Result<&TableDef> {
        self.get(name).ok_or_else(|| Error::TableNotFound {
            name: name.to_string(),
        })
    }

    /// File a table was loaded from
    pub fn source_of(&self, name: &str) -> Option<&Path> {
        self.sources.get(&name.to_lowercase()).map(PathBuf::as_path)
    }

    /// List all tables, ordered by name
    pub fn list(&self) -> impl Iterator<Item = &TableDef> {
        self.tables.values()
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Check every table and every cross-table reference
    pub fn validate(&self) -> Result<()> {
        for table in self.list() {
            check::check_table(table)?;
            check::check_references(table, self)?;
        }
        Ok(())
    }
}
