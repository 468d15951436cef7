//! Error types for tabula
//!
//! One error enum covers the schema loader, the generator and the record
//! runtime. Not-found is never an error: lookups return `Ok(false)`.

use std::error::Error as StdError;
use std::path::PathBuf;
use thiserror::Error;

/// The main error type for tabula operations
#[derive(Debug, Error)]
pub enum Error {
    // ==========================================================================
    // Schema Errors
    // ==========================================================================
    #[error("Table '{table}' has no primary key field")]
    MissingPrimaryKey { table: String },

    #[error("Table '{table}' declares field '{field}' more than once")]
    DuplicateField { table: String, field: String },

    #[error("Schema for table '{table}' is invalid: {message}")]
    SchemaInvalid { table: String, message: String },

    #[error("Table '{name}' is not defined")]
    TableNotFound { name: String },

    // ==========================================================================
    // Record Errors
    // ==========================================================================
    #[error("Record of table '{table}' is not bound to a store; call init first")]
    NotBound { table: &'static str },

    #[error("Table '{table}' has no field '{field}'")]
    UnknownField { table: String, field: String },

    #[error("Field '{field}' of table '{table}' is a FlowField and cannot be assigned")]
    FlowFieldNotEditable { table: String, field: String },

    #[error("Field '{field}' of table '{table}' is part of the primary key; use rename")]
    PrimaryKeyField { table: String, field: String },

    #[error("Primary key of table '{table}' was changed in memory; use rename instead of modify")]
    PrimaryKeyChanged { table: String },

    #[error("Table '{table}' expects {expected} primary key value(s), got {actual}")]
    KeyArity {
        table: String,
        expected: usize,
        actual: usize,
    },

    #[error("Type mismatch for field '{field}': expected {expected}, got {actual}")]
    TypeMismatch {
        field: String,
        expected: String,
        actual: String,
    },

    #[error("Invalid value '{value}' for field '{field}': {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Buffered read of table '{table}' exceeds the limit of {limit} rows")]
    BufferLimit { table: String, limit: usize },

    // ==========================================================================
    // Filter Errors
    // ==========================================================================
    #[error("Invalid filter on field '{field}': {message}")]
    InvalidFilter { field: String, message: String },

    // ==========================================================================
    // Validation Errors
    // ==========================================================================
    #[error("Field '{field}' of table '{table}' must have a value")]
    MissingRequiredField { table: String, field: String },

    #[error("Field '{field}' of table '{table}' cannot exceed {max} characters")]
    FieldTooLong {
        table: String,
        field: String,
        max: usize,
    },

    #[error("Field '{field}' of table '{table}' must be between {min} and {max}")]
    OutOfRange {
        table: String,
        field: String,
        min: String,
        max: String,
    },

    #[error("{related_table} '{value}' does not exist (referenced by {table}.{field})")]
    RelationNotFound {
        table: String,
        field: String,
        related_table: String,
        value: String,
    },

    #[error("{table}: {message}")]
    Validation { table: String, message: String },

    #[error("Invalid {kind} '{value}': {reason}")]
    InvalidIdentifier {
        kind: &'static str,
        value: String,
        reason: &'static str,
    },

    #[error("Reserved name '{name}' cannot be used")]
    ReservedName { name: String },

    // ==========================================================================
    // Storage Errors
    // ==========================================================================
    #[error("Storage error: {message}")]
    Storage {
        message: String,
        #[source]
        source: rusqlite::Error,
    },

    // ==========================================================================
    // Generator Errors
    // ==========================================================================
    #[error("Template error: {message}")]
    Template { message: String },

    // ==========================================================================
    // IO Errors
    // ==========================================================================
    #[error("Failed to read file '{path}': {source}")]
    FileReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write file '{path}': {source}")]
    FileWriteError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ==========================================================================
    // Serialization Errors
    // ==========================================================================
    #[error("Failed to parse YAML: {message}")]
    YamlParseError { message: String },

    #[error("Failed to serialize to JSON: {message}")]
    JsonError { message: String },

    // ==========================================================================
    // Catch-all
    // ==========================================================================
    #[error("{0}")]
    Other(String),
}

/// Result type alias for tabula operations
pub type Result<T> = std::result::Result<T, Error>;

// =============================================================================
// Conversions from external error types
// =============================================================================

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Other(err.to_string())
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::Storage {
            message: err.to_string(),
            source: err,
        }
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(err: serde_yaml::Error) -> Self {
        Error::YamlParseError {
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::JsonError {
            message: err.to_string(),
        }
    }
}

impl From<tera::Error> for Error {
    fn from(err: tera::Error) -> Self {
        // tera nests the useful message in its source chain
        let mut message = err.to_string();
        let mut source = StdError::source(&err);
        while let Some(inner) = source {
            message.push_str(": ");
            message.push_str(&inner.to_string());
            source = StdError::source(inner);
        }
        Error::Template { message }
    }
}

impl From<crate::validation::ValidationError> for Error {
    fn from(err: crate::validation::ValidationError) -> Self {
        use crate::validation::ValidationError;
        match err {
            ValidationError::InvalidIdentifier(value, reason) => Error::InvalidIdentifier {
                kind: "identifier",
                value,
                reason,
            },
            ValidationError::TooLong(value, _) => Error::InvalidIdentifier {
                kind: "identifier",
                value,
                reason: "too long",
            },
            ValidationError::Empty => Error::InvalidIdentifier {
                kind: "identifier",
                value: String::new(),
                reason: "cannot be empty",
            },
            ValidationError::Reserved(name) => Error::ReservedName { name },
        }
    }
}

// =============================================================================
// Error construction helpers
// =============================================================================

impl Error {
    /// A business rule rejected the record; the usual error for custom hooks
    pub fn validation(table: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Validation {
            table: table.into(),
            message: message.into(),
        }
    }

    pub fn unknown_field(table: impl Into<String>, field: impl Into<String>) -> Self {
        Error::UnknownField {
            table: table.into(),
            field: field.into(),
        }
    }

    pub fn schema(table: impl Into<String>, message: impl Into<String>) -> Self {
        Error::SchemaInvalid {
            table: table.into(),
            message: message.into(),
        }
    }

    pub(crate) fn filter(field: impl Into<String>, err: tabql::ParseError) -> Self {
        Error::InvalidFilter {
            field: field.into(),
            message: err.to_string(),
        }
    }

    /// A structural rule, relation check or business rule rejected the record
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Error::MissingRequiredField { .. }
                | Error::FieldTooLong { .. }
                | Error::OutOfRange { .. }
                | Error::RelationNotFound { .. }
                | Error::Validation { .. }
        )
    }

    /// The underlying store failed
    pub fn is_storage(&self) -> bool {
        matches!(self, Error::Storage { .. })
    }

    /// Returns a user-friendly suggestion for how to fix this error
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            Error::MissingPrimaryKey { .. } => {
                Some("Mark at least one field with 'primary_key: true'")
            }
            Error::NotBound { .. } => Some("Bind the record with record.init(store.bind(company)?)"),
            Error::PrimaryKeyChanged { .. } | Error::PrimaryKeyField { .. } => {
                Some("Use rename() to change primary key values")
            }
            Error::InvalidFilter { .. } => {
                Some("Filters use 'a..b', '<>v', 'x*' or literals separated by '|'")
            }
            Error::BufferLimit { .. } => {
                Some("Narrow the filters or iterate with find_set() instead")
            }
            Error::InvalidIdentifier { .. } => {
                Some("Database names may only contain lowercase letters, digits and underscores")
            }
            _ => None,
        }
    }

    /// Returns true if the caller can fix the record and try again
    pub fn is_recoverable(&self) -> bool {
        self.is_validation()
            || matches!(
                self,
                Error::TypeMismatch { .. }
                    | Error::InvalidValue { .. }
                    | Error::InvalidFilter { .. }
                    | Error::UnknownField { .. }
            )
    }
}
