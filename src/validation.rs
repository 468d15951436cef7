//! Input validation for tabula
//!
//! Provides validation for the names that end up inside SQL text and
//! generated Rust source: column names, table names and company names.
//! Values never reach SQL text (they are bound), but identifiers do.

use convert_case::{Case, Casing};
use regex::Regex;
use std::sync::OnceLock;
use thiserror::Error;

/// Validation errors
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Invalid identifier '{0}': {1}")]
    InvalidIdentifier(String, &'static str),

    #[error("Identifier '{0}' is too long (max {1} characters)")]
    TooLong(String, usize),

    #[error("Identifier cannot be empty")]
    Empty,

    #[error("Reserved name: '{0}'")]
    Reserved(String),
}

/// Maximum length for column names
pub const MAX_DB_NAME_LENGTH: usize = 63;

/// Maximum length for table and company names
pub const MAX_OBJECT_NAME_LENGTH: usize = 30;

/// Column names that would collide with Rust keywords or with
/// `Record` internals reachable through deref
const RESERVED_NAMES: &[&str] = &[
    "as", "break", "const", "continue", "crate", "else", "enum", "extern", "false", "fn",
    "for", "if", "impl", "in", "let", "loop", "match", "mod", "move", "mut", "pub", "ref",
    "return", "self", "static", "struct", "super", "trait", "true", "type", "unsafe", "use",
    "where", "while", "async", "await", "dyn", "abstract", "become", "box", "do", "final",
    "macro", "override", "priv", "typeof", "unsized", "virtual", "yield", "try",
    "data", "binding", "snapshot", "filters", "sort", "cursor",
];

/// Validate a database column name
///
/// Rules:
/// - Must be 1-63 characters
/// - Lowercase ASCII letters, digits and underscore only
/// - Must start with a letter
/// - Cannot be a Rust keyword or a record-internal name
pub fn validate_db_name(name: &str) -> Result<(), ValidationError> {
    if name.is_empty() {
        return Err(ValidationError::Empty);
    }

    if name.len() > MAX_DB_NAME_LENGTH {
        return Err(ValidationError::TooLong(name.to_string(), MAX_DB_NAME_LENGTH));
    }

    let valid = db_name_pattern().is_some_and(|r| r.is_match(name));
    if !valid {
        return Err(ValidationError::InvalidIdentifier(
            name.to_string(),
            "must start with a lowercase letter and contain only lowercase letters, digits and underscores",
        ));
    }

    if RESERVED_NAMES.contains(&name) {
        return Err(ValidationError::Reserved(name.to_string()));
    }

    Ok(())
}

fn db_name_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"^[a-z][a-z0-9_]*$").ok())
        .as_ref()
}

/// Validate a table display name
///
/// Display names are free text ("Cust. Ledger Entry") but become part of a
/// quoted SQL identifier.
pub fn validate_table_name(name: &str) -> Result<(), ValidationError> {
    validate_object_name(name)
}

/// Validate a company (tenant) name
pub fn validate_company_name(name: &str) -> Result<(), ValidationError> {
    validate_object_name(name)
}

fn validate_object_name(name: &str) -> Result<(), ValidationError> {
    if name.trim().is_empty() {
        return Err(ValidationError::Empty);
    }

    if name.chars().count() > MAX_OBJECT_NAME_LENGTH {
        return Err(ValidationError::TooLong(name.to_string(), MAX_OBJECT_NAME_LENGTH));
    }

    for c in name.chars() {
        if c == '"' || c == '$' || c.is_control() {
            return Err(ValidationError::InvalidIdentifier(
                name.to_string(),
                "cannot contain quotes, '$' or control characters",
            ));
        }
    }

    Ok(())
}

/// Convert a display name to an identifier in the given case
///
/// Punctuation separates words and runs of separators collapse, so
/// "Cust. Ledger Entry" has three words whatever the spacing.
pub fn convert_display_name(display: &str, case: Case) -> String {
    display
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|word| !word.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
        .to_case(case)
}

/// Derive a column name from a field display name
///
/// "Balance (LCY)" becomes "balance_lcy", "No." becomes "no".
/// Returns None if nothing usable remains.
pub fn to_db_name(display: &str) -> Option<String> {
    let result = convert_display_name(display, Case::Snake);
    if result.is_empty() || validate_db_name(&result).is_err() {
        None
    } else {
        Some(result)
    }
}
