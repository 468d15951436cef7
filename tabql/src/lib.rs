//! TabQL - record filter expressions
//!
//! The small filter language accepted by `Record::set_filter`. An expression
//! is a `|`-separated list of terms, any one of which may match.
//!
//! # Syntax Overview
//!
//! ```text
//! 10000          exact value
//! 10000..20000   inclusive range
//! 10000..        open range (at least 10000)
//! ..20000        open range (at most 20000)
//! <>BLOCKED      not equal
//! >100  >=100    comparisons
//! <100  <=100
//! SEA*  C?STO    wildcard (* any sequence, ? one character)
//! 'A|B'          quoted value, taken verbatim ('' is a quote, '' alone is blank)
//! 10000|20000..  either term
//! ```
//!
//! The crate knows nothing about SQL or field types. It parses an expression
//! into a [`FilterExpr`] and renders one back to canonical text, so a rendered
//! expression parses to the same terms.

mod ast;
mod error;
mod parser;

pub use ast::*;
pub use error::{ParseError, ParseErrorKind};

/// Parse a filter expression into its terms
pub fn parse(input: &str) -> Result<FilterExpr, ParseError> {
    parser::parse_expr(input)
}
