//! Filter parse errors

use std::fmt;

/// What went wrong while reading a filter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseErrorKind {
    Empty,
    Syntax,
    Incomplete,
}

/// A filter expression that could not be read
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub expression: String,
    /// Byte offset of the first character that did not fit the grammar
    pub position: Option<usize>,
}

impl ParseError {
    pub(crate) fn new(kind: ParseErrorKind, expression: &str) -> Self {
        Self {
            kind,
            expression: expression.to_string(),
            position: None,
        }
    }

    pub(crate) fn at(mut self, position: usize) -> Self {
        self.position = Some(position);
        self
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            ParseErrorKind::Empty => f.write_str("filter expression is empty"),
            ParseErrorKind::Incomplete => write!(f, "incomplete filter expression '{}'", self.expression),
            ParseErrorKind::Syntax => {
                write!(f, "invalid filter expression '{}'", self.expression)?;
                if let Some(pos) = self.position {
                    write!(f, " at position {}", pos)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ParseError {}
