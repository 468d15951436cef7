//! Abstract syntax for filter expressions

use serde::{Deserialize, Serialize};
use std::fmt;

/// A parsed filter expression: the terms are alternatives (OR)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterExpr {
    pub terms: Vec<Term>,
}

/// One alternative of a filter expression
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Term {
    /// Exact match
    Equal(String),
    /// `<>v`
    NotEqual(String),
    /// `a..b`, `a..` or `..b`; at least one bound is present
    Range {
        from: Option<String>,
        to: Option<String>,
    },
    /// `>v`, `>=v`, `<v`, `<=v`
    Compare(CompareOp, String),
    /// Bare value containing `*` or `?`
    Pattern(String),
}

/// Comparison operator of a [`Term::Compare`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompareOp {
    Gt,
    Ge,
    Lt,
    Le,
}

impl CompareOp {
    pub fn as_str(self) -> &'static str {
        match self {
            CompareOp::Gt => ">",
            CompareOp::Ge => ">=",
            CompareOp::Lt => "<",
            CompareOp::Le => "<=",
        }
    }
}

impl Term {
    /// Every value carried by the term, in source order
    pub fn values(&self) -> Vec<&str> {
        match self {
            Term::Equal(v) | Term::NotEqual(v) | Term::Compare(_, v) | Term::Pattern(v) => {
                vec![v.as_str()]
            }
            Term::Range { from, to } => from.iter().chain(to.iter()).map(String::as_str).collect(),
        }
    }
}

impl FilterExpr {
    pub fn single(term: Term) -> Self {
        Self { terms: vec![term] }
    }
}

/// Characters that make a bare value mean something other than itself
fn needs_quotes(value: &str) -> bool {
    value.is_empty()
        || value.trim() != value
        || value.contains('|')
        || value.contains("..")
        || value.contains('*')
        || value.contains('?')
        || value.starts_with('\'')
        || value.starts_with('<')
        || value.starts_with('>')
}

/// Render a value so that it parses back to itself
pub fn quote_value(value: &str) -> String {
    if needs_quotes(value) {
        format!("'{}'", value.replace('\'', "''"))
    } else {
        value.to_string()
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::Equal(v) => write!(f, "{}", quote_value(v)),
            Term::NotEqual(v) => write!(f, "<>{}", quote_value(v)),
            Term::Range { from, to } => {
                if let Some(from) = from {
                    write!(f, "{}", quote_value(from))?;
                }
                write!(f, "..")?;
                if let Some(to) = to {
                    write!(f, "{}", quote_value(to))?;
                }
                Ok(())
            }
            Term::Compare(op, v) => write!(f, "{}{}", op.as_str(), quote_value(v)),
            Term::Pattern(v) => write!(f, "{}", v),
        }
    }
}

impl fmt::Display for FilterExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, term) in self.terms.iter().enumerate() {
            if i > 0 {
                write!(f, "|")?;
            }
            write!(f, "{}", term)?;
        }
        Ok(())
    }
}
