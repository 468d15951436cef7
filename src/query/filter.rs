//! Filter sets and their compilation to SQL
//!
//! A [`FilterSet`] holds at most one [`Condition`] per column. Compiling it
//! ANDs one clause per column; the terms of an expression are ORed. Values
//! only ever travel as bound parameters.

use rusqlite::types::Value as SqlValue;
use std::collections::BTreeMap;
use tabql::{quote_value, FilterExpr, Term};

use crate::error::{Error, Result};
use crate::schema::FieldType;
use crate::storage::value::Value;
use crate::table::ColumnSpec;

/// A compiled WHERE clause and its arguments
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Predicate {
    pub sql: String,
    pub args: Vec<SqlValue>,
}

impl Predicate {
    /// Matches every row
    pub fn always() -> Self {
        Self {
            sql: "1=1".to_string(),
            args: Vec::new(),
        }
    }

    /// `column = value`
    pub fn equals(column: &ColumnSpec, value: &Value) -> Self {
        Self {
            sql: format!("{} = ?", column.quoted()),
            args: vec![value.to_sql()],
        }
    }

    /// Conjunction of two predicates
    pub fn and(self, other: Predicate) -> Self {
        if self.is_always() {
            return other;
        }
        if other.is_always() {
            return self;
        }
        let mut args = self.args;
        args.extend(other.args);
        Self {
            sql: format!("{} AND {}", self.sql, other.sql),
            args,
        }
    }

    pub fn is_always(&self) -> bool {
        self.sql == "1=1"
    }
}

/// The filter on one column
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// Closed range; `min == max` is an exact match
    Range { min: Value, max: Value },
    /// Parsed filter expression
    Expression(FilterExpr),
}

/// Active filters, keyed by column name
#[derive(Debug, Clone, Default)]
pub struct FilterSet {
    entries: BTreeMap<&'static str, (&'static ColumnSpec, Condition)>,
}

impl FilterSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Range filter; replaces any filter on the column
    pub fn set_range(&mut self, column: &'static ColumnSpec, min: Value, max: Value) -> Result<()> {
        let min = column.coerce(min)?;
        let max = column.coerce(max)?;
        self.entries
            .insert(column.db_name, (column, Condition::Range { min, max }));
        Ok(())
    }

    /// Expression filter; replaces any filter on the column
    ///
    /// The expression is parsed and its literals converted now, so a bad
    /// filter fails here and not at the next read.
    pub fn set_expression(&mut self, column: &'static ColumnSpec, expr: &str) -> Result<()> {
        let parsed = tabql::parse(expr).map_err(|e| Error::filter(column.db_name, e))?;
        compile_expression(column, &parsed)?;
        self.entries
            .insert(column.db_name, (column, Condition::Expression(parsed)));
        Ok(())
    }

    /// Drop the filter on one column
    pub fn clear(&mut self, db_name: &str) {
        self.entries.remove(db_name);
    }

    pub fn clear_all(&mut self) {
        self.entries.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn condition(&self, db_name: &str) -> Option<&Condition> {
        self.entries.get(db_name).map(|(_, condition)| condition)
    }

    /// Rendering of one column's filter
    pub fn get(&self, db_name: &str) -> Option<String> {
        self.condition(db_name).map(render_condition)
    }

    /// `column: expr` pairs, joined by `, `
    pub fn render(&self) -> String {
        self.entries
            .iter()
            .map(|(name, (_, condition))| format!("{}: {}", name, render_condition(condition)))
            .collect::<Vec<_>>()
            .join(", ")
    }

    pub fn compile(&self) -> Result<Predicate> {
        let mut predicate = Predicate::always();
        for (column, condition) in self.entries.values() {
            let clause = match condition {
                Condition::Range { min, max } => compile_range(column, min, max),
                Condition::Expression(expr) => compile_expression(column, expr)?,
            };
            predicate = predicate.and(clause);
        }
        Ok(predicate)
    }
}

fn render_condition(condition: &Condition) -> String {
    match condition {
        Condition::Range { min, max } if min == max => quote_value(&min.to_string()),
        Condition::Range { min, max } => format!(
            "{}..{}",
            quote_value(&min.to_string()),
            quote_value(&max.to_string())
        ),
        Condition::Expression(expr) => expr.to_string(),
    }
}

fn compile_range(column: &ColumnSpec, min: &Value, max: &Value) -> Predicate {
    if min == max {
        return Predicate::equals(column, min);
    }
    Predicate {
        sql: format!("{} BETWEEN ? AND ?", column.quoted()),
        args: vec![min.to_sql(), max.to_sql()],
    }
}

fn compile_expression(column: &ColumnSpec, expr: &FilterExpr) -> Result<Predicate> {
    let mut clauses = Vec::with_capacity(expr.terms.len());
    let mut args = Vec::new();
    for term in &expr.terms {
        let (sql, term_args) = compile_term(column, term)?;
        clauses.push(sql);
        args.extend(term_args);
    }

    let sql = if clauses.len() == 1 {
        clauses.swap_remove(0)
    } else {
        format!("({})", clauses.join(" OR "))
    };
    Ok(Predicate { sql, args })
}

fn compile_term(column: &ColumnSpec, term: &Term) -> Result<(String, Vec<SqlValue>)> {
    let expr = column.quoted();
    let literal = |text: &str| column.parse_literal(text).map(|v| v.to_sql());

    let compiled = match term {
        Term::Equal(v) => (format!("{} = ?", expr), vec![literal(v)?]),
        Term::NotEqual(v) => (format!("{} <> ?", expr), vec![literal(v)?]),
        Term::Compare(op, v) => (format!("{} {} ?", expr, op.as_str()), vec![literal(v)?]),
        Term::Range {
            from: Some(from),
            to: Some(to),
        } => (
            format!("{} BETWEEN ? AND ?", expr),
            vec![literal(from)?, literal(to)?],
        ),
        Term::Range {
            from: Some(from),
            to: None,
        } => (format!("{} >= ?", expr), vec![literal(from)?]),
        Term::Range {
            from: None,
            to: Some(to),
        } => (format!("{} <= ?", expr), vec![literal(to)?]),
        Term::Range { from: None, to: None } => {
            return Err(Error::InvalidFilter {
                field: column.db_name.to_string(),
                message: "range needs at least one bound".to_string(),
            })
        }
        Term::Pattern(_) if column.field_type == FieldType::Decimal => {
            return Err(Error::InvalidFilter {
                field: column.db_name.to_string(),
                message: "wildcards do not apply to decimal fields".to_string(),
            })
        }
        Term::Pattern(p) => {
            let pattern = if column.field_type == FieldType::Code {
                p.to_uppercase()
            } else {
                p.clone()
            };
            (
                format!("{} LIKE ? ESCAPE '\\'", column.quoted()),
                vec![SqlValue::Text(like_pattern(&pattern))],
            )
        }
    };
    Ok(compiled)
}

/// Translate `*` / `?` wildcards to LIKE syntax, escaping LIKE's own
/// metacharacters
fn like_pattern(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len() + 4);
    for c in pattern.chars() {
        match c {
            '*' => out.push('%'),
            '?' => out.push('_'),
            '%' | '_' | '\\' => {
                out.push('\\');
                out.push(c);
            }
            _ => out.push(c),
        }
    }
    out
}
