//! Storage layer for tabula
//!
//! A [`Store`] owns one SQLite connection; a [`Binding`] scopes it to a
//! company. Every physical table is named `<company>$<Table>`, every
//! identifier is quoted and every value is a bound parameter.

pub mod ddl;
pub mod value;

use rusqlite::types::Value as SqlValue;
use rusqlite::{params_from_iter, Connection, Row};
use std::path::Path;
use std::rc::Rc;

use crate::config::RuntimeConfig;
use crate::error::{Error, Result};
use crate::query::executor::{self, Query};
use crate::query::filter::Predicate;
use crate::table::Table;
use crate::validation;

pub use value::{Code, FromValue, OptionField, Value};

/// A SQLite database plus runtime settings
#[derive(Debug)]
pub struct Store {
    conn: Connection,
    config: RuntimeConfig,
}

impl Store {
    /// Open (or create) a database file
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path.as_ref())?;
        Ok(Self::from_connection(conn))
    }

    /// Open a private in-memory database
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self::from_connection(conn))
    }

    /// Wrap a connection the caller already configured
    pub fn from_connection(conn: Connection) -> Self {
        Self {
            conn,
            config: RuntimeConfig::default(),
        }
    }

    pub fn with_config(mut self, config: RuntimeConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// The underlying connection, for ambient transactions and ad-hoc reads
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Scope the store to one company
    pub fn bind(&self, company: &str) -> Result<Binding<'_>> {
        validation::validate_company_name(company)?;
        Ok(Binding {
            store: self,
            company: Rc::from(company),
        })
    }

    pub(crate) fn execute(&self, sql: &str, args: &[SqlValue]) -> Result<usize> {
        tracing::debug!(target: "tabula::sql", sql, args = args.len(), "execute");
        let mut stmt = self.conn.prepare_cached(sql)?;
        let affected = stmt.execute(params_from_iter(args.iter()))?;
        Ok(affected)
    }

    pub(crate) fn execute_batch(&self, sql: &str) -> Result<()> {
        tracing::debug!(target: "tabula::sql", sql, "execute batch");
        self.conn.execute_batch(sql)?;
        Ok(())
    }

    pub(crate) fn query_rows<R, F>(&self, sql: &str, args: &[SqlValue], mut decode: F) -> Result<Vec<R>>
    where
        F: FnMut(&Row<'_>) -> Result<R>,
    {
        tracing::debug!(target: "tabula::sql", sql, args = args.len(), "query");
        let mut stmt = self.conn.prepare_cached(sql)?;
        let mut rows = stmt.query(params_from_iter(args.iter()))?;
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            out.push(decode(row)?);
        }
        Ok(out)
    }

    /// First column of the first row, if any
    pub(crate) fn query_scalar(&self, sql: &str, args: &[SqlValue]) -> Result<Option<SqlValue>> {
        let mut values = self.query_rows(sql, args, |row| Ok(row.get::<_, SqlValue>(0)?))?;
        Ok(if values.is_empty() {
            None
        } else {
            Some(values.swap_remove(0))
        })
    }
}

/// A store scoped to one company
///
/// Cheap to clone; records keep their own copy.
#[derive(Debug, Clone)]
pub struct Binding<'s> {
    store: &'s Store,
    company: Rc<str>,
}

impl<'s> Binding<'s> {
    pub fn company(&self) -> &str {
        &self.company
    }

    pub fn store(&self) -> &'s Store {
        self.store
    }

    /// Physical name of a table in this company
    pub fn table_name(&self, table: &str) -> String {
        format!("{}${}", self.company, table)
    }

    /// Physical name, quoted for SQL text
    pub fn quoted_table(&self, table: &str) -> String {
        format!("\"{}\"", self.table_name(table))
    }

    /// Provision the table and its indexes if they do not exist
    pub fn create_table<T: Table>(&self) -> Result<()> {
        let layout = ddl::TableLayout::of::<T>();
        for statement in layout.statements(&self.company) {
            self.store.execute_batch(&statement)?;
        }
        Ok(())
    }

    /// Load the row of `R` whose `related_field` equals `value`
    ///
    /// A blank value refers to nothing and yields `Ok(None)`; a value
    /// with no matching row is a `RelationNotFound` validation error.
    pub fn require_related<R: Table>(
        &self,
        table: &str,
        field: &str,
        related_field: &str,
        value: Value,
    ) -> Result<Option<R>> {
        if value.is_blank() {
            return Ok(None);
        }

        let column =
            R::column(related_field).ok_or_else(|| Error::unknown_field(R::TABLE_NAME, related_field))?;
        let lookup = column.coerce(value)?;
        let query = Query::new::<R>(Predicate::equals(column, &lookup), &[]);

        let mut rows = executor::fetch::<R>(self, &query, None, Some(1))?;
        if rows.is_empty() {
            return Err(Error::RelationNotFound {
                table: table.to_string(),
                field: field.to_string(),
                related_table: R::TABLE_NAME.to_string(),
                value: lookup.to_string(),
            });
        }
        Ok(Some(rows.swap_remove(0)))
    }
}
