//! The record programming model
//!
//! A [`Record`] wraps one generated table struct together with everything
//! that is not a field value:
//!
//! ```text
//!   Record<'s, T>
//!   ├── data       T            current field values (Deref target)
//!   ├── binding    Binding<'s>  store + company, set by init()
//!   ├── snapshot   Option<T>    values as last loaded or written
//!   ├── filters    FilterSet    at most one condition per column
//!   ├── sort       [ColumnSpec] current key, primary key when empty
//!   └── cursor     Cursor<T>    Idle | Streaming | Buffered
//! ```
//!
//! Reads return `Ok(false)` when no row qualifies. Every `Err` is a
//! storage, validation or usage failure.

mod cursor;
mod flowfield;
mod mutate;
mod navigate;
mod validate;

use std::ops::{Deref, DerefMut};

use crate::error::{Error, Result};
use crate::query::executor::{self, Query};
use crate::query::filter::{FilterSet, Predicate};
use crate::storage::value::Value;
use crate::storage::Binding;
use crate::table::{ColumnSpec, Table};

use cursor::Cursor;

/// A table row plus its binding, filters, sort order and iteration state
pub struct Record<'s, T: Table> {
    data: T,
    binding: Option<Binding<'s>>,
    snapshot: Option<T>,
    filters: FilterSet,
    sort: Vec<&'static ColumnSpec>,
    cursor: Cursor<T>,
}

impl<'s, T: Table> Default for Record<'s, T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'s, T: Table> Deref for Record<'s, T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.data
    }
}

impl<'s, T: Table> DerefMut for Record<'s, T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.data
    }
}

impl<'s, T: Table> std::fmt::Debug for Record<'s, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Record")
            .field("table", &T::TABLE_NAME)
            .field("company", &self.binding.as_ref().map(Binding::company))
            .field("data", &self.data)
            .field("loaded", &self.snapshot.is_some())
            .field("filters", &self.filters.render())
            .finish()
    }
}

impl<'s, T: Table> Record<'s, T> {
    /// An unbound record with default field values
    pub fn new() -> Self {
        Self {
            data: T::default(),
            binding: None,
            snapshot: None,
            filters: FilterSet::new(),
            sort: Vec::new(),
            cursor: Cursor::Idle,
        }
    }

    /// A record bound to `binding`
    pub fn bound(binding: Binding<'s>) -> Self {
        let mut record = Self::new();
        record.binding = Some(binding);
        record
    }

    /// Bind to a store and company, resetting fields to their defaults
    ///
    /// Filters and the current key are kept; any open iteration is dropped.
    pub fn init(&mut self, binding: Binding<'s>) {
        self.binding = Some(binding);
        self.data = T::default();
        self.snapshot = None;
        self.cursor = Cursor::Idle;
    }

    pub fn binding(&self) -> Result<&Binding<'s>> {
        self.binding.as_ref().ok_or(Error::NotBound {
            table: T::TABLE_NAME,
        })
    }

    /// Field values as last loaded from or written to storage
    pub fn snapshot(&self) -> Option<&T> {
        self.snapshot.as_ref()
    }

    pub fn is_loaded(&self) -> bool {
        self.snapshot.is_some()
    }

    pub fn data(&self) -> &T {
        &self.data
    }

    pub fn into_inner(self) -> T {
        self.data
    }

    /// Clear filters, current key and snapshot and drop any open iteration
    ///
    /// Field values are kept.
    pub fn reset(&mut self) {
        self.filters.clear_all();
        self.sort.clear();
        self.snapshot = None;
        self.cursor = Cursor::Idle;
    }

    /// Load the row with the given primary key; filters do not apply
    pub fn get(&mut self, key: &[Value]) -> Result<bool> {
        let binding = self.binding()?.clone();
        let key = coerce_key::<T>(key)?;

        let query = Query::new::<T>(executor::key_predicate::<T>(&key), &[]);
        let mut rows = logged::<T, _>("get", executor::fetch::<T>(&binding, &query, None, Some(1)))?;
        if rows.is_empty() {
            return Ok(false);
        }
        self.load(rows.swap_remove(0));
        Ok(true)
    }

    // =========================================================================
    // Filters and current key
    // =========================================================================

    /// Exact-match filter on `field`
    pub fn set_range(&mut self, field: &str, value: impl Into<Value>) -> Result<()> {
        let value = value.into();
        let column = filter_column::<T>(field)?;
        self.filters.set_range(column, value.clone(), value)
    }

    /// Closed-range filter on `field`
    pub fn set_range_between(
        &mut self,
        field: &str,
        min: impl Into<Value>,
        max: impl Into<Value>,
    ) -> Result<()> {
        let column = filter_column::<T>(field)?;
        self.filters.set_range(column, min.into(), max.into())
    }

    /// Remove the filter on `field`
    pub fn clear_range(&mut self, field: &str) -> Result<()> {
        let column = filter_column::<T>(field)?;
        self.filters.clear(column.db_name);
        Ok(())
    }

    /// Filter expression on `field`, e.g. `10000..20000|<>C*`
    pub fn set_filter(&mut self, field: &str, expr: &str) -> Result<()> {
        let column = filter_column::<T>(field)?;
        self.filters.set_expression(column, expr)
    }

    /// Sort order for navigation; an empty list restores primary key order
    pub fn set_current_key(&mut self, fields: &[&str]) -> Result<()> {
        let mut sort = Vec::with_capacity(fields.len());
        for name in fields {
            let column = filter_column::<T>(name)?;
            if column.field_type == crate::schema::FieldType::Blob {
                return Err(Error::validation(
                    T::TABLE_NAME,
                    format!("blob field '{}' cannot be part of a key", column.db_name),
                ));
            }
            sort.push(column);
        }
        self.sort = sort;
        Ok(())
    }

    /// Copy another record's filters and current key
    pub fn copy_filters(&mut self, other: &Record<'_, T>) {
        self.filters = other.filters.clone();
        self.sort = other.sort.clone();
    }

    /// All active filters as `field: expr` pairs
    pub fn get_filters(&self) -> String {
        self.filters.render()
    }

    /// The filter on one field, if any
    pub fn get_filter(&self, field: &str) -> Option<String> {
        T::column(field).and_then(|c| self.filters.get(c.db_name))
    }

    // =========================================================================
    // Internals
    // =========================================================================

    /// Adopt a row read from storage
    fn load(&mut self, row: T) {
        self.snapshot = Some(row.clone());
        self.data = row;
    }

    fn predicate(&self) -> Result<Predicate> {
        self.filters.compile()
    }

    fn query(&self) -> Result<Query> {
        Ok(Query::new::<T>(self.predicate()?, &self.sort))
    }
}

/// Resolve a stored column usable in filters and keys
fn filter_column<T: Table>(name: &str) -> Result<&'static ColumnSpec> {
    if let Some(column) = T::column(name) {
        return Ok(column);
    }
    if let Some(flow) = T::flow_field(name) {
        return Err(Error::InvalidFilter {
            field: flow.db_name.to_string(),
            message: "FlowFields are computed and cannot be filtered or sorted".to_string(),
        });
    }
    Err(Error::unknown_field(T::TABLE_NAME, name))
}

/// Convert caller-supplied key values to the primary key column types
fn coerce_key<T: Table>(key: &[Value]) -> Result<Vec<Value>> {
    let columns = T::primary_key();
    if key.len() != columns.len() {
        return Err(Error::KeyArity {
            table: T::TABLE_NAME.to_string(),
            expected: columns.len(),
            actual: key.len(),
        });
    }
    columns
        .into_iter()
        .zip(key)
        .map(|(column, value)| column.coerce(value.clone()))
        .collect()
}

/// Log storage failures before handing them to the caller
fn logged<T: Table, R>(operation: &'static str, result: Result<R>) -> Result<R> {
    if let Err(err) = &result {
        if err.is_storage() {
            tracing::warn!(table = T::TABLE_NAME, operation, error = %err, "storage failure");
        }
    }
    result
}
