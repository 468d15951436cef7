//! SQL execution for record types
//!
//! Every statement a record issues is built here from the table's static
//! column specs and a compiled [`Predicate`].

use rusqlite::types::Value as SqlValue;
use rusqlite::Row;

use super::filter::Predicate;
use crate::error::Result;
use crate::storage::value::Value;
use crate::storage::Binding;
use crate::table::{ColumnSpec, Table};

/// A filtered, ordered read
#[derive(Debug, Clone)]
pub struct Query {
    pub predicate: Predicate,
    /// Sort columns followed by the remaining primary key columns
    pub order: Vec<&'static ColumnSpec>,
    pub descending: bool,
}

impl Query {
    /// Query over `T` ordered by `sort`, primary key as tiebreaker
    pub fn new<T: Table>(predicate: Predicate, sort: &[&'static ColumnSpec]) -> Self {
        let mut order: Vec<&'static ColumnSpec> = sort.to_vec();
        for column in T::primary_key() {
            if !order.iter().any(|c| c.db_name == column.db_name) {
                order.push(column);
            }
        }
        Self {
            predicate,
            order,
            descending: false,
        }
    }

    pub fn reversed(mut self) -> Self {
        self.descending = !self.descending;
        self
    }

    /// Values of the order columns for one row, used to continue after it
    pub fn position_of<T: Table>(&self, row: &T) -> Vec<SqlValue> {
        self.order
            .iter()
            .map(|c| row.get_value(c.db_name).unwrap_or_default().to_sql())
            .collect()
    }

    fn order_clause(&self) -> String {
        let direction = if self.descending { "DESC" } else { "ASC" };
        self.order
            .iter()
            .map(|c| format!("{} {}", c.quoted(), direction))
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn after_clause(&self, after: &[SqlValue]) -> Predicate {
        let columns: Vec<String> = self.order.iter().map(|c| c.quoted()).collect();
        let marks = vec!["?"; after.len()].join(", ");
        Predicate {
            sql: format!(
                "({}) {} ({})",
                columns.join(", "),
                if self.descending { "<" } else { ">" },
                marks
            ),
            args: after.to_vec(),
        }
    }
}

fn column_list(columns: &[ColumnSpec]) -> String {
    columns
        .iter()
        .map(ColumnSpec::quoted)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Decode one `SELECT <all columns>` row
pub fn decode_row<T: Table>(row: &Row<'_>) -> Result<T> {
    let mut record = T::default();
    for (i, column) in T::COLUMNS.iter().enumerate() {
        let value = Value::from_sql(column.db_name, column.field_type, row.get_ref(i)?)?;
        record.set_value(column.db_name, value)?;
    }
    Ok(record)
}

/// Read rows matching `query`, strictly after the `after` position if given
pub fn fetch<T: Table>(
    binding: &Binding<'_>,
    query: &Query,
    after: Option<&[SqlValue]>,
    limit: Option<usize>,
) -> Result<Vec<T>> {
    let mut predicate = query.predicate.clone();
    if let Some(after) = after {
        predicate = predicate.and(query.after_clause(after));
    }

    let mut sql = format!(
        "SELECT {} FROM {} WHERE {} ORDER BY {}",
        column_list(T::COLUMNS),
        binding.quoted_table(T::TABLE_NAME),
        predicate.sql,
        query.order_clause()
    );
    if let Some(limit) = limit {
        sql.push_str(&format!(" LIMIT {}", limit));
    }

    binding
        .store()
        .query_rows(&sql, &predicate.args, |row| decode_row::<T>(row))
}

pub fn count<T: Table>(binding: &Binding<'_>, predicate: &Predicate) -> Result<usize> {
    let sql = format!(
        "SELECT COUNT(*) FROM {} WHERE {}",
        binding.quoted_table(T::TABLE_NAME),
        predicate.sql
    );
    let n = binding
        .store()
        .query_scalar(&sql, &predicate.args)?
        .and_then(|v| match v {
            SqlValue::Integer(n) => usize::try_from(n).ok(),
            _ => None,
        })
        .unwrap_or(0);
    Ok(n)
}

/// `pk1 = ? AND pk2 = ?` for the given key values
pub fn key_predicate<T: Table>(key: &[Value]) -> Predicate {
    T::primary_key()
        .into_iter()
        .zip(key)
        .fold(Predicate::always(), |acc, (column, value)| {
            acc.and(Predicate::equals(column, value))
        })
}

pub fn insert<T: Table>(binding: &Binding<'_>, record: &T) -> Result<usize> {
    let marks = vec!["?"; T::COLUMNS.len()].join(", ");
    let sql = format!(
        "INSERT INTO {} ({}) VALUES ({})",
        binding.quoted_table(T::TABLE_NAME),
        column_list(T::COLUMNS),
        marks
    );
    let args: Vec<SqlValue> = T::COLUMNS
        .iter()
        .map(|c| record.get_value(c.db_name).unwrap_or_default().to_sql())
        .collect();
    binding.store().execute(&sql, &args)
}

/// Write `fields` of `record` to the row identified by `key`
pub fn update<T: Table>(
    binding: &Binding<'_>,
    key: &[Value],
    record: &T,
    fields: &[&str],
) -> Result<usize> {
    if fields.is_empty() {
        return Ok(0);
    }

    let assignments: Vec<String> = fields.iter().map(|f| format!("\"{}\" = ?", f)).collect();
    let mut args: Vec<SqlValue> = fields
        .iter()
        .map(|f| record.get_value(f).unwrap_or_default().to_sql())
        .collect();

    let filter = key_predicate::<T>(key);
    args.extend(filter.args);

    let sql = format!(
        "UPDATE {} SET {} WHERE {}",
        binding.quoted_table(T::TABLE_NAME),
        assignments.join(", "),
        filter.sql
    );
    binding.store().execute(&sql, &args)
}

/// Move the row at `old_key` to `new_key`
pub fn update_key<T: Table>(binding: &Binding<'_>, old_key: &[Value], new_key: &[Value]) -> Result<usize> {
    let columns = T::primary_key();
    let assignments: Vec<String> = columns.iter().map(|c| format!("{} = ?", c.quoted())).collect();
    let mut args: Vec<SqlValue> = new_key.iter().map(Value::to_sql).collect();

    let filter = key_predicate::<T>(old_key);
    args.extend(filter.args);

    let sql = format!(
        "UPDATE {} SET {} WHERE {}",
        binding.quoted_table(T::TABLE_NAME),
        assignments.join(", "),
        filter.sql
    );
    binding.store().execute(&sql, &args)
}

pub fn delete<T: Table>(binding: &Binding<'_>, key: &[Value]) -> Result<usize> {
    delete_where::<T>(binding, &key_predicate::<T>(key))
}

/// Bulk assignment of one column on every matching row
pub fn update_where<T: Table>(
    binding: &Binding<'_>,
    predicate: &Predicate,
    column: &ColumnSpec,
    value: &Value,
) -> Result<usize> {
    let sql = format!(
        "UPDATE {} SET {} = ? WHERE {}",
        binding.quoted_table(T::TABLE_NAME),
        column.quoted(),
        predicate.sql
    );
    let mut args = vec![value.to_sql()];
    args.extend(predicate.args.iter().cloned());
    binding.store().execute(&sql, &args)
}

pub fn delete_where<T: Table>(binding: &Binding<'_>, predicate: &Predicate) -> Result<usize> {
    let sql = format!(
        "DELETE FROM {} WHERE {}",
        binding.quoted_table(T::TABLE_NAME),
        predicate.sql
    );
    binding.store().execute(&sql, &predicate.args)
}

/// Single aggregate over a table that may only be known by name
pub fn aggregate(
    binding: &Binding<'_>,
    table: &str,
    select: &str,
    predicate: &Predicate,
    tail: &str,
) -> Result<Option<SqlValue>> {
    let sql = format!(
        "SELECT {} FROM {} WHERE {}{}",
        select,
        binding.quoted_table(table),
        predicate.sql,
        tail
    );
    binding.store().query_scalar(&sql, &predicate.args)
}

/// One column of every matching row of a table known by name
pub fn column_values(
    binding: &Binding<'_>,
    table: &str,
    column: &ColumnSpec,
    predicate: &Predicate,
) -> Result<Vec<SqlValue>> {
    let sql = format!(
        "SELECT {} FROM {} WHERE {}",
        column.quoted(),
        binding.quoted_table(table),
        predicate.sql
    );
    binding
        .store()
        .query_rows(&sql, &predicate.args, |row| Ok(row.get::<_, SqlValue>(0)?))
}

/// `EXISTS` over a table known by name
pub fn exists(binding: &Binding<'_>, table: &str, predicate: &Predicate) -> Result<bool> {
    let sql = format!(
        "SELECT EXISTS(SELECT 1 FROM {} WHERE {})",
        binding.quoted_table(table),
        predicate.sql
    );
    let found = binding.store().query_scalar(&sql, &predicate.args)?;
    Ok(matches!(found, Some(SqlValue::Integer(n)) if n != 0))
}
