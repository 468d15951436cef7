//! Table provisioning
//!
//! Builds `CREATE TABLE` / `CREATE INDEX` statements either from a compiled
//! [`Table`] or straight from a [`TableDef`] (for `tabula ddl`).

use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;

use crate::error::{Error, Result};
use crate::schema::{FieldType, TableDef};
use crate::storage::value::encode_decimal;
use crate::table::Table;

#[derive(Debug, Clone, PartialEq)]
struct LayoutColumn {
    db_name: String,
    field_type: FieldType,
    primary_key: bool,
    option_count: usize,
    min: Option<f64>,
    max: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
struct LayoutKey {
    name: String,
    columns: Vec<String>,
    unique: bool,
}

/// Physical shape of one table
#[derive(Debug, Clone, PartialEq)]
pub struct TableLayout {
    name: String,
    columns: Vec<LayoutColumn>,
    keys: Vec<LayoutKey>,
}

impl TableLayout {
    pub fn of<T: Table>() -> Self {
        Self {
            name: T::TABLE_NAME.to_string(),
            columns: T::COLUMNS
                .iter()
                .map(|c| LayoutColumn {
                    db_name: c.db_name.to_string(),
                    field_type: c.field_type,
                    primary_key: c.primary_key,
                    option_count: c.options.len(),
                    min: c.min,
                    max: c.max,
                })
                .collect(),
            keys: T::KEYS
                .iter()
                .map(|k| LayoutKey {
                    name: k.name.to_string(),
                    columns: k.fields.iter().map(|f| f.to_string()).collect(),
                    unique: k.unique,
                })
                .collect(),
        }
    }

    pub fn from_def(def: &TableDef) -> Result<Self> {
        let columns = def
            .stored_fields()
            .map(|f| LayoutColumn {
                db_name: f.db_name(),
                field_type: f.field_type,
                primary_key: f.primary_key,
                option_count: f.options.len(),
                min: f.validation.and_then(|v| v.min),
                max: f.validation.and_then(|v| v.max),
            })
            .collect();

        let mut keys = Vec::new();
        for key in &def.keys {
            let columns = key
                .fields
                .iter()
                .map(|name| {
                    def.get_field(name).map(|f| f.db_name()).ok_or_else(|| {
                        Error::schema(&def.name, format!("key '{}' references unknown field '{}'", key.name, name))
                    })
                })
                .collect::<Result<Vec<_>>>()?;
            keys.push(LayoutKey {
                name: key.name.clone(),
                columns,
                unique: key.unique,
            });
        }

        Ok(Self {
            name: def.name.clone(),
            columns,
            keys,
        })
    }

    /// DDL statements for `company`, table first
    pub fn statements(&self, company: &str) -> Vec<String> {
        let table = format!("{}${}", company, self.name);

        let mut lines: Vec<String> = self.columns.iter().map(column_definition).collect();
        let pk: Vec<String> = self
            .columns
            .iter()
            .filter(|c| c.primary_key)
            .map(|c| format!("\"{}\"", c.db_name))
            .collect();
        lines.push(format!("PRIMARY KEY ({})", pk.join(", ")));

        let mut statements = vec![format!(
            "CREATE TABLE IF NOT EXISTS \"{}\" (\n    {}\n)",
            table,
            lines.join(",\n    ")
        )];

        for key in &self.keys {
            let columns: Vec<String> = key.columns.iter().map(|c| format!("\"{}\"", c)).collect();
            statements.push(format!(
                "CREATE {}INDEX IF NOT EXISTS \"{}${}\" ON \"{}\" ({})",
                if key.unique { "UNIQUE " } else { "" },
                table,
                key.name,
                table,
                columns.join(", ")
            ));
        }

        statements
    }
}

fn column_definition(column: &LayoutColumn) -> String {
    let quoted = format!("\"{}\"", column.db_name);
    let default = match column.field_type {
        FieldType::Text | FieldType::Code => "''".to_string(),
        FieldType::Decimal => format!("'{}'", encode_decimal(Decimal::ZERO)),
        FieldType::Date => "'1970-01-01'".to_string(),
        FieldType::DateTime => "'1970-01-01 00:00:00'".to_string(),
        FieldType::Boolean | FieldType::Integer | FieldType::Option => "0".to_string(),
        FieldType::Blob => "x''".to_string(),
    };
    let mut definition = format!(
        "{} {} NOT NULL DEFAULT {}",
        quoted,
        column.field_type.sql_type(),
        default
    );

    if column.field_type == FieldType::Option && column.option_count > 0 {
        definition.push_str(&format!(
            " CHECK ({} BETWEEN 0 AND {})",
            quoted,
            column.option_count - 1
        ));
    }

    for (op, bound) in [(">=", column.min), ("<=", column.max)] {
        if let Some(literal) = bound.and_then(|b| bound_literal(column.field_type, b)) {
            definition.push_str(&format!(" CHECK ({} {} {})", quoted, op, literal));
        }
    }

    definition
}

/// SQL literal for a range bound in the column's storage form
fn bound_literal(field_type: FieldType, bound: f64) -> Option<String> {
    match field_type {
        FieldType::Decimal => Decimal::from_f64(bound).map(|d| format!("'{}'", encode_decimal(d))),
        _ => Some(bound.to_string()),
    }
}
