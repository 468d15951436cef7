//! The contract between generated record types and the runtime
//!
//! Generated code implements [`Table`]: static column, FlowField and key
//! descriptors plus typed field access. The hand-written skeleton
//! implements [`Triggers`]. Everything else (filters, cursors, change
//! tracking, FlowField evaluation) is generic over `T: Table` and lives in
//! [`crate::record`].

use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use std::cmp::Ordering;
use std::fmt;

use crate::error::{Error, Result};
use crate::schema::{CalcFormula, FieldType};
use crate::storage::value::Value;
use crate::storage::Binding;

/// A physical column
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColumnSpec {
    /// Display name from the schema
    pub name: &'static str,
    /// Column name, also the Rust field name
    pub db_name: &'static str,
    pub field_type: FieldType,
    pub primary_key: bool,
    pub length: Option<usize>,
    pub required: bool,
    pub auto_timestamp: bool,
    pub min: Option<f64>,
    pub max: Option<f64>,
    /// Option labels in index order
    pub options: &'static [&'static str],
    /// Decimal places kept by aggregates
    pub scale: u32,
}

impl ColumnSpec {
    pub const fn new(name: &'static str, db_name: &'static str, field_type: FieldType) -> Self {
        Self {
            name,
            db_name,
            field_type,
            primary_key: false,
            length: None,
            required: false,
            auto_timestamp: false,
            min: None,
            max: None,
            options: &[],
            scale: crate::schema::DEFAULT_SCALE,
        }
    }

    pub const fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    pub const fn length(mut self, length: usize) -> Self {
        self.length = Some(length);
        self
    }

    pub const fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub const fn auto_timestamp(mut self) -> Self {
        self.auto_timestamp = true;
        self
    }

    pub const fn range(mut self, min: Option<f64>, max: Option<f64>) -> Self {
        self.min = min;
        self.max = max;
        self
    }

    pub const fn options(mut self, options: &'static [&'static str]) -> Self {
        self.options = options;
        self
    }

    pub const fn scale(mut self, scale: u32) -> Self {
        self.scale = scale;
        self
    }

    /// True if `name` is this column's db name or display name
    pub fn matches(&self, name: &str) -> bool {
        self.db_name.eq_ignore_ascii_case(name) || self.name.eq_ignore_ascii_case(name)
    }

    /// Parse filter or default text as this column's type
    pub fn parse_literal(&self, text: &str) -> Result<Value> {
        Value::parse_literal(self.db_name, self.field_type, self.options, text)
    }

    /// Convert a dynamic value to this column's type
    ///
    /// Text is parsed as a literal of the column type; values of a
    /// compatible type are widened. Anything else is a `TypeMismatch`.
    pub fn coerce(&self, value: Value) -> Result<Value> {
        let mismatch = |value: &Value| Error::TypeMismatch {
            field: self.db_name.to_string(),
            expected: self.field_type.to_string(),
            actual: value.type_name().to_string(),
        };

        let coerced = match (self.field_type, value) {
            (_, Value::Null) => Value::zero(self.field_type),
            (FieldType::Text, Value::Text(s)) => Value::Text(s),
            (FieldType::Text, Value::Code(c)) => Value::Text(c.into_string()),
            (_, Value::Text(s)) => self.parse_literal(&s)?,
            (_, Value::Code(c)) => self.parse_literal(c.as_str())?,
            (FieldType::Decimal, Value::Int(i)) => Value::Decimal(i.into()),
            (FieldType::Decimal, v @ Value::Decimal(_)) => v,
            (FieldType::Integer, v @ Value::Int(_)) => v,
            (FieldType::Option, Value::Int(i)) => {
                if usize::try_from(i).map(|i| i < self.options.len()).unwrap_or(false) {
                    Value::Int(i)
                } else {
                    return Err(Error::InvalidValue {
                        field: self.db_name.to_string(),
                        value: i.to_string(),
                        reason: format!("expected one of {:?}", self.options),
                    });
                }
            }
            (FieldType::Boolean, v @ Value::Bool(_)) => v,
            (FieldType::Date, v @ Value::Date(_)) => v,
            (FieldType::Date, Value::DateTime(dt)) => Value::Date(dt.date()),
            (FieldType::DateTime, v @ Value::DateTime(_)) => v,
            (FieldType::DateTime, Value::Date(d)) => {
                Value::DateTime(d.and_hms_opt(0, 0, 0).unwrap_or_default())
            }
            (FieldType::Blob, v @ Value::Blob(_)) => v,
            (_, other) => return Err(mismatch(&other)),
        };
        Ok(coerced)
    }

    /// Quoted column reference
    pub fn quoted(&self) -> String {
        format!("\"{}\"", self.db_name)
    }
}

/// How a flow filter gets its value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowFilterValue {
    /// Literal, parsed as the source column's type
    Const(&'static str),
    /// The current record's value of this field (db name)
    Field(&'static str),
    /// Filter expression on the source column
    Filter(&'static str),
}

/// One condition of a FlowField over its source table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlowFilterSpec {
    /// Source column (db name)
    pub field: &'static str,
    pub value: FlowFilterValue,
}

impl FlowFilterSpec {
    pub const fn constant(field: &'static str, value: &'static str) -> Self {
        Self {
            field,
            value: FlowFilterValue::Const(value),
        }
    }

    pub const fn field(field: &'static str, source: &'static str) -> Self {
        Self {
            field,
            value: FlowFilterValue::Field(source),
        }
    }

    pub const fn filter(field: &'static str, expr: &'static str) -> Self {
        Self {
            field,
            value: FlowFilterValue::Filter(expr),
        }
    }
}

/// A computed, never-stored field
#[derive(Debug, Clone, Copy)]
pub struct FlowFieldSpec {
    pub name: &'static str,
    pub db_name: &'static str,
    pub formula: CalcFormula,
    pub result_type: FieldType,
    pub scale: u32,
    /// Display name of the source table
    pub source_table: &'static str,
    /// Columns of the source table
    pub source_columns: &'static [ColumnSpec],
    /// Aggregated column (db name); unused by Count and Exist
    pub source_field: Option<&'static str>,
    pub filters: &'static [FlowFilterSpec],
}

impl FlowFieldSpec {
    pub const fn new(
        name: &'static str,
        db_name: &'static str,
        formula: CalcFormula,
        result_type: FieldType,
        source_table: &'static str,
        source_columns: &'static [ColumnSpec],
    ) -> Self {
        Self {
            name,
            db_name,
            formula,
            result_type,
            scale: crate::schema::DEFAULT_SCALE,
            source_table,
            source_columns,
            source_field: None,
            filters: &[],
        }
    }

    pub const fn source_field(mut self, field: &'static str) -> Self {
        self.source_field = Some(field);
        self
    }

    pub const fn filters(mut self, filters: &'static [FlowFilterSpec]) -> Self {
        self.filters = filters;
        self
    }

    pub const fn scale(mut self, scale: u32) -> Self {
        self.scale = scale;
        self
    }

    pub fn matches(&self, name: &str) -> bool {
        self.db_name.eq_ignore_ascii_case(name) || self.name.eq_ignore_ascii_case(name)
    }

    pub(crate) fn source_column(&self, db_name: &str) -> Result<&'static ColumnSpec> {
        self.source_columns
            .iter()
            .find(|c| c.db_name == db_name)
            .ok_or_else(|| Error::unknown_field(self.source_table, db_name))
    }
}

/// A secondary key: indexed, usable as a sort order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeySpec {
    pub name: &'static str,
    /// Column names in key order
    pub fields: &'static [&'static str],
    pub unique: bool,
}

impl KeySpec {
    pub const fn new(name: &'static str, fields: &'static [&'static str]) -> Self {
        Self {
            name,
            fields,
            unique: false,
        }
    }

    pub const fn unique(mut self) -> Self {
        self.unique = true;
        self
    }
}

/// A generated record type bound to exactly one table
pub trait Table: Clone + Default + fmt::Debug + 'static {
    const TABLE_ID: u32;
    /// Display name; physical tables are named `<company>$<TABLE_NAME>`
    const TABLE_NAME: &'static str;
    /// Stored columns in column order
    const COLUMNS: &'static [ColumnSpec];
    const FLOW_FIELDS: &'static [FlowFieldSpec];
    const KEYS: &'static [KeySpec];

    /// Current value of a column or FlowField, by db name
    fn get_value(&self, field: &str) -> Option<Value>;

    /// Coerce and assign a column or FlowField, by db name
    ///
    /// On error the field keeps its previous value.
    fn set_value(&mut self, field: &str, value: Value) -> Result<()>;

    /// Non-key columns whose value differs from `old`; blobs always count
    fn changed_fields(&self, old: &Self) -> Vec<&'static str>;

    /// Field validator: relation check (if any) then the custom hook
    fn on_validate(&mut self, field: &str, binding: &Binding<'_>) -> Result<()>;

    /// Structural constraints: required, length, numeric range
    fn validate(&self) -> Result<()> {
        for column in Self::COLUMNS {
            let value = self.get_value(column.db_name).unwrap_or_default();
            check_column(Self::TABLE_NAME, column, &value)?;
        }
        Ok(())
    }

    /// Resolve a stored column by db name or display name
    fn column(name: &str) -> Option<&'static ColumnSpec> {
        Self::COLUMNS.iter().find(|c| c.matches(name))
    }

    fn flow_field(name: &str) -> Option<&'static FlowFieldSpec> {
        Self::FLOW_FIELDS.iter().find(|f| f.matches(name))
    }

    fn primary_key() -> Vec<&'static ColumnSpec> {
        Self::COLUMNS.iter().filter(|c| c.primary_key).collect()
    }

    /// Primary key values in key order
    fn key_values(&self) -> Vec<Value> {
        Self::primary_key()
            .into_iter()
            .map(|c| self.get_value(c.db_name).unwrap_or_default())
            .collect()
    }
}

/// Lifecycle hooks, implemented in the editable skeleton
///
/// Each hook runs before its mutation when the caller asks for triggers;
/// returning an error aborts the mutation before any SQL is issued.
pub trait Triggers: Table {
    fn on_insert(&mut self) -> Result<()> {
        self.validate()
    }

    fn on_modify(&mut self) -> Result<()> {
        self.validate()
    }

    /// Receives the binding for referential checks against other tables
    fn on_delete(&self, binding: &Binding<'_>) -> Result<()> {
        let _ = binding;
        Ok(())
    }

    fn on_rename(&mut self) -> Result<()> {
        Ok(())
    }
}

fn check_column(table: &str, column: &ColumnSpec, value: &Value) -> Result<()> {
    if column.required && value.is_blank() {
        return Err(Error::MissingRequiredField {
            table: table.to_string(),
            field: column.db_name.to_string(),
        });
    }

    if let (Some(max), Value::Text(_) | Value::Code(_)) = (column.length, value) {
        if value.to_string().chars().count() > max {
            return Err(Error::FieldTooLong {
                table: table.to_string(),
                field: column.db_name.to_string(),
                max,
            });
        }
    }

    if column.min.is_some() || column.max.is_some() {
        let below = column
            .min
            .and_then(|min| compare_to_bound(value, min))
            .is_some_and(|o| o == Ordering::Less);
        let above = column
            .max
            .and_then(|max| compare_to_bound(value, max))
            .is_some_and(|o| o == Ordering::Greater);
        if below || above {
            let bound = |b: Option<f64>| b.map(|v| v.to_string()).unwrap_or_else(|| "any".into());
            return Err(Error::OutOfRange {
                table: table.to_string(),
                field: column.db_name.to_string(),
                min: bound(column.min),
                max: bound(column.max),
            });
        }
    }

    Ok(())
}

/// Decimals compare exactly against the bound; None for non-numeric values
fn compare_to_bound(value: &Value, bound: f64) -> Option<Ordering> {
    match value {
        Value::Decimal(d) => Decimal::from_f64(bound).map(|b| d.cmp(&b)),
        Value::Int(i) => (*i as f64).partial_cmp(&bound),
        _ => None,
    }
}
