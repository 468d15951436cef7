//! FlowField evaluation
//!
//! Each FlowField is one aggregate query over its source table, filtered by
//! the declared flow filters compiled through the same [`FilterSet`] as
//! record filters. Results are written into the record only; nothing is
//! cached.

use rusqlite::types::{Value as SqlValue, ValueRef};
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;

use super::{logged, Record};
use crate::error::{Error, Result};
use crate::query::executor;
use crate::query::filter::{FilterSet, Predicate};
use crate::schema::{CalcFormula, FieldType};
use crate::storage::value::Value;
use crate::storage::Binding;
use crate::table::{ColumnSpec, FlowFieldSpec, FlowFilterValue, Table};

impl<'s, T: Table> Record<'s, T> {
    /// Compute the named FlowFields, or all of them for an empty list
    pub fn calc_fields(&mut self, names: &[&str]) -> Result<()> {
        let binding = self.binding()?.clone();

        let specs: Vec<&'static FlowFieldSpec> = if names.is_empty() {
            T::FLOW_FIELDS.iter().collect()
        } else {
            names
                .iter()
                .map(|name| {
                    T::flow_field(name).ok_or_else(|| {
                        if T::column(name).is_some() {
                            Error::validation(T::TABLE_NAME, format!("'{}' is not a FlowField", name))
                        } else {
                            Error::unknown_field(T::TABLE_NAME, *name)
                        }
                    })
                })
                .collect::<Result<_>>()?
        };

        for spec in specs {
            let value = logged::<T, _>("calc_fields", evaluate(&binding, &self.data, spec))?;
            self.data.set_value(spec.db_name, value)?;
        }
        Ok(())
    }
}

/// Source-table predicate of a FlowField for one record
fn flow_predicate<T: Table>(record: &T, spec: &FlowFieldSpec) -> Result<Predicate> {
    let mut filters = FilterSet::new();
    for filter in spec.filters {
        let column = spec.source_column(filter.field)?;
        match filter.value {
            FlowFilterValue::Const(text) => {
                let value = column.parse_literal(text)?;
                filters.set_range(column, value.clone(), value)?;
            }
            FlowFilterValue::Field(name) => {
                let value = record
                    .get_value(name)
                    .ok_or_else(|| Error::unknown_field(T::TABLE_NAME, name))?;
                filters.set_range(column, value.clone(), value)?;
            }
            FlowFilterValue::Filter(expr) => filters.set_expression(column, expr)?,
        }
    }
    filters.compile()
}

fn evaluate<T: Table>(binding: &Binding<'_>, record: &T, spec: &FlowFieldSpec) -> Result<Value> {
    let predicate = flow_predicate(record, spec)?;
    let table = spec.source_table;

    let source = || -> Result<&'static ColumnSpec> {
        let field = spec.source_field.ok_or_else(|| {
            Error::schema(
                T::TABLE_NAME,
                format!("FlowField '{}' has no source field", spec.db_name),
            )
        })?;
        spec.source_column(field)
    };

    if matches!(spec.formula, CalcFormula::Sum | CalcFormula::Average) {
        let column = source()?;
        if column.field_type == FieldType::Decimal {
            return decimal_total(binding, table, column, &predicate, spec);
        }
    }

    let raw = match spec.formula {
        CalcFormula::Exist => return Ok(Value::Bool(executor::exists(binding, table, &predicate)?)),
        CalcFormula::Count => executor::aggregate(binding, table, "COUNT(*)", &predicate, "")?,
        CalcFormula::Sum => {
            let select = format!("COALESCE(SUM({}), 0)", source()?.quoted());
            executor::aggregate(binding, table, &select, &predicate, "")?
        }
        CalcFormula::Average => {
            let select = format!("AVG({})", source()?.quoted());
            executor::aggregate(binding, table, &select, &predicate, "")?
        }
        CalcFormula::Min => {
            let select = format!("MIN({})", source()?.quoted());
            executor::aggregate(binding, table, &select, &predicate, "")?
        }
        CalcFormula::Max => {
            let select = format!("MAX({})", source()?.quoted());
            executor::aggregate(binding, table, &select, &predicate, "")?
        }
        CalcFormula::Lookup => {
            let order: Vec<String> = spec
                .source_columns
                .iter()
                .filter(|c| c.primary_key)
                .map(|c| format!("{} ASC", c.quoted()))
                .collect();
            let tail = if order.is_empty() {
                " LIMIT 1".to_string()
            } else {
                format!(" ORDER BY {} LIMIT 1", order.join(", "))
            };
            executor::aggregate(binding, table, &source()?.quoted(), &predicate, &tail)?
        }
    };

    to_result(spec, raw)
}

/// Sum or average of a decimal column, folded exactly in `Decimal`
fn decimal_total(
    binding: &Binding<'_>,
    table: &str,
    column: &ColumnSpec,
    predicate: &Predicate,
    spec: &FlowFieldSpec,
) -> Result<Value> {
    let overflow = || Error::InvalidValue {
        field: spec.db_name.to_string(),
        value: String::new(),
        reason: "aggregate overflows a decimal".to_string(),
    };

    let mut total = Decimal::ZERO;
    let mut rows = 0u64;
    for raw in executor::column_values(binding, table, column, predicate)? {
        if let Value::Decimal(d) = Value::from_sql(column.db_name, FieldType::Decimal, ValueRef::from(&raw))? {
            total = total.checked_add(d).ok_or_else(overflow)?;
            rows += 1;
        }
    }

    let result = match spec.formula {
        CalcFormula::Average if rows > 0 => total
            .checked_div(Decimal::from(rows))
            .ok_or_else(overflow)?
            .round_dp(spec.scale),
        CalcFormula::Average => Decimal::ZERO,
        _ => total,
    };
    match spec.result_type {
        FieldType::Integer => result.round().to_i64().map(Value::Int).ok_or_else(overflow),
        _ => Ok(Value::Decimal(result)),
    }
}

/// Convert an aggregate to the FlowField's type; no rows gives the zero value
fn to_result(spec: &FlowFieldSpec, raw: Option<SqlValue>) -> Result<Value> {
    let raw = match raw {
        None | Some(SqlValue::Null) => return Ok(Value::zero(spec.result_type)),
        Some(raw) => raw,
    };

    match (spec.result_type, &raw) {
        (FieldType::Decimal, SqlValue::Real(r)) => Decimal::from_f64(*r)
            .map(|d| Value::Decimal(d.round_dp(spec.scale)))
            .ok_or_else(|| Error::InvalidValue {
                field: spec.db_name.to_string(),
                value: r.to_string(),
                reason: "aggregate is not a finite number".to_string(),
            }),
        (FieldType::Integer, SqlValue::Real(r)) => Ok(Value::Int(r.round() as i64)),
        _ => Value::from_sql(spec.db_name, spec.result_type, ValueRef::from(&raw)),
    }
}
