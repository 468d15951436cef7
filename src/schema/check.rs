//! Schema validation
//!
//! Every check runs before the generator writes a single file.

use std::collections::HashSet;

use super::{FieldDef, FieldType, FlowFilterKind, SchemaRegistry, TableDef};
use crate::error::{Error, Result};
use crate::storage::value::Value;
use crate::validation;

/// Check one table on its own
pub fn check_table(table: &TableDef) -> Result<()> {
    validation::validate_table_name(&table.name)
        .map_err(|e| Error::schema(&table.name, e.to_string()))?;

    if table.fields.is_empty() {
        return Err(Error::schema(&table.name, "table has no fields"));
    }

    if table.primary_key().is_empty() {
        return Err(Error::MissingPrimaryKey {
            table: table.name.clone(),
        });
    }

    let mut names = HashSet::new();
    let mut db_names = HashSet::new();
    for field in &table.fields {
        if field.name.trim().is_empty() {
            return Err(Error::schema(&table.name, "a field has an empty name"));
        }
        if !names.insert(field.name.to_lowercase()) {
            return Err(Error::DuplicateField {
                table: table.name.clone(),
                field: field.name.clone(),
            });
        }

        let db_name = field.db_name();
        validation::validate_db_name(&db_name).map_err(|e| {
            Error::schema(&table.name, format!("field '{}': {}", field.name, e))
        })?;
        if !db_names.insert(db_name.clone()) {
            return Err(Error::DuplicateField {
                table: table.name.clone(),
                field: db_name,
            });
        }

        check_field(table, field)?;
    }

    for key in &table.keys {
        validation::validate_table_name(&key.name)
            .map_err(|e| Error::schema(&table.name, format!("key: {}", e)))?;
        if key.fields.is_empty() {
            return Err(Error::schema(&table.name, format!("key '{}' has no fields", key.name)));
        }
        for name in &key.fields {
            match table.get_field(name) {
                Some(field) if field.is_stored() => {}
                Some(_) => {
                    return Err(Error::schema(
                        &table.name,
                        format!("key '{}' cannot contain FlowField '{}'", key.name, name),
                    ))
                }
                None => {
                    return Err(Error::schema(
                        &table.name,
                        format!("key '{}' references unknown field '{}'", key.name, name),
                    ))
                }
            }
        }
    }

    Ok(())
}

fn check_field(table: &TableDef, field: &FieldDef) -> Result<()> {
    let fail = |message: &str| -> Result<()> {
        Err(Error::schema(
            &table.name,
            format!("field '{}': {}", field.name, message),
        ))
    };

    if field.field_type == FieldType::Option && field.options.is_empty() {
        return fail("option fields need at least one option");
    }
    if field.field_type != FieldType::Option && !field.options.is_empty() {
        return fail("only option fields take options");
    }
    if field.length == Some(0) {
        return fail("length must be positive");
    }
    if field.primary_key && field.field_type == FieldType::Blob {
        return fail("blob fields cannot be part of the primary key");
    }
    if field.auto_timestamp && field.field_type != FieldType::DateTime {
        return fail("auto_timestamp requires a datetime field");
    }

    if field.flow_field {
        if field.primary_key {
            return fail("a FlowField cannot be part of the primary key");
        }
        if field.table_relation.is_some() {
            return fail("a FlowField cannot declare a table relation");
        }
        let Some(formula) = field.calc_formula else {
            return fail("FlowFields need a calc_formula");
        };
        if field.source_table.is_none() {
            return fail("FlowFields need a source_table");
        }
        if formula.needs_source_field() && field.source_field.is_none() {
            return fail("this calc_formula needs a source_field");
        }
    } else if field.calc_formula.is_some()
        || field.source_table.is_some()
        || !field.flow_filters.is_empty()
    {
        return fail("calc_formula, source_table and flow_filters require flow_field: true");
    }

    if let Some(range) = field.validation {
        if !field.field_type.is_numeric() {
            return fail("validation bounds require a numeric field");
        }
        if let (Some(min), Some(max)) = (range.min, range.max) {
            if min > max {
                return fail("validation min is greater than max");
            }
        }
    }

    if let Some(default) = &field.default {
        if field.field_type == FieldType::Blob {
            return fail("blob fields cannot have a default");
        }
        let text = yaml_scalar(default).ok_or_else(|| {
            Error::schema(
                &table.name,
                format!("field '{}': default must be a scalar", field.name),
            )
        })?;
        let options: Vec<&str> = field.options.iter().map(String::as_str).collect();
        Value::parse_literal(&field.db_name(), field.field_type, &options, &text)?;
    }

    Ok(())
}

/// Check relation targets and FlowField sources against the registry
pub fn check_references(table: &TableDef, registry: &SchemaRegistry) -> Result<()> {
    for field in &table.fields {
        if let Some(relation) = &field.table_relation {
            let target = registry.get(&relation.table).ok_or_else(|| {
                Error::schema(
                    &table.name,
                    format!(
                        "field '{}' relates to unknown table '{}'",
                        field.name, relation.table
                    ),
                )
            })?;
            stored_field(target, &relation.field).ok_or_else(|| {
                Error::schema(
                    &table.name,
                    format!(
                        "field '{}' relates to unknown field '{}' of '{}'",
                        field.name, relation.field, target.name
                    ),
                )
            })?;
        }

        if !field.flow_field {
            continue;
        }

        let source_name = field.source_table.as_deref().unwrap_or_default();
        let source = registry.get(source_name).ok_or_else(|| {
            Error::schema(
                &table.name,
                format!(
                    "FlowField '{}' reads unknown table '{}'",
                    field.name, source_name
                ),
            )
        })?;

        if let Some(source_field) = &field.source_field {
            stored_field(source, source_field).ok_or_else(|| {
                Error::schema(
                    &table.name,
                    format!(
                        "FlowField '{}' reads unknown field '{}' of '{}'",
                        field.name, source_field, source.name
                    ),
                )
            })?;
        }

        for filter in &field.flow_filters {
            let target = stored_field(source, &filter.field).ok_or_else(|| {
                Error::schema(
                    &table.name,
                    format!(
                        "FlowField '{}' filters unknown field '{}' of '{}'",
                        field.name, filter.field, source.name
                    ),
                )
            })?;

            match filter.kind {
                FlowFilterKind::Const => {
                    let options: Vec<&str> = target.options.iter().map(String::as_str).collect();
                    Value::parse_literal(&target.db_name(), target.field_type, &options, &filter.value)?;
                }
                FlowFilterKind::Field => {
                    if table.get_field(&filter.value).is_none() {
                        return Err(Error::schema(
                            &table.name,
                            format!(
                                "FlowField '{}' filter takes its value from unknown field '{}'",
                                field.name, filter.value
                            ),
                        ));
                    }
                }
                FlowFilterKind::Filter => {
                    tabql::parse(&filter.value)
                        .map_err(|e| Error::filter(target.db_name(), e))?;
                }
            }
        }
    }

    Ok(())
}

fn stored_field<'a>(table: &'a TableDef, name: &str) -> Option<&'a FieldDef> {
    table.get_field(name).filter(|f| f.is_stored())
}

/// Text form of a scalar YAML default
pub(crate) fn yaml_scalar(value: &serde_yaml::Value) -> Option<String> {
    match value {
        serde_yaml::Value::Bool(b) => Some(b.to_string()),
        serde_yaml::Value::Number(n) => Some(n.to_string()),
        serde_yaml::Value::String(s) => Some(s.clone()),
        _ => None,
    }
}
