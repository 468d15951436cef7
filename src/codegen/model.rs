//! Template context for one table
//!
//! All Rust expressions are built here so the templates only lay them out.

use convert_case::Case;
use serde::Serialize;
use std::collections::HashSet;

use crate::error::{Error, Result};
use crate::schema::check::yaml_scalar;
use crate::schema::{FieldDef, FieldType, FlowFilterKind, SchemaRegistry, TableDef, DEFAULT_SCALE};
use crate::storage::value::Value;
use crate::validation::convert_display_name;

#[derive(Debug, Serialize)]
pub struct TableModel {
    pub source_file: String,
    pub runtime_crate: String,
    pub module_name: String,
    pub struct_name: String,
    pub table_name: String,
    pub table_id: u32,
    pub fields: Vec<FieldModel>,
    pub columns: Vec<ColumnModel>,
    pub flow_fields: Vec<String>,
    pub keys: Vec<String>,
    pub options: Vec<OptionModel>,
    /// Related structs the skeleton has to import
    pub imports: Vec<String>,
    pub has_relations: bool,
}

#[derive(Debug, Serialize)]
pub struct FieldModel {
    pub ident: String,
    pub doc: String,
    pub rust_type: String,
    pub default_expr: String,
    pub get_expr: String,
}

#[derive(Debug, Serialize)]
pub struct ColumnModel {
    pub ident: String,
    pub spec: String,
    pub primary_key: bool,
    pub always_changed: bool,
    pub relation: Option<RelationModel>,
}

#[derive(Debug, Serialize)]
pub struct RelationModel {
    /// Path from the generated module
    pub target_path: String,
    /// Name as imported by the skeleton
    pub target_struct: String,
    pub target_field: String,
}

#[derive(Debug, Serialize)]
pub struct OptionModel {
    pub field: String,
    pub enum_name: String,
    pub labels: String,
    pub variants: Vec<VariantModel>,
}

#[derive(Debug, Clone, Serialize)]
pub struct VariantModel {
    pub ident: String,
    pub index: usize,
}

impl TableModel {
    pub fn build(
        table: &TableDef,
        registry: &SchemaRegistry,
        source_file: &str,
        runtime_crate: &str,
    ) -> Result<Self> {
        let struct_name = table.struct_name();
        let mut options = Vec::new();
        let mut fields = Vec::new();
        let mut columns = Vec::new();
        let mut flow_fields = Vec::new();
        let mut imports = Vec::new();

        for field in &table.fields {
            let ident = field.db_name();
            let option = if field.field_type == FieldType::Option {
                let model = option_model(&struct_name, field);
                options.push(model);
                options.last()
            } else {
                None
            };
            let enum_name = option.map(|o| o.enum_name.clone());

            fields.push(FieldModel {
                doc: field_doc(field),
                rust_type: rust_type(field.field_type, enum_name.as_deref()),
                default_expr: default_expr(table, field, option)?,
                get_expr: if is_copy(field.field_type) {
                    format!("self.{}.into()", ident)
                } else {
                    format!("self.{}.clone().into()", ident)
                },
                ident: ident.clone(),
            });

            if field.flow_field {
                flow_fields.push(flow_field_spec(table, field, registry)?);
                continue;
            }

            let relation = match &field.table_relation {
                Some(relation) => {
                    let target = registry.require(&relation.table)?;
                    let target_field = target
                        .get_field(&relation.field)
                        .map(FieldDef::db_name)
                        .ok_or_else(|| Error::unknown_field(&target.name, &relation.field))?;
                    let target_struct = target.struct_name();
                    let target_path = if target.name.eq_ignore_ascii_case(&table.name) {
                        "Self".to_string()
                    } else {
                        if !imports.contains(&target_struct) {
                            imports.push(target_struct.clone());
                        }
                        format!("super::super::{}", target_struct)
                    };
                    Some(RelationModel {
                        target_path,
                        target_struct,
                        target_field,
                    })
                }
                None => None,
            };

            columns.push(ColumnModel {
                spec: column_spec(field),
                primary_key: field.primary_key,
                always_changed: field.field_type == FieldType::Blob,
                relation,
                ident,
            });
        }

        let keys = table
            .keys
            .iter()
            .map(|key| {
                let names = key
                    .fields
                    .iter()
                    .map(|name| {
                        table
                            .get_field(name)
                            .map(|f| format!("{:?}", f.db_name()))
                            .ok_or_else(|| Error::unknown_field(&table.name, name))
                    })
                    .collect::<Result<Vec<_>>>()?;
                let mut spec = format!("KeySpec::new({:?}, &[{}])", key.name, names.join(", "));
                if key.unique {
                    spec.push_str(".unique()");
                }
                Ok(spec)
            })
            .collect::<Result<Vec<_>>>()?;

        let has_relations = columns.iter().any(|c| c.relation.is_some());
        Ok(Self {
            source_file: source_file.to_string(),
            runtime_crate: runtime_crate.to_string(),
            module_name: table.module_name(),
            struct_name,
            table_name: table.name.clone(),
            table_id: table.id,
            fields,
            columns,
            flow_fields,
            keys,
            options,
            imports,
            has_relations,
        })
    }

    /// Names the output directory's `mod.rs` re-exports
    pub fn exports(&self) -> Vec<String> {
        std::iter::once(self.struct_name.clone())
            .chain(self.options.iter().map(|o| o.enum_name.clone()))
            .collect()
    }
}

fn field_doc(field: &FieldDef) -> String {
    let mut doc = field.name.clone();
    if field.flow_field {
        let formula = field
            .calc_formula
            .map(|f| format!("{:?}", f).to_lowercase())
            .unwrap_or_default();
        let source = field.source_table.as_deref().unwrap_or_default();
        doc = match &field.source_field {
            Some(source_field) => format!("{} (FlowField: {} of {}.{})", doc, formula, source, source_field),
            None => format!("{} (FlowField: {} over {})", doc, formula, source),
        };
    } else if let Some(description) = &field.description {
        doc = format!("{}: {}", doc, description);
    }
    doc
}

fn rust_type(field_type: FieldType, enum_name: Option<&str>) -> String {
    match field_type {
        FieldType::Text => "String".into(),
        FieldType::Code => "Code".into(),
        FieldType::Decimal => "Decimal".into(),
        FieldType::Date => "NaiveDate".into(),
        FieldType::DateTime => "NaiveDateTime".into(),
        FieldType::Boolean => "bool".into(),
        FieldType::Integer => "i64".into(),
        FieldType::Blob => "Vec<u8>".into(),
        FieldType::Option => enum_name.unwrap_or("i64").to_string(),
    }
}

fn is_copy(field_type: FieldType) -> bool {
    !matches!(
        field_type,
        FieldType::Text | FieldType::Code | FieldType::Blob
    )
}

fn option_model(struct_name: &str, field: &FieldDef) -> OptionModel {
    let field_pascal = pascal(&field.name);
    let mut seen = HashSet::new();
    let variants = field
        .options
        .iter()
        .enumerate()
        .map(|(index, label)| {
            let mut ident = variant_ident(label);
            if !seen.insert(ident.clone()) {
                ident = format!("{}{}", ident, index);
                seen.insert(ident.clone());
            }
            VariantModel { ident, index }
        })
        .collect();

    OptionModel {
        field: field.db_name(),
        enum_name: format!("{}{}", struct_name, field_pascal),
        labels: field
            .options
            .iter()
            .map(|o| format!("{:?}", o))
            .collect::<Vec<_>>()
            .join(", "),
        variants,
    }
}

fn pascal(text: &str) -> String {
    convert_display_name(text, Case::Pascal)
}

/// Enum variant for an option label: blank labels become `Blank`
fn variant_ident(label: &str) -> String {
    let ident = pascal(label);
    if ident.is_empty() {
        "Blank".to_string()
    } else if ident.starts_with(|c: char| c.is_ascii_digit()) {
        format!("N{}", ident)
    } else {
        ident
    }
}

fn column_spec(field: &FieldDef) -> String {
    let mut spec = format!(
        "ColumnSpec::new({:?}, {:?}, FieldType::{})",
        field.name,
        field.db_name(),
        field.field_type
    );
    if field.primary_key {
        spec.push_str(".primary_key()");
    }
    if let Some(length) = field.length {
        spec.push_str(&format!(".length({})", length));
    }
    if field.required {
        spec.push_str(".required()");
    }
    if field.auto_timestamp {
        spec.push_str(".auto_timestamp()");
    }
    if let Some(range) = field.validation {
        spec.push_str(&format!(
            ".range({}, {})",
            float_option(range.min),
            float_option(range.max)
        ));
    }
    if !field.options.is_empty() {
        let labels: Vec<String> = field.options.iter().map(|o| format!("{:?}", o)).collect();
        spec.push_str(&format!(".options(&[{}])", labels.join(", ")));
    }
    if field.field_type == FieldType::Decimal && field.scale() != DEFAULT_SCALE {
        spec.push_str(&format!(".scale({})", field.scale()));
    }
    spec
}

fn float_option(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("Some({:?})", v),
        None => "None".to_string(),
    }
}

fn flow_field_spec(table: &TableDef, field: &FieldDef, registry: &SchemaRegistry) -> Result<String> {
    let invalid = |message: String| Error::schema(&table.name, message);

    let formula = field
        .calc_formula
        .ok_or_else(|| invalid(format!("FlowField '{}' has no calc_formula", field.name)))?;
    let source_name = field
        .source_table
        .as_deref()
        .ok_or_else(|| invalid(format!("FlowField '{}' has no source_table", field.name)))?;
    let source = registry.require(source_name)?;

    let source_columns = if source.name.eq_ignore_ascii_case(&table.name) {
        "Self::COLUMNS".to_string()
    } else {
        format!("<super::super::{} as Table>::COLUMNS", source.struct_name())
    };

    let mut spec = format!(
        "FlowFieldSpec::new({:?}, {:?}, CalcFormula::{:?}, FieldType::{}, {:?}, {})",
        field.name,
        field.db_name(),
        formula,
        field.field_type,
        source.name,
        source_columns
    );

    if let Some(source_field) = &field.source_field {
        let db = source
            .get_field(source_field)
            .map(FieldDef::db_name)
            .ok_or_else(|| Error::unknown_field(&source.name, source_field))?;
        spec.push_str(&format!(".source_field({:?})", db));
    }

    if !field.flow_filters.is_empty() {
        let mut filters = Vec::new();
        for filter in &field.flow_filters {
            let target = source
                .get_field(&filter.field)
                .map(FieldDef::db_name)
                .ok_or_else(|| Error::unknown_field(&source.name, &filter.field))?;
            let value = match filter.kind {
                FlowFilterKind::Const => format!("FlowFilterValue::Const({:?})", filter.value),
                FlowFilterKind::Field => {
                    let own = table
                        .get_field(&filter.value)
                        .map(FieldDef::db_name)
                        .ok_or_else(|| Error::unknown_field(&table.name, &filter.value))?;
                    format!("FlowFilterValue::Field({:?})", own)
                }
                FlowFilterKind::Filter => format!("FlowFilterValue::Filter({:?})", filter.value),
            };
            filters.push(format!(
                "FlowFilterSpec {{ field: {:?}, value: {} }}",
                target, value
            ));
        }
        spec.push_str(&format!(".filters(&[{}])", filters.join(", ")));
    }

    if field.field_type == FieldType::Decimal && field.scale() != DEFAULT_SCALE {
        spec.push_str(&format!(".scale({})", field.scale()));
    }
    Ok(spec)
}

/// Rust expression for a field's initial value
fn default_expr(table: &TableDef, field: &FieldDef, option: Option<&OptionModel>) -> Result<String> {
    let Some(default) = &field.default else {
        return Ok(zero_expr(field.field_type, option));
    };

    let text = yaml_scalar(default)
        .ok_or_else(|| Error::schema(&table.name, format!("field '{}': default must be a scalar", field.name)))?;
    let labels: Vec<&str> = field.options.iter().map(String::as_str).collect();
    let value = Value::parse_literal(&field.db_name(), field.field_type, &labels, &text)?;

    let expr = match value {
        Value::Text(s) => format!("String::from({:?})", s),
        Value::Code(c) => format!("Code::new({:?})", c.as_str()),
        Value::Decimal(d) => format!("Decimal::from_i128_with_scale({}, {})", d.mantissa(), d.scale()),
        Value::Bool(b) => b.to_string(),
        Value::Int(i) => match option {
            Some(option) => {
                let variant = usize::try_from(i)
                    .ok()
                    .and_then(|i| option.variants.get(i))
                    .ok_or_else(|| {
                        Error::schema(&table.name, format!("field '{}': default option {} does not exist", field.name, i))
                    })?;
                format!("{}::{}", option.enum_name, variant.ident)
            }
            None => i.to_string(),
        },
        Value::Date(d) => {
            use chrono::Datelike;
            format!(
                "NaiveDate::from_ymd_opt({}, {}, {}).unwrap_or_default()",
                d.year(),
                d.month(),
                d.day()
            )
        }
        Value::DateTime(dt) => {
            use chrono::{Datelike, Timelike};
            format!(
                "NaiveDate::from_ymd_opt({}, {}, {}).and_then(|d| d.and_hms_opt({}, {}, {})).unwrap_or_default()",
                dt.year(),
                dt.month(),
                dt.day(),
                dt.hour(),
                dt.minute(),
                dt.second()
            )
        }
        Value::Null | Value::Blob(_) => zero_expr(field.field_type, option),
    };
    Ok(expr)
}

fn zero_expr(field_type: FieldType, option: Option<&OptionModel>) -> String {
    match field_type {
        FieldType::Text => "String::new()".into(),
        FieldType::Code => "Code::default()".into(),
        FieldType::Decimal => "Decimal::ZERO".into(),
        FieldType::Date => "NaiveDate::default()".into(),
        FieldType::DateTime => "NaiveDateTime::default()".into(),
        FieldType::Boolean => "false".into(),
        FieldType::Integer => "0".into(),
        FieldType::Blob => "Vec::new()".into(),
        FieldType::Option => match option {
            Some(option) => format!("{}::default()", option.enum_name),
            None => "0".into(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::FieldRange;

    #[test]
    fn test_variant_idents() {
        assert_eq!(variant_ident(" "), "Blank");
        assert_eq!(variant_ident("Credit Memo"), "CreditMemo");
        assert_eq!(variant_ident("30 Days"), "N30Days");
    }

    #[test]
    fn test_duplicate_labels_get_distinct_variants() {
        let field = FieldDef {
            options: vec!["A b".into(), "A-B".into()],
            ..FieldDef::new("Kind", FieldType::Option)
        };
        let model = option_model("Item", &field);
        assert_eq!(model.enum_name, "ItemKind");
        assert_eq!(model.variants[0].ident, "AB");
        assert_eq!(model.variants[1].ident, "AB1");
    }

    #[test]
    fn test_column_spec_expression() {
        let field = FieldDef {
            validation: Some(FieldRange {
                min: Some(0.0),
                max: None,
            }),
            ..FieldDef::new("Credit Limit", FieldType::Decimal)
        };
        assert_eq!(
            column_spec(&field),
            "ColumnSpec::new(\"Credit Limit\", \"credit_limit\", FieldType::Decimal).range(Some(0.0), None)"
        );
    }

    #[test]
    fn test_default_expressions() {
        let table = TableDef::new(3, "Payment Terms");
        let field = FieldDef {
            default: Some(serde_yaml::Value::String("2.50".into())),
            ..FieldDef::new("Discount %", FieldType::Decimal)
        };
        assert_eq!(
            default_expr(&table, &field, None).unwrap(),
            "Decimal::from_i128_with_scale(250, 2)"
        );

        let field = FieldDef {
            default: Some(serde_yaml::Value::Bool(true)),
            ..FieldDef::new("Active", FieldType::Boolean)
        };
        assert_eq!(default_expr(&table, &field, None).unwrap(), "true");

        let field = FieldDef::new("Due Date", FieldType::Date);
        assert_eq!(default_expr(&table, &field, None).unwrap(), "NaiveDate::default()");
    }
}
