//! Template engine for generated table code

use std::collections::HashMap;
use tera::{Context, Tera};

use super::model::TableModel;
use crate::error::Result;

pub const GENERATED: &str = "table_gen.rs";
pub const SKELETON: &str = "table.rs";
pub const MODULES: &str = "mod.rs";

/// Template engine wrapper
pub struct TemplateEngine {
    tera: Tera,
}

impl TemplateEngine {
    /// Engine with the built-in templates registered
    pub fn new() -> Result<Self> {
        let mut engine = Self::empty();
        engine.add_template(GENERATED, generated_template())?;
        engine.add_template(SKELETON, skeleton_template())?;
        engine.add_template(MODULES, modules_template())?;
        Ok(engine)
    }

    /// Engine without templates, filters only
    pub fn empty() -> Self {
        let mut tera = Tera::default();
        tera.autoescape_on(vec![]);
        tera.register_filter("rust_str", rust_str_filter);
        Self { tera }
    }

    /// Add or replace a template
    pub fn add_template(&mut self, name: &str, content: &str) -> Result<()> {
        self.tera.add_raw_template(name, content)?;
        Ok(())
    }

    /// Render one table through `template`
    pub fn render_table(&self, template: &str, table: &TableModel) -> Result<String> {
        let context = Context::from_serialize(table)?;
        Ok(self.tera.render(template, &context)?)
    }

    /// Render the module index for all generated tables
    pub fn render_modules(&self, tables: &[TableModel]) -> Result<String> {
        let modules: Vec<serde_json::Value> = tables
            .iter()
            .map(|t| {
                serde_json::json!({
                    "module_name": t.module_name,
                    "exports": t.exports(),
                })
            })
            .collect();

        let mut context = Context::new();
        context.insert("modules", &modules);
        Ok(self.tera.render(MODULES, &context)?)
    }
}

/// Rust string literal for a template value
fn rust_str_filter(value: &tera::Value, _args: &HashMap<String, tera::Value>) -> tera::Result<tera::Value> {
    match value {
        tera::Value::String(s) => Ok(tera::Value::String(format!("{:?}", s))),
        other => Err(tera::Error::msg(format!("rust_str expects a string, got {}", other))),
    }
}

fn generated_template() -> &'static str {
    r#"// @generated by tabula from {{ source_file }}. Do not edit: this file is
// rewritten on every run. Business logic belongs in {{ module_name }}.rs.

use {{ runtime_crate }}::prelude::*;
{% for option in options %}
/// Options of `{{ table_name }}.{{ option.field }}`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum {{ option.enum_name }} {
{%- for variant in option.variants %}
{%- if loop.first %}
    #[default]
{%- endif %}
    {{ variant.ident }} = {{ variant.index }},
{%- endfor %}
}

impl OptionField for {{ option.enum_name }} {
    const OPTIONS: &'static [&'static str] = &[{{ option.labels }}];

    fn from_index(index: i64) -> Option<Self> {
        match index {
{%- for variant in option.variants %}
            {{ variant.index }} => Some(Self::{{ variant.ident }}),
{%- endfor %}
            _ => None,
        }
    }

    fn index(self) -> i64 {
        self as i64
    }
}

impl FromValue for {{ option.enum_name }} {
    fn from_value(field: &str, value: Value) -> Result<Self> {
        option_from_value(field, value)
    }
}

impl From<{{ option.enum_name }}> for Value {
    fn from(option: {{ option.enum_name }}) -> Self {
        Value::Int(option.index())
    }
}
{% endfor %}
/// {{ table_name }} (table {{ table_id }})
#[derive(Debug, Clone, PartialEq)]
pub struct {{ struct_name }} {
{%- for field in fields %}
    /// {{ field.doc }}
    pub {{ field.ident }}: {{ field.rust_type }},
{%- endfor %}
}

impl Default for {{ struct_name }} {
    fn default() -> Self {
        Self {
{%- for field in fields %}
            {{ field.ident }}: {{ field.default_expr }},
{%- endfor %}
        }
    }
}

impl Table for {{ struct_name }} {
    const TABLE_ID: u32 = {{ table_id }};
    const TABLE_NAME: &'static str = {{ table_name | rust_str }};
    const COLUMNS: &'static [ColumnSpec] = &[
{%- for column in columns %}
        {{ column.spec }},
{%- endfor %}
    ];
    const FLOW_FIELDS: &'static [FlowFieldSpec] = &[
{%- for flow in flow_fields %}
        {{ flow }},
{%- endfor %}
    ];
    const KEYS: &'static [KeySpec] = &[
{%- for key in keys %}
        {{ key }},
{%- endfor %}
    ];

    fn get_value(&self, field: &str) -> Option<Value> {
        match field {
{%- for field in fields %}
            {{ field.ident | rust_str }} => Some({{ field.get_expr }}),
{%- endfor %}
            _ => None,
        }
    }

    fn set_value(&mut self, field: &str, value: Value) -> Result<()> {
        match field {
{%- for field in fields %}
            {{ field.ident | rust_str }} => self.{{ field.ident }} = FromValue::from_value(field, value)?,
{%- endfor %}
            _ => return Err(Error::unknown_field(Self::TABLE_NAME, field)),
        }
        Ok(())
    }

    fn changed_fields(&self, old: &Self) -> Vec<&'static str> {
        let mut changed = Vec::new();
{%- for column in columns %}{% if not column.primary_key %}
{%- if column.always_changed %}
        changed.push({{ column.ident | rust_str }});
{%- else %}
        if self.{{ column.ident }} != old.{{ column.ident }} {
            changed.push({{ column.ident | rust_str }});
        }
{%- endif %}
{%- endif %}{% endfor %}
        changed
    }

    fn on_validate(&mut self, field: &str, {% if has_relations %}binding{% else %}_binding{% endif %}: &Binding<'_>) -> Result<()> {
        match field {
{%- for column in columns %}
{%- if column.relation %}
            {{ column.ident | rust_str }} => {
                let related = binding.require_related::<{{ column.relation.target_path }}>(
                    Self::TABLE_NAME,
                    {{ column.ident | rust_str }},
                    {{ column.relation.target_field | rust_str }},
                    self.{{ column.ident }}.clone().into(),
                )?;
                self.custom_validate_{{ column.ident }}(related.as_ref())
            }
{%- else %}
            {{ column.ident | rust_str }} => self.custom_validate_{{ column.ident }}(),
{%- endif %}
{%- endfor %}
            _ => Err(Error::unknown_field(Self::TABLE_NAME, field)),
        }
    }
}
"#
}

fn skeleton_template() -> &'static str {
    r#"//! {{ table_name }} (table {{ table_id }})
//!
//! Written once by tabula; edit freely. Generated code lives in
//! {{ module_name }}_gen.rs.

#[path = "{{ module_name }}_gen.rs"]
mod generated;

pub use generated::*;

use {{ runtime_crate }}::prelude::*;
{%- for import in imports %}
use super::{{ import }};
{%- endfor %}

impl Triggers for {{ struct_name }} {
    fn on_insert(&mut self) -> Result<()> {
        self.validate()
    }

    fn on_modify(&mut self) -> Result<()> {
        self.validate()
    }

    fn on_delete(&self, _binding: &Binding<'_>) -> Result<()> {
        Ok(())
    }

    fn on_rename(&mut self) -> Result<()> {
        Ok(())
    }
}

impl {{ struct_name }} {
{%- for column in columns %}
{%- if not loop.first %}
{% endif %}
{%- if column.relation %}
    fn custom_validate_{{ column.ident }}(&mut self, _related: Option<&{{ column.relation.target_struct }}>) -> Result<()> {
        Ok(())
    }
{%- else %}
    fn custom_validate_{{ column.ident }}(&mut self) -> Result<()> {
        Ok(())
    }
{%- endif %}
{%- endfor %}
}
"#
}

fn modules_template() -> &'static str {
    r#"// @generated by tabula. Do not edit: this file is rewritten on every run.
{% for module in modules %}
pub mod {{ module.module_name }};
{%- endfor %}
{% for module in modules %}
pub use {{ module.module_name }}::{ {{- module.exports | join(sep=", ") -}} };
{%- endfor %}
"#
}
