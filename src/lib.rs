//! Tabula - typed business records over SQL
//!
//! Table schemas in YAML are compiled into Rust record types; a small
//! runtime gives every record filtering, navigation, change-tracked
//! writes, computed FlowFields and field validation.
//!
//! # Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                            Tabula                               │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  ┌─────────────┐  ┌─────────────┐  ┌─────────────────────────┐  │
//! │  │   Schema    │─►│   Codegen   │─►│  Generated tables       │  │
//! │  │   (YAML)    │  │   (tera)    │  │  impl Table + Triggers  │  │
//! │  └─────────────┘  └─────────────┘  └───────────┬─────────────┘  │
//! │                                                │                │
//! │                                                ▼                │
//! │  ┌─────────────────────────────────────────────────────────────┐│
//! │  │                      Record<T>                              ││
//! │  │  filters · cursor · snapshot · FlowFields · validate_field  ││
//! │  └──────────────┬──────────────────────────────┬───────────────┘│
//! │                 │                              │                │
//! │                 ▼                              ▼                │
//! │  ┌──────────────────────────┐  ┌──────────────────────────────┐ │
//! │  │  Filter DSL (tabql)      │  │  Query executor              │ │
//! │  │  "10..20|>100"  ─► SQL   │  │  SELECT / UPDATE / DELETE    │ │
//! │  └──────────────────────────┘  └──────────────┬───────────────┘ │
//! │                                               │                 │
//! │                                               ▼                 │
//! │  ┌─────────────────────────────────────────────────────────────┐│
//! │  │                Store (SQLite) / Binding                     ││
//! │  │  one physical table per company: "<Company>$<Table>"        ││
//! │  └─────────────────────────────────────────────────────────────┘│
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod codegen;
pub mod config;
pub mod error;
pub mod query;
pub mod record;
pub mod schema;
pub mod storage;
pub mod table;
pub mod validation;

pub use config::{Config, GeneratorConfig, RuntimeConfig};
pub use error::{Error, Result};
pub use record::Record;
pub use schema::{CalcFormula, FieldType, SchemaRegistry, TableDef};
pub use storage::{Binding, Code, Store, Value};
pub use table::{Table, Triggers};

/// Everything generated table code refers to
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::record::Record;
    pub use crate::schema::{CalcFormula, FieldType};
    pub use crate::storage::value::option_from_value;
    pub use crate::storage::{Binding, Code, FromValue, OptionField, Store, Value};
    pub use crate::table::{
        ColumnSpec, FlowFieldSpec, FlowFilterSpec, FlowFilterValue, KeySpec, Table, Triggers,
    };
    pub use chrono::{NaiveDate, NaiveDateTime};
    pub use rust_decimal::Decimal;
}
