// @generated by tabula from payment_terms.yaml. Do not edit: this file is
// rewritten on every run. Business logic belongs in payment_terms.rs.

use tabula::prelude::*;

/// Payment Terms (table 3)
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentTerms {
    /// Code
    pub code: Code,
    /// Description
    pub description: String,
    /// Due Days
    pub due_days: i64,
    /// Discount %
    pub discount: Decimal,
    /// Active
    pub active: bool,
}

impl Default for PaymentTerms {
    fn default() -> Self {
        Self {
            code: Code::default(),
            description: String::new(),
            due_days: 0,
            discount: Decimal::ZERO,
            active: true,
        }
    }
}

impl Table for PaymentTerms {
    const TABLE_ID: u32 = 3;
    const TABLE_NAME: &'static str = "Payment Terms";
    const COLUMNS: &'static [ColumnSpec] = &[
        ColumnSpec::new("Code", "code", FieldType::Code).primary_key().length(10),
        ColumnSpec::new("Description", "description", FieldType::Text).length(100),
        ColumnSpec::new("Due Days", "due_days", FieldType::Integer).range(Some(0.0), Some(365.0)),
        ColumnSpec::new("Discount %", "discount", FieldType::Decimal).range(Some(0.0), Some(100.0)),
        ColumnSpec::new("Active", "active", FieldType::Boolean),
    ];
    const FLOW_FIELDS: &'static [FlowFieldSpec] = &[
    ];
    const KEYS: &'static [KeySpec] = &[
    ];

    fn get_value(&self, field: &str) -> Option<Value> {
        match field {
            "code" => Some(self.code.clone().into()),
            "description" => Some(self.description.clone().into()),
            "due_days" => Some(self.due_days.into()),
            "discount" => Some(self.discount.into()),
            "active" => Some(self.active.into()),
            _ => None,
        }
    }

    fn set_value(&mut self, field: &str, value: Value) -> Result<()> {
        match field {
            "code" => self.code = FromValue::from_value(field, value)?,
            "description" => self.description = FromValue::from_value(field, value)?,
            "due_days" => self.due_days = FromValue::from_value(field, value)?,
            "discount" => self.discount = FromValue::from_value(field, value)?,
            "active" => self.active = FromValue::from_value(field, value)?,
            _ => return Err(Error::unknown_field(Self::TABLE_NAME, field)),
        }
        Ok(())
    }

    fn changed_fields(&self, old: &Self) -> Vec<&'static str> {
        let mut changed = Vec::new();
        if self.description != old.description {
            changed.push("description");
        }
        if self.due_days != old.due_days {
            changed.push("due_days");
        }
        if self.discount != old.discount {
            changed.push("discount");
        }
        if self.active != old.active {
            changed.push("active");
        }
        changed
    }

    fn on_validate(&mut self, field: &str, _binding: &Binding<'_>) -> Result<()> {
        match field {
            "code" => self.custom_validate_code(),
            "description" => self.custom_validate_description(),
            "due_days" => self.custom_validate_due_days(),
            "discount" => self.custom_validate_discount(),
            "active" => self.custom_validate_active(),
            _ => Err(Error::unknown_field(Self::TABLE_NAME, field)),
        }
    }
}
