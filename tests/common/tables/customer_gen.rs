// @generated by tabula from customer.yaml. Do not edit: this file is
// rewritten on every run. Business logic belongs in customer.rs.

use tabula::prelude::*;

/// Options of `Customer.blocked`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CustomerBlocked {
    #[default]
    Blank = 0,
    Ship = 1,
    Invoice = 2,
    All = 3,
}

impl OptionField for CustomerBlocked {
    const OPTIONS: &'static [&'static str] = &[" ", "Ship", "Invoice", "All"];

    fn from_index(index: i64) -> Option<Self> {
        match index {
            0 => Some(Self::Blank),
            1 => Some(Self::Ship),
            2 => Some(Self::Invoice),
            3 => Some(Self::All),
            _ => None,
        }
    }

    fn index(self) -> i64 {
        self as i64
    }
}

impl FromValue for CustomerBlocked {
    fn from_value(field: &str, value: Value) -> Result<Self> {
        option_from_value(field, value)
    }
}

impl From<CustomerBlocked> for Value {
    fn from(option: CustomerBlocked) -> Self {
        Value::Int(option.index())
    }
}

/// Customer (table 18)
#[derive(Debug, Clone, PartialEq)]
pub struct Customer {
    /// No.
    pub no: Code,
    /// Name
    pub name: String,
    /// City
    pub city: String,
    /// Payment Terms Code
    pub payment_terms_code: Code,
    /// Credit Limit
    pub credit_limit: Decimal,
    /// Blocked
    pub blocked: CustomerBlocked,
    /// Last Modified
    pub last_modified: NaiveDateTime,
    /// Balance (LCY) (FlowField: sum of Cust. Ledger Entry.Amount (LCY))
    pub balance_lcy: Decimal,
    /// No. of Entries (FlowField: count over Cust. Ledger Entry)
    pub no_of_entries: i64,
    /// Has Open Entries (FlowField: exist over Cust. Ledger Entry)
    pub has_open_entries: bool,
    /// Last Posting Date (FlowField: max of Cust. Ledger Entry.Posting Date)
    pub last_posting_date: NaiveDate,
}

impl Default for Customer {
    fn default() -> Self {
        Self {
            no: Code::default(),
            name: String::new(),
            city: String::new(),
            payment_terms_code: Code::default(),
            credit_limit: Decimal::ZERO,
            blocked: CustomerBlocked::default(),
            last_modified: NaiveDateTime::default(),
            balance_lcy: Decimal::ZERO,
            no_of_entries: 0,
            has_open_entries: false,
            last_posting_date: NaiveDate::default(),
        }
    }
}

impl Table for Customer {
    const TABLE_ID: u32 = 18;
    const TABLE_NAME: &'static str = "Customer";
    const COLUMNS: &'static [ColumnSpec] = &[
        ColumnSpec::new("No.", "no", FieldType::Code).primary_key().length(20),
        ColumnSpec::new("Name", "name", FieldType::Text).length(100).required(),
        ColumnSpec::new("City", "city", FieldType::Text).length(30),
        ColumnSpec::new("Payment Terms Code", "payment_terms_code", FieldType::Code).length(10),
        ColumnSpec::new("Credit Limit", "credit_limit", FieldType::Decimal).range(Some(0.0), None),
        ColumnSpec::new("Blocked", "blocked", FieldType::Option).options(&[" ", "Ship", "Invoice", "All"]),
        ColumnSpec::new("Last Modified", "last_modified", FieldType::DateTime).auto_timestamp(),
    ];
    const FLOW_FIELDS: &'static [FlowFieldSpec] = &[
        FlowFieldSpec::new("Balance (LCY)", "balance_lcy", CalcFormula::Sum, FieldType::Decimal, "Cust. Ledger Entry", <super::super::CustLedgerEntry as Table>::COLUMNS).source_field("amount_lcy").filters(&[FlowFilterSpec { field: "customer_no", value: FlowFilterValue::Field("no") }]),
        FlowFieldSpec::new("No. of Entries", "no_of_entries", CalcFormula::Count, FieldType::Integer, "Cust. Ledger Entry", <super::super::CustLedgerEntry as Table>::COLUMNS).filters(&[FlowFilterSpec { field: "customer_no", value: FlowFilterValue::Field("no") }]),
        FlowFieldSpec::new("Has Open Entries", "has_open_entries", CalcFormula::Exist, FieldType::Boolean, "Cust. Ledger Entry", <super::super::CustLedgerEntry as Table>::COLUMNS).filters(&[FlowFilterSpec { field: "customer_no", value: FlowFilterValue::Field("no") }, FlowFilterSpec { field: "open", value: FlowFilterValue::Const("true") }]),
        FlowFieldSpec::new("Last Posting Date", "last_posting_date", CalcFormula::Max, FieldType::Date, "Cust. Ledger Entry", <super::super::CustLedgerEntry as Table>::COLUMNS).source_field("posting_date").filters(&[FlowFilterSpec { field: "customer_no", value: FlowFilterValue::Field("no") }]),
    ];
    const KEYS: &'static [KeySpec] = &[
        KeySpec::new("by_city", &["city"]),
        KeySpec::new("by_name", &["name"]),
    ];

    fn get_value(&self, field: &str) -> Option<Value> {
        match field {
            "no" => Some(self.no.clone().into()),
            "name" => Some(self.name.clone().into()),
            "city" => Some(self.city.clone().into()),
            "payment_terms_code" => Some(self.payment_terms_code.clone().into()),
            "credit_limit" => Some(self.credit_limit.into()),
            "blocked" => Some(self.blocked.into()),
            "last_modified" => Some(self.last_modified.into()),
            "balance_lcy" => Some(self.balance_lcy.into()),
            "no_of_entries" => Some(self.no_of_entries.into()),
            "has_open_entries" => Some(self.has_open_entries.into()),
            "last_posting_date" => Some(self.last_posting_date.into()),
            _ => None,
        }
    }

    fn set_value(&mut self, field: &str, value: Value) -> Result<()> {
        match field {
            "no" => self.no = FromValue::from_value(field, value)?,
            "name" => self.name = FromValue::from_value(field, value)?,
            "city" => self.city = FromValue::from_value(field, value)?,
            "payment_terms_code" => self.payment_terms_code = FromValue::from_value(field, value)?,
            "credit_limit" => self.credit_limit = FromValue::from_value(field, value)?,
            "blocked" => self.blocked = FromValue::from_value(field, value)?,
            "last_modified" => self.last_modified = FromValue::from_value(field, value)?,
            "balance_lcy" => self.balance_lcy = FromValue::from_value(field, value)?,
            "no_of_entries" => self.no_of_entries = FromValue::from_value(field, value)?,
            "has_open_entries" => self.has_open_entries = FromValue::from_value(field, value)?,
            "last_posting_date" => self.last_posting_date = FromValue::from_value(field, value)?,
            _ => return Err(Error::unknown_field(Self::TABLE_NAME, field)),
        }
        Ok(())
    }

    fn changed_fields(&self, old: &Self) -> Vec<&'static str> {
        let mut changed = Vec::new();
        if self.name != old.name {
            changed.push("name");
        }
        if self.city != old.city {
            changed.push("city");
        }
        if self.payment_terms_code != old.payment_terms_code {
            changed.push("payment_terms_code");
        }
        if self.credit_limit != old.credit_limit {
            changed.push("credit_limit");
        }
        if self.blocked != old.blocked {
            changed.push("blocked");
        }
        if self.last_modified != old.last_modified {
            changed.push("last_modified");
        }
        changed
    }

    fn on_validate(&mut self, field: &str, binding: &Binding<'_>) -> Result<()> {
        match field {
            "no" => self.custom_validate_no(),
            "name" => self.custom_validate_name(),
            "city" => self.custom_validate_city(),
            "payment_terms_code" => {
                let related = binding.require_related::<super::super::PaymentTerms>(
                    Self::TABLE_NAME,
                    "payment_terms_code",
                    "code",
                    self.payment_terms_code.clone().into(),
                )?;
                self.custom_validate_payment_terms_code(related.as_ref())
            }
            "credit_limit" => self.custom_validate_credit_limit(),
            "blocked" => self.custom_validate_blocked(),
            "last_modified" => self.custom_validate_last_modified(),
            _ => Err(Error::unknown_field(Self::TABLE_NAME, field)),
        }
    }
}
