// @generated by tabula from cust_ledger_entry.yaml. Do not edit: this file is
// rewritten on every run. Business logic belongs in cust_ledger_entry.rs.

use tabula::prelude::*;

/// Options of `Cust. Ledger Entry.document_type`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CustLedgerEntryDocumentType {
    #[default]
    Blank = 0,
    Payment = 1,
    Invoice = 2,
    CreditMemo = 3,
}

impl OptionField for CustLedgerEntryDocumentType {
    const OPTIONS: &'static [&'static str] = &[" ", "Payment", "Invoice", "Credit Memo"];

    fn from_index(index: i64) -> Option<Self> {
        match index {
            0 => Some(Self::Blank),
            1 => Some(Self::Payment),
            2 => Some(Self::Invoice),
            3 => Some(Self::CreditMemo),
            _ => None,
        }
    }

    fn index(self) -> i64 {
        self as i64
    }
}

impl FromValue for CustLedgerEntryDocumentType {
    fn from_value(field: &str, value: Value) -> Result<Self> {
        option_from_value(field, value)
    }
}

impl From<CustLedgerEntryDocumentType> for Value {
    fn from(option: CustLedgerEntryDocumentType) -> Self {
        Value::Int(option.index())
    }
}

/// Cust. Ledger Entry (table 21)
#[derive(Debug, Clone, PartialEq)]
pub struct CustLedgerEntry {
    /// Entry No.
    pub entry_no: i64,
    /// Customer No.
    pub customer_no: Code,
    /// Posting Date
    pub posting_date: NaiveDate,
    /// Document Type
    pub document_type: CustLedgerEntryDocumentType,
    /// Amount (LCY)
    pub amount_lcy: Decimal,
    /// Open
    pub open: bool,
}

impl Default for CustLedgerEntry {
    fn default() -> Self {
        Self {
            entry_no: 0,
            customer_no: Code::default(),
            posting_date: NaiveDate::default(),
            document_type: CustLedgerEntryDocumentType::default(),
            amount_lcy: Decimal::ZERO,
            open: true,
        }
    }
}

impl Table for CustLedgerEntry {
    const TABLE_ID: u32 = 21;
    const TABLE_NAME: &'static str = "Cust. Ledger Entry";
    const COLUMNS: &'static [ColumnSpec] = &[
        ColumnSpec::new("Entry No.", "entry_no", FieldType::Integer).primary_key(),
        ColumnSpec::new("Customer No.", "customer_no", FieldType::Code).length(20),
        ColumnSpec::new("Posting Date", "posting_date", FieldType::Date),
        ColumnSpec::new("Document Type", "document_type", FieldType::Option).options(&[" ", "Payment", "Invoice", "Credit Memo"]),
        ColumnSpec::new("Amount (LCY)", "amount_lcy", FieldType::Decimal),
        ColumnSpec::new("Open", "open", FieldType::Boolean),
    ];
    const FLOW_FIELDS: &'static [FlowFieldSpec] = &[
    ];
    const KEYS: &'static [KeySpec] = &[
        KeySpec::new("by_customer", &["customer_no", "posting_date"]),
    ];

    fn get_value(&self, field: &str) -> Option<Value> {
        match field {
            "entry_no" => Some(self.entry_no.into()),
            "customer_no" => Some(self.customer_no.clone().into()),
            "posting_date" => Some(self.posting_date.into()),
            "document_type" => Some(self.document_type.into()),
            "amount_lcy" => Some(self.amount_lcy.into()),
            "open" => Some(self.open.into()),
            _ => None,
        }
    }

    fn set_value(&mut self, field: &str, value: Value) -> Result<()> {
        match field {
            "entry_no" => self.entry_no = FromValue::from_value(field, value)?,
            "customer_no" => self.customer_no = FromValue::from_value(field, value)?,
            "posting_date" => self.posting_date = FromValue::from_value(field, value)?,
            "document_type" => self.document_type = FromValue::from_value(field, value)?,
            "amount_lcy" => self.amount_lcy = FromValue::from_value(field, value)?,
            "open" => self.open = FromValue::from_value(field, value)?,
            _ => return Err(Error::unknown_field(Self::TABLE_NAME, field)),
        }
        Ok(())
    }

    fn changed_fields(&self, old: &Self) -> Vec<&'static str> {
        let mut changed = Vec::new();
        if self.customer_no != old.customer_no {
            changed.push("customer_no");
        }
        if self.posting_date != old.posting_date {
            changed.push("posting_date");
        }
        if self.document_type != old.document_type {
            changed.push("document_type");
        }
        if self.amount_lcy != old.amount_lcy {
            changed.push("amount_lcy");
        }
        if self.open != old.open {
            changed.push("open");
        }
        changed
    }

    fn on_validate(&mut self, field: &str, binding: &Binding<'_>) -> Result<()> {
        match field {
            "entry_no" => self.custom_validate_entry_no(),
            "customer_no" => {
                let related = binding.require_related::<super::super::Customer>(
                    Self::TABLE_NAME,
                    "customer_no",
                    "no",
                    self.customer_no.clone().into(),
                )?;
                self.custom_validate_customer_no(related.as_ref())
            }
            "posting_date" => self.custom_validate_posting_date(),
            "document_type" => self.custom_validate_document_type(),
            "amount_lcy" => self.custom_validate_amount_lcy(),
            "open" => self.custom_validate_open(),
            _ => Err(Error::unknown_field(Self::TABLE_NAME, field)),
        }
    }
}
