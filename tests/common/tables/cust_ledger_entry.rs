//! Cust. Ledger Entry (table 21)
//!
//! Written once by tabula; edit freely. Generated code lives in
//! cust_ledger_entry_gen.rs.

#[path = "cust_ledger_entry_gen.rs"]
mod generated;

pub use generated::*;

use tabula::prelude::*;
use super::Customer;

impl Triggers for CustLedgerEntry {
    /// Entries must carry an amount
    fn on_insert(&mut self) -> Result<()> {
        if self.amount_lcy.is_zero() {
            return Err(Error::validation(Self::TABLE_NAME, "amount cannot be zero"));
        }
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

impl CustLedgerEntry {
    fn custom_validate_entry_no(&mut self) -> Result<()> {
        Ok(())
    }

    fn custom_validate_customer_no(&mut self, _related: Option<&Customer>) -> Result<()> {
        Ok(())
    }

    fn custom_validate_posting_date(&mut self) -> Result<()> {
        Ok(())
    }

    fn custom_validate_document_type(&mut self) -> Result<()> {
        Ok(())
    }

    fn custom_validate_amount_lcy(&mut self) -> Result<()> {
        Ok(())
    }

    fn custom_validate_open(&mut self) -> Result<()> {
        Ok(())
    }
}
