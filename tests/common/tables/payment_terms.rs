//! Payment Terms (table 3)
//!
//! Written once by tabula; edit freely. Generated code lives in
//! payment_terms_gen.rs.

#[path = "payment_terms_gen.rs"]
mod generated;

pub use generated::*;

use tabula::prelude::*;
use super::Customer;

impl Triggers for PaymentTerms {
    fn on_insert(&mut self) -> Result<()> {
        self.validate()
    }

    fn on_modify(&mut self) -> Result<()> {
        self.validate()
    }

    /// Terms still assigned to a customer cannot be deleted
    fn on_delete(&self, binding: &Binding<'_>) -> Result<()> {
        let mut customers: Record<'_, Customer> = Record::bound(binding.clone());
        customers.set_range("payment_terms_code", self.code.clone())?;
        if !customers.is_empty()? {
            return Err(Error::validation(
                Self::TABLE_NAME,
                format!("{} is still used by {} customer(s)", self.code, customers.count()?),
            ));
        }
        Ok(())
    }

    fn on_rename(&mut self) -> Result<()> {
        Ok(())
    }
}

impl PaymentTerms {
    fn custom_validate_code(&mut self) -> Result<()> {
        Ok(())
    }

    fn custom_validate_description(&mut self) -> Result<()> {
        Ok(())
    }

    fn custom_validate_due_days(&mut self) -> Result<()> {
        Ok(())
    }

    fn custom_validate_discount(&mut self) -> Result<()> {
        Ok(())
    }

    fn custom_validate_active(&mut self) -> Result<()> {
        Ok(())
    }
}
