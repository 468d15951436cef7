//! Customer (table 18)
//!
//! Written once by tabula; edit freely. Generated code lives in
//! customer_gen.rs.

#[path = "customer_gen.rs"]
mod generated;

pub use generated::*;

use tabula::prelude::*;
use super::PaymentTerms;

impl Triggers for Customer {
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

impl Customer {
    fn custom_validate_no(&mut self) -> Result<()> {
        Ok(())
    }

    fn custom_validate_name(&mut self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::validation(Self::TABLE_NAME, "name cannot be blank"));
        }
        Ok(())
    }

    fn custom_validate_city(&mut self) -> Result<()> {
        Ok(())
    }

    fn custom_validate_payment_terms_code(&mut self, related: Option<&PaymentTerms>) -> Result<()> {
        if let Some(terms) = related {
            if !terms.active {
                return Err(Error::validation(
                    Self::TABLE_NAME,
                    format!("payment terms {} are not active", terms.code),
                ));
            }
        }
        Ok(())
    }

    fn custom_validate_credit_limit(&mut self) -> Result<()> {
        if self.credit_limit.is_sign_negative() {
            return Err(Error::validation(Self::TABLE_NAME, "credit limit cannot be negative"));
        }
        Ok(())
    }

    fn custom_validate_blocked(&mut self) -> Result<()> {
        Ok(())
    }

    fn custom_validate_last_modified(&mut self) -> Result<()> {
        Ok(())
    }
}
