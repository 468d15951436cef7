// @generated by tabula. Do not edit: this file is rewritten on every run.

pub mod cust_ledger_entry;
pub mod customer;
pub mod payment_terms;

pub use cust_ledger_entry::{CustLedgerEntry, CustLedgerEntryDocumentType};
pub use customer::{Customer, CustomerBlocked};
pub use payment_terms::{PaymentTerms};
