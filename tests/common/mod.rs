//! Shared fixtures for integration tests

#![allow(dead_code)]

pub mod tables;

use rust_decimal::Decimal;
use std::path::PathBuf;
use tabula::prelude::*;
use tabula::RuntimeConfig;

use tables::{CustLedgerEntry, Customer, PaymentTerms};

pub const COMPANY: &str = "CRONUS";

pub fn schema_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/schemas")
}

/// In-memory store with every fixture table provisioned for `COMPANY`
pub fn store() -> Store {
    store_with(RuntimeConfig::default())
}

pub fn store_with(config: RuntimeConfig) -> Store {
    let store = Store::open_in_memory().unwrap().with_config(config);
    {
        let binding = store.bind(COMPANY).unwrap();
        binding.create_table::<PaymentTerms>().unwrap();
        binding.create_table::<Customer>().unwrap();
        binding.create_table::<CustLedgerEntry>().unwrap();
    }
    store
}

pub fn add_terms(binding: &Binding<'_>, code: &str, active: bool) {
    let mut terms: Record<'_, PaymentTerms> = Record::bound(binding.clone());
    terms.code = Code::new(code);
    terms.description = format!("{} terms", code);
    terms.due_days = 30;
    terms.active = active;
    assert!(terms.insert(true).unwrap());
}

pub fn add_customer(binding: &Binding<'_>, no: &str, name: &str, city: &str) {
    let mut customer: Record<'_, Customer> = Record::bound(binding.clone());
    customer.no = Code::new(no);
    customer.name = name.to_string();
    customer.city = city.to_string();
    assert!(customer.insert(true).unwrap());
}

pub fn add_entry(binding: &Binding<'_>, entry_no: i64, customer: &str, amount: Decimal, open: bool) {
    let mut entry: Record<'_, CustLedgerEntry> = Record::bound(binding.clone());
    entry.entry_no = entry_no;
    entry.customer_no = Code::new(customer);
    entry.posting_date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + chrono::Days::new(entry_no as u64 % 365);
    entry.amount_lcy = amount;
    entry.open = open;
    assert!(entry.insert(false).unwrap());
}

/// Numbered customers C0001.. spread over three cities
pub fn seed_customers(binding: &Binding<'_>, count: usize) {
    const CITIES: [&str; 3] = ["Seattle", "Atlanta", "Chicago"];
    for i in 1..=count {
        add_customer(
            binding,
            &format!("C{:04}", i),
            &format!("Customer {}", i),
            CITIES[i % CITIES.len()],
        );
    }
}

/// Rows changed on the connection so far, as counted by SQLite
pub fn total_changes(store: &Store) -> i64 {
    store
        .connection()
        .query_row("SELECT total_changes()", [], |row| row.get(0))
        .unwrap()
}
