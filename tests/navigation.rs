//! Integration tests for filtering and navigation
//!
//! Covers get, find_first/find_last, streaming and buffered iteration and
//! the filter round trip through get_filters.

mod common;

use common::tables::{Customer, CustomerBlocked};
use common::{seed_customers, store, store_with, COMPANY};
use proptest::prelude::*;
use tabula::prelude::*;
use tabula::RuntimeConfig;

fn walk_streaming(record: &mut Record<'_, Customer>) -> Vec<String> {
    let mut seen = Vec::new();
    if record.find_set().unwrap() {
        loop {
            seen.push(record.no.to_string());
            if !record.next().unwrap() {
                break;
            }
        }
    }
    seen
}

fn walk_buffered(record: &mut Record<'_, Customer>) -> Vec<String> {
    let mut seen = Vec::new();
    if record.find_set_buffered().unwrap() {
        loop {
            seen.push(record.no.to_string());
            if !record.next().unwrap() {
                break;
            }
        }
    }
    seen
}

// =============================================================================
// Get
// =============================================================================

#[test]
fn test_get_by_primary_key() {
    let store = store();
    let binding = store.bind(COMPANY).unwrap();
    seed_customers(&binding, 3);

    let mut customer: Record<'_, Customer> = Record::bound(binding);
    assert!(customer.get(&["c0002".into()]).unwrap());
    assert_eq!(customer.no, "C0002");
    assert_eq!(customer.name, "Customer 2");
    assert!(customer.is_loaded());
}

#[test]
fn test_get_missing_is_false_not_error() {
    let store = store();
    let binding = store.bind(COMPANY).unwrap();
    seed_customers(&binding, 1);

    let mut customer: Record<'_, Customer> = Record::bound(binding);
    customer.name = "untouched".to_string();
    assert!(!customer.get(&["NOPE".into()]).unwrap());
    assert_eq!(customer.name, "untouched");
}

#[test]
fn test_get_ignores_filters() {
    let store = store();
    let binding = store.bind(COMPANY).unwrap();
    seed_customers(&binding, 3);

    let mut customer: Record<'_, Customer> = Record::bound(binding);
    customer.set_range("city", "Nowhere").unwrap();
    assert!(customer.get(&["C0001".into()]).unwrap());
}

#[test]
fn test_get_wrong_key_arity() {
    let store = store();
    let binding = store.bind(COMPANY).unwrap();
    let mut customer: Record<'_, Customer> = Record::bound(binding);
    let err = customer.get(&[]).unwrap_err();
    assert!(matches!(err, Error::KeyArity { expected: 1, actual: 0, .. }));
}

#[test]
fn test_unbound_record() {
    let mut customer: Record<'_, Customer> = Record::new();
    assert!(matches!(customer.find_first(), Err(Error::NotBound { .. })));
}

#[test]
fn test_company_isolation() {
    let store = store();
    let cronus = store.bind(COMPANY).unwrap();
    seed_customers(&cronus, 2);

    let other = store.bind("Fabrikam").unwrap();
    other.create_table::<Customer>().unwrap();
    let mut customer: Record<'_, Customer> = Record::bound(other);
    assert!(customer.is_empty().unwrap());
    assert!(!customer.get(&["C0001".into()]).unwrap());
}

// =============================================================================
// Find
// =============================================================================

#[test]
fn test_find_first_and_last_follow_current_key() {
    let store = store();
    let binding = store.bind(COMPANY).unwrap();
    seed_customers(&binding, 6);

    let mut customer: Record<'_, Customer> = Record::bound(binding);
    assert!(customer.find_first().unwrap());
    assert_eq!(customer.no, "C0001");
    assert!(customer.find_last().unwrap());
    assert_eq!(customer.no, "C0006");

    // City order, primary key as tiebreaker: Atlanta holds C0001 and C0004
    customer.set_current_key(&["city"]).unwrap();
    assert!(customer.find_first().unwrap());
    assert_eq!((customer.city.as_str(), customer.no.as_str()), ("Atlanta", "C0001"));
    assert!(customer.find_last().unwrap());
    assert_eq!((customer.city.as_str(), customer.no.as_str()), ("Seattle", "C0006"));
}

#[test]
fn test_find_on_empty_table() {
    let store = store();
    let binding = store.bind(COMPANY).unwrap();
    let mut customer: Record<'_, Customer> = Record::bound(binding);
    assert!(!customer.find_first().unwrap());
    assert!(!customer.find_set().unwrap());
    assert!(!customer.find_set_buffered().unwrap());
    assert!(!customer.next().unwrap());
}

#[test]
fn test_filters_on_text_and_option() {
    let store = store();
    let binding = store.bind(COMPANY).unwrap();
    seed_customers(&binding, 9);

    let mut blocker: Record<'_, Customer> = Record::bound(binding.clone());
    blocker.set_filter("no", "C0002|C0005").unwrap();
    assert_eq!(blocker.modify_all("blocked", CustomerBlocked::All).unwrap(), 2);

    let mut customer: Record<'_, Customer> = Record::bound(binding);
    customer.set_range("city", "Chicago").unwrap();
    assert_eq!(walk_streaming(&mut customer), vec!["C0002", "C0005", "C0008"]);

    customer.set_range("blocked", CustomerBlocked::All).unwrap();
    assert_eq!(walk_streaming(&mut customer), vec!["C0002", "C0005"]);

    customer.set_filter("blocked", "Ship|Invoice").unwrap();
    assert!(customer.is_empty().unwrap());

    customer.clear_range("blocked").unwrap();
    assert_eq!(customer.count().unwrap(), 3);
}

#[test]
fn test_filter_expression_ranges_and_patterns() {
    let store = store();
    let binding = store.bind(COMPANY).unwrap();
    seed_customers(&binding, 12);

    let mut customer: Record<'_, Customer> = Record::bound(binding);
    customer.set_filter("no", "C0003..C0005|C0010..").unwrap();
    assert_eq!(
        walk_buffered(&mut customer),
        vec!["C0003", "C0004", "C0005", "C0010", "C0011", "C0012"]
    );

    customer.set_filter("no", "<C0004").unwrap();
    assert_eq!(walk_buffered(&mut customer), vec!["C0001", "C0002", "C0003"]);

    customer.set_filter("no", "<>C0001").unwrap();
    assert_eq!(customer.count().unwrap(), 11);

    customer.set_filter("no", "*1?").unwrap();
    assert_eq!(walk_buffered(&mut customer), vec!["C0010", "C0011", "C0012"]);
}

#[test]
fn test_flow_field_cannot_be_filtered() {
    let store = store();
    let binding = store.bind(COMPANY).unwrap();
    let mut customer: Record<'_, Customer> = Record::bound(binding);
    assert!(matches!(
        customer.set_range("balance_lcy", Decimal::ZERO),
        Err(Error::InvalidFilter { .. })
    ));
    assert!(matches!(
        customer.set_current_key(&["no_of_entries"]),
        Err(Error::InvalidFilter { .. })
    ));
    assert!(matches!(
        customer.set_filter("nonsense", "1"),
        Err(Error::UnknownField { .. })
    ));
}

#[test]
fn test_bad_filter_leaves_previous_filter() {
    let store = store();
    let binding = store.bind(COMPANY).unwrap();
    let mut customer: Record<'_, Customer> = Record::bound(binding);
    customer.set_filter("credit_limit", "100..200").unwrap();
    assert!(customer.set_filter("credit_limit", "lots..").is_err());
    assert_eq!(customer.get_filter("credit_limit").as_deref(), Some("100..200"));
}

#[test]
fn test_get_filters_round_trip() {
    let store = store();
    let binding = store.bind(COMPANY).unwrap();
    seed_customers(&binding, 9);

    let mut source: Record<'_, Customer> = Record::bound(binding.clone());
    source.set_range("city", "Seattle").unwrap();
    source.set_filter("no", "C0001..C0006").unwrap();
    let rendered = source.get_filters();
    assert_eq!(rendered, "city: Seattle, no: C0001..C0006");

    // Re-apply every rendered filter to a fresh record
    let mut copy: Record<'_, Customer> = Record::bound(binding.clone());
    for part in rendered.split(", ") {
        let (field, expr) = part.split_once(": ").unwrap();
        copy.set_filter(field, expr).unwrap();
    }
    assert_eq!(copy.get_filters(), rendered);
    assert_eq!(walk_buffered(&mut copy), walk_buffered(&mut source));

    let mut copied: Record<'_, Customer> = Record::bound(binding);
    copied.copy_filters(&source);
    assert_eq!(copied.get_filters(), rendered);
}

#[test]
fn test_reset_clears_filters_and_key_keeps_fields() {
    let store = store();
    let binding = store.bind(COMPANY).unwrap();
    seed_customers(&binding, 3);

    let mut customer: Record<'_, Customer> = Record::bound(binding.clone());
    customer.set_range("city", "Seattle").unwrap();
    customer.set_current_key(&["name"]).unwrap();
    assert!(customer.find_first().unwrap());
    customer.reset();

    assert_eq!(customer.get_filters(), "");
    assert!(!customer.is_loaded());
    assert_eq!(customer.no, "C0003");
    assert!(customer.find_first().unwrap());
    assert_eq!(customer.no, "C0001");

    customer.set_range("city", "Seattle").unwrap();
    customer.init(binding);
    assert_eq!(customer.no, "");
    assert_eq!(customer.get_filters(), "city: Seattle");
}

// =============================================================================
// Streaming and buffered iteration
// =============================================================================

#[test]
fn test_streaming_crosses_page_boundaries() {
    let store = store_with(RuntimeConfig::default().with_page_size(2));
    let binding = store.bind(COMPANY).unwrap();
    seed_customers(&binding, 7);

    let mut customer: Record<'_, Customer> = Record::bound(binding);
    let expected: Vec<String> = (1..=7).map(|i| format!("C{:04}", i)).collect();
    assert_eq!(walk_streaming(&mut customer), expected);
}

#[test]
fn test_streaming_rejects_backward_steps() {
    let store = store();
    let binding = store.bind(COMPANY).unwrap();
    seed_customers(&binding, 4);

    let mut customer: Record<'_, Customer> = Record::bound(binding);
    assert!(customer.find_set().unwrap());
    assert!(customer.next().unwrap());
    assert_eq!(customer.no, "C0002");

    assert!(!customer.next_by(-1).unwrap());
    assert!(!customer.next_by(0).unwrap());
    assert_eq!(customer.no, "C0002");

    // The stream is still usable forward
    assert!(customer.next_by(2).unwrap());
    assert_eq!(customer.no, "C0004");
    assert!(!customer.next().unwrap());
    assert_eq!(customer.no, "C0004");
}

#[test]
fn test_buffered_moves_both_ways() {
    let store = store();
    let binding = store.bind(COMPANY).unwrap();
    seed_customers(&binding, 5);

    let mut customer: Record<'_, Customer> = Record::bound(binding);
    assert!(customer.find_set_buffered().unwrap());
    assert!(customer.next_by(3).unwrap());
    assert_eq!(customer.no, "C0004");
    assert!(customer.next_by(-2).unwrap());
    assert_eq!(customer.no, "C0002");
    assert!(!customer.next_by(-5).unwrap());
    assert_eq!(customer.no, "C0002", "out of range keeps the position");
    assert!(customer.next().unwrap());
    assert_eq!(customer.no, "C0003");
}

#[test]
fn test_buffer_limit() {
    let store = store_with(RuntimeConfig::default().with_max_buffered_rows(3));
    let binding = store.bind(COMPANY).unwrap();
    seed_customers(&binding, 4);

    let mut customer: Record<'_, Customer> = Record::bound(binding);
    assert!(matches!(
        customer.find_set_buffered(),
        Err(Error::BufferLimit { limit: 3, .. })
    ));

    customer.set_filter("no", "..C0003").unwrap();
    assert!(customer.find_set_buffered().unwrap());

    // Streaming is not subject to the limit
    customer.reset();
    assert_eq!(walk_streaming(&mut customer).len(), 4);
}

#[test]
fn test_streaming_sees_rows_written_behind_the_cursor_position() {
    let store = store_with(RuntimeConfig::default().with_page_size(1));
    let binding = store.bind(COMPANY).unwrap();
    seed_customers(&binding, 3);

    let mut customer: Record<'_, Customer> = Record::bound(binding.clone());
    assert!(customer.find_set().unwrap());
    common::add_customer(&binding, "C0002A", "Late", "Seattle");

    let mut rest = Vec::new();
    while customer.next().unwrap() {
        rest.push(customer.no.to_string());
    }
    assert_eq!(rest, vec!["C0002", "C0002A", "C0003"]);
}

fn set_credit_limit(binding: &Binding, no: &str, limit: Decimal) {
    let mut customer: Record<'_, Customer> = Record::bound(binding.clone());
    assert!(customer.get(&[no.into()]).unwrap());
    customer.credit_limit = limit;
    assert!(customer.modify(true).unwrap());
}

#[test]
fn test_decimal_filters_and_order_are_exact() {
    let store = store_with(RuntimeConfig::default().with_page_size(1));
    let binding = store.bind(COMPANY).unwrap();
    seed_customers(&binding, 3);

    // Both values round to the same f64
    let high = Decimal::new(90_071_992_547_409_923, 2);
    let low = Decimal::new(90_071_992_547_409_922, 2);
    set_credit_limit(&binding, "C0001", high);
    set_credit_limit(&binding, "C0002", low);
    set_credit_limit(&binding, "C0003", Decimal::new(5, 1));

    let mut customer: Record<'_, Customer> = Record::bound(binding.clone());
    customer.set_range("credit_limit", high).unwrap();
    assert_eq!(customer.count().unwrap(), 1);
    assert!(customer.find_first().unwrap());
    assert_eq!(customer.no, "C0001");
    assert_eq!(customer.credit_limit, high);

    customer.set_filter("credit_limit", ">900719925474099.22").unwrap();
    assert_eq!(customer.count().unwrap(), 1);
    customer.set_range_between("credit_limit", Decimal::ZERO, low).unwrap();
    assert_eq!(customer.count().unwrap(), 2);

    customer.reset();
    customer.set_current_key(&["credit_limit"]).unwrap();
    assert_eq!(walk_streaming(&mut customer), ["C0003", "C0002", "C0001"]);
    assert!(customer.find_last().unwrap());
    assert_eq!(customer.no, "C0001");
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_streaming_matches_buffered(
        count in 0usize..40,
        page_size in 1usize..9,
        by_city in any::<bool>(),
        filter_index in 0usize..4,
    ) {
        const FILTERS: [Option<(&str, &str)>; 4] = [
            None,
            Some(("city", "Seattle|Atlanta")),
            Some(("no", "C0005..C0030")),
            Some(("name", "*1*")),
        ];

        let store = store_with(RuntimeConfig::default().with_page_size(page_size));
        let binding = store.bind(COMPANY).unwrap();
        seed_customers(&binding, count);

        let mut customer: Record<'_, Customer> = Record::bound(binding);
        if by_city {
            customer.set_current_key(&["city"]).unwrap();
        }
        if let Some((field, expr)) = FILTERS[filter_index] {
            customer.set_filter(field, expr).unwrap();
        }

        let streamed = walk_streaming(&mut customer);
        let buffered = walk_buffered(&mut customer);
        prop_assert_eq!(streamed.len(), customer.count().unwrap());
        prop_assert_eq!(streamed, buffered);
    }

    #[test]
    fn prop_buffered_backward_mirrors_forward(count in 1usize..30, step in 1i64..4) {
        let store = store();
        let binding = store.bind(COMPANY).unwrap();
        seed_customers(&binding, count);

        let mut customer: Record<'_, Customer> = Record::bound(binding);
        customer.set_current_key(&["city"]).unwrap();

        let mut forward = Vec::new();
        prop_assert!(customer.find_set_buffered().unwrap());
        loop {
            forward.push(customer.no.to_string());
            if !customer.next_by(step).unwrap() {
                break;
            }
        }

        let mut backward = vec![customer.no.to_string()];
        while customer.next_by(-step).unwrap() {
            backward.push(customer.no.to_string());
        }
        backward.reverse();
        prop_assert_eq!(forward, backward);
    }
}
