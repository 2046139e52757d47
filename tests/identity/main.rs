#[path = "../support/mod.rs"]
mod support;

use std::sync::Arc;

use mapped_rust::{with_object, Value};
use support::*;

// --- Single gets ---

#[test]
fn get_returns_the_same_instance_without_requerying() {
    let (conn, storage) = setup();
    conn.push_rows(vec![customer_row(7, "Ada", 36)]);

    storage.select("Customer").unwrap();
    let first = storage.get(7i64).unwrap().unwrap();
    assert_eq!(conn.executed().len(), 1);

    let second = storage.get(7i64).unwrap().unwrap();
    assert_eq!(conn.executed().len(), 1);
    assert!(Arc::ptr_eq(&first, &second));
}

#[test]
fn get_issues_one_select_by_primary_key() {
    let (conn, storage) = setup();
    conn.push_rows(vec![customer_row(7, "Ada", 36)]);

    storage.select("Customer").unwrap();
    storage.get(7i64).unwrap().unwrap();

    let executed = conn.executed();
    assert_eq!(
        executed[0].0,
        "SELECT * FROM `customers` WHERE `id` = ?"
    );
    assert_eq!(executed[0].1, vec![Value::Integer(7)]);
}

#[test]
fn missing_row_is_a_soft_none() {
    let (conn, storage) = setup();

    storage.select("Customer").unwrap();
    assert!(storage.get(99i64).unwrap().is_none());
    assert_eq!(conn.executed().len(), 1);
}

#[test]
fn empty_key_issues_no_query() {
    let (conn, storage) = setup();

    storage.select("Customer").unwrap();
    assert!(storage.get(0i64).unwrap().is_none());
    assert!(storage.get(Value::Null).unwrap().is_none());
    assert!(storage.get("").unwrap().is_none());
    assert!(conn.executed().is_empty());
}

#[test]
fn hydrated_object_carries_the_row_values() {
    let (conn, storage) = setup();
    conn.push_rows(vec![customer_row(7, "Ada", 36)]);

    storage.select("Customer").unwrap();
    let customer = storage.get(7i64).unwrap().unwrap();

    let (name, age) = with_object::<Customer, _>(&customer, |c| (c.name.clone(), c.age))
        .unwrap()
        .unwrap();
    assert_eq!(name, "Ada");
    assert_eq!(age, 36);
}

// --- Batch gets ---

#[test]
fn batch_get_queries_only_the_uncached_keys() {
    let (conn, storage) = setup();
    storage.select("Customer").unwrap();

    conn.push_rows(vec![customer_row(1, "Ada", 36)]);
    let one = storage.get(1i64).unwrap().unwrap();
    conn.push_rows(vec![customer_row(2, "Grace", 41)]);
    storage.get(2i64).unwrap().unwrap();
    conn.clear_executed();

    conn.push_rows(vec![customer_row(3, "Edsger", 52)]);
    let set = storage
        .get_many(&[Value::Integer(1), Value::Integer(2), Value::Integer(3)])
        .unwrap();

    let executed = conn.executed();
    assert_eq!(executed.len(), 1);
    assert_eq!(
        executed[0].0,
        "SELECT * FROM `customers` WHERE `id` IN (?)"
    );
    assert_eq!(executed[0].1, vec![Value::Integer(3)]);

    assert_eq!(set.len(), 3);
    assert_eq!(set.found_len(), 3);
    assert!(Arc::ptr_eq(&one, &set.get(&Value::Integer(1)).unwrap()));
}

#[test]
fn fully_cached_batch_issues_no_query() {
    let (conn, storage) = setup();
    storage.select("Customer").unwrap();

    conn.push_rows(vec![customer_row(1, "Ada", 36)]);
    storage.get(1i64).unwrap().unwrap();
    conn.push_rows(vec![customer_row(2, "Grace", 41)]);
    storage.get(2i64).unwrap().unwrap();
    conn.clear_executed();

    let set = storage
        .get_many(&[Value::Integer(1), Value::Integer(2)])
        .unwrap();
    assert!(conn.executed().is_empty());
    assert_eq!(set.found_len(), 2);
}

#[test]
fn batch_preserves_keys_that_match_nothing() {
    let (conn, storage) = setup();
    storage.select("Customer").unwrap();

    conn.push_rows(vec![customer_row(1, "Ada", 36)]);
    let set = storage
        .get_many(&[Value::Integer(1), Value::Integer(2)])
        .unwrap();

    assert_eq!(set.len(), 2);
    assert_eq!(set.found_len(), 1);
    assert!(set.get(&Value::Integer(1)).is_some());
    assert!(set.get(&Value::Integer(2)).is_none());
}

#[test]
fn empty_batch_issues_no_query() {
    let (conn, storage) = setup();
    storage.select("Customer").unwrap();

    let set = storage.get_many(&[]).unwrap();
    assert!(set.is_empty());
    assert!(conn.executed().is_empty());
}

#[test]
fn duplicate_keys_collapse_to_one_entry() {
    let (conn, storage) = setup();
    storage.select("Customer").unwrap();

    conn.push_rows(vec![customer_row(1, "Ada", 36)]);
    let set = storage
        .get_many(&[Value::Integer(1), Value::Integer(1)])
        .unwrap();

    assert_eq!(set.len(), 1);
    assert_eq!(conn.executed().len(), 1);
}

// --- Selection ---

#[test]
fn operations_without_a_selection_fail() {
    let (_conn, storage) = setup();
    assert!(storage.get(1i64).is_err());
    assert!(storage.selected_type().unwrap().is_none());

    storage.select("Customer").unwrap();
    assert_eq!(
        storage.selected_type().unwrap().as_deref(),
        Some("Customer")
    );
}

#[test]
fn selecting_an_unregistered_type_fails() {
    let (_conn, storage) = setup();
    assert!(storage.select("Invoice").is_err());
}
