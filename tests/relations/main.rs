#[path = "../support/mod.rs"]
mod support;

use std::sync::Arc;

use mapped_rust::{
    share, with_object, DataObject, FieldType, MetaData, ObjectCore, Record, Related,
    RelationKind, StorageError, Value,
};
use support::*;

// --- Has-many ---

#[test]
fn has_many_loads_once_then_serves_from_the_slot() {
    let (conn, storage) = setup();
    conn.push_rows(vec![customer_row(7, "Ada", 36)]);

    storage.select("Customer").unwrap();
    let customer = storage.get(7i64).unwrap().unwrap();
    conn.clear_executed();

    conn.push_rows(pk_rows(&[101, 102]));
    conn.push_rows(vec![order_row(101, 7, 12.5), order_row(102, 7, 99.0)]);
    let orders = storage.get_related(&customer, "orders").unwrap();

    let executed = conn.executed();
    assert_eq!(executed.len(), 2);
    assert_eq!(
        executed[0].0,
        "SELECT `id` FROM `orders` WHERE `customer_id` = ?"
    );
    assert_eq!(executed[0].1, vec![Value::Integer(7)]);
    assert_eq!(
        executed[1].0,
        "SELECT * FROM `orders` WHERE `id` IN (?, ?)"
    );
    assert_eq!(orders.len(), 2);

    // The populated slot answers the second call.
    let again = storage.get_related(&customer, "orders").unwrap();
    assert_eq!(conn.executed().len(), 2);
    assert!(Arc::ptr_eq(&orders.objects()[0], &again.objects()[0]));
}

#[test]
fn relation_cache_is_shared_across_owner_instances() {
    let (conn, storage) = setup();
    conn.push_rows(vec![customer_row(7, "Ada", 36)]);

    storage.select("Customer").unwrap();
    let customer = storage.get(7i64).unwrap().unwrap();

    conn.push_rows(pk_rows(&[101]));
    conn.push_rows(vec![order_row(101, 7, 12.5)]);
    let orders = storage.get_related(&customer, "orders").unwrap();
    conn.clear_executed();

    // A second live instance with the same key hits the relation cache.
    let twin = share(Customer {
        id: Some(7),
        name: "Ada".to_string(),
        age: 36,
        ..Customer::default()
    });
    let twin_orders = storage.get_related(&twin, "orders").unwrap();

    assert!(conn.executed().is_empty());
    assert_eq!(twin_orders.len(), 1);
    assert!(Arc::ptr_eq(&orders.objects()[0], &twin_orders.objects()[0]));
}

#[test]
fn reload_bypasses_the_caches_and_overwrites_them() {
    let (conn, storage) = setup();
    conn.push_rows(vec![customer_row(7, "Ada", 36)]);

    storage.select("Customer").unwrap();
    let customer = storage.get(7i64).unwrap().unwrap();

    conn.push_rows(pk_rows(&[101, 102]));
    conn.push_rows(vec![order_row(101, 7, 12.5), order_row(102, 7, 99.0)]);
    let orders = storage.get_related(&customer, "orders").unwrap();
    assert_eq!(orders.len(), 2);
    conn.clear_executed();

    // A row appeared since the first load.
    conn.push_rows(pk_rows(&[101, 102, 103]));
    conn.push_rows(vec![order_row(103, 7, 5.0)]);
    let reloaded = storage.get_related_reload(&customer, "orders").unwrap();

    assert_eq!(conn.executed().len(), 2);
    assert_eq!(reloaded.len(), 3);

    // The overwritten slot answers subsequent plain calls.
    let again = storage.get_related(&customer, "orders").unwrap();
    assert_eq!(conn.executed().len(), 2);
    assert_eq!(again.len(), 3);
}

#[test]
fn preset_slot_wins_over_any_load() {
    let (conn, storage) = setup();
    let customer = share(Customer::default());
    customer
        .write()
        .unwrap()
        .core_mut()
        .set_related("orders", Related::Many(Vec::new()));

    let orders = storage.get_related(&customer, "orders").unwrap();
    assert!(orders.is_empty());
    assert!(conn.executed().is_empty());
}

// --- Belongs-to and has-one ---

#[test]
fn belongs_to_through_the_target_key_hits_the_identity_map() {
    let (conn, storage) = setup();
    conn.push_rows(vec![customer_row(7, "Ada", 36)]);

    storage.select("Customer").unwrap();
    let customer = storage.get(7i64).unwrap().unwrap();
    conn.clear_executed();

    let order = share(Order {
        id: Some(55),
        customer_id: 7,
        ..Order::default()
    });
    let related = storage.get_related(&order, "customer").unwrap();

    assert!(conn.executed().is_empty());
    assert!(Arc::ptr_eq(&related.first().unwrap(), &customer));
}

#[test]
fn has_one_searches_the_join_column_and_takes_the_first_match() {
    let (conn, storage) = setup();
    conn.push_rows(vec![customer_row(7, "Ada", 36)]);

    storage.select("Customer").unwrap();
    let customer = storage.get(7i64).unwrap().unwrap();
    conn.clear_executed();

    conn.push_rows(pk_rows(&[9]));
    conn.push_rows(vec![Record::new()
        .with("id", 9)
        .with("customer_id", 7)
        .with("bio", "polymath")]);
    let profile = storage.get_related(&customer, "profile").unwrap();

    let executed = conn.executed();
    assert_eq!(executed.len(), 2);
    assert_eq!(
        executed[0].0,
        "SELECT `id` FROM `profiles` WHERE `customer_id` = ?"
    );

    let bio = with_object::<Profile, _>(&profile.first().unwrap(), |p| p.bio.clone())
        .unwrap()
        .unwrap();
    assert_eq!(bio, "polymath");
}

// --- Many-to-many ---

#[test]
fn many_to_many_walks_the_join_table_then_batch_loads() {
    let (conn, storage) = setup();

    let order = share(Order {
        id: Some(55),
        customer_id: 7,
        ..Order::default()
    });

    conn.push_rows(vec![
        Record::new().with("tag_id", 5),
        Record::new().with("tag_id", 6),
    ]);
    conn.push_rows(vec![tag_row(5, "rush"), tag_row(6, "gift")]);
    let tags = storage.get_related(&order, "tags").unwrap();

    let executed = conn.executed();
    assert_eq!(executed.len(), 2);
    assert_eq!(
        executed[0].0,
        "SELECT `tag_id` FROM `order_tags` WHERE `order_id` = ?"
    );
    assert_eq!(executed[0].1, vec![Value::Integer(55)]);
    assert_eq!(
        executed[1].0,
        "SELECT * FROM `tags` WHERE `id` IN (?, ?)"
    );
    assert_eq!(executed[1].1, vec![Value::Integer(5), Value::Integer(6)]);

    assert_eq!(tags.len(), 2);
    let label = with_object::<Tag, _>(&tags.objects()[0], |t| t.label.clone())
        .unwrap()
        .unwrap();
    assert_eq!(label, "rush");
}

#[test]
fn many_to_many_with_no_join_rows_is_empty() {
    let (conn, storage) = setup();

    let order = share(Order {
        id: Some(55),
        ..Order::default()
    });
    let tags = storage.get_related(&order, "tags").unwrap();

    assert!(tags.is_empty());
    assert_eq!(conn.executed().len(), 1);
}

// --- Failure modes ---

#[test]
fn undeclared_relation_names_are_rejected() {
    let (_conn, storage) = setup();

    let customer = share(Customer::default());
    let err = storage.get_related(&customer, "payments").unwrap_err();
    match err {
        StorageError::UnknownRelation {
            type_name,
            relation,
        } => {
            assert_eq!(type_name, "Customer");
            assert_eq!(relation, "payments");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[derive(Debug, Default)]
struct Gadget {
    core: ObjectCore,
    id: Option<i64>,
}

impl DataObject for Gadget {
    fn type_name(&self) -> &'static str {
        "Gadget"
    }

    fn meta_data(&self) -> MetaData {
        MetaData::new("gadgets")
            .field("id", FieldType::integer().nullable())
            .relation("parts", RelationKind::HasMany, "Tag", "not a reference")
    }

    fn export(&self) -> Record {
        Record::new().with("id", self.id)
    }

    fn import(&mut self, record: &Record) {
        if let Some(value) = record.get("id") {
            self.id = value.as_i64();
        }
    }

    fn core(&self) -> &ObjectCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ObjectCore {
        &mut self.core
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
        self
    }
}

#[test]
fn malformed_references_are_fatal_for_the_relation() {
    let (_conn, storage) = setup();
    storage.register::<Gadget>().unwrap();

    let gadget = share(Gadget {
        id: Some(1),
        ..Gadget::default()
    });
    let err = storage.get_related(&gadget, "parts").unwrap_err();
    match err {
        StorageError::MalformedReference { reference } => {
            assert_eq!(reference, "not a reference");
        }
        other => panic!("unexpected error: {other}"),
    }
}
