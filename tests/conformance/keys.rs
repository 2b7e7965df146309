//! Key equality, hashing and construction rules

use crate::common::*;
use proptest::prelude::*;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use tessera::{
    AssociatedEntityKeyMetadata, AssociationKey, AssociationKeyMetadata, EntityKey, Error, RowKey,
    Tuple, Value,
};

fn hash_of<T: Hash>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

#[test]
fn test_equal_table_and_values_are_equal_keys() {
    let a = EntityKey::new(entity_meta("Order", &["id"]), vec![Value::Int(7)]).unwrap();
    let b = EntityKey::new(entity_meta("Order", &["id"]), vec![Value::Int(7)]).unwrap();
    assert_eq!(a, b);
    assert_eq!(hash_of(&a), hash_of(&b));
    assert_ne!(a, key(8));
}

#[test]
fn test_value_order_matters() {
    let meta = entity_meta("Line", &["order_id", "position"]);
    let a = EntityKey::new(meta.clone(), vec![Value::Int(1), Value::Int(2)]).unwrap();
    let b = EntityKey::new(meta, vec![Value::Int(2), Value::Int(1)]).unwrap();
    assert_ne!(a, b);
}

#[test]
fn test_mismatched_lengths_are_rejected() {
    let err = EntityKey::new(entity_meta("Line", &["order_id", "position"]), vec![Value::Int(1)])
        .unwrap_err();
    assert!(matches!(err, Error::KeyShape { columns: 2, values: 1, .. }));

    let err = RowKey::new(["a", "b"], vec![Value::Int(1)]).unwrap_err();
    assert!(matches!(err, Error::KeyShape { .. }));
}

fn order_items() -> Arc<AssociationKeyMetadata> {
    let target =
        AssociatedEntityKeyMetadata::new(["items_id"], entity_meta("Item", &["id"])).unwrap();
    Arc::new(AssociationKeyMetadata::builder("Order_Item", ["order_id"], target).build())
}

#[test]
fn test_association_key_identity_excludes_owner() {
    let a = AssociationKey::new(order_items(), vec![Value::Int(1)], key(1)).unwrap();
    let b = AssociationKey::new(order_items(), vec![Value::Int(1)], key(99)).unwrap();
    assert_eq!(a, b);
    assert_eq!(hash_of(&a), hash_of(&b));
}

#[test]
fn test_entity_key_from_tuple_defaults_absent_columns_to_null() {
    let metadata = order_items();
    let associated = metadata.associated_entity_key_metadata();
    let empty = Tuple::new();
    let target = associated.entity_key(&empty);
    assert_eq!(target.table(), "Item");
    assert_eq!(target.column_values(), &[Value::Null]);

    let mut row = Tuple::new();
    row.put("items_id", "i1".into());
    assert_eq!(associated.entity_key(&row).column_values(), &[Value::from("i1")]);
}

#[test]
fn test_entity_key_from_row_key_is_checked() {
    let metadata = order_items();
    let associated = metadata.associated_entity_key_metadata();

    let full = RowKey::new(["order_id", "items_id"], vec![1.into(), "i1".into()]).unwrap();
    let target = associated.entity_key_from_row_key(&full).unwrap();
    assert_eq!(target.column_values(), &[Value::from("i1")]);

    let indexed = RowKey::new(["order_id", "position"], vec![1.into(), 0.into()]).unwrap();
    match associated.entity_key_from_row_key(&indexed) {
        Err(Error::MissingRowKeyColumns { missing, .. }) => {
            assert_eq!(missing, vec!["items_id".to_string()])
        }
        other => panic!("expected MissingRowKeyColumns, got {:?}", other),
    }
}

fn scalar() -> impl Strategy<Value = Value> {
    prop_oneof![
        any::<i64>().prop_map(Value::Int),
        "[a-z]{0,6}".prop_map(Value::String),
        any::<bool>().prop_map(Value::Bool),
        Just(Value::Null),
    ]
}

proptest! {
    #[test]
    fn prop_equal_values_give_equal_hashes(values in prop::collection::vec(scalar(), 1..4)) {
        let names: Vec<String> = (0..values.len()).map(|i| format!("c{}", i)).collect();
        let meta = Arc::new(tessera::EntityKeyMetadata::new("T", names));
        let a = EntityKey::new(meta.clone(), values.clone()).unwrap();
        let b = EntityKey::new(meta, values).unwrap();
        prop_assert_eq!(&a, &b);
        prop_assert_eq!(hash_of(&a), hash_of(&b));
    }
}
