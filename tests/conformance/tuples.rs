//! Tuple read-your-writes and change set rules

use proptest::prelude::*;
use tessera::{SnapshotType, Tuple, TupleOperationType, TupleSnapshot, Value};

fn loaded() -> Tuple {
    let snapshot: TupleSnapshot = [("id", Value::Int(1)), ("name", Value::from("Ann"))]
        .into_iter()
        .collect();
    Tuple::from_snapshot(snapshot, SnapshotType::Update)
}

#[test]
fn test_put_then_get() {
    let mut tuple = loaded();
    tuple.put("name", "Bob".into());
    assert_eq!(tuple.get("name"), Some(&Value::from("Bob")));
    assert_eq!(tuple.get("id"), Some(&Value::Int(1)));
    assert_eq!(tuple.get("missing"), None);
}

#[test]
fn test_remove_then_get_is_absent() {
    let mut tuple = loaded();
    tuple.remove("name");
    assert_eq!(tuple.get("name"), None);
    tuple.remove("name");
    assert_eq!(tuple.operations().len(), 1);
}

#[test]
fn test_is_empty_reflects_the_snapshot_only() {
    let mut fresh = Tuple::new();
    fresh.put("name", "Ann".into());
    assert!(fresh.is_empty());

    let mut tuple = loaded();
    tuple.remove("id");
    tuple.remove("name");
    assert!(!tuple.is_empty());
}

#[test]
fn test_change_set_is_one_final_operation_per_column_in_first_touch_order() {
    let mut tuple = loaded();
    tuple.put("b", 1.into());
    tuple.put("a", 1.into());
    tuple.remove("b");
    tuple.put("a", Value::Null);
    tuple.put("b", 2.into());

    let ops: Vec<(&str, TupleOperationType)> =
        tuple.operations().iter().map(|op| (op.column(), op.kind())).collect();
    assert_eq!(
        ops,
        vec![("b", TupleOperationType::Put), ("a", TupleOperationType::PutNull)]
    );
    assert_eq!(tuple.get("b"), Some(&Value::Int(2)));
}

proptest! {
    #[test]
    fn prop_reads_see_the_last_write(
        writes in prop::collection::vec(("[a-c]", prop::option::of(any::<i64>())), 1..20)
    ) {
        let mut tuple = Tuple::new();
        for (column, value) in &writes {
            match value {
                Some(v) => tuple.put(column.clone(), Value::Int(*v)),
                None => tuple.remove(column.clone()),
            }
        }
        for column in ["a", "b", "c"] {
            let last = writes.iter().rev().find(|(c, _)| c == column);
            match last {
                Some((_, Some(v))) => prop_assert_eq!(tuple.get(column), Some(&Value::Int(*v))),
                _ => prop_assert_eq!(tuple.get(column), None),
            }
        }
    }
}
