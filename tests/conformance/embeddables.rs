//! Outermost null embeddable detection

use tessera::{EmbeddableStateFinder, Tuple, Value};

fn worked_example() -> Tuple {
    let mut tuple = Tuple::new();
    tuple.put("foo", 1.into());
    tuple.put("null1.b1", Value::Null);
    tuple.put("null1.b2", Value::Null);
    tuple.put("nonnull1.1", Value::Null);
    tuple.put("nonnull1.2", 1.into());
    tuple.put("nested1.null1.b1", Value::Null);
    tuple.put("nested1.null1.b2", Value::Null);
    tuple.put("nested1.notnull2", 1.into());
    tuple.put("nested3.null1.b1", Value::Null);
    tuple.put("nested3.null1.b2", Value::Null);
    tuple.put("nested3.null2", Value::Null);
    tuple
}

#[test]
fn test_worked_example() {
    let tuple = worked_example();
    let finder = EmbeddableStateFinder::new(&tuple);

    assert_eq!(finder.outer_most_null_embeddable_if_any("foo"), None);
    assert_eq!(finder.outer_most_null_embeddable_if_any("null1.b1"), Some("null1"));
    assert_eq!(finder.outer_most_null_embeddable_if_any("nonnull1.1"), None);
    assert_eq!(
        finder.outer_most_null_embeddable_if_any("nested1.null1.b1"),
        Some("nested1.null1")
    );
    assert_eq!(finder.outer_most_null_embeddable_if_any("nested3.null1.b2"), Some("nested3"));
    assert_eq!(finder.outer_most_null_embeddable_if_any("nested3.null2"), Some("nested3"));
}

#[test]
fn test_removed_columns_count_as_null() {
    let mut tuple = Tuple::new();
    tuple.put("address.city", "Lyon".into());
    tuple.remove("address.city");
    tuple.put("address.zip", Value::Null);
    let finder = EmbeddableStateFinder::new(&tuple);
    assert_eq!(finder.outer_most_null_embeddable_if_any("address.zip"), Some("address"));
}

#[test]
fn test_prefix_with_no_columns_is_not_null() {
    let tuple = worked_example();
    let finder = EmbeddableStateFinder::new(&tuple);
    assert_eq!(finder.outer_most_null_embeddable_if_any("ghost.x"), None);
    assert!(!finder.is_null_embeddable("ghost"));
}

#[test]
fn test_empty_column_list_has_no_null_embeddable() {
    let tuple = worked_example();
    let finder = EmbeddableStateFinder::with_columns(&tuple, std::iter::empty());
    assert_eq!(finder.outer_most_null_embeddable_if_any("null1.b1"), None);
    assert_eq!(finder.outer_most_null_embeddable_if_any("nested3.null2"), None);
}
