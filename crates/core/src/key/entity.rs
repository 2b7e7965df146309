use super::{check_shape, fmt_columns, to_names};
use crate::error::Result;
use crate::value::Value;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Shape of the keys of one entity table: table name + ordered key column names
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EntityKeyMetadata {
    table: String,
    column_names: Vec<String>,
}

impl EntityKeyMetadata {
    /// Create key metadata for `table` with the given ordered key columns
    pub fn new<I, S>(table: impl Into<String>, column_names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            table: table.into(),
            column_names: to_names(column_names),
        }
    }

    /// Table (or collection, cache, label) name
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Ordered key column names
    pub fn column_names(&self) -> &[String] {
        &self.column_names
    }

    /// Whether `column` is one of the key columns
    pub fn is_key_column(&self, column: &str) -> bool {
        self.column_names.iter().any(|c| c == column)
    }
}

/// Identifier of one entity record
///
/// Two entity keys are equal iff their tables are equal and their column
/// values are equal position by position. The hash only depends on the table
/// and the values, so keys can be used directly as map keys.
#[derive(Debug, Clone)]
pub struct EntityKey {
    metadata: Arc<EntityKeyMetadata>,
    column_values: Vec<Value>,
}

impl EntityKey {
    /// Create a key from its metadata and positional column values.
    ///
    /// # Errors
    /// Returns `Error::KeyShape` if the number of values differs from the
    /// number of key columns.
    pub fn new(metadata: Arc<EntityKeyMetadata>, column_values: Vec<Value>) -> Result<Self> {
        check_shape(
            metadata.table(),
            metadata.column_names().len(),
            column_values.len(),
        )?;
        Ok(Self {
            metadata,
            column_values,
        })
    }

    // Caller guarantees one value per key column.
    pub(crate) fn from_parts(metadata: Arc<EntityKeyMetadata>, column_values: Vec<Value>) -> Self {
        debug_assert_eq!(metadata.column_names().len(), column_values.len());
        Self {
            metadata,
            column_values,
        }
    }

    /// Key metadata
    pub fn metadata(&self) -> &Arc<EntityKeyMetadata> {
        &self.metadata
    }

    /// Table name
    pub fn table(&self) -> &str {
        self.metadata.table()
    }

    /// Ordered key column names
    pub fn column_names(&self) -> &[String] {
        self.metadata.column_names()
    }

    /// Column values, positionally aligned with [`Self::column_names`]
    pub fn column_values(&self) -> &[Value] {
        &self.column_values
    }

    /// Value of the given key column, if it is part of the key
    pub fn column_value(&self, column: &str) -> Option<&Value> {
        self.column_names()
            .iter()
            .position(|c| c == column)
            .map(|i| &self.column_values[i])
    }
}

impl PartialEq for EntityKey {
    fn eq(&self, other: &Self) -> bool {
        self.table() == other.table() && self.column_values == other.column_values
    }
}

impl Eq for EntityKey {}

impl Hash for EntityKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.table().hash(state);
        self.column_values.hash(state);
    }
}

impl fmt::Display for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntityKey({}) [", self.table())?;
        fmt_columns(f, self.column_names(), &self.column_values)?;
        write!(f, "]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use proptest::prelude::*;
    use std::collections::hash_map::DefaultHasher;
    use std::collections::HashMap;

    fn hash_of<T: Hash>(t: &T) -> u64 {
        let mut hasher = DefaultHasher::new();
        t.hash(&mut hasher);
        hasher.finish()
    }

    fn shipment() -> Arc<EntityKeyMetadata> {
        Arc::new(EntityKeyMetadata::new("Shipment", ["id"]))
    }

    #[test]
    fn test_key_shape_mismatch_is_rejected() {
        let err = EntityKey::new(shipment(), vec![]).unwrap_err();
        assert!(matches!(err, Error::KeyShape { columns: 1, values: 0, .. }));

        let err = EntityKey::new(shipment(), vec!["a".into(), "b".into()]).unwrap_err();
        assert!(matches!(err, Error::KeyShape { columns: 1, values: 2, .. }));
    }

    #[test]
    fn test_column_value_lookup() {
        let meta = Arc::new(EntityKeyMetadata::new("Account", ["login", "realm"]));
        let key = EntityKey::new(meta, vec!["bob".into(), "corp".into()]).unwrap();
        assert_eq!(key.column_value("realm"), Some(&Value::from("corp")));
        assert_eq!(key.column_value("missing"), None);
        assert!(key.metadata().is_key_column("login"));
    }

    #[test]
    fn test_keys_from_distinct_metadata_instances_are_equal() {
        let k1 = EntityKey::new(shipment(), vec!["shipment-1".into()]).unwrap();
        let k2 = EntityKey::new(shipment(), vec!["shipment-1".into()]).unwrap();
        assert_eq!(k1, k2);
        assert_eq!(hash_of(&k1), hash_of(&k2));
    }

    #[test]
    fn test_differently_ordered_metadata_is_not_normalized() {
        let ab = Arc::new(EntityKeyMetadata::new("T", ["a", "b"]));
        let ba = Arc::new(EntityKeyMetadata::new("T", ["b", "a"]));
        let k1 = EntityKey::new(ab, vec![1.into(), 2.into()]).unwrap();
        let k2 = EntityKey::new(ba, vec![2.into(), 1.into()]).unwrap();
        assert_ne!(k1, k2);
    }

    #[test]
    fn test_usable_as_map_key() {
        let mut map = HashMap::new();
        map.insert(EntityKey::new(shipment(), vec!["s1".into()]).unwrap(), 1);
        let lookup = EntityKey::new(shipment(), vec!["s1".into()]).unwrap();
        assert_eq!(map.get(&lookup), Some(&1));
    }

    #[test]
    fn test_display() {
        let key = EntityKey::new(shipment(), vec!["s1".into()]).unwrap();
        assert_eq!(key.to_string(), "EntityKey(Shipment) [id=\"s1\"]");
    }

    proptest! {
        #[test]
        fn prop_equal_table_and_values_imply_equal_keys(
            table in "[A-Za-z]{1,8}",
            values in proptest::collection::vec(any::<i64>(), 1..4),
        ) {
            let names: Vec<String> = (0..values.len()).map(|i| format!("c{}", i)).collect();
            let values: Vec<Value> = values.into_iter().map(Value::Int).collect();
            let m1 = Arc::new(EntityKeyMetadata::new(table.clone(), names.clone()));
            let m2 = Arc::new(EntityKeyMetadata::new(table, names));
            let k1 = EntityKey::new(m1, values.clone()).unwrap();
            let k2 = EntityKey::new(m2, values).unwrap();
            prop_assert_eq!(&k1, &k2);
            prop_assert_eq!(hash_of(&k1), hash_of(&k2));
        }

        #[test]
        fn prop_different_values_imply_different_keys(a in any::<i64>(), b in any::<i64>()) {
            prop_assume!(a != b);
            let k1 = EntityKey::new(shipment(), vec![Value::Int(a)]).unwrap();
            let k2 = EntityKey::new(shipment(), vec![Value::Int(b)]).unwrap();
            prop_assert_ne!(k1, k2);
        }
    }
}
