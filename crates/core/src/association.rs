//! Associations: the rows of one relationship instance with pending changes
//!
//! An [`Association`] is to an [`AssociationSnapshot`] what a
//! [`Tuple`](crate::tuple::Tuple) is to a tuple snapshot: reads see pending
//! changes first, and the change set holds one operation per touched row
//! key, in first-touch order. A [`Association::clear`] drops every pending
//! change and hides the snapshot; rows put afterwards are recorded after the
//! clear.

use crate::key::RowKey;
use crate::tuple::Tuple;
use rustc_hash::FxHashMap;

/// Rows of one association as last read from the store
#[derive(Debug, Clone, Default)]
pub struct AssociationSnapshot {
    rows: Vec<(RowKey, Tuple)>,
    index: FxHashMap<RowKey, usize>,
}

impl AssociationSnapshot {
    /// Create an empty snapshot
    pub fn new() -> Self {
        Self::default()
    }

    /// Row for `key`
    pub fn get(&self, key: &RowKey) -> Option<&Tuple> {
        self.index.get(key).map(|&i| &self.rows[i].1)
    }

    /// Whether a row exists for `key`
    pub fn contains_key(&self, key: &RowKey) -> bool {
        self.index.contains_key(key)
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the snapshot holds no row
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows in load order
    pub fn iter(&self) -> impl Iterator<Item = (&RowKey, &Tuple)> {
        self.rows.iter().map(|(k, t)| (k, t))
    }

    /// Row keys in load order
    pub fn row_keys(&self) -> impl Iterator<Item = &RowKey> {
        self.rows.iter().map(|(k, _)| k)
    }
}

impl FromIterator<(RowKey, Tuple)> for AssociationSnapshot {
    /// Build a snapshot; a repeated row key replaces the earlier row
    fn from_iter<I: IntoIterator<Item = (RowKey, Tuple)>>(iter: I) -> Self {
        let mut snapshot = Self::new();
        for (key, tuple) in iter {
            match snapshot.index.get(&key) {
                Some(&i) => snapshot.rows[i].1 = tuple,
                None => {
                    snapshot.index.insert(key.clone(), snapshot.rows.len());
                    snapshot.rows.push((key, tuple));
                }
            }
        }
        snapshot
    }
}

/// Kind of a pending association change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssociationOperationType {
    /// Insert or replace a row
    Put,
    /// Remove a row
    Remove,
    /// Remove every row
    Clear,
}

/// One pending association change
#[derive(Debug, Clone)]
pub enum AssociationOperation {
    /// Insert or replace the row at `key`
    Put {
        /// Row key
        key: RowKey,
        /// Full row
        value: Tuple,
    },
    /// Remove the row at `key`
    Remove {
        /// Row key
        key: RowKey,
    },
    /// Remove every row
    Clear,
}

impl AssociationOperation {
    /// Kind of change
    pub fn kind(&self) -> AssociationOperationType {
        match self {
            AssociationOperation::Put { .. } => AssociationOperationType::Put,
            AssociationOperation::Remove { .. } => AssociationOperationType::Remove,
            AssociationOperation::Clear => AssociationOperationType::Clear,
        }
    }

    /// Row key, absent for `Clear`
    pub fn key(&self) -> Option<&RowKey> {
        match self {
            AssociationOperation::Put { key, .. } | AssociationOperation::Remove { key } => {
                Some(key)
            }
            AssociationOperation::Clear => None,
        }
    }
}

/// Mutable view of one association's rows
#[derive(Debug, Clone, Default)]
pub struct Association {
    snapshot: AssociationSnapshot,
    cleared: bool,
    operations: Vec<AssociationOperation>,
    // row key -> position in `operations`
    index: FxHashMap<RowKey, usize>,
}

impl Association {
    /// Create an association with no stored rows
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an association over rows read from the store
    pub fn from_snapshot(snapshot: AssociationSnapshot) -> Self {
        Self {
            snapshot,
            ..Self::default()
        }
    }

    /// Snapshot backing this association
    pub fn snapshot(&self) -> &AssociationSnapshot {
        &self.snapshot
    }

    /// Current row for `key`
    pub fn get(&self, key: &RowKey) -> Option<&Tuple> {
        match self.index.get(key).map(|&i| &self.operations[i]) {
            Some(AssociationOperation::Put { value, .. }) => Some(value),
            Some(_) => None,
            None if self.cleared => None,
            None => self.snapshot.get(key),
        }
    }

    /// Insert or replace the row at `key`
    pub fn put(&mut self, key: RowKey, value: Tuple) {
        self.record(AssociationOperation::Put { key, value });
    }

    /// Remove the row at `key`
    pub fn remove(&mut self, key: RowKey) {
        self.record(AssociationOperation::Remove { key });
    }

    /// Remove every row, discarding pending changes
    pub fn clear(&mut self) {
        self.cleared = true;
        self.index.clear();
        self.operations.clear();
        self.operations.push(AssociationOperation::Clear);
    }

    fn record(&mut self, operation: AssociationOperation) {
        let Some(key) = operation.key() else {
            return;
        };
        match self.index.get(key) {
            Some(&i) => self.operations[i] = operation,
            None => {
                self.index.insert(key.clone(), self.operations.len());
                self.operations.push(operation);
            }
        }
    }

    /// Whether the association was cleared since it was loaded
    pub fn is_cleared(&self) -> bool {
        self.cleared
    }

    /// Pending change set
    pub fn operations(&self) -> &[AssociationOperation] {
        &self.operations
    }

    /// Whether anything changed since the association was loaded
    pub fn has_changes(&self) -> bool {
        !self.operations.is_empty()
    }

    /// Current rows: surviving snapshot rows in load order, then new rows in
    /// first-touch order
    pub fn rows(&self) -> Vec<(&RowKey, &Tuple)> {
        let mut rows = Vec::new();
        if !self.cleared {
            for (key, _) in self.snapshot.iter() {
                if let Some(tuple) = self.get(key) {
                    rows.push((key, tuple));
                }
            }
        }
        for op in &self.operations {
            if let AssociationOperation::Put { key, value } = op {
                if self.cleared || !self.snapshot.contains_key(key) {
                    rows.push((key, value));
                }
            }
        }
        rows
    }

    /// Number of current rows
    pub fn len(&self) -> usize {
        self.rows().len()
    }

    /// Whether the association currently holds no row
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;

    fn row_key(id: &str) -> RowKey {
        RowKey::new(["owners_id", "bankAccounts_id"], vec![1.into(), id.into()]).unwrap()
    }

    fn row(id: &str) -> Tuple {
        let mut tuple = Tuple::new();
        tuple.put("owners_id", 1.into());
        tuple.put("bankAccounts_id", id.into());
        tuple
    }

    fn loaded(ids: &[&str]) -> Association {
        Association::from_snapshot(ids.iter().map(|id| (row_key(id), row(id))).collect())
    }

    #[test]
    fn test_get_sees_pending_changes() {
        let mut assoc = loaded(&["a", "b"]);
        assoc.remove(row_key("a"));
        assoc.put(row_key("c"), row("c"));
        assert!(assoc.get(&row_key("a")).is_none());
        assert!(assoc.get(&row_key("b")).is_some());
        assert!(assoc.get(&row_key("c")).is_some());
        assert_eq!(assoc.len(), 2);
    }

    #[test]
    fn test_rows_order_is_snapshot_then_first_touch() {
        let mut assoc = loaded(&["a", "b"]);
        assoc.put(row_key("z"), row("z"));
        assoc.put(row_key("c"), row("c"));
        assoc.put(row_key("z"), row("z"));
        let ids: Vec<Value> = assoc
            .rows()
            .into_iter()
            .map(|(k, _)| k.column_value("bankAccounts_id").cloned().unwrap())
            .collect();
        assert_eq!(ids, vec!["a".into(), "b".into(), "z".into(), "c".into()]);
        assert_eq!(assoc.operations().len(), 2);
    }

    #[test]
    fn test_clear_hides_snapshot_and_resets_changes() {
        let mut assoc = loaded(&["a", "b"]);
        assoc.put(row_key("c"), row("c"));
        assoc.clear();
        assert!(assoc.is_empty());
        assert!(assoc.is_cleared());
        assert_eq!(assoc.operations().len(), 1);
        assert_eq!(assoc.operations()[0].kind(), AssociationOperationType::Clear);

        assoc.put(row_key("a"), row("a"));
        assert_eq!(assoc.len(), 1);
        assert_eq!(assoc.operations()[1].kind(), AssociationOperationType::Put);
    }

    #[test]
    fn test_remove_then_put_restores_row() {
        let mut assoc = loaded(&["a"]);
        assoc.remove(row_key("a"));
        assoc.put(row_key("a"), row("a"));
        assert_eq!(assoc.len(), 1);
        assert_eq!(assoc.operations().len(), 1);
        assert_eq!(assoc.operations()[0].kind(), AssociationOperationType::Put);
    }

    #[test]
    fn test_snapshot_from_iter_replaces_duplicates() {
        let snapshot: AssociationSnapshot =
            vec![(row_key("a"), row("a")), (row_key("a"), Tuple::new())]
                .into_iter()
                .collect();
        assert_eq!(snapshot.len(), 1);
        assert!(snapshot.get(&row_key("a")).unwrap().is_empty());
    }
}
