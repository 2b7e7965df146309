//! Tuples: one record's columns with pending changes
//!
//! A [`Tuple`] is backed by a read-only [`TupleSnapshot`] (the columns as last
//! read from the store, empty for a new record) and collects the changes
//! applied to it as [`TupleOperation`]s.
//!
//! # Read-Your-Writes Semantics
//!
//! When reading a column, the tuple checks in order:
//! 1. **pending operations**: the last put or remove for that column
//! 2. **snapshot**: the value as last read
//!
//! # Change Set
//!
//! The tuple keeps exactly one operation per touched column. A later put or
//! remove overwrites the earlier one in place, so the change set lists columns
//! in the order they were *first* touched. Stores applying the change set as a
//! single merge patch rely on this to never see a column twice.

use crate::value::Value;
use rustc_hash::FxHashMap;
use std::collections::BTreeMap;

/// Kind of a pending column change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TupleOperationType {
    /// Set the column to a non-null value
    Put,
    /// Set the column to null
    PutNull,
    /// Remove the column
    Remove,
}

/// One pending column change
#[derive(Debug, Clone, PartialEq)]
pub struct TupleOperation {
    column: String,
    value: Value,
    kind: TupleOperationType,
}

impl TupleOperation {
    /// Column being changed
    pub fn column(&self) -> &str {
        &self.column
    }

    /// New value; `Value::Null` for `PutNull` and `Remove`
    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Kind of change
    pub fn kind(&self) -> TupleOperationType {
        self.kind
    }
}

/// Whether the snapshot behind a tuple is known to exist in the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SnapshotType {
    /// Record does not exist yet
    Insert,
    /// Record was read from the store
    Update,
    /// Existence unknown
    Unknown,
}

/// Column values as last read from the store
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TupleSnapshot {
    columns: BTreeMap<String, Value>,
}

impl TupleSnapshot {
    /// Create an empty snapshot
    pub fn new() -> Self {
        Self::default()
    }

    /// Value of a column
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.columns.get(column)
    }

    /// Whether the snapshot holds no column
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Number of columns
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Column names in ascending order
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }

    /// `(column, value)` pairs in ascending column order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.columns.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl<S: Into<String>> FromIterator<(S, Value)> for TupleSnapshot {
    fn from_iter<I: IntoIterator<Item = (S, Value)>>(iter: I) -> Self {
        Self {
            columns: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

/// Mutable view of one record's columns
#[derive(Debug, Clone)]
pub struct Tuple {
    snapshot: TupleSnapshot,
    snapshot_type: SnapshotType,
    operations: Vec<TupleOperation>,
    // column -> position in `operations`
    index: FxHashMap<String, usize>,
}

impl Default for Tuple {
    fn default() -> Self {
        Self::new()
    }
}

impl Tuple {
    /// Create a tuple for a record that does not exist yet
    pub fn new() -> Self {
        Self::from_snapshot(TupleSnapshot::new(), SnapshotType::Insert)
    }

    /// Create a tuple over a snapshot read from the store
    pub fn from_snapshot(snapshot: TupleSnapshot, snapshot_type: SnapshotType) -> Self {
        Self {
            snapshot,
            snapshot_type,
            operations: Vec::new(),
            index: FxHashMap::default(),
        }
    }

    /// Current value of a column.
    ///
    /// Returns the pending value if the column was touched, else the snapshot
    /// value, else `None`. A column put to null reads as `Some(Value::Null)`;
    /// a removed column reads as `None`.
    pub fn get(&self, column: &str) -> Option<&Value> {
        match self.index.get(column) {
            Some(&i) => {
                let op = &self.operations[i];
                match op.kind {
                    TupleOperationType::Put | TupleOperationType::PutNull => Some(&op.value),
                    TupleOperationType::Remove => None,
                }
            }
            None => self.snapshot.get(column),
        }
    }

    /// Set a column; a `Value::Null` is recorded as `PutNull`
    pub fn put(&mut self, column: impl Into<String>, value: Value) {
        let kind = if value.is_null() {
            TupleOperationType::PutNull
        } else {
            TupleOperationType::Put
        };
        self.record(column.into(), value, kind);
    }

    /// Remove a column
    pub fn remove(&mut self, column: impl Into<String>) {
        self.record(column.into(), Value::Null, TupleOperationType::Remove);
    }

    fn record(&mut self, column: String, value: Value, kind: TupleOperationType) {
        match self.index.get(&column) {
            Some(&i) => {
                let op = &mut self.operations[i];
                op.value = value;
                op.kind = kind;
            }
            None => {
                self.index.insert(column.clone(), self.operations.len());
                self.operations.push(TupleOperation {
                    column,
                    value,
                    kind,
                });
            }
        }
    }

    /// Whether the *snapshot* is empty.
    ///
    /// Pending changes are ignored: this distinguishes a record that never
    /// existed from one that exists but is unmodified.
    pub fn is_empty(&self) -> bool {
        self.snapshot.is_empty()
    }

    /// Snapshot backing this tuple
    pub fn snapshot(&self) -> &TupleSnapshot {
        &self.snapshot
    }

    /// Whether the record is known to exist in the store
    pub fn snapshot_type(&self) -> SnapshotType {
        self.snapshot_type
    }

    /// Mark the record as existing (after a successful insert) or not
    pub fn set_snapshot_type(&mut self, snapshot_type: SnapshotType) {
        self.snapshot_type = snapshot_type;
    }

    /// Pending change set, one operation per touched column in first-touch order
    pub fn operations(&self) -> &[TupleOperation] {
        &self.operations
    }

    /// Whether any column was touched
    pub fn has_changes(&self) -> bool {
        !self.operations.is_empty()
    }

    /// Consume the tuple, returning its change set
    pub fn into_operations(self) -> Vec<TupleOperation> {
        self.operations
    }

    /// Names of the columns currently present: snapshot columns that were not
    /// removed, followed by newly put columns in first-touch order.
    pub fn column_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .snapshot
            .column_names()
            .filter(|c| self.get(c).is_some())
            .collect();
        for op in &self.operations {
            if op.kind != TupleOperationType::Remove && self.snapshot.get(&op.column).is_none() {
                names.push(&op.column);
            }
        }
        names
    }

    /// Every column this tuple knows about, including removed ones.
    ///
    /// Removed columns still describe the record's shape, which matters when
    /// deciding whether a whole embeddable became null.
    pub fn known_columns(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.snapshot.column_names().collect();
        for op in &self.operations {
            if self.snapshot.get(&op.column).is_none() {
                names.push(&op.column);
            }
        }
        names
    }

    /// Current `(column, value)` pairs, following [`Self::column_names`]
    pub fn values(&self) -> Vec<(&str, &Value)> {
        self.column_names()
            .into_iter()
            .filter_map(|c| self.get(c).map(|v| (c, v)))
            .collect()
    }
}
