//! In-memory document store
//!
//! Reference [`GridDialect`] storing every record as a nested JSON document,
//! the way document databases do. Dotted column names become nested paths,
//! null embeddables are removed as a whole and associations are laid out per
//! the resolved [`StorageOptions`]:
//!
//! - `InEntity`: rows live in the owner's document under the collection role
//! - `AssociationDocument`: rows live in one document per association key
//!
//! All maps are sharded (`DashMap`), so one store can serve many units of
//! work at once. No entry guard is held while another map is touched.

mod error;

pub use error::{DialectError, DialectResult};

use crate::config::TesseraConfig;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use rustc_hash::FxHashSet;
use serde_json::Value as JsonValue;
use std::sync::Arc;
use tessera_concurrency::{
    BatchFailure, BatchingGridDialect, GridDialect, GridDialectOperation, OperationResult,
};
use tessera_core::{
    Association, AssociationKey, EntityKey, EntityKeyMetadata, IdSourceKey, SnapshotType, Tuple,
    TupleSnapshot, Value,
};
use tessera_document::layout::{
    apply_tuple, association_rows, association_snapshot, get_path, index_column_kinds, set_path,
    tuple_snapshot, unset_path,
};
use tessera_document::{AssociationStorageType, Document, MapStorageType, StorageOptions};
use tracing::debug;

/// In-memory document store
#[derive(Debug)]
pub struct InMemoryDocumentDialect {
    entities: DashMap<EntityKey, Document>,
    associations: DashMap<AssociationKey, JsonValue>,
    // owner table -> paths of associations embedded in its documents
    embedded_roles: DashMap<String, FxHashSet<String>>,
    sequences: DashMap<IdSourceKey, i64>,
    // table -> last generated identity
    identities: DashMap<String, i64>,
    options: StorageOptions,
    supports_nesting: bool,
}

impl Default for InMemoryDocumentDialect {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryDocumentDialect {
    /// Empty store with default storage options
    pub fn new() -> Self {
        Self::with_options(StorageOptions::default())
    }

    /// Empty store resolving association layouts with `options`
    pub fn with_options(options: StorageOptions) -> Self {
        Self {
            entities: DashMap::new(),
            associations: DashMap::new(),
            embedded_roles: DashMap::new(),
            sequences: DashMap::new(),
            identities: DashMap::new(),
            options,
            supports_nesting: true,
        }
    }

    /// Empty store using the global storage settings of `config`
    pub fn from_config(config: &TesseraConfig) -> Self {
        Self::with_options(StorageOptions::new(config.storage_settings()))
    }

    /// Whether associations may be embedded in entity documents.
    ///
    /// Without nesting, `InEntity` falls back to `AssociationDocument`.
    pub fn with_nesting(mut self, supports_nesting: bool) -> Self {
        self.supports_nesting = supports_nesting;
        self
    }

    /// Storage options in use
    pub fn options(&self) -> &StorageOptions {
        &self.options
    }

    /// Number of stored entity documents
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Copy of the document stored for `key`
    pub fn document(&self, key: &EntityKey) -> Option<Document> {
        self.entities.get(key).map(|doc| doc.value().clone())
    }

    /// Copy of the dedicated association document stored for `key`
    pub fn association_document(&self, key: &AssociationKey) -> Option<JsonValue> {
        self.associations.get(key).map(|rows| rows.value().clone())
    }

    /// Read the record at `key`.
    ///
    /// Embedded associations are not part of the returned columns.
    pub fn get_tuple(&self, key: &EntityKey) -> Option<Tuple> {
        let doc = self.document(key)?;
        let roles: Vec<String> = self
            .embedded_roles
            .get(key.table())
            .map(|roles| roles.iter().cloned().collect())
            .unwrap_or_default();
        let snapshot = tuple_snapshot(&doc, roles.iter().map(String::as_str));
        Some(Tuple::from_snapshot(snapshot, SnapshotType::Update))
    }

    /// Read the association at `key`, wherever its layout put it
    ///
    /// # Errors
    /// Returns `DialectError::Core` if a stored row cannot be keyed.
    pub fn get_association(&self, key: &AssociationKey) -> DialectResult<Option<Association>> {
        let rows = match self.association_storage(key) {
            AssociationStorageType::InEntity => self
                .entities
                .get(key.owner())
                .and_then(|doc| get_path(doc.value(), association_path(key)).cloned()),
            AssociationStorageType::AssociationDocument => self.association_document(key),
        };
        match rows {
            Some(rows) => {
                let snapshot = association_snapshot(&rows, key)?;
                Ok(Some(Association::from_snapshot(snapshot)))
            }
            None => Ok(None),
        }
    }

    /// Current value of a generator, without advancing it
    pub fn current_value(&self, key: &IdSourceKey) -> Option<i64> {
        self.sequences.get(key).map(|v| *v.value())
    }

    fn association_storage(&self, key: &AssociationKey) -> AssociationStorageType {
        self.options
            .association_storage(key.metadata(), key.owner().table(), self.supports_nesting)
    }

    fn insert_tuple(
        &self,
        metadata: &Arc<EntityKeyMetadata>,
        tuple: &Tuple,
    ) -> DialectResult<OperationResult> {
        let [key_column] = metadata.column_names() else {
            return Err(DialectError::UnsupportedIdentity {
                table: metadata.table().to_string(),
                columns: metadata.column_names().len(),
            });
        };
        let id = {
            let mut last = self.identities.entry(metadata.table().to_string()).or_insert(0);
            *last += 1;
            *last
        };
        let key = EntityKey::new(metadata.clone(), vec![Value::Int(id)])?;
        match self.entities.entry(key.clone()) {
            Entry::Occupied(_) => Err(DialectError::DuplicateEntity(key)),
            Entry::Vacant(vacant) => {
                let mut doc = key_document(&key);
                apply_tuple(&mut doc, tuple, |column| column == key_column.as_str());
                vacant.insert(doc);
                debug!(
                    target: "tessera::dialect",
                    key = %key,
                    "Inserted entity with generated key"
                );
                Ok(OperationResult::InsertedKey(key))
            }
        }
    }

    fn update_tuple(
        &self,
        key: &EntityKey,
        tuple: &Tuple,
        expected: Option<&TupleSnapshot>,
    ) -> DialectResult<OperationResult> {
        let is_key_column = |column: &str| key.metadata().is_key_column(column);
        match (self.entities.entry(key.clone()), expected) {
            (Entry::Occupied(mut occupied), Some(expected)) => {
                if !holds(occupied.get(), expected) {
                    return Err(DialectError::OptimisticLockConflict(key.clone()));
                }
                apply_tuple(occupied.get_mut(), tuple, is_key_column);
            }
            (Entry::Vacant(_), Some(_)) => return Err(DialectError::NotFound(key.clone())),
            (Entry::Occupied(mut occupied), None) => {
                apply_tuple(occupied.get_mut(), tuple, is_key_column);
            }
            (Entry::Vacant(vacant), None) => {
                let mut doc = key_document(key);
                apply_tuple(&mut doc, tuple, is_key_column);
                vacant.insert(doc);
            }
        }
        Ok(OperationResult::Done)
    }

    fn remove_tuple(
        &self,
        key: &EntityKey,
        expected: Option<&TupleSnapshot>,
    ) -> DialectResult<OperationResult> {
        match (self.entities.entry(key.clone()), expected) {
            (Entry::Occupied(occupied), Some(expected)) => {
                if !holds(occupied.get(), expected) {
                    return Err(DialectError::OptimisticLockConflict(key.clone()));
                }
                occupied.remove();
            }
            (Entry::Vacant(_), Some(_)) => return Err(DialectError::NotFound(key.clone())),
            (Entry::Occupied(occupied), None) => {
                occupied.remove();
            }
            (Entry::Vacant(_), None) => {}
        }
        Ok(OperationResult::Done)
    }

    fn association_exists(&self, key: &AssociationKey) -> bool {
        let rows = match self.association_storage(key) {
            AssociationStorageType::InEntity => self
                .entities
                .get(key.owner())
                .and_then(|doc| get_path(doc.value(), association_path(key)).cloned()),
            AssociationStorageType::AssociationDocument => self.association_document(key),
        };
        rows.map_or(false, |rows| !is_empty_rows(&rows))
    }

    fn write_association(&self, key: &AssociationKey, association: &Association) {
        let metadata = key.metadata();
        let owner_table = key.owner().table();
        let kinds = index_column_kinds(association, metadata);
        let by_key =
            self.options.map_storage(metadata, owner_table, &kinds) == MapStorageType::ByKey;
        let rows = association_rows(association, metadata, by_key);

        match self.association_storage(key) {
            AssociationStorageType::InEntity => {
                let path = association_path(key);
                {
                    let mut doc = self
                        .entities
                        .entry(key.owner().clone())
                        .or_insert_with(|| key_document(key.owner()));
                    set_path(doc.value_mut(), path, rows);
                }
                self.embedded_roles
                    .entry(owner_table.to_string())
                    .or_default()
                    .insert(path.to_string());
                debug!(
                    target: "tessera::dialect",
                    key = %key,
                    path,
                    by_key,
                    "Stored association in owner"
                );
            }
            AssociationStorageType::AssociationDocument => {
                self.associations.insert(key.clone(), rows);
                debug!(
                    target: "tessera::dialect",
                    key = %key,
                    by_key,
                    "Stored association document"
                );
            }
        }
    }

    fn remove_association(&self, key: &AssociationKey) {
        match self.association_storage(key) {
            AssociationStorageType::InEntity => {
                if let Some(mut doc) = self.entities.get_mut(key.owner()) {
                    unset_path(doc.value_mut(), association_path(key));
                }
            }
            AssociationStorageType::AssociationDocument => {
                self.associations.remove(key);
            }
        }
    }

    fn next_value(
        &self,
        key: &IdSourceKey,
        increment: i64,
        initial_value: i64,
    ) -> DialectResult<OperationResult> {
        let mut next = self.sequences.entry(key.clone()).or_insert(initial_value);
        let value = *next;
        *next = value
            .checked_add(increment)
            .ok_or_else(|| DialectError::SequenceOverflow(key.clone()))?;
        Ok(OperationResult::NextValue(value))
    }
}

impl GridDialect for InMemoryDocumentDialect {
    type Error = DialectError;

    fn apply(&self, operation: &GridDialectOperation) -> DialectResult<OperationResult> {
        debug!(target: "tessera::dialect", operation = %operation.kind(), "Applying operation");
        match operation {
            // Nothing is buffered; the record appears on its first update
            GridDialectOperation::CreateTuple { .. }
            | GridDialectOperation::CreateAssociation { .. } => Ok(OperationResult::Done),
            GridDialectOperation::InsertTuple { metadata, tuple } => {
                self.insert_tuple(metadata, tuple)
            }
            GridDialectOperation::UpdateTuple {
                key,
                tuple,
                expected,
            } => self.update_tuple(key, tuple, expected.as_ref()),
            GridDialectOperation::RemoveTuple { key, expected } => {
                self.remove_tuple(key, expected.as_ref())
            }
            GridDialectOperation::InsertAssociation { key, association } => {
                if self.association_exists(key) {
                    return Err(DialectError::DuplicateAssociation(key.clone()));
                }
                self.write_association(key, association);
                Ok(OperationResult::Done)
            }
            GridDialectOperation::UpdateAssociation { key, association } => {
                self.write_association(key, association);
                Ok(OperationResult::Done)
            }
            GridDialectOperation::RemoveAssociation { key } => {
                self.remove_association(key);
                Ok(OperationResult::Done)
            }
            GridDialectOperation::NextValueRequest {
                key,
                increment,
                initial_value,
            } => self.next_value(key, *increment, *initial_value),
            GridDialectOperation::ExecuteBatch { operations } => self
                .execute_batch(operations)
                .map(OperationResult::Batch)
                .map_err(|failure| failure.error),
        }
    }
}

impl BatchingGridDialect for InMemoryDocumentDialect {
    fn execute_batch(
        &self,
        operations: &[GridDialectOperation],
    ) -> Result<Vec<OperationResult>, BatchFailure<DialectError>> {
        let mut results = Vec::with_capacity(operations.len());
        for operation in operations {
            match self.apply(operation) {
                Ok(result) => results.push(result),
                Err(error) => return Err(BatchFailure::new(results, error)),
            }
        }
        Ok(results)
    }
}

/// Document holding only the key columns of `key`
fn key_document(key: &EntityKey) -> Document {
    let mut doc = Document::new();
    for (column, value) in key.column_names().iter().zip(key.column_values()) {
        set_path(&mut doc, column, value.to_json());
    }
    doc
}

/// Field of the owner's document holding an embedded association
fn association_path(key: &AssociationKey) -> &str {
    key.metadata().collection_role().unwrap_or_else(|| key.table())
}

fn is_empty_rows(rows: &JsonValue) -> bool {
    match rows {
        JsonValue::Null => true,
        JsonValue::Array(items) => items.is_empty(),
        JsonValue::Object(entries) => entries.is_empty(),
        _ => false,
    }
}

/// Whether `doc` holds every expected column value; absent columns read as null
fn holds(doc: &Document, expected: &TupleSnapshot) -> bool {
    expected.iter().all(|(column, value)| {
        let stored = get_path(doc, column)
            .cloned()
            .map_or(Value::Null, Value::from_json);
        stored == *value
    })
}
