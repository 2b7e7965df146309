//! Document layout
//!
//! Maps tuples and associations onto JSON documents:
//! - dotted column paths become nested objects (`address.city` is stored as
//!   `{"address": {"city": ...}}`)
//! - a column put to null or removed is unset, together with the outermost
//!   embeddable that became wholly null
//! - association rows are stored as a list of rows, or as an object keyed by
//!   the map key for map-typed associations stored [`MapStorageType::ByKey`]
//!
//! Association rows only persist the columns that cannot be restored from the
//! association key. A row left with a single such column is stored as a plain
//! value.
//!
//! [`MapStorageType::ByKey`]: crate::options::MapStorageType::ByKey

use crate::embeddable::EmbeddableStateFinder;
use rustc_hash::FxHashSet;
use serde_json::Value as JsonValue;
use tessera_core::{
    Association, AssociationKey, AssociationKeyMetadata, AssociationSnapshot, Result, RowKey,
    SnapshotType, Tuple, TupleOperationType, TupleSnapshot, Value, ValueKind,
};

/// A JSON document: one entity record or one association document
pub type Document = serde_json::Map<String, JsonValue>;

// =============================================================================
// Dotted paths
// =============================================================================

/// Value at a dotted path
pub fn get_path<'a>(doc: &'a Document, path: &str) -> Option<&'a JsonValue> {
    let mut current = doc;
    let mut segments = path.split('.').peekable();
    while let Some(segment) = segments.next() {
        let value = current.get(segment)?;
        if segments.peek().is_none() {
            return Some(value);
        }
        current = value.as_object()?;
    }
    None
}

/// Set the value at a dotted path, creating intermediate objects.
///
/// An intermediate value which is not an object is replaced.
pub fn set_path(doc: &mut Document, path: &str, value: JsonValue) {
    let (parents, leaf) = match path.rsplit_once('.') {
        Some((parents, leaf)) => (Some(parents), leaf),
        None => (None, path),
    };
    let mut current = doc;
    for segment in parents.into_iter().flat_map(|p| p.split('.')) {
        let slot = current.entry(segment).or_insert(JsonValue::Null);
        if !slot.is_object() {
            *slot = JsonValue::Object(Document::new());
        }
        let Some(child) = slot.as_object_mut() else {
            return;
        };
        current = child;
    }
    current.insert(leaf.to_string(), value);
}

/// Remove the value at a dotted path, returning it
pub fn unset_path(doc: &mut Document, path: &str) -> Option<JsonValue> {
    match path.rsplit_once('.') {
        None => doc.remove(path),
        Some((parents, leaf)) => {
            let mut current = doc;
            for segment in parents.split('.') {
                current = current.get_mut(segment)?.as_object_mut()?;
            }
            current.remove(leaf)
        }
    }
}

/// Flatten nested objects into `(dotted path, leaf value)` pairs.
///
/// Arrays are leaves; empty objects are dropped.
pub fn flatten(doc: &Document) -> Vec<(String, JsonValue)> {
    let mut out = Vec::new();
    flatten_into(doc, None, &mut out);
    out
}

fn flatten_into(doc: &Document, prefix: Option<&str>, out: &mut Vec<(String, JsonValue)>) {
    for (name, value) in doc {
        let path = match prefix {
            Some(prefix) => format!("{}.{}", prefix, name),
            None => name.clone(),
        };
        match value {
            JsonValue::Object(child) => flatten_into(child, Some(&path), out),
            leaf => out.push((path, leaf.clone())),
        }
    }
}

// =============================================================================
// Tuples
// =============================================================================

/// Apply a tuple's change set to a document.
///
/// Columns for which `skip` returns true are left untouched. Each null
/// embeddable is unset once, as a whole.
pub fn apply_tuple<F>(doc: &mut Document, tuple: &Tuple, skip: F)
where
    F: Fn(&str) -> bool,
{
    let finder = EmbeddableStateFinder::new(tuple);
    let mut unset_embeddables: FxHashSet<&str> = FxHashSet::default();
    for op in tuple.operations() {
        let column = op.column();
        if skip(column) {
            continue;
        }
        match op.kind() {
            TupleOperationType::Put => set_path(doc, column, op.value().to_json()),
            TupleOperationType::PutNull | TupleOperationType::Remove => {
                match finder.outer_most_null_embeddable_if_any(column) {
                    Some(embeddable) => {
                        if unset_embeddables.insert(embeddable) {
                            unset_path(doc, embeddable);
                        }
                    }
                    None => {
                        unset_path(doc, column);
                    }
                }
            }
        }
    }
}

/// Snapshot of a document's columns, skipping every path under `excluded`
pub fn tuple_snapshot<'a, I>(doc: &Document, excluded: I) -> TupleSnapshot
where
    I: IntoIterator<Item = &'a str>,
{
    let excluded: Vec<&str> = excluded.into_iter().collect();
    flatten(doc)
        .into_iter()
        .filter(|(path, _)| !excluded.iter().any(|e| is_under(path, e)))
        .map(|(path, value)| (path, Value::from_json(value)))
        .collect()
}

fn is_under(path: &str, root: &str) -> bool {
    path == root
        || path
            .strip_prefix(root)
            .map_or(false, |rest| rest.starts_with('.'))
}

// =============================================================================
// Associations
// =============================================================================

/// Kinds of the map key columns across the current rows.
///
/// A column reports `String` when every row holds a string there, otherwise
/// the first other kind found.
pub fn index_column_kinds(
    association: &Association,
    metadata: &AssociationKeyMetadata,
) -> Vec<ValueKind> {
    let rows = association.rows();
    metadata
        .row_key_index_column_names()
        .iter()
        .map(|column| {
            rows.iter()
                .map(|(key, _)| key.column_value(column).map_or(ValueKind::Null, Value::kind))
                .find(|kind| !kind.is_string_like())
                .unwrap_or(ValueKind::String)
        })
        .collect()
}

/// Render the current rows of an association.
///
/// With `by_key`, rows are keyed by the single map key column; one-to-one
/// associations store their only row (or null) instead of a list.
pub fn association_rows(
    association: &Association,
    metadata: &AssociationKeyMetadata,
    by_key: bool,
) -> JsonValue {
    let prefix = shared_prefix(metadata);
    let index_column = match metadata.row_key_index_column_names() {
        [single] if by_key => Some(single.as_str()),
        _ => None,
    };

    if let Some(index_column) = index_column {
        let mut rows = Document::new();
        for (_, row) in association.rows() {
            let mut object = row_object(row, metadata, &prefix);
            let map_key = match object.remove(index_column) {
                Some(JsonValue::String(s)) => s,
                Some(other) => other.to_string(),
                None => continue,
            };
            let value = if object.len() == 1 {
                object.into_iter().next().map_or(JsonValue::Null, |(_, v)| v)
            } else {
                JsonValue::Object(object)
            };
            rows.insert(map_key, value);
        }
        return JsonValue::Object(rows);
    }

    let mut rows: Vec<JsonValue> = association
        .rows()
        .into_iter()
        .map(|(_, row)| render_row(row, metadata, &prefix))
        .collect();
    if metadata.is_one_to_one() {
        return if rows.is_empty() {
            JsonValue::Null
        } else {
            rows.swap_remove(0)
        };
    }
    JsonValue::Array(rows)
}

fn render_row(row: &Tuple, metadata: &AssociationKeyMetadata, prefix: &str) -> JsonValue {
    let columns = metadata.columns_without_key_columns(row.column_names());
    match columns.as_slice() {
        [single] => row.get(single).map_or(JsonValue::Null, Value::to_json),
        _ => JsonValue::Object(row_object(row, metadata, prefix)),
    }
}

fn row_object(row: &Tuple, metadata: &AssociationKeyMetadata, prefix: &str) -> Document {
    let mut object = Document::new();
    for column in metadata.columns_without_key_columns(row.column_names()) {
        if let Some(value) = row.get(&column).filter(|v| !v.is_null()) {
            let name = column.strip_prefix(prefix).unwrap_or(&column);
            set_path(&mut object, name, value.to_json());
        }
    }
    object
}

/// Prefix shared by every column linking to the associated entity, with its
/// trailing dot, or an empty string.
///
/// Rows persist those columns without it: `{"id": {"a": 1, "b": 2}}` is
/// stored as `{"a": 1, "b": 2}`.
fn shared_prefix(metadata: &AssociationKeyMetadata) -> String {
    let mut shared: Option<&str> = None;
    for column in metadata.associated_entity_key_metadata().association_key_columns() {
        match (column.split_once('.'), shared) {
            (Some((head, _)), None) => shared = Some(head),
            (Some((head, _)), Some(current)) if head == current => {}
            _ => return String::new(),
        }
    }
    shared.map(|s| format!("{}.", s)).unwrap_or_default()
}

/// Rebuild the association snapshot from stored rows.
///
/// Accepts every layout [`association_rows`] produces.
pub fn association_snapshot(rows: &JsonValue, key: &AssociationKey) -> Result<AssociationSnapshot> {
    let metadata = key.metadata();
    let prefix = shared_prefix(metadata);
    let base: Vec<(String, Value)> = key
        .column_names()
        .iter()
        .cloned()
        .zip(key.column_values().iter().cloned())
        .collect();

    let mut restored: Vec<Vec<(String, Value)>> = Vec::new();
    match rows {
        JsonValue::Null => {}
        single if metadata.is_one_to_one() && !single.is_array() => {
            restored.push(restore_row(base.clone(), single, metadata, &prefix, None));
        }
        JsonValue::Object(by_key) => {
            let index_column = metadata.row_key_index_column_names().first().map(String::as_str);
            for (map_key, value) in by_key {
                let mut columns = base.clone();
                if let Some(index_column) = index_column {
                    columns.push((index_column.to_string(), Value::String(map_key.clone())));
                }
                restored.push(restore_row(columns, value, metadata, &prefix, index_column));
            }
        }
        JsonValue::Array(items) => {
            for item in items {
                restored.push(restore_row(base.clone(), item, metadata, &prefix, None));
            }
        }
        single => restored.push(restore_row(base.clone(), single, metadata, &prefix, None)),
    }

    let names = metadata.row_key_column_names();
    let mut snapshot = Vec::with_capacity(restored.len());
    for columns in restored {
        let tuple = Tuple::from_snapshot(columns.into_iter().collect(), SnapshotType::Update);
        let values = names
            .iter()
            .map(|n| tuple.get(n).cloned().unwrap_or(Value::Null))
            .collect();
        snapshot.push((RowKey::with_shared_names(names.clone(), values)?, tuple));
    }
    Ok(snapshot.into_iter().collect())
}

fn restore_row(
    mut columns: Vec<(String, Value)>,
    stored: &JsonValue,
    metadata: &AssociationKeyMetadata,
    prefix: &str,
    index_column: Option<&str>,
) -> Vec<(String, Value)> {
    let associated = metadata.associated_entity_key_metadata();
    match stored {
        JsonValue::Object(object) => {
            for (path, value) in flatten(object) {
                let prefixed = format!("{}{}", prefix, path);
                let column = if !prefix.is_empty() && associated.is_key_column(&prefixed) {
                    prefixed
                } else {
                    path
                };
                columns.push((column, Value::from_json(value)));
            }
        }
        plain => {
            if let Some(column) = plain_value_column(metadata, index_column) {
                columns.push((column.to_string(), Value::from_json(plain.clone())));
            }
        }
    }
    columns
}

/// Column a row stored as a plain value belongs to: the only row key column
/// left besides the owning and map key columns, else the only column linking
/// to the associated entity (map rows keyed by the map key).
fn plain_value_column<'m>(
    metadata: &'m AssociationKeyMetadata,
    index_column: Option<&str>,
) -> Option<&'m str> {
    let mut candidates = metadata
        .row_key_column_names()
        .iter()
        .filter(|c| !metadata.is_key_column(c) && Some(c.as_str()) != index_column);
    if let (Some(column), None) = (candidates.next(), candidates.next()) {
        return Some(column.as_str());
    }
    match metadata.associated_entity_key_metadata().association_key_columns() {
        [single] => Some(single.as_str()),
        _ => None,
    }
}
