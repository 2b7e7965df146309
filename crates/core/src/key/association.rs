use super::{check_shape, fmt_columns, to_names, EntityKey, EntityKeyMetadata, RowKey};
use crate::error::{Error, Result};
use crate::tuple::Tuple;
use crate::value::Value;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Kind of association
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssociationKind {
    /// Association between entities
    Association,
    /// Collection of embeddables or basic values owned by an entity
    EmbeddedCollection,
}

/// Link from association rows to the entity on the other side
///
/// Maps the association row columns referencing the target entity onto the
/// key columns of that entity, position by position.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AssociatedEntityKeyMetadata {
    association_key_columns: Vec<String>,
    entity_key_metadata: Arc<EntityKeyMetadata>,
}

impl AssociatedEntityKeyMetadata {
    /// Create the link.
    ///
    /// # Errors
    /// Returns `Error::KeyShape` if the number of association columns differs
    /// from the number of key columns of the target entity.
    pub fn new<I, S>(
        association_key_columns: I,
        entity_key_metadata: Arc<EntityKeyMetadata>,
    ) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let association_key_columns = to_names(association_key_columns);
        check_shape(
            entity_key_metadata.table(),
            entity_key_metadata.column_names().len(),
            association_key_columns.len(),
        )?;
        Ok(Self {
            association_key_columns,
            entity_key_metadata,
        })
    }

    /// Association row columns referencing the target entity
    pub fn association_key_columns(&self) -> &[String] {
        &self.association_key_columns
    }

    /// Key metadata of the target entity
    pub fn entity_key_metadata(&self) -> &Arc<EntityKeyMetadata> {
        &self.entity_key_metadata
    }

    /// Whether `column` is an association row column referencing the target entity
    pub fn is_key_column(&self, column: &str) -> bool {
        self.association_key_columns.iter().any(|c| c == column)
    }

    /// Target entity key column corresponding to the given association row column
    pub fn corresponding_entity_key_column(&self, association_column: &str) -> Option<&str> {
        self.association_key_columns
            .iter()
            .position(|c| c == association_column)
            .map(|i| self.entity_key_metadata.column_names()[i].as_str())
    }

    /// Derive the target entity key from a full association row.
    ///
    /// Values are looked up by column name; a column absent from the tuple
    /// yields a `Value::Null` component rather than an error, so callers must
    /// make sure the row carries every referencing column.
    pub fn entity_key(&self, tuple: &Tuple) -> EntityKey {
        let values = self
            .association_key_columns
            .iter()
            .map(|column| tuple.get(column).cloned().unwrap_or(Value::Null))
            .collect();
        EntityKey::from_parts(self.entity_key_metadata.clone(), values)
    }

    /// Derive the target entity key from a row key alone.
    ///
    /// Only valid when the row key holds every referencing column, which is
    /// not the case for indexed and map-typed associations whose row keys
    /// are made of index columns.
    ///
    /// # Errors
    /// Returns `Error::MissingRowKeyColumns` naming the absent columns.
    pub fn entity_key_from_row_key(&self, row_key: &RowKey) -> Result<EntityKey> {
        let mut values = Vec::with_capacity(self.association_key_columns.len());
        let mut missing = Vec::new();
        for column in &self.association_key_columns {
            match row_key.column_value(column) {
                Some(value) => values.push(value.clone()),
                None => missing.push(column.clone()),
            }
        }
        if !missing.is_empty() {
            return Err(Error::MissingRowKeyColumns {
                table: self.entity_key_metadata.table().to_string(),
                missing,
            });
        }
        Ok(EntityKey::from_parts(self.entity_key_metadata.clone(), values))
    }
}

/// Shape of the keys of one association
///
/// Identity is `(table, column names)`; everything else describes how rows of
/// the association are built and is not part of equality.
#[derive(Debug, Clone)]
pub struct AssociationKeyMetadata {
    table: String,
    column_names: Vec<String>,
    row_key_column_names: Arc<[String]>,
    row_key_index_column_names: Vec<String>,
    associated_entity_key_metadata: AssociatedEntityKeyMetadata,
    inverse: bool,
    collection_role: Option<String>,
    kind: AssociationKind,
    one_to_one: bool,
}

/// Builder for [`AssociationKeyMetadata`]
#[derive(Debug)]
pub struct AssociationKeyMetadataBuilder {
    metadata: AssociationKeyMetadata,
}

impl AssociationKeyMetadataBuilder {
    /// Columns identifying one row of the association
    pub fn row_key_column_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.metadata.row_key_column_names = to_names(names).into();
        self
    }

    /// Index columns of the row key: map key columns or the list order column
    pub fn row_key_index_column_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.metadata.row_key_index_column_names = to_names(names);
        self
    }

    /// Mark as the inverse side of a bi-directional association
    pub fn inverse(mut self, inverse: bool) -> Self {
        self.metadata.inverse = inverse;
        self
    }

    /// Role of the collection, e.g. `Owner.bankAccounts`
    pub fn collection_role(mut self, role: impl Into<String>) -> Self {
        self.metadata.collection_role = Some(role.into());
        self
    }

    /// Kind of association
    pub fn kind(mut self, kind: AssociationKind) -> Self {
        self.metadata.kind = kind;
        self
    }

    /// Mark as a one-to-one association
    pub fn one_to_one(mut self, one_to_one: bool) -> Self {
        self.metadata.one_to_one = one_to_one;
        self
    }

    /// Finish building
    pub fn build(self) -> AssociationKeyMetadata {
        self.metadata
    }
}

impl AssociationKeyMetadata {
    /// Start building metadata for the association stored in `table` and
    /// owned through `column_names`.
    ///
    /// Row key columns default to the owning columns followed by the
    /// associated entity columns.
    pub fn builder<I, S>(
        table: impl Into<String>,
        column_names: I,
        associated_entity_key_metadata: AssociatedEntityKeyMetadata,
    ) -> AssociationKeyMetadataBuilder
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let column_names = to_names(column_names);
        let row_key_column_names: Vec<String> = column_names
            .iter()
            .chain(associated_entity_key_metadata.association_key_columns())
            .cloned()
            .collect();
        AssociationKeyMetadataBuilder {
            metadata: AssociationKeyMetadata {
                table: table.into(),
                column_names,
                row_key_column_names: row_key_column_names.into(),
                row_key_index_column_names: Vec::new(),
                associated_entity_key_metadata,
                inverse: false,
                collection_role: None,
                kind: AssociationKind::Association,
                one_to_one: false,
            },
        }
    }

    /// Association table
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Owning-side column names
    pub fn column_names(&self) -> &[String] {
        &self.column_names
    }

    /// Columns identifying one row of the association
    pub fn row_key_column_names(&self) -> &Arc<[String]> {
        &self.row_key_column_names
    }

    /// Index columns of the row key (map keys, list order)
    pub fn row_key_index_column_names(&self) -> &[String] {
        &self.row_key_index_column_names
    }

    /// Link to the entity on the other side
    pub fn associated_entity_key_metadata(&self) -> &AssociatedEntityKeyMetadata {
        &self.associated_entity_key_metadata
    }

    /// Whether this is the inverse side of a bi-directional association
    pub fn is_inverse(&self) -> bool {
        self.inverse
    }

    /// Collection role, if known
    pub fn collection_role(&self) -> Option<&str> {
        self.collection_role.as_deref()
    }

    /// Kind of association
    pub fn kind(&self) -> AssociationKind {
        self.kind
    }

    /// Whether this is a one-to-one association
    pub fn is_one_to_one(&self) -> bool {
        self.one_to_one
    }

    /// Whether `column` is one of the owning-side columns
    pub fn is_key_column(&self, column: &str) -> bool {
        self.column_names.iter().any(|c| c == column)
    }

    /// Columns from `candidates` which are not owning-side columns.
    ///
    /// Stores may persist only these when writing a row; the others can be
    /// restored from the key when reading.
    pub fn columns_without_key_columns<'a, I>(&self, candidates: I) -> Vec<String>
    where
        I: IntoIterator<Item = &'a str>,
    {
        candidates
            .into_iter()
            .filter(|c| !self.is_key_column(c))
            .map(str::to_string)
            .collect()
    }

    /// The single row key column which is not an owning-side column, if there
    /// is exactly one.
    ///
    /// Rows of such associations can be stored as plain values instead of
    /// nested records.
    pub fn single_row_key_column_not_in_association_key(&self) -> Option<&str> {
        let mut found = None;
        for column in self.row_key_column_names.iter() {
            if !self.is_key_column(column) {
                if found.is_some() {
                    return None;
                }
                found = Some(column.as_str());
            }
        }
        found
    }
}

impl PartialEq for AssociationKeyMetadata {
    fn eq(&self, other: &Self) -> bool {
        self.table == other.table && self.column_names == other.column_names
    }
}

impl Eq for AssociationKeyMetadata {}

impl Hash for AssociationKeyMetadata {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.table.hash(state);
    }
}

/// Identifier of one association instance, e.g. the collection of one owner
#[derive(Debug, Clone)]
pub struct AssociationKey {
    metadata: Arc<AssociationKeyMetadata>,
    column_values: Vec<Value>,
    owner: EntityKey,
}

impl AssociationKey {
    /// Create an association key.
    ///
    /// `owner` is the key of the entity owning the association; it is not part
    /// of the identity but is needed by stores embedding the association in
    /// the owner's record.
    ///
    /// # Errors
    /// Returns `Error::KeyShape` if the value count differs from the owning
    /// column count.
    pub fn new(
        metadata: Arc<AssociationKeyMetadata>,
        column_values: Vec<Value>,
        owner: EntityKey,
    ) -> Result<Self> {
        check_shape(
            metadata.table(),
            metadata.column_names().len(),
            column_values.len(),
        )?;
        Ok(Self {
            metadata,
            column_values,
            owner,
        })
    }

    /// Key metadata
    pub fn metadata(&self) -> &Arc<AssociationKeyMetadata> {
        &self.metadata
    }

    /// Association table
    pub fn table(&self) -> &str {
        self.metadata.table()
    }

    /// Owning-side column names
    pub fn column_names(&self) -> &[String] {
        self.metadata.column_names()
    }

    /// Owning-side column values
    pub fn column_values(&self) -> &[Value] {
        &self.column_values
    }

    /// Value of the given owning-side column
    pub fn column_value(&self, column: &str) -> Option<&Value> {
        self.column_names()
            .iter()
            .position(|c| c == column)
            .map(|i| &self.column_values[i])
    }

    /// Key of the owning entity
    pub fn owner(&self) -> &EntityKey {
        &self.owner
    }
}

impl PartialEq for AssociationKey {
    fn eq(&self, other: &Self) -> bool {
        self.table() == other.table()
            && self.column_names() == other.column_names()
            && self.column_values == other.column_values
    }
}

impl Eq for AssociationKey {}

impl Hash for AssociationKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.table().hash(state);
        self.column_values.hash(state);
    }
}

impl fmt::Display for AssociationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AssociationKey({}) [", self.table())?;
        fmt_columns(f, self.column_names(), &self.column_values)?;
        write!(f, "]")
    }
}
