//! Grid dialect operations
//!
//! One [`GridDialectOperation`] is one write intent destined for a backend
//! adapter. Operations are built once, when a unit of work is flushed, from the
//! change set of a tuple or association plus the key(s) involved, and are
//! never modified afterwards: the compensation protocol hands the very same
//! values to error handlers.

use std::fmt;
use std::sync::Arc;
use tessera_core::{
    Association, AssociationKey, EntityKey, EntityKeyMetadata, IdSourceKey, Tuple, TupleSnapshot,
};

/// Discriminant of a [`GridDialectOperation`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GridDialectOperationType {
    /// See [`GridDialectOperation::CreateTuple`]
    CreateTuple,
    /// See [`GridDialectOperation::InsertTuple`]
    InsertTuple,
    /// See [`GridDialectOperation::UpdateTuple`]
    UpdateTuple,
    /// See [`GridDialectOperation::RemoveTuple`]
    RemoveTuple,
    /// See [`GridDialectOperation::CreateAssociation`]
    CreateAssociation,
    /// See [`GridDialectOperation::InsertAssociation`]
    InsertAssociation,
    /// See [`GridDialectOperation::UpdateAssociation`]
    UpdateAssociation,
    /// See [`GridDialectOperation::RemoveAssociation`]
    RemoveAssociation,
    /// See [`GridDialectOperation::NextValueRequest`]
    NextValueRequest,
    /// See [`GridDialectOperation::ExecuteBatch`]
    ExecuteBatch,
}

impl GridDialectOperationType {
    /// Operation name as used in logs
    pub fn as_str(&self) -> &'static str {
        match self {
            GridDialectOperationType::CreateTuple => "CreateTuple",
            GridDialectOperationType::InsertTuple => "InsertTuple",
            GridDialectOperationType::UpdateTuple => "UpdateTuple",
            GridDialectOperationType::RemoveTuple => "RemoveTuple",
            GridDialectOperationType::CreateAssociation => "CreateAssociation",
            GridDialectOperationType::InsertAssociation => "InsertAssociation",
            GridDialectOperationType::UpdateAssociation => "UpdateAssociation",
            GridDialectOperationType::RemoveAssociation => "RemoveAssociation",
            GridDialectOperationType::NextValueRequest => "NextValueRequest",
            GridDialectOperationType::ExecuteBatch => "ExecuteBatch",
        }
    }
}

impl fmt::Display for GridDialectOperationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One write intent for a backend adapter
#[derive(Debug, Clone)]
pub enum GridDialectOperation {
    /// Announce a new record for `key`; stores buffering writes client-side
    /// need not touch the backend until the record is updated
    CreateTuple {
        /// Key of the new record
        key: EntityKey,
    },
    /// Insert a record whose key is generated by the store (identity column)
    InsertTuple {
        /// Key shape of the table; holds a single generated column
        metadata: Arc<EntityKeyMetadata>,
        /// Columns of the new record, key column excluded
        tuple: Tuple,
    },
    /// Insert or update the record at `key` with the tuple's change set
    UpdateTuple {
        /// Record key
        key: EntityKey,
        /// Tuple carrying the change set
        tuple: Tuple,
        /// Column values the stored record must hold for the write to apply
        expected: Option<TupleSnapshot>,
    },
    /// Remove the record at `key`
    RemoveTuple {
        /// Record key
        key: EntityKey,
        /// Column values the stored record must hold for the removal to apply
        expected: Option<TupleSnapshot>,
    },
    /// Announce a new, empty association
    CreateAssociation {
        /// Association key
        key: AssociationKey,
    },
    /// Store a new association; it must not exist yet
    InsertAssociation {
        /// Association key
        key: AssociationKey,
        /// Association rows
        association: Association,
    },
    /// Replace the stored rows of an association
    UpdateAssociation {
        /// Association key
        key: AssociationKey,
        /// Association rows
        association: Association,
    },
    /// Remove an association and all its rows
    RemoveAssociation {
        /// Association key
        key: AssociationKey,
    },
    /// Fetch the next value of an identifier generator
    NextValueRequest {
        /// Generator key
        key: IdSourceKey,
        /// Step between two values
        increment: i64,
        /// Value returned by the first request
        initial_value: i64,
    },
    /// Operations applied in one adapter call
    ExecuteBatch {
        /// Grouped operations, in submission order
        operations: Vec<GridDialectOperation>,
    },
}

impl GridDialectOperation {
    /// Insert or update without optimistic lock
    pub fn update_tuple(key: EntityKey, tuple: Tuple) -> Self {
        GridDialectOperation::UpdateTuple {
            key,
            tuple,
            expected: None,
        }
    }

    /// Update guarded by the expected lock state
    pub fn update_tuple_with_lock(key: EntityKey, tuple: Tuple, expected: TupleSnapshot) -> Self {
        GridDialectOperation::UpdateTuple {
            key,
            tuple,
            expected: Some(expected),
        }
    }

    /// Removal without optimistic lock
    pub fn remove_tuple(key: EntityKey) -> Self {
        GridDialectOperation::RemoveTuple {
            key,
            expected: None,
        }
    }

    /// Removal guarded by the expected lock state
    pub fn remove_tuple_with_lock(key: EntityKey, expected: TupleSnapshot) -> Self {
        GridDialectOperation::RemoveTuple {
            key,
            expected: Some(expected),
        }
    }

    /// Discriminant
    pub fn kind(&self) -> GridDialectOperationType {
        match self {
            GridDialectOperation::CreateTuple { .. } => GridDialectOperationType::CreateTuple,
            GridDialectOperation::InsertTuple { .. } => GridDialectOperationType::InsertTuple,
            GridDialectOperation::UpdateTuple { .. } => GridDialectOperationType::UpdateTuple,
            GridDialectOperation::RemoveTuple { .. } => GridDialectOperationType::RemoveTuple,
            GridDialectOperation::CreateAssociation { .. } => {
                GridDialectOperationType::CreateAssociation
            }
            GridDialectOperation::InsertAssociation { .. } => {
                GridDialectOperationType::InsertAssociation
            }
            GridDialectOperation::UpdateAssociation { .. } => {
                GridDialectOperationType::UpdateAssociation
            }
            GridDialectOperation::RemoveAssociation { .. } => {
                GridDialectOperationType::RemoveAssociation
            }
            GridDialectOperation::NextValueRequest { .. } => {
                GridDialectOperationType::NextValueRequest
            }
            GridDialectOperation::ExecuteBatch { .. } => GridDialectOperationType::ExecuteBatch,
        }
    }

    /// Entity key targeted by tuple operations
    pub fn entity_key(&self) -> Option<&EntityKey> {
        match self {
            GridDialectOperation::CreateTuple { key }
            | GridDialectOperation::UpdateTuple { key, .. }
            | GridDialectOperation::RemoveTuple { key, .. } => Some(key),
            _ => None,
        }
    }

    /// Association key targeted by association operations
    pub fn association_key(&self) -> Option<&AssociationKey> {
        match self {
            GridDialectOperation::CreateAssociation { key }
            | GridDialectOperation::InsertAssociation { key, .. }
            | GridDialectOperation::UpdateAssociation { key, .. }
            | GridDialectOperation::RemoveAssociation { key } => Some(key),
            _ => None,
        }
    }
}

impl fmt::Display for GridDialectOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GridDialectOperation::InsertTuple { metadata, .. } => {
                write!(f, "InsertTuple({})", metadata.table())
            }
            GridDialectOperation::NextValueRequest { key, .. } => {
                write!(f, "NextValueRequest({})", key)
            }
            GridDialectOperation::ExecuteBatch { operations } => {
                write!(f, "ExecuteBatch({} operations)", operations.len())
            }
            op => match (op.entity_key(), op.association_key()) {
                (Some(key), _) => write!(f, "{}({})", op.kind(), key),
                (_, Some(key)) => write!(f, "{}({})", op.kind(), key),
                (None, None) => write!(f, "{}", op.kind()),
            },
        }
    }
}
