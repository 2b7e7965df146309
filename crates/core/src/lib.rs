//! Core types for Tessera
//!
//! This crate defines the backend-agnostic identity and change model:
//! - Value: tagged column value decoded once at the backend boundary
//! - Keys: EntityKey, AssociationKey, RowKey, IdSourceKey and their metadata
//! - Tuple: one record's columns with a snapshot and pending changes
//! - Association: one association's rows with a snapshot and pending changes
//! - Error: structural error type

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod association;
pub mod error;
pub mod key;
pub mod tuple;
pub mod value;

pub use association::{
    Association, AssociationOperation, AssociationOperationType, AssociationSnapshot,
};
pub use error::{Error, Result};
pub use key::{
    AssociatedEntityKeyMetadata, AssociationKey, AssociationKeyMetadata,
    AssociationKeyMetadataBuilder, AssociationKind, EntityKey, EntityKeyMetadata, IdSourceKey,
    IdSourceKeyMetadata, IdSourceType, RowKey,
};
pub use tuple::{SnapshotType, Tuple, TupleOperation, TupleOperationType, TupleSnapshot};
pub use value::{Value, ValueKind};
