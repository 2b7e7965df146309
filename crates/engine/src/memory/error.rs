//! Errors raised by the in-memory document store

use tessera_core::{AssociationKey, EntityKey, IdSourceKey};
use thiserror::Error;

/// Failure of one operation against the in-memory store
#[derive(Debug, Error)]
pub enum DialectError {
    /// A record already exists at the generated key
    #[error("Duplicate entity: {0}")]
    DuplicateEntity(EntityKey),

    /// Rows are already stored for an association being inserted
    #[error("Duplicate association: {0}")]
    DuplicateAssociation(AssociationKey),

    /// A locked write targeted a record that does not exist
    #[error("Entity not found: {0}")]
    NotFound(EntityKey),

    /// The stored record no longer holds the expected column values
    #[error("Optimistic lock conflict on {0}")]
    OptimisticLockConflict(EntityKey),

    /// Store-generated keys need exactly one key column
    #[error("Table '{table}' cannot use a generated key: it has {columns} key column(s)")]
    UnsupportedIdentity {
        /// Table of the insert
        table: String,
        /// Key column count
        columns: usize,
    },

    /// The generator cannot advance without overflowing
    #[error("Identifier generator {0} overflowed")]
    SequenceOverflow(IdSourceKey),

    /// Stored data could not be turned back into keys
    #[error(transparent)]
    Core(#[from] tessera_core::Error),
}

/// Result type for the in-memory store
pub type DialectResult<T> = std::result::Result<T, DialectError>;
