//! Backend adapter traits
//!
//! A [`GridDialect`] applies one operation at a time against a backend. A
//! [`BatchingGridDialect`] can additionally apply a group of operations in a
//! single call. Backend failures are reported with the dialect's own error
//! type; the unit of work hands them to the error handler and, on abort,
//! returns them to the caller as they are.

use crate::operation::GridDialectOperation;
use tessera_core::EntityKey;

/// Outcome of one applied operation
#[derive(Debug, Clone, PartialEq)]
pub enum OperationResult {
    /// Applied, nothing to report
    Done,
    /// Value produced by a `NextValueRequest`
    NextValue(i64),
    /// Key generated by an `InsertTuple`
    InsertedKey(EntityKey),
    /// Outcomes of the operations of an `ExecuteBatch`, in order
    Batch(Vec<OperationResult>),
}

/// Backend adapter applying operations one at a time
pub trait GridDialect {
    /// Backend failure
    type Error: std::error::Error + Send + Sync + 'static;

    /// Apply one operation
    fn apply(&self, operation: &GridDialectOperation) -> Result<OperationResult, Self::Error>;
}

/// Batch that failed partway through
#[derive(Debug)]
pub struct BatchFailure<E> {
    /// Results of the operations applied before the failure, in order
    pub applied: Vec<OperationResult>,
    /// Failure of the operation right after them
    pub error: E,
}

impl<E> BatchFailure<E> {
    /// Failure of operation `applied.len()` of the batch
    pub fn new(applied: Vec<OperationResult>, error: E) -> Self {
        Self { applied, error }
    }
}

/// Backend adapter able to apply a group of operations in one call
pub trait BatchingGridDialect: GridDialect {
    /// Apply `operations` in order, returning one result per operation.
    ///
    /// The first failure ends the call. The failure carries the results of
    /// the operations that reached the backend before it.
    fn execute_batch(
        &self,
        operations: &[GridDialectOperation],
    ) -> Result<Vec<OperationResult>, BatchFailure<Self::Error>>;
}
