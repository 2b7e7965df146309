//! Unit of work
//!
//! A [`UnitOfWork`] owns the operations queue of one flush scope and records
//! which operations reached the backend. It drives the compensation protocol:
//!
//! ```text
//! Executing ──failure──► HandlingFailure ──Abort────► Aborted
//!     ▲                        │
//!     └────────Continue────────┘
//!
//! Executing | Aborted ──rollback──► RollingBack ──► RolledBack
//! Executing ──complete──► Completed
//! ```
//!
//! A unit of work may be flushed several times while `Executing`; applied
//! operations accumulate across flushes so that a rollback sees all of them.
//! A unit of work is used by one thread at a time; only its error handler is
//! shared.

use crate::compensation::{
    ErrorHandler, ErrorHandlingStrategy, FailedOperationContext, RollbackContext,
};
use crate::dialect::{BatchFailure, BatchingGridDialect, GridDialect, OperationResult};
use crate::operation::GridDialectOperation;
use crate::queue::OperationsQueue;
use std::fmt;
use std::sync::Arc;
use tessera_core::{Error, Result};
use tracing::{debug, info, warn};

/// Lifecycle state of a unit of work
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnitOfWorkStatus {
    /// Accepting and applying operations
    Executing,
    /// The error handler is deciding about a failed operation
    HandlingFailure,
    /// A failure aborted the unit of work
    Aborted,
    /// The error handler is being notified of a rollback
    RollingBack,
    /// Rolled back
    RolledBack,
    /// Finished successfully
    Completed,
}

/// Failure of a flush
#[derive(Debug, thiserror::Error)]
pub enum ExecutionError<E: std::error::Error + 'static> {
    /// The unit of work cannot execute in its current state
    #[error(transparent)]
    Core(#[from] Error),
    /// The backend failed and the error handler chose to abort
    #[error(transparent)]
    Dialect(E),
}

impl<E: std::error::Error + 'static> ExecutionError<E> {
    /// Backend error, if the flush was aborted by one
    pub fn dialect_error(&self) -> Option<&E> {
        match self {
            ExecutionError::Dialect(e) => Some(e),
            ExecutionError::Core(_) => None,
        }
    }

    /// Take the backend error, if the flush was aborted by one
    pub fn into_dialect_error(self) -> Option<E> {
        match self {
            ExecutionError::Dialect(e) => Some(e),
            ExecutionError::Core(_) => None,
        }
    }
}

/// Summary of one flush
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExecutionReport {
    /// Operations handed to the backend
    pub attempted: usize,
    /// Operations the backend applied
    pub applied: usize,
    /// Failures the error handler chose to ignore
    pub ignored_failures: usize,
    /// Outcome of each applied operation, in order
    pub results: Vec<OperationResult>,
}

/// Scope in which operations are queued, applied and compensated
pub struct UnitOfWork {
    id: u64,
    status: UnitOfWorkStatus,
    queue: OperationsQueue,
    applied: Vec<GridDialectOperation>,
    handler: Arc<dyn ErrorHandler>,
}

impl fmt::Debug for UnitOfWork {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UnitOfWork")
            .field("id", &self.id)
            .field("status", &self.status)
            .field("queued", &self.queue.len())
            .field("applied", &self.applied.len())
            .finish()
    }
}

impl UnitOfWork {
    /// Create a unit of work reporting failures to `handler`
    pub fn new(id: u64, handler: Arc<dyn ErrorHandler>) -> Self {
        Self {
            id,
            status: UnitOfWorkStatus::Executing,
            queue: OperationsQueue::new(),
            applied: Vec::new(),
            handler,
        }
    }

    /// Unit of work id
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Current state
    pub fn status(&self) -> UnitOfWorkStatus {
        self.status
    }

    /// Operations applied so far, in submission order
    pub fn applied_operations(&self) -> &[GridDialectOperation] {
        &self.applied
    }

    /// Pending operations
    pub fn queue(&self) -> &OperationsQueue {
        &self.queue
    }

    /// Check the unit of work can accept and apply operations
    ///
    /// # Errors
    /// Returns `Error::InvalidState` unless `Executing`.
    pub fn ensure_executing(&self) -> Result<()> {
        if self.status == UnitOfWorkStatus::Executing {
            Ok(())
        } else {
            Err(Error::invalid_state(format!(
                "Unit of work {} is not executing: {:?}",
                self.id, self.status
            )))
        }
    }

    /// Queue an operation for the next flush
    ///
    /// # Errors
    /// Returns `Error::InvalidState` unless `Executing`.
    pub fn add(&mut self, operation: GridDialectOperation) -> Result<()> {
        self.ensure_executing()?;
        self.queue.add(operation)
    }

    /// Apply every queued operation, one at a time
    pub fn flush<D: GridDialect>(
        &mut self,
        dialect: &D,
    ) -> std::result::Result<ExecutionReport, ExecutionError<D::Error>> {
        let queue = std::mem::take(&mut self.queue);
        self.execute(queue, dialect)
    }

    /// Apply the operations of `queue`, one at a time, in submission order.
    ///
    /// The queue is closed first. On abort the remaining operations are
    /// dropped without being attempted.
    pub fn execute<D: GridDialect>(
        &mut self,
        mut queue: OperationsQueue,
        dialect: &D,
    ) -> std::result::Result<ExecutionReport, ExecutionError<D::Error>> {
        self.ensure_executing()?;
        queue.close();
        debug!(
            target: "tessera::uow",
            uow = self.id,
            operations = queue.len(),
            "Executing operations"
        );

        let mut report = ExecutionReport::default();
        while let Some(operation) = queue.poll() {
            let outcome = dialect.apply(&operation);
            self.settle(operation, outcome, &mut report)?;
        }
        Ok(report)
    }

    /// Apply every queued operation in batch calls.
    ///
    /// A batch that succeeds is recorded as a single `ExecuteBatch`
    /// operation. When a batch fails partway, the operations before the
    /// failure are recorded as one applied `ExecuteBatch` and the failing
    /// operation alone goes to the error handler. On `Continue` the
    /// operations after it are sent as a new batch.
    pub fn flush_batched<D: BatchingGridDialect>(
        &mut self,
        dialect: &D,
    ) -> std::result::Result<ExecutionReport, ExecutionError<D::Error>> {
        self.ensure_executing()?;
        let mut queue = std::mem::take(&mut self.queue);
        queue.close();
        let mut pending = queue.drain();

        let mut report = ExecutionReport::default();
        while !pending.is_empty() {
            debug!(
                target: "tessera::uow",
                uow = self.id,
                operations = pending.len(),
                "Executing batch"
            );
            let BatchFailure { mut applied, error } = match dialect.execute_batch(&pending) {
                Ok(results) => {
                    let batch = GridDialectOperation::ExecuteBatch { operations: pending };
                    let outcome = Ok::<_, D::Error>(OperationResult::Batch(results));
                    self.settle(batch, outcome, &mut report)?;
                    break;
                }
                Err(failure) => failure,
            };

            // The failing operation is never part of the applied prefix
            let done = applied.len().min(pending.len() - 1);
            applied.truncate(done);
            let mut rest = pending.split_off(done);
            if !pending.is_empty() {
                let prefix = GridDialectOperation::ExecuteBatch { operations: pending };
                let outcome = Ok::<_, D::Error>(OperationResult::Batch(applied));
                self.settle(prefix, outcome, &mut report)?;
            }
            let failed = rest.remove(0);
            self.settle(failed, Err(error), &mut report)?;
            pending = rest;
        }
        Ok(report)
    }

    fn settle<E: std::error::Error + Send + Sync + 'static>(
        &mut self,
        operation: GridDialectOperation,
        outcome: std::result::Result<OperationResult, E>,
        report: &mut ExecutionReport,
    ) -> std::result::Result<(), ExecutionError<E>> {
        report.attempted += 1;
        let error = match outcome {
            Ok(result) => {
                report.applied += 1;
                report.results.push(result);
                self.applied.push(operation);
                return Ok(());
            }
            Err(error) => error,
        };

        self.status = UnitOfWorkStatus::HandlingFailure;
        let context = FailedOperationContext::new(self.id, &operation, &self.applied, &error);
        match self.handler.on_failed_operation(&context) {
            ErrorHandlingStrategy::Abort => {
                self.status = UnitOfWorkStatus::Aborted;
                info!(
                    target: "tessera::uow",
                    uow = self.id,
                    operation = %operation.kind(),
                    applied = self.applied.len(),
                    error = %error,
                    "Unit of work aborted"
                );
                Err(ExecutionError::Dialect(error))
            }
            ErrorHandlingStrategy::Continue => {
                self.status = UnitOfWorkStatus::Executing;
                report.ignored_failures += 1;
                warn!(
                    target: "tessera::uow",
                    uow = self.id,
                    operation = %operation.kind(),
                    error = %error,
                    "Ignoring failed operation"
                );
                Ok(())
            }
        }
    }

    /// Finish successfully; pending operations are discarded
    ///
    /// # Errors
    /// Returns `Error::InvalidState` unless `Executing`.
    pub fn complete(&mut self) -> Result<()> {
        self.ensure_executing()?;
        self.status = UnitOfWorkStatus::Completed;
        self.queue = OperationsQueue::new();
        debug!(
            target: "tessera::uow",
            uow = self.id,
            applied = self.applied.len(),
            "Unit of work completed"
        );
        Ok(())
    }

    /// Roll back, notifying the error handler of every applied operation.
    ///
    /// A failing handler is logged; the rollback still completes.
    ///
    /// # Errors
    /// Returns `Error::InvalidState` unless `Executing` or `Aborted`.
    pub fn rollback(&mut self) -> Result<()> {
        match self.status {
            UnitOfWorkStatus::Executing | UnitOfWorkStatus::Aborted => {}
            status => {
                return Err(Error::invalid_state(format!(
                    "Cannot roll back unit of work {} from state {:?}",
                    self.id, status
                )))
            }
        }
        self.status = UnitOfWorkStatus::RollingBack;
        self.queue = OperationsQueue::new();

        let context = RollbackContext::new(self.id, &self.applied);
        if let Err(e) = self.handler.on_rollback(&context) {
            warn!(
                target: "tessera::uow",
                uow = self.id,
                error = %e,
                "Error handler failed during rollback"
            );
        }
        self.status = UnitOfWorkStatus::RolledBack;
        info!(
            target: "tessera::uow",
            uow = self.id,
            applied = self.applied.len(),
            "Unit of work rolled back"
        );
        Ok(())
    }
}
