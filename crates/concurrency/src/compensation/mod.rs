//! Compensation protocol
//!
//! Most NoSQL backends cannot apply the writes of a unit of work atomically.
//! When one operation fails after others were applied, an [`ErrorHandler`]
//! decides what happens next:
//!
//! - [`ErrorHandler::on_failed_operation`] receives the failed operation, the
//!   operations applied so far and the backend error, and returns
//!   [`ErrorHandlingStrategy::Abort`] (stop, surface the error) or
//!   [`ErrorHandlingStrategy::Continue`] (suppress the error, keep going).
//! - [`ErrorHandler::on_rollback`] receives every operation applied before the
//!   rollback, so that the application can compensate them.
//!
//! One handler is shared by all units of work and may be invoked from many
//! threads at once.

mod handlers;

pub use handlers::{ContinueErrorHandler, DefaultErrorHandler, LoggingErrorHandler};

use crate::operation::GridDialectOperation;
use std::error::Error as StdError;

/// What to do after an operation failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorHandlingStrategy {
    /// Stop the unit of work and return the error to the caller
    Abort,
    /// Suppress the error and apply the remaining operations
    Continue,
}

/// Boxed error returned by a failing handler
pub type HandlerError = Box<dyn StdError + Send + Sync>;

/// Details of a failed operation
#[derive(Debug, Clone, Copy)]
pub struct FailedOperationContext<'a> {
    unit_of_work: u64,
    failed: &'a GridDialectOperation,
    applied: &'a [GridDialectOperation],
    error: &'a (dyn StdError + Send + Sync + 'static),
}

impl<'a> FailedOperationContext<'a> {
    /// Build a context
    pub fn new(
        unit_of_work: u64,
        failed: &'a GridDialectOperation,
        applied: &'a [GridDialectOperation],
        error: &'a (dyn StdError + Send + Sync + 'static),
    ) -> Self {
        Self {
            unit_of_work,
            failed,
            applied,
            error,
        }
    }

    /// Id of the unit of work
    pub fn unit_of_work(&self) -> u64 {
        self.unit_of_work
    }

    /// Operation that failed
    pub fn failed_operation(&self) -> &'a GridDialectOperation {
        self.failed
    }

    /// Operations applied before the failure, in submission order
    pub fn applied_operations(&self) -> &'a [GridDialectOperation] {
        self.applied
    }

    /// Backend error
    pub fn error(&self) -> &'a (dyn StdError + Send + Sync + 'static) {
        self.error
    }
}

/// Details of a rollback
#[derive(Debug, Clone, Copy)]
pub struct RollbackContext<'a> {
    unit_of_work: u64,
    applied: &'a [GridDialectOperation],
}

impl<'a> RollbackContext<'a> {
    /// Build a context
    pub fn new(unit_of_work: u64, applied: &'a [GridDialectOperation]) -> Self {
        Self {
            unit_of_work,
            applied,
        }
    }

    /// Id of the unit of work
    pub fn unit_of_work(&self) -> u64 {
        self.unit_of_work
    }

    /// Operations applied before the rollback, in submission order
    pub fn applied_operations(&self) -> &'a [GridDialectOperation] {
        self.applied
    }
}

/// Reacts to partial failures of units of work
pub trait ErrorHandler: Send + Sync {
    /// Decide how to proceed after an operation failed
    fn on_failed_operation(&self, context: &FailedOperationContext<'_>) -> ErrorHandlingStrategy;

    /// Observe a rollback.
    ///
    /// Advisory only: an error returned here is logged and not compensated.
    fn on_rollback(&self, context: &RollbackContext<'_>) -> Result<(), HandlerError> {
        let _ = context;
        Ok(())
    }
}
