//! Built-in error handlers

use super::{
    ErrorHandler, ErrorHandlingStrategy, FailedOperationContext, HandlerError, RollbackContext,
};
use tracing::{error, warn};

/// Handler used when none is configured: aborts on the first failure
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultErrorHandler;

impl ErrorHandler for DefaultErrorHandler {
    fn on_failed_operation(&self, _context: &FailedOperationContext<'_>) -> ErrorHandlingStrategy {
        ErrorHandlingStrategy::Abort
    }
}

/// Ignores every failure and carries on with the remaining operations
#[derive(Debug, Clone, Copy, Default)]
pub struct ContinueErrorHandler;

impl ErrorHandler for ContinueErrorHandler {
    fn on_failed_operation(&self, _context: &FailedOperationContext<'_>) -> ErrorHandlingStrategy {
        ErrorHandlingStrategy::Continue
    }
}

/// Logs failures and rollbacks with the applied operations, then aborts
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingErrorHandler;

impl ErrorHandler for LoggingErrorHandler {
    fn on_failed_operation(&self, context: &FailedOperationContext<'_>) -> ErrorHandlingStrategy {
        error!(
            target: "tessera::uow",
            uow = context.unit_of_work(),
            operation = %context.failed_operation(),
            applied = context.applied_operations().len(),
            error = %context.error(),
            "Operation failed"
        );
        for op in context.applied_operations() {
            warn!(
                target: "tessera::uow",
                uow = context.unit_of_work(),
                operation = %op,
                "Applied before failure"
            );
        }
        ErrorHandlingStrategy::Abort
    }

    fn on_rollback(&self, context: &RollbackContext<'_>) -> Result<(), HandlerError> {
        for op in context.applied_operations() {
            warn!(
                target: "tessera::uow",
                uow = context.unit_of_work(),
                operation = %op,
                "Applied before rollback"
            );
        }
        Ok(())
    }
}
