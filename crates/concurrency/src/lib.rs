//! Unit-of-work execution for Tessera
//!
//! This crate turns flushed changes into backend writes and reacts to partial
//! failures:
//! - GridDialectOperation: one immutable write intent
//! - OperationsQueue: FIFO buffer of operations
//! - GridDialect / BatchingGridDialect: backend adapter traits
//! - Compensation: error handlers deciding between abort and continue
//! - UnitOfWork: executes queues and drives the compensation protocol

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod compensation;
pub mod dialect;
pub mod operation;
pub mod queue;
pub mod unit_of_work;

pub use compensation::{
    ContinueErrorHandler, DefaultErrorHandler, ErrorHandler, ErrorHandlingStrategy,
    FailedOperationContext, HandlerError, LoggingErrorHandler, RollbackContext,
};
pub use dialect::{BatchFailure, BatchingGridDialect, GridDialect, OperationResult};
pub use operation::{GridDialectOperation, GridDialectOperationType};
pub use queue::OperationsQueue;
pub use unit_of_work::{ExecutionError, ExecutionReport, UnitOfWork, UnitOfWorkStatus};
