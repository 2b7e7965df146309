//! Unit of work coordinator
//!
//! The UnitOfWorkCoordinator hands out units of work sharing one error
//! handler and adds:
//! - Unit of work id allocation
//! - Active unit of work tracking
//! - Lifecycle metrics (started, completed, aborted, rolled back)

use crate::config::TesseraConfig;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tessera_concurrency::{
    BatchingGridDialect, DefaultErrorHandler, ErrorHandler, ExecutionError, ExecutionReport,
    GridDialect, UnitOfWork, UnitOfWorkStatus,
};
use tessera_core::Result;
use tracing::{debug, info};

/// Coordinator of units of work
///
/// # Memory Ordering
///
/// The metric counters use Relaxed ordering: they are observational only and
/// do not synchronize other memory. Id allocation also uses Relaxed since
/// `fetch_add` alone guarantees uniqueness.
pub struct UnitOfWorkCoordinator {
    /// Handler given to units of work started from now on
    handler: RwLock<Arc<dyn ErrorHandler>>,
    next_id: AtomicU64,
    active_count: AtomicU64,
    total_started: AtomicU64,
    total_completed: AtomicU64,
    total_aborted: AtomicU64,
    total_rolled_back: AtomicU64,
}

impl Default for UnitOfWorkCoordinator {
    fn default() -> Self {
        Self::new(Arc::new(DefaultErrorHandler))
    }
}

impl UnitOfWorkCoordinator {
    /// Create a coordinator sharing `handler` between all units of work
    pub fn new(handler: Arc<dyn ErrorHandler>) -> Self {
        Self {
            handler: RwLock::new(handler),
            next_id: AtomicU64::new(0),
            active_count: AtomicU64::new(0),
            total_started: AtomicU64::new(0),
            total_completed: AtomicU64::new(0),
            total_aborted: AtomicU64::new(0),
            total_rolled_back: AtomicU64::new(0),
        }
    }

    /// Create a coordinator using the handler selected in `config`
    ///
    /// # Errors
    /// Returns `Error::InvalidConfig` for an unknown error handling mode.
    pub fn from_config(config: &TesseraConfig) -> Result<Self> {
        Ok(Self::new(config.error_handler()?))
    }

    /// Replace the error handler; units of work already started keep theirs
    pub fn set_error_handler(&self, handler: Arc<dyn ErrorHandler>) {
        *self.handler.write() = handler;
    }

    /// Start a unit of work
    pub fn begin(&self) -> UnitOfWork {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        let handler = self.handler.read().clone();
        self.record_start();
        debug!(target: "tessera::uow", uow = id, "Unit of work started");
        UnitOfWork::new(id, handler)
    }

    /// Flush `uow` one operation at a time, recording an abort
    pub fn flush<D: GridDialect>(
        &self,
        uow: &mut UnitOfWork,
        dialect: &D,
    ) -> std::result::Result<ExecutionReport, ExecutionError<D::Error>> {
        let outcome = uow.flush(dialect);
        self.observe(&outcome);
        outcome
    }

    /// Flush `uow` as one batch, recording an abort
    pub fn flush_batched<D: BatchingGridDialect>(
        &self,
        uow: &mut UnitOfWork,
        dialect: &D,
    ) -> std::result::Result<ExecutionReport, ExecutionError<D::Error>> {
        let outcome = uow.flush_batched(dialect);
        self.observe(&outcome);
        outcome
    }

    /// Count an abort; the unit of work logs it
    fn observe<E: std::error::Error + 'static>(
        &self,
        outcome: &std::result::Result<ExecutionReport, ExecutionError<E>>,
    ) {
        if let Err(ExecutionError::Dialect(_)) = outcome {
            self.record_abort();
        }
    }

    /// Complete `uow`
    ///
    /// # Errors
    /// Returns `Error::InvalidState` unless `uow` is executing.
    pub fn complete(&self, uow: &mut UnitOfWork) -> Result<()> {
        uow.complete()?;
        self.record_complete();
        info!(
            target: "tessera::uow",
            uow = uow.id(),
            applied = uow.applied_operations().len(),
            "Unit of work completed"
        );
        Ok(())
    }

    /// Roll back `uow`, notifying the error handler
    ///
    /// An aborted unit of work was already counted as finished and is not
    /// counted again.
    ///
    /// # Errors
    /// Returns `Error::InvalidState` unless `uow` is executing or aborted.
    pub fn rollback(&self, uow: &mut UnitOfWork) -> Result<()> {
        let was_executing = uow.status() == UnitOfWorkStatus::Executing;
        uow.rollback()?;
        if was_executing {
            self.record_rollback();
        }
        Ok(())
    }

    /// Record unit of work start
    pub fn record_start(&self) {
        self.active_count.fetch_add(1, Ordering::Relaxed);
        self.total_started.fetch_add(1, Ordering::Relaxed);
    }

    /// Record successful completion
    pub fn record_complete(&self) {
        self.decrement_active();
        self.total_completed.fetch_add(1, Ordering::Relaxed);
    }

    /// Record an abort
    pub fn record_abort(&self) {
        self.decrement_active();
        self.total_aborted.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a rollback of an executing unit of work
    pub fn record_rollback(&self) {
        self.decrement_active();
        self.total_rolled_back.fetch_add(1, Ordering::Relaxed);
    }

    fn decrement_active(&self) {
        // Saturating, a stray record_* must not wrap around
        let _ = self
            .active_count
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |x| {
                Some(x.saturating_sub(1))
            });
    }

    /// Snapshot of the lifecycle metrics
    pub fn metrics(&self) -> UnitOfWorkMetrics {
        UnitOfWorkMetrics {
            active_count: self.active_count.load(Ordering::Relaxed),
            total_started: self.total_started.load(Ordering::Relaxed),
            total_completed: self.total_completed.load(Ordering::Relaxed),
            total_aborted: self.total_aborted.load(Ordering::Relaxed),
            total_rolled_back: self.total_rolled_back.load(Ordering::Relaxed),
        }
    }

    /// Units of work started and not yet finished
    pub fn active_count(&self) -> u64 {
        self.active_count.load(Ordering::Relaxed)
    }
}

/// Unit of work metrics
#[derive(Debug, Clone, PartialEq)]
pub struct UnitOfWorkMetrics {
    /// Units of work currently executing
    pub active_count: u64,
    /// Total started
    pub total_started: u64,
    /// Total completed successfully
    pub total_completed: u64,
    /// Total aborted by a failed operation
    pub total_aborted: u64,
    /// Total rolled back without a prior abort
    pub total_rolled_back: u64,
}

impl UnitOfWorkMetrics {
    /// Units of work that finished, whatever the outcome
    pub fn total_finished(&self) -> u64 {
        self.total_completed + self.total_aborted + self.total_rolled_back
    }

    /// Abort rate (aborted / started)
    pub fn abort_rate(&self) -> f64 {
        if self.total_started > 0 {
            self.total_aborted as f64 / self.total_started as f64
        } else {
            0.0
        }
    }
}
