//! Shared helpers for the conformance suite

#![allow(dead_code)]

use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;
use tessera::{
    EntityKey, EntityKeyMetadata, ErrorHandler, ErrorHandlingStrategy, FailedOperationContext,
    GridDialect, GridDialectOperation, HandlerError, OperationResult, RollbackContext, Value,
};

pub fn entity_meta(table: &str, columns: &[&str]) -> Arc<EntityKeyMetadata> {
    Arc::new(EntityKeyMetadata::new(table, columns.iter().copied()))
}

pub fn key(id: i64) -> EntityKey {
    EntityKey::new(entity_meta("Order", &["id"]), vec![Value::Int(id)]).unwrap()
}

pub fn op(id: i64) -> GridDialectOperation {
    GridDialectOperation::remove_tuple(key(id))
}

pub fn id_of(operation: &GridDialectOperation) -> i64 {
    operation
        .entity_key()
        .and_then(|k| k.column_values()[0].as_int())
        .unwrap_or(-1)
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("backend refused operation {0}")]
pub struct Refused(pub i64);

/// Backend refusing the operations whose id is in `failing`
pub struct ScriptedBackend {
    failing: HashSet<i64>,
    attempted: Mutex<Vec<i64>>,
}

impl ScriptedBackend {
    pub fn failing(ids: &[i64]) -> Self {
        Self {
            failing: ids.iter().copied().collect(),
            attempted: Mutex::new(Vec::new()),
        }
    }

    pub fn attempted(&self) -> Vec<i64> {
        self.attempted.lock().clone()
    }
}

impl GridDialect for ScriptedBackend {
    type Error = Refused;

    fn apply(&self, operation: &GridDialectOperation) -> Result<OperationResult, Refused> {
        let id = id_of(operation);
        self.attempted.lock().push(id);
        if self.failing.contains(&id) {
            Err(Refused(id))
        } else {
            Ok(OperationResult::Done)
        }
    }
}

/// Handler answering with a fixed strategy and recording what it sees
pub struct Recorder {
    strategy: ErrorHandlingStrategy,
    pub applied_at_failure: Mutex<Vec<Vec<i64>>>,
    pub rolled_back: Mutex<Vec<i64>>,
}

impl Recorder {
    pub fn new(strategy: ErrorHandlingStrategy) -> Arc<Self> {
        Arc::new(Self {
            strategy,
            applied_at_failure: Mutex::new(Vec::new()),
            rolled_back: Mutex::new(Vec::new()),
        })
    }
}

impl ErrorHandler for Recorder {
    fn on_failed_operation(&self, context: &FailedOperationContext<'_>) -> ErrorHandlingStrategy {
        self.applied_at_failure
            .lock()
            .push(context.applied_operations().iter().map(id_of).collect());
        self.strategy
    }

    fn on_rollback(&self, context: &RollbackContext<'_>) -> Result<(), HandlerError> {
        self.rolled_back
            .lock()
            .extend(context.applied_operations().iter().map(id_of));
        Ok(())
    }
}
