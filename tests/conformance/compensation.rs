//! Abort, continue and rollback behaviour of units of work

use crate::common::*;
use std::sync::Arc;
use tessera::{
    DefaultErrorHandler, ErrorHandlingStrategy, ExecutionError, UnitOfWork, UnitOfWorkStatus,
};

fn three_operations(handler: Arc<dyn tessera::ErrorHandler>) -> UnitOfWork {
    let mut uow = UnitOfWork::new(1, handler);
    for id in [1, 2, 3] {
        uow.add(op(id)).unwrap();
    }
    uow
}

#[test]
fn test_abort_propagates_the_backend_error_unchanged() {
    let backend = ScriptedBackend::failing(&[2]);
    let recorder = Recorder::new(ErrorHandlingStrategy::Abort);
    let mut uow = three_operations(recorder.clone());

    match uow.flush(&backend) {
        Err(ExecutionError::Dialect(e)) => assert_eq!(e, Refused(2)),
        other => panic!("expected the backend error, got {:?}", other),
    }
    assert_eq!(backend.attempted(), vec![1, 2]);
    assert_eq!(uow.applied_operations().len(), 1);
    assert_eq!(uow.status(), UnitOfWorkStatus::Aborted);
    assert_eq!(*recorder.applied_at_failure.lock(), vec![vec![1]]);
}

#[test]
fn test_default_handler_aborts() {
    let backend = ScriptedBackend::failing(&[2]);
    let mut uow = three_operations(Arc::new(DefaultErrorHandler));
    let err = uow.flush(&backend).unwrap_err();
    assert_eq!(err.into_dialect_error(), Some(Refused(2)));
    assert_eq!(backend.attempted(), vec![1, 2]);
}

#[test]
fn test_continue_attempts_and_records_the_rest() {
    let backend = ScriptedBackend::failing(&[2]);
    let recorder = Recorder::new(ErrorHandlingStrategy::Continue);
    let mut uow = three_operations(recorder.clone());

    let report = uow.flush(&backend).unwrap();
    assert_eq!(backend.attempted(), vec![1, 2, 3]);
    assert_eq!(report.applied, 2);
    assert_eq!(report.ignored_failures, 1);
    let applied: Vec<i64> = uow.applied_operations().iter().map(id_of).collect();
    assert_eq!(applied, vec![1, 3]);
    assert_eq!(uow.status(), UnitOfWorkStatus::Executing);
}

#[test]
fn test_rollback_receives_precisely_the_applied_operations() {
    let backend = ScriptedBackend::failing(&[2]);
    let recorder = Recorder::new(ErrorHandlingStrategy::Continue);
    let mut uow = three_operations(recorder.clone());
    uow.flush(&backend).unwrap();
    uow.add(op(4)).unwrap();
    uow.flush(&backend).unwrap();

    uow.rollback().unwrap();
    assert_eq!(*recorder.rolled_back.lock(), vec![1, 3, 4]);
    assert_eq!(uow.status(), UnitOfWorkStatus::RolledBack);
}

#[test]
fn test_rollback_after_abort() {
    let backend = ScriptedBackend::failing(&[3]);
    let recorder = Recorder::new(ErrorHandlingStrategy::Abort);
    let mut uow = three_operations(recorder.clone());
    assert!(uow.flush(&backend).is_err());

    uow.rollback().unwrap();
    assert_eq!(*recorder.rolled_back.lock(), vec![1, 2]);
}

#[test]
fn test_structural_errors_never_reach_the_handler() {
    let backend = ScriptedBackend::failing(&[]);
    let recorder = Recorder::new(ErrorHandlingStrategy::Continue);
    let mut uow = three_operations(recorder.clone());
    uow.complete().unwrap();

    assert!(matches!(uow.flush(&backend), Err(ExecutionError::Core(_))));
    assert!(backend.attempted().is_empty());
    assert!(recorder.applied_at_failure.lock().is_empty());
}
