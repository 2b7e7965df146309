//! Operations queue ordering

use crate::common::*;
use tessera::{Error, OperationsQueue};

#[test]
fn test_fifo_order() {
    let mut queue = OperationsQueue::new();
    for id in [1, 2, 3] {
        queue.add(op(id)).unwrap();
    }
    assert!(queue.contains(&key(2)));

    let mut consumed = Vec::new();
    while let Some(operation) = queue.poll() {
        consumed.push(id_of(&operation));
    }
    assert_eq!(consumed, vec![1, 2, 3]);
    assert!(queue.poll().is_none());
}

#[test]
fn test_duplicates_are_kept() {
    let mut queue = OperationsQueue::new();
    queue.add(op(1)).unwrap();
    queue.add(op(1)).unwrap();
    assert_eq!(queue.len(), 2);
}

#[test]
fn test_closed_queue_rejects_writes() {
    let mut queue = OperationsQueue::new();
    queue.add(op(1)).unwrap();
    queue.close();
    assert!(matches!(queue.add(op(2)), Err(Error::QueueClosed)));
    assert_eq!(queue.poll().map(|o| id_of(&o)), Some(1));
}
