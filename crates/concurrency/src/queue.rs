//! Operations queue
//!
//! FIFO buffer of the operations of one unit of work. The queue performs no
//! batching, coalescing or reordering: every operation added is polled exactly
//! once, in submission order. Once closed, adding fails; polling still drains
//! what was queued.

use crate::operation::GridDialectOperation;
use rustc_hash::FxHashMap;
use std::collections::VecDeque;
use tessera_core::{EntityKey, Error, Result};

/// Ordered buffer of pending operations
#[derive(Debug, Default)]
pub struct OperationsQueue {
    operations: VecDeque<GridDialectOperation>,
    // key of each queued UpdateTuple -> number of them still queued
    pending_updates: FxHashMap<EntityKey, usize>,
    closed: bool,
}

impl OperationsQueue {
    /// Create an empty, open queue
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an operation.
    ///
    /// # Errors
    /// Returns `Error::QueueClosed` once the queue was closed.
    pub fn add(&mut self, operation: GridDialectOperation) -> Result<()> {
        if self.closed {
            return Err(Error::QueueClosed);
        }
        if let GridDialectOperation::UpdateTuple { key, .. } = &operation {
            *self.pending_updates.entry(key.clone()).or_insert(0) += 1;
        }
        self.operations.push_back(operation);
        Ok(())
    }

    /// Remove and return the oldest operation
    pub fn poll(&mut self) -> Option<GridDialectOperation> {
        let operation = self.operations.pop_front()?;
        if let GridDialectOperation::UpdateTuple { key, .. } = &operation {
            if let Some(count) = self.pending_updates.get_mut(key) {
                *count -= 1;
                if *count == 0 {
                    self.pending_updates.remove(key);
                }
            }
        }
        Some(operation)
    }

    /// Whether an `UpdateTuple` of `key` is still queued
    pub fn contains(&self, key: &EntityKey) -> bool {
        self.pending_updates.contains_key(key)
    }

    /// Refuse further additions
    pub fn close(&mut self) {
        self.closed = true;
    }

    /// Whether the queue was closed
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Number of queued operations
    pub fn len(&self) -> usize {
        self.operations.len()
    }

    /// Whether nothing is queued
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Remove and return every queued operation, in submission order
    pub fn drain(&mut self) -> Vec<GridDialectOperation> {
        self.pending_updates.clear();
        self.operations.drain(..).collect()
    }
}
