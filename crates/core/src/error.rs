//! Error types for Tessera
//!
//! These errors cover the structural and configuration problems raised by the
//! identity and change model itself. Backend operation failures are NOT part of
//! this enum: they stay in the dialect's own error type so that the cause can
//! be surfaced to the caller unchanged.
//!
//! We use `thiserror` for automatic `Display` and `Error` trait implementations.

use std::io;
use thiserror::Error;

/// Result type alias for Tessera operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the identity and change model
#[derive(Debug, Error)]
pub enum Error {
    /// A key was built with a different number of column names and values
    #[error("Malformed key for table '{table}': {columns} column name(s) but {values} value(s)")]
    KeyShape {
        /// Table of the key
        table: String,
        /// Number of column names declared by the metadata
        columns: usize,
        /// Number of column values supplied
        values: usize,
    },

    /// A row key lacks columns required to derive the associated entity key
    #[error("Row key of table '{table}' lacks associated entity key column(s) {missing:?}")]
    MissingRowKeyColumns {
        /// Association table
        table: String,
        /// Columns required but absent from the row key
        missing: Vec<String>,
    },

    /// An operation was added to a queue that has already been closed
    #[error("Operations queue is closed")]
    QueueClosed,

    /// Invalid state transition
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// I/O error (configuration files)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl Error {
    /// Create an invalid-state error
    pub fn invalid_state(message: impl Into<String>) -> Self {
        Error::InvalidState(message.into())
    }

    /// Create an invalid-configuration error
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Error::InvalidConfig(message.into())
    }
}
