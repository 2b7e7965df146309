//! Engine for Tessera
//!
//! This crate wires the lower layers together:
//! - Config: `tessera.toml` with storage defaults and the error handling mode
//! - UnitOfWorkCoordinator: id allocation, shared error handler, metrics
//! - InMemoryDocumentDialect: reference document store
//! - Logging: subscriber setup for binaries and tests

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod coordinator;
pub mod logging;
pub mod memory;

pub use config::{ErrorHandlingMode, TesseraConfig, CONFIG_FILE_NAME};
pub use coordinator::{UnitOfWorkCoordinator, UnitOfWorkMetrics};
pub use memory::{DialectError, DialectResult, InMemoryDocumentDialect};
