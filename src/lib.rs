//! Tessera - backend-agnostic identity and change model for NoSQL grid dialects
//!
//! Tessera lets a mapping layer describe records and relationships as tables
//! and columns while the data lives in a NoSQL store. It provides:
//!
//! - Structural keys for entities, associations, association rows and
//!   identifier generators
//! - Tuples and associations tracking pending changes against a snapshot
//! - Storage strategy resolution and null-embeddable detection for document stores
//! - Units of work executing grid dialect operations with compensating error handling
//!
//! # Quick Start
//!
//! ```ignore
//! use tessera::{GridDialectOperation, InMemoryDocumentDialect, Tuple, UnitOfWorkCoordinator};
//!
//! let dialect = InMemoryDocumentDialect::new();
//! let coordinator = UnitOfWorkCoordinator::default();
//!
//! let mut tuple = Tuple::new();
//! tuple.put("address.city", "Lyon".into());
//!
//! let mut uow = coordinator.begin();
//! uow.add(GridDialectOperation::update_tuple(key, tuple))?;
//! coordinator.flush(&mut uow, &dialect)?;
//! coordinator.complete(&mut uow)?;
//! ```
//!
//! # Architecture
//!
//! - `tessera-core`: values, keys, tuples, associations, structural errors
//! - `tessera-document`: helpers shared by document-store dialects
//! - `tessera-concurrency`: operations, queues, units of work, error handlers
//! - `tessera-engine`: configuration, coordinator, in-memory document dialect

pub use tessera_concurrency::*;
pub use tessera_core::*;
pub use tessera_document::*;
pub use tessera_engine::*;
