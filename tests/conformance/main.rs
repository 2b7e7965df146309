//! Conformance suite for the public `tessera` API
//!
//! Each module checks one group of observable guarantees through the facade
//! crate, the way a mapping engine or backend adapter would use it.

mod common;

mod compensation;
mod embeddables;
mod keys;
mod queue;
mod storage;
mod tuples;
