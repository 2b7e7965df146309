//! Document-store support for Tessera
//!
//! Shared by every dialect storing records as nested documents:
//! - EmbeddableStateFinder: outermost wholly-null embeddable of a column
//! - Storage options: association and map storage resolution
//! - Layout: dotted paths, tuple change sets and association rows as JSON

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod embeddable;
pub mod layout;
pub mod options;

pub use embeddable::EmbeddableStateFinder;
pub use layout::Document;
pub use options::{
    resolve, resolve_association_storage, resolve_map_storage, AssociationStorageType,
    MapStorageType, StorageOptions, StorageSettings,
};
