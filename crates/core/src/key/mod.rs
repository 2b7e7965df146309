//! Structural identifiers
//!
//! Keys identify stored records without carrying any backend detail:
//! - [`EntityKey`]: one entity record (table + column values)
//! - [`AssociationKey`]: one association instance, e.g. a collection owned by an entity
//! - [`RowKey`]: one entry within an association
//! - [`IdSourceKey`]: one table- or sequence-based identifier generator
//!
//! Every key pairs immutable, shareable metadata (the *shape*) with the values
//! of one concrete instance. Equality and hashing are structural over the table
//! and the positional column values; the column order is fixed once, when the
//! metadata is built, and callers must reuse that order consistently.

mod association;
mod entity;
mod id_source;
mod row;

pub use association::{
    AssociatedEntityKeyMetadata, AssociationKey, AssociationKeyMetadata,
    AssociationKeyMetadataBuilder, AssociationKind,
};
pub use entity::{EntityKey, EntityKeyMetadata};
pub use id_source::{IdSourceKey, IdSourceKeyMetadata, IdSourceType};
pub use row::RowKey;

use crate::error::{Error, Result};
use crate::value::Value;
use std::fmt;

/// Reject keys whose value array does not line up with the column names.
pub(crate) fn check_shape(table: &str, columns: usize, values: usize) -> Result<()> {
    if columns != values {
        return Err(Error::KeyShape {
            table: table.to_string(),
            columns,
            values,
        });
    }
    Ok(())
}

/// Render `name=value` pairs for key `Display` implementations.
pub(crate) fn fmt_columns(
    f: &mut fmt::Formatter<'_>,
    names: &[String],
    values: &[Value],
) -> fmt::Result {
    for (i, (name, value)) in names.iter().zip(values).enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}={}", name, value)?;
    }
    Ok(())
}

pub(crate) fn to_names<I, S>(names: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    names.into_iter().map(Into::into).collect()
}
