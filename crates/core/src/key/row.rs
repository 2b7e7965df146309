use super::{check_shape, fmt_columns, to_names};
use crate::error::Result;
use crate::value::Value;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Identifier of one row within an association
///
/// A row key usually repeats the association key columns and adds the columns
/// of the referenced entity; for indexed and map-typed associations it also
/// holds the index or map-key column(s).
#[derive(Debug, Clone)]
pub struct RowKey {
    column_names: Arc<[String]>,
    column_values: Vec<Value>,
}

impl RowKey {
    /// Create a row key from column names and positional values.
    ///
    /// # Errors
    /// Returns `Error::KeyShape` if the lengths differ.
    pub fn new<I, S>(column_names: I, column_values: Vec<Value>) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let column_names: Arc<[String]> = to_names(column_names).into();
        Self::with_shared_names(column_names, column_values)
    }

    /// Create a row key reusing an already shared column name list.
    ///
    /// Association snapshots build many row keys with identical column names.
    pub fn with_shared_names(
        column_names: Arc<[String]>,
        column_values: Vec<Value>,
    ) -> Result<Self> {
        check_shape("<row key>", column_names.len(), column_values.len())?;
        Ok(Self {
            column_names,
            column_values,
        })
    }

    /// Column names
    pub fn column_names(&self) -> &[String] {
        &self.column_names
    }

    /// Column values, positionally aligned with [`Self::column_names`]
    pub fn column_values(&self) -> &[Value] {
        &self.column_values
    }

    /// Whether the row key holds the given column
    pub fn contains_column(&self, column: &str) -> bool {
        self.column_names.iter().any(|c| c == column)
    }

    /// Value of the given column, if present
    pub fn column_value(&self, column: &str) -> Option<&Value> {
        self.column_names
            .iter()
            .position(|c| c == column)
            .map(|i| &self.column_values[i])
    }
}

impl PartialEq for RowKey {
    fn eq(&self, other: &Self) -> bool {
        self.column_names == other.column_names && self.column_values == other.column_values
    }
}

impl Eq for RowKey {}

impl Hash for RowKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.column_values.hash(state);
    }
}

impl fmt::Display for RowKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RowKey [")?;
        fmt_columns(f, &self.column_names, &self.column_values)?;
        write!(f, "]")
    }
}
