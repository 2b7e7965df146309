use std::fmt;
use std::sync::Arc;

/// Kind of identifier generator backing an id source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IdSourceType {
    /// Table-based generator: one row per segment holding the next value
    Table,
    /// Native or emulated sequence
    Sequence,
}

/// Shape of an identifier generator
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IdSourceKeyMetadata {
    kind: IdSourceType,
    name: String,
    key_column: Option<String>,
    value_column: Option<String>,
}

impl IdSourceKeyMetadata {
    /// Metadata of a table-based generator stored in `table`
    pub fn for_table(
        table: impl Into<String>,
        key_column: impl Into<String>,
        value_column: impl Into<String>,
    ) -> Self {
        Self {
            kind: IdSourceType::Table,
            name: table.into(),
            key_column: Some(key_column.into()),
            value_column: Some(value_column.into()),
        }
    }

    /// Metadata of a sequence named `name`
    pub fn for_sequence(name: impl Into<String>) -> Self {
        Self {
            kind: IdSourceType::Sequence,
            name: name.into(),
            key_column: None,
            value_column: None,
        }
    }

    /// Generator kind
    pub fn kind(&self) -> IdSourceType {
        self.kind
    }

    /// Table or sequence name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Column holding the segment name (table generators only)
    pub fn key_column(&self) -> Option<&str> {
        self.key_column.as_deref()
    }

    /// Column holding the next value (table generators only)
    pub fn value_column(&self) -> Option<&str> {
        self.value_column.as_deref()
    }
}

/// Identifier of one generator instance: a sequence, or one segment of a table
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IdSourceKey {
    metadata: Arc<IdSourceKeyMetadata>,
    segment: Option<String>,
}

impl IdSourceKey {
    /// Key of segment `segment` of a table-based generator
    pub fn for_table(metadata: Arc<IdSourceKeyMetadata>, segment: impl Into<String>) -> Self {
        Self {
            metadata,
            segment: Some(segment.into()),
        }
    }

    /// Key of a sequence
    pub fn for_sequence(metadata: Arc<IdSourceKeyMetadata>) -> Self {
        Self {
            metadata,
            segment: None,
        }
    }

    /// Generator metadata
    pub fn metadata(&self) -> &IdSourceKeyMetadata {
        &self.metadata
    }

    /// Table or sequence name
    pub fn name(&self) -> &str {
        self.metadata.name()
    }

    /// Segment value (table generators only)
    pub fn segment(&self) -> Option<&str> {
        self.segment.as_deref()
    }
}

impl fmt::Display for IdSourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.segment {
            Some(segment) => write!(f, "IdSourceKey({}) [{}]", self.name(), segment),
            None => write!(f, "IdSourceKey({})", self.name()),
        }
    }
}
