//! Null embeddable detection
//!
//! Document stores flatten embeddables into dotted column paths
//! (`address.city`, `address.geo.lat`). When every column of an embeddable
//! is null, the whole sub-document should be removed instead of leaving an
//! object full of nulls behind.
//!
//! A prefix `p` of a column is a *null embeddable* iff at least one known
//! column starts with `p.` and all such columns resolve to null (or are
//! absent) in the tuple. [`EmbeddableStateFinder`] computes the state of every
//! prefix once, up front, so each lookup is a walk over the prefixes of one
//! column.

use rustc_hash::FxHashMap;
use tessera_core::Tuple;

/// Finds the outermost null embeddable containing a column
#[derive(Debug, Clone, Default)]
pub struct EmbeddableStateFinder {
    // embeddable prefix -> every column under it is null
    null_prefixes: FxHashMap<String, bool>,
}

impl EmbeddableStateFinder {
    /// Analyse every column the tuple knows about, removed ones included
    pub fn new(tuple: &Tuple) -> Self {
        Self::with_columns(tuple, tuple.known_columns())
    }

    /// Analyse the given columns, resolving their values against `tuple`.
    ///
    /// Use this when the full set of mapped columns is known, so that columns
    /// never loaded into the tuple still count as null.
    pub fn with_columns<'a, I>(tuple: &Tuple, columns: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut null_prefixes: FxHashMap<String, bool> = FxHashMap::default();
        for column in columns {
            let is_null = tuple.get(column).map_or(true, |v| v.is_null());
            for prefix in prefixes(column) {
                null_prefixes
                    .entry(prefix.to_string())
                    .and_modify(|all_null| *all_null &= is_null)
                    .or_insert(is_null);
            }
        }
        Self { null_prefixes }
    }

    /// Shortest prefix of `column` that is a null embeddable, if any.
    ///
    /// Prefixes are tried root-first; the column itself is never returned.
    pub fn outer_most_null_embeddable_if_any<'c>(&self, column: &'c str) -> Option<&'c str> {
        prefixes(column).find(|p| self.null_prefixes.get(*p).copied().unwrap_or(false))
    }

    /// Whether `prefix` names an embeddable whose columns are all null
    pub fn is_null_embeddable(&self, prefix: &str) -> bool {
        self.null_prefixes.get(prefix).copied().unwrap_or(false)
    }
}

/// Proper dotted prefixes of `column`, root-first: `a.b.c` yields `a`, `a.b`
fn prefixes(column: &str) -> impl Iterator<Item = &str> {
    column
        .match_indices('.')
        .map(move |(i, _)| &column[..i])
        .filter(|p| !p.is_empty())
}
