//! `IndexCursor<E>`: the chainable range-query builder returned by
//! [`crate::table::Table::query`].
//!
//! Mirrors the spec's cursor shape directly: `key(v)` is an equality match;
//! `greater_than`/`less_than` each narrow one side of a range and may be
//! chained together, in which case they intersect (both bounds must hold).
//! Nothing touches storage until a terminal operation (`count`, `to_list`)
//! runs.

use std::ops::Bound;

use config::IndexValue;

use crate::error::EngineError;
use crate::table::Table;

/// A pending range query against one secondary index, built up by chaining
/// `greater_than`/`less_than` (or pinned to a single value with `key`)
/// before running a terminal operation.
pub struct IndexCursor<'a, E> {
    table: &'a Table<E>,
    index: String,
    eq: Option<IndexValue>,
    lower: Bound<IndexValue>,
    upper: Bound<IndexValue>,
}

impl<'a, E> IndexCursor<'a, E> {
    pub(crate) fn new(table: &'a Table<E>, index: impl Into<String>) -> Self {
        Self {
            table,
            index: index.into(),
            eq: None,
            lower: Bound::Unbounded,
            upper: Bound::Unbounded,
        }
    }

    /// Restricts the cursor to rows whose indexed value exactly equals
    /// `value`. Overrides any `greater_than`/`less_than` already chained,
    /// and is the only way to match `IndexValue::Null`.
    #[must_use]
    pub fn key(mut self, value: IndexValue) -> Self {
        self.eq = Some(value);
        self
    }

    /// Narrows the lower bound to values strictly greater than `value`
    /// (`inclusive = true` admits equality too). Chaining a second call
    /// replaces the previous lower bound.
    #[must_use]
    pub fn greater_than(mut self, value: IndexValue, inclusive: bool) -> Self {
        self.lower = if inclusive { Bound::Included(value) } else { Bound::Excluded(value) };
        self
    }

    /// Narrows the upper bound to values strictly less than `value`
    /// (`inclusive = true` admits equality too). Chaining a second call
    /// replaces the previous upper bound.
    #[must_use]
    pub fn less_than(mut self, value: IndexValue, inclusive: bool) -> Self {
        self.upper = if inclusive { Bound::Included(value) } else { Bound::Excluded(value) };
        self
    }

    fn matching_keys(&self) -> Result<Vec<config::PrimaryKey>, EngineError> {
        let session = self.table.storage().read_session();
        if let Some(value) = &self.eq {
            Ok(session.index_lookup(&self.index, value)?)
        } else {
            Ok(session.index_cursor(&self.index, self.lower.as_ref(), self.upper.as_ref())?)
        }
    }

    /// Runs the query, returning how many rows match without decoding them.
    pub fn count(&self) -> Result<usize, EngineError> {
        Ok(self.matching_keys()?.len())
    }

    /// Runs the query, decoding and returning every matching row in
    /// ascending indexed-value order (ties broken by primary key).
    pub fn to_list(&self) -> Result<Vec<E>, EngineError> {
        let keys = self.matching_keys()?;
        let session = self.table.storage().read_session();
        keys.iter()
            .map(|key| {
                let bytes = session
                    .get(key)?
                    .ok_or_else(|| EngineError::Corruption(format!("index {:?} points at missing row", self.index)))?;
                let mut cursor = &bytes[..];
                self.table.schema().decode(&mut cursor).map_err(EngineError::from)
            })
            .collect()
    }

    /// Runs the query like [`to_list`](Self::to_list), but decodes rows one
    /// at a time as the returned iterator is driven instead of collecting
    /// them all up front. The read lock is held for the iterator's lifetime.
    pub fn to_lazy_list(&self) -> Result<impl Iterator<Item = Result<E, EngineError>> + 'a, EngineError>
    where
        E: 'a,
    {
        let keys = self.matching_keys()?;
        let table = self.table;
        let session = table.storage().read_session();
        let index = self.index.clone();
        Ok(keys.into_iter().map(move |key| {
            let bytes = session
                .get(&key)?
                .ok_or_else(|| EngineError::Corruption(format!("index {index:?} points at missing row")))?;
            let mut cursor = &bytes[..];
            table.schema().decode(&mut cursor).map_err(EngineError::from)
        }))
    }
}
