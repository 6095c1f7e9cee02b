//! Secondary indexes: ordered, non-unique maps from an indexed column's value
//! to the set of primary keys of rows holding that value.

use std::collections::{BTreeMap, BTreeSet};
use std::ops::Bound;

use crate::primary::PrimaryKey;

/// A secondary index value. `Null` sorts before every other variant so rows
/// with an absent/optional value consistently group at the start of a range
/// scan.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum IndexValue {
    Null,
    Bool(bool),
    I32(i32),
    I64(i64),
    Str(String),
}

/// How two `IndexValue::Str` values compare. There is no portable
/// culture-aware collation available without an external ICU dependency, so
/// this models the two collations the engine actually supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Comparator {
    /// Byte-wise comparison (`Ord` on `&str`). The default.
    #[default]
    Ordinal,
    /// Case-insensitive comparison: both sides are lowercased before
    /// ordering, so `"Smith"` and `"smith"` occupy the same ordinal slot.
    OrdinalIgnoreCase,
}

impl Comparator {
    /// Normalizes `value` for storage under this comparator. Only
    /// `IndexValue::Str` is affected; every other variant is returned
    /// unchanged.
    #[must_use]
    pub fn normalize(self, value: IndexValue) -> IndexValue {
        match (self, value) {
            (Comparator::OrdinalIgnoreCase, IndexValue::Str(s)) => IndexValue::Str(s.to_lowercase()),
            (_, v) => v,
        }
    }
}

/// Extracts the bounding value out of a `Bound`, if any (`Unbounded` has
/// none).
fn bound_value(bound: &Bound<IndexValue>) -> Option<&IndexValue> {
    match bound {
        Bound::Included(v) | Bound::Excluded(v) => Some(v),
        Bound::Unbounded => None,
    }
}

/// An ordered, non-unique index from a column value to the primary keys of
/// every row currently holding that value.
///
/// Primary keys under one value are kept in a `BTreeSet` so re-indexing a row
/// (delete then insert under a new value) is idempotent and duplicate-free.
#[derive(Debug, Clone)]
pub struct SecondaryIndex {
    comparator: Comparator,
    map: BTreeMap<IndexValue, BTreeSet<PrimaryKey>>,
}

impl SecondaryIndex {
    #[must_use]
    pub fn new(comparator: Comparator) -> Self {
        Self {
            comparator,
            map: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn comparator(&self) -> Comparator {
        self.comparator
    }

    /// Records that `pk` now holds `value` for this index.
    pub fn insert(&mut self, value: IndexValue, pk: PrimaryKey) {
        let value = self.comparator.normalize(value);
        self.map.entry(value).or_default().insert(pk);
    }

    /// Removes the association between `value` and `pk`. Drops the value's
    /// bucket entirely once it holds no more keys, so an exhausted index
    /// value does not linger in range scans.
    pub fn remove(&mut self, value: &IndexValue, pk: &PrimaryKey) {
        let normalized = self.comparator.normalize(value.clone());
        if let Some(set) = self.map.get_mut(&normalized) {
            set.remove(pk);
            if set.is_empty() {
                self.map.remove(&normalized);
            }
        }
    }

    /// Returns the primary keys exactly matching `value`, in ascending
    /// primary-key order.
    #[must_use]
    pub fn lookup(&self, value: &IndexValue) -> Vec<PrimaryKey> {
        let normalized = self.comparator.normalize(value.clone());
        self.map
            .get(&normalized)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Returns the primary keys for every value in `[lower, upper]`
    /// (inclusive), in ascending `(value, primary key)` order.
    #[must_use]
    pub fn range(&self, lower: &IndexValue, upper: &IndexValue) -> Vec<PrimaryKey> {
        self.range_bounded(Bound::Included(lower), Bound::Included(upper))
    }

    /// Returns the primary keys for every value in the arbitrary bound pair
    /// `(lower, upper)`, each independently inclusive, exclusive, or
    /// unbounded, in ascending `(value, primary key)` order.
    ///
    /// This is what backs a chained `greater_than(..)`/`less_than(..)`
    /// cursor: each side of the chain contributes one bound, and the two
    /// intersect naturally because both are satisfied by the same
    /// underlying `BTreeMap::range` scan.
    #[must_use]
    pub fn range_bounded(&self, lower: Bound<&IndexValue>, upper: Bound<&IndexValue>) -> Vec<PrimaryKey> {
        let lower = self.normalize_bound(lower);
        // `Null` sorts as the lowest element but is only ever matched by an
        // exact `key(null)` lookup (spec §4.3): an unbounded-from-below
        // range scan must not silently pick up null rows.
        let lower = match lower {
            Bound::Unbounded => Bound::Excluded(IndexValue::Null),
            other => other,
        };
        let upper = self.normalize_bound(upper);

        // `BTreeMap::range` panics when `start > end`, and when `start ==
        // end` with both bounds `Excluded`. A chained greater_than/less_than
        // cursor can legitimately describe such an empty intersection (a
        // reversed range, or an exact point excluded on both sides); that
        // must yield no rows, not a panic (spec §4.3).
        if let (Some(l), Some(u)) = (bound_value(&lower), bound_value(&upper)) {
            let empty = match l.cmp(u) {
                std::cmp::Ordering::Greater => true,
                std::cmp::Ordering::Equal => {
                    !matches!(lower, Bound::Included(_)) || !matches!(upper, Bound::Included(_))
                }
                std::cmp::Ordering::Less => false,
            };
            if empty {
                return Vec::new();
            }
        }

        self.map
            .range((lower, upper))
            .flat_map(|(_, set)| set.iter().cloned())
            .collect()
    }

    fn normalize_bound(&self, bound: Bound<&IndexValue>) -> Bound<IndexValue> {
        match bound {
            Bound::Included(v) => Bound::Included(self.comparator.normalize(v.clone())),
            Bound::Excluded(v) => Bound::Excluded(self.comparator.normalize(v.clone())),
            Bound::Unbounded => Bound::Unbounded,
        }
    }

    /// Iterates every `(value, primary key)` pair currently held, in
    /// ascending `(value, primary key)` order. Used when persisting the
    /// index to the index stream.
    pub fn lookup_all_pairs(&self) -> impl Iterator<Item = (IndexValue, PrimaryKey)> + '_ {
        self.map
            .iter()
            .flat_map(|(value, set)| set.iter().map(move |pk| (value.clone(), pk.clone())))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.map.values().map(BTreeSet::len).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn clear(&mut self) {
        self.map.clear();
    }
}
