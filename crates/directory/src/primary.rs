//! The primary key directory: one entry per live row, keyed by the table's
//! declared primary key type and pointing at the row's byte range in the
//! data stream.

use std::collections::BTreeMap;

use alloc::Slot;

/// A primary key value. Closed over the scalar shapes the spec allows as
/// primary keys, rather than a fully generic `Any`-typed key, so ordering
/// and (de)serialization stay simple and exhaustive.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PrimaryKey {
    I32(i32),
    I64(i64),
    Str(String),
    Bytes(Vec<u8>),
}

/// Where a row's current bytes live in the data stream, plus the fingerprint
/// of those bytes (used by `save` to short-circuit a no-op write).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordLocation {
    pub slot: Slot,
    pub fingerprint: u32,
}

impl RecordLocation {
    #[must_use]
    pub fn new(slot: Slot, fingerprint: u32) -> Self {
        Self { slot, fingerprint }
    }
}

/// The ordered map from primary key to record location.
///
/// Backed by a `BTreeMap` so that `load_all` and range scans over the
/// primary key can be served directly from the in-memory directory, with no
/// separate sort step.
#[derive(Debug, Default, Clone)]
pub struct PrimaryDirectory {
    map: BTreeMap<PrimaryKey, RecordLocation>,
}

impl PrimaryDirectory {
    #[must_use]
    pub fn new() -> Self {
        Self { map: BTreeMap::new() }
    }

    #[must_use]
    pub fn get(&self, key: &PrimaryKey) -> Option<&RecordLocation> {
        self.map.get(key)
    }

    #[must_use]
    pub fn contains_key(&self, key: &PrimaryKey) -> bool {
        self.map.contains_key(key)
    }

    /// Inserts or replaces the location for `key`, returning the previous
    /// location if one existed.
    pub fn insert(&mut self, key: PrimaryKey, location: RecordLocation) -> Option<RecordLocation> {
        self.map.insert(key, location)
    }

    /// Removes `key`, returning its location if it was present.
    pub fn remove(&mut self, key: &PrimaryKey) -> Option<RecordLocation> {
        self.map.remove(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Iterates entries in ascending primary-key order.
    pub fn iter(&self) -> impl Iterator<Item = (&PrimaryKey, &RecordLocation)> {
        self.map.iter()
    }

    /// Every occupied slot currently referenced by the directory, used by
    /// compaction to build the free-list's live-set.
    #[must_use]
    pub fn live_slots(&self) -> Vec<Slot> {
        self.map.values().map(|loc| loc.slot).collect()
    }

    pub fn clear(&mut self) {
        self.map.clear();
    }
}
