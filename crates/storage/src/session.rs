//! The table storage engine: an index-stream/data-stream pair guarded by a
//! single `RwLock`, so any number of readers can run concurrently against a
//! stable snapshot while at most one writer or compactor holds the
//! directory at a time.

use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Read, Seek, SeekFrom, Write};
use std::ops::Bound;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, RwLock, RwLockReadGuard, RwLockWriteGuard};

use alloc::{FreeList, Slot};
use codec::{fingerprint, CodecError, Reader, Writer};
use directory::{Comparator, IndexValue, PrimaryDirectory, PrimaryKey, RecordLocation, SecondaryIndex};
use thiserror::Error;

use crate::header::{read_index, write_index, IndexImage};

/// Errors surfaced by the storage layer.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("codec error: {0}")]
    Codec(#[from] CodecError),

    #[error("schema fingerprint mismatch: table was created with {expected:#010x}, opened with {found:#010x}")]
    SchemaMismatch { expected: u32, found: u32 },

    #[error("unknown secondary index {0:?}")]
    UnknownIndex(String),

    #[error("internal inconsistency: {0}")]
    Corruption(String),
}

/// The mutable directory state guarded by [`TableStorage`]'s `RwLock`.
#[derive(Clone)]
struct Directory {
    free_list: FreeList,
    primary: PrimaryDirectory,
    secondary: Vec<(String, SecondaryIndex)>,
    /// The index values each primary key is currently indexed under, in the
    /// same order as `secondary`, kept so a later `save`/`delete` can remove
    /// exactly the stale entries rather than rescanning every index.
    indexed_values: HashMap<PrimaryKey, Vec<IndexValue>>,
}

impl Directory {
    fn secondary_position(&self, name: &str) -> Option<usize> {
        self.secondary.iter().position(|(n, _)| n == name)
    }

    fn deindex(&mut self, key: &PrimaryKey) {
        if let Some(values) = self.indexed_values.remove(key) {
            for (slot, value) in self.secondary.iter_mut().zip(values.iter()) {
                slot.1.remove(value, key);
            }
        }
    }

    fn reindex(&mut self, key: &PrimaryKey, values: Vec<IndexValue>) {
        for (slot, value) in self.secondary.iter_mut().zip(values.iter()) {
            slot.1.insert(value.clone(), key.clone());
        }
        self.indexed_values.insert(key.clone(), values);
    }
}

/// One table's on-disk state: the data stream holding serialized entity
/// bytes, the index stream holding the directory, and the `RwLock` that
/// serializes writers/compactors against readers.
pub struct TableStorage {
    data_path: PathBuf,
    index_path: PathBuf,
    schema_fingerprint: u32,
    data_file: Mutex<File>,
    directory: RwLock<Directory>,
}

/// Declares one secondary index a freshly created table should start with.
pub struct IndexSpec {
    pub name: String,
    pub comparator: Comparator,
}

impl TableStorage {
    /// Opens an existing table at `data_path`/`index_path`, or creates a
    /// fresh one if the index file does not yet exist.
    ///
    /// On open, the stored schema fingerprint is compared against
    /// `schema_fingerprint`; a mismatch means the table was created under a
    /// different entity shape and is rejected rather than silently
    /// misparsed.
    pub fn open_or_create(
        data_path: impl AsRef<Path>,
        index_path: impl AsRef<Path>,
        schema_fingerprint: u32,
        indexes: &[IndexSpec],
    ) -> Result<Self, StorageError> {
        let data_path = data_path.as_ref().to_path_buf();
        let index_path = index_path.as_ref().to_path_buf();

        let directory = if index_path.exists() {
            let bytes = std::fs::read(&index_path)?;
            let mut reader = Reader::new(&bytes[..]);
            let image = read_index(&mut reader)?;
            if image.schema_fingerprint != schema_fingerprint {
                return Err(StorageError::SchemaMismatch {
                    expected: image.schema_fingerprint,
                    found: schema_fingerprint,
                });
            }
            let indexed_values = rebuild_indexed_values(&image.primary, &image.secondary);
            Directory {
                free_list: image.free_list,
                primary: image.primary,
                secondary: image.secondary,
                indexed_values,
            }
        } else {
            let secondary = indexes
                .iter()
                .map(|spec| (spec.name.clone(), SecondaryIndex::new(spec.comparator)))
                .collect();
            Directory {
                free_list: FreeList::new(0),
                primary: PrimaryDirectory::new(),
                secondary,
                indexed_values: HashMap::new(),
            }
        };

        if !data_path.exists() {
            File::create(&data_path)?;
        }
        let data_file = OpenOptions::new().read(true).write(true).open(&data_path)?;

        let storage = Self {
            data_path,
            index_path,
            schema_fingerprint,
            data_file: Mutex::new(data_file),
            directory: RwLock::new(directory),
        };

        if !storage.index_path.exists() {
            storage.persist_index()?;
        }

        Ok(storage)
    }

    /// Acquires a read session: a stable snapshot of the directory for the
    /// session's lifetime, shared with any number of concurrent readers.
    pub fn read_session(&self) -> ReadSession<'_> {
        ReadSession {
            directory: self.directory.read().expect("directory lock poisoned"),
            data_file: &self.data_file,
        }
    }

    /// Acquires a write session: exclusive access to the directory, used for
    /// a single save/delete or a bulk-write transaction. The index stream is
    /// rewritten once, atomically, when the session is committed (or
    /// dropped without an explicit rollback).
    pub fn write_session(&self) -> WriteSession<'_> {
        let directory = self.directory.write().expect("directory lock poisoned");
        let snapshot = directory.clone();
        WriteSession {
            directory,
            snapshot,
            data_file: &self.data_file,
            index_path: &self.index_path,
            schema_fingerprint: self.schema_fingerprint,
            committed: false,
            dirty: false,
        }
    }

    /// Acquires a compaction session: exclusive access to the directory,
    /// used to repack the data stream and eliminate free-list fragmentation.
    pub fn compact_session(&self) -> CompactSession<'_> {
        CompactSession {
            directory: self.directory.write().expect("directory lock poisoned"),
            data_file: &self.data_file,
            data_path: &self.data_path,
            index_path: &self.index_path,
            schema_fingerprint: self.schema_fingerprint,
        }
    }

    fn persist_index(&self) -> Result<(), StorageError> {
        let dir = self.directory.read().expect("directory lock poisoned");
        persist_index_locked(&dir, &self.index_path, self.schema_fingerprint)
    }
}

fn rebuild_indexed_values(
    primary: &PrimaryDirectory,
    secondary: &[(String, SecondaryIndex)],
) -> HashMap<PrimaryKey, Vec<IndexValue>> {
    let mut out: HashMap<PrimaryKey, Vec<IndexValue>> = primary
        .iter()
        .map(|(k, _)| (k.clone(), vec![IndexValue::Null; secondary.len()]))
        .collect();
    for (slot_idx, (_, index)) in secondary.iter().enumerate() {
        for (value, pk) in index.lookup_all_pairs() {
            if let Some(values) = out.get_mut(&pk) {
                values[slot_idx] = value;
            }
        }
    }
    out
}

fn persist_index_locked(dir: &Directory, index_path: &Path, schema_fingerprint: u32) -> Result<(), StorageError> {
    let image = IndexImage {
        schema_fingerprint,
        free_list: dir.free_list.clone(),
        primary: clone_primary(&dir.primary),
        secondary: dir.secondary.clone(),
    };

    let mut buf = Vec::new();
    write_index(&mut Writer::new(&mut buf), &image)?;

    let tmp_path = index_path.with_extension("idx.tmp");
    {
        let file = OpenOptions::new().create(true).write(true).truncate(true).open(&tmp_path)?;
        let mut w = BufWriter::new(file);
        w.write_all(&buf)?;
        w.flush()?;
        w.into_inner().map_err(|e| e.into_error())?.sync_all()?;
    }
    std::fs::rename(&tmp_path, index_path)?;
    if let Some(parent) = index_path.parent() {
        if let Ok(dir) = File::open(parent) {
            let _ = dir.sync_all();
        }
    }
    Ok(())
}

fn clone_primary(primary: &PrimaryDirectory) -> PrimaryDirectory {
    let mut out = PrimaryDirectory::new();
    for (k, v) in primary.iter() {
        out.insert(k.clone(), *v);
    }
    out
}

fn read_slot(data_file: &Mutex<File>, slot: Slot) -> Result<Vec<u8>, StorageError> {
    let mut file = data_file.lock().expect("data file lock poisoned");
    file.seek(SeekFrom::Start(slot.offset))?;
    let mut buf = vec![0u8; slot.length as usize];
    file.read_exact(&mut buf)?;
    Ok(buf)
}

fn write_slot(data_file: &Mutex<File>, slot: Slot, bytes: &[u8]) -> Result<(), StorageError> {
    let mut file = data_file.lock().expect("data file lock poisoned");
    let needed = slot.offset + slot.length;
    if file.metadata()?.len() < needed {
        file.set_len(needed)?;
    }
    file.seek(SeekFrom::Start(slot.offset))?;
    file.write_all(bytes)?;
    Ok(())
}

/// A read-only snapshot over one table, held for as long as the caller needs
/// a consistent view. Any number of `ReadSession`s may be outstanding at
/// once; they block a concurrent writer or compactor until dropped.
pub struct ReadSession<'a> {
    directory: RwLockReadGuard<'a, Directory>,
    data_file: &'a Mutex<File>,
}

impl<'a> ReadSession<'a> {
    /// Returns the serialized bytes for `key`, or `None` if no row exists
    /// under that key.
    pub fn get(&self, key: &PrimaryKey) -> Result<Option<Vec<u8>>, StorageError> {
        match self.directory.primary.get(key) {
            Some(loc) => Ok(Some(read_slot(self.data_file, loc.slot)?)),
            None => Ok(None),
        }
    }

    /// Returns every row's key and bytes, in ascending primary-key order.
    pub fn load_all(&self) -> Result<Vec<(PrimaryKey, Vec<u8>)>, StorageError> {
        let mut out = Vec::with_capacity(self.directory.primary.len());
        for (key, loc) in self.directory.primary.iter() {
            out.push((key.clone(), read_slot(self.data_file, loc.slot)?));
        }
        Ok(out)
    }

    /// Returns the primary keys whose value in secondary index `name`
    /// exactly equals `value`.
    pub fn index_lookup(&self, name: &str, value: &IndexValue) -> Result<Vec<PrimaryKey>, StorageError> {
        let idx = self
            .directory
            .secondary_position(name)
            .ok_or_else(|| StorageError::UnknownIndex(name.to_string()))?;
        Ok(self.directory.secondary[idx].1.lookup(value))
    }

    /// Returns the primary keys whose value in secondary index `name` falls
    /// in `[lower, upper]` inclusive.
    pub fn index_range(&self, name: &str, lower: &IndexValue, upper: &IndexValue) -> Result<Vec<PrimaryKey>, StorageError> {
        let idx = self
            .directory
            .secondary_position(name)
            .ok_or_else(|| StorageError::UnknownIndex(name.to_string()))?;
        Ok(self.directory.secondary[idx].1.range(lower, upper))
    }

    /// Returns the primary keys whose value in secondary index `name` falls
    /// within the arbitrary bound pair `(lower, upper)` -- the general form
    /// behind a chained `greater_than(..)`/`less_than(..)` cursor, where
    /// each side may independently be inclusive, exclusive, or absent.
    pub fn index_cursor(
        &self,
        name: &str,
        lower: Bound<&IndexValue>,
        upper: Bound<&IndexValue>,
    ) -> Result<Vec<PrimaryKey>, StorageError> {
        let idx = self
            .directory
            .secondary_position(name)
            .ok_or_else(|| StorageError::UnknownIndex(name.to_string()))?;
        Ok(self.directory.secondary[idx].1.range_bounded(lower, upper))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.directory.primary.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.directory.primary.is_empty()
    }
}

/// What happened to a row as a result of [`WriteSession::save`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    Created,
    Updated,
    /// The newly serialized bytes were byte-for-byte identical to what was
    /// already stored; nothing was written.
    Unchanged,
}

/// Exclusive access to one table's directory, for a single mutation or a
/// bulk-write transaction. The index stream is rewritten exactly once, when
/// the session is committed -- many `save`/`delete` calls inside one session
/// cost one rewrite, not one per call.
pub struct WriteSession<'a> {
    directory: RwLockWriteGuard<'a, Directory>,
    /// The directory's contents as of session entry, kept so a session that
    /// is dropped without committing can roll back to exactly this state
    /// (spec: "the in-memory directory is rolled back to a snapshot taken
    /// on entry"). Only the in-memory state is rolled back; any data bytes
    /// already written for the abandoned batch are orphaned and reclaimed
    /// by the next compaction or by reservation reuse.
    snapshot: Directory,
    data_file: &'a Mutex<File>,
    index_path: &'a Path,
    schema_fingerprint: u32,
    committed: bool,
    dirty: bool,
}

impl<'a> WriteSession<'a> {
    /// Inserts or replaces the row at `key` with `bytes`, updating every
    /// secondary index to `index_values` (one value per declared index, in
    /// schema order).
    ///
    /// If a row already exists at `key` whose stored bytes have the same
    /// content fingerprint as `bytes`, the call is a no-op and returns
    /// [`SaveOutcome::Unchanged`] -- no data write, no index rewrite.
    pub fn save(
        &mut self,
        key: PrimaryKey,
        bytes: &[u8],
        index_values: Vec<IndexValue>,
    ) -> Result<SaveOutcome, StorageError> {
        let new_fingerprint = fingerprint(bytes);

        if let Some(existing) = self.directory.primary.get(&key).copied() {
            if existing.fingerprint == new_fingerprint {
                return Ok(SaveOutcome::Unchanged);
            }
            let new_slot = {
                let fl = &mut self.directory.free_list;
                fl.replace(existing.slot, bytes.len() as u64)
            };
            write_slot(self.data_file, new_slot, bytes)?;
            self.directory
                .primary
                .insert(key.clone(), RecordLocation::new(new_slot, new_fingerprint));
            self.directory.deindex(&key);
            self.directory.reindex(&key, index_values);
            self.dirty = true;
            Ok(SaveOutcome::Updated)
        } else {
            let slot = self.directory.free_list.reserve(bytes.len() as u64);
            write_slot(self.data_file, slot, bytes)?;
            self.directory
                .primary
                .insert(key.clone(), RecordLocation::new(slot, new_fingerprint));
            self.directory.reindex(&key, index_values);
            self.dirty = true;
            Ok(SaveOutcome::Created)
        }
    }

    /// Removes the row at `key`, returning `true` if one existed.
    pub fn delete(&mut self, key: &PrimaryKey) -> Result<bool, StorageError> {
        match self.directory.primary.remove(key) {
            Some(loc) => {
                self.directory.free_list.release(loc.slot);
                self.directory.deindex(key);
                self.dirty = true;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Empties the table: truncates the data stream to zero length and
    /// clears the primary index, every secondary index, and the free list,
    /// as if the table had just been created (spec §4.2's `purge`).
    pub fn purge(&mut self) -> Result<(), StorageError> {
        {
            let file = self.data_file.lock().expect("data file lock poisoned");
            file.set_len(0)?;
        }
        self.directory.primary = PrimaryDirectory::new();
        for (_, index) in self.directory.secondary.iter_mut() {
            index.clear();
        }
        self.directory.indexed_values.clear();
        self.directory.free_list = FreeList::new(0);
        self.dirty = true;
        Ok(())
    }

    /// Rewrites the index stream atomically and marks this session
    /// committed. Idempotent: calling it again (or letting the session drop)
    /// after a successful commit does nothing further.
    pub fn commit(&mut self) -> Result<(), StorageError> {
        if self.committed {
            return Ok(());
        }
        if self.dirty {
            persist_index_locked(&self.directory, self.index_path, self.schema_fingerprint)?;
        }
        self.committed = true;
        Ok(())
    }
}

impl<'a> Drop for WriteSession<'a> {
    /// A session dropped without `commit()` -- because the caller's body
    /// returned an error, or because `commit()` itself failed -- never
    /// rewrites the index stream, and restores the in-memory directory to
    /// its state on entry so no mutation the caller never saw committed
    /// stays visible to the next reader.
    fn drop(&mut self) {
        if !self.committed && self.dirty {
            *self.directory = self.snapshot.clone();
        }
    }
}

/// The outcome of a [`CompactSession::compact`] run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CompactionStats {
    pub rows_moved: usize,
    pub bytes_reclaimed: u64,
}

/// Exclusive access used to repack a table's data stream, eliminating
/// free-list fragmentation by moving every live row to the front of the
/// file with no gaps.
pub struct CompactSession<'a> {
    directory: RwLockWriteGuard<'a, Directory>,
    data_file: &'a Mutex<File>,
    data_path: &'a Path,
    index_path: &'a Path,
    schema_fingerprint: u32,
}

impl<'a> CompactSession<'a> {
    /// Repacks the data stream: every live row is copied, in primary-key
    /// offset order, into a fresh `<name>.data.tmp` side file with no gaps;
    /// the side file is fsynced and then renamed over the live data file,
    /// and only then is the index stream rewritten to point at the new
    /// layout.
    ///
    /// The live data file is never renamed away before its replacement
    /// exists -- a crash before the rename leaves the original file and the
    /// original index untouched; a crash after the rename but before the
    /// index rewrite leaves the new data file in place with the old index
    /// still describing the pre-compaction layout, which the old file no
    /// longer matches, but the next `compact` call rebuilds the side file
    /// from the live data fresh either way, so no caller ever observes a
    /// table that is visibly empty.
    pub fn compact(&mut self) -> Result<CompactionStats, StorageError> {
        let before_end = self.directory.free_list.end();

        let mut entries: Vec<(PrimaryKey, Slot)> = self
            .directory
            .primary
            .iter()
            .map(|(k, loc)| (k.clone(), loc.slot))
            .collect();
        entries.sort_by_key(|(_, slot)| slot.offset);

        let slots: Vec<Slot> = entries.iter().map(|(_, s)| *s).collect();
        let plan = self.directory.free_list.compaction_plan(&slots);
        let moved = plan.moves.len();

        let tmp_path = self.data_path.with_extension("data.tmp");
        {
            let mut live = self.data_file.lock().expect("data file lock poisoned");
            let tmp_file = OpenOptions::new().create(true).write(true).truncate(true).open(&tmp_path)?;
            let mut writer = BufWriter::new(tmp_file);
            for (_, slot) in &entries {
                live.seek(SeekFrom::Start(slot.offset))?;
                let mut buf = vec![0u8; slot.length as usize];
                live.read_exact(&mut buf)?;
                writer.write_all(&buf)?;
            }
            writer.flush()?;
            writer.into_inner().map_err(|e| e.into_error())?.sync_all()?;
        }
        std::fs::rename(&tmp_path, self.data_path)?;

        {
            let mut live = self.data_file.lock().expect("data file lock poisoned");
            *live = OpenOptions::new().read(true).write(true).open(self.data_path)?;
        }

        let mut cursor = 0u64;
        for (key, slot) in &entries {
            let new_slot = Slot::new(cursor, slot.length);
            if let Some(loc) = self.directory.primary.get(key).copied() {
                self.directory.primary.insert(key.clone(), RecordLocation::new(new_slot, loc.fingerprint));
            }
            cursor += slot.length;
        }

        self.directory.free_list.reset_after_compaction(&plan);

        persist_index_locked(&self.directory, self.index_path, self.schema_fingerprint)?;

        Ok(CompactionStats {
            rows_moved: moved,
            bytes_reclaimed: before_end - plan.new_end,
        })
    }
}
