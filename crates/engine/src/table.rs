//! `Table<E>`: the entity-level read/write API over one [`storage::TableStorage`],
//! parameterized by a [`config::TableSchema<E>`] that knows how to turn `E`
//! into bytes, a primary key, and a row of secondary index values.

use std::path::Path;

use config::{IndexValue, PrimaryKey, TableSchema};
use storage::{CompactionStats, IndexSpec, SaveOutcome, TableStorage};

use crate::bulk::{BulkReader, BulkWriter};
use crate::cursor::IndexCursor;
use crate::error::EngineError;

/// One table: a schema bound to the storage backing it.
pub struct Table<E> {
    schema: TableSchema<E>,
    storage: TableStorage,
}

impl<E> Table<E> {
    /// Opens (or creates) a table at `data_path`/`index_path` under `schema`.
    pub fn open(schema: TableSchema<E>, data_path: impl AsRef<Path>, index_path: impl AsRef<Path>) -> Result<Self, EngineError> {
        let index_specs: Vec<IndexSpec> = schema
            .indexes()
            .iter()
            .map(|def| IndexSpec {
                name: def.name.clone(),
                comparator: def.comparator,
            })
            .collect();
        let storage = TableStorage::open_or_create(data_path, index_path, schema.schema_fingerprint(), &index_specs)?;
        Ok(Self { schema, storage })
    }

    #[must_use]
    pub fn name(&self) -> &str {
        self.schema.name()
    }

    pub(crate) fn storage(&self) -> &TableStorage {
        &self.storage
    }

    pub(crate) fn schema(&self) -> &TableSchema<E> {
        &self.schema
    }

    fn encode(&self, entity: &E) -> Result<(Vec<u8>, Vec<IndexValue>), EngineError> {
        let mut bytes = Vec::new();
        self.schema.encode(entity, &mut bytes)?;
        let index_values = self.schema.indexes().iter().map(|def| def.extract(entity)).collect();
        Ok((bytes, index_values))
    }

    fn check_quota(&self, key: &PrimaryKey) -> Result<(), EngineError> {
        if let Some(limit) = self.schema.row_quota() {
            let read = self.storage.read_session();
            let already_present = read.get(key)?.is_some();
            if !already_present && read.len() as u64 >= limit {
                return Err(EngineError::QuotaExceeded {
                    table: self.schema.name().to_string(),
                    limit,
                });
            }
        }
        Ok(())
    }

    /// Inserts or replaces `entity`, keyed by its schema-derived primary key.
    pub fn save(&self, entity: &E) -> Result<SaveOutcome, EngineError> {
        let key = self.schema.primary_key(entity);
        self.check_quota(&key)?;
        let (bytes, index_values) = self.encode(entity)?;
        let mut session = self.storage.write_session();
        let outcome = session.save(key, &bytes, index_values)?;
        session.commit()?;
        Ok(outcome)
    }

    /// Inserts `entity`, failing with `KeyConflict` if its primary key
    /// already holds a row.
    pub fn insert(&self, entity: &E) -> Result<(), EngineError> {
        let key = self.schema.primary_key(entity);
        if self.storage.read_session().get(&key)?.is_some() {
            return Err(EngineError::KeyConflict {
                table: self.schema.name().to_string(),
            });
        }
        match self.save(entity)? {
            SaveOutcome::Created => Ok(()),
            _ => Err(EngineError::KeyConflict {
                table: self.schema.name().to_string(),
            }),
        }
    }

    /// Loads the entity stored under `key`, if any.
    pub fn load_by_key(&self, key: &PrimaryKey) -> Result<Option<E>, EngineError> {
        let session = self.storage.read_session();
        match session.get(key)? {
            Some(bytes) => {
                let mut cursor = &bytes[..];
                Ok(Some(self.schema.decode(&mut cursor)?))
            }
            None => Ok(None),
        }
    }

    /// Loads every row, in ascending primary-key order.
    pub fn load_all(&self) -> Result<Vec<E>, EngineError> {
        let session = self.storage.read_session();
        let rows = session.load_all()?;
        rows.into_iter()
            .map(|(_, bytes)| {
                let mut cursor = &bytes[..];
                self.schema.decode(&mut cursor).map_err(EngineError::from)
            })
            .collect()
    }

    /// Deletes the row at `key`, returning `true` if one existed.
    pub fn delete_by_key(&self, key: &PrimaryKey) -> Result<bool, EngineError> {
        let mut session = self.storage.write_session();
        let existed = session.delete(key)?;
        session.commit()?;
        Ok(existed)
    }

    /// Loads every row whose value in secondary index `name` equals `value`.
    pub fn index_query(&self, name: &str, value: &IndexValue) -> Result<Vec<E>, EngineError> {
        let session = self.storage.read_session();
        let keys = session.index_lookup(name, value)?;
        keys.iter()
            .map(|key| {
                let bytes = session
                    .get(key)?
                    .ok_or_else(|| EngineError::Corruption(format!("index {:?} points at missing row", name)))?;
                let mut cursor = &bytes[..];
                self.schema.decode(&mut cursor).map_err(EngineError::from)
            })
            .collect()
    }

    /// Opens a chainable cursor over secondary index `name`: `key`,
    /// `greater_than`, and `less_than` narrow the query (the latter two
    /// intersect when chained), and `count`/`to_list` run it.
    #[must_use]
    pub fn query(&self, name: &str) -> IndexCursor<'_, E> {
        IndexCursor::new(self, name)
    }

    /// Loads every row whose value in secondary index `name` falls within
    /// `[lower, upper]` inclusive.
    pub fn index_range(&self, name: &str, lower: &IndexValue, upper: &IndexValue) -> Result<Vec<E>, EngineError> {
        let session = self.storage.read_session();
        let keys = session.index_range(name, lower, upper)?;
        keys.iter()
            .map(|key| {
                let bytes = session
                    .get(key)?
                    .ok_or_else(|| EngineError::Corruption(format!("index {:?} points at missing row", name)))?;
                let mut cursor = &bytes[..];
                self.schema.decode(&mut cursor).map_err(EngineError::from)
            })
            .collect()
    }

    /// Returns the number of live rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.storage.read_session().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.storage.read_session().is_empty()
    }

    /// Runs `f` against a single shared read session: every `load_by_key`/
    /// `load_all`/`index_query` call inside `f` resolves against the same
    /// snapshot, rather than each re-acquiring the lock and possibly
    /// observing an interleaved write.
    ///
    /// See [`BulkReader`] for the operations available inside `f`.
    pub fn bulk_read<F, T>(&self, f: F) -> Result<T, EngineError>
    where
        F: FnOnce(&BulkReader<'_, E>) -> Result<T, EngineError>,
    {
        let reader = BulkReader::new(&self.schema, self.storage.read_session());
        f(&reader)
    }

    /// Runs `f` against a single exclusive write session: every `save`/
    /// `delete` inside `f` is applied to the in-memory directory
    /// immediately, and the index stream is rewritten exactly once when `f`
    /// returns, rather than once per call.
    ///
    /// See [`BulkWriter`] for the operations available inside `f`.
    pub fn bulk_write<F, T>(&self, f: F) -> Result<T, EngineError>
    where
        F: FnOnce(&mut BulkWriter<'_, E>) -> Result<T, EngineError>,
    {
        let session = self.storage.write_session();
        let mut writer = BulkWriter::new(&self.schema, session);
        let result = f(&mut writer)?;
        writer.commit()?;
        Ok(result)
    }

    /// Repacks the data stream, eliminating free-list fragmentation left by
    /// prior updates and deletes.
    pub fn compact(&self) -> Result<CompactionStats, EngineError> {
        let mut session = self.storage.compact_session();
        Ok(session.compact()?)
    }

    /// Empties the table in place: every row is deleted and both streams
    /// are truncated to zero, without closing the table or touching its
    /// files' existence (spec §3 lifecycle, §4.2's write-session `purge`).
    pub fn purge(&self) -> Result<(), EngineError> {
        let mut session = self.storage.write_session();
        session.purge()?;
        session.commit()?;
        Ok(())
    }
}
