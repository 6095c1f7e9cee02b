//! `BulkWriter<E>`/`BulkReader<E>`: the entity-level views over a single
//! [`storage::WriteSession`]/[`storage::ReadSession`], used inside
//! [`crate::table::Table::bulk_write`]/[`crate::table::Table::bulk_read`] to
//! run many operations under one lock acquisition instead of one per call.

use config::{IndexValue, PrimaryKey, TableSchema};
use storage::{ReadSession, SaveOutcome, WriteSession};

use crate::error::EngineError;

/// A batch of mutations against one table, committed together.
///
/// Individual `save`/`delete` calls apply to the in-memory directory right
/// away (so a later call in the same batch sees earlier ones), but the
/// index stream itself is rewritten once, when the batch's [`Table::bulk_write`](crate::table::Table::bulk_write)
/// call returns successfully.
pub struct BulkWriter<'a, E> {
    schema: &'a TableSchema<E>,
    session: WriteSession<'a>,
}

impl<'a, E> BulkWriter<'a, E> {
    pub(crate) fn new(schema: &'a TableSchema<E>, session: WriteSession<'a>) -> Self {
        Self { schema, session }
    }

    /// Inserts or replaces `entity`.
    pub fn save(&mut self, entity: &E) -> Result<SaveOutcome, EngineError> {
        let key = self.schema.primary_key(entity);
        let mut bytes = Vec::new();
        self.schema.encode(entity, &mut bytes)?;
        let index_values: Vec<IndexValue> = self.schema.indexes().iter().map(|def| def.extract(entity)).collect();
        Ok(self.session.save(key, &bytes, index_values)?)
    }

    /// Deletes the row at `key`, returning `true` if one existed.
    pub fn delete(&mut self, key: &PrimaryKey) -> Result<bool, EngineError> {
        Ok(self.session.delete(key)?)
    }

    pub(crate) fn commit(&mut self) -> Result<(), EngineError> {
        Ok(self.session.commit()?)
    }
}

/// A batch of reads against one table, all resolved against the same
/// snapshot: the shared lock is acquired once for the whole closure passed
/// to [`Table::bulk_read`](crate::table::Table::bulk_read), instead of once
/// per `load_by_key`/`load_all`/`index_query` call, so the caller sees one
/// consistent point in time across every read it makes.
pub struct BulkReader<'a, E> {
    schema: &'a TableSchema<E>,
    session: ReadSession<'a>,
}

impl<'a, E> BulkReader<'a, E> {
    pub(crate) fn new(schema: &'a TableSchema<E>, session: ReadSession<'a>) -> Self {
        Self { schema, session }
    }

    /// Loads the entity stored under `key`, if any.
    pub fn load_by_key(&self, key: &PrimaryKey) -> Result<Option<E>, EngineError> {
        match self.session.get(key)? {
            Some(bytes) => {
                let mut cursor = &bytes[..];
                Ok(Some(self.schema.decode(&mut cursor)?))
            }
            None => Ok(None),
        }
    }

    /// Loads every row, in ascending primary-key order.
    pub fn load_all(&self) -> Result<Vec<E>, EngineError> {
        self.session
            .load_all()?
            .into_iter()
            .map(|(_, bytes)| {
                let mut cursor = &bytes[..];
                self.schema.decode(&mut cursor).map_err(EngineError::from)
            })
            .collect()
    }

    /// Loads every row whose value in secondary index `name` equals `value`.
    pub fn index_query(&self, name: &str, value: &IndexValue) -> Result<Vec<E>, EngineError> {
        self.session
            .index_lookup(name, value)?
            .iter()
            .map(|key| {
                let bytes = self
                    .session
                    .get(key)?
                    .ok_or_else(|| EngineError::Corruption(format!("index {:?} points at missing row", name)))?;
                let mut cursor = &bytes[..];
                self.schema.decode(&mut cursor).map_err(EngineError::from)
            })
            .collect()
    }

    /// The number of live rows visible in this snapshot.
    #[must_use]
    pub fn len(&self) -> usize {
        self.session.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.session.is_empty()
    }
}
