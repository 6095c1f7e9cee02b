//! `Instance`: the schema/instance manager. One `Instance` owns a directory
//! on disk and tracks the lifecycle of every table opened against it, so a
//! caller can't reopen a table that is already open in this process, or use
//! one that has been purged.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;

use config::TableSchema;

use crate::error::EngineError;
use crate::table::Table;

/// Where a named table currently stands relative to this `Instance`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableState {
    /// Never opened in this process (or closed again after being open).
    Unopened,
    /// Currently open; a second `open_table` call for the same name fails.
    Open,
    /// Purged: its files were removed and it can never be reopened under
    /// this `Instance`.
    Purged,
}

/// The schema/instance manager for one on-disk database directory.
pub struct Instance {
    root: PathBuf,
    tables: Mutex<HashMap<String, TableState>>,
}

impl Instance {
    /// Opens an `Instance` rooted at `root`, creating the directory if it
    /// does not exist. Table state starts empty: every table name begins
    /// `Unopened` until [`open_table`](Self::open_table) is called.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, EngineError> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;
        log::info!("instance opened at {}", root.display());
        Ok(Self {
            root,
            tables: Mutex::new(HashMap::new()),
        })
    }

    #[must_use]
    pub fn state_of(&self, name: &str) -> TableState {
        self.tables
            .lock()
            .expect("table state lock poisoned")
            .get(name)
            .copied()
            .unwrap_or(TableState::Unopened)
    }

    /// Opens `schema`'s table, creating its files on first use.
    ///
    /// A table that was previously [`purge_table`](Self::purge_table)d may be
    /// reopened: `Purged —open→ Open` re-creates its files from scratch, per
    /// the table state machine (spec §4.6). Only `Open` is rejected, since a
    /// second live handle over the same files would defeat the single-writer
    /// lock this `Instance` otherwise guarantees per table.
    ///
    /// # Errors
    ///
    /// Returns `UsageError` if the table is already open in this process;
    /// returns `SchemaMismatch` if the on-disk table was created under a
    /// different declared type list.
    pub fn open_table<E>(&self, schema: TableSchema<E>) -> Result<Table<E>, EngineError> {
        let name = schema.name().to_string();
        {
            let mut tables = self.tables.lock().expect("table state lock poisoned");
            if tables.get(&name).copied() == Some(TableState::Open) {
                return Err(EngineError::UsageError(format!("table {:?} is already open", name)));
            }
            tables.insert(name.clone(), TableState::Open);
        }

        let data_path = self.root.join(format!("{name}.data"));
        let index_path = self.root.join(format!("{name}.index"));
        match Table::open(schema, &data_path, &index_path) {
            Ok(table) => {
                log::info!("table {:?} opened ({} rows)", name, table.len());
                Ok(table)
            }
            Err(err) => {
                self.tables
                    .lock()
                    .expect("table state lock poisoned")
                    .insert(name, TableState::Unopened);
                Err(err)
            }
        }
    }

    /// Marks `name` closed: a later `open_table` call for the same name is
    /// allowed again. The caller is responsible for having already dropped
    /// its `Table` handle.
    pub fn close_table(&self, name: &str) {
        let mut tables = self.tables.lock().expect("table state lock poisoned");
        if tables.get(name).copied() == Some(TableState::Open) {
            tables.insert(name.to_string(), TableState::Unopened);
            log::info!("table {:?} closed", name);
        }
    }

    /// Deletes `name`'s on-disk files and marks it `Purged`. A later
    /// `open_table` call for the same name is still allowed -- per the
    /// table state machine (spec §4.6), `Purged —open→ Open` re-creates the
    /// files from scratch -- but `Purged` itself means "no files exist" and
    /// is visible via [`state_of`](Self::state_of) until that happens.
    pub fn purge_table(&self, name: &str) -> Result<(), EngineError> {
        let mut tables = self.tables.lock().expect("table state lock poisoned");
        if tables.get(name).copied() == Some(TableState::Open) {
            return Err(EngineError::UsageError(format!(
                "table {:?} must be closed before it can be purged",
                name
            )));
        }

        let data_path = self.root.join(format!("{name}.data"));
        let index_path = self.root.join(format!("{name}.index"));
        if data_path.exists() {
            std::fs::remove_file(&data_path)?;
        }
        if index_path.exists() {
            std::fs::remove_file(&index_path)?;
        }

        tables.insert(name.to_string(), TableState::Purged);
        log::info!("table {:?} purged", name);
        Ok(())
    }

    /// Deletes the entire schema directory and recreates it empty (spec
    /// §4.6's instance-level `purge`, as opposed to [`purge_table`](Self::purge_table)'s
    /// single-table scope). Every table tracked by this `Instance` must
    /// already be closed; any still `Open` blocks the call, since its live
    /// handle would otherwise point at files removed out from under it.
    pub fn purge_schema(&self) -> Result<(), EngineError> {
        let mut tables = self.tables.lock().expect("table state lock poisoned");
        if let Some(name) = tables.iter().find(|(_, state)| **state == TableState::Open).map(|(n, _)| n.clone()) {
            return Err(EngineError::UsageError(format!(
                "table {:?} must be closed before the schema can be purged",
                name
            )));
        }

        std::fs::remove_dir_all(&self.root)?;
        std::fs::create_dir_all(&self.root)?;
        tables.clear();
        log::info!("schema purged at {}", self.root.display());
        Ok(())
    }
}
