//! # Storage
//!
//! Owns the physical index-stream/data-stream pair for one table and the
//! `RwLock` that arbitrates access to it: any number of [`ReadSession`]s may
//! run concurrently against a stable snapshot, while a [`WriteSession`] or
//! [`CompactSession`] takes the directory exclusively.
//!
//! This crate knows nothing about entity types -- it moves `Vec<u8>` payloads
//! and [`directory::IndexValue`]s around. `engine` and `config` build the
//! entity-aware `Table<E>` API on top of it.

mod header;
mod session;

pub use session::{
    CompactSession, CompactionStats, IndexSpec, ReadSession, SaveOutcome, StorageError, TableStorage, WriteSession,
};
