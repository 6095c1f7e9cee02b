//! # Engine - entity table storage engine
//!
//! The central orchestrator that ties together the [`codec`], [`alloc`],
//! [`directory`], [`config`], and [`storage`] crates into an embedded,
//! in-process entity database: each table is an index/data stream pair on
//! disk, addressed through a typed [`Table<E>`] handle.
//!
//! ## Architecture
//!
//! ```text
//! Caller
//!   |
//!   v
//! ┌───────────────────────────────────────────────┐
//! │                   ENGINE                      │
//! │                                               │
//! │ instance.rs → Instance tracks table lifecycle │
//! │              |                                │
//! │              v                                │
//! │ table.rs  → Table<E>: save/load/delete/query  │
//! │              |            |                   │
//! │              |            v                   │
//! │              |     bulk.rs → BulkWriter<E>    │
//! │              v                                │
//! │          storage::TableStorage                │
//! │   (free-list data stream + primary/secondary  │
//! │    indexes, RwLock-guarded, atomic index      │
//! │    rewrite on commit)                         │
//! └───────────────────────────────────────────────┘
//! ```
//!
//! ## Module Responsibilities
//!
//! | Module       | Purpose                                                     |
//! |-------------|--------------------------------------------------------------|
//! | [`error`]   | `EngineError`, folding every lower-layer error into one type  |
//! | [`table`]   | `Table<E>`: save/insert/load/delete/index query/compact       |
//! | [`cursor`]  | `IndexCursor<E>`: chained key/greater_than/less_than range query |
//! | [`bulk`]    | `BulkWriter<E>`/`BulkReader<E>`: batched mutations under one commit, batched reads under one snapshot |
//! | [`instance`]| `Instance`/`TableState`: per-table open/close/purge lifecycle  |
//!
//! ## Crash Safety
//!
//! Every mutation lands in the in-memory directory first; the index stream
//! is only rewritten, atomically (temp file + rename + fsync), when a write
//! session commits. The data stream itself is append/in-place only — no
//! rewrite is needed to make a single write durable. See `storage::session`
//! for the full write path.
mod bulk;
mod cursor;
mod error;
mod instance;
mod table;

pub use bulk::{BulkReader, BulkWriter};
pub use cursor::IndexCursor;
pub use error::EngineError;
pub use instance::{Instance, TableState};
pub use table::Table;

pub use storage::{CompactionStats, SaveOutcome};

#[cfg(test)]
mod tests;
