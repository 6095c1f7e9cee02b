//! # Config
//!
//! The schema-builder layer: turns a plain Rust entity type into a
//! [`TableSchema`] via explicit registration (`Mapper::key`, `::with_index`,
//! `::codec`, `::declare_types`) rather than reflection or derive macros.
//! `engine::Table<E>` is generic over one `TableSchema<E>` for its whole
//! lifetime.

mod mapper;

pub use mapper::{type_ids, ConfigError, IndexDef, Mapper, TableSchema};
pub use directory::{Comparator, IndexValue, PrimaryKey};

#[cfg(test)]
mod tests;
