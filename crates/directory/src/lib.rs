//! # Directory
//!
//! The in-memory key directory for one table: a primary index from key to
//! byte range, and zero or more secondary indexes from column value to the
//! set of primary keys holding it. Every read and write against a table goes
//! through this directory before ever touching the data stream.
//!
//! [`blob`] serializes this state to and from the index stream; `storage`
//! owns the file itself and wraps the whole thing in an `RwLock`.

mod blob;
mod primary;
mod secondary;

pub use blob::{read_primary, read_secondary, write_primary, write_secondary};
pub use primary::{PrimaryDirectory, PrimaryKey, RecordLocation};
pub use secondary::{Comparator, IndexValue, SecondaryIndex};

#[cfg(test)]
mod tests;
