//! # Codec
//!
//! The binary serialization layer shared by every table: fixed-width integer
//! and float framing, length-prefixed strings and byte blobs, a small type-id
//! registry for user-defined element types, and the 32-bit content
//! fingerprint used to detect no-op updates.
//!
//! Everything here is a leaf utility — no file I/O, no locking, no knowledge
//! of tables or entities. [`storage`](../storage/index.html) and
//! [`directory`](../directory/index.html) build the table format on top of
//! [`Writer`]/[`Reader`]; [`config`](../config/index.html) builds entity
//! codecs on top of the same primitives.
//!
//! ## Reserved type ids
//!
//! Ids below 2000 are reserved for the built-in scalar and composite shapes
//! (see [`ids`]). User element types register under an id `>= 2000` via
//! [`TypeRegistry::register_user`].

mod hash;
mod registry;
mod stream;

pub use hash::fingerprint;
pub use registry::{ids, schema_fingerprint, TypeRegistry};
pub use stream::{Reader, Writer};

use thiserror::Error;

/// Errors surfaced by the codec layer.
///
/// These map onto the `UnknownType`, `Corruption`, and `IoFailure` kinds from
/// the storage-engine error model; `directory` and `engine` widen this into
/// their own error enums as it propagates up.
#[derive(Debug, Error)]
pub enum CodecError {
    /// An underlying I/O error while reading or writing the stream.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization or deserialization was requested for a type with no
    /// registered codec.
    #[error("unknown type id {0}")]
    UnknownType(i32),

    /// The bytes read did not form a valid encoding (bad length prefix,
    /// invalid UTF-8, truncated record, etc).
    #[error("corrupt data: {0}")]
    Corrupt(String),

    /// A type id below 2000 (reserved for built-ins) was used in a user
    /// registration, or a duplicate id was registered.
    #[error("invalid type id {0}: {1}")]
    InvalidTypeId(i32, &'static str),

    /// A registration was attempted after the registry was frozen.
    #[error("type registry is frozen: no further registrations are accepted")]
    RegistryFrozen,
}

#[cfg(test)]
mod tests;
