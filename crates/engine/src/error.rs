use thiserror::Error;

/// The error kinds surfaced at the table/instance API boundary.
///
/// Every lower-layer error (`codec`, `directory`, `storage`, `config`) is
/// folded into one of these; callers match on kind, not on which crate
/// happened to detect the problem.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A file-system operation failed.
    #[error("io failure: {0}")]
    IoFailure(#[from] std::io::Error),

    /// A table was opened against a schema whose declared types don't match
    /// what is stored on disk.
    #[error("schema mismatch: {0}")]
    SchemaMismatch(String),

    /// A type id had no registered codec.
    #[error("unknown type id {0}")]
    UnknownType(i32),

    /// An operation that requires a fresh key found one already in use.
    #[error("key conflict in table {table:?}: key already exists")]
    KeyConflict { table: String },

    /// A table-level row quota was reached.
    #[error("quota exceeded in table {table:?}: limit is {limit} rows")]
    QuotaExceeded { table: String, limit: u64 },

    /// Caller misuse: an unknown index name, a table opened twice while
    /// already open, a schema that failed to build.
    #[error("usage error: {0}")]
    UsageError(String),

    /// The on-disk bytes did not form a valid record.
    #[error("corruption: {0}")]
    Corruption(String),
}

impl From<codec::CodecError> for EngineError {
    fn from(err: codec::CodecError) -> Self {
        match err {
            codec::CodecError::Io(e) => EngineError::IoFailure(e),
            codec::CodecError::UnknownType(id) => EngineError::UnknownType(id),
            codec::CodecError::Corrupt(msg) => EngineError::Corruption(msg),
            codec::CodecError::InvalidTypeId(id, why) => {
                EngineError::UsageError(format!("invalid type id {}: {}", id, why))
            }
            codec::CodecError::RegistryFrozen => {
                EngineError::UsageError("type registry is frozen".to_string())
            }
        }
    }
}

impl From<storage::StorageError> for EngineError {
    fn from(err: storage::StorageError) -> Self {
        match err {
            storage::StorageError::Io(e) => EngineError::IoFailure(e),
            storage::StorageError::Codec(e) => e.into(),
            storage::StorageError::SchemaMismatch { expected, found } => EngineError::SchemaMismatch(format!(
                "table was created with fingerprint {:#010x}, opened with {:#010x}",
                expected, found
            )),
            storage::StorageError::UnknownIndex(name) => {
                EngineError::UsageError(format!("unknown secondary index {:?}", name))
            }
            storage::StorageError::Corruption(msg) => EngineError::Corruption(msg),
        }
    }
}

impl From<config::ConfigError> for EngineError {
    fn from(err: config::ConfigError) -> Self {
        EngineError::UsageError(err.to_string())
    }
}
