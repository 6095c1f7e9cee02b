//! The schema builder: turns a Rust type `E` into a [`TableSchema<E>`] by
//! explicit registration rather than reflection. Every piece a table needs
//! to read or write `E` -- its primary key, its indexed columns, its byte
//! encoding -- is supplied as a closure up front, once, at startup.

use std::io::{Read, Write};
use std::sync::Arc;

use codec::{ids, CodecError};
use directory::{Comparator, IndexValue, PrimaryKey};
use thiserror::Error;

/// Errors raised while building a [`TableSchema`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// `Mapper::build` was called without a primary key extractor.
    #[error("table {0:?} has no primary key extractor; call Mapper::key() before build()")]
    MissingKey(String),

    /// `Mapper::build` was called without entity encode/decode functions.
    #[error("table {0:?} has no entity codec; call Mapper::codec() before build()")]
    MissingCodec(String),

    /// Two indexes were registered under the same name.
    #[error("table {0:?} already has an index named {1:?}")]
    DuplicateIndex(String, String),

    /// `declare_types` was never called, or was called with an empty list.
    #[error("table {0:?} has no declared element types; call Mapper::declare_types()")]
    EmptyTypeDeclaration(String),
}

type KeyFn<E> = dyn Fn(&E) -> PrimaryKey + Send + Sync;
type IndexFn<E> = dyn Fn(&E) -> IndexValue + Send + Sync;
type EncodeFn<E> = dyn Fn(&E, &mut dyn Write) -> Result<(), CodecError> + Send + Sync;
type DecodeFn<E> = dyn Fn(&mut dyn Read) -> Result<E, CodecError> + Send + Sync;

/// One secondary index declared against `E`: a name, a collation, and the
/// closure that projects an entity down to the indexed value.
pub struct IndexDef<E> {
    pub name: String,
    pub comparator: Comparator,
    extract: Arc<IndexFn<E>>,
}

impl<E> IndexDef<E> {
    #[must_use]
    pub fn extract(&self, entity: &E) -> IndexValue {
        (self.extract)(entity)
    }
}

impl<E> Clone for IndexDef<E> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            comparator: self.comparator,
            extract: Arc::clone(&self.extract),
        }
    }
}

/// The frozen schema for one table: everything `engine::Table<E>` needs to
/// turn entities into directory entries and stream bytes.
pub struct TableSchema<E> {
    name: String,
    key: Arc<KeyFn<E>>,
    indexes: Vec<IndexDef<E>>,
    encode: Arc<EncodeFn<E>>,
    decode: Arc<DecodeFn<E>>,
    type_ids: Vec<i32>,
    row_quota: Option<u64>,
}

impl<E> TableSchema<E> {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn indexes(&self) -> &[IndexDef<E>] {
        &self.indexes
    }

    #[must_use]
    pub fn primary_key(&self, entity: &E) -> PrimaryKey {
        (self.key)(entity)
    }

    pub fn encode(&self, entity: &E, w: &mut dyn Write) -> Result<(), CodecError> {
        (self.encode)(entity, w)
    }

    pub fn decode(&self, r: &mut dyn Read) -> Result<E, CodecError> {
        (self.decode)(r)
    }

    /// The 32-bit fingerprint of this schema's declared type ids, stored in
    /// the table header and checked on every open.
    #[must_use]
    pub fn schema_fingerprint(&self) -> u32 {
        codec::schema_fingerprint(&self.type_ids)
    }

    /// The maximum number of live rows this table accepts, if one was
    /// declared via [`Mapper::quota`].
    #[must_use]
    pub fn row_quota(&self) -> Option<u64> {
        self.row_quota
    }

    #[must_use]
    pub fn declared_type_ids(&self) -> &[i32] {
        &self.type_ids
    }
}

/// Builds a [`TableSchema<E>`] step by step. Every method consumes and
/// returns `self` so a schema reads as one declarative chain:
///
/// ```rust,ignore
/// let schema = Mapper::new("people")
///     .key(|p: &Person| PrimaryKey::I32(p.id))
///     .with_index("surname", Comparator::OrdinalIgnoreCase, |p| IndexValue::Str(p.surname.clone()))
///     .codec(encode_person, decode_person)
///     .declare_types(&[ids::I32, ids::STRING])
///     .build()?;
/// ```
pub struct Mapper<E> {
    name: String,
    key: Option<Arc<KeyFn<E>>>,
    indexes: Vec<IndexDef<E>>,
    encode: Option<Arc<EncodeFn<E>>>,
    decode: Option<Arc<DecodeFn<E>>>,
    type_ids: Vec<i32>,
    row_quota: Option<u64>,
}

impl<E> Mapper<E> {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            key: None,
            indexes: Vec::new(),
            encode: None,
            decode: None,
            type_ids: Vec::new(),
            row_quota: None,
        }
    }

    /// Caps the table at `max_rows` live rows; a `save` that would create a
    /// new row beyond the cap fails with `QuotaExceeded` instead of growing
    /// the data stream further. Unset by default (unlimited).
    #[must_use]
    pub fn quota(mut self, max_rows: u64) -> Self {
        self.row_quota = Some(max_rows);
        self
    }

    /// Registers the primary key extractor. Required before [`build`](Self::build).
    #[must_use]
    pub fn key<F>(mut self, f: F) -> Self
    where
        F: Fn(&E) -> PrimaryKey + Send + Sync + 'static,
    {
        self.key = Some(Arc::new(f));
        self
    }

    /// Registers a secondary index under `name`, ordered by `comparator`,
    /// projecting each entity through `f`.
    #[must_use]
    pub fn with_index<F>(mut self, name: impl Into<String>, comparator: Comparator, f: F) -> Self
    where
        F: Fn(&E) -> IndexValue + Send + Sync + 'static,
    {
        self.indexes.push(IndexDef {
            name: name.into(),
            comparator,
            extract: Arc::new(f),
        });
        self
    }

    /// Registers the entity's byte encoding. Required before [`build`](Self::build).
    #[must_use]
    pub fn codec<En, De>(mut self, encode: En, decode: De) -> Self
    where
        En: Fn(&E, &mut dyn Write) -> Result<(), CodecError> + Send + Sync + 'static,
        De: Fn(&mut dyn Read) -> Result<E, CodecError> + Send + Sync + 'static,
    {
        self.encode = Some(Arc::new(encode));
        self.decode = Some(Arc::new(decode));
        self
    }

    /// Declares the type ids that make up this entity's on-disk shape, in
    /// the order they're encoded. Required before [`build`](Self::build); used
    /// to compute [`TableSchema::schema_fingerprint`].
    #[must_use]
    pub fn declare_types(mut self, type_ids: &[i32]) -> Self {
        self.type_ids = type_ids.to_vec();
        self
    }

    /// Consumes the builder, validating that a key and codec were
    /// registered and that no two indexes share a name.
    pub fn build(self) -> Result<TableSchema<E>, ConfigError> {
        let key = self.key.ok_or_else(|| ConfigError::MissingKey(self.name.clone()))?;
        let (encode, decode) = match (self.encode, self.decode) {
            (Some(e), Some(d)) => (e, d),
            _ => return Err(ConfigError::MissingCodec(self.name.clone())),
        };
        if self.type_ids.is_empty() {
            return Err(ConfigError::EmptyTypeDeclaration(self.name.clone()));
        }

        let mut seen = std::collections::HashSet::new();
        for idx in &self.indexes {
            if !seen.insert(idx.name.clone()) {
                return Err(ConfigError::DuplicateIndex(self.name.clone(), idx.name.clone()));
            }
        }

        Ok(TableSchema {
            name: self.name,
            key,
            indexes: self.indexes,
            encode,
            decode,
            type_ids: self.type_ids,
            row_quota: self.row_quota,
        })
    }
}

/// Re-exported so callers building a `declare_types` list don't need a
/// direct `codec` dependency just for the id constants.
pub use ids as type_ids;
