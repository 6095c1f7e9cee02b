/// Type-id registry: assigns a stable small integer to every supported
/// scalar/composite shape, and lets callers register additional
/// user-defined element types under ids `>= 2000`.
///
/// Ids are persisted in the table header (see `directory`) so that a table
/// opened later can detect a schema change before it tries to parse bytes
/// written under a different shape.
use std::any::Any;
use std::collections::HashMap;
use std::io::{Read, Write};
use std::sync::Arc;

use crate::{CodecError, Reader, Writer};

/// Reserved built-in type ids (spec §6). Ids `< 2000` are reserved; user
/// registrations must use `>= 2000`.
pub mod ids {
    pub const STRING: i32 = 0;
    pub const BYTE: i32 = 1;
    pub const I32: i32 = 2;
    pub const BOOL: i32 = 3;
    pub const F32: i32 = 4;
    pub const F64: i32 = 5;
    pub const DECIMAL: i32 = 6;
    pub const UUID: i32 = 7;
    pub const DATETIME: i32 = 8;
    pub const TIMESPAN: i32 = 9;
    pub const I64: i32 = 10;
    pub const DATETIME_OFFSET: i32 = 11;
    pub const URI: i32 = 12;
    pub const URI_BUILDER: i32 = 13;
    pub const STRING_BUILDER: i32 = 14;
    pub const I8: i32 = 15;
    pub const I16: i32 = 16;
    pub const U16: i32 = 17;
    pub const U32: i32 = 18;
    pub const U64: i32 = 19;
    pub const LIST: i32 = -1;
    pub const DICT: i32 = -2;

    /// The smallest id a user registration may use; everything below this
    /// is reserved for built-ins (present or future).
    pub const USER_RANGE_START: i32 = 2000;

    /// The full set of built-in ids, used to validate user registrations
    /// and to compute schema fingerprints for built-in-only schemas.
    pub const BUILTINS: &[i32] = &[
        STRING, BYTE, I32, BOOL, F32, F64, DECIMAL, UUID, DATETIME, TIMESPAN, I64,
        DATETIME_OFFSET, URI, URI_BUILDER, STRING_BUILDER, I8, I16, U16, U32, U64, LIST, DICT,
    ];
}

type ReadFn = dyn Fn(&mut dyn Read) -> Result<Box<dyn Any + Send + Sync>, CodecError> + Send + Sync;
type WriteFn = dyn Fn(&(dyn Any + Send + Sync), &mut dyn Write) -> Result<(), CodecError> + Send + Sync;

struct UserType {
    read: Arc<ReadFn>,
    write: Arc<WriteFn>,
}

/// Process-wide registry of user-defined element types.
///
/// Registrations are only accepted before [`TypeRegistry::freeze`] is called
/// (spec §9: "mutable global type registry → process-wide registry with
/// init-only writes"). Schema building happens once at startup; after
/// `initialize` nothing should be able to add new shapes out from under a
/// table that has already verified its schema fingerprint.
pub struct TypeRegistry {
    user_types: HashMap<i32, UserType>,
    frozen: bool,
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeRegistry {
    /// Creates an empty registry with only the built-in ids known.
    pub fn new() -> Self {
        Self {
            user_types: HashMap::new(),
            frozen: false,
        }
    }

    /// Registers a user-defined element type under `id`.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::InvalidTypeId`] if `id` falls in the reserved
    /// built-in range (`< 2000`) or is already registered, and
    /// [`CodecError::RegistryFrozen`] if called after [`freeze`](Self::freeze).
    pub fn register_user<F, G>(&mut self, id: i32, read: F, write: G) -> Result<(), CodecError>
    where
        F: Fn(&mut dyn Read) -> Result<Box<dyn Any + Send + Sync>, CodecError> + Send + Sync + 'static,
        G: Fn(&(dyn Any + Send + Sync), &mut dyn Write) -> Result<(), CodecError> + Send + Sync + 'static,
    {
        if self.frozen {
            return Err(CodecError::RegistryFrozen);
        }
        if id < ids::USER_RANGE_START {
            return Err(CodecError::InvalidTypeId(
                id,
                "ids below 2000 are reserved for built-in types",
            ));
        }
        if self.user_types.contains_key(&id) {
            return Err(CodecError::InvalidTypeId(id, "type id already registered"));
        }
        self.user_types.insert(
            id,
            UserType {
                read: Arc::new(read),
                write: Arc::new(write),
            },
        );
        Ok(())
    }

    /// Returns `true` if `id` is a reserved built-in id.
    #[must_use]
    pub fn is_builtin(id: i32) -> bool {
        ids::BUILTINS.contains(&id)
    }

    /// Returns `true` if `id` is known to this registry (built-in or
    /// user-registered).
    #[must_use]
    pub fn is_known(&self, id: i32) -> bool {
        Self::is_builtin(id) || self.user_types.contains_key(&id)
    }

    /// Decodes a value of the user type registered under `id`.
    pub fn decode_user(&self, id: i32, r: &mut dyn Read) -> Result<Box<dyn Any + Send + Sync>, CodecError> {
        let entry = self.user_types.get(&id).ok_or(CodecError::UnknownType(id))?;
        (entry.read)(r)
    }

    /// Encodes a value of the user type registered under `id`.
    pub fn encode_user(
        &self,
        id: i32,
        value: &(dyn Any + Send + Sync),
        w: &mut dyn Write,
    ) -> Result<(), CodecError> {
        let entry = self.user_types.get(&id).ok_or(CodecError::UnknownType(id))?;
        (entry.write)(value, w)
    }

    /// Freezes the registry: no further [`register_user`](Self::register_user)
    /// calls will succeed. Called once schema building completes.
    pub fn freeze(&mut self) {
        self.frozen = true;
    }

    /// Returns `true` once [`freeze`](Self::freeze) has been called.
    #[must_use]
    pub fn is_frozen(&self) -> bool {
        self.frozen
    }
}

/// Computes the schema fingerprint stored in a table header: a 32-bit hash
/// of the declared type ids, in declaration order.
///
/// Two schemas with the same type ids in the same order produce the same
/// fingerprint; a table opened against a schema whose fingerprint disagrees
/// with the one stored on disk raises `SchemaMismatch` (see `directory`).
#[must_use]
pub fn schema_fingerprint(type_ids: &[i32]) -> u32 {
    let mut buf = Vec::with_capacity(type_ids.len() * 4);
    let mut w = Writer::new(&mut buf);
    for &id in type_ids {
        // infallible: writing into a Vec<u8> never errors
        w.write_i32(id).expect("in-memory write cannot fail");
    }
    crate::hash::fingerprint(&buf)
}

/// Convenience: read a type-id list back out (used when parsing the table
/// header's declared-type section).
pub fn read_type_ids<R: Read>(r: &mut Reader<R>, count: usize) -> Result<Vec<i32>, CodecError> {
    let mut out = Vec::with_capacity(count);
    for _ in 0..count {
        out.push(r.read_i32()?);
    }
    Ok(out)
}
