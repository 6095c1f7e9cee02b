//! (De)serialization of the key directory to and from the index stream.
//!
//! The index stream holds, in order: the free list (written by `storage`,
//! not here), the primary directory, and each secondary index in schema
//! declaration order. This module only knows how to write/read that part of
//! the layout; `storage::session` owns the surrounding header (magic,
//! version, schema fingerprint) and the free-list section.

use std::io::{Read, Write};

use codec::{CodecError, Reader, Writer};

use crate::primary::{PrimaryDirectory, RecordLocation};
use crate::secondary::{Comparator, IndexValue, SecondaryIndex};
use crate::PrimaryKey;
use alloc::Slot;

fn pk_tag(pk: &PrimaryKey) -> u8 {
    match pk {
        PrimaryKey::I32(_) => 0,
        PrimaryKey::I64(_) => 1,
        PrimaryKey::Str(_) => 2,
        PrimaryKey::Bytes(_) => 3,
    }
}

fn write_primary_key<W: Write>(w: &mut Writer<W>, pk: &PrimaryKey) -> Result<(), CodecError> {
    w.write_u8(pk_tag(pk))?;
    match pk {
        PrimaryKey::I32(v) => w.write_i32(*v),
        PrimaryKey::I64(v) => w.write_i64(*v),
        PrimaryKey::Str(v) => w.write_str(v),
        PrimaryKey::Bytes(v) => w.write_bytes(v),
    }
}

fn read_primary_key<R: Read>(r: &mut Reader<R>) -> Result<PrimaryKey, CodecError> {
    match r.read_u8()? {
        0 => Ok(PrimaryKey::I32(r.read_i32()?)),
        1 => Ok(PrimaryKey::I64(r.read_i64()?)),
        2 => Ok(PrimaryKey::Str(r.read_str()?)),
        3 => Ok(PrimaryKey::Bytes(r.read_bytes()?)),
        other => Err(CodecError::Corrupt(format!("unknown primary key tag {}", other))),
    }
}

fn index_value_tag(v: &IndexValue) -> u8 {
    match v {
        IndexValue::Null => 0,
        IndexValue::Bool(_) => 1,
        IndexValue::I32(_) => 2,
        IndexValue::I64(_) => 3,
        IndexValue::Str(_) => 4,
    }
}

fn write_index_value<W: Write>(w: &mut Writer<W>, v: &IndexValue) -> Result<(), CodecError> {
    w.write_u8(index_value_tag(v))?;
    match v {
        IndexValue::Null => Ok(()),
        IndexValue::Bool(b) => w.write_bool(*b),
        IndexValue::I32(n) => w.write_i32(*n),
        IndexValue::I64(n) => w.write_i64(*n),
        IndexValue::Str(s) => w.write_str(s),
    }
}

fn read_index_value<R: Read>(r: &mut Reader<R>) -> Result<IndexValue, CodecError> {
    match r.read_u8()? {
        0 => Ok(IndexValue::Null),
        1 => Ok(IndexValue::Bool(r.read_bool()?)),
        2 => Ok(IndexValue::I32(r.read_i32()?)),
        3 => Ok(IndexValue::I64(r.read_i64()?)),
        4 => Ok(IndexValue::Str(r.read_str()?)),
        other => Err(CodecError::Corrupt(format!("unknown index value tag {}", other))),
    }
}

/// Writes the primary directory: entry count, then one
/// `(key, offset, length, fingerprint)` record per live row.
///
/// Slot length is written as `u32` (spec §6's layout table: `slot = (offset
/// u64, length u32)`); a single record's serialized size is bounded by
/// [`crate::blob`]'s length-prefixed fields anyway, so `u32` loses nothing in
/// practice.
pub fn write_primary<W: Write>(w: &mut Writer<W>, dir: &PrimaryDirectory) -> Result<(), CodecError> {
    w.write_u32(dir.len() as u32)?;
    for (key, loc) in dir.iter() {
        write_primary_key(w, key)?;
        w.write_u64(loc.slot.offset)?;
        w.write_u32(loc.slot.length as u32)?;
        w.write_u32(loc.fingerprint)?;
    }
    Ok(())
}

/// Reads back a primary directory written by [`write_primary`].
pub fn read_primary<R: Read>(r: &mut Reader<R>) -> Result<PrimaryDirectory, CodecError> {
    let count = r.read_u32()?;
    let mut dir = PrimaryDirectory::new();
    for _ in 0..count {
        let key = read_primary_key(r)?;
        let offset = r.read_u64()?;
        let length = u64::from(r.read_u32()?);
        let fingerprint = r.read_u32()?;
        dir.insert(key, RecordLocation::new(Slot::new(offset, length), fingerprint));
    }
    Ok(dir)
}

/// Writes one secondary index: its name, comparator, and every
/// `(value, primary key)` pair it currently holds.
pub fn write_secondary<W: Write>(w: &mut Writer<W>, name: &str, index: &SecondaryIndex) -> Result<(), CodecError> {
    w.write_str(name)?;
    w.write_u8(match index.comparator() {
        Comparator::Ordinal => 0,
        Comparator::OrdinalIgnoreCase => 1,
    })?;

    let pairs: Vec<(IndexValue, PrimaryKey)> = index
        .lookup_all_pairs()
        .collect();
    w.write_u32(pairs.len() as u32)?;
    for (value, pk) in pairs {
        write_index_value(w, &value)?;
        write_primary_key(w, &pk)?;
    }
    Ok(())
}

/// Reads back one secondary index written by [`write_secondary`].
pub fn read_secondary<R: Read>(r: &mut Reader<R>) -> Result<(String, SecondaryIndex), CodecError> {
    let name = r.read_str()?;
    let comparator = match r.read_u8()? {
        0 => Comparator::Ordinal,
        1 => Comparator::OrdinalIgnoreCase,
        other => return Err(CodecError::Corrupt(format!("unknown comparator tag {}", other))),
    };
    let mut index = SecondaryIndex::new(comparator);
    let count = r.read_u32()?;
    for _ in 0..count {
        let value = read_index_value(r)?;
        let pk = read_primary_key(r)?;
        index.insert(value, pk);
    }
    Ok((name, index))
}
