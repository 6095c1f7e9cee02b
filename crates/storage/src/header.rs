//! The index stream's on-disk layout: a small fixed header followed by the
//! free list, the primary directory, and the secondary indexes (delegated to
//! [`directory::blob`]).
//!
//! ```text
//! [magic: u32 LE = "IDX1"] [version: u16 LE] [schema fingerprint: u32 LE]
//! [data stream end: u64 LE]
//! [free slot count: u32 LE] [free slots: (offset: u64, length: u64)*]
//! [primary directory]   (directory::blob::write_primary)
//! [secondary index count: u32 LE]
//! [secondary indexes]*  (directory::blob::write_secondary)
//! ```
use std::io::{Read, Write};

use alloc::{FreeList, Slot};
use codec::{CodecError, Reader, Writer};
use directory::{read_primary, read_secondary, write_primary, write_secondary, PrimaryDirectory, SecondaryIndex};

/// Magic number identifying an index stream file (ASCII "IDX1").
pub const INDEX_MAGIC: u32 = 0x4944_5831;

/// Current index stream format version (spec §6: 2 bytes).
pub const INDEX_VERSION: u16 = 1;

/// Everything persisted in the index stream, decoded into memory.
pub struct IndexImage {
    pub schema_fingerprint: u32,
    pub free_list: FreeList,
    pub primary: PrimaryDirectory,
    pub secondary: Vec<(String, SecondaryIndex)>,
}

/// Writes a complete index image.
pub fn write_index<W: Write>(w: &mut Writer<W>, image: &IndexImage) -> Result<(), CodecError> {
    w.write_u32(INDEX_MAGIC)?;
    w.write_u16(INDEX_VERSION)?;
    w.write_u32(image.schema_fingerprint)?;
    w.write_u64(image.free_list.end())?;

    let free_slots = image.free_list.free_slots();
    w.write_u32(free_slots.len() as u32)?;
    for slot in free_slots {
        w.write_u64(slot.offset)?;
        w.write_u64(slot.length)?;
    }

    write_primary(w, &image.primary)?;

    w.write_u32(image.secondary.len() as u32)?;
    for (name, index) in &image.secondary {
        write_secondary(w, name, index)?;
    }

    Ok(())
}

/// Reads back a complete index image, verifying the magic number and
/// rejecting a version this crate does not understand.
pub fn read_index<R: Read>(r: &mut Reader<R>) -> Result<IndexImage, CodecError> {
    let magic = r.read_u32()?;
    if magic != INDEX_MAGIC {
        return Err(CodecError::Corrupt(format!(
            "bad index stream magic: expected {:#x}, found {:#x}",
            INDEX_MAGIC, magic
        )));
    }
    let version = r.read_u16()?;
    if version != INDEX_VERSION {
        return Err(CodecError::Corrupt(format!(
            "unsupported index stream version {}",
            version
        )));
    }

    let schema_fingerprint = r.read_u32()?;
    let end = r.read_u64()?;

    let free_count = r.read_u32()?;
    let mut free_slots = Vec::with_capacity(free_count as usize);
    for _ in 0..free_count {
        let offset = r.read_u64()?;
        let length = r.read_u64()?;
        free_slots.push(Slot::new(offset, length));
    }
    let free_list = FreeList::from_parts(end, free_slots);

    let primary = read_primary(r)?;

    let secondary_count = r.read_u32()?;
    let mut secondary = Vec::with_capacity(secondary_count as usize);
    for _ in 0..secondary_count {
        secondary.push(read_secondary(r)?);
    }

    Ok(IndexImage {
        schema_fingerprint,
        free_list,
        primary,
        secondary,
    })
}
