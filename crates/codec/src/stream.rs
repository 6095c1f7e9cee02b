/// Typed reader/writer pair over any `Read`/`Write` implementor.
///
/// Mirrors the wire framing style used throughout this codebase: fixed-width
/// little-endian integers via `byteorder`, u32-length-prefixed strings and
/// byte blobs, and a small set of composite helpers (arrays, maps) built out
/// of those primitives rather than a separate grammar.
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::{Read, Write};

use crate::CodecError;

/// Safety cap on any single length-prefixed blob this codec will allocate
/// for, to avoid an OOM on a corrupt or adversarial length prefix.
const MAX_BLOB_BYTES: u32 = 64 * 1024 * 1024;

/// Writes primitive and composite values in the on-disk byte order.
pub struct Writer<W: Write> {
    inner: W,
}

impl<W: Write> Writer<W> {
    /// Wraps `inner` for writing.
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    /// Unwraps the writer, returning the underlying sink.
    pub fn into_inner(self) -> W {
        self.inner
    }

    pub fn write_bool(&mut self, v: bool) -> Result<(), CodecError> {
        Ok(self.inner.write_u8(if v { 1 } else { 0 })?)
    }

    pub fn write_u8(&mut self, v: u8) -> Result<(), CodecError> {
        Ok(self.inner.write_u8(v)?)
    }

    pub fn write_i8(&mut self, v: i8) -> Result<(), CodecError> {
        Ok(self.inner.write_i8(v)?)
    }

    pub fn write_u16(&mut self, v: u16) -> Result<(), CodecError> {
        Ok(self.inner.write_u16::<LittleEndian>(v)?)
    }

    pub fn write_i16(&mut self, v: i16) -> Result<(), CodecError> {
        Ok(self.inner.write_i16::<LittleEndian>(v)?)
    }

    pub fn write_u32(&mut self, v: u32) -> Result<(), CodecError> {
        Ok(self.inner.write_u32::<LittleEndian>(v)?)
    }

    pub fn write_i32(&mut self, v: i32) -> Result<(), CodecError> {
        Ok(self.inner.write_i32::<LittleEndian>(v)?)
    }

    pub fn write_u64(&mut self, v: u64) -> Result<(), CodecError> {
        Ok(self.inner.write_u64::<LittleEndian>(v)?)
    }

    pub fn write_i64(&mut self, v: i64) -> Result<(), CodecError> {
        Ok(self.inner.write_i64::<LittleEndian>(v)?)
    }

    pub fn write_f32(&mut self, v: f32) -> Result<(), CodecError> {
        Ok(self.inner.write_f32::<LittleEndian>(v)?)
    }

    pub fn write_f64(&mut self, v: f64) -> Result<(), CodecError> {
        Ok(self.inner.write_f64::<LittleEndian>(v)?)
    }

    /// Writes raw bytes with no length prefix. Callers that need to recover
    /// the length on read should use [`write_bytes`](Self::write_bytes).
    pub fn write_raw(&mut self, bytes: &[u8]) -> Result<(), CodecError> {
        Ok(self.inner.write_all(bytes)?)
    }

    /// Writes a `u32` length prefix followed by the raw bytes.
    pub fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), CodecError> {
        self.write_u32(bytes.len() as u32)?;
        self.write_raw(bytes)
    }

    /// Writes a length-prefixed UTF-8 string.
    pub fn write_str(&mut self, s: &str) -> Result<(), CodecError> {
        self.write_bytes(s.as_bytes())
    }
}

/// Reads primitive and composite values in the on-disk byte order.
pub struct Reader<R: Read> {
    inner: R,
}

impl<R: Read> Reader<R> {
    /// Wraps `inner` for reading.
    pub fn new(inner: R) -> Self {
        Self { inner }
    }

    pub fn read_bool(&mut self) -> Result<bool, CodecError> {
        Ok(self.inner.read_u8()? != 0)
    }

    pub fn read_u8(&mut self) -> Result<u8, CodecError> {
        Ok(self.inner.read_u8()?)
    }

    pub fn read_i8(&mut self) -> Result<i8, CodecError> {
        Ok(self.inner.read_i8()?)
    }

    pub fn read_u16(&mut self) -> Result<u16, CodecError> {
        Ok(self.inner.read_u16::<LittleEndian>()?)
    }

    pub fn read_i16(&mut self) -> Result<i16, CodecError> {
        Ok(self.inner.read_i16::<LittleEndian>()?)
    }

    pub fn read_u32(&mut self) -> Result<u32, CodecError> {
        Ok(self.inner.read_u32::<LittleEndian>()?)
    }

    pub fn read_i32(&mut self) -> Result<i32, CodecError> {
        Ok(self.inner.read_i32::<LittleEndian>()?)
    }

    pub fn read_u64(&mut self) -> Result<u64, CodecError> {
        Ok(self.inner.read_u64::<LittleEndian>()?)
    }

    pub fn read_i64(&mut self) -> Result<i64, CodecError> {
        Ok(self.inner.read_i64::<LittleEndian>()?)
    }

    pub fn read_f32(&mut self) -> Result<f32, CodecError> {
        Ok(self.inner.read_f32::<LittleEndian>()?)
    }

    pub fn read_f64(&mut self) -> Result<f64, CodecError> {
        Ok(self.inner.read_f64::<LittleEndian>()?)
    }

    /// Reads exactly `len` raw bytes.
    pub fn read_raw(&mut self, len: usize) -> Result<Vec<u8>, CodecError> {
        let mut buf = vec![0u8; len];
        self.inner.read_exact(&mut buf)?;
        Ok(buf)
    }

    /// Reads a `u32` length prefix followed by that many raw bytes.
    ///
    /// Rejects a length prefix above [`MAX_BLOB_BYTES`] as corruption rather
    /// than attempting to allocate it — a corrupt or truncated length prefix
    /// should never be able to drive an OOM.
    pub fn read_bytes(&mut self) -> Result<Vec<u8>, CodecError> {
        let len = self.read_u32()?;
        if len > MAX_BLOB_BYTES {
            return Err(CodecError::Corrupt(format!(
                "length prefix {} exceeds maximum {}",
                len, MAX_BLOB_BYTES
            )));
        }
        self.read_raw(len as usize)
    }

    /// Reads a length-prefixed UTF-8 string.
    pub fn read_str(&mut self) -> Result<String, CodecError> {
        let bytes = self.read_bytes()?;
        String::from_utf8(bytes).map_err(|e| CodecError::Corrupt(format!("invalid utf-8: {}", e)))
    }
}

impl<R: Read> Reader<R> {
    /// Unwraps the reader, returning the underlying source.
    pub fn into_inner(self) -> R {
        self.inner
    }
}
