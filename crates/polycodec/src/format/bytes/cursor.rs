// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Little-endian write helpers and the bounds-checked read cursor.

use crate::error::{Error, Result};

/// Generate little-endian append methods for primitive types.
macro_rules! impl_write_le {
    ($name:ident, $type:ty) => {
        pub(crate) fn $name(out: &mut Vec<u8>, value: $type) {
            out.extend_from_slice(&value.to_le_bytes());
        }
    };
}

impl_write_le!(write_u8, u8);
impl_write_le!(write_u16, u16);
impl_write_le!(write_u32, u32);
impl_write_le!(write_u64, u64);
impl_write_le!(write_i8, i8);
impl_write_le!(write_i16, i16);
impl_write_le!(write_i32, i32);
impl_write_le!(write_i64, i64);
impl_write_le!(write_f32, f32);
impl_write_le!(write_f64, f64);

/// Write a `u32` element count.
pub(crate) fn write_len(out: &mut Vec<u8>, len: usize) -> Result<()> {
    let len = u32::try_from(len)
        .map_err(|_| Error::unsupported("bytes", format!("length {} exceeds u32", len)))?;
    write_u32(out, len);
    Ok(())
}

/// Write a length-prefixed UTF-8 string.
pub(crate) fn write_str(out: &mut Vec<u8>, value: &str) -> Result<()> {
    write_len(out, value.len())?;
    out.extend_from_slice(value.as_bytes());
    Ok(())
}

/// Generate bounds-checked little-endian read methods.
macro_rules! impl_read_le {
    ($name:ident, $type:ty, $size:expr) => {
        pub fn $name(&mut self) -> Result<$type> {
            let mut bytes = [0u8; $size];
            bytes.copy_from_slice(self.read_bytes($size)?);
            Ok(<$type>::from_le_bytes(bytes))
        }
    };
}

/// Owned read cursor over an encoded buffer.
#[derive(Debug, Clone, Default)]
pub struct ByteInput {
    buffer: Vec<u8>,
    offset: usize,
}

impl ByteInput {
    pub fn new(buffer: Vec<u8>) -> Self {
        Self { buffer, offset: 0 }
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn remaining(&self) -> usize {
        self.buffer.len().saturating_sub(self.offset)
    }

    pub fn is_exhausted(&self) -> bool {
        self.remaining() == 0
    }

    impl_read_le!(read_u8, u8, 1);
    impl_read_le!(read_u16, u16, 2);
    impl_read_le!(read_u32, u32, 4);
    impl_read_le!(read_u64, u64, 8);
    impl_read_le!(read_i8, i8, 1);
    impl_read_le!(read_i16, i16, 2);
    impl_read_le!(read_i32, i32, 4);
    impl_read_le!(read_i64, i64, 8);
    impl_read_le!(read_f32, f32, 4);
    impl_read_le!(read_f64, f64, 8);

    pub fn read_bytes(&mut self, len: usize) -> Result<&[u8]> {
        let end = self
            .offset
            .checked_add(len)
            .filter(|end| *end <= self.buffer.len())
            .ok_or_else(|| {
                Error::malformed(format!(
                    "unexpected end of input at offset {} (need {} bytes, {} left)",
                    self.offset,
                    len,
                    self.remaining()
                ))
            })?;
        let slice = &self.buffer[self.offset..end];
        self.offset = end;
        Ok(slice)
    }

    /// Read a `u32` element count. Every element takes at least one byte, so
    /// a count larger than the remaining input is rejected before anything is
    /// allocated.
    pub fn read_len(&mut self) -> Result<usize> {
        let offset = self.offset;
        let len = self.read_u32()? as usize;
        if len > self.remaining() {
            return Err(Error::malformed(format!(
                "count {} at offset {} exceeds the {} bytes left",
                len,
                offset,
                self.remaining()
            )));
        }
        Ok(len)
    }

    /// Read the padding byte written for a value with no content.
    pub fn read_padding(&mut self) -> Result<()> {
        let offset = self.offset;
        match self.read_u8()? {
            0 => Ok(()),
            other => Err(Error::malformed(format!(
                "invalid padding 0x{:02x} at offset {}",
                other, offset
            ))),
        }
    }

    /// Read a length-prefixed UTF-8 string.
    pub fn read_string(&mut self) -> Result<String> {
        let len = self.read_len()?;
        let offset = self.offset;
        let bytes = self.read_bytes(len)?;
        std::str::from_utf8(bytes)
            .map(str::to_string)
            .map_err(|e| Error::malformed(format!("invalid UTF-8 at offset {}: {}", offset, e)))
    }

    /// Read a one-byte flag that must be 0 or 1.
    pub fn read_flag(&mut self, what: &str) -> Result<bool> {
        let offset = self.offset;
        match self.read_u8()? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(Error::malformed(format!(
                "invalid {} marker 0x{:02x} at offset {}",
                what, other, offset
            ))),
        }
    }
}

impl From<Vec<u8>> for ByteInput {
    fn from(buffer: Vec<u8>) -> Self {
        Self::new(buffer)
    }
}

impl From<&[u8]> for ByteInput {
    fn from(buffer: &[u8]) -> Self {
        Self::new(buffer.to_vec())
    }
}

impl<const N: usize> From<&[u8; N]> for ByteInput {
    fn from(buffer: &[u8; N]) -> Self {
        Self::new(buffer.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cursor_read_write() {
        let mut out = Vec::new();
        write_u8(&mut out, 0xAB);
        write_u32(&mut out, 0x1234_5678);
        write_i16(&mut out, -2);
        write_f64(&mut out, 2.5);
        write_str(&mut out, "héllo").unwrap();

        let mut input = ByteInput::from(out);
        assert_eq!(input.read_u8().unwrap(), 0xAB);
        assert_eq!(input.read_u32().unwrap(), 0x1234_5678);
        assert_eq!(input.read_i16().unwrap(), -2);
        assert_eq!(input.read_f64().unwrap(), 2.5);
        assert_eq!(input.read_string().unwrap(), "héllo");
        assert!(input.is_exhausted());
    }

    #[test]
    fn test_cursor_bounds_check() {
        let mut input = ByteInput::from(&[0x01, 0x02]);
        assert!(input.read_u32().is_err());
        assert_eq!(input.offset(), 0);
        assert_eq!(input.read_u16().unwrap(), 0x0201);
        assert!(matches!(
            input.read_u8(),
            Err(Error::MalformedRepresentation(_))
        ));
    }

    #[test]
    fn test_string_length_overflow() {
        let mut input = ByteInput::from(&[0xff, 0xff, 0xff, 0xff, b'a']);
        assert!(input.read_string().is_err());
    }

    #[test]
    fn test_count_bounded_by_remaining_input() {
        let mut input = ByteInput::from(&[3, 0, 0, 0, 0xaa, 0xbb]);
        assert!(matches!(
            input.read_len(),
            Err(Error::MalformedRepresentation(_))
        ));

        let mut input = ByteInput::from(&[2, 0, 0, 0, 0xaa, 0xbb]);
        assert_eq!(input.read_len().unwrap(), 2);
    }

    #[test]
    fn test_padding_must_be_zero() {
        assert!(ByteInput::from(&[0]).read_padding().is_ok());
        assert!(ByteInput::from(&[7]).read_padding().is_err());
    }

    #[test]
    fn test_invalid_flag() {
        let mut input = ByteInput::from(&[0x02]);
        assert!(input.read_flag("null").is_err());
    }
}
