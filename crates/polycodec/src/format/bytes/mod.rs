// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Compact positional binary format.
//!
//! Layout:
//! - primitives little-endian, `bool` as one byte, `char` as `u32`
//! - strings and collection/map counts prefixed with a `u32`
//! - fixed-length arrays without a count
//! - object fields in declaration order, no names
//! - an object with no fields or an empty array is one zero byte, so every
//!   value takes at least one byte and counts are bounded by the input
//! - null marker: one byte (1 = absent) before every optional value
//! - dynamic tag: one byte (1 = tagged) followed by the type name

mod cursor;

pub use cursor::ByteInput;

use super::CodecFormat;
use crate::codec::{Codec, CodecHandle, CollectionMeta, MapMeta, ObjectMeta};
use crate::core::CodecCore;
use crate::error::{Error, Result};
use crate::reflect::{AnyValue, Reflect, Scalar, ScalarKind, TypeKey};
use cursor::{
    write_f32, write_f64, write_i16, write_i32, write_i64, write_i8, write_len, write_str,
    write_u16, write_u32, write_u64, write_u8,
};
use std::sync::Arc;

/// Positional little-endian binary format.
#[derive(Debug, Clone, Copy, Default)]
pub struct ByteFormat;

impl ByteFormat {
    pub fn new() -> Self {
        Self
    }
}

impl CodecFormat for ByteFormat {
    type Out = Vec<u8>;
    type In = ByteInput;

    fn name(&self) -> &'static str {
        "bytes"
    }

    fn new_output(&self) -> Vec<u8> {
        Vec::new()
    }

    fn encode_null(&self, null: bool, out: &mut Vec<u8>) -> Result<()> {
        write_u8(out, u8::from(null));
        Ok(())
    }

    fn decode_null(&self, input: &mut ByteInput) -> Result<bool> {
        input.read_flag("null")
    }

    fn encode_scalar(&self, scalar: Scalar, out: &mut Vec<u8>) -> Result<()> {
        match scalar {
            Scalar::Bool(v) => write_u8(out, u8::from(v)),
            Scalar::I8(v) => write_i8(out, v),
            Scalar::I16(v) => write_i16(out, v),
            Scalar::I32(v) => write_i32(out, v),
            Scalar::I64(v) => write_i64(out, v),
            Scalar::U8(v) => write_u8(out, v),
            Scalar::U16(v) => write_u16(out, v),
            Scalar::U32(v) => write_u32(out, v),
            Scalar::U64(v) => write_u64(out, v),
            Scalar::F32(v) => write_f32(out, v),
            Scalar::F64(v) => write_f64(out, v),
            Scalar::Char(c) => write_u32(out, u32::from(c)),
            Scalar::String(s) => write_str(out, &s)?,
        }
        Ok(())
    }

    fn decode_scalar(&self, kind: ScalarKind, input: &mut ByteInput) -> Result<Scalar> {
        Ok(match kind {
            ScalarKind::Bool => Scalar::Bool(input.read_flag("bool")?),
            ScalarKind::I8 => Scalar::I8(input.read_i8()?),
            ScalarKind::I16 => Scalar::I16(input.read_i16()?),
            ScalarKind::I32 => Scalar::I32(input.read_i32()?),
            ScalarKind::I64 => Scalar::I64(input.read_i64()?),
            ScalarKind::U8 => Scalar::U8(input.read_u8()?),
            ScalarKind::U16 => Scalar::U16(input.read_u16()?),
            ScalarKind::U32 => Scalar::U32(input.read_u32()?),
            ScalarKind::U64 => Scalar::U64(input.read_u64()?),
            ScalarKind::F32 => Scalar::F32(input.read_f32()?),
            ScalarKind::F64 => Scalar::F64(input.read_f64()?),
            ScalarKind::Char => {
                let raw = input.read_u32()?;
                Scalar::Char(char::from_u32(raw).ok_or_else(|| {
                    Error::malformed(format!("0x{:x} is not a valid char", raw))
                })?)
            }
            ScalarKind::String => Scalar::String(input.read_string()?),
        })
    }

    fn encode_dynamic(
        &self,
        tag: Option<&str>,
        out: &mut Vec<u8>,
        body: &mut dyn FnMut(&mut Vec<u8>) -> Result<()>,
    ) -> Result<()> {
        match tag {
            Some(name) => {
                write_u8(out, 1);
                write_str(out, name)?;
            }
            None => write_u8(out, 0),
        }
        body(out)
    }

    fn decode_dynamic(&self, input: &mut ByteInput) -> Result<Option<String>> {
        if input.read_flag("type tag")? {
            Ok(Some(input.read_string()?))
        } else {
            Ok(None)
        }
    }

    fn object_codec(&self, meta: ObjectMeta<Self>) -> Result<CodecHandle<Self>> {
        Ok(Arc::new(ObjectCodec { meta }))
    }

    fn array_codec(&self, meta: CollectionMeta<Self>) -> Result<CodecHandle<Self>> {
        Ok(Arc::new(SequenceCodec { meta, counted: false }))
    }

    fn collection_codec(&self, meta: CollectionMeta<Self>) -> Result<CodecHandle<Self>> {
        Ok(Arc::new(SequenceCodec { meta, counted: true }))
    }

    fn map_codec(&self, meta: MapMeta<Self>) -> Result<CodecHandle<Self>> {
        Ok(Arc::new(MapCodec { meta }))
    }
}

struct ObjectCodec {
    meta: ObjectMeta<ByteFormat>,
}

impl Codec<ByteFormat> for ObjectCodec {
    fn type_key(&self) -> TypeKey {
        self.meta.type_key()
    }

    fn is_final(&self) -> bool {
        !self.meta.is_open()
    }

    fn encode(&self, core: &CodecCore<ByteFormat>, value: &dyn AnyValue, out: &mut Vec<u8>) -> Result<()> {
        self.meta.check_instance(value)?;
        if self.meta.fields().is_empty() {
            write_u8(out, 0);
        }
        for field in self.meta.fields() {
            field.encode(core, value, out)?;
        }
        Ok(())
    }

    fn decode(&self, core: &CodecCore<ByteFormat>, input: &mut ByteInput) -> Result<Box<dyn AnyValue>> {
        let mut acc = self.meta.accumulator()?;
        if self.meta.fields().is_empty() {
            input.read_padding()?;
        }
        for index in 0..self.meta.fields().len() {
            acc.decode_field(core, index, input)?;
        }
        acc.finish()
    }
}

struct SequenceCodec {
    meta: CollectionMeta<ByteFormat>,
    counted: bool,
}

impl Codec<ByteFormat> for SequenceCodec {
    fn type_key(&self) -> TypeKey {
        self.meta.type_key()
    }

    fn encode(&self, core: &CodecCore<ByteFormat>, value: &dyn AnyValue, out: &mut Vec<u8>) -> Result<()> {
        let items = self.meta.items(value)?;
        if self.counted {
            write_len(out, items.len())?;
        } else if items.is_empty() {
            write_u8(out, 0);
        }
        for item in items {
            self.meta.element().encode_with_check(core, item, out)?;
        }
        Ok(())
    }

    fn decode(&self, core: &CodecCore<ByteFormat>, input: &mut ByteInput) -> Result<Box<dyn AnyValue>> {
        let count = if self.counted {
            input.read_len()?
        } else {
            let len = self.meta.fixed_len().unwrap_or(0);
            if len == 0 {
                input.read_padding()?;
            }
            len
        };
        let mut buffer = self.meta.buffer(Some(count));
        for _ in 0..count {
            buffer.push(self.meta.decode_element(core, input)?);
        }
        self.meta.finish(buffer)
    }
}

struct MapCodec {
    meta: MapMeta<ByteFormat>,
}

impl Codec<ByteFormat> for MapCodec {
    fn type_key(&self) -> TypeKey {
        self.meta.type_key()
    }

    fn encode(&self, core: &CodecCore<ByteFormat>, value: &dyn AnyValue, out: &mut Vec<u8>) -> Result<()> {
        let entries = self.meta.entries(value)?;
        write_len(out, entries.len())?;
        for (key, value) in entries {
            self.meta.key_codec().encode_with_check(core, key, out)?;
            self.meta.value_codec().encode_with_check(core, value, out)?;
        }
        Ok(())
    }

    fn decode(&self, core: &CodecCore<ByteFormat>, input: &mut ByteInput) -> Result<Box<dyn AnyValue>> {
        let count = input.read_len()?;
        let mut buffer = self.meta.buffer(Some(count));
        for _ in 0..count {
            let key = self.meta.key_codec().decode_with_check(core, input)?;
            let value = self.meta.value_codec().decode_with_check(core, input)?;
            buffer.push((key, value));
        }
        self.meta.finish(buffer)
    }
}

impl CodecCore<ByteFormat> {
    /// Encode `value` to a byte vector.
    pub fn encode_to_vec<T: Reflect + AnyValue>(&self, value: &T) -> Result<Vec<u8>> {
        self.encode(value)
    }

    /// Decode a `T` from a byte slice. Trailing bytes are rejected.
    pub fn decode_from_slice<T: Reflect + AnyValue>(&self, bytes: &[u8]) -> Result<T> {
        let mut input = ByteInput::from(bytes);
        let value = self.decode_from(&mut input)?;
        if !input.is_exhausted() {
            return Err(Error::malformed(format!(
                "{} trailing bytes after value",
                input.remaining()
            )));
        }
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CodecConfig;

    fn core() -> CodecCore<ByteFormat> {
        CodecCore::new(ByteFormat::new(), CodecConfig::default())
    }

    #[test]
    fn test_scalar_layout() {
        let core = core();
        assert_eq!(core.encode_to_vec(&0x0102u16).unwrap(), vec![0x02, 0x01]);
        assert_eq!(core.encode_to_vec(&true).unwrap(), vec![1]);
        assert_eq!(
            core.encode_to_vec(&"ab".to_string()).unwrap(),
            vec![2, 0, 0, 0, b'a', b'b']
        );
    }

    #[test]
    fn test_null_marker() {
        let core = core();
        assert_eq!(core.encode_to_vec(&None::<u8>).unwrap(), vec![1]);
        assert_eq!(core.encode_to_vec(&Some(7u8)).unwrap(), vec![0, 7]);
        assert_eq!(core.decode_from_slice::<Option<u8>>(&[1]).unwrap(), None);
        assert_eq!(core.decode_from_slice::<Option<u8>>(&[0, 7]).unwrap(), Some(7));
    }

    #[test]
    fn test_array_has_no_count() {
        let core = core();
        let bytes = core.encode_to_vec(&[1u8, 2, 3]).unwrap();
        assert_eq!(bytes, vec![1, 2, 3]);
        assert_eq!(core.decode_from_slice::<[u8; 3]>(&bytes).unwrap(), [1, 2, 3]);
    }

    #[test]
    fn test_collection_count_prefix() {
        let core = core();
        let bytes = core.encode_to_vec(&vec![9u8, 8]).unwrap();
        assert_eq!(bytes, vec![2, 0, 0, 0, 9, 8]);
    }

    #[test]
    fn test_trailing_bytes_rejected() {
        let core = core();
        assert!(matches!(
            core.decode_from_slice::<u8>(&[1, 2]),
            Err(Error::MalformedRepresentation(_))
        ));
    }

    #[test]
    fn test_huge_count_fails_without_allocating() {
        let core = core();
        let result = core.decode_from_slice::<Vec<u64>>(&[0xff, 0xff, 0xff, 0x7f]);
        assert!(matches!(result, Err(Error::MalformedRepresentation(_))));
    }

    #[test]
    fn test_empty_array_is_padded() {
        let core = core();
        let bytes = core.encode_to_vec(&Vec::<[u8; 0]>::from([[], []])).unwrap();
        assert_eq!(bytes, vec![2, 0, 0, 0, 0, 0]);
        assert_eq!(core.decode_from_slice::<Vec<[u8; 0]>>(&bytes).unwrap().len(), 2);
        assert!(matches!(
            core.decode_from_slice::<Vec<[u8; 0]>>(&5_000_000u32.to_le_bytes()),
            Err(Error::MalformedRepresentation(_))
        ));
    }

    #[test]
    fn test_invalid_char() {
        let core = core();
        let bytes = 0xD800u32.to_le_bytes();
        assert!(core.decode_from_slice::<char>(&bytes).is_err());
    }
}
