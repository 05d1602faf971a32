// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Array, collection and map composition.

use super::CodecHandle;
use crate::config::{CollectionSizing, Growth};
use crate::core::CodecCore;
use crate::error::{Error, Result};
use crate::format::CodecFormat;
use crate::reflect::{AnyValue, MapInfo, ScalarKind, SequenceInfo, Shape, TypeInfo, TypeKey};

/// Decode buffer honouring the configured pre-allocation and growth policy.
pub struct ElementBuffer<T> {
    items: Vec<T>,
    growth: Growth,
}

impl<T> ElementBuffer<T> {
    pub fn new(sizing: CollectionSizing, declared: Option<usize>) -> Self {
        Self {
            items: Vec::with_capacity(sizing.initial_capacity(declared)),
            growth: sizing.growth,
        }
    }

    pub fn push(&mut self, item: T) {
        if self.items.len() == self.items.capacity() {
            let target = self.growth.next_capacity(self.items.capacity());
            self.items.reserve_exact(target - self.items.len());
        }
        self.items.push(item);
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.items.capacity()
    }

    pub fn into_vec(self) -> Vec<T> {
        self.items
    }
}

/// Element codec and shape accessors of an array or collection type.
pub struct CollectionMeta<F: CodecFormat> {
    key: TypeKey,
    element: CodecHandle<F>,
    element_key: TypeKey,
    seq: SequenceInfo,
    sizing: CollectionSizing,
}

impl<F: CodecFormat> CollectionMeta<F> {
    pub(crate) fn resolve(core: &CodecCore<F>, info: &TypeInfo, seq: SequenceInfo) -> Result<Self> {
        let element_info = (seq.element)();
        let element = core.codec_for(&element_info)?;
        Ok(Self {
            key: info.key(),
            element,
            element_key: element_info.key(),
            seq,
            sizing: core.config().sizing(),
        })
    }

    pub fn type_key(&self) -> TypeKey {
        self.key
    }

    pub fn element(&self) -> &CodecHandle<F> {
        &self.element
    }

    pub fn element_key(&self) -> TypeKey {
        self.element_key
    }

    /// Element count required by a fixed-length array.
    pub fn fixed_len(&self) -> Option<usize> {
        self.seq.fixed_len
    }

    /// Borrow the elements of `value` in iteration order.
    pub fn items<'a>(&self, value: &'a dyn AnyValue) -> Result<Vec<&'a dyn AnyValue>> {
        (self.seq.items)(value.as_any()).ok_or_else(|| Error::TypeMismatch {
            expected: self.key.name().to_string(),
            found: value.value_type_name().to_string(),
        })
    }

    /// Buffer for decoding `declared` elements (if known).
    pub fn buffer(&self, declared: Option<usize>) -> ElementBuffer<Box<dyn AnyValue>> {
        ElementBuffer::new(self.sizing, declared)
    }

    pub fn decode_element(&self, core: &CodecCore<F>, input: &mut F::In) -> Result<Box<dyn AnyValue>> {
        self.element.decode_with_check(core, input)
    }

    /// Build the collection from decoded elements.
    pub fn finish(&self, buffer: ElementBuffer<Box<dyn AnyValue>>) -> Result<Box<dyn AnyValue>> {
        if let Some(expected) = self.seq.fixed_len {
            if buffer.len() != expected {
                return Err(Error::malformed(format!(
                    "{} expects {} elements, found {}",
                    self.key.name(),
                    expected,
                    buffer.len()
                )));
            }
        }
        (self.seq.build)(buffer.into_vec())
    }
}

/// Key/value codecs and shape accessors of a map type.
pub struct MapMeta<F: CodecFormat> {
    key_type: TypeKey,
    map_type: TypeKey,
    key: CodecHandle<F>,
    value: CodecHandle<F>,
    string_keys: bool,
    map: MapInfo,
    sizing: CollectionSizing,
}

impl<F: CodecFormat> MapMeta<F> {
    pub(crate) fn resolve(core: &CodecCore<F>, info: &TypeInfo, map: MapInfo) -> Result<Self> {
        let key_info = (map.key)();
        let value_info = (map.value)();
        let string_keys = matches!(
            key_info.shape(),
            Shape::Scalar(s) if s.kind == ScalarKind::String
        );
        Ok(Self {
            key_type: key_info.key(),
            map_type: info.key(),
            key: core.codec_for(&key_info)?,
            value: core.codec_for(&value_info)?,
            string_keys,
            map,
            sizing: core.config().sizing(),
        })
    }

    pub fn type_key(&self) -> TypeKey {
        self.map_type
    }

    pub fn key_type(&self) -> TypeKey {
        self.key_type
    }

    /// Keys are plain `String`s: formats with a native field-name type may
    /// write them directly instead of going through the key codec.
    pub fn has_string_keys(&self) -> bool {
        self.string_keys
    }

    pub fn key_codec(&self) -> &CodecHandle<F> {
        &self.key
    }

    pub fn value_codec(&self) -> &CodecHandle<F> {
        &self.value
    }

    /// Borrow the entries of `value`.
    pub fn entries<'a>(&self, value: &'a dyn AnyValue) -> Result<Vec<(&'a dyn AnyValue, &'a dyn AnyValue)>> {
        (self.map.entries)(value.as_any()).ok_or_else(|| Error::TypeMismatch {
            expected: self.map_type.name().to_string(),
            found: value.value_type_name().to_string(),
        })
    }

    /// Read a string key directly (only valid when [`Self::has_string_keys`]).
    pub fn string_key<'a>(&self, key: &'a dyn AnyValue) -> Result<&'a str> {
        key.as_any()
            .downcast_ref::<String>()
            .map(String::as_str)
            .ok_or_else(|| Error::TypeMismatch {
                expected: "String".to_string(),
                found: key.value_type_name().to_string(),
            })
    }

    pub fn buffer(
        &self,
        declared: Option<usize>,
    ) -> ElementBuffer<(Box<dyn AnyValue>, Box<dyn AnyValue>)> {
        ElementBuffer::new(self.sizing, declared)
    }

    pub fn finish(
        &self,
        buffer: ElementBuffer<(Box<dyn AnyValue>, Box<dyn AnyValue>)>,
    ) -> Result<Box<dyn AnyValue>> {
        (self.map.build)(buffer.into_vec())
    }
}
