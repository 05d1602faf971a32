// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Leaf codecs: primitives and field-less enums.

use super::Codec;
use crate::core::CodecCore;
use crate::error::{Error, Result};
use crate::format::CodecFormat;
use crate::reflect::{AnyValue, EnumInfo, Scalar, ScalarInfo, TypeKey};

/// Primitive codec: moves a [`Scalar`] between the value and the format.
pub struct ScalarCodec {
    key: TypeKey,
    info: ScalarInfo,
}

impl ScalarCodec {
    pub fn new(key: TypeKey, info: ScalarInfo) -> Self {
        Self { key, info }
    }

    /// Read the primitive out of an erased value.
    pub fn scalar_of(&self, value: &dyn AnyValue) -> Result<Scalar> {
        (self.info.to_scalar)(value.as_any()).ok_or_else(|| Error::TypeMismatch {
            expected: self.key.name().to_string(),
            found: value.value_type_name().to_string(),
        })
    }

    /// Build the erased value back from a decoded primitive.
    pub fn value_of(&self, scalar: Scalar) -> Result<Box<dyn AnyValue>> {
        let found = scalar.kind();
        (self.info.from_scalar)(scalar).ok_or_else(|| {
            Error::malformed(format!(
                "expected {} scalar, found {}",
                self.info.kind.name(),
                found.name()
            ))
        })
    }
}

impl<F: CodecFormat> Codec<F> for ScalarCodec {
    fn type_key(&self) -> TypeKey {
        self.key
    }

    fn encode(&self, core: &CodecCore<F>, value: &dyn AnyValue, out: &mut F::Out) -> Result<()> {
        core.format().encode_scalar(self.scalar_of(value)?, out)
    }

    fn decode(&self, core: &CodecCore<F>, input: &mut F::In) -> Result<Box<dyn AnyValue>> {
        let scalar = core.format().decode_scalar(self.info.kind, input)?;
        self.value_of(scalar)
    }
}

/// Enum codec: a variant travels as its name.
pub struct EnumCodec {
    key: TypeKey,
    info: EnumInfo,
}

impl EnumCodec {
    pub fn new(key: TypeKey, info: EnumInfo) -> Self {
        Self { key, info }
    }
}

impl<F: CodecFormat> Codec<F> for EnumCodec {
    fn type_key(&self) -> TypeKey {
        self.key
    }

    fn encode(&self, core: &CodecCore<F>, value: &dyn AnyValue, out: &mut F::Out) -> Result<()> {
        let name = (self.info.index_of)(value.as_any())
            .and_then(|idx| self.info.variants.get(idx))
            .ok_or_else(|| Error::TypeMismatch {
                expected: self.key.name().to_string(),
                found: value.value_type_name().to_string(),
            })?;
        core.format()
            .encode_scalar(Scalar::String((*name).to_string()), out)
    }

    fn decode(&self, core: &CodecCore<F>, input: &mut F::In) -> Result<Box<dyn AnyValue>> {
        let scalar = core
            .format()
            .decode_scalar(crate::reflect::ScalarKind::String, input)?;
        let name = scalar
            .as_str()
            .ok_or_else(|| Error::malformed("enum variant must be a string"))?;
        self.info
            .position(name)
            .and_then(self.info.from_index)
            .ok_or_else(|| {
                Error::malformed(format!("unknown variant '{}' for {}", name, self.key.name()))
            })
    }
}
