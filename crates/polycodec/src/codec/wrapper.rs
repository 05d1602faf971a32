// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Codecs that delegate to one nested codec.

use super::{Codec, CodecHandle};
use crate::config::ProxySpec;
use crate::core::CodecCore;
use crate::error::{Error, Result};
use crate::format::CodecFormat;
use crate::reflect::{AnyValue, OptionalInfo, PointerInfo, TypeKey};

fn mismatch(expected: TypeKey, value: &dyn AnyValue) -> Error {
    Error::TypeMismatch {
        expected: expected.name().to_string(),
        found: value.value_type_name().to_string(),
    }
}

/// `Option<T>`: owns the null step of the dispatch protocol.
pub struct OptionCodec<F: CodecFormat> {
    key: TypeKey,
    info: OptionalInfo,
    inner: CodecHandle<F>,
}

impl<F: CodecFormat> OptionCodec<F> {
    pub fn new(key: TypeKey, info: OptionalInfo, inner: CodecHandle<F>) -> Self {
        Self { key, info, inner }
    }
}

impl<F: CodecFormat> Codec<F> for OptionCodec<F> {
    fn type_key(&self) -> TypeKey {
        self.key
    }

    fn encode(&self, core: &CodecCore<F>, value: &dyn AnyValue, out: &mut F::Out) -> Result<()> {
        match (self.info.get)(value.as_any()) {
            Some(None) => core.format().encode_null(true, out),
            Some(Some(inner)) => {
                core.format().encode_null(false, out)?;
                self.inner.encode_with_check(core, inner, out)
            }
            None => Err(mismatch(self.key, value)),
        }
    }

    fn decode(&self, core: &CodecCore<F>, input: &mut F::In) -> Result<Box<dyn AnyValue>> {
        if core.format().decode_null(input)? {
            return (self.info.wrap)(None);
        }
        let inner = self.inner.decode_with_check(core, input)?;
        (self.info.wrap)(Some(inner))
    }
}

/// `Box<T>` / `Arc<T>`: transparent.
pub struct PointerCodec<F: CodecFormat> {
    key: TypeKey,
    info: PointerInfo,
    inner: CodecHandle<F>,
}

impl<F: CodecFormat> PointerCodec<F> {
    pub fn new(key: TypeKey, info: PointerInfo, inner: CodecHandle<F>) -> Self {
        Self { key, info, inner }
    }
}

impl<F: CodecFormat> Codec<F> for PointerCodec<F> {
    fn type_key(&self) -> TypeKey {
        self.key
    }

    fn encode(&self, core: &CodecCore<F>, value: &dyn AnyValue, out: &mut F::Out) -> Result<()> {
        let inner = (self.info.get)(value.as_any()).ok_or_else(|| mismatch(self.key, value))?;
        self.inner.encode_with_check(core, inner, out)
    }

    fn decode(&self, core: &CodecCore<F>, input: &mut F::In) -> Result<Box<dyn AnyValue>> {
        let inner = self.inner.decode_with_check(core, input)?;
        (self.info.wrap)(inner)
    }
}

/// Encodes a type through its configured proxy type.
pub struct ProxyCodec<F: CodecFormat> {
    spec: ProxySpec,
    proxy: CodecHandle<F>,
}

impl<F: CodecFormat> ProxyCodec<F> {
    pub fn new(spec: ProxySpec, proxy: CodecHandle<F>) -> Self {
        Self { spec, proxy }
    }
}

impl<F: CodecFormat> Codec<F> for ProxyCodec<F> {
    fn type_key(&self) -> TypeKey {
        self.spec.target
    }

    fn encode(&self, core: &CodecCore<F>, value: &dyn AnyValue, out: &mut F::Out) -> Result<()> {
        let proxy =
            (self.spec.to_proxy)(value.as_any()).ok_or_else(|| mismatch(self.spec.target, value))?;
        self.proxy.encode_with_check(core, &*proxy, out)
    }

    fn decode(&self, core: &CodecCore<F>, input: &mut F::In) -> Result<Box<dyn AnyValue>> {
        let proxy = self.proxy.decode_with_check(core, input)?;
        (self.spec.from_proxy)(proxy)
    }
}
