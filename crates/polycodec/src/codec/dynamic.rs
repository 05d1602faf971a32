// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Dynamic-type step of the dispatch protocol.
//!
//! `Dyn<B>` values are routed through [`DynCodec`]. When `B` is open and
//! type tags are enabled, every value goes through the format's dynamic tag
//! hook: no tag when the runtime type is `B` itself, the runtime type's
//! external name otherwise. Decoding resolves the tag, checks the
//! allow-list and the ancestry against `B`, and only then lets the resolved
//! codec construct anything.

use super::{Codec, CodecHandle};
use crate::core::CodecCore;
use crate::error::{Error, Result};
use crate::format::CodecFormat;
use crate::reflect::{AnyValue, DynInfo, DynRef, Shape, TypeInfo, TypeKey};

pub struct DynCodec<F: CodecFormat> {
    key: TypeKey,
    base: TypeInfo,
    info: DynInfo,
    /// Structural codec of `B`; `None` when `B` is abstract.
    base_codec: Option<CodecHandle<F>>,
    open: bool,
    tags: bool,
}

impl<F: CodecFormat> DynCodec<F> {
    pub(crate) fn resolve(core: &CodecCore<F>, key: TypeKey, info: DynInfo) -> Result<Self> {
        let base = (info.base)();
        let base_codec = match base.shape() {
            Shape::Abstract => None,
            _ => Some(core.codec_for(&base)?),
        };
        Ok(Self {
            key,
            open: base.is_open(),
            base,
            info,
            base_codec,
            tags: core.config().dynamic_type_tags(),
        })
    }

    fn is_abstract(&self) -> bool {
        self.base_codec.is_none()
    }

    fn inner<'a>(&self, value: &'a dyn AnyValue) -> Result<DynRef<'a>> {
        (self.info.inner)(value.as_any()).ok_or_else(|| Error::TypeMismatch {
            expected: self.key.name().to_string(),
            found: value.value_type_name().to_string(),
        })
    }

    /// Reject a runtime type that does not descend from `B`.
    fn check_ancestry(&self, runtime: &TypeInfo) -> Result<()> {
        if self.is_abstract() || runtime.descends_from(self.base.key()) {
            Ok(())
        } else {
            Err(Error::TypeMismatch {
                expected: self.base.key().name().to_string(),
                found: runtime.key().name().to_string(),
            })
        }
    }

    fn wrap(&self, value: Box<dyn AnyValue>, runtime: &TypeInfo) -> Box<dyn AnyValue> {
        (self.info.wrap)(value, runtime.key(), runtime.reflect_fn())
    }

    /// Decode without a tag: `B` itself, or the configured default
    /// implementation of an abstract `B`.
    fn decode_untagged(&self, core: &CodecCore<F>, input: &mut F::In) -> Result<Box<dyn AnyValue>> {
        if let Some(codec) = &self.base_codec {
            let value = codec.decode_with_check(core, input)?;
            return Ok(self.wrap(value, &self.base));
        }
        let concrete = core
            .config()
            .default_impl_for(self.base.key())
            .ok_or_else(|| Error::NoUsableConstructor(self.base.key().name().to_string()))?;
        core.config().check_allowed(&concrete)?;
        let codec = core.codec_for(&concrete)?;
        let value = codec.decode_with_check(core, input)?;
        Ok(self.wrap(value, &concrete))
    }
}

impl<F: CodecFormat> Codec<F> for DynCodec<F> {
    fn type_key(&self) -> TypeKey {
        self.key
    }

    fn is_final(&self) -> bool {
        !self.open
    }

    /// Untagged encode. A descendant is written as its `B` view when `B` is
    /// concrete, or with its own structure when `B` is abstract.
    fn encode(&self, core: &CodecCore<F>, value: &dyn AnyValue, out: &mut F::Out) -> Result<()> {
        let inner = self.inner(value)?;
        if let Some(codec) = &self.base_codec {
            if inner.key == self.base.key() {
                return codec.encode_with_check(core, inner.value, out);
            }
            let runtime = (inner.info)();
            self.check_ancestry(&runtime)?;
            let view = runtime
                .upcast(inner.value, self.base.key())
                .ok_or_else(|| Error::TypeMismatch {
                    expected: self.base.key().name().to_string(),
                    found: runtime.key().name().to_string(),
                })?;
            return codec.encode_with_check(core, view, out);
        }
        let runtime = (inner.info)();
        core.codec_for(&runtime)?
            .encode_with_check(core, inner.value, out)
    }

    fn decode(&self, core: &CodecCore<F>, input: &mut F::In) -> Result<Box<dyn AnyValue>> {
        self.decode_untagged(core, input)
    }

    fn encode_with_check(
        &self,
        core: &CodecCore<F>,
        value: &dyn AnyValue,
        out: &mut F::Out,
    ) -> Result<()> {
        if !self.open {
            let inner = self.inner(value)?;
            if inner.key != self.base.key() {
                return Err(Error::TypeMismatch {
                    expected: self.base.key().name().to_string(),
                    found: inner.key.name().to_string(),
                });
            }
            return self.encode(core, value, out);
        }
        if !self.tags {
            return self.encode(core, value, out);
        }

        let inner = self.inner(value)?;
        if inner.key == self.base.key() {
            if let Some(codec) = &self.base_codec {
                return core.format().encode_dynamic(None, out, &mut |o: &mut F::Out| {
                    codec.encode_with_check(core, inner.value, o)
                });
            }
        }

        let runtime = (inner.info)();
        self.check_ancestry(&runtime)?;
        let codec = core.codec_for(&runtime)?;
        let name = core.config().type_name(runtime.key());
        log::trace!(
            "[DynCodec::encode_with_check] tagging {} as '{}'",
            runtime.key().name(),
            name
        );
        core.format().encode_dynamic(Some(name), out, &mut |o: &mut F::Out| {
            codec.encode_with_check(core, inner.value, o)
        })
    }

    fn decode_with_check(&self, core: &CodecCore<F>, input: &mut F::In) -> Result<Box<dyn AnyValue>> {
        if !self.open || !self.tags {
            return self.decode_untagged(core, input);
        }
        let name = match core.format().decode_dynamic(input)? {
            Some(name) => name,
            None => return self.decode_untagged(core, input),
        };

        let config = core.config();
        let runtime = config.resolve_name(&name)?;
        config.check_allowed(&runtime)?;
        self.check_ancestry(&runtime)?;
        log::trace!(
            "[DynCodec::decode_with_check] tag '{}' -> {}",
            name,
            runtime.key().name()
        );
        let codec = core.codec_for(&runtime)?;
        let value = codec.decode_with_check(core, input)?;
        Ok(self.wrap(value, &runtime))
    }
}
