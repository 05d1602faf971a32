// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Codec generation by shape.

use super::CodecCore;
use crate::codec::{
    CodecHandle, CollectionMeta, DynCodec, EnumCodec, MapMeta, ObjectMeta, OptionCodec,
    PointerCodec, ProxyCodec,
};
use crate::error::{Error, Result};
use crate::format::CodecFormat;
use crate::reflect::{Shape, TypeInfo};
use std::sync::Arc;

/// Build the codec of `info`. Runs outside the install lock with the type's
/// slot reserved.
pub(crate) fn generate<F: CodecFormat>(core: &CodecCore<F>, info: &TypeInfo) -> Result<CodecHandle<F>> {
    let config = core.config();
    let key = info.key();

    // Proxies replace the type entirely, whatever its shape.
    if let Some(spec) = config.proxy_for(key) {
        let proxy = core.codec_for(&(spec.proxy)())?;
        return Ok(Arc::new(ProxyCodec::new(*spec, proxy)));
    }

    match info.shape() {
        Shape::Scalar(scalar) => Ok(core.format().scalar_codec(key, *scalar)),
        Shape::Enum(variants) => {
            config.check_allowed(info)?;
            Ok(Arc::new(EnumCodec::new(key, variants.clone())))
        }
        Shape::Object(_) => {
            config.check_allowed(info)?;
            let meta = ObjectMeta::resolve(core, info)?;
            core.format().object_codec(meta)
        }
        Shape::Optional(opt) => {
            let inner = core.codec_for(&(opt.inner)())?;
            Ok(Arc::new(OptionCodec::new(key, *opt, inner)))
        }
        Shape::Pointer(ptr) => {
            let inner = core.codec_for(&(ptr.inner)())?;
            Ok(Arc::new(PointerCodec::new(key, *ptr, inner)))
        }
        Shape::Array(seq) => {
            let meta = CollectionMeta::resolve(core, info, *seq)?;
            core.format().array_codec(meta)
        }
        Shape::Collection(seq) => {
            let meta = CollectionMeta::resolve(core, info, *seq)?;
            core.format().collection_codec(meta)
        }
        Shape::Map(map) => {
            let meta = MapMeta::resolve(core, info, *map)?;
            core.format().map_codec(meta)
        }
        Shape::Dynamic(dynamic) => Ok(Arc::new(DynCodec::resolve(core, key, *dynamic)?)),
        Shape::Abstract => Err(Error::NoUsableConstructor(format!(
            "{} is abstract (declare it as Dyn<..>)",
            key.name()
        ))),
    }
}
