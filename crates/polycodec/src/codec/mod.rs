// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Codecs: paired encode/decode units bound to one type and one format.
//!
//! Leaf codecs (scalars, enums) talk to the format directly. Wrapper codecs
//! (`Option`, pointers, proxies, `Dyn<B>`) delegate to a nested codec.
//! Composite codecs (objects, arrays, collections, maps) are built by the
//! format from an [`ObjectMeta`], [`CollectionMeta`] or [`MapMeta`].
//!
//! # Dispatch protocol
//!
//! Composite codecs encode and decode their children with
//! [`Codec::encode_with_check`] / [`Codec::decode_with_check`], which run the
//! null step (owned by [`OptionCodec`]) and the dynamic-type step (owned by
//! [`DynCodec`] for open declared types) before the structural step.

mod codec_ref;
mod collection;
mod dynamic;
mod object_meta;
mod scalar;
mod wrapper;

pub use codec_ref::CodecRef;
pub use collection::{CollectionMeta, ElementBuffer, MapMeta};
pub use dynamic::DynCodec;
pub use object_meta::{Accumulator, Construction, FieldCodec, ObjectMeta};
pub use scalar::{EnumCodec, ScalarCodec};
pub use wrapper::{OptionCodec, PointerCodec, ProxyCodec};

use crate::core::CodecCore;
use crate::error::Result;
use crate::format::CodecFormat;
use crate::reflect::{AnyValue, TypeKey};
use std::sync::Arc;

/// Shared handle to a codec.
pub type CodecHandle<F> = Arc<dyn Codec<F>>;

/// Encode/decode unit for one type in format `F`.
pub trait Codec<F: CodecFormat>: Send + Sync {
    /// Type this codec handles.
    fn type_key(&self) -> TypeKey;

    /// `false` for a type open to subtypes: a value declared as it may carry
    /// another runtime type through `Dyn`.
    fn is_final(&self) -> bool {
        true
    }

    /// Structural encode of `value` (which must be of the codec's type).
    fn encode(&self, core: &CodecCore<F>, value: &dyn AnyValue, out: &mut F::Out) -> Result<()>;

    /// Structural decode.
    fn decode(&self, core: &CodecCore<F>, input: &mut F::In) -> Result<Box<dyn AnyValue>>;

    /// Encode including the null and dynamic-type steps.
    fn encode_with_check(
        &self,
        core: &CodecCore<F>,
        value: &dyn AnyValue,
        out: &mut F::Out,
    ) -> Result<()> {
        self.encode(core, value, out)
    }

    /// Decode including the null and dynamic-type steps.
    fn decode_with_check(&self, core: &CodecCore<F>, input: &mut F::In) -> Result<Box<dyn AnyValue>> {
        self.decode(core, input)
    }
}

/// Compare two codec handles by identity (data pointer only).
pub fn same_codec<F: CodecFormat>(a: &CodecHandle<F>, b: &CodecHandle<F>) -> bool {
    std::ptr::eq(
        Arc::as_ptr(a) as *const (),
        Arc::as_ptr(b) as *const (),
    )
}
