// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Wire formats.
//!
//! A [`CodecFormat`] owns every representation detail: how primitives,
//! null markers and dynamic type tags are written, and how the composite
//! codecs lay out objects, arrays, collections and maps. The codec core
//! never inspects a representation.
//!
//! | Format | Encode sink | Decode source |
//! |---|---|---|
//! | [`ByteFormat`] | `Vec<u8>` | [`ByteInput`] cursor |
//! | [`JsonFormat`] (feature `json`) | `serde_json::Value` | `serde_json::Value` |
//! | [`XmlFormat`] (feature `xml`) | [`XmlElement`] | [`XmlElement`] |

mod bytes;
#[cfg(feature = "json")]
mod json;
#[cfg(feature = "xml")]
mod xml;

pub use bytes::{ByteFormat, ByteInput};
#[cfg(feature = "json")]
pub use json::JsonFormat;
#[cfg(feature = "xml")]
pub use xml::{XmlElement, XmlFormat};

use crate::codec::{CodecHandle, CollectionMeta, MapMeta, ObjectMeta, ScalarCodec};
use crate::error::Result;
use crate::reflect::{Scalar, ScalarInfo, ScalarKind, TypeKey};
use std::sync::Arc;

/// A pluggable representation.
pub trait CodecFormat: Send + Sync + Sized + 'static {
    /// Encode sink.
    type Out: Send;
    /// Decode source.
    type In: Send;

    /// Short name used in diagnostics.
    fn name(&self) -> &'static str;

    /// Empty sink for one top-level value.
    fn new_output(&self) -> Self::Out;

    /// Write the null marker of an optional value (`null == true` for
    /// `None`). Present values are followed by their encoding.
    fn encode_null(&self, null: bool, out: &mut Self::Out) -> Result<()>;

    /// Read the null marker; `true` means the value is absent.
    fn decode_null(&self, input: &mut Self::In) -> Result<bool>;

    fn encode_scalar(&self, scalar: Scalar, out: &mut Self::Out) -> Result<()>;

    fn decode_scalar(&self, kind: ScalarKind, input: &mut Self::In) -> Result<Scalar>;

    /// Codec for a primitive type.
    fn scalar_codec(&self, key: TypeKey, info: ScalarInfo) -> CodecHandle<Self> {
        Arc::new(ScalarCodec::new(key, info))
    }

    /// Write an optional dynamic type tag around the value written by `body`.
    fn encode_dynamic(
        &self,
        tag: Option<&str>,
        out: &mut Self::Out,
        body: &mut dyn FnMut(&mut Self::Out) -> Result<()>,
    ) -> Result<()>;

    /// Read the dynamic type tag, leaving `input` positioned on the value.
    fn decode_dynamic(&self, input: &mut Self::In) -> Result<Option<String>>;

    fn object_codec(&self, meta: ObjectMeta<Self>) -> Result<CodecHandle<Self>>;

    fn array_codec(&self, meta: CollectionMeta<Self>) -> Result<CodecHandle<Self>>;

    fn collection_codec(&self, meta: CollectionMeta<Self>) -> Result<CodecHandle<Self>>;

    fn map_codec(&self, meta: MapMeta<Self>) -> Result<CodecHandle<Self>>;
}

/// Text rendering of non-finite floats in text formats.
#[cfg_attr(not(any(feature = "json", feature = "xml")), allow(dead_code))]
pub(crate) fn non_finite_name(value: f64) -> Option<&'static str> {
    if value.is_nan() {
        Some("NaN")
    } else if value == f64::INFINITY {
        Some("Infinity")
    } else if value == f64::NEG_INFINITY {
        Some("-Infinity")
    } else {
        None
    }
}

/// Parse a primitive of `kind` from its text rendering.
#[cfg_attr(not(feature = "xml"), allow(dead_code))]
pub(crate) fn parse_scalar(kind: ScalarKind, text: &str) -> Result<Scalar> {
    use crate::error::Error;

    fn num<T: std::str::FromStr>(kind: ScalarKind, text: &str) -> Result<T> {
        text.trim().parse::<T>().map_err(|_| {
            Error::malformed(format!("'{}' is not a valid {}", text, kind.name()))
        })
    }

    fn float(kind: ScalarKind, text: &str) -> Result<f64> {
        match text.trim() {
            "NaN" => Ok(f64::NAN),
            "Infinity" => Ok(f64::INFINITY),
            "-Infinity" => Ok(f64::NEG_INFINITY),
            other => num::<f64>(kind, other),
        }
    }

    Ok(match kind {
        ScalarKind::Bool => Scalar::Bool(num(kind, text)?),
        ScalarKind::I8 => Scalar::I8(num(kind, text)?),
        ScalarKind::I16 => Scalar::I16(num(kind, text)?),
        ScalarKind::I32 => Scalar::I32(num(kind, text)?),
        ScalarKind::I64 => Scalar::I64(num(kind, text)?),
        ScalarKind::U8 => Scalar::U8(num(kind, text)?),
        ScalarKind::U16 => Scalar::U16(num(kind, text)?),
        ScalarKind::U32 => Scalar::U32(num(kind, text)?),
        ScalarKind::U64 => Scalar::U64(num(kind, text)?),
        ScalarKind::F32 => Scalar::F32(float(kind, text)? as f32),
        ScalarKind::F64 => Scalar::F64(float(kind, text)?),
        ScalarKind::Char => {
            let mut chars = text.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => Scalar::Char(c),
                _ => return Err(Error::malformed(format!("'{}' is not a single char", text))),
            }
        }
        ScalarKind::String => Scalar::String(text.to_string()),
    })
}

/// Text rendering of a primitive in text formats.
#[cfg_attr(not(feature = "xml"), allow(dead_code))]
pub(crate) fn scalar_text(scalar: &Scalar) -> String {
    match scalar {
        Scalar::Bool(v) => v.to_string(),
        Scalar::I8(v) => v.to_string(),
        Scalar::I16(v) => v.to_string(),
        Scalar::I32(v) => v.to_string(),
        Scalar::I64(v) => v.to_string(),
        Scalar::U8(v) => v.to_string(),
        Scalar::U16(v) => v.to_string(),
        Scalar::U32(v) => v.to_string(),
        Scalar::U64(v) => v.to_string(),
        Scalar::F32(v) => non_finite_name(f64::from(*v))
            .map(str::to_string)
            .unwrap_or_else(|| v.to_string()),
        Scalar::F64(v) => non_finite_name(*v)
            .map(str::to_string)
            .unwrap_or_else(|| v.to_string()),
        Scalar::Char(c) => c.to_string(),
        Scalar::String(s) => s.clone(),
    }
}
