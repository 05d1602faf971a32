// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! # polycodec - format-agnostic object serialization
//!
//! Encodes runtime values of described types into a pluggable wire format
//! and reconstructs them. Per-type codecs are derived from type descriptors
//! on first use, cached per [`CodecCore`], and composed for objects,
//! optional values, polymorphic values, recursive type graphs, arrays,
//! collections and maps.
//!
//! ## Quick Start
//!
//! ```rust
//! use polycodec::{CodecConfig, CodecCore, JsonFormat, Reflect, Result};
//!
//! #[derive(Reflect, Debug, PartialEq)]
//! struct Reading {
//!     sensor: String,
//!     values: Vec<f64>,
//!     note: Option<String>,
//! }
//!
//! fn main() -> Result<()> {
//!     let core = CodecCore::new(JsonFormat::new(), CodecConfig::default());
//!     let reading = Reading { sensor: "t1".into(), values: vec![20.5, 21.0], note: None };
//!
//!     let text = core.encode_to_string(&reading)?;
//!     assert_eq!(text, r#"{"note":null,"sensor":"t1","values":[20.5,21.0]}"#);
//!     assert_eq!(core.decode_from_str::<Reading>(&text)?, reading);
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! +---------------------------------------------------------------------+
//! |  CodecCore<F>   registry: TypeId -> Reserved(CodecRef) | Ready      |
//! +---------------------------------------------------------------------+
//! |  Codecs         scalar | enum | object | option | pointer | proxy   |
//! |                 Dyn<B> (tags) | array | collection | map            |
//! +---------------------------------------------------------------------+
//! |  CodecFormat    bytes | json | xml                                  |
//! +---------------------------------------------------------------------+
//! |  Reflect        TypeInfo / Shape descriptors (derive or by hand)    |
//! +---------------------------------------------------------------------+
//! ```
//!
//! ## Key Types
//!
//! | Type | Description |
//! |------|-------------|
//! | [`CodecCore`] | Codec registry and encode/decode entry point |
//! | [`CodecConfig`] | Allow-list, aliases, proxies, default impls, flags |
//! | [`CodecFormat`] | Pluggable representation |
//! | [`Dyn`] | Value declared as `B` holding `B` or a descendant |
//! | [`Reflect`] | Type descriptor trait (derivable) |
//!
//! ## Modules Overview
//!
//! - [`reflect`] - type descriptors and erased values
//! - [`config`] - codec configuration and its YAML loader
//! - [`codec`] - codec trait and composition building blocks
//! - [`format`] - byte, JSON and XML formats

// Allow the derive macro to work inside this crate's tests
extern crate self as polycodec;

/// Codec trait, wrapper codecs and composite-codec building blocks.
pub mod codec;
/// Codec configuration (allow-list, aliases, proxies, policies).
pub mod config;
/// Codec registry and the resolution protocol.
pub mod core;
/// Error type.
pub mod error;
/// Wire formats.
pub mod format;
/// Runtime type descriptors.
pub mod reflect;

pub use codec::{Codec, CodecHandle};
pub use config::{CodecConfig, CodecConfigBuilder};
pub use core::{CodecCore, CoreStats};
pub use error::{Error, Result};
pub use format::{ByteFormat, ByteInput, CodecFormat};
#[cfg(feature = "json")]
pub use format::JsonFormat;
#[cfg(feature = "xml")]
pub use format::{XmlElement, XmlFormat};
pub use reflect::{AnyValue, Dyn, TypeInfo, TypeKey};

// Trait and derive macro share the name (like serde's Serialize)
pub use polycodec_codegen::Reflect;
pub use reflect::Reflect;

/// polycodec version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
