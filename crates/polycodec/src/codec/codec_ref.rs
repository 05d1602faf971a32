// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Placeholder codec handed out while a type is being generated.
//!
//! A `CodecRef` is installed in the registry before generation starts, so a
//! recursive field type resolves to it instead of recursing forever. It may
//! be stored freely; it must not be *used* until filled.

use super::{Codec, CodecHandle};
use crate::core::CodecCore;
use crate::error::{Error, Result};
use crate::format::CodecFormat;
use crate::reflect::{AnyValue, TypeInfo, TypeKey};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::OnceLock;
use std::thread::{self, ThreadId};

pub struct CodecRef<F: CodecFormat> {
    info: TypeInfo,
    target: OnceLock<CodecHandle<F>>,
    failed: AtomicBool,
    /// Thread running the generation this placeholder belongs to.
    owner: ThreadId,
}

impl<F: CodecFormat> CodecRef<F> {
    pub(crate) fn new(info: TypeInfo) -> Self {
        Self {
            info,
            target: OnceLock::new(),
            failed: AtomicBool::new(false),
            owner: thread::current().id(),
        }
    }

    pub(crate) fn fill(&self, codec: CodecHandle<F>) {
        // A second fill can only carry the same codec; keep the first.
        let _ = self.target.set(codec);
    }

    /// Mark the generation behind this placeholder as failed.
    pub(crate) fn fail(&self) {
        self.failed.store(true, Ordering::Release);
    }

    /// Installed codec, once generation finished.
    pub(crate) fn target(&self) -> Option<CodecHandle<F>> {
        self.target.get().cloned()
    }

    pub fn is_ready(&self) -> bool {
        self.target.get().is_some()
    }

    pub fn is_failed(&self) -> bool {
        self.failed.load(Ordering::Acquire)
    }

    /// Codec to delegate to.
    ///
    /// Unfilled: the generating thread gets [`Error::UninitialisedReference`];
    /// any other thread (or any thread once generation failed) resolves the
    /// type through the core, which waits for an in-flight generation or
    /// starts a new one.
    fn resolve(&self, core: &CodecCore<F>) -> Result<CodecHandle<F>> {
        if let Some(target) = self.target.get() {
            return Ok(target.clone());
        }
        if !self.is_failed() && thread::current().id() == self.owner {
            return Err(Error::UninitialisedReference(
                self.info.key().name().to_string(),
            ));
        }
        log::trace!(
            "[CodecRef::resolve] re-resolving {} through core",
            self.info.key().name()
        );
        core.codec_for(&self.info)
    }
}

impl<F: CodecFormat> Codec<F> for CodecRef<F> {
    fn type_key(&self) -> TypeKey {
        self.info.key()
    }

    fn is_final(&self) -> bool {
        self.target.get().map_or(true, |t| t.is_final())
    }

    fn encode(&self, core: &CodecCore<F>, value: &dyn AnyValue, out: &mut F::Out) -> Result<()> {
        self.resolve(core)?.encode(core, value, out)
    }

    fn decode(&self, core: &CodecCore<F>, input: &mut F::In) -> Result<Box<dyn AnyValue>> {
        self.resolve(core)?.decode(core, input)
    }

    fn encode_with_check(
        &self,
        core: &CodecCore<F>,
        value: &dyn AnyValue,
        out: &mut F::Out,
    ) -> Result<()> {
        self.resolve(core)?.encode_with_check(core, value, out)
    }

    fn decode_with_check(&self, core: &CodecCore<F>, input: &mut F::In) -> Result<Box<dyn AnyValue>> {
        self.resolve(core)?.decode_with_check(core, input)
    }
}
