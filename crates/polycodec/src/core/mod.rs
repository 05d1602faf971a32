// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Codec registry and entry point.
//!
//! [`CodecCore`] resolves the codec of a type, generating and caching it on
//! first use, and dispatches encode/decode calls through it.
//!
//! # Resolution protocol
//!
//! 1. Lock-free read of the registry; a ready codec is returned at once.
//! 2. On miss, take the install lock and re-check.
//! 3. Still missing: install a [`CodecRef`] placeholder, release the lock.
//! 4. Generate outside the lock. Field types are resolved recursively; a
//!    self-referential field finds the placeholder instead of looping.
//! 5. Take the lock, install the finished codec, fill the placeholder and
//!    wake waiters.
//!
//! Slots reserved by a session stay reserved, with their placeholders
//! filled, until the outermost generation of the session returns. A thread
//! that is not generating and finds a reserved slot waits on a condvar
//! until the slot is ready or evicted.
//!
//! A generating thread that meets a slot reserved by another thread's
//! session takes its placeholder instead of waiting, and records that it
//! borrowed from that session. When its own codecs are built it waits until
//! every session it borrowed from (transitively) has built its codecs too;
//! only then are its slots published as ready. Waiting starts only after
//! all of a session's own work is done, so mutually borrowing sessions
//! cannot deadlock.
//!
//! A failed generation evicts every slot reserved by its session and marks
//! their placeholders failed. Sessions that borrowed from it are evicted as
//! well and retry from scratch, so no codec built on a failed placeholder is
//! ever served as ready.

mod generate;
mod session;

use crate::codec::{Codec, CodecHandle, CodecRef};
use crate::config::CodecConfig;
use crate::error::{Error, Result};
use crate::format::CodecFormat;
use crate::reflect::{downcast_value, AnyValue, Reflect, TypeInfo};
use dashmap::DashMap;
use parking_lot::{Condvar, Mutex};
use session::{Session, SessionState, Status};
use std::any::TypeId;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

static NEXT_CORE_ID: AtomicU64 = AtomicU64::new(1);

/// Lookups of one type restarted because a borrowed session failed.
const MAX_ATTEMPTS: usize = 8;

/// Registry entry.
enum Slot<F: CodecFormat> {
    /// Generation in progress; the placeholder may be stored but not used.
    Reserved {
        placeholder: Arc<CodecRef<F>>,
        owner: Arc<SessionState>,
    },
    Ready(CodecHandle<F>),
}

impl<F: CodecFormat> Clone for Slot<F> {
    fn clone(&self) -> Self {
        match self {
            Slot::Reserved { placeholder, owner } => Slot::Reserved {
                placeholder: Arc::clone(placeholder),
                owner: Arc::clone(owner),
            },
            Slot::Ready(codec) => Slot::Ready(Arc::clone(codec)),
        }
    }
}

/// Outcome of one resolution attempt.
enum Resolved<F: CodecFormat> {
    Codec(CodecHandle<F>),
    /// A session this one borrowed from failed; its own slots were evicted.
    Retry,
}

/// Registry statistics.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CoreStats {
    /// `codec_for` calls.
    pub lookups: u64,
    /// Lookups served by a ready codec.
    pub hits: u64,
    /// Codecs generated successfully.
    pub generations: u64,
    /// Failed sessions (each evicts its reserved slots).
    pub failures: u64,
    /// Registry entries.
    pub cached: usize,
}

#[derive(Default)]
struct Counters {
    lookups: AtomicU64,
    hits: AtomicU64,
    generations: AtomicU64,
    failures: AtomicU64,
}

/// Codec registry bound to one format and one configuration.
///
/// # Example
///
/// ```rust
/// use polycodec::{ByteFormat, CodecConfig, CodecCore, Reflect};
///
/// #[derive(Reflect, Debug, PartialEq)]
/// struct Point { x: i32, y: i32 }
///
/// let core = CodecCore::new(ByteFormat::new(), CodecConfig::default());
/// let bytes = core.encode(&Point { x: 1, y: -2 }).unwrap();
/// let back: Point = core.decode(bytes).unwrap();
/// assert_eq!(back, Point { x: 1, y: -2 });
/// ```
pub struct CodecCore<F: CodecFormat> {
    id: u64,
    format: F,
    config: Arc<CodecConfig>,
    registry: DashMap<TypeId, Slot<F>>,
    install: Mutex<()>,
    installed: Condvar,
    counters: Counters,
}

impl<F: CodecFormat> CodecCore<F> {
    pub fn new(format: F, config: CodecConfig) -> Self {
        Self::with_shared_config(format, Arc::new(config))
    }

    /// Create a core sharing a configuration with other cores.
    pub fn with_shared_config(format: F, config: Arc<CodecConfig>) -> Self {
        Self {
            id: NEXT_CORE_ID.fetch_add(1, Ordering::Relaxed),
            format,
            config,
            registry: DashMap::new(),
            install: Mutex::new(()),
            installed: Condvar::new(),
            counters: Counters::default(),
        }
    }

    pub fn format(&self) -> &F {
        &self.format
    }

    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    pub fn shared_config(&self) -> Arc<CodecConfig> {
        Arc::clone(&self.config)
    }

    // ========================================================================
    // Resolution
    // ========================================================================

    /// Codec of `T`, generated on first use.
    pub fn get_codec<T: Reflect + ?Sized>(&self) -> Result<CodecHandle<F>> {
        self.codec_for(&T::type_info())
    }

    /// Codec of the described type, generated on first use.
    pub fn codec_for(&self, info: &TypeInfo) -> Result<CodecHandle<F>> {
        self.counters.lookups.fetch_add(1, Ordering::Relaxed);
        for _ in 0..MAX_ATTEMPTS {
            match self.resolve(info)? {
                Resolved::Codec(codec) => return Ok(codec),
                Resolved::Retry => log::debug!(
                    "[CodecCore::codec_for] retrying {} after a borrowed generation failed",
                    info.key().name()
                ),
            }
        }
        Err(Error::UninitialisedReference(info.key().name().to_string()))
    }

    fn resolve(&self, info: &TypeInfo) -> Result<Resolved<F>> {
        let id = info.key().id();
        let current = session::current(self.id);

        match self.slot(id) {
            Some(Slot::Ready(codec)) => return Ok(Resolved::Codec(self.hit(info, codec))),
            Some(Slot::Reserved { placeholder, owner }) => {
                if let Some(state) = &current {
                    return Ok(Resolved::Codec(Self::share(placeholder, &owner, state)));
                }
            }
            None => {}
        }

        let (placeholder, session) = {
            let mut guard = self.install.lock();
            loop {
                match (self.slot(id), &current) {
                    (None, _) => break,
                    (Some(Slot::Ready(codec)), _) => {
                        return Ok(Resolved::Codec(self.hit(info, codec)));
                    }
                    (Some(Slot::Reserved { placeholder, owner }), Some(state)) => {
                        return Ok(Resolved::Codec(Self::share(placeholder, &owner, state)));
                    }
                    (Some(Slot::Reserved { .. }), None) => self.installed.wait(&mut guard),
                }
            }
            let session = Session::enter(self.id);
            let placeholder = Arc::new(CodecRef::new(info.clone()));
            self.registry.insert(
                id,
                Slot::Reserved {
                    placeholder: Arc::clone(&placeholder),
                    owner: Arc::clone(session.state()),
                },
            );
            (placeholder, session)
        };

        self.generate_reserved(info, placeholder, session)
    }

    fn slot(&self, id: TypeId) -> Option<Slot<F>> {
        self.registry.get(&id).map(|entry| entry.value().clone())
    }

    fn hit(&self, info: &TypeInfo, codec: CodecHandle<F>) -> CodecHandle<F> {
        self.counters.hits.fetch_add(1, Ordering::Relaxed);
        log::trace!("[CodecCore::codec_for] hit {}", info.key().name());
        codec
    }

    /// Hand a reserved slot to the generating session `state`.
    fn share(
        placeholder: Arc<CodecRef<F>>,
        owner: &Arc<SessionState>,
        state: &Arc<SessionState>,
    ) -> CodecHandle<F> {
        if !Arc::ptr_eq(owner, state) {
            log::trace!(
                "[CodecCore::codec_for] borrowing {} from another session",
                placeholder.type_key().name()
            );
            state.borrow_from(owner);
        }
        match placeholder.target() {
            Some(codec) => codec,
            None => placeholder as CodecHandle<F>,
        }
    }

    fn generate_reserved(
        &self,
        info: &TypeInfo,
        placeholder: Arc<CodecRef<F>>,
        session: Session,
    ) -> Result<Resolved<F>> {
        let id = info.key().id();
        let mut generation = Generation {
            core: self,
            session,
            completed: false,
        };
        generation.session.record(id);
        log::debug!(
            "[CodecCore::codec_for] generating {} ({})",
            info.key().name(),
            info.shape().kind_name()
        );

        let codec = generate::generate(self, info)?;
        placeholder.fill(Arc::clone(&codec));
        self.counters.generations.fetch_add(1, Ordering::Relaxed);
        if !generation.session.is_root() {
            return Ok(Resolved::Codec(codec));
        }

        let published = self.settle(&generation.session);
        generation.completed = true;
        if published {
            Ok(Resolved::Codec(codec))
        } else {
            Ok(Resolved::Retry)
        }
    }

    /// Publish the slots of a finished root session once every session it
    /// borrowed from has finished, or evict them if one of those failed.
    fn settle(&self, session: &Session) -> bool {
        let state = session.state();
        let created = session.take_created();
        let mut guard = self.install.lock();
        state.set_status(Status::Finished);
        self.installed.notify_all();
        loop {
            match state.settled() {
                Status::Failed => {
                    drop(guard);
                    self.evict(&created, state);
                    return false;
                }
                Status::Finished | Status::Published => break,
                Status::Running => self.installed.wait(&mut guard),
            }
        }
        for id in &created {
            if let Some(Slot::Reserved { placeholder, owner }) = self.slot(*id) {
                if !Arc::ptr_eq(&owner, state) {
                    continue;
                }
                match placeholder.target() {
                    Some(codec) => {
                        self.registry.insert(*id, Slot::Ready(codec));
                    }
                    None => {
                        self.registry.remove(id);
                        placeholder.fail();
                    }
                }
            }
        }
        state.set_status(Status::Published);
        drop(guard);
        self.installed.notify_all();
        true
    }

    /// Remove slots reserved by a failed session and wake waiters.
    fn evict(&self, created: &[TypeId], state: &Arc<SessionState>) {
        {
            let _guard = self.install.lock();
            for id in created {
                let owned = matches!(
                    self.registry.get(id).as_deref(),
                    Some(Slot::Reserved { owner, .. }) if Arc::ptr_eq(owner, state)
                );
                if !owned {
                    continue;
                }
                if let Some((_, Slot::Reserved { placeholder, .. })) = self.registry.remove(id) {
                    placeholder.fail();
                }
            }
            state.set_status(Status::Failed);
        }
        self.installed.notify_all();
        self.counters.failures.fetch_add(1, Ordering::Relaxed);
        log::debug!(
            "[CodecCore::evict] evicted {} slot(s) after failed generation",
            created.len()
        );
    }

    /// Whether a codec for `T` is ready.
    pub fn is_cached<T: Reflect + ?Sized>(&self) -> bool {
        matches!(self.slot(TypeId::of::<T>()), Some(Slot::Ready(_)))
    }

    pub fn stats(&self) -> CoreStats {
        CoreStats {
            lookups: self.counters.lookups.load(Ordering::Relaxed),
            hits: self.counters.hits.load(Ordering::Relaxed),
            generations: self.counters.generations.load(Ordering::Relaxed),
            failures: self.counters.failures.load(Ordering::Relaxed),
            cached: self.registry.len(),
        }
    }

    // ========================================================================
    // Entry points
    // ========================================================================

    /// Encode `value` into a fresh output.
    pub fn encode<T: Reflect + AnyValue>(&self, value: &T) -> Result<F::Out> {
        let mut out = self.format.new_output();
        self.encode_into(value, &mut out)?;
        Ok(out)
    }

    /// Encode `value` into an existing output.
    pub fn encode_into<T: Reflect + AnyValue>(&self, value: &T, out: &mut F::Out) -> Result<()> {
        let codec = self.get_codec::<T>()?;
        codec.encode_with_check(self, value, out)
    }

    /// Decode a `T` from a representation.
    pub fn decode<T: Reflect + AnyValue>(&self, input: impl Into<F::In>) -> Result<T> {
        let mut input = input.into();
        self.decode_from(&mut input)
    }

    /// Decode a `T` from an input source, leaving whatever follows unread.
    pub fn decode_from<T: Reflect + AnyValue>(&self, input: &mut F::In) -> Result<T> {
        let codec = self.get_codec::<T>()?;
        let value = codec.decode_with_check(self, input)?;
        downcast_value::<T>(value)
    }
}

/// One in-flight generation; evicts the session on failure or panic.
struct Generation<'c, F: CodecFormat> {
    core: &'c CodecCore<F>,
    session: Session,
    completed: bool,
}

impl<F: CodecFormat> Drop for Generation<'_, F> {
    fn drop(&mut self) {
        if !self.completed && self.session.is_root() {
            let created = self.session.take_created();
            self.core.evict(&created, self.session.state());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::same_codec;
    use crate::format::ByteFormat;

    #[test]
    fn test_memoized_codec_identity() {
        let core = CodecCore::new(ByteFormat::new(), CodecConfig::default());
        let a = core.get_codec::<Vec<u32>>().unwrap();
        let b = core.get_codec::<Vec<u32>>().unwrap();
        assert!(same_codec(&a, &b));
        assert!(core.is_cached::<Vec<u32>>());
        assert!(core.is_cached::<u32>());

        let stats = core.stats();
        assert_eq!(stats.generations, 2);
        assert_eq!(stats.cached, 2);
        assert!(stats.hits >= 1);
    }

    #[test]
    fn test_cores_do_not_share_registries() {
        let a = CodecCore::new(ByteFormat::new(), CodecConfig::default());
        let b = CodecCore::new(ByteFormat::new(), CodecConfig::default());
        let ca = a.get_codec::<u8>().unwrap();
        let cb = b.get_codec::<u8>().unwrap();
        assert!(!same_codec(&ca, &cb));
    }

    #[test]
    fn test_decode_from_leaves_trailing_input() {
        let core = CodecCore::new(ByteFormat::new(), CodecConfig::default());
        let mut out = core.encode(&7u16).unwrap();
        core.encode_into(&9u16, &mut out).unwrap();
        let mut input = crate::format::ByteInput::from(out);
        assert_eq!(core.decode_from::<u16>(&mut input).unwrap(), 7);
        assert_eq!(core.decode_from::<u16>(&mut input).unwrap(), 9);
    }
}
