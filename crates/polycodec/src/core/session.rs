// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Per-thread generation sessions.
//!
//! The outermost `codec_for` call that has to generate a codec opens a
//! session for its core on the current thread; nested lookups made while
//! generating join it. Inside a session, a reserved slot resolves to its
//! placeholder instead of blocking, and every slot reserved by the session
//! is recorded so a failure can evict all of them.
//!
//! A session may also store placeholders reserved by a session on another
//! thread. It then borrows from that session: its own slots are published
//! only once every session it borrowed from has built its codecs, and are
//! evicted if any of them fails.

use parking_lot::Mutex;
use std::any::TypeId;
use std::cell::RefCell;
use std::sync::Arc;

/// Progress of one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Status {
    /// Still generating.
    Running,
    /// Every codec of the session was built; not yet published.
    Finished,
    /// Slots published as ready.
    Published,
    /// Slots evicted.
    Failed,
}

/// State of a session shared with the registry and with borrowing sessions.
///
/// Status changes happen under the owning core's install lock.
pub(crate) struct SessionState {
    status: Mutex<Status>,
    /// Sessions whose placeholders this session stored in its codecs.
    borrowed: Mutex<Vec<Arc<SessionState>>>,
}

impl SessionState {
    fn new() -> Self {
        Self {
            status: Mutex::new(Status::Running),
            borrowed: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn status(&self) -> Status {
        *self.status.lock()
    }

    pub(crate) fn set_status(&self, status: Status) {
        *self.status.lock() = status;
        if matches!(status, Status::Published | Status::Failed) {
            self.borrowed.lock().clear();
        }
    }

    /// Record that this session stored a placeholder reserved by `owner`.
    pub(crate) fn borrow_from(&self, owner: &Arc<SessionState>) {
        let mut borrowed = self.borrowed.lock();
        if !borrowed.iter().any(|b| Arc::ptr_eq(b, owner)) {
            borrowed.push(Arc::clone(owner));
        }
    }

    /// Combined status of this session and every session it borrowed from,
    /// transitively: `Failed` if any failed, `Running` if any is still
    /// generating, `Finished` once all of them built their codecs.
    pub(crate) fn settled(self: &Arc<Self>) -> Status {
        let mut stack = vec![Arc::clone(self)];
        let mut seen: Vec<*const SessionState> = Vec::new();
        let mut running = false;
        while let Some(state) = stack.pop() {
            if seen.contains(&Arc::as_ptr(&state)) {
                continue;
            }
            seen.push(Arc::as_ptr(&state));
            match state.status() {
                Status::Failed => return Status::Failed,
                Status::Running => running = true,
                // Published implies its borrowed sessions finished too.
                Status::Published => continue,
                Status::Finished => {}
            }
            stack.extend(state.borrowed.lock().iter().cloned());
        }
        if running {
            Status::Running
        } else {
            Status::Finished
        }
    }
}

struct Frame {
    core_id: u64,
    state: Arc<SessionState>,
    created: Vec<TypeId>,
}

thread_local! {
    static FRAMES: RefCell<Vec<Frame>> = const { RefCell::new(Vec::new()) };
}

/// State of the session the current thread runs for `core_id`, if any.
pub(crate) fn current(core_id: u64) -> Option<Arc<SessionState>> {
    FRAMES.with(|frames| {
        frames
            .borrow()
            .iter()
            .find(|f| f.core_id == core_id)
            .map(|f| Arc::clone(&f.state))
    })
}

/// Membership of the current thread in a session of one core.
pub(crate) struct Session {
    core_id: u64,
    root: bool,
    state: Arc<SessionState>,
}

impl Session {
    /// Join the session of `core_id`, opening it if none is active.
    pub(crate) fn enter(core_id: u64) -> Self {
        FRAMES.with(|frames| {
            let mut frames = frames.borrow_mut();
            match frames.iter().find(|f| f.core_id == core_id) {
                Some(frame) => Self {
                    core_id,
                    root: false,
                    state: Arc::clone(&frame.state),
                },
                None => {
                    let state = Arc::new(SessionState::new());
                    frames.push(Frame {
                        core_id,
                        state: Arc::clone(&state),
                        created: Vec::new(),
                    });
                    Self {
                        core_id,
                        root: true,
                        state,
                    }
                }
            }
        })
    }

    /// `true` for the outermost generation of the session.
    pub(crate) fn is_root(&self) -> bool {
        self.root
    }

    pub(crate) fn state(&self) -> &Arc<SessionState> {
        &self.state
    }

    /// Record a slot reserved by this session.
    pub(crate) fn record(&self, id: TypeId) {
        FRAMES.with(|frames| {
            if let Some(frame) = frames
                .borrow_mut()
                .iter_mut()
                .find(|f| f.core_id == self.core_id)
            {
                frame.created.push(id);
            }
        });
    }

    /// Slots reserved by the whole session so far.
    pub(crate) fn take_created(&self) -> Vec<TypeId> {
        FRAMES.with(|frames| {
            frames
                .borrow_mut()
                .iter_mut()
                .find(|f| f.core_id == self.core_id)
                .map(|f| std::mem::take(&mut f.created))
                .unwrap_or_default()
        })
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if self.root {
            FRAMES.with(|frames| {
                frames.borrow_mut().retain(|f| f.core_id != self.core_id);
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nested_sessions_share_frame() {
        let outer = Session::enter(7);
        assert!(outer.is_root());
        assert!(current(7).is_some());
        assert!(current(8).is_none());

        let inner = Session::enter(7);
        assert!(!inner.is_root());
        assert!(Arc::ptr_eq(inner.state(), outer.state()));
        inner.record(TypeId::of::<u8>());
        outer.record(TypeId::of::<u16>());
        drop(inner);
        assert!(current(7).is_some());

        let created = outer.take_created();
        assert_eq!(created, vec![TypeId::of::<u8>(), TypeId::of::<u16>()]);
        drop(outer);
        assert!(current(7).is_none());
    }

    #[test]
    fn test_sessions_are_per_core() {
        let a = Session::enter(1);
        let b = Session::enter(2);
        assert!(a.is_root());
        assert!(b.is_root());
        drop(a);
        assert!(current(1).is_none());
        assert!(current(2).is_some());
    }

    fn state() -> Arc<SessionState> {
        Arc::new(SessionState::new())
    }

    #[test]
    fn test_settled_waits_for_borrowed_sessions() {
        let own = state();
        let other = state();
        own.borrow_from(&other);
        own.borrow_from(&other);
        assert_eq!(own.borrowed.lock().len(), 1);

        own.set_status(Status::Finished);
        assert_eq!(own.settled(), Status::Running);
        other.set_status(Status::Finished);
        assert_eq!(own.settled(), Status::Finished);
        other.set_status(Status::Published);
        assert_eq!(own.settled(), Status::Finished);
    }

    #[test]
    fn test_settled_propagates_failure() {
        let own = state();
        let middle = state();
        let failed = state();
        own.borrow_from(&middle);
        middle.borrow_from(&failed);
        own.set_status(Status::Finished);
        middle.set_status(Status::Finished);
        failed.set_status(Status::Failed);
        assert_eq!(own.settled(), Status::Failed);
    }

    #[test]
    fn test_settled_handles_cycles() {
        let a = state();
        let b = state();
        a.borrow_from(&b);
        b.borrow_from(&a);
        a.set_status(Status::Finished);
        assert_eq!(a.settled(), Status::Running);
        b.set_status(Status::Finished);
        assert_eq!(a.settled(), Status::Finished);
        assert_eq!(b.settled(), Status::Finished);
    }
}
