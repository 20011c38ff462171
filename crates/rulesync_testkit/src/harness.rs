//! Concurrency harnesses for the reconciler.
//!
//! [`RecordingRemote`] logs every fetch and replace per parent so a test can
//! prove that fetch → replace windows never interleave. [`GatedRemote`]
//! parks fetches on chosen parents until the test releases them, which makes
//! "different keys never block each other" observable without timing.

use parking_lot::{Condvar, Mutex};
use rulesync_engine::{CollaboratorResult, MemoryRemoteCollection, RemoteCollection, RequestContext};
use rulesync_model::{ParentKey, Rule};
use std::collections::{HashMap, HashSet};
use std::thread::{self, ThreadId};
use std::time::{Duration, Instant};

/// Kind of remote call recorded by [`RecordingRemote`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallKind {
    /// A fetch of the full list.
    Fetch,
    /// A replacement of the full list.
    Replace,
}

/// One recorded remote call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    /// Calling thread.
    pub thread: ThreadId,
    /// Parent the call targeted.
    pub parent: ParentKey,
    /// What the call was.
    pub kind: CallKind,
}

/// A memory remote that records calls and can stretch each one.
#[derive(Debug, Default)]
pub struct RecordingRemote {
    inner: MemoryRemoteCollection,
    calls: Mutex<Vec<Call>>,
    delay: Duration,
}

impl RecordingRemote {
    /// Creates a recording remote that sleeps `delay` inside every call.
    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay,
            ..Self::default()
        }
    }

    /// Returns the wrapped memory remote.
    pub fn inner(&self) -> &MemoryRemoteCollection {
        &self.inner
    }

    /// Returns all recorded calls in order.
    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    /// Counts places where a call from another thread landed between a
    /// thread's fetch and its replace on the same parent.
    pub fn interleavings(&self, parent: &ParentKey) -> usize {
        let mut open: Option<ThreadId> = None;
        let mut count = 0;
        for call in self.calls.lock().iter().filter(|c| &c.parent == parent) {
            match call.kind {
                CallKind::Fetch => {
                    if open.is_some_and(|t| t != call.thread) {
                        count += 1;
                    }
                    open = Some(call.thread);
                }
                CallKind::Replace => {
                    if open != Some(call.thread) {
                        count += 1;
                    }
                    open = None;
                }
            }
        }
        count
    }

    fn record(&self, parent: &ParentKey, kind: CallKind) {
        self.calls.lock().push(Call {
            thread: thread::current().id(),
            parent: parent.clone(),
            kind,
        });
    }
}

impl RemoteCollection for RecordingRemote {
    fn fetch(&self, ctx: &RequestContext, parent: &ParentKey) -> CollaboratorResult<Vec<Rule>> {
        self.record(parent, CallKind::Fetch);
        thread::sleep(self.delay);
        self.inner.fetch(ctx, parent)
    }

    fn replace(
        &self,
        ctx: &RequestContext,
        parent: &ParentKey,
        rules: &[Rule],
    ) -> CollaboratorResult<()> {
        thread::sleep(self.delay);
        self.record(parent, CallKind::Replace);
        self.inner.replace(ctx, parent, rules)
    }
}

/// A memory remote whose fetches block while their parent's gate is closed.
#[derive(Debug, Default)]
pub struct GatedRemote {
    inner: MemoryRemoteCollection,
    state: Mutex<GateState>,
    changed: Condvar,
}

#[derive(Debug, Default)]
struct GateState {
    closed: HashSet<ParentKey>,
    parked: HashMap<ParentKey, usize>,
}

impl GatedRemote {
    /// Creates a remote with all gates open.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the wrapped memory remote.
    pub fn inner(&self) -> &MemoryRemoteCollection {
        &self.inner
    }

    /// Makes fetches of `parent` block until [`GatedRemote::open`].
    pub fn close(&self, parent: &ParentKey) {
        self.state.lock().closed.insert(parent.clone());
    }

    /// Releases fetches of `parent`.
    pub fn open(&self, parent: &ParentKey) {
        self.state.lock().closed.remove(parent);
        self.changed.notify_all();
    }

    /// Waits until at least one fetch is parked on `parent`. Returns false
    /// on timeout.
    pub fn wait_parked(&self, parent: &ParentKey, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut state = self.state.lock();
        while state.parked.get(parent).copied().unwrap_or(0) == 0 {
            if self.changed.wait_until(&mut state, deadline).timed_out() {
                return state.parked.get(parent).copied().unwrap_or(0) > 0;
            }
        }
        true
    }
}

impl RemoteCollection for GatedRemote {
    fn fetch(&self, ctx: &RequestContext, parent: &ParentKey) -> CollaboratorResult<Vec<Rule>> {
        {
            let mut state = self.state.lock();
            if state.closed.contains(parent) {
                *state.parked.entry(parent.clone()).or_default() += 1;
                self.changed.notify_all();
                while state.closed.contains(parent) {
                    self.changed.wait(&mut state);
                }
                if let Some(n) = state.parked.get_mut(parent) {
                    *n -= 1;
                }
            }
        }
        self.inner.fetch(ctx, parent)
    }

    fn replace(
        &self,
        ctx: &RequestContext,
        parent: &ParentKey,
        rules: &[Rule],
    ) -> CollaboratorResult<()> {
        self.inner.replace(ctx, parent, rules)
    }
}
