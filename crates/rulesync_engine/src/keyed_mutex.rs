//! Process-local mutual exclusion per key.
//!
//! A registry lock guards the key → slot map and is only held for a map
//! lookup or insert. Waiting for a busy key happens on that key's own slot,
//! so contention on one key never delays acquisitions of another.

use crate::config::LockRetention;
use parking_lot::{Condvar, Mutex};
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::trace;

/// One per-key lock.
#[derive(Default)]
struct Slot {
    held: Mutex<bool>,
    released: Condvar,
}

/// A registry handing out one exclusive lock per key.
///
/// Locks are created on first use. With [`LockRetention::Retain`] they live
/// as long as the registry; with [`LockRetention::EvictIdle`] a slot is
/// dropped once nobody holds or waits for it.
pub struct KeyedMutex<K> {
    slots: Mutex<HashMap<K, Arc<Slot>>>,
    retention: LockRetention,
}

impl<K: Eq + Hash + Clone + fmt::Debug> KeyedMutex<K> {
    /// Creates an empty registry.
    pub fn new(retention: LockRetention) -> Self {
        Self {
            slots: Mutex::new(HashMap::new()),
            retention,
        }
    }

    /// Returns the retention policy.
    pub fn retention(&self) -> LockRetention {
        self.retention
    }

    /// Blocks until the lock for `key` is held by the caller.
    pub fn acquire(&self, key: &K) -> KeyGuard<'_, K> {
        let slot = self.slot(key);
        {
            let mut held = slot.held.lock();
            if *held {
                trace!(key = ?key, "waiting for keyed lock");
            }
            while *held {
                slot.released.wait(&mut held);
            }
            *held = true;
        }
        KeyGuard::new(self, key, slot)
    }

    /// Takes the lock for `key` if it is free.
    pub fn try_acquire(&self, key: &K) -> Option<KeyGuard<'_, K>> {
        let slot = self.slot(key);
        let acquired = {
            let mut held = slot.held.lock();
            if *held {
                false
            } else {
                *held = true;
                true
            }
        };
        if acquired {
            Some(KeyGuard::new(self, key, slot))
        } else {
            self.release_slot(key, slot);
            None
        }
    }

    /// Waits up to `timeout` for the lock for `key`.
    pub fn acquire_timeout(&self, key: &K, timeout: Duration) -> Option<KeyGuard<'_, K>> {
        let deadline = Instant::now() + timeout;
        let slot = self.slot(key);
        let acquired = {
            let mut held = slot.held.lock();
            while *held {
                if slot.released.wait_until(&mut held, deadline).timed_out() {
                    break;
                }
            }
            if *held {
                false
            } else {
                *held = true;
                true
            }
        };
        if acquired {
            Some(KeyGuard::new(self, key, slot))
        } else {
            trace!(key = ?key, ?timeout, "timed out waiting for keyed lock");
            self.release_slot(key, slot);
            None
        }
    }

    /// Returns true if the lock for `key` is currently held.
    pub fn is_locked(&self, key: &K) -> bool {
        let slots = self.slots.lock();
        slots.get(key).is_some_and(|slot| *slot.held.lock())
    }

    /// Number of keys with a live slot.
    pub fn len(&self) -> usize {
        self.slots.lock().len()
    }

    /// Returns true if no key has a live slot.
    pub fn is_empty(&self) -> bool {
        self.slots.lock().is_empty()
    }

    /// Looks up or creates the slot for `key`.
    ///
    /// Slots are only cloned under the registry lock, which keeps the
    /// reference count an exact measure of holders and waiters.
    fn slot(&self, key: &K) -> Arc<Slot> {
        let mut slots = self.slots.lock();
        Arc::clone(slots.entry(key.clone()).or_default())
    }

    /// Drops the caller's reference and evicts the slot if it is now idle.
    fn release_slot(&self, key: &K, slot: Arc<Slot>) {
        if self.retention == LockRetention::Retain {
            return;
        }
        let mut slots = self.slots.lock();
        drop(slot);
        let idle = slots
            .get(key)
            .is_some_and(|entry| Arc::strong_count(entry) == 1);
        if idle {
            slots.remove(key);
        }
    }
}

impl<K: Eq + Hash + Clone + fmt::Debug> Default for KeyedMutex<K> {
    fn default() -> Self {
        Self::new(LockRetention::EvictIdle)
    }
}

impl<K> fmt::Debug for KeyedMutex<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyedMutex")
            .field("retention", &self.retention)
            .finish_non_exhaustive()
    }
}

/// Exclusive hold on one key. Released on drop, on every exit path.
#[must_use = "the keyed lock is released as soon as the guard is dropped"]
pub struct KeyGuard<'a, K: Eq + Hash + Clone + fmt::Debug> {
    owner: &'a KeyedMutex<K>,
    key: K,
    slot: Option<Arc<Slot>>,
}

impl<'a, K: Eq + Hash + Clone + fmt::Debug> KeyGuard<'a, K> {
    fn new(owner: &'a KeyedMutex<K>, key: &K, slot: Arc<Slot>) -> Self {
        Self {
            owner,
            key: key.clone(),
            slot: Some(slot),
        }
    }

    /// The key this guard holds.
    pub fn key(&self) -> &K {
        &self.key
    }
}

impl<K: Eq + Hash + Clone + fmt::Debug> Drop for KeyGuard<'_, K> {
    fn drop(&mut self) {
        if let Some(slot) = self.slot.take() {
            *slot.held.lock() = false;
            slot.released.notify_one();
            self.owner.release_slot(&self.key, slot);
        }
    }
}

impl<K: Eq + Hash + Clone + fmt::Debug> fmt::Debug for KeyGuard<'_, K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyGuard").field("key", &self.key).finish()
    }
}
