//! Configuration for the reconciler.

use std::time::Duration;

/// What the keyed lock registry does with a per-key lock once it is idle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockRetention {
    /// Keep every per-key lock for the life of the registry.
    Retain,
    /// Drop a per-key lock once no thread holds or waits for it.
    EvictIdle,
}

/// Configuration for reconciliation operations.
#[derive(Debug, Clone)]
pub struct ReconcilerConfig {
    /// Deadline handed to the remote collaborator for each operation.
    pub request_timeout: Duration,
    /// Lock retention policy for the keyed lock registry.
    pub lock_retention: LockRetention,
    /// Skip the remote write-back when the computed list equals the fetched one.
    pub skip_unchanged_writes: bool,
}

impl ReconcilerConfig {
    /// Creates a configuration with default settings.
    pub fn new() -> Self {
        Self {
            request_timeout: Duration::from_secs(30),
            lock_retention: LockRetention::EvictIdle,
            skip_unchanged_writes: true,
        }
    }

    /// Sets the request timeout.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Sets the lock retention policy.
    pub fn with_lock_retention(mut self, retention: LockRetention) -> Self {
        self.lock_retention = retention;
        self
    }

    /// Sets whether unchanged lists are written back.
    pub fn with_skip_unchanged_writes(mut self, skip: bool) -> Self {
        self.skip_unchanged_writes = skip;
        self
    }
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self::new()
    }
}
