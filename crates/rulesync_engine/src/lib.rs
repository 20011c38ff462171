//! # rulesync Engine
//!
//! Reconciliation engine for rules that live inside a shared, list-valued
//! remote object.
//!
//! This crate provides:
//! - `KeyedMutex`, a process-local lock registry with one lock per parent key
//! - `Reconciler` with the four lifecycle operations
//!   (materialize → reconcile → observe → retract)
//! - Collaborator traits for the remote list, the snapshot store and
//!   credential resolution, with in-memory and directory-backed implementations
//! - Phase-tagged errors
//!
//! ## Architecture
//!
//! Each operation runs the same critical section under its parent's lock:
//! 1. Fetch the full remote list
//! 2. Diff against the unit's snapshot and desired rules
//! 3. Write the merged list back
//! 4. Persist the new snapshot
//!
//! ## Key Invariants
//!
//! - Fetch → write-back sequences on one parent never interleave
//! - Operations on different parents never block each other
//! - Retraction only removes what the unit's snapshot says it contributed
//! - The per-key lock is released on every exit path
//! - The engine never retries; errors name the phase that failed

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod credentials;
mod error;
mod fs;
mod keyed_mutex;
mod reconciler;
mod remote;
mod store;

pub use config::{LockRetention, ReconcilerConfig};
pub use credentials::{
    CredentialSource, Credentials, EnvCredentials, RequestContext, StaticCredentials,
};
pub use error::{CollaboratorError, CollaboratorResult, Phase, ReconcileError, ReconcileResult};
pub use keyed_mutex::{KeyGuard, KeyedMutex};
pub use reconciler::{
    ConfigurationUnit, Observation, Operation, Outcome, Reconciler, ReconcilerStats,
};
pub use remote::{DirRemoteCollection, MemoryRemoteCollection, RemoteCollection};
pub use store::{FileSnapshotStore, MemorySnapshotStore, SnapshotStore};
