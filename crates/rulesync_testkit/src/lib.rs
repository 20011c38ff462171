//! # rulesync Testkit
//!
//! Test utilities for rulesync.
//!
//! This crate provides:
//! - Fixtures: reconcilers pre-wired to in-memory or directory-backed
//!   collaborators
//! - Property-based test generators using proptest
//! - Concurrency harnesses: a remote that records per-parent call order,
//!   and a remote that can hold a parent's fetch until released
//!
//! ## Usage
//!
//! ```rust,ignore
//! use rulesync_testkit::prelude::*;
//!
//! #[test]
//! fn test_with_reconciler() {
//!     let setup = MemorySetup::with_parents(&["tag-1"]);
//!     setup.reconciler.materialize(&setup.unit("tag-1", "a"), &[rule("X", true)]).unwrap();
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;
pub mod harness;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use crate::harness::*;
}

pub use fixtures::*;
pub use generators::*;
pub use harness::*;
