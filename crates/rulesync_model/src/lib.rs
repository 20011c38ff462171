//! # rulesync Model
//!
//! Value types and pure algorithms for reconciling individually-managed
//! elements of a shared, list-valued remote object.
//!
//! This crate provides:
//! - `Rule`, `AttributeRule`, `AttributeCondition` (the auto-tag rule element)
//! - `StructuralEq`, the explicit field-by-field comparator
//! - Multiset algebra over element lists (`union_into`, `remove_each`, ...)
//! - `Snapshot` and its JSON codec
//! - `ParentKey` / `UnitId` identifiers
//!
//! This is a pure crate with no I/O operations.
//!
//! ## Element identity
//!
//! The remote API assigns no identity to list elements. Two rules are the
//! same rule iff they are structurally equal, so every membership test in
//! this crate goes through [`StructuralEq`] rather than positions or ids.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod equality;
mod error;
mod ids;
pub mod multiset;
mod rule;
mod snapshot;

pub use equality::{flag_eq, StructuralEq};
pub use error::{ModelError, ModelResult};
pub use ids::{ParentKey, UnitId};
pub use rule::{AttributeCondition, AttributeRule, Rule, DEFAULT_VALUE_NORMALIZATION};
pub use snapshot::Snapshot;
