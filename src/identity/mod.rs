//! # Identity
//!
//! Object identifiers and enumerations that differ between generations.
//!
//! - **guid**: narrow (64-bit) and wide (128-bit) identifiers, widening and narrowing
//! - **enums**: canonical object and update kinds with per-generation code tables

pub mod enums;
pub mod guid;

pub use enums::{Canonical, EnumerationMapper, ObjectKind, UpdateKind};
pub use guid::{narrow, widen, widen_detected, HighGuidKind, NarrowGuid, RealmId, WideGuid};
