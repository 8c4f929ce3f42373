//! Aggregation engine.
//!
//! # Responsibility
//! - Derive read-only totals from a plan snapshot.
//!
//! # Invariants
//! - Deterministic and side-effect-free; nothing is cached between calls.

pub mod summary;
pub mod totals;
