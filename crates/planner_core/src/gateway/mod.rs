//! Persistence gateway.
//!
//! # Responsibility
//! - Read and write planner records through an injected `KeyValueStore`.
//! - Produce and apply whole-dataset backups.
//!
//! # Invariants
//! - Nothing read from storage is trusted; corrupted records become empty
//!   state rather than errors.

pub mod backup;
pub mod persistence;
