//! Domain model for the planning grid and local accounts.
//!
//! # Responsibility
//! - Define canonical data structures used by core business logic.
//! - Keep stored JSON shapes compatible with previously stored documents.
//!
//! # Invariants
//! - Plan data (`plan`) and credentials (`account`) have independent lifecycles.
//! - Assignment maps never store non-positive hours.

pub mod account;
pub mod plan;
