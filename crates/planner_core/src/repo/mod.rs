//! Storage layer abstractions and implementations.
//!
//! # Responsibility
//! - Define the injected key-value storage contract.
//! - Isolate SQLite details from the persistence gateway.
//!
//! # Invariants
//! - Stores deal in raw strings; they never parse planner documents.

pub mod kv_store;
pub mod sqlite_store;
