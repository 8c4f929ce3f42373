//! Core use-case services.
//!
//! # Responsibility
//! - Turn model types and the persistence gateway into UI-level operations.
//! - Keep FFI and CLI layers free of storage details.

pub mod account_service;
pub mod ids;
pub mod plan_service;
pub mod session;
