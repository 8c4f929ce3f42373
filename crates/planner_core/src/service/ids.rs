//! Entity id generation.
//!
//! # Invariants
//! - Generated ids never derive from user-entered text.
//! - Collision probability within one snapshot is negligible.

use std::sync::atomic::{AtomicU64, Ordering};
use uuid::Uuid;

/// Kind of entity an id is generated for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdKind {
    Teacher,
    Course,
    Unit,
}

impl IdKind {
    fn prefix(self) -> &'static str {
        match self {
            Self::Teacher => "t",
            Self::Course => "c",
            Self::Unit => "u",
        }
    }
}

/// Source of fresh entity ids.
pub trait IdGenerator {
    fn next_id(&self, kind: IdKind) -> String;
}

/// Random UUID v4 ids, e.g. `c-3f2b...`.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidIdGenerator;

impl IdGenerator for UuidIdGenerator {
    fn next_id(&self, kind: IdKind) -> String {
        format!("{}-{}", kind.prefix(), Uuid::new_v4())
    }
}

/// Monotonic counter ids (`t1`, `c2`, `u3`, ...), used for deterministic tests.
#[derive(Debug, Default)]
pub struct SequentialIdGenerator {
    next: AtomicU64,
}

impl SequentialIdGenerator {
    pub fn new() -> Self {
        Self::default()
    }
}

impl IdGenerator for SequentialIdGenerator {
    fn next_id(&self, kind: IdKind) -> String {
        let value = self.next.fetch_add(1, Ordering::Relaxed) + 1;
        format!("{}{value}", kind.prefix())
    }
}

impl<G: IdGenerator + ?Sized> IdGenerator for &G {
    fn next_id(&self, kind: IdKind) -> String {
        (**self).next_id(kind)
    }
}
