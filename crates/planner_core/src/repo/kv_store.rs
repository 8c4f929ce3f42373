//! Key-value storage contract and in-memory implementation.
//!
//! # Responsibility
//! - Define the get/set/remove-by-key surface every persistence path uses.
//! - Provide an in-memory store for tests and ephemeral sessions.
//!
//! # Invariants
//! - Values are opaque UTF-8 strings; typing happens in the gateway.
//! - `set` is a last-write-wins overwrite with no concurrency check.
//! - `apply_batch` applies every write or none when the backend supports it.

use crate::db::DbError;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type StoreResult<T> = Result<T, StoreError>;

/// Storage transport and bootstrap errors.
#[derive(Debug)]
pub enum StoreError {
    Db(DbError),
    /// Connection schema version is behind the version this binary requires.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
    /// Backend refused the write (quota, read-only medium, injected failure).
    WriteRejected(String),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "connection schema version {actual_version} is older than required {expected_version}"
            ),
            Self::MissingRequiredTable(table) => write!(f, "required table `{table}` is missing"),
            Self::WriteRejected(reason) => write!(f, "storage write rejected: {reason}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// One write inside a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KvWrite {
    Set { key: String, value: String },
    Remove { key: String },
}

/// Durable string key-value store.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> StoreResult<Option<String>>;
    fn set(&mut self, key: &str, value: &str) -> StoreResult<()>;
    /// Removing a missing key is not an error.
    fn remove(&mut self, key: &str) -> StoreResult<()>;
    /// Sorted keys starting with `prefix`.
    fn keys_with_prefix(&self, prefix: &str) -> StoreResult<Vec<String>>;

    /// Applies writes in order.
    ///
    /// The default implementation is sequential and stops at the first
    /// failure; transactional backends override it.
    fn apply_batch(&mut self, writes: &[KvWrite]) -> StoreResult<()> {
        for write in writes {
            match write {
                KvWrite::Set { key, value } => self.set(key, value)?,
                KvWrite::Remove { key } => self.remove(key)?,
            }
        }
        Ok(())
    }
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for &mut S {
    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> StoreResult<()> {
        (**self).set(key, value)
    }

    fn remove(&mut self, key: &str) -> StoreResult<()> {
        (**self).remove(key)
    }

    fn keys_with_prefix(&self, prefix: &str) -> StoreResult<Vec<String>> {
        (**self).keys_with_prefix(prefix)
    }

    fn apply_batch(&mut self, writes: &[KvWrite]) -> StoreResult<()> {
        (**self).apply_batch(writes)
    }
}

/// Process-local store backed by a sorted map.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryKeyValueStore {
    entries: BTreeMap<String, String>,
}

impl MemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl KeyValueStore for MemoryKeyValueStore {
    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> StoreResult<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> StoreResult<()> {
        self.entries.remove(key);
        Ok(())
    }

    fn keys_with_prefix(&self, prefix: &str) -> StoreResult<Vec<String>> {
        Ok(self
            .entries
            .range(prefix.to_string()..)
            .take_while(|(key, _)| key.starts_with(prefix))
            .map(|(key, _)| key.clone())
            .collect())
    }

    fn apply_batch(&mut self, writes: &[KvWrite]) -> StoreResult<()> {
        for write in writes {
            match write {
                KvWrite::Set { key, value } => {
                    self.entries.insert(key.clone(), value.clone());
                }
                KvWrite::Remove { key } => {
                    self.entries.remove(key);
                }
            }
        }
        Ok(())
    }
}
