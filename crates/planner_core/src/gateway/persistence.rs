//! Typed persistence over an injected key-value store.
//!
//! # Responsibility
//! - Map the registry, per-user snapshots and the session pointer to keys.
//! - Degrade unreadable or corrupted records to empty state.
//!
//! # Invariants
//! - Reads never fail: storage errors and malformed JSON are logged and
//!   reported as "nothing stored".
//! - Writes are last-write-wins overwrites; failures are logged here and
//!   returned so callers can surface a warning.
//! - Deleting an account removes its registry entry and snapshot in one batch.
//!
//! # See also
//! - `gateway::backup` for the export/import document.

use super::backup::{BackupDocument, ImportSummary, ParsedBackup};
use crate::model::account::{AccountRegistry, SessionPointer};
use crate::model::plan::PlanSnapshot;
use crate::repo::kv_store::{KeyValueStore, KvWrite, StoreError};
use log::{info, warn};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Key holding the active session pointer.
pub const SESSION_KEY: &str = "planner_session";
/// Key holding the account registry.
pub const REGISTRY_KEY: &str = "planner_users";
/// Prefix of per-user snapshot keys.
pub const USER_DATA_PREFIX: &str = "planner_data_";

/// Returns the snapshot key for one username.
pub fn user_data_key(username: &str) -> String {
    format!("{USER_DATA_PREFIX}{username}")
}

pub type PersistResult<T> = Result<T, PersistError>;

/// Write-side persistence failure.
#[derive(Debug)]
pub enum PersistError {
    Store(StoreError),
    Serialize(serde_json::Error),
}

impl Display for PersistError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Store(err) => write!(f, "{err}"),
            Self::Serialize(err) => write!(f, "failed to serialize record: {err}"),
        }
    }
}

impl Error for PersistError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Store(err) => Some(err),
            Self::Serialize(err) => Some(err),
        }
    }
}

impl From<StoreError> for PersistError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

impl From<serde_json::Error> for PersistError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialize(value)
    }
}

/// Persistence gateway over any `KeyValueStore`.
pub struct PersistenceGateway<S: KeyValueStore> {
    store: S,
}

impl<S: KeyValueStore> PersistenceGateway<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_inner(self) -> S {
        self.store
    }

    /// Loads the registry; missing or corrupted data yields an empty registry.
    pub fn load_registry(&self) -> AccountRegistry {
        self.read_json(REGISTRY_KEY, "registry").unwrap_or_default()
    }

    pub fn save_registry(&mut self, registry: &AccountRegistry) -> PersistResult<()> {
        self.write_json(REGISTRY_KEY, registry, "registry")
    }

    /// Loads one user's snapshot, or `None` when absent or unreadable.
    pub fn load_snapshot(&self, username: &str) -> Option<PlanSnapshot> {
        self.read_json(&user_data_key(username), "snapshot")
    }

    pub fn save_snapshot(&mut self, username: &str, snapshot: &PlanSnapshot) -> PersistResult<()> {
        self.write_json(&user_data_key(username), snapshot, "snapshot")
    }

    pub fn load_session_pointer(&self) -> Option<SessionPointer> {
        self.read_json(SESSION_KEY, "session")
    }

    pub fn save_session_pointer(&mut self, pointer: &SessionPointer) -> PersistResult<()> {
        self.write_json(SESSION_KEY, pointer, "session")
    }

    pub fn clear_session_pointer(&mut self) -> PersistResult<()> {
        self.store.remove(SESSION_KEY).map_err(|err| {
            log_write_error("session", &err);
            PersistError::from(err)
        })
    }

    /// Writes the updated registry and drops the user's snapshot together.
    pub fn remove_account(
        &mut self,
        registry: &AccountRegistry,
        username: &str,
    ) -> PersistResult<()> {
        let writes = vec![
            KvWrite::Set {
                key: REGISTRY_KEY.to_string(),
                value: serde_json::to_string(registry)?,
            },
            KvWrite::Remove {
                key: user_data_key(username),
            },
        ];
        self.store.apply_batch(&writes).map_err(|err| {
            log_write_error("account_removal", &err);
            PersistError::from(err)
        })
    }

    /// Usernames that currently have a stored snapshot key.
    pub fn stored_snapshot_usernames(&self) -> Vec<String> {
        match self.store.keys_with_prefix(USER_DATA_PREFIX) {
            Ok(keys) => keys
                .into_iter()
                .filter_map(|key| key.strip_prefix(USER_DATA_PREFIX).map(str::to_string))
                .collect(),
            Err(err) => {
                warn!(
                    "event=store_read module=gateway status=error record=snapshot_keys error={err}"
                );
                Vec::new()
            }
        }
    }

    /// Collects the registry and every registered user's snapshot.
    ///
    /// Accounts whose snapshot is missing or unreadable are exported without
    /// a `userData` entry.
    pub fn export_backup(&self, version: &str, timestamp: String) -> BackupDocument {
        let users = self.load_registry();
        let user_data: BTreeMap<String, PlanSnapshot> = users
            .usernames()
            .into_iter()
            .filter_map(|username| {
                let snapshot = self.load_snapshot(&username)?;
                Some((username, snapshot))
            })
            .collect();

        info!(
            "event=backup_export module=gateway status=ok accounts={} snapshots={}",
            users.len(),
            user_data.len()
        );

        BackupDocument {
            version: version.to_string(),
            timestamp,
            users,
            user_data,
        }
    }

    /// Overwrites the registry and every included snapshot in one batch.
    ///
    /// Snapshots of usernames not present in the backup stay untouched.
    pub fn import_backup(&mut self, parsed: &ParsedBackup) -> PersistResult<ImportSummary> {
        let document = &parsed.document;
        let mut writes = Vec::with_capacity(document.user_data.len() + 1);
        writes.push(KvWrite::Set {
            key: REGISTRY_KEY.to_string(),
            value: serde_json::to_string(&document.users)?,
        });
        for (username, snapshot) in &document.user_data {
            writes.push(KvWrite::Set {
                key: user_data_key(username),
                value: serde_json::to_string(snapshot)?,
            });
        }

        self.store.apply_batch(&writes).map_err(|err| {
            log_write_error("backup_import", &err);
            PersistError::from(err)
        })?;

        let summary = ImportSummary {
            accounts: document.users.len(),
            snapshots_restored: document.user_data.len(),
            skipped_users: parsed.skipped_users.clone(),
            skipped_user_data: parsed.skipped_user_data.clone(),
        };
        info!(
            "event=backup_import module=gateway status=ok accounts={} snapshots={} skipped_users={} skipped_data={}",
            summary.accounts,
            summary.snapshots_restored,
            summary.skipped_users.len(),
            summary.skipped_user_data.len()
        );
        Ok(summary)
    }

    fn read_json<T: DeserializeOwned>(&self, key: &str, record: &'static str) -> Option<T> {
        let raw = match self.store.get(key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(err) => {
                warn!("event=store_read module=gateway status=error record={record} error={err}");
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(err) => {
                warn!(
                    "event=store_read module=gateway status=corrupt record={record} bytes={} error={err}",
                    raw.len()
                );
                None
            }
        }
    }

    fn write_json<T: Serialize>(
        &mut self,
        key: &str,
        value: &T,
        record: &'static str,
    ) -> PersistResult<()> {
        let raw = serde_json::to_string(value)?;
        self.store.set(key, &raw).map_err(|err| {
            log_write_error(record, &err);
            PersistError::from(err)
        })
    }
}

fn log_write_error(record: &str, err: &StoreError) {
    warn!("event=store_write module=gateway status=error record={record} error={err}");
}

#[cfg(test)]
mod tests {
    use super::{user_data_key, PersistenceGateway, REGISTRY_KEY, SESSION_KEY};
    use crate::model::account::{AccountRecord, AccountRegistry, SessionPointer};
    use crate::model::plan::{PlanSnapshot, Teacher};
    use crate::repo::kv_store::{KeyValueStore, MemoryKeyValueStore};

    #[test]
    fn corrupted_registry_loads_as_empty() {
        let mut store = MemoryKeyValueStore::new();
        store.set(REGISTRY_KEY, "{not json").unwrap();
        let gateway = PersistenceGateway::new(store);
        assert!(gateway.load_registry().is_empty());
    }

    #[test]
    fn corrupted_snapshot_and_pointer_load_as_none() {
        let mut store = MemoryKeyValueStore::new();
        store.set(&user_data_key("amy"), "[1,2,3]").unwrap();
        store.set(SESSION_KEY, "42").unwrap();
        let gateway = PersistenceGateway::new(store);
        assert!(gateway.load_snapshot("amy").is_none());
        assert!(gateway.load_session_pointer().is_none());
    }

    #[test]
    fn snapshot_roundtrips_under_user_key() {
        let mut gateway = PersistenceGateway::new(MemoryKeyValueStore::new());
        let snapshot = PlanSnapshot::new(vec![Teacher::new("SS", "SS", 23.0)], Vec::new());
        gateway.save_snapshot("amy", &snapshot).unwrap();

        assert_eq!(gateway.load_snapshot("amy"), Some(snapshot));
        assert!(gateway
            .store()
            .get("planner_data_amy")
            .unwrap()
            .is_some());
        assert_eq!(gateway.stored_snapshot_usernames(), vec!["amy"]);
    }

    #[test]
    fn remove_account_drops_registry_entry_and_snapshot() {
        let mut gateway = PersistenceGateway::new(MemoryKeyValueStore::new());
        let mut registry = AccountRegistry::new();
        registry.insert("amy", AccountRecord::new("pw", None));
        gateway.save_registry(&registry).unwrap();
        gateway
            .save_snapshot("amy", &PlanSnapshot::default())
            .unwrap();

        registry.remove("amy");
        gateway.remove_account(&registry, "amy").unwrap();

        assert!(gateway.load_registry().is_empty());
        assert!(gateway.load_snapshot("amy").is_none());
    }

    #[test]
    fn session_pointer_can_be_cleared() {
        let mut gateway = PersistenceGateway::new(MemoryKeyValueStore::new());
        gateway
            .save_session_pointer(&SessionPointer::admin())
            .unwrap();
        assert!(gateway.load_session_pointer().unwrap().is_admin);

        gateway.clear_session_pointer().unwrap();
        assert!(gateway.load_session_pointer().is_none());
    }
}
