//! Backup document format and lenient import parsing.
//!
//! # Responsibility
//! - Define the single JSON document holding every account and snapshot.
//! - Validate imports: only `users` is mandatory.
//!
//! # Invariants
//! - A missing or non-object `users` field rejects the whole document.
//! - A `users` record without a string `password` is skipped; a non-string
//!   `lastLogin` is dropped from an otherwise valid record.
//! - The reserved admin name is never imported as an account.
//! - A missing or malformed `userData` entry skips that user only.
//! - Files are read fully into memory before any import write starts.

use crate::config::AdminCredentials;
use crate::model::account::{AccountRecord, AccountRegistry};
use crate::model::plan::PlanSnapshot;
use log::warn;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::Path;

/// Whole-dataset backup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupDocument {
    pub version: String,
    /// ISO-8601 export time.
    pub timestamp: String,
    pub users: AccountRegistry,
    #[serde(default)]
    pub user_data: BTreeMap<String, PlanSnapshot>,
}

impl BackupDocument {
    pub fn to_json_pretty(&self) -> Result<String, BackupError> {
        serde_json::to_string_pretty(self).map_err(BackupError::Serialize)
    }

    /// Writes the document as pretty JSON, creating parent directories.
    pub fn write_to_file(&self, path: impl AsRef<Path>) -> Result<(), BackupError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(BackupError::Io)?;
        }
        std::fs::write(path, self.to_json_pretty()?).map_err(BackupError::Io)
    }
}

/// Backup accepted for import, with per-user entries that had to be dropped.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedBackup {
    pub document: BackupDocument,
    /// Usernames whose `users` record was malformed or reserved.
    pub skipped_users: Vec<String>,
    /// Usernames whose `userData` entry was malformed or reserved.
    pub skipped_user_data: Vec<String>,
}

/// Outcome of a successful import.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportSummary {
    pub accounts: usize,
    pub snapshots_restored: usize,
    pub skipped_users: Vec<String>,
    pub skipped_user_data: Vec<String>,
}

/// Backup export/import failure.
#[derive(Debug)]
pub enum BackupError {
    /// Document is not JSON or lacks a usable `users` mapping.
    InvalidBackupFormat(String),
    Io(std::io::Error),
    Serialize(serde_json::Error),
}

impl Display for BackupError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidBackupFormat(details) => write!(f, "invalid backup format: {details}"),
            Self::Io(err) => write!(f, "backup file error: {err}"),
            Self::Serialize(err) => write!(f, "failed to serialize backup: {err}"),
        }
    }
}

impl Error for BackupError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidBackupFormat(_) => None,
            Self::Io(err) => Some(err),
            Self::Serialize(err) => Some(err),
        }
    }
}

/// Parses backup JSON text.
///
/// `version` and `timestamp` are informational; missing values parse as
/// empty strings. Entries named like the admin account are skipped.
pub fn parse_backup(raw: &str, admin: &AdminCredentials) -> Result<ParsedBackup, BackupError> {
    let root: Value = serde_json::from_str(raw)
        .map_err(|err| BackupError::InvalidBackupFormat(format!("not valid JSON: {err}")))?;
    let Value::Object(mut root) = root else {
        return Err(BackupError::InvalidBackupFormat(
            "document must be a JSON object".to_string(),
        ));
    };

    let user_entries = match root.remove("users") {
        Some(Value::Object(entries)) => entries,
        Some(_) => {
            return Err(BackupError::InvalidBackupFormat(
                "`users` must be an object".to_string(),
            ))
        }
        None => {
            return Err(BackupError::InvalidBackupFormat(
                "missing `users` registry".to_string(),
            ))
        }
    };

    let mut users = AccountRegistry::new();
    let mut skipped_users = Vec::new();
    for (username, entry) in user_entries {
        if admin.is_reserved(&username) {
            warn!("event=backup_parse module=gateway status=skipped record=user reason=reserved");
            skipped_users.push(username);
            continue;
        }
        match parse_account_record(entry) {
            Some(record) => users.insert(username, record),
            None => {
                warn!("event=backup_parse module=gateway status=skipped record=user reason=malformed");
                skipped_users.push(username);
            }
        }
    }

    let mut user_data = BTreeMap::new();
    let mut skipped_user_data = Vec::new();
    if let Some(Value::Object(entries)) = root.remove("userData") {
        for (username, entry) in entries {
            if admin.is_reserved(&username) {
                skipped_user_data.push(username);
                continue;
            }
            match serde_json::from_value::<PlanSnapshot>(entry) {
                Ok(snapshot) => {
                    user_data.insert(username, snapshot);
                }
                Err(err) => {
                    warn!("event=backup_parse module=gateway status=skipped record=user_data error={err}");
                    skipped_user_data.push(username);
                }
            }
        }
    }

    Ok(ParsedBackup {
        document: BackupDocument {
            version: string_field(&root, "version"),
            timestamp: string_field(&root, "timestamp"),
            users,
            user_data,
        },
        skipped_users,
        skipped_user_data,
    })
}

/// Reads a backup file fully, then parses it.
pub fn read_backup_file(
    path: impl AsRef<Path>,
    admin: &AdminCredentials,
) -> Result<ParsedBackup, BackupError> {
    let raw = std::fs::read_to_string(path).map_err(BackupError::Io)?;
    parse_backup(&raw, admin)
}

/// Accepts `{password: string, lastLogin?: string}`; other `lastLogin`
/// values are dropped.
fn parse_account_record(entry: Value) -> Option<AccountRecord> {
    let Value::Object(fields) = entry else {
        return None;
    };
    let password = fields.get("password")?.as_str()?;
    let last_login = fields
        .get("lastLogin")
        .and_then(Value::as_str)
        .map(str::to_string);
    Some(AccountRecord::new(password, last_login))
}

fn string_field(root: &serde_json::Map<String, Value>, field: &str) -> String {
    root.get(field)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}
