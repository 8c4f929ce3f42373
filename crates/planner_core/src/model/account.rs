//! Account registry and session pointer records.
//!
//! # Responsibility
//! - Define the username -> credential mapping kept apart from plan data.
//! - Define the persisted "who is signed in" pointer.
//!
//! # Invariants
//! - One record per username; the map key is the username.
//! - Passwords are stored in plaintext. This mirrors the observed behavior of
//!   the web app and is not a security boundary.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Credentials and last-login metadata for one registered username.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountRecord {
    pub password: String,
    /// ISO-8601 timestamp of the latest successful login or registration.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_login: Option<String>,
}

impl AccountRecord {
    pub fn new(password: impl Into<String>, last_login: Option<String>) -> Self {
        Self {
            password: password.into(),
            last_login,
        }
    }
}

/// Set of known login credentials, serialized as a plain JSON object.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountRegistry {
    accounts: BTreeMap<String, AccountRecord>,
}

impl AccountRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, username: &str) -> Option<&AccountRecord> {
        self.accounts.get(username)
    }

    pub fn get_mut(&mut self, username: &str) -> Option<&mut AccountRecord> {
        self.accounts.get_mut(username)
    }

    pub fn contains(&self, username: &str) -> bool {
        self.accounts.contains_key(username)
    }

    /// Inserts or replaces one record.
    pub fn insert(&mut self, username: impl Into<String>, record: AccountRecord) {
        self.accounts.insert(username.into(), record);
    }

    pub fn remove(&mut self, username: &str) -> Option<AccountRecord> {
        self.accounts.remove(username)
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    /// Sorted usernames.
    pub fn usernames(&self) -> Vec<String> {
        self.accounts.keys().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &AccountRecord)> {
        self.accounts
            .iter()
            .map(|(username, record)| (username.as_str(), record))
    }

    /// Admin listing without password material.
    pub fn summaries(&self) -> Vec<AccountSummary> {
        self.iter()
            .map(|(username, record)| AccountSummary {
                username: username.to_string(),
                last_login: record.last_login.clone(),
            })
            .collect()
    }
}

/// Admin-facing view of one account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountSummary {
    pub username: String,
    pub last_login: Option<String>,
}

/// Persisted marker of the active user or admin session.
///
/// Serialized as `{username, lastLogin}` for users and
/// `{isAdmin: true, username: "Admin"}` for the administrator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionPointer {
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_login: Option<String>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub is_admin: bool,
}

/// Display name stored in the admin session pointer.
pub const ADMIN_POINTER_NAME: &str = "Admin";

impl SessionPointer {
    pub fn user(username: impl Into<String>, last_login: Option<String>) -> Self {
        Self {
            username: username.into(),
            last_login,
            is_admin: false,
        }
    }

    pub fn admin() -> Self {
        Self {
            username: ADMIN_POINTER_NAME.to_string(),
            last_login: None,
            is_admin: true,
        }
    }
}

fn is_false(value: &bool) -> bool {
    !*value
}
