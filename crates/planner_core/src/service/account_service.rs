//! Account registry use-case service.
//!
//! # Responsibility
//! - Enforce registration, login and admin-login rules on a registry value.
//! - Apply admin maintenance (delete, password reset).
//!
//! # Invariants
//! - Usernames and passwords are trimmed; blank values never reach the registry.
//! - Duplicate detection is case-sensitive; the admin name is reserved
//!   case-insensitively.
//! - Admin login never consults the registry.
//! - A failed call leaves the registry unchanged.

use crate::config::AdminCredentials;
use crate::model::account::{AccountRecord, AccountRegistry, SessionPointer};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// User-facing authentication errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccountError {
    /// Username or password is blank after trimming.
    MissingCredentials,
    DuplicateUsername(String),
    ReservedUsername(String),
    InvalidCredentials,
}

impl Display for AccountError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingCredentials => write!(f, "Please enter both username and password."),
            Self::DuplicateUsername(_) => write!(f, "Username already exists."),
            Self::ReservedUsername(_) => write!(f, "Cannot register with this reserved username."),
            Self::InvalidCredentials => write!(f, "Invalid username or password."),
        }
    }
}

impl Error for AccountError {}

/// Registry rules bound to one admin credential pair.
pub struct AccountService {
    admin: AdminCredentials,
}

impl AccountService {
    pub fn new(admin: AdminCredentials) -> Self {
        Self { admin }
    }

    pub fn admin(&self) -> &AdminCredentials {
        &self.admin
    }

    /// Creates a new account stamped with `now` and returns its session pointer.
    pub fn register(
        &self,
        registry: &mut AccountRegistry,
        username: &str,
        password: &str,
        now: &str,
    ) -> Result<SessionPointer, AccountError> {
        let (username, password) = normalize_credentials(username, password)?;
        if self.admin.is_reserved(username) {
            return Err(AccountError::ReservedUsername(username.to_string()));
        }
        if registry.contains(username) {
            return Err(AccountError::DuplicateUsername(username.to_string()));
        }

        registry.insert(
            username,
            AccountRecord::new(password, Some(now.to_string())),
        );
        Ok(SessionPointer::user(username, Some(now.to_string())))
    }

    /// Verifies stored credentials and stamps `last_login = now`.
    pub fn login(
        &self,
        registry: &mut AccountRegistry,
        username: &str,
        password: &str,
        now: &str,
    ) -> Result<SessionPointer, AccountError> {
        let (username, password) = normalize_credentials(username, password)?;
        let record = registry
            .get_mut(username)
            .filter(|record| record.password == password)
            .ok_or(AccountError::InvalidCredentials)?;

        record.last_login = Some(now.to_string());
        Ok(SessionPointer::user(username, Some(now.to_string())))
    }

    /// Exact match against the fixed admin pair.
    pub fn admin_login(&self, username: &str, password: &str) -> Result<SessionPointer, AccountError> {
        let (username, password) = normalize_credentials(username, password)?;
        if self.admin.matches(username, password) {
            Ok(SessionPointer::admin())
        } else {
            Err(AccountError::InvalidCredentials)
        }
    }

    /// Removes one account record. Returns whether a record was removed.
    ///
    /// The reserved admin name is never removed.
    pub fn delete_account(&self, registry: &mut AccountRegistry, username: &str) -> bool {
        if self.admin.is_reserved(username) {
            return false;
        }
        registry.remove(username).is_some()
    }

    /// Overwrites one password. Blank passwords and unknown users are ignored.
    pub fn reset_password(
        &self,
        registry: &mut AccountRegistry,
        username: &str,
        new_password: &str,
    ) -> bool {
        let new_password = new_password.trim();
        if new_password.is_empty() {
            return false;
        }
        match registry.get_mut(username) {
            Some(record) => {
                record.password = new_password.to_string();
                true
            }
            None => false,
        }
    }
}

impl Default for AccountService {
    fn default() -> Self {
        Self::new(AdminCredentials::default())
    }
}

fn normalize_credentials<'a>(
    username: &'a str,
    password: &'a str,
) -> Result<(&'a str, &'a str), AccountError> {
    let username = username.trim();
    let password = password.trim();
    if username.is_empty() || password.is_empty() {
        return Err(AccountError::MissingCredentials);
    }
    Ok((username, password))
}

#[cfg(test)]
mod tests {
    use super::{AccountError, AccountService};
    use crate::model::account::AccountRegistry;

    const NOW: &str = "2024-09-01T08:00:00.000Z";
    const LATER: &str = "2024-09-02T08:00:00.000Z";

    #[test]
    fn register_trims_and_stamps_last_login() {
        let service = AccountService::default();
        let mut registry = AccountRegistry::new();
        let pointer = service
            .register(&mut registry, "  amy ", " pw ", NOW)
            .unwrap();

        assert_eq!(pointer.username, "amy");
        let record = registry.get("amy").unwrap();
        assert_eq!(record.password, "pw");
        assert_eq!(record.last_login.as_deref(), Some(NOW));
    }

    #[test]
    fn duplicate_registration_leaves_registry_unchanged() {
        let service = AccountService::default();
        let mut registry = AccountRegistry::new();
        service.register(&mut registry, "amy", "first", NOW).unwrap();
        let before = registry.clone();

        let err = service
            .register(&mut registry, "amy", "second", LATER)
            .unwrap_err();
        assert_eq!(err, AccountError::DuplicateUsername("amy".to_string()));
        assert_eq!(registry, before);
    }

    #[test]
    fn duplicate_check_is_case_sensitive() {
        let service = AccountService::default();
        let mut registry = AccountRegistry::new();
        service.register(&mut registry, "amy", "pw", NOW).unwrap();
        service.register(&mut registry, "Amy", "pw", NOW).unwrap();
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn reserved_admin_name_cannot_register_in_any_case() {
        let service = AccountService::default();
        let mut registry = AccountRegistry::new();
        for name in ["frazadmin", "FRAZADMIN", "Frazadmin", "fRaZaDmIn"] {
            let err = service.register(&mut registry, name, "pw", NOW).unwrap_err();
            assert!(matches!(err, AccountError::ReservedUsername(_)));
        }
        assert!(registry.is_empty());
    }

    #[test]
    fn login_rejects_unknown_user_and_wrong_password() {
        let service = AccountService::default();
        let mut registry = AccountRegistry::new();
        service.register(&mut registry, "amy", "pw", NOW).unwrap();

        assert_eq!(
            service.login(&mut registry, "bob", "pw", LATER).unwrap_err(),
            AccountError::InvalidCredentials
        );
        assert_eq!(
            service.login(&mut registry, "amy", "nope", LATER).unwrap_err(),
            AccountError::InvalidCredentials
        );
        assert_eq!(registry.get("amy").unwrap().last_login.as_deref(), Some(NOW));

        service.login(&mut registry, "amy", "pw", LATER).unwrap();
        assert_eq!(registry.get("amy").unwrap().last_login.as_deref(), Some(LATER));
    }

    #[test]
    fn blank_credentials_are_rejected_first() {
        let service = AccountService::default();
        let mut registry = AccountRegistry::new();
        assert_eq!(
            service.register(&mut registry, "   ", "pw", NOW).unwrap_err(),
            AccountError::MissingCredentials
        );
        assert_eq!(
            service.login(&mut registry, "amy", "", NOW).unwrap_err(),
            AccountError::MissingCredentials
        );
    }

    #[test]
    fn admin_login_requires_exact_pair() {
        let service = AccountService::default();
        assert!(service.admin_login("Frazadmin", "Frazadmin").unwrap().is_admin);
        assert!(service.admin_login("frazadmin", "Frazadmin").is_err());
    }

    #[test]
    fn reset_password_ignores_blank_and_unknown() {
        let service = AccountService::default();
        let mut registry = AccountRegistry::new();
        service.register(&mut registry, "amy", "pw", NOW).unwrap();

        assert!(!service.reset_password(&mut registry, "amy", "  "));
        assert!(!service.reset_password(&mut registry, "ghost", "new"));
        assert!(service.reset_password(&mut registry, "amy", "new"));
        assert_eq!(registry.get("amy").unwrap().password, "new");
    }

    #[test]
    fn delete_account_refuses_reserved_name() {
        let service = AccountService::default();
        let mut registry = AccountRegistry::new();
        registry.insert(
            "frazadmin",
            crate::model::account::AccountRecord::new("x", None),
        );
        assert!(!service.delete_account(&mut registry, "frazadmin"));
        assert_eq!(registry.len(), 1);
    }
}
