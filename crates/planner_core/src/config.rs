//! Core configuration.
//!
//! # Invariants
//! - The admin credential pair is compared exactly; the admin username is
//!   reserved case-insensitively for registration.
//! - The admin pair is hard-coded by default and readable by anyone with the
//!   binary. It is a fixture of the planner's behavior, not a secret.

const ENV_SEED_NEW_ACCOUNTS: &str = "PLANNER_SEED_NEW_ACCOUNTS";

/// Reserved administrator username.
pub const DEFAULT_ADMIN_USERNAME: &str = "Frazadmin";
/// Administrator password paired with [`DEFAULT_ADMIN_USERNAME`].
pub const DEFAULT_ADMIN_PASSWORD: &str = "Frazadmin";
/// Format version written into exported backups.
pub const BACKUP_FORMAT_VERSION: &str = "2.0";

/// Fixed administrator login pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminCredentials {
    pub username: String,
    pub password: String,
}

impl AdminCredentials {
    /// Exact, case-sensitive match on both fields.
    pub fn matches(&self, username: &str, password: &str) -> bool {
        self.username == username && self.password == password
    }

    /// Case-insensitive match on the username only.
    pub fn is_reserved(&self, username: &str) -> bool {
        self.username.to_lowercase() == username.trim().to_lowercase()
    }
}

impl Default for AdminCredentials {
    fn default() -> Self {
        Self {
            username: DEFAULT_ADMIN_USERNAME.to_string(),
            password: DEFAULT_ADMIN_PASSWORD.to_string(),
        }
    }
}

/// Runtime options for the session controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannerConfig {
    pub admin: AdminCredentials,
    /// Seed newly registered accounts with the bundled sample plan.
    pub seed_new_accounts: bool,
    pub backup_version: String,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            admin: AdminCredentials::default(),
            seed_new_accounts: false,
            backup_version: BACKUP_FORMAT_VERSION.to_string(),
        }
    }
}

impl PlannerConfig {
    /// Defaults overridden by process environment.
    ///
    /// - `PLANNER_SEED_NEW_ACCOUNTS`: `1|true|yes|on` enables seeding.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(raw) = std::env::var(ENV_SEED_NEW_ACCOUNTS) {
            config.seed_new_accounts = parse_flag(&raw);
        }
        config
    }
}

fn parse_flag(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
