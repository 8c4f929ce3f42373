//! Session controller.
//!
//! # Responsibility
//! - Resolve the active identity (user, admin or nobody) and persist it.
//! - Load the active user's snapshot and route plan mutations to it.
//! - Gate admin maintenance and backup operations.
//!
//! # Invariants
//! - Every state-changing call takes `&mut self`, so registry reads and
//!   writes of one operation (including a backup import) never interleave
//!   with another operation.
//! - A changed snapshot is persisted before the call returns.
//! - Storage write failures never abort an operation; they are logged and
//!   kept as a pending warning for the UI.
//!
//! # See also
//! - `gateway::persistence` for record layout.

use crate::aggregate::summary::GridSummary;
use crate::clock::{Clock, SystemClock};
use crate::config::PlannerConfig;
use crate::gateway::backup::{
    parse_backup, read_backup_file, BackupDocument, BackupError, ImportSummary, ParsedBackup,
};
use crate::gateway::persistence::{PersistError, PersistResult, PersistenceGateway};
use crate::model::account::{AccountSummary, SessionPointer};
use crate::model::plan::PlanSnapshot;
use crate::repo::kv_store::KeyValueStore;
use crate::seed::sample_plan;
use crate::service::account_service::{AccountError, AccountService};
use crate::service::ids::{IdGenerator, UuidIdGenerator};
use crate::service::plan_service::PlanService;
use log::{debug, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::Path;

/// Who is currently signed in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Unauthenticated,
    Authenticated {
        username: String,
        last_login: Option<String>,
    },
    Admin,
}

impl SessionState {
    pub fn username(&self) -> Option<&str> {
        match self {
            Self::Authenticated { username, .. } => Some(username.as_str()),
            _ => None,
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Self::Admin)
    }
}

/// Errors surfaced by session-level operations.
#[derive(Debug)]
pub enum SessionError {
    Account(AccountError),
    Backup(BackupError),
    /// A write that must succeed to be meaningful (backup import) failed.
    Persist(PersistError),
    /// Operation needs the admin session.
    AdminRequired,
    /// Operation needs a signed-in user.
    NotAuthenticated,
}

impl Display for SessionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Account(err) => write!(f, "{err}"),
            Self::Backup(err) => write!(f, "{err}"),
            Self::Persist(err) => write!(f, "storage write failed: {err}"),
            Self::AdminRequired => write!(f, "admin session required"),
            Self::NotAuthenticated => write!(f, "no user is signed in"),
        }
    }
}

impl Error for SessionError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Account(err) => Some(err),
            Self::Backup(err) => Some(err),
            Self::Persist(err) => Some(err),
            Self::AdminRequired | Self::NotAuthenticated => None,
        }
    }
}

impl From<AccountError> for SessionError {
    fn from(value: AccountError) -> Self {
        Self::Account(value)
    }
}

impl From<BackupError> for SessionError {
    fn from(value: BackupError) -> Self {
        Self::Backup(value)
    }
}

impl From<PersistError> for SessionError {
    fn from(value: PersistError) -> Self {
        Self::Persist(value)
    }
}

pub type SessionResult<T> = Result<T, SessionError>;

/// Identity resolution plus plan routing over one key-value store.
pub struct SessionController<
    S: KeyValueStore,
    G: IdGenerator = UuidIdGenerator,
    C: Clock = SystemClock,
> {
    gateway: PersistenceGateway<S>,
    config: PlannerConfig,
    accounts: AccountService,
    plans: PlanService<G>,
    clock: C,
    state: SessionState,
    snapshot: PlanSnapshot,
    persist_warning: Option<String>,
}

impl<S: KeyValueStore> SessionController<S> {
    /// Creates an unauthenticated controller with UUID ids and the system clock.
    pub fn new(store: S, config: PlannerConfig) -> Self {
        Self::with_parts(store, config, UuidIdGenerator, SystemClock)
    }
}

impl<S: KeyValueStore, G: IdGenerator, C: Clock> SessionController<S, G, C> {
    pub fn with_parts(store: S, config: PlannerConfig, ids: G, clock: C) -> Self {
        let accounts = AccountService::new(config.admin.clone());
        Self {
            gateway: PersistenceGateway::new(store),
            config,
            accounts,
            plans: PlanService::new(ids),
            clock,
            state: SessionState::Unauthenticated,
            snapshot: PlanSnapshot::default(),
            persist_warning: None,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    pub fn gateway(&self) -> &PersistenceGateway<S> {
        &self.gateway
    }

    pub fn into_store(self) -> S {
        self.gateway.into_inner()
    }

    /// Takes the warning left by the latest failed storage write, if any.
    pub fn take_persist_warning(&mut self) -> Option<String> {
        self.persist_warning.take()
    }

    /// Re-establishes the session recorded by the persisted pointer.
    ///
    /// A user pointer whose account no longer exists is cleared.
    pub fn restore(&mut self) -> &SessionState {
        match self.gateway.load_session_pointer() {
            Some(pointer) if pointer.is_admin => {
                self.enter_admin();
            }
            Some(pointer) => {
                if self.gateway.load_registry().contains(&pointer.username) {
                    let snapshot = self
                        .gateway
                        .load_snapshot(&pointer.username)
                        .unwrap_or_default();
                    self.enter_user(pointer.username, pointer.last_login, snapshot);
                } else {
                    warn!("event=session_restore module=session status=stale_pointer");
                    self.reset_state();
                    let result = self.gateway.clear_session_pointer();
                    self.note_persist(result);
                }
            }
            None => self.reset_state(),
        }
        info!(
            "event=session_restore module=session status=ok role={}",
            role_label(&self.state)
        );
        &self.state
    }

    /// Registers a new account and signs in as it.
    pub fn register(&mut self, username: &str, password: &str) -> SessionResult<&SessionState> {
        let now = self.clock.now_iso();
        let mut registry = self.gateway.load_registry();
        let pointer = match self.accounts.register(&mut registry, username, password, &now) {
            Ok(pointer) => pointer,
            Err(err) => {
                info!(
                    "event=auth_register module=session status=rejected reason={}",
                    error_code(&err)
                );
                return Err(err.into());
            }
        };

        let result = self.gateway.save_registry(&registry);
        self.note_persist(result);

        let snapshot = match self.gateway.load_snapshot(&pointer.username) {
            Some(existing) => existing,
            None if self.config.seed_new_accounts => {
                let seeded = sample_plan();
                let result = self.gateway.save_snapshot(&pointer.username, &seeded);
                self.note_persist(result);
                seeded
            }
            None => PlanSnapshot::default(),
        };

        self.sign_in_user(pointer, snapshot);
        info!(
            "event=auth_register module=session status=ok accounts={}",
            registry.len()
        );
        Ok(&self.state)
    }

    /// Signs in with stored credentials.
    pub fn login(&mut self, username: &str, password: &str) -> SessionResult<&SessionState> {
        let now = self.clock.now_iso();
        let mut registry = self.gateway.load_registry();
        let pointer = match self.accounts.login(&mut registry, username, password, &now) {
            Ok(pointer) => pointer,
            Err(err) => {
                info!(
                    "event=auth_login module=session status=rejected reason={}",
                    error_code(&err)
                );
                return Err(err.into());
            }
        };

        let result = self.gateway.save_registry(&registry);
        self.note_persist(result);

        let snapshot = self
            .gateway
            .load_snapshot(&pointer.username)
            .unwrap_or_default();
        self.sign_in_user(pointer, snapshot);
        info!("event=auth_login module=session status=ok role=user");
        Ok(&self.state)
    }

    /// Signs in as administrator using the fixed credential pair.
    pub fn admin_login(&mut self, username: &str, password: &str) -> SessionResult<&SessionState> {
        let pointer = match self.accounts.admin_login(username, password) {
            Ok(pointer) => pointer,
            Err(err) => {
                info!(
                    "event=auth_login module=session status=rejected role=admin reason={}",
                    error_code(&err)
                );
                return Err(err.into());
            }
        };
        let result = self.gateway.save_session_pointer(&pointer);
        self.note_persist(result);
        self.enter_admin();
        info!("event=auth_login module=session status=ok role=admin");
        Ok(&self.state)
    }

    /// Single sign-in form: the admin pair opens the admin session, anything
    /// else is checked against the registry.
    pub fn sign_in(&mut self, username: &str, password: &str) -> SessionResult<&SessionState> {
        if self.config.admin.matches(username.trim(), password.trim()) {
            self.admin_login(username, password)
        } else {
            self.login(username, password)
        }
    }

    /// Clears the session pointer. Stored data is kept.
    pub fn logout(&mut self) {
        let role = role_label(&self.state);
        self.reset_state();
        let result = self.gateway.clear_session_pointer();
        self.note_persist(result);
        info!("event=auth_logout module=session status=ok role={role}");
    }

    /// Active user's snapshot, when a user is signed in.
    pub fn snapshot(&self) -> Option<&PlanSnapshot> {
        self.state.username().map(|_| &self.snapshot)
    }

    /// Grid summary of the active user's snapshot.
    pub fn grid_summary(&self) -> SessionResult<GridSummary> {
        self.snapshot()
            .map(GridSummary::build)
            .ok_or(SessionError::NotAuthenticated)
    }

    pub fn add_teacher(&mut self, name: &str, allowance: f64) -> SessionResult<&PlanSnapshot> {
        self.apply("add_teacher", |plans, snapshot| {
            plans.add_teacher(snapshot, name, allowance)
        })
    }

    pub fn update_teacher(
        &mut self,
        teacher_id: &str,
        name: &str,
        allowance: f64,
    ) -> SessionResult<&PlanSnapshot> {
        self.apply("update_teacher", |plans, snapshot| {
            plans.update_teacher(snapshot, teacher_id, name, allowance)
        })
    }

    pub fn delete_teacher(&mut self, teacher_id: &str) -> SessionResult<&PlanSnapshot> {
        self.apply("delete_teacher", |plans, snapshot| {
            plans.delete_teacher(snapshot, teacher_id)
        })
    }

    pub fn add_course(
        &mut self,
        name: &str,
        target_hours: Option<f64>,
    ) -> SessionResult<&PlanSnapshot> {
        self.apply("add_course", |plans, snapshot| {
            plans.add_course(snapshot, name, target_hours)
        })
    }

    pub fn update_course(
        &mut self,
        course_id: &str,
        name: &str,
        target_hours: Option<f64>,
    ) -> SessionResult<&PlanSnapshot> {
        self.apply("update_course", |plans, snapshot| {
            plans.update_course(snapshot, course_id, name, target_hours)
        })
    }

    pub fn delete_course(&mut self, course_id: &str) -> SessionResult<&PlanSnapshot> {
        self.apply("delete_course", |plans, snapshot| {
            plans.delete_course(snapshot, course_id)
        })
    }

    pub fn add_unit(&mut self, course_id: &str, name: &str) -> SessionResult<&PlanSnapshot> {
        self.apply("add_unit", |plans, snapshot| {
            plans.add_unit(snapshot, course_id, name)
        })
    }

    pub fn update_unit(
        &mut self,
        course_id: &str,
        unit_id: &str,
        name: &str,
    ) -> SessionResult<&PlanSnapshot> {
        self.apply("update_unit", |plans, snapshot| {
            plans.update_unit(snapshot, course_id, unit_id, name)
        })
    }

    pub fn delete_unit(&mut self, course_id: &str, unit_id: &str) -> SessionResult<&PlanSnapshot> {
        self.apply("delete_unit", |plans, snapshot| {
            plans.delete_unit(snapshot, course_id, unit_id)
        })
    }

    pub fn update_assignment(
        &mut self,
        course_id: &str,
        unit_id: &str,
        teacher_id: &str,
        hours: f64,
    ) -> SessionResult<&PlanSnapshot> {
        self.apply("update_assignment", |plans, snapshot| {
            plans.update_assignment(snapshot, course_id, unit_id, teacher_id, hours)
        })
    }

    pub fn clear_all_assignments(&mut self) -> SessionResult<&PlanSnapshot> {
        self.apply("clear_all_assignments", |plans, snapshot| {
            plans.clear_all_assignments(snapshot)
        })
    }

    /// Lists registered accounts (admin only).
    pub fn list_accounts(&self) -> SessionResult<Vec<AccountSummary>> {
        self.require_admin()?;
        Ok(self.gateway.load_registry().summaries())
    }

    /// Deletes an account and its snapshot together (admin only).
    ///
    /// Returns `false` when the username is unknown or reserved.
    pub fn delete_account(&mut self, username: &str) -> SessionResult<bool> {
        self.require_admin()?;
        let mut registry = self.gateway.load_registry();
        if !self.accounts.delete_account(&mut registry, username) {
            return Ok(false);
        }
        let result = self.gateway.remove_account(&registry, username);
        self.note_persist(result);
        info!(
            "event=admin_delete_account module=session status=ok accounts={}",
            registry.len()
        );
        Ok(true)
    }

    /// Overwrites one account's password (admin only).
    pub fn reset_password(&mut self, username: &str, new_password: &str) -> SessionResult<bool> {
        self.require_admin()?;
        let mut registry = self.gateway.load_registry();
        if !self
            .accounts
            .reset_password(&mut registry, username, new_password)
        {
            return Ok(false);
        }
        let result = self.gateway.save_registry(&registry);
        self.note_persist(result);
        info!("event=admin_reset_password module=session status=ok");
        Ok(true)
    }

    /// Builds a backup of every account and snapshot (admin only).
    pub fn export_backup(&self) -> SessionResult<BackupDocument> {
        self.require_admin()?;
        Ok(self
            .gateway
            .export_backup(&self.config.backup_version, self.clock.now_iso()))
    }

    /// Writes a backup file (admin only).
    pub fn export_backup_to_file(&self, path: impl AsRef<Path>) -> SessionResult<BackupDocument> {
        let document = self.export_backup()?;
        document.write_to_file(path)?;
        Ok(document)
    }

    /// Restores a backup from JSON text (admin only).
    pub fn import_backup(&mut self, raw: &str) -> SessionResult<ImportSummary> {
        self.require_admin()?;
        let parsed = parse_backup(raw, &self.config.admin)?;
        self.import_parsed(&parsed)
    }

    /// Reads a backup file completely, then restores it (admin only).
    pub fn import_backup_from_file(&mut self, path: impl AsRef<Path>) -> SessionResult<ImportSummary> {
        self.require_admin()?;
        let parsed = read_backup_file(path, &self.config.admin)?;
        self.import_parsed(&parsed)
    }

    fn import_parsed(&mut self, parsed: &ParsedBackup) -> SessionResult<ImportSummary> {
        Ok(self.gateway.import_backup(parsed)?)
    }

    fn apply(
        &mut self,
        op: &'static str,
        mutate: impl FnOnce(&PlanService<G>, &PlanSnapshot) -> PlanSnapshot,
    ) -> SessionResult<&PlanSnapshot> {
        let username = match &self.state {
            SessionState::Authenticated { username, .. } => username.clone(),
            _ => return Err(SessionError::NotAuthenticated),
        };

        let next = mutate(&self.plans, &self.snapshot);
        if next != self.snapshot {
            let result = self.gateway.save_snapshot(&username, &next);
            self.note_persist(result);
            self.snapshot = next;
            debug!("event=plan_mutation module=session status=ok op={op} changed=true");
        } else {
            debug!("event=plan_mutation module=session status=ok op={op} changed=false");
        }
        Ok(&self.snapshot)
    }

    fn sign_in_user(&mut self, pointer: SessionPointer, snapshot: PlanSnapshot) {
        let result = self.gateway.save_session_pointer(&pointer);
        self.note_persist(result);
        self.enter_user(pointer.username, pointer.last_login, snapshot);
    }

    fn enter_user(&mut self, username: String, last_login: Option<String>, snapshot: PlanSnapshot) {
        self.state = SessionState::Authenticated {
            username,
            last_login,
        };
        self.snapshot = snapshot;
    }

    fn enter_admin(&mut self) {
        self.state = SessionState::Admin;
        self.snapshot = PlanSnapshot::default();
    }

    fn reset_state(&mut self) {
        self.state = SessionState::Unauthenticated;
        self.snapshot = PlanSnapshot::default();
    }

    fn require_admin(&self) -> SessionResult<()> {
        if self.state.is_admin() {
            Ok(())
        } else {
            Err(SessionError::AdminRequired)
        }
    }

    fn note_persist(&mut self, result: PersistResult<()>) {
        if let Err(err) = result {
            self.persist_warning = Some(format!("Changes could not be saved: {err}"));
        }
    }
}

fn role_label(state: &SessionState) -> &'static str {
    match state {
        SessionState::Unauthenticated => "none",
        SessionState::Authenticated { .. } => "user",
        SessionState::Admin => "admin",
    }
}

fn error_code(err: &AccountError) -> &'static str {
    match err {
        AccountError::MissingCredentials => "missing_credentials",
        AccountError::DuplicateUsername(_) => "duplicate_username",
        AccountError::ReservedUsername(_) => "reserved_username",
        AccountError::InvalidCredentials => "invalid_credentials",
    }
}
