//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose session, plan and admin operations to Dart via FRB.
//! - Flatten core results into plain envelopes the UI can render directly.
//!
//! # Invariants
//! - Exported functions must not panic across FFI boundary.
//! - Every call opens the database, restores the persisted session, runs
//!   one operation and drops the connection.
//! - Envelopes never carry passwords.

use log::warn;
use planner_core::db::open_db;
use planner_core::{
    core_version as core_version_inner, init_logging as init_logging_inner, ping as ping_inner,
    AccountSummary, GridSummary, ImportSummary, PlanSnapshot, PlannerConfig, SessionController,
    SessionError, SessionState, SqliteKeyValueStore,
};
use std::path::PathBuf;
use std::sync::OnceLock;

const PLANNER_DB_FILE_NAME: &str = "planner.sqlite3";
const PLANNER_DB_PATH_ENV: &str = "PLANNER_DB_PATH";
static PLANNER_DB_PATH: OnceLock<PathBuf> = OnceLock::new();

type Controller<'conn> = SessionController<SqliteKeyValueStore<'conn>>;

/// Minimal health-check API for FRB smoke integration.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Input semantics:
/// - `level`: one of `trace|debug|info|warn|error` (case-insensitive).
/// - `log_dir`: absolute directory path where rolling logs are written.
///
/// # FFI contract
/// - Idempotent for the same `level + log_dir`.
/// - Never panics; returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err.to_string(),
    }
}

/// Current identity as seen by the UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionResponse {
    pub ok: bool,
    /// `none|user|admin`.
    pub role: String,
    pub username: Option<String>,
    pub last_login: Option<String>,
    /// Human-readable message for the auth form.
    pub message: String,
}

impl SessionResponse {
    fn from_state(state: &SessionState, message: impl Into<String>) -> Self {
        let (role, username, last_login) = match state {
            SessionState::Unauthenticated => ("none", None, None),
            SessionState::Authenticated {
                username,
                last_login,
            } => ("user", Some(username.clone()), last_login.clone()),
            SessionState::Admin => ("admin", None, None),
        };
        Self {
            ok: true,
            role: role.to_string(),
            username,
            last_login,
            message: message.into(),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            role: "none".to_string(),
            username: None,
            last_login: None,
            message: message.into(),
        }
    }
}

/// One teacher column header.
#[derive(Debug, Clone, PartialEq)]
pub struct TeacherColumn {
    pub id: String,
    pub name: String,
    pub allowance: f64,
    pub assigned: f64,
    pub remaining: f64,
    pub over_allocated: bool,
}

/// One assignment cell; only non-empty cells are listed.
#[derive(Debug, Clone, PartialEq)]
pub struct AssignmentCell {
    pub teacher_id: String,
    pub hours: f64,
}

/// One unit row.
#[derive(Debug, Clone, PartialEq)]
pub struct UnitRow {
    pub id: String,
    pub name: String,
    pub assigned: f64,
    pub cells: Vec<AssignmentCell>,
}

/// One course header row with its units.
#[derive(Debug, Clone, PartialEq)]
pub struct CourseRow {
    pub id: String,
    pub name: String,
    pub target_hours: Option<f64>,
    pub assigned: f64,
    pub over_budget: bool,
    pub units: Vec<UnitRow>,
}

/// Whole planning grid after an operation.
#[derive(Debug, Clone, PartialEq)]
pub struct GridResponse {
    pub ok: bool,
    pub teachers: Vec<TeacherColumn>,
    pub courses: Vec<CourseRow>,
    pub message: String,
    /// Set when the change is shown but could not be saved.
    pub persist_warning: Option<String>,
}

impl GridResponse {
    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            teachers: Vec::new(),
            courses: Vec::new(),
            message: message.into(),
            persist_warning: None,
        }
    }
}

/// Generic admin action envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionResponse {
    pub ok: bool,
    pub message: String,
}

impl ActionResponse {
    fn success(message: impl Into<String>) -> Self {
        Self {
            ok: true,
            message: message.into(),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            message: message.into(),
        }
    }
}

/// Registered account as listed on the admin screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountItem {
    pub username: String,
    pub last_login: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountListResponse {
    pub ok: bool,
    pub items: Vec<AccountItem>,
    pub message: String,
}

/// Backup export envelope; `json` holds the pretty-printed document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupExportResponse {
    pub ok: bool,
    pub json: Option<String>,
    pub message: String,
}

/// Registers an account and signs in as it.
///
/// # FFI contract
/// - Sync call, DB-backed execution.
/// - Never panics.
#[flutter_rust_bridge::frb(sync)]
pub fn auth_register(username: String, password: String) -> SessionResponse {
    let result = with_controller(|controller| {
        controller
            .register(&username, &password)
            .map(|state| SessionResponse::from_state(state, "Account created."))
            .map_err(|err| err.to_string())
    });
    result.unwrap_or_else(SessionResponse::failure)
}

/// Signs in as the admin pair or a registered user.
#[flutter_rust_bridge::frb(sync)]
pub fn auth_sign_in(username: String, password: String) -> SessionResponse {
    let result = with_controller(|controller| {
        controller
            .sign_in(&username, &password)
            .map(|state| SessionResponse::from_state(state, "Signed in."))
            .map_err(|err| err.to_string())
    });
    result.unwrap_or_else(SessionResponse::failure)
}

/// Clears the persisted session pointer.
#[flutter_rust_bridge::frb(sync)]
pub fn auth_logout() -> SessionResponse {
    let result = with_controller(|controller| {
        controller.logout();
        Ok(SessionResponse::from_state(controller.state(), "Signed out."))
    });
    result.unwrap_or_else(SessionResponse::failure)
}

/// Restores the persisted session and reports it.
#[flutter_rust_bridge::frb(sync)]
pub fn session_status() -> SessionResponse {
    let result = with_controller(|controller| {
        Ok(SessionResponse::from_state(controller.state(), String::new()))
    });
    result.unwrap_or_else(SessionResponse::failure)
}

/// Returns the signed-in user's grid.
#[flutter_rust_bridge::frb(sync)]
pub fn plan_grid() -> GridResponse {
    grid_call("plan_grid", |controller| {
        controller
            .snapshot()
            .cloned()
            .ok_or(SessionError::NotAuthenticated)
    })
}

#[flutter_rust_bridge::frb(sync)]
pub fn plan_add_teacher(name: String, allowance: f64) -> GridResponse {
    grid_call("plan_add_teacher", |controller| {
        controller.add_teacher(&name, allowance).cloned()
    })
}

#[flutter_rust_bridge::frb(sync)]
pub fn plan_update_teacher(teacher_id: String, name: String, allowance: f64) -> GridResponse {
    grid_call("plan_update_teacher", |controller| {
        controller
            .update_teacher(&teacher_id, &name, allowance)
            .cloned()
    })
}

#[flutter_rust_bridge::frb(sync)]
pub fn plan_delete_teacher(teacher_id: String) -> GridResponse {
    grid_call("plan_delete_teacher", |controller| {
        controller.delete_teacher(&teacher_id).cloned()
    })
}

#[flutter_rust_bridge::frb(sync)]
pub fn plan_add_course(name: String, target_hours: Option<f64>) -> GridResponse {
    grid_call("plan_add_course", |controller| {
        controller.add_course(&name, target_hours).cloned()
    })
}

#[flutter_rust_bridge::frb(sync)]
pub fn plan_update_course(
    course_id: String,
    name: String,
    target_hours: Option<f64>,
) -> GridResponse {
    grid_call("plan_update_course", |controller| {
        controller
            .update_course(&course_id, &name, target_hours)
            .cloned()
    })
}

#[flutter_rust_bridge::frb(sync)]
pub fn plan_delete_course(course_id: String) -> GridResponse {
    grid_call("plan_delete_course", |controller| {
        controller.delete_course(&course_id).cloned()
    })
}

#[flutter_rust_bridge::frb(sync)]
pub fn plan_add_unit(course_id: String, name: String) -> GridResponse {
    grid_call("plan_add_unit", |controller| {
        controller.add_unit(&course_id, &name).cloned()
    })
}

#[flutter_rust_bridge::frb(sync)]
pub fn plan_update_unit(course_id: String, unit_id: String, name: String) -> GridResponse {
    grid_call("plan_update_unit", |controller| {
        controller.update_unit(&course_id, &unit_id, &name).cloned()
    })
}

#[flutter_rust_bridge::frb(sync)]
pub fn plan_delete_unit(course_id: String, unit_id: String) -> GridResponse {
    grid_call("plan_delete_unit", |controller| {
        controller.delete_unit(&course_id, &unit_id).cloned()
    })
}

/// Sets (`hours > 0`) or clears (`hours <= 0`) one grid cell.
#[flutter_rust_bridge::frb(sync)]
pub fn plan_update_assignment(
    course_id: String,
    unit_id: String,
    teacher_id: String,
    hours: f64,
) -> GridResponse {
    grid_call("plan_update_assignment", |controller| {
        controller
            .update_assignment(&course_id, &unit_id, &teacher_id, hours)
            .cloned()
    })
}

#[flutter_rust_bridge::frb(sync)]
pub fn plan_clear_all_assignments() -> GridResponse {
    grid_call("plan_clear_all_assignments", |controller| {
        controller.clear_all_assignments().cloned()
    })
}

/// Lists registered accounts. Admin session only.
#[flutter_rust_bridge::frb(sync)]
pub fn admin_list_accounts() -> AccountListResponse {
    let result = with_controller(|controller| {
        controller.list_accounts().map_err(|err| err.to_string())
    });
    match result {
        Ok(accounts) => AccountListResponse {
            ok: true,
            message: format!("{} account(s).", accounts.len()),
            items: accounts.into_iter().map(to_account_item).collect(),
        },
        Err(message) => AccountListResponse {
            ok: false,
            items: Vec::new(),
            message,
        },
    }
}

/// Deletes an account and its plan. Admin session only.
#[flutter_rust_bridge::frb(sync)]
pub fn admin_delete_account(username: String) -> ActionResponse {
    admin_action(|controller| {
        let removed = controller.delete_account(&username)?;
        Ok(if removed {
            "Account deleted.".to_string()
        } else {
            "No such account.".to_string()
        })
    })
}

/// Overwrites one password. Blank passwords are ignored. Admin session only.
#[flutter_rust_bridge::frb(sync)]
pub fn admin_reset_password(username: String, new_password: String) -> ActionResponse {
    admin_action(|controller| {
        let changed = controller.reset_password(&username, &new_password)?;
        Ok(if changed {
            "Password reset.".to_string()
        } else {
            "Password unchanged.".to_string()
        })
    })
}

/// Builds a backup document and returns it as JSON text. Admin session only.
#[flutter_rust_bridge::frb(sync)]
pub fn admin_export_backup() -> BackupExportResponse {
    let result = with_controller(|controller| {
        let document = controller.export_backup().map_err(|err| err.to_string())?;
        document.to_json_pretty().map_err(|err| err.to_string())
    });
    match result {
        Ok(json) => BackupExportResponse {
            ok: true,
            json: Some(json),
            message: "Backup created.".to_string(),
        },
        Err(message) => BackupExportResponse {
            ok: false,
            json: None,
            message,
        },
    }
}

/// Writes a backup file at `path`. Admin session only.
#[flutter_rust_bridge::frb(sync)]
pub fn admin_export_backup_to_file(path: String) -> ActionResponse {
    admin_action(|controller| {
        let document = controller.export_backup_to_file(path.trim())?;
        Ok(format!("Backup saved with {} account(s).", document.users.len()))
    })
}

/// Restores a backup from JSON text. Admin session only.
#[flutter_rust_bridge::frb(sync)]
pub fn admin_import_backup(json: String) -> ActionResponse {
    admin_action(|controller| {
        let summary = controller.import_backup(&json)?;
        Ok(import_message(&summary))
    })
}

/// Restores a backup file. Admin session only.
#[flutter_rust_bridge::frb(sync)]
pub fn admin_import_backup_from_file(path: String) -> ActionResponse {
    admin_action(|controller| {
        let summary = controller.import_backup_from_file(path.trim())?;
        Ok(import_message(&summary))
    })
}

fn resolve_db_path() -> PathBuf {
    PLANNER_DB_PATH
        .get_or_init(|| {
            if let Ok(raw) = std::env::var(PLANNER_DB_PATH_ENV) {
                let trimmed = raw.trim();
                if !trimmed.is_empty() {
                    return PathBuf::from(trimmed);
                }
            }
            std::env::temp_dir().join(PLANNER_DB_FILE_NAME)
        })
        .clone()
}

fn with_controller<T>(
    f: impl FnOnce(&mut Controller<'_>) -> Result<T, String>,
) -> Result<T, String> {
    let db_path = resolve_db_path();
    let conn = open_db(&db_path).map_err(|err| format!("planner DB open failed: {err}"))?;
    let store = SqliteKeyValueStore::try_new(&conn)
        .map_err(|err| format!("planner store init failed: {err}"))?;
    let mut controller = SessionController::new(store, PlannerConfig::from_env());
    controller.restore();
    f(&mut controller)
}

fn grid_call(
    op: &'static str,
    f: impl FnOnce(&mut Controller<'_>) -> Result<PlanSnapshot, SessionError>,
) -> GridResponse {
    let result = with_controller(|controller| {
        let snapshot = f(controller).map_err(|err| err.to_string())?;
        Ok((snapshot, controller.take_persist_warning()))
    });
    match result {
        Ok((snapshot, persist_warning)) => {
            if persist_warning.is_some() {
                warn!("event=ffi_call module=ffi status=persist_warning op={op}");
            }
            to_grid_response(&snapshot, persist_warning)
        }
        Err(message) => GridResponse::failure(format!("{op} failed: {message}")),
    }
}

fn admin_action(
    f: impl FnOnce(&mut Controller<'_>) -> Result<String, SessionError>,
) -> ActionResponse {
    let result = with_controller(|controller| {
        let message = f(controller).map_err(|err| err.to_string())?;
        Ok(match controller.take_persist_warning() {
            Some(warning) => format!("{message} {warning}"),
            None => message,
        })
    });
    match result {
        Ok(message) => ActionResponse::success(message),
        Err(message) => ActionResponse::failure(message),
    }
}

fn to_grid_response(snapshot: &PlanSnapshot, persist_warning: Option<String>) -> GridResponse {
    let summary = GridSummary::build(snapshot);
    let teachers = summary
        .teachers
        .iter()
        .map(|teacher| TeacherColumn {
            id: teacher.id.clone(),
            name: teacher.name.clone(),
            allowance: teacher.allowance,
            assigned: teacher.assigned,
            remaining: teacher.remaining,
            over_allocated: teacher.is_over_allocated(),
        })
        .collect();

    let courses = summary
        .courses
        .iter()
        .zip(&snapshot.courses)
        .map(|(course_summary, course)| CourseRow {
            id: course_summary.id.clone(),
            name: course_summary.name.clone(),
            target_hours: course_summary.target_hours,
            assigned: course_summary.assigned,
            over_budget: course_summary.over_budget,
            units: course_summary
                .units
                .iter()
                .zip(&course.units)
                .map(|(unit_summary, unit)| UnitRow {
                    id: unit_summary.id.clone(),
                    name: unit_summary.name.clone(),
                    assigned: unit_summary.assigned,
                    cells: unit
                        .assignments
                        .iter()
                        .map(|(teacher_id, hours)| AssignmentCell {
                            teacher_id: teacher_id.to_string(),
                            hours,
                        })
                        .collect(),
                })
                .collect(),
        })
        .collect();

    GridResponse {
        ok: true,
        teachers,
        courses,
        message: String::new(),
        persist_warning,
    }
}

fn to_account_item(summary: AccountSummary) -> AccountItem {
    AccountItem {
        username: summary.username,
        last_login: summary.last_login,
    }
}

fn import_message(summary: &ImportSummary) -> String {
    let mut message = format!(
        "Restored {} account(s) and {} plan(s).",
        summary.accounts, summary.snapshots_restored
    );
    if !summary.skipped_users.is_empty() {
        message.push_str(&format!(
            " Skipped {} invalid account(s).",
            summary.skipped_users.len()
        ));
    }
    if !summary.skipped_user_data.is_empty() {
        message.push_str(&format!(
            " Skipped {} malformed plan(s).",
            summary.skipped_user_data.len()
        ));
    }
    message
}
