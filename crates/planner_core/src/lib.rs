//! Core domain logic for the course-hours planner.
//! This crate is the single source of truth for plan and account invariants.

pub mod aggregate;
pub mod clock;
pub mod config;
pub mod db;
pub mod gateway;
pub mod logging;
pub mod model;
pub mod repo;
pub mod seed;
pub mod service;

pub use aggregate::summary::{CourseSummary, GridSummary, TeacherSummary, UnitSummary};
pub use aggregate::totals::{format_hours, remaining, teacher_totals};
pub use config::{AdminCredentials, PlannerConfig};
pub use db::{open_db, open_db_in_memory, DbError};
pub use gateway::backup::{BackupDocument, BackupError, ImportSummary};
pub use gateway::persistence::{PersistError, PersistenceGateway};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::account::{AccountRecord, AccountRegistry, AccountSummary, SessionPointer};
pub use model::plan::{Assignments, Course, PlanSnapshot, Teacher, Unit};
pub use repo::kv_store::{KeyValueStore, MemoryKeyValueStore, StoreError, StoreResult};
pub use repo::sqlite_store::SqliteKeyValueStore;
pub use service::account_service::{AccountError, AccountService};
pub use service::plan_service::PlanService;
pub use service::session::{SessionController, SessionError, SessionResult, SessionState};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
