use chrono::{TimeZone, Utc};
use planner_core::clock::FixedClock;
use planner_core::gateway::persistence::{user_data_key, REGISTRY_KEY, SESSION_KEY};
use planner_core::service::ids::SequentialIdGenerator;
use planner_core::{
    AccountError, KeyValueStore, MemoryKeyValueStore, PlannerConfig, SessionController,
    SessionError, SessionState, StoreError, StoreResult,
};

type TestController<'a, S> = SessionController<&'a mut S, SequentialIdGenerator, FixedClock>;

fn controller<S: KeyValueStore>(store: &mut S) -> TestController<'_, S> {
    controller_with(store, PlannerConfig::default())
}

fn controller_with<S: KeyValueStore>(store: &mut S, config: PlannerConfig) -> TestController<'_, S> {
    let now = Utc.with_ymd_and_hms(2024, 9, 1, 8, 0, 0).unwrap();
    SessionController::with_parts(store, config, SequentialIdGenerator::new(), FixedClock(now))
}

/// Store whose writes always fail; reads see the seeded entries.
struct ReadOnlyStore {
    inner: MemoryKeyValueStore,
}

impl KeyValueStore for ReadOnlyStore {
    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        self.inner.get(key)
    }

    fn set(&mut self, _key: &str, _value: &str) -> StoreResult<()> {
        Err(StoreError::WriteRejected("quota exceeded".to_string()))
    }

    fn remove(&mut self, _key: &str) -> StoreResult<()> {
        Err(StoreError::WriteRejected("quota exceeded".to_string()))
    }

    fn keys_with_prefix(&self, prefix: &str) -> StoreResult<Vec<String>> {
        self.inner.keys_with_prefix(prefix)
    }
}

#[test]
fn register_signs_in_with_empty_plan_and_persists_pointer() {
    let mut store = MemoryKeyValueStore::new();
    let mut session = controller(&mut store);

    let state = session.register("amy", "pw").unwrap().clone();
    assert_eq!(
        state,
        SessionState::Authenticated {
            username: "amy".to_string(),
            last_login: Some("2024-09-01T08:00:00.000Z".to_string()),
        }
    );
    assert!(session.snapshot().unwrap().is_empty());
    drop(session);

    let pointer = store.get(SESSION_KEY).unwrap().unwrap();
    assert!(pointer.contains("\"username\":\"amy\""));
    assert!(store.get(REGISTRY_KEY).unwrap().unwrap().contains("amy"));
}

#[test]
fn seeded_registration_starts_from_sample_plan() {
    let mut store = MemoryKeyValueStore::new();
    let config = PlannerConfig {
        seed_new_accounts: true,
        ..PlannerConfig::default()
    };
    let mut session = controller_with(&mut store, config);

    session.register("amy", "pw").unwrap();
    assert_eq!(session.snapshot().unwrap().teachers.len(), 17);
    drop(session);
    assert!(store.get(&user_data_key("amy")).unwrap().is_some());
}

#[test]
fn reserved_and_duplicate_usernames_are_rejected() {
    let mut store = MemoryKeyValueStore::new();
    let mut session = controller(&mut store);
    session.register("amy", "pw").unwrap();
    session.logout();

    let err = session.register("frazadmin", "x").unwrap_err();
    assert!(matches!(
        err,
        SessionError::Account(AccountError::ReservedUsername(_))
    ));
    let err = session.register("amy", "other").unwrap_err();
    assert_eq!(err.to_string(), "Username already exists.");
    assert_eq!(session.state(), &SessionState::Unauthenticated);
}

#[test]
fn plan_edits_survive_logout_and_login() {
    let mut store = MemoryKeyValueStore::new();
    let mut session = controller(&mut store);
    session.register("amy", "pw").unwrap();
    session.add_teacher("SS", 23.0).unwrap();
    session.add_course("BTEC", Some(360.0)).unwrap();
    session.add_unit("c2", "Networks").unwrap();
    session.update_assignment("c2", "u3", "t1", 2.0).unwrap();
    session.logout();

    assert!(session.snapshot().is_none());
    assert!(matches!(
        session.add_teacher("AB", 18.4),
        Err(SessionError::NotAuthenticated)
    ));

    session.login("amy", "pw").unwrap();
    let snapshot = session.snapshot().unwrap();
    assert_eq!(snapshot.unit("c2", "u3").unwrap().assignments.get("t1"), Some(2.0));
    let summary = session.grid_summary().unwrap();
    assert_eq!(summary.teacher("t1").unwrap().remaining, 21.0);
}

#[test]
fn users_never_see_each_others_plans() {
    let mut store = MemoryKeyValueStore::new();
    let mut session = controller(&mut store);
    session.register("amy", "pw").unwrap();
    session.add_teacher("SS", 23.0).unwrap();
    session.logout();

    session.register("bob", "pw").unwrap();
    assert!(session.snapshot().unwrap().is_empty());
}

#[test]
fn restore_reopens_persisted_session() {
    let mut store = MemoryKeyValueStore::new();
    {
        let mut session = controller(&mut store);
        session.register("amy", "pw").unwrap();
        session.add_teacher("SS", 23.0).unwrap();
    }

    let mut session = controller(&mut store);
    assert_eq!(session.state(), &SessionState::Unauthenticated);
    session.restore();
    assert_eq!(session.state().username(), Some("amy"));
    assert_eq!(session.snapshot().unwrap().teachers.len(), 1);
}

#[test]
fn restore_clears_pointer_of_deleted_account() {
    let mut store = MemoryKeyValueStore::new();
    store
        .set(SESSION_KEY, r#"{"username":"ghost","lastLogin":"2024-01-01T00:00:00.000Z"}"#)
        .unwrap();

    let mut session = controller(&mut store);
    assert_eq!(session.restore(), &SessionState::Unauthenticated);
    drop(session);
    assert_eq!(store.get(SESSION_KEY).unwrap(), None);
}

#[test]
fn corrupted_registry_is_treated_as_empty() {
    let mut store = MemoryKeyValueStore::new();
    store.set(REGISTRY_KEY, "{not json").unwrap();

    let mut session = controller(&mut store);
    assert!(session.login("amy", "pw").is_err());
    session.register("amy", "pw").unwrap();
    assert_eq!(session.state().username(), Some("amy"));
}

#[test]
fn admin_sign_in_uses_fixed_pair_and_gates_admin_operations() {
    let mut store = MemoryKeyValueStore::new();
    let mut session = controller(&mut store);
    session.register("amy", "pw").unwrap();

    assert!(matches!(
        session.list_accounts(),
        Err(SessionError::AdminRequired)
    ));

    assert!(session.sign_in("Frazadmin", "wrong").is_err());
    assert!(session.sign_in("Frazadmin", "Frazadmin").unwrap().is_admin());
    assert!(session.snapshot().is_none());

    let accounts = session.list_accounts().unwrap();
    assert_eq!(accounts.len(), 1);
    assert_eq!(accounts[0].username, "amy");
    assert!(matches!(
        session.add_teacher("SS", 23.0),
        Err(SessionError::NotAuthenticated)
    ));
}

#[test]
fn admin_delete_removes_account_and_plan_together() {
    let mut store = MemoryKeyValueStore::new();
    let mut session = controller(&mut store);
    session.register("amy", "pw").unwrap();
    session.add_teacher("SS", 23.0).unwrap();
    session.admin_login("Frazadmin", "Frazadmin").unwrap();

    assert!(session.delete_account("amy").unwrap());
    assert!(!session.delete_account("amy").unwrap());
    drop(session);

    assert_eq!(store.get(&user_data_key("amy")).unwrap(), None);
    let mut session = controller(&mut store);
    assert!(session.login("amy", "pw").is_err());
}

#[test]
fn admin_reset_password_changes_login_and_ignores_blank() {
    let mut store = MemoryKeyValueStore::new();
    let mut session = controller(&mut store);
    session.register("amy", "old").unwrap();
    session.admin_login("Frazadmin", "Frazadmin").unwrap();

    assert!(!session.reset_password("amy", "   ").unwrap());
    assert!(session.reset_password("amy", "new").unwrap());
    session.logout();

    assert!(session.login("amy", "old").is_err());
    assert!(session.login("amy", "new").is_ok());
}

#[test]
fn failed_writes_keep_in_memory_state_and_leave_a_warning() {
    let mut seeded = MemoryKeyValueStore::new();
    {
        let mut session = controller(&mut seeded);
        session.register("amy", "pw").unwrap();
    }
    let mut store = ReadOnlyStore { inner: seeded };
    let mut session = controller(&mut store);

    session.login("amy", "pw").unwrap();
    assert!(session.take_persist_warning().is_some());

    let snapshot = session.add_teacher("SS", 23.0).unwrap();
    assert_eq!(snapshot.teachers.len(), 1);
    let warning = session.take_persist_warning().unwrap();
    assert!(warning.contains("quota exceeded"));
    assert!(session.take_persist_warning().is_none());
}

#[test]
fn unchanged_snapshot_is_not_rewritten() {
    let mut seeded = MemoryKeyValueStore::new();
    {
        let mut session = controller(&mut seeded);
        session.register("amy", "pw").unwrap();
    }
    let mut store = ReadOnlyStore { inner: seeded };
    let mut session = controller(&mut store);
    session.restore();

    session.update_teacher("missing", "x", 1.0).unwrap();
    assert!(session.take_persist_warning().is_none());
}
