use chrono::{TimeZone, Utc};
use planner_core::clock::FixedClock;
use planner_core::db::open_db;
use planner_core::gateway::persistence::user_data_key;
use planner_core::service::ids::SequentialIdGenerator;
use planner_core::{
    BackupError, KeyValueStore, MemoryKeyValueStore, PlannerConfig, SessionController,
    SessionError, SqliteKeyValueStore,
};

fn controller<S: KeyValueStore>(
    store: S,
) -> SessionController<S, SequentialIdGenerator, FixedClock> {
    let now = Utc.with_ymd_and_hms(2024, 9, 1, 8, 0, 0).unwrap();
    SessionController::with_parts(
        store,
        PlannerConfig::default(),
        SequentialIdGenerator::new(),
        FixedClock(now),
    )
}

fn populated_store() -> MemoryKeyValueStore {
    let mut store = MemoryKeyValueStore::new();
    let mut session = controller(&mut store);
    session.register("amy", "pw-a").unwrap();
    session.add_teacher("SS", 23.0).unwrap();
    session.add_course("BTEC", Some(360.0)).unwrap();
    session.logout();
    session.register("bob", "pw-b").unwrap();
    session.add_teacher("AB", 18.4).unwrap();
    session.logout();
    drop(session);
    store
}

#[test]
fn export_requires_admin() {
    let session = controller(populated_store());
    assert!(matches!(
        session.export_backup(),
        Err(SessionError::AdminRequired)
    ));
}

#[test]
fn export_then_import_into_empty_store_restores_everything() {
    let mut source = controller(populated_store());
    source.admin_login("Frazadmin", "Frazadmin").unwrap();
    let document = source.export_backup().unwrap();
    assert_eq!(document.version, "2.0");
    assert_eq!(document.timestamp, "2024-09-01T08:00:00.000Z");
    assert_eq!(document.users.len(), 2);
    let json = document.to_json_pretty().unwrap();
    assert!(json.contains("\"userData\""));

    let mut target = controller(MemoryKeyValueStore::new());
    target.admin_login("Frazadmin", "Frazadmin").unwrap();
    let summary = target.import_backup(&json).unwrap();
    assert_eq!(summary.accounts, 2);
    assert_eq!(summary.snapshots_restored, 2);

    target.logout();
    target.login("amy", "pw-a").unwrap();
    let snapshot = target.snapshot().unwrap();
    assert_eq!(snapshot.teachers[0].name, "SS");
    assert_eq!(snapshot.courses[0].target_hours, Some(360.0));
}

#[test]
fn import_replaces_registry_and_leaves_other_snapshots() {
    let mut session = controller(populated_store());
    session.register("carol", "pw-c").unwrap();
    session.add_teacher("GM", 23.0).unwrap();
    session.admin_login("Frazadmin", "Frazadmin").unwrap();

    let backup = r#"{
        "version": "2.0",
        "timestamp": "2024-01-01T00:00:00.000Z",
        "users": {"amy": {"password": "restored"}},
        "userData": {"amy": {"teachers": [], "courses": []}}
    }"#;
    session.import_backup(backup).unwrap();

    let accounts = session.list_accounts().unwrap();
    assert_eq!(accounts.len(), 1);
    assert_eq!(accounts[0].username, "amy");

    let store = session.into_store();
    assert_eq!(
        store.get(&user_data_key("amy")).unwrap().as_deref(),
        Some(r#"{"teachers":[],"courses":[]}"#)
    );
    assert!(store.get(&user_data_key("carol")).unwrap().is_some());
}

#[test]
fn malformed_backup_is_rejected_without_changes() {
    let mut session = controller(populated_store());
    session.admin_login("Frazadmin", "Frazadmin").unwrap();

    for raw in ["not json", "[]", r#"{"version":"2.0"}"#, r#"{"users":[]}"#] {
        let err = session.import_backup(raw).unwrap_err();
        assert!(matches!(
            err,
            SessionError::Backup(BackupError::InvalidBackupFormat(_))
        ));
    }
    assert_eq!(session.list_accounts().unwrap().len(), 2);
}

#[test]
fn malformed_user_data_entry_is_skipped() {
    let mut session = controller(MemoryKeyValueStore::new());
    session.admin_login("Frazadmin", "Frazadmin").unwrap();

    let backup = r#"{
        "users": {"amy": {"password": "a"}, "bob": {"password": "b"}},
        "userData": {"amy": {"teachers": "oops"}, "bob": {"teachers": [], "courses": []}}
    }"#;
    let summary = session.import_backup(backup).unwrap();
    assert_eq!(summary.accounts, 2);
    assert_eq!(summary.snapshots_restored, 1);
    assert_eq!(summary.skipped_user_data, vec!["amy".to_string()]);
}

#[test]
fn file_export_and_import_through_sqlite() {
    let dir = tempfile::tempdir().unwrap();
    let backup_path = dir.path().join("backups").join("planner-backup.json");

    let mut source = controller(populated_store());
    source.admin_login("Frazadmin", "Frazadmin").unwrap();
    source.export_backup_to_file(&backup_path).unwrap();

    let conn = open_db(dir.path().join("planner.db")).unwrap();
    let store = SqliteKeyValueStore::try_new(&conn).unwrap();
    let mut target = controller(store);
    target.admin_login("Frazadmin", "Frazadmin").unwrap();
    let summary = target.import_backup_from_file(&backup_path).unwrap();
    assert_eq!(summary.accounts, 2);

    target.logout();
    target.login("bob", "pw-b").unwrap();
    assert_eq!(target.snapshot().unwrap().teachers[0].name, "AB");
}

#[test]
fn import_from_missing_file_reports_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let mut session = controller(MemoryKeyValueStore::new());
    session.admin_login("Frazadmin", "Frazadmin").unwrap();

    let err = session
        .import_backup_from_file(dir.path().join("absent.json"))
        .unwrap_err();
    assert!(matches!(err, SessionError::Backup(BackupError::Io(_))));
}

#[test]
fn reimporting_an_export_reproduces_the_same_document() {
    let mut session = controller(populated_store());
    session.admin_login("Frazadmin", "Frazadmin").unwrap();
    let first = session.export_backup().unwrap();

    let mut target = controller(MemoryKeyValueStore::new());
    target.admin_login("Frazadmin", "Frazadmin").unwrap();
    target
        .import_backup(&first.to_json_pretty().unwrap())
        .unwrap();
    let second = target.export_backup().unwrap();

    assert_eq!(second.users, first.users);
    assert_eq!(second.user_data, first.user_data);
}

#[test]
fn one_bad_user_record_does_not_block_the_rest() {
    let mut session = controller(MemoryKeyValueStore::new());
    session.admin_login("Frazadmin", "Frazadmin").unwrap();

    let backup = r#"{
        "users": {
            "amy": {"password": "a"},
            "bob": {"password": "b", "lastLogin": 1700000000000},
            "cat": {}
        },
        "userData": {}
    }"#;
    let summary = session.import_backup(backup).unwrap();
    assert_eq!(summary.accounts, 2);
    assert_eq!(summary.skipped_users, vec!["cat".to_string()]);

    let accounts = session.list_accounts().unwrap();
    let names: Vec<_> = accounts.iter().map(|a| a.username.as_str()).collect();
    assert_eq!(names, vec!["amy", "bob"]);
    assert_eq!(accounts[1].last_login, None);

    session.logout();
    assert!(session.login("bob", "b").is_ok());
}

#[test]
fn admin_name_in_backup_is_not_imported() {
    let mut session = controller(MemoryKeyValueStore::new());
    session.admin_login("Frazadmin", "Frazadmin").unwrap();

    let summary = session
        .import_backup(r#"{"users": {"frazadmin": {"password": "x"}}}"#)
        .unwrap();
    assert_eq!(summary.accounts, 0);
    assert_eq!(summary.skipped_users, vec!["frazadmin".to_string()]);
    assert!(session.list_accounts().unwrap().is_empty());

    session.logout();
    assert!(session.login("frazadmin", "x").is_err());
    assert_eq!(
        session
            .into_store()
            .get(planner_core::gateway::persistence::REGISTRY_KEY)
            .unwrap()
            .as_deref(),
        Some("{}")
    );
}
