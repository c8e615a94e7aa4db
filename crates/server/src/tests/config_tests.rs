use super::*;

use std::{
    env,
    time::{SystemTime, UNIX_EPOCH},
};

#[test]
fn defaults_bind_to_local_port_5000_with_memory_database() {
    let settings = Settings::default();
    assert_eq!(settings.server_bind, "127.0.0.1:5000");
    assert_eq!(settings.database_url, "sqlite::memory:");
}

#[test]
fn file_values_override_defaults() {
    let mut settings = Settings::default();
    apply_file_overrides(
        &mut settings,
        "bind_addr = \"0.0.0.0:8080\"\ndatabase_url = \"./data/incidents.db\"\n",
    );
    assert_eq!(settings.server_bind, "0.0.0.0:8080");
    assert_eq!(settings.database_url, "./data/incidents.db");
}

#[test]
fn unreadable_file_leaves_settings_untouched() {
    let mut settings = Settings::default();
    apply_file_overrides(&mut settings, "bind_addr = [1, 2]");
    assert_eq!(settings, Settings::default());
}

#[test]
fn prefixed_env_vars_win_over_bare_ones() {
    let mut settings = Settings::default();
    apply_env_overrides(&mut settings, |key| match key {
        "SERVER_BIND" => Some("127.0.0.1:7000".to_string()),
        "APP__BIND_ADDR" => Some("127.0.0.1:7001".to_string()),
        "DATABASE_URL" => Some("sqlite://a.db".to_string()),
        _ => None,
    });
    assert_eq!(settings.server_bind, "127.0.0.1:7001");
    assert_eq!(settings.database_url, "sqlite://a.db");
}

#[test]
fn normalizes_plain_file_path_to_sqlite_url() {
    assert_eq!(
        normalize_database_url("./data/test.db"),
        "sqlite://./data/test.db"
    );
}

#[test]
fn keeps_memory_url_and_falls_back_to_it_when_blank() {
    assert_eq!(normalize_database_url("sqlite::memory:"), "sqlite::memory:");
    assert_eq!(normalize_database_url("   "), "sqlite::memory:");
}

#[test]
fn creates_parent_dir_for_relative_sqlite_url() {
    let suffix = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock")
        .as_nanos();

    let temp_root = env::temp_dir().join(format!("incident_desk_server_test_{suffix}"));
    let db_path = temp_root.join("data").join("test.db");

    prepare_database_url(db_path.to_string_lossy().as_ref()).expect("prepare db url");
    assert!(temp_root.join("data").exists());

    fs::remove_dir_all(temp_root).expect("cleanup");
}

#[tokio::test]
async fn prepared_database_url_creates_openable_sqlite_file() {
    let suffix = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock")
        .as_nanos();

    let temp_root = env::temp_dir().join(format!("incident_desk_server_open_test_{suffix}"));
    let db_path = temp_root.join("nested").join("server.db");

    let prepared = prepare_database_url(db_path.to_string_lossy().as_ref()).expect("prepare");
    let storage = storage::Storage::new(&prepared).await.expect("open sqlite");
    drop(storage);

    assert!(
        db_path.exists(),
        "database file should be created: {}",
        db_path.display()
    );

    fs::remove_dir_all(temp_root).expect("cleanup");
}
