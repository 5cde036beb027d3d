//! End-to-end table lifecycle: config file, bootstrap, check-or-create,
//! inserts, and persistence across environment restarts.

use sqlenv::rusqlite::params;
use sqlenv::{ConnDetails, EnvId, EnvRegistry, Environment, TableCatalog, TableDefinition};
use std::fs;
use std::path::Path;
use std::sync::Arc;

fn init_logging() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn write_config(dir: &Path, id: EnvId, db_name: &str) {
    let details = ConnDetails {
        host: String::new(),
        port: 0,
        user: String::new(),
        password: String::new(),
        db_name: db_name.to_string(),
    };
    fs::write(
        dir.join(id.config_file_name()),
        serde_json::to_string(&details).unwrap(),
    )
    .unwrap();
}

fn events_catalog() -> Arc<TableCatalog> {
    let catalog = Arc::new(TableCatalog::new());
    catalog.register(TableDefinition::new(
        "events",
        "(id integer, payload text)",
        "(id, payload) values (?1, ?2)",
    ));
    catalog
}

#[test]
fn full_lifecycle_through_registry() {
    init_logging();
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("lifecycle.db");
    write_config(dir.path(), EnvId::TempTest, db_path.to_str().unwrap());

    let catalog = events_catalog();
    let registry = EnvRegistry::new();

    let config_dir = dir.path().to_path_buf();
    let env = registry
        .get_or_create(EnvId::TempTest, |id| {
            Environment::bootstrap(id, &config_dir, Arc::clone(&catalog))
        })
        .unwrap();

    // First executor request creates the table and prepares the insert
    let events = env.get_or_create_table_exec("events").unwrap();
    assert!(events.was_created());
    assert!(events.was_checked());

    events.insert(params![1, "first"]).unwrap();
    events.insert(params![2, "second"]).unwrap();
    assert_eq!(events.row_count().unwrap(), 2);

    // Second request reuses the checked executor without touching the schema
    let again = env.get_or_create_table_exec("events").unwrap();
    assert!(Arc::ptr_eq(&events, &again));
    assert!(!again.was_created());

    // Unknown tables are a configuration error and cache nothing
    assert!(env.get_or_create_table_exec("ghost").is_err());
    assert_eq!(env.table_exec_count(), 1);

    registry.close_all();
    assert!(registry.is_empty());
}

#[test]
fn table_survives_environment_restart() {
    init_logging();
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("restart.db");
    write_config(dir.path(), EnvId::Run, db_path.to_str().unwrap());

    let catalog = events_catalog();
    let registry = EnvRegistry::new();
    let config_dir = dir.path().to_path_buf();

    let env = registry
        .get_or_create(EnvId::Run, |id| {
            Environment::bootstrap(id, &config_dir, Arc::clone(&catalog))
        })
        .unwrap();
    let events = env.get_or_create_table_exec("events").unwrap();
    assert!(events.was_created());
    events.insert(params![1, "persisted"]).unwrap();

    // Tear the environment down and bring a fresh one up on the same file
    assert!(registry.close_env(EnvId::Run));

    let env = registry
        .get_or_create(EnvId::Run, |id| {
            Environment::bootstrap(id, &config_dir, Arc::clone(&catalog))
        })
        .unwrap();
    let events = env.get_or_create_table_exec("events").unwrap();

    // The table already exists on disk: no DDL this time, data intact
    assert!(!events.was_created());
    assert!(events.was_checked());
    assert_eq!(events.row_count().unwrap(), 1);

    registry.close_all();
}

#[test]
fn bootstrap_failure_surfaces_through_registry() {
    init_logging();
    let dir = tempfile::tempdir().unwrap();
    // No config file written for this id
    let catalog = events_catalog();
    let registry = EnvRegistry::new();
    let config_dir = dir.path().to_path_buf();

    let err = registry
        .get_or_create(EnvId::Shell, |id| {
            Environment::bootstrap(id, &config_dir, Arc::clone(&catalog))
        })
        .unwrap_err();
    assert!(matches!(err, sqlenv::Error::Bootstrap { .. }));
    assert!(registry.is_empty());
}
