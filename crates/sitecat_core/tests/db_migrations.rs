use rusqlite::Connection;
use sitecat_core::db::migrations::latest_version;
use sitecat_core::db::{open_db, open_db_in_memory, DbError};
use sitecat_core::{RepoError, SqliteCatalogRepository, SqliteSurveyRepository};

const CATALOG_TABLES: [&str; 10] = [
    "spatial_areas",
    "spatial_contexts",
    "object_finds",
    "material_categories",
    "survey_paths",
    "survey_points",
    "photos",
    "area_types",
    "context_types",
    "action_log",
];

#[test]
fn open_db_in_memory_applies_all_migrations() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn), latest_version());
    for table in CATALOG_TABLES {
        assert_table_exists(&conn, table);
    }
    let foreign_keys: i64 = conn
        .query_row("PRAGMA foreign_keys;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(foreign_keys, 1);
}

#[test]
fn opening_same_database_twice_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sitecat.db");

    let conn_first = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_first), latest_version());
    drop(conn_first);

    let conn_second = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_second), latest_version());
    assert_table_exists(&conn_second, "spatial_contexts");
}

#[test]
fn opening_database_with_newer_schema_version_returns_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    let err = open_db(&path).unwrap_err();
    match err {
        DbError::UnsupportedSchemaVersion {
            db_version,
            latest_supported,
        } => {
            assert_eq!(db_version, 999);
            assert_eq!(latest_supported, latest_version());
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn repositories_reject_unmigrated_connections() {
    let conn = Connection::open_in_memory().unwrap();

    assert!(matches!(
        SqliteCatalogRepository::try_new(&conn),
        Err(RepoError::UninitializedConnection {
            actual_version: 0,
            ..
        })
    ));
    assert!(matches!(
        SqliteSurveyRepository::try_new(&conn),
        Err(RepoError::UninitializedConnection { .. })
    ));
}

#[test]
fn repositories_report_missing_tables() {
    let conn = open_db_in_memory().unwrap();
    conn.execute_batch("PRAGMA foreign_keys = OFF; DROP TABLE survey_points;")
        .unwrap();

    assert!(matches!(
        SqliteSurveyRepository::try_new(&conn),
        Err(RepoError::MissingRequiredTable("survey_points"))
    ));
    assert!(SqliteCatalogRepository::try_new(&conn).is_ok());
}

fn schema_version(conn: &Connection) -> u32 {
    conn.query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap()
}

fn assert_table_exists(conn: &Connection, table_name: &str) {
    let exists: i64 = conn
        .query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = 'table' AND name = ?1
            );",
            [table_name],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(exists, 1, "table {table_name} does not exist");
}
