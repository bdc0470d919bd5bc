use myco_core::db::{initialize, open_db, open_db_in_memory};
use myco_core::{ExperimentRepository, SqliteExperimentRepository};
use rusqlite::Connection;

#[test]
fn open_db_in_memory_creates_experiments_table() {
    let conn = open_db_in_memory().unwrap();

    assert_table_exists(&conn, "experiments");
    assert_index_exists(&conn, "idx_experiments_created_at");
}

#[test]
fn opening_same_database_twice_keeps_data() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("mushroom_tracker.db");

    let conn_first = open_db(&path).unwrap();
    conn_first
        .execute(
            "INSERT INTO experiments (experiment_name, substrate_type, inoculation_date, status)
             VALUES ('kept', 'straw', '2024-01-01', 'colonizing');",
            [],
        )
        .unwrap();
    drop(conn_first);

    let conn_second = open_db(&path).unwrap();
    let count: i64 = conn_second
        .query_row("SELECT COUNT(*) FROM experiments;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(count, 1);
}

#[test]
fn initialize_is_idempotent_on_same_connection() {
    let mut conn = open_db_in_memory().unwrap();
    conn.execute(
        "INSERT INTO experiments (experiment_name, substrate_type, inoculation_date, status)
         VALUES ('kept', 'straw', '2024-01-01', 'colonizing');",
        [],
    )
    .unwrap();

    initialize(&mut conn).unwrap();
    initialize(&mut conn).unwrap();

    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM experiments;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(count, 1);
}

#[test]
fn initialize_adopts_unversioned_table_without_losing_rows() {
    let mut conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(
        "CREATE TABLE experiments (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            experiment_name TEXT NOT NULL,
            substrate_type TEXT NOT NULL,
            substrate_details TEXT,
            spawn_ratio REAL,
            substrate_weight_kg REAL,
            container_type TEXT,
            inoculation_date DATE NOT NULL,
            colonization_date DATE,
            first_pin_date DATE,
            status TEXT NOT NULL,
            contamination_type TEXT,
            contamination_notes TEXT,
            notes TEXT,
            created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
        );
        INSERT INTO experiments (experiment_name, substrate_type, inoculation_date, status)
        VALUES ('legacy', 'coffee grounds', '2023-11-02', 'done');",
    )
    .unwrap();

    initialize(&mut conn).unwrap();

    let repo = SqliteExperimentRepository::try_new(&conn).unwrap();
    let all = repo.list_experiments().unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].experiment_name, "legacy");
    assert_eq!(all[0].substrate_type, "coffee grounds");
}

#[test]
fn initialize_leaves_user_version_alone() {
    let mut conn = Connection::open_in_memory().unwrap();
    conn.execute_batch("PRAGMA user_version = 7;").unwrap();

    initialize(&mut conn).unwrap();

    let version: u32 = conn
        .query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(version, 7);
    assert_table_exists(&conn, "experiments");
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

fn assert_index_exists(conn: &Connection, index_name: &str) {
    let exists: i64 = conn
        .query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = 'index' AND name = ?1
            );",
            [index_name],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(exists, 1, "index {index_name} does not exist");
}
