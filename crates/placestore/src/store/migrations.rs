//! Database migration system for placestore.
//!
//! This module handles database schema versioning and migrations,
//! ensuring the database schema stays up-to-date as the application evolves.

use rusqlite::{Connection, OptionalExtension};
use tracing::{debug, info};

use crate::error::{Error, Result};

use super::schema::{CREATE_NAME_INDEX, CREATE_PLACES_TABLE, PLACE_COLUMNS, SCHEMA_STATEMENTS};

/// The current schema version.
pub const CURRENT_VERSION: i32 = 2;

/// Key used to store the schema version in the metadata table.
const VERSION_KEY: &str = "schema_version";

/// Initialize the database schema.
///
/// Creates all tables and indexes if they don't exist, then runs any
/// pending migrations to bring the schema up to the current version.
/// A database written by a newer version of this crate is refused.
///
/// # Errors
///
/// Returns an error if schema creation or migration fails.
pub fn initialize_schema(conn: &Connection) -> Result<()> {
    for statement in SCHEMA_STATEMENTS {
        conn.execute(statement, [])?;
    }

    let version = schema_version(conn)?;
    if version > CURRENT_VERSION {
        return Err(Error::DatabaseMigration {
            message: format!(
                "database schema version {version} is newer than supported version {CURRENT_VERSION}"
            ),
        });
    }
    if version < CURRENT_VERSION {
        run_migrations(conn, version)?;
    }

    Ok(())
}

/// Get the current schema version from the database.
///
/// Returns 0 if no version is set (fresh database).
///
/// # Errors
///
/// Returns an error if the metadata table can't be read or holds a
/// malformed version.
pub fn schema_version(conn: &Connection) -> Result<i32> {
    let value: Option<String> = conn
        .query_row(
            "SELECT value FROM metadata WHERE key = ?1",
            [VERSION_KEY],
            |row| row.get(0),
        )
        .optional()?;

    match value {
        Some(value) => value.parse().map_err(|_| Error::DatabaseMigration {
            message: format!("invalid schema version: {value}"),
        }),
        None => Ok(0),
    }
}

/// Set the schema version in the database.
fn set_schema_version(conn: &Connection, version: i32) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO metadata (key, value) VALUES (?1, ?2)",
        (VERSION_KEY, version.to_string()),
    )?;
    Ok(())
}

/// Run migrations from the given version to the current version.
fn run_migrations(conn: &Connection, from_version: i32) -> Result<()> {
    let mut current = from_version;

    while current < CURRENT_VERSION {
        current += 1;
        debug!("Running schema migration to version {}", current);
        run_migration(conn, current)?;
    }

    set_schema_version(conn, CURRENT_VERSION)?;
    info!(
        "Database schema migrated from version {} to {}",
        from_version, CURRENT_VERSION
    );
    Ok(())
}

/// Run a specific migration version.
fn run_migration(conn: &Connection, version: i32) -> Result<()> {
    match version {
        1 => migrate_v1(conn),
        2 => migrate_v2(conn),
        _ => Err(Error::DatabaseMigration {
            message: format!("unknown migration version: {version}"),
        }),
    }
}

/// Migration to version 1 (initial schema).
///
/// The tables already exist at this point; only the version is recorded.
fn migrate_v1(conn: &Connection) -> Result<()> {
    set_schema_version(conn, 1)
}

/// Migration to version 2: coordinate columns become nullable.
///
/// Version 1 declared them `NOT NULL`, which rejected NaN. `SQLite` can't
/// drop a column constraint in place, so the table is rebuilt. Ids and the
/// `AUTOINCREMENT` counter carry over.
fn migrate_v2(conn: &Connection) -> Result<()> {
    if !coordinates_not_null(conn)? {
        return set_schema_version(conn, 2);
    }

    let tx = conn.unchecked_transaction()?;
    tx.execute_batch("ALTER TABLE places RENAME TO places_v1;")?;
    tx.execute_batch(CREATE_PLACES_TABLE)?;
    tx.execute_batch(&format!(
        "INSERT INTO places ({PLACE_COLUMNS}) SELECT {PLACE_COLUMNS} FROM places_v1;
         DELETE FROM sqlite_sequence WHERE name = 'places';
         INSERT INTO sqlite_sequence (name, seq)
             SELECT 'places', seq FROM sqlite_sequence WHERE name = 'places_v1';
         DROP TABLE places_v1;"
    ))?;
    tx.execute_batch(CREATE_NAME_INDEX)?;
    set_schema_version(&tx, 2)?;
    tx.commit()?;
    Ok(())
}

/// Whether the `places` coordinate columns still carry `NOT NULL`.
fn coordinates_not_null(conn: &Connection) -> Result<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM pragma_table_info('places')
         WHERE name IN ('latitude', 'longitude') AND \"notnull\" = 1",
        [],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_db() -> Connection {
        Connection::open_in_memory().expect("failed to create in-memory database")
    }

    fn create_metadata_table(conn: &Connection) {
        conn.execute(
            "CREATE TABLE metadata (key TEXT PRIMARY KEY, value TEXT NOT NULL)",
            [],
        )
        .unwrap();
    }

    fn table_exists(conn: &Connection, name: &str) -> bool {
        let count: i32 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name=?1",
                [name],
                |row| row.get(0),
            )
            .unwrap();
        count == 1
    }

    #[test]
    fn test_initialize_schema_creates_tables() {
        let conn = create_test_db();
        initialize_schema(&conn).expect("failed to initialize schema");

        assert!(table_exists(&conn, "places"));
        assert!(table_exists(&conn, "metadata"));
    }

    #[test]
    fn test_initialize_schema_sets_version() {
        let conn = create_test_db();
        initialize_schema(&conn).expect("failed to initialize schema");

        assert_eq!(schema_version(&conn).unwrap(), CURRENT_VERSION);
    }

    #[test]
    fn test_initialize_schema_idempotent() {
        let conn = create_test_db();

        initialize_schema(&conn).expect("first init failed");
        initialize_schema(&conn).expect("second init failed");

        assert_eq!(schema_version(&conn).unwrap(), CURRENT_VERSION);
    }

    #[test]
    fn test_schema_version_fresh_db() {
        let conn = create_test_db();
        create_metadata_table(&conn);

        assert_eq!(schema_version(&conn).unwrap(), 0);
    }

    #[test]
    fn test_set_and_get_schema_version() {
        let conn = create_test_db();
        create_metadata_table(&conn);

        set_schema_version(&conn, 1).unwrap();
        set_schema_version(&conn, 2).unwrap();

        assert_eq!(schema_version(&conn).unwrap(), 2);
    }

    #[test]
    fn test_malformed_schema_version() {
        let conn = create_test_db();
        create_metadata_table(&conn);
        conn.execute(
            "INSERT INTO metadata (key, value) VALUES ('schema_version', 'one')",
            [],
        )
        .unwrap();

        let err = schema_version(&conn).unwrap_err();
        assert!(err.to_string().contains("invalid schema version"));
    }

    #[test]
    fn test_newer_schema_is_refused() {
        let conn = create_test_db();
        initialize_schema(&conn).unwrap();
        set_schema_version(&conn, CURRENT_VERSION + 1).unwrap();

        let err = initialize_schema(&conn).unwrap_err();
        assert!(err.is_storage_error());
        assert!(err.to_string().contains("newer than supported"));
    }

    #[test]
    fn test_run_migration_unknown_version() {
        let conn = create_test_db();
        initialize_schema(&conn).unwrap();

        let err = run_migration(&conn, 999).unwrap_err();
        assert!(err.to_string().contains("unknown migration version"));
    }

    /// Lay down a version 1 database by hand.
    fn create_v1_db(conn: &Connection) {
        conn.execute_batch(
            "CREATE TABLE places (
                 id INTEGER PRIMARY KEY AUTOINCREMENT,
                 name TEXT NOT NULL DEFAULT '',
                 category TEXT NOT NULL DEFAULT '',
                 latitude REAL NOT NULL DEFAULT 0.0,
                 longitude REAL NOT NULL DEFAULT 0.0,
                 notes TEXT NOT NULL DEFAULT '',
                 is_favorite INTEGER NOT NULL DEFAULT 0,
                 created_at TEXT NOT NULL,
                 updated_at TEXT NOT NULL
             );
             CREATE INDEX idx_places_name ON places(name, id);
             CREATE TABLE metadata (key TEXT PRIMARY KEY, value TEXT NOT NULL);
             INSERT INTO metadata (key, value) VALUES ('schema_version', '1');
             INSERT INTO places (name, latitude, longitude, created_at, updated_at)
                 VALUES ('Kept', 47.6, -122.3, '2024-01-01T00:00:00.000000Z', '2024-01-01T00:00:00.000000Z');
             INSERT INTO places (name, latitude, longitude, created_at, updated_at)
                 VALUES ('Gone', 0.0, 0.0, '2024-01-01T00:00:00.000000Z', '2024-01-01T00:00:00.000000Z');
             DELETE FROM places WHERE name = 'Gone';",
        )
        .unwrap();
    }

    #[test]
    fn test_fresh_schema_has_nullable_coordinates() {
        let conn = create_test_db();
        initialize_schema(&conn).unwrap();

        assert!(!coordinates_not_null(&conn).unwrap());
    }

    #[test]
    fn test_migrate_v1_database_relaxes_coordinates() {
        let conn = create_test_db();
        create_v1_db(&conn);
        assert!(coordinates_not_null(&conn).unwrap());

        initialize_schema(&conn).unwrap();

        assert_eq!(schema_version(&conn).unwrap(), CURRENT_VERSION);
        assert!(!coordinates_not_null(&conn).unwrap());
        assert!(!table_exists(&conn, "places_v1"));

        let kept: (i64, f64) = conn
            .query_row("SELECT id, latitude FROM places WHERE name = 'Kept'", [], |row| {
                Ok((row.get(0)?, row.get(1)?))
            })
            .unwrap();
        assert_eq!(kept.0, 1);
        assert!((kept.1 - 47.6).abs() < f64::EPSILON);

        conn.execute(
            "INSERT INTO places (name, latitude, longitude, created_at, updated_at)
             VALUES ('Adrift', NULL, NULL, 'x', 'x')",
            [],
        )
        .unwrap();
        // Id 2 was used before the rebuild and stays retired.
        assert_eq!(conn.last_insert_rowid(), 3);
    }

    #[test]
    fn test_name_index_created() {
        let conn = create_test_db();
        initialize_schema(&conn).expect("failed to initialize schema");

        let indexes: Vec<String> = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='index' AND tbl_name='places'")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .filter_map(|r| r.ok())
            .collect();

        assert!(indexes.iter().any(|n| n.contains("name")));
    }
}
