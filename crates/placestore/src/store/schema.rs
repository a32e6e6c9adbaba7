//! `SQLite` schema definitions for placestore.
//!
//! This module contains the SQL statements for creating and managing
//! the database schema.

/// SQL statement to create the places table.
///
/// `AUTOINCREMENT` keeps ids of deleted rows from ever being handed out again.
/// The coordinate columns are nullable: `SQLite` stores a NaN double as NULL,
/// and NULL reads back as NaN.
pub const CREATE_PLACES_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS places (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL DEFAULT '',
    category TEXT NOT NULL DEFAULT '',
    latitude REAL DEFAULT 0.0,
    longitude REAL DEFAULT 0.0,
    notes TEXT NOT NULL DEFAULT '',
    is_favorite INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
)
";

/// SQL statement to create an index on name for the default listing order.
pub const CREATE_NAME_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_places_name ON places(name, id)
";

/// SQL statement to create the metadata table for storing key-value pairs.
pub const CREATE_METADATA_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS metadata (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
)
";

/// All schema creation statements in order.
pub const SCHEMA_STATEMENTS: &[&str] = &[
    CREATE_PLACES_TABLE,
    CREATE_NAME_INDEX,
    CREATE_METADATA_TABLE,
];

/// Column list shared by every query that reads whole places.
pub const PLACE_COLUMNS: &str =
    "id, name, category, latitude, longitude, notes, is_favorite, created_at, updated_at";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_statements_not_empty() {
        assert!(!SCHEMA_STATEMENTS.is_empty());
        for stmt in SCHEMA_STATEMENTS {
            assert!(!stmt.is_empty());
        }
    }

    #[test]
    fn test_create_places_table_contains_required_columns() {
        assert!(CREATE_PLACES_TABLE.contains("id INTEGER PRIMARY KEY AUTOINCREMENT"));
        assert!(CREATE_PLACES_TABLE.contains("name TEXT NOT NULL"));
        assert!(CREATE_PLACES_TABLE.contains("latitude REAL DEFAULT"));
        assert!(CREATE_PLACES_TABLE.contains("longitude REAL DEFAULT"));
        assert!(CREATE_PLACES_TABLE.contains("is_favorite INTEGER NOT NULL"));
    }

    #[test]
    fn test_place_columns_match_table() {
        for column in PLACE_COLUMNS.split(", ") {
            assert!(
                CREATE_PLACES_TABLE.contains(&format!("{column} ")),
                "missing column {column}"
            );
        }
    }

    #[test]
    fn test_create_metadata_table_structure() {
        assert!(CREATE_METADATA_TABLE.contains("key TEXT PRIMARY KEY"));
        assert!(CREATE_METADATA_TABLE.contains("value TEXT NOT NULL"));
    }
}
