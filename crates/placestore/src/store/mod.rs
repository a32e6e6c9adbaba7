//! Storage layer for placestore.
//!
//! This module provides the `SQLite`-backed [`PlaceStore`]: durable
//! create/read/update/delete over places, ordered and filtered listings,
//! and change notification for front ends that keep snapshots on screen.

pub mod migrations;
pub mod schema;

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use rusqlite::types::{Type, Value};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::event::{EventBus, PlaceEvent, PlaceEvents, DEFAULT_CHANNEL_CAPACITY};
use crate::place::{Place, PlaceDraft, PlaceId, PlacePatch};
use crate::query::ListQuery;

use schema::PLACE_COLUMNS;

/// Path reported for in-memory stores.
const IN_MEMORY_PATH: &str = ":memory:";

/// Knobs for opening a [`PlaceStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreOptions {
    /// Use write-ahead logging for the database file.
    pub wal: bool,
    /// How many undelivered events a subscriber may fall behind by.
    pub event_capacity: usize,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            wal: true,
            event_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }
}

impl From<&Config> for StoreOptions {
    fn from(config: &Config) -> Self {
        Self {
            wal: config.storage.wal,
            event_capacity: config.events.channel_capacity,
        }
    }
}

/// Durable collection of places.
///
/// The store is the only owner of place state. Every mutating call runs in
/// its own transaction and is committed before it returns, then a single
/// [`PlaceEvent`] is sent to subscribers. Failed calls change nothing and
/// emit nothing. Nothing is retried internally.
///
/// There is no process-wide instance: open one explicitly, hand references
/// to whatever needs it, and [`close`](Self::close) it when done.
#[derive(Debug)]
pub struct PlaceStore {
    /// Path to the database file.
    path: PathBuf,
    /// Database connection.
    conn: Connection,
    /// Whether the database runs in write-ahead log mode.
    wal: bool,
    /// Change notification fan-out.
    events: EventBus,
}

impl PlaceStore {
    /// Open or create a store at the given path.
    ///
    /// Creates the parent directories and database file if they don't exist,
    /// and brings the schema up to date.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or schema
    /// initialization fails.
    pub fn open(path: impl AsRef<Path>, options: &StoreOptions) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|source| Error::DirectoryCreate {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        debug!("Opening database at {}", path.display());
        let conn = Connection::open(&path).map_err(|source| Error::DatabaseOpen {
            path: path.clone(),
            source,
        })?;

        let mut wal = false;
        if options.wal {
            let mode: String = conn.query_row("PRAGMA journal_mode=WAL", [], |row| row.get(0))?;
            wal = mode.eq_ignore_ascii_case("wal");
            if !wal {
                warn!("Requested WAL journal mode, database is using '{}'", mode);
            }
            conn.execute_batch("PRAGMA synchronous=NORMAL;")?;
        }

        migrations::initialize_schema(&conn)?;

        info!("Place store opened at {}", path.display());
        Ok(Self {
            path,
            conn,
            wal,
            events: EventBus::new(options.event_capacity),
        })
    }

    /// Open the store described by the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened.
    pub fn from_config(config: &Config) -> Result<Self> {
        Self::open(config.database_path(), &StoreOptions::from(config))
    }

    /// Create an in-memory store, mainly for tests and previews.
    ///
    /// # Errors
    ///
    /// Returns an error if the in-memory database cannot be created.
    pub fn open_in_memory() -> Result<Self> {
        Self::open_in_memory_with(&StoreOptions::default())
    }

    /// Create an in-memory store with explicit options.
    ///
    /// The `wal` option is ignored; in-memory databases have no journal file.
    ///
    /// # Errors
    ///
    /// Returns an error if the in-memory database cannot be created.
    pub fn open_in_memory_with(options: &StoreOptions) -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|source| Error::DatabaseOpen {
            path: PathBuf::from(IN_MEMORY_PATH),
            source,
        })?;

        migrations::initialize_schema(&conn)?;

        Ok(Self {
            path: PathBuf::from(IN_MEMORY_PATH),
            conn,
            wal: false,
            events: EventBus::new(options.event_capacity),
        })
    }

    /// Get the path to the database file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn is_in_memory(&self) -> bool {
        self.path.as_os_str() == IN_MEMORY_PATH
    }

    /// Subscribe to change events.
    ///
    /// Only mutations made after this call are reported.
    #[must_use]
    pub fn subscribe(&self) -> PlaceEvents {
        self.events.subscribe()
    }

    /// Number of live subscriptions.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.events.subscriber_count()
    }

    /// Store a new place and return it with its freshly assigned id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database write fails.
    pub fn create(&self, draft: &PlaceDraft) -> Result<Place> {
        let now = now();
        let stamp = encode_timestamp(now);

        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            r"
            INSERT INTO places
                (name, category, latitude, longitude, notes, is_favorite, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)
            ",
            params![
                draft.name,
                draft.category,
                draft.latitude,
                draft.longitude,
                draft.notes,
                draft.is_favorite,
                stamp,
            ],
        )?;
        let id = PlaceId::new(tx.last_insert_rowid());
        tx.commit()?;

        debug!("Created place {} ('{}')", id, draft.name);
        self.events.emit(PlaceEvent::Created(id));

        Ok(Place {
            id,
            name: draft.name.clone(),
            category: draft.category.clone(),
            latitude: draft.latitude,
            longitude: draft.longitude,
            notes: draft.notes.clone(),
            is_favorite: draft.is_favorite,
            created_at: now,
            updated_at: now,
        })
    }

    /// Get a place by its id.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if no such place exists, or an error if
    /// the database read fails.
    pub fn get(&self, id: PlaceId) -> Result<Place> {
        self.find(id)?.ok_or_else(|| Error::not_found(id))
    }

    /// Look up a place by its id, returning `None` if it doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the database read fails.
    pub fn find(&self, id: PlaceId) -> Result<Option<Place>> {
        fetch(&self.conn, id)
    }

    /// Apply a partial update and return the updated place.
    ///
    /// Only fields present in the patch change. An empty patch changes
    /// nothing, touches no timestamp and emits no event, but still fails for
    /// an unknown id.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if no such place exists, or an error if
    /// the database write fails.
    pub fn update(&self, id: PlaceId, patch: &PlacePatch) -> Result<Place> {
        if patch.is_empty() {
            debug!("Empty patch for place {}, nothing to write", id);
            return self.get(id);
        }
        self.mutate(id, |place| patch.apply_to(place))
    }

    /// Flip the favorite flag and return the updated place.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if no such place exists, or an error if
    /// the database write fails.
    pub fn toggle_favorite(&self, id: PlaceId) -> Result<Place> {
        self.mutate(id, |place| place.is_favorite = !place.is_favorite)
    }

    /// Read, change and write back one place inside a single transaction.
    fn mutate(&self, id: PlaceId, change: impl FnOnce(&mut Place)) -> Result<Place> {
        let tx = self.conn.unchecked_transaction()?;

        let mut place = fetch(&tx, id)?.ok_or_else(|| Error::not_found(id))?;
        change(&mut place);
        place.updated_at = now();

        tx.execute(
            r"
            UPDATE places
            SET name = ?2, category = ?3, latitude = ?4, longitude = ?5,
                notes = ?6, is_favorite = ?7, updated_at = ?8
            WHERE id = ?1
            ",
            params![
                id.get(),
                place.name,
                place.category,
                place.latitude,
                place.longitude,
                place.notes,
                place.is_favorite,
                encode_timestamp(place.updated_at),
            ],
        )?;
        tx.commit()?;

        debug!("Updated place {}", id);
        self.events.emit(PlaceEvent::Updated(id));
        Ok(place)
    }

    /// Permanently delete a place.
    ///
    /// Deleting is not idempotent: once a place is gone, deleting it again
    /// fails with [`Error::NotFound`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if no such place exists, or an error if
    /// the database write fails.
    pub fn delete(&self, id: PlaceId) -> Result<()> {
        let affected = self
            .conn
            .execute("DELETE FROM places WHERE id = ?1", [id.get()])?;
        if affected == 0 {
            return Err(Error::not_found(id));
        }

        debug!("Deleted place {}", id);
        self.events.emit(PlaceEvent::Deleted(id));
        Ok(())
    }

    /// All places, by name ascending, ties in insertion order.
    ///
    /// The result is a snapshot and does not follow later changes.
    ///
    /// # Errors
    ///
    /// Returns an error if the database read fails.
    pub fn list(&self) -> Result<Vec<Place>> {
        self.list_with(&ListQuery::default())
    }

    /// Places matching the query, in the query's order.
    ///
    /// # Errors
    ///
    /// Returns an error if the database read fails.
    pub fn list_with(&self, query: &ListQuery) -> Result<Vec<Place>> {
        let mut conditions: Vec<String> = Vec::new();
        let mut values: Vec<Value> = Vec::new();

        if query.favorites_only {
            conditions.push("is_favorite = 1".to_string());
        }
        if let Some(category) = &query.category {
            values.push(Value::Text(category.clone()));
            conditions.push(format!("category = ?{}", values.len()));
        }
        if let Some(text) = query.search.as_deref().filter(|t| !t.is_empty()) {
            values.push(Value::Text(like_pattern(text)));
            let n = values.len();
            conditions.push(format!(
                r"(name LIKE ?{n} ESCAPE '\' OR category LIKE ?{n} ESCAPE '\' OR notes LIKE ?{n} ESCAPE '\')"
            ));
        }

        let mut sql = format!("SELECT {PLACE_COLUMNS} FROM places");
        if !conditions.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&conditions.join(" AND "));
        }
        sql.push(' ');
        sql.push_str(&query.order_clause());
        if let Some(limit) = query.limit {
            values.push(Value::Integer(i64::try_from(limit).unwrap_or(i64::MAX)));
            sql.push_str(&format!(" LIMIT ?{}", values.len()));
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let places = stmt
            .query_map(params_from_iter(values), row_to_place)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        debug!("Listed {} place(s)", places.len());
        Ok(places)
    }

    /// Count stored places.
    ///
    /// # Errors
    ///
    /// Returns an error if the database read fails.
    pub fn count(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM places", [], |row| row.get(0))?;
        usize::try_from(count).map_err(|_| Error::internal(format!("negative count: {count}")))
    }

    /// Distinct non-empty categories, sorted.
    ///
    /// # Errors
    ///
    /// Returns an error if the database read fails.
    pub fn categories(&self) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT DISTINCT category FROM places WHERE category != '' ORDER BY category ASC",
        )?;
        let categories = stmt
            .query_map([], |row| row.get(0))?
            .collect::<std::result::Result<Vec<String>, _>>()?;
        Ok(categories)
    }

    /// Get store statistics.
    ///
    /// # Errors
    ///
    /// Returns an error if the database read fails.
    pub fn stats(&self) -> Result<PlaceStats> {
        let (total, favorites, last_modified): (i64, i64, Option<String>) =
            self.conn.query_row(
                "SELECT COUNT(*), COALESCE(SUM(is_favorite), 0), MAX(updated_at) FROM places",
                [],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )?;

        let last_modified = last_modified
            .map(|raw| decode_timestamp(&raw))
            .transpose()
            .map_err(|e| Error::internal(format!("bad timestamp in places table: {e}")))?;

        let db_size_bytes = if self.is_in_memory() {
            0
        } else {
            let mut wal = OsString::from(self.path.as_os_str());
            wal.push("-wal");
            [self.path.clone(), PathBuf::from(wal)]
                .iter()
                .filter_map(|p| std::fs::metadata(p).ok())
                .map(|m| m.len())
                .sum()
        };

        Ok(PlaceStats {
            total_places: usize::try_from(total).unwrap_or(0),
            favorite_places: usize::try_from(favorites).unwrap_or(0),
            categories: self.categories()?.len(),
            last_modified,
            schema_version: migrations::schema_version(&self.conn)?,
            db_size_bytes,
        })
    }

    /// Flush and close the store.
    ///
    /// Checkpoints the write-ahead log into the main database file, closes
    /// the connection and ends every subscription.
    ///
    /// # Errors
    ///
    /// Returns an error if the checkpoint or the close fails. The store is
    /// consumed either way.
    pub fn close(self) -> Result<()> {
        let Self {
            path,
            conn,
            wal,
            events,
        } = self;
        drop(events);

        if wal {
            conn.query_row("PRAGMA wal_checkpoint(TRUNCATE)", [], |_| Ok(()))
                .optional()?;
        }
        conn.close().map_err(|(_, source)| Error::DatabaseQuery(source))?;

        info!("Place store closed at {}", path.display());
        Ok(())
    }
}

/// Statistics about the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlaceStats {
    /// Total number of places stored.
    pub total_places: usize,
    /// Number of places marked favorite.
    pub favorite_places: usize,
    /// Number of distinct non-empty categories.
    pub categories: usize,
    /// Most recent modification time of any place.
    pub last_modified: Option<DateTime<Utc>>,
    /// Schema version recorded in the database.
    pub schema_version: i32,
    /// Size of the database file and its write-ahead log in bytes.
    pub db_size_bytes: u64,
}

/// Current time at the precision the store persists.
fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

/// Fixed-width RFC 3339, so text order matches time order.
fn encode_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn decode_timestamp(raw: &str) -> std::result::Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(raw).map(|dt| dt.with_timezone(&Utc))
}

/// `%text%` with LIKE wildcards in `text` escaped.
fn like_pattern(text: &str) -> String {
    let mut pattern = String::with_capacity(text.len() + 2);
    pattern.push('%');
    for c in text.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

fn fetch(conn: &Connection, id: PlaceId) -> Result<Option<Place>> {
    let place = conn
        .query_row(
            &format!("SELECT {PLACE_COLUMNS} FROM places WHERE id = ?1"),
            [id.get()],
            row_to_place,
        )
        .optional()?;
    Ok(place)
}

/// Convert a database row to a Place.
fn row_to_place(row: &rusqlite::Row) -> rusqlite::Result<Place> {
    let timestamp = |idx: usize| -> rusqlite::Result<DateTime<Utc>> {
        let raw: String = row.get(idx)?;
        decode_timestamp(&raw)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
    };

    Ok(Place {
        id: PlaceId::new(row.get(0)?),
        name: row.get(1)?,
        category: row.get(2)?,
        latitude: row.get::<_, Option<f64>>(3)?.unwrap_or(f64::NAN),
        longitude: row.get::<_, Option<f64>>(4)?.unwrap_or(f64::NAN),
        notes: row.get(5)?,
        is_favorite: row.get(6)?,
        created_at: timestamp(7)?,
        updated_at: timestamp(8)?,
    })
}
