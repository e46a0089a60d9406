//! Storage layer for sneezetracker.
//!
//! This module provides the [`SneezeStore`] contract (insert one, list all
//! newest first) and its `SQLite`-backed implementation, [`Storage`].

pub mod migrations;
pub mod schema;

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::sneeze::{Intensity, NewSneeze, SneezeId, SneezeRecord};

const SNEEZE_SELECT_SQL: &str = r"
SELECT id, intensity, location, notes, date, created_at, updated_at
FROM sneezes
";

/// Persistence contract for sneeze records.
///
/// Implementations must make `insert` all-or-nothing and return records from
/// `list` ordered by `date` descending.
pub trait SneezeStore: Send + Sync {
    /// Persist a validated sneeze and return it as stored.
    ///
    /// The store assigns `id`, `created_at`, `updated_at`, and `date` when
    /// the caller left it unset.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying storage fails.
    fn insert(&self, sneeze: &NewSneeze) -> Result<SneezeRecord>;

    /// Return every stored record, most recent `date` first.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying storage fails.
    fn list(&self) -> Result<Vec<SneezeRecord>>;
}

/// `SQLite` storage engine for sneeze records.
#[derive(Debug)]
pub struct Storage {
    /// Path to the database file.
    path: PathBuf,
    /// Database connection, shared across request threads.
    conn: Mutex<Connection>,
}

impl Storage {
    /// Open or create a storage database at the given path.
    ///
    /// Creates the parent directories and database file if they don't exist,
    /// then brings the schema up to date.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or schema initialization fails.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
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

        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;
        migrations::initialize_schema(&conn)?;

        info!("Database opened at {}", path.display());
        Ok(Self {
            path,
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory storage instance for testing.
    ///
    /// # Errors
    ///
    /// Returns an error if the in-memory database cannot be created.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|source| Error::DatabaseOpen {
            path: PathBuf::from(":memory:"),
            source,
        })?;

        migrations::initialize_schema(&conn)?;

        Ok(Self {
            path: PathBuf::from(":memory:"),
            conn: Mutex::new(conn),
        })
    }

    /// Get the path to the database file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Get a sneeze by its ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn get(&self, id: SneezeId) -> Result<Option<SneezeRecord>> {
        let conn = self.lock()?;
        Self::get_with(&conn, id)
    }

    /// Count stored sneezes.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn count(&self) -> Result<i64> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM sneezes", [], |row| row.get(0))?;
        Ok(count)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| Error::internal("storage connection lock poisoned"))
    }

    fn get_with(conn: &Connection, id: SneezeId) -> Result<Option<SneezeRecord>> {
        let record = conn
            .query_row(
                &format!("{SNEEZE_SELECT_SQL} WHERE id = ?1"),
                [id],
                Self::row_to_record,
            )
            .optional()?;
        Ok(record)
    }

    /// Convert a database row to a `SneezeRecord`.
    ///
    /// Malformed rows are reported as conversion errors rather than patched.
    fn row_to_record(row: &rusqlite::Row) -> rusqlite::Result<SneezeRecord> {
        let raw_intensity: i64 = row.get(1)?;
        let intensity = Intensity::new(raw_intensity)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(1, Type::Integer, Box::new(e)))?;

        Ok(SneezeRecord {
            id: row.get(0)?,
            intensity,
            location: row.get(2)?,
            notes: row.get(3)?,
            date: parse_timestamp(row, 4)?,
            created_at: parse_timestamp(row, 5)?,
            updated_at: parse_timestamp(row, 6)?,
        })
    }
}

impl SneezeStore for Storage {
    fn insert(&self, sneeze: &NewSneeze) -> Result<SneezeRecord> {
        let now = Utc::now();
        let date = sneeze.date.unwrap_or(now);

        let conn = self.lock()?;
        let tx = conn.unchecked_transaction()?;
        tx.execute(
            r"
            INSERT INTO sneezes (intensity, location, notes, date, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ",
            params![
                sneeze.intensity.value(),
                sneeze.location,
                sneeze.notes,
                format_timestamp(date),
                format_timestamp(now),
                format_timestamp(now),
            ],
        )?;

        let id = tx.last_insert_rowid();
        let record = Self::get_with(&tx, id)?
            .ok_or_else(|| Error::internal(format!("inserted sneeze {id} not found")))?;
        tx.commit()?;

        debug!("Inserted sneeze with id {}", id);
        Ok(record)
    }

    fn list(&self) -> Result<Vec<SneezeRecord>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!("{SNEEZE_SELECT_SQL} ORDER BY date DESC, id DESC"))?;

        let records = stmt
            .query_map([], Self::row_to_record)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(records)
    }
}

/// Render a timestamp in the fixed-width form stored in the database.
fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn parse_timestamp(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}
