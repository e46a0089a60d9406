//! `SQLite` schema definitions for sneezetracker.
//!
//! Timestamps are stored as RFC 3339 UTC text with a fixed millisecond
//! precision, so lexical order on the `date` column is chronological order.

/// SQL statement to create the sneezes table.
pub const CREATE_SNEEZES_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS sneezes (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    intensity INTEGER NOT NULL CHECK (intensity BETWEEN 1 AND 5),
    location TEXT,
    notes TEXT,
    date TEXT NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
)
";

/// SQL statement to create an index on date for the newest-first listing.
pub const CREATE_DATE_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_sneezes_date ON sneezes(date DESC)
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
    CREATE_SNEEZES_TABLE,
    CREATE_DATE_INDEX,
    CREATE_METADATA_TABLE,
];
