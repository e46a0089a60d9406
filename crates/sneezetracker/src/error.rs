//! Error types for sneezetracker.
//!
//! Errors fall into two families: validation failures caused by the caller's
//! input, and environment failures (storage, configuration, I/O). The HTTP
//! layer reports the first family verbatim and the second only generically.

use std::path::PathBuf;
use thiserror::Error;

/// A rejection of caller-supplied sneeze data before it reaches storage.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Intensity was missing, not numeric, or outside 1..=5 after rounding.
    #[error("Intensity must be between 1 and 5")]
    InvalidIntensity,

    /// A date was supplied but could not be parsed into a timestamp.
    #[error("Invalid date: {value}")]
    InvalidDate {
        /// The raw input that failed to parse.
        value: String,
    },
}

impl ValidationError {
    /// Name of the input field that failed validation.
    #[must_use]
    pub fn field(&self) -> &'static str {
        match self {
            Self::InvalidIntensity => "intensity",
            Self::InvalidDate { .. } => "date",
        }
    }
}

/// The main error type for sneezetracker operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Validation Errors ===
    /// Caller-supplied data was rejected.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    // === Storage Errors ===
    /// Failed to open or create the database.
    #[error("failed to open database at {path}: {source}")]
    DatabaseOpen {
        /// Path to the database file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: rusqlite::Error,
    },

    /// A database query failed.
    #[error("database query failed: {0}")]
    DatabaseQuery(#[from] rusqlite::Error),

    /// Failed to run database migrations.
    #[error("database migration failed: {message}")]
    DatabaseMigration {
        /// Description of what went wrong.
        message: String,
    },

    // === Configuration Errors ===
    /// Failed to load configuration.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(Box<figment::Error>),

    /// Configuration validation failed.
    #[error("invalid configuration: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    // === I/O Errors ===
    /// File system or socket operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to create a required directory.
    #[error("failed to create directory {path}: {source}")]
    DirectoryCreate {
        /// Path that couldn't be created.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    // === Serialization Errors ===
    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // === Generic Errors ===
    /// An internal error occurred (bug, poisoned lock, cancelled task).
    #[error("internal error: {0}")]
    Internal(String),
}

/// A specialized Result type for sneezetracker operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl Error {
    /// Create a new internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Check if this error was caused by invalid caller input.
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Check if this error came from the storage layer.
    #[must_use]
    pub fn is_storage(&self) -> bool {
        matches!(
            self,
            Self::DatabaseOpen { .. } | Self::DatabaseQuery(_) | Self::DatabaseMigration { .. }
        )
    }
}
