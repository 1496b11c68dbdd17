//! Error types for commsheet.
//!
//! The resolution engine itself is total and never raises; these errors
//! cover the ambient layer around it: the override store's database, the
//! configuration loader, dataset files, and CLI-side I/O.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for commsheet operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Store Errors ===
    /// Failed to open or create the store database.
    #[error("failed to open store at {path}: {source}")]
    StoreOpen {
        /// Path to the database file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: rusqlite::Error,
    },

    /// A database query failed.
    #[error("store query failed: {0}")]
    StoreQuery(#[from] rusqlite::Error),

    /// Failed to run store migrations.
    #[error("store migration failed: {message}")]
    StoreMigration {
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

    // === Dataset Errors ===
    /// A bundled dataset file could not be read.
    #[error("failed to read dataset {path}: {source}")]
    DatasetRead {
        /// Path to the dataset file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// A bundled dataset file could not be parsed.
    #[error("failed to parse dataset {path}: {source}")]
    DatasetParse {
        /// Path to the dataset file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: serde_json::Error,
    },

    // === I/O Errors ===
    /// File system operation failed.
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
    /// An internal error occurred (bug).
    #[error("internal error: {0}")]
    Internal(String),
}

/// A specialized Result type for commsheet operations.
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

    /// Create a new store migration error.
    #[must_use]
    pub fn migration(message: impl Into<String>) -> Self {
        Self::StoreMigration {
            message: message.into(),
        }
    }

    /// Check if this error is a configuration problem.
    #[must_use]
    pub fn is_config_error(&self) -> bool {
        matches!(self, Self::ConfigLoad(_) | Self::ConfigValidation { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::internal("something went wrong");
        assert_eq!(err.to_string(), "internal error: something went wrong");

        let err = Error::migration("version mismatch");
        assert!(err.to_string().contains("version mismatch"));
    }

    #[test]
    fn test_config_validation_display() {
        let err = Error::ConfigValidation {
            message: "undo_depth must be greater than 0".to_string(),
        };
        assert!(err.to_string().contains("undo_depth"));
        assert!(err.is_config_error());
    }

    #[test]
    fn test_is_config_error() {
        assert!(!Error::internal("x").is_config_error());
        assert!(!Error::migration("x").is_config_error());
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_from_json_error() {
        let json_result: std::result::Result<i32, serde_json::Error> =
            serde_json::from_str("not valid json");
        if let Err(json_err) = json_result {
            let err: Error = json_err.into();
            assert!(matches!(err, Error::Json(_)));
        }
    }

    #[test]
    fn test_from_rusqlite_error() {
        let result = rusqlite::Connection::open_with_flags(
            "/nonexistent/path/db.sqlite",
            rusqlite::OpenFlags::SQLITE_OPEN_READ_ONLY,
        );
        if let Err(sqlite_err) = result {
            let err: Error = sqlite_err.into();
            assert!(matches!(err, Error::StoreQuery(_)));
        }
    }

    #[test]
    fn test_dataset_read_display() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let err = Error::DatasetRead {
            path: PathBuf::from("/data/radio_calls.json"),
            source: io_err,
        };
        let msg = err.to_string();
        assert!(msg.contains("/data/radio_calls.json"));
    }

    #[test]
    fn test_directory_create_display() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let err = Error::DirectoryCreate {
            path: PathBuf::from("/root/forbidden"),
            source: io_err,
        };
        assert!(err.to_string().contains("/root/forbidden"));
    }
}
