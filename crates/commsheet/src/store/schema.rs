//! `SQLite` schema definitions for the override store.
//!
//! The store keeps each customization layer as a whole JSON document in a
//! key-value table; every mutation is a whole-slice read-modify-write.

/// SQL statement to create the slices table.
pub const CREATE_SLICES_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS slices (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL,
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
)
";

/// SQL statement to create the metadata table for storing key-value pairs.
pub const CREATE_METADATA_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS metadata (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
)
";

/// All schema creation statements in order.
pub const SCHEMA_STATEMENTS: &[&str] = &[CREATE_SLICES_TABLE, CREATE_METADATA_TABLE];
