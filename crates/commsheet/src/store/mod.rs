//! The override store.
//!
//! `SQLite`-backed persistence for every user customization layer: call
//! overrides, sequence overrides, user calls, permanent hides, block
//! overrides, user blocks, block ordering, call-sign history, and saved
//! sheets. Each layer is one named slice, stored as a whole JSON document
//! and rewritten on every mutation.
//!
//! Slice operations are total: corrupt or missing data degrades to the
//! slice's empty default with a warning, and write failures are logged
//! rather than raised. Opening the store is the only fallible entry point.

pub mod migrations;
pub mod schema;

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use rusqlite::{Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::blocks::BlockOverride;
use crate::call::{CallOverride, UserBlock, UserBlockCall, UserCall};
use crate::error::{Error, Result};
use crate::sheet::SavedSheet;

/// Slice key for call overrides.
const CALL_OVERRIDES: &str = "call_overrides";
/// Slice key for sequence overrides.
const SEQ_OVERRIDES: &str = "seq_overrides";
/// Slice key for user-added calls.
const USER_CALLS: &str = "user_calls";
/// Slice key for permanent hides.
const PERMANENT_HIDES: &str = "permanent_hides";
/// Slice key for block overrides.
const BLOCK_OVERRIDES: &str = "block_overrides";
/// Slice key for user-defined blocks.
const USER_BLOCKS: &str = "user_blocks";
/// Slice key for block ordering overrides.
const BLOCK_SEQ_OVERRIDES: &str = "block_seq_overrides";
/// Slice key for call-sign history.
const CALLSIGN_HISTORY: &str = "callsign_history";
/// Slice key for saved sheets.
const SAVED_SHEETS: &str = "saved_sheets";

/// Metadata key for the promoted default library bundle.
const DEFAULT_BUNDLE_KEY: &str = "default_bundle";

/// Minimum length for a remembered call sign.
const MIN_CALL_SIGN_LEN: usize = 3;

/// A whole-library document: every slice the library editor mutates.
///
/// Used for undo snapshots, backup export/import, and the promotable
/// default library.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LibraryBundle {
    /// Call overrides keyed by master call id.
    pub call_overrides: BTreeMap<String, CallOverride>,
    /// Sequence overrides keyed by master call id.
    pub seq_overrides: BTreeMap<String, f64>,
    /// Block overrides keyed by block id.
    pub block_overrides: BTreeMap<String, BlockOverride>,
    /// Block ordering keyed by block id.
    pub block_seq_overrides: BTreeMap<String, f64>,
    /// Permanently hidden master call ids.
    pub permanent_hides: BTreeSet<String>,
    /// User-authored calls.
    pub user_calls: Vec<UserCall>,
    /// User-defined blocks.
    pub user_blocks: Vec<UserBlock>,
}

/// Two-digit decimal sequence between two neighbors, for inserting a call
/// without renumbering the rest of its block.
#[must_use]
pub fn decimal_seq_between(before: Option<f64>, after: Option<f64>) -> f64 {
    let raw = match (before, after) {
        (None, None) => return 1.0,
        (None, Some(after)) => after - 0.5,
        (Some(before), None) => before + 0.5,
        (Some(before), Some(after)) => (before + after) / 2.0,
    };
    (raw * 100.0).round() / 100.0
}

/// Render a sequence number the way the editor displays it.
#[must_use]
pub fn format_seq(seq: f64) -> String {
    format!("{seq:.2}")
}

/// The override store.
#[derive(Debug)]
pub struct Store {
    /// Path to the database file.
    path: PathBuf,
    /// Database connection.
    conn: Connection,
}

impl Store {
    /// Open or create a store at the given path.
    ///
    /// Creates parent directories and the database file if needed, runs
    /// migrations, and applies the promoted default bundle (if one has been
    /// set) so a promoted library takes effect at every session start.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or schema
    /// initialization fails.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|source| Error::DirectoryCreate {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        debug!("Opening store at {}", path.display());
        let conn = Connection::open(&path).map_err(|source| Error::StoreOpen {
            path: path.clone(),
            source,
        })?;

        // WAL for better concurrent read behavior
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;

        migrations::initialize_schema(&conn)?;

        let store = Self { path, conn };
        if let Some(bundle) = store.default_bundle() {
            info!("applying promoted default library bundle");
            store.restore(&bundle);
        }
        Ok(store)
    }

    /// Create an in-memory store for testing.
    ///
    /// # Errors
    ///
    /// Returns an error if the in-memory database cannot be created.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|source| Error::StoreOpen {
            path: PathBuf::from(":memory:"),
            source,
        })?;

        migrations::initialize_schema(&conn)?;

        Ok(Self {
            path: PathBuf::from(":memory:"),
            conn,
        })
    }

    /// Get the path to the database file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    // === Slice plumbing ===

    fn read_raw(&self, key: &str) -> Option<String> {
        match self
            .conn
            .query_row("SELECT value FROM slices WHERE key = ?1", [key], |row| {
                row.get(0)
            })
            .optional()
        {
            Ok(value) => value,
            Err(err) => {
                warn!("failed to read slice {key}: {err}");
                None
            }
        }
    }

    fn write_raw(&self, key: &str, value: &str) {
        let result = self.conn.execute(
            r"
            INSERT INTO slices (key, value, updated_at) VALUES (?1, ?2, datetime('now'))
            ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
            ",
            (key, value),
        );
        if let Err(err) = result {
            error!("failed to write slice {key}: {err}");
        }
    }

    /// Read a slice, degrading to its default on missing or corrupt data.
    fn read_slice<T: DeserializeOwned + Default>(&self, key: &str) -> T {
        match self.read_raw(key) {
            Some(raw) => match serde_json::from_str(&raw) {
                Ok(value) => value,
                Err(err) => {
                    warn!("corrupt slice {key}, using default: {err}");
                    T::default()
                }
            },
            None => T::default(),
        }
    }

    /// Write a slice wholesale.
    fn write_slice<T: Serialize>(&self, key: &str, value: &T) {
        match serde_json::to_string(value) {
            Ok(raw) => self.write_raw(key, &raw),
            Err(err) => error!("failed to serialize slice {key}: {err}"),
        }
    }

    // === Call overrides ===

    /// All call overrides, keyed by master call id.
    #[must_use]
    pub fn call_overrides(&self) -> BTreeMap<String, CallOverride> {
        self.read_slice(CALL_OVERRIDES)
    }

    /// Merge a patch into the override for the given call id.
    pub fn set_call_override(&self, id: &str, patch: &CallOverride) {
        let mut overrides = self.call_overrides();
        overrides.entry(id.to_string()).or_default().merge(patch);
        self.write_slice(CALL_OVERRIDES, &overrides);
    }

    /// Remove the override for the given call id.
    pub fn remove_call_override(&self, id: &str) {
        let mut overrides = self.call_overrides();
        if overrides.remove(id).is_some() {
            self.write_slice(CALL_OVERRIDES, &overrides);
        }
    }

    /// Reset one call completely: drop its override and its sequence
    /// override.
    pub fn clear_call_customization(&self, id: &str) {
        self.remove_call_override(id);
        let mut seqs = self.seq_overrides();
        if seqs.remove(id).is_some() {
            self.write_slice(SEQ_OVERRIDES, &seqs);
        }
    }

    // === Sequence overrides ===

    /// All sequence overrides, keyed by master call id.
    #[must_use]
    pub fn seq_overrides(&self) -> BTreeMap<String, f64> {
        self.read_slice(SEQ_OVERRIDES)
    }

    /// Set the sequence override for one call.
    pub fn set_seq_override(&self, id: &str, seq: f64) {
        let mut seqs = self.seq_overrides();
        seqs.insert(id.to_string(), seq);
        self.write_slice(SEQ_OVERRIDES, &seqs);
    }

    /// Merge many sequence overrides at once.
    pub fn merge_seq_overrides(&self, map: &BTreeMap<String, f64>) {
        if map.is_empty() {
            return;
        }
        let mut seqs = self.seq_overrides();
        for (id, seq) in map {
            seqs.insert(id.clone(), *seq);
        }
        self.write_slice(SEQ_OVERRIDES, &seqs);
    }

    // === User calls ===

    /// All user-authored calls.
    #[must_use]
    pub fn user_calls(&self) -> Vec<UserCall> {
        self.read_slice(USER_CALLS)
    }

    /// Add a user call.
    pub fn add_user_call(&self, call: UserCall) {
        let mut calls = self.user_calls();
        calls.push(call);
        self.write_slice(USER_CALLS, &calls);
    }

    /// Update a user call in place. Returns `false` if the id is unknown.
    pub fn update_user_call(&self, id: &str, update: impl FnOnce(&mut UserCall)) -> bool {
        let mut calls = self.user_calls();
        let Some(call) = calls.iter_mut().find(|c| c.id == id) else {
            return false;
        };
        update(call);
        self.write_slice(USER_CALLS, &calls);
        true
    }

    /// Delete a user call.
    pub fn delete_user_call(&self, id: &str) {
        let calls: Vec<UserCall> = self
            .user_calls()
            .into_iter()
            .filter(|c| c.id != id)
            .collect();
        self.write_slice(USER_CALLS, &calls);
    }

    // === Permanent hides ===

    /// The set of permanently hidden master call ids.
    #[must_use]
    pub fn permanent_hides(&self) -> BTreeSet<String> {
        self.read_slice(PERMANENT_HIDES)
    }

    /// Add or remove a permanent hide.
    pub fn set_permanent_hide(&self, id: &str, hidden: bool) {
        let mut hides = self.permanent_hides();
        let changed = if hidden {
            hides.insert(id.to_string())
        } else {
            hides.remove(id)
        };
        if changed {
            self.write_slice(PERMANENT_HIDES, &hides);
        }
    }

    // === Block overrides ===

    /// All block overrides, keyed by block id.
    #[must_use]
    pub fn block_overrides(&self) -> BTreeMap<String, BlockOverride> {
        self.read_slice(BLOCK_OVERRIDES)
    }

    /// Merge a patch into the override for the given block id.
    pub fn set_block_override(&self, block_id: &str, patch: &BlockOverride) {
        let mut overrides = self.block_overrides();
        overrides
            .entry(block_id.to_string())
            .or_default()
            .merge(patch);
        self.write_slice(BLOCK_OVERRIDES, &overrides);
    }

    // === User blocks ===

    /// All user-defined blocks.
    #[must_use]
    pub fn user_blocks(&self) -> Vec<UserBlock> {
        self.read_slice(USER_BLOCKS)
    }

    /// Add a user block.
    pub fn add_user_block(&self, block: UserBlock) {
        let mut blocks = self.user_blocks();
        blocks.push(block);
        self.write_slice(USER_BLOCKS, &blocks);
    }

    /// Update a user block in place. Returns `false` if the id is unknown.
    pub fn update_user_block(&self, id: &str, update: impl FnOnce(&mut UserBlock)) -> bool {
        let mut blocks = self.user_blocks();
        let Some(block) = blocks.iter_mut().find(|b| b.id == id) else {
            return false;
        };
        update(block);
        self.write_slice(USER_BLOCKS, &blocks);
        true
    }

    /// Replace a user block's calls array wholesale (reordering).
    /// Returns `false` if the id is unknown.
    pub fn set_user_block_calls(&self, id: &str, calls: Vec<UserBlockCall>) -> bool {
        self.update_user_block(id, |block| block.calls = calls)
    }

    /// Delete a user block.
    pub fn delete_user_block(&self, id: &str) {
        let blocks: Vec<UserBlock> = self
            .user_blocks()
            .into_iter()
            .filter(|b| b.id != id)
            .collect();
        self.write_slice(USER_BLOCKS, &blocks);
    }

    // === Block ordering ===

    /// All block ordering overrides, keyed by block id.
    #[must_use]
    pub fn block_seq_overrides(&self) -> BTreeMap<String, f64> {
        self.read_slice(BLOCK_SEQ_OVERRIDES)
    }

    /// Set the ordering override for one block.
    pub fn set_block_seq_override(&self, block_id: &str, seq: f64) {
        let mut seqs = self.block_seq_overrides();
        seqs.insert(block_id.to_string(), seq);
        self.write_slice(BLOCK_SEQ_OVERRIDES, &seqs);
    }

    /// Merge many block ordering overrides at once.
    pub fn merge_block_seq_overrides(&self, map: &BTreeMap<String, f64>) {
        if map.is_empty() {
            return;
        }
        let mut seqs = self.block_seq_overrides();
        for (id, seq) in map {
            seqs.insert(id.clone(), *seq);
        }
        self.write_slice(BLOCK_SEQ_OVERRIDES, &seqs);
    }

    // === Call-sign history ===

    /// Remembered call signs, most recent first.
    #[must_use]
    pub fn call_sign_history(&self) -> Vec<String> {
        self.read_slice(CALLSIGN_HISTORY)
    }

    /// Remember a call sign, deduplicating and capping the history.
    ///
    /// Call signs shorter than three characters are ignored.
    pub fn add_call_sign(&self, call_sign: &str, limit: usize) {
        let trimmed = call_sign.trim();
        if trimmed.len() < MIN_CALL_SIGN_LEN {
            return;
        }
        let mut history: Vec<String> = self
            .call_sign_history()
            .into_iter()
            .filter(|h| h != trimmed)
            .collect();
        history.insert(0, trimmed.to_string());
        history.truncate(limit);
        self.write_slice(CALLSIGN_HISTORY, &history);
    }

    /// Forget a call sign.
    pub fn delete_call_sign(&self, call_sign: &str) {
        let history: Vec<String> = self
            .call_sign_history()
            .into_iter()
            .filter(|h| h != call_sign)
            .collect();
        self.write_slice(CALLSIGN_HISTORY, &history);
    }

    // === Saved sheets ===

    /// All saved sheets, most recently created first.
    #[must_use]
    pub fn saved_sheets(&self) -> Vec<SavedSheet> {
        self.read_slice(SAVED_SHEETS)
    }

    /// Look up a saved sheet by id.
    #[must_use]
    pub fn saved_sheet(&self, id: &str) -> Option<SavedSheet> {
        self.saved_sheets().into_iter().find(|s| s.id == id)
    }

    /// Save a sheet, replacing any existing sheet with the same id.
    pub fn save_sheet(&self, sheet: &SavedSheet) {
        let mut sheets = self.saved_sheets();
        if let Some(existing) = sheets.iter_mut().find(|s| s.id == sheet.id) {
            *existing = sheet.clone();
        } else {
            sheets.insert(0, sheet.clone());
        }
        self.write_slice(SAVED_SHEETS, &sheets);
    }

    /// Delete a saved sheet.
    pub fn delete_sheet(&self, id: &str) {
        let sheets: Vec<SavedSheet> = self
            .saved_sheets()
            .into_iter()
            .filter(|s| s.id != id)
            .collect();
        self.write_slice(SAVED_SHEETS, &sheets);
    }

    // === Whole-library operations ===

    /// Reset customization layers to factory state.
    ///
    /// Clears call overrides, permanent hides, block overrides, sequence
    /// overrides, and block ordering. User calls, user blocks, and call-sign
    /// history are deliberately preserved: user-authored content is never
    /// destroyed by a reset.
    pub fn restore_defaults(&self) {
        self.write_slice(CALL_OVERRIDES, &BTreeMap::<String, CallOverride>::new());
        self.write_slice(PERMANENT_HIDES, &BTreeSet::<String>::new());
        self.write_slice(BLOCK_OVERRIDES, &BTreeMap::<String, BlockOverride>::new());
        self.write_slice(SEQ_OVERRIDES, &BTreeMap::<String, f64>::new());
        self.write_slice(BLOCK_SEQ_OVERRIDES, &BTreeMap::<String, f64>::new());
        info!("restored library defaults (user calls and blocks preserved)");
    }

    /// Capture every library slice as a single document.
    #[must_use]
    pub fn snapshot(&self) -> LibraryBundle {
        LibraryBundle {
            call_overrides: self.call_overrides(),
            seq_overrides: self.seq_overrides(),
            block_overrides: self.block_overrides(),
            block_seq_overrides: self.block_seq_overrides(),
            permanent_hides: self.permanent_hides(),
            user_calls: self.user_calls(),
            user_blocks: self.user_blocks(),
        }
    }

    /// Restore every library slice from a document.
    pub fn restore(&self, bundle: &LibraryBundle) {
        self.write_slice(CALL_OVERRIDES, &bundle.call_overrides);
        self.write_slice(SEQ_OVERRIDES, &bundle.seq_overrides);
        self.write_slice(BLOCK_OVERRIDES, &bundle.block_overrides);
        self.write_slice(BLOCK_SEQ_OVERRIDES, &bundle.block_seq_overrides);
        self.write_slice(PERMANENT_HIDES, &bundle.permanent_hides);
        self.write_slice(USER_CALLS, &bundle.user_calls);
        self.write_slice(USER_BLOCKS, &bundle.user_blocks);
    }

    // === Default bundle ===

    /// The promoted default bundle, if one has been set.
    #[must_use]
    pub fn default_bundle(&self) -> Option<LibraryBundle> {
        let raw: Option<String> = match self
            .conn
            .query_row(
                "SELECT value FROM metadata WHERE key = ?1",
                [DEFAULT_BUNDLE_KEY],
                |row| row.get(0),
            )
            .optional()
        {
            Ok(value) => value,
            Err(err) => {
                warn!("failed to read default bundle: {err}");
                None
            }
        };
        raw.and_then(|raw| match serde_json::from_str(&raw) {
            Ok(bundle) => Some(bundle),
            Err(err) => {
                warn!("corrupt default bundle, ignoring: {err}");
                None
            }
        })
    }

    /// Promote a bundle as the default applied at every future open.
    pub fn set_default_bundle(&self, bundle: &LibraryBundle) {
        match serde_json::to_string(bundle) {
            Ok(raw) => {
                let result = self.conn.execute(
                    "INSERT OR REPLACE INTO metadata (key, value) VALUES (?1, ?2)",
                    (DEFAULT_BUNDLE_KEY, raw),
                );
                if let Err(err) = result {
                    error!("failed to store default bundle: {err}");
                }
            }
            Err(err) => error!("failed to serialize default bundle: {err}"),
        }
    }

    /// Clear the promoted default bundle.
    pub fn clear_default_bundle(&self) {
        let result = self.conn.execute(
            "DELETE FROM metadata WHERE key = ?1",
            [DEFAULT_BUNDLE_KEY],
        );
        if let Err(err) = result {
            error!("failed to clear default bundle: {err}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::call::{CallKind, ContextTag};

    fn create_test_store() -> Store {
        Store::open_in_memory().expect("failed to create test store")
    }

    fn user_call(id: &str, block: &str, seq: f64) -> UserCall {
        UserCall {
            id: id.to_string(),
            block: block.to_string(),
            group: None,
            seq,
            kind: CallKind::Radio,
            text: format!("user call {id}"),
            applies: vec![ContextTag::VfrNt, ContextTag::VfrT],
        }
    }

    #[test]
    fn test_open_in_memory() {
        let store = Store::open_in_memory();
        assert!(store.is_ok());
    }

    #[test]
    fn test_empty_slices_default() {
        let store = create_test_store();
        assert!(store.call_overrides().is_empty());
        assert!(store.seq_overrides().is_empty());
        assert!(store.user_calls().is_empty());
        assert!(store.permanent_hides().is_empty());
        assert!(store.block_overrides().is_empty());
        assert!(store.user_blocks().is_empty());
        assert!(store.block_seq_overrides().is_empty());
        assert!(store.call_sign_history().is_empty());
        assert!(store.saved_sheets().is_empty());
    }

    #[test]
    fn test_corrupt_slice_degrades_to_default() {
        let store = create_test_store();
        store.write_raw(CALL_OVERRIDES, "this is not json");
        assert!(store.call_overrides().is_empty());
    }

    #[test]
    fn test_set_call_override_merges() {
        let store = create_test_store();
        store.set_call_override(
            "X",
            &CallOverride {
                text: Some("New text".to_string()),
                ..CallOverride::default()
            },
        );
        store.set_call_override(
            "X",
            &CallOverride {
                kind: Some(CallKind::Note),
                ..CallOverride::default()
            },
        );

        let overrides = store.call_overrides();
        let patch = overrides.get("X").unwrap();
        assert_eq!(patch.text.as_deref(), Some("New text"));
        assert_eq!(patch.kind, Some(CallKind::Note));
    }

    #[test]
    fn test_remove_call_override() {
        let store = create_test_store();
        store.set_call_override(
            "X",
            &CallOverride {
                text: Some("t".to_string()),
                ..CallOverride::default()
            },
        );
        store.remove_call_override("X");
        assert!(store.call_overrides().is_empty());
    }

    #[test]
    fn test_clear_call_customization_drops_seq_too() {
        let store = create_test_store();
        store.set_call_override(
            "X",
            &CallOverride {
                text: Some("t".to_string()),
                ..CallOverride::default()
            },
        );
        store.set_seq_override("X", 4.0);
        store.set_seq_override("Y", 2.0);

        store.clear_call_customization("X");
        assert!(store.call_overrides().is_empty());
        assert!(!store.seq_overrides().contains_key("X"));
        assert!(store.seq_overrides().contains_key("Y"));
    }

    #[test]
    fn test_merge_seq_overrides() {
        let store = create_test_store();
        store.set_seq_override("A", 1.0);

        let mut map = BTreeMap::new();
        map.insert("B".to_string(), 2.0);
        map.insert("C".to_string(), 3.0);
        store.merge_seq_overrides(&map);

        let seqs = store.seq_overrides();
        assert_eq!(seqs.len(), 3);
        assert_eq!(seqs["B"], 2.0);
    }

    #[test]
    fn test_user_call_crud() {
        let store = create_test_store();
        store.add_user_call(user_call("u1", "taxi_out", 1.0));
        store.add_user_call(user_call("u2", "enroute", 2.0));

        assert!(store.update_user_call("u1", |c| c.seq = 5.0));
        assert!(!store.update_user_call("missing", |c| c.seq = 5.0));

        let calls = store.user_calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].seq, 5.0);

        store.delete_user_call("u1");
        assert_eq!(store.user_calls().len(), 1);
        assert_eq!(store.user_calls()[0].id, "u2");
    }

    #[test]
    fn test_permanent_hides() {
        let store = create_test_store();
        store.set_permanent_hide("X", true);
        store.set_permanent_hide("Y", true);
        assert_eq!(store.permanent_hides().len(), 2);

        store.set_permanent_hide("X", false);
        let hides = store.permanent_hides();
        assert_eq!(hides.len(), 1);
        assert!(hides.contains("Y"));
    }

    #[test]
    fn test_block_override_merges() {
        let store = create_test_store();
        store.set_block_override(
            "taxi_out",
            &BlockOverride {
                name: Some("Ground Ops".to_string()),
                ..BlockOverride::default()
            },
        );
        store.set_block_override(
            "taxi_out",
            &BlockOverride {
                target_towered: Some("Ground 121.9".to_string()),
                ..BlockOverride::default()
            },
        );

        let overrides = store.block_overrides();
        let patch = overrides.get("taxi_out").unwrap();
        assert_eq!(patch.name.as_deref(), Some("Ground Ops"));
        assert_eq!(patch.target_towered.as_deref(), Some("Ground 121.9"));
    }

    #[test]
    fn test_user_block_crud() {
        let store = create_test_store();
        store.add_user_block(UserBlock {
            id: "ub1".to_string(),
            name: "Practice Area".to_string(),
            target: "CTAF".to_string(),
            seq: 1.0,
            calls: vec![],
        });

        assert!(store.update_user_block("ub1", |b| b.name = "Practice".to_string()));
        assert_eq!(store.user_blocks()[0].name, "Practice");

        store.delete_user_block("ub1");
        assert!(store.user_blocks().is_empty());
    }

    #[test]
    fn test_set_user_block_calls() {
        let store = create_test_store();
        store.add_user_block(UserBlock {
            id: "ub1".to_string(),
            name: "Practice Area".to_string(),
            target: "CTAF".to_string(),
            seq: 1.0,
            calls: vec![
                UserBlockCall {
                    id: "c1".to_string(),
                    kind: CallKind::Radio,
                    text: "first".to_string(),
                    seq: 1.0,
                },
                UserBlockCall {
                    id: "c2".to_string(),
                    kind: CallKind::Radio,
                    text: "second".to_string(),
                    seq: 2.0,
                },
            ],
        });

        let reordered = vec![
            UserBlockCall {
                id: "c2".to_string(),
                kind: CallKind::Radio,
                text: "second".to_string(),
                seq: 1.0,
            },
            UserBlockCall {
                id: "c1".to_string(),
                kind: CallKind::Radio,
                text: "first".to_string(),
                seq: 2.0,
            },
        ];
        assert!(store.set_user_block_calls("ub1", reordered));

        let block = &store.user_blocks()[0];
        assert_eq!(block.calls[0].id, "c2");
        assert_eq!(block.calls[0].seq, 1.0);
        assert_eq!(block.calls[1].id, "c1");
        assert_eq!(block.calls[1].seq, 2.0);
    }

    #[test]
    fn test_call_sign_history_dedup_and_cap() {
        let store = create_test_store();
        store.add_call_sign("Skyhawk 12345", 3);
        store.add_call_sign("Warrior 54321", 3);
        store.add_call_sign("Skyhawk 12345", 3);

        let history = store.call_sign_history();
        assert_eq!(history, vec!["Skyhawk 12345", "Warrior 54321"]);

        store.add_call_sign("Archer 111", 3);
        store.add_call_sign("Cub 222", 3);
        assert_eq!(store.call_sign_history().len(), 3);
    }

    #[test]
    fn test_call_sign_too_short_ignored() {
        let store = create_test_store();
        store.add_call_sign("ab", 20);
        store.add_call_sign("  ", 20);
        assert!(store.call_sign_history().is_empty());
    }

    #[test]
    fn test_delete_call_sign() {
        let store = create_test_store();
        store.add_call_sign("Skyhawk 12345", 20);
        store.delete_call_sign("Skyhawk 12345");
        assert!(store.call_sign_history().is_empty());
    }

    #[test]
    fn test_restore_defaults_preserves_user_content() {
        let store = create_test_store();
        store.set_call_override(
            "X",
            &CallOverride {
                text: Some("t".to_string()),
                ..CallOverride::default()
            },
        );
        store.set_seq_override("X", 2.0);
        store.set_permanent_hide("Y", true);
        store.set_block_override(
            "startup",
            &BlockOverride {
                name: Some("Ramp".to_string()),
                ..BlockOverride::default()
            },
        );
        store.set_block_seq_override("startup", 9.0);
        store.add_user_call(user_call("u1", "taxi_out", 1.0));
        store.add_user_block(UserBlock {
            id: "ub1".to_string(),
            name: "Practice".to_string(),
            target: "CTAF".to_string(),
            seq: 1.0,
            calls: vec![],
        });

        store.restore_defaults();

        assert!(store.call_overrides().is_empty());
        assert!(store.seq_overrides().is_empty());
        assert!(store.permanent_hides().is_empty());
        assert!(store.block_overrides().is_empty());
        assert!(store.block_seq_overrides().is_empty());
        assert_eq!(store.user_calls().len(), 1);
        assert_eq!(store.user_blocks().len(), 1);
    }

    #[test]
    fn test_snapshot_restore_roundtrip() {
        let store = create_test_store();
        store.set_call_override(
            "X",
            &CallOverride {
                text: Some("edited".to_string()),
                ..CallOverride::default()
            },
        );
        store.add_user_call(user_call("u1", "enroute", 1.0));
        store.set_permanent_hide("Y", true);

        let before = store.snapshot();

        store.remove_call_override("X");
        store.delete_user_call("u1");
        store.set_permanent_hide("Y", false);
        store.set_permanent_hide("Z", true);
        assert_ne!(store.snapshot(), before);

        store.restore(&before);
        assert_eq!(store.snapshot(), before);
    }

    #[test]
    fn test_default_bundle_roundtrip() {
        let store = create_test_store();
        assert!(store.default_bundle().is_none());

        store.set_call_override(
            "X",
            &CallOverride {
                text: Some("edited".to_string()),
                ..CallOverride::default()
            },
        );
        let bundle = store.snapshot();
        store.set_default_bundle(&bundle);

        assert_eq!(store.default_bundle(), Some(bundle));

        store.clear_default_bundle();
        assert!(store.default_bundle().is_none());
    }

    #[test]
    fn test_open_applies_default_bundle() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("library.db");

        {
            let store = Store::open(&path).unwrap();
            store.set_call_override(
                "X",
                &CallOverride {
                    text: Some("promoted".to_string()),
                    ..CallOverride::default()
                },
            );
            store.set_default_bundle(&store.snapshot());
            // Diverge from the promoted state
            store.remove_call_override("X");
            assert!(store.call_overrides().is_empty());
        }

        let store = Store::open(&path).unwrap();
        let overrides = store.call_overrides();
        assert_eq!(
            overrides.get("X").and_then(|o| o.text.as_deref()),
            Some("promoted")
        );
    }

    #[test]
    fn test_open_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/deeper/library.db");

        let store = Store::open(&path).unwrap();
        assert!(path.exists());
        assert_eq!(store.path(), path);
    }

    #[test]
    fn test_saved_sheet_bundle_excluded_from_snapshot() {
        // Saved sheets are flight artifacts, not library state; snapshots
        // must not carry them.
        let store = create_test_store();
        let bundle = store.snapshot();
        let json = serde_json::to_string(&bundle).unwrap();
        assert!(!json.contains("saved_sheets"));
    }

    #[test]
    fn test_decimal_seq_between() {
        assert_eq!(decimal_seq_between(None, None), 1.0);
        assert_eq!(decimal_seq_between(Some(2.0), None), 2.5);
        assert_eq!(decimal_seq_between(None, Some(2.0)), 1.5);
        assert_eq!(decimal_seq_between(Some(1.0), Some(2.0)), 1.5);
        // Rounded to two digits.
        assert_eq!(decimal_seq_between(Some(1.0), Some(1.33)), 1.17);
    }

    #[test]
    fn test_format_seq() {
        assert_eq!(format_seq(1.0), "1.00");
        assert_eq!(format_seq(2.5), "2.50");
        assert_eq!(format_seq(1.17), "1.17");
    }

    #[test]
    fn test_partial_bundle_import() {
        let store = create_test_store();
        let bundle: LibraryBundle =
            serde_json::from_str(r#"{"permanent_hides": ["X"]}"#).unwrap();
        store.restore(&bundle);

        assert!(store.permanent_hides().contains("X"));
        assert!(store.call_overrides().is_empty());
    }
}
