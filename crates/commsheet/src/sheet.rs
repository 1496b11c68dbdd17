//! Sheet session state and interactive edits.
//!
//! A [`Sheet`] wraps one generation's calls and block instances together
//! with the per-sheet state that is not part of the library: hidden calls,
//! hidden blocks, collapsed sections, the call sign, and the route inputs.
//! Small interactive edits mutate the sheet in place; a full regeneration
//! replaces it wholesale.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::blocks::BlockType;
use crate::call::{CallKind, ContextTag, FlightRules, Origin, UserBlock, UserBlockCall, UserCall};
use crate::callsign::{abbreviate, TemplateVars};
use crate::engine::{BlockInstance, CallId, Generation, InstanceKey, Phase, ResolvedCall};
use crate::route::Route;
use crate::store::Store;

/// Sequence assigned to interactively added calls so they land at the end
/// of their block until reordered.
const APPENDED_CALL_SEQ: f64 = 999.0;

/// Vertical spacing between two adjacent rows of a rendered block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowSpacing {
    /// First row of a section.
    SectionStart,
    /// Gap between two distinct explicit groups.
    GroupGap,
    /// Tight spacing inside a group or between ungrouped neighbors.
    Tight,
}

/// Spacing before `call` given the previous row in the same rendered list.
///
/// Calls sharing a group stay tight; a boundary between two different
/// explicit groups gets a gap.
#[must_use]
pub fn row_spacing(prev: Option<&ResolvedCall>, call: &ResolvedCall) -> RowSpacing {
    let Some(prev) = prev else {
        return RowSpacing::SectionStart;
    };
    if prev.block != call.block {
        return RowSpacing::SectionStart;
    }
    match (&prev.group, &call.group) {
        (Some(a), Some(b)) if a != b => RowSpacing::GroupGap,
        _ => RowSpacing::Tight,
    }
}

/// One comm sheet being edited.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sheet {
    /// The pilot's call sign.
    pub call_sign: String,
    /// Flight rules the sheet was generated under.
    pub flight_rules: FlightRules,
    /// The route the sheet was generated from.
    pub route: Route,
    /// Resolved calls, in display order.
    pub calls: Vec<ResolvedCall>,
    /// Block instances, in display order.
    pub blocks: Vec<BlockInstance>,
    /// Per-sheet hidden calls (still resolved, flagged invisible).
    #[serde(default)]
    pub hidden: BTreeSet<CallId>,
    /// Per-sheet hidden blocks.
    #[serde(default)]
    pub hidden_blocks: BTreeSet<InstanceKey>,
    /// Collapsed sections (render state, not exported).
    #[serde(default)]
    pub collapsed: BTreeSet<InstanceKey>,
    /// Next identity for interactively added calls.
    pub(crate) next_call: u64,
    /// Next identity for interactively added instances.
    pub(crate) next_instance: u64,
}

impl Sheet {
    /// Wrap a generation with its inputs.
    #[must_use]
    pub fn from_generation(
        generation: Generation,
        call_sign: impl Into<String>,
        flight_rules: FlightRules,
        route: Route,
    ) -> Self {
        let next_call = generation.calls.iter().map(|c| c.id.0).max().unwrap_or(0) + 1;
        let next_instance = generation.blocks.iter().map(|b| b.key.0).max().unwrap_or(0) + 1;
        Self {
            call_sign: call_sign.into(),
            flight_rules,
            route,
            calls: generation.calls,
            blocks: generation.blocks,
            hidden: BTreeSet::new(),
            hidden_blocks: BTreeSet::new(),
            collapsed: BTreeSet::new(),
            next_call,
            next_instance,
        }
    }

    /// An empty sheet built from scratch.
    #[must_use]
    pub fn blank(call_sign: impl Into<String>, flight_rules: FlightRules, route: Route) -> Self {
        Self::from_generation(Generation::default(), call_sign, flight_rules, route)
    }

    pub(crate) fn mint_call_id(&mut self) -> CallId {
        let id = CallId(self.next_call);
        self.next_call += 1;
        id
    }

    pub(crate) fn mint_instance_key(&mut self) -> InstanceKey {
        let key = InstanceKey(self.next_instance);
        self.next_instance += 1;
        key
    }

    /// Find a call by id.
    #[must_use]
    pub fn call(&self, id: CallId) -> Option<&ResolvedCall> {
        self.calls.iter().find(|c| c.id == id)
    }

    /// Find a block instance by key.
    #[must_use]
    pub fn block(&self, key: InstanceKey) -> Option<&BlockInstance> {
        self.blocks.iter().find(|b| b.key == key)
    }

    /// Calls attached to the given instance, in display order.
    #[must_use]
    pub fn block_calls(&self, key: InstanceKey) -> Vec<&ResolvedCall> {
        self.calls.iter().filter(|c| c.block_key == key).collect()
    }

    /// Number of calls neither hidden themselves nor inside a hidden block.
    #[must_use]
    pub fn visible_count(&self) -> usize {
        self.calls
            .iter()
            .filter(|c| !self.hidden.contains(&c.id) && !self.hidden_blocks.contains(&c.block_key))
            .count()
    }

    /// Template bindings for an instance's calls: the instance's
    /// airport-derived bindings plus the sheet-level call sign.
    #[must_use]
    pub fn vars_for(&self, instance: &BlockInstance) -> TemplateVars {
        let mut vars = instance.vars.clone();
        let call_sign = self.call_sign.trim();
        if !call_sign.is_empty() {
            vars.insert("CS_Full".to_string(), call_sign.to_string());
            vars.insert("CS_Abbr".to_string(), abbreviate(call_sign));
        }
        vars
    }

    // === Visibility and collapse ===

    /// Toggle per-sheet visibility of one call.
    pub fn toggle_hidden(&mut self, id: CallId) {
        if !self.hidden.remove(&id) {
            self.hidden.insert(id);
        }
    }

    /// Unhide every call.
    pub fn unhide_all(&mut self) {
        self.hidden.clear();
    }

    /// Toggle per-sheet visibility of one block.
    pub fn toggle_hidden_block(&mut self, key: InstanceKey) {
        if !self.hidden_blocks.remove(&key) {
            self.hidden_blocks.insert(key);
        }
    }

    /// Toggle collapse state of one section.
    pub fn toggle_collapsed(&mut self, key: InstanceKey) {
        if !self.collapsed.remove(&key) {
            self.collapsed.insert(key);
        }
    }

    // === Inline edits ===

    /// Edit a call's text in place (sheet-local; survives until the next
    /// regeneration unless saved to master).
    ///
    /// Returns `false` if the id is unknown.
    pub fn set_call_text(&mut self, id: CallId, text: impl Into<String>) -> bool {
        let Some(call) = self.calls.iter_mut().find(|c| c.id == id) else {
            return false;
        };
        call.text = text.into();
        true
    }

    /// Edit a call's kind in place. Returns `false` if the id is unknown.
    pub fn set_call_kind(&mut self, id: CallId, kind: CallKind) -> bool {
        let Some(call) = self.calls.iter_mut().find(|c| c.id == id) else {
            return false;
        };
        call.kind = kind;
        true
    }

    /// Delete a call from the sheet. Returns `false` if the id is unknown.
    pub fn delete_call(&mut self, id: CallId) -> bool {
        let before = self.calls.len();
        self.calls.retain(|c| c.id != id);
        self.hidden.remove(&id);
        self.calls.len() != before
    }

    /// Rename a block instance (sheet-local).
    pub fn rename_block(&mut self, key: InstanceKey, name: impl Into<String>) -> bool {
        let Some(block) = self.blocks.iter_mut().find(|b| b.key == key) else {
            return false;
        };
        block.name = name.into();
        true
    }

    /// Repoint a block instance's target (sheet-local).
    pub fn set_block_target(&mut self, key: InstanceKey, target: impl Into<String>) -> bool {
        let Some(block) = self.blocks.iter_mut().find(|b| b.key == key) else {
            return false;
        };
        block.target = target.into();
        true
    }

    // === Adding content ===

    /// Add an empty block instance interactively.
    ///
    /// Standard block types pick up their canonical name and target (scoped
    /// to the departure airport's tower status); a custom section gets the
    /// given name and an empty target.
    pub fn add_block_instance(
        &mut self,
        block_type: Option<BlockType>,
        name: Option<&str>,
        target: Option<&str>,
    ) -> InstanceKey {
        let dep_towered = self
            .route
            .departure_airport()
            .is_some_and(|a| a.towered);
        let key = self.mint_instance_key();

        let (block_id, block_name, block_target) = match block_type {
            Some(block) => (
                block.as_str().to_string(),
                name.map_or_else(|| block.def().name.to_string(), ToString::to_string),
                target.map_or_else(
                    || block.target(dep_towered).unwrap_or_default().to_string(),
                    ToString::to_string,
                ),
            ),
            None => (
                format!("custom_{}", key.0),
                name.unwrap_or("Custom").to_string(),
                target.unwrap_or_default().to_string(),
            ),
        };

        self.blocks.push(BlockInstance {
            key,
            block: block_id,
            name: block_name,
            context_label: None,
            target: block_target,
            is_towered: dep_towered,
            airport: None,
            leg: None,
            phase: Phase::Manual,
            vars: TemplateVars::new(),
        });
        key
    }

    /// Materialize a saved user block onto the sheet, calls included.
    pub fn add_user_block(&mut self, block: &UserBlock) -> InstanceKey {
        let dep_towered = self
            .route
            .departure_airport()
            .is_some_and(|a| a.towered);
        let key = self.mint_instance_key();
        self.blocks.push(BlockInstance {
            key,
            block: block.id.clone(),
            name: block.name.clone(),
            context_label: None,
            target: block.target.clone(),
            is_towered: dep_towered,
            airport: None,
            leg: None,
            phase: Phase::Manual,
            vars: TemplateVars::new(),
        });

        for call in &block.calls {
            let id = self.mint_call_id();
            self.calls.push(ResolvedCall {
                id,
                base_id: Some(call.id.clone()),
                origin: Origin::BlockCall,
                source_block: Some(block.id.clone()),
                block: block.id.clone(),
                block_key: key,
                group: None,
                seq: call.seq,
                kind: call.kind,
                text: call.text.clone(),
                applies: ContextTag::ALL.to_vec(),
                has_override: false,
            });
        }
        key
    }

    /// Add a blank custom call to a block for immediate editing.
    ///
    /// The call is sheet-local until saved to master.
    pub fn add_custom_call(&mut self, block_key: InstanceKey) -> Option<CallId> {
        let block_id = self.block(block_key)?.block.clone();
        let id = self.mint_call_id();
        self.calls.push(ResolvedCall {
            id,
            base_id: None,
            origin: Origin::User,
            source_block: None,
            block: block_id,
            block_key,
            group: None,
            seq: APPENDED_CALL_SEQ,
            kind: CallKind::Radio,
            text: String::new(),
            applies: ContextTag::ALL.to_vec(),
            has_override: false,
        });
        Some(id)
    }

    /// Insert a taxi readback at the top of a block.
    pub fn add_taxi_call(&mut self, block_key: InstanceKey, text: impl Into<String>) -> Option<CallId> {
        let block_id = self.block(block_key)?.block.clone();
        let id = self.mint_call_id();
        let call = ResolvedCall {
            id,
            base_id: None,
            origin: Origin::User,
            source_block: None,
            block: block_id,
            block_key,
            group: None,
            seq: -1.0,
            kind: CallKind::Radio,
            text: text.into(),
            applies: ContextTag::ALL.to_vec(),
            has_override: false,
        };
        let insert_at = self
            .calls
            .iter()
            .position(|c| c.block_key == block_key)
            .unwrap_or(self.calls.len());
        self.calls.insert(insert_at, call);
        Some(id)
    }

    /// Copy a library call onto the sheet.
    ///
    /// Attaches to `block_key` when given, otherwise to the first instance
    /// whose block matches, creating one if the sheet has none.
    pub fn add_library_call(
        &mut self,
        call: &crate::engine::EffectiveCall,
        block_key: Option<InstanceKey>,
    ) -> CallId {
        let key = block_key
            .filter(|key| self.block(*key).is_some())
            .or_else(|| {
                self.blocks
                    .iter()
                    .find(|b| b.block == call.block)
                    .map(|b| b.key)
            })
            .unwrap_or_else(|| {
                let block_type = BlockType::from_id(&call.block);
                self.add_block_instance(block_type, block_type.is_none().then_some(call.block.as_str()), None)
            });

        let block_id = self
            .block(key)
            .map_or_else(|| call.block.clone(), |b| b.block.clone());
        let id = self.mint_call_id();
        self.calls.push(ResolvedCall {
            id,
            base_id: None,
            origin: Origin::User,
            source_block: None,
            block: block_id,
            block_key: key,
            group: call.group.clone(),
            seq: call.seq,
            kind: call.kind,
            text: call.text.clone(),
            applies: call.applies.clone(),
            has_override: false,
        });
        id
    }

    // === Persisting edits to the library ===

    /// Persist a call's current text/kind into the library so the edit
    /// survives regeneration.
    ///
    /// Master-backed calls get a call override; persisted user calls are
    /// updated in place; sheet-local calls become new user-call records;
    /// block calls are written back into their owning user block.
    ///
    /// Returns `false` if the id is unknown.
    pub fn save_to_master(
        &mut self,
        store: &Store,
        id: CallId,
        applies: Option<Vec<ContextTag>>,
    ) -> bool {
        let Some(index) = self.calls.iter().position(|c| c.id == id) else {
            return false;
        };
        let applies = applies
            .filter(|a| !a.is_empty())
            .unwrap_or_else(|| self.calls[index].applies.clone());

        let (origin, base_id, source_block) = {
            let call = &self.calls[index];
            (call.origin, call.base_id.clone(), call.source_block.clone())
        };
        match (origin, base_id) {
            (Origin::Master, Some(base)) => {
                let call = &mut self.calls[index];
                store.set_call_override(
                    &base,
                    &crate::call::CallOverride {
                        text: Some(call.text.clone()),
                        kind: Some(call.kind),
                        applies: Some(applies.clone()),
                        group: None,
                    },
                );
                call.applies = applies;
                call.has_override = true;
            }
            (Origin::User, Some(base)) => {
                let call = &mut self.calls[index];
                let (text, kind) = (call.text.clone(), call.kind);
                call.applies = applies.clone();
                store.update_user_call(&base, |uc| {
                    uc.text = text;
                    uc.kind = kind;
                    uc.applies = applies;
                });
            }
            (Origin::User, None) => {
                let record_id = format!("user-{}", Uuid::new_v4());
                let call = &mut self.calls[index];
                call.applies = applies.clone();
                call.base_id = Some(record_id.clone());
                store.add_user_call(UserCall {
                    id: record_id,
                    block: call.block.clone(),
                    group: call.group.clone(),
                    seq: call.seq,
                    kind: call.kind,
                    text: call.text.clone(),
                    applies,
                });
            }
            (Origin::BlockCall, Some(base)) => {
                let call = &self.calls[index];
                let (text, kind) = (call.text.clone(), call.kind);
                if let Some(owner) = source_block {
                    store.update_user_block(&owner, |block| {
                        if let Some(bc) = block.calls.iter_mut().find(|bc| bc.id == base) {
                            bc.text = text;
                            bc.kind = kind;
                        }
                    });
                }
            }
            _ => return false,
        }
        true
    }

    /// Drop a master call's override and restore the master text/kind.
    ///
    /// Returns `false` if the call has no override to reset.
    pub fn reset_to_default(
        &mut self,
        store: &Store,
        library: &crate::dataset::MasterLibrary,
        id: CallId,
    ) -> bool {
        let Some(call) = self.calls.iter_mut().find(|c| c.id == id) else {
            return false;
        };
        if call.origin != Origin::Master || !call.has_override {
            return false;
        }
        let Some(base) = call.base_id.clone() else {
            return false;
        };
        store.clear_call_customization(&base);
        if let Some(master) = library.get(&base) {
            call.text = master.text.clone();
            call.kind = master.kind;
            call.applies = master.applies.clone();
            call.group = master.group.clone();
        }
        call.has_override = false;
        true
    }

    /// Save a block instance and its calls to the library as a user block.
    ///
    /// Duplicate names are auto-incremented: "Enroute", "Enroute (2)", ...
    /// Returns the new user block's id, or `None` for an unknown key.
    pub fn save_block_to_library(&self, store: &Store, key: InstanceKey) -> Option<String> {
        let index = self.blocks.iter().position(|b| b.key == key)?;
        let instance = &self.blocks[index];

        let existing: BTreeSet<String> =
            store.user_blocks().into_iter().map(|b| b.name).collect();
        let mut name = instance.name.clone();
        if existing.contains(&name) {
            let mut n = 2;
            while existing.contains(&format!("{} ({n})", instance.name)) {
                n += 1;
            }
            name = format!("{} ({n})", instance.name);
        }

        let calls: Vec<UserBlockCall> = self
            .block_calls(key)
            .iter()
            .enumerate()
            .map(|(i, call)| UserBlockCall {
                id: format!("blkcall-{}", Uuid::new_v4()),
                kind: call.kind,
                text: call.text.clone(),
                seq: (i + 1) as f64,
            })
            .collect();

        let block_id = format!("ublk-{}", Uuid::new_v4());
        store.add_user_block(UserBlock {
            id: block_id.clone(),
            name,
            target: instance.target.clone(),
            seq: (index + 1) as f64,
            calls,
        });
        Some(block_id)
    }

    /// Remove a previously saved user block from the library by name.
    pub fn unsave_block_from_library(store: &Store, name: &str) {
        if let Some(block) = store.user_blocks().into_iter().find(|b| b.name == name) {
            store.delete_user_block(&block.id);
        }
    }

    /// Snapshot this sheet for saving.
    #[must_use]
    pub fn to_saved(&self, id: Option<String>, name: impl Into<String>) -> SavedSheet {
        SavedSheet {
            id: id.unwrap_or_else(|| format!("sheet-{}", Uuid::new_v4())),
            name: name.into(),
            saved_at: Utc::now(),
            call_sign: self.call_sign.clone(),
            flight_rules: self.flight_rules,
            route: self.route.clone(),
            calls: self.calls.clone(),
            blocks: self.blocks.clone(),
            hidden: self.hidden.clone(),
            hidden_blocks: self.hidden_blocks.clone(),
        }
    }

    /// Rebuild a sheet from a saved snapshot.
    #[must_use]
    pub fn from_saved(saved: SavedSheet) -> Self {
        let next_call = saved.calls.iter().map(|c| c.id.0).max().unwrap_or(0) + 1;
        let next_instance = saved.blocks.iter().map(|b| b.key.0).max().unwrap_or(0) + 1;
        Self {
            call_sign: saved.call_sign,
            flight_rules: saved.flight_rules,
            route: saved.route,
            calls: saved.calls,
            blocks: saved.blocks,
            hidden: saved.hidden,
            hidden_blocks: saved.hidden_blocks,
            collapsed: BTreeSet::new(),
            next_call,
            next_instance,
        }
    }
}

/// A sheet persisted to the store for later reloading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedSheet {
    /// Stable identity within the saved-sheet slice.
    pub id: String,
    /// Display name.
    pub name: String,
    /// When the sheet was saved.
    pub saved_at: DateTime<Utc>,
    /// The pilot's call sign.
    pub call_sign: String,
    /// Flight rules the sheet was generated under.
    pub flight_rules: FlightRules,
    /// The route the sheet was generated from.
    pub route: Route,
    /// Materialized calls.
    pub calls: Vec<ResolvedCall>,
    /// Materialized block instances.
    pub blocks: Vec<BlockInstance>,
    /// Per-sheet hidden calls.
    #[serde(default)]
    pub hidden: BTreeSet<CallId>,
    /// Per-sheet hidden blocks.
    #[serde(default)]
    pub hidden_blocks: BTreeSet<InstanceKey>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::call::MasterCall;
    use crate::dataset::{AirportDirectory, MasterLibrary};
    use crate::engine::Engine;

    fn library() -> MasterLibrary {
        let all = ContextTag::ALL.to_vec();
        MasterLibrary::from_calls(vec![
            MasterCall {
                id: "taxi_1".to_string(),
                block: "taxi_out".to_string(),
                group: Some("g1".to_string()),
                seq: 1.0,
                kind: CallKind::Radio,
                text: "{{CS_Full}}, taxi with information [A-Z]".to_string(),
                applies: all.clone(),
            },
            MasterCall {
                id: "taxi_2".to_string(),
                block: "taxi_out".to_string(),
                group: Some("g1".to_string()),
                seq: 2.0,
                kind: CallKind::Atc,
                text: "Taxi approved".to_string(),
                applies: all.clone(),
            },
            MasterCall {
                id: "taxi_3".to_string(),
                block: "taxi_out".to_string(),
                group: Some("g2".to_string()),
                seq: 3.0,
                kind: CallKind::Radio,
                text: "Holding short".to_string(),
                applies: all,
            },
        ])
    }

    fn test_sheet(store: &Store) -> Sheet {
        let lib = library();
        let directory = AirportDirectory::default();
        let route = Route::direct(
            directory.get("KADH").unwrap().clone(),
            directory.get("KOKC").unwrap().clone(),
        );
        let generation = Engine::new(&lib, store).generate(&route, FlightRules::Vfr);
        Sheet::from_generation(generation, "Skyhawk 12345", FlightRules::Vfr, route)
    }

    #[test]
    fn test_row_spacing() {
        let store = Store::open_in_memory().unwrap();
        let sheet = test_sheet(&store);
        let taxi = sheet.blocks.iter().find(|b| b.block == "taxi_out").unwrap();
        let calls = sheet.block_calls(taxi.key);
        assert_eq!(calls.len(), 3);

        assert_eq!(row_spacing(None, calls[0]), RowSpacing::SectionStart);
        // Same group g1: tight.
        assert_eq!(row_spacing(Some(calls[0]), calls[1]), RowSpacing::Tight);
        // g1 -> g2 boundary: gap.
        assert_eq!(row_spacing(Some(calls[1]), calls[2]), RowSpacing::GroupGap);
    }

    #[test]
    fn test_vars_for_binds_call_sign() {
        let store = Store::open_in_memory().unwrap();
        let sheet = test_sheet(&store);
        let taxi = sheet.blocks.iter().find(|b| b.block == "taxi_out").unwrap();

        let vars = sheet.vars_for(taxi);
        assert_eq!(vars["CS_Full"], "Skyhawk 12345");
        assert_eq!(vars["CS_Abbr"], "Skyhawk 345");
        assert_eq!(vars["Dep_Name"], "Ada");
    }

    #[test]
    fn test_toggle_hidden_and_visible_count() {
        let store = Store::open_in_memory().unwrap();
        let mut sheet = test_sheet(&store);
        let total = sheet.calls.len();
        let first = sheet.calls[0].id;

        sheet.toggle_hidden(first);
        assert_eq!(sheet.visible_count(), total - 1);
        // Hidden calls are still resolved, just flagged.
        assert_eq!(sheet.calls.len(), total);

        sheet.toggle_hidden(first);
        assert_eq!(sheet.visible_count(), total);
    }

    #[test]
    fn test_hidden_block_removes_from_visible_count() {
        let store = Store::open_in_memory().unwrap();
        let mut sheet = test_sheet(&store);
        let taxi_key = sheet
            .blocks
            .iter()
            .find(|b| b.block == "taxi_out")
            .unwrap()
            .key;

        sheet.toggle_hidden_block(taxi_key);
        assert_eq!(sheet.visible_count(), sheet.calls.len() - 3);
    }

    #[test]
    fn test_add_custom_call_is_sheet_local() {
        let store = Store::open_in_memory().unwrap();
        let mut sheet = test_sheet(&store);
        let taxi_key = sheet
            .blocks
            .iter()
            .find(|b| b.block == "taxi_out")
            .unwrap()
            .key;

        let id = sheet.add_custom_call(taxi_key).unwrap();
        let call = sheet.call(id).unwrap();
        assert_eq!(call.origin, Origin::User);
        assert!(call.base_id.is_none());
        assert!(store.user_calls().is_empty());
    }

    #[test]
    fn test_save_custom_call_to_master_creates_user_call() {
        let store = Store::open_in_memory().unwrap();
        let mut sheet = test_sheet(&store);
        let taxi_key = sheet
            .blocks
            .iter()
            .find(|b| b.block == "taxi_out")
            .unwrap()
            .key;

        let id = sheet.add_custom_call(taxi_key).unwrap();
        sheet.set_call_text(id, "Custom readback");
        assert!(sheet.save_to_master(&store, id, None));

        let records = store.user_calls();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].text, "Custom readback");
        assert_eq!(records[0].block, "taxi_out");
        // The sheet call now points at the persisted record.
        assert!(sheet.call(id).unwrap().base_id.is_some());
    }

    #[test]
    fn test_save_master_call_creates_override() {
        let store = Store::open_in_memory().unwrap();
        let mut sheet = test_sheet(&store);
        let id = sheet
            .calls
            .iter()
            .find(|c| c.base_id.as_deref() == Some("taxi_1"))
            .unwrap()
            .id;

        sheet.set_call_text(id, "Edited taxi call");
        assert!(sheet.save_to_master(&store, id, Some(vec![ContextTag::VfrNt])));

        let overrides = store.call_overrides();
        let patch = overrides.get("taxi_1").unwrap();
        assert_eq!(patch.text.as_deref(), Some("Edited taxi call"));
        assert_eq!(patch.applies, Some(vec![ContextTag::VfrNt]));
        assert!(sheet.call(id).unwrap().has_override);
    }

    #[test]
    fn test_reset_to_default() {
        let store = Store::open_in_memory().unwrap();
        let lib = library();
        let mut sheet = test_sheet(&store);
        let id = sheet
            .calls
            .iter()
            .find(|c| c.base_id.as_deref() == Some("taxi_1"))
            .unwrap()
            .id;

        sheet.set_call_text(id, "Edited");
        sheet.save_to_master(&store, id, None);
        assert!(!store.call_overrides().is_empty());

        assert!(sheet.reset_to_default(&store, &lib, id));
        assert!(store.call_overrides().is_empty());
        let call = sheet.call(id).unwrap();
        assert!(call.text.starts_with("{{CS_Full}}"));
        assert!(!call.has_override);
    }

    #[test]
    fn test_add_taxi_call_lands_at_top() {
        let store = Store::open_in_memory().unwrap();
        let mut sheet = test_sheet(&store);
        let taxi_key = sheet
            .blocks
            .iter()
            .find(|b| b.block == "taxi_out")
            .unwrap()
            .key;

        let id = sheet
            .add_taxi_call(taxi_key, "Alpha, Bravo, hold short runway 17, Skyhawk 345")
            .unwrap();
        let calls = sheet.block_calls(taxi_key);
        assert_eq!(calls[0].id, id);
        assert_eq!(calls[0].seq, -1.0);
    }

    #[test]
    fn test_add_block_instance_standard_and_custom() {
        let store = Store::open_in_memory().unwrap();
        let mut sheet = test_sheet(&store);

        let std_key = sheet.add_block_instance(Some(BlockType::Holding), None, None);
        let std_block = sheet.block(std_key).unwrap();
        assert_eq!(std_block.block, "holding");
        assert_eq!(std_block.name, "Holding");
        // KADH departure is non-towered.
        assert_eq!(std_block.target, "Center/Approach");
        assert_eq!(std_block.phase, Phase::Manual);

        let custom_key = sheet.add_block_instance(None, Some("Formation Work"), None);
        let custom = sheet.block(custom_key).unwrap();
        assert_eq!(custom.name, "Formation Work");
        assert!(custom.block.starts_with("custom_"));
        // Interactively added empty blocks are allowed.
        assert!(sheet.block_calls(custom_key).is_empty());
    }

    #[test]
    fn test_add_user_block_materializes_calls() {
        let store = Store::open_in_memory().unwrap();
        let mut sheet = test_sheet(&store);
        let block = UserBlock {
            id: "ub1".to_string(),
            name: "Practice Area".to_string(),
            target: "CTAF".to_string(),
            seq: 1.0,
            calls: vec![
                UserBlockCall {
                    id: "c1".to_string(),
                    kind: CallKind::Radio,
                    text: "Entering practice area".to_string(),
                    seq: 1.0,
                },
                UserBlockCall {
                    id: "c2".to_string(),
                    kind: CallKind::Radio,
                    text: "Leaving practice area".to_string(),
                    seq: 2.0,
                },
            ],
        };

        let key = sheet.add_user_block(&block);
        let calls = sheet.block_calls(key);
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].origin, Origin::BlockCall);
        assert_eq!(calls[0].source_block.as_deref(), Some("ub1"));
        assert_eq!(calls[0].base_id.as_deref(), Some("c1"));
    }

    #[test]
    fn test_save_block_to_library_with_name_increment() {
        let store = Store::open_in_memory().unwrap();
        let sheet = test_sheet(&store);
        let taxi_key = sheet
            .blocks
            .iter()
            .find(|b| b.block == "taxi_out")
            .unwrap()
            .key;

        sheet.save_block_to_library(&store, taxi_key).unwrap();
        sheet.save_block_to_library(&store, taxi_key).unwrap();
        sheet.save_block_to_library(&store, taxi_key).unwrap();

        let names: Vec<String> = store.user_blocks().into_iter().map(|b| b.name).collect();
        assert_eq!(names, vec!["Taxi Out", "Taxi Out (2)", "Taxi Out (3)"]);

        let blocks = store.user_blocks();
        assert_eq!(blocks[0].calls.len(), 3);
        assert_eq!(blocks[0].calls[0].seq, 1.0);
        assert_eq!(blocks[0].calls[2].seq, 3.0);
    }

    #[test]
    fn test_unsave_block_from_library() {
        let store = Store::open_in_memory().unwrap();
        let sheet = test_sheet(&store);
        let taxi_key = sheet
            .blocks
            .iter()
            .find(|b| b.block == "taxi_out")
            .unwrap()
            .key;
        sheet.save_block_to_library(&store, taxi_key).unwrap();

        Sheet::unsave_block_from_library(&store, "Taxi Out");
        assert!(store.user_blocks().is_empty());
    }

    #[test]
    fn test_add_library_call_creates_block_when_missing() {
        let store = Store::open_in_memory().unwrap();
        let mut sheet = test_sheet(&store);
        assert!(!sheet.blocks.iter().any(|b| b.block == "enroute"));

        let call = crate::engine::EffectiveCall {
            id: "enroute_x".to_string(),
            block: "enroute".to_string(),
            group: None,
            seq: 1.0,
            kind: CallKind::Radio,
            text: "Position report".to_string(),
            applies: ContextTag::ALL.to_vec(),
            origin: Origin::Master,
            has_override: false,
            hidden: false,
        };
        let id = sheet.add_library_call(&call, None);

        let enroute = sheet.blocks.iter().find(|b| b.block == "enroute").unwrap();
        assert_eq!(sheet.call(id).unwrap().block_key, enroute.key);
    }

    #[test]
    fn test_saved_sheet_roundtrip() {
        let store = Store::open_in_memory().unwrap();
        let mut sheet = test_sheet(&store);
        let first = sheet.calls[0].id;
        sheet.toggle_hidden(first);

        let saved = sheet.to_saved(None, "Friday practice");
        store.save_sheet(&saved);

        let loaded = store.saved_sheet(&saved.id).unwrap();
        let restored = Sheet::from_saved(loaded);
        assert_eq!(restored.calls, sheet.calls);
        assert_eq!(restored.hidden, sheet.hidden);
        assert_eq!(restored.call_sign, "Skyhawk 12345");
        // Collapse state is render-local and not persisted.
        assert!(restored.collapsed.is_empty());
    }

    #[test]
    fn test_sheet_undo_redo_round_trip() {
        let store = Store::open_in_memory().unwrap();
        let mut sheet = test_sheet(&store);
        let mut history = crate::history::History::default();

        let state0 = sheet.clone();

        // One user-visible action: snapshot, then mutate.
        history.push(sheet.clone());
        let first = sheet.calls[0].id;
        sheet.toggle_hidden(first);
        sheet.set_call_text(first, "edited");
        let state1 = sheet.clone();

        if let Some(previous) = history.undo(sheet.clone()) {
            sheet = previous;
        }
        assert_eq!(sheet, state0);

        if let Some(next) = history.redo(sheet.clone()) {
            sheet = next;
        }
        assert_eq!(sheet, state1);
    }

    #[test]
    fn test_delete_call() {
        let store = Store::open_in_memory().unwrap();
        let mut sheet = test_sheet(&store);
        let total = sheet.calls.len();
        let id = sheet.calls[0].id;

        assert!(sheet.delete_call(id));
        assert_eq!(sheet.calls.len(), total - 1);
        assert!(!sheet.delete_call(id));
    }
}
