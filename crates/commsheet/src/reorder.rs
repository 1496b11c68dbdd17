//! Reordering and grouping.
//!
//! Drag gestures mutate the in-memory sheet and write the resulting order
//! back into the store's override slices so it survives a future
//! regeneration. Dropping onto the dragged item itself, or onto an id that
//! cannot be resolved, is a complete no-op.

use std::collections::BTreeMap;

use uuid::Uuid;

use crate::call::{CallOverride, Origin};
use crate::engine::{CallId, InstanceKey, ResolvedCall};
use crate::sheet::Sheet;
use crate::store::Store;

/// Where a dragged item lands relative to its drop target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Position {
    /// Insert before the target.
    Above,
    /// Insert after the target.
    Below,
}

/// Mint a group id that can never collide with a neighbor's.
///
/// Separated calls get a fresh id rather than no group, so a future
/// neighbor with a coincidentally equal group key is never silently joined.
fn mint_group_id() -> String {
    format!("grp-{}", Uuid::new_v4().simple())
}

/// Persist a call's group assignment so it survives regeneration.
///
/// Master calls carry the group in their call override; persisted user
/// calls carry it on the record. Sheet-local calls have nothing to write.
fn persist_group(store: &Store, call: &ResolvedCall) {
    let Some(group) = call.group.clone() else {
        return;
    };
    match (call.origin, call.base_id.as_deref()) {
        (Origin::Master, Some(base)) => {
            store.set_call_override(
                base,
                &CallOverride {
                    group: Some(group),
                    ..CallOverride::default()
                },
            );
        }
        (Origin::User, Some(base)) => {
            store.update_user_call(base, |uc| uc.group = Some(group));
        }
        _ => {}
    }
}

impl Sheet {
    /// Move a call next to a target call, optionally joining its group.
    ///
    /// Cross-block moves reassign the call's block and instance. Afterwards
    /// every call in each affected block is re-sequenced to its 1-based
    /// position and the new order is persisted.
    ///
    /// Returns `false` (leaving all state untouched) when the ids are equal
    /// or either cannot be resolved.
    pub fn reorder_call(
        &mut self,
        store: &Store,
        call_id: CallId,
        target_id: CallId,
        position: Position,
        group_with_target: bool,
    ) -> bool {
        if call_id == target_id {
            return false;
        }
        let Some(from_idx) = self.calls.iter().position(|c| c.id == call_id) else {
            return false;
        };
        let Some(mut target_idx) = self.calls.iter().position(|c| c.id == target_id) else {
            return false;
        };

        let source_key = self.calls[from_idx].block_key;
        let mut dragged = self.calls.remove(from_idx);
        if from_idx < target_idx {
            target_idx -= 1;
        }

        let (target_key, target_block, target_group) = {
            let target = &self.calls[target_idx];
            (target.block_key, target.block.clone(), target.group.clone())
        };
        dragged.block_key = target_key;
        dragged.block = target_block;

        if group_with_target {
            let group = match target_group {
                Some(group) => group,
                None => {
                    // The target has no explicit group yet: mint one and
                    // assign it to both ends of the join.
                    let group = mint_group_id();
                    self.calls[target_idx].group = Some(group.clone());
                    let target_snapshot = self.calls[target_idx].clone();
                    persist_group(store, &target_snapshot);
                    group
                }
            };
            dragged.group = Some(group);
        } else {
            dragged.group = Some(mint_group_id());
        }
        persist_group(store, &dragged);

        let insert_at = match position {
            Position::Above => target_idx,
            Position::Below => target_idx + 1,
        };
        self.calls.insert(insert_at, dragged);

        self.reindex_block(store, target_key);
        if source_key != target_key {
            self.reindex_block(store, source_key);
        }
        true
    }

    /// Move a call into a block without a positional target (dropping onto
    /// the block body). The call lands at the end of the block.
    ///
    /// Returns `false` when the call or block cannot be resolved, or the
    /// call is already there.
    pub fn move_call_to_block(
        &mut self,
        store: &Store,
        call_id: CallId,
        target_key: InstanceKey,
    ) -> bool {
        let Some(target_block) = self.block(target_key).map(|b| b.block.clone()) else {
            return false;
        };
        let Some(from_idx) = self.calls.iter().position(|c| c.id == call_id) else {
            return false;
        };
        let source_key = self.calls[from_idx].block_key;
        if source_key == target_key {
            return false;
        }

        let mut dragged = self.calls.remove(from_idx);
        dragged.block_key = target_key;
        dragged.block = target_block;
        let insert_at = self
            .calls
            .iter()
            .rposition(|c| c.block_key == target_key)
            .map_or(self.calls.len(), |i| i + 1);
        self.calls.insert(insert_at, dragged);

        self.reindex_block(store, target_key);
        self.reindex_block(store, source_key);
        true
    }

    /// Move a block instance relative to another and persist the resulting
    /// block order for every block id on the sheet.
    ///
    /// Returns `false` (leaving all state untouched) when the keys are
    /// equal or either cannot be resolved.
    pub fn reorder_block(
        &mut self,
        store: &Store,
        key: InstanceKey,
        target_key: InstanceKey,
        position: Position,
    ) -> bool {
        if key == target_key {
            return false;
        }
        let Some(from_idx) = self.blocks.iter().position(|b| b.key == key) else {
            return false;
        };
        let Some(mut target_idx) = self.blocks.iter().position(|b| b.key == target_key) else {
            return false;
        };

        let instance = self.blocks.remove(from_idx);
        if from_idx < target_idx {
            target_idx -= 1;
        }
        let insert_at = match position {
            Position::Above => target_idx,
            Position::Below => target_idx + 1,
        };
        self.blocks.insert(insert_at, instance);

        // One covering map over every block id in the new display order;
        // the first instance of a block id decides its position.
        let mut order: BTreeMap<String, f64> = BTreeMap::new();
        for block in &self.blocks {
            let next = order.len() as f64 + 1.0;
            order.entry(block.block.clone()).or_insert(next);
        }
        store.merge_block_seq_overrides(&order);
        true
    }

    /// Re-sequence every call in an instance to its 1-based position and
    /// persist the order for each call's backing record.
    fn reindex_block(&mut self, store: &Store, key: InstanceKey) {
        let mut master_seqs: BTreeMap<String, f64> = BTreeMap::new();
        let mut block_orders: BTreeMap<String, Vec<(String, f64)>> = BTreeMap::new();

        let mut position = 0usize;
        for call in self.calls.iter_mut().filter(|c| c.block_key == key) {
            position += 1;
            let seq = position as f64;
            call.seq = seq;
            match (call.origin, call.base_id.clone()) {
                (Origin::Master, Some(base)) => {
                    master_seqs.insert(base, seq);
                }
                (Origin::User, Some(base)) => {
                    store.update_user_call(&base, |uc| uc.seq = seq);
                }
                (Origin::BlockCall, Some(base)) => {
                    if let Some(owner) = call.source_block.clone() {
                        block_orders.entry(owner).or_default().push((base, seq));
                    }
                }
                _ => {}
            }
        }
        store.merge_seq_overrides(&master_seqs);

        for (owner, order) in block_orders {
            let Some(stored) = store.user_blocks().into_iter().find(|b| b.id == owner) else {
                continue;
            };
            let mut new_calls = Vec::new();
            for (base, seq) in &order {
                if let Some(mut call) = stored.calls.iter().find(|c| &c.id == base).cloned() {
                    call.seq = *seq;
                    new_calls.push(call);
                }
            }
            // Stored calls not present on this sheet keep their place at
            // the tail.
            for call in &stored.calls {
                if !order.iter().any(|(base, _)| base == &call.id) {
                    new_calls.push(call.clone());
                }
            }
            store.set_user_block_calls(&owner, new_calls);
        }
    }
}
