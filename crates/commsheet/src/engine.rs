//! The resolution engine.
//!
//! Expands a route and flight-rules selection into an ordered, grouped list
//! of resolved calls plus block-instance metadata, by combining the master
//! library with every override layer in the store. The engine is total: bad
//! input skips the offending leg or item, and the result is always a valid
//! (possibly empty) sheet.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::blocks::{BlockOverride, BlockType};
use crate::call::{CallKind, ContextTag, FlightRules, MasterCall, Origin, UserCall};
use crate::callsign::{leg_vars, TemplateVars};
use crate::dataset::{Airport, MasterLibrary};
use crate::route::{Intention, Route};
use crate::store::Store;

/// Opaque per-generation identity of a resolved call.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct CallId(pub u64);

/// Opaque per-generation identity of a block instance.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct InstanceKey(pub u64);

/// Which side of a leg a block instance belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Departure side of a leg.
    Departure,
    /// Cruise segment of a leg.
    Enroute,
    /// Arrival side of a leg.
    Arrival,
    /// Once-per-sheet emergency section.
    Emergency,
    /// Added interactively after generation.
    Manual,
}

/// One concrete occurrence of a block within a generated sheet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockInstance {
    /// Join key calls attach to via their `block_key`.
    pub key: InstanceKey,
    /// Block id (canonical block wire id, or a user block id).
    pub block: String,
    /// Display name, after block overrides.
    pub name: String,
    /// Label tying the instance to an airport, e.g. "at Ada".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context_label: Option<String>,
    /// Communication target label, after block overrides.
    pub target: String,
    /// Tower status of the relevant airport.
    pub is_towered: bool,
    /// The relevant airport's identifier, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub airport: Option<String>,
    /// Leg index this instance belongs to, if leg-scoped.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub leg: Option<usize>,
    /// Which side of the leg produced the instance.
    pub phase: Phase,
    /// Airport-derived template bindings for this instance's calls.
    #[serde(default)]
    pub vars: TemplateVars,
}

/// A call merged with its overrides and attached to a block instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedCall {
    /// Opaque per-generation identity.
    pub id: CallId,
    /// Pointer back to the authoritative record: a master call id, a user
    /// call id, or (for block calls) the call id within the owning block.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_id: Option<String>,
    /// Where the call came from.
    pub origin: Origin,
    /// The owning user block's id, for `Origin::BlockCall`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_block: Option<String>,
    /// Block id this call currently belongs to.
    pub block: String,
    /// The block instance this call is attached to.
    pub block_key: InstanceKey,
    /// Group tag; grouped calls render contiguously.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    /// Session ordering key within the instance.
    pub seq: f64,
    /// The kind of line.
    pub kind: CallKind,
    /// Template text.
    pub text: String,
    /// Flight contexts this call applies to.
    pub applies: Vec<ContextTag>,
    /// Whether a call override was applied during resolution.
    #[serde(default)]
    pub has_override: bool,
}

/// The output of one `generate` run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Generation {
    /// Resolved calls, in display order.
    pub calls: Vec<ResolvedCall>,
    /// Block instances, in display order.
    pub blocks: Vec<BlockInstance>,
}

/// A master or user call as seen through every override layer: the library
/// editor's read-only merge view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectiveCall {
    /// The authoritative record's id.
    pub id: String,
    /// Block id.
    pub block: String,
    /// Group tag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    /// Effective ordering key.
    pub seq: f64,
    /// Effective kind.
    pub kind: CallKind,
    /// Effective text.
    pub text: String,
    /// Effective applicability set.
    pub applies: Vec<ContextTag>,
    /// Where the call came from.
    pub origin: Origin,
    /// Whether any override is in effect.
    pub has_override: bool,
    /// Whether the call is permanently hidden.
    pub hidden: bool,
}

/// The resolution engine: a master library plus an override store.
#[derive(Debug)]
pub struct Engine<'a> {
    library: &'a MasterLibrary,
    store: &'a Store,
}

/// Display-order fallback offset for blocks without an ordering override.
const UNORDERED_BLOCK_OFFSET: f64 = 1000.0;

impl<'a> Engine<'a> {
    /// Create an engine over the given library and store.
    #[must_use]
    pub fn new(library: &'a MasterLibrary, store: &'a Store) -> Self {
        Self { library, store }
    }

    /// Expand a route into a generated sheet.
    ///
    /// Legs touching a stop with no airport are skipped entirely. Blocks
    /// with no matching calls, or no target for the relevant tower status,
    /// are never materialized.
    #[must_use]
    pub fn generate(&self, route: &Route, rules: FlightRules) -> Generation {
        let mut builder = Builder {
            library: self.library,
            block_overrides: self.store.block_overrides(),
            calls: Vec::new(),
            blocks: Vec::new(),
            next_instance: 1,
            next_call: 1,
        };

        for (leg_idx, from, to) in route.legs() {
            let (Some(from_apt), Some(to_apt)) = (from.airport.as_ref(), to.airport.as_ref())
            else {
                debug!("skipping leg {leg_idx}: missing airport");
                continue;
            };
            let from_tag = ContextTag::new(rules, from_apt.towered);
            let to_tag = ContextTag::new(rules, to_apt.towered);
            let vars = leg_vars("", Some(from_apt), Some(to_apt));

            let dep_blocks: &[BlockType] = if leg_idx == 0 {
                &BlockType::DEPARTURE_SEQUENCE
            } else {
                match from.intention {
                    Some(Intention::TouchAndGo | Intention::StopAndGo) => {
                        &BlockType::ROLLING_DEPARTURE
                    }
                    Some(Intention::FullStop | Intention::TaxiBack) => {
                        &BlockType::RESTART_DEPARTURE
                    }
                    None => &BlockType::DEPARTURE_SEQUENCE,
                }
            };
            for block in dep_blocks {
                builder.add_block(*block, Some(from_apt), from_tag, Some(leg_idx), Phase::Departure, &vars);
            }

            // Enroute blocks point at the destination but carry the
            // departure-side context tag.
            for block in &BlockType::ENROUTE_SEQUENCE {
                builder.add_block(*block, Some(to_apt), from_tag, Some(leg_idx), Phase::Enroute, &vars);
            }

            let is_final = leg_idx + 1 == route.leg_count();
            let arr_blocks: &[BlockType] = if to.intention.is_none() && is_final {
                &BlockType::ARRIVAL_SEQUENCE
            } else {
                &BlockType::INTERMEDIATE_ARRIVAL
            };
            for block in arr_blocks {
                builder.add_block(*block, Some(to_apt), to_tag, Some(leg_idx), Phase::Arrival, &vars);
            }
        }

        // Emergency blocks appear once per sheet, tagged to the very first
        // stop's context.
        let first_towered = route
            .stops
            .first()
            .and_then(|s| s.airport.as_ref())
            .is_some_and(|a| a.towered);
        let first_tag = ContextTag::new(rules, first_towered);
        let emergency_vars = leg_vars("", route.departure_airport(), route.arrival_airport());
        for block in &BlockType::EMERGENCY_SEQUENCE {
            builder.add_block(*block, None, first_tag, None, Phase::Emergency, &emergency_vars);
        }

        let Builder {
            mut calls,
            mut blocks,
            ..
        } = builder;

        // Layer 1: call overrides, then sequence overrides, master calls only.
        let call_overrides = self.store.call_overrides();
        let seq_overrides = self.store.seq_overrides();
        for call in &mut calls {
            if call.origin != Origin::Master {
                continue;
            }
            let Some(base) = call.base_id.clone() else {
                continue;
            };
            if let Some(patch) = call_overrides.get(&base) {
                apply_override(call, patch);
            }
            if let Some(seq) = seq_overrides.get(&base) {
                call.seq = *seq;
            }
        }

        // Layer 2: block overrides already shaped targets at selection time
        // for hidden; names and targets are patched here.
        let block_overrides = self.store.block_overrides();
        for inst in &mut blocks {
            if let Some(patch) = block_overrides.get(&inst.block) {
                if let Some(name) = &patch.name {
                    inst.name = name.clone();
                }
                if inst.is_towered {
                    if let Some(target) = &patch.target_towered {
                        inst.target = target.clone();
                    }
                } else if let Some(target) = &patch.target_non_towered {
                    inst.target = target.clone();
                }
            }
        }

        // Layer 3: user calls attach to the first instance of their block.
        let mut next_call = calls.len() as u64 + 1;
        for uc in self.store.user_calls() {
            if let Some(inst) = blocks.iter().find(|i| i.block == uc.block) {
                calls.push(resolved_from_user(&uc, CallId(next_call), inst.key));
                next_call += 1;
            }
        }

        // Layer 4: permanently hidden master calls never reach a fresh sheet.
        let hides = self.store.permanent_hides();
        calls.retain(|c| {
            !(c.origin == Origin::Master
                && c.base_id.as_deref().is_some_and(|base| hides.contains(base)))
        });

        // Display order: blocks by ordering override (falling back to
        // creation order), calls by instance then effective sequence; the
        // sort is stable so ties keep insertion order.
        let block_seq = self.store.block_seq_overrides();
        let order: BTreeMap<InstanceKey, f64> = blocks
            .iter()
            .enumerate()
            .map(|(i, inst)| {
                let value = block_seq
                    .get(&inst.block)
                    .copied()
                    .unwrap_or((i + 1) as f64 + UNORDERED_BLOCK_OFFSET);
                (inst.key, value)
            })
            .collect();
        blocks.sort_by(|a, b| order[&a.key].total_cmp(&order[&b.key]));

        let position: BTreeMap<InstanceKey, usize> = blocks
            .iter()
            .enumerate()
            .map(|(i, inst)| (inst.key, i))
            .collect();
        calls.sort_by(|a, b| {
            let pa = position.get(&a.block_key).copied().unwrap_or(usize::MAX);
            let pb = position.get(&b.block_key).copied().unwrap_or(usize::MAX);
            pa.cmp(&pb).then(a.seq.total_cmp(&b.seq))
        });

        Generation { calls, blocks }
    }

    /// The library editor's read-only merge view: every master call seen
    /// through its overrides, plus every user call, without route expansion.
    #[must_use]
    pub fn effective_calls(&self) -> Vec<EffectiveCall> {
        let overrides = self.store.call_overrides();
        let seq_overrides = self.store.seq_overrides();
        let hides = self.store.permanent_hides();

        let mut calls: Vec<EffectiveCall> = self
            .library
            .calls()
            .iter()
            .map(|master| {
                let patch = overrides.get(&master.id);
                let seq = seq_overrides.get(&master.id).copied().unwrap_or(master.seq);
                let has_override = patch.is_some() || seq_overrides.contains_key(&master.id);
                EffectiveCall {
                    id: master.id.clone(),
                    block: master.block.clone(),
                    group: patch
                        .and_then(|p| p.group.clone())
                        .or_else(|| master.group.clone()),
                    seq,
                    kind: patch.and_then(|p| p.kind).unwrap_or(master.kind),
                    text: patch
                        .and_then(|p| p.text.clone())
                        .unwrap_or_else(|| master.text.clone()),
                    applies: patch
                        .and_then(|p| p.applies.clone())
                        .unwrap_or_else(|| master.applies.clone()),
                    origin: Origin::Master,
                    has_override,
                    hidden: hides.contains(&master.id),
                }
            })
            .collect();

        for uc in self.store.user_calls() {
            calls.push(EffectiveCall {
                id: uc.id.clone(),
                block: uc.block.clone(),
                group: uc.group.clone(),
                seq: uc.seq,
                kind: uc.kind,
                text: uc.text.clone(),
                applies: uc.applies.clone(),
                origin: Origin::User,
                has_override: false,
                hidden: false,
            });
        }

        calls.sort_by(|a, b| {
            block_rank(&a.block)
                .cmp(&block_rank(&b.block))
                .then(a.seq.total_cmp(&b.seq))
        });
        calls
    }
}

fn block_rank(block: &str) -> usize {
    BlockType::from_id(block)
        .and_then(|b| BlockType::ALL.iter().position(|x| *x == b))
        .unwrap_or(BlockType::ALL.len())
}

/// Apply a call override patch to a resolved call. Total: every field the
/// patch sets is reflected, every omitted field keeps the master value.
fn apply_override(call: &mut ResolvedCall, patch: &crate::call::CallOverride) {
    if let Some(text) = &patch.text {
        call.text = text.clone();
    }
    if let Some(kind) = patch.kind {
        call.kind = kind;
    }
    if let Some(applies) = &patch.applies {
        call.applies = applies.clone();
    }
    if let Some(group) = &patch.group {
        call.group = Some(group.clone());
    }
    call.has_override = true;
}

fn resolved_from_user(uc: &UserCall, id: CallId, key: InstanceKey) -> ResolvedCall {
    ResolvedCall {
        id,
        base_id: Some(uc.id.clone()),
        origin: Origin::User,
        source_block: None,
        block: uc.block.clone(),
        block_key: key,
        group: uc.group.clone(),
        seq: uc.seq,
        kind: uc.kind,
        text: uc.text.clone(),
        applies: uc.applies.clone(),
        has_override: false,
    }
}

/// Accumulates instances and calls during one generation.
struct Builder<'a> {
    library: &'a MasterLibrary,
    block_overrides: BTreeMap<String, BlockOverride>,
    calls: Vec<ResolvedCall>,
    blocks: Vec<BlockInstance>,
    next_instance: u64,
    next_call: u64,
}

impl Builder<'_> {
    fn add_block(
        &mut self,
        block: BlockType,
        airport: Option<&Airport>,
        tag: ContextTag,
        leg: Option<usize>,
        phase: Phase,
        vars: &TemplateVars,
    ) {
        let block_id = block.as_str();

        if self
            .block_overrides
            .get(block_id)
            .and_then(|o| o.hidden)
            == Some(true)
        {
            return;
        }

        let mut matched: Vec<&MasterCall> = self
            .library
            .calls()
            .iter()
            .filter(|c| c.block == block_id && c.applies.contains(&tag))
            .collect();
        matched.sort_by(|a, b| a.seq.total_cmp(&b.seq));
        if matched.is_empty() {
            return;
        }

        let is_towered = airport.is_some_and(|a| a.towered);
        let target = if block == BlockType::Emergency {
            block
                .def()
                .target_towered
                .unwrap_or("121.5")
                .to_string()
        } else {
            match block.target(is_towered) {
                Some(target) => target.to_string(),
                None => return,
            }
        };

        let key = InstanceKey(self.next_instance);
        self.next_instance += 1;

        self.blocks.push(BlockInstance {
            key,
            block: block_id.to_string(),
            name: block.def().name.to_string(),
            context_label: airport.and_then(|a| block.context_label(a.short_name())),
            target,
            is_towered,
            airport: airport.map(|a| a.id.clone()),
            leg,
            phase,
            vars: vars.clone(),
        });

        for master in matched {
            self.calls.push(ResolvedCall {
                id: CallId(self.next_call),
                base_id: Some(master.id.clone()),
                origin: Origin::Master,
                source_block: None,
                block: block_id.to_string(),
                block_key: key,
                group: master.group.clone(),
                seq: master.seq,
                kind: master.kind,
                text: master.text.clone(),
                applies: master.applies.clone(),
                has_override: false,
            });
            self.next_call += 1;
        }
    }
}
