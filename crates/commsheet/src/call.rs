//! Core call vocabulary for commsheet.
//!
//! This module defines the fundamental record shapes the engine works with:
//! master calls from the bundled dataset, the sparse override patch layered
//! on top of them, user-authored calls, and the applicability vocabulary
//! that ties calls to a flight context.

use serde::{Deserialize, Serialize};

/// The kind of a phraseology line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallKind {
    /// A radio transmission spoken by the pilot.
    Radio,
    /// An expected ATC response.
    Atc,
    /// A free-text note.
    Note,
    /// A multi-line pre-flight brief.
    Brief,
}

impl CallKind {
    /// Parse a kind from its wire form.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "radio" => Some(Self::Radio),
            "atc" => Some(Self::Atc),
            "note" => Some(Self::Note),
            "brief" => Some(Self::Brief),
            _ => None,
        }
    }
}

impl std::fmt::Display for CallKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Radio => write!(f, "radio"),
            Self::Atc => write!(f, "atc"),
            Self::Note => write!(f, "note"),
            Self::Brief => write!(f, "brief"),
        }
    }
}

/// Flight rules for a generated sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlightRules {
    /// Visual flight rules.
    Vfr,
    /// Instrument flight rules.
    Ifr,
}

impl FlightRules {
    /// Parse flight rules from their wire form.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "vfr" => Some(Self::Vfr),
            "ifr" => Some(Self::Ifr),
            _ => None,
        }
    }
}

impl std::fmt::Display for FlightRules {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Vfr => write!(f, "vfr"),
            Self::Ifr => write!(f, "ifr"),
        }
    }
}

/// The flight-context applicability tag of a call.
///
/// Always of the exact form `{vfr|ifr}_{t|nt}`; applicability is exact set
/// membership, never a partial match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContextTag {
    /// VFR at a towered airport.
    VfrT,
    /// VFR at a non-towered airport.
    VfrNt,
    /// IFR at a towered airport.
    IfrT,
    /// IFR at a non-towered airport.
    IfrNt,
}

impl ContextTag {
    /// All tags, in display order.
    pub const ALL: [Self; 4] = [Self::VfrNt, Self::VfrT, Self::IfrNt, Self::IfrT];

    /// Build a tag from flight rules and an airport's towered status.
    #[must_use]
    pub fn new(rules: FlightRules, towered: bool) -> Self {
        match (rules, towered) {
            (FlightRules::Vfr, true) => Self::VfrT,
            (FlightRules::Vfr, false) => Self::VfrNt,
            (FlightRules::Ifr, true) => Self::IfrT,
            (FlightRules::Ifr, false) => Self::IfrNt,
        }
    }

    /// The tag's wire form, e.g. `vfr_nt`.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::VfrT => "vfr_t",
            Self::VfrNt => "vfr_nt",
            Self::IfrT => "ifr_t",
            Self::IfrNt => "ifr_nt",
        }
    }

    /// Parse a tag from its wire form.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "vfr_t" => Some(Self::VfrT),
            "vfr_nt" => Some(Self::VfrNt),
            "ifr_t" => Some(Self::IfrT),
            "ifr_nt" => Some(Self::IfrNt),
            _ => None,
        }
    }
}

impl std::fmt::Display for ContextTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A call from the bundled master dataset.
///
/// Master calls are loaded once at startup and treated as read-only for the
/// session; all customization is layered on top of them keyed by `id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MasterCall {
    /// Stable identity. Never changes; overrides key off it.
    pub id: String,
    /// The block (flight phase) this call belongs to.
    pub block: String,
    /// Optional group tag; calls sharing a group render tightly together.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    /// Ordering number within the block. May be fractional.
    pub seq: f64,
    /// The kind of line.
    pub kind: CallKind,
    /// Template text containing `{{Var}}` and `[placeholder]` tokens.
    pub text: String,
    /// Flight contexts this call applies to.
    pub applies: Vec<ContextTag>,
}

/// A sparse patch layered atop a master call, keyed by the call's id.
///
/// Sequence is deliberately absent: reordering lives in its own override
/// map so drag operations never collide with text edits.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CallOverride {
    /// Replacement text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Replacement kind.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<CallKind>,
    /// Replacement applicability set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub applies: Option<Vec<ContextTag>>,
    /// Replacement group tag.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
}

impl CallOverride {
    /// Check whether the patch carries no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.text.is_none() && self.kind.is_none() && self.applies.is_none() && self.group.is_none()
    }

    /// Merge another patch into this one; set fields in `other` win.
    pub fn merge(&mut self, other: &CallOverride) {
        if let Some(text) = &other.text {
            self.text = Some(text.clone());
        }
        if let Some(kind) = other.kind {
            self.kind = Some(kind);
        }
        if let Some(applies) = &other.applies {
            self.applies = Some(applies.clone());
        }
        if let Some(group) = &other.group {
            self.group = Some(group.clone());
        }
    }
}

/// A call fully owned by the user, with no master counterpart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserCall {
    /// Stable identity within the user-call slice.
    pub id: String,
    /// The block this call belongs to (a canonical block id or a user
    /// block id).
    pub block: String,
    /// Optional group tag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    /// Ordering number within the block.
    pub seq: f64,
    /// The kind of line.
    pub kind: CallKind,
    /// Template text.
    pub text: String,
    /// Flight contexts this call applies to.
    pub applies: Vec<ContextTag>,
}

/// A call scoped to a user-defined block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserBlockCall {
    /// Identity within the owning block.
    pub id: String,
    /// The kind of line.
    pub kind: CallKind,
    /// Template text.
    pub text: String,
    /// Ordering number within the block.
    pub seq: f64,
}

/// A user-defined block container saved to the library.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserBlock {
    /// Stable identity within the user-block slice.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Communication target label.
    pub target: String,
    /// Display ordering number.
    pub seq: f64,
    /// The block's own calls, in order.
    pub calls: Vec<UserBlockCall>,
}

/// Where a resolved call came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Origin {
    /// Backed by a master dataset call.
    Master,
    /// Backed by a user-authored call in the library.
    User,
    /// Backed by a call embedded in a user-defined block.
    BlockCall,
}
