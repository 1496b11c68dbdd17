//! Flight-phase block definitions.
//!
//! A block is a named phase of a flight (Taxi Out, Enroute, ...) that groups
//! related calls and carries a communication target for towered and
//! non-towered fields. The canonical phases and their sequencing are static;
//! names and targets can be repointed per-user via [`BlockOverride`].

use serde::{Deserialize, Serialize};

/// The canonical flight-phase blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockType {
    /// Engine start and ATIS/AWOS pickup.
    Startup,
    /// IFR clearance delivery.
    ClearanceDelivery,
    /// Taxi from the ramp to the runway.
    TaxiOut,
    /// Pre-takeoff run-up checks.
    Runup,
    /// Takeoff roll.
    Takeoff,
    /// Initial departure.
    Departure,
    /// Climb to cruise.
    Climbout,
    /// Cruise segment.
    Enroute,
    /// Holding instructions.
    Holding,
    /// Descent into the arrival area.
    Descent,
    /// Traffic pattern entry and legs.
    Pattern,
    /// Final approach.
    Approach,
    /// Landing roll-out.
    Landing,
    /// Taxi from the runway to parking.
    TaxiIn,
    /// Engine shutdown.
    Shutdown,
    /// Emergency phraseology.
    Emergency,
}

/// Static definition of a block: display name and frequency targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockDef {
    /// Display name.
    pub name: &'static str,
    /// Target frequency label at a towered field, if any.
    pub target_towered: Option<&'static str>,
    /// Target frequency label at a non-towered field, if any.
    pub target_non_towered: Option<&'static str>,
}

impl BlockType {
    /// All canonical blocks in display order.
    pub const ALL: [Self; 16] = [
        Self::Startup,
        Self::ClearanceDelivery,
        Self::TaxiOut,
        Self::Runup,
        Self::Takeoff,
        Self::Departure,
        Self::Climbout,
        Self::Enroute,
        Self::Holding,
        Self::Descent,
        Self::Pattern,
        Self::Approach,
        Self::Landing,
        Self::TaxiIn,
        Self::Shutdown,
        Self::Emergency,
    ];

    /// Blocks keyed to the departure airport's tower status, in phase order.
    pub const DEPARTURE_SEQUENCE: [Self; 7] = [
        Self::Startup,
        Self::ClearanceDelivery,
        Self::TaxiOut,
        Self::Runup,
        Self::Takeoff,
        Self::Departure,
        Self::Climbout,
    ];

    /// Blocks keyed to the arrival airport's tower status, in phase order.
    pub const ARRIVAL_SEQUENCE: [Self; 6] = [
        Self::Descent,
        Self::Pattern,
        Self::Approach,
        Self::Landing,
        Self::TaxiIn,
        Self::Shutdown,
    ];

    /// Cruise-segment blocks, once per leg.
    pub const ENROUTE_SEQUENCE: [Self; 2] = [Self::Enroute, Self::Holding];

    /// Blocks appended once per sheet rather than per leg.
    pub const EMERGENCY_SEQUENCE: [Self; 1] = [Self::Emergency];

    /// Departure subsequence after a touch-and-go or stop-and-go.
    pub const ROLLING_DEPARTURE: [Self; 2] = [Self::Departure, Self::Climbout];

    /// Departure subsequence after a full-stop or taxi-back.
    pub const RESTART_DEPARTURE: [Self; 4] =
        [Self::TaxiOut, Self::Takeoff, Self::Departure, Self::Climbout];

    /// Arrival subsequence for an intermediate stop.
    pub const INTERMEDIATE_ARRIVAL: [Self; 4] =
        [Self::Descent, Self::Pattern, Self::Approach, Self::Landing];

    /// The block's wire id, e.g. `taxi_out`.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Startup => "startup",
            Self::ClearanceDelivery => "clearance_delivery",
            Self::TaxiOut => "taxi_out",
            Self::Runup => "runup",
            Self::Takeoff => "takeoff",
            Self::Departure => "departure",
            Self::Climbout => "climbout",
            Self::Enroute => "enroute",
            Self::Holding => "holding",
            Self::Descent => "descent",
            Self::Pattern => "pattern",
            Self::Approach => "approach",
            Self::Landing => "landing",
            Self::TaxiIn => "taxi_in",
            Self::Shutdown => "shutdown",
            Self::Emergency => "emergency",
        }
    }

    /// Look up a canonical block by its wire id.
    #[must_use]
    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|b| b.as_str() == id)
    }

    /// Static definition of this block.
    #[must_use]
    pub fn def(&self) -> BlockDef {
        match self {
            Self::Startup => BlockDef {
                name: "Startup",
                target_towered: Some("ATIS"),
                target_non_towered: Some("CTAF/UNICOM"),
            },
            Self::ClearanceDelivery => BlockDef {
                name: "Clearance Delivery",
                target_towered: Some("Clearance Delivery"),
                target_non_towered: None,
            },
            Self::TaxiOut => BlockDef {
                name: "Taxi Out",
                target_towered: Some("Ground"),
                target_non_towered: Some("CTAF"),
            },
            Self::Runup => BlockDef {
                name: "Run-Up",
                target_towered: Some("Self"),
                target_non_towered: Some("Self"),
            },
            Self::Takeoff => BlockDef {
                name: "Takeoff",
                target_towered: Some("Tower"),
                target_non_towered: Some("CTAF"),
            },
            Self::Departure => BlockDef {
                name: "Departure",
                target_towered: Some("Tower/Departure"),
                target_non_towered: Some("CTAF"),
            },
            Self::Climbout => BlockDef {
                name: "Climbout",
                target_towered: Some("Tower/Departure"),
                target_non_towered: Some("CTAF"),
            },
            Self::Enroute => BlockDef {
                name: "Enroute",
                target_towered: Some("Center/Approach"),
                target_non_towered: Some("Center/Approach"),
            },
            Self::Holding => BlockDef {
                name: "Holding",
                target_towered: Some("Center/Approach"),
                target_non_towered: Some("Center/Approach"),
            },
            Self::Descent => BlockDef {
                name: "Descent/Arrival",
                target_towered: Some("Approach/ATIS"),
                target_non_towered: Some("CTAF"),
            },
            Self::Pattern => BlockDef {
                name: "Traffic Pattern",
                target_towered: Some("Tower"),
                target_non_towered: Some("CTAF"),
            },
            Self::Approach => BlockDef {
                name: "Approach",
                target_towered: Some("Approach"),
                target_non_towered: Some("CTAF"),
            },
            Self::Landing => BlockDef {
                name: "Landing",
                target_towered: Some("Tower"),
                target_non_towered: Some("CTAF"),
            },
            Self::TaxiIn => BlockDef {
                name: "Taxi In",
                target_towered: Some("Ground"),
                target_non_towered: Some("CTAF"),
            },
            Self::Shutdown => BlockDef {
                name: "Shutdown",
                target_towered: Some("Ground"),
                target_non_towered: Some("CTAF"),
            },
            Self::Emergency => BlockDef {
                name: "Emergency",
                target_towered: Some("121.5/Current"),
                target_non_towered: Some("121.5/Current"),
            },
        }
    }

    /// The target frequency label for the given tower status.
    #[must_use]
    pub fn target(&self, towered: bool) -> Option<&'static str> {
        let def = self.def();
        if towered {
            def.target_towered
        } else {
            def.target_non_towered
        }
    }

    /// Context label tying a block instance to an airport, e.g. "at Ada" for
    /// startup or "from Ada" for takeoff. Emergency blocks carry no label.
    #[must_use]
    pub fn context_label(&self, airport_name: &str) -> Option<String> {
        let preposition = match self {
            Self::Startup
            | Self::ClearanceDelivery
            | Self::TaxiOut
            | Self::Runup
            | Self::Pattern
            | Self::Landing
            | Self::TaxiIn
            | Self::Shutdown => "at",
            Self::Takeoff | Self::Departure | Self::Climbout => "from",
            Self::Enroute => "to",
            Self::Holding => "near",
            Self::Descent | Self::Approach => "into",
            Self::Emergency => return None,
        };
        Some(format!("{preposition} {airport_name}"))
    }
}

impl std::fmt::Display for BlockType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A sparse user patch on a block's definition, keyed by block id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlockOverride {
    /// Replacement display name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Replacement towered target.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_towered: Option<String>,
    /// Replacement non-towered target.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_non_towered: Option<String>,
    /// Suppress this block entirely at generation time.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hidden: Option<bool>,
}

impl BlockOverride {
    /// Check whether the patch carries no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.target_towered.is_none()
            && self.target_non_towered.is_none()
            && self.hidden.is_none()
    }

    /// Merge another patch into this one; set fields in `other` win.
    pub fn merge(&mut self, other: &BlockOverride) {
        if let Some(name) = &other.name {
            self.name = Some(name.clone());
        }
        if let Some(target) = &other.target_towered {
            self.target_towered = Some(target.clone());
        }
        if let Some(target) = &other.target_non_towered {
            self.target_non_towered = Some(target.clone());
        }
        if let Some(hidden) = other.hidden {
            self.hidden = Some(hidden);
        }
    }
}
