//! Core entity structs for the Headway simulation.
//!
//! One `Game` owns everything else: the static network (`Line`, `Station`,
//! `Hop`), the moving parts (`Train`, `Agent`, `Hazard`, `Item`), and the
//! narrative `Message` feed. The turn engine loads all of them together as
//! a snapshot, mutates in place, and commits atomically.
//!
//! Locations are tagged variants rather than the store's dual-nullable
//! column pairs, so a both-set or both-null location cannot be represented
//! once decoding has happened. A row that decodes to no variant is the
//! out-of-bounds state (`location == None`), which the engine detects and
//! skips but never repairs.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::enums::{HazardKind, ItemKind, Weather};
use crate::ids::{AgentId, GameId, HazardId, HopId, ItemId, LineId, StationId, TrainId};

// ---------------------------------------------------------------------------
// Game
// ---------------------------------------------------------------------------

/// One simulation instance.
///
/// Created once at world import, mutated exactly once per committed turn,
/// never deleted by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Game {
    /// Unique game identifier.
    pub id: GameId,
    /// Display title.
    pub title: String,
    /// Monotonic count of committed turns.
    pub turn_number: u64,
    /// In-world clock; advances by `turn_seconds` per committed turn.
    pub current_time: DateTime<Utc>,
    /// Configured in-world seconds added to the clock each turn.
    pub turn_seconds: i64,
    /// Persisted PRNG seed; mutated by every draw, the sole entropy source.
    pub current_seed: u32,
    /// Current weather state.
    pub weather: Weather,
    /// Set when any agent stands on an `end` station at turn close.
    pub finished: bool,
}

// ---------------------------------------------------------------------------
// Station
// ---------------------------------------------------------------------------

/// A node in the hop graph. Read-only within the turn engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Station {
    /// Unique station identifier.
    pub id: StationId,
    /// Owning game.
    pub game_id: GameId,
    /// Display title.
    pub title: String,
    /// Agents respawn at `start` stations; combat never triggers here.
    pub is_start: bool,
    /// Reaching an `end` station finishes the game; combat never triggers here.
    pub is_end: bool,
    /// Virtual stations are pass-through junctions: trains depart without
    /// waiting and agents can neither board nor disembark.
    pub is_virtual: bool,
    /// Horizontal render position (external rendering only).
    pub x: f64,
    /// Vertical render position (external rendering only).
    pub y: f64,
}

// ---------------------------------------------------------------------------
// Line
// ---------------------------------------------------------------------------

/// A named service grouping hops and trains. Immutable during a turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Line {
    /// Unique line identifier.
    pub id: LineId,
    /// Owning game.
    pub game_id: GameId,
    /// Display title ("Crosstown").
    pub title: String,
    /// Display color (hex) used by the rendering client.
    pub color: String,
}

// ---------------------------------------------------------------------------
// Hop
// ---------------------------------------------------------------------------

/// A directed track segment `head -> tail` belonging to a line.
///
/// `active` and `switch_groups` belong to the optional hop-switch phase and
/// are carried read-only through the baseline turn cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hop {
    /// Unique hop identifier.
    pub id: HopId,
    /// Owning game.
    pub game_id: GameId,
    /// The line this segment belongs to.
    pub line_id: LineId,
    /// Station the hop leaves from.
    pub head_id: StationId,
    /// Station the hop arrives at.
    pub tail_id: StationId,
    /// Segment length; trains arrive once `distance >= length`.
    pub length: u32,
    /// Whether the segment is switched in (read-only here).
    pub active: bool,
    /// Switch-group tags (read-only here).
    pub switch_groups: BTreeSet<String>,
}

// ---------------------------------------------------------------------------
// Train
// ---------------------------------------------------------------------------

/// Where a train currently is: exactly one of stationed or mid-hop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrainLocation {
    /// Stopped at a station.
    AtStation(StationId),
    /// Traveling a hop at a non-negative distance from its head.
    OnHop {
        /// The hop being traveled.
        hop: HopId,
        /// Distance covered from the hop's head station.
        distance: u32,
    },
}

impl TrainLocation {
    /// Rebuild a location from the store's dual-nullable column pair.
    ///
    /// Returns `None` (out-of-bounds) when neither or both columns are set;
    /// the engine skips such trains rather than guessing.
    pub const fn from_columns(
        station_id: Option<StationId>,
        hop_id: Option<HopId>,
        distance: u32,
    ) -> Option<Self> {
        match (station_id, hop_id) {
            (Some(station), None) => Some(Self::AtStation(station)),
            (None, Some(hop)) => Some(Self::OnHop { hop, distance }),
            (Some(_), Some(_)) | (None, None) => None,
        }
    }

    /// Split a location into the store's dual-nullable column pair plus
    /// distance (0 when stationed).
    pub const fn to_columns(self) -> (Option<StationId>, Option<HopId>, u32) {
        match self {
            Self::AtStation(station) => (Some(station), None, 0),
            Self::OnHop { hop, distance } => (None, Some(hop), distance),
        }
    }

    /// The station the train is stopped at, if stationed.
    pub const fn station_id(self) -> Option<StationId> {
        match self {
            Self::AtStation(station) => Some(station),
            Self::OnHop { .. } => None,
        }
    }

    /// The hop and covered distance, if mid-hop.
    pub const fn hop_position(self) -> Option<(HopId, u32)> {
        match self {
            Self::AtStation(_) => None,
            Self::OnHop { hop, distance } => Some((hop, distance)),
        }
    }
}

/// A train running a line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Train {
    /// Unique train identifier.
    pub id: TrainId,
    /// Owning game.
    pub game_id: GameId,
    /// The line this train serves.
    pub line_id: LineId,
    /// Display title ("Crosstown local").
    pub title: String,
    /// Current location; `None` is the detected out-of-bounds state.
    pub location: Option<TrainLocation>,
    /// Distance advanced per turn while mid-hop.
    pub speed: u32,
    /// Turns waited at the current station since arrival.
    pub wait_time: u32,
    /// Turns a train waits at a non-virtual station before departing.
    pub max_wait_time: u32,
}

impl Train {
    /// The station this train is stopped at, if stationed.
    pub fn station_id(&self) -> Option<StationId> {
        self.location.and_then(TrainLocation::station_id)
    }

    /// The hop and covered distance, if mid-hop.
    pub fn hop_position(&self) -> Option<(HopId, u32)> {
        self.location.and_then(TrainLocation::hop_position)
    }

    /// Whether the location failed to decode (neither/both columns set).
    pub const fn is_out_of_bounds(&self) -> bool {
        self.location.is_none()
    }
}

// ---------------------------------------------------------------------------
// Agent
// ---------------------------------------------------------------------------

/// Where an agent currently is: exactly one of stationed or aboard a train.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AgentLocation {
    /// Standing at a station.
    AtStation(StationId),
    /// Riding a train.
    OnTrain(TrainId),
}

impl AgentLocation {
    /// Rebuild a location from the store's dual-nullable column pair.
    ///
    /// Returns `None` (out-of-bounds) when neither or both columns are set.
    pub const fn from_columns(
        station_id: Option<StationId>,
        train_id: Option<TrainId>,
    ) -> Option<Self> {
        match (station_id, train_id) {
            (Some(station), None) => Some(Self::AtStation(station)),
            (None, Some(train)) => Some(Self::OnTrain(train)),
            (Some(_), Some(_)) | (None, None) => None,
        }
    }

    /// Split a location into the store's dual-nullable column pair.
    pub const fn to_columns(self) -> (Option<StationId>, Option<TrainId>) {
        match self {
            Self::AtStation(station) => (Some(station), None),
            Self::OnTrain(train) => (None, Some(train)),
        }
    }

    /// The station the agent stands at, if stationed.
    pub const fn station_id(self) -> Option<StationId> {
        match self {
            Self::AtStation(station) => Some(station),
            Self::OnTrain(_) => None,
        }
    }

    /// The train the agent rides, if traveling.
    pub const fn train_id(self) -> Option<TrainId> {
        match self {
            Self::AtStation(_) => None,
            Self::OnTrain(train) => Some(train),
        }
    }
}

/// A wandering agent trying to reach an `end` station.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Agent {
    /// Unique agent identifier.
    pub id: AgentId,
    /// Owning game.
    pub game_id: GameId,
    /// Display name used in narrative messages.
    pub name: String,
    /// Opposed by the Flashback stunt's d20.
    pub strength: u32,
    /// Checked by the actor's own Ol' Slip d20.
    pub dexterity: u32,
    /// Opposed by the Withering Gaze stunt's d20.
    pub willpower: u32,
    /// Current hit points; driven to zero or below triggers respawn.
    pub current_hp: i32,
    /// Hit points restored on respawn.
    pub max_hp: i32,
    /// Acting order within the agent phase (descending).
    pub initiative: u32,
    /// Turns remaining before the agent may act (post-respawn recovery).
    pub timeout: u32,
    /// Turns remaining stunned by combat.
    pub stun_timeout: u32,
    /// When the agent entered the world.
    pub birthdate: DateTime<Utc>,
    /// Current location; `None` is the detected out-of-bounds state.
    pub location: Option<AgentLocation>,
}

impl Agent {
    /// The station this agent stands at, if stationed.
    pub fn station_id(&self) -> Option<StationId> {
        self.location.and_then(AgentLocation::station_id)
    }

    /// The train this agent rides, if traveling.
    pub fn train_id(&self) -> Option<TrainId> {
        self.location.and_then(AgentLocation::train_id)
    }

    /// Whether the location failed to decode (neither/both columns set).
    pub const fn is_out_of_bounds(&self) -> bool {
        self.location.is_none()
    }
}

// ---------------------------------------------------------------------------
// Hazard
// ---------------------------------------------------------------------------

/// An obstruction at a fixed distance along a hop.
///
/// Any train on the hop holds once its distance reaches the hazard's.
/// Spawned and cleaned up stochastically; ages by one every turn, uncapped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hazard {
    /// Unique hazard identifier.
    pub id: HazardId,
    /// Owning game.
    pub game_id: GameId,
    /// The hop this hazard blocks.
    pub hop_id: HopId,
    /// Fixed distance along the hop, in `[0, hop.length)`.
    pub distance: u32,
    /// Catalog kind; display attributes derive from it.
    pub kind: HazardKind,
    /// Turns since the hazard appeared.
    pub age: u32,
}

// ---------------------------------------------------------------------------
// Item
// ---------------------------------------------------------------------------

/// An item carried by an agent. Read-only within the turn engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    /// Unique item identifier.
    pub id: ItemId,
    /// Owning game.
    pub game_id: GameId,
    /// Carrying agent.
    pub agent_id: AgentId,
    /// Display title ("rusty pipe") used in combat messages.
    pub title: String,
    /// Item kind; melee uses the lowest-id `Weapon`.
    pub kind: ItemKind,
    /// Dice-notation damage string; set for weapons.
    pub damage: Option<String>,
}
