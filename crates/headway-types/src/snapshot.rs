//! Snapshot and output types exchanged with the persistence collaborator.
//!
//! A [`GameSnapshot`] is everything one turn needs: the game record plus
//! full lists of every owned entity. The engine mutates it in place and
//! hands it back together with the turn's new [`Message`]s for one atomic
//! commit.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entities::{Agent, Game, Hazard, Hop, Item, Line, Station, Train};
use crate::enums::{MessageKind, Weather};
use crate::ids::GameId;

// ---------------------------------------------------------------------------
// Message
// ---------------------------------------------------------------------------

/// An append-only narrative record.
///
/// Stamped with the turn it narrates and that turn's in-world time. Pure
/// output: the engine never reads messages back within the same turn. Ids
/// are assigned by the store at insert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Owning game.
    pub game_id: GameId,
    /// The turn this message narrates.
    pub turn_number: u64,
    /// In-world time of that turn.
    pub game_time: DateTime<Utc>,
    /// Feed category for the read API.
    pub kind: MessageKind,
    /// Narrative text.
    pub body: String,
}

// ---------------------------------------------------------------------------
// GameSnapshot
// ---------------------------------------------------------------------------

/// The full per-game entity snapshot loaded for one turn.
///
/// Entity vectors are kept in ascending id order; the engine preserves that
/// order when it writes the snapshot back so committed state is comparable
/// byte-for-byte across identical runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameSnapshot {
    /// The game record.
    pub game: Game,
    /// All lines of the game.
    pub lines: Vec<Line>,
    /// All stations of the game.
    pub stations: Vec<Station>,
    /// All hops of the game.
    pub hops: Vec<Hop>,
    /// All trains of the game.
    pub trains: Vec<Train>,
    /// All agents of the game.
    pub agents: Vec<Agent>,
    /// All live hazards of the game.
    pub hazards: Vec<Hazard>,
    /// All items of the game.
    pub items: Vec<Item>,
}

// ---------------------------------------------------------------------------
// TurnSummary
// ---------------------------------------------------------------------------

/// Compact result of one committed turn, for the scheduler's log line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnSummary {
    /// The turn number that was produced.
    pub turn_number: u64,
    /// Weather after the turn.
    pub weather: Weather,
    /// Live hazards after the turn.
    pub live_hazards: usize,
    /// Narrative messages appended by the turn.
    pub messages: usize,
    /// Whether the finish condition was met.
    pub finished: bool,
}
