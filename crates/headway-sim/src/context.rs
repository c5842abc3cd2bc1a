//! The mutable turn context shared by every phase.
//!
//! A [`TurnContext`] is built from one game's [`GameSnapshot`] at turn start
//! and decomposed back into a snapshot plus the turn's messages at turn end.
//! Phases receive it by mutable reference together with the turn's draw
//! source; nothing about a turn is ambient or global. Dropping the context
//! without committing is the rollback path -- the store never sees it.

use std::collections::BTreeMap;

use headway_network::NetworkMap;
use headway_types::{
    Agent, AgentId, Game, GameSnapshot, Hazard, HazardId, Hop, HopId, Item, ItemId, Line, LineId,
    Message, MessageKind, Station, StationId, Train, TrainId,
};

/// Placeholder title for entities whose reference cannot be resolved.
const UNKNOWN_TITLE: &str = "parts unknown";

/// The mutable simulation state threaded through one turn.
///
/// Moving entities live in id-ordered maps so every "iterate all X" a phase
/// performs is reproducible. The static network (stations, lines, hops) is
/// indexed once into a [`NetworkMap`] and handed back unchanged at turn end.
#[derive(Debug, Clone)]
pub struct TurnContext {
    /// The game record: clock, seed, weather, finished flag.
    pub game: Game,
    /// Read-only network graph rebuilt from the snapshot.
    pub network: NetworkMap,
    /// Trains by id.
    pub trains: BTreeMap<TrainId, Train>,
    /// Agents by id.
    pub agents: BTreeMap<AgentId, Agent>,
    /// Live hazards by id.
    pub hazards: BTreeMap<HazardId, Hazard>,
    /// Items by id; read-only, melee looks up weapons here.
    pub items: BTreeMap<ItemId, Item>,
    /// Narrative messages appended by this turn, in append order.
    pub messages: Vec<Message>,
    /// Original station rows, handed back unchanged at turn end.
    stations: Vec<Station>,
    /// Original line rows, handed back unchanged at turn end.
    lines: Vec<Line>,
    /// Original hop rows, handed back unchanged at turn end.
    hops: Vec<Hop>,
}

impl TurnContext {
    /// Build the context for one turn from a loaded snapshot.
    pub fn from_snapshot(snapshot: GameSnapshot) -> Self {
        let network = NetworkMap::from_parts(&snapshot.stations, &snapshot.lines, &snapshot.hops);
        Self {
            game: snapshot.game,
            network,
            trains: snapshot.trains.into_iter().map(|train| (train.id, train)).collect(),
            agents: snapshot.agents.into_iter().map(|agent| (agent.id, agent)).collect(),
            hazards: snapshot.hazards.into_iter().map(|hazard| (hazard.id, hazard)).collect(),
            items: snapshot.items.into_iter().map(|item| (item.id, item)).collect(),
            messages: Vec::new(),
            stations: snapshot.stations,
            lines: snapshot.lines,
            hops: snapshot.hops,
        }
    }

    /// Decompose the context back into a snapshot plus the turn's messages.
    ///
    /// Entity vectors come back in ascending id order, so two identical runs
    /// produce byte-identical snapshots.
    pub fn into_snapshot(self) -> (GameSnapshot, Vec<Message>) {
        let snapshot = GameSnapshot {
            game: self.game,
            lines: self.lines,
            stations: self.stations,
            hops: self.hops,
            trains: self.trains.into_values().collect(),
            agents: self.agents.into_values().collect(),
            hazards: self.hazards.into_values().collect(),
            items: self.items.into_values().collect(),
        };
        (snapshot, self.messages)
    }

    // -------------------------------------------------------------------
    // Message feed
    // -------------------------------------------------------------------

    /// Append one narrative message stamped with the current turn and clock.
    pub fn push_message(&mut self, kind: MessageKind, body: String) {
        self.messages.push(Message {
            game_id: self.game.id,
            turn_number: self.game.turn_number,
            game_time: self.game.current_time,
            kind,
            body,
        });
    }

    // -------------------------------------------------------------------
    // Display lookups
    // -------------------------------------------------------------------

    /// Display title of a station, or a placeholder when unresolvable.
    pub fn station_title(&self, id: StationId) -> String {
        self.network
            .station(id)
            .map_or_else(|| String::from(UNKNOWN_TITLE), |station| station.title.clone())
    }

    /// Display title of a train, or a placeholder when unresolvable.
    pub fn train_title(&self, id: TrainId) -> String {
        self.trains
            .get(&id)
            .map_or_else(|| String::from(UNKNOWN_TITLE), |train| train.title.clone())
    }

    /// Display name of an agent, or a placeholder when unresolvable.
    pub fn agent_name(&self, id: AgentId) -> String {
        self.agents
            .get(&id)
            .map_or_else(|| String::from(UNKNOWN_TITLE), |agent| agent.name.clone())
    }

    // -------------------------------------------------------------------
    // Occupancy queries
    // -------------------------------------------------------------------

    /// Ids of trains currently stopped at `station`, ascending.
    pub fn trains_at_station(&self, station: StationId) -> Vec<TrainId> {
        self.trains
            .values()
            .filter(|train| train.station_id() == Some(station))
            .map(|train| train.id)
            .collect()
    }

    /// Ids of agents standing at `station` other than `except`, ascending.
    pub fn other_agents_at_station(&self, station: StationId, except: AgentId) -> Vec<AgentId> {
        self.agents
            .values()
            .filter(|agent| agent.id != except && agent.station_id() == Some(station))
            .map(|agent| agent.id)
            .collect()
    }

    /// Whether a train of a line other than `line` is stopped at `station`.
    ///
    /// This is the arrival-blocking check: a platform occupied by a train of
    /// a different line refuses incoming traffic.
    pub fn station_held_by_other_line(
        &self,
        station: StationId,
        line: LineId,
        arriving: TrainId,
    ) -> bool {
        self.trains.values().any(|train| {
            train.id != arriving
                && train.line_id != line
                && train.station_id() == Some(station)
        })
    }

    /// Whether another train sits at distance 0 on `hop`, blocking entry.
    pub fn hop_blocked_at_entry(&self, hop: HopId, departing: TrainId) -> bool {
        self.trains.values().any(|train| {
            train.id != departing && train.hop_position() == Some((hop, 0))
        })
    }

    /// The lowest-id hazard on `hop` at or before `distance`, if any.
    ///
    /// A train holds once its position reaches a hazard's.
    pub fn blocking_hazard(&self, hop: HopId, distance: u32) -> Option<&Hazard> {
        self.hazards
            .values()
            .find(|hazard| hazard.hop_id == hop && hazard.distance <= distance)
    }

    // -------------------------------------------------------------------
    // Hazard id allocation
    // -------------------------------------------------------------------

    /// Next free hazard id for a mid-turn spawn.
    ///
    /// Allocated upward from the highest live id. One turn per game runs at
    /// a time, so this cannot collide with a concurrent writer.
    pub fn next_hazard_id(&self) -> HazardId {
        let highest = self
            .hazards
            .keys()
            .next_back()
            .map_or(0, |id| id.into_inner());
        HazardId::from_raw(highest.saturating_add(1))
    }
}
