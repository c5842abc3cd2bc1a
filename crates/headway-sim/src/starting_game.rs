//! The seeded demo game: seven stations on two crossing lines.
//!
//! [`create_starting_game`] builds the snapshot the engine imports when the
//! store holds no games at all. The Crosstown and Riverside lines share
//! Harborside and Kingsbridge and cross at the virtual Beacon Junction, so
//! riders face a real transfer decision and trains contest the shared
//! terminals. Every value here is fixed; two engines seeding the same empty
//! store produce byte-identical games.

use std::collections::BTreeSet;

use chrono::{DateTime, TimeDelta, Utc};
use headway_types::{
    Agent, AgentId, AgentLocation, Game, GameId, GameSnapshot, Hop, HopId, Item, ItemId,
    ItemKind, Line, LineId, Station, StationId, Train, TrainId, TrainLocation, Weather,
};

/// Seed the demo game draws its first turn from.
const DEMO_SEED: u32 = 0x5EED_CAFE;

/// In-world start of the demo clock; a fixed, arbitrary epoch.
const DEMO_EPOCH_SECONDS: i64 = 1_740_614_400;

/// In-world seconds per demo turn.
const DEMO_TURN_SECONDS: i64 = 300;

/// Helper to build a plain [`Station`]; flag overrides use struct update.
fn station(game_id: GameId, id: i64, title: &str, x: f64, y: f64) -> Station {
    Station {
        id: StationId::from_raw(id),
        game_id,
        title: title.to_string(),
        is_start: false,
        is_end: false,
        is_virtual: false,
        x,
        y,
    }
}

/// Helper to build a [`Line`].
fn line(game_id: GameId, id: i64, title: &str, color: &str) -> Line {
    Line {
        id: LineId::from_raw(id),
        game_id,
        title: title.to_string(),
        color: color.to_string(),
    }
}

/// Helper to build an active [`Hop`] with no switch groups.
fn hop(game_id: GameId, id: i64, line: i64, head: i64, tail: i64, length: u32) -> Hop {
    Hop {
        id: HopId::from_raw(id),
        game_id,
        line_id: LineId::from_raw(line),
        head_id: StationId::from_raw(head),
        tail_id: StationId::from_raw(tail),
        length,
        active: true,
        switch_groups: BTreeSet::new(),
    }
}

/// Helper to build a [`Train`] that has not yet waited anywhere.
fn train(
    game_id: GameId,
    id: i64,
    line: i64,
    title: &str,
    location: TrainLocation,
    speed: u32,
    max_wait_time: u32,
) -> Train {
    Train {
        id: TrainId::from_raw(id),
        game_id,
        line_id: LineId::from_raw(line),
        title: title.to_string(),
        location: Some(location),
        speed,
        wait_time: 0,
        max_wait_time,
    }
}

/// A moment `days` before the demo epoch, for staggered birthdates.
fn days_before(epoch: DateTime<Utc>, days: i64) -> DateTime<Utc> {
    TimeDelta::try_days(days)
        .and_then(|delta| epoch.checked_sub_signed(delta))
        .unwrap_or(epoch)
}

/// Build the complete demo snapshot: 7 stations, 2 lines, 8 hops, 3 trains,
/// 4 agents, and 2 items, at turn zero under a cloudy sky.
#[allow(clippy::too_many_lines)]
pub fn create_starting_game() -> GameSnapshot {
    let game_id = GameId::from_raw(1);
    let epoch = DateTime::from_timestamp(DEMO_EPOCH_SECONDS, 0).unwrap_or(DateTime::UNIX_EPOCH);

    let game = Game {
        id: game_id,
        title: String::from("The Crosstown Run"),
        turn_number: 0,
        current_time: epoch,
        turn_seconds: DEMO_TURN_SECONDS,
        current_seed: DEMO_SEED,
        weather: Weather::Cloudy,
        finished: false,
    };

    // ---------------------------------------------------------------
    // Network
    // ---------------------------------------------------------------

    let stations = vec![
        Station { is_start: true, ..station(game_id, 1, "Harborside", 0.0, 2.0) },
        station(game_id, 2, "Fulton Market", 2.0, 2.5),
        Station { is_virtual: true, ..station(game_id, 3, "Beacon Junction", 4.0, 2.0) },
        station(game_id, 4, "Mercer Street", 6.0, 2.5),
        station(game_id, 5, "Willow Grove", 1.5, 0.5),
        station(game_id, 6, "Cathedral Row", 5.5, 0.5),
        Station { is_end: true, ..station(game_id, 7, "Kingsbridge", 8.0, 1.5) },
    ];

    let lines = vec![
        line(game_id, 1, "Crosstown", "#ff6319"),
        line(game_id, 2, "Riverside", "#00933c"),
    ];

    // Crosstown runs the northern stations, Riverside dips south through
    // Willow Grove and Cathedral Row; the two cross at Beacon Junction.
    let hops = vec![
        hop(game_id, 1, 1, 1, 2, 12),
        hop(game_id, 2, 1, 2, 3, 8),
        hop(game_id, 3, 1, 3, 4, 10),
        hop(game_id, 4, 1, 4, 7, 14),
        hop(game_id, 5, 2, 1, 5, 9),
        hop(game_id, 6, 2, 5, 3, 11),
        hop(game_id, 7, 2, 3, 6, 7),
        hop(game_id, 8, 2, 6, 7, 13),
    ];

    // ---------------------------------------------------------------
    // Rolling stock
    // ---------------------------------------------------------------

    let trains = vec![
        train(
            game_id,
            1,
            1,
            "Crosstown Local",
            TrainLocation::AtStation(StationId::from_raw(1)),
            4,
            2,
        ),
        train(
            game_id,
            2,
            1,
            "Crosstown Express",
            TrainLocation::OnHop { hop: HopId::from_raw(2), distance: 3 },
            6,
            1,
        ),
        train(
            game_id,
            3,
            2,
            "Riverside Local",
            TrainLocation::AtStation(StationId::from_raw(5)),
            5,
            2,
        ),
    ];

    // ---------------------------------------------------------------
    // Agents and their belongings
    // ---------------------------------------------------------------

    let agents = vec![
        Agent {
            id: AgentId::from_raw(1),
            game_id,
            name: String::from("Ivy"),
            strength: 9,
            dexterity: 12,
            willpower: 8,
            current_hp: 14,
            max_hp: 14,
            initiative: 12,
            timeout: 0,
            stun_timeout: 0,
            birthdate: days_before(epoch, 11_000),
            location: Some(AgentLocation::AtStation(StationId::from_raw(1))),
        },
        Agent {
            id: AgentId::from_raw(2),
            game_id,
            name: String::from("Moss"),
            strength: 11,
            dexterity: 7,
            willpower: 10,
            current_hp: 16,
            max_hp: 16,
            initiative: 8,
            timeout: 0,
            stun_timeout: 0,
            birthdate: days_before(epoch, 13_200),
            location: Some(AgentLocation::AtStation(StationId::from_raw(1))),
        },
        Agent {
            id: AgentId::from_raw(3),
            game_id,
            name: String::from("Wren"),
            strength: 6,
            dexterity: 14,
            willpower: 12,
            current_hp: 12,
            max_hp: 12,
            initiative: 15,
            timeout: 0,
            stun_timeout: 0,
            birthdate: days_before(epoch, 9_500),
            location: Some(AgentLocation::AtStation(StationId::from_raw(4))),
        },
        Agent {
            id: AgentId::from_raw(4),
            game_id,
            name: String::from("Sable"),
            strength: 13,
            dexterity: 9,
            willpower: 6,
            current_hp: 15,
            max_hp: 15,
            initiative: 5,
            timeout: 0,
            stun_timeout: 0,
            birthdate: days_before(epoch, 8_400),
            location: Some(AgentLocation::OnTrain(TrainId::from_raw(3))),
        },
    ];

    let items = vec![
        Item {
            id: ItemId::from_raw(1),
            game_id,
            agent_id: AgentId::from_raw(1),
            title: String::from("Rusty Pipe"),
            kind: ItemKind::Weapon,
            damage: Some(String::from("1d6")),
        },
        Item {
            id: ItemId::from_raw(2),
            game_id,
            agent_id: AgentId::from_raw(2),
            title: String::from("Transit Token"),
            kind: ItemKind::Memento,
            damage: None,
        },
    ];

    GameSnapshot {
        game,
        lines,
        stations,
        hops,
        trains,
        agents,
        hazards: Vec::new(),
        items,
    }
}
