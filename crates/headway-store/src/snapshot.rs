//! Snapshot loading: one game plus all of its child rows, in id order.
//!
//! Rows decode through private `*Row` intermediates so the database types
//! (BIGINT counters, TEXT enums, dual-nullable location pairs) never leak
//! into the engine. A value that no longer maps onto the in-memory types is
//! a [`StoreError::Decode`] naming the column; a location pair that decodes
//! to neither variant becomes `location == None`, the out-of-bounds state
//! the engine logs and skips rather than repairs.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use headway_types::{
    Agent, AgentId, AgentLocation, Game, GameId, GameSnapshot, Hazard, HazardId, HazardKind,
    Hop, HopId, Item, ItemId, ItemKind, Line, LineId, Station, StationId, Train, TrainId,
    TrainLocation, Weather,
};
use sqlx::PgPool;

use crate::error::StoreError;

/// Operations that read committed game state.
pub struct SnapshotStore<'a> {
    pool: &'a PgPool,
}

impl<'a> SnapshotStore<'a> {
    /// Create a snapshot store bound to a connection pool.
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Load the full snapshot for one game.
    ///
    /// Child rows are fetched and kept in ascending id order, which the
    /// engine preserves on commit so identical runs stay byte-comparable.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::GameNotFound`] if no game row matches,
    /// [`StoreError::Decode`] if a stored value does not decode, and
    /// [`StoreError::Postgres`] for connection-level failures.
    pub async fn load_snapshot(&self, game_id: GameId) -> Result<GameSnapshot, StoreError> {
        let raw_id = game_id.into_inner();

        let game = sqlx::query_as::<_, GameRow>(
            r"SELECT id, title, turn_number, game_time, turn_seconds, current_seed,
                     weather, finished
              FROM games
              WHERE id = $1",
        )
        .bind(raw_id)
        .fetch_optional(self.pool)
        .await?
        .ok_or(StoreError::GameNotFound { game_id })?
        .into_game()?;

        let lines: Vec<Line> = sqlx::query_as::<_, LineRow>(
            r"SELECT id, game_id, title, color FROM lines WHERE game_id = $1 ORDER BY id",
        )
        .bind(raw_id)
        .fetch_all(self.pool)
        .await?
        .into_iter()
        .map(LineRow::into_line)
        .collect();

        let stations: Vec<Station> = sqlx::query_as::<_, StationRow>(
            r"SELECT id, game_id, title, is_start, is_end, is_virtual, x, y
              FROM stations
              WHERE game_id = $1
              ORDER BY id",
        )
        .bind(raw_id)
        .fetch_all(self.pool)
        .await?
        .into_iter()
        .map(StationRow::into_station)
        .collect();

        let hops = sqlx::query_as::<_, HopRow>(
            r"SELECT id, game_id, line_id, head_id, tail_id, length, active, switch_groups
              FROM hops
              WHERE game_id = $1
              ORDER BY id",
        )
        .bind(raw_id)
        .fetch_all(self.pool)
        .await?
        .into_iter()
        .map(HopRow::into_hop)
        .collect::<Result<Vec<_>, _>>()?;

        let trains = sqlx::query_as::<_, TrainRow>(
            r"SELECT id, game_id, line_id, title, station_id, hop_id, distance, speed,
                     wait_time, max_wait_time
              FROM trains
              WHERE game_id = $1
              ORDER BY id",
        )
        .bind(raw_id)
        .fetch_all(self.pool)
        .await?
        .into_iter()
        .map(TrainRow::into_train)
        .collect::<Result<Vec<_>, _>>()?;

        let agents = sqlx::query_as::<_, AgentRow>(
            r"SELECT id, game_id, name, strength, dexterity, willpower, current_hp, max_hp,
                     initiative, timeout, stun_timeout, birthdate, station_id, train_id
              FROM agents
              WHERE game_id = $1
              ORDER BY id",
        )
        .bind(raw_id)
        .fetch_all(self.pool)
        .await?
        .into_iter()
        .map(AgentRow::into_agent)
        .collect::<Result<Vec<_>, _>>()?;

        let hazards = sqlx::query_as::<_, HazardRow>(
            r"SELECT id, game_id, hop_id, distance, kind, age
              FROM hazards
              WHERE game_id = $1
              ORDER BY id",
        )
        .bind(raw_id)
        .fetch_all(self.pool)
        .await?
        .into_iter()
        .map(HazardRow::into_hazard)
        .collect::<Result<Vec<_>, _>>()?;

        let items = sqlx::query_as::<_, ItemRow>(
            r"SELECT id, game_id, agent_id, title, kind, damage
              FROM items
              WHERE game_id = $1
              ORDER BY id",
        )
        .bind(raw_id)
        .fetch_all(self.pool)
        .await?
        .into_iter()
        .map(ItemRow::into_item)
        .collect::<Result<Vec<_>, _>>()?;

        tracing::debug!(
            game = raw_id,
            stations = stations.len(),
            hops = hops.len(),
            trains = trains.len(),
            agents = agents.len(),
            hazards = hazards.len(),
            "Loaded snapshot"
        );

        Ok(GameSnapshot { game, lines, stations, hops, trains, agents, hazards, items })
    }

    /// Whether any game rows exist at all, finished or not.
    ///
    /// The demo-seed path uses this so a store whose only games have
    /// finished is not re-seeded.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Postgres`] if the query fails.
    pub async fn has_games(&self) -> Result<bool, StoreError> {
        let exists = sqlx::query_scalar::<_, bool>(r"SELECT EXISTS (SELECT 1 FROM games)")
            .fetch_one(self.pool)
            .await?;
        Ok(exists)
    }

    /// Ids of all games still running, in id order, for the scheduler pass.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Postgres`] if the query fails.
    pub async fn list_unfinished_games(&self) -> Result<Vec<GameId>, StoreError> {
        let ids = sqlx::query_scalar::<_, i64>(
            r"SELECT id FROM games WHERE NOT finished ORDER BY id",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(ids.into_iter().map(GameId::from_raw).collect())
    }
}

/// A row from the `games` table.
#[derive(Debug, sqlx::FromRow)]
struct GameRow {
    id: i64,
    title: String,
    turn_number: i64,
    game_time: DateTime<Utc>,
    turn_seconds: i64,
    current_seed: i64,
    weather: String,
    finished: bool,
}

impl GameRow {
    fn into_game(self) -> Result<Game, StoreError> {
        Ok(Game {
            id: GameId::from_raw(self.id),
            title: self.title,
            turn_number: decode_u64("games", "turn_number", self.turn_number)?,
            current_time: self.game_time,
            turn_seconds: self.turn_seconds,
            current_seed: decode_u32("games", "current_seed", self.current_seed)?,
            weather: Weather::parse(&self.weather).ok_or_else(|| StoreError::Decode {
                table: "games",
                column: "weather",
                value: self.weather.clone(),
            })?,
            finished: self.finished,
        })
    }
}

/// A row from the `lines` table.
#[derive(Debug, sqlx::FromRow)]
struct LineRow {
    id: i64,
    game_id: i64,
    title: String,
    color: String,
}

impl LineRow {
    fn into_line(self) -> Line {
        Line {
            id: LineId::from_raw(self.id),
            game_id: GameId::from_raw(self.game_id),
            title: self.title,
            color: self.color,
        }
    }
}

/// A row from the `stations` table.
#[derive(Debug, sqlx::FromRow)]
struct StationRow {
    id: i64,
    game_id: i64,
    title: String,
    is_start: bool,
    is_end: bool,
    is_virtual: bool,
    x: f64,
    y: f64,
}

impl StationRow {
    fn into_station(self) -> Station {
        Station {
            id: StationId::from_raw(self.id),
            game_id: GameId::from_raw(self.game_id),
            title: self.title,
            is_start: self.is_start,
            is_end: self.is_end,
            is_virtual: self.is_virtual,
            x: self.x,
            y: self.y,
        }
    }
}

/// A row from the `hops` table.
#[derive(Debug, sqlx::FromRow)]
struct HopRow {
    id: i64,
    game_id: i64,
    line_id: i64,
    head_id: i64,
    tail_id: i64,
    length: i64,
    active: bool,
    switch_groups: Vec<String>,
}

impl HopRow {
    fn into_hop(self) -> Result<Hop, StoreError> {
        Ok(Hop {
            id: HopId::from_raw(self.id),
            game_id: GameId::from_raw(self.game_id),
            line_id: LineId::from_raw(self.line_id),
            head_id: StationId::from_raw(self.head_id),
            tail_id: StationId::from_raw(self.tail_id),
            length: decode_u32("hops", "length", self.length)?,
            active: self.active,
            switch_groups: self.switch_groups.into_iter().collect::<BTreeSet<_>>(),
        })
    }
}

/// A row from the `trains` table.
#[derive(Debug, sqlx::FromRow)]
struct TrainRow {
    id: i64,
    game_id: i64,
    line_id: i64,
    title: String,
    station_id: Option<i64>,
    hop_id: Option<i64>,
    distance: i64,
    speed: i64,
    wait_time: i64,
    max_wait_time: i64,
}

impl TrainRow {
    fn into_train(self) -> Result<Train, StoreError> {
        let location = TrainLocation::from_columns(
            self.station_id.map(StationId::from_raw),
            self.hop_id.map(HopId::from_raw),
            decode_u32("trains", "distance", self.distance)?,
        );
        Ok(Train {
            id: TrainId::from_raw(self.id),
            game_id: GameId::from_raw(self.game_id),
            line_id: LineId::from_raw(self.line_id),
            title: self.title,
            location,
            speed: decode_u32("trains", "speed", self.speed)?,
            wait_time: decode_u32("trains", "wait_time", self.wait_time)?,
            max_wait_time: decode_u32("trains", "max_wait_time", self.max_wait_time)?,
        })
    }
}

/// A row from the `agents` table.
#[derive(Debug, sqlx::FromRow)]
struct AgentRow {
    id: i64,
    game_id: i64,
    name: String,
    strength: i64,
    dexterity: i64,
    willpower: i64,
    current_hp: i32,
    max_hp: i32,
    initiative: i64,
    timeout: i64,
    stun_timeout: i64,
    birthdate: DateTime<Utc>,
    station_id: Option<i64>,
    train_id: Option<i64>,
}

impl AgentRow {
    fn into_agent(self) -> Result<Agent, StoreError> {
        let location = AgentLocation::from_columns(
            self.station_id.map(StationId::from_raw),
            self.train_id.map(TrainId::from_raw),
        );
        Ok(Agent {
            id: AgentId::from_raw(self.id),
            game_id: GameId::from_raw(self.game_id),
            name: self.name,
            strength: decode_u32("agents", "strength", self.strength)?,
            dexterity: decode_u32("agents", "dexterity", self.dexterity)?,
            willpower: decode_u32("agents", "willpower", self.willpower)?,
            current_hp: self.current_hp,
            max_hp: self.max_hp,
            initiative: decode_u32("agents", "initiative", self.initiative)?,
            timeout: decode_u32("agents", "timeout", self.timeout)?,
            stun_timeout: decode_u32("agents", "stun_timeout", self.stun_timeout)?,
            birthdate: self.birthdate,
            location,
        })
    }
}

/// A row from the `hazards` table.
#[derive(Debug, sqlx::FromRow)]
struct HazardRow {
    id: i64,
    game_id: i64,
    hop_id: i64,
    distance: i64,
    kind: String,
    age: i64,
}

impl HazardRow {
    fn into_hazard(self) -> Result<Hazard, StoreError> {
        Ok(Hazard {
            id: HazardId::from_raw(self.id),
            game_id: GameId::from_raw(self.game_id),
            hop_id: HopId::from_raw(self.hop_id),
            distance: decode_u32("hazards", "distance", self.distance)?,
            kind: HazardKind::parse(&self.kind).ok_or_else(|| StoreError::Decode {
                table: "hazards",
                column: "kind",
                value: self.kind.clone(),
            })?,
            age: decode_u32("hazards", "age", self.age)?,
        })
    }
}

/// A row from the `items` table.
#[derive(Debug, sqlx::FromRow)]
struct ItemRow {
    id: i64,
    game_id: i64,
    agent_id: i64,
    title: String,
    kind: String,
    damage: Option<String>,
}

impl ItemRow {
    fn into_item(self) -> Result<Item, StoreError> {
        Ok(Item {
            id: ItemId::from_raw(self.id),
            game_id: GameId::from_raw(self.game_id),
            agent_id: AgentId::from_raw(self.agent_id),
            title: self.title,
            kind: ItemKind::parse(&self.kind).ok_or_else(|| StoreError::Decode {
                table: "items",
                column: "kind",
                value: self.kind.clone(),
            })?,
            damage: self.damage,
        })
    }
}

/// Decode a non-negative BIGINT column into `u32`.
fn decode_u32(table: &'static str, column: &'static str, value: i64) -> Result<u32, StoreError> {
    match u32::try_from(value) {
        Ok(decoded) => Ok(decoded),
        Err(_) => Err(StoreError::Decode { table, column, value: value.to_string() }),
    }
}

/// Decode a non-negative BIGINT column into `u64`.
fn decode_u64(table: &'static str, column: &'static str, value: i64) -> Result<u64, StoreError> {
    match u64::try_from(value) {
        Ok(decoded) => Ok(decoded),
        Err(_) => Err(StoreError::Decode { table, column, value: value.to_string() }),
    }
}
