//! Turn commit and game import, each inside a single transaction.
//!
//! [`commit_turn`] is the engine's only write path: the game row, every
//! train and agent, the full hazard set, and the turn's new messages land
//! together or not at all. A failed commit leaves the previously committed
//! snapshot authoritative and the turn is simply rerun from it. Stations,
//! lines, hops, and items are never written here; only [`insert_snapshot`]
//! (the seeding/import seam) creates them.

use headway_types::{
    AgentLocation, GameSnapshot, HopId, Message, StationId, TrainId, TrainLocation,
};
use sqlx::{PgPool, Postgres, Transaction};

use crate::error::StoreError;

/// Commit one completed turn.
///
/// Runs a single transaction: update the game row, update every train and
/// agent row, delete and reinsert the game's hazard rows (ids preserved;
/// mid-turn spawns arrive with engine-allocated ids), and append the new
/// messages (store-assigned serial ids).
///
/// # Errors
///
/// Returns [`StoreError::GameNotFound`] if the game row has vanished, and
/// [`StoreError::Postgres`] on any statement failure. Either way the
/// transaction rolls back and nothing is committed.
pub async fn commit_turn(
    pool: &PgPool,
    snapshot: &GameSnapshot,
    messages: &[Message],
) -> Result<(), StoreError> {
    let game_id = snapshot.game.id.into_inner();
    let mut tx = pool.begin().await?;

    let updated = sqlx::query(
        r"UPDATE games
          SET turn_number = $2, game_time = $3, current_seed = $4, weather = $5, finished = $6
          WHERE id = $1",
    )
    .bind(game_id)
    .bind(encode_u64(snapshot.game.turn_number))
    .bind(snapshot.game.current_time)
    .bind(i64::from(snapshot.game.current_seed))
    .bind(snapshot.game.weather.as_str())
    .bind(snapshot.game.finished)
    .execute(&mut *tx)
    .await?;
    if updated.rows_affected() == 0 {
        return Err(StoreError::GameNotFound { game_id: snapshot.game.id });
    }

    for train in &snapshot.trains {
        let (station, hop, distance) =
            train.location.map_or((None, None, 0), TrainLocation::to_columns);
        sqlx::query(
            r"UPDATE trains
              SET station_id = $2, hop_id = $3, distance = $4, wait_time = $5
              WHERE id = $1",
        )
        .bind(train.id.into_inner())
        .bind(station.map(StationId::into_inner))
        .bind(hop.map(HopId::into_inner))
        .bind(i64::from(distance))
        .bind(i64::from(train.wait_time))
        .execute(&mut *tx)
        .await?;
    }

    for agent in &snapshot.agents {
        let (station, train) = agent.location.map_or((None, None), AgentLocation::to_columns);
        sqlx::query(
            r"UPDATE agents
              SET current_hp = $2, timeout = $3, stun_timeout = $4, station_id = $5, train_id = $6
              WHERE id = $1",
        )
        .bind(agent.id.into_inner())
        .bind(agent.current_hp)
        .bind(i64::from(agent.timeout))
        .bind(i64::from(agent.stun_timeout))
        .bind(station.map(StationId::into_inner))
        .bind(train.map(TrainId::into_inner))
        .execute(&mut *tx)
        .await?;
    }

    sqlx::query(r"DELETE FROM hazards WHERE game_id = $1")
        .bind(game_id)
        .execute(&mut *tx)
        .await?;
    for hazard in &snapshot.hazards {
        sqlx::query(
            r"INSERT INTO hazards (id, game_id, hop_id, distance, kind, age)
              VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(hazard.id.into_inner())
        .bind(game_id)
        .bind(hazard.hop_id.into_inner())
        .bind(i64::from(hazard.distance))
        .bind(hazard.kind.as_str())
        .bind(i64::from(hazard.age))
        .execute(&mut *tx)
        .await?;
    }

    insert_messages(&mut tx, messages).await?;

    tx.commit().await?;

    tracing::debug!(
        game = game_id,
        turn = snapshot.game.turn_number,
        trains = snapshot.trains.len(),
        agents = snapshot.agents.len(),
        hazards = snapshot.hazards.len(),
        messages = messages.len(),
        "Committed turn"
    );
    Ok(())
}

/// Insert a full game with explicit ids, for seeding and import.
///
/// Runs a single transaction inserting the game row and every child row in
/// referential order. Fails (and rolls back) if the game id already exists.
///
/// # Errors
///
/// Returns [`StoreError::Postgres`] on any statement failure.
pub async fn insert_snapshot(pool: &PgPool, snapshot: &GameSnapshot) -> Result<(), StoreError> {
    let game_id = snapshot.game.id.into_inner();
    let mut tx = pool.begin().await?;

    sqlx::query(
        r"INSERT INTO games (id, title, turn_number, game_time, turn_seconds, current_seed,
                             weather, finished)
          VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
    )
    .bind(game_id)
    .bind(&snapshot.game.title)
    .bind(encode_u64(snapshot.game.turn_number))
    .bind(snapshot.game.current_time)
    .bind(snapshot.game.turn_seconds)
    .bind(i64::from(snapshot.game.current_seed))
    .bind(snapshot.game.weather.as_str())
    .bind(snapshot.game.finished)
    .execute(&mut *tx)
    .await?;

    for line in &snapshot.lines {
        sqlx::query(
            r"INSERT INTO lines (id, game_id, title, color) VALUES ($1, $2, $3, $4)",
        )
        .bind(line.id.into_inner())
        .bind(game_id)
        .bind(&line.title)
        .bind(&line.color)
        .execute(&mut *tx)
        .await?;
    }

    for station in &snapshot.stations {
        sqlx::query(
            r"INSERT INTO stations (id, game_id, title, is_start, is_end, is_virtual, x, y)
              VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(station.id.into_inner())
        .bind(game_id)
        .bind(&station.title)
        .bind(station.is_start)
        .bind(station.is_end)
        .bind(station.is_virtual)
        .bind(station.x)
        .bind(station.y)
        .execute(&mut *tx)
        .await?;
    }

    for hop in &snapshot.hops {
        let switch_groups: Vec<String> = hop.switch_groups.iter().cloned().collect();
        sqlx::query(
            r"INSERT INTO hops (id, game_id, line_id, head_id, tail_id, length, active,
                                switch_groups)
              VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(hop.id.into_inner())
        .bind(game_id)
        .bind(hop.line_id.into_inner())
        .bind(hop.head_id.into_inner())
        .bind(hop.tail_id.into_inner())
        .bind(i64::from(hop.length))
        .bind(hop.active)
        .bind(switch_groups)
        .execute(&mut *tx)
        .await?;
    }

    for train in &snapshot.trains {
        let (station, hop, distance) =
            train.location.map_or((None, None, 0), TrainLocation::to_columns);
        sqlx::query(
            r"INSERT INTO trains (id, game_id, line_id, title, station_id, hop_id, distance,
                                  speed, wait_time, max_wait_time)
              VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
        )
        .bind(train.id.into_inner())
        .bind(game_id)
        .bind(train.line_id.into_inner())
        .bind(&train.title)
        .bind(station.map(StationId::into_inner))
        .bind(hop.map(HopId::into_inner))
        .bind(i64::from(distance))
        .bind(i64::from(train.speed))
        .bind(i64::from(train.wait_time))
        .bind(i64::from(train.max_wait_time))
        .execute(&mut *tx)
        .await?;
    }

    for agent in &snapshot.agents {
        let (station, train) = agent.location.map_or((None, None), AgentLocation::to_columns);
        sqlx::query(
            r"INSERT INTO agents (id, game_id, name, strength, dexterity, willpower, current_hp,
                                  max_hp, initiative, timeout, stun_timeout, birthdate,
                                  station_id, train_id)
              VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)",
        )
        .bind(agent.id.into_inner())
        .bind(game_id)
        .bind(&agent.name)
        .bind(i64::from(agent.strength))
        .bind(i64::from(agent.dexterity))
        .bind(i64::from(agent.willpower))
        .bind(agent.current_hp)
        .bind(agent.max_hp)
        .bind(i64::from(agent.initiative))
        .bind(i64::from(agent.timeout))
        .bind(i64::from(agent.stun_timeout))
        .bind(agent.birthdate)
        .bind(station.map(StationId::into_inner))
        .bind(train.map(TrainId::into_inner))
        .execute(&mut *tx)
        .await?;
    }

    for hazard in &snapshot.hazards {
        sqlx::query(
            r"INSERT INTO hazards (id, game_id, hop_id, distance, kind, age)
              VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(hazard.id.into_inner())
        .bind(game_id)
        .bind(hazard.hop_id.into_inner())
        .bind(i64::from(hazard.distance))
        .bind(hazard.kind.as_str())
        .bind(i64::from(hazard.age))
        .execute(&mut *tx)
        .await?;
    }

    for item in &snapshot.items {
        sqlx::query(
            r"INSERT INTO items (id, game_id, agent_id, title, kind, damage)
              VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(item.id.into_inner())
        .bind(game_id)
        .bind(item.agent_id.into_inner())
        .bind(&item.title)
        .bind(item.kind.as_str())
        .bind(item.damage.as_deref())
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;

    tracing::info!(
        game = game_id,
        stations = snapshot.stations.len(),
        trains = snapshot.trains.len(),
        agents = snapshot.agents.len(),
        "Imported game snapshot"
    );
    Ok(())
}

/// Append the turn's messages with a single UNNEST-based batch insert.
async fn insert_messages(
    tx: &mut Transaction<'_, Postgres>,
    messages: &[Message],
) -> Result<(), StoreError> {
    if messages.is_empty() {
        return Ok(());
    }

    let len = messages.len();
    let mut game_ids = Vec::with_capacity(len);
    let mut turns = Vec::with_capacity(len);
    let mut times = Vec::with_capacity(len);
    let mut kinds = Vec::with_capacity(len);
    let mut bodies = Vec::with_capacity(len);
    for message in messages {
        game_ids.push(message.game_id.into_inner());
        turns.push(encode_u64(message.turn_number));
        times.push(message.game_time);
        kinds.push(message.kind.as_str().to_owned());
        bodies.push(message.body.clone());
    }

    sqlx::query(
        r"INSERT INTO messages (game_id, turn_number, game_time, kind, body)
          SELECT *
          FROM UNNEST($1::BIGINT[], $2::BIGINT[], $3::TIMESTAMPTZ[], $4::TEXT[], $5::TEXT[])",
    )
    .bind(&game_ids)
    .bind(&turns)
    .bind(&times)
    .bind(&kinds)
    .bind(&bodies)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

/// Encode a `u64` counter for a BIGINT column, saturating at `i64::MAX`.
fn encode_u64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_saturate_rather_than_wrap() {
        assert_eq!(encode_u64(12), 12);
        assert_eq!(encode_u64(u64::MAX), i64::MAX);
    }
}
