//! The turn orchestrator: phase ordering, clock advance, and finish check.
//!
//! [`run_turn`] consumes one game's snapshot and a draw source and either
//! returns the fully-mutated snapshot ready to commit, or an error and
//! nothing else -- the input is gone either way, so a failed turn leaves
//! the last committed snapshot authoritative and the turn is simply rerun
//! from it. No partial turn ever escapes this module.

use chrono::TimeDelta;
use headway_rng::DrawSource;
use headway_types::{GameSnapshot, Message, MessageKind, TurnSummary};
use tracing::info;

use crate::agent;
use crate::context::TurnContext;
use crate::error::TurnError;
use crate::hazard;
use crate::train;
use crate::weather;

/// Everything a completed turn hands back to the caller.
#[derive(Debug, Clone)]
pub struct TurnOutcome {
    /// The snapshot after this turn, ready to commit.
    pub snapshot: GameSnapshot,
    /// Narrative messages appended by this turn, in append order.
    pub messages: Vec<Message>,
    /// Aggregates for the scheduler's log line.
    pub summary: TurnSummary,
}

/// Run one full turn.
///
/// The turn counter and the in-world clock advance first, so every message
/// carries the turn it belongs to. Then the four phases run in fixed
/// order -- weather, hazards, trains, agents -- each drawing from `rng`
/// and syncing the drawn-up-to seed into the game record, so a snapshot
/// committed after any turn replays byte-identically from its own seed.
/// The turn closes by ageing every surviving hazard and checking whether
/// an agent has reached an end station.
///
/// # Errors
///
/// A finished game is refused with [`TurnError::GameFinished`]. Counter
/// and clock overflow, and malformed dice notation on an item, abort the
/// turn; per-entity oddities (dangling references, missing locations) are
/// logged and absorbed instead.
pub fn run_turn(
    snapshot: GameSnapshot,
    rng: &mut dyn DrawSource,
) -> Result<TurnOutcome, TurnError> {
    if snapshot.game.finished {
        return Err(TurnError::GameFinished { game_id: snapshot.game.id });
    }

    let mut ctx = TurnContext::from_snapshot(snapshot);
    advance_clock(&mut ctx)?;

    // --- Weather ---
    weather::run_weather_phase(&mut ctx, rng)?;
    ctx.game.current_seed = rng.seed();

    // --- Hazards ---
    hazard::run_hazard_phase(&mut ctx, rng);
    ctx.game.current_seed = rng.seed();

    // --- Trains ---
    train::run_train_phase(&mut ctx, rng);
    ctx.game.current_seed = rng.seed();

    // --- Agents (and combat) ---
    agent::run_agent_phase(&mut ctx, rng)?;
    ctx.game.current_seed = rng.seed();

    // --- Close out ---
    age_hazards(&mut ctx);
    check_finish(&mut ctx);

    let summary = TurnSummary {
        turn_number: ctx.game.turn_number,
        weather: ctx.game.weather,
        live_hazards: ctx.hazards.len(),
        messages: ctx.messages.len(),
        finished: ctx.game.finished,
    };
    info!(
        game = ctx.game.id.into_inner(),
        turn = summary.turn_number,
        weather = summary.weather.as_str(),
        hazards = summary.live_hazards,
        messages = summary.messages,
        finished = summary.finished,
        "turn complete"
    );

    let (snapshot, messages) = ctx.into_snapshot();
    Ok(TurnOutcome { snapshot, messages, summary })
}

/// Advance the turn counter and the in-world clock.
fn advance_clock(ctx: &mut TurnContext) -> Result<(), TurnError> {
    let game = &mut ctx.game;
    game.turn_number = game
        .turn_number
        .checked_add(1)
        .ok_or(TurnError::TurnOverflow { game_id: game.id })?;

    let step = TimeDelta::try_seconds(game.turn_seconds).ok_or(TurnError::ClockOverflow {
        game_id: game.id,
        turn_seconds: game.turn_seconds,
    })?;
    game.current_time = game.current_time.checked_add_signed(step).ok_or(
        TurnError::ClockOverflow { game_id: game.id, turn_seconds: game.turn_seconds },
    )?;
    Ok(())
}

/// Every live hazard grows one turn older. Uncapped.
fn age_hazards(ctx: &mut TurnContext) {
    for hazard in ctx.hazards.values_mut() {
        hazard.age = hazard.age.saturating_add(1);
    }
}

/// Finish the game once any agent stands at an end station.
///
/// The lowest-id finisher gets named in the game-over message.
fn check_finish(ctx: &mut TurnContext) {
    let finisher = ctx
        .agents
        .values()
        .find(|agent| {
            agent.station_id().is_some_and(|station| {
                ctx.network.station(station).is_some_and(|record| record.is_end)
            })
        })
        .map(|agent| (agent.name.clone(), agent.station_id()));
    let Some((name, station)) = finisher else {
        return;
    };

    ctx.game.finished = true;
    let station_title = station.map_or_else(
        || String::from("the end of the line"),
        |id| ctx.station_title(id),
    );
    info!(game = ctx.game.id.into_inner(), agent = %name, "game finished");
    ctx.push_message(
        MessageKind::System,
        format!("{name} has reached {station_title}. The run is over."),
    );
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::arithmetic_side_effects)]
mod tests {
    use std::collections::BTreeSet;

    use chrono::{TimeZone, Utc};
    use headway_rng::{GameRng, ScriptedRng};
    use headway_types::{
        Agent, AgentId, AgentLocation, Game, GameId, Hazard, HazardId, HazardKind, Hop, HopId,
        Line, LineId, Station, StationId, TrainId, Weather,
    };

    use super::*;
    use crate::hazard::MAX_LIVE_HAZARDS;
    use crate::starting_game::create_starting_game;

    /// Line 1 chain: Harborside (1, start) -> Fulton Market (2) ->
    /// Kingsbridge (3, end).
    fn make_snapshot(agents: Vec<Agent>, hazards: Vec<Hazard>) -> GameSnapshot {
        let game_id = GameId::from_raw(1);
        GameSnapshot {
            game: Game {
                id: game_id,
                title: String::from("Turn Test"),
                turn_number: 10,
                current_time: Utc.with_ymd_and_hms(2025, 6, 1, 8, 0, 0).single().unwrap(),
                turn_seconds: 300,
                current_seed: 0x5EED,
                weather: Weather::Cloudy,
                finished: false,
            },
            lines: vec![Line {
                id: LineId::from_raw(1),
                game_id,
                title: String::from("Crosstown"),
                color: String::from("#ff6319"),
            }],
            stations: vec![
                make_station(1, "Harborside", true, false),
                make_station(2, "Fulton Market", false, false),
                make_station(3, "Kingsbridge", false, true),
            ],
            hops: vec![make_hop(1, 1, 2), make_hop(2, 2, 3)],
            trains: Vec::new(),
            agents,
            hazards,
            items: Vec::new(),
        }
    }

    fn make_station(id: i64, title: &str, is_start: bool, is_end: bool) -> Station {
        Station {
            id: StationId::from_raw(id),
            game_id: GameId::from_raw(1),
            title: title.to_owned(),
            is_start,
            is_end,
            is_virtual: false,
            x: 0.0,
            y: 0.0,
        }
    }

    fn make_hop(id: i64, head: i64, tail: i64) -> Hop {
        Hop {
            id: HopId::from_raw(id),
            game_id: GameId::from_raw(1),
            line_id: LineId::from_raw(1),
            head_id: StationId::from_raw(head),
            tail_id: StationId::from_raw(tail),
            length: 6,
            active: true,
            switch_groups: BTreeSet::new(),
        }
    }

    fn make_agent(id: i64, name: &str, station: i64) -> Agent {
        Agent {
            id: AgentId::from_raw(id),
            game_id: GameId::from_raw(1),
            name: name.to_owned(),
            strength: 10,
            dexterity: 10,
            willpower: 10,
            current_hp: 12,
            max_hp: 12,
            initiative: 10,
            timeout: 0,
            stun_timeout: 0,
            birthdate: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).single().unwrap(),
            location: Some(AgentLocation::AtStation(StationId::from_raw(station))),
        }
    }

    /// Script for a turn where nothing stochastic happens: two weather
    /// misses and two hazard misses.
    fn quiet_script() -> Vec<f64> {
        vec![0.9, 0.9, 0.9, 0.9]
    }

    #[test]
    fn finished_games_refuse_to_run() {
        let mut snapshot = make_snapshot(Vec::new(), Vec::new());
        snapshot.game.finished = true;
        let mut rng = GameRng::new(1);
        let result = run_turn(snapshot, &mut rng);
        assert!(matches!(
            result,
            Err(TurnError::GameFinished { game_id }) if game_id == GameId::from_raw(1)
        ));
    }

    #[test]
    fn counter_and_clock_advance_before_the_phases() {
        let snapshot = make_snapshot(Vec::new(), Vec::new());
        let before = snapshot.game.current_time;
        let mut rng = ScriptedRng::new(quiet_script(), 1);
        let outcome = run_turn(snapshot, &mut rng).unwrap();

        assert_eq!(outcome.snapshot.game.turn_number, 11);
        assert_eq!(
            outcome.snapshot.game.current_time,
            before + TimeDelta::try_seconds(300).unwrap(),
        );
        assert_eq!(outcome.summary.turn_number, 11);
        assert!(!outcome.summary.finished);
        assert_eq!(outcome.summary.messages, 0);
    }

    #[test]
    fn turn_counter_overflow_is_an_error() {
        let mut snapshot = make_snapshot(Vec::new(), Vec::new());
        snapshot.game.turn_number = u64::MAX;
        let mut rng = GameRng::new(1);
        assert!(matches!(
            run_turn(snapshot, &mut rng),
            Err(TurnError::TurnOverflow { .. }),
        ));
    }

    #[test]
    fn unrepresentable_turn_length_is_an_error() {
        let mut snapshot = make_snapshot(Vec::new(), Vec::new());
        snapshot.game.turn_seconds = i64::MAX;
        let mut rng = GameRng::new(1);
        assert!(matches!(
            run_turn(snapshot, &mut rng),
            Err(TurnError::ClockOverflow { turn_seconds, .. }) if turn_seconds == i64::MAX,
        ));
    }

    #[test]
    fn every_live_hazard_ages_once_per_turn() {
        let hazard = Hazard {
            id: HazardId::from_raw(1),
            game_id: GameId::from_raw(1),
            hop_id: HopId::from_raw(1),
            distance: 2,
            kind: HazardKind::MysterySlime,
            age: 7,
        };
        let snapshot = make_snapshot(Vec::new(), vec![hazard]);
        let mut rng = ScriptedRng::new(quiet_script(), 1);
        let outcome = run_turn(snapshot, &mut rng).unwrap();

        assert_eq!(outcome.snapshot.hazards.first().map(|hazard| hazard.age), Some(8));
    }

    #[test]
    fn an_agent_at_an_end_station_finishes_the_game() {
        let snapshot = make_snapshot(vec![make_agent(1, "Ivy", 3)], Vec::new());
        let mut rng = ScriptedRng::new(quiet_script(), 1);
        let outcome = run_turn(snapshot, &mut rng).unwrap();

        assert!(outcome.snapshot.game.finished);
        assert!(outcome.summary.finished);
        let last = outcome.messages.last().unwrap();
        assert_eq!(last.kind, MessageKind::System);
        assert_eq!(last.body, "Ivy has reached Kingsbridge. The run is over.");
        assert_eq!(last.turn_number, 11, "the game-over message carries the new turn number");
    }

    #[test]
    fn the_drawn_up_to_seed_is_persisted() {
        let snapshot = make_snapshot(Vec::new(), Vec::new());
        let seed = snapshot.game.current_seed;
        let mut rng = GameRng::new(seed);
        let outcome = run_turn(snapshot, &mut rng).unwrap();

        // A quiet turn still draws twice for weather and twice for hazards.
        let mut check = GameRng::new(seed);
        for _ in 0..4 {
            check.draw();
        }
        assert_eq!(outcome.snapshot.game.current_seed, check.seed());
        assert_ne!(outcome.snapshot.game.current_seed, seed);
    }

    #[test]
    fn identical_snapshots_replay_identically() {
        let left = create_starting_game();
        let right = left.clone();

        let mut left_rng = GameRng::new(left.game.current_seed);
        let left_outcome = run_turn(left, &mut left_rng).unwrap();
        let mut right_rng = GameRng::new(right.game.current_seed);
        let right_outcome = run_turn(right, &mut right_rng).unwrap();

        let left_json = serde_json::to_string(&left_outcome.snapshot).unwrap();
        let right_json = serde_json::to_string(&right_outcome.snapshot).unwrap();
        assert_eq!(left_json, right_json);
        assert_eq!(left_outcome.messages, right_outcome.messages);
    }

    #[test]
    fn soak_many_turns_and_hold_the_invariants() {
        let mut snapshot = create_starting_game();
        for _ in 0..50 {
            if snapshot.game.finished {
                break;
            }
            let expected_turn = snapshot.game.turn_number + 1;
            let mut rng = GameRng::new(snapshot.game.current_seed);
            let outcome = run_turn(snapshot, &mut rng).unwrap();
            snapshot = outcome.snapshot;

            assert_eq!(snapshot.game.turn_number, expected_turn);
            assert!(
                snapshot.hazards.len() <= MAX_LIVE_HAZARDS,
                "hazard cap breached on turn {expected_turn}",
            );
            let train_ids: BTreeSet<TrainId> =
                snapshot.trains.iter().map(|train| train.id).collect();
            for agent in &snapshot.agents {
                if let Some(train_id) = agent.train_id() {
                    assert!(
                        train_ids.contains(&train_id),
                        "{} rides a train that does not exist",
                        agent.name,
                    );
                }
            }
        }
    }
}
