//! Weather phase: lightning strikes and sky transitions.
//!
//! Runs first in every turn. While the sky is rainy, lightning may strike
//! one agent for `1d6`; afterwards the sky may shift one step along the
//! rainy / cloudy / partly-cloudy chain. Draw order is fixed: the lightning
//! chance, then the target pick, then the damage dice, then any respawn
//! draws, then the transition chance checks.

use headway_rng::dice;
use headway_rng::DrawSource;
use headway_types::{AgentId, MessageKind, Weather};
use tracing::debug;

use crate::combat;
use crate::context::TurnContext;
use crate::error::TurnError;

/// Chance per rainy turn that lightning strikes an agent.
const LIGHTNING_CHANCE: f64 = 0.05;

/// Damage dealt by a lightning strike.
const LIGHTNING_DICE: &str = "1d6";

/// Chance per turn of each available sky transition.
const TRANSITION_CHANCE: f64 = 0.05;

/// Run the weather phase for one turn.
pub fn run_weather_phase(
    ctx: &mut TurnContext,
    rng: &mut dyn DrawSource,
) -> Result<(), TurnError> {
    if ctx.game.weather == Weather::Rainy && rng.chance(LIGHTNING_CHANCE) {
        strike_lightning(ctx, rng)?;
    }
    transition_sky(ctx, rng);
    Ok(())
}

/// Lightning picks one agent who is not waiting out a respawn and deals
/// dice damage; a downed target respawns immediately.
fn strike_lightning(ctx: &mut TurnContext, rng: &mut dyn DrawSource) -> Result<(), TurnError> {
    let eligible: Vec<AgentId> = ctx
        .agents
        .values()
        .filter(|agent| agent.timeout == 0)
        .map(|agent| agent.id)
        .collect();
    let Some(index) = rng.pick_index(eligible.len()) else {
        debug!(game = ctx.game.id.into_inner(), "lightning found nobody to strike");
        return Ok(());
    };
    let Some(target_id) = eligible.get(index).copied() else {
        return Ok(());
    };

    let roll = dice::roll(LIGHTNING_DICE, rng)?;
    let Some(target) = ctx.agents.get_mut(&target_id) else {
        return Ok(());
    };
    target.current_hp = target.current_hp.saturating_sub_unsigned(roll.total);
    let name = target.name.clone();
    let downed = target.current_hp <= 0;
    debug!(
        game = ctx.game.id.into_inner(),
        agent = target_id.into_inner(),
        damage = roll.total,
        "lightning strike"
    );
    ctx.push_message(
        MessageKind::Weather,
        format!("Lightning strikes {name} for {total}.", total = roll.total),
    );
    if downed {
        combat::respawn(ctx, target_id, rng);
    }
    Ok(())
}

/// Shift the sky at most one step.
///
/// Cloudy checks rain first; a hit short-circuits the partly-cloudy check,
/// so the two outcomes never compete for the same draw.
fn transition_sky(ctx: &mut TurnContext, rng: &mut dyn DrawSource) {
    let current = ctx.game.weather;
    let next = match current {
        Weather::Rainy => rng.chance(TRANSITION_CHANCE).then_some(Weather::Cloudy),
        Weather::Cloudy => {
            if rng.chance(TRANSITION_CHANCE) {
                Some(Weather::Rainy)
            } else if rng.chance(TRANSITION_CHANCE) {
                Some(Weather::PartlyCloudy)
            } else {
                None
            }
        }
        Weather::PartlyCloudy => rng.chance(TRANSITION_CHANCE).then_some(Weather::Cloudy),
    };
    let Some(next) = next else {
        return;
    };
    ctx.game.weather = next;
    debug!(
        game = ctx.game.id.into_inner(),
        from = current.as_str(),
        to = next.as_str(),
        "weather shifts"
    );
    ctx.push_message(
        MessageKind::Weather,
        format!("The weather shifts from {} to {}.", current.as_str(), next.as_str()),
    );
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::BTreeSet;

    use chrono::{TimeZone, Utc};
    use headway_rng::ScriptedRng;
    use headway_types::{
        Agent, AgentLocation, Game, GameId, GameSnapshot, Hop, HopId, Line, LineId, Station,
        StationId,
    };

    use super::*;

    fn make_ctx(weather: Weather) -> TurnContext {
        let game_id = GameId::from_raw(1);
        let snapshot = GameSnapshot {
            game: Game {
                id: game_id,
                title: String::from("Weather Test"),
                turn_number: 1,
                current_time: Utc.with_ymd_and_hms(2025, 6, 1, 8, 0, 0).single().unwrap(),
                turn_seconds: 300,
                current_seed: 7,
                weather,
                finished: false,
            },
            lines: vec![Line {
                id: LineId::from_raw(1),
                game_id,
                title: String::from("Crosstown"),
                color: String::from("#ff6319"),
            }],
            stations: vec![
                Station {
                    id: StationId::from_raw(1),
                    game_id,
                    title: String::from("Harborside"),
                    is_start: true,
                    is_end: false,
                    is_virtual: false,
                    x: 0.0,
                    y: 0.0,
                },
                Station {
                    id: StationId::from_raw(2),
                    game_id,
                    title: String::from("Kingsbridge"),
                    is_start: false,
                    is_end: true,
                    is_virtual: false,
                    x: 1.0,
                    y: 0.0,
                },
            ],
            hops: vec![Hop {
                id: HopId::from_raw(1),
                game_id,
                line_id: LineId::from_raw(1),
                head_id: StationId::from_raw(1),
                tail_id: StationId::from_raw(2),
                length: 10,
                active: true,
                switch_groups: BTreeSet::new(),
            }],
            trains: Vec::new(),
            agents: vec![
                make_agent(1, "Ivy", 14),
                make_agent(2, "Moss", 16),
            ],
            hazards: Vec::new(),
            items: Vec::new(),
        };
        TurnContext::from_snapshot(snapshot)
    }

    fn make_agent(id: i64, name: &str, hp: i32) -> Agent {
        Agent {
            id: AgentId::from_raw(id),
            game_id: GameId::from_raw(1),
            name: name.to_owned(),
            strength: 10,
            dexterity: 10,
            willpower: 10,
            current_hp: hp,
            max_hp: hp,
            initiative: 10,
            timeout: 0,
            stun_timeout: 0,
            birthdate: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).single().unwrap(),
            location: Some(AgentLocation::AtStation(StationId::from_raw(2))),
        }
    }

    #[test]
    fn lightning_strikes_an_agent_while_rainy() {
        let mut ctx = make_ctx(Weather::Rainy);
        // chance hit, pick agent 1, max d6 draw, no transition.
        let mut rng = ScriptedRng::new(vec![0.0, 0.0, 0.999, 0.9], 1);
        run_weather_phase(&mut ctx, &mut rng).unwrap();

        let ivy = ctx.agents.get(&AgentId::from_raw(1)).unwrap();
        assert_eq!(ivy.current_hp, 8);
        let body = ctx.messages.first().map(|message| message.body.as_str()).unwrap();
        assert_eq!(body, "Lightning strikes Ivy for 6.");
        assert_eq!(ctx.messages.first().map(|message| message.kind), Some(MessageKind::Weather));
    }

    #[test]
    fn downed_lightning_target_respawns() {
        let mut ctx = make_ctx(Weather::Rainy);
        ctx.agents.get_mut(&AgentId::from_raw(1)).unwrap().current_hp = 3;
        // chance hit, pick agent 1, d6 of 6, respawn start pick, no transition.
        let mut rng = ScriptedRng::new(vec![0.0, 0.0, 0.999, 0.0, 0.9], 1);
        run_weather_phase(&mut ctx, &mut rng).unwrap();

        let ivy = ctx.agents.get(&AgentId::from_raw(1)).unwrap();
        assert_eq!(ivy.current_hp, ivy.max_hp);
        assert!(ivy.timeout > 0);
        assert_eq!(ivy.location, Some(AgentLocation::AtStation(StationId::from_raw(1))));
        let bodies: Vec<&str> = ctx.messages.iter().map(|message| message.body.as_str()).collect();
        assert!(bodies.iter().any(|body| body.contains("respawns at Harborside")));
    }

    #[test]
    fn lightning_with_nobody_eligible_consumes_no_extra_draws() {
        let mut ctx = make_ctx(Weather::Rainy);
        for agent in ctx.agents.values_mut() {
            agent.timeout = 3;
        }
        // chance hit, then only the transition draw remains.
        let mut rng = ScriptedRng::new(vec![0.0, 0.9], 1);
        run_weather_phase(&mut ctx, &mut rng).unwrap();

        assert!(ctx.messages.is_empty());
        assert_eq!(rng.remaining(), 0);
        assert_eq!(ctx.game.weather, Weather::Rainy);
    }

    #[test]
    fn no_lightning_without_rain() {
        let mut ctx = make_ctx(Weather::PartlyCloudy);
        // Only one draw happens: the transition check.
        let mut rng = ScriptedRng::new(vec![0.9], 1);
        run_weather_phase(&mut ctx, &mut rng).unwrap();

        assert!(ctx.messages.is_empty());
        assert_eq!(rng.remaining(), 0);
        for agent in ctx.agents.values() {
            assert_eq!(agent.current_hp, agent.max_hp);
        }
    }

    #[test]
    fn cloudy_checks_rain_before_partly_cloudy() {
        let mut ctx = make_ctx(Weather::Cloudy);
        let mut rng = ScriptedRng::new(vec![0.0], 1);
        run_weather_phase(&mut ctx, &mut rng).unwrap();

        assert_eq!(ctx.game.weather, Weather::Rainy);
        assert_eq!(rng.remaining(), 0, "a rain hit must skip the second check");
        let body = ctx.messages.first().map(|message| message.body.as_str()).unwrap();
        assert_eq!(body, "The weather shifts from cloudy to rainy.");
    }

    #[test]
    fn cloudy_can_thin_to_partly_cloudy() {
        let mut ctx = make_ctx(Weather::Cloudy);
        // Rain check misses, partly-cloudy check hits.
        let mut rng = ScriptedRng::new(vec![0.9, 0.0], 1);
        run_weather_phase(&mut ctx, &mut rng).unwrap();

        assert_eq!(ctx.game.weather, Weather::PartlyCloudy);
        let body = ctx.messages.first().map(|message| message.body.as_str()).unwrap();
        assert_eq!(body, "The weather shifts from cloudy to partly-cloudy.");
    }

    #[test]
    fn partly_cloudy_only_returns_to_cloudy() {
        let mut ctx = make_ctx(Weather::PartlyCloudy);
        let mut rng = ScriptedRng::new(vec![0.0], 1);
        run_weather_phase(&mut ctx, &mut rng).unwrap();
        assert_eq!(ctx.game.weather, Weather::Cloudy);
    }

    #[test]
    fn rain_clears_to_cloudy() {
        let mut ctx = make_ctx(Weather::Rainy);
        // No lightning, transition hit.
        let mut rng = ScriptedRng::new(vec![0.9, 0.0], 1);
        run_weather_phase(&mut ctx, &mut rng).unwrap();
        assert_eq!(ctx.game.weather, Weather::Cloudy);
    }

    #[test]
    fn calm_turn_leaves_no_trace() {
        let mut ctx = make_ctx(Weather::Cloudy);
        let mut rng = ScriptedRng::new(vec![0.9, 0.9], 1);
        run_weather_phase(&mut ctx, &mut rng).unwrap();

        assert_eq!(ctx.game.weather, Weather::Cloudy);
        assert!(ctx.messages.is_empty());
        assert_eq!(rng.remaining(), 0);
    }
}
