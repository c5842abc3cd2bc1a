//! Combat resolution: stunts, melee strikes, and respawn.
//!
//! Combat fires from the agent phase whenever an agent finds company at a
//! station that is neither a start nor an end. The actor either attempts
//! one of three stunts (20% of the time) or swings at a uniformly-picked
//! co-located agent. Draw order is fixed: the stunt chance, the stunt
//! pick, the target pick, the d20 check, then whatever the effect itself
//! rolls. A target driven to zero hit points respawns at a start station.

use std::collections::BTreeSet;

use headway_network::find_path;
use headway_rng::DrawSource;
use headway_rng::dice;
use headway_types::{
    AgentId, AgentLocation, ItemKind, LineId, MessageKind, StationId, Stunt, TrainId,
};
use tracing::{debug, warn};

use crate::context::TurnContext;
use crate::error::TurnError;

/// Chance that the actor tries a stunt instead of a plain strike.
const STUNT_CHANCE: f64 = 0.2;

/// The check die rolled for every stunt.
const STUNT_CHECK_DICE: &str = "1d20";

/// Damage of a bare-handed strike, and of a weapon with no damage notation.
const UNARMED_DICE: &str = "1d4";

/// Shortest stun a withering gaze can inflict.
const STUN_MIN_TURNS: u32 = 1;

/// Longest stun a withering gaze can inflict.
const STUN_MAX_TURNS: u32 = 4;

/// Turns a respawned agent spends recovering before acting again.
pub const RESPAWN_TIMEOUT: u32 = 5;

/// Resolve one acting agent's combat at a shared station.
///
/// `others` are the co-located agents, ascending by id; there is always at
/// least one, or the agent phase would not have handed off.
pub fn resolve_combat(
    ctx: &mut TurnContext,
    rng: &mut dyn DrawSource,
    actor_id: AgentId,
    station: StationId,
    others: &[AgentId],
) -> Result<(), TurnError> {
    if rng.chance(STUNT_CHANCE) {
        attempt_stunt(ctx, rng, actor_id, station, others)
    } else {
        strike(ctx, rng, actor_id, others)
    }
}

/// Pick a stunt and a target, roll the d20 check, and apply the effect.
fn attempt_stunt(
    ctx: &mut TurnContext,
    rng: &mut dyn DrawSource,
    actor_id: AgentId,
    station: StationId,
    others: &[AgentId],
) -> Result<(), TurnError> {
    let Some(kind) = rng
        .pick_index(Stunt::ALL.len())
        .and_then(|index| Stunt::ALL.get(index))
        .copied()
    else {
        return Ok(());
    };
    let Some(target_id) = rng
        .pick_index(others.len())
        .and_then(|index| others.get(index))
        .copied()
    else {
        return Ok(());
    };

    let check = dice::roll(STUNT_CHECK_DICE, rng)?.total;
    debug!(
        game = ctx.game.id.into_inner(),
        actor = actor_id.into_inner(),
        target = target_id.into_inner(),
        stunt = kind.title(),
        check,
        "stunt attempted"
    );

    match kind {
        Stunt::WitheringGaze => withering_gaze(ctx, rng, actor_id, target_id, check),
        Stunt::Flashback => flashback(ctx, rng, actor_id, target_id, station, check),
        Stunt::OlSlip => ol_slip(ctx, rng, actor_id, target_id, station, check),
    }
    Ok(())
}

/// Stun the target for a rolled number of turns when the check comes in
/// at or under their willpower.
fn withering_gaze(
    ctx: &mut TurnContext,
    rng: &mut dyn DrawSource,
    actor_id: AgentId,
    target_id: AgentId,
    check: u32,
) {
    let willpower = ctx.agents.get(&target_id).map_or(0, |target| target.willpower);
    if check > willpower {
        fizzle(ctx, actor_id, target_id, Stunt::WitheringGaze);
        return;
    }

    let stun = rng.roll_between(STUN_MIN_TURNS, STUN_MAX_TURNS);
    if let Some(target) = ctx.agents.get_mut(&target_id) {
        target.stun_timeout = stun;
    }
    let actor = ctx.agent_name(actor_id);
    let target = ctx.agent_name(target_id);
    let unit = if stun == 1 { "turn" } else { "turns" };
    ctx.push_message(
        MessageKind::Combat,
        format!(
            "{actor} fixes {target} with a withering gaze; {target} is stunned for {stun} {unit}."
        ),
    );
}

/// Displace the target to the farthest adjacent station when the check
/// comes in at or under their strength.
///
/// "Farthest" means the longest estimated route from the shared station;
/// an unreachable candidate scores zero, and ties keep the earliest
/// candidate.
fn flashback(
    ctx: &mut TurnContext,
    rng: &mut dyn DrawSource,
    actor_id: AgentId,
    target_id: AgentId,
    station: StationId,
    check: u32,
) {
    let strength = ctx.agents.get(&target_id).map_or(0, |target| target.strength);
    if check > strength {
        fizzle(ctx, actor_id, target_id, Stunt::Flashback);
        return;
    }

    let candidates = ctx.network.adjacent_stations(station);
    if candidates.is_empty() {
        let actor = ctx.agent_name(actor_id);
        let target = ctx.agent_name(target_id);
        ctx.push_message(
            MessageKind::Combat,
            format!("{actor} triggers a flashback, but there is nowhere to send {target}."),
        );
        return;
    }

    let mut best: Option<(StationId, usize)> = None;
    for candidate in candidates {
        let score = find_path(&ctx.network, station, candidate, rng)
            .map_or(0, |path| path.len());
        let better = match best {
            None => true,
            Some((_, best_score)) => score > best_score,
        };
        if better {
            best = Some((candidate, score));
        }
    }
    let Some((destination, _)) = best else {
        return;
    };

    if let Some(target) = ctx.agents.get_mut(&target_id) {
        target.location = Some(AgentLocation::AtStation(destination));
    }
    let actor = ctx.agent_name(actor_id);
    let target = ctx.agent_name(target_id);
    let destination_title = ctx.station_title(destination);
    ctx.push_message(
        MessageKind::Combat,
        format!(
            "{actor} plunges {target} into a flashback; {target} comes to at {destination_title}."
        ),
    );
}

/// Shove the target aboard a random train of a line that departs the
/// shared station.
///
/// The check is rolled against the *actor's own* dexterity, yet the ride
/// lands on the target. Kept as-is; committed games replay these rules.
fn ol_slip(
    ctx: &mut TurnContext,
    rng: &mut dyn DrawSource,
    actor_id: AgentId,
    target_id: AgentId,
    station: StationId,
    check: u32,
) {
    let dexterity = ctx.agents.get(&actor_id).map_or(0, |actor| actor.dexterity);
    if check > dexterity {
        fizzle(ctx, actor_id, target_id, Stunt::OlSlip);
        return;
    }

    let departing_lines: BTreeSet<LineId> = ctx
        .network
        .outgoing_hops(station)
        .iter()
        .filter_map(|hop_id| ctx.network.hop(*hop_id))
        .map(|hop| hop.line_id)
        .collect();
    let candidates: Vec<TrainId> = ctx
        .trains
        .values()
        .filter(|train| departing_lines.contains(&train.line_id))
        .map(|train| train.id)
        .collect();

    let Some(index) = rng.pick_index(candidates.len()) else {
        let actor = ctx.agent_name(actor_id);
        let target = ctx.agent_name(target_id);
        ctx.push_message(
            MessageKind::Combat,
            format!("{actor} pulls the Ol' Slip, but no train comes for {target}."),
        );
        return;
    };
    let Some(train_id) = candidates.get(index).copied() else {
        return;
    };

    if let Some(target) = ctx.agents.get_mut(&target_id) {
        target.location = Some(AgentLocation::OnTrain(train_id));
    }
    let actor = ctx.agent_name(actor_id);
    let target = ctx.agent_name(target_id);
    let train_title = ctx.train_title(train_id);
    ctx.push_message(
        MessageKind::Combat,
        format!("{actor} pulls the Ol' Slip; {target} stumbles aboard {train_title}."),
    );
}

/// The shared no-effect outcome of a failed stunt check.
fn fizzle(ctx: &mut TurnContext, actor_id: AgentId, target_id: AgentId, kind: Stunt) {
    let actor = ctx.agent_name(actor_id);
    let target = ctx.agent_name(target_id);
    ctx.push_message(
        MessageKind::Combat,
        format!("{actor} attempts {} on {target}, but nothing comes of it.", kind.title()),
    );
}

/// A plain melee strike with the actor's best weapon, or bare hands.
fn strike(
    ctx: &mut TurnContext,
    rng: &mut dyn DrawSource,
    actor_id: AgentId,
    others: &[AgentId],
) -> Result<(), TurnError> {
    let Some(target_id) = rng
        .pick_index(others.len())
        .and_then(|index| others.get(index))
        .copied()
    else {
        return Ok(());
    };

    // Lowest-id weapon the actor carries; a weapon with no damage notation
    // still lends its name to the message but hits like bare hands.
    let weapon = ctx
        .items
        .values()
        .find(|item| item.agent_id == actor_id && item.kind == ItemKind::Weapon)
        .map(|item| (item.title.clone(), item.damage.clone()));
    let (weapon_title, notation) = match weapon {
        Some((title, Some(notation))) => (Some(title), notation),
        Some((title, None)) => (Some(title), String::from(UNARMED_DICE)),
        None => (None, String::from(UNARMED_DICE)),
    };

    let roll = dice::roll(&notation, rng)?;
    let Some(target) = ctx.agents.get_mut(&target_id) else {
        return Ok(());
    };
    target.current_hp = target.current_hp.saturating_sub_unsigned(roll.total);
    let target_name = target.name.clone();
    let downed = target.current_hp <= 0;

    let actor_name = ctx.agent_name(actor_id);
    debug!(
        game = ctx.game.id.into_inner(),
        actor = actor_id.into_inner(),
        target = target_id.into_inner(),
        damage = roll.total,
        downed,
        "melee strike"
    );
    let body = weapon_title.map_or_else(
        || {
            format!(
                "{actor_name} strikes {target_name} bare-handed for {total}.",
                total = roll.total,
            )
        },
        |title| {
            format!(
                "{actor_name} strikes {target_name} with the {title} for {total}.",
                total = roll.total,
            )
        },
    );
    ctx.push_message(MessageKind::Combat, body);

    if downed {
        respawn(ctx, target_id, rng);
    }
    Ok(())
}

/// Bring a downed agent back at a uniformly-picked start station, restored
/// to full hit points and recovering for [`RESPAWN_TIMEOUT`] turns.
///
/// With no start station in the network the agent stays where they fell,
/// hit points and all; the condition is logged and surfaced to the feed.
pub fn respawn(ctx: &mut TurnContext, agent_id: AgentId, rng: &mut dyn DrawSource) {
    let name = ctx.agent_name(agent_id);
    let starts = ctx.network.start_stations();
    let Some(index) = rng.pick_index(starts.len()) else {
        warn!(
            game = ctx.game.id.into_inner(),
            agent = agent_id.into_inner(),
            "no start station to respawn at"
        );
        ctx.push_message(
            MessageKind::Combat,
            format!("{name} is down, and there is nowhere to come back to."),
        );
        return;
    };
    let Some(station) = starts.get(index).copied() else {
        return;
    };

    let station_title = ctx.station_title(station);
    if let Some(agent) = ctx.agents.get_mut(&agent_id) {
        agent.current_hp = agent.max_hp;
        agent.timeout = RESPAWN_TIMEOUT;
        agent.location = Some(AgentLocation::AtStation(station));
    }
    debug!(
        game = ctx.game.id.into_inner(),
        agent = agent_id.into_inner(),
        station = station.into_inner(),
        "agent respawns"
    );
    ctx.push_message(MessageKind::Combat, format!("{name} respawns at {station_title}."));
}
