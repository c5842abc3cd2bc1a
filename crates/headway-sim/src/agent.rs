//! Agent phase: recovery, riding, boarding, and the combat hand-off.
//!
//! Agents act in descending initiative order (ties broken by ascending id).
//! Recovery and stun counters eat the whole turn. A rider checks whether
//! the train it sits on still serves its estimated route to the end
//! station and steps off when it does not; a stationed agent fights any
//! company it finds away from the terminals, otherwise picks a train and
//! a destination and boards when an estimated route exists. Virtual
//! stations block both boarding and alighting.

use headway_network::find_path;
use headway_rng::DrawSource;
use headway_types::{Agent, AgentId, AgentLocation, MessageKind, StationId, TrainId};
use tracing::{debug, warn};

use crate::combat;
use crate::context::TurnContext;
use crate::error::TurnError;

/// Run the agent phase for one turn.
pub fn run_agent_phase(ctx: &mut TurnContext, rng: &mut dyn DrawSource) -> Result<(), TurnError> {
    let mut order: Vec<(u32, AgentId)> = ctx
        .agents
        .values()
        .map(|agent| (agent.initiative, agent.id))
        .collect();
    order.sort_by(|left, right| right.0.cmp(&left.0).then_with(|| left.1.cmp(&right.1)));

    for (_, agent_id) in order {
        act(ctx, rng, agent_id)?;
    }
    Ok(())
}

/// One agent's whole turn.
fn act(
    ctx: &mut TurnContext,
    rng: &mut dyn DrawSource,
    agent_id: AgentId,
) -> Result<(), TurnError> {
    let Some(agent) = ctx.agents.get(&agent_id).cloned() else {
        return Ok(());
    };

    if agent.timeout > 0 {
        if let Some(entry) = ctx.agents.get_mut(&agent_id) {
            entry.timeout = entry.timeout.saturating_sub(1);
        }
        ctx.push_message(
            MessageKind::Agent,
            format!("{} is recovering and sits out the turn.", agent.name),
        );
        return Ok(());
    }

    if agent.stun_timeout > 0 {
        if let Some(entry) = ctx.agents.get_mut(&agent_id) {
            entry.stun_timeout = entry.stun_timeout.saturating_sub(1);
        }
        ctx.push_message(
            MessageKind::Agent,
            format!("{} is stunned and cannot act.", agent.name),
        );
        return Ok(());
    }

    match agent.location {
        None => {
            warn!(
                game = ctx.game.id.into_inner(),
                agent = agent_id.into_inner(),
                "agent has no location"
            );
            ctx.push_message(
                MessageKind::System,
                format!("{} is out of bounds and sits out the turn.", agent.name),
            );
            Ok(())
        }
        Some(AgentLocation::OnTrain(train_id)) => {
            act_aboard(ctx, rng, &agent, train_id);
            Ok(())
        }
        Some(AgentLocation::AtStation(station)) => act_stationed(ctx, rng, &agent, station),
    }
}

/// A rider's turn: stay aboard, step off, or be carried between stations.
fn act_aboard(ctx: &mut TurnContext, rng: &mut dyn DrawSource, agent: &Agent, train_id: TrainId) {
    let Some(train) = ctx.trains.get(&train_id) else {
        warn!(
            game = ctx.game.id.into_inner(),
            agent = agent.id.into_inner(),
            train = train_id.into_inner(),
            "agent rides a missing train"
        );
        ctx.push_message(
            MessageKind::System,
            format!("{} is out of bounds and sits out the turn.", agent.name),
        );
        return;
    };
    let train_title = train.title.clone();
    let train_line = train.line_id;
    let Some(station) = train.station_id() else {
        ctx.push_message(
            MessageKind::Agent,
            format!("{} rides {train_title} between stations.", agent.name),
        );
        return;
    };

    let station_title = ctx.station_title(station);
    let (is_end, is_virtual) = ctx
        .network
        .station(station)
        .map_or((false, false), |record| (record.is_end, record.is_virtual));

    if is_end {
        step_off(ctx, agent.id, station);
        ctx.push_message(
            MessageKind::Agent,
            format!("{} steps off {train_title} at {station_title}.", agent.name),
        );
        return;
    }

    // Estimate a route to the end station; the train keeps this rider only
    // if its own line covers the route's next leg.
    let stays = ctx.network.first_end_station().is_some_and(|destination| {
        find_path(&ctx.network, station, destination, rng)
            .and_then(|path| path.get(1).copied())
            .is_some_and(|next| ctx.network.connects_on_line(station, next, train_line))
    });

    if stays {
        ctx.push_message(
            MessageKind::Agent,
            format!("{} stays aboard {train_title}.", agent.name),
        );
    } else if is_virtual {
        ctx.push_message(
            MessageKind::Agent,
            format!("{} cannot alight at {station_title}; the stop is virtual.", agent.name),
        );
    } else {
        step_off(ctx, agent.id, station);
        ctx.push_message(
            MessageKind::Agent,
            format!("{} steps off {train_title} at {station_title} to change lines.", agent.name),
        );
    }
}

/// A stationed agent's turn: fight, wait, or board.
fn act_stationed(
    ctx: &mut TurnContext,
    rng: &mut dyn DrawSource,
    agent: &Agent,
    station: StationId,
) -> Result<(), TurnError> {
    let station_title = ctx.station_title(station);
    let (is_start, is_end, is_virtual) = ctx.network.station(station).map_or(
        (false, false, false),
        |record| (record.is_start, record.is_end, record.is_virtual),
    );

    // Terminals are safe ground; anywhere else, company means a fight.
    let others = ctx.other_agents_at_station(station, agent.id);
    if !others.is_empty() && !is_start && !is_end {
        return combat::resolve_combat(ctx, rng, agent.id, station, &others);
    }

    if is_end {
        ctx.push_message(
            MessageKind::Agent,
            format!("{} waits at {station_title}.", agent.name),
        );
        return Ok(());
    }

    let trains = ctx.trains_at_station(station);
    let Some(train_index) = rng.pick_index(trains.len()) else {
        ctx.push_message(
            MessageKind::Agent,
            format!("{} waits at {station_title} for a train.", agent.name),
        );
        return Ok(());
    };
    let Some(train_id) = trains.get(train_index).copied() else {
        return Ok(());
    };
    let Some((train_title, train_line)) = ctx
        .trains
        .get(&train_id)
        .map(|train| (train.title.clone(), train.line_id))
    else {
        return Ok(());
    };

    let targets = ctx.network.line_destinations(train_line, station);
    let Some(target_index) = rng.pick_index(targets.len()) else {
        ctx.push_message(
            MessageKind::Agent,
            format!("{} finds no route and waits at {station_title}.", agent.name),
        );
        return Ok(());
    };
    let Some(target) = targets.get(target_index).copied() else {
        return Ok(());
    };

    if find_path(&ctx.network, station, target, rng).is_none() {
        ctx.push_message(
            MessageKind::Agent,
            format!("{} finds no route and waits at {station_title}.", agent.name),
        );
        return Ok(());
    }
    if is_virtual {
        ctx.push_message(
            MessageKind::Agent,
            format!("{} cannot board at {station_title}; the stop is virtual.", agent.name),
        );
        return Ok(());
    }

    let target_title = ctx.station_title(target);
    if let Some(entry) = ctx.agents.get_mut(&agent.id) {
        entry.location = Some(AgentLocation::OnTrain(train_id));
    }
    debug!(
        game = ctx.game.id.into_inner(),
        agent = agent.id.into_inner(),
        train = train_id.into_inner(),
        "agent boards"
    );
    ctx.push_message(
        MessageKind::Agent,
        format!("{} boards {train_title} toward {target_title}.", agent.name),
    );
    Ok(())
}

/// Put an agent on the platform of `station`.
fn step_off(ctx: &mut TurnContext, agent_id: AgentId, station: StationId) {
    if let Some(entry) = ctx.agents.get_mut(&agent_id) {
        entry.location = Some(AgentLocation::AtStation(station));
    }
}
