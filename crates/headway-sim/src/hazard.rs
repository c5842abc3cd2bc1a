//! Hazard phase: track obstruction spawns and clean-ups.
//!
//! One spawn chance and one clean-up chance per turn, in that order. A
//! spawn places a catalog hazard at a uniform position on a uniform hop;
//! a clean-up removes one uniform live hazard. Hazard ageing is not this
//! phase's job; the turn runner ages every surviving hazard at turn end.

use headway_rng::DrawSource;
use headway_types::{Hazard, HazardId, HazardKind, HopId, MessageKind};
use tracing::{debug, warn};

use crate::context::TurnContext;

/// Chance per turn that a new hazard appears.
const SPAWN_CHANCE: f64 = 0.05;

/// Chance per turn that one live hazard is cleared.
const CLEANUP_CHANCE: f64 = 0.05;

/// Most hazards allowed to exist at once; spawns beyond this are skipped.
pub const MAX_LIVE_HAZARDS: usize = 5;

/// Run the hazard phase for one turn.
pub fn run_hazard_phase(ctx: &mut TurnContext, rng: &mut dyn DrawSource) {
    if rng.chance(SPAWN_CHANCE) {
        spawn_hazard(ctx, rng);
    }
    if rng.chance(CLEANUP_CHANCE) {
        clear_hazard(ctx, rng);
    }
}

/// Place a new hazard on the network.
///
/// The cap and the empty-network checks come before the kind, hop, and
/// distance draws, so a skipped spawn costs no entropy beyond the chance
/// check itself.
fn spawn_hazard(ctx: &mut TurnContext, rng: &mut dyn DrawSource) {
    if ctx.hazards.len() >= MAX_LIVE_HAZARDS {
        warn!(
            game = ctx.game.id.into_inner(),
            live = ctx.hazards.len(),
            "hazard cap reached; spawn skipped"
        );
        return;
    }
    let hop_ids: Vec<HopId> = ctx.network.hops().map(|hop| hop.id).collect();
    if hop_ids.is_empty() {
        warn!(game = ctx.game.id.into_inner(), "no hops to place a hazard on");
        return;
    }

    let Some(kind) = rng
        .pick_index(HazardKind::CATALOG.len())
        .and_then(|index| HazardKind::CATALOG.get(index))
        .copied()
    else {
        return;
    };
    let Some(hop) = rng
        .pick_index(hop_ids.len())
        .and_then(|index| hop_ids.get(index))
        .and_then(|hop_id| ctx.network.hop(*hop_id))
    else {
        return;
    };
    let distance = rng.roll_between(0, hop.length.saturating_sub(1));
    let hop_id = hop.id;
    let head = ctx.station_title(hop.head_id);
    let tail = ctx.station_title(hop.tail_id);

    let id = ctx.next_hazard_id();
    ctx.hazards.insert(
        id,
        Hazard { id, game_id: ctx.game.id, hop_id, distance, kind, age: 0 },
    );
    debug!(
        game = ctx.game.id.into_inner(),
        hazard = id.into_inner(),
        hop = hop_id.into_inner(),
        distance,
        kind = kind.as_str(),
        "hazard spawned"
    );
    ctx.push_message(
        MessageKind::Hazard,
        format!("A {} appears on the track between {head} and {tail}.", kind.title()),
    );
}

/// Remove one live hazard, picked uniformly by ascending id.
fn clear_hazard(ctx: &mut TurnContext, rng: &mut dyn DrawSource) {
    let ids: Vec<HazardId> = ctx.hazards.keys().copied().collect();
    let Some(index) = rng.pick_index(ids.len()) else {
        debug!(game = ctx.game.id.into_inner(), "no live hazard to clear");
        return;
    };
    let Some(id) = ids.get(index).copied() else {
        return;
    };
    let Some(hazard) = ctx.hazards.remove(&id) else {
        return;
    };
    debug!(
        game = ctx.game.id.into_inner(),
        hazard = id.into_inner(),
        age = hazard.age,
        "hazard cleared"
    );
    ctx.push_message(
        MessageKind::Hazard,
        format!("The {} clears from the tracks.", hazard.kind.title()),
    );
}
