//! Train phase: locomotion along hops and station dwell.
//!
//! Every train acts once per turn, in ascending id order. A train on a hop
//! checks, in priority order: hazard hold, arrival at the tail station,
//! headway hold behind a slower cross-line train, plain advance. A train
//! at a station counts dwell time and departs onto a uniformly-picked
//! outgoing hop of its line once the dwell is up -- immediately, at
//! virtual stations. Each train leaves exactly one message per turn.

use headway_rng::DrawSource;
use headway_types::{HopId, MessageKind, StationId, Train, TrainId, TrainLocation};
use tracing::{debug, warn};

use crate::context::TurnContext;

/// Run the train phase for one turn.
pub fn run_train_phase(ctx: &mut TurnContext, rng: &mut dyn DrawSource) {
    let train_ids: Vec<TrainId> = ctx.trains.keys().copied().collect();
    for train_id in train_ids {
        let Some(train) = ctx.trains.get(&train_id).cloned() else {
            continue;
        };
        match train.location {
            None => {
                warn!(
                    game = ctx.game.id.into_inner(),
                    train = train_id.into_inner(),
                    "train has no location"
                );
                ctx.push_message(
                    MessageKind::System,
                    format!("{} is out of bounds and sits out the turn.", train.title),
                );
            }
            Some(TrainLocation::OnHop { hop, distance }) => {
                move_along_hop(ctx, &train, hop, distance);
            }
            Some(TrainLocation::AtStation(station)) => {
                dwell_at_station(ctx, rng, &train, station);
            }
        }
    }
}

/// One turn of movement for a train somewhere along a hop.
fn move_along_hop(ctx: &mut TurnContext, train: &Train, hop_id: HopId, distance: u32) {
    // A hazard at or before the current position stops the train outright.
    if let Some(kind) = ctx.blocking_hazard(hop_id, distance).map(|hazard| hazard.kind) {
        debug!(
            game = ctx.game.id.into_inner(),
            train = train.id.into_inner(),
            hop = hop_id.into_inner(),
            "train held by hazard"
        );
        ctx.push_message(
            MessageKind::Train,
            format!("{} holds on the track: {} ahead.", train.title, kind.title()),
        );
        return;
    }

    let Some((length, tail)) = ctx.network.hop(hop_id).map(|hop| (hop.length, hop.tail_id)) else {
        warn!(
            game = ctx.game.id.into_inner(),
            train = train.id.into_inner(),
            hop = hop_id.into_inner(),
            "train references a missing hop"
        );
        ctx.push_message(
            MessageKind::System,
            format!("{} is out of bounds and sits out the turn.", train.title),
        );
        return;
    };

    if distance >= length {
        arrive(ctx, train, tail);
        return;
    }

    let next_distance = distance.saturating_add(train.speed);

    // Headway rule: never advance onto or past a strictly slower train
    // strictly ahead on the same hop, if it runs a different line. Same-line
    // followers trust the schedule and keep rolling.
    let ahead_title = ctx
        .trains
        .values()
        .find(|other| {
            other.id != train.id
                && other.line_id != train.line_id
                && other.speed < train.speed
                && other.hop_position().is_some_and(|(other_hop, other_distance)| {
                    other_hop == hop_id
                        && other_distance > distance
                        && next_distance >= other_distance
                })
        })
        .map(|other| other.title.clone());
    if let Some(other_title) = ahead_title {
        debug!(
            game = ctx.game.id.into_inner(),
            train = train.id.into_inner(),
            hop = hop_id.into_inner(),
            "train held for headway"
        );
        ctx.push_message(
            MessageKind::Train,
            format!("{} holds behind {other_title} to keep headway.", train.title),
        );
        return;
    }

    let tail_title = ctx.station_title(tail);
    if let Some(entry) = ctx.trains.get_mut(&train.id) {
        entry.location = Some(TrainLocation::OnHop { hop: hop_id, distance: next_distance });
    }
    debug!(
        game = ctx.game.id.into_inner(),
        train = train.id.into_inner(),
        hop = hop_id.into_inner(),
        distance = next_distance,
        "train advances"
    );
    ctx.push_message(
        MessageKind::Train,
        format!("{} advances toward {tail_title}.", train.title),
    );
}

/// Finish a hop: stop at the tail station unless a train of another line
/// already holds the platform.
fn arrive(ctx: &mut TurnContext, train: &Train, station: StationId) {
    let station_title = ctx.station_title(station);
    if ctx.station_held_by_other_line(station, train.line_id, train.id) {
        debug!(
            game = ctx.game.id.into_inner(),
            train = train.id.into_inner(),
            station = station.into_inner(),
            "arrival blocked by occupied platform"
        );
        ctx.push_message(
            MessageKind::Train,
            format!("{} holds outside {station_title}; the platform is occupied.", train.title),
        );
        return;
    }

    if let Some(entry) = ctx.trains.get_mut(&train.id) {
        entry.location = Some(TrainLocation::AtStation(station));
        entry.wait_time = 0;
    }
    debug!(
        game = ctx.game.id.into_inner(),
        train = train.id.into_inner(),
        station = station.into_inner(),
        "train arrives"
    );
    ctx.push_message(
        MessageKind::Train,
        format!("{} arrives at {station_title}.", train.title),
    );
}

/// One turn of dwell at a station: count up, then depart. Virtual stations
/// are pass-throughs and force an immediate departure attempt.
fn dwell_at_station(
    ctx: &mut TurnContext,
    rng: &mut dyn DrawSource,
    train: &Train,
    station: StationId,
) {
    let station_title = ctx.station_title(station);
    let is_virtual = ctx
        .network
        .station(station)
        .is_some_and(|record| record.is_virtual);

    if is_virtual || train.wait_time >= train.max_wait_time {
        depart(ctx, rng, train, station, &station_title);
        return;
    }

    if let Some(entry) = ctx.trains.get_mut(&train.id) {
        entry.wait_time = entry.wait_time.saturating_add(1);
    }
    ctx.push_message(
        MessageKind::Train,
        format!("{} waits at {station_title}.", train.title),
    );
}

/// Pick an outgoing hop of the train's line whose entry is clear and roll
/// onto it at distance 0. A failed attempt leaves the dwell counter alone.
fn depart(
    ctx: &mut TurnContext,
    rng: &mut dyn DrawSource,
    train: &Train,
    station: StationId,
    station_title: &str,
) {
    let candidates: Vec<HopId> = ctx
        .network
        .outgoing_hops_on_line(station, train.line_id)
        .into_iter()
        .filter(|hop_id| !ctx.hop_blocked_at_entry(*hop_id, train.id))
        .collect();
    let Some(index) = rng.pick_index(candidates.len()) else {
        debug!(
            game = ctx.game.id.into_inner(),
            train = train.id.into_inner(),
            station = station.into_inner(),
            "no clear outgoing hop"
        );
        ctx.push_message(
            MessageKind::Train,
            format!("{} has no hops to depart {station_title}.", train.title),
        );
        return;
    };
    let Some(hop_id) = candidates.get(index).copied() else {
        return;
    };
    let Some(tail) = ctx.network.hop(hop_id).map(|hop| hop.tail_id) else {
        return;
    };

    let next_title = ctx.station_title(tail);
    if let Some(entry) = ctx.trains.get_mut(&train.id) {
        entry.location = Some(TrainLocation::OnHop { hop: hop_id, distance: 0 });
    }
    debug!(
        game = ctx.game.id.into_inner(),
        train = train.id.into_inner(),
        hop = hop_id.into_inner(),
        "train departs"
    );
    ctx.push_message(
        MessageKind::Train,
        format!("{} departs {station_title} toward {next_title}.", train.title),
    );
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::BTreeSet;

    use chrono::{TimeZone, Utc};
    use headway_rng::ScriptedRng;
    use headway_types::{
        Game, GameId, GameSnapshot, Hazard, HazardId, HazardKind, Hop, Line, LineId, Station,
        Weather,
    };

    use super::*;

    /// Network: Harborside (1, start) -> Fulton Market (2) -> Kingsbridge
    /// (4, end) on line 1, with a second line-1 hop 1 -> 4 and a line-2 hop
    /// 1 -> 2. Beacon Junction (3) is virtual with a line-1 hop to 4.
    fn make_ctx(trains: Vec<Train>, hazards: Vec<Hazard>) -> TurnContext {
        let game_id = GameId::from_raw(1);
        let snapshot = GameSnapshot {
            game: Game {
                id: game_id,
                title: String::from("Train Test"),
                turn_number: 1,
                current_time: Utc.with_ymd_and_hms(2025, 6, 1, 8, 0, 0).single().unwrap(),
                turn_seconds: 300,
                current_seed: 7,
                weather: Weather::Cloudy,
                finished: false,
            },
            lines: vec![make_line(1), make_line(2)],
            stations: vec![
                make_station(1, "Harborside", false),
                make_station(2, "Fulton Market", false),
                make_station(3, "Beacon Junction", true),
                make_station(4, "Kingsbridge", false),
            ],
            hops: vec![
                make_hop(1, 1, 1, 2, 12),
                make_hop(2, 1, 2, 4, 8),
                make_hop(3, 2, 1, 2, 9),
                make_hop(4, 1, 1, 4, 10),
                make_hop(5, 1, 3, 4, 6),
            ],
            trains,
            agents: Vec::new(),
            hazards,
            items: Vec::new(),
        };
        TurnContext::from_snapshot(snapshot)
    }

    fn make_station(id: i64, title: &str, is_virtual: bool) -> Station {
        Station {
            id: StationId::from_raw(id),
            game_id: GameId::from_raw(1),
            title: title.to_owned(),
            is_start: id == 1,
            is_end: id == 4,
            is_virtual,
            x: 0.0,
            y: 0.0,
        }
    }

    fn make_line(id: i64) -> Line {
        Line {
            id: LineId::from_raw(id),
            game_id: GameId::from_raw(1),
            title: format!("Line {id}"),
            color: String::from("#0039a6"),
        }
    }

    fn make_hop(id: i64, line: i64, head: i64, tail: i64, length: u32) -> Hop {
        Hop {
            id: HopId::from_raw(id),
            game_id: GameId::from_raw(1),
            line_id: LineId::from_raw(line),
            head_id: StationId::from_raw(head),
            tail_id: StationId::from_raw(tail),
            length,
            active: true,
            switch_groups: BTreeSet::new(),
        }
    }

    fn make_train(id: i64, line: i64, location: Option<TrainLocation>, speed: u32) -> Train {
        Train {
            id: TrainId::from_raw(id),
            game_id: GameId::from_raw(1),
            line_id: LineId::from_raw(line),
            title: format!("Train {id}"),
            location,
            speed,
            wait_time: 0,
            max_wait_time: 2,
        }
    }

    fn on_hop(hop: i64, distance: u32) -> Option<TrainLocation> {
        Some(TrainLocation::OnHop { hop: HopId::from_raw(hop), distance })
    }

    fn at_station(station: i64) -> Option<TrainLocation> {
        Some(TrainLocation::AtStation(StationId::from_raw(station)))
    }

    fn bodies(ctx: &TurnContext) -> Vec<&str> {
        ctx.messages.iter().map(|message| message.body.as_str()).collect()
    }

    #[test]
    fn hazard_at_or_behind_position_holds_the_train() {
        let hazard = Hazard {
            id: HazardId::from_raw(1),
            game_id: GameId::from_raw(1),
            hop_id: HopId::from_raw(1),
            distance: 3,
            kind: HazardKind::StrayDog,
            age: 0,
        };
        let mut ctx = make_ctx(vec![make_train(1, 1, on_hop(1, 5), 4)], vec![hazard]);
        let mut rng = ScriptedRng::new(Vec::new(), 1);
        run_train_phase(&mut ctx, &mut rng);

        let train = ctx.trains.get(&TrainId::from_raw(1)).unwrap();
        assert_eq!(train.location, on_hop(1, 5));
        assert_eq!(bodies(&ctx), vec!["Train 1 holds on the track: Stray Dog ahead."]);
    }

    #[test]
    fn hazard_strictly_ahead_does_not_hold() {
        let hazard = Hazard {
            id: HazardId::from_raw(1),
            game_id: GameId::from_raw(1),
            hop_id: HopId::from_raw(1),
            distance: 6,
            kind: HazardKind::TrackDebris,
            age: 0,
        };
        let mut ctx = make_ctx(vec![make_train(1, 1, on_hop(1, 5), 4)], vec![hazard]);
        let mut rng = ScriptedRng::new(Vec::new(), 1);
        run_train_phase(&mut ctx, &mut rng);

        let train = ctx.trains.get(&TrainId::from_raw(1)).unwrap();
        assert_eq!(train.location, on_hop(1, 9));
        assert_eq!(bodies(&ctx), vec!["Train 1 advances toward Fulton Market."]);
    }

    #[test]
    fn train_arrives_once_distance_covers_the_hop() {
        let mut train = make_train(1, 1, on_hop(1, 12), 4);
        train.wait_time = 2;
        let mut ctx = make_ctx(vec![train], Vec::new());
        let mut rng = ScriptedRng::new(Vec::new(), 1);
        run_train_phase(&mut ctx, &mut rng);

        let train = ctx.trains.get(&TrainId::from_raw(1)).unwrap();
        assert_eq!(train.location, at_station(2));
        assert_eq!(train.wait_time, 0, "arrival resets the dwell counter");
        assert_eq!(bodies(&ctx), vec!["Train 1 arrives at Fulton Market."]);
    }

    #[test]
    fn occupied_platform_of_another_line_blocks_arrival() {
        let mut ctx = make_ctx(
            vec![
                make_train(1, 1, on_hop(1, 12), 4),
                make_train(2, 2, at_station(2), 4),
            ],
            Vec::new(),
        );
        // Train 2 dwells, consuming no draws; train 1 holds outside.
        let mut rng = ScriptedRng::new(Vec::new(), 1);
        run_train_phase(&mut ctx, &mut rng);

        let held = ctx.trains.get(&TrainId::from_raw(1)).unwrap();
        assert_eq!(held.location, on_hop(1, 12));
        assert!(bodies(&ctx)
            .iter()
            .any(|body| *body == "Train 1 holds outside Fulton Market; the platform is occupied."));
    }

    #[test]
    fn same_line_train_does_not_block_arrival() {
        let mut ctx = make_ctx(
            vec![
                make_train(1, 1, on_hop(1, 12), 4),
                make_train(2, 1, at_station(2), 4),
            ],
            Vec::new(),
        );
        let mut rng = ScriptedRng::new(vec![0.0], 1);
        run_train_phase(&mut ctx, &mut rng);

        let train = ctx.trains.get(&TrainId::from_raw(1)).unwrap();
        assert_eq!(train.location, at_station(2));
    }

    #[test]
    fn fast_train_holds_behind_slower_cross_line_train() {
        let mut ctx = make_ctx(
            vec![
                make_train(1, 1, on_hop(1, 2), 6),
                make_train(2, 2, on_hop(1, 5), 3),
            ],
            Vec::new(),
        );
        let mut rng = ScriptedRng::new(Vec::new(), 1);
        run_train_phase(&mut ctx, &mut rng);

        let fast = ctx.trains.get(&TrainId::from_raw(1)).unwrap();
        assert_eq!(fast.location, on_hop(1, 2));
        let slow = ctx.trains.get(&TrainId::from_raw(2)).unwrap();
        assert_eq!(slow.location, on_hop(1, 8));
        assert!(bodies(&ctx)
            .iter()
            .any(|body| *body == "Train 1 holds behind Train 2 to keep headway."));
    }

    #[test]
    fn same_line_follower_keeps_rolling() {
        let mut ctx = make_ctx(
            vec![
                make_train(1, 1, on_hop(1, 2), 6),
                make_train(2, 1, on_hop(1, 5), 3),
            ],
            Vec::new(),
        );
        let mut rng = ScriptedRng::new(Vec::new(), 1);
        run_train_phase(&mut ctx, &mut rng);

        let follower = ctx.trains.get(&TrainId::from_raw(1)).unwrap();
        assert_eq!(follower.location, on_hop(1, 8));
    }

    #[test]
    fn dwelling_train_counts_up_before_departing() {
        let mut ctx = make_ctx(vec![make_train(1, 2, at_station(1), 4)], Vec::new());
        let mut rng = ScriptedRng::new(Vec::new(), 1);
        run_train_phase(&mut ctx, &mut rng);

        let train = ctx.trains.get(&TrainId::from_raw(1)).unwrap();
        assert_eq!(train.wait_time, 1);
        assert_eq!(train.location, at_station(1));
        assert_eq!(bodies(&ctx), vec!["Train 1 waits at Harborside."]);
    }

    #[test]
    fn train_departs_once_the_dwell_is_up() {
        let mut train = make_train(1, 2, at_station(1), 4);
        train.wait_time = 2;
        let mut ctx = make_ctx(vec![train], Vec::new());
        // One draw: the hop pick over the single line-2 hop.
        let mut rng = ScriptedRng::new(vec![0.0], 1);
        run_train_phase(&mut ctx, &mut rng);

        let train = ctx.trains.get(&TrainId::from_raw(1)).unwrap();
        assert_eq!(train.location, on_hop(3, 0));
        assert_eq!(bodies(&ctx), vec!["Train 1 departs Harborside toward Fulton Market."]);
        assert_eq!(rng.remaining(), 0);
    }

    #[test]
    fn virtual_station_forces_immediate_departure() {
        let mut ctx = make_ctx(vec![make_train(1, 1, at_station(3), 4)], Vec::new());
        let mut rng = ScriptedRng::new(vec![0.0], 1);
        run_train_phase(&mut ctx, &mut rng);

        let train = ctx.trains.get(&TrainId::from_raw(1)).unwrap();
        assert_eq!(train.location, on_hop(5, 0));
        assert_eq!(bodies(&ctx), vec!["Train 1 departs Beacon Junction toward Kingsbridge."]);
    }

    #[test]
    fn departure_skips_hops_with_a_train_at_the_entry() {
        let mut departing = make_train(1, 1, at_station(1), 4);
        departing.wait_time = 2;
        let mut ctx = make_ctx(
            vec![departing, make_train(2, 1, on_hop(1, 0), 3)],
            Vec::new(),
        );
        // Hop 1 is blocked at entry, so the only candidate is hop 4; then
        // train 2 advances without a draw.
        let mut rng = ScriptedRng::new(vec![0.0], 1);
        run_train_phase(&mut ctx, &mut rng);

        let train = ctx.trains.get(&TrainId::from_raw(1)).unwrap();
        assert_eq!(train.location, on_hop(4, 0));
        assert_eq!(rng.remaining(), 0);
    }

    #[test]
    fn failed_departure_logs_and_leaves_the_counter() {
        // Station 2 has no line-2 outgoing hops at all.
        let mut stuck = make_train(1, 2, at_station(2), 4);
        stuck.wait_time = 2;
        let mut ctx = make_ctx(vec![stuck], Vec::new());
        let mut rng = ScriptedRng::new(Vec::new(), 1);
        run_train_phase(&mut ctx, &mut rng);

        let train = ctx.trains.get(&TrainId::from_raw(1)).unwrap();
        assert_eq!(train.location, at_station(2));
        assert_eq!(train.wait_time, 2, "a failed departure does not count as dwell");
        assert_eq!(bodies(&ctx), vec!["Train 1 has no hops to depart Fulton Market."]);
    }

    #[test]
    fn lost_train_sits_out_the_turn() {
        let mut ctx = make_ctx(vec![make_train(1, 1, None, 4)], Vec::new());
        let mut rng = ScriptedRng::new(Vec::new(), 1);
        run_train_phase(&mut ctx, &mut rng);

        assert_eq!(bodies(&ctx), vec!["Train 1 is out of bounds and sits out the turn."]);
        assert_eq!(ctx.messages.first().map(|message| message.kind), Some(MessageKind::System));
    }
}
