//! Bounded random-walk path estimation.
//!
//! Deliberately not a shortest-path search: the estimator probes the graph
//! with a handful of random walks and reports the first one that reaches
//! the destination. Agents use it both as a feasibility oracle ("a path
//! exists, so board") and as a rough distance estimate (the returned path's
//! length). Exhausting every attempt is a normal `None`, never an error.

use std::collections::BTreeSet;

use headway_rng::DrawSource;
use headway_types::StationId;

use crate::map::NetworkMap;

/// Independent walk attempts per query.
const MAX_ATTEMPTS: u32 = 10;

/// Maximum hops taken per attempt.
const MAX_DEPTH: u32 = 20;

/// Estimate a path from `source` to `destination` by bounded random walk.
///
/// Up to [`MAX_ATTEMPTS`] attempts; each walks from `source`, uniformly
/// drawing one outgoing hop per step (candidates in ascending hop-id order,
/// so the draw stream fully determines the walk). An attempt fails on a
/// station with no outgoing hop, on revisiting a station, or after
/// [`MAX_DEPTH`] hops. The first attempt to reach `destination` wins.
///
/// Returns the visited stations from `source` to `destination` inclusive,
/// or `None` when every attempt failed. `source == destination` succeeds
/// trivially without consuming a draw.
pub fn find_path(
    map: &NetworkMap,
    source: StationId,
    destination: StationId,
    rng: &mut dyn DrawSource,
) -> Option<Vec<StationId>> {
    if source == destination {
        return Some(vec![source]);
    }

    for _attempt in 0..MAX_ATTEMPTS {
        if let Some(path) = walk_once(map, source, destination, rng) {
            return Some(path);
        }
    }
    None
}

/// One walk attempt.
fn walk_once(
    map: &NetworkMap,
    source: StationId,
    destination: StationId,
    rng: &mut dyn DrawSource,
) -> Option<Vec<StationId>> {
    let mut path = vec![source];
    let mut visited: BTreeSet<StationId> = BTreeSet::new();
    visited.insert(source);
    let mut current = source;

    for _step in 0..MAX_DEPTH {
        let candidates = map.outgoing_hops(current);
        let index = rng.pick_index(candidates.len())?;
        let hop = candidates.get(index).and_then(|hop_id| map.hop(*hop_id))?;

        let next = hop.tail_id;
        path.push(next);
        if next == destination {
            return Some(path);
        }
        if !visited.insert(next) {
            // Walked into a loop; give up on this attempt.
            return None;
        }
        current = next;
    }
    None
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::BTreeSet;

    use headway_rng::{GameRng, ScriptedRng};
    use headway_types::{GameId, Hop, HopId, Line, LineId, Station};

    use super::*;

    fn make_station(id: i64) -> Station {
        Station {
            id: StationId::from_raw(id),
            game_id: GameId::from_raw(1),
            title: format!("Station {id}"),
            is_start: false,
            is_end: false,
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
            length: 10,
            active: true,
            switch_groups: BTreeSet::new(),
        }
    }

    /// Stations 1..=count chained 1 -> 2 -> ... -> count.
    fn make_chain(count: i64) -> NetworkMap {
        let mut map = NetworkMap::new();
        map.add_line(Line {
            id: LineId::from_raw(1),
            game_id: GameId::from_raw(1),
            title: String::from("Chain"),
            color: String::from("#333333"),
        })
        .unwrap();
        for id in 1..=count {
            map.add_station(make_station(id)).unwrap();
        }
        for id in 1..count {
            map.add_hop(make_hop(id, id, id.saturating_add(1))).unwrap();
        }
        map
    }

    #[test]
    fn chain_walk_reaches_destination() {
        let map = make_chain(4);
        let mut rng = GameRng::new(0x5EED);
        let path = find_path(&map, StationId::from_raw(1), StationId::from_raw(4), &mut rng);
        assert_eq!(
            path,
            Some(vec![
                StationId::from_raw(1),
                StationId::from_raw(2),
                StationId::from_raw(3),
                StationId::from_raw(4),
            ]),
        );
    }

    #[test]
    fn same_station_is_trivial_success_without_draws() {
        let map = make_chain(2);
        let mut rng = GameRng::new(77);
        let seed_before = rng.seed();
        let path = find_path(&map, StationId::from_raw(1), StationId::from_raw(1), &mut rng);
        assert_eq!(path, Some(vec![StationId::from_raw(1)]));
        assert_eq!(rng.seed(), seed_before);
    }

    #[test]
    fn dead_end_yields_none() {
        let map = make_chain(3);
        let mut rng = GameRng::new(5);
        // Station 3 has no outgoing hop, so walking 3 -> 1 can never work.
        let path = find_path(&map, StationId::from_raw(3), StationId::from_raw(1), &mut rng);
        assert_eq!(path, None);
    }

    #[test]
    fn revisit_aborts_the_attempt() {
        // 1 -> 2 -> 1 cycle; 3 unreachable.
        let mut map = make_chain(2);
        map.add_station(make_station(3)).unwrap();
        map.add_hop(make_hop(2, 2, 1)).unwrap();
        let mut rng = GameRng::new(123);
        let path = find_path(&map, StationId::from_raw(1), StationId::from_raw(3), &mut rng);
        assert_eq!(path, None);
    }

    #[test]
    fn depth_bound_stops_long_walks() {
        // 25 hops needed, which exceeds the 20-hop bound.
        let map = make_chain(26);
        let mut rng = GameRng::new(9);
        let path = find_path(&map, StationId::from_raw(1), StationId::from_raw(26), &mut rng);
        assert_eq!(path, None);
    }

    #[test]
    fn walks_within_depth_bound_succeed() {
        // Exactly 20 hops: the last permitted step reaches the destination.
        let map = make_chain(21);
        let mut rng = GameRng::new(9);
        let path = find_path(&map, StationId::from_raw(1), StationId::from_raw(21), &mut rng);
        assert_eq!(path.map(|p| p.len()), Some(21));
    }

    #[test]
    fn identical_seeds_walk_identically() {
        // A branching graph: 1 -> {2, 3}, 2 -> 4, 3 -> 4.
        let mut map = make_chain(1);
        for id in 2..=4 {
            map.add_station(make_station(id)).unwrap();
        }
        map.add_hop(make_hop(10, 1, 2)).unwrap();
        map.add_hop(make_hop(11, 1, 3)).unwrap();
        map.add_hop(make_hop(12, 2, 4)).unwrap();
        map.add_hop(make_hop(13, 3, 4)).unwrap();

        let mut left = GameRng::new(0xABCD);
        let mut right = GameRng::new(0xABCD);
        let first = find_path(&map, StationId::from_raw(1), StationId::from_raw(4), &mut left);
        let second = find_path(&map, StationId::from_raw(1), StationId::from_raw(4), &mut right);
        assert_eq!(first, second);
        assert_eq!(left.seed(), right.seed());
    }

    #[test]
    fn scripted_draws_choose_the_branch() {
        // 1 -> {2 (hop 10), 3 (hop 11)}; a low draw picks hop 10.
        let mut map = make_chain(1);
        map.add_station(make_station(2)).unwrap();
        map.add_station(make_station(3)).unwrap();
        map.add_hop(make_hop(10, 1, 2)).unwrap();
        map.add_hop(make_hop(11, 1, 3)).unwrap();

        let mut low = ScriptedRng::new(vec![0.0], 1);
        assert_eq!(
            find_path(&map, StationId::from_raw(1), StationId::from_raw(2), &mut low),
            Some(vec![StationId::from_raw(1), StationId::from_raw(2)]),
        );

        let mut high = ScriptedRng::new(vec![0.9], 1);
        assert_eq!(
            find_path(&map, StationId::from_raw(1), StationId::from_raw(3), &mut high),
            Some(vec![StationId::from_raw(1), StationId::from_raw(3)]),
        );
    }
}
