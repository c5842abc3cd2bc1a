//! Network graph: stations as nodes, hops as directed line-scoped edges.
//!
//! The [`NetworkMap`] is the read-only spatial backbone of one turn. It is
//! rebuilt from the snapshot at turn start and answers every topology
//! question the phases ask: outgoing hops per station, departure candidates
//! per line, terminal stations, adjacency.
//!
//! Internally an adjacency map indexes outgoing hops per head station:
//! `BTreeMap<StationId, Vec<HopId>>`, each list in ascending hop-id order so
//! uniform picks over it are reproducible.

use std::collections::BTreeMap;

use headway_types::{Hop, HopId, Line, LineId, Station, StationId};

use crate::error::NetworkError;

/// The network graph holding all stations, lines, and hops of one game.
#[derive(Debug, Clone)]
pub struct NetworkMap {
    /// All stations indexed by their identifier.
    stations: BTreeMap<StationId, Station>,
    /// All lines indexed by their identifier.
    lines: BTreeMap<LineId, Line>,
    /// All hops indexed by their identifier.
    hops: BTreeMap<HopId, Hop>,
    /// Outgoing adjacency: station -> hop ids departing from it, ascending.
    outgoing: BTreeMap<StationId, Vec<HopId>>,
}

impl NetworkMap {
    /// Create an empty network map.
    pub const fn new() -> Self {
        Self {
            stations: BTreeMap::new(),
            lines: BTreeMap::new(),
            hops: BTreeMap::new(),
            outgoing: BTreeMap::new(),
        }
    }

    /// Build a map from snapshot lists, skipping unresolvable hops.
    ///
    /// A hop whose endpoints or line cannot be resolved is dropped for the
    /// turn with a `warn!` diagnostic (missing-reference policy); the turn
    /// continues without it. Duplicate ids keep the first occurrence.
    pub fn from_parts(stations: &[Station], lines: &[Line], hops: &[Hop]) -> Self {
        let mut map = Self::new();
        for station in stations {
            if let Err(error) = map.add_station(station.clone()) {
                tracing::warn!(station_id = %station.id, %error, "skipping station");
            }
        }
        for line in lines {
            if let Err(error) = map.add_line(line.clone()) {
                tracing::warn!(line_id = %line.id, %error, "skipping line");
            }
        }
        for hop in hops {
            if let Err(error) = map.add_hop(hop.clone()) {
                tracing::warn!(hop_id = %hop.id, %error, "skipping hop");
            }
        }
        map
    }

    // -------------------------------------------------------------------
    // Station operations
    // -------------------------------------------------------------------

    /// Add a station to the map.
    ///
    /// # Errors
    ///
    /// Returns [`NetworkError::DuplicateStation`] if the id already exists.
    pub fn add_station(&mut self, station: Station) -> Result<(), NetworkError> {
        let id = station.id;
        if self.stations.contains_key(&id) {
            return Err(NetworkError::DuplicateStation(id));
        }
        self.stations.insert(id, station);
        self.outgoing.entry(id).or_default();
        Ok(())
    }

    /// Get a station by id.
    pub fn station(&self, id: StationId) -> Option<&Station> {
        self.stations.get(&id)
    }

    /// Number of stations in the map.
    pub fn station_count(&self) -> usize {
        self.stations.len()
    }

    /// Iterate stations in ascending id order.
    pub fn stations(&self) -> impl Iterator<Item = &Station> {
        self.stations.values()
    }

    /// Ids of all `start` stations, ascending.
    pub fn start_stations(&self) -> Vec<StationId> {
        self.stations
            .values()
            .filter(|station| station.is_start)
            .map(|station| station.id)
            .collect()
    }

    /// Ids of all `end` stations, ascending.
    pub fn end_stations(&self) -> Vec<StationId> {
        self.stations
            .values()
            .filter(|station| station.is_end)
            .map(|station| station.id)
            .collect()
    }

    /// The lowest-id `end` station: the canonical destination for agents.
    pub fn first_end_station(&self) -> Option<StationId> {
        self.stations
            .values()
            .find(|station| station.is_end)
            .map(|station| station.id)
    }

    // -------------------------------------------------------------------
    // Line operations
    // -------------------------------------------------------------------

    /// Add a line to the map.
    ///
    /// # Errors
    ///
    /// Returns [`NetworkError::DuplicateLine`] if the id already exists.
    pub fn add_line(&mut self, line: Line) -> Result<(), NetworkError> {
        let id = line.id;
        if self.lines.contains_key(&id) {
            return Err(NetworkError::DuplicateLine(id));
        }
        self.lines.insert(id, line);
        Ok(())
    }

    /// Get a line by id.
    pub fn line(&self, id: LineId) -> Option<&Line> {
        self.lines.get(&id)
    }

    /// Number of lines in the map.
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    // -------------------------------------------------------------------
    // Hop operations
    // -------------------------------------------------------------------

    /// Add a hop to the map.
    ///
    /// Both endpoints and the owning line must already exist.
    ///
    /// # Errors
    ///
    /// Returns [`NetworkError::UnknownStation`], [`NetworkError::UnknownLine`],
    /// or [`NetworkError::DuplicateHop`].
    pub fn add_hop(&mut self, hop: Hop) -> Result<(), NetworkError> {
        if !self.stations.contains_key(&hop.head_id) {
            return Err(NetworkError::UnknownStation { hop: hop.id, station: hop.head_id });
        }
        if !self.stations.contains_key(&hop.tail_id) {
            return Err(NetworkError::UnknownStation { hop: hop.id, station: hop.tail_id });
        }
        if !self.lines.contains_key(&hop.line_id) {
            return Err(NetworkError::UnknownLine { hop: hop.id, line: hop.line_id });
        }
        if self.hops.contains_key(&hop.id) {
            return Err(NetworkError::DuplicateHop(hop.id));
        }

        let id = hop.id;
        let head = hop.head_id;
        self.hops.insert(id, hop);
        let departures = self.outgoing.entry(head).or_default();
        departures.push(id);
        departures.sort_unstable();
        Ok(())
    }

    /// Get a hop by id.
    pub fn hop(&self, id: HopId) -> Option<&Hop> {
        self.hops.get(&id)
    }

    /// Number of hops in the map.
    pub fn hop_count(&self) -> usize {
        self.hops.len()
    }

    /// Iterate hops in ascending id order.
    pub fn hops(&self) -> impl Iterator<Item = &Hop> {
        self.hops.values()
    }

    // -------------------------------------------------------------------
    // Graph queries
    // -------------------------------------------------------------------

    /// Hop ids departing a station, in ascending id order.
    pub fn outgoing_hops(&self, station: StationId) -> &[HopId] {
        self.outgoing.get(&station).map_or(&[], Vec::as_slice)
    }

    /// Hop ids departing a station on one line, in ascending id order.
    ///
    /// These are the departure candidates for a train of that line.
    pub fn outgoing_hops_on_line(&self, station: StationId, line: LineId) -> Vec<HopId> {
        self.outgoing_hops(station)
            .iter()
            .copied()
            .filter(|hop_id| {
                self.hops
                    .get(hop_id)
                    .is_some_and(|hop| hop.line_id == line)
            })
            .collect()
    }

    /// Whether a hop on `line` connects `head` directly to `tail`.
    ///
    /// This is the "next-hop edge consistent with the predicted path" check
    /// agents make before staying aboard.
    pub fn connects_on_line(&self, head: StationId, tail: StationId, line: LineId) -> bool {
        self.outgoing_hops(head).iter().any(|hop_id| {
            self.hops
                .get(hop_id)
                .is_some_and(|hop| hop.tail_id == tail && hop.line_id == line)
        })
    }

    /// Stations directly reachable from a station, ascending, deduplicated.
    pub fn adjacent_stations(&self, station: StationId) -> Vec<StationId> {
        let mut tails: Vec<StationId> = self
            .outgoing_hops(station)
            .iter()
            .filter_map(|hop_id| self.hops.get(hop_id))
            .map(|hop| hop.tail_id)
            .collect();
        tails.sort_unstable();
        tails.dedup();
        tails
    }

    /// Stations reachable via any hop of a line, ascending, deduplicated,
    /// excluding `from`. Boarding intent draws its target from this list.
    pub fn line_destinations(&self, line: LineId, from: StationId) -> Vec<StationId> {
        let mut tails: Vec<StationId> = self
            .hops
            .values()
            .filter(|hop| hop.line_id == line)
            .map(|hop| hop.tail_id)
            .filter(|tail| *tail != from)
            .collect();
        tails.sort_unstable();
        tails.dedup();
        tails
    }
}

impl Default for NetworkMap {
    fn default() -> Self {
        Self::new()
    }
}
