//! Error types for the `headway-network` crate.
//!
//! Only the explicit `add_*` builders return these; the snapshot-load path
//! (`NetworkMap::from_parts`) follows the missing-reference policy instead,
//! skipping bad hops with a diagnostic.

use headway_types::{HopId, LineId, StationId};

/// Errors that can occur while building the network graph.
#[derive(Debug, thiserror::Error)]
pub enum NetworkError {
    /// A duplicate station was inserted where uniqueness is required.
    #[error("duplicate station id: {0}")]
    DuplicateStation(StationId),

    /// A duplicate line was inserted where uniqueness is required.
    #[error("duplicate line id: {0}")]
    DuplicateLine(LineId),

    /// A duplicate hop was inserted where uniqueness is required.
    #[error("duplicate hop id: {0}")]
    DuplicateHop(HopId),

    /// A hop references a station that is not in the graph.
    #[error("hop {hop} references unknown station {station}")]
    UnknownStation {
        /// The hop carrying the reference.
        hop: HopId,
        /// The unresolvable station.
        station: StationId,
    },

    /// A hop references a line that is not in the graph.
    #[error("hop {hop} references unknown line {line}")]
    UnknownLine {
        /// The hop carrying the reference.
        hop: HopId,
        /// The unresolvable line.
        line: LineId,
    },
}
