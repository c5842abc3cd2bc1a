//! Type-safe identifier wrappers around `i64` keys.
//!
//! Every entity in the simulation has a strongly-typed ID to prevent
//! accidental mixing of identifiers at compile time. Keys are plain 64-bit
//! integers assigned by whoever authors a snapshot (the demo seeder, an
//! import); the engine itself only allocates hazard ids for mid-turn
//! spawns.

use serde::{Deserialize, Serialize};

/// Generates a newtype wrapper around `i64` with standard derives.
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default,
            Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl $name {
            /// Wrap a raw database key.
            pub const fn from_raw(raw: i64) -> Self {
                Self(raw)
            }

            /// Return the inner `i64` key.
            pub const fn into_inner(self) -> i64 {
                self.0
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i64> for $name {
            fn from(raw: i64) -> Self {
                Self(raw)
            }
        }

        impl From<$name> for i64 {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_id! {
    /// Unique identifier for a game (one simulation instance).
    GameId
}

define_id! {
    /// Unique identifier for a station (node in the hop graph).
    StationId
}

define_id! {
    /// Unique identifier for a line (a named service grouping hops and trains).
    LineId
}

define_id! {
    /// Unique identifier for a hop (directed edge in the hop graph).
    HopId
}

define_id! {
    /// Unique identifier for a train.
    TrainId
}

define_id! {
    /// Unique identifier for an agent.
    AgentId
}

define_id! {
    /// Unique identifier for a hazard blocking a hop.
    HazardId
}

define_id! {
    /// Unique identifier for an item carried by an agent.
    ItemId
}
