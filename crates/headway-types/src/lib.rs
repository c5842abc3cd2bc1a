//! Shared type definitions for the Headway simulation.
//!
//! This crate is the single source of truth for all types used across the
//! Headway workspace. It carries data and invariant-preserving accessors
//! only; turn rules live in `headway-sim`.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe integer-key wrappers for all entity identifiers
//! - [`enums`] -- Closed enumerations (weather, hazard catalog, stunts, kinds)
//! - [`entities`] -- Core entity structs and the tagged location variants
//! - [`snapshot`] -- Per-turn snapshot, narrative message, turn summary

pub mod entities;
pub mod enums;
pub mod ids;
pub mod snapshot;

// Re-export all public types at crate root for convenience.
pub use entities::{
    Agent, AgentLocation, Game, Hazard, Hop, Item, Line, Station, Train, TrainLocation,
};
pub use enums::{HazardKind, ItemKind, MessageKind, Stunt, Weather};
pub use ids::{AgentId, GameId, HazardId, HopId, ItemId, LineId, StationId, TrainId};
pub use snapshot::{GameSnapshot, Message, TurnSummary};
