//! Turn cycle and phase logic for the Headway simulation.
//!
//! This crate owns the deterministic turn that drives a game: weather,
//! hazards, trains, then agents (with combat), each drawing in a fixed
//! order from the game's persisted seed. [`turn::run_turn`] takes a full
//! [`GameSnapshot`] plus a draw source and produces the committed-ready
//! snapshot for the same turn on every machine, every time.
//!
//! # Modules
//!
//! - [`agent`] -- Agent phase: riding, alighting, boarding, route choice.
//! - [`combat`] -- Stunts, melee, and respawn resolution.
//! - [`config`] -- Configuration loading from `headway.yaml` into
//!   strongly-typed structs.
//! - [`context`] -- [`TurnContext`]: the mutable working state of one turn.
//! - [`error`] -- [`TurnError`]: the ways a whole turn can fail.
//! - [`hazard`] -- Hazard phase: stochastic spawn and clean-up.
//! - [`starting_game`] -- The seeded demo game snapshot.
//! - [`train`] -- Train phase: movement, holds, arrivals, departures.
//! - [`turn`] -- The turn orchestrator.
//! - [`weather`] -- Weather phase: sky transitions and lightning.
//!
//! [`GameSnapshot`]: headway_types::GameSnapshot
//! [`TurnContext`]: context::TurnContext
//! [`TurnError`]: error::TurnError

pub mod agent;
pub mod combat;
pub mod config;
pub mod context;
pub mod error;
pub mod hazard;
pub mod starting_game;
pub mod train;
pub mod turn;
pub mod weather;
