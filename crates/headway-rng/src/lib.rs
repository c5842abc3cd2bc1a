//! Deterministic randomness for the Headway turn engine.
//!
//! The persisted 32-bit game seed is the sole entropy source of a turn.
//! This crate owns the fixed mixing function that advances it, the
//! [`DrawSource`] seam the phases draw through, and the dice roller that
//! combat and weather use for damage and checks.
//!
//! # Modules
//!
//! - [`seed`] -- the `draw(seed)` step, [`GameRng`], [`ScriptedRng`]
//! - [`dice`] -- dice-notation parsing and rolling

pub mod dice;
pub mod seed;

// Re-export all public types at crate root for convenience.
pub use dice::{DiceError, DiceRoll, RolledDie, roll, roll_with};
pub use seed::{DrawSource, GameRng, ScriptedRng, ZERO_SEED_FALLBACK, draw};
