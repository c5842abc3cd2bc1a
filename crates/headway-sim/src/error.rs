//! Error types for turn execution.

use headway_rng::DiceError;
use headway_types::GameId;

/// Errors that abort a turn.
///
/// Any of these means the in-memory context must be discarded whole; the
/// previously committed snapshot stays authoritative and the external
/// scheduler decides whether to retry. Degraded per-entity conditions
/// (missing references, exhausted path searches) are *not* errors -- the
/// phases skip those entities and keep going.
#[derive(Debug, thiserror::Error)]
pub enum TurnError {
    /// The game is already finished; the scheduler should have filtered it.
    #[error("game {game_id} is already finished")]
    GameFinished {
        /// The game the turn was requested for.
        game_id: GameId,
    },

    /// The turn counter cannot advance any further.
    #[error("turn counter overflow for game {game_id}")]
    TurnOverflow {
        /// The game whose counter is exhausted.
        game_id: GameId,
    },

    /// The in-world clock cannot advance by the configured turn length.
    #[error("clock overflow for game {game_id} advancing by {turn_seconds}s")]
    ClockOverflow {
        /// The game whose clock is exhausted.
        game_id: GameId,
        /// The per-turn advance that failed.
        turn_seconds: i64,
    },

    /// A dice notation string failed to parse or evaluate.
    ///
    /// This is a content bug (for example a malformed weapon damage
    /// string), so the turn aborts rather than degrades.
    #[error("dice roll failed: {source}")]
    Dice {
        /// The underlying dice error.
        #[from]
        source: DiceError,
    },
}
