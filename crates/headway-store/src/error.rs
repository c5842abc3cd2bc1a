//! Error types for the persistence layer.
//!
//! All errors are propagated via [`StoreError`], which wraps the underlying
//! [`sqlx`] errors and adds typed variants for the decode failures the
//! engine cares about: a missing game, and a column whose stored value no
//! longer maps onto the in-memory types.

use headway_types::GameId;

/// Errors that can occur in the persistence layer.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A `PostgreSQL` operation failed.
    #[error("PostgreSQL error: {0}")]
    Postgres(#[from] sqlx::Error),

    /// A `PostgreSQL` migration failed.
    #[error("PostgreSQL migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// No game row exists for the requested id.
    #[error("game {game_id} not found")]
    GameNotFound {
        /// The id that matched no game row.
        game_id: GameId,
    },

    /// A stored value does not decode into the in-memory representation.
    ///
    /// Covers enum text that matches no variant and numeric columns outside
    /// the target type's range. Names the column so the offending row can
    /// be found without a debugger.
    #[error("cannot decode {table}.{column} value {value:?}")]
    Decode {
        /// Table the value came from.
        table: &'static str,
        /// Column the value came from.
        column: &'static str,
        /// The stored value, rendered as text.
        value: String,
    },

    /// A configuration error (bad connection URL and the like).
    #[error("configuration error: {0}")]
    Config(String),
}
