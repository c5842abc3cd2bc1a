//! Error types for the engine binary.

use thiserror::Error;

/// Errors surfaced by the scheduler and the startup sequence.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Configuration could not be loaded or parsed.
    #[error("configuration error: {source}")]
    Config {
        /// Underlying configuration error.
        #[from]
        source: headway_sim::config::ConfigError,
    },

    /// A database read or write failed.
    #[error("store error: {source}")]
    Store {
        /// Underlying persistence error.
        #[from]
        source: headway_store::StoreError,
    },

    /// A turn could not be simulated.
    #[error("turn error: {source}")]
    Turn {
        /// Underlying simulation error.
        #[from]
        source: headway_sim::error::TurnError,
    },
}
