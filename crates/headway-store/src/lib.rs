//! `PostgreSQL` persistence layer for the Headway simulation.
//!
//! The committed snapshot is the only authoritative game state. Each turn
//! the engine loads a full [`GameSnapshot`], mutates it in memory, and
//! commits the result plus the turn's messages in one transaction; a failed
//! commit leaves the previous snapshot in place and the turn reruns from it.
//!
//! ```text
//! Scheduler pass
//!     |
//!     +-- list_unfinished_games() --> game ids
//!     |
//!     per game:
//!     +-- SnapshotStore::load_snapshot() --> GameSnapshot
//!     +-- (headway-sim runs the turn)
//!     +-- commit_turn()                  --> one transaction
//! ```
//!
//! # Modules
//!
//! - [`commit`] -- Transactional turn commit and game import
//! - [`error`] -- Shared error types
//! - [`postgres`] -- `PostgreSQL` connection pool and configuration
//! - [`snapshot`] -- Snapshot loading and the scheduler's game list
//!
//! [`GameSnapshot`]: headway_types::GameSnapshot

pub mod commit;
pub mod error;
pub mod postgres;
pub mod snapshot;

// Re-export primary types for convenience.
pub use commit::{commit_turn, insert_snapshot};
pub use error::StoreError;
pub use postgres::{PostgresConfig, PostgresPool};
pub use snapshot::SnapshotStore;
