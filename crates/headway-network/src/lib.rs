//! The subway graph for the Headway simulation.
//!
//! This crate models the network an engine turn runs against: stations as
//! nodes, directed hops as edges (each owned by a line), with adjacency
//! queries and a randomized path estimator. It holds no simulation state of
//! its own; trains, agents, and hazards live in `headway-types` and reference
//! the graph by id.
//!
//! # Modules
//!
//! - [`error`] -- Error types for graph construction.
//! - [`map`] -- [`NetworkMap`]: id-indexed stations, lines, and hops with
//!   precomputed outgoing adjacency and line-aware queries.
//! - [`walk`] -- Bounded random-walk path estimation ([`find_path`]).
//!
//! [`NetworkMap`]: map::NetworkMap
//! [`find_path`]: walk::find_path

pub mod error;
pub mod map;
pub mod walk;

// Re-export primary types at crate root.
pub use error::NetworkError;
pub use map::NetworkMap;
pub use walk::find_path;
