//! Headway engine binary.
//!
//! Boots the persistence layer, imports the demo game into an empty
//! store, and then drives every unfinished game turn by turn on the
//! configured interval. `RUST_LOG` controls log verbosity; `HEADWAY_CONFIG`
//! points at an alternate YAML config file.

mod error;
mod scheduler;

use std::time::Duration;

use headway_sim::config::EngineConfig;
use headway_sim::starting_game::create_starting_game;
use headway_store::{PostgresConfig, PostgresPool, SnapshotStore, insert_snapshot};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::error::EngineError;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    info!("Starting Headway engine");
    run().await?;
    info!("Engine stopped");
    Ok(())
}

/// Startup sequence and scheduler loop.
async fn run() -> Result<(), EngineError> {
    // 2. Load configuration.
    let config = EngineConfig::load()?;
    info!(
        interval_seconds = config.scheduler.interval_seconds,
        max_turns = config.scheduler.max_turns,
        seed_demo = config.seed_demo,
        "Configuration loaded"
    );

    // 3. Connect to PostgreSQL and apply migrations.
    let postgres = PostgresConfig::new(&config.database.url)
        .with_max_connections(config.database.max_connections)
        .with_connect_timeout(Duration::from_secs(config.database.connect_timeout_seconds));
    let pool = PostgresPool::connect(&postgres).await?;
    pool.run_migrations().await?;

    // 4. Import the demo game when the store holds no games at all.
    if config.seed_demo {
        seed_demo_game(&pool).await?;
    }

    // 5. Drive games turn by turn until the pass limit (if any) is hit.
    scheduler::run(&pool, &config.scheduler).await;

    pool.close().await;
    Ok(())
}

/// Import the built-in demo game, stamped with a fresh random seed so
/// separate deployments do not replay identical histories.
async fn seed_demo_game(pool: &PostgresPool) -> Result<(), EngineError> {
    let store = SnapshotStore::new(pool.pool());
    if store.has_games().await? {
        return Ok(());
    }

    let mut snapshot = create_starting_game();
    snapshot.game.current_seed = rand::random::<u32>();
    insert_snapshot(pool.pool(), &snapshot).await?;
    info!(
        game_id = snapshot.game.id.into_inner(),
        seed = snapshot.game.current_seed,
        "Imported demo game with a fresh seed"
    );
    Ok(())
}
