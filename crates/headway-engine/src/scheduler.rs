//! The scheduler loop: one pass runs one turn for every unfinished game.
//!
//! A game whose turn fails is logged and skipped for the rest of the pass.
//! Its committed seed is untouched, so the next pass replays the exact
//! same turn; a transient database fault cannot fork the draw stream.

use std::time::Duration;

use headway_rng::GameRng;
use headway_sim::config::SchedulerConfig;
use headway_sim::turn::run_turn;
use headway_store::{PostgresPool, SnapshotStore, commit_turn};
use headway_types::GameId;
use tracing::{debug, error, info};

use crate::error::EngineError;

/// Run scheduler passes until `max_turns` is reached (forever when zero).
///
/// Pass-level failures, such as the unfinished-game listing itself, are
/// logged and retried on the next pass rather than aborting the engine.
pub async fn run(pool: &PostgresPool, config: &SchedulerConfig) {
    let interval = Duration::from_secs(config.interval_seconds);
    let mut passes: u64 = 0;

    loop {
        if let Err(error) = run_pass(pool).await {
            error!(error = %error, "Scheduler pass failed; retrying next pass");
        }

        passes = passes.saturating_add(1);
        if config.max_turns > 0 && passes >= config.max_turns {
            info!(passes, "Reached configured pass limit; stopping scheduler");
            return;
        }

        tokio::time::sleep(interval).await;
    }
}

/// One pass: list the unfinished games and run a turn for each.
async fn run_pass(pool: &PostgresPool) -> Result<(), EngineError> {
    let store = SnapshotStore::new(pool.pool());
    let game_ids = store.list_unfinished_games().await?;
    if game_ids.is_empty() {
        debug!("No unfinished games; idle pass");
        return Ok(());
    }

    for game_id in game_ids {
        if let Err(error) = run_game_turn(pool, game_id).await {
            error!(
                game_id = game_id.into_inner(),
                error = %error,
                "Turn failed; game retries next pass"
            );
        }
    }

    Ok(())
}

/// Load one game, simulate its next turn, and commit the result.
async fn run_game_turn(pool: &PostgresPool, game_id: GameId) -> Result<(), EngineError> {
    let store = SnapshotStore::new(pool.pool());
    let snapshot = store.load_snapshot(game_id).await?;

    let mut rng = GameRng::new(snapshot.game.current_seed);
    let outcome = run_turn(snapshot, &mut rng)?;

    commit_turn(pool.pool(), &outcome.snapshot, &outcome.messages).await?;

    let summary = &outcome.summary;
    info!(
        game_id = game_id.into_inner(),
        turn = summary.turn_number,
        weather = summary.weather.as_str(),
        hazards = summary.live_hazards,
        messages = summary.messages,
        finished = summary.finished,
        "Turn committed"
    );
    Ok(())
}
