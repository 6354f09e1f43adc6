use tracing::{debug, info, warn};

use crate::db::results::{InsertOutcome, ResultStore};
use crate::error::Result;
use crate::types::{GameResult, RowError, WriteStats};

/// Persists validated results exactly once per natural key.
/// Re-running a batch is harmless: existing keys are skipped, and a
/// missing identifier on a stored result is filled in.
pub struct ResultWriter {
    store: ResultStore,
}

impl ResultWriter {
    pub fn new(store: ResultStore) -> Self {
        Self { store }
    }

    /// Write every game in order. A failing row is recorded and skipped;
    /// an infrastructure failure aborts the batch.
    pub async fn write_batch(&self, games: &[GameResult]) -> Result<WriteStats> {
        let mut stats = WriteStats::default();

        for game in games {
            match self.write_one(game, &mut stats).await {
                Ok(()) => {}
                Err(e) if e.is_infrastructure() => return Err(e),
                Err(e) => {
                    warn!(game = %game.key, "Result write failed: {e}");
                    stats.errors.push(RowError {
                        key: game.key.to_string(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        info!(
            inserted = stats.inserted,
            skipped_duplicate = stats.skipped_duplicate,
            backfilled = stats.backfilled,
            errors = stats.errors.len(),
            "Result batch written"
        );
        Ok(stats)
    }

    async fn write_one(&self, game: &GameResult, stats: &mut WriteStats) -> Result<()> {
        if let Some(stored) = self.store.find(&game.key).await? {
            self.settle_duplicate(game, stored.id, stored.game_id.as_deref(), stats)
                .await?;
            return Ok(());
        }

        match self.store.insert(game).await? {
            InsertOutcome::Inserted => {
                debug!(game = %game.key, game_id = ?game.game_id, home_win = game.home_win(), "Result inserted");
                stats.inserted += 1;
            }
            InsertOutcome::AlreadyPresent => {
                // Lost a race with another writer after the existence check.
                let stored = self.store.find(&game.key).await?;
                match stored {
                    Some(s) => {
                        self.settle_duplicate(game, s.id, s.game_id.as_deref(), stats)
                            .await?
                    }
                    None => stats.skipped_duplicate += 1,
                }
            }
        }
        Ok(())
    }

    async fn settle_duplicate(
        &self,
        game: &GameResult,
        stored_id: i64,
        stored_game_id: Option<&str>,
        stats: &mut WriteStats,
    ) -> Result<()> {
        stats.skipped_duplicate += 1;
        match (stored_game_id, game.game_id.as_deref()) {
            (None, Some(new_id)) => {
                if self.store.backfill_game_id(stored_id, new_id).await? {
                    info!(game = %game.key, game_id = new_id, "Identifier backfilled on stored result");
                    stats.backfilled += 1;
                }
            }
            (Some(old), Some(new_id)) if old != new_id => {
                warn!(
                    game = %game.key,
                    stored = old,
                    candidate = new_id,
                    "Stored result carries a different identifier; keeping stored"
                );
            }
            _ => {}
        }
        Ok(())
    }
}
