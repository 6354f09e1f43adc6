use std::collections::hash_map::Entry;
use std::collections::HashMap;

use tracing::{debug, info, warn};

use crate::db::forecasts::ForecastStore;
use crate::db::results::ResultStore;
use crate::error::Result;
use crate::reconcile::merge::{merge_row, Outcome};
use crate::types::ReconcileStats;

/// Rebuilds the forecast relation with actual outcomes and bet correctness
/// merged in from the stored results.
pub struct ReconciliationCompiler {
    forecasts: ForecastStore,
    results: ResultStore,
}

impl ReconciliationCompiler {
    pub fn new(forecasts: ForecastStore, results: ResultStore) -> Self {
        Self { forecasts, results }
    }

    pub async fn run(&self) -> Result<ReconcileStats> {
        let (outcomes, mut conflicts) = self.outcomes_by_identifier().await?;
        let rows = self.forecasts.load_all().await?;

        let mut stats = ReconcileStats {
            rows_scanned: rows.len(),
            ..Default::default()
        };
        let mut changed = Vec::new();

        for existing in &rows {
            let outcome = existing.game_id.as_deref().and_then(|id| outcomes.get(id));
            let merged = merge_row(existing, outcome);

            for c in &merged.conflicts {
                warn!(
                    forecast_id = existing.forecast_id,
                    field = c.field,
                    stored = %c.stored,
                    derived = %c.derived,
                    "Stored value disagrees with result; keeping stored value"
                );
            }
            conflicts += merged.conflicts.len();

            if merged.changed() {
                if merged.actuals_filled {
                    stats.rows_reconciled += 1;
                }
                stats.correctness_filled += merged.correctness_filled;
                changed.push(merged.row);
            }
        }
        stats.conflicts = conflicts;

        if changed.is_empty() {
            debug!(rows = stats.rows_scanned, "Nothing to reconcile");
            return Ok(stats);
        }

        self.forecasts.replace_with(&changed).await?;
        stats.swapped = true;

        info!(
            rows_scanned = stats.rows_scanned,
            rows_reconciled = stats.rows_reconciled,
            correctness_filled = stats.correctness_filled,
            conflicts = stats.conflicts,
            "Forecast table rebuilt"
        );
        Ok(stats)
    }

    /// Index identified results. When two results share an identifier but
    /// disagree on the score, the earliest stored one is used.
    async fn outcomes_by_identifier(&self) -> Result<(HashMap<String, Outcome>, usize)> {
        let mut index: HashMap<String, Outcome> = HashMap::new();
        let mut conflicts = 0usize;

        for r in self.results.identified().await? {
            let Some(game_id) = r.game_id.clone() else {
                continue;
            };
            let outcome = Outcome::from(&r);
            match index.entry(game_id) {
                Entry::Vacant(slot) => {
                    slot.insert(outcome);
                }
                Entry::Occupied(kept) if *kept.get() != outcome => {
                    warn!(
                        game_id = %kept.key(),
                        result_id = r.id,
                        kept = ?kept.get(),
                        ignored = ?outcome,
                        "Identifier shared by results with different scores"
                    );
                    conflicts += 1;
                }
                Entry::Occupied(_) => {}
            }
        }
        Ok((index, conflicts))
    }
}
