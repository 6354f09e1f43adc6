use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::NaiveDate;
use tracing::{debug, warn};

use crate::db::forecasts::ForecastStore;
use crate::error::{AmbiguousMatch, AppError, Result};
use crate::normalize::TeamNormalizer;
use crate::types::{GameResult, MatchStats, Sport};

/// Attaches forecast identifiers to game results by (date, home, away).
pub struct GameIdentityMatcher<'a> {
    forecasts: &'a ForecastStore,
    normalizer: &'a TeamNormalizer,
}

impl<'a> GameIdentityMatcher<'a> {
    pub fn new(forecasts: &'a ForecastStore, normalizer: &'a TeamNormalizer) -> Self {
        Self { forecasts, normalizer }
    }

    /// Fill `game_id` on every game that has exactly one forecast identifier.
    ///
    /// Games already carrying an identifier are left alone. If any game maps
    /// to more than one identifier, nothing is assigned and every ambiguous
    /// game is reported.
    pub async fn annotate(&self, sport: Sport, games: &mut [GameResult]) -> Result<MatchStats> {
        let dates: BTreeSet<NaiveDate> = games
            .iter()
            .filter(|g| g.game_id.is_none())
            .map(|g| g.key.date)
            .collect();

        let mut by_date = HashMap::new();
        for date in dates {
            by_date.insert(date, self.index_for_date(sport, date).await?);
        }

        let mut assignments: Vec<Option<String>> = Vec::with_capacity(games.len());
        let mut ambiguous = Vec::new();
        let mut stats = MatchStats::default();

        for game in games.iter() {
            if game.game_id.is_some() {
                stats.matched += 1;
                assignments.push(None);
                continue;
            }
            let candidates = by_date
                .get(&game.key.date)
                .and_then(|index| index.get(&(game.key.home_team.clone(), game.key.away_team.clone())));

            match candidates {
                Some(ids) if ids.len() == 1 => {
                    stats.matched += 1;
                    assignments.push(ids.iter().next().cloned());
                }
                Some(ids) if ids.len() > 1 => {
                    ambiguous.push(AmbiguousMatch {
                        key: game.key.clone(),
                        identifiers: ids.iter().cloned().collect(),
                    });
                    assignments.push(None);
                }
                _ => {
                    debug!(game = %game.key, "No forecast for game");
                    stats.unmatched += 1;
                    assignments.push(None);
                }
            }
        }

        if !ambiguous.is_empty() {
            for a in &ambiguous {
                warn!(game = %a.key, identifiers = ?a.identifiers, "Ambiguous forecast match");
            }
            return Err(AppError::AmbiguousMatch(ambiguous));
        }

        for (game, id) in games.iter_mut().zip(assignments) {
            if let Some(id) = id {
                game.game_id = Some(id);
            }
        }
        Ok(stats)
    }

    /// Forecast identifiers for one date, keyed by canonical (home, away).
    async fn index_for_date(
        &self,
        sport: Sport,
        date: NaiveDate,
    ) -> Result<BTreeMap<(String, String), BTreeSet<String>>> {
        let mut index: BTreeMap<(String, String), BTreeSet<String>> = BTreeMap::new();
        for row in self.forecasts.identities_for_date(sport, date).await? {
            let home = self.normalizer.canonicalize(sport, &row.home_team).into_string();
            let away = self.normalizer.canonicalize(sport, &row.away_team).into_string();
            index.entry((home, away)).or_default().insert(row.game_id);
        }
        Ok(index)
    }
}
