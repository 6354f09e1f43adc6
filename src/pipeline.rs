use std::collections::HashMap;

use chrono::{NaiveDate, Utc};
use sqlx::SqlitePool;
use tracing::{error, info, warn};

use crate::config::RUN_LOCK_NAME;
use crate::db::forecasts::ForecastStore;
use crate::db::lock::RunLock;
use crate::db::models::GameResultRow;
use crate::db::results::ResultStore;
use crate::db::writer::ResultWriter;
use crate::error::{AppError, Result};
use crate::matcher::GameIdentityMatcher;
use crate::normalize::TeamNormalizer;
use crate::reconcile::ReconciliationCompiler;
use crate::source::GameSource;
use crate::types::{GameResult, NaturalKey, ReconcileStats, RowError, RunSummary, Sport};

/// Runs fetch → validate → match → write → reconcile for one sport and date,
/// holding the run lock for the whole pass.
pub struct Reconciler {
    pool: SqlitePool,
    normalizer: TeamNormalizer,
    lock_stale_secs: u64,
}

impl Reconciler {
    pub fn new(pool: SqlitePool, lock_stale_secs: u64) -> Self {
        Self {
            pool,
            normalizer: TeamNormalizer::new(),
            lock_stale_secs,
        }
    }

    pub async fn collect_and_reconcile(
        &self,
        source: &dyn GameSource,
        sport: Sport,
        date: NaiveDate,
    ) -> Result<RunSummary> {
        let lock = self.lock();
        let guard = lock.acquire().await?;
        let outcome = self.collect(source, sport, date).await;
        release(guard).await;
        outcome
    }

    /// Run every date in `from..=to` for one sport, oldest first. A failed
    /// date is kept in the output and the range carries on, unless the
    /// failure means no later date can succeed either.
    pub async fn collect_range(
        &self,
        source: &dyn GameSource,
        sport: Sport,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<(NaiveDate, Result<RunSummary>)>> {
        if from > to {
            return Err(AppError::BadRequest(format!("range starts {from}, after its end {to}")));
        }

        let mut runs = Vec::new();
        for date in from.iter_days().take_while(|d| *d <= to) {
            let outcome = self.collect_and_reconcile(source, sport, date).await;
            let fatal = match &outcome {
                Ok(_) => false,
                Err(e) => {
                    warn!(sport = %sport, date = %date, "Run failed: {e}");
                    e.is_infrastructure() || matches!(e, AppError::RunInProgress { .. })
                }
            };
            runs.push((date, outcome));
            if fatal {
                break;
            }
        }
        Ok(runs)
    }

    /// Relink and rebuild only, for results already stored.
    pub async fn reconcile_only(&self) -> Result<ReconcileStats> {
        let lock = self.lock();
        let guard = lock.acquire().await?;
        let outcome = self.relink_and_compile().await;
        release(guard).await;
        outcome
    }

    fn lock(&self) -> RunLock {
        let holder = format!("pid-{}", std::process::id());
        RunLock::new(self.pool.clone(), RUN_LOCK_NAME, &holder, self.lock_stale_secs)
    }

    fn compiler(&self) -> ReconciliationCompiler {
        ReconciliationCompiler::new(
            ForecastStore::new(self.pool.clone()),
            ResultStore::new(self.pool.clone()),
        )
    }

    async fn relink_and_compile(&self) -> Result<ReconcileStats> {
        let relinked = self.relink().await?;
        let mut stats = self.compiler().run().await?;
        stats.relinked = relinked;
        Ok(stats)
    }

    /// Attach identifiers to stored results whose forecasts were imported
    /// after the result was written. A sport with an ambiguous match is
    /// left unlinked and the rest carry on.
    async fn relink(&self) -> Result<usize> {
        let results = ResultStore::new(self.pool.clone());
        let mut by_sport: HashMap<Sport, Vec<(i64, GameResult)>> = HashMap::new();
        for row in results.unidentified().await? {
            match stored_game(&row) {
                Some(game) => by_sport.entry(game.key.sport).or_default().push((row.id, game)),
                None => warn!(
                    result_id = row.id,
                    sport = %row.sport,
                    date = %row.game_date,
                    "Stored result cannot be read back; not relinked"
                ),
            }
        }

        let forecasts = ForecastStore::new(self.pool.clone());
        let matcher = GameIdentityMatcher::new(&forecasts, &self.normalizer);
        let mut relinked = 0;
        for (sport, entries) in by_sport {
            let (ids, mut games): (Vec<i64>, Vec<GameResult>) = entries.into_iter().unzip();
            match matcher.annotate(sport, &mut games).await {
                Ok(_) => {}
                Err(AppError::AmbiguousMatch(found)) => {
                    warn!(sport = %sport, games = found.len(), "Ambiguous forecasts; stored results left unlinked");
                    continue;
                }
                Err(e) => return Err(e),
            }
            for (id, game) in ids.into_iter().zip(&games) {
                let Some(game_id) = game.game_id.as_deref() else {
                    continue;
                };
                if results.backfill_game_id(id, game_id).await? {
                    info!(game = %game.key, game_id, "Stored result linked to forecast");
                    relinked += 1;
                }
            }
        }
        Ok(relinked)
    }

    async fn collect(&self, source: &dyn GameSource, sport: Sport, date: NaiveDate) -> Result<RunSummary> {
        let today = Utc::now().date_naive();
        let raw = source.fetch_games(sport, date).await?;
        let fetched = raw.len();

        let mut errors = Vec::new();
        let mut games: Vec<GameResult> = Vec::with_capacity(raw.len());
        for r in &raw {
            match GameResult::from_raw(sport, r, &self.normalizer, today) {
                Ok(v) => {
                    for name in &v.unrecognized {
                        warn!(sport = %sport, team = %name, "Unrecognized team name, stored as given");
                    }
                    games.push(v.result);
                }
                Err(rejection) => {
                    let key = format!("{sport} {} {} @ {}", r.date, r.away_team.trim(), r.home_team.trim());
                    warn!(game = %key, "Game rejected: {rejection}");
                    errors.push(RowError {
                        key,
                        reason: rejection.to_string(),
                    });
                }
            }
        }

        let forecasts = ForecastStore::new(self.pool.clone());
        let matched = GameIdentityMatcher::new(&forecasts, &self.normalizer)
            .annotate(sport, &mut games)
            .await?;

        let written = ResultWriter::new(ResultStore::new(self.pool.clone()))
            .write_batch(&games)
            .await?;
        errors.extend(written.errors);

        let reconciled = self.relink_and_compile().await?;

        let summary = RunSummary {
            sport,
            date,
            fetched,
            inserted: written.inserted,
            skipped_duplicate: written.skipped_duplicate,
            backfilled: written.backfilled,
            matched: matched.matched,
            unmatched: matched.unmatched,
            relinked: reconciled.relinked,
            rows_reconciled: reconciled.rows_reconciled,
            correctness_filled: reconciled.correctness_filled,
            conflicts: reconciled.conflicts,
            errors,
        };
        info!(
            sport = %sport,
            date = %date,
            fetched = summary.fetched,
            inserted = summary.inserted,
            skipped_duplicate = summary.skipped_duplicate,
            matched = summary.matched,
            unmatched = summary.unmatched,
            relinked = summary.relinked,
            rows_reconciled = summary.rows_reconciled,
            errors = summary.errors.len(),
            "Reconciliation run complete"
        );
        Ok(summary)
    }
}

/// Rebuild a `GameResult` from its stored row, without an identifier.
fn stored_game(row: &GameResultRow) -> Option<GameResult> {
    let sport: Sport = row.sport.parse().ok()?;
    let date = NaiveDate::parse_from_str(&row.game_date, "%Y-%m-%d").ok()?;
    Some(GameResult {
        key: NaturalKey {
            sport,
            date,
            home_team: row.home_team.clone(),
            away_team: row.away_team.clone(),
        },
        home_score: u32::try_from(row.home_score).ok()?,
        away_score: u32::try_from(row.away_score).ok()?,
        points_total: u32::try_from(row.points_total).ok()?,
        venue: row.venue.clone(),
        game_id: None,
    })
}

async fn release(guard: crate::db::lock::RunLockGuard) {
    if let Err(e) = guard.release().await {
        error!("Failed to release run lock: {e}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::NewForecast;
    use crate::db::test_pool;
    use crate::types::{GameStatus, RawGame};
    use async_trait::async_trait;

    const DATE: &str = "2025-12-08";

    struct StaticSource(Vec<RawGame>);

    #[async_trait]
    impl GameSource for StaticSource {
        async fn fetch_games(&self, _sport: Sport, _date: NaiveDate) -> Result<Vec<RawGame>> {
            Ok(self.0.clone())
        }
    }

    /// Returns the same final game on whatever date is asked for.
    struct DatedSource;

    #[async_trait]
    impl GameSource for DatedSource {
        async fn fetch_games(&self, _sport: Sport, date: NaiveDate) -> Result<Vec<RawGame>> {
            Ok(vec![RawGame {
                date,
                ..raw("Celtics", "Lakers", 126, 105, GameStatus::Final)
            }])
        }
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 12, 8).unwrap()
    }

    fn raw(home: &str, away: &str, hs: u32, aws: u32, status: GameStatus) -> RawGame {
        RawGame {
            date: date(),
            home_team: home.to_string(),
            away_team: away.to_string(),
            home_score: Some(hs),
            away_score: Some(aws),
            venue: None,
            status,
        }
    }

    async fn seeded() -> (SqlitePool, Reconciler) {
        let pool = test_pool().await;
        ForecastStore::new(pool.clone())
            .import(&[
                NewForecast::nba("g-1", DATE, "Boston Celtics", "LA Lakers", "TOTAL-220.5", 220.5),
                NewForecast::nba("g-1", DATE, "Boston Celtics", "LA Lakers", "TOTAL-235.5", 235.5),
            ])
            .await
            .unwrap();
        (pool.clone(), Reconciler::new(pool, 3_600))
    }

    #[tokio::test]
    async fn final_game_reconciles_its_forecasts() {
        let (pool, reconciler) = seeded().await;
        let source = StaticSource(vec![raw("Celtics", "Lakers", 126, 105, GameStatus::Final)]);

        let s = reconciler.collect_and_reconcile(&source, Sport::Nba, date()).await.unwrap();
        assert_eq!(s.fetched, 1);
        assert_eq!(s.inserted, 1);
        assert_eq!(s.matched, 1);
        assert_eq!(s.unmatched, 0);
        assert_eq!(s.rows_reconciled, 2);
        assert_eq!(s.correctness_filled, 8);
        assert!(s.errors.is_empty());

        let stored = ResultStore::new(pool.clone()).by_date(date(), Some(Sport::Nba)).await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].game_id.as_deref(), Some("g-1"));
        assert_eq!(stored[0].venue, "Unknown Venue");

        let rows = ForecastStore::new(pool).load_all().await.unwrap();
        assert!(rows.iter().all(|r| r.actual_home_win == Some(true)));
    }

    #[tokio::test]
    async fn repeated_run_changes_nothing() {
        let (pool, reconciler) = seeded().await;
        let source = StaticSource(vec![raw("Celtics", "Lakers", 126, 105, GameStatus::Final)]);

        reconciler.collect_and_reconcile(&source, Sport::Nba, date()).await.unwrap();
        let forecasts = ForecastStore::new(pool);
        let before = forecasts.load_all().await.unwrap();

        let again = reconciler.collect_and_reconcile(&source, Sport::Nba, date()).await.unwrap();
        assert_eq!(again.inserted, 0);
        assert_eq!(again.skipped_duplicate, 1);
        assert_eq!(again.rows_reconciled, 0);
        assert_eq!(again.correctness_filled, 0);
        assert_eq!(forecasts.load_all().await.unwrap(), before);
    }

    #[tokio::test]
    async fn unfinished_game_is_a_row_error_and_unknown_game_is_unmatched() {
        let (_pool, reconciler) = seeded().await;
        let source = StaticSource(vec![
            raw("Celtics", "Lakers", 50, 48, GameStatus::InProgress),
            raw("Miami Heat", "Orlando Magic", 101, 99, GameStatus::Final),
        ]);

        let s = reconciler.collect_and_reconcile(&source, Sport::Nba, date()).await.unwrap();
        assert_eq!(s.fetched, 2);
        assert_eq!(s.errors.len(), 1);
        assert!(s.errors[0].reason.contains("not final"));
        assert_eq!(s.inserted, 1);
        assert_eq!(s.unmatched, 1);
        assert_eq!(s.rows_reconciled, 0);
    }

    #[tokio::test]
    async fn ambiguous_match_aborts_before_any_write() {
        let (pool, reconciler) = seeded().await;
        ForecastStore::new(pool.clone())
            .import(&[NewForecast::nba("g-2", DATE, "BOS", "LAL", "TOTAL-221.5", 221.5)])
            .await
            .unwrap();
        let source = StaticSource(vec![raw("Celtics", "Lakers", 126, 105, GameStatus::Final)]);

        let err = reconciler
            .collect_and_reconcile(&source, Sport::Nba, date())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::AmbiguousMatch(_)));
        assert!(ResultStore::new(pool.clone()).by_date(date(), None).await.unwrap().is_empty());

        // The lock was released despite the failure.
        let held: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM run_locks")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(held, 0);
    }

    #[tokio::test]
    async fn run_is_refused_while_another_holds_the_lock() {
        let (pool, reconciler) = seeded().await;
        sqlx::query("INSERT INTO run_locks (name, holder, acquired_at) VALUES (?, 'other', ?)")
            .bind(RUN_LOCK_NAME)
            .bind(Utc::now().to_rfc3339())
            .execute(&pool)
            .await
            .unwrap();

        let err = reconciler.reconcile_only().await.unwrap_err();
        assert!(matches!(err, AppError::RunInProgress { .. }));
    }

    #[tokio::test]
    async fn reconcile_only_picks_up_stored_results() {
        let (pool, reconciler) = seeded().await;
        sqlx::query(
            "INSERT INTO game_results (sport, game_date, home_team, away_team, home_score, away_score, points_total, venue, game_id, inserted_at)
             VALUES ('nba', ?, 'Boston Celtics', 'Los Angeles Lakers', 126, 105, 231, 'TD Garden', 'g-1', '2025-12-09T00:00:00Z')",
        )
        .bind(DATE)
        .execute(&pool)
        .await
        .unwrap();

        let stats = reconciler.reconcile_only().await.unwrap();
        assert_eq!(stats.rows_reconciled, 2);
        assert!(stats.swapped);
    }

    #[tokio::test]
    async fn forecasts_imported_after_the_result_are_relinked() {
        let pool = test_pool().await;
        let reconciler = Reconciler::new(pool.clone(), 3_600);
        let source = StaticSource(vec![raw("Celtics", "Lakers", 126, 105, GameStatus::Final)]);

        let first = reconciler.collect_and_reconcile(&source, Sport::Nba, date()).await.unwrap();
        assert_eq!(first.inserted, 1);
        assert_eq!(first.unmatched, 1);
        assert_eq!(first.relinked, 0);

        let forecasts = ForecastStore::new(pool.clone());
        forecasts
            .import(&[
                NewForecast::nba("g-1", DATE, "Boston Celtics", "LA Lakers", "TOTAL-220.5", 220.5),
                NewForecast::nba("g-1", DATE, "Boston Celtics", "LA Lakers", "TOTAL-235.5", 235.5),
            ])
            .await
            .unwrap();

        let stats = reconciler.reconcile_only().await.unwrap();
        assert_eq!(stats.relinked, 1);
        assert_eq!(stats.rows_reconciled, 2);
        assert!(stats.swapped);

        let stored = ResultStore::new(pool).by_date(date(), None).await.unwrap();
        assert_eq!(stored[0].game_id.as_deref(), Some("g-1"));
        let rows = forecasts.load_all().await.unwrap();
        assert!(rows.iter().all(|r| r.actual_points_total == Some(231)));
    }

    #[tokio::test]
    async fn ambiguous_relink_leaves_result_unlinked() {
        let pool = test_pool().await;
        let reconciler = Reconciler::new(pool.clone(), 3_600);
        let source = StaticSource(vec![raw("Celtics", "Lakers", 126, 105, GameStatus::Final)]);
        reconciler.collect_and_reconcile(&source, Sport::Nba, date()).await.unwrap();

        ForecastStore::new(pool.clone())
            .import(&[
                NewForecast::nba("g-1", DATE, "Boston Celtics", "LA Lakers", "TOTAL-220.5", 220.5),
                NewForecast::nba("g-2", DATE, "BOS", "LAL", "TOTAL-221.5", 221.5),
            ])
            .await
            .unwrap();

        let stats = reconciler.reconcile_only().await.unwrap();
        assert_eq!(stats.relinked, 0);
        assert_eq!(stats.rows_reconciled, 0);
        let stored = ResultStore::new(pool).by_date(date(), None).await.unwrap();
        assert_eq!(stored[0].game_id, None);
    }

    #[tokio::test]
    async fn range_runs_every_date_in_order() {
        let pool = test_pool().await;
        let reconciler = Reconciler::new(pool.clone(), 3_600);
        let from = NaiveDate::from_ymd_opt(2025, 12, 7).unwrap();

        let runs = reconciler.collect_range(&DatedSource, Sport::Nba, from, date()).await.unwrap();
        assert_eq!(runs.len(), 2);
        assert_eq!(runs[0].0, from);
        assert_eq!(runs[1].0, date());
        for (_, outcome) in &runs {
            assert_eq!(outcome.as_ref().unwrap().inserted, 1);
        }
        assert_eq!(ResultStore::new(pool).by_date(from, None).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn inverted_range_is_refused() {
        let (_pool, reconciler) = seeded().await;
        let from = NaiveDate::from_ymd_opt(2025, 12, 9).unwrap();
        let err = reconciler
            .collect_range(&DatedSource, Sport::Nba, from, date())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[tokio::test]
    async fn range_stops_when_the_lock_is_held() {
        let (pool, reconciler) = seeded().await;
        sqlx::query("INSERT INTO run_locks (name, holder, acquired_at) VALUES (?, 'other', ?)")
            .bind(RUN_LOCK_NAME)
            .bind(Utc::now().to_rfc3339())
            .execute(&pool)
            .await
            .unwrap();
        let from = NaiveDate::from_ymd_opt(2025, 12, 1).unwrap();

        let runs = reconciler.collect_range(&DatedSource, Sport::Nba, from, date()).await.unwrap();
        assert_eq!(runs.len(), 1);
        assert!(matches!(runs[0].1, Err(AppError::RunInProgress { .. })));
    }
}
