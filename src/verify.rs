//! Coverage queries over stored results and their forecast rows.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;
use sqlx::SqlitePool;

use crate::db::forecasts::ForecastStore;
use crate::error::{AppError, Result};
use crate::types::Sport;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DayCoverage {
    pub date: String,
    /// Games whose every linked forecast row carries actuals.
    pub reconciled: usize,
    /// Games with at least one linked forecast row still lacking actuals.
    pub pending: usize,
    pub without_forecasts: usize,
    /// Linked forecast rows still lacking actuals.
    pub pending_rows: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CoverageTotals {
    pub games: usize,
    pub reconciled: usize,
    pub pending: usize,
    pub without_forecasts: usize,
    pub pending_rows: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CoverageReport {
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub sport: Option<Sport>,
    pub days: Vec<DayCoverage>,
    pub totals: CoverageTotals,
}

impl CoverageReport {
    pub fn is_healthy(&self) -> bool {
        self.totals.pending == 0
    }
}

#[derive(sqlx::FromRow)]
struct GameCoverageRow {
    game_date: String,
    linked: i64,
    pending: i64,
}

pub async fn coverage(
    pool: &SqlitePool,
    from: NaiveDate,
    to: NaiveDate,
    sport: Option<Sport>,
) -> Result<CoverageReport> {
    if from > to {
        return Err(AppError::BadRequest(format!("from ({from}) is after to ({to})")));
    }

    let rows = sqlx::query_as::<_, GameCoverageRow>(
        r#"
        SELECT gr.game_date AS game_date,
               COUNT(f.forecast_id) AS linked,
               COALESCE(SUM(CASE WHEN f.forecast_id IS NOT NULL AND f.actual_points_total IS NULL
                                 THEN 1 ELSE 0 END), 0) AS pending
        FROM game_results gr
        LEFT JOIN forecasts f ON f.game_id = gr.game_id
        WHERE gr.game_date BETWEEN ? AND ?
          AND (? IS NULL OR gr.sport = ?)
        GROUP BY gr.id
        "#,
    )
    .bind(from.to_string())
    .bind(to.to_string())
    .bind(sport.map(|s| s.as_str()))
    .bind(sport.map(|s| s.as_str()))
    .fetch_all(pool)
    .await?;

    let mut by_day: BTreeMap<String, DayCoverage> = BTreeMap::new();
    for r in rows {
        let day = by_day.entry(r.game_date.clone()).or_insert_with(|| DayCoverage {
            date: r.game_date.clone(),
            ..Default::default()
        });
        if r.linked == 0 {
            day.without_forecasts += 1;
        } else if r.pending > 0 {
            day.pending += 1;
            day.pending_rows += r.pending;
        } else {
            day.reconciled += 1;
        }
    }

    let days: Vec<DayCoverage> = by_day.into_values().collect();
    let totals = days.iter().fold(CoverageTotals::default(), |mut t, d| {
        t.games += d.reconciled + d.pending + d.without_forecasts;
        t.reconciled += d.reconciled;
        t.pending += d.pending;
        t.without_forecasts += d.without_forecasts;
        t.pending_rows += d.pending_rows;
        t
    });

    Ok(CoverageReport {
        from,
        to,
        sport,
        days,
        totals,
    })
}

/// Forecast rows linked to a stored result but still lacking actuals,
/// across all dates.
pub async fn pending_forecast_rows(pool: &SqlitePool) -> Result<i64> {
    ForecastStore::new(pool.clone()).pending_rows().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::NewForecast;
    use crate::db::test_pool;

    async fn insert_result(pool: &SqlitePool, date: &str, home: &str, game_id: Option<&str>) {
        sqlx::query(
            "INSERT INTO game_results (sport, game_date, home_team, away_team, home_score, away_score, points_total, venue, game_id, inserted_at)
             VALUES ('nba', ?, ?, 'Visitors', 100, 90, 190, 'Arena', ?, '2025-12-10T00:00:00Z')",
        )
        .bind(date)
        .bind(home)
        .bind(game_id)
        .execute(pool)
        .await
        .unwrap();
    }

    fn d(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[tokio::test]
    async fn classifies_games_per_day() {
        let pool = test_pool().await;
        let forecasts = ForecastStore::new(pool.clone());
        forecasts
            .import(&[
                NewForecast::nba("g-1", "2025-12-08", "Boston Celtics", "Visitors", "TOTAL-1", 180.5),
                NewForecast::nba("g-2", "2025-12-08", "Miami Heat", "Visitors", "TOTAL-2", 180.5),
                NewForecast::nba("g-2", "2025-12-08", "Miami Heat", "Visitors", "TOTAL-3", 200.5),
            ])
            .await
            .unwrap();
        sqlx::query("UPDATE forecasts SET actual_points_total = 190 WHERE game_id = 'g-1'")
            .execute(&pool)
            .await
            .unwrap();

        insert_result(&pool, "2025-12-08", "Boston Celtics", Some("g-1")).await;
        insert_result(&pool, "2025-12-08", "Miami Heat", Some("g-2")).await;
        insert_result(&pool, "2025-12-09", "Orlando Magic", None).await;

        let report = coverage(&pool, d("2025-12-08"), d("2025-12-09"), None).await.unwrap();
        assert_eq!(report.days.len(), 2);
        assert_eq!(
            report.days[0],
            DayCoverage {
                date: "2025-12-08".to_string(),
                reconciled: 1,
                pending: 1,
                without_forecasts: 0,
                pending_rows: 2,
            }
        );
        assert_eq!(report.days[1].without_forecasts, 1);
        assert_eq!(report.totals.games, 3);
        assert!(!report.is_healthy());
        assert_eq!(pending_forecast_rows(&pool).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn empty_range_is_healthy() {
        let pool = test_pool().await;
        let report = coverage(&pool, d("2025-12-01"), d("2025-12-07"), Some(Sport::Nhl)).await.unwrap();
        assert!(report.days.is_empty());
        assert!(report.is_healthy());
    }

    #[tokio::test]
    async fn inverted_range_is_rejected() {
        let pool = test_pool().await;
        let err = coverage(&pool, d("2025-12-09"), d("2025-12-08"), None).await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }
}
