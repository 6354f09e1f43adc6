//! Access to the forecast relation.
//!
//! Rows are never updated in place. `replace_with` builds a shadow copy of the
//! whole table with merged values and swaps it in atomically; until the swap
//! commits, readers see the old table.

use chrono::NaiveDate;
use sqlx::{Sqlite, SqlitePool, Transaction};
use tracing::{debug, warn};

use crate::config::{FORECASTS_SHADOW_TABLE, FORECASTS_TABLE};
use crate::db::models::{ForecastIdentityRow, ForecastRow, NewForecast};
use crate::error::{AppError, Result};
use crate::types::Sport;

/// Row count and highest id of the live table at a point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableFingerprint {
    pub rows: i64,
    pub max_id: Option<i64>,
}

#[derive(Clone)]
pub struct ForecastStore {
    pool: SqlitePool,
}

impl ForecastStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Distinct identifiers and team spellings forecast for one sport and date.
    pub async fn identities_for_date(&self, sport: Sport, date: NaiveDate) -> Result<Vec<ForecastIdentityRow>> {
        let rows = sqlx::query_as::<_, ForecastIdentityRow>(
            r#"
            SELECT DISTINCT game_id, home_team, away_team
            FROM forecasts
            WHERE sport = ? AND game_date = ? AND game_id IS NOT NULL
            "#,
        )
        .bind(sport.as_str())
        .bind(date.to_string())
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn load_all(&self) -> Result<Vec<ForecastRow>> {
        let rows = sqlx::query_as::<_, ForecastRow>(
            r#"
            SELECT forecast_id, game_id, market_descriptor, points_total_line,
                   model_home_win_bet, model_over_bet, market_home_win_bet, market_over_bet,
                   actual_away_points, actual_home_points, actual_points_total,
                   actual_home_win, actual_points_total_over,
                   model_over_correct, model_home_win_correct,
                   market_over_correct, market_home_win_correct
            FROM forecasts
            ORDER BY forecast_id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Append forecast rows; a repeated (identifier, market) pair is ignored.
    /// Returns the number of rows actually added.
    pub async fn import(&self, rows: &[NewForecast]) -> Result<usize> {
        let mut tx = self.pool.begin().await?;
        let mut added = 0usize;
        for f in rows {
            let done = sqlx::query(
                r#"
                INSERT INTO forecasts (
                    game_id, market_descriptor, sport, game_date, home_team, away_team,
                    points_total_line, model_home_win_bet, model_over_bet,
                    market_home_win_bet, market_over_bet
                ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                ON CONFLICT (game_id, market_descriptor) DO NOTHING
                "#,
            )
            .bind(&f.game_id)
            .bind(&f.market_descriptor)
            .bind(f.sport.to_ascii_lowercase())
            .bind(&f.game_date)
            .bind(&f.home_team)
            .bind(&f.away_team)
            .bind(f.points_total_line)
            .bind(f.model_home_win_bet)
            .bind(f.model_over_bet)
            .bind(f.market_home_win_bet)
            .bind(f.market_over_bet)
            .execute(&mut *tx)
            .await?;
            added += done.rows_affected() as usize;
        }
        tx.commit().await?;
        Ok(added)
    }

    /// Forecast rows linked to a stored result that still lack actuals.
    pub async fn pending_rows(&self) -> Result<i64> {
        let n: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM forecasts f
            JOIN game_results gr ON gr.game_id = f.game_id
            WHERE f.actual_points_total IS NULL
            "#,
        )
        .fetch_one(&self.pool)
        .await?;
        Ok(n)
    }

    /// Replace the live table with a copy carrying `merged` values.
    ///
    /// Each entry is a full merged row; only its actual and correctness
    /// columns are written, and only where the copy still holds NULL.
    pub async fn replace_with(&self, merged: &[ForecastRow]) -> Result<()> {
        let fingerprint = self.build_shadow(merged).await?;
        self.swap_in(fingerprint).await
    }

    /// Phase one: copy the live table into the shadow table and apply the
    /// merged values there. The live table is only read.
    pub(crate) async fn build_shadow(&self, merged: &[ForecastRow]) -> Result<TableFingerprint> {
        let mut tx = self.pool.begin().await?;

        // fetch_all keeps no statement active on the connection, which
        // DROP TABLE below requires.
        let live_ddl: Vec<String> = sqlx::query_scalar(
            "SELECT sql FROM sqlite_master WHERE type = 'table' AND name = ?",
        )
        .bind(FORECASTS_TABLE)
        .fetch_all(&mut *tx)
        .await?;
        let live_ddl = live_ddl
            .first()
            .ok_or_else(|| AppError::Schema(format!("table {FORECASTS_TABLE} does not exist")))?;
        let shadow_ddl = shadow_ddl(live_ddl)?;

        sqlx::query(&format!("DROP TABLE IF EXISTS {FORECASTS_SHADOW_TABLE}"))
            .execute(&mut *tx)
            .await?;
        sqlx::query(&shadow_ddl).execute(&mut *tx).await?;
        sqlx::query(&format!(
            "INSERT INTO {FORECASTS_SHADOW_TABLE} SELECT * FROM {FORECASTS_TABLE}"
        ))
        .execute(&mut *tx)
        .await?;

        let update = format!(
            r#"
            UPDATE {FORECASTS_SHADOW_TABLE} SET
                actual_away_points       = COALESCE(actual_away_points, ?),
                actual_home_points       = COALESCE(actual_home_points, ?),
                actual_points_total      = COALESCE(actual_points_total, ?),
                actual_home_win          = COALESCE(actual_home_win, ?),
                actual_points_total_over = COALESCE(actual_points_total_over, ?),
                model_over_correct       = COALESCE(model_over_correct, ?),
                model_home_win_correct   = COALESCE(model_home_win_correct, ?),
                market_over_correct      = COALESCE(market_over_correct, ?),
                market_home_win_correct  = COALESCE(market_home_win_correct, ?)
            WHERE forecast_id = ?
            "#
        );
        for row in merged {
            sqlx::query(&update)
                .bind(row.actual_away_points)
                .bind(row.actual_home_points)
                .bind(row.actual_points_total)
                .bind(row.actual_home_win)
                .bind(row.actual_points_total_over)
                .bind(row.model_over_correct)
                .bind(row.model_home_win_correct)
                .bind(row.market_over_correct)
                .bind(row.market_home_win_correct)
                .bind(row.forecast_id)
                .execute(&mut *tx)
                .await?;
        }

        let fingerprint = fingerprint(&mut tx).await?;
        tx.commit().await?;
        debug!(rows = fingerprint.rows, updated = merged.len(), "shadow forecast table built");
        Ok(fingerprint)
    }

    /// Phase two: drop the live table and rename the shadow into its place,
    /// in one transaction. Aborts if the live table gained or lost rows since
    /// the shadow was copied.
    pub(crate) async fn swap_in(&self, expected: TableFingerprint) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        let found = fingerprint(&mut tx).await?;
        if found != expected {
            tx.rollback().await?;
            self.drop_shadow().await;
            return Err(AppError::ForecastsChanged {
                expected_rows: expected.rows,
                expected_max_id: expected.max_id,
                found_rows: found.rows,
                found_max_id: found.max_id,
            });
        }

        let indexes: Vec<String> = sqlx::query_scalar(
            "SELECT sql FROM sqlite_master WHERE type = 'index' AND tbl_name = ? AND sql IS NOT NULL",
        )
        .bind(FORECASTS_TABLE)
        .fetch_all(&mut *tx)
        .await?;

        sqlx::query(&format!("DROP TABLE {FORECASTS_TABLE}"))
            .execute(&mut *tx)
            .await?;
        sqlx::query(&format!(
            "ALTER TABLE {FORECASTS_SHADOW_TABLE} RENAME TO {FORECASTS_TABLE}"
        ))
        .execute(&mut *tx)
        .await?;
        for sql in &indexes {
            sqlx::query(sql).execute(&mut *tx).await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn drop_shadow(&self) {
        if let Err(e) = sqlx::query(&format!("DROP TABLE IF EXISTS {FORECASTS_SHADOW_TABLE}"))
            .execute(&self.pool)
            .await
        {
            warn!("Could not drop shadow forecast table: {e}");
        }
    }
}

async fn fingerprint(tx: &mut Transaction<'_, Sqlite>) -> Result<TableFingerprint> {
    let rows: Vec<(i64, Option<i64>)> = sqlx::query_as(&format!(
        "SELECT COUNT(*), MAX(forecast_id) FROM {FORECASTS_TABLE}"
    ))
    .fetch_all(&mut **tx)
    .await?;
    let (rows, max_id) = rows.first().copied().unwrap_or((0, None));
    Ok(TableFingerprint { rows, max_id })
}

/// Reuse the live table's column list and constraints under the shadow name.
fn shadow_ddl(live_ddl: &str) -> Result<String> {
    let open = live_ddl
        .find('(')
        .ok_or_else(|| AppError::Schema(format!("unexpected DDL for {FORECASTS_TABLE}: {live_ddl}")))?;
    Ok(format!("CREATE TABLE {FORECASTS_SHADOW_TABLE} {}", &live_ddl[open..]))
}
