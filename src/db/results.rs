use chrono::{NaiveDate, Utc};
use sqlx::SqlitePool;

use crate::db::models::GameResultRow;
use crate::error::Result;
use crate::types::{GameResult, NaturalKey, Sport};

/// What a stored result looks like from the writer's point of view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredIdentity {
    pub id: i64,
    pub game_id: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    /// The natural key was taken between the existence check and the insert.
    AlreadyPresent,
}

/// Append-only store of completed games, unique by natural key.
#[derive(Clone)]
pub struct ResultStore {
    pool: SqlitePool,
}

impl ResultStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn find(&self, key: &NaturalKey) -> Result<Option<StoredIdentity>> {
        let row: Option<(i64, Option<String>)> = sqlx::query_as(
            r#"
            SELECT id, game_id FROM game_results
            WHERE sport = ? AND game_date = ? AND home_team = ? AND away_team = ?
            "#,
        )
        .bind(key.sport.as_str())
        .bind(key.date.to_string())
        .bind(&key.home_team)
        .bind(&key.away_team)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|(id, game_id)| StoredIdentity { id, game_id }))
    }

    pub async fn insert(&self, game: &GameResult) -> Result<InsertOutcome> {
        let inserted_at = Utc::now().to_rfc3339();
        let done = sqlx::query(
            r#"
            INSERT INTO game_results (
                sport, game_date, home_team, away_team,
                home_score, away_score, points_total, venue, game_id, inserted_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT (sport, game_date, home_team, away_team) DO NOTHING
            "#,
        )
        .bind(game.key.sport.as_str())
        .bind(game.key.date.to_string())
        .bind(&game.key.home_team)
        .bind(&game.key.away_team)
        .bind(i64::from(game.home_score))
        .bind(i64::from(game.away_score))
        .bind(i64::from(game.points_total))
        .bind(&game.venue)
        .bind(&game.game_id)
        .bind(inserted_at)
        .execute(&self.pool)
        .await?;

        if done.rows_affected() == 0 {
            Ok(InsertOutcome::AlreadyPresent)
        } else {
            Ok(InsertOutcome::Inserted)
        }
    }

    /// Fill a missing identifier. Never replaces one that is already set.
    pub async fn backfill_game_id(&self, id: i64, game_id: &str) -> Result<bool> {
        let done = sqlx::query("UPDATE game_results SET game_id = ? WHERE id = ? AND game_id IS NULL")
            .bind(game_id)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(done.rows_affected() > 0)
    }

    /// Every result that carries an identifier, oldest first.
    pub async fn identified(&self) -> Result<Vec<GameResultRow>> {
        let rows = sqlx::query_as::<_, GameResultRow>(
            r#"
            SELECT id, sport, game_date, home_team, away_team,
                   home_score, away_score, points_total, venue, game_id, inserted_at
            FROM game_results
            WHERE game_id IS NOT NULL
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Results written before any forecast matched them, oldest first.
    pub async fn unidentified(&self) -> Result<Vec<GameResultRow>> {
        let rows = sqlx::query_as::<_, GameResultRow>(
            r#"
            SELECT id, sport, game_date, home_team, away_team,
                   home_score, away_score, points_total, venue, game_id, inserted_at
            FROM game_results
            WHERE game_id IS NULL
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn by_date(&self, date: NaiveDate, sport: Option<Sport>) -> Result<Vec<GameResultRow>> {
        let rows = sqlx::query_as::<_, GameResultRow>(
            r#"
            SELECT id, sport, game_date, home_team, away_team,
                   home_score, away_score, points_total, venue, game_id, inserted_at
            FROM game_results
            WHERE game_date = ? AND (? IS NULL OR sport = ?)
            ORDER BY sport, home_team
            "#,
        )
        .bind(date.to_string())
        .bind(sport.map(|s| s.as_str()))
        .bind(sport.map(|s| s.as_str()))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}
