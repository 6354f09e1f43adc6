/// Database row types for the tables in `migrations/`.
/// Used with `sqlx::query_as` for typed queries.
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct GameResultRow {
    pub id: i64,
    pub sport: String,
    pub game_date: String,
    pub home_team: String,
    pub away_team: String,
    pub home_score: i64,
    pub away_score: i64,
    pub points_total: i64,
    pub venue: String,
    pub game_id: Option<String>,
    pub inserted_at: String,
}

/// The columns of `forecasts` the reconciler reads. The table may carry
/// more; those are copied through a rebuild untouched.
#[derive(Debug, Clone, Default, PartialEq, sqlx::FromRow)]
pub struct ForecastRow {
    pub forecast_id: i64,
    pub game_id: Option<String>,
    pub market_descriptor: String,
    pub points_total_line: Option<f64>,
    pub model_home_win_bet: Option<bool>,
    pub model_over_bet: Option<bool>,
    pub market_home_win_bet: Option<bool>,
    pub market_over_bet: Option<bool>,
    pub actual_away_points: Option<i64>,
    pub actual_home_points: Option<i64>,
    pub actual_points_total: Option<i64>,
    pub actual_home_win: Option<bool>,
    pub actual_points_total_over: Option<bool>,
    pub model_over_correct: Option<bool>,
    pub model_home_win_correct: Option<bool>,
    pub market_over_correct: Option<bool>,
    pub market_home_win_correct: Option<bool>,
}

/// Distinct (identifier, teams) seen in the forecast table for one date.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ForecastIdentityRow {
    pub game_id: String,
    pub home_team: String,
    pub away_team: String,
}

/// A forecast row as written by the forecasting process.
#[derive(Debug, Clone, Deserialize)]
pub struct NewForecast {
    pub game_id: String,
    pub market_descriptor: String,
    pub sport: String,
    pub game_date: String,
    pub home_team: String,
    pub away_team: String,
    #[serde(default)]
    pub points_total_line: Option<f64>,
    #[serde(default)]
    pub model_home_win_bet: Option<bool>,
    #[serde(default)]
    pub model_over_bet: Option<bool>,
    #[serde(default)]
    pub market_home_win_bet: Option<bool>,
    #[serde(default)]
    pub market_over_bet: Option<bool>,
}

#[cfg(test)]
impl NewForecast {
    /// An NBA over/under row with both predictors leaning over and home.
    pub fn nba(game_id: &str, date: &str, home: &str, away: &str, market: &str, line: f64) -> Self {
        Self {
            game_id: game_id.to_string(),
            market_descriptor: market.to_string(),
            sport: "nba".to_string(),
            game_date: date.to_string(),
            home_team: home.to_string(),
            away_team: away.to_string(),
            points_total_line: Some(line),
            model_home_win_bet: Some(true),
            model_over_bet: Some(true),
            market_home_win_bet: Some(true),
            market_over_bet: Some(false),
        }
    }
}
