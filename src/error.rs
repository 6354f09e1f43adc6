use axum::{http::StatusCode, response::IntoResponse};
use thiserror::Error;

use crate::types::NaturalKey;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Database migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Game source error: {0}")]
    Source(String),

    #[error("Ambiguous forecast match for {} game(s): {}", .0.len(), describe_ambiguities(.0))]
    AmbiguousMatch(Vec<AmbiguousMatch>),

    #[error("Reconciliation run already in progress (holder={holder}, since={since})")]
    RunInProgress { holder: String, since: String },

    #[error("Forecast table changed during rebuild (expected {expected_rows} rows / max id {expected_max_id:?}, found {found_rows} / {found_max_id:?})")]
    ForecastsChanged {
        expected_rows: i64,
        expected_max_id: Option<i64>,
        found_rows: i64,
        found_max_id: Option<i64>,
    },

    #[error("Schema error: {0}")]
    Schema(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, AppError>;

impl AppError {
    /// Errors that mean the store itself is unusable, as opposed to one bad row.
    pub fn is_infrastructure(&self) -> bool {
        match self {
            AppError::Database(sqlx::Error::Database(db)) => is_busy(db.code().as_deref()),
            AppError::Database(e) => matches!(
                e,
                sqlx::Error::Io(_)
                    | sqlx::Error::PoolTimedOut
                    | sqlx::Error::PoolClosed
                    | sqlx::Error::WorkerCrashed
                    | sqlx::Error::Configuration(_)
            ),
            AppError::Migration(_) | AppError::Io(_) => true,
            _ => false,
        }
    }
}

/// SQLITE_BUSY (5) and SQLITE_LOCKED (6), including their extended codes:
/// another connection holds the database, so no row in the batch can succeed.
fn is_busy(code: Option<&str>) -> bool {
    code.and_then(|c| c.parse::<i32>().ok())
        .is_some_and(|c| matches!(c & 0xff, 5 | 6))
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::RunInProgress { .. } => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, self.to_string()).into_response()
    }
}

/// One natural key that resolved to more than one forecast identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AmbiguousMatch {
    pub key: NaturalKey,
    pub identifiers: Vec<String>,
}

fn describe_ambiguities(list: &[AmbiguousMatch]) -> String {
    list.iter()
        .map(|a| format!("{} -> [{}]", a.key, a.identifiers.join(", ")))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Why a raw game from a source was not accepted as a result.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GameRejection {
    #[error("game is not final (status: {0})")]
    NotFinal(String),

    #[error("missing {0} score")]
    MissingScore(&'static str),

    #[error("empty {0} team name")]
    EmptyTeam(&'static str),

    #[error("home and away resolve to the same team ({0})")]
    SameTeam(String),

    #[error("score {home}-{away} does not fit a points total")]
    ScoreOverflow { home: u32, away: u32 },

    #[error("game date {date} is after today ({today})")]
    FutureDate { date: String, today: String },
}
