use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use chrono::NaiveDate;
use serde::Deserialize;

use crate::api::health::health;
use crate::db::models::GameResultRow;
use crate::db::results::ResultStore;
use crate::error::AppError;
use crate::types::Sport;
use crate::verify::{coverage, CoverageReport};

#[derive(Clone)]
pub struct ApiState {
    pub pool: sqlx::SqlitePool,
}

pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/coverage", get(get_coverage))
        .route("/results", get(get_results))
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Query param structs
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
pub struct CoverageQuery {
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub sport: Option<Sport>,
}

#[derive(Deserialize)]
pub struct ResultsQuery {
    pub date: NaiveDate,
    pub sport: Option<Sport>,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn get_coverage(
    State(state): State<ApiState>,
    Query(params): Query<CoverageQuery>,
) -> Result<Json<CoverageReport>, AppError> {
    let report = coverage(&state.pool, params.from, params.to, params.sport).await?;
    Ok(Json(report))
}

async fn get_results(
    State(state): State<ApiState>,
    Query(params): Query<ResultsQuery>,
) -> Result<Json<Vec<GameResultRow>>, AppError> {
    let rows = ResultStore::new(state.pool.clone())
        .by_date(params.date, params.sport)
        .await?;
    Ok(Json(rows))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    async fn get(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
        let resp = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = resp.status();
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
        (status, body)
    }

    async fn app() -> (sqlx::SqlitePool, Router) {
        let pool = test_pool().await;
        sqlx::query(
            "INSERT INTO game_results (sport, game_date, home_team, away_team, home_score, away_score, points_total, venue, game_id, inserted_at)
             VALUES ('nba', '2025-12-08', 'Boston Celtics', 'Los Angeles Lakers', 126, 105, 231, 'TD Garden', NULL, '2025-12-09T00:00:00Z'),
                    ('nhl', '2025-12-08', 'Boston Bruins', 'Florida Panthers', 3, 2, 5, 'TD Garden', NULL, '2025-12-09T00:00:00Z')",
        )
        .execute(&pool)
        .await
        .unwrap();
        (pool.clone(), router(ApiState { pool }))
    }

    #[tokio::test]
    async fn health_reports_database_and_backlog() {
        let (_pool, app) = app().await;
        let (status, body) = get(app, "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["database"], true);
        assert_eq!(body["pending_forecast_rows"], 0);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn health_is_unavailable_when_pool_is_closed() {
        let (pool, app) = app().await;
        pool.close().await;
        let (status, body) = get(app, "/health").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["database"], false);
    }

    #[tokio::test]
    async fn results_filter_by_sport() {
        let (_pool, app) = app().await;
        let (status, body) = get(app.clone(), "/results?date=2025-12-08").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 2);

        let (_, body) = get(app, "/results?date=2025-12-08&sport=nhl").await;
        let rows = body.as_array().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["home_team"], "Boston Bruins");
    }

    #[tokio::test]
    async fn coverage_lists_days() {
        let (_pool, app) = app().await;
        let (status, body) = get(app, "/coverage?from=2025-12-01&to=2025-12-08&sport=nba").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["totals"]["games"], 1);
        assert_eq!(body["totals"]["without_forecasts"], 1);
        assert_eq!(body["days"][0]["date"], "2025-12-08");
    }

    #[tokio::test]
    async fn bad_parameters_are_client_errors() {
        let (_pool, app) = app().await;
        let (status, _) = get(app.clone(), "/coverage?from=2025-12-09&to=2025-12-08").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = get(app, "/results?date=yesterday").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
