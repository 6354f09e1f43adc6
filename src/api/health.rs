//! `/health`: database reachability plus the reconciliation backlog.

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use tracing::warn;

use crate::api::routes::ApiState;
use crate::verify::pending_forecast_rows;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub database: bool,
    /// Linked forecast rows still lacking actuals; absent when the database is down.
    pub pending_forecast_rows: Option<i64>,
}

pub async fn health(State(state): State<ApiState>) -> (StatusCode, Json<HealthResponse>) {
    let ping = sqlx::query_scalar::<_, i64>("SELECT 1").fetch_one(&state.pool).await;
    if let Err(e) = ping {
        warn!("Health check: database unreachable: {e}");
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(HealthResponse {
                status: "unavailable",
                database: false,
                pending_forecast_rows: None,
            }),
        );
    }

    match pending_forecast_rows(&state.pool).await {
        Ok(pending) => (
            StatusCode::OK,
            Json(HealthResponse {
                status: if pending == 0 { "ok" } else { "pending" },
                database: true,
                pending_forecast_rows: Some(pending),
            }),
        ),
        Err(e) => {
            warn!("Health check: pending row count failed: {e}");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthResponse {
                    status: "unavailable",
                    database: true,
                    pending_forecast_rows: None,
                }),
            )
        }
    }
}
