use crate::error::{AppError, Result};
use crate::types::Sport;

pub const ESPN_API_URL: &str = "https://site.api.espn.com/apis/site/v2/sports";

/// Live forecast table. Only the reconciliation compiler replaces it.
pub const FORECASTS_TABLE: &str = "forecasts";

/// Shadow table the compiler builds before swapping it in.
pub const FORECASTS_SHADOW_TABLE: &str = "forecasts_rebuild";

/// Name of the single lock row that serializes reconciliation runs.
pub const RUN_LOCK_NAME: &str = "reconcile";

/// A lock older than this is considered abandoned (default 6h).
pub const DEFAULT_RUN_LOCK_STALE_SECS: u64 = 6 * 3_600;

/// HTTP timeout for scoreboard requests (seconds).
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone)]
pub struct Config {
    pub log_level: String,
    pub db_path: String,
    pub api_port: u16,
    /// Base URL of the ESPN site API (ESPN_API_URL)
    pub espn_api_url: String,
    /// Timeout for each scoreboard request (HTTP_TIMEOUT_SECS)
    pub http_timeout_secs: u64,
    /// Sports processed by `run` when no --sport is given (RECONCILE_SPORTS, comma-separated).
    pub sports: Vec<Sport>,
    /// Age after which a held run lock may be taken over (RUN_LOCK_STALE_SECS)
    pub run_lock_stale_secs: u64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            db_path: std::env::var("DB_PATH").unwrap_or_else(|_| "reconcile.db".to_string()),
            api_port: std::env::var("API_PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse::<u16>()
                .map_err(|_| AppError::Config("API_PORT must be a valid port number".to_string()))?,
            espn_api_url: std::env::var("ESPN_API_URL")
                .unwrap_or_else(|_| ESPN_API_URL.to_string()),
            http_timeout_secs: std::env::var("HTTP_TIMEOUT_SECS")
                .unwrap_or_else(|_| DEFAULT_HTTP_TIMEOUT_SECS.to_string())
                .parse::<u64>()
                .map_err(|_| AppError::Config("HTTP_TIMEOUT_SECS must be a whole number".to_string()))?,
            sports: parse_sports(&std::env::var("RECONCILE_SPORTS").unwrap_or_default())?,
            run_lock_stale_secs: std::env::var("RUN_LOCK_STALE_SECS")
                .unwrap_or_else(|_| DEFAULT_RUN_LOCK_STALE_SECS.to_string())
                .parse::<u64>()
                .map_err(|_| AppError::Config("RUN_LOCK_STALE_SECS must be a whole number".to_string()))?,
        })
    }
}

/// Empty input means every supported sport.
fn parse_sports(raw: &str) -> Result<Vec<Sport>> {
    let sports = raw
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<Sport>().map_err(AppError::Config))
        .collect::<Result<Vec<_>>>()?;

    if sports.is_empty() {
        Ok(Sport::ALL.to_vec())
    } else {
        Ok(sports)
    }
}
