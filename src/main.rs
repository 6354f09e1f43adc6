mod api;
mod cli;
mod config;
mod db;
mod error;
mod matcher;
mod normalize;
mod pipeline;
mod reconcile;
mod source;
mod types;
mod verify;

use chrono::{NaiveDate, Utc};
use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::api::routes::{router, ApiState};
use crate::cli::{Cli, Commands};
use crate::config::Config;
use crate::db::forecasts::ForecastStore;
use crate::db::models::NewForecast;
use crate::error::{AppError, Result};
use crate::pipeline::Reconciler;
use crate::source::{EspnSource, FileSource, GameSource};
use crate::types::{RunSummary, Sport};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let cfg = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Config error: {e}");
            std::process::exit(1);
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&cfg.log_level))
        .init();

    match run(cfg, cli.command).await {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            error!("Fatal error: {e}");
            std::process::exit(1);
        }
    }
}

/// Returns `Ok(false)` when the command completed but something it checked failed.
async fn run(cfg: Config, command: Commands) -> Result<bool> {
    let pool = db::connect(&cfg.db_path).await?;
    info!("Database ready at {}", cfg.db_path);

    match command {
        Commands::Run { sport, date, input, from, to } => {
            let sports = sport.map(|s| vec![s]).unwrap_or_else(|| cfg.sports.clone());
            let (from, to) = match (from, to) {
                (Some(from), Some(to)) => (from, to),
                _ => {
                    let date = date.unwrap_or_else(yesterday);
                    (date, date)
                }
            };
            let source: Box<dyn GameSource> = match input {
                Some(path) => Box::new(FileSource::new(path)),
                None => Box::new(EspnSource::new(&cfg.espn_api_url, cfg.http_timeout_secs)?),
            };

            let reconciler = Reconciler::new(pool, cfg.run_lock_stale_secs);
            let mut all_ok = true;
            for sport in sports {
                for (date, outcome) in reconciler.collect_range(source.as_ref(), sport, from, to).await? {
                    match outcome {
                        Ok(summary) => print_summary(&summary),
                        Err(e) => {
                            error!(sport = %sport, date = %date, "Run failed: {e}");
                            println!("{sport} {date}: FAILED ({e})");
                            all_ok = false;
                        }
                    }
                }
            }
            Ok(all_ok)
        }

        Commands::Reconcile => {
            let stats = Reconciler::new(pool, cfg.run_lock_stale_secs).reconcile_only().await?;
            println!(
                "scanned={} relinked={} reconciled={} correctness_filled={} conflicts={} swapped={}",
                stats.rows_scanned,
                stats.relinked,
                stats.rows_reconciled,
                stats.correctness_filled,
                stats.conflicts,
                stats.swapped
            );
            Ok(true)
        }

        Commands::Verify { from, to, sport } => {
            let report = verify::coverage(&pool, from, to, sport).await?;
            for day in &report.days {
                println!(
                    "{}  reconciled={} pending={} without_forecasts={} pending_rows={}",
                    day.date, day.reconciled, day.pending, day.without_forecasts, day.pending_rows
                );
            }
            let t = &report.totals;
            println!(
                "total  games={} reconciled={} pending={} without_forecasts={} pending_rows={}",
                t.games, t.reconciled, t.pending, t.without_forecasts, t.pending_rows
            );
            if !report.is_healthy() {
                warn!(pending = t.pending, "Some games still have unreconciled forecasts");
            }
            Ok(report.is_healthy())
        }

        Commands::Serve => {
            let app = router(ApiState { pool });
            let bind_addr = format!("0.0.0.0:{}", cfg.api_port);
            let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
            info!("HTTP API listening on {bind_addr}");
            axum::serve(listener, app).await?;
            Ok(true)
        }

        Commands::ImportForecasts { file } => {
            let body = tokio::fs::read_to_string(&file).await?;
            let rows: Vec<NewForecast> = serde_json::from_str(&body)?;
            for r in &rows {
                r.sport
                    .parse::<Sport>()
                    .map_err(|e| AppError::BadRequest(format!("{} / {}: {e}", r.game_id, r.market_descriptor)))?;
            }
            let added = ForecastStore::new(pool).import(&rows).await?;
            info!(file = %file.display(), rows = rows.len(), added, "Forecasts imported");
            println!("imported {added} of {} forecast rows", rows.len());
            Ok(true)
        }
    }
}

fn yesterday() -> NaiveDate {
    let today = Utc::now().date_naive();
    today.pred_opt().unwrap_or(today)
}

fn print_summary(s: &RunSummary) {
    println!(
        "{} {}: fetched={} inserted={} duplicates={} backfilled={} matched={} unmatched={} relinked={} reconciled={} correctness_filled={} conflicts={} errors={}",
        s.sport,
        s.date,
        s.fetched,
        s.inserted,
        s.skipped_duplicate,
        s.backfilled,
        s.matched,
        s.unmatched,
        s.relinked,
        s.rows_reconciled,
        s.correctness_filled,
        s.conflicts,
        s.errors.len(),
    );
    for e in &s.errors {
        println!("  {}: {}", e.key, e.reason);
    }
}
