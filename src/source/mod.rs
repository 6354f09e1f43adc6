//! Where completed games come from.

pub mod espn;

use std::path::PathBuf;

use async_trait::async_trait;
use chrono::NaiveDate;
use tracing::debug;

use crate::error::{AppError, Result};
use crate::types::{RawGame, Sport};

pub use espn::EspnSource;

/// A provider of games for one sport and date, in any status.
/// Validation happens downstream.
#[async_trait]
pub trait GameSource: Send + Sync {
    async fn fetch_games(&self, sport: Sport, date: NaiveDate) -> Result<Vec<RawGame>>;
}

/// Games read from a JSON array of [`RawGame`] on disk. The file is trusted
/// to hold games of the requested sport; only the date is filtered.
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl GameSource for FileSource {
    async fn fetch_games(&self, sport: Sport, date: NaiveDate) -> Result<Vec<RawGame>> {
        let body = tokio::fs::read_to_string(&self.path).await?;
        let games: Vec<RawGame> = serde_json::from_str(&body).map_err(|e| {
            AppError::Source(format!("{}: {e}", self.path.display()))
        })?;
        let games: Vec<RawGame> = games.into_iter().filter(|g| g.date == date).collect();
        debug!(sport = %sport, date = %date, games = games.len(), path = %self.path.display(), "Games read from file");
        Ok(games)
    }
}
