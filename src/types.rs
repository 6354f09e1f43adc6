use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::GameRejection;
use crate::normalize::TeamNormalizer;

// ---------------------------------------------------------------------------
// Sport
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Sport {
    Nba,
    Nhl,
    Nfl,
}

impl Sport {
    pub const ALL: [Sport; 3] = [Sport::Nba, Sport::Nhl, Sport::Nfl];

    pub fn as_str(&self) -> &'static str {
        match self {
            Sport::Nba => "nba",
            Sport::Nhl => "nhl",
            Sport::Nfl => "nfl",
        }
    }
}

impl std::fmt::Display for Sport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Sport {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "nba" => Ok(Sport::Nba),
            "nhl" => Ok(Sport::Nhl),
            "nfl" => Ok(Sport::Nfl),
            other => Err(format!("unknown sport '{other}'")),
        }
    }
}

// ---------------------------------------------------------------------------
// Raw games, as yielded by a source
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameStatus {
    Scheduled,
    InProgress,
    Final,
    /// Postponed, cancelled or suspended.
    Postponed,
}

impl std::fmt::Display for GameStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            GameStatus::Scheduled => "scheduled",
            GameStatus::InProgress => "in_progress",
            GameStatus::Final => "final",
            GameStatus::Postponed => "postponed",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawGame {
    pub date: NaiveDate,
    pub home_team: String,
    pub away_team: String,
    pub home_score: Option<u32>,
    pub away_score: Option<u32>,
    #[serde(default)]
    pub venue: Option<String>,
    pub status: GameStatus,
}

// ---------------------------------------------------------------------------
// Game results
// ---------------------------------------------------------------------------

/// Natural identity of a game: sport, date and canonical team names.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NaturalKey {
    pub sport: Sport,
    pub date: NaiveDate,
    pub home_team: String,
    pub away_team: String,
}

impl std::fmt::Display for NaturalKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {} {} @ {}",
            self.sport, self.date, self.away_team, self.home_team
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GameResult {
    pub key: NaturalKey,
    pub home_score: u32,
    pub away_score: u32,
    pub points_total: u32,
    pub venue: String,
    /// Identifier minted by the forecasting process; `None` until matched.
    pub game_id: Option<String>,
}

/// A validated game plus any team names the normalizer did not recognize.
#[derive(Debug, Clone)]
pub struct ValidatedGame {
    pub result: GameResult,
    pub unrecognized: Vec<String>,
}

impl GameResult {
    /// Validate a raw game and canonicalize its team names.
    pub fn from_raw(
        sport: Sport,
        raw: &RawGame,
        normalizer: &TeamNormalizer,
        today: NaiveDate,
    ) -> std::result::Result<ValidatedGame, GameRejection> {
        if raw.status != GameStatus::Final {
            return Err(GameRejection::NotFinal(raw.status.to_string()));
        }
        if raw.date > today {
            return Err(GameRejection::FutureDate {
                date: raw.date.to_string(),
                today: today.to_string(),
            });
        }
        if raw.home_team.trim().is_empty() {
            return Err(GameRejection::EmptyTeam("home"));
        }
        if raw.away_team.trim().is_empty() {
            return Err(GameRejection::EmptyTeam("away"));
        }
        let home_score = raw.home_score.ok_or(GameRejection::MissingScore("home"))?;
        let away_score = raw.away_score.ok_or(GameRejection::MissingScore("away"))?;
        let points_total = home_score
            .checked_add(away_score)
            .ok_or(GameRejection::ScoreOverflow { home: home_score, away: away_score })?;

        let home = normalizer.canonicalize(sport, &raw.home_team);
        let away = normalizer.canonicalize(sport, &raw.away_team);
        if home.as_str() == away.as_str() {
            return Err(GameRejection::SameTeam(home.as_str().to_string()));
        }

        let unrecognized = [&home, &away]
            .into_iter()
            .filter(|t| !t.is_known())
            .map(|t| t.as_str().to_string())
            .collect();

        Ok(ValidatedGame {
            result: GameResult {
                key: NaturalKey {
                    sport,
                    date: raw.date,
                    home_team: home.into_string(),
                    away_team: away.into_string(),
                },
                home_score,
                away_score,
                points_total,
                venue: raw
                    .venue
                    .as_deref()
                    .map(str::trim)
                    .filter(|v| !v.is_empty())
                    .unwrap_or("Unknown Venue")
                    .to_string(),
                game_id: None,
            },
            unrecognized,
        })
    }

    pub fn home_win(&self) -> bool {
        self.home_score > self.away_score
    }
}

// ---------------------------------------------------------------------------
// Stage statistics
// ---------------------------------------------------------------------------

/// A single row that failed without aborting its batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowError {
    pub key: String,
    pub reason: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MatchStats {
    pub matched: usize,
    pub unmatched: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WriteStats {
    pub inserted: usize,
    pub skipped_duplicate: usize,
    /// Existing results whose missing identifier was filled by this batch.
    pub backfilled: usize,
    pub errors: Vec<RowError>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileStats {
    pub rows_scanned: usize,
    /// Rows with at least one actual-outcome field going from null to set.
    pub rows_reconciled: usize,
    /// Correctness fields going from null to set, across all rows.
    pub correctness_filled: usize,
    /// Stored values that disagree with what the results now imply.
    pub conflicts: usize,
    /// Whether the forecast table was actually replaced.
    pub swapped: bool,
    /// Stored results that gained an identifier before the rebuild.
    pub relinked: usize,
}

/// Outcome of one `collect_and_reconcile` run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub sport: Sport,
    pub date: NaiveDate,
    pub fetched: usize,
    pub inserted: usize,
    pub skipped_duplicate: usize,
    pub backfilled: usize,
    pub matched: usize,
    pub unmatched: usize,
    pub relinked: usize,
    pub rows_reconciled: usize,
    pub correctness_filled: usize,
    pub conflicts: usize,
    pub errors: Vec<RowError>,
}
