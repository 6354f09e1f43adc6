use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::source::GameSource;
use crate::types::{GameStatus, RawGame, Sport};

/// Scoreboard client for the public ESPN site API.
pub struct EspnSource {
    client: reqwest::Client,
    base_url: String,
}

impl EspnSource {
    pub fn new(base_url: &str, timeout_secs: u64) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn scoreboard_url(&self, sport: Sport, date: NaiveDate) -> String {
        format!(
            "{}/{}/scoreboard?dates={}",
            self.base_url,
            league_path(sport),
            date.format("%Y%m%d")
        )
    }
}

#[async_trait]
impl GameSource for EspnSource {
    async fn fetch_games(&self, sport: Sport, date: NaiveDate) -> Result<Vec<RawGame>> {
        let url = self.scoreboard_url(sport, date);
        debug!(url = %url, "Fetching scoreboard");

        let body = self
            .client
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        let games = parse_scoreboard(date, &body)?;
        info!(sport = %sport, date = %date, games = games.len(), "Scoreboard fetched");
        Ok(games)
    }
}

fn league_path(sport: Sport) -> &'static str {
    match sport {
        Sport::Nba => "basketball/nba",
        Sport::Nhl => "hockey/nhl",
        Sport::Nfl => "football/nfl",
    }
}

/// Turn a scoreboard response into raw games stamped with `date`.
/// Events missing a competition or either side are skipped with a warning.
pub fn parse_scoreboard(date: NaiveDate, body: &str) -> Result<Vec<RawGame>> {
    let resp: ScoreboardResponse = serde_json::from_str(body)?;

    let mut games = Vec::new();
    for event in resp.events.unwrap_or_default() {
        match event_to_game(date, &event) {
            Some(g) => games.push(g),
            None => warn!(
                event_id = event.id.as_deref().unwrap_or("?"),
                name = event.name.as_deref().unwrap_or("?"),
                "Skipping malformed scoreboard event"
            ),
        }
    }
    Ok(games)
}

fn event_to_game(date: NaiveDate, event: &EspnEvent) -> Option<RawGame> {
    let competition = event.competitions.as_ref()?.first()?;
    let competitors = competition.competitors.as_ref()?;
    let side = |which: &str| {
        competitors
            .iter()
            .find(|c| c.home_away.as_deref() == Some(which))
    };
    let home = side("home")?;
    let away = side("away")?;

    let venue = competition
        .venue
        .as_ref()
        .or(event.venue.as_ref())
        .and_then(|v| v.full_name.clone());

    Some(RawGame {
        date,
        home_team: home.team.as_ref()?.display_name.clone()?,
        away_team: away.team.as_ref()?.display_name.clone()?,
        home_score: parse_score(home.score.as_deref()),
        away_score: parse_score(away.score.as_deref()),
        venue,
        status: status_of(event),
    })
}

fn parse_score(raw: Option<&str>) -> Option<u32> {
    raw.map(str::trim).filter(|s| !s.is_empty())?.parse().ok()
}

/// Only `completed` or an explicit final status name counts as Final.
/// ESPN also reports postponed and cancelled games with state "post".
fn status_of(event: &EspnEvent) -> GameStatus {
    let Some(t) = event.status.as_ref().and_then(|s| s.status_type.as_ref()) else {
        return GameStatus::Scheduled;
    };
    match t.name.as_deref() {
        Some("STATUS_POSTPONED" | "STATUS_CANCELLED" | "STATUS_CANCELED" | "STATUS_SUSPENDED") => {
            return GameStatus::Postponed;
        }
        Some("STATUS_FINAL" | "STATUS_FINAL_OT") => return GameStatus::Final,
        Some("STATUS_IN_PROGRESS" | "STATUS_HALFTIME" | "STATUS_END_PERIOD") => {
            return GameStatus::InProgress;
        }
        _ => {}
    }
    if t.completed == Some(true) {
        return GameStatus::Final;
    }
    match t.state.as_deref() {
        Some("in") => GameStatus::InProgress,
        Some("post") => GameStatus::Postponed,
        _ => GameStatus::Scheduled,
    }
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, Default)]
struct ScoreboardResponse {
    events: Option<Vec<EspnEvent>>,
}

#[derive(Debug, Deserialize, Default)]
struct EspnEvent {
    id: Option<String>,
    name: Option<String>,
    status: Option<EspnStatus>,
    competitions: Option<Vec<EspnCompetition>>,
    venue: Option<EspnVenue>,
}

#[derive(Debug, Deserialize)]
struct EspnStatus {
    #[serde(rename = "type")]
    status_type: Option<EspnStatusType>,
}

#[derive(Debug, Deserialize)]
struct EspnStatusType {
    /// "STATUS_FINAL", "STATUS_POSTPONED", ...
    name: Option<String>,
    /// "pre" | "in" | "post"
    state: Option<String>,
    completed: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct EspnCompetition {
    competitors: Option<Vec<EspnCompetitor>>,
    venue: Option<EspnVenue>,
}

#[derive(Debug, Deserialize)]
struct EspnCompetitor {
    #[serde(rename = "homeAway")]
    home_away: Option<String>,
    team: Option<EspnTeam>,
    /// ESPN sends scores as strings.
    score: Option<String>,
}

#[derive(Debug, Deserialize)]
struct EspnTeam {
    #[serde(rename = "displayName")]
    display_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct EspnVenue {
    #[serde(rename = "fullName")]
    full_name: Option<String>,
}
