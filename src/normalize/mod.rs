//! Team name canonicalization.
//!
//! Every sport has its own alias table, so a nickname shared across leagues
//! ("Panthers", "Kings", "Jets") resolves differently per sport and never
//! collides. Lookup folds case, whitespace and punctuation, then tries the
//! name as written and with an abbreviated city prefix expanded.

mod teams;

use std::collections::HashMap;

use crate::types::Sport;

/// City abbreviations that only make sense at the start of a multi-word name.
const CITY_PREFIXES: &[(&str, &str)] = &[
    ("la", "los angeles"),
    ("ny", "new york"),
    ("nj", "new jersey"),
    ("sf", "san francisco"),
    ("sj", "san jose"),
    ("gs", "golden state"),
    ("okc", "oklahoma city"),
    ("kc", "kansas city"),
    ("tb", "tampa bay"),
    ("lv", "las vegas"),
];

/// Result of canonicalizing one raw team name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TeamName {
    Known(&'static str),
    /// Not in the sport's table; carries the raw name with whitespace collapsed.
    Unrecognized(String),
}

impl TeamName {
    pub fn as_str(&self) -> &str {
        match self {
            TeamName::Known(name) => *name,
            TeamName::Unrecognized(name) => name.as_str(),
        }
    }

    pub fn into_string(self) -> String {
        match self {
            TeamName::Known(name) => name.to_string(),
            TeamName::Unrecognized(name) => name,
        }
    }

    pub fn is_known(&self) -> bool {
        matches!(self, TeamName::Known(_))
    }
}

pub struct TeamNormalizer {
    tables: HashMap<Sport, HashMap<String, &'static str>>,
}

impl TeamNormalizer {
    pub fn new() -> Self {
        let tables = Sport::ALL
            .into_iter()
            .map(|sport| (sport, build_lookup(table_for(sport))))
            .collect();
        Self { tables }
    }

    /// Map a raw team name to its canonical form. Never fails.
    pub fn canonicalize(&self, sport: Sport, raw: &str) -> TeamName {
        let folded = fold(raw);
        let Some(lookup) = self.tables.get(&sport) else {
            return TeamName::Unrecognized(collapse_whitespace(raw));
        };

        if let Some(name) = lookup.get(&folded) {
            return TeamName::Known(*name);
        }
        if let Some(expanded) = expand_city_prefix(&folded) {
            if let Some(name) = lookup.get(&expanded) {
                return TeamName::Known(*name);
            }
        }
        TeamName::Unrecognized(collapse_whitespace(raw))
    }
}

impl Default for TeamNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

fn table_for(sport: Sport) -> teams::TeamTable {
    match sport {
        Sport::Nba => teams::NBA,
        Sport::Nhl => teams::NHL,
        Sport::Nfl => teams::NFL,
    }
}

fn build_lookup(table: teams::TeamTable) -> HashMap<String, &'static str> {
    let mut lookup = HashMap::new();
    for (canonical, aliases) in table {
        lookup.insert(fold(canonical), *canonical);
        for alias in *aliases {
            lookup.entry(fold(alias)).or_insert(*canonical);
        }
    }
    lookup
}

/// Lowercase, drop dots and apostrophes, turn other punctuation into spaces,
/// collapse whitespace. "L.A. Clippers" and "la  clippers" fold identically.
fn fold(raw: &str) -> String {
    let cleaned: String = raw
        .chars()
        .filter(|c| *c != '.' && *c != '\'' && *c != '’')
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();
    cleaned.to_lowercase().split_whitespace().collect::<Vec<_>>().join(" ")
}

fn collapse_whitespace(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn expand_city_prefix(folded: &str) -> Option<String> {
    let (first, rest) = folded.split_once(' ')?;
    CITY_PREFIXES
        .iter()
        .find(|(abbr, _)| *abbr == first)
        .map(|(_, city)| format!("{city} {rest}"))
}
