use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};

use crate::types::Sport;

#[derive(Parser)]
#[command(name = "reconcile")]
#[command(version)]
#[command(about = "Reconcile stored sports forecasts with final game results", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Fetch final games, match them to forecasts and reconcile
    Run {
        /// Only this sport (default: every sport in RECONCILE_SPORTS)
        #[arg(short, long, value_enum)]
        sport: Option<Sport>,
        /// Game date, YYYY-MM-DD (default: yesterday, UTC)
        #[arg(short, long)]
        date: Option<NaiveDate>,
        /// First date of a backfill range; needs --to
        #[arg(long, requires = "to", conflicts_with = "date")]
        from: Option<NaiveDate>,
        /// Last date of a backfill range, inclusive
        #[arg(long, requires = "from")]
        to: Option<NaiveDate>,
        /// Read games from a JSON file instead of the ESPN scoreboard
        #[arg(short, long)]
        input: Option<PathBuf>,
    },
    /// Rebuild the forecast table from results already stored
    Reconcile,
    /// Report reconciliation coverage for a date range
    Verify {
        #[arg(long)]
        from: NaiveDate,
        #[arg(long)]
        to: NaiveDate,
        #[arg(short, long, value_enum)]
        sport: Option<Sport>,
    },
    /// Serve the read-only HTTP API
    Serve,
    /// Append forecast rows from a JSON array; repeated (game, market) pairs are ignored
    ImportForecasts {
        file: PathBuf,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_accepts_sport_and_date() {
        let cli = Cli::try_parse_from(["reconcile", "run", "--sport", "nhl", "--date", "2025-12-08"]).unwrap();
        match cli.command {
            Commands::Run { sport, date, input, from, to } => {
                assert_eq!(sport, Some(Sport::Nhl));
                assert_eq!(date, NaiveDate::from_ymd_opt(2025, 12, 8));
                assert!(input.is_none());
                assert!(from.is_none() && to.is_none());
            }
            _ => panic!("expected run"),
        }
    }

    #[test]
    fn run_accepts_a_backfill_range() {
        let cli = Cli::try_parse_from(["reconcile", "run", "--from", "2025-12-01", "--to", "2025-12-08"]).unwrap();
        match cli.command {
            Commands::Run { date, from, to, .. } => {
                assert!(date.is_none());
                assert_eq!(from, NaiveDate::from_ymd_opt(2025, 12, 1));
                assert_eq!(to, NaiveDate::from_ymd_opt(2025, 12, 8));
            }
            _ => panic!("expected run"),
        }
    }

    #[test]
    fn backfill_range_needs_both_ends_and_no_date() {
        assert!(Cli::try_parse_from(["reconcile", "run", "--from", "2025-12-01"]).is_err());
        assert!(Cli::try_parse_from(["reconcile", "run", "--to", "2025-12-08"]).is_err());
        assert!(Cli::try_parse_from([
            "reconcile", "run", "--date", "2025-12-05", "--from", "2025-12-01", "--to", "2025-12-08",
        ])
        .is_err());
    }

    #[test]
    fn verify_requires_a_range() {
        assert!(Cli::try_parse_from(["reconcile", "verify", "--from", "2025-12-01"]).is_err());
        assert!(Cli::try_parse_from(["reconcile", "verify", "--from", "2025-12-01", "--to", "2025-12-08"]).is_ok());
    }

    #[test]
    fn unknown_sport_is_rejected() {
        assert!(Cli::try_parse_from(["reconcile", "run", "--sport", "mlb"]).is_err());
    }

    #[test]
    fn import_takes_a_file() {
        let cli = Cli::try_parse_from(["reconcile", "import-forecasts", "forecasts.json"]).unwrap();
        assert!(matches!(cli.command, Commands::ImportForecasts { .. }));
    }
}
