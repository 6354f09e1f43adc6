use crate::db::models::{ForecastRow, GameResultRow};
use crate::reconcile::evaluator::{evaluate, Bets};

/// Final score of a game, as joined onto forecast rows by identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Outcome {
    pub home_score: i64,
    pub away_score: i64,
    pub points_total: i64,
}

impl From<&GameResultRow> for Outcome {
    fn from(r: &GameResultRow) -> Self {
        Self {
            home_score: r.home_score,
            away_score: r.away_score,
            points_total: r.points_total,
        }
    }
}

/// A stored value that disagrees with what the result now implies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldConflict {
    pub field: &'static str,
    pub stored: String,
    pub derived: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MergedRow {
    pub row: ForecastRow,
    /// At least one actual-outcome column went from null to set.
    pub actuals_filled: bool,
    /// Correctness columns that went from null to set.
    pub correctness_filled: usize,
    pub conflicts: Vec<FieldConflict>,
}

impl MergedRow {
    pub fn changed(&self) -> bool {
        self.actuals_filled || self.correctness_filled > 0
    }
}

/// Merge the derived actuals and bet correctness into a forecast row.
///
/// Existing non-null values always win. A derived value that differs from
/// a stored one is reported as a conflict and dropped.
pub fn merge_row(existing: &ForecastRow, outcome: Option<&Outcome>) -> MergedRow {
    let mut row = existing.clone();
    let mut conflicts = Vec::new();

    let derived = outcome.map(|o| Derived::new(o, existing.points_total_line));
    let d = derived.unwrap_or_default();

    let mut actuals_filled = false;
    actuals_filled |= fill("actual_away_points", &mut row.actual_away_points, d.away, &mut conflicts);
    actuals_filled |= fill("actual_home_points", &mut row.actual_home_points, d.home, &mut conflicts);
    actuals_filled |= fill("actual_points_total", &mut row.actual_points_total, d.total, &mut conflicts);
    actuals_filled |= fill("actual_home_win", &mut row.actual_home_win, d.home_win, &mut conflicts);
    actuals_filled |= fill(
        "actual_points_total_over",
        &mut row.actual_points_total_over,
        d.over,
        &mut conflicts,
    );

    // Correctness is scored against the merged actuals, not the derived ones.
    let model = evaluate(
        Bets { over: row.model_over_bet, home_win: row.model_home_win_bet },
        row.actual_points_total_over,
        row.actual_home_win,
    );
    let market = evaluate(
        Bets { over: row.market_over_bet, home_win: row.market_home_win_bet },
        row.actual_points_total_over,
        row.actual_home_win,
    );

    let correctness_filled = [
        fill("model_over_correct", &mut row.model_over_correct, model.over_correct, &mut conflicts),
        fill("model_home_win_correct", &mut row.model_home_win_correct, model.home_win_correct, &mut conflicts),
        fill("market_over_correct", &mut row.market_over_correct, market.over_correct, &mut conflicts),
        fill("market_home_win_correct", &mut row.market_home_win_correct, market.home_win_correct, &mut conflicts),
    ]
    .into_iter()
    .filter(|filled| *filled)
    .count();

    MergedRow {
        row,
        actuals_filled,
        correctness_filled,
        conflicts,
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct Derived {
    away: Option<i64>,
    home: Option<i64>,
    total: Option<i64>,
    home_win: Option<bool>,
    over: Option<bool>,
}

impl Derived {
    fn new(o: &Outcome, line: Option<f64>) -> Self {
        Self {
            away: Some(o.away_score),
            home: Some(o.home_score),
            total: Some(o.points_total),
            // A tie is not a home win.
            home_win: Some(o.home_score > o.away_score),
            // Landing exactly on the line is not over.
            over: line.map(|l| o.points_total as f64 > l),
        }
    }
}

/// First write wins. Returns true when the slot went from null to set.
fn fill<T>(field: &'static str, slot: &mut Option<T>, derived: Option<T>, conflicts: &mut Vec<FieldConflict>) -> bool
where
    T: Copy + PartialEq + std::fmt::Debug,
{
    match (*slot, derived) {
        (None, Some(v)) => {
            *slot = Some(v);
            true
        }
        (Some(stored), Some(v)) if stored != v => {
            conflicts.push(FieldConflict {
                field,
                stored: format!("{stored:?}"),
                derived: format!("{v:?}"),
            });
            false
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CELTICS_LAKERS: Outcome = Outcome { home_score: 126, away_score: 105, points_total: 231 };

    fn row(id: i64, line: Option<f64>) -> ForecastRow {
        ForecastRow {
            forecast_id: id,
            game_id: Some("g-1".to_string()),
            market_descriptor: format!("TOTAL-{id}"),
            points_total_line: line,
            model_home_win_bet: Some(true),
            model_over_bet: Some(true),
            market_home_win_bet: Some(false),
            market_over_bet: Some(false),
            ..Default::default()
        }
    }

    #[test]
    fn fills_actuals_and_over_per_line() {
        let low = merge_row(&row(1, Some(220.5)), Some(&CELTICS_LAKERS));
        let high = merge_row(&row(2, Some(235.5)), Some(&CELTICS_LAKERS));

        for m in [&low, &high] {
            assert!(m.actuals_filled);
            assert_eq!(m.row.actual_home_points, Some(126));
            assert_eq!(m.row.actual_away_points, Some(105));
            assert_eq!(m.row.actual_points_total, Some(231));
            assert_eq!(m.row.actual_home_win, Some(true));
            assert!(m.conflicts.is_empty());
        }
        assert_eq!(low.row.actual_points_total_over, Some(true));
        assert_eq!(high.row.actual_points_total_over, Some(false));
    }

    #[test]
    fn scores_both_predictors() {
        let m = merge_row(&row(1, Some(220.5)), Some(&CELTICS_LAKERS));
        assert_eq!(m.row.model_over_correct, Some(true));
        assert_eq!(m.row.model_home_win_correct, Some(true));
        assert_eq!(m.row.market_over_correct, Some(false));
        assert_eq!(m.row.market_home_win_correct, Some(false));
        assert_eq!(m.correctness_filled, 4);
    }

    #[test]
    fn stored_value_wins_and_is_reported() {
        let mut r = row(1, Some(220.5));
        r.actual_home_win = Some(false);

        let m = merge_row(&r, Some(&CELTICS_LAKERS));
        assert_eq!(m.row.actual_home_win, Some(false));
        assert_eq!(m.conflicts.len(), 1);
        assert_eq!(m.conflicts[0].field, "actual_home_win");
        // Moneyline is scored against the kept value.
        assert_eq!(m.row.model_home_win_correct, Some(false));
    }

    #[test]
    fn exact_line_is_not_over_and_tie_is_not_home_win() {
        let tie = Outcome { home_score: 110, away_score: 110, points_total: 220 };
        let m = merge_row(&row(1, Some(220.0)), Some(&tie));
        assert_eq!(m.row.actual_points_total_over, Some(false));
        assert_eq!(m.row.actual_home_win, Some(false));
    }

    #[test]
    fn missing_line_or_bet_leaves_correctness_null() {
        let mut r = row(1, None);
        r.market_home_win_bet = None;

        let m = merge_row(&r, Some(&CELTICS_LAKERS));
        assert_eq!(m.row.actual_points_total_over, None);
        assert_eq!(m.row.model_over_correct, None);
        assert_eq!(m.row.market_over_correct, None);
        assert_eq!(m.row.market_home_win_correct, None);
        assert_eq!(m.row.model_home_win_correct, Some(true));
        assert_eq!(m.correctness_filled, 1);
    }

    #[test]
    fn unmatched_row_is_unchanged() {
        let r = row(1, Some(220.5));
        let m = merge_row(&r, None);
        assert!(!m.changed());
        assert_eq!(m.row, r);
    }

    #[test]
    fn fully_reconciled_row_is_stable() {
        let first = merge_row(&row(1, Some(220.5)), Some(&CELTICS_LAKERS));
        let second = merge_row(&first.row, Some(&CELTICS_LAKERS));
        assert!(!second.changed());
        assert!(second.conflicts.is_empty());
    }
}
