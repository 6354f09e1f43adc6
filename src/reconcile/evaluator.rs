//! Scores one predictor's bets against the actual outcome.
//!
//! Every output is `None` unless both the bet and the actual are known.

/// Whether an over/under bet was right.
pub fn over_under_correct(over_bet: Option<bool>, actual_over: Option<bool>) -> Option<bool> {
    Some(over_bet? == actual_over?)
}

/// Whether a moneyline (home win) bet was right.
pub fn moneyline_correct(home_win_bet: Option<bool>, actual_home_win: Option<bool>) -> Option<bool> {
    Some(home_win_bet? == actual_home_win?)
}

/// Correctness of one predictor on one forecast row.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Verdict {
    pub over_correct: Option<bool>,
    pub home_win_correct: Option<bool>,
}

/// One predictor's bets on a forecast row.
#[derive(Debug, Clone, Copy, Default)]
pub struct Bets {
    pub over: Option<bool>,
    pub home_win: Option<bool>,
}

pub fn evaluate(bets: Bets, actual_over: Option<bool>, actual_home_win: Option<bool>) -> Verdict {
    Verdict {
        over_correct: over_under_correct(bets.over, actual_over),
        home_win_correct: moneyline_correct(bets.home_win, actual_home_win),
    }
}
