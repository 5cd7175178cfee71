use serde::{Deserialize, Serialize};

/// Total return (stake included) for a winning bet at American odds
/// Positive odds (+150) mean you win $150 on a $100 bet
/// Negative odds (-150) mean you need to bet $150 to win $100
pub fn payout(stake: f64, odds: i32) -> f64 {
    if odds > 0 {
        stake + stake * (odds as f64 / 100.0)
    } else {
        stake + stake / (odds.abs() as f64 / 100.0)
    }
}

/// Convert American odds to decimal odds
pub fn american_to_decimal(odds: i32) -> f64 {
    if odds > 0 {
        1.0 + odds as f64 / 100.0
    } else {
        1.0 + 100.0 / odds.abs() as f64
    }
}

/// Convert American odds to implied probability
pub fn american_odds_to_probability(odds: i32) -> f64 {
    if odds > 0 {
        // For positive odds: 100 / (odds + 100)
        100.0 / (odds as f64 + 100.0)
    } else {
        // For negative odds: |odds| / (|odds| + 100)
        let abs_odds = odds.abs() as f64;
        abs_odds / (abs_odds + 100.0)
    }
}

/// Convert probability to fair (no-vig) American odds
pub fn probability_to_american_odds(prob: f64) -> i32 {
    if prob >= 0.5 {
        // Favorite (negative odds)
        -((prob / (1.0 - prob)) * 100.0).round() as i32
    } else {
        // Underdog (positive odds)
        (((1.0 - prob) / prob) * 100.0).round() as i32
    }
}

/// Expected value of a bet, in currency and as a percentage of the stake
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExpectedValue {
    pub ev: f64,
    pub ev_percentage: f64,
    pub is_positive_ev: bool,
}

/// Calculate expected value for a bet
/// EV = (probability of winning * profit if won) - (probability of losing * stake)
pub fn calculate_expected_value(stake: f64, odds: i32, win_probability: f64) -> ExpectedValue {
    let profit = payout(stake, odds) - stake;
    let prob_lose = 1.0 - win_probability;

    let ev = (win_probability * profit) - (prob_lose * stake);
    // A zero stake has no meaningful percentage
    let ev_percentage = if stake > 0.0 { ev / stake * 100.0 } else { 0.0 };

    ExpectedValue {
        ev,
        ev_percentage,
        is_positive_ev: ev > 0.0,
    }
}
