use crate::models::{Bet, BetStatus};
use serde::{Deserialize, Serialize};

pub const DEFAULT_STARTING_BANKROLL: f64 = 1000.0;

/// A single point on the bankroll curve
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BankrollPoint {
    pub label: String,
    pub bankroll: f64,
}

/// Running bankroll replayed from settled bets, oldest first
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BankrollCurve {
    pub starting_bankroll: f64,
    pub points: Vec<BankrollPoint>,
    pub current_bankroll: f64,
    pub change: f64,
    pub change_percent: f64,
    pub is_up: bool,
    pub max_drawdown: f64,
}

impl BankrollCurve {
    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.bankroll).collect()
    }

    pub fn format(&self) -> String {
        format!(
            "Bankroll: ${:.2} -> ${:.2} | Change: {:+.2} ({:+.2}%) | Max drawdown: ${:.2} | {} settled bets",
            self.starting_bankroll,
            self.current_bankroll,
            self.change,
            self.change_percent,
            self.max_drawdown,
            self.points.len() - 1
        )
    }
}

/// Replay graded bets in settlement order into a bankroll curve.
///
/// Only won/lost/push bets with a settlement time count. Bets settled at the
/// same instant keep their order from `bets`. Returns `None` when nothing has
/// settled yet, so callers never draw a one-point chart.
pub fn reconstruct_bankroll(bets: &[Bet], starting_bankroll: f64) -> Option<BankrollCurve> {
    let mut settled: Vec<&Bet> = bets
        .iter()
        .filter(|b| b.status.is_graded() && b.settled_at.is_some())
        .collect();

    if settled.is_empty() {
        return None;
    }

    // sort_by_key is stable
    settled.sort_by_key(|b| b.settled_at);

    let mut running = starting_bankroll;
    let mut peak = starting_bankroll;
    let mut max_drawdown = 0.0_f64;
    let mut points = Vec::with_capacity(settled.len() + 1);
    points.push(BankrollPoint {
        label: "Start".to_string(),
        bankroll: starting_bankroll,
    });

    for bet in settled {
        match bet.status {
            BetStatus::Won => running += bet.actual_payout.unwrap_or(0.0) - bet.stake,
            BetStatus::Lost => running -= bet.stake,
            // Push returns the stake
            _ => {}
        }

        peak = peak.max(running);
        max_drawdown = max_drawdown.max(peak - running);

        let label = bet
            .settled_at
            .map(|t| t.format("%b %-d").to_string())
            .unwrap_or_default();
        points.push(BankrollPoint {
            label,
            bankroll: running,
        });
    }

    let change = running - starting_bankroll;
    let change_percent = if starting_bankroll != 0.0 {
        change / starting_bankroll * 100.0
    } else {
        0.0
    };

    Some(BankrollCurve {
        starting_bankroll,
        points,
        current_bankroll: running,
        change,
        change_percent,
        is_up: running >= starting_bankroll,
        max_drawdown,
    })
}
