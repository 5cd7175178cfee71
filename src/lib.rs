pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod utils;

pub use api::*;
pub use models::*;
pub use utils::*;

use serde::{Deserialize, Serialize};
use utils::bankroll::{reconstruct_bankroll, BankrollCurve};
use utils::stats::{calculate_stats, performance_report, PerformanceReport};

/// All the reporting we show for a bet collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dashboard {
    pub stats: BettingStats,
    pub bankroll: Option<BankrollCurve>,
    pub performance: PerformanceReport,
    pub pending_bets: usize,
    pub pending_stake: f64,
}

/// Recompute every report from the current snapshot of bets
pub fn build_dashboard(bets: &[Bet], starting_bankroll: f64) -> Dashboard {
    let pending: Vec<&Bet> = bets
        .iter()
        .filter(|b| b.status == BetStatus::Pending)
        .collect();

    Dashboard {
        stats: calculate_stats(bets),
        bankroll: reconstruct_bankroll(bets, starting_bankroll),
        performance: performance_report(bets),
        pending_bets: pending.len(),
        pending_stake: pending.iter().map(|b| b.stake).sum(),
    }
}
