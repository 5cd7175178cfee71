use crate::models::{Bet, BetStatus, BettingStats};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Minimum settled bets before a category can be called best or worst
pub const MIN_CATEGORY_SAMPLE: usize = 2;

/// Compute aggregate stats over the full bet collection
pub fn calculate_stats(bets: &[Bet]) -> BettingStats {
    let settled: Vec<&Bet> = bets.iter().filter(|b| b.status.is_graded()).collect();
    let won: Vec<&Bet> = bets.iter().filter(|b| b.status == BetStatus::Won).collect();
    let lost: Vec<&Bet> = bets.iter().filter(|b| b.status == BetStatus::Lost).collect();
    let push_bets = bets.iter().filter(|b| b.status == BetStatus::Push).count();

    let total_staked: f64 = settled.iter().map(|b| b.stake).sum();
    let total_returned: f64 = won.iter().map(|b| b.actual_payout.unwrap_or(0.0)).sum();
    let profit = total_returned - total_staked;
    let roi = if total_staked > 0.0 {
        profit / total_staked * 100.0
    } else {
        0.0
    };

    let win_rate = if settled.is_empty() {
        0.0
    } else {
        won.len() as f64 / settled.len() as f64 * 100.0
    };

    let average_odds = if settled.is_empty() {
        0.0
    } else {
        settled.iter().map(|b| b.odds as f64).sum::<f64>() / settled.len() as f64
    };

    let biggest_win = won
        .iter()
        .map(|b| b.actual_payout.unwrap_or(0.0) - b.stake)
        .fold(None, |max: Option<f64>, p| Some(max.map_or(p, |m| m.max(p))))
        .unwrap_or(0.0);

    let biggest_loss = lost.iter().map(|b| b.stake).fold(0.0, f64::max);

    BettingStats {
        total_bets: bets.len(),
        won_bets: won.len(),
        lost_bets: lost.len(),
        push_bets,
        total_staked,
        total_returned,
        profit,
        roi,
        win_rate,
        average_odds,
        biggest_win,
        biggest_loss,
    }
}

/// Record for one category in a breakdown table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BreakdownRow {
    pub label: String,
    pub wins: usize,
    pub losses: usize,
    pub pushes: usize,
    pub total: usize,
    pub win_rate: f64,
    pub profit: f64,
}

impl BreakdownRow {
    pub fn format(&self) -> String {
        format!(
            "{:<20} {}-{}-{} ({} bets) | Win rate: {:.1}% | Profit: {:+.2}",
            self.label,
            self.wins,
            self.losses,
            self.pushes,
            self.total,
            self.win_rate,
            self.profit
        )
    }
}

/// Group graded bets by `group_by` and tally each group.
/// Pushes are left out of the win-rate denominator. Rows come back with the
/// largest groups first; equal sizes keep first-seen order.
pub fn build_breakdown<F>(bets: &[Bet], group_by: F) -> Vec<BreakdownRow>
where
    F: Fn(&Bet) -> String,
{
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut rows: Vec<BreakdownRow> = Vec::new();

    for bet in bets.iter().filter(|b| b.status.is_graded()) {
        let key = group_by(bet);
        let i = *index.entry(key.clone()).or_insert_with(|| {
            rows.push(BreakdownRow {
                label: key,
                wins: 0,
                losses: 0,
                pushes: 0,
                total: 0,
                win_rate: 0.0,
                profit: 0.0,
            });
            rows.len() - 1
        });

        let row = &mut rows[i];
        match bet.status {
            BetStatus::Won => row.wins += 1,
            BetStatus::Lost => row.losses += 1,
            _ => row.pushes += 1,
        }
        row.profit += bet.profit();
    }

    for row in &mut rows {
        row.total = row.wins + row.losses + row.pushes;
        let decided = row.wins + row.losses;
        row.win_rate = if decided > 0 {
            row.wins as f64 / decided as f64 * 100.0
        } else {
            0.0
        };
    }

    rows.sort_by(|a, b| b.total.cmp(&a.total));
    rows
}

pub fn breakdown_by_sport(bets: &[Bet]) -> Vec<BreakdownRow> {
    build_breakdown(bets, |b| b.sport.label().to_string())
}

pub fn breakdown_by_bet_type(bets: &[Bet]) -> Vec<BreakdownRow> {
    build_breakdown(bets, |b| b.bet_type.label().to_string())
}

pub fn breakdown_by_confidence(bets: &[Bet]) -> Vec<BreakdownRow> {
    build_breakdown(bets, |b| match b.confidence {
        Some(c) => format!("{}/5 Confidence", c),
        None => "No Rating".to_string(),
    })
}

/// Highest win-rate row with enough sample; the first one wins ties
pub fn best_category(rows: &[BreakdownRow]) -> Option<&BreakdownRow> {
    let mut best: Option<&BreakdownRow> = None;
    for row in rows.iter().filter(|r| r.total >= MIN_CATEGORY_SAMPLE) {
        if best.map_or(true, |b| row.win_rate > b.win_rate) {
            best = Some(row);
        }
    }
    best
}

/// Lowest win-rate row with enough sample; the first one wins ties
pub fn worst_category(rows: &[BreakdownRow]) -> Option<&BreakdownRow> {
    let mut worst: Option<&BreakdownRow> = None;
    for row in rows.iter().filter(|r| r.total >= MIN_CATEGORY_SAMPLE) {
        if worst.map_or(true, |w| row.win_rate < w.win_rate) {
            worst = Some(row);
        }
    }
    worst
}

/// Run of identical results ending at the most recent decided bet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Streak {
    pub status: BetStatus,
    pub count: usize,
}

impl Streak {
    pub fn format(&self) -> String {
        let noun = match (self.status, self.count) {
            (BetStatus::Won, 1) => "Win",
            (BetStatus::Won, _) => "Wins",
            (_, 1) => "Loss",
            _ => "Losses",
        };
        format!("{} {}", self.count, noun)
    }
}

/// Current win/loss streak. Pushes, pending and cancelled bets are skipped.
pub fn current_streak(bets: &[Bet]) -> Option<Streak> {
    let mut decided: Vec<&Bet> = bets
        .iter()
        .filter(|b| matches!(b.status, BetStatus::Won | BetStatus::Lost))
        .collect();
    // Most recently placed first
    decided.sort_by(|a, b| b.placed_at.cmp(&a.placed_at));

    let first = decided.first()?.status;
    let count = decided.iter().take_while(|b| b.status == first).count();

    Some(Streak {
        status: first,
        count,
    })
}

/// Per-category tables plus the quick insights shown above them
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceReport {
    pub by_sport: Vec<BreakdownRow>,
    pub by_bet_type: Vec<BreakdownRow>,
    pub by_confidence: Vec<BreakdownRow>,
    pub best_category: Option<BreakdownRow>,
    pub worst_category: Option<BreakdownRow>,
    pub streak: Option<Streak>,
}

impl PerformanceReport {
    pub fn has_settled_bets(&self) -> bool {
        !self.by_sport.is_empty()
    }
}

pub fn performance_report(bets: &[Bet]) -> PerformanceReport {
    let by_sport = breakdown_by_sport(bets);
    let by_bet_type = breakdown_by_bet_type(bets);
    let by_confidence = breakdown_by_confidence(bets);

    // Best/worst compare sport and bet-type rows together
    let candidates: Vec<BreakdownRow> = by_sport.iter().chain(by_bet_type.iter()).cloned().collect();
    let best = best_category(&candidates).cloned();
    let worst = worst_category(&candidates)
        .filter(|w| best.as_ref().map_or(true, |b| b.label != w.label))
        .cloned();

    PerformanceReport {
        by_sport,
        by_bet_type,
        by_confidence,
        best_category: best,
        worst_category: worst,
        streak: current_streak(bets),
    }
}
