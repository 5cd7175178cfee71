//! Bet sizing recommendations
//!
//! Kelly criterion: f* = (b*p - q) / b
//!     b = decimal odds - 1 (net odds)
//!     p = probability of winning
//!     q = 1 - p
//!
//! Half Kelly is the headline figure; full Kelly is too swingy for most bankrolls.

use crate::error::{
    validate_bankroll, validate_confidence, validate_odds, validate_probability, BetError,
};
use crate::models::{Bet, BetStatus, BettingRecommendation, RiskLevel};
use crate::utils::odds_math::{
    american_odds_to_probability, american_to_decimal, calculate_expected_value,
    probability_to_american_odds,
};
use serde::{Deserialize, Serialize};

/// Edge below which a bet with a probability estimate is skipped outright
pub const CAUTION_EDGE_FLOOR: f64 = -0.02;
/// Number of recent bets the martingale check looks at
pub const MARTINGALE_WINDOW: usize = 5;
pub const DEFAULT_CONFIDENCE: u8 = 3;

/// User-supplied figures for a hypothetical bet
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StrategyInputs {
    pub bankroll: f64,
    pub odds: i32,
    /// User's estimated probability (0-1)
    #[serde(default)]
    pub win_probability: Option<f64>,
    /// Most recent first
    #[serde(default)]
    pub recent_bets: Option<Vec<Bet>>,
    /// 1-5 rating
    #[serde(default)]
    pub confidence: Option<u8>,
}

impl StrategyInputs {
    /// Win probability if it lies strictly between 0 and 1
    pub fn usable_probability(&self) -> Option<f64> {
        self.win_probability.filter(|p| *p > 0.0 && *p < 1.0)
    }

    /// Reject inputs a user typed wrong instead of quietly ignoring them
    pub fn validate(&self) -> Result<(), BetError> {
        validate_bankroll(self.bankroll)?;
        validate_odds(self.odds)?;
        if let Some(p) = self.win_probability {
            validate_probability(p)?;
        }
        if let Some(c) = self.confidence {
            validate_confidence(c)?;
        }
        Ok(())
    }
}

/// Flat betting: a consistent unit of 1-3% of bankroll
pub fn flat_betting(inputs: &StrategyInputs) -> BettingRecommendation {
    let one_percent = inputs.bankroll * 0.01;
    let two_percent = inputs.bankroll * 0.02;
    let three_percent = inputs.bankroll * 0.03;

    BettingRecommendation {
        title: "Flat Betting".to_string(),
        description: "Consistent unit size for disciplined bankroll management".to_string(),
        suggested_stake: Some(two_percent),
        reasoning: format!(
            "Conservative flat betting recommendations:\n\
             - 1 Unit (1%): ${:.2} - Very conservative\n\
             - 2 Units (2%): ${:.2} - Recommended standard bet\n\
             - 3 Units (3%): ${:.2} - High confidence plays\n\n\
             At 2% per bet your bankroll survives a long losing run.",
            one_percent, two_percent, three_percent
        ),
        risk_level: RiskLevel::Low,
    }
}

/// Full Kelly fraction of bankroll; zero or negative means no edge
pub fn kelly_fraction(win_probability: f64, odds: i32) -> f64 {
    let b = american_to_decimal(odds) - 1.0;
    let p = win_probability;
    let q = 1.0 - p;
    (b * p - q) / b
}

/// Kelly criterion sizing at the given win probability
pub fn kelly_criterion(bankroll: f64, odds: i32, win_probability: f64) -> BettingRecommendation {
    let implied = american_odds_to_probability(odds);
    let fraction = kelly_fraction(win_probability, odds);

    if fraction <= 0.0 {
        return BettingRecommendation {
            title: "Kelly Criterion - No Edge".to_string(),
            description: "This bet has no positive expected value".to_string(),
            suggested_stake: Some(0.0),
            reasoning: format!(
                "Based on your win probability of {:.1}% and odds of {:+}, this bet has negative \
                 expected value. The implied probability is {:.1}%. Skip this bet.",
                win_probability * 100.0,
                odds,
                implied * 100.0
            ),
            risk_level: RiskLevel::High,
        };
    }

    let full_kelly = bankroll * fraction;
    let half_kelly = full_kelly * 0.5;
    let quarter_kelly = full_kelly * 0.25;

    let risk_level = if fraction > 0.05 {
        RiskLevel::High
    } else if fraction > 0.02 {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    };

    BettingRecommendation {
        title: "Kelly Criterion".to_string(),
        description: "Optimal bet sizing to maximize long-term growth".to_string(),
        suggested_stake: Some(half_kelly),
        reasoning: format!(
            "Based on {:.1}% win probability vs {:.1}% implied odds probability:\n\
             - Full Kelly: ${:.2} ({:.1}% of bankroll)\n\
             - Half Kelly: ${:.2} (recommended - reduces variance)\n\
             - Quarter Kelly: ${:.2} (conservative)\n\n\
             Your estimated edge: {:.2}%",
            win_probability * 100.0,
            implied * 100.0,
            full_kelly,
            fraction * 100.0,
            half_kelly,
            quarter_kelly,
            (win_probability - implied) * 100.0
        ),
        risk_level,
    }
}

/// Stake a percentage of bankroll equal to the 1-5 confidence rating
pub fn confidence_sizing(bankroll: f64, odds: i32, confidence: u8) -> BettingRecommendation {
    let percentage = confidence as f64;
    let suggested_stake = bankroll * percentage / 100.0;
    let implied = american_odds_to_probability(odds);

    let risk_level = match confidence {
        0..=2 => RiskLevel::Low,
        3 => RiskLevel::Medium,
        _ => RiskLevel::High,
    };

    BettingRecommendation {
        title: "Confidence-Based Betting".to_string(),
        description: format!("{}% of bankroll based on your confidence level", confidence),
        suggested_stake: Some(suggested_stake),
        reasoning: format!(
            "Your confidence: {}/5\n\
             Suggested stake: ${:.2} ({}% of ${:.2} bankroll)\n\n\
             Implied probability from odds: {:.1}%\n\n\
             Bet size scales with confidence while keeping bankroll discipline.",
            confidence,
            suggested_stake,
            confidence,
            bankroll,
            implied * 100.0
        ),
        risk_level,
    }
}

/// Cautionary output for loss-chasing. Never suggests a positive stake.
pub fn martingale_warning(recent_bets: &[Bet]) -> BettingRecommendation {
    let recent_losses = recent_bets
        .iter()
        .take(MARTINGALE_WINDOW)
        .filter(|b| b.status == BetStatus::Lost)
        .count();

    if recent_losses >= 2 {
        return BettingRecommendation {
            title: "Martingale System - High Risk".to_string(),
            description: "You have recent losses - Martingale would suggest doubling".to_string(),
            suggested_stake: Some(0.0),
            reasoning: format!(
                "DANGER: You've lost {} of your last {} bets. Martingale would suggest \
                 increasingly large bets, which is a path to ruin. Consider taking a break \
                 or reducing bet size instead.\n\n\
                 Why Martingale fails:\n\
                 - Requires exponential bankroll growth\n\
                 - Sportsbooks have betting limits\n\
                 - Long losing streaks are inevitable\n\n\
                 Use flat betting or Kelly Criterion instead.",
                recent_losses, MARTINGALE_WINDOW
            ),
            risk_level: RiskLevel::High,
        };
    }

    BettingRecommendation {
        title: "Martingale System".to_string(),
        description: "Not recommended due to high risk".to_string(),
        suggested_stake: None,
        reasoning: "No recent losing streak, but the Martingale system is still not \
                    recommended. Use Kelly Criterion or flat betting instead."
            .to_string(),
        risk_level: RiskLevel::High,
    }
}

/// Every applicable recommendation, flat betting first.
/// Strategies whose input is missing are left out.
pub fn all_recommendations(inputs: &StrategyInputs) -> Vec<BettingRecommendation> {
    let mut recommendations = vec![flat_betting(inputs)];

    if let Some(p) = inputs.usable_probability() {
        recommendations.push(kelly_criterion(inputs.bankroll, inputs.odds, p));
    }

    if let Some(confidence) = inputs.confidence.filter(|c| *c > 0) {
        recommendations.push(confidence_sizing(inputs.bankroll, inputs.odds, confidence));
    }

    if let Some(recent) = inputs.recent_bets.as_deref().filter(|r| !r.is_empty()) {
        recommendations.push(martingale_warning(recent));
    }

    recommendations
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Recommended,
    Caution,
    Skip,
}

/// Single-shot call on a hypothetical bet with the figures behind it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuickVerdict {
    pub verdict: Verdict,
    pub headline: String,
    pub implied_probability: f64,
    pub user_probability: Option<f64>,
    pub edge: Option<f64>,
    pub fair_odds: Option<i32>,
    pub stake: f64,
    pub expected_value: Option<f64>,
    pub ev_percentage: Option<f64>,
}

impl QuickVerdict {
    pub fn format(&self) -> String {
        let mut line = format!(
            "{:?}: {} | Stake: ${:.2} | Implied: {:.1}%",
            self.verdict,
            self.headline,
            self.stake,
            self.implied_probability * 100.0
        );
        if let (Some(p), Some(edge)) = (self.user_probability, self.edge) {
            line.push_str(&format!(
                " | Yours: {:.1}% | Edge: {:+.2}%",
                p * 100.0,
                edge * 100.0
            ));
        }
        if let Some(fair) = self.fair_odds {
            line.push_str(&format!(" | Fair odds: {:+}", fair));
        }
        if let (Some(ev), Some(pct)) = (self.expected_value, self.ev_percentage) {
            line.push_str(&format!(" | EV: {:+.2} ({:+.2}%)", ev, pct));
        }
        line
    }
}

/// Classify a hypothetical bet as recommended, caution or skip.
/// EV is evaluated at the confidence-derived stake.
pub fn quick_verdict(inputs: &StrategyInputs) -> QuickVerdict {
    let confidence = inputs.confidence.unwrap_or(DEFAULT_CONFIDENCE);
    let stake = inputs.bankroll * confidence as f64 / 100.0;
    let implied = american_odds_to_probability(inputs.odds);

    let Some(p) = inputs.usable_probability() else {
        let (verdict, headline) = match confidence {
            c if c >= 4 => (Verdict::Caution, "High confidence play"),
            2..=3 => (Verdict::Caution, "Standard play"),
            _ => (Verdict::Skip, "Low confidence - consider passing"),
        };
        return QuickVerdict {
            verdict,
            headline: headline.to_string(),
            implied_probability: implied,
            user_probability: None,
            edge: None,
            fair_odds: None,
            stake,
            expected_value: None,
            ev_percentage: None,
        };
    };

    let ev = calculate_expected_value(stake, inputs.odds, p);
    let edge = p - implied;

    let (verdict, headline) = if ev.is_positive_ev && edge > 0.0 {
        (Verdict::Recommended, "Positive expected value")
    } else if ev.is_positive_ev || edge > CAUTION_EDGE_FLOOR {
        (Verdict::Caution, "Marginal edge")
    } else {
        (Verdict::Skip, "Negative expected value")
    };

    QuickVerdict {
        verdict,
        headline: headline.to_string(),
        implied_probability: implied,
        user_probability: Some(p),
        edge: Some(edge),
        fair_odds: Some(probability_to_american_odds(p)),
        stake,
        expected_value: Some(ev.ev),
        ev_percentage: Some(ev.ev_percentage),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BetType, Sport};
    use chrono::{TimeZone, Utc};

    fn recent(statuses: &[BetStatus]) -> Vec<Bet> {
        let at = Utc.with_ymd_and_hms(2024, 11, 2, 19, 30, 0).unwrap();
        statuses
            .iter()
            .enumerate()
            .map(|(i, status)| Bet {
                id: format!("r{}", i),
                sport: Sport::Ncaaf,
                bet_type: BetType::Spread,
                description: String::new(),
                stake: 20.0,
                odds: -110,
                potential_payout: 38.18,
                actual_payout: None,
                teams: None,
                event_date: None,
                status: *status,
                placed_at: at,
                settled_at: None,
                notes: None,
                location: None,
                confidence: None,
                created_at: at,
            })
            .collect()
    }

    fn inputs(win_probability: Option<f64>, confidence: Option<u8>) -> StrategyInputs {
        StrategyInputs {
            bankroll: 1000.0,
            odds: -110,
            win_probability,
            recent_bets: None,
            confidence,
        }
    }

    #[test]
    fn test_flat_betting() {
        let rec = flat_betting(&inputs(None, None));
        assert_eq!(rec.suggested_stake, Some(20.0));
        assert_eq!(rec.risk_level, RiskLevel::Low);
        assert!(rec.reasoning.contains("$10.00"));
        assert!(rec.reasoning.contains("$30.00"));
    }

    #[test]
    fn test_kelly_fraction() {
        let f = kelly_fraction(0.55, -110);
        assert!((f - 0.055).abs() < 0.0001);
    }

    #[test]
    fn test_kelly_half_stake() {
        let rec = kelly_criterion(1000.0, -110, 0.55);
        let stake = rec.suggested_stake.unwrap();
        assert!((stake - 27.5).abs() < 0.01);
        assert_eq!(rec.risk_level, RiskLevel::High);
        assert_eq!(rec.title, "Kelly Criterion");
    }

    #[test]
    fn test_kelly_risk_bands() {
        // Even money: f = p - q
        assert_eq!(kelly_criterion(1000.0, 100, 0.505).risk_level, RiskLevel::Low);
        // f = 0.04 -> medium
        assert_eq!(kelly_criterion(1000.0, 100, 0.52).risk_level, RiskLevel::Medium);
    }

    #[test]
    fn test_kelly_no_edge() {
        let rec = kelly_criterion(1000.0, -110, 0.45);
        assert_eq!(rec.suggested_stake, Some(0.0));
        assert_eq!(rec.risk_level, RiskLevel::High);
        assert!(rec.title.contains("No Edge"));
    }

    #[test]
    fn test_confidence_sizing() {
        let rec = confidence_sizing(1000.0, -110, 4);
        assert_eq!(rec.suggested_stake, Some(40.0));
        assert_eq!(rec.risk_level, RiskLevel::High);
        assert_eq!(confidence_sizing(1000.0, -110, 1).risk_level, RiskLevel::Low);
        assert_eq!(confidence_sizing(1000.0, -110, 2).risk_level, RiskLevel::Low);
        assert_eq!(confidence_sizing(1000.0, -110, 3).risk_level, RiskLevel::Medium);
        assert_eq!(confidence_sizing(1000.0, -110, 5).risk_level, RiskLevel::High);
    }

    #[test]
    fn test_martingale_with_recent_losses() {
        use BetStatus::*;
        let bets = recent(&[Lost, Won, Lost, Won, Won, Lost, Lost]);
        let rec = martingale_warning(&bets);
        assert_eq!(rec.suggested_stake, Some(0.0));
        assert!(rec.reasoning.contains("lost 2 of your last 5"));
    }

    #[test]
    fn test_martingale_only_looks_at_five_most_recent() {
        use BetStatus::*;
        let bets = recent(&[Won, Won, Lost, Won, Pending, Lost, Lost]);
        let rec = martingale_warning(&bets);
        assert_eq!(rec.title, "Martingale System");
        assert_eq!(rec.suggested_stake, None);
        assert_eq!(rec.risk_level, RiskLevel::High);
    }

    #[test]
    fn test_all_recommendations_order_and_omission() {
        let recs = all_recommendations(&inputs(None, None));
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].title, "Flat Betting");

        let mut full = inputs(Some(0.55), Some(3));
        full.recent_bets = Some(recent(&[BetStatus::Won]));
        let titles: Vec<String> = all_recommendations(&full)
            .into_iter()
            .map(|r| r.title)
            .collect();
        assert_eq!(
            titles,
            vec![
                "Flat Betting",
                "Kelly Criterion",
                "Confidence-Based Betting",
                "Martingale System"
            ]
        );
    }

    #[test]
    fn test_out_of_range_probability_is_ignored() {
        let recs = all_recommendations(&inputs(Some(1.5), None));
        assert_eq!(recs.len(), 1);
        let recs = all_recommendations(&inputs(Some(0.0), None));
        assert_eq!(recs.len(), 1);
    }

    #[test]
    fn test_validate_inputs() {
        assert!(inputs(Some(0.55), Some(3)).validate().is_ok());
        assert!(inputs(None, None).validate().is_ok());

        assert_eq!(
            inputs(Some(1.5), None).validate(),
            Err(BetError::InvalidProbability(1.5))
        );
        assert_eq!(
            inputs(Some(0.0), None).validate(),
            Err(BetError::InvalidProbability(0.0))
        );
        assert_eq!(
            inputs(None, Some(6)).validate(),
            Err(BetError::InvalidConfidence(6))
        );

        let mut zero_odds = inputs(None, None);
        zero_odds.odds = 0;
        assert_eq!(zero_odds.validate(), Err(BetError::ZeroOdds));

        let mut broke = inputs(None, None);
        broke.bankroll = 0.0;
        assert_eq!(broke.validate(), Err(BetError::InvalidBankroll(0.0)));
    }

    #[test]
    fn test_empty_recent_bets_skip_martingale() {
        let mut i = inputs(None, None);
        i.recent_bets = Some(Vec::new());
        assert_eq!(all_recommendations(&i).len(), 1);
    }

    #[test]
    fn test_martingale_never_positive() {
        use BetStatus::*;
        for statuses in [vec![Lost, Lost], vec![Won], vec![Push, Lost, Won]] {
            let rec = martingale_warning(&recent(&statuses));
            assert!(rec.suggested_stake.unwrap_or(0.0) <= 0.0);
        }
    }

    #[test]
    fn test_quick_verdict_with_probability() {
        let v = quick_verdict(&inputs(Some(0.55), Some(3)));
        assert_eq!(v.verdict, Verdict::Recommended);
        assert_eq!(v.stake, 30.0);
        assert!(v.edge.unwrap() > 0.0);
        assert!(v.expected_value.unwrap() > 0.0);

        // Edge of about -0.014 is inside the caution band
        let v = quick_verdict(&inputs(Some(0.51), Some(3)));
        assert_eq!(v.verdict, Verdict::Caution);

        let v = quick_verdict(&inputs(Some(0.45), Some(3)));
        assert_eq!(v.verdict, Verdict::Skip);
        assert!(v.ev_percentage.unwrap() < 0.0);
    }

    #[test]
    fn test_quick_verdict_confidence_only() {
        let v = quick_verdict(&inputs(None, Some(5)));
        assert_eq!(v.verdict, Verdict::Caution);
        assert_eq!(v.headline, "High confidence play");

        let v = quick_verdict(&inputs(None, Some(2)));
        assert_eq!(v.verdict, Verdict::Caution);
        assert_eq!(v.headline, "Standard play");

        let v = quick_verdict(&inputs(None, Some(1)));
        assert_eq!(v.verdict, Verdict::Skip);
        assert!(v.edge.is_none());

        // Missing confidence falls back to a standard play
        let v = quick_verdict(&inputs(None, None));
        assert_eq!(v.verdict, Verdict::Caution);
        assert_eq!(v.stake, 30.0);
    }
}
