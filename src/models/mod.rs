use crate::error::BetError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Sport a bet was placed on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sport {
    Nfl,
    Nba,
    Mlb,
    Nhl,
    Ncaaf, // College Football
    Ncaab, // College Basketball
    Soccer,
    Mma,
    Boxing,
    Other,
}

impl Sport {
    pub const ALL: [Sport; 10] = [
        Sport::Nfl,
        Sport::Nba,
        Sport::Mlb,
        Sport::Nhl,
        Sport::Ncaaf,
        Sport::Ncaab,
        Sport::Soccer,
        Sport::Mma,
        Sport::Boxing,
        Sport::Other,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            Sport::Nfl => "nfl",
            Sport::Nba => "nba",
            Sport::Mlb => "mlb",
            Sport::Nhl => "nhl",
            Sport::Ncaaf => "ncaaf",
            Sport::Ncaab => "ncaab",
            Sport::Soccer => "soccer",
            Sport::Mma => "mma",
            Sport::Boxing => "boxing",
            Sport::Other => "other",
        }
    }

    /// Display label used in breakdown tables
    pub fn label(&self) -> &'static str {
        match self {
            Sport::Nfl => "NFL",
            Sport::Nba => "NBA",
            Sport::Mlb => "MLB",
            Sport::Nhl => "NHL",
            Sport::Ncaaf => "College Football",
            Sport::Ncaab => "College Basketball",
            Sport::Soccer => "Soccer",
            Sport::Mma => "MMA",
            Sport::Boxing => "Boxing",
            Sport::Other => "Other",
        }
    }
}

impl fmt::Display for Sport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Sport {
    type Err = BetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        Sport::ALL
            .into_iter()
            .find(|sport| sport.key() == lower)
            .ok_or(BetError::UnknownVariant {
                kind: "sport",
                value: s.to_string(),
            })
    }
}

/// Kind of wager
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BetType {
    Moneyline, // Straight win/loss
    Spread,    // Point spread
    Total,     // Over/Under
    Prop,
    Parlay,
    Teaser,
    Futures,
}

impl BetType {
    pub const ALL: [BetType; 7] = [
        BetType::Moneyline,
        BetType::Spread,
        BetType::Total,
        BetType::Prop,
        BetType::Parlay,
        BetType::Teaser,
        BetType::Futures,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            BetType::Moneyline => "moneyline",
            BetType::Spread => "spread",
            BetType::Total => "total",
            BetType::Prop => "prop",
            BetType::Parlay => "parlay",
            BetType::Teaser => "teaser",
            BetType::Futures => "futures",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            BetType::Moneyline => "Moneyline",
            BetType::Spread => "Spread",
            BetType::Total => "Over/Under",
            BetType::Prop => "Prop",
            BetType::Parlay => "Parlay",
            BetType::Teaser => "Teaser",
            BetType::Futures => "Futures",
        }
    }
}

impl fmt::Display for BetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for BetType {
    type Err = BetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        BetType::ALL
            .into_iter()
            .find(|bet_type| bet_type.key() == lower)
            .ok_or(BetError::UnknownVariant {
                kind: "bet type",
                value: s.to_string(),
            })
    }
}

/// Lifecycle state of a bet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BetStatus {
    Pending,
    Won,
    Lost,
    Push,
    Cancelled,
}

impl BetStatus {
    /// Won, lost or push: the outcomes that count toward performance figures.
    /// Cancelled bets are closed but never graded.
    pub fn is_graded(&self) -> bool {
        matches!(self, BetStatus::Won | BetStatus::Lost | BetStatus::Push)
    }

    pub fn is_settlement(&self) -> bool {
        !matches!(self, BetStatus::Pending)
    }
}

impl fmt::Display for BetStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BetStatus::Pending => "pending",
            BetStatus::Won => "won",
            BetStatus::Lost => "lost",
            BetStatus::Push => "push",
            BetStatus::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}

impl FromStr for BetStatus {
    type Err = BetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Ok(BetStatus::Pending),
            "won" | "win" => Ok(BetStatus::Won),
            "lost" | "loss" => Ok(BetStatus::Lost),
            "push" => Ok(BetStatus::Push),
            "cancelled" | "canceled" => Ok(BetStatus::Cancelled),
            _ => Err(BetError::UnknownVariant {
                kind: "status",
                value: s.to_string(),
            }),
        }
    }
}

/// A logged wager
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bet {
    pub id: String,
    pub sport: Sport,
    pub bet_type: BetType,
    pub description: String, // e.g. "Lakers -5.5" or "Chiefs ML"
    pub stake: f64,
    pub odds: i32, // American odds format (e.g., -110, +150)
    pub potential_payout: f64,
    pub actual_payout: Option<f64>,
    pub teams: Option<String>,
    pub event_date: Option<DateTime<Utc>>,
    pub status: BetStatus,
    pub placed_at: DateTime<Utc>,
    pub settled_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub location: Option<String>, // Which sportsbook
    pub confidence: Option<u8>,   // 1-5 rating
    pub created_at: DateTime<Utc>,
}

impl Bet {
    /// Profit or loss this bet contributed.
    /// Won: payout minus stake. Lost: minus the stake, whatever payout is stored.
    /// Push, pending and cancelled bets contribute nothing.
    pub fn profit(&self) -> f64 {
        match self.status {
            BetStatus::Won => self.actual_payout.unwrap_or(0.0) - self.stake,
            BetStatus::Lost => -self.stake,
            _ => 0.0,
        }
    }
}

/// Caller-supplied fields for a new bet. Id, payout and timestamps are filled by the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewBet {
    pub sport: Sport,
    pub bet_type: BetType,
    pub description: String,
    pub stake: f64,
    pub odds: i32,
    #[serde(default)]
    pub teams: Option<String>,
    #[serde(default)]
    pub event_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub placed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub confidence: Option<u8>,
}

/// Partial update for an existing bet; `None` leaves the field untouched
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BetUpdate {
    pub description: Option<String>,
    pub stake: Option<f64>,
    pub odds: Option<i32>,
    pub teams: Option<String>,
    pub event_date: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub location: Option<String>,
    pub confidence: Option<u8>,
}

/// Prefilled values for a new bet, built from odds-provider data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BetDraft {
    pub sport: Sport,
    pub bet_type: BetType,
    pub description: String,
    pub teams: String,
    pub odds: i32,
    pub event_date: DateTime<Utc>,
    pub bookmaker: String,
}

impl BetDraft {
    pub fn into_new_bet(self, stake: f64, confidence: Option<u8>) -> NewBet {
        NewBet {
            sport: self.sport,
            bet_type: self.bet_type,
            description: self.description,
            stake,
            odds: self.odds,
            teams: Some(self.teams),
            event_date: Some(self.event_date),
            placed_at: None,
            notes: None,
            location: Some(self.bookmaker),
            confidence,
        }
    }
}

/// Aggregate performance figures over a bet collection
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BettingStats {
    pub total_bets: usize,
    pub won_bets: usize,
    pub lost_bets: usize,
    pub push_bets: usize,
    pub total_staked: f64,
    pub total_returned: f64,
    pub profit: f64,
    pub roi: f64,      // Return on investment percentage
    pub win_rate: f64, // Percentage of settled bets won
    pub average_odds: f64,
    pub biggest_win: f64,
    pub biggest_loss: f64, // Positive magnitude
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
        };
        f.write_str(s)
    }
}

/// One proposed sizing strategy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BettingRecommendation {
    pub title: String,
    pub description: String,
    pub suggested_stake: Option<f64>,
    pub reasoning: String,
    pub risk_level: RiskLevel,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn bet(status: BetStatus, stake: f64, actual_payout: Option<f64>) -> Bet {
        let now = Utc.with_ymd_and_hms(2024, 9, 8, 17, 0, 0).unwrap();
        Bet {
            id: "b1".to_string(),
            sport: Sport::Nfl,
            bet_type: BetType::Moneyline,
            description: "Chiefs ML".to_string(),
            stake,
            odds: -110,
            potential_payout: 0.0,
            actual_payout,
            teams: None,
            event_date: None,
            status,
            placed_at: now,
            settled_at: None,
            notes: None,
            location: None,
            confidence: None,
            created_at: now,
        }
    }

    #[test]
    fn test_profit_rules() {
        assert_eq!(bet(BetStatus::Won, 50.0, Some(90.0)).profit(), 40.0);
        assert_eq!(bet(BetStatus::Won, 50.0, None).profit(), -50.0);
        // A stored payout on a loss is ignored
        assert_eq!(bet(BetStatus::Lost, 30.0, Some(57.0)).profit(), -30.0);
        assert_eq!(bet(BetStatus::Push, 30.0, Some(30.0)).profit(), 0.0);
        assert_eq!(bet(BetStatus::Pending, 30.0, None).profit(), 0.0);
    }

    #[test]
    fn test_enum_parsing() {
        assert_eq!("NCAAF".parse::<Sport>().unwrap(), Sport::Ncaaf);
        assert_eq!("total".parse::<BetType>().unwrap(), BetType::Total);
        assert_eq!("canceled".parse::<BetStatus>().unwrap(), BetStatus::Cancelled);
        assert!("curling".parse::<Sport>().is_err());
    }

    #[test]
    fn test_status_serializes_lowercase() {
        let json = serde_json::to_string(&BetStatus::Won).unwrap();
        assert_eq!(json, "\"won\"");
        let sport: Sport = serde_json::from_str("\"mma\"").unwrap();
        assert_eq!(sport, Sport::Mma);
    }

    #[test]
    fn test_graded_statuses() {
        assert!(BetStatus::Push.is_graded());
        assert!(!BetStatus::Cancelled.is_graded());
        assert!(BetStatus::Cancelled.is_settlement());
        assert!(!BetStatus::Pending.is_settlement());
    }
}
