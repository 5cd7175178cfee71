use crate::error::{validate_confidence, validate_odds, validate_stake, BetError};
use crate::models::{Bet, BetStatus, BetUpdate, NewBet};
use crate::utils::odds_math::payout;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use uuid::Uuid;

/// Bet records kept in a JSON file, most recently placed first.
/// Every mutation is written back to disk before returning.
#[derive(Debug)]
pub struct BetStore {
    path: PathBuf,
    bets: Vec<Bet>,
}

impl BetStore {
    /// Open the store at `path`; a missing file is an empty store
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let bets = if path.exists() {
            let json = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read bet file {}", path.display()))?;
            serde_json::from_str(&json).context("Failed to deserialize bet data")?
        } else {
            Vec::new()
        };

        let mut store = Self { path, bets };
        store.sort();
        info!(path = %store.path.display(), bets = store.bets.len(), "opened bet store");
        Ok(store)
    }

    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).context("Failed to create bet data directory")?;
        }
        let json = serde_json::to_string_pretty(&self.bets).context("Failed to serialize bet data")?;
        std::fs::write(&self.path, json).context("Failed to write bet file")?;
        debug!(path = %self.path.display(), "saved bet store");
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Snapshot of all bets, most recent first
    pub fn bets(&self) -> &[Bet] {
        &self.bets
    }

    pub fn get(&self, id: &str) -> Option<&Bet> {
        self.bets.iter().find(|b| b.id == id)
    }

    pub fn recent(&self, n: usize) -> Vec<Bet> {
        self.bets.iter().take(n).cloned().collect()
    }

    pub fn add_bet(&mut self, new_bet: NewBet) -> Result<Bet> {
        validate_stake(new_bet.stake)?;
        validate_odds(new_bet.odds)?;
        if let Some(c) = new_bet.confidence {
            validate_confidence(c)?;
        }

        let now = Utc::now();
        let bet = Bet {
            id: Uuid::new_v4().to_string(),
            sport: new_bet.sport,
            bet_type: new_bet.bet_type,
            description: new_bet.description,
            stake: new_bet.stake,
            odds: new_bet.odds,
            potential_payout: payout(new_bet.stake, new_bet.odds),
            actual_payout: None,
            teams: new_bet.teams,
            event_date: new_bet.event_date,
            status: BetStatus::Pending,
            placed_at: new_bet.placed_at.unwrap_or(now),
            settled_at: None,
            notes: new_bet.notes,
            location: new_bet.location,
            confidence: new_bet.confidence,
            created_at: now,
        };

        info!(id = %bet.id, stake = bet.stake, odds = bet.odds, "added bet");
        self.bets.push(bet.clone());
        self.sort();
        self.save()?;
        Ok(bet)
    }

    pub fn update_bet(&mut self, id: &str, update: BetUpdate) -> Result<Bet> {
        if let Some(stake) = update.stake {
            validate_stake(stake)?;
        }
        if let Some(odds) = update.odds {
            validate_odds(odds)?;
        }
        if let Some(c) = update.confidence {
            validate_confidence(c)?;
        }

        let bet = self.find_mut(id)?;
        if let Some(description) = update.description {
            bet.description = description;
        }
        if let Some(stake) = update.stake {
            bet.stake = stake;
        }
        if let Some(odds) = update.odds {
            bet.odds = odds;
        }
        if update.teams.is_some() {
            bet.teams = update.teams;
        }
        if update.event_date.is_some() {
            bet.event_date = update.event_date;
        }
        if update.notes.is_some() {
            bet.notes = update.notes;
        }
        if update.location.is_some() {
            bet.location = update.location;
        }
        if update.confidence.is_some() {
            bet.confidence = update.confidence;
        }
        bet.potential_payout = payout(bet.stake, bet.odds);

        let updated = bet.clone();
        self.save()?;
        Ok(updated)
    }

    pub fn delete_bet(&mut self, id: &str) -> Result<Bet> {
        let pos = self
            .bets
            .iter()
            .position(|b| b.id == id)
            .ok_or_else(|| BetError::NotFound(id.to_string()))?;
        let removed = self.bets.remove(pos);
        info!(id, "deleted bet");
        self.save()?;
        Ok(removed)
    }

    /// Record an outcome. A win with no payout given pays the potential payout;
    /// a push with no payout returns the stake.
    pub fn settle_bet(
        &mut self,
        id: &str,
        status: BetStatus,
        actual_payout: Option<f64>,
    ) -> Result<Bet> {
        self.settle_bet_at(id, status, actual_payout, Utc::now())
    }

    pub fn settle_bet_at(
        &mut self,
        id: &str,
        status: BetStatus,
        actual_payout: Option<f64>,
        settled_at: DateTime<Utc>,
    ) -> Result<Bet> {
        if !status.is_settlement() {
            return Err(BetError::NotASettlement(status).into());
        }

        let bet = self.find_mut(id)?;
        bet.actual_payout = match status {
            BetStatus::Won => Some(actual_payout.unwrap_or(bet.potential_payout)),
            BetStatus::Push => Some(actual_payout.unwrap_or(bet.stake)),
            _ => actual_payout,
        };
        bet.status = status;
        bet.settled_at = Some(settled_at);

        let settled = bet.clone();
        info!(id, status = %status, profit = settled.profit(), "settled bet");
        self.save()?;
        Ok(settled)
    }

    fn find_mut(&mut self, id: &str) -> Result<&mut Bet, BetError> {
        self.bets
            .iter_mut()
            .find(|b| b.id == id)
            .ok_or_else(|| BetError::NotFound(id.to_string()))
    }

    fn sort(&mut self) {
        self.bets.sort_by(|a, b| b.placed_at.cmp(&a.placed_at));
    }
}

/// Flat row for the CSV ledger
#[derive(Debug, Serialize)]
struct LedgerRow<'a> {
    id: &'a str,
    placed_at: String,
    settled_at: String,
    sport: &'a str,
    bet_type: &'a str,
    description: &'a str,
    stake: String,
    odds: i32,
    potential_payout: String,
    actual_payout: String,
    status: String,
    profit: String,
    confidence: String,
    location: &'a str,
}

/// Save the bet ledger to CSV
pub fn export_bets_to_csv(bets: &[Bet], filename: impl AsRef<Path>) -> Result<()> {
    let mut writer = csv::Writer::from_path(filename.as_ref()).context("Failed to create CSV file")?;

    for bet in bets {
        writer
            .serialize(LedgerRow {
                id: &bet.id,
                placed_at: bet.placed_at.format("%Y-%m-%d %H:%M").to_string(),
                settled_at: bet
                    .settled_at
                    .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                    .unwrap_or_default(),
                sport: bet.sport.label(),
                bet_type: bet.bet_type.label(),
                description: &bet.description,
                stake: format!("{:.2}", bet.stake),
                odds: bet.odds,
                potential_payout: format!("{:.2}", bet.potential_payout),
                actual_payout: bet
                    .actual_payout
                    .map(|p| format!("{:.2}", p))
                    .unwrap_or_default(),
                status: bet.status.to_string(),
                profit: format!("{:.2}", bet.profit()),
                confidence: bet.confidence.map(|c| c.to_string()).unwrap_or_default(),
                location: bet.location.as_deref().unwrap_or(""),
            })
            .context("Failed to write CSV row")?;
    }

    writer.flush().context("Failed to flush CSV file")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BetType, Sport};
    use chrono::TimeZone;

    fn temp_path(ext: &str) -> PathBuf {
        std::env::temp_dir().join(format!("bet_tracker_test_{}.{}", Uuid::new_v4(), ext))
    }

    fn new_bet(stake: f64, odds: i32, placed_day: u32) -> NewBet {
        NewBet {
            sport: Sport::Nfl,
            bet_type: BetType::Moneyline,
            description: "Chiefs ML".to_string(),
            stake,
            odds,
            teams: Some("Ravens @ Chiefs".to_string()),
            event_date: None,
            placed_at: Some(Utc.with_ymd_and_hms(2024, 9, placed_day, 18, 0, 0).unwrap()),
            notes: None,
            location: Some("DraftKings".to_string()),
            confidence: Some(3),
        }
    }

    #[test]
    fn test_add_bet_computes_payout() {
        let path = temp_path("json");
        let mut store = BetStore::open(&path).unwrap();
        let bet = store.add_bet(new_bet(100.0, 150, 5)).unwrap();

        assert_eq!(bet.status, BetStatus::Pending);
        assert!((bet.potential_payout - 250.0).abs() < 1e-9);
        assert!(bet.settled_at.is_none());

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_add_bet_validation() {
        let path = temp_path("json");
        let mut store = BetStore::open(&path).unwrap();

        assert!(store.add_bet(new_bet(0.0, -110, 5)).is_err());
        assert!(store.add_bet(new_bet(10.0, 0, 5)).is_err());
        let mut bad = new_bet(10.0, -110, 5);
        bad.confidence = Some(9);
        assert!(store.add_bet(bad).is_err());
        assert!(store.bets().is_empty());
    }

    #[test]
    fn test_round_trip_and_ordering() {
        let path = temp_path("json");
        {
            let mut store = BetStore::open(&path).unwrap();
            store.add_bet(new_bet(10.0, -110, 1)).unwrap();
            store.add_bet(new_bet(20.0, -110, 9)).unwrap();
            store.add_bet(new_bet(30.0, -110, 4)).unwrap();
        }

        let store = BetStore::open(&path).unwrap();
        let stakes: Vec<f64> = store.bets().iter().map(|b| b.stake).collect();
        assert_eq!(stakes, vec![20.0, 30.0, 10.0]);
        assert_eq!(store.recent(2).len(), 2);

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_settle_defaults() {
        let path = temp_path("json");
        let mut store = BetStore::open(&path).unwrap();
        let win = store.add_bet(new_bet(100.0, -110, 2)).unwrap();
        let push = store.add_bet(new_bet(40.0, -110, 3)).unwrap();
        let loss = store.add_bet(new_bet(25.0, 120, 4)).unwrap();

        let won = store.settle_bet(&win.id, BetStatus::Won, None).unwrap();
        assert!((won.actual_payout.unwrap() - 190.909).abs() < 0.001);
        assert!(won.settled_at.is_some());

        let pushed = store.settle_bet(&push.id, BetStatus::Push, None).unwrap();
        assert_eq!(pushed.actual_payout, Some(40.0));
        assert_eq!(pushed.profit(), 0.0);

        let lost = store.settle_bet(&loss.id, BetStatus::Lost, None).unwrap();
        assert_eq!(lost.profit(), -25.0);

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_settle_rejects_pending_and_unknown_id() {
        let path = temp_path("json");
        let mut store = BetStore::open(&path).unwrap();
        let bet = store.add_bet(new_bet(10.0, -110, 2)).unwrap();

        let err = store.settle_bet(&bet.id, BetStatus::Pending, None).unwrap_err();
        assert_eq!(
            err.downcast_ref::<BetError>(),
            Some(&BetError::NotASettlement(BetStatus::Pending))
        );
        assert!(store.settle_bet("missing", BetStatus::Won, None).is_err());

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_update_recomputes_payout() {
        let path = temp_path("json");
        let mut store = BetStore::open(&path).unwrap();
        let bet = store.add_bet(new_bet(100.0, -110, 2)).unwrap();

        let updated = store
            .update_bet(
                &bet.id,
                BetUpdate {
                    odds: Some(200),
                    notes: Some("line moved".to_string()),
                    ..Default::default()
                },
            )
            .unwrap();
        assert!((updated.potential_payout - 300.0).abs() < 1e-9);
        assert_eq!(updated.notes.as_deref(), Some("line moved"));
        assert_eq!(updated.description, "Chiefs ML");

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_delete_bet() {
        let path = temp_path("json");
        let mut store = BetStore::open(&path).unwrap();
        let bet = store.add_bet(new_bet(10.0, -110, 2)).unwrap();

        store.delete_bet(&bet.id).unwrap();
        assert!(store.get(&bet.id).is_none());
        assert!(store.delete_bet(&bet.id).is_err());

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_export_csv() {
        let path = temp_path("json");
        let csv_path = temp_path("csv");
        let mut store = BetStore::open(&path).unwrap();
        let bet = store.add_bet(new_bet(50.0, -110, 2)).unwrap();
        store.settle_bet(&bet.id, BetStatus::Won, Some(95.45)).unwrap();

        export_bets_to_csv(store.bets(), &csv_path).unwrap();
        let contents = std::fs::read_to_string(&csv_path).unwrap();
        let mut lines = contents.lines();
        assert!(lines.next().unwrap().starts_with("id,placed_at,settled_at,sport"));
        let row = lines.next().unwrap();
        assert!(row.contains("NFL"));
        assert!(row.contains("won"));
        assert!(row.contains("45.45"));

        std::fs::remove_file(&path).ok();
        std::fs::remove_file(&csv_path).ok();
    }
}
