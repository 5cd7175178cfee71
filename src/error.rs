use crate::models::BetStatus;
use thiserror::Error;

/// Validation failures raised at the store and input edges.
/// The computation core never returns these; it falls back to zero instead.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BetError {
    #[error("stake must be a positive amount, got {0}")]
    InvalidStake(f64),

    #[error("odds of 0 are not valid American odds")]
    ZeroOdds,

    #[error("confidence must be between 1 and 5, got {0}")]
    InvalidConfidence(u8),

    #[error("win probability must be between 0 and 1 (exclusive), got {0}")]
    InvalidProbability(f64),

    #[error("bankroll must be positive, got {0}")]
    InvalidBankroll(f64),

    #[error("no bet found with id {0}")]
    NotFound(String),

    #[error("cannot settle a bet as {0}")]
    NotASettlement(BetStatus),

    #[error("unknown {kind}: {value}")]
    UnknownVariant { kind: &'static str, value: String },
}

pub fn validate_stake(stake: f64) -> Result<(), BetError> {
    if !stake.is_finite() || stake <= 0.0 {
        return Err(BetError::InvalidStake(stake));
    }
    Ok(())
}

pub fn validate_odds(odds: i32) -> Result<(), BetError> {
    if odds == 0 {
        return Err(BetError::ZeroOdds);
    }
    Ok(())
}

pub fn validate_confidence(confidence: u8) -> Result<(), BetError> {
    if !(1..=5).contains(&confidence) {
        return Err(BetError::InvalidConfidence(confidence));
    }
    Ok(())
}

pub fn validate_probability(prob: f64) -> Result<(), BetError> {
    if !(prob > 0.0 && prob < 1.0) {
        return Err(BetError::InvalidProbability(prob));
    }
    Ok(())
}

pub fn validate_bankroll(bankroll: f64) -> Result<(), BetError> {
    if !bankroll.is_finite() || bankroll <= 0.0 {
        return Err(BetError::InvalidBankroll(bankroll));
    }
    Ok(())
}
