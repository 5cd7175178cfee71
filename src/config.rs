use crate::utils::bankroll::DEFAULT_STARTING_BANKROLL;
use anyhow::{Context, Result};
use std::path::PathBuf;

const DEFAULT_BETS_FILE: &str = "data/bets.json";
const DEFAULT_WEB_ADDR: &str = "127.0.0.1:3000";

/// Runtime settings read from the environment (and `.env`)
#[derive(Debug, Clone)]
pub struct Settings {
    pub bets_file: PathBuf,
    pub starting_bankroll: f64,
    pub odds_api_key: Option<String>,
    pub web_addr: String,
}

impl Settings {
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();

        let bets_file = std::env::var("BETS_FILE").unwrap_or_else(|_| DEFAULT_BETS_FILE.to_string());
        let starting_bankroll = match std::env::var("STARTING_BANKROLL") {
            Ok(raw) => raw
                .trim()
                .parse::<f64>()
                .with_context(|| format!("STARTING_BANKROLL is not a number: {}", raw))?,
            Err(_) => DEFAULT_STARTING_BANKROLL,
        };
        let odds_api_key = std::env::var("ODDS_API_KEY").ok().filter(|k| !k.is_empty());
        let web_addr = std::env::var("WEB_ADDR").unwrap_or_else(|_| DEFAULT_WEB_ADDR.to_string());

        Ok(Self {
            bets_file: PathBuf::from(bets_file),
            starting_bankroll,
            odds_api_key,
            web_addr,
        })
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bets_file: PathBuf::from(DEFAULT_BETS_FILE),
            starting_bankroll: DEFAULT_STARTING_BANKROLL,
            odds_api_key: None,
            web_addr: DEFAULT_WEB_ADDR.to_string(),
        }
    }
}
