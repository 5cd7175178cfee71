pub mod odds_api;

pub use odds_api::{demo_games, sport_key, BestLine, Market, OddsApiClient, UpcomingGame};
