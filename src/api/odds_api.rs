use crate::error::BetError;
use crate::models::{BetDraft, BetType, Sport};
use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::{info, warn};

const ODDS_API_BASE_URL: &str = "https://api.the-odds-api.com/v4";

/// The Odds API sport key for a tracked sport
pub fn sport_key(sport: Sport) -> Option<&'static str> {
    match sport {
        Sport::Nfl => Some("americanfootball_nfl"),
        Sport::Nba => Some("basketball_nba"),
        Sport::Mlb => Some("baseball_mlb"),
        Sport::Nhl => Some("icehockey_nhl"),
        Sport::Ncaaf => Some("americanfootball_ncaaf"),
        Sport::Ncaab => Some("basketball_ncaab"),
        Sport::Soccer => Some("soccer_epl"), // Premier League as default
        Sport::Mma => Some("mma_mixed_martial_arts"),
        Sport::Boxing | Sport::Other => None,
    }
}

/// Betting market offered by the provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Market {
    Moneyline,
    Spread,
    Total,
}

impl Market {
    pub const ALL: [Market; 3] = [Market::Moneyline, Market::Spread, Market::Total];

    /// Provider market key
    pub fn key(&self) -> &'static str {
        match self {
            Market::Moneyline => "h2h",
            Market::Spread => "spreads",
            Market::Total => "totals",
        }
    }

    pub fn bet_type(&self) -> BetType {
        match self {
            Market::Moneyline => BetType::Moneyline,
            Market::Spread => BetType::Spread,
            Market::Total => BetType::Total,
        }
    }
}

impl fmt::Display for Market {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.bet_type().label())
    }
}

impl FromStr for Market {
    type Err = BetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "moneyline" | "ml" | "h2h" => Ok(Market::Moneyline),
            "spread" | "spreads" => Ok(Market::Spread),
            "total" | "totals" => Ok(Market::Total),
            _ => Err(BetError::UnknownVariant {
                kind: "market",
                value: s.to_string(),
            }),
        }
    }
}

/// Response from The Odds API for a single game
#[derive(Debug, Deserialize)]
pub struct OddsApiGame {
    id: String,
    commence_time: DateTime<Utc>,
    home_team: String,
    away_team: String,
    #[serde(default)]
    bookmakers: Vec<OddsApiBookmaker>,
}

/// Bookmaker data from The Odds API
#[derive(Debug, Deserialize)]
struct OddsApiBookmaker {
    title: String,
    last_update: DateTime<Utc>,
    markets: Vec<OddsApiMarket>,
}

/// Market data (h2h, spreads, totals) from The Odds API
#[derive(Debug, Deserialize)]
struct OddsApiMarket {
    key: String,
    outcomes: Vec<OddsApiOutcome>,
}

/// Outcome data for a team, or Over/Under on totals
#[derive(Debug, Deserialize)]
struct OddsApiOutcome {
    name: String,
    price: f64,
    #[serde(default)]
    point: Option<f64>,
}

/// One priced outcome. `name` is the team, or "Over"/"Under" for totals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketLine {
    pub name: String,
    pub price: i32, // American odds format (e.g., -110, +150)
    pub point: Option<f64>,
}

/// One sportsbook's lines for a game
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookmakerOdds {
    pub bookmaker: String,
    pub last_update: DateTime<Utc>,
    pub moneyline: Vec<MarketLine>,
    pub spreads: Vec<MarketLine>,
    pub totals: Vec<MarketLine>,
}

impl BookmakerOdds {
    pub fn lines(&self, market: Market) -> &[MarketLine] {
        match market {
            Market::Moneyline => &self.moneyline,
            Market::Spread => &self.spreads,
            Market::Total => &self.totals,
        }
    }
}

/// Best price found for a selection and the book offering it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BestLine {
    pub price: i32,
    pub point: Option<f64>,
    pub bookmaker: String,
}

/// Upcoming game with odds from every bookmaker that lists it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpcomingGame {
    pub id: String,
    pub sport: Sport,
    pub home_team: String,
    pub away_team: String,
    pub commence_time: DateTime<Utc>,
    pub odds: Vec<BookmakerOdds>,
}

impl UpcomingGame {
    pub fn matchup(&self) -> String {
        format!("{} @ {}", self.away_team, self.home_team)
    }

    /// Highest price for `selection` in `market` across bookmakers.
    /// The line (`point`) comes from the same book as the price.
    pub fn best_odds(&self, selection: &str, market: Market) -> Option<BestLine> {
        let mut best: Option<BestLine> = None;
        for book in &self.odds {
            let Some(line) = book.lines(market).iter().find(|l| l.name == selection) else {
                continue;
            };
            if best.as_ref().map_or(true, |b| line.price > b.price) {
                best = Some(BestLine {
                    price: line.price,
                    point: line.point,
                    bookmaker: book.bookmaker.clone(),
                });
            }
        }
        best
    }

    /// Prefill a bet on `selection` at the best available price.
    /// Spreads and totals need a line; without one there is nothing to prefill.
    pub fn draft_for(&self, selection: &str, market: Market) -> Option<BetDraft> {
        let best = self.best_odds(selection, market)?;
        let description = match market {
            Market::Moneyline => format!("{} ML", selection),
            Market::Spread => format!("{} {:+}", selection, best.point?),
            Market::Total => format!("{} {}", selection, best.point?),
        };

        Some(BetDraft {
            sport: self.sport,
            bet_type: market.bet_type(),
            description,
            teams: self.matchup(),
            odds: best.price,
            event_date: self.commence_time,
            bookmaker: best.bookmaker,
        })
    }

    pub fn format(&self) -> String {
        let side = |team: &str| {
            let ml = match self.best_odds(team, Market::Moneyline) {
                Some(best) => format!("{:+} ({})", best.price, best.bookmaker),
                None => "n/a".to_string(),
            };
            match self.best_odds(team, Market::Spread) {
                Some(BestLine {
                    price,
                    point: Some(point),
                    ..
                }) => format!("{} [{:+} at {:+}]", ml, point, price),
                _ => ml,
            }
        };

        let mut line = format!(
            "{} | {} | {}: {} | {}: {}",
            self.commence_time.format("%a %b %-d %H:%M"),
            self.matchup(),
            self.away_team,
            side(&self.away_team),
            self.home_team,
            side(&self.home_team)
        );
        if let Some(BestLine {
            price,
            point: Some(point),
            ..
        }) = self.best_odds("Over", Market::Total)
        {
            line.push_str(&format!(" | O/U {} (Over {:+})", point, price));
        }
        line
    }
}

fn convert_lines(market: &OddsApiMarket) -> Vec<MarketLine> {
    market
        .outcomes
        .iter()
        .map(|outcome| MarketLine {
            name: outcome.name.clone(),
            price: outcome.price.round() as i32,
            point: outcome.point,
        })
        .collect()
}

/// Convert provider games into our own types, keeping moneyline, spread and total markets.
/// Bookmakers offering none of those are dropped.
pub fn into_upcoming_games(sport: Sport, api_games: Vec<OddsApiGame>) -> Vec<UpcomingGame> {
    api_games
        .into_iter()
        .map(|api_game| {
            let odds = api_game
                .bookmakers
                .into_iter()
                .filter_map(|bookmaker| {
                    let lines_for = |market: Market| {
                        bookmaker
                            .markets
                            .iter()
                            .find(|m| m.key == market.key())
                            .map(convert_lines)
                            .unwrap_or_default()
                    };
                    let moneyline = lines_for(Market::Moneyline);
                    let spreads = lines_for(Market::Spread);
                    let totals = lines_for(Market::Total);

                    if moneyline.is_empty() && spreads.is_empty() && totals.is_empty() {
                        return None;
                    }

                    Some(BookmakerOdds {
                        bookmaker: bookmaker.title,
                        last_update: bookmaker.last_update,
                        moneyline,
                        spreads,
                        totals,
                    })
                })
                .collect();

            UpcomingGame {
                id: api_game.id,
                sport,
                home_team: api_game.home_team,
                away_team: api_game.away_team,
                commence_time: api_game.commence_time,
                odds,
            }
        })
        .collect()
}

fn line(name: &str, price: i32, point: Option<f64>) -> MarketLine {
    MarketLine {
        name: name.to_string(),
        price,
        point,
    }
}

/// Sample games for browsing without an API key
pub fn demo_games(sport: Sport) -> Vec<UpcomingGame> {
    let now = Utc::now();
    let games = vec![
        UpcomingGame {
            id: "demo-1".to_string(),
            sport: Sport::Nba,
            home_team: "Los Angeles Lakers".to_string(),
            away_team: "Golden State Warriors".to_string(),
            commence_time: now + Duration::hours(1),
            odds: vec![BookmakerOdds {
                bookmaker: "DraftKings".to_string(),
                last_update: now,
                moneyline: vec![
                    line("Los Angeles Lakers", -150, None),
                    line("Golden State Warriors", 130, None),
                ],
                spreads: vec![
                    line("Los Angeles Lakers", -110, Some(-3.5)),
                    line("Golden State Warriors", -110, Some(3.5)),
                ],
                totals: vec![
                    line("Over", -110, Some(228.5)),
                    line("Under", -110, Some(228.5)),
                ],
            }],
        },
        UpcomingGame {
            id: "demo-2".to_string(),
            sport: Sport::Nfl,
            home_team: "Kansas City Chiefs".to_string(),
            away_team: "Buffalo Bills".to_string(),
            commence_time: now + Duration::hours(2),
            odds: vec![BookmakerOdds {
                bookmaker: "FanDuel".to_string(),
                last_update: now,
                moneyline: vec![
                    line("Kansas City Chiefs", -120, None),
                    line("Buffalo Bills", 100, None),
                ],
                spreads: Vec::new(),
                totals: Vec::new(),
            }],
        },
    ];

    games.into_iter().filter(|g| g.sport == sport).collect()
}

pub struct OddsApiClient {
    api_key: String,
    client: reqwest::Client,
}

impl OddsApiClient {
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            client: reqwest::Client::new(),
        }
    }

    /// Fetch upcoming games with moneyline, spread and total odds; games already underway are dropped
    pub async fn fetch_games(&self, sport: Sport) -> Result<Vec<UpcomingGame>> {
        let Some(key) = sport_key(sport) else {
            anyhow::bail!("The Odds API has no feed for {}", sport.label());
        };
        let url = format!("{}/sports/{}/odds", ODDS_API_BASE_URL, key);
        let markets = Market::ALL
            .iter()
            .map(|m| m.key())
            .collect::<Vec<_>>()
            .join(",");

        let response = self
            .client
            .get(&url)
            .query(&[
                ("apiKey", self.api_key.as_str()),
                ("regions", "us"),
                ("markets", markets.as_str()),
                ("oddsFormat", "american"),
            ])
            .send()
            .await
            .context("Failed to fetch odds from The Odds API")?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED {
            anyhow::bail!("Invalid Odds API key");
        }
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            anyhow::bail!("Odds API rate limit exceeded (free tier allows 500 requests per month)");
        }
        if !status.is_success() {
            anyhow::bail!("Odds API returned error: {}", status);
        }

        match response
            .headers()
            .get("x-requests-remaining")
            .and_then(|v| v.to_str().ok())
        {
            Some(remaining) => info!(remaining, "odds api quota"),
            None => warn!("odds api response had no quota header"),
        }

        let api_games: Vec<OddsApiGame> = response
            .json()
            .await
            .context("Failed to parse Odds API response")?;

        let now = Utc::now();
        Ok(into_upcoming_games(sport, api_games)
            .into_iter()
            .filter(|game| game.commence_time > now)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"[
      {
        "id": "abc123",
        "sport_key": "americanfootball_nfl",
        "sport_title": "NFL",
        "commence_time": "2024-09-06T00:20:00Z",
        "home_team": "Kansas City Chiefs",
        "away_team": "Baltimore Ravens",
        "bookmakers": [
          {
            "key": "draftkings",
            "title": "DraftKings",
            "last_update": "2024-09-05T12:00:00Z",
            "markets": [
              { "key": "h2h", "last_update": "2024-09-05T12:00:00Z", "outcomes": [
                { "name": "Kansas City Chiefs", "price": -150 },
                { "name": "Baltimore Ravens", "price": 125 }
              ]},
              { "key": "spreads", "last_update": "2024-09-05T12:00:00Z", "outcomes": [
                { "name": "Kansas City Chiefs", "price": -112, "point": -3.0 },
                { "name": "Baltimore Ravens", "price": -108, "point": 3.0 }
              ]}
            ]
          },
          {
            "key": "fanduel",
            "title": "FanDuel",
            "last_update": "2024-09-05T12:05:00Z",
            "markets": [
              { "key": "h2h", "last_update": "2024-09-05T12:05:00Z", "outcomes": [
                { "name": "Kansas City Chiefs", "price": -142 },
                { "name": "Baltimore Ravens", "price": 120 }
              ]}
            ]
          },
          {
            "key": "bovada",
            "title": "Bovada",
            "last_update": "2024-09-05T12:05:00Z",
            "markets": [
              { "key": "spreads", "last_update": "2024-09-05T12:05:00Z", "outcomes": [
                { "name": "Kansas City Chiefs", "price": -105, "point": -3.5 },
                { "name": "Baltimore Ravens", "price": -115, "point": 3.5 }
              ]},
              { "key": "totals", "last_update": "2024-09-05T12:05:00Z", "outcomes": [
                { "name": "Over", "price": -110, "point": 46.5 },
                { "name": "Under", "price": -110, "point": 46.5 }
              ]}
            ]
          },
          {
            "key": "pointsbet",
            "title": "PointsBet",
            "last_update": "2024-09-05T12:05:00Z",
            "markets": [
              { "key": "outrights", "last_update": "2024-09-05T12:05:00Z", "outcomes": [
                { "name": "Kansas City Chiefs", "price": 500 }
              ]}
            ]
          }
        ]
      }
    ]"#;

    fn sample_games() -> Vec<UpcomingGame> {
        let api_games: Vec<OddsApiGame> = serde_json::from_str(SAMPLE).unwrap();
        into_upcoming_games(Sport::Nfl, api_games)
    }

    #[test]
    fn test_parse_keeps_books_with_supported_markets() {
        let games = sample_games();
        assert_eq!(games.len(), 1);
        let books: Vec<&str> = games[0].odds.iter().map(|b| b.bookmaker.as_str()).collect();
        // Spreads/totals-only book is kept, outrights-only book is not
        assert_eq!(books, vec!["DraftKings", "FanDuel", "Bovada"]);
        assert!(games[0].odds[2].moneyline.is_empty());
        assert_eq!(games[0].odds[2].totals.len(), 2);
        assert_eq!(games[0].matchup(), "Baltimore Ravens @ Kansas City Chiefs");
    }

    #[test]
    fn test_best_odds() {
        let game = &sample_games()[0];
        let best = game.best_odds("Kansas City Chiefs", Market::Moneyline).unwrap();
        assert_eq!((best.price, best.bookmaker.as_str()), (-142, "FanDuel"));
        assert_eq!(best.point, None);

        let best = game.best_odds("Baltimore Ravens", Market::Moneyline).unwrap();
        assert_eq!((best.price, best.bookmaker.as_str()), (125, "DraftKings"));

        assert_eq!(game.best_odds("Buffalo Bills", Market::Moneyline), None);
    }

    #[test]
    fn test_best_spread_keeps_line_from_same_book() {
        let game = &sample_games()[0];
        let best = game.best_odds("Kansas City Chiefs", Market::Spread).unwrap();
        assert_eq!(best.price, -105);
        assert_eq!(best.point, Some(-3.5));
        assert_eq!(best.bookmaker, "Bovada");
    }

    #[test]
    fn test_draft_for_moneyline() {
        let game = &sample_games()[0];
        let draft = game.draft_for("Baltimore Ravens", Market::Moneyline).unwrap();
        assert_eq!(draft.description, "Baltimore Ravens ML");
        assert_eq!(draft.odds, 125);
        assert_eq!(draft.bet_type, BetType::Moneyline);
        assert_eq!(draft.bookmaker, "DraftKings");
        assert_eq!(draft.event_date, game.commence_time);
    }

    #[test]
    fn test_draft_for_spread_and_total() {
        let game = &sample_games()[0];

        let draft = game.draft_for("Baltimore Ravens", Market::Spread).unwrap();
        assert_eq!(draft.bet_type, BetType::Spread);
        assert_eq!(draft.description, "Baltimore Ravens +3");
        assert_eq!(draft.odds, -108);

        let draft = game.draft_for("Kansas City Chiefs", Market::Spread).unwrap();
        assert_eq!(draft.description, "Kansas City Chiefs -3.5");

        let draft = game.draft_for("Over", Market::Total).unwrap();
        assert_eq!(draft.bet_type, BetType::Total);
        assert_eq!(draft.description, "Over 46.5");
        assert_eq!(draft.teams, "Baltimore Ravens @ Kansas City Chiefs");
    }

    #[test]
    fn test_spread_without_line_has_no_draft() {
        let mut game = sample_games().remove(0);
        for book in &mut game.odds {
            for l in &mut book.spreads {
                l.point = None;
            }
        }
        assert!(game.best_odds("Baltimore Ravens", Market::Spread).is_some());
        assert!(game.draft_for("Baltimore Ravens", Market::Spread).is_none());
    }

    #[test]
    fn test_market_from_str() {
        assert_eq!("h2h".parse::<Market>().unwrap(), Market::Moneyline);
        assert_eq!("Spreads".parse::<Market>().unwrap(), Market::Spread);
        assert_eq!("total".parse::<Market>().unwrap(), Market::Total);
        assert!("parlay".parse::<Market>().is_err());
    }

    #[test]
    fn test_demo_games() {
        let nba = demo_games(Sport::Nba);
        assert_eq!(nba.len(), 1);
        assert!(nba[0].commence_time > Utc::now());
        let draft = nba[0].draft_for("Los Angeles Lakers", Market::Spread).unwrap();
        assert_eq!(draft.description, "Los Angeles Lakers -3.5");

        assert_eq!(demo_games(Sport::Nfl).len(), 1);
        assert!(demo_games(Sport::Mlb).is_empty());
    }

    #[test]
    fn test_sport_key() {
        assert_eq!(sport_key(Sport::Ncaab), Some("basketball_ncaab"));
        assert_eq!(sport_key(Sport::Boxing), None);
    }

    #[tokio::test]
    #[ignore]
    async fn test_fetch_games() {
        dotenv::dotenv().ok();
        let api_key = std::env::var("ODDS_API_KEY").expect("ODDS_API_KEY not set");
        let client = OddsApiClient::new(api_key);

        let games = client.fetch_games(Sport::Nfl).await.unwrap();
        assert!(games.iter().all(|g| g.commence_time > Utc::now()));
    }
}
