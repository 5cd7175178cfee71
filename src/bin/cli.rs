use anyhow::{Context, Result};
use bet_tracker::config::Settings;
use bet_tracker::data::{export_bets_to_csv, BetStore};
use bet_tracker::error::{validate_odds, validate_probability};
use bet_tracker::odds_math::{
    american_odds_to_probability, american_to_decimal, calculate_expected_value, payout,
};
use bet_tracker::strategy::{all_recommendations, quick_verdict, StrategyInputs};
use bet_tracker::{
    build_dashboard, demo_games, BetStatus, BetType, Market, NewBet, OddsApiClient, Sport,
};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "bet-tracker", about = "Track sports bets, bankroll and bet sizing")]
struct Cli {
    /// Bet file (overrides BETS_FILE)
    #[arg(long, global = true)]
    file: Option<PathBuf>,

    /// Starting bankroll (overrides STARTING_BANKROLL)
    #[arg(long, global = true)]
    start: Option<f64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Log a new pending bet
    Add {
        #[arg(long)]
        sport: Sport,
        #[arg(long, default_value = "moneyline")]
        bet_type: BetType,
        #[arg(long)]
        description: String,
        #[arg(long)]
        stake: f64,
        #[arg(long, allow_negative_numbers = true)]
        odds: i32,
        #[arg(long)]
        teams: Option<String>,
        #[arg(long)]
        event_date: Option<DateTime<Utc>>,
        #[arg(long)]
        location: Option<String>,
        #[arg(long)]
        notes: Option<String>,
        #[arg(long)]
        confidence: Option<u8>,
    },
    /// Settle a bet as won, lost, push or cancelled
    Settle {
        id: String,
        status: BetStatus,
        /// Amount returned; defaults to the potential payout for wins and the stake for pushes
        #[arg(long)]
        payout: Option<f64>,
    },
    /// Delete a bet
    Delete { id: String },
    /// List bets, most recent first
    List {
        #[arg(long)]
        status: Option<BetStatus>,
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
    /// Overall betting stats
    Stats,
    /// Bankroll history replayed from settled bets
    Bankroll,
    /// Performance by sport, bet type and confidence
    Breakdown,
    /// Bet sizing recommendations for a hypothetical bet
    Recommend {
        #[arg(long, allow_negative_numbers = true)]
        odds: i32,
        /// Defaults to the current bankroll
        #[arg(long)]
        bankroll: Option<f64>,
        /// Your estimated win probability in percent (e.g. 55)
        #[arg(long)]
        prob: Option<f64>,
        #[arg(long, default_value_t = 3)]
        confidence: u8,
    },
    /// Payout, decimal odds, implied probability and EV for a stake
    Odds {
        #[arg(long, default_value_t = 100.0)]
        stake: f64,
        #[arg(long, allow_negative_numbers = true)]
        odds: i32,
        /// Your estimated win probability in percent
        #[arg(long)]
        prob: Option<f64>,
    },
    /// Export all bets to CSV
    Export { path: PathBuf },
    /// Upcoming games and best prices from The Odds API (demo games without ODDS_API_KEY)
    Games {
        #[arg(long)]
        sport: Sport,
        /// Log a bet on this team ("Over"/"Under" for totals) at the best price found
        #[arg(long, requires = "stake")]
        team: Option<String>,
        /// moneyline, spread or total
        #[arg(long, default_value = "moneyline")]
        market: Market,
        #[arg(long)]
        stake: Option<f64>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let mut settings = Settings::from_env()?;
    if let Some(file) = cli.file {
        settings.bets_file = file;
    }
    if let Some(start) = cli.start {
        settings.starting_bankroll = start;
    }

    let mut store = BetStore::open(&settings.bets_file)?;

    match cli.command {
        Command::Add {
            sport,
            bet_type,
            description,
            stake,
            odds,
            teams,
            event_date,
            location,
            notes,
            confidence,
        } => {
            let bet = store.add_bet(NewBet {
                sport,
                bet_type,
                description,
                stake,
                odds,
                teams,
                event_date,
                placed_at: None,
                notes,
                location,
                confidence,
            })?;
            println!(
                "Added {} | {} ${:.2} at {:+} | To win: ${:.2}",
                bet.id,
                bet.description,
                bet.stake,
                bet.odds,
                bet.potential_payout - bet.stake
            );
        }
        Command::Settle { id, status, payout } => {
            let bet = store.settle_bet(&id, status, payout)?;
            println!(
                "Settled {} as {} | Profit: {:+.2}",
                bet.description,
                bet.status,
                bet.profit()
            );
        }
        Command::Delete { id } => {
            let bet = store.delete_bet(&id)?;
            println!("Deleted {} ({})", bet.id, bet.description);
        }
        Command::List { status, limit } => {
            let bets: Vec<_> = store
                .bets()
                .iter()
                .filter(|b| status.map_or(true, |s| b.status == s))
                .take(limit)
                .collect();
            if bets.is_empty() {
                println!("No bets found.");
            }
            for bet in bets {
                println!(
                    "{} | {} | {:<8} | {:<10} | {} | ${:.2} at {:+} | {}",
                    bet.placed_at.format("%Y-%m-%d"),
                    bet.id,
                    bet.sport.label(),
                    bet.bet_type.label(),
                    bet.description,
                    bet.stake,
                    bet.odds,
                    bet.status
                );
            }
        }
        Command::Stats => {
            let dashboard = build_dashboard(store.bets(), settings.starting_bankroll);
            let s = &dashboard.stats;
            println!("BETTING STATS\n");
            println!("Total bets:     {}", s.total_bets);
            println!(
                "Record:         {}-{}-{} (W-L-P)",
                s.won_bets, s.lost_bets, s.push_bets
            );
            println!("Win rate:       {:.1}%", s.win_rate);
            println!("Total staked:   ${:.2}", s.total_staked);
            println!("Total returned: ${:.2}", s.total_returned);
            println!("Profit:         {:+.2}", s.profit);
            println!("ROI:            {:+.2}%", s.roi);
            println!("Average odds:   {:+.0}", s.average_odds);
            println!("Biggest win:    ${:.2}", s.biggest_win);
            println!("Biggest loss:   ${:.2}", s.biggest_loss);
            println!(
                "Pending:        {} bets (${:.2} at risk)",
                dashboard.pending_bets, dashboard.pending_stake
            );
        }
        Command::Bankroll => match bet_tracker::bankroll::reconstruct_bankroll(
            store.bets(),
            settings.starting_bankroll,
        ) {
            Some(curve) => {
                println!("{}\n", curve.format());
                for point in &curve.points {
                    println!("{:<8} ${:.2}", point.label, point.bankroll);
                }
            }
            None => println!("No settled bets yet."),
        },
        Command::Breakdown => {
            let report = bet_tracker::stats::performance_report(store.bets());
            if !report.has_settled_bets() {
                println!("No settled bets yet.");
                return Ok(());
            }

            if let Some(streak) = report.streak {
                println!("Current streak: {}", streak.format());
            }
            if let Some(best) = &report.best_category {
                println!(
                    "Best category:  {} ({:.0}% win rate, {}-{})",
                    best.label, best.win_rate, best.wins, best.losses
                );
            }
            if let Some(worst) = &report.worst_category {
                println!(
                    "Needs work:     {} ({:.0}% win rate, {}-{})",
                    worst.label, worst.win_rate, worst.wins, worst.losses
                );
            }

            for (title, rows) in [
                ("BY SPORT", &report.by_sport),
                ("BY BET TYPE", &report.by_bet_type),
                ("BY CONFIDENCE", &report.by_confidence),
            ] {
                println!("\n{}\n", title);
                for row in rows {
                    println!("{}", row.format());
                }
            }
        }
        Command::Recommend {
            odds,
            bankroll,
            prob,
            confidence,
        } => {
            let bankroll = bankroll.unwrap_or_else(|| {
                bet_tracker::bankroll::reconstruct_bankroll(store.bets(), settings.starting_bankroll)
                    .map_or(settings.starting_bankroll, |c| c.current_bankroll)
            });

            let inputs = StrategyInputs {
                bankroll,
                odds,
                win_probability: prob.map(|p| p / 100.0),
                recent_bets: Some(store.recent(10)),
                confidence: Some(confidence),
            };
            inputs.validate()?;

            println!("{}\n", quick_verdict(&inputs).format());
            for (i, rec) in all_recommendations(&inputs).iter().enumerate() {
                let stake = rec
                    .suggested_stake
                    .map(|s| format!("${:.2}", s))
                    .unwrap_or_else(|| "-".to_string());
                println!(
                    "{}. {} [{} risk] | Suggested: {}\n   {}\n{}\n",
                    i + 1,
                    rec.title,
                    rec.risk_level,
                    stake,
                    rec.description,
                    rec.reasoning
                );
            }
        }
        Command::Odds { stake, odds, prob } => {
            validate_odds(odds)?;
            let total = payout(stake, odds);
            println!("Payout:              ${:.2}", total);
            println!("Profit:              ${:.2}", total - stake);
            println!("Decimal odds:        {:.2}", american_to_decimal(odds));
            println!(
                "Implied probability: {:.1}%",
                american_odds_to_probability(odds) * 100.0
            );
            if let Some(p) = prob.map(|p| p / 100.0) {
                validate_probability(p)?;
                let ev = calculate_expected_value(stake, odds, p);
                println!(
                    "Expected value:      {:+.2} ({:+.2}%) - {}",
                    ev.ev,
                    ev.ev_percentage,
                    if ev.is_positive_ev {
                        "positive EV"
                    } else {
                        "negative EV, consider skipping"
                    }
                );
            }
        }
        Command::Export { path } => {
            export_bets_to_csv(store.bets(), &path)?;
            println!("Saved {} bets to {}", store.bets().len(), path.display());
        }
        Command::Games {
            sport,
            team,
            market,
            stake,
        } => {
            let games = match settings.odds_api_key.as_deref() {
                Some(key) => OddsApiClient::new(key.to_string())
                    .fetch_games(sport)
                    .await
                    .context("Failed to fetch upcoming games")?,
                None => {
                    println!("ODDS_API_KEY not set, showing demo games.\n");
                    demo_games(sport)
                }
            };

            match team {
                None => {
                    if games.is_empty() {
                        println!("No upcoming {} games found.", sport.label());
                    }
                    for (i, game) in games.iter().enumerate() {
                        println!("{}. {}", i + 1, game.format());
                    }
                }
                Some(team) => {
                    let draft = games
                        .iter()
                        .find_map(|g| g.draft_for(&team, market))
                        .with_context(|| format!("No upcoming {} odds for {}", market, team))?;
                    let stake = stake.context("--stake is required with --team")?;
                    let bet = store.add_bet(draft.into_new_bet(stake, None))?;
                    println!(
                        "Added {} | {} | {} ${:.2} at {:+}",
                        bet.id,
                        bet.teams.as_deref().unwrap_or(""),
                        bet.description,
                        bet.stake,
                        bet.odds
                    );
                }
            }
        }
    }

    Ok(())
}
