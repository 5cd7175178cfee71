use askama::Template;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use bet_tracker::bankroll::{reconstruct_bankroll, BankrollCurve};
use bet_tracker::config::Settings;
use bet_tracker::data::BetStore;
use bet_tracker::error::BetError;
use bet_tracker::stats::{calculate_stats, performance_report, BreakdownRow, PerformanceReport};
use bet_tracker::strategy::{all_recommendations, quick_verdict, QuickVerdict, StrategyInputs};
use bet_tracker::{
    build_dashboard, Bet, BetStatus, BetUpdate, BettingRecommendation, BettingStats, Dashboard,
    NewBet,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::services::ServeDir;
use tracing::{error, info};

// Custom filters for formatting
mod filters {
    pub fn format_odds(odds: &f64) -> ::askama::Result<String> {
        Ok(format!("{:+.0}", odds))
    }

    pub fn format_line(odds: &i32) -> ::askama::Result<String> {
        Ok(format!("{:+}", odds))
    }

    pub fn format_percent(value: &f64) -> ::askama::Result<String> {
        Ok(format!("{:.1}%", value))
    }

    pub fn format_money(value: &f64) -> ::askama::Result<String> {
        Ok(format!("${:.2}", value))
    }

    pub fn format_profit(value: &f64) -> ::askama::Result<String> {
        Ok(format!("{:+.2}", value))
    }
}

#[derive(Template)]
#[template(path = "dashboard.html")]
struct DashboardTemplate {
    dashboard: Dashboard,
    sections: Vec<(String, Vec<BreakdownRow>)>,
    recent_bets: Vec<Bet>,
}

struct HtmlTemplate<T>(T);

impl<T> IntoResponse for HtmlTemplate<T>
where
    T: Template,
{
    fn into_response(self) -> Response {
        match self.0.render() {
            Ok(html) => Html(html).into_response(),
            Err(err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to render template: {}", err),
            )
                .into_response(),
        }
    }
}

/// Store errors mapped onto HTTP status codes
struct ApiError(anyhow::Error);

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        Self(err)
    }
}

impl From<BetError> for ApiError {
    fn from(err: BetError) -> Self {
        Self(err.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.0.downcast_ref::<BetError>() {
            Some(BetError::NotFound(_)) => StatusCode::NOT_FOUND,
            Some(_) => StatusCode::BAD_REQUEST,
            None => {
                error!("request failed: {:#}", self.0);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        (status, Json(ErrorBody { error: self.0.to_string() })).into_response()
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

#[derive(Clone)]
struct AppState {
    store: Arc<RwLock<BetStore>>,
    starting_bankroll: f64,
}

async fn home(State(state): State<AppState>) -> impl IntoResponse {
    let store = state.store.read().await;

    let dashboard = build_dashboard(store.bets(), state.starting_bankroll);
    let sections = vec![
        ("By Sport".to_string(), dashboard.performance.by_sport.clone()),
        ("By Bet Type".to_string(), dashboard.performance.by_bet_type.clone()),
        ("By Confidence".to_string(), dashboard.performance.by_confidence.clone()),
    ];

    let template = DashboardTemplate {
        dashboard,
        sections,
        recent_bets: store.recent(10),
    };

    HtmlTemplate(template)
}

async fn list_bets(State(state): State<AppState>) -> Json<Vec<Bet>> {
    Json(state.store.read().await.bets().to_vec())
}

async fn add_bet(
    State(state): State<AppState>,
    Json(new_bet): Json<NewBet>,
) -> Result<(StatusCode, Json<Bet>), ApiError> {
    let bet = state.store.write().await.add_bet(new_bet)?;
    Ok((StatusCode::CREATED, Json(bet)))
}

async fn update_bet(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(update): Json<BetUpdate>,
) -> Result<Json<Bet>, ApiError> {
    Ok(Json(state.store.write().await.update_bet(&id, update)?))
}

async fn delete_bet(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Bet>, ApiError> {
    Ok(Json(state.store.write().await.delete_bet(&id)?))
}

#[derive(Deserialize)]
struct SettleRequest {
    status: BetStatus,
    #[serde(default)]
    actual_payout: Option<f64>,
}

async fn settle_bet(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<SettleRequest>,
) -> Result<Json<Bet>, ApiError> {
    let bet = state
        .store
        .write()
        .await
        .settle_bet(&id, req.status, req.actual_payout)?;
    Ok(Json(bet))
}

async fn dashboard(State(state): State<AppState>) -> Json<Dashboard> {
    let store = state.store.read().await;
    Json(build_dashboard(store.bets(), state.starting_bankroll))
}

async fn stats(State(state): State<AppState>) -> Json<BettingStats> {
    Json(calculate_stats(state.store.read().await.bets()))
}

#[derive(Deserialize)]
struct BankrollQuery {
    start: Option<f64>,
}

async fn bankroll(
    State(state): State<AppState>,
    Query(query): Query<BankrollQuery>,
) -> Json<Option<BankrollCurve>> {
    let start = query.start.unwrap_or(state.starting_bankroll);
    Json(reconstruct_bankroll(state.store.read().await.bets(), start))
}

async fn breakdown(State(state): State<AppState>) -> Json<PerformanceReport> {
    Json(performance_report(state.store.read().await.bets()))
}

#[derive(Deserialize)]
struct RecommendationRequest {
    odds: i32,
    /// Defaults to the current bankroll
    #[serde(default)]
    bankroll: Option<f64>,
    #[serde(default)]
    win_probability: Option<f64>,
    #[serde(default)]
    confidence: Option<u8>,
}

#[derive(Serialize)]
struct RecommendationResponse {
    verdict: QuickVerdict,
    recommendations: Vec<BettingRecommendation>,
}

async fn recommendations(
    State(state): State<AppState>,
    Json(req): Json<RecommendationRequest>,
) -> Result<Json<RecommendationResponse>, ApiError> {
    let store = state.store.read().await;
    let bankroll = req.bankroll.unwrap_or_else(|| {
        reconstruct_bankroll(store.bets(), state.starting_bankroll)
            .map_or(state.starting_bankroll, |c| c.current_bankroll)
    });

    let inputs = StrategyInputs {
        bankroll,
        odds: req.odds,
        win_probability: req.win_probability,
        recent_bets: Some(store.recent(10)),
        confidence: req.confidence,
    };
    inputs.validate()?;

    Ok(Json(RecommendationResponse {
        verdict: quick_verdict(&inputs),
        recommendations: all_recommendations(&inputs),
    }))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    let settings = Settings::from_env()?;
    let store = BetStore::open(&settings.bets_file)?;
    info!(
        bets = store.bets().len(),
        starting_bankroll = settings.starting_bankroll,
        "loaded bets"
    );

    let state = AppState {
        store: Arc::new(RwLock::new(store)),
        starting_bankroll: settings.starting_bankroll,
    };

    // Build router with routes
    let app = Router::new()
        // This will serve files from the "static" directory at the "/static" URL path
        .nest_service("/static", ServeDir::new("static"))
        .route("/", get(home))
        .route("/api/bets", get(list_bets).post(add_bet))
        .route("/api/bets/:id", delete(delete_bet).patch(update_bet))
        .route("/api/bets/:id/settle", post(settle_bet))
        .route("/api/dashboard", get(dashboard))
        .route("/api/stats", get(stats))
        .route("/api/bankroll", get(bankroll))
        .route("/api/breakdown", get(breakdown))
        .route("/api/recommendations", post(recommendations))
        .with_state(state);

    println!("\nStarting web server at http://{}", settings.web_addr);
    println!("Press Ctrl+C to stop\n");

    let listener = tokio::net::TcpListener::bind(&settings.web_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
