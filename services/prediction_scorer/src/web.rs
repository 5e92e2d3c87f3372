use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Json, Response},
    routing::get,
    Router,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use tokio::sync::{oneshot, RwLock};
use tracing::{error, info};

use crate::config::ScorerConfig;
use crate::dashboard::{for_user_with_players, tabs, DashboardTabs};
use crate::leaderboard::{build_leaderboard_with, LeaderboardEntry};
use crate::scoring::EmbeddedOrRoster;
use crate::status::{classify, time_label};
use crate::store::Snapshot;
use crate::types::{MatchStatus, MatchSummary};

#[derive(Clone)]
pub struct AppState {
    pub snapshot: Arc<RwLock<Snapshot>>,
    pub config: Arc<ScorerConfig>,
    /// Pins "now" for every request when set.
    pub fixed_now: Option<DateTime<Utc>>,
}

impl AppState {
    pub fn new(snapshot: Snapshot, config: ScorerConfig) -> Self {
        Self {
            snapshot: Arc::new(RwLock::new(snapshot)),
            config: Arc::new(config),
            fixed_now: None,
        }
    }

    pub fn with_fixed_now(mut self, now: DateTime<Utc>) -> Self {
        self.fixed_now = Some(now);
        self
    }

    fn now(&self) -> DateTime<Utc> {
        self.fixed_now.unwrap_or_else(Utc::now)
    }
}

#[derive(Debug)]
pub enum ApiError {
    NotFound(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::NotFound(message) => {
                (StatusCode::NOT_FOUND, Json(json!({ "error": message }))).into_response()
            }
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchListing {
    #[serde(flatten)]
    pub summary: MatchSummary,
    pub phase: MatchStatus,
    pub time_label: String,
    pub prediction_count: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardResponse {
    pub match_id: String,
    pub podium_size: usize,
    pub entries: Vec<LeaderboardEntry>,
}

#[axum::debug_handler]
pub async fn health_handler() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

#[axum::debug_handler]
pub async fn matches_handler(State(state): State<AppState>) -> Json<Vec<MatchListing>> {
    let now = state.now();
    let snapshot = state.snapshot.read().await;
    let mut listings: Vec<MatchListing> = snapshot
        .matches
        .iter()
        .map(|game| MatchListing {
            summary: MatchSummary::from(game),
            phase: classify(game, now),
            time_label: time_label(game.timestamp, now),
            prediction_count: snapshot.predictions_for_match(&game.id).len(),
        })
        .collect();
    listings.sort_by(|a, b| b.summary.timestamp.cmp(&a.summary.timestamp));
    Json(listings)
}

async fn leaderboard_for(
    state: &AppState,
    match_id: &str,
) -> Result<(MatchSummary, Vec<LeaderboardEntry>), ApiError> {
    let snapshot = state.snapshot.read().await;
    let game = snapshot
        .find_match(match_id)
        .ok_or_else(|| ApiError::NotFound(format!("Unknown match {}", match_id)))?;
    let entries = build_leaderboard_with(
        &snapshot.predictions,
        match_id,
        Some(game),
        &EmbeddedOrRoster::from_players(&game.id, &snapshot.players),
    );
    Ok((MatchSummary::from(game), entries))
}

#[axum::debug_handler]
pub async fn leaderboard_handler(
    State(state): State<AppState>,
    Path(match_id): Path<String>,
) -> Result<Json<LeaderboardResponse>, ApiError> {
    let (_, entries) = leaderboard_for(&state, &match_id).await?;
    Ok(Json(LeaderboardResponse {
        match_id,
        podium_size: state.config.leaderboard.podium_size,
        entries,
    }))
}

#[axum::debug_handler]
pub async fn leaderboard_page_handler(
    State(state): State<AppState>,
    Path(match_id): Path<String>,
) -> Result<Html<String>, ApiError> {
    let (summary, entries) = leaderboard_for(&state, &match_id).await?;
    let podium_size = state.config.leaderboard.podium_size;
    let title = summary.title;

    let rows = if entries.is_empty() {
        r#"<p class="empty">No predictions found for this match</p>"#.to_string()
    } else {
        entries
            .iter()
            .map(|entry| {
                format!(
                    r#"<li class="{}"><span class="rank">{}</span> <span class="name">{}</span> <span class="detail">{} correct out of {}</span> <span class="accuracy">{:.0}%</span></li>"#,
                    if entry.is_podium(podium_size) { "podium" } else { "entry" },
                    entry.rank + 1,
                    html_escape::encode_text(&entry.display_name),
                    entry.correct_predictions,
                    entry.total_predictions,
                    entry.accuracy
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    };

    Ok(Html(format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="UTF-8" />
    <title>Leaderboard - {title}</title>
</head>
<body>
    <h1>{title}</h1>
    <ol class="leaderboard">
{rows}
    </ol>
</body>
</html>"#,
        title = html_escape::encode_text(&title),
        rows = rows
    )))
}

#[axum::debug_handler]
pub async fn dashboard_handler(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Json<DashboardTabs> {
    let now = state.now();
    let snapshot = state.snapshot.read().await;
    Json(tabs(for_user_with_players(
        &user_id,
        &snapshot.matches,
        &snapshot.players,
        &snapshot.predictions,
        now,
    )))
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/matches", get(matches_handler))
        .route("/leaderboard/{match_id}", get(leaderboard_handler))
        .route("/leaderboard/{match_id}/html", get(leaderboard_page_handler))
        .route("/dashboard/{user_id}", get(dashboard_handler))
        .with_state(state)
}

/// Serve until `shutdown_rx` fires.
pub async fn serve(state: AppState, shutdown_rx: oneshot::Receiver<()>) -> anyhow::Result<()> {
    let addr = state.config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Scoring API available at http://{}", addr);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async move {
            if shutdown_rx.await.is_err() {
                error!("Shutdown channel closed unexpectedly");
            }
        })
        .await?;

    info!("Scoring API stopped");
    Ok(())
}
