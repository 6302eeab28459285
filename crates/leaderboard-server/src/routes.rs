//! HTTP surface of the leaderboard.
//!
//! ## Routes
//!
//! - `POST /submit`: store a score `{ username, score, difficulty }`
//! - `GET /leaderboard?difficulty=&limit=`: ranked scores
//! - `GET /leaderboards/all`: top five per known difficulty
//! - `GET /player/:username`: player statistics
//! - `DELETE /scores/clear`: drop every score
//! - `GET /health`: liveness and score count
//!
//! Unknown routes answer `404 { "error": "Not found" }`.

use std::sync::Arc;

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use chrono::{SecondsFormat, Utc};
use leaderboard_core::{
    DifficultySummary, LeaderboardEntry, PlayerStats, Submission, parse_limit,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::error::ApiError;
use crate::shutdown::ShutdownSignal;
use crate::state::SharedState;

#[derive(Debug, Serialize, Deserialize)]
pub struct SubmitResponse {
    pub status: String,
    pub message: String,
    pub id: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: String,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    /// Seconds since startup
    pub uptime: f64,
    pub total_scores: usize,
    pub timestamp: String,
}

/// `GET /leaderboard` query; both values are optional and loosely typed
#[derive(Debug, Default, PartialEq, Eq)]
pub struct LeaderboardQuery {
    pub difficulty: Option<String>,
    pub limit: Option<String>,
}

impl LeaderboardQuery {
    /// Build from raw query pairs; a repeated key keeps its first value
    pub fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        let mut query = Self::default();
        for (key, value) in pairs {
            let slot = match key.as_str() {
                "difficulty" => &mut query.difficulty,
                "limit" => &mut query.limit,
                _ => continue,
            };
            slot.get_or_insert(value);
        }
        query
    }
}

/// Build the application router
pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/submit", post(submit_handler))
        .route("/leaderboard", get(leaderboard_handler))
        .route("/leaderboards/all", get(all_leaderboards_handler))
        .route("/player/:username", get(player_handler))
        .route("/scores/clear", delete(clear_handler))
        .route("/health", get(health_handler))
        .fallback(not_found_handler)
        .with_state(state)
}

/// Serve until `shutdown` triggers, then write a final snapshot
pub async fn serve(
    listener: TcpListener,
    state: SharedState,
    shutdown: Arc<ShutdownSignal>,
) -> std::io::Result<()> {
    let app = router(Arc::clone(&state));
    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.wait().await })
        .await?;

    state.flush();
    Ok(())
}

/// `POST /submit`
async fn submit_handler(
    State(state): State<SharedState>,
    body: Result<Json<Submission>, JsonRejection>,
) -> Result<Json<SubmitResponse>, ApiError> {
    let Json(submission) = body?;
    let record = state.store().insert(&submission)?;

    Ok(Json(SubmitResponse {
        status: "success".to_string(),
        message: "Score submitted successfully".to_string(),
        id: record.id,
    }))
}

/// `GET /leaderboard`
///
/// Query parameters never fail the request; anything unusable falls back to
/// the defaults.
async fn leaderboard_handler(
    State(state): State<SharedState>,
    pairs: Result<Query<Vec<(String, String)>>, QueryRejection>,
) -> Json<Vec<LeaderboardEntry>> {
    let query = match pairs {
        Ok(Query(pairs)) => LeaderboardQuery::from_pairs(pairs),
        Err(e) => {
            warn!("Ignoring unreadable leaderboard query: {}", e);
            LeaderboardQuery::default()
        }
    };

    let limit = parse_limit(query.limit.as_deref());
    Json(state.store().ranked(query.difficulty.as_deref(), limit))
}

/// `GET /leaderboards/all`
async fn all_leaderboards_handler(State(state): State<SharedState>) -> Json<DifficultySummary> {
    Json(state.store().summary())
}

/// `GET /player/:username`
async fn player_handler(
    State(state): State<SharedState>,
    Path(username): Path<String>,
) -> Result<Json<PlayerStats>, ApiError> {
    let stats = state.store().player_stats(&username)?;
    Ok(Json(stats))
}

/// `DELETE /scores/clear`
async fn clear_handler(State(state): State<SharedState>) -> Json<StatusResponse> {
    state.store().clear();
    info!("All scores cleared");

    Json(StatusResponse {
        status: "success".to_string(),
        message: "All scores cleared".to_string(),
    })
}

/// `GET /health`
async fn health_handler(State(state): State<SharedState>) -> Json<HealthResponse> {
    let total_scores = state.store().len();

    Json(HealthResponse {
        status: "healthy".to_string(),
        uptime: state.uptime(),
        total_scores,
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
    })
}

async fn not_found_handler() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, Json(json!({ "error": "Not found" })))
}
