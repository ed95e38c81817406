use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::debug;

use crate::cache::FallbackCache;
use crate::config::MAX_HISTORY_LIMIT;
use crate::error::ProviderError;
use crate::faceit::models::{PlayerStats, GAME_ID};
use crate::faceit::FaceitClient;
use crate::matches::synthetic::is_synthetic;
use crate::matches::{FilteredMatchResult, MatchReconciler};
use crate::roster::RosterResolver;

const LIVE_KEY: &str = "matches:live";

#[derive(Clone)]
pub struct AppState {
    pub roster: RosterResolver,
    pub reconciler: MatchReconciler,
    pub cache: FallbackCache,
    /// Used for single-entity lookups; errors with `NotConfigured` without a key
    pub faceit: FaceitClient,
}

/// Build the Axum router for the read API.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/api/teams", get(teams_handler))
        .route("/api/teams/lookup", get(team_lookup_handler))
        .route("/api/teams/faceit/:player_id", get(team_by_faceit_handler))
        .route("/api/matches/live", get(live_handler))
        .route("/api/matches/history", get(history_handler))
        .route("/api/players/:nickname", get(player_handler))
        .route("/api/faceit/players/:player_id/stats", get(player_stats_handler))
        .route("/api/faceit/players/:player_id/history", get(player_history_handler))
        .route("/api/faceit/players/:player_id/live", get(player_live_handler))
        .route("/api/faceit/matches/:match_id", get(match_details_handler))
        .route("/api/faceit/matches/:match_id/stats", get(match_stats_handler))
        .layer(CorsLayer::permissive())
        .with_state(Arc::new(state))
}

#[derive(Debug, Serialize)]
struct MatchesResponse {
    /// True when any entry is a placeholder rather than provider data
    synthetic: bool,
    matches: Vec<FilteredMatchResult>,
}

impl From<Vec<FilteredMatchResult>> for MatchesResponse {
    fn from(matches: Vec<FilteredMatchResult>) -> Self {
        MatchesResponse {
            synthetic: matches.iter().any(|m| is_synthetic(&m.match_data)),
            matches,
        }
    }
}

#[derive(Debug, Deserialize)]
struct HistoryQuery {
    limit: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct TeamLookupQuery {
    #[serde(default)]
    name: String,
    /// Comma-separated FACEIT player ids
    #[serde(default)]
    player_ids: String,
}

impl TeamLookupQuery {
    fn player_ids(&self) -> Vec<String> {
        self.player_ids
            .split(',')
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(str::to_string)
            .collect()
    }
}

/// GET /health
async fn health_handler() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

/// GET /api/teams
async fn teams_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.roster.get_registered_teams())
}

/// GET /api/teams/lookup?name=Ronin%20PT&player_ids=a,b
async fn team_lookup_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<TeamLookupQuery>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    state
        .roster
        .is_team_or_player_registered(&query.name, &query.player_ids())
        .map(Json)
        .ok_or((StatusCode::NOT_FOUND, "no matching registered team".to_string()))
}

/// GET /api/teams/faceit/:player_id
async fn team_by_faceit_handler(
    State(state): State<Arc<AppState>>,
    Path(player_id): Path<String>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    state
        .roster
        .get_registered_team_by_faceit_id(&player_id)
        .map(Json)
        .ok_or((StatusCode::NOT_FOUND, format!("no team for player {}", player_id)))
}

/// GET /api/matches/live
async fn live_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    if let Some(cached) = state.cache.get_json::<Vec<FilteredMatchResult>>(LIVE_KEY).await {
        debug!("Serving live matches from cache");
        return Json(MatchesResponse::from(cached));
    }
    let matches = state.reconciler.filtered_live_matches().await;
    state
        .cache
        .set_json(LIVE_KEY, &matches, state.cache.default_ttl())
        .await;
    Json(MatchesResponse::from(matches))
}

/// GET /api/matches/history?limit=10
async fn history_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<HistoryQuery>,
) -> impl IntoResponse {
    let limit = query.limit.map(|l| l.clamp(1, MAX_HISTORY_LIMIT));
    let key = match limit {
        Some(l) => format!("matches:history:{}", l),
        None => "matches:history:default".to_string(),
    };
    if let Some(cached) = state.cache.get_json::<Vec<FilteredMatchResult>>(&key).await {
        debug!("Serving match history from cache ({})", key);
        return Json(MatchesResponse::from(cached));
    }
    let matches = state.reconciler.filtered_match_history(limit).await;
    state
        .cache
        .set_json(&key, &matches, state.cache.default_ttl())
        .await;
    Json(MatchesResponse::from(matches))
}

/// GET /api/players/:nickname
async fn player_handler(
    State(state): State<Arc<AppState>>,
    Path(nickname): Path<String>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    match state.faceit.get_player_by_nickname(&nickname).await {
        Ok(Some(profile)) => Ok(Json(profile)),
        Ok(None) => Err((StatusCode::NOT_FOUND, format!("player {} not found", nickname))),
        Err(e) => Err((provider_status(&e), e.to_string())),
    }
}

/// GET /api/faceit/players/:player_id/stats
async fn player_stats_handler(
    State(state): State<Arc<AppState>>,
    Path(player_id): Path<String>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let key = format!("player-stats:{}", player_id);
    if let Some(cached) = state.cache.get_json::<PlayerStats>(&key).await {
        return Ok(Json(cached));
    }
    match state.faceit.get_player_stats(&player_id, GAME_ID).await {
        Ok(Some(stats)) => {
            state.cache.set_json(&key, &stats, state.cache.default_ttl()).await;
            Ok(Json(stats))
        }
        Ok(None) => Err((StatusCode::NOT_FOUND, format!("no stats for {}", player_id))),
        Err(e) => Err((provider_status(&e), e.to_string())),
    }
}

/// GET /api/faceit/players/:player_id/history?limit=10 (null when unavailable)
async fn player_history_handler(
    State(state): State<Arc<AppState>>,
    Path(player_id): Path<String>,
    Query(query): Query<HistoryQuery>,
) -> impl IntoResponse {
    let limit = query.limit.unwrap_or(10).clamp(1, MAX_HISTORY_LIMIT);
    Json(state.faceit.get_player_match_history(&player_id, limit, 0).await)
}

/// GET /api/faceit/players/:player_id/live
async fn player_live_handler(
    State(state): State<Arc<AppState>>,
    Path(player_id): Path<String>,
) -> impl IntoResponse {
    Json(state.faceit.get_player_live_matches(&player_id).await)
}

/// GET /api/faceit/matches/:match_id (null when unavailable)
async fn match_details_handler(
    State(state): State<Arc<AppState>>,
    Path(match_id): Path<String>,
) -> impl IntoResponse {
    Json(state.faceit.get_match_details(&match_id).await)
}

/// GET /api/faceit/matches/:match_id/stats (null when unavailable)
async fn match_stats_handler(
    State(state): State<Arc<AppState>>,
    Path(match_id): Path<String>,
) -> impl IntoResponse {
    Json(state.faceit.get_match_stats(&match_id).await)
}

fn provider_status(e: &ProviderError) -> StatusCode {
    match e {
        ProviderError::NotConfigured => StatusCode::SERVICE_UNAVAILABLE,
        ProviderError::Timeout => StatusCode::GATEWAY_TIMEOUT,
        _ => StatusCode::BAD_GATEWAY,
    }
}
