//! HTTP API for the registry.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use watchout_protocols::{
    AddPlayerResponse, AverageResponse, BroadcastRequest, HeartRateReport, PeerInfo,
    RegisterRequest,
};

use crate::error::Result;
use crate::hub::BroadcastHub;
use crate::registry::Registry;

/// Everything the handlers share.
#[derive(Debug, Default)]
pub struct AppContext {
    pub registry: Registry,
    pub hub: BroadcastHub,
}

type AppState = Arc<AppContext>;

/// Build the API router.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        // Players
        .route("/players/add", post(add_player))
        .route("/players/get-all", get(list_players))
        // Heart rate
        .route("/players/heart-rate", post(add_heart_rate))
        .route("/players/heart-rate/average/last-n", get(average_last_n))
        .route("/players/heart-rate/average/between-time", get(average_between))
        // Administrator messages
        .route("/broadcast", post(broadcast))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn health() -> &'static str {
    "OK"
}

async fn add_player(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<Json<AddPlayerResponse>> {
    Ok(Json(state.registry.add_player(req)?))
}

async fn list_players(State(state): State<AppState>) -> Json<Vec<PeerInfo>> {
    Json(state.registry.players())
}

async fn add_heart_rate(State(state): State<AppState>, Json(report): Json<HeartRateReport>) {
    state.registry.add_heart_rate(report);
}

#[derive(Debug, Deserialize)]
struct LastNQuery {
    n: usize,
    player: u32,
}

async fn average_last_n(
    State(state): State<AppState>,
    Query(q): Query<LastNQuery>,
) -> Result<Json<AverageResponse>> {
    let average = state.registry.average_last_n(q.n, q.player)?;
    Ok(Json(AverageResponse { average }))
}

#[derive(Debug, Deserialize)]
struct BetweenQuery {
    t1: u64,
    t2: u64,
}

async fn average_between(
    State(state): State<AppState>,
    Query(q): Query<BetweenQuery>,
) -> Result<Json<AverageResponse>> {
    let average = state.registry.average_between(q.t1, q.t2)?;
    Ok(Json(AverageResponse { average }))
}

async fn broadcast(
    State(state): State<AppState>,
    Json(req): Json<BroadcastRequest>,
) -> Json<serde_json::Value> {
    let delivered = state.hub.publish(&req.message);
    Json(serde_json::json!({ "delivered": delivered }))
}
