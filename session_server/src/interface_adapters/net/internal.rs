use crate::interface_adapters::protocol::ServerMessage;
use crate::interface_adapters::state::AppState;

use axum::{
    extract::{Json, State},
    response::IntoResponse,
};
use std::sync::Arc;

#[derive(Debug, serde::Serialize)]
pub struct StatusResponse {
    pub status: &'static str,
    // Players currently in the world.
    pub players: usize,
    // Open connections, joined or not.
    pub connections: usize,
}

/// HTTP polling fallback: the same `world_state` payload a joining client receives.
pub async fn world_state_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let snapshot = state.world.snapshot().await;
    Json(ServerMessage::world_state(&snapshot))
}

pub async fn status_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(StatusResponse {
        status: "online",
        players: state.world.player_count().await,
        connections: state.hub.connection_count().await,
    })
}
