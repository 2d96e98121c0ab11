//! Unauthenticated endpoints: health, world status, and join.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use serde_json::json;
use validator::Validate;

use crate::error::ApiError;
use crate::handlers::validate_dto;
use crate::state::AppState;

/// `GET /health` -- liveness probe.
pub async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

/// `GET /world/status` -- coarse world summary, no auth.
pub async fn world_status(State(app): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let world = app.world.read().await;
    let owned = world.graph.zones().filter(|z| z.is_owned()).count();
    Json(json!({
        "tick": world.clock.tick(),
        "season": world.clock.season(),
        "season_ends_in_ticks": world
            .clock
            .season_length_ticks()
            .saturating_sub(world.clock.season_elapsed()),
        "zones": world.graph.zone_count(),
        "zones_owned": owned,
        "players": world.players.len(),
        "factions": world.factions.len(),
    }))
}

/// Request body for `POST /join`.
#[derive(Debug, serde::Deserialize, Validate)]
pub struct JoinRequest {
    /// Desired display name.
    #[validate(length(min = 2, max = 20))]
    pub name: String,
}

/// `POST /join` -- create an account and mint its API key.
pub async fn join(
    State(app): State<Arc<AppState>>,
    Json(req): Json<JoinRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    validate_dto(&req)?;
    let body = app.perform_join(&req.name).await?;
    Ok(Json(body))
}
