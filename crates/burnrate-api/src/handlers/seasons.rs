//! Season and leaderboard endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Query, State};
use serde_json::json;

use crate::auth::ApiKey;
use crate::error::ApiError;
use crate::handlers::resolve_player;
use crate::state::AppState;

/// `GET /season` -- current season status.
pub async fn season(State(app): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let world = app.world.read().await;
    Json(json!({
        "season": world.clock.season(),
        "started_tick": world.clock.season_start_tick(),
        "length_ticks": world.clock.season_length_ticks(),
        "elapsed_ticks": world.clock.season_elapsed(),
        "ends_in_ticks": world
            .clock
            .season_length_ticks()
            .saturating_sub(world.clock.season_elapsed()),
    }))
}

/// Query parameters for `GET /leaderboard`.
#[derive(Debug, serde::Deserialize)]
pub struct LeaderboardQuery {
    /// Season to rank (defaults to the current one).
    pub season: Option<u32>,
    /// Entries to return (default 20).
    pub limit: Option<usize>,
}

/// `GET /leaderboard` -- ranked score rows.
pub async fn leaderboard(
    State(app): State<Arc<AppState>>,
    Query(query): Query<LeaderboardQuery>,
) -> Json<serde_json::Value> {
    let world = app.world.read().await;
    let season = query.season.unwrap_or_else(|| world.clock.season());
    let limit = query.limit.unwrap_or(20).min(100);

    let rows: Vec<_> = world
        .scores
        .leaderboard(season, limit)
        .into_iter()
        .map(|row| {
            json!({
                "entity": row.entity,
                "entity_kind": row.entity_kind,
                "categories": row.categories,
                "total": row.total(),
            })
        })
        .collect();
    Json(json!({ "season": season, "leaderboard": rows }))
}

/// `GET /season/me` -- the player's own score row.
pub async fn season_me(
    State(app): State<Arc<AppState>>,
    key: ApiKey,
) -> Result<Json<serde_json::Value>, ApiError> {
    let world = app.world.read().await;
    let player = resolve_player(&world, &key.0)?;
    let season = world.clock.season();
    let row = world.scores.get(season, player.id.into_inner());
    Ok(Json(json!({
        "season": season,
        "categories": row.map(|r| r.categories.clone()).unwrap_or_default(),
        "total": row.map_or(0, burnrate_types::SeasonScore::total),
    })))
}
