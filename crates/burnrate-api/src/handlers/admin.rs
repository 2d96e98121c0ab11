//! Admin endpoints, gated by the configured admin key.
//!
//! `POST /admin/tick` bypasses the idempotent claim: it forces the claim
//! stamp and runs a tick immediately. `POST /admin/init-world` generates
//! a fresh world; it refuses when players already exist.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use burnrate_core::tick::run_tick;
use burnrate_core::{ActionError, WorldClock, WorldState};
use burnrate_db::{TickPersist, WorldStore};
use burnrate_world::generate_world;
use serde_json::json;

use crate::auth::AdminKey;
use crate::error::ApiError;
use crate::state::AppState;

/// Check the presented admin key.
fn require_admin(app: &AppState, key: &AdminKey) -> Result<(), ApiError> {
    if app.is_admin(key.0.as_deref()) {
        Ok(())
    } else {
        Err(ApiError::AdminDenied)
    }
}

/// `POST /admin/tick` -- force one tick immediately.
pub async fn force_tick(
    State(app): State<Arc<AppState>>,
    key: AdminKey,
) -> Result<Json<serde_json::Value>, ApiError> {
    require_admin(&app, &key)?;

    let mut world = app.world.write().await;
    if let Some(pool) = &app.store {
        TickPersist::new(pool.pool()).force_claim().await?;
    }
    let report = run_tick(&mut world)
        .map_err(|e| ApiError::Action(ActionError::Internal(e.to_string())))?;
    if let Some(pool) = &app.store {
        let events = std::mem::take(&mut world.outbox);
        let result = TickPersist::new(pool.pool()).commit_tick(&world, &events).await;
        world.outbox = events;
        result?;
    }
    Ok(Json(serde_json::to_value(&report).unwrap_or_default()))
}

/// Request body for `POST /admin/init-world`.
#[derive(Debug, serde::Deserialize)]
pub struct InitWorldRequest {
    /// Generation seed (default 0).
    #[serde(default)]
    pub seed: u64,
}

/// `POST /admin/init-world` -- generate and persist a fresh world.
pub async fn init_world(
    State(app): State<Arc<AppState>>,
    key: AdminKey,
    Json(req): Json<InitWorldRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    require_admin(&app, &key)?;

    let mut world = app.world.write().await;
    if !world.players.is_empty() {
        return Err(ApiError::BadRequest(
            "world already has players; refusing to regenerate".to_owned(),
        ));
    }

    let graph = generate_world(req.seed)
        .map_err(|e| ApiError::Action(ActionError::Internal(e.to_string())))?;
    let clock = WorldClock::new(
        world.clock.season_length_ticks(),
        world.clock.ticks_per_day(),
    )
    .map_err(|e| ApiError::Action(ActionError::Internal(e.to_string())))?;
    *world = WorldState::new(graph, clock);

    if let Some(pool) = &app.store {
        WorldStore::new(pool.pool()).save_world(&world).await?;
    }

    Ok(Json(json!({
        "zones": world.graph.zone_count(),
        "routes": world.graph.route_count(),
        "seed": req.seed,
    })))
}

/// `GET /admin/dashboard` -- operational counters.
pub async fn dashboard(
    State(app): State<Arc<AppState>>,
    key: AdminKey,
) -> Result<Json<serde_json::Value>, ApiError> {
    require_admin(&app, &key)?;
    let world = app.world.read().await;

    let in_transit = world.in_transit_shipments().len();
    let open_contracts = world
        .contracts
        .values()
        .filter(|c| c.status == burnrate_types::ContractStatus::Open)
        .count();
    Ok(Json(json!({
        "tick": world.clock.tick(),
        "season": world.clock.season(),
        "players": world.players.len(),
        "factions": world.factions.len(),
        "shipments_in_transit": in_transit,
        "units": world.units.len(),
        "open_contracts": open_contracts,
        "intel_reports": world.intel.len(),
        "webhooks": world.webhooks.len(),
        "events_buffered": world.event_log.len(),
        "outbox_depth": world.outbox.len(),
        "persistence": world_persistence(&app),
    })))
}

/// Whether the server runs with a database behind it.
fn world_persistence(app: &AppState) -> &'static str {
    if app.store.is_some() { "postgresql" } else { "in-memory" }
}
