//! Combat unit endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use burnrate_core::actions::Action;
use burnrate_types::{RouteId, ShipmentId, UnitId, UnitKind};
use serde_json::json;
use uuid::Uuid;

use crate::auth::ApiKey;
use crate::error::ApiError;
use crate::handlers::resolve_player;
use crate::state::AppState;

/// `GET /units` -- the player's units.
pub async fn list(
    State(app): State<Arc<AppState>>,
    key: ApiKey,
) -> Result<Json<serde_json::Value>, ApiError> {
    let world = app.world.read().await;
    let player = resolve_player(&world, &key.0)?;
    let units: Vec<_> = world
        .units
        .values()
        .filter(|u| u.owner == player.id)
        .collect();
    Ok(Json(json!({ "units": units })))
}

/// Request body for `POST /units/build`.
#[derive(Debug, serde::Deserialize)]
pub struct BuildRequest {
    /// Escort or raider.
    pub kind: UnitKind,
}

/// `POST /units/build` -- build a unit at a Factory.
pub async fn build(
    State(app): State<Arc<AppState>>,
    key: ApiKey,
    Json(req): Json<BuildRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    Ok(Json(app.perform(&key.0, Action::BuildUnit { kind: req.kind }).await?))
}

/// Request body for `POST /units/{id}/escort`.
#[derive(Debug, serde::Deserialize)]
pub struct EscortRequest {
    /// The shipment to protect.
    pub shipment: ShipmentId,
}

/// `POST /units/{id}/escort`.
pub async fn escort(
    State(app): State<Arc<AppState>>,
    key: ApiKey,
    Path(id): Path<Uuid>,
    Json(req): Json<EscortRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    Ok(Json(
        app.perform(
            &key.0,
            Action::AssignEscort {
                unit: UnitId(id),
                shipment: req.shipment,
            },
        )
        .await?,
    ))
}

/// Request body for `POST /units/{id}/raider`.
#[derive(Debug, serde::Deserialize)]
pub struct RaiderRequest {
    /// The route to patrol.
    pub route: RouteId,
}

/// `POST /units/{id}/raider`.
pub async fn raider(
    State(app): State<Arc<AppState>>,
    key: ApiKey,
    Path(id): Path<Uuid>,
    Json(req): Json<RaiderRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    Ok(Json(
        app.perform(
            &key.0,
            Action::DeployRaider {
                unit: UnitId(id),
                route: req.route,
            },
        )
        .await?,
    ))
}

/// `POST /units/{id}/recall`.
pub async fn recall(
    State(app): State<Arc<AppState>>,
    key: ApiKey,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    Ok(Json(app.perform(&key.0, Action::RecallUnit { unit: UnitId(id) }).await?))
}

/// Request body for `POST /units/{id}/sell`.
#[derive(Debug, serde::Deserialize)]
pub struct SellRequest {
    /// Asking price in credits.
    pub price: i64,
}

/// `POST /units/{id}/sell` -- list the unit for sale.
pub async fn sell(
    State(app): State<Arc<AppState>>,
    key: ApiKey,
    Path(id): Path<Uuid>,
    Json(req): Json<SellRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    Ok(Json(
        app.perform(
            &key.0,
            Action::SellUnit {
                unit: UnitId(id),
                price: req.price,
            },
        )
        .await?,
    ))
}

/// `POST /hire/{unitId}` -- buy a listed unit.
pub async fn hire(
    State(app): State<Arc<AppState>>,
    key: ApiKey,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    Ok(Json(app.perform(&key.0, Action::HireUnit { unit: UnitId(id) }).await?))
}
