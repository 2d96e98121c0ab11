//! Contract endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use burnrate_core::actions::Action;
use burnrate_types::{ContractId, ContractParty, ContractStatus, ContractTerms};
use serde_json::json;
use uuid::Uuid;

use crate::auth::ApiKey;
use crate::error::ApiError;
use crate::handlers::resolve_player;
use crate::state::AppState;

/// `GET /contracts` -- all open contracts.
pub async fn list(
    State(app): State<Arc<AppState>>,
    key: ApiKey,
) -> Result<Json<serde_json::Value>, ApiError> {
    let world = app.world.read().await;
    let _ = resolve_player(&world, &key.0)?;
    let open: Vec<_> = world
        .contracts
        .values()
        .filter(|c| c.status == ContractStatus::Open)
        .collect();
    Ok(Json(json!({ "contracts": open })))
}

/// `GET /contracts/mine` -- posted or accepted by the player.
pub async fn mine(
    State(app): State<Arc<AppState>>,
    key: ApiKey,
) -> Result<Json<serde_json::Value>, ApiError> {
    let world = app.world.read().await;
    let player = resolve_player(&world, &key.0)?;
    let id = player.id;
    let related: Vec<_> = world
        .contracts
        .values()
        .filter(|c| {
            c.accepted_by == Some(id)
                || matches!(c.poster, ContractParty::Player(p) if p == id)
        })
        .collect();
    Ok(Json(json!({ "contracts": related })))
}

/// Request body for `POST /contracts`.
#[derive(Debug, serde::Deserialize)]
pub struct CreateContractRequest {
    /// Type-specific terms.
    pub terms: ContractTerms,
    /// Ticks until expiry.
    pub deadline_ticks: u64,
    /// Credit reward.
    pub reward_credits: i64,
    /// Reputation reward.
    #[serde(default)]
    pub reward_reputation: i64,
    /// Optional (ticks-from-now, credits) early bonus.
    #[serde(default)]
    pub early_bonus: Option<(u64, i64)>,
    /// Post with faction funds (Officer+).
    #[serde(default)]
    pub as_faction: bool,
}

/// `POST /contracts`.
pub async fn create(
    State(app): State<Arc<AppState>>,
    key: ApiKey,
    Json(req): Json<CreateContractRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    Ok(Json(
        app.perform(
            &key.0,
            Action::CreateContract {
                terms: req.terms,
                deadline_ticks: req.deadline_ticks,
                reward_credits: req.reward_credits,
                reward_reputation: req.reward_reputation,
                early_bonus: req.early_bonus,
                as_faction: req.as_faction,
            },
        )
        .await?,
    ))
}

/// `POST /contracts/{id}/accept`.
pub async fn accept(
    State(app): State<Arc<AppState>>,
    key: ApiKey,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    Ok(Json(
        app.perform(&key.0, Action::AcceptContract { contract: ContractId(id) }).await?,
    ))
}

/// `POST /contracts/{id}/complete`.
pub async fn complete(
    State(app): State<Arc<AppState>>,
    key: ApiKey,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    Ok(Json(
        app.perform(&key.0, Action::CompleteContract { contract: ContractId(id) }).await?,
    ))
}

/// `DELETE /contracts/{id}`.
pub async fn cancel(
    State(app): State<Arc<AppState>>,
    key: ApiKey,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    Ok(Json(
        app.perform(&key.0, Action::CancelContract { contract: ContractId(id) }).await?,
    ))
}
