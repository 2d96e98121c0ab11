//! Webhook management endpoints (Operator+).

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use burnrate_core::actions::Action;
use burnrate_types::{EventType, WebhookId};
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use crate::auth::ApiKey;
use crate::error::ApiError;
use crate::handlers::{resolve_player, validate_dto};
use crate::state::AppState;

/// `GET /webhooks` -- the player's registrations (secrets omitted).
pub async fn list(
    State(app): State<Arc<AppState>>,
    key: ApiKey,
) -> Result<Json<serde_json::Value>, ApiError> {
    let world = app.world.read().await;
    let player = resolve_player(&world, &key.0)?;
    let hooks: Vec<_> = world
        .webhooks
        .values()
        .filter(|w| w.owner == player.id)
        .map(|w| {
            json!({
                "id": w.id,
                "url": w.url,
                "filter": w.filter,
                "consecutive_failures": w.consecutive_failures,
                "disabled": w.disabled,
            })
        })
        .collect();
    Ok(Json(json!({ "webhooks": hooks })))
}

/// Request body for `POST /webhooks`.
#[derive(Debug, serde::Deserialize, Validate)]
pub struct RegisterRequest {
    /// Delivery URL. Scheme is enforced by the action handler.
    #[validate(length(min = 8, max = 2000))]
    pub url: String,
    /// Event types to deliver; empty means all.
    #[serde(default)]
    pub filter: Vec<EventType>,
}

/// `POST /webhooks` -- register; the response carries the signing secret
/// exactly once.
pub async fn register(
    State(app): State<Arc<AppState>>,
    key: ApiKey,
    Json(req): Json<RegisterRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    validate_dto(&req)?;
    Ok(Json(
        app.perform(
            &key.0,
            Action::RegisterWebhook {
                url: req.url,
                filter: req.filter,
            },
        )
        .await?,
    ))
}

/// `DELETE /webhooks/{id}`.
pub async fn delete(
    State(app): State<Arc<AppState>>,
    key: ApiKey,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    Ok(Json(
        app.perform(&key.0, Action::DeleteWebhook { id: WebhookId(id) }).await?,
    ))
}
