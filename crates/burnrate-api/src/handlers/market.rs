//! Market endpoints: order placement (plain, conditional, TWAP), book
//! reads, and the units-for-sale listing.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use burnrate_core::actions::Action;
use burnrate_types::{OrderId, OrderSide, PriceTrigger, Resource};
use serde_json::json;
use uuid::Uuid;

use crate::auth::ApiKey;
use crate::error::ApiError;
use crate::handlers::resolve_player;
use crate::state::AppState;

/// Request body for `POST /market/order`.
#[derive(Debug, serde::Deserialize)]
pub struct OrderRequest {
    /// Traded resource.
    pub resource: Resource,
    /// Buy or sell.
    pub side: OrderSide,
    /// Limit price.
    pub price: i64,
    /// Quantity.
    pub quantity: u32,
}

/// `POST /market/order`.
pub async fn place_order(
    State(app): State<Arc<AppState>>,
    key: ApiKey,
    Json(req): Json<OrderRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    Ok(Json(
        app.perform(
            &key.0,
            Action::PlaceOrder {
                resource: req.resource,
                side: req.side,
                price: req.price,
                quantity: req.quantity,
            },
        )
        .await?,
    ))
}

/// Request body for `POST /market/conditional`.
#[derive(Debug, serde::Deserialize)]
pub struct ConditionalRequest {
    /// Traded resource.
    pub resource: Resource,
    /// Buy or sell.
    pub side: OrderSide,
    /// Limit price once armed.
    pub price: i64,
    /// Quantity.
    pub quantity: u32,
    /// Arming predicate.
    pub trigger: PriceTrigger,
}

/// `POST /market/conditional` (Operator+).
pub async fn place_conditional(
    State(app): State<Arc<AppState>>,
    key: ApiKey,
    Json(req): Json<ConditionalRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    Ok(Json(
        app.perform(
            &key.0,
            Action::PlaceConditional {
                resource: req.resource,
                side: req.side,
                price: req.price,
                quantity: req.quantity,
                trigger: req.trigger,
            },
        )
        .await?,
    ))
}

/// Request body for `POST /market/time-weighted`.
#[derive(Debug, serde::Deserialize)]
pub struct TwapRequest {
    /// Traded resource.
    pub resource: Resource,
    /// Buy or sell.
    pub side: OrderSide,
    /// Limit price for every slice.
    pub price: i64,
    /// Total quantity.
    pub total: u32,
    /// Per-tick slice.
    pub slice: u32,
}

/// `POST /market/time-weighted` (Operator+).
pub async fn place_twap(
    State(app): State<Arc<AppState>>,
    key: ApiKey,
    Json(req): Json<TwapRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    Ok(Json(
        app.perform(
            &key.0,
            Action::PlaceTwap {
                resource: req.resource,
                side: req.side,
                price: req.price,
                total: req.total,
                slice: req.slice,
            },
        )
        .await?,
    ))
}

/// Query parameters for `GET /market/orders`.
#[derive(Debug, serde::Deserialize)]
pub struct OrdersQuery {
    /// Restrict to one resource.
    pub resource: Option<Resource>,
}

/// `GET /market/orders[?resource=…]` -- the book at the player's zone.
pub async fn orders(
    State(app): State<Arc<AppState>>,
    key: ApiKey,
    Query(query): Query<OrdersQuery>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let world = app.world.read().await;
    let player = resolve_player(&world, &key.0)?;
    let zone = player.zone;
    let orders = world.market.orders_at_zone(zone, query.resource);
    let last = query
        .resource
        .and_then(|r| world.market.last_trade_price(zone, r));
    Ok(Json(json!({ "zone": zone, "orders": orders, "last_trade_price": last })))
}

/// `DELETE /market/orders/{id}` -- cancel an order of any variant.
pub async fn cancel_order(
    State(app): State<Arc<AppState>>,
    key: ApiKey,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    Ok(Json(
        app.perform(&key.0, Action::CancelOrder { order: OrderId(id) }).await?,
    ))
}

/// `GET /market/units` -- every unit currently listed for sale.
pub async fn units_for_sale(
    State(app): State<Arc<AppState>>,
    key: ApiKey,
) -> Result<Json<serde_json::Value>, ApiError> {
    let world = app.world.read().await;
    let _ = resolve_player(&world, &key.0)?;
    let listed: Vec<_> = world
        .units
        .values()
        .filter(|u| u.for_sale_price.is_some())
        .collect();
    Ok(Json(json!({ "units": listed })))
}
