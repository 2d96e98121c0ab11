//! Player endpoints: identity, world reads, logistics actions, intel,
//! progression, and batch.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use burnrate_core::actions::Action;
use burnrate_core::{intel, season};
use burnrate_types::{
    EventType, IntelTarget, IntelTargetKind, LicenseKind, Resource, RouteId, ShipmentKind,
    UnitId, ZoneId,
};
use rust_decimal::Decimal;
use serde_json::json;
use uuid::Uuid;

use crate::auth::ApiKey;
use crate::error::ApiError;
use crate::handlers::resolve_player;
use crate::state::AppState;

/// Maximum actions per `POST /batch`.
const BATCH_LIMIT: usize = 10;

// ---------------------------------------------------------------------------
// Identity and progression
// ---------------------------------------------------------------------------

/// `GET /me` -- the acting player's own record.
pub async fn me(
    State(app): State<Arc<AppState>>,
    key: ApiKey,
) -> Result<Json<serde_json::Value>, ApiError> {
    let world = app.world.read().await;
    let player = resolve_player(&world, &key.0)?;
    Ok(Json(json!({
        "id": player.id,
        "name": player.name,
        "tier": player.tier,
        "zone": player.zone,
        "faction": player.faction,
        "reputation": player.reputation,
        "inventory": player.inventory,
        "licenses": { "courier": true, "freight": player.licenses.freight, "convoy": player.licenses.convoy },
        "actions_today": player.actions_today,
        "tutorial_step": player.tutorial_step,
    })))
}

/// `GET /me/export` -- a full dump of everything the player owns.
pub async fn export(
    State(app): State<Arc<AppState>>,
    key: ApiKey,
) -> Result<Json<serde_json::Value>, ApiError> {
    let world = app.world.read().await;
    let player = resolve_player(&world, &key.0)?;
    let id = player.id;
    let tick = world.clock.tick();

    let shipments: Vec<_> = world.shipments_of_player(id);
    let units: Vec<_> = world.units.values().filter(|u| u.owner == id).collect();
    let orders = world.market.orders_of_player(id);
    let contracts: Vec<_> = world
        .contracts
        .values()
        .filter(|c| {
            c.accepted_by == Some(id)
                || matches!(c.poster, burnrate_types::ContractParty::Player(p) if p == id)
        })
        .collect();
    let intel_reports: Vec<_> = world
        .intel_visible_to(id)
        .into_iter()
        .map(|r| intel::project(r, tick))
        .collect();

    Ok(Json(json!({
        "player": player,
        "shipments": shipments,
        "units": units,
        "orders": orders,
        "contracts": contracts,
        "intel": intel_reports,
    })))
}

/// `GET /reputation`.
pub async fn reputation(
    State(app): State<Arc<AppState>>,
    key: ApiKey,
) -> Result<Json<serde_json::Value>, ApiError> {
    let world = app.world.read().await;
    let player = resolve_player(&world, &key.0)?;
    Ok(Json(json!({ "reputation": player.reputation })))
}

/// `GET /licenses`.
pub async fn licenses(
    State(app): State<Arc<AppState>>,
    key: ApiKey,
) -> Result<Json<serde_json::Value>, ApiError> {
    let world = app.world.read().await;
    let player = resolve_player(&world, &key.0)?;
    Ok(Json(json!({
        "courier": true,
        "freight": player.licenses.freight,
        "convoy": player.licenses.convoy,
    })))
}

/// `POST /licenses/{kind}/unlock`.
pub async fn unlock_license(
    State(app): State<Arc<AppState>>,
    key: ApiKey,
    Path(kind): Path<LicenseKind>,
) -> Result<Json<serde_json::Value>, ApiError> {
    Ok(Json(app.perform(&key.0, Action::UnlockLicense { kind }).await?))
}

/// `POST /tutorial/advance`.
pub async fn advance_tutorial(
    State(app): State<Arc<AppState>>,
    key: ApiKey,
) -> Result<Json<serde_json::Value>, ApiError> {
    Ok(Json(app.perform(&key.0, Action::AdvanceTutorial).await?))
}

/// Query parameters for `GET /events`.
#[derive(Debug, serde::Deserialize)]
pub struct EventsQuery {
    /// Filter by tick.
    pub tick: Option<u64>,
    /// Filter by event type.
    pub event_type: Option<EventType>,
    /// Maximum events returned (default 100).
    pub limit: Option<usize>,
}

/// `GET /events` -- recent events from the in-memory log.
pub async fn events(
    State(app): State<Arc<AppState>>,
    key: ApiKey,
    Query(query): Query<EventsQuery>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let world = app.world.read().await;
    let _ = resolve_player(&world, &key.0)?;
    let limit = query.limit.unwrap_or(100).min(500);

    let selected: Vec<_> = world
        .event_log
        .iter()
        .rev()
        .filter(|e| query.tick.is_none_or(|t| e.tick == t))
        .filter(|e| query.event_type.is_none_or(|t| e.event_type == t))
        .take(limit)
        .collect();
    Ok(Json(json!({ "events": selected })))
}

// ---------------------------------------------------------------------------
// World reads
// ---------------------------------------------------------------------------

/// `GET /world/zones` -- all zones.
pub async fn zones(
    State(app): State<Arc<AppState>>,
    key: ApiKey,
) -> Result<Json<serde_json::Value>, ApiError> {
    let world = app.world.read().await;
    let _ = resolve_player(&world, &key.0)?;
    let zones: Vec<_> = world.graph.zones().collect();
    Ok(Json(json!({ "zones": zones })))
}

/// `GET /world/zones/{id}` -- one zone.
pub async fn zone(
    State(app): State<Arc<AppState>>,
    key: ApiKey,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let world = app.world.read().await;
    let _ = resolve_player(&world, &key.0)?;
    let zone = world
        .graph
        .zone(ZoneId(id))
        .ok_or_else(|| ApiError::NotFound("zone".to_owned()))?;
    Ok(Json(serde_json::to_value(zone).unwrap_or_default()))
}

/// Query parameters for `GET /routes`.
#[derive(Debug, serde::Deserialize)]
pub struct RoutesQuery {
    /// Restrict to routes departing this zone.
    pub from: Option<Uuid>,
}

/// `GET /routes[?from=…]` -- routes, optionally limited to one origin.
pub async fn routes(
    State(app): State<Arc<AppState>>,
    key: ApiKey,
    Query(query): Query<RoutesQuery>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let world = app.world.read().await;
    let _ = resolve_player(&world, &key.0)?;
    let routes: Vec<_> = match query.from {
        Some(from) => world.graph.routes_from(ZoneId(from)),
        None => world.graph.routes().collect(),
    };
    Ok(Json(json!({ "routes": routes })))
}

/// `GET /zone/{id}/efficiency` -- supply, streak, and income projection.
pub async fn zone_efficiency(
    State(app): State<Arc<AppState>>,
    key: ApiKey,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let world = app.world.read().await;
    let _ = resolve_player(&world, &key.0)?;
    let zone = world
        .graph
        .zone(ZoneId(id))
        .ok_or_else(|| ApiError::NotFound("zone".to_owned()))?;

    let multiplier = season::streak_multiplier(zone.compliance_streak);
    Ok(Json(json!({
        "zone": zone.id,
        "supply_level": zone.supply_level,
        "compliance_streak": zone.compliance_streak,
        "streak_multiplier": multiplier,
        "burn_rate": zone.kind.burn_rate(),
        "su_stockpile": zone.su_stockpile,
        "income_per_tick": zone.kind.income(),
        "control_points_per_tick": if zone.is_owned() { multiplier } else { Decimal::ZERO },
    })))
}

// ---------------------------------------------------------------------------
// Logistics actions
// ---------------------------------------------------------------------------

/// Request body for `POST /travel`.
#[derive(Debug, serde::Deserialize)]
pub struct TravelRequest {
    /// Destination zone.
    pub to: ZoneId,
}

/// `POST /travel`.
pub async fn travel(
    State(app): State<Arc<AppState>>,
    key: ApiKey,
    Json(req): Json<TravelRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    Ok(Json(app.perform(&key.0, Action::Travel { to: req.to }).await?))
}

/// Request body for `POST /extract`.
#[derive(Debug, serde::Deserialize)]
pub struct ExtractRequest {
    /// Units to extract.
    pub quantity: u32,
}

/// `POST /extract`.
pub async fn extract(
    State(app): State<Arc<AppState>>,
    key: ApiKey,
    Json(req): Json<ExtractRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    Ok(Json(
        app.perform(&key.0, Action::Extract { quantity: req.quantity }).await?,
    ))
}

/// Request body for `POST /produce`.
#[derive(Debug, serde::Deserialize)]
pub struct ProduceRequest {
    /// Manufactured output.
    pub output: Resource,
    /// Batches to produce.
    pub quantity: u32,
}

/// `POST /produce`.
pub async fn produce(
    State(app): State<Arc<AppState>>,
    key: ApiKey,
    Json(req): Json<ProduceRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    Ok(Json(
        app.perform(
            &key.0,
            Action::Produce {
                output: req.output,
                quantity: req.quantity,
            },
        )
        .await?,
    ))
}

/// Request body for `POST /ship`.
#[derive(Debug, serde::Deserialize)]
pub struct ShipRequest {
    /// Shipment class.
    pub kind: ShipmentKind,
    /// Ordered path starting at the current zone.
    pub path: Vec<ZoneId>,
    /// Cargo manifest.
    pub cargo: BTreeMap<Resource, u32>,
    /// Escorts to attach at launch.
    #[serde(default)]
    pub escorts: Vec<UnitId>,
}

/// `POST /ship`.
pub async fn ship(
    State(app): State<Arc<AppState>>,
    key: ApiKey,
    Json(req): Json<ShipRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    Ok(Json(
        app.perform(
            &key.0,
            Action::Ship {
                kind: req.kind,
                path: req.path,
                cargo: req.cargo,
                escorts: req.escorts,
            },
        )
        .await?,
    ))
}

/// `GET /shipments` -- the player's shipments, newest first.
pub async fn shipments(
    State(app): State<Arc<AppState>>,
    key: ApiKey,
) -> Result<Json<serde_json::Value>, ApiError> {
    let world = app.world.read().await;
    let player = resolve_player(&world, &key.0)?;
    let shipments = world.shipments_of_player(player.id);
    Ok(Json(json!({ "shipments": shipments })))
}

/// Request body for `POST /supply`.
#[derive(Debug, serde::Deserialize)]
pub struct SupplyRequest {
    /// Supply units to assemble.
    pub amount: u32,
}

/// `POST /supply`.
pub async fn supply(
    State(app): State<Arc<AppState>>,
    key: ApiKey,
    Json(req): Json<SupplyRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    Ok(Json(app.perform(&key.0, Action::Supply { amount: req.amount }).await?))
}

/// `POST /capture`.
pub async fn capture(
    State(app): State<Arc<AppState>>,
    key: ApiKey,
) -> Result<Json<serde_json::Value>, ApiError> {
    Ok(Json(app.perform(&key.0, Action::Capture).await?))
}

/// Request body for `POST /stockpile`.
#[derive(Debug, serde::Deserialize)]
pub struct StockpileRequest {
    /// `medkits` or `comms`.
    pub resource: Resource,
    /// Units to deposit.
    pub quantity: u32,
}

/// `POST /stockpile`.
pub async fn stockpile(
    State(app): State<Arc<AppState>>,
    key: ApiKey,
    Json(req): Json<StockpileRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    Ok(Json(
        app.perform(
            &key.0,
            Action::Stockpile {
                resource: req.resource,
                quantity: req.quantity,
            },
        )
        .await?,
    ))
}

// ---------------------------------------------------------------------------
// Intel
// ---------------------------------------------------------------------------

/// Request body for `POST /scan`.
#[derive(Debug, serde::Deserialize)]
pub struct ScanRequest {
    /// The target to observe.
    pub target: IntelTarget,
}

/// `POST /scan`.
pub async fn scan(
    State(app): State<Arc<AppState>>,
    key: ApiKey,
    Json(req): Json<ScanRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    Ok(Json(app.perform(&key.0, Action::Scan { target: req.target }).await?))
}

/// Query parameters for `GET /intel`.
#[derive(Debug, serde::Deserialize)]
pub struct IntelQuery {
    /// Maximum reports returned (default 50).
    pub limit: Option<usize>,
}

/// `GET /intel[?limit=…]` -- visible reports projected to now.
pub async fn intel_list(
    State(app): State<Arc<AppState>>,
    key: ApiKey,
    Query(query): Query<IntelQuery>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let world = app.world.read().await;
    let player = resolve_player(&world, &key.0)?;
    let tick = world.clock.tick();
    let limit = query.limit.unwrap_or(50).min(200);

    let mut reports = world.intel_visible_to(player.id);
    reports.sort_by_key(|r| std::cmp::Reverse(r.gathered_tick));
    let projected: Vec<_> = reports
        .into_iter()
        .take(limit)
        .map(|r| intel::project(r, tick))
        .collect();
    Ok(Json(json!({ "intel": projected })))
}

/// `GET /intel/{kind}/{id}` -- the freshest visible report on a target.
pub async fn intel_target(
    State(app): State<Arc<AppState>>,
    key: ApiKey,
    Path((kind, id)): Path<(IntelTargetKind, Uuid)>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let world = app.world.read().await;
    let player = resolve_player(&world, &key.0)?;
    let tick = world.clock.tick();

    let target = match kind {
        IntelTargetKind::Zone => IntelTarget::Zone(ZoneId(id)),
        IntelTargetKind::Route => IntelTarget::Route(RouteId(id)),
    };
    let freshest = world
        .intel_visible_to(player.id)
        .into_iter()
        .filter(|r| r.target == target)
        .max_by_key(|r| r.gathered_tick)
        .ok_or_else(|| ApiError::NotFound("intel report".to_owned()))?;
    Ok(Json(
        serde_json::to_value(intel::project(freshest, tick)).unwrap_or_default(),
    ))
}

// ---------------------------------------------------------------------------
// Batch
// ---------------------------------------------------------------------------

/// Request body for `POST /batch`.
#[derive(Debug, serde::Deserialize)]
pub struct BatchRequest {
    /// Up to ten actions, applied sequentially.
    pub actions: Vec<Action>,
}

/// `POST /batch` -- apply actions sequentially, short-circuiting on the
/// first error.
///
/// The per-action rate limit still applies: every entry is stamped one
/// second after the previous, so a batch of N pre-consumes N rate slots
/// and the caller's next standalone action waits accordingly.
pub async fn batch(
    State(app): State<Arc<AppState>>,
    key: ApiKey,
    Json(req): Json<BatchRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    if req.actions.is_empty() || req.actions.len() > BATCH_LIMIT {
        return Err(ApiError::BadRequest(format!(
            "batch must contain 1-{BATCH_LIMIT} actions"
        )));
    }

    let base = chrono::Utc::now();
    let mut results = Vec::with_capacity(req.actions.len());
    for (index, action) in req.actions.into_iter().enumerate() {
        let stamped = base + chrono::Duration::seconds(i64::try_from(index).unwrap_or(0));
        match app.perform_at(&key.0, action, stamped).await {
            Ok(body) => results.push(json!({ "ok": true, "result": body })),
            Err(e) => {
                results.push(json!({ "ok": false, "code": e.code() }));
                break;
            }
        }
    }
    Ok(Json(json!({ "results": results })))
}
