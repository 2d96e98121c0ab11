//! Faction endpoints: lifecycle, members, treasury, shared intel,
//! analytics, audit, relations, and doctrines.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use burnrate_core::actions::Action;
use burnrate_core::intel;
use burnrate_types::{
    DoctrineId, EventType, FactionId, FactionRelation, PlayerId, Resource,
};
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use crate::auth::ApiKey;
use crate::error::ApiError;
use crate::handlers::{resolve_player, validate_dto};
use crate::state::AppState;

/// Public faction view.
fn faction_view(faction: &burnrate_types::Faction) -> serde_json::Value {
    json!({
        "id": faction.id,
        "name": faction.name,
        "tag": faction.tag,
        "founder": faction.founder,
        "members": faction.members.len(),
        "created_tick": faction.created_tick,
    })
}

/// `GET /factions` -- all factions, public view.
pub async fn list(
    State(app): State<Arc<AppState>>,
    key: ApiKey,
) -> Result<Json<serde_json::Value>, ApiError> {
    let world = app.world.read().await;
    let _ = resolve_player(&world, &key.0)?;
    let factions: Vec<_> = world.factions.values().map(faction_view).collect();
    Ok(Json(json!({ "factions": factions })))
}

/// Request body for `POST /factions`.
#[derive(Debug, serde::Deserialize, Validate)]
pub struct CreateFactionRequest {
    /// Full name.
    #[validate(length(min = 3, max = 32))]
    pub name: String,
    /// Short tag.
    #[validate(length(min = 2, max = 5))]
    pub tag: String,
}

/// `POST /factions`.
pub async fn create(
    State(app): State<Arc<AppState>>,
    key: ApiKey,
    Json(req): Json<CreateFactionRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    validate_dto(&req)?;
    Ok(Json(
        app.perform(
            &key.0,
            Action::CreateFaction {
                name: req.name,
                tag: req.tag,
            },
        )
        .await?,
    ))
}

/// `POST /factions/{id}/join`.
pub async fn join(
    State(app): State<Arc<AppState>>,
    key: ApiKey,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    Ok(Json(
        app.perform(&key.0, Action::JoinFaction { faction: FactionId(id) }).await?,
    ))
}

/// `POST /factions/leave`.
pub async fn leave(
    State(app): State<Arc<AppState>>,
    key: ApiKey,
) -> Result<Json<serde_json::Value>, ApiError> {
    Ok(Json(app.perform(&key.0, Action::LeaveFaction).await?))
}

/// `GET /factions/mine` -- the member's full faction view.
pub async fn mine(
    State(app): State<Arc<AppState>>,
    key: ApiKey,
) -> Result<Json<serde_json::Value>, ApiError> {
    let world = app.world.read().await;
    let player = resolve_player(&world, &key.0)?;
    let faction_id = player
        .faction
        .ok_or_else(|| ApiError::NotFound("faction membership".to_owned()))?;
    let faction = world
        .factions
        .get(&faction_id)
        .ok_or_else(|| ApiError::NotFound("faction".to_owned()))?;
    Ok(Json(serde_json::to_value(faction).unwrap_or_default()))
}

/// `GET /factions/intel` -- all reports shared by current members.
pub async fn shared_intel(
    State(app): State<Arc<AppState>>,
    key: ApiKey,
) -> Result<Json<serde_json::Value>, ApiError> {
    let world = app.world.read().await;
    let player = resolve_player(&world, &key.0)?;
    if player.faction.is_none() {
        return Err(ApiError::NotFound("faction membership".to_owned()));
    }
    let tick = world.clock.tick();
    let mut reports = world.intel_visible_to(player.id);
    reports.sort_by_key(|r| std::cmp::Reverse(r.gathered_tick));
    let projected: Vec<_> = reports.into_iter().map(|r| intel::project(r, tick)).collect();
    Ok(Json(json!({ "intel": projected })))
}

/// `POST /factions/members/{id}/promote`.
pub async fn promote(
    State(app): State<Arc<AppState>>,
    key: ApiKey,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    Ok(Json(
        app.perform(&key.0, Action::PromoteMember { player: PlayerId(id) }).await?,
    ))
}

/// `POST /factions/members/{id}/demote`.
pub async fn demote(
    State(app): State<Arc<AppState>>,
    key: ApiKey,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    Ok(Json(
        app.perform(&key.0, Action::DemoteMember { player: PlayerId(id) }).await?,
    ))
}

/// `POST /factions/members/{id}/kick`.
pub async fn kick(
    State(app): State<Arc<AppState>>,
    key: ApiKey,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    Ok(Json(
        app.perform(&key.0, Action::KickMember { player: PlayerId(id) }).await?,
    ))
}

/// Request body for `POST /factions/transfer-leadership`.
#[derive(Debug, serde::Deserialize)]
pub struct TransferRequest {
    /// The new founder.
    pub to: PlayerId,
}

/// `POST /factions/transfer-leadership`.
pub async fn transfer(
    State(app): State<Arc<AppState>>,
    key: ApiKey,
    Json(req): Json<TransferRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    Ok(Json(
        app.perform(&key.0, Action::TransferLeadership { to: req.to }).await?,
    ))
}

/// Request body for treasury movement endpoints.
#[derive(Debug, serde::Deserialize)]
pub struct TreasuryRequest {
    /// Credits to move.
    #[serde(default)]
    pub credits: i64,
    /// Goods to move.
    #[serde(default)]
    pub goods: BTreeMap<Resource, u32>,
}

/// `POST /factions/treasury/deposit`.
pub async fn treasury_deposit(
    State(app): State<Arc<AppState>>,
    key: ApiKey,
    Json(req): Json<TreasuryRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    Ok(Json(
        app.perform(
            &key.0,
            Action::TreasuryDeposit {
                credits: req.credits,
                goods: req.goods,
            },
        )
        .await?,
    ))
}

/// `POST /factions/treasury/withdraw`.
pub async fn treasury_withdraw(
    State(app): State<Arc<AppState>>,
    key: ApiKey,
    Json(req): Json<TreasuryRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    Ok(Json(
        app.perform(
            &key.0,
            Action::TreasuryWithdraw {
                credits: req.credits,
                goods: req.goods,
            },
        )
        .await?,
    ))
}

/// Request body for `POST /factions/relations`.
#[derive(Debug, serde::Deserialize)]
pub struct RelationRequest {
    /// The other faction.
    pub faction: FactionId,
    /// The new stance.
    pub relation: FactionRelation,
}

/// `POST /factions/relations` (Founder only).
pub async fn set_relation(
    State(app): State<Arc<AppState>>,
    key: ApiKey,
    Json(req): Json<RelationRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    Ok(Json(
        app.perform(
            &key.0,
            Action::SetRelation {
                faction: req.faction,
                relation: req.relation,
            },
        )
        .await?,
    ))
}

/// `GET /faction/analytics` -- membership, treasury, and holdings.
pub async fn analytics(
    State(app): State<Arc<AppState>>,
    key: ApiKey,
) -> Result<Json<serde_json::Value>, ApiError> {
    let world = app.world.read().await;
    let player = resolve_player(&world, &key.0)?;
    let faction_id = player
        .faction
        .ok_or_else(|| ApiError::NotFound("faction membership".to_owned()))?;
    let faction = world
        .factions
        .get(&faction_id)
        .ok_or_else(|| ApiError::NotFound("faction".to_owned()))?;

    let held: Vec<_> = world
        .graph
        .zones()
        .filter(|z| z.owner == Some(faction_id))
        .map(|z| json!({ "zone": z.id, "kind": z.kind, "streak": z.compliance_streak, "su": z.su_stockpile }))
        .collect();
    let income: i64 = world
        .graph
        .zones()
        .filter(|z| z.owner == Some(faction_id))
        .map(|z| z.kind.income())
        .sum();
    let score = world
        .scores
        .get(world.clock.season(), faction_id.into_inner())
        .map(burnrate_types::SeasonScore::total)
        .unwrap_or(0);

    Ok(Json(json!({
        "faction": faction_id,
        "members": faction.members.len(),
        "treasury": faction.treasury,
        "zones_held": held,
        "income_per_tick": income,
        "season_score": score,
    })))
}

/// `GET /faction/audit` -- treasury and membership events touching the
/// faction, newest first.
pub async fn audit(
    State(app): State<Arc<AppState>>,
    key: ApiKey,
) -> Result<Json<serde_json::Value>, ApiError> {
    let world = app.world.read().await;
    let player = resolve_player(&world, &key.0)?;
    let faction_id = player
        .faction
        .ok_or_else(|| ApiError::NotFound("faction membership".to_owned()))?;

    let audited = [
        EventType::TreasuryDeposited,
        EventType::TreasuryWithdrawn,
        EventType::FactionJoined,
        EventType::FactionLeft,
        EventType::MemberPromoted,
        EventType::MemberDemoted,
        EventType::MemberKicked,
        EventType::LeadershipTransferred,
    ];
    let events: Vec<_> = world
        .event_log
        .iter()
        .rev()
        .filter(|e| audited.contains(&e.event_type))
        .filter(|e| {
            e.data
                .get("faction")
                .and_then(|v| v.as_str())
                .and_then(|s| s.parse::<Uuid>().ok())
                == Some(faction_id.into_inner())
        })
        .take(200)
        .collect();
    Ok(Json(json!({ "events": events })))
}

// ---------------------------------------------------------------------------
// Doctrines
// ---------------------------------------------------------------------------

/// `GET /doctrines` -- the member's faction doctrines.
pub async fn doctrines(
    State(app): State<Arc<AppState>>,
    key: ApiKey,
) -> Result<Json<serde_json::Value>, ApiError> {
    let world = app.world.read().await;
    let player = resolve_player(&world, &key.0)?;
    let faction_id = player
        .faction
        .ok_or_else(|| ApiError::NotFound("faction membership".to_owned()))?;
    let faction = world
        .factions
        .get(&faction_id)
        .ok_or_else(|| ApiError::NotFound("faction".to_owned()))?;
    let docs: Vec<_> = faction.doctrines.values().collect();
    Ok(Json(json!({ "doctrines": docs })))
}

/// Request body for doctrine create/update.
#[derive(Debug, serde::Deserialize, Validate)]
pub struct DoctrineRequest {
    /// Title line.
    #[validate(length(min = 1, max = 80))]
    pub title: String,
    /// Body text.
    #[validate(length(max = 4000))]
    pub body: String,
}

/// `POST /doctrines`.
pub async fn create_doctrine(
    State(app): State<Arc<AppState>>,
    key: ApiKey,
    Json(req): Json<DoctrineRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    validate_dto(&req)?;
    Ok(Json(
        app.perform(
            &key.0,
            Action::CreateDoctrine {
                title: req.title,
                body: req.body,
            },
        )
        .await?,
    ))
}

/// `PUT /doctrines/{id}`.
pub async fn update_doctrine(
    State(app): State<Arc<AppState>>,
    key: ApiKey,
    Path(id): Path<Uuid>,
    Json(req): Json<DoctrineRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    validate_dto(&req)?;
    Ok(Json(
        app.perform(
            &key.0,
            Action::UpdateDoctrine {
                id: DoctrineId(id),
                title: req.title,
                body: req.body,
            },
        )
        .await?,
    ))
}

/// `DELETE /doctrines/{id}`.
pub async fn delete_doctrine(
    State(app): State<Arc<AppState>>,
    key: ApiKey,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    Ok(Json(
        app.perform(&key.0, Action::DeleteDoctrine { id: DoctrineId(id) }).await?,
    ))
}
