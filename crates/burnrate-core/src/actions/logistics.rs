//! Movement, extraction, production, shipping, supply, capture, intel
//! gathering, and progression actions.

use std::collections::BTreeMap;

use burnrate_types::{
    ActorKind, Event, EventType, IntelId, IntelReport, IntelSnapshot, IntelTarget, LicenseKind,
    PlayerId, Resource, RouteObservation, Shipment, ShipmentId, ShipmentKind, ShipmentStatus,
    UnitAssignment, UnitId, ZoneId, ZoneKind, ZoneObservation,
};
use serde_json::json;

use burnrate_world::recipes;

use crate::actions::{ActionError, ActionOutcome, require_player};
use crate::intel;
use crate::state::WorldState;

/// Reputation for delivering one supply unit.
const SUPPLY_REPUTATION_PER_SU: i64 = 2;

/// Reputation for capturing a zone.
const CAPTURE_REPUTATION: i64 = 25;

/// Reputation and credit gates for license unlocks.
const FREIGHT_REPUTATION: i64 = 50;
const FREIGHT_COST: i64 = 500;
const CONVOY_REPUTATION: i64 = 150;
const CONVOY_COST: i64 = 2_000;

/// Move the player along a direct route.
pub fn travel(
    state: &mut WorldState,
    player_id: PlayerId,
    to: ZoneId,
) -> Result<ActionOutcome, ActionError> {
    let player = require_player(state, player_id)?;
    let from = player.zone;
    if state.graph.zone(to).is_none() {
        return Err(ActionError::NotFound("zone".to_owned()));
    }
    if state.graph.route_between(from, to).is_none() {
        return Err(ActionError::Precondition(
            "no direct route to that zone".to_owned(),
        ));
    }

    let tick = state.clock.tick();
    if let Some(p) = state.players.get_mut(&player_id) {
        p.zone = to;
    }
    let event = Event::now(
        EventType::PlayerTraveled,
        tick,
        Some(player_id.into_inner()),
        ActorKind::Player,
        json!({ "from": from, "to": to }),
    );
    Ok(ActionOutcome::with_event(json!({ "zone": to }), event))
}

/// Extract the local raw resource at a Field, paying credits per unit.
pub fn extract(
    state: &mut WorldState,
    player_id: PlayerId,
    quantity: u32,
) -> Result<ActionOutcome, ActionError> {
    if quantity == 0 {
        return Err(ActionError::Validation("quantity must be positive".to_owned()));
    }
    let player = require_player(state, player_id)?;
    let zone_id = player.zone;
    let zone = state
        .graph
        .zone(zone_id)
        .ok_or_else(|| ActionError::NotFound("zone".to_owned()))?;
    if zone.kind != ZoneKind::Field {
        return Err(ActionError::Precondition(
            "extraction requires a Field zone".to_owned(),
        ));
    }
    let Some(resource) = zone.field_resource else {
        return Err(ActionError::Precondition("this field is exhausted".to_owned()));
    };

    let cost = recipes::EXTRACTION_COST_PER_UNIT.saturating_mul(i64::from(quantity));
    if player.inventory.credits < cost {
        return Err(ActionError::Precondition(format!(
            "extraction costs {cost} credits"
        )));
    }

    let tick = state.clock.tick();
    if let Some(p) = state.players.get_mut(&player_id) {
        p.inventory.credits -= cost;
        p.inventory.add(resource, quantity);
    }
    let event = Event::now(
        EventType::ResourceExtracted,
        tick,
        Some(player_id.into_inner()),
        ActorKind::Player,
        json!({ "zone": zone_id, "resource": resource, "quantity": quantity, "cost": cost }),
    );
    Ok(ActionOutcome::with_event(
        json!({ "resource": resource, "quantity": quantity, "cost": cost }),
        event,
    ))
}

/// Run a recipe at a Factory.
pub fn produce(
    state: &mut WorldState,
    player_id: PlayerId,
    output: Resource,
    quantity: u32,
) -> Result<ActionOutcome, ActionError> {
    if quantity == 0 {
        return Err(ActionError::Validation("quantity must be positive".to_owned()));
    }
    let Some(inputs) = recipes::recipe(output) else {
        return Err(ActionError::Validation(format!(
            "{output:?} is extracted, not produced"
        )));
    };

    let player = require_player(state, player_id)?;
    let zone_id = player.zone;
    let zone = state
        .graph
        .zone(zone_id)
        .ok_or_else(|| ActionError::NotFound("zone".to_owned()))?;
    if zone.kind != ZoneKind::Factory {
        return Err(ActionError::Precondition(
            "production requires a Factory zone".to_owned(),
        ));
    }
    if zone.production_capacity < quantity {
        return Err(ActionError::Precondition(
            "factory capacity exhausted this tick".to_owned(),
        ));
    }

    let batch = recipes::scale(&inputs, quantity);
    if !player.inventory.has_all(&batch) {
        return Err(ActionError::Precondition(
            "recipe inputs not present in inventory".to_owned(),
        ));
    }

    let tick = state.clock.tick();
    if let Some(p) = state.players.get_mut(&player_id) {
        let _ = p.inventory.remove_all(&batch);
        p.inventory.add(output, quantity);
    }
    if let Some(z) = state.graph.zone_mut(zone_id) {
        z.production_capacity -= quantity;
    }
    let event = Event::now(
        EventType::GoodsProduced,
        tick,
        Some(player_id.into_inner()),
        ActorKind::Player,
        json!({ "zone": zone_id, "output": output, "quantity": quantity }),
    );
    Ok(ActionOutcome::with_event(
        json!({ "output": output, "quantity": quantity }),
        event,
    ))
}

/// Launch a shipment from the player's current zone along a validated
/// path, escrowing the cargo out of the player inventory.
pub fn ship(
    state: &mut WorldState,
    player_id: PlayerId,
    kind: ShipmentKind,
    path: &[ZoneId],
    cargo: &BTreeMap<Resource, u32>,
    escorts: &[UnitId],
) -> Result<ActionOutcome, ActionError> {
    let player = require_player(state, player_id)?;
    if !player.licenses.holds(kind.required_license()) {
        return Err(ActionError::Precondition(format!(
            "{:?} license required",
            kind.required_license()
        )));
    }
    if path.first() != Some(&player.zone) {
        return Err(ActionError::Precondition(
            "shipments launch from your current zone".to_owned(),
        ));
    }

    let total: u32 = cargo.values().fold(0, |acc, q| acc.saturating_add(*q));
    if total == 0 {
        return Err(ActionError::Validation("cargo is empty".to_owned()));
    }
    if total > kind.capacity() {
        return Err(ActionError::Precondition(format!(
            "cargo exceeds {:?} capacity of {}",
            kind,
            kind.capacity()
        )));
    }
    if !player.inventory.has_all(cargo) {
        return Err(ActionError::Precondition(
            "cargo not present in inventory".to_owned(),
        ));
    }

    let first_leg = {
        let legs = state
            .graph
            .validate_path(path)
            .map_err(|e| ActionError::Precondition(e.to_string()))?;
        legs.first().map_or(1, |r| r.distance_ticks)
    };

    // Escorts must be owned, idle escorts standing at the launch zone.
    for unit_id in escorts {
        let unit = state
            .units
            .get(unit_id)
            .ok_or_else(|| ActionError::NotFound("unit".to_owned()))?;
        if unit.owner != player_id {
            return Err(ActionError::Precondition("unit belongs to another player".to_owned()));
        }
        if unit.kind != burnrate_types::UnitKind::Escort {
            return Err(ActionError::Precondition("only escorts can guard shipments".to_owned()));
        }
        if unit.assignment.is_some() {
            return Err(ActionError::Conflict("unit is already assigned".to_owned()));
        }
        if unit.zone != path[0] {
            return Err(ActionError::Precondition(
                "escort must be at the launch zone".to_owned(),
            ));
        }
    }

    let tick = state.clock.tick();
    if let Some(p) = state.players.get_mut(&player_id) {
        let _ = p.inventory.remove_all(cargo);
    }

    let shipment = Shipment {
        id: ShipmentId::new(),
        owner: player_id,
        kind,
        path: path.to_vec(),
        position: 0,
        ticks_to_next: first_leg,
        cargo: cargo.clone(),
        escorts: escorts.to_vec(),
        status: ShipmentStatus::InTransit,
        created_tick: tick,
    };
    let shipment_id = shipment.id;
    for unit_id in escorts {
        if let Some(unit) = state.units.get_mut(unit_id) {
            unit.assignment = Some(UnitAssignment::Escort(shipment_id));
        }
    }
    state.shipments.insert(shipment_id, shipment);

    let event = Event::now(
        EventType::ShipmentLaunched,
        tick,
        Some(player_id.into_inner()),
        ActorKind::Player,
        json!({ "shipment": shipment_id, "kind": kind, "path": path, "cargo": cargo }),
    );
    Ok(ActionOutcome::with_event(
        json!({ "shipment": shipment_id, "eta_first_leg": first_leg }),
        event,
    ))
}

/// Assemble supply units into the current zone's stockpile.
pub fn supply(
    state: &mut WorldState,
    player_id: PlayerId,
    amount: u32,
) -> Result<ActionOutcome, ActionError> {
    if amount == 0 {
        return Err(ActionError::Validation("amount must be positive".to_owned()));
    }
    let player = require_player(state, player_id)?;
    let Some(faction) = player.faction else {
        return Err(ActionError::Precondition(
            "supplying requires faction membership".to_owned(),
        ));
    };
    let zone_id = player.zone;
    let zone = state
        .graph
        .zone(zone_id)
        .ok_or_else(|| ActionError::NotFound("zone".to_owned()))?;
    if zone.owner != Some(faction) {
        return Err(ActionError::Precondition(
            "zone is not held by your faction".to_owned(),
        ));
    }

    let inputs = recipes::supply_unit_cost(amount);
    if !player.inventory.has_all(&inputs) {
        return Err(ActionError::Precondition(
            "supply components not present in inventory".to_owned(),
        ));
    }

    let tick = state.clock.tick();
    if let Some(p) = state.players.get_mut(&player_id) {
        let _ = p.inventory.remove_all(&inputs);
    }
    if let Some(z) = state.graph.zone_mut(zone_id) {
        z.su_stockpile = z.su_stockpile.saturating_add(amount);
    }

    state.award_reputation(player_id, SUPPLY_REPUTATION_PER_SU.saturating_mul(i64::from(amount)));
    state.score_player(
        player_id,
        burnrate_types::ScoreCategory::SupplyDelivered,
        i64::from(amount),
    );

    // Supply contract progress.
    for contract in state.contracts.values_mut() {
        if contract.status == burnrate_types::ContractStatus::Accepted
            && contract.accepted_by == Some(player_id)
        {
            if let burnrate_types::ContractTerms::Supply { zone: target, .. } = contract.terms {
                if target == zone_id {
                    contract.progress = contract.progress.saturating_add(amount);
                }
            }
        }
    }

    let event = Event::now(
        EventType::SupplyDelivered,
        tick,
        Some(player_id.into_inner()),
        ActorKind::Player,
        json!({ "zone": zone_id, "amount": amount }),
    );
    Ok(ActionOutcome::with_event(
        json!({ "zone": zone_id, "su_delivered": amount }),
        event,
    ))
}

/// Capture the current zone for the player's faction.
pub fn capture(state: &mut WorldState, player_id: PlayerId) -> Result<ActionOutcome, ActionError> {
    let player = require_player(state, player_id)?;
    let Some(faction) = player.faction else {
        return Err(ActionError::Precondition(
            "capturing requires faction membership".to_owned(),
        ));
    };
    let zone_id = player.zone;
    let zone = state
        .graph
        .zone(zone_id)
        .ok_or_else(|| ActionError::NotFound("zone".to_owned()))?;
    if !zone.is_capturable() {
        return Err(ActionError::Precondition(
            "zone is not neutral, collapsed, or capturable".to_owned(),
        ));
    }

    let tick = state.clock.tick();
    if let Some(z) = state.graph.zone_mut(zone_id) {
        z.owner = Some(faction);
        z.collapsed = false;
        z.supply_level = rust_decimal::Decimal::ZERO;
        z.compliance_streak = 0;
    }
    state.award_reputation(player_id, CAPTURE_REPUTATION);

    let event = Event::now(
        EventType::ZoneCaptured,
        tick,
        Some(player_id.into_inner()),
        ActorKind::Player,
        json!({ "zone": zone_id, "faction": faction }),
    );
    Ok(ActionOutcome::with_event(
        json!({ "zone": zone_id, "owner": faction }),
        event,
    ))
}

/// Scan a zone or route, capturing a full snapshot at the current tick.
pub fn scan(
    state: &mut WorldState,
    player_id: PlayerId,
    target: IntelTarget,
) -> Result<ActionOutcome, ActionError> {
    let player = require_player(state, player_id)?;
    let faction = player.faction;
    let tick = state.clock.tick();

    let snapshot = match target {
        IntelTarget::Zone(zone_id) => {
            let zone = state
                .graph
                .zone(zone_id)
                .ok_or_else(|| ActionError::NotFound("zone".to_owned()))?;
            IntelSnapshot::Zone(ZoneObservation {
                name: zone.name.clone(),
                kind: zone.kind,
                owner: zone.owner,
                supply_level: zone.supply_level,
                su_stockpile: zone.su_stockpile,
                garrison: zone.garrison,
                medkit_stockpile: zone.medkit_stockpile,
                comms_stockpile: zone.comms_stockpile,
            })
        }
        IntelTarget::Route(route_id) => {
            let route = state
                .graph
                .routes()
                .find(|r| r.id == route_id)
                .ok_or_else(|| ActionError::NotFound("route".to_owned()))?;
            let sighted = state
                .shipments
                .values()
                .filter(|s| {
                    s.status == ShipmentStatus::InTransit
                        && matches!(
                            (s.current_zone(), s.next_zone()),
                            (Some(from), Some(to))
                                if from == route.from_zone && to == route.to_zone
                        )
                })
                .count();
            IntelSnapshot::Route(RouteObservation {
                base_risk: route.base_risk,
                chokepoint: route.chokepoint,
                capacity_per_tick: route.capacity_per_tick,
                shipments_sighted: u32::try_from(sighted).unwrap_or(u32::MAX),
            })
        }
    };

    let report = IntelReport {
        id: IntelId::new(),
        gatherer: player_id,
        faction,
        target,
        gathered_tick: tick,
        snapshot,
        signal_quality: 100,
    };
    let projected = intel::project(&report, tick);
    state.intel.insert(report.id, report);

    let event = Event::now(
        EventType::IntelGathered,
        tick,
        Some(player_id.into_inner()),
        ActorKind::Player,
        json!({ "target": target }),
    );
    Ok(ActionOutcome::with_event(
        serde_json::to_value(&projected)
            .map_err(|e| ActionError::Internal(e.to_string()))?,
        event,
    ))
}

/// Deposit medkits or comms into the current zone's defensive stockpiles.
pub fn stockpile(
    state: &mut WorldState,
    player_id: PlayerId,
    resource: Resource,
    quantity: u32,
) -> Result<ActionOutcome, ActionError> {
    if quantity == 0 {
        return Err(ActionError::Validation("quantity must be positive".to_owned()));
    }
    if !matches!(resource, Resource::Medkits | Resource::Comms) {
        return Err(ActionError::Validation(
            "only medkits and comms can be stockpiled".to_owned(),
        ));
    }
    let player = require_player(state, player_id)?;
    let Some(faction) = player.faction else {
        return Err(ActionError::Precondition(
            "stockpiling requires faction membership".to_owned(),
        ));
    };
    let zone_id = player.zone;
    let zone = state
        .graph
        .zone(zone_id)
        .ok_or_else(|| ActionError::NotFound("zone".to_owned()))?;
    if zone.owner != Some(faction) {
        return Err(ActionError::Precondition(
            "zone is not held by your faction".to_owned(),
        ));
    }
    if !player.inventory.has(resource, quantity) {
        return Err(ActionError::Precondition("insufficient goods".to_owned()));
    }

    let tick = state.clock.tick();
    if let Some(p) = state.players.get_mut(&player_id) {
        let _ = p.inventory.remove(resource, quantity);
    }
    if let Some(z) = state.graph.zone_mut(zone_id) {
        match resource {
            Resource::Medkits => z.medkit_stockpile = z.medkit_stockpile.saturating_add(quantity),
            _ => z.comms_stockpile = z.comms_stockpile.saturating_add(quantity),
        }
    }

    let event = Event::now(
        EventType::StockpileDeposited,
        tick,
        Some(player_id.into_inner()),
        ActorKind::Player,
        json!({ "zone": zone_id, "resource": resource, "quantity": quantity }),
    );
    Ok(ActionOutcome::with_event(
        json!({ "zone": zone_id, "resource": resource, "quantity": quantity }),
        event,
    ))
}

/// Unlock the freight or convoy license for credits, gated on reputation.
pub fn unlock_license(
    state: &mut WorldState,
    player_id: PlayerId,
    kind: LicenseKind,
) -> Result<ActionOutcome, ActionError> {
    let player = require_player(state, player_id)?;
    let (rep_gate, cost) = match kind {
        LicenseKind::Courier => {
            return Err(ActionError::Validation(
                "the courier license is granted at join".to_owned(),
            ));
        }
        LicenseKind::Freight => (FREIGHT_REPUTATION, FREIGHT_COST),
        LicenseKind::Convoy => (CONVOY_REPUTATION, CONVOY_COST),
    };
    if player.licenses.holds(kind) {
        return Err(ActionError::Conflict("license already held".to_owned()));
    }
    if player.reputation < rep_gate {
        return Err(ActionError::Precondition(format!(
            "requires reputation {rep_gate}"
        )));
    }
    if player.inventory.credits < cost {
        return Err(ActionError::Precondition(format!("requires {cost} credits")));
    }

    let tick = state.clock.tick();
    if let Some(p) = state.players.get_mut(&player_id) {
        p.inventory.credits -= cost;
        match kind {
            LicenseKind::Freight => p.licenses.freight = true,
            LicenseKind::Convoy => p.licenses.convoy = true,
            LicenseKind::Courier => {}
        }
    }
    let event = Event::now(
        EventType::LicenseUnlocked,
        tick,
        Some(player_id.into_inner()),
        ActorKind::Player,
        json!({ "license": kind, "cost": cost }),
    );
    Ok(ActionOutcome::with_event(json!({ "license": kind }), event))
}

/// Bump the tutorial step. Monotonic; no event.
pub fn advance_tutorial(
    state: &mut WorldState,
    player_id: PlayerId,
) -> Result<ActionOutcome, ActionError> {
    let step = {
        let player = state
            .players
            .get_mut(&player_id)
            .ok_or(ActionError::Unauthorized)?;
        player.tutorial_step = player.tutorial_step.saturating_add(1);
        player.tutorial_step
    };
    Ok(ActionOutcome::body(json!({ "tutorial_step": step })))
}
