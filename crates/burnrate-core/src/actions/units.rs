//! Combat unit actions: building, assignment, sale, and hire.

use burnrate_types::{
    ActorKind, Event, EventType, PlayerId, RouteId, ShipmentId, ShipmentStatus, Unit,
    UnitAssignment, UnitId, UnitKind, ZoneKind,
};
use serde_json::json;

use burnrate_world::recipes;

use crate::actions::{ActionError, ActionOutcome, require_player};
use crate::state::WorldState;

/// Build a unit at a Factory from its recipe.
pub fn build(
    state: &mut WorldState,
    player_id: PlayerId,
    kind: UnitKind,
) -> Result<ActionOutcome, ActionError> {
    let player = require_player(state, player_id)?;
    let zone_id = player.zone;
    let zone = state
        .graph
        .zone(zone_id)
        .ok_or_else(|| ActionError::NotFound("zone".to_owned()))?;
    if zone.kind != ZoneKind::Factory {
        return Err(ActionError::Precondition(
            "units are built at Factory zones".to_owned(),
        ));
    }
    let inputs = recipes::unit_build_cost(kind);
    if !player.inventory.has_all(&inputs) {
        return Err(ActionError::Precondition(
            "unit components not present in inventory".to_owned(),
        ));
    }

    let tick = state.clock.tick();
    if let Some(p) = state.players.get_mut(&player_id) {
        let _ = p.inventory.remove_all(&inputs);
    }
    let unit = Unit {
        id: UnitId::new(),
        owner: player_id,
        kind,
        zone: zone_id,
        strength: kind.base_strength(),
        speed: match kind {
            UnitKind::Escort => 1,
            UnitKind::Raider => 2,
        },
        maintenance: kind.maintenance(),
        assignment: None,
        for_sale_price: None,
        created_tick: tick,
    };
    let unit_id = unit.id;
    state.units.insert(unit_id, unit);

    let event = Event::now(
        EventType::UnitBuilt,
        tick,
        Some(player_id.into_inner()),
        ActorKind::Player,
        json!({ "unit": unit_id, "kind": kind, "zone": zone_id }),
    );
    Ok(ActionOutcome::with_event(json!({ "unit": unit_id, "kind": kind }), event))
}

/// Look up a unit owned by the actor.
fn owned_unit<'a>(
    state: &'a WorldState,
    player_id: PlayerId,
    unit_id: UnitId,
) -> Result<&'a Unit, ActionError> {
    let unit = state
        .units
        .get(&unit_id)
        .ok_or_else(|| ActionError::NotFound("unit".to_owned()))?;
    if unit.owner != player_id {
        return Err(ActionError::Precondition(
            "unit belongs to another player".to_owned(),
        ));
    }
    Ok(unit)
}

/// Attach an idle escort to an in-transit shipment at the same zone.
pub fn assign_escort(
    state: &mut WorldState,
    player_id: PlayerId,
    unit_id: UnitId,
    shipment_id: ShipmentId,
) -> Result<ActionOutcome, ActionError> {
    let unit = owned_unit(state, player_id, unit_id)?;
    if unit.kind != UnitKind::Escort {
        return Err(ActionError::Precondition(
            "only escorts can guard shipments".to_owned(),
        ));
    }
    if unit.assignment.is_some() {
        return Err(ActionError::Conflict("unit is already assigned".to_owned()));
    }
    let unit_zone = unit.zone;

    let shipment = state
        .shipments
        .get(&shipment_id)
        .ok_or_else(|| ActionError::NotFound("shipment".to_owned()))?;
    if shipment.owner != player_id {
        return Err(ActionError::Precondition(
            "shipment belongs to another player".to_owned(),
        ));
    }
    if shipment.status != ShipmentStatus::InTransit {
        return Err(ActionError::Conflict("shipment is not in transit".to_owned()));
    }
    if shipment.current_zone() != Some(unit_zone) {
        return Err(ActionError::Precondition(
            "escort must be at the shipment's current zone".to_owned(),
        ));
    }

    let tick = state.clock.tick();
    if let Some(u) = state.units.get_mut(&unit_id) {
        u.assignment = Some(UnitAssignment::Escort(shipment_id));
    }
    if let Some(s) = state.shipments.get_mut(&shipment_id) {
        s.escorts.push(unit_id);
    }

    let event = Event::now(
        EventType::UnitAssigned,
        tick,
        Some(player_id.into_inner()),
        ActorKind::Player,
        json!({ "unit": unit_id, "shipment": shipment_id }),
    );
    Ok(ActionOutcome::with_event(json!({ "unit": unit_id }), event))
}

/// Put a raider on patrol along a route it touches.
pub fn deploy_raider(
    state: &mut WorldState,
    player_id: PlayerId,
    unit_id: UnitId,
    route_id: RouteId,
) -> Result<ActionOutcome, ActionError> {
    let unit = owned_unit(state, player_id, unit_id)?;
    if unit.kind != UnitKind::Raider {
        return Err(ActionError::Precondition("only raiders patrol routes".to_owned()));
    }
    if unit.assignment.is_some() {
        return Err(ActionError::Conflict("unit is already assigned".to_owned()));
    }
    let unit_zone = unit.zone;

    let route = state
        .graph
        .routes()
        .find(|r| r.id == route_id)
        .ok_or_else(|| ActionError::NotFound("route".to_owned()))?;
    if route.from_zone != unit_zone && route.to_zone != unit_zone {
        return Err(ActionError::Precondition(
            "raider must be at one of the route's endpoints".to_owned(),
        ));
    }

    let tick = state.clock.tick();
    if let Some(u) = state.units.get_mut(&unit_id) {
        u.assignment = Some(UnitAssignment::Raider(route_id));
    }

    let event = Event::now(
        EventType::UnitAssigned,
        tick,
        Some(player_id.into_inner()),
        ActorKind::Player,
        json!({ "unit": unit_id, "route": route_id }),
    );
    Ok(ActionOutcome::with_event(json!({ "unit": unit_id }), event))
}

/// Clear a unit's assignment.
pub fn recall(
    state: &mut WorldState,
    player_id: PlayerId,
    unit_id: UnitId,
) -> Result<ActionOutcome, ActionError> {
    let unit = owned_unit(state, player_id, unit_id)?;
    let previous = unit.assignment;

    let tick = state.clock.tick();
    if let Some(UnitAssignment::Escort(shipment_id)) = previous {
        if let Some(s) = state.shipments.get_mut(&shipment_id) {
            s.escorts.retain(|e| *e != unit_id);
        }
    }
    if let Some(u) = state.units.get_mut(&unit_id) {
        u.assignment = None;
    }

    let event = Event::now(
        EventType::UnitRecalled,
        tick,
        Some(player_id.into_inner()),
        ActorKind::Player,
        json!({ "unit": unit_id }),
    );
    Ok(ActionOutcome::with_event(json!({ "unit": unit_id }), event))
}

/// List an idle unit for sale.
pub fn sell(
    state: &mut WorldState,
    player_id: PlayerId,
    unit_id: UnitId,
    price: i64,
) -> Result<ActionOutcome, ActionError> {
    if price <= 0 {
        return Err(ActionError::Validation("price must be positive".to_owned()));
    }
    let unit = owned_unit(state, player_id, unit_id)?;
    if unit.assignment.is_some() {
        return Err(ActionError::Precondition(
            "recall the unit before listing it".to_owned(),
        ));
    }

    if let Some(u) = state.units.get_mut(&unit_id) {
        u.for_sale_price = Some(price);
    }
    Ok(ActionOutcome::body(json!({ "unit": unit_id, "price": price })))
}

/// Buy a listed unit. Credits move buyer to seller; ownership transfers.
pub fn hire(
    state: &mut WorldState,
    player_id: PlayerId,
    unit_id: UnitId,
) -> Result<ActionOutcome, ActionError> {
    let unit = state
        .units
        .get(&unit_id)
        .ok_or_else(|| ActionError::NotFound("unit".to_owned()))?;
    let Some(price) = unit.for_sale_price else {
        return Err(ActionError::Precondition("unit is not for sale".to_owned()));
    };
    let seller = unit.owner;
    let previous_assignment = unit.assignment;
    if seller == player_id {
        return Err(ActionError::Conflict("cannot hire your own unit".to_owned()));
    }

    let buyer = require_player(state, player_id)?;
    if buyer.inventory.credits < price {
        return Err(ActionError::Precondition(format!("requires {price} credits")));
    }

    let tick = state.clock.tick();
    if let Some(p) = state.players.get_mut(&player_id) {
        p.inventory.credits -= price;
    }
    if let Some(p) = state.players.get_mut(&seller) {
        p.inventory.credits = p.inventory.credits.saturating_add(price);
    }
    // The unit may have been assigned after it was listed; the seller's
    // shipment must not keep counting a unit that changed hands.
    if let Some(UnitAssignment::Escort(shipment_id)) = previous_assignment {
        if let Some(s) = state.shipments.get_mut(&shipment_id) {
            s.escorts.retain(|e| *e != unit_id);
        }
    }
    if let Some(u) = state.units.get_mut(&unit_id) {
        u.owner = player_id;
        u.for_sale_price = None;
        u.assignment = None;
    }

    let event = Event::now(
        EventType::UnitSold,
        tick,
        Some(player_id.into_inner()),
        ActorKind::Player,
        json!({ "unit": unit_id, "price": price, "seller": seller, "buyer": player_id }),
    );
    Ok(ActionOutcome::with_event(json!({ "unit": unit_id, "price": price }), event))
}
