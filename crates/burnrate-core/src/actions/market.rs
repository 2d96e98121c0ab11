//! Market order actions: placement, advanced variants, cancellation.
//!
//! Escrow happens at placement: a buy order locks `price * quantity`
//! credits, a sell order locks the goods. Settlement and the matching
//! itself run in the tick pipeline; these handlers never trade.

use burnrate_market::{CancelledOrder, MarketError};
use burnrate_types::{
    ActorKind, ConditionalOrder, Event, EventType, MarketOrder, OrderId, OrderSide, PlayerId,
    PlayerTier, PriceTrigger, Resource, TwapOrder,
};
use serde_json::json;

use crate::actions::{ActionError, ActionOutcome, require_player, zone_has_market};
use crate::state::WorldState;

/// Shared placement checks: market presence, order cap, escrow funds.
/// Returns the player's current zone.
fn placement_checks(
    state: &WorldState,
    player_id: PlayerId,
    side: OrderSide,
    price: i64,
    quantity: u32,
    resource: Resource,
) -> Result<burnrate_types::ZoneId, ActionError> {
    if price <= 0 {
        return Err(ActionError::Validation("price must be positive".to_owned()));
    }
    if quantity == 0 {
        return Err(ActionError::Validation("quantity must be positive".to_owned()));
    }
    let player = require_player(state, player_id)?;
    let zone = state
        .graph
        .zone(player.zone)
        .ok_or_else(|| ActionError::NotFound("zone".to_owned()))?;
    if !zone_has_market(zone.kind) {
        return Err(ActionError::Precondition(
            "this zone has no market".to_owned(),
        ));
    }
    if state.market.open_order_count(player_id) >= player.tier.order_cap() {
        return Err(ActionError::Precondition(format!(
            "open order cap of {} reached",
            player.tier.order_cap()
        )));
    }
    match side {
        OrderSide::Sell => {
            if !player.inventory.has(resource, quantity) {
                return Err(ActionError::Precondition(
                    "goods to sell not present in inventory".to_owned(),
                ));
            }
        }
        OrderSide::Buy => {
            let escrow = price.saturating_mul(i64::from(quantity));
            if player.inventory.credits < escrow {
                return Err(ActionError::Precondition(format!(
                    "buy escrow requires {escrow} credits"
                )));
            }
        }
    }
    Ok(player.zone)
}

/// Take the escrow for an order out of the player's inventory.
fn take_escrow(
    state: &mut WorldState,
    player_id: PlayerId,
    side: OrderSide,
    price: i64,
    quantity: u32,
    resource: Resource,
) {
    if let Some(p) = state.players.get_mut(&player_id) {
        match side {
            OrderSide::Buy => {
                p.inventory.credits -= price.saturating_mul(i64::from(quantity));
            }
            OrderSide::Sell => {
                let _ = p.inventory.remove(resource, quantity);
            }
        }
    }
}

/// Place a plain limit order at the current zone's market.
pub fn place_order(
    state: &mut WorldState,
    player_id: PlayerId,
    resource: Resource,
    side: OrderSide,
    price: i64,
    quantity: u32,
) -> Result<ActionOutcome, ActionError> {
    let zone = placement_checks(state, player_id, side, price, quantity, resource)?;
    let tick = state.clock.tick();

    let order = MarketOrder {
        id: OrderId::new(),
        owner: player_id,
        zone,
        resource,
        side,
        price,
        remaining: quantity,
        original: quantity,
        created_tick: tick,
    };
    let order_id = order.id;
    state.market.place_order(order).map_err(map_market_error)?;
    take_escrow(state, player_id, side, price, quantity, resource);

    let event = Event::now(
        EventType::OrderPlaced,
        tick,
        Some(player_id.into_inner()),
        ActorKind::Player,
        json!({ "order": order_id, "zone": zone, "resource": resource, "side": side, "price": price, "quantity": quantity }),
    );
    Ok(ActionOutcome::with_event(json!({ "order": order_id }), event))
}

/// Place a conditional order. Operator tier and above.
pub fn place_conditional(
    state: &mut WorldState,
    player_id: PlayerId,
    resource: Resource,
    side: OrderSide,
    price: i64,
    quantity: u32,
    trigger: PriceTrigger,
) -> Result<ActionOutcome, ActionError> {
    require_tier(state, player_id, PlayerTier::Operator)?;
    let zone = placement_checks(state, player_id, side, price, quantity, resource)?;
    let tick = state.clock.tick();

    let order = MarketOrder {
        id: OrderId::new(),
        owner: player_id,
        zone,
        resource,
        side,
        price,
        remaining: quantity,
        original: quantity,
        created_tick: tick,
    };
    let order_id = order.id;
    state
        .market
        .place_conditional(ConditionalOrder {
            order,
            trigger,
            armed: false,
        })
        .map_err(map_market_error)?;
    take_escrow(state, player_id, side, price, quantity, resource);

    let event = Event::now(
        EventType::OrderPlaced,
        tick,
        Some(player_id.into_inner()),
        ActorKind::Player,
        json!({ "order": order_id, "zone": zone, "resource": resource, "side": side, "price": price, "quantity": quantity, "conditional": true }),
    );
    Ok(ActionOutcome::with_event(json!({ "order": order_id }), event))
}

/// Place a TWAP order. Operator tier and above.
pub fn place_twap(
    state: &mut WorldState,
    player_id: PlayerId,
    resource: Resource,
    side: OrderSide,
    price: i64,
    total: u32,
    slice: u32,
) -> Result<ActionOutcome, ActionError> {
    require_tier(state, player_id, PlayerTier::Operator)?;
    if slice == 0 || slice > total {
        return Err(ActionError::Validation(
            "slice must be between 1 and the total quantity".to_owned(),
        ));
    }
    let zone = placement_checks(state, player_id, side, price, total, resource)?;
    let tick = state.clock.tick();

    let ticks_remaining = total.div_ceil(slice);
    let order_id = OrderId::new();
    state
        .market
        .place_twap(TwapOrder {
            id: order_id,
            owner: player_id,
            zone,
            resource,
            side,
            price,
            total,
            slice,
            injected: 0,
            ticks_remaining,
            created_tick: tick,
        })
        .map_err(map_market_error)?;
    take_escrow(state, player_id, side, price, total, resource);

    let event = Event::now(
        EventType::OrderPlaced,
        tick,
        Some(player_id.into_inner()),
        ActorKind::Player,
        json!({ "order": order_id, "zone": zone, "resource": resource, "side": side, "price": price, "total": total, "slice": slice, "twap": true }),
    );
    Ok(ActionOutcome::with_event(
        json!({ "order": order_id, "ticks": ticks_remaining }),
        event,
    ))
}

/// Cancel an order of any variant and refund the unfilled escrow.
pub fn cancel_order(
    state: &mut WorldState,
    player_id: PlayerId,
    order_id: OrderId,
) -> Result<ActionOutcome, ActionError> {
    let cancelled = state
        .market
        .cancel(order_id, player_id)
        .map_err(map_market_error)?;
    let tick = state.clock.tick();

    let (refund_credits, refund_goods) = match &cancelled {
        CancelledOrder::Book(order) | CancelledOrder::Conditional(order) => match order.side {
            OrderSide::Buy => (
                order.price.saturating_mul(i64::from(order.remaining)),
                None,
            ),
            OrderSide::Sell => (0, Some((order.resource, order.remaining))),
        },
        CancelledOrder::Twap(twap) => {
            let uninjected = twap.total.saturating_sub(twap.injected);
            match twap.side {
                OrderSide::Buy => (twap.price.saturating_mul(i64::from(uninjected)), None),
                OrderSide::Sell => (0, Some((twap.resource, uninjected))),
            }
        }
    };

    if let Some(p) = state.players.get_mut(&player_id) {
        p.inventory.credits = p.inventory.credits.saturating_add(refund_credits);
        if let Some((resource, qty)) = refund_goods {
            p.inventory.add(resource, qty);
        }
    }

    let event = Event::now(
        EventType::OrderCancelled,
        tick,
        Some(player_id.into_inner()),
        ActorKind::Player,
        json!({ "order": order_id, "refund_credits": refund_credits }),
    );
    Ok(ActionOutcome::with_event(json!({ "order": order_id }), event))
}

/// Gate an action on a minimum tier.
fn require_tier(
    state: &WorldState,
    player_id: PlayerId,
    minimum: PlayerTier,
) -> Result<(), ActionError> {
    let player = require_player(state, player_id)?;
    if player.tier < minimum {
        return Err(ActionError::Precondition(format!(
            "requires {minimum:?} tier or above"
        )));
    }
    Ok(())
}

/// Map market-crate errors onto the action error catalog.
fn map_market_error(err: MarketError) -> ActionError {
    match err {
        MarketError::OrderNotFound(_) => ActionError::NotFound("order".to_owned()),
        MarketError::NotOwner(_) => {
            ActionError::Precondition("order belongs to another player".to_owned())
        }
        MarketError::ZeroQuantity | MarketError::ZeroPrice | MarketError::BadSlice => {
            ActionError::Validation(err.to_string())
        }
    }
}
