//! The ordered per-tick pipeline.
//!
//! Each tick runs these stages sequentially over the in-memory world,
//! with no interleaved player actions (the caller holds the world's
//! write guard for the whole run):
//!
//! 1. **Maintenance** -- units charge upkeep; insolvent owners lose their
//!    oldest units until the balance recovers.
//! 2. **Shipment movement** -- hop counters tick down; expiring hops
//!    resolve interception, then arrival or the next leg.
//! 3. **Production** -- factory capacity refills (production itself is
//!    action-initiated).
//! 4. **Supply burn** -- owned zones pay burn from their SU stockpile;
//!    zones that run dry collapse to neutral.
//! 5. **Stockpile decay** -- medkits and comms age out.
//! 6. **TWAP progression** -- per-tick slices enter the books.
//! 7. **Conditional arming** -- triggered conditionals enter the books.
//! 8. **Matching** -- books match; trades settle credits and cargo.
//! 9. **Contract expiry** -- overdue contracts expire, escrow refunds
//!    minus the cancellation fee.
//! 10. **Zone income** -- owners collect, split among active members;
//!     zone-control scores recompute.
//! 11. **Intel sweep** -- every 50 ticks, reports past the deletion age
//!     are hard-removed.
//! 12. **Season progression** -- an expired season triggers the reset.
//!
//! Webhook dispatch (13) and the storage commit (14) happen in the engine
//! after this function returns; a storage failure there discards the
//! whole tick, and because every stage is a pure function of the starting
//! state, re-running the tick reproduces the same result.

use burnrate_types::{
    ActorKind, ContractParty, ContractStatus, ContractTerms, Event, EventType, ScoreCategory,
    ShipmentStatus, UnitAssignment,
};
use rust_decimal::Decimal;
use serde_json::json;

use crate::clock::ClockError;
use crate::intel;
use crate::intercept::{self, HopContext, HopOutcome};
use crate::prng;
use crate::season;
use crate::state::WorldState;

/// Reputation delta on a delivered shipment.
const ARRIVAL_REPUTATION: i64 = 5;

/// Reputation delta on a lost shipment.
const INTERCEPTION_REPUTATION: i64 = -10;

/// Points per delivered shipment.
const SHIPMENT_POINTS: i64 = 10;

/// Points per combat victory.
const COMBAT_VICTORY_POINTS: i64 = 50;

/// Cancellation fee fraction charged when a contract expires or is
/// withdrawn: one tenth of the credit reward, floor one credit.
pub const fn cancellation_fee(reward_credits: i64) -> i64 {
    let fee = reward_credits / 10;
    if fee < 1 { 1 } else { fee }
}

/// Errors that abort a tick.
#[derive(Debug, thiserror::Error)]
pub enum TickError {
    /// The clock could not advance.
    #[error("clock error: {source}")]
    Clock {
        /// The underlying clock error.
        #[from]
        source: ClockError,
    },
}

/// Summary of one executed tick.
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct TickReport {
    /// The tick that was executed.
    pub tick: u64,
    /// Season during the tick.
    pub season: u32,
    /// Trades settled by the matching stage.
    pub trades: usize,
    /// Shipments that arrived.
    pub shipments_arrived: u32,
    /// Shipments lost to interception.
    pub shipments_intercepted: u32,
    /// Zones that collapsed to neutral.
    pub zones_collapsed: u32,
    /// Contracts that expired.
    pub contracts_expired: u32,
    /// Units deleted by maintenance starvation or combat.
    pub units_lost: u32,
    /// Whether the season reset fired at the end of this tick.
    pub season_reset: bool,
}

/// Execute one complete tick over the world state.
///
/// # Errors
///
/// Returns [`TickError`] if the clock cannot advance. All other stages
/// are total over valid state.
pub fn run_tick(state: &mut WorldState) -> Result<TickReport, TickError> {
    let tick = state.clock.advance()?;
    let mut report = TickReport {
        tick,
        season: state.clock.season(),
        ..TickReport::default()
    };
    let mut events: Vec<Event> = Vec::new();

    tracing::info!(tick, season = report.season, "tick started");

    stage_maintenance(state, tick, &mut events, &mut report);
    stage_shipments(state, tick, &mut events, &mut report);
    stage_production(state);
    stage_supply_burn(state, tick, &mut events, &mut report);
    stage_stockpile_decay(state, tick);
    let _ = state.market.progress_twaps(tick);
    let armed = state.market.arm_conditionals();
    if !armed.is_empty() {
        tracing::debug!(tick, count = armed.len(), "conditional orders armed");
    }
    stage_matching(state, tick, &mut events, &mut report);
    stage_contract_expiry(state, tick, &mut events, &mut report);
    stage_zone_income(state, tick);
    season::recompute_zone_control(state);
    stage_intel_sweep(state, tick);

    if state.clock.season_expired() {
        events.push(season::apply_reset(state));
        report.season_reset = true;
    }

    events.push(Event::now(
        EventType::TickCompleted,
        tick,
        None,
        ActorKind::System,
        json!({
            "trades": report.trades,
            "shipments_arrived": report.shipments_arrived,
            "shipments_intercepted": report.shipments_intercepted,
            "zones_collapsed": report.zones_collapsed,
        }),
    ));
    state.record_events(events);

    tracing::info!(
        tick,
        trades = report.trades,
        arrived = report.shipments_arrived,
        intercepted = report.shipments_intercepted,
        collapsed = report.zones_collapsed,
        "tick completed"
    );
    Ok(report)
}

/// Stage 1: charge unit maintenance; liquidate the oldest units of any
/// owner driven below zero until the balance is non-negative again (each
/// liquidated unit's charge for this tick is forgiven).
fn stage_maintenance(
    state: &mut WorldState,
    tick: u64,
    events: &mut Vec<Event>,
    report: &mut TickReport,
) {
    let charges: Vec<(burnrate_types::PlayerId, i64)> = state
        .units
        .values()
        .map(|u| (u.owner, u.maintenance))
        .collect();
    for (owner, maintenance) in charges {
        if let Some(player) = state.players.get_mut(&owner) {
            player.inventory.credits -= maintenance;
        }
    }

    let insolvent: Vec<burnrate_types::PlayerId> = state
        .players
        .values()
        .filter(|p| p.inventory.credits < 0)
        .map(|p| p.id)
        .collect();

    for owner in insolvent {
        for unit_id in state.units_of_player(owner) {
            let balance = state
                .players
                .get(&owner)
                .map_or(0, |p| p.inventory.credits);
            if balance >= 0 {
                break;
            }
            if let Some(unit) = state.units.remove(&unit_id) {
                detach_unit(state, &unit);
                if let Some(player) = state.players.get_mut(&owner) {
                    player.inventory.credits += unit.maintenance;
                }
                report.units_lost += 1;
                events.push(Event::now(
                    EventType::UnitDisbanded,
                    tick,
                    Some(owner.into_inner()),
                    ActorKind::System,
                    json!({ "unit": unit.id, "reason": "maintenance" }),
                ));
            }
        }
        // Whatever debt remains after every unit is gone is written off;
        // no invariant allows a persisted negative balance.
        if let Some(player) = state.players.get_mut(&owner) {
            if player.inventory.credits < 0 {
                player.inventory.credits = 0;
            }
        }
    }
}

/// Remove a deleted unit from any shipment escort list.
fn detach_unit(state: &mut WorldState, unit: &burnrate_types::Unit) {
    if let Some(UnitAssignment::Escort(shipment_id)) = unit.assignment {
        if let Some(shipment) = state.shipments.get_mut(&shipment_id) {
            shipment.escorts.retain(|e| *e != unit.id);
        }
    }
}

/// Stage 2: advance every in-transit shipment by one tick, resolving
/// interception on hops that complete.
fn stage_shipments(
    state: &mut WorldState,
    tick: u64,
    events: &mut Vec<Event>,
    report: &mut TickReport,
) {
    for shipment_id in state.in_transit_shipments() {
        let Some(shipment) = state.shipments.get_mut(&shipment_id) else {
            continue;
        };
        shipment.ticks_to_next = shipment.ticks_to_next.saturating_sub(1);
        if shipment.ticks_to_next > 0 {
            continue;
        }
        resolve_hop_completion(state, shipment_id, tick, events, report);
    }
}

/// A hop has completed: resolve interception on the traversed edge, then
/// either advance the shipment or mark it intercepted.
fn resolve_hop_completion(
    state: &mut WorldState,
    shipment_id: burnrate_types::ShipmentId,
    tick: u64,
    events: &mut Vec<Event>,
    report: &mut TickReport,
) {
    let Some(shipment) = state.shipments.get(&shipment_id) else {
        return;
    };
    let hop_index = shipment.position;
    let (Some(from), Some(to)) = (shipment.current_zone(), shipment.next_zone()) else {
        return;
    };
    let Some(route) = state.graph.route_between(from, to) else {
        // Path legality is validated at launch; a missing edge means the
        // world changed out from under us. Write the shipment off.
        tracing::warn!(shipment = %shipment_id, "route vanished mid-transit");
        if let Some(s) = state.shipments.get_mut(&shipment_id) {
            s.status = ShipmentStatus::Lost;
        }
        return;
    };
    let route_id = route.id;

    let escort_strength: u32 = shipment
        .escorts
        .iter()
        .filter_map(|id| state.units.get(id))
        .map(|u| u.strength)
        .fold(0, u32::saturating_add);

    let raider = state
        .raiders_on_route(route_id)
        .into_iter()
        .max_by_key(|u| (u.strength, u.id))
        .map(|u| {
            let fresh = state.has_fresh_route_intel(u.owner, route_id, tick);
            (u.id, u.strength, fresh, u.owner)
        });

    let (from_zone_comms, from_zone_medkits) = state
        .graph
        .zone(from)
        .map_or((0, 0), |z| (z.comms_stockpile, z.medkit_stockpile));

    let ctx = HopContext {
        base_risk: decimal_to_f64(route.base_risk),
        chokepoint: decimal_to_f64(route.chokepoint),
        kind: shipment.kind,
        escort_strength,
        raider: raider.map(|(id, strength, fresh, _)| (id, strength, fresh)),
        comms_stockpile: from_zone_comms,
        medkit_stockpile: from_zone_medkits,
    };

    let mut rng = prng::hop_rng(shipment_id, tick, hop_index);
    match intercept::resolve_hop(&ctx, &mut rng) {
        HopOutcome::Clear => advance_shipment(state, shipment_id, tick, events, report),
        HopOutcome::Intercepted {
            outcome,
            cargo_loss_pct,
            attacker_unit_lost,
        } => {
            let owner = shipment.owner;
            events.push(Event::now(
                EventType::ShipmentIntercepted,
                tick,
                Some(owner.into_inner()),
                ActorKind::System,
                json!({
                    "shipment": shipment_id,
                    "route": route_id,
                    "outcome": outcome,
                    "cargo_loss_pct": cargo_loss_pct,
                }),
            ));

            match cargo_loss_pct {
                100 => {
                    if let Some(s) = state.shipments.get_mut(&shipment_id) {
                        s.cargo.clear();
                        s.status = ShipmentStatus::Intercepted;
                    }
                    state.award_reputation(owner, INTERCEPTION_REPUTATION);
                    report.shipments_intercepted += 1;
                    if let Some((_, _, _, raider_owner)) = raider {
                        state.score_player(
                            raider_owner,
                            ScoreCategory::CombatVictories,
                            COMBAT_VICTORY_POINTS,
                        );
                    }
                    if attacker_unit_lost {
                        if let Some((raider_id, _, _, raider_owner)) = raider {
                            if let Some(unit) = state.units.remove(&raider_id) {
                                detach_unit(state, &unit);
                                report.units_lost += 1;
                                events.push(Event::now(
                                    EventType::UnitDisbanded,
                                    tick,
                                    Some(raider_owner.into_inner()),
                                    ActorKind::System,
                                    json!({ "unit": raider_id, "reason": "combat" }),
                                ));
                            }
                        }
                    }
                }
                50 => {
                    if let Some(s) = state.shipments.get_mut(&shipment_id) {
                        for qty in s.cargo.values_mut() {
                            *qty -= *qty / 2;
                        }
                        s.cargo.retain(|_, q| *q > 0);
                    }
                    advance_shipment(state, shipment_id, tick, events, report);
                }
                _ => advance_shipment(state, shipment_id, tick, events, report),
            }
        }
    }
}

/// Move a surviving shipment one position forward; deliver on the final
/// index, otherwise arm the next leg's counter.
fn advance_shipment(
    state: &mut WorldState,
    shipment_id: burnrate_types::ShipmentId,
    tick: u64,
    events: &mut Vec<Event>,
    report: &mut TickReport,
) {
    let Some(shipment) = state.shipments.get_mut(&shipment_id) else {
        return;
    };
    shipment.position += 1;

    if shipment.position + 1 >= shipment.path.len() {
        let owner = shipment.owner;
        let destination = shipment.path.last().copied();
        let origin = shipment.path.first().copied();
        let cargo = std::mem::take(&mut shipment.cargo);
        shipment.status = ShipmentStatus::Arrived;

        if let Some(dest) = destination {
            if let Some(zone) = state.graph.zone_mut(dest) {
                for (resource, qty) in &cargo {
                    let slot = zone.inventory.entry(*resource).or_insert(0);
                    *slot = slot.saturating_add(*qty);
                }
            }
            // Haul contract progress for the shipment's owner.
            credit_haul_progress(state, owner, origin, dest, &cargo);
        }

        state.award_reputation(owner, ARRIVAL_REPUTATION);
        state.score_player(owner, ScoreCategory::ShipmentsCompleted, SHIPMENT_POINTS);
        report.shipments_arrived += 1;
        events.push(Event::now(
            EventType::ShipmentArrived,
            tick,
            Some(owner.into_inner()),
            ActorKind::System,
            json!({ "shipment": shipment_id, "destination": destination, "cargo": cargo }),
        ));
    } else {
        let from = shipment.current_zone();
        let to = shipment.next_zone();
        let distance = match (from, to) {
            (Some(f), Some(t)) => state
                .graph
                .route_between(f, t)
                .map_or(1, |r| r.distance_ticks),
            _ => 1,
        };
        if let Some(s) = state.shipments.get_mut(&shipment_id) {
            s.ticks_to_next = distance;
        }
    }
}

/// Advance accepted Haul contracts held by `owner` that match this
/// delivery's origin and destination.
fn credit_haul_progress(
    state: &mut WorldState,
    owner: burnrate_types::PlayerId,
    origin: Option<burnrate_types::ZoneId>,
    destination: burnrate_types::ZoneId,
    cargo: &std::collections::BTreeMap<burnrate_types::Resource, u32>,
) {
    for contract in state.contracts.values_mut() {
        if contract.status != ContractStatus::Accepted || contract.accepted_by != Some(owner) {
            continue;
        }
        if let ContractTerms::Haul {
            from,
            to,
            resource,
            ..
        } = contract.terms
        {
            if Some(from) == origin && to == destination {
                if let Some(delivered) = cargo.get(&resource) {
                    contract.progress = contract.progress.saturating_add(*delivered);
                }
            }
        }
    }
}

/// Stage 3: factories refill their per-tick production capacity.
/// Production itself is action-initiated, so this is the whole stage.
fn stage_production(state: &mut WorldState) {
    for zone in state.graph.zones_mut() {
        if matches!(zone.kind, burnrate_types::ZoneKind::Factory) {
            zone.production_capacity = 50;
        }
    }
}

/// Stage 4: owned zones pay burn. A zone that cannot fully pay runs dry:
/// supply level 0, Collapsed, owner cleared. A zone that pays keeps a
/// saturated 100% supply level and extends its compliance streak.
fn stage_supply_burn(
    state: &mut WorldState,
    tick: u64,
    events: &mut Vec<Event>,
    report: &mut TickReport,
) {
    for zone in state.graph.zones_mut() {
        let Some(owner) = zone.owner else { continue };
        let burn = zone.kind.burn_rate();
        if burn == 0 {
            // No burn means the zone is trivially fully supplied.
            zone.supply_level = Decimal::ONE_HUNDRED;
            zone.compliance_streak = zone.compliance_streak.saturating_add(1);
            continue;
        }

        let before = zone.su_stockpile;
        if before < burn {
            zone.su_stockpile = 0;
            zone.supply_level = Decimal::ZERO;
            zone.compliance_streak = 0;
            zone.collapsed = true;
            zone.owner = None;
            report.zones_collapsed += 1;
            events.push(Event::now(
                EventType::ZoneCollapsed,
                tick,
                Some(owner.into_inner()),
                ActorKind::Faction,
                json!({ "zone": zone.id, "previous_owner": owner }),
            ));
        } else {
            zone.su_stockpile = before - burn;
            // supply_level = 100 * (after + burn) / burn, saturated at 100.
            let level = (u64::from(before) * 100 / u64::from(burn)).min(100);
            zone.supply_level = Decimal::from(level);
            if level >= 100 {
                zone.compliance_streak = zone.compliance_streak.saturating_add(1);
            } else {
                zone.compliance_streak = 0;
            }
        }
    }
}

/// Stage 5: medkits age out one per 10 ticks, comms one per 20, never
/// below zero.
fn stage_stockpile_decay(state: &mut WorldState, tick: u64) {
    let decay_medkits = tick % 10 == 0;
    let decay_comms = tick % 20 == 0;
    if !decay_medkits && !decay_comms {
        return;
    }
    for zone in state.graph.zones_mut() {
        if decay_medkits {
            zone.medkit_stockpile = zone.medkit_stockpile.saturating_sub(1);
        }
        if decay_comms {
            zone.comms_stockpile = zone.comms_stockpile.saturating_sub(1);
        }
    }
}

/// Stage 8: run matching, then settle every trade: cargo to the buyer,
/// credits to the seller, and the taker-price improvement refunded to the
/// buyer out of escrow.
fn stage_matching(
    state: &mut WorldState,
    tick: u64,
    events: &mut Vec<Event>,
    report: &mut TickReport,
) {
    let trades = state.market.match_all();
    report.trades = trades.len();

    for trade in trades {
        let proceeds = trade.price.saturating_mul(i64::from(trade.quantity));
        let refund = trade
            .buyer_limit
            .saturating_sub(trade.price)
            .saturating_mul(i64::from(trade.quantity));

        if let Some(seller) = state.players.get_mut(&trade.seller) {
            seller.inventory.credits = seller.inventory.credits.saturating_add(proceeds);
        }
        if let Some(buyer) = state.players.get_mut(&trade.buyer) {
            buyer.inventory.add(trade.resource, trade.quantity);
            buyer.inventory.credits = buyer.inventory.credits.saturating_add(refund);
        }

        events.push(Event::now(
            EventType::TradeExecuted,
            tick,
            Some(trade.buyer.into_inner()),
            ActorKind::Player,
            json!({
                "zone": trade.zone,
                "resource": trade.resource,
                "price": trade.price,
                "quantity": trade.quantity,
                "buyer": trade.buyer,
                "seller": trade.seller,
            }),
        ));
    }
}

/// Stage 9: expire overdue contracts. The poster recovers escrow minus
/// the cancellation fee.
fn stage_contract_expiry(
    state: &mut WorldState,
    tick: u64,
    events: &mut Vec<Event>,
    report: &mut TickReport,
) {
    let expired: Vec<burnrate_types::ContractId> = state
        .contracts
        .values()
        .filter(|c| {
            matches!(c.status, ContractStatus::Open | ContractStatus::Accepted)
                && c.deadline_tick <= tick
        })
        .map(|c| c.id)
        .collect();

    for id in expired {
        let Some(contract) = state.contracts.get_mut(&id) else {
            continue;
        };
        contract.status = ContractStatus::Expired;
        let escrow = contract
            .reward_credits
            .saturating_add(contract.early_bonus.map_or(0, |(_, bonus)| bonus));
        let refund = escrow.saturating_sub(cancellation_fee(contract.reward_credits)).max(0);
        let poster = contract.poster;

        match poster {
            ContractParty::Player(player) => {
                if let Some(p) = state.players.get_mut(&player) {
                    p.inventory.credits = p.inventory.credits.saturating_add(refund);
                }
            }
            ContractParty::Faction(faction) => {
                if let Some(f) = state.factions.get_mut(&faction) {
                    f.treasury.credits = f.treasury.credits.saturating_add(refund);
                }
            }
        }

        report.contracts_expired += 1;
        events.push(Event::now(
            EventType::ContractExpired,
            tick,
            None,
            ActorKind::System,
            json!({ "contract": id, "refund": refund }),
        ));
    }
}

/// Stage 10: owners collect per-tick zone income, split equally among
/// members active within the last quota day; the remainder (and the
/// whole sum when nobody is active) goes to the treasury.
fn stage_zone_income(state: &mut WorldState, tick: u64) {
    let ticks_per_day = state.clock.ticks_per_day();
    let mut incomes: std::collections::BTreeMap<burnrate_types::FactionId, i64> =
        std::collections::BTreeMap::new();
    for zone in state.graph.zones() {
        if let Some(owner) = zone.owner {
            let income = zone.kind.income();
            if income > 0 {
                *incomes.entry(owner).or_insert(0) += income;
            }
        }
    }

    for (faction_id, income) in incomes {
        let Some(faction) = state.factions.get(&faction_id) else {
            continue;
        };
        let active: Vec<burnrate_types::PlayerId> = faction
            .members
            .iter()
            .filter(|m| {
                state.players.get(&m.player).is_some_and(|p| {
                    tick.saturating_sub(p.last_action_tick) < ticks_per_day
                })
            })
            .map(|m| m.player)
            .collect();

        let share = if active.is_empty() {
            0
        } else {
            income / i64::try_from(active.len()).unwrap_or(i64::MAX)
        };
        let distributed = share.saturating_mul(i64::try_from(active.len()).unwrap_or(0));

        for player_id in &active {
            if let Some(player) = state.players.get_mut(player_id) {
                player.inventory.credits = player.inventory.credits.saturating_add(share);
            }
        }
        if let Some(faction) = state.factions.get_mut(&faction_id) {
            faction.treasury.credits = faction
                .treasury
                .credits
                .saturating_add(income.saturating_sub(distributed));
        }
    }
}

/// Stage 11: hard-delete intel past the deletion age, every 50 ticks.
fn stage_intel_sweep(state: &mut WorldState, tick: u64) {
    if tick % intel::SWEEP_INTERVAL != 0 {
        return;
    }
    let before = state.intel.len();
    state
        .intel
        .retain(|_, r| !intel::should_delete(r.gathered_tick, tick));
    let removed = before - state.intel.len();
    if removed > 0 {
        tracing::debug!(tick, removed, "intel sweep");
    }
}

/// Convert a game Decimal to f64 for the interception math.
fn decimal_to_f64(value: Decimal) -> f64 {
    use rust_decimal::prelude::ToPrimitive;
    value.to_f64().unwrap_or(0.0)
}
