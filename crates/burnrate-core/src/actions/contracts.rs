//! Contract actions: posting, acceptance, completion, cancellation.
//!
//! Rewards (and any early bonus) are escrowed at posting, from the
//! poster's inventory or, for faction contracts, the treasury.
//! Fulfillment is tracked as `progress` by the Supply action and the
//! shipment-arrival stage; completion releases the escrow.

use burnrate_types::{
    ActorKind, Contract, ContractId, ContractParty, ContractStatus, ContractTerms, Event,
    EventType, IntelTarget, PlayerId, ScoreCategory,
};
use serde_json::json;

use crate::actions::{ActionError, ActionOutcome, require_player};
use crate::factions::Capability;
use crate::intel;
use crate::state::WorldState;
use crate::tick::cancellation_fee;

/// Flat reputation for completing any contract.
const COMPLETION_REPUTATION: i64 = 10;

/// Points per completed contract.
const CONTRACT_POINTS: i64 = 25;

/// Total credits a contract escrows at posting.
const fn escrow_total(reward_credits: i64, early_bonus: Option<(u64, i64)>) -> i64 {
    match early_bonus {
        Some((_, bonus)) => reward_credits.saturating_add(bonus),
        None => reward_credits,
    }
}

/// Check the terms reference live entities.
fn check_terms(state: &WorldState, terms: &ContractTerms) -> Result<(), ActionError> {
    match terms {
        ContractTerms::Haul {
            from,
            to,
            quantity,
            ..
        } => {
            if *quantity == 0 {
                return Err(ActionError::Validation("haul quantity must be positive".to_owned()));
            }
            if state.graph.zone(*from).is_none() || state.graph.zone(*to).is_none() {
                return Err(ActionError::NotFound("zone".to_owned()));
            }
        }
        ContractTerms::Supply { zone, amount } => {
            if *amount == 0 {
                return Err(ActionError::Validation("supply amount must be positive".to_owned()));
            }
            if state.graph.zone(*zone).is_none() {
                return Err(ActionError::NotFound("zone".to_owned()));
            }
        }
        ContractTerms::Scout { target } => match target {
            IntelTarget::Zone(zone) => {
                if state.graph.zone(*zone).is_none() {
                    return Err(ActionError::NotFound("zone".to_owned()));
                }
            }
            IntelTarget::Route(route) => {
                if !state.graph.routes().any(|r| r.id == *route) {
                    return Err(ActionError::NotFound("route".to_owned()));
                }
            }
        },
    }
    Ok(())
}

/// Post a contract, escrowing the reward.
#[allow(clippy::too_many_arguments)]
pub fn create(
    state: &mut WorldState,
    player_id: PlayerId,
    terms: ContractTerms,
    deadline_ticks: u64,
    reward_credits: i64,
    reward_reputation: i64,
    early_bonus: Option<(u64, i64)>,
    as_faction: bool,
) -> Result<ActionOutcome, ActionError> {
    if deadline_ticks == 0 {
        return Err(ActionError::Validation("deadline must be in the future".to_owned()));
    }
    if reward_credits < 0 || reward_reputation < 0 {
        return Err(ActionError::Validation("rewards must be non-negative".to_owned()));
    }
    if let Some((_, bonus)) = early_bonus {
        if bonus <= 0 {
            return Err(ActionError::Validation("early bonus must be positive".to_owned()));
        }
    }
    check_terms(state, &terms)?;

    let escrow = escrow_total(reward_credits, early_bonus);
    let tick = state.clock.tick();

    let poster = if as_faction {
        let player = require_player(state, player_id)?;
        let faction_id = player
            .faction
            .ok_or_else(|| ActionError::Precondition("not in a faction".to_owned()))?;
        let faction = state
            .factions
            .get(&faction_id)
            .ok_or_else(|| ActionError::NotFound("faction".to_owned()))?;
        let rank = faction
            .rank_of(player_id)
            .ok_or_else(|| ActionError::Internal("membership index out of sync".to_owned()))?;
        if !crate::factions::allows(rank, Capability::PostFactionContracts) {
            return Err(ActionError::Precondition(
                "posting faction contracts requires Officer or above".to_owned(),
            ));
        }
        if faction.treasury.credits < escrow {
            return Err(ActionError::Precondition(
                "treasury cannot cover the escrow".to_owned(),
            ));
        }
        ContractParty::Faction(faction_id)
    } else {
        let player = require_player(state, player_id)?;
        if state.open_contracts_of(player_id) >= player.tier.contract_cap() {
            return Err(ActionError::Precondition(format!(
                "open contract cap of {} reached",
                player.tier.contract_cap()
            )));
        }
        if player.inventory.credits < escrow {
            return Err(ActionError::Precondition(
                "cannot cover the escrowed reward".to_owned(),
            ));
        }
        ContractParty::Player(player_id)
    };

    match poster {
        ContractParty::Player(p) => {
            if let Some(player) = state.players.get_mut(&p) {
                player.inventory.credits -= escrow;
            }
        }
        ContractParty::Faction(f) => {
            if let Some(faction) = state.factions.get_mut(&f) {
                faction.treasury.credits -= escrow;
            }
        }
    }

    let contract = Contract {
        id: ContractId::new(),
        poster,
        accepted_by: None,
        terms,
        accepted_tick: None,
        progress: 0,
        deadline_tick: tick.saturating_add(deadline_ticks),
        reward_credits,
        reward_reputation,
        early_bonus: early_bonus.map(|(dt, bonus)| (tick.saturating_add(dt), bonus)),
        status: ContractStatus::Open,
        created_tick: tick,
    };
    let contract_id = contract.id;
    state.contracts.insert(contract_id, contract);

    let event = Event::now(
        EventType::ContractCreated,
        tick,
        Some(player_id.into_inner()),
        ActorKind::Player,
        json!({ "contract": contract_id, "kind": terms.kind(), "reward_credits": reward_credits }),
    );
    Ok(ActionOutcome::with_event(json!({ "contract": contract_id }), event))
}

/// Accept an open contract.
pub fn accept(
    state: &mut WorldState,
    player_id: PlayerId,
    contract_id: ContractId,
) -> Result<ActionOutcome, ActionError> {
    let tick = state.clock.tick();
    let contract = state
        .contracts
        .get_mut(&contract_id)
        .ok_or_else(|| ActionError::NotFound("contract".to_owned()))?;
    if contract.status != ContractStatus::Open {
        return Err(ActionError::Conflict("contract is not open".to_owned()));
    }
    if matches!(contract.poster, ContractParty::Player(p) if p == player_id) {
        return Err(ActionError::Precondition(
            "cannot accept your own contract".to_owned(),
        ));
    }

    contract.status = ContractStatus::Accepted;
    contract.accepted_by = Some(player_id);
    contract.accepted_tick = Some(tick);

    let event = Event::now(
        EventType::ContractAccepted,
        tick,
        Some(player_id.into_inner()),
        ActorKind::Player,
        json!({ "contract": contract_id }),
    );
    Ok(ActionOutcome::with_event(json!({ "contract": contract_id }), event))
}

/// Whether the acceptor has met the type-specific completion criterion.
fn criterion_met(state: &WorldState, contract: &Contract, acceptor: PlayerId, tick: u64) -> bool {
    match contract.terms {
        ContractTerms::Haul { quantity, .. } => contract.progress >= quantity,
        ContractTerms::Supply { amount, .. } => contract.progress >= amount,
        ContractTerms::Scout { target } => {
            let accepted = contract.accepted_tick.unwrap_or(u64::MAX);
            state.intel.values().any(|r| {
                r.gatherer == acceptor
                    && r.target == target
                    && r.gathered_tick >= accepted
                    && intel::is_fresh(r.gathered_tick, tick)
            })
        }
    }
}

/// Complete an accepted contract: release escrow, pay the bonus when the
/// early deadline was met (otherwise it returns to the poster), award
/// reputation and score.
pub fn complete(
    state: &mut WorldState,
    player_id: PlayerId,
    contract_id: ContractId,
) -> Result<ActionOutcome, ActionError> {
    let tick = state.clock.tick();
    {
        let contract = state
            .contracts
            .get(&contract_id)
            .ok_or_else(|| ActionError::NotFound("contract".to_owned()))?;
        if contract.status != ContractStatus::Accepted {
            return Err(ActionError::Conflict("contract is not accepted".to_owned()));
        }
        if contract.accepted_by != Some(player_id) {
            return Err(ActionError::Precondition(
                "contract was accepted by another player".to_owned(),
            ));
        }
        if !criterion_met(state, contract, player_id, tick) {
            return Err(ActionError::Precondition(
                "contract terms are not yet fulfilled".to_owned(),
            ));
        }
    }

    let (payout, bonus_refund, reward_reputation, poster) = {
        let contract = state
            .contracts
            .get_mut(&contract_id)
            .ok_or_else(|| ActionError::NotFound("contract".to_owned()))?;
        contract.status = ContractStatus::Completed;
        let (payout, refund) = match contract.early_bonus {
            Some((by_tick, bonus)) if tick <= by_tick => {
                (contract.reward_credits.saturating_add(bonus), 0)
            }
            Some((_, bonus)) => (contract.reward_credits, bonus),
            None => (contract.reward_credits, 0),
        };
        (payout, refund, contract.reward_reputation, contract.poster)
    };

    if let Some(p) = state.players.get_mut(&player_id) {
        p.inventory.credits = p.inventory.credits.saturating_add(payout);
    }
    if bonus_refund > 0 {
        match poster {
            ContractParty::Player(p) => {
                if let Some(player) = state.players.get_mut(&p) {
                    player.inventory.credits = player.inventory.credits.saturating_add(bonus_refund);
                }
            }
            ContractParty::Faction(f) => {
                if let Some(faction) = state.factions.get_mut(&f) {
                    faction.treasury.credits =
                        faction.treasury.credits.saturating_add(bonus_refund);
                }
            }
        }
    }
    state.award_reputation(
        player_id,
        COMPLETION_REPUTATION.saturating_add(reward_reputation),
    );
    state.score_player(player_id, ScoreCategory::ContractsCompleted, CONTRACT_POINTS);

    let event = Event::now(
        EventType::ContractCompleted,
        tick,
        Some(player_id.into_inner()),
        ActorKind::Player,
        json!({ "contract": contract_id, "payout": payout }),
    );
    Ok(ActionOutcome::with_event(
        json!({ "contract": contract_id, "payout": payout }),
        event,
    ))
}

/// Cancel an open contract. Poster only (Officer+ for faction postings);
/// the escrow returns minus the cancellation fee.
pub fn cancel(
    state: &mut WorldState,
    player_id: PlayerId,
    contract_id: ContractId,
) -> Result<ActionOutcome, ActionError> {
    let tick = state.clock.tick();
    let (poster, escrow, fee) = {
        let contract = state
            .contracts
            .get(&contract_id)
            .ok_or_else(|| ActionError::NotFound("contract".to_owned()))?;
        if contract.status != ContractStatus::Open {
            return Err(ActionError::Conflict(
                "only open contracts can be cancelled".to_owned(),
            ));
        }
        match contract.poster {
            ContractParty::Player(p) => {
                if p != player_id {
                    return Err(ActionError::Precondition(
                        "only the poster can cancel".to_owned(),
                    ));
                }
            }
            ContractParty::Faction(f) => {
                let rank = state
                    .factions
                    .get(&f)
                    .and_then(|faction| faction.rank_of(player_id));
                let allowed = rank.is_some_and(|r| {
                    crate::factions::allows(r, Capability::PostFactionContracts)
                });
                if !allowed {
                    return Err(ActionError::Precondition(
                        "cancelling a faction contract requires Officer or above".to_owned(),
                    ));
                }
            }
        }
        let escrow = escrow_total(
            contract.reward_credits,
            contract.early_bonus.map(|(t, b)| (t, b)),
        );
        (contract.poster, escrow, cancellation_fee(contract.reward_credits))
    };

    if let Some(c) = state.contracts.get_mut(&contract_id) {
        c.status = ContractStatus::Cancelled;
    }
    let refund = escrow.saturating_sub(fee).max(0);
    match poster {
        ContractParty::Player(p) => {
            if let Some(player) = state.players.get_mut(&p) {
                player.inventory.credits = player.inventory.credits.saturating_add(refund);
            }
        }
        ContractParty::Faction(f) => {
            if let Some(faction) = state.factions.get_mut(&f) {
                faction.treasury.credits = faction.treasury.credits.saturating_add(refund);
            }
        }
    }

    let event = Event::now(
        EventType::ContractCancelled,
        tick,
        Some(player_id.into_inner()),
        ActorKind::Player,
        json!({ "contract": contract_id, "refund": refund }),
    );
    Ok(ActionOutcome::with_event(json!({ "contract": contract_id }), event))
}
