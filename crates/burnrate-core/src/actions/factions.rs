//! Faction lifecycle, rank management, treasury, relations, and doctrine
//! actions.
//!
//! Rank gates come from the permission matrix in [`crate::factions`];
//! handlers here only add the state transitions around it.

use std::collections::BTreeMap;

use burnrate_types::{
    ActorKind, Doctrine, DoctrineId, Event, EventType, Faction, FactionId, FactionMember,
    FactionRank, FactionRelation, Inventory, PlayerId, Resource,
};
use serde_json::json;

use crate::actions::{ActionError, ActionOutcome, require_player};
use crate::factions::{self, Capability};
use crate::state::WorldState;

/// Default daily treasury withdraw limit for Officers, in credits.
const DEFAULT_OFFICER_DAILY_WITHDRAW: i64 = 1_000;

/// Maximum doctrine body length.
const DOCTRINE_BODY_MAX: usize = 4_000;

/// Resolve the acting player's faction and rank.
fn membership(
    state: &WorldState,
    player_id: PlayerId,
) -> Result<(FactionId, FactionRank), ActionError> {
    let player = require_player(state, player_id)?;
    let faction_id = player
        .faction
        .ok_or_else(|| ActionError::Precondition("not in a faction".to_owned()))?;
    let rank = state
        .factions
        .get(&faction_id)
        .and_then(|f| f.rank_of(player_id))
        .ok_or_else(|| ActionError::Internal("membership index out of sync".to_owned()))?;
    Ok((faction_id, rank))
}

/// Gate on a capability, resolving membership first.
fn require_capability(
    state: &WorldState,
    player_id: PlayerId,
    capability: Capability,
) -> Result<(FactionId, FactionRank), ActionError> {
    let (faction_id, rank) = membership(state, player_id)?;
    if !factions::allows(rank, capability) {
        return Err(ActionError::Precondition(
            "your rank does not permit this".to_owned(),
        ));
    }
    Ok((faction_id, rank))
}

/// Found a faction with the acting player as Founder.
pub fn create(
    state: &mut WorldState,
    player_id: PlayerId,
    name: &str,
    tag: &str,
) -> Result<ActionOutcome, ActionError> {
    let name = name.trim();
    let tag = tag.trim().to_uppercase();
    if name.len() < 3 || name.len() > 32 {
        return Err(ActionError::Validation(
            "faction name must be 3-32 characters".to_owned(),
        ));
    }
    if tag.len() < 2 || tag.len() > 5 {
        return Err(ActionError::Validation(
            "faction tag must be 2-5 characters".to_owned(),
        ));
    }
    let player = require_player(state, player_id)?;
    if player.faction.is_some() {
        return Err(ActionError::Conflict("already in a faction".to_owned()));
    }
    let clash = state
        .factions
        .values()
        .any(|f| f.name.eq_ignore_ascii_case(name) || f.tag == tag);
    if clash {
        return Err(ActionError::Conflict(
            "faction name or tag already taken".to_owned(),
        ));
    }

    let tick = state.clock.tick();
    let faction = Faction {
        id: FactionId::new(),
        name: name.to_owned(),
        tag: tag.clone(),
        founder: player_id,
        treasury: Inventory::default(),
        officer_daily_withdraw: DEFAULT_OFFICER_DAILY_WITHDRAW,
        doctrines: BTreeMap::new(),
        upgrades: BTreeMap::new(),
        relations: BTreeMap::new(),
        members: vec![FactionMember {
            player: player_id,
            rank: FactionRank::Founder,
            joined_tick: tick,
        }],
        withdrawals: BTreeMap::new(),
        created_tick: tick,
    };
    let faction_id = faction.id;
    state.factions.insert(faction_id, faction);
    if let Some(p) = state.players.get_mut(&player_id) {
        p.faction = Some(faction_id);
    }

    let event = Event::now(
        EventType::FactionCreated,
        tick,
        Some(player_id.into_inner()),
        ActorKind::Player,
        json!({ "faction": faction_id, "name": name, "tag": tag }),
    );
    Ok(ActionOutcome::with_event(
        json!({ "faction": faction_id, "name": name, "tag": tag }),
        event,
    ))
}

/// Join an existing faction as a Member.
pub fn join(
    state: &mut WorldState,
    player_id: PlayerId,
    faction_id: FactionId,
) -> Result<ActionOutcome, ActionError> {
    let player = require_player(state, player_id)?;
    if player.faction.is_some() {
        return Err(ActionError::Conflict("already in a faction".to_owned()));
    }
    if !state.factions.contains_key(&faction_id) {
        return Err(ActionError::NotFound("faction".to_owned()));
    }

    let tick = state.clock.tick();
    if let Some(f) = state.factions.get_mut(&faction_id) {
        f.members.push(FactionMember {
            player: player_id,
            rank: FactionRank::Member,
            joined_tick: tick,
        });
    }
    if let Some(p) = state.players.get_mut(&player_id) {
        p.faction = Some(faction_id);
    }

    let event = Event::now(
        EventType::FactionJoined,
        tick,
        Some(player_id.into_inner()),
        ActorKind::Player,
        json!({ "faction": faction_id }),
    );
    Ok(ActionOutcome::with_event(json!({ "faction": faction_id }), event))
}

/// Leave the current faction. The Founder must transfer leadership first.
pub fn leave(state: &mut WorldState, player_id: PlayerId) -> Result<ActionOutcome, ActionError> {
    let (faction_id, rank) = membership(state, player_id)?;
    if rank == FactionRank::Founder {
        return Err(ActionError::Precondition(
            "the founder must transfer leadership before leaving".to_owned(),
        ));
    }

    let tick = state.clock.tick();
    if let Some(f) = state.factions.get_mut(&faction_id) {
        f.members.retain(|m| m.player != player_id);
    }
    if let Some(p) = state.players.get_mut(&player_id) {
        p.faction = None;
    }

    let event = Event::now(
        EventType::FactionLeft,
        tick,
        Some(player_id.into_inner()),
        ActorKind::Player,
        json!({ "faction": faction_id }),
    );
    Ok(ActionOutcome::with_event(json!({ "faction": faction_id }), event))
}

/// Promote a Member to Officer. Founder only.
pub fn promote(
    state: &mut WorldState,
    player_id: PlayerId,
    target: PlayerId,
) -> Result<ActionOutcome, ActionError> {
    let (faction_id, _) = require_capability(state, player_id, Capability::ManageOfficers)?;
    let tick = state.clock.tick();

    let faction = state
        .factions
        .get_mut(&faction_id)
        .ok_or_else(|| ActionError::NotFound("faction".to_owned()))?;
    let member = faction
        .members
        .iter_mut()
        .find(|m| m.player == target)
        .ok_or_else(|| ActionError::NotFound("member".to_owned()))?;
    if member.rank != FactionRank::Member {
        return Err(ActionError::Conflict("only Members can be promoted".to_owned()));
    }
    member.rank = FactionRank::Officer;

    let event = Event::now(
        EventType::MemberPromoted,
        tick,
        Some(player_id.into_inner()),
        ActorKind::Player,
        json!({ "faction": faction_id, "member": target, "rank": FactionRank::Officer }),
    );
    Ok(ActionOutcome::with_event(
        json!({ "member": target, "rank": FactionRank::Officer }),
        event,
    ))
}

/// Demote an Officer to Member. Founder only.
pub fn demote(
    state: &mut WorldState,
    player_id: PlayerId,
    target: PlayerId,
) -> Result<ActionOutcome, ActionError> {
    let (faction_id, _) = require_capability(state, player_id, Capability::ManageOfficers)?;
    let tick = state.clock.tick();

    let faction = state
        .factions
        .get_mut(&faction_id)
        .ok_or_else(|| ActionError::NotFound("faction".to_owned()))?;
    let member = faction
        .members
        .iter_mut()
        .find(|m| m.player == target)
        .ok_or_else(|| ActionError::NotFound("member".to_owned()))?;
    if member.rank != FactionRank::Officer {
        return Err(ActionError::Conflict("only Officers can be demoted".to_owned()));
    }
    member.rank = FactionRank::Member;

    let event = Event::now(
        EventType::MemberDemoted,
        tick,
        Some(player_id.into_inner()),
        ActorKind::Player,
        json!({ "faction": faction_id, "member": target, "rank": FactionRank::Member }),
    );
    Ok(ActionOutcome::with_event(
        json!({ "member": target, "rank": FactionRank::Member }),
        event,
    ))
}

/// Kick a member. Officers can kick Members; kicking an Officer requires
/// the Founder.
pub fn kick(
    state: &mut WorldState,
    player_id: PlayerId,
    target: PlayerId,
) -> Result<ActionOutcome, ActionError> {
    let (faction_id, actor_rank) = require_capability(state, player_id, Capability::ManageMembers)?;
    if target == player_id {
        return Err(ActionError::Validation("cannot kick yourself".to_owned()));
    }
    let tick = state.clock.tick();

    let faction = state
        .factions
        .get(&faction_id)
        .ok_or_else(|| ActionError::NotFound("faction".to_owned()))?;
    let target_rank = faction
        .rank_of(target)
        .ok_or_else(|| ActionError::NotFound("member".to_owned()))?;
    if target_rank == FactionRank::Founder {
        return Err(ActionError::Precondition("the founder cannot be kicked".to_owned()));
    }
    if target_rank == FactionRank::Officer && actor_rank != FactionRank::Founder {
        return Err(ActionError::Precondition(
            "kicking an officer requires the founder".to_owned(),
        ));
    }

    if let Some(f) = state.factions.get_mut(&faction_id) {
        f.members.retain(|m| m.player != target);
    }
    if let Some(p) = state.players.get_mut(&target) {
        p.faction = None;
    }

    let event = Event::now(
        EventType::MemberKicked,
        tick,
        Some(player_id.into_inner()),
        ActorKind::Player,
        json!({ "faction": faction_id, "member": target }),
    );
    Ok(ActionOutcome::with_event(json!({ "member": target }), event))
}

/// Transfer the Founder rank. The previous Founder becomes an Officer in
/// the same step.
pub fn transfer(
    state: &mut WorldState,
    player_id: PlayerId,
    to: PlayerId,
) -> Result<ActionOutcome, ActionError> {
    let (faction_id, _) =
        require_capability(state, player_id, Capability::TransferLeadership)?;
    let tick = state.clock.tick();

    let faction = state
        .factions
        .get_mut(&faction_id)
        .ok_or_else(|| ActionError::NotFound("faction".to_owned()))?;
    if !factions::transfer_leadership(faction, to) {
        return Err(ActionError::NotFound("member".to_owned()));
    }

    let event = Event::now(
        EventType::LeadershipTransferred,
        tick,
        Some(player_id.into_inner()),
        ActorKind::Player,
        json!({ "faction": faction_id, "from": player_id, "to": to }),
    );
    Ok(ActionOutcome::with_event(
        json!({ "faction": faction_id, "founder": to }),
        event,
    ))
}

/// Deposit credits and goods into the treasury. Any member.
pub fn treasury_deposit(
    state: &mut WorldState,
    player_id: PlayerId,
    credits: i64,
    goods: &BTreeMap<Resource, u32>,
) -> Result<ActionOutcome, ActionError> {
    if credits < 0 {
        return Err(ActionError::Validation("credits must be non-negative".to_owned()));
    }
    if credits == 0 && goods.is_empty() {
        return Err(ActionError::Validation("nothing to deposit".to_owned()));
    }
    let (faction_id, _) = require_capability(state, player_id, Capability::DepositTreasury)?;

    let player = require_player(state, player_id)?;
    if player.inventory.credits < credits {
        return Err(ActionError::Precondition("insufficient credits".to_owned()));
    }
    if !player.inventory.has_all(goods) {
        return Err(ActionError::Precondition("insufficient goods".to_owned()));
    }

    let tick = state.clock.tick();
    if let Some(p) = state.players.get_mut(&player_id) {
        p.inventory.credits -= credits;
        let _ = p.inventory.remove_all(goods);
    }
    if let Some(f) = state.factions.get_mut(&faction_id) {
        f.treasury.credits = f.treasury.credits.saturating_add(credits);
        f.treasury.add_all(goods);
    }

    let event = Event::now(
        EventType::TreasuryDeposited,
        tick,
        Some(player_id.into_inner()),
        ActorKind::Player,
        json!({ "faction": faction_id, "credits": credits, "goods": goods }),
    );
    Ok(ActionOutcome::with_event(json!({ "credits": credits }), event))
}

/// Withdraw credits and goods from the treasury. Officer and above;
/// Officers are bounded by the faction's daily credit limit.
pub fn treasury_withdraw(
    state: &mut WorldState,
    player_id: PlayerId,
    credits: i64,
    goods: &BTreeMap<Resource, u32>,
) -> Result<ActionOutcome, ActionError> {
    if credits < 0 {
        return Err(ActionError::Validation("credits must be non-negative".to_owned()));
    }
    if credits == 0 && goods.is_empty() {
        return Err(ActionError::Validation("nothing to withdraw".to_owned()));
    }
    let (faction_id, rank) =
        require_capability(state, player_id, Capability::WithdrawTreasury)?;
    let day = state.clock.day_of(state.clock.tick());

    let faction = state
        .factions
        .get(&faction_id)
        .ok_or_else(|| ActionError::NotFound("faction".to_owned()))?;
    factions::check_withdrawal(faction, player_id, rank, credits, day)
        .map_err(|e| ActionError::Precondition(e.to_string()))?;
    if !faction.treasury.has_all(goods) {
        return Err(ActionError::Precondition(
            "treasury holds insufficient goods".to_owned(),
        ));
    }

    let tick = state.clock.tick();
    if let Some(f) = state.factions.get_mut(&faction_id) {
        f.treasury.credits -= credits;
        let _ = f.treasury.remove_all(goods);
        if credits > 0 {
            factions::record_withdrawal(f, player_id, credits, day);
        }
    }
    if let Some(p) = state.players.get_mut(&player_id) {
        p.inventory.credits = p.inventory.credits.saturating_add(credits);
        p.inventory.add_all(goods);
    }

    let event = Event::now(
        EventType::TreasuryWithdrawn,
        tick,
        Some(player_id.into_inner()),
        ActorKind::Player,
        json!({ "faction": faction_id, "credits": credits, "goods": goods }),
    );
    Ok(ActionOutcome::with_event(json!({ "credits": credits }), event))
}

/// Set the diplomatic stance toward another faction. Founder only.
pub fn set_relation(
    state: &mut WorldState,
    player_id: PlayerId,
    other: FactionId,
    relation: FactionRelation,
) -> Result<ActionOutcome, ActionError> {
    let (faction_id, _) = require_capability(state, player_id, Capability::EditSettings)?;
    if other == faction_id {
        return Err(ActionError::Validation(
            "cannot set a stance toward yourself".to_owned(),
        ));
    }
    if !state.factions.contains_key(&other) {
        return Err(ActionError::NotFound("faction".to_owned()));
    }

    let tick = state.clock.tick();
    if let Some(f) = state.factions.get_mut(&faction_id) {
        if relation == FactionRelation::Neutral {
            f.relations.remove(&other);
        } else {
            f.relations.insert(other, relation);
        }
    }

    let event = Event::now(
        EventType::RelationChanged,
        tick,
        Some(faction_id.into_inner()),
        ActorKind::Faction,
        json!({ "toward": other, "relation": relation }),
    );
    Ok(ActionOutcome::with_event(
        json!({ "toward": other, "relation": relation }),
        event,
    ))
}

/// Validate doctrine fields.
fn check_doctrine_fields(title: &str, body: &str) -> Result<(), ActionError> {
    if title.trim().is_empty() || title.len() > 80 {
        return Err(ActionError::Validation(
            "doctrine title must be 1-80 characters".to_owned(),
        ));
    }
    if body.len() > DOCTRINE_BODY_MAX {
        return Err(ActionError::Validation(format!(
            "doctrine body exceeds {DOCTRINE_BODY_MAX} characters"
        )));
    }
    Ok(())
}

/// Create a doctrine document. Officer and above.
pub fn create_doctrine(
    state: &mut WorldState,
    player_id: PlayerId,
    title: &str,
    body: &str,
) -> Result<ActionOutcome, ActionError> {
    check_doctrine_fields(title, body)?;
    let (faction_id, _) = require_capability(state, player_id, Capability::EditDoctrine)?;
    let tick = state.clock.tick();

    let doctrine = Doctrine {
        id: DoctrineId::new(),
        title: title.trim().to_owned(),
        body: body.to_owned(),
        author: player_id,
        updated_tick: tick,
    };
    let doctrine_id = doctrine.id;
    if let Some(f) = state.factions.get_mut(&faction_id) {
        f.doctrines.insert(doctrine_id, doctrine);
    }

    let event = Event::now(
        EventType::DoctrineUpdated,
        tick,
        Some(player_id.into_inner()),
        ActorKind::Player,
        json!({ "faction": faction_id, "doctrine": doctrine_id, "op": "create" }),
    );
    Ok(ActionOutcome::with_event(json!({ "doctrine": doctrine_id }), event))
}

/// Edit a doctrine document. Officer and above.
pub fn update_doctrine(
    state: &mut WorldState,
    player_id: PlayerId,
    doctrine_id: DoctrineId,
    title: &str,
    body: &str,
) -> Result<ActionOutcome, ActionError> {
    check_doctrine_fields(title, body)?;
    let (faction_id, _) = require_capability(state, player_id, Capability::EditDoctrine)?;
    let tick = state.clock.tick();

    let faction = state
        .factions
        .get_mut(&faction_id)
        .ok_or_else(|| ActionError::NotFound("faction".to_owned()))?;
    let doctrine = faction
        .doctrines
        .get_mut(&doctrine_id)
        .ok_or_else(|| ActionError::NotFound("doctrine".to_owned()))?;
    doctrine.title = title.trim().to_owned();
    doctrine.body = body.to_owned();
    doctrine.author = player_id;
    doctrine.updated_tick = tick;

    let event = Event::now(
        EventType::DoctrineUpdated,
        tick,
        Some(player_id.into_inner()),
        ActorKind::Player,
        json!({ "faction": faction_id, "doctrine": doctrine_id, "op": "update" }),
    );
    Ok(ActionOutcome::with_event(json!({ "doctrine": doctrine_id }), event))
}

/// Delete a doctrine document. Officer and above.
pub fn delete_doctrine(
    state: &mut WorldState,
    player_id: PlayerId,
    doctrine_id: DoctrineId,
) -> Result<ActionOutcome, ActionError> {
    let (faction_id, _) = require_capability(state, player_id, Capability::EditDoctrine)?;
    let tick = state.clock.tick();

    let removed = state
        .factions
        .get_mut(&faction_id)
        .and_then(|f| f.doctrines.remove(&doctrine_id));
    if removed.is_none() {
        return Err(ActionError::NotFound("doctrine".to_owned()));
    }

    let event = Event::now(
        EventType::DoctrineUpdated,
        tick,
        Some(player_id.into_inner()),
        ActorKind::Player,
        json!({ "faction": faction_id, "doctrine": doctrine_id, "op": "delete" }),
    );
    Ok(ActionOutcome::with_event(json!({ "doctrine": doctrine_id }), event))
}
