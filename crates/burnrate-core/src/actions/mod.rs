//! The action processor: every mutating player request flows through
//! [`process`].
//!
//! Stages, in order: authenticate by API key, rate-limit (one action per
//! second), daily quota (per tier, day measured in ticks), domain
//! validation, mutation, event emission. The caller holds the world's
//! write guard across the whole call, which is what serializes actions
//! against each other and against the tick pipeline.
//!
//! Handlers live in submodules by domain; each returns an
//! [`ActionOutcome`] whose events are recorded here so no handler can
//! forget to.

pub mod contracts;
pub mod factions;
pub mod logistics;
pub mod market;
pub mod units;
pub mod webhooks;

use std::collections::BTreeMap;

use burnrate_types::{
    ActorKind, ContractId, ContractTerms, DoctrineId, Event, EventType, FactionId,
    FactionRelation, LicenseKind, OrderId, OrderSide, PlayerId, PlayerTier, PriceTrigger,
    Resource, RouteId, ShipmentId, ShipmentKind, UnitId, UnitKind, WebhookId, ZoneId,
    IntelTarget,
};
use chrono::{DateTime, Utc};
use serde_json::json;

use crate::state::WorldState;

/// Minimum wall-clock interval between a player's actions.
const MIN_ACTION_INTERVAL_MS: i64 = 1_000;

/// Every player-initiated mutation.
///
/// This is the wire shape for `POST /batch` entries; individual REST
/// endpoints construct the same variants from their own request bodies.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Action {
    /// Move along a direct route.
    Travel {
        /// Destination zone.
        to: ZoneId,
    },
    /// Extract the local raw resource at a Field.
    Extract {
        /// Units to extract.
        quantity: u32,
    },
    /// Run a recipe at a Factory.
    Produce {
        /// The manufactured output.
        output: Resource,
        /// Batches to produce.
        quantity: u32,
    },
    /// Launch a shipment.
    Ship {
        /// Shipment class.
        kind: ShipmentKind,
        /// Ordered zone path starting at the current zone.
        path: Vec<ZoneId>,
        /// Cargo manifest.
        cargo: BTreeMap<Resource, u32>,
        /// Escort units to attach at launch.
        #[serde(default)]
        escorts: Vec<UnitId>,
    },
    /// Assemble supply units into the current zone's stockpile.
    Supply {
        /// Supply units to assemble.
        amount: u32,
    },
    /// Capture the current zone for the player's faction.
    Capture,
    /// Scan a zone or route.
    Scan {
        /// The target to observe.
        target: IntelTarget,
    },
    /// Deposit medkits or comms into the current zone's stockpiles.
    Stockpile {
        /// `Medkits` or `Comms`.
        resource: Resource,
        /// Units to deposit.
        quantity: u32,
    },
    /// Unlock the freight or convoy license.
    UnlockLicense {
        /// The license to unlock.
        kind: LicenseKind,
    },
    /// Bump the tutorial step.
    AdvanceTutorial,

    /// Place a plain limit order at the current zone.
    PlaceOrder {
        /// Traded resource.
        resource: Resource,
        /// Buy or sell.
        side: OrderSide,
        /// Limit price in credits.
        price: i64,
        /// Quantity.
        quantity: u32,
    },
    /// Place a conditional order (Operator+).
    PlaceConditional {
        /// Traded resource.
        resource: Resource,
        /// Buy or sell.
        side: OrderSide,
        /// Limit price once armed.
        price: i64,
        /// Quantity.
        quantity: u32,
        /// Arming predicate.
        trigger: PriceTrigger,
    },
    /// Place a time-weighted order (Operator+).
    PlaceTwap {
        /// Traded resource.
        resource: Resource,
        /// Buy or sell.
        side: OrderSide,
        /// Limit price for every slice.
        price: i64,
        /// Total quantity.
        total: u32,
        /// Per-tick slice.
        slice: u32,
    },
    /// Cancel an order of any variant.
    CancelOrder {
        /// The order to cancel.
        order: OrderId,
    },

    /// Found a faction.
    CreateFaction {
        /// Full name, unique.
        name: String,
        /// Short tag, unique.
        tag: String,
    },
    /// Join an existing faction.
    JoinFaction {
        /// The faction to join.
        faction: FactionId,
    },
    /// Leave the current faction.
    LeaveFaction,
    /// Promote a Member to Officer (Founder only).
    PromoteMember {
        /// The member to promote.
        player: PlayerId,
    },
    /// Demote an Officer to Member (Founder only).
    DemoteMember {
        /// The officer to demote.
        player: PlayerId,
    },
    /// Kick a member (Officer+; kicking an Officer requires Founder).
    KickMember {
        /// The member to kick.
        player: PlayerId,
    },
    /// Hand the Founder rank to another member.
    TransferLeadership {
        /// The new founder.
        to: PlayerId,
    },
    /// Move credits and goods into the treasury.
    TreasuryDeposit {
        /// Credits to deposit.
        #[serde(default)]
        credits: i64,
        /// Goods to deposit.
        #[serde(default)]
        goods: BTreeMap<Resource, u32>,
    },
    /// Move credits and goods out of the treasury (Officer+).
    TreasuryWithdraw {
        /// Credits to withdraw (daily-limited below Founder).
        #[serde(default)]
        credits: i64,
        /// Goods to withdraw.
        #[serde(default)]
        goods: BTreeMap<Resource, u32>,
    },
    /// Set the diplomatic stance toward another faction (Founder only).
    SetRelation {
        /// The other faction.
        faction: FactionId,
        /// The new stance.
        relation: FactionRelation,
    },
    /// Create a doctrine document (Officer+).
    CreateDoctrine {
        /// Title line.
        title: String,
        /// Body text.
        body: String,
    },
    /// Edit a doctrine document (Officer+).
    UpdateDoctrine {
        /// The doctrine to edit.
        id: DoctrineId,
        /// New title.
        title: String,
        /// New body.
        body: String,
    },
    /// Delete a doctrine document (Officer+).
    DeleteDoctrine {
        /// The doctrine to delete.
        id: DoctrineId,
    },

    /// Post a contract.
    CreateContract {
        /// Type-specific terms.
        terms: ContractTerms,
        /// Ticks from now until expiry.
        deadline_ticks: u64,
        /// Credit reward, escrowed at posting.
        reward_credits: i64,
        /// Reputation reward.
        #[serde(default)]
        reward_reputation: i64,
        /// Optional (ticks-from-now, extra credits) early bonus.
        #[serde(default)]
        early_bonus: Option<(u64, i64)>,
        /// Post with faction funds (Officer+).
        #[serde(default)]
        as_faction: bool,
    },
    /// Accept an open contract.
    AcceptContract {
        /// The contract to accept.
        contract: ContractId,
    },
    /// Complete an accepted contract.
    CompleteContract {
        /// The contract to complete.
        contract: ContractId,
    },
    /// Cancel an open contract (poster only).
    CancelContract {
        /// The contract to cancel.
        contract: ContractId,
    },

    /// Build a combat unit at a Factory.
    BuildUnit {
        /// Escort or raider.
        kind: UnitKind,
    },
    /// Attach an escort to a shipment at the same zone.
    AssignEscort {
        /// The escort unit.
        unit: UnitId,
        /// The shipment to protect.
        shipment: ShipmentId,
    },
    /// Put a raider on patrol along a route.
    DeployRaider {
        /// The raider unit.
        unit: UnitId,
        /// The route to patrol.
        route: RouteId,
    },
    /// Clear a unit's assignment.
    RecallUnit {
        /// The unit to recall.
        unit: UnitId,
    },
    /// List a unit for sale.
    SellUnit {
        /// The unit to list.
        unit: UnitId,
        /// Asking price.
        price: i64,
    },
    /// Buy a listed unit.
    HireUnit {
        /// The unit to buy.
        unit: UnitId,
    },

    /// Register a webhook (Operator+).
    RegisterWebhook {
        /// Delivery URL.
        url: String,
        /// Event types to deliver; empty means all.
        #[serde(default)]
        filter: Vec<EventType>,
    },
    /// Delete a webhook registration.
    DeleteWebhook {
        /// The registration to delete.
        id: WebhookId,
    },
}

/// The typed error catalog every action can surface.
#[derive(Debug, thiserror::Error)]
pub enum ActionError {
    /// The API key is unknown.
    #[error("unknown or missing API key")]
    Unauthorized,

    /// A referenced entity does not exist.
    #[error("{0} not found")]
    NotFound(String),

    /// A uniqueness or state conflict (includes wash trades).
    #[error("conflict: {0}")]
    Conflict(String),

    /// Malformed input that no game state could make valid.
    #[error("invalid input: {0}")]
    Validation(String),

    /// A game rule refused the action in the current state.
    #[error("precondition failed: {0}")]
    Precondition(String),

    /// The per-player rate limit was breached.
    #[error("rate limited; retry in {retry_after_ms} ms")]
    RateLimited {
        /// Suggested delay before retrying.
        retry_after_ms: u64,
    },

    /// The daily action quota is exhausted.
    #[error("daily action quota exhausted")]
    QuotaExceeded,

    /// An optimistic concurrency conflict; the caller may retry.
    #[error("transaction conflict; retry")]
    TransactionConflict,

    /// A transient storage or network failure; retry with backoff.
    #[error("transient failure: {0}")]
    Transient(String),

    /// An unexpected internal failure. Details stay behind the
    /// correlation id.
    #[error("internal error")]
    Internal(String),
}

impl ActionError {
    /// The stable machine-readable code for this error kind.
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Unauthorized => "unauthorized",
            Self::NotFound(_) => "not_found",
            Self::Conflict(_) => "conflict",
            Self::Validation(_) => "validation",
            Self::Precondition(_) => "precondition",
            Self::RateLimited { .. } => "rate_limited",
            Self::QuotaExceeded => "quota_exceeded",
            Self::TransactionConflict => "transaction_conflict",
            Self::Transient(_) => "transient",
            Self::Internal(_) => "internal",
        }
    }

    /// Whether a bounded retry inside the action processor is warranted.
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::TransactionConflict | Self::Transient(_))
    }
}

/// The result of a successful action: a JSON body for the response plus
/// the events it emitted.
#[derive(Debug, Clone)]
pub struct ActionOutcome {
    /// Response body.
    pub body: serde_json::Value,
    /// Events emitted by the mutation.
    pub events: Vec<Event>,
}

impl ActionOutcome {
    /// An outcome with a body and no events.
    pub fn body(body: serde_json::Value) -> Self {
        Self {
            body,
            events: Vec::new(),
        }
    }

    /// An outcome with a body and one event.
    pub fn with_event(body: serde_json::Value, event: Event) -> Self {
        Self {
            body,
            events: vec![event],
        }
    }
}

/// Process one authenticated action end to end.
///
/// # Errors
///
/// Returns the typed [`ActionError`] for the first stage that refuses.
pub fn process(
    state: &mut WorldState,
    api_key: &str,
    action: &Action,
    now: DateTime<Utc>,
) -> Result<ActionOutcome, ActionError> {
    let player_id = state
        .player_by_key(api_key)
        .ok_or(ActionError::Unauthorized)?;
    throttle(state, player_id, now)?;

    let outcome = dispatch(state, player_id, action)?;

    let tick = state.clock.tick();
    if let Some(player) = state.players.get_mut(&player_id) {
        player.actions_today = player.actions_today.saturating_add(1);
        player.last_action_tick = tick;
        player.last_action_at = Some(now);
    }
    state.record_events(outcome.events.clone());
    Ok(outcome)
}

/// Rate-limit and quota stages.
fn throttle(
    state: &mut WorldState,
    player_id: PlayerId,
    now: DateTime<Utc>,
) -> Result<(), ActionError> {
    let tick = state.clock.tick();
    let today = state.clock.day_of(tick);
    let day_of_last = |last: u64| state.clock.day_of(last);

    let player = state
        .players
        .get(&player_id)
        .ok_or(ActionError::Unauthorized)?;

    if let Some(last) = player.last_action_at {
        let elapsed_ms = now.signed_duration_since(last).num_milliseconds();
        if elapsed_ms < MIN_ACTION_INTERVAL_MS {
            let retry = MIN_ACTION_INTERVAL_MS.saturating_sub(elapsed_ms).max(0);
            return Err(ActionError::RateLimited {
                retry_after_ms: u64::try_from(retry).unwrap_or(1_000),
            });
        }
    }

    let rollover = day_of_last(player.last_action_tick) < today;
    let used = if rollover { 0 } else { player.actions_today };
    if used >= player.tier.daily_action_quota() {
        return Err(ActionError::QuotaExceeded);
    }

    if rollover {
        if let Some(p) = state.players.get_mut(&player_id) {
            p.actions_today = 0;
        }
    }
    Ok(())
}

/// Route an action to its domain handler.
fn dispatch(
    state: &mut WorldState,
    player: PlayerId,
    action: &Action,
) -> Result<ActionOutcome, ActionError> {
    match action {
        Action::Travel { to } => logistics::travel(state, player, *to),
        Action::Extract { quantity } => logistics::extract(state, player, *quantity),
        Action::Produce { output, quantity } => {
            logistics::produce(state, player, *output, *quantity)
        }
        Action::Ship {
            kind,
            path,
            cargo,
            escorts,
        } => logistics::ship(state, player, *kind, path, cargo, escorts),
        Action::Supply { amount } => logistics::supply(state, player, *amount),
        Action::Capture => logistics::capture(state, player),
        Action::Scan { target } => logistics::scan(state, player, *target),
        Action::Stockpile { resource, quantity } => {
            logistics::stockpile(state, player, *resource, *quantity)
        }
        Action::UnlockLicense { kind } => logistics::unlock_license(state, player, *kind),
        Action::AdvanceTutorial => logistics::advance_tutorial(state, player),

        Action::PlaceOrder {
            resource,
            side,
            price,
            quantity,
        } => market::place_order(state, player, *resource, *side, *price, *quantity),
        Action::PlaceConditional {
            resource,
            side,
            price,
            quantity,
            trigger,
        } => market::place_conditional(state, player, *resource, *side, *price, *quantity, *trigger),
        Action::PlaceTwap {
            resource,
            side,
            price,
            total,
            slice,
        } => market::place_twap(state, player, *resource, *side, *price, *total, *slice),
        Action::CancelOrder { order } => market::cancel_order(state, player, *order),

        Action::CreateFaction { name, tag } => factions::create(state, player, name, tag),
        Action::JoinFaction { faction } => factions::join(state, player, *faction),
        Action::LeaveFaction => factions::leave(state, player),
        Action::PromoteMember { player: target } => factions::promote(state, player, *target),
        Action::DemoteMember { player: target } => factions::demote(state, player, *target),
        Action::KickMember { player: target } => factions::kick(state, player, *target),
        Action::TransferLeadership { to } => factions::transfer(state, player, *to),
        Action::TreasuryDeposit { credits, goods } => {
            factions::treasury_deposit(state, player, *credits, goods)
        }
        Action::TreasuryWithdraw { credits, goods } => {
            factions::treasury_withdraw(state, player, *credits, goods)
        }
        Action::SetRelation { faction, relation } => {
            factions::set_relation(state, player, *faction, *relation)
        }
        Action::CreateDoctrine { title, body } => {
            factions::create_doctrine(state, player, title, body)
        }
        Action::UpdateDoctrine { id, title, body } => {
            factions::update_doctrine(state, player, *id, title, body)
        }
        Action::DeleteDoctrine { id } => factions::delete_doctrine(state, player, *id),

        Action::CreateContract {
            terms,
            deadline_ticks,
            reward_credits,
            reward_reputation,
            early_bonus,
            as_faction,
        } => contracts::create(
            state,
            player,
            *terms,
            *deadline_ticks,
            *reward_credits,
            *reward_reputation,
            *early_bonus,
            *as_faction,
        ),
        Action::AcceptContract { contract } => contracts::accept(state, player, *contract),
        Action::CompleteContract { contract } => contracts::complete(state, player, *contract),
        Action::CancelContract { contract } => contracts::cancel(state, player, *contract),

        Action::BuildUnit { kind } => units::build(state, player, *kind),
        Action::AssignEscort { unit, shipment } => {
            units::assign_escort(state, player, *unit, *shipment)
        }
        Action::DeployRaider { unit, route } => units::deploy_raider(state, player, *unit, *route),
        Action::RecallUnit { unit } => units::recall(state, player, *unit),
        Action::SellUnit { unit, price } => units::sell(state, player, *unit, *price),
        Action::HireUnit { unit } => units::hire(state, player, *unit),

        Action::RegisterWebhook { url, filter } => {
            webhooks::register(state, player, url, filter)
        }
        Action::DeleteWebhook { id } => webhooks::delete(state, player, *id),
    }
}

/// Create a player account. The only unauthenticated mutation.
///
/// # Errors
///
/// Returns [`ActionError::Validation`] for a bad name or
/// [`ActionError::Conflict`] for a taken one.
pub fn join(state: &mut WorldState, name: &str, now: DateTime<Utc>) -> Result<ActionOutcome, ActionError> {
    let name = name.trim();
    if name.len() < 2 || name.len() > 20 {
        return Err(ActionError::Validation(
            "name must be 2-20 characters".to_owned(),
        ));
    }
    if state.name_taken(name) {
        return Err(ActionError::Conflict("name already taken".to_owned()));
    }

    let hubs = state.graph.zones_of_kind(burnrate_types::ZoneKind::Hub);
    if hubs.is_empty() {
        return Err(ActionError::Internal("world has no hubs".to_owned()));
    }
    let index = crate::prng::fnv1a64(name.as_bytes()) as usize % hubs.len();
    let spawn = hubs[index];

    let tick = state.clock.tick();
    let api_key = format!("brk_{}", uuid::Uuid::new_v4().simple());
    let player = burnrate_types::Player {
        id: PlayerId::new(),
        name: name.to_owned(),
        api_key: api_key.clone(),
        tier: PlayerTier::Freelance,
        inventory: burnrate_types::Inventory::with_credits(crate::season::STARTING_CREDITS),
        zone: spawn,
        faction: None,
        reputation: 0,
        actions_today: 0,
        last_action_tick: tick,
        last_action_at: None,
        licenses: burnrate_types::LicenseSet::default(),
        tutorial_step: 0,
        created_at: now,
    };
    let player_id = player.id;
    state.index_player(player);

    let event = Event::now(
        EventType::PlayerJoined,
        tick,
        Some(player_id.into_inner()),
        ActorKind::Player,
        json!({ "name": name, "zone": spawn }),
    );
    state.record_event(event.clone());

    Ok(ActionOutcome::with_event(
        json!({
            "player_id": player_id,
            "api_key": api_key,
            "name": name,
            "zone": spawn,
            "credits": crate::season::STARTING_CREDITS,
        }),
        event,
    ))
}

/// Look up the acting player or fail with `Unauthorized`.
pub(crate) fn require_player<'a>(
    state: &'a WorldState,
    player: PlayerId,
) -> Result<&'a burnrate_types::Player, ActionError> {
    state.players.get(&player).ok_or(ActionError::Unauthorized)
}

/// Whether a zone kind hosts a public market.
pub(crate) const fn zone_has_market(kind: burnrate_types::ZoneKind) -> bool {
    matches!(
        kind,
        burnrate_types::ZoneKind::Hub | burnrate_types::ZoneKind::Factory | burnrate_types::ZoneKind::Field
    )
}
