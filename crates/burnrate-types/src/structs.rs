//! Core entity structs for the Burnrate simulation.
//!
//! These are the aggregate roots persisted as JSONB bodies by the storage
//! layer and cached in the in-memory world model. Cross-entity references
//! are always IDs, never embedded values: Faction, Player, and Zone form a
//! reference cycle that is only ever traversed by explicit lookup.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::enums::{
    ActorKind, ContractKind, ContractStatus, EventType, FactionRank, FactionRelation,
    IntelTargetKind, LicenseKind, OrderSide, PlayerTier, Resource, ScoreCategory, ShipmentKind,
    ShipmentStatus, UnitKind, ZoneKind,
};
use crate::ids::{
    ContractId, DoctrineId, EventId, FactionId, IntelId, OrderId, PlayerId, RouteId, ShipmentId,
    UnitId, WebhookId, ZoneId,
};

// ---------------------------------------------------------------------------
// Inventory
// ---------------------------------------------------------------------------

/// Credits plus a non-negative goods ledger.
///
/// All mutation methods are checked: a removal that would go negative is
/// refused and leaves the inventory untouched. No code path can produce a
/// negative quantity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inventory {
    /// Credit balance. May go negative only through maintenance charges,
    /// which the tick engine immediately repairs by liquidating units.
    pub credits: i64,
    /// Goods quantities. Absent keys mean zero.
    pub goods: BTreeMap<Resource, u32>,
}

impl Inventory {
    /// An inventory holding only credits.
    pub fn with_credits(credits: i64) -> Self {
        Self {
            credits,
            goods: BTreeMap::new(),
        }
    }

    /// Quantity of a resource held (0 if absent).
    pub fn quantity(&self, resource: Resource) -> u32 {
        self.goods.get(&resource).copied().unwrap_or(0)
    }

    /// Whether at least `qty` of `resource` is held.
    pub fn has(&self, resource: Resource, qty: u32) -> bool {
        self.quantity(resource) >= qty
    }

    /// Add goods, saturating at `u32::MAX`.
    pub fn add(&mut self, resource: Resource, qty: u32) {
        let slot = self.goods.entry(resource).or_insert(0);
        *slot = slot.saturating_add(qty);
    }

    /// Remove goods if available. Returns `false` (and changes nothing)
    /// when the held quantity is insufficient.
    pub fn remove(&mut self, resource: Resource, qty: u32) -> bool {
        let Some(slot) = self.goods.get_mut(&resource) else {
            return qty == 0;
        };
        if *slot < qty {
            return false;
        }
        *slot -= qty;
        if *slot == 0 {
            self.goods.remove(&resource);
        }
        true
    }

    /// Whether every entry of `required` is held.
    pub fn has_all(&self, required: &BTreeMap<Resource, u32>) -> bool {
        required.iter().all(|(r, q)| self.has(*r, *q))
    }

    /// Remove every entry of `required` atomically. Returns `false` (and
    /// changes nothing) if any entry is insufficient.
    pub fn remove_all(&mut self, required: &BTreeMap<Resource, u32>) -> bool {
        if !self.has_all(required) {
            return false;
        }
        for (resource, qty) in required {
            let _ = self.remove(*resource, *qty);
        }
        true
    }

    /// Merge another goods map into this inventory.
    pub fn add_all(&mut self, goods: &BTreeMap<Resource, u32>) {
        for (resource, qty) in goods {
            self.add(*resource, *qty);
        }
    }
}

// ---------------------------------------------------------------------------
// Zone and Route
// ---------------------------------------------------------------------------

/// A node in the world graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Zone {
    /// Stable identifier.
    pub id: ZoneId,
    /// Display name.
    pub name: String,
    /// The kind, fixing burn rate and income.
    pub kind: ZoneKind,
    /// Owning faction, if any. A Hub is never owned.
    pub owner: Option<FactionId>,
    /// Percentage of burn satisfied last tick, saturated at 100.
    pub supply_level: Decimal,
    /// Consecutive ticks ended at >= 100% supply.
    pub compliance_streak: u32,
    /// Supply unit stockpile consumed by burn.
    pub su_stockpile: u32,
    /// Goods held at the zone (shipment deliveries, market settlement).
    pub inventory: BTreeMap<Resource, u32>,
    /// Factory production capacity per tick.
    pub production_capacity: u32,
    /// Garrison level.
    pub garrison: u32,
    /// Market depth multiplier applied to book displays.
    pub market_depth: Decimal,
    /// Medkit stockpile; grants a defense bonus, decays 1 per 10 ticks.
    pub medkit_stockpile: u32,
    /// Comms stockpile; reduces interception odds, decays 1 per 20 ticks.
    pub comms_stockpile: u32,
    /// Set when the zone's stockpile hit zero and ownership was cleared.
    pub collapsed: bool,
    /// The raw resource extracted here (Fields only).
    pub field_resource: Option<Resource>,
}

impl Zone {
    /// Create a zone of the given kind with neutral starting state.
    pub fn new(id: ZoneId, name: impl Into<String>, kind: ZoneKind) -> Self {
        Self {
            id,
            name: name.into(),
            kind,
            owner: None,
            supply_level: Decimal::ZERO,
            compliance_streak: 0,
            su_stockpile: 0,
            inventory: BTreeMap::new(),
            production_capacity: if matches!(kind, ZoneKind::Factory) { 50 } else { 0 },
            garrison: 0,
            market_depth: Decimal::ONE,
            medkit_stockpile: 0,
            comms_stockpile: 0,
            collapsed: false,
            field_resource: None,
        }
    }

    /// Whether this zone currently has an owner.
    pub const fn is_owned(&self) -> bool {
        self.owner.is_some()
    }

    /// Whether a faction may capture this zone right now: non-Hub, and
    /// either neutral or collapsed.
    pub const fn is_capturable(&self) -> bool {
        self.kind.capturable() && (self.owner.is_none() || self.collapsed)
    }
}

/// A directed edge in the world graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    /// Stable identifier.
    pub id: RouteId,
    /// Origin zone.
    pub from_zone: ZoneId,
    /// Destination zone.
    pub to_zone: ZoneId,
    /// Travel time in ticks. Always >= 1.
    pub distance_ticks: u32,
    /// Shipments that may depart per tick.
    pub capacity_per_tick: u32,
    /// Base interception risk, 0.0-0.3.
    pub base_risk: Decimal,
    /// Chokepoint rating, 1.0-3.0; multiplies interception risk.
    pub chokepoint: Decimal,
}

// ---------------------------------------------------------------------------
// Player
// ---------------------------------------------------------------------------

/// Shipping licenses held by a player. Courier is implicit and universal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LicenseSet {
    /// Freight license (capacity 500).
    pub freight: bool,
    /// Convoy license (capacity 2000).
    pub convoy: bool,
}

impl LicenseSet {
    /// Whether the given license is held.
    pub const fn holds(self, kind: LicenseKind) -> bool {
        match kind {
            LicenseKind::Courier => true,
            LicenseKind::Freight => self.freight,
            LicenseKind::Convoy => self.convoy,
        }
    }
}

/// A player account. Always located at exactly one zone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    /// Stable identifier.
    pub id: PlayerId,
    /// Unique display name, 2-20 characters.
    pub name: String,
    /// Opaque API key; unique, minted at join.
    pub api_key: String,
    /// Account tier.
    pub tier: PlayerTier,
    /// Credits and goods.
    pub inventory: Inventory,
    /// Current zone.
    pub zone: ZoneId,
    /// Faction membership, if any. A player belongs to at most one.
    pub faction: Option<FactionId>,
    /// Reputation score. Halved (floor) at season reset.
    pub reputation: i64,
    /// Actions consumed in the current quota day.
    pub actions_today: u32,
    /// Tick of the most recent action (drives quota-day rollover).
    pub last_action_tick: u64,
    /// Wall-clock time of the most recent action (drives the 1/s rate limit).
    pub last_action_at: Option<DateTime<Utc>>,
    /// Licenses held.
    pub licenses: LicenseSet,
    /// Tutorial progression step, monotonically increasing from 0.
    pub tutorial_step: u32,
    /// Account creation time.
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Faction
// ---------------------------------------------------------------------------

/// Membership entry within a faction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactionMember {
    /// The member.
    pub player: PlayerId,
    /// Rank. Exactly one member holds `Founder`.
    pub rank: FactionRank,
    /// Tick at which the player joined.
    pub joined_tick: u64,
}

/// A faction doctrine document, editable by Officers and above.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Doctrine {
    /// Stable identifier.
    pub id: DoctrineId,
    /// Title line.
    pub title: String,
    /// Body text, at most 4000 characters.
    pub body: String,
    /// Last editor.
    pub author: PlayerId,
    /// Tick of the last edit.
    pub updated_tick: u64,
}

/// Tracks an officer's treasury withdrawals within the current quota day.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyWithdrawal {
    /// The quota day (tick / ticks_per_day) the total belongs to.
    pub day: u64,
    /// Credits withdrawn during that day.
    pub withdrawn: i64,
}

/// An organization of players with a shared treasury.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Faction {
    /// Stable identifier.
    pub id: FactionId,
    /// Unique full name.
    pub name: String,
    /// Unique short tag, 2-5 characters.
    pub tag: String,
    /// The founding player. Kept in sync with the `Founder` rank entry.
    pub founder: PlayerId,
    /// Shared treasury.
    pub treasury: Inventory,
    /// Daily credit withdraw limit for Officers. Founder is unlimited.
    pub officer_daily_withdraw: i64,
    /// Doctrine documents keyed by id.
    pub doctrines: BTreeMap<DoctrineId, Doctrine>,
    /// Upgrade purchase counters keyed by upgrade name.
    pub upgrades: BTreeMap<String, u32>,
    /// Diplomatic stances toward other factions. Absent means neutral.
    pub relations: BTreeMap<FactionId, FactionRelation>,
    /// Membership list.
    pub members: Vec<FactionMember>,
    /// Per-officer withdrawal totals for limit enforcement.
    pub withdrawals: BTreeMap<PlayerId, DailyWithdrawal>,
    /// Tick the faction was created.
    pub created_tick: u64,
}

impl Faction {
    /// Look up a player's membership entry.
    pub fn member(&self, player: PlayerId) -> Option<&FactionMember> {
        self.members.iter().find(|m| m.player == player)
    }

    /// Look up a player's rank, if they are a member.
    pub fn rank_of(&self, player: PlayerId) -> Option<FactionRank> {
        self.member(player).map(|m| m.rank)
    }
}

// ---------------------------------------------------------------------------
// Shipment and Unit
// ---------------------------------------------------------------------------

/// Goods in transit along an ordered path of zones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shipment {
    /// Stable identifier.
    pub id: ShipmentId,
    /// Owning player.
    pub owner: PlayerId,
    /// Shipment class.
    pub kind: ShipmentKind,
    /// Ordered zone path; consecutive entries are connected by a route.
    pub path: Vec<ZoneId>,
    /// Index into `path` of the current zone.
    pub position: usize,
    /// Ticks remaining before arrival at the next path entry.
    pub ticks_to_next: u32,
    /// Cargo; total <= the kind's capacity.
    pub cargo: BTreeMap<Resource, u32>,
    /// Assigned escort units.
    pub escorts: Vec<UnitId>,
    /// Lifecycle state.
    pub status: ShipmentStatus,
    /// Launch tick.
    pub created_tick: u64,
}

impl Shipment {
    /// The zone the shipment is currently at or departing from.
    pub fn current_zone(&self) -> Option<ZoneId> {
        self.path.get(self.position).copied()
    }

    /// The next zone on the path, if any remains.
    pub fn next_zone(&self) -> Option<ZoneId> {
        self.path.get(self.position + 1).copied()
    }

    /// Total cargo units aboard.
    pub fn cargo_total(&self) -> u32 {
        self.cargo.values().fold(0u32, |acc, q| acc.saturating_add(*q))
    }
}

/// What a unit is currently doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "id")]
pub enum UnitAssignment {
    /// Escorting a shipment.
    Escort(ShipmentId),
    /// Patrolling a route as a raider.
    Raider(RouteId),
}

/// A combat asset owned by a player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unit {
    /// Stable identifier.
    pub id: UnitId,
    /// Owning player.
    pub owner: PlayerId,
    /// Escort or raider.
    pub kind: UnitKind,
    /// Current zone.
    pub zone: ZoneId,
    /// Combat strength.
    pub strength: u32,
    /// Movement speed (zones per tick when repositioning).
    pub speed: u32,
    /// Maintenance charged per tick, in credits.
    pub maintenance: i64,
    /// Current assignment, if deployed.
    pub assignment: Option<UnitAssignment>,
    /// Asking price when listed for sale.
    pub for_sale_price: Option<i64>,
    /// Build tick.
    pub created_tick: u64,
}

// ---------------------------------------------------------------------------
// Contract
// ---------------------------------------------------------------------------

/// Who posted a contract and whose funds escrow the reward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "id")]
pub enum ContractParty {
    /// A player posting with personal funds.
    Player(PlayerId),
    /// A faction posting with treasury funds (Officer+ only).
    Faction(FactionId),
}

/// An intel target reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "id")]
pub enum IntelTarget {
    /// A zone.
    Zone(ZoneId),
    /// A route.
    Route(RouteId),
}

impl IntelTarget {
    /// The target kind discriminant.
    pub const fn kind(self) -> IntelTargetKind {
        match self {
            Self::Zone(_) => IntelTargetKind::Zone,
            Self::Route(_) => IntelTargetKind::Route,
        }
    }

    /// The raw UUID of the target entity.
    pub const fn raw_id(self) -> Uuid {
        match self {
            Self::Zone(id) => id.0,
            Self::Route(id) => id.0,
        }
    }
}

/// Type-specific contract terms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum ContractTerms {
    /// Move `quantity` of `resource` from `from` to `to`.
    Haul {
        /// Pickup zone.
        from: ZoneId,
        /// Delivery zone.
        to: ZoneId,
        /// Resource to move.
        resource: Resource,
        /// Quantity required.
        quantity: u32,
    },
    /// Deliver `amount` supply units to `zone`.
    Supply {
        /// The zone to supply.
        zone: ZoneId,
        /// Supply units required.
        amount: u32,
    },
    /// Produce a Fresh intel report on `target`.
    Scout {
        /// The target to observe.
        target: IntelTarget,
    },
}

impl ContractTerms {
    /// The contract kind discriminant.
    pub const fn kind(&self) -> ContractKind {
        match self {
            Self::Haul { .. } => ContractKind::Haul,
            Self::Supply { .. } => ContractKind::Supply,
            Self::Scout { .. } => ContractKind::Scout,
        }
    }
}

/// A job posting with an escrowed reward.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contract {
    /// Stable identifier.
    pub id: ContractId,
    /// Poster (player or faction).
    pub poster: ContractParty,
    /// Acceptor, once claimed.
    pub accepted_by: Option<PlayerId>,
    /// Type-specific terms.
    pub terms: ContractTerms,
    /// Tick of acceptance, once claimed.
    pub accepted_tick: Option<u64>,
    /// Fulfillment progress toward the terms (SU delivered, goods hauled).
    pub progress: u32,
    /// Expiry tick.
    pub deadline_tick: u64,
    /// Credit reward held in escrow.
    pub reward_credits: i64,
    /// Reputation reward.
    pub reward_reputation: i64,
    /// Extra credits if completed at or before this tick.
    pub early_bonus: Option<(u64, i64)>,
    /// Lifecycle state.
    pub status: ContractStatus,
    /// Posting tick.
    pub created_tick: u64,
}

// ---------------------------------------------------------------------------
// Intel
// ---------------------------------------------------------------------------

/// Snapshot of a zone captured by a scan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneObservation {
    /// Zone name at scan time.
    pub name: String,
    /// Zone kind.
    pub kind: ZoneKind,
    /// Owner at scan time.
    pub owner: Option<FactionId>,
    /// Supply level at scan time.
    pub supply_level: Decimal,
    /// Supply stockpile at scan time.
    pub su_stockpile: u32,
    /// Garrison at scan time.
    pub garrison: u32,
    /// Medkit stockpile at scan time.
    pub medkit_stockpile: u32,
    /// Comms stockpile at scan time.
    pub comms_stockpile: u32,
}

/// Snapshot of a route captured by a scan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteObservation {
    /// Base interception risk.
    pub base_risk: Decimal,
    /// Chokepoint rating.
    pub chokepoint: Decimal,
    /// Capacity per tick.
    pub capacity_per_tick: u32,
    /// In-transit shipments sighted on the route at scan time.
    pub shipments_sighted: u32,
}

/// The captured data of an intel report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "data")]
pub enum IntelSnapshot {
    /// A zone observation.
    Zone(ZoneObservation),
    /// A route observation.
    Route(RouteObservation),
}

/// An observation record with freshness-driven decay on read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntelReport {
    /// Stable identifier.
    pub id: IntelId,
    /// The player who performed the scan.
    pub gatherer: PlayerId,
    /// The gatherer's faction at scan time, for shared visibility.
    pub faction: Option<FactionId>,
    /// What was observed.
    pub target: IntelTarget,
    /// Tick of the scan.
    pub gathered_tick: u64,
    /// Captured data. Decay is applied on read, never stored.
    pub snapshot: IntelSnapshot,
    /// Signal quality at capture, always 100.
    pub signal_quality: u8,
}

// ---------------------------------------------------------------------------
// Market order types
// ---------------------------------------------------------------------------

/// A resting limit order in a zone's book.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketOrder {
    /// Stable identifier.
    pub id: OrderId,
    /// Owning player.
    pub owner: PlayerId,
    /// The zone whose book holds this order.
    pub zone: ZoneId,
    /// Traded resource.
    pub resource: Resource,
    /// Buy or sell.
    pub side: OrderSide,
    /// Limit price in credits per unit.
    pub price: i64,
    /// Unfilled quantity.
    pub remaining: u32,
    /// Quantity at placement.
    pub original: u32,
    /// Tick of placement; earlier orders have price-time priority.
    pub created_tick: u64,
}

/// Price predicate for conditional orders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "cmp", content = "price")]
pub enum PriceTrigger {
    /// Arms when the last trade price is at or below the threshold.
    AtOrBelow(i64),
    /// Arms when the last trade price is at or above the threshold.
    AtOrAbove(i64),
}

impl PriceTrigger {
    /// Evaluate the predicate against a last-trade price.
    pub const fn crossed(self, last_price: i64) -> bool {
        match self {
            Self::AtOrBelow(threshold) => last_price <= threshold,
            Self::AtOrAbove(threshold) => last_price >= threshold,
        }
    }
}

/// A limit order that enters the book only once its trigger fires.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConditionalOrder {
    /// The order to inject when armed.
    pub order: MarketOrder,
    /// Arming predicate evaluated against the zone's last trade price.
    pub trigger: PriceTrigger,
    /// Set once the trigger has fired and the order entered the book.
    pub armed: bool,
}

/// A large order sliced into equal per-tick limit orders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TwapOrder {
    /// Stable identifier for the parent order.
    pub id: OrderId,
    /// Owning player.
    pub owner: PlayerId,
    /// The zone whose book receives the slices.
    pub zone: ZoneId,
    /// Traded resource.
    pub resource: Resource,
    /// Buy or sell.
    pub side: OrderSide,
    /// Limit price for every slice.
    pub price: i64,
    /// Total quantity across all slices.
    pub total: u32,
    /// Quantity injected per tick.
    pub slice: u32,
    /// Quantity already injected into the book.
    pub injected: u32,
    /// Ticks remaining; the order expires at zero.
    pub ticks_remaining: u32,
    /// Tick of placement.
    pub created_tick: u64,
}

// ---------------------------------------------------------------------------
// Events, scores, webhooks
// ---------------------------------------------------------------------------

/// An immutable audit record. Events are append-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Stable identifier.
    pub id: EventId,
    /// Event type.
    pub event_type: EventType,
    /// Tick the event belongs to.
    pub tick: u64,
    /// Wall-clock timestamp.
    pub at: DateTime<Utc>,
    /// Acting entity, if any.
    pub actor: Option<Uuid>,
    /// What kind of entity acted.
    pub actor_kind: ActorKind,
    /// Type-specific payload.
    pub data: serde_json::Value,
}

impl Event {
    /// Build an event at the given tick with the current wall-clock time.
    pub fn now(
        event_type: EventType,
        tick: u64,
        actor: Option<Uuid>,
        actor_kind: ActorKind,
        data: serde_json::Value,
    ) -> Self {
        Self {
            id: EventId::new(),
            event_type,
            tick,
            at: Utc::now(),
            actor,
            actor_kind,
            data,
        }
    }
}

/// Per-entity score totals for one season, keyed by (season, entity).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeasonScore {
    /// The season number.
    pub season: u32,
    /// The scored entity (player or faction UUID).
    pub entity: Uuid,
    /// Whether the entity is a player or a faction.
    pub entity_kind: ActorKind,
    /// Points per category.
    pub categories: BTreeMap<ScoreCategory, i64>,
}

impl SeasonScore {
    /// Fresh zeroed score row.
    pub fn new(season: u32, entity: Uuid, entity_kind: ActorKind) -> Self {
        Self {
            season,
            entity,
            entity_kind,
            categories: BTreeMap::new(),
        }
    }

    /// Add points to a category.
    pub fn add(&mut self, category: ScoreCategory, points: i64) {
        let slot = self.categories.entry(category).or_insert(0);
        *slot = slot.saturating_add(points);
    }

    /// Overwrite a category (used for recomputed-per-tick categories).
    pub fn set(&mut self, category: ScoreCategory, points: i64) {
        self.categories.insert(category, points);
    }

    /// Derived total across all categories.
    pub fn total(&self) -> i64 {
        self.categories.values().fold(0i64, |acc, p| acc.saturating_add(*p))
    }
}

/// A webhook registration with failure tracking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookRegistration {
    /// Stable identifier.
    pub id: WebhookId,
    /// Owning player (Operator+ tier).
    pub owner: PlayerId,
    /// Delivery URL.
    pub url: String,
    /// HMAC secret minted at registration, hex-encoded.
    pub secret: String,
    /// Event types to deliver. Empty means all.
    pub filter: BTreeSet<EventType>,
    /// Consecutive delivery failures. Reset on any 2xx.
    pub consecutive_failures: u32,
    /// Set after 5 consecutive failures; no further deliveries.
    pub disabled: bool,
    /// Registration tick.
    pub created_tick: u64,
}

impl WebhookRegistration {
    /// Whether this registration wants the given event type.
    pub fn matches(&self, event_type: EventType) -> bool {
        !self.disabled && (self.filter.is_empty() || self.filter.contains(&event_type))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn inventory_refuses_overdraw() {
        let mut inv = Inventory::default();
        inv.add(Resource::Ore, 5);
        assert!(!inv.remove(Resource::Ore, 6));
        assert_eq!(inv.quantity(Resource::Ore), 5);
        assert!(inv.remove(Resource::Ore, 5));
        assert_eq!(inv.quantity(Resource::Ore), 0);
    }

    #[test]
    fn inventory_remove_all_is_atomic() {
        let mut inv = Inventory::default();
        inv.add(Resource::Metal, 2);
        inv.add(Resource::Parts, 1);

        let mut required = BTreeMap::new();
        required.insert(Resource::Metal, 2);
        required.insert(Resource::Parts, 2); // more than held

        assert!(!inv.remove_all(&required));
        // Nothing was deducted.
        assert_eq!(inv.quantity(Resource::Metal), 2);
        assert_eq!(inv.quantity(Resource::Parts), 1);
    }

    #[test]
    fn hub_zone_is_never_capturable() {
        let hub = Zone::new(ZoneId::new(), "Relay North", ZoneKind::Hub);
        assert!(!hub.is_capturable());
    }

    #[test]
    fn neutral_and_collapsed_zones_are_capturable() {
        let mut front = Zone::new(ZoneId::new(), "Salient", ZoneKind::Front);
        assert!(front.is_capturable());

        front.owner = Some(FactionId::new());
        assert!(!front.is_capturable());

        front.collapsed = true;
        assert!(front.is_capturable());
    }

    #[test]
    fn shipment_path_walking() {
        let a = ZoneId::new();
        let b = ZoneId::new();
        let c = ZoneId::new();
        let shipment = Shipment {
            id: ShipmentId::new(),
            owner: PlayerId::new(),
            kind: ShipmentKind::Courier,
            path: vec![a, b, c],
            position: 1,
            ticks_to_next: 2,
            cargo: BTreeMap::new(),
            escorts: Vec::new(),
            status: ShipmentStatus::InTransit,
            created_tick: 0,
        };
        assert_eq!(shipment.current_zone(), Some(b));
        assert_eq!(shipment.next_zone(), Some(c));
    }

    #[test]
    fn license_set_always_holds_courier() {
        let none = LicenseSet::default();
        assert!(none.holds(LicenseKind::Courier));
        assert!(!none.holds(LicenseKind::Freight));
        assert!(!none.holds(LicenseKind::Convoy));
    }

    #[test]
    fn price_trigger_comparisons() {
        assert!(PriceTrigger::AtOrBelow(10).crossed(10));
        assert!(PriceTrigger::AtOrBelow(10).crossed(9));
        assert!(!PriceTrigger::AtOrBelow(10).crossed(11));
        assert!(PriceTrigger::AtOrAbove(10).crossed(10));
        assert!(!PriceTrigger::AtOrAbove(10).crossed(9));
    }

    #[test]
    fn season_score_total_is_derived() {
        let mut score = SeasonScore::new(1, Uuid::now_v7(), ActorKind::Player);
        score.add(ScoreCategory::SupplyDelivered, 40);
        score.add(ScoreCategory::ShipmentsCompleted, 10);
        assert_eq!(score.total(), 50);
    }

    #[test]
    fn webhook_empty_filter_matches_everything() {
        let hook = WebhookRegistration {
            id: WebhookId::new(),
            owner: PlayerId::new(),
            url: "https://example.test/hook".to_owned(),
            secret: "aa".to_owned(),
            filter: BTreeSet::new(),
            consecutive_failures: 0,
            disabled: false,
            created_tick: 0,
        };
        assert!(hook.matches(EventType::TradeExecuted));
        assert!(hook.matches(EventType::ZoneCollapsed));
    }
}
