//! Enumeration types shared across the Burnrate workspace.
//!
//! Game constants that are fixed per variant (burn rates, capacities,
//! tier quotas) live on the enums themselves so every crate reads the
//! same numbers.

use serde::{Deserialize, Serialize};

/// A tradeable resource.
///
/// Four raw resources are extracted at Field zones; the rest are
/// manufactured at Factory zones from recipes (see
/// `burnrate_world::recipes`). Credits are not a resource -- they live in
/// a separate balance on each inventory.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Resource {
    /// Raw ore, extracted at Fields.
    Ore,
    /// Fuel, extracted at Fields.
    Fuel,
    /// Grain, extracted at Fields.
    Grain,
    /// Fiber, extracted at Fields.
    Fiber,
    /// Refined metal (2 ore + 1 fuel).
    Metal,
    /// Industrial chemicals (1 ore + 2 fuel).
    Chemicals,
    /// Rations (3 grain + 1 fuel).
    Rations,
    /// Textiles (2 fiber + 1 chemicals).
    Textiles,
    /// Ammunition (1 metal + 1 chemicals).
    Ammo,
    /// Medkits (1 chemicals + 1 textiles).
    Medkits,
    /// Machine parts (1 metal + 1 textiles).
    Parts,
    /// Comms equipment (1 metal + 1 chemicals + 1 parts).
    Comms,
}

impl Resource {
    /// All resource variants, in declaration order.
    pub const ALL: [Self; 12] = [
        Self::Ore,
        Self::Fuel,
        Self::Grain,
        Self::Fiber,
        Self::Metal,
        Self::Chemicals,
        Self::Rations,
        Self::Textiles,
        Self::Ammo,
        Self::Medkits,
        Self::Parts,
        Self::Comms,
    ];

    /// The raw resources available for extraction at Field zones.
    pub const RAW: [Self; 4] = [Self::Ore, Self::Fuel, Self::Grain, Self::Fiber];

    /// Whether this resource is raw (extractable) rather than manufactured.
    pub const fn is_raw(self) -> bool {
        matches!(self, Self::Ore | Self::Fuel | Self::Grain | Self::Fiber)
    }
}

/// The kind of a zone, fixing its burn rate, income, and capturability.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum ZoneKind {
    /// Spawn and trade nexus. Burn 0, never capturable.
    Hub,
    /// Raw resource extraction site.
    Field,
    /// Manufacturing site for recipes.
    Factory,
    /// Graph connector with no economy of its own.
    Junction,
    /// Contested frontline zone with high income and burn.
    Front,
    /// Fortified high-value zone.
    Stronghold,
}

impl ZoneKind {
    /// Supply units burned per tick while the zone is owned.
    pub const fn burn_rate(self) -> u32 {
        match self {
            Self::Hub | Self::Junction => 0,
            Self::Field => 3,
            Self::Factory => 5,
            Self::Front => 10,
            Self::Stronghold => 20,
        }
    }

    /// Credits paid to the owner each tick.
    pub const fn income(self) -> i64 {
        match self {
            Self::Hub | Self::Junction => 0,
            Self::Field => 5,
            Self::Factory => 10,
            Self::Front => 25,
            Self::Stronghold => 50,
        }
    }

    /// Whether the zone can ever be owned by a faction. Hubs cannot.
    pub const fn capturable(self) -> bool {
        !matches!(self, Self::Hub)
    }
}

/// Player account tier, gating daily quotas and advanced endpoints.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum PlayerTier {
    /// Entry tier.
    Freelance,
    /// Mid tier; unlocks webhooks and advanced market orders.
    Operator,
    /// Top tier.
    Command,
}

impl PlayerTier {
    /// Maximum actions per day.
    pub const fn daily_action_quota(self) -> u32 {
        match self {
            Self::Freelance => 200,
            Self::Operator => 250,
            Self::Command => 300,
        }
    }

    /// Maximum open market orders at once.
    pub const fn order_cap(self) -> usize {
        match self {
            Self::Freelance => 20,
            Self::Operator => 50,
            Self::Command => 100,
        }
    }

    /// Maximum open contracts posted at once.
    pub const fn contract_cap(self) -> usize {
        match self {
            Self::Freelance => 5,
            Self::Operator => 10,
            Self::Command => 20,
        }
    }
}

/// Rank of a player within a faction.
///
/// Ordering is meaningful: `Member < Officer < Founder`, so permission
/// checks can use `>=`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum FactionRank {
    /// Rank-and-file member.
    Member,
    /// Can manage members and spend within limits.
    Officer,
    /// Exactly one per faction; unlimited authority.
    Founder,
}

/// Diplomatic stance between two factions.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum FactionRelation {
    /// Mutual defense pact.
    Allied,
    /// Default stance.
    Neutral,
    /// Open hostilities.
    War,
}

/// Shipment class, fixing cargo capacity and interception visibility.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum ShipmentKind {
    /// Small and stealthy.
    Courier,
    /// Standard haulage.
    Freight,
    /// Large and conspicuous.
    Convoy,
}

impl ShipmentKind {
    /// Total cargo capacity in units.
    pub const fn capacity(self) -> u32 {
        match self {
            Self::Courier => 100,
            Self::Freight => 500,
            Self::Convoy => 2000,
        }
    }

    /// The license required to launch this shipment kind.
    pub const fn required_license(self) -> LicenseKind {
        match self {
            Self::Courier => LicenseKind::Courier,
            Self::Freight => LicenseKind::Freight,
            Self::Convoy => LicenseKind::Convoy,
        }
    }
}

/// Lifecycle state of a shipment.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum ShipmentStatus {
    /// Moving along its path.
    InTransit,
    /// Delivered; cargo credited to the destination zone.
    Arrived,
    /// Lost to a raider on a hop.
    Intercepted,
    /// Administratively lost (e.g. season reset while in transit).
    Lost,
}

impl ShipmentStatus {
    /// Whether the shipment has reached a terminal state.
    pub const fn is_terminal(self) -> bool {
        !matches!(self, Self::InTransit)
    }
}

/// The kind of a combat unit.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum UnitKind {
    /// Defends shipments it is assigned to.
    Escort,
    /// Patrols a route and intercepts shipments.
    Raider,
}

impl UnitKind {
    /// Base strength at build time.
    pub const fn base_strength(self) -> u32 {
        match self {
            Self::Escort => 10,
            Self::Raider => 12,
        }
    }

    /// Maintenance cost in credits per tick.
    pub const fn maintenance(self) -> i64 {
        match self {
            Self::Escort => 2,
            Self::Raider => 3,
        }
    }
}

/// Side of a market order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum OrderSide {
    /// Bids, matched highest price first.
    Buy,
    /// Asks, matched lowest price first.
    Sell,
}

/// The kind of a contract posting.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum ContractKind {
    /// Move goods from one zone to another.
    Haul,
    /// Deliver supply units to a zone.
    Supply,
    /// Produce fresh intel on a target.
    Scout,
}

/// Lifecycle state of a contract.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum ContractStatus {
    /// Posted and available.
    Open,
    /// Claimed by a player.
    Accepted,
    /// Fulfilled; escrow released.
    Completed,
    /// Withdrawn by the poster.
    Cancelled,
    /// Deadline passed without completion.
    Expired,
}

/// Shipping license kinds. Every player holds Courier.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum LicenseKind {
    /// Granted at join.
    Courier,
    /// Unlockable mid-tier license.
    Freight,
    /// Unlockable top-tier license.
    Convoy,
}

/// What an intel report observes.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum IntelTargetKind {
    /// A zone snapshot.
    Zone,
    /// A route snapshot.
    Route,
}

/// Age-derived quality bucket on an intel report.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Freshness {
    /// Age < 10 ticks: unmodified.
    Fresh,
    /// Age 10..50: degraded and range-rounded.
    Stale,
    /// Age >= 50: only target id and last-seen owner remain.
    Expired,
}

/// Who performed an action recorded in an event.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum ActorKind {
    /// A player account.
    Player,
    /// A faction acting collectively.
    Faction,
    /// The tick engine or another internal source.
    System,
}

/// Outcome of a single weighted combat roll.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum CombatOutcome {
    /// Attacker ratio >= 0.75: full cargo loss.
    DecisiveVictory,
    /// Ratio >= 0.55: full cargo loss but the attacker loses a unit.
    CostlyVictory,
    /// Ratio >= 0.45: half the cargo is lost.
    Stalemate,
    /// Ratio < 0.45: the shipment continues unharmed.
    Defeat,
}

/// Season scoring category.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum ScoreCategory {
    /// Recomputed at each tick boundary from controlled zones and streaks.
    ZonesControlled,
    /// +1 per supply unit delivered.
    SupplyDelivered,
    /// +10 per shipment arrival.
    ShipmentsCompleted,
    /// +25 per completed contract.
    ContractsCompleted,
    /// +2 per reputation point gained.
    ReputationGained,
    /// +50 per combat victory.
    CombatVictories,
}

/// Every event type the simulation emits.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[allow(missing_docs)]
pub enum EventType {
    PlayerJoined,
    PlayerTraveled,
    ResourceExtracted,
    GoodsProduced,
    ShipmentLaunched,
    ShipmentArrived,
    ShipmentIntercepted,
    OrderPlaced,
    OrderCancelled,
    TradeExecuted,
    SupplyDelivered,
    StockpileDeposited,
    ZoneCaptured,
    ZoneCollapsed,
    IntelGathered,
    FactionCreated,
    FactionJoined,
    FactionLeft,
    MemberPromoted,
    MemberDemoted,
    MemberKicked,
    LeadershipTransferred,
    TreasuryDeposited,
    TreasuryWithdrawn,
    DoctrineUpdated,
    RelationChanged,
    ContractCreated,
    ContractAccepted,
    ContractCompleted,
    ContractCancelled,
    ContractExpired,
    UnitBuilt,
    UnitAssigned,
    UnitRecalled,
    UnitSold,
    UnitDisbanded,
    LicenseUnlocked,
    WebhookRegistered,
    WebhookDisabled,
    SeasonReset,
    TickCompleted,
    TickAborted,
}

impl EventType {
    /// The stable snake_case name used in storage and webhook payloads.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PlayerJoined => "player_joined",
            Self::PlayerTraveled => "player_traveled",
            Self::ResourceExtracted => "resource_extracted",
            Self::GoodsProduced => "goods_produced",
            Self::ShipmentLaunched => "shipment_launched",
            Self::ShipmentArrived => "shipment_arrived",
            Self::ShipmentIntercepted => "shipment_intercepted",
            Self::OrderPlaced => "order_placed",
            Self::OrderCancelled => "order_cancelled",
            Self::TradeExecuted => "trade_executed",
            Self::SupplyDelivered => "supply_delivered",
            Self::StockpileDeposited => "stockpile_deposited",
            Self::ZoneCaptured => "zone_captured",
            Self::ZoneCollapsed => "zone_collapsed",
            Self::IntelGathered => "intel_gathered",
            Self::FactionCreated => "faction_created",
            Self::FactionJoined => "faction_joined",
            Self::FactionLeft => "faction_left",
            Self::MemberPromoted => "member_promoted",
            Self::MemberDemoted => "member_demoted",
            Self::MemberKicked => "member_kicked",
            Self::LeadershipTransferred => "leadership_transferred",
            Self::TreasuryDeposited => "treasury_deposited",
            Self::TreasuryWithdrawn => "treasury_withdrawn",
            Self::DoctrineUpdated => "doctrine_updated",
            Self::RelationChanged => "relation_changed",
            Self::ContractCreated => "contract_created",
            Self::ContractAccepted => "contract_accepted",
            Self::ContractCompleted => "contract_completed",
            Self::ContractCancelled => "contract_cancelled",
            Self::ContractExpired => "contract_expired",
            Self::UnitBuilt => "unit_built",
            Self::UnitAssigned => "unit_assigned",
            Self::UnitRecalled => "unit_recalled",
            Self::UnitSold => "unit_sold",
            Self::UnitDisbanded => "unit_disbanded",
            Self::LicenseUnlocked => "license_unlocked",
            Self::WebhookRegistered => "webhook_registered",
            Self::WebhookDisabled => "webhook_disabled",
            Self::SeasonReset => "season_reset",
            Self::TickCompleted => "tick_completed",
            Self::TickAborted => "tick_aborted",
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn burn_rates_match_design() {
        assert_eq!(ZoneKind::Hub.burn_rate(), 0);
        assert_eq!(ZoneKind::Junction.burn_rate(), 0);
        assert_eq!(ZoneKind::Field.burn_rate(), 3);
        assert_eq!(ZoneKind::Factory.burn_rate(), 5);
        assert_eq!(ZoneKind::Front.burn_rate(), 10);
        assert_eq!(ZoneKind::Stronghold.burn_rate(), 20);
    }

    #[test]
    fn hubs_are_not_capturable() {
        assert!(!ZoneKind::Hub.capturable());
        for kind in [
            ZoneKind::Field,
            ZoneKind::Factory,
            ZoneKind::Junction,
            ZoneKind::Front,
            ZoneKind::Stronghold,
        ] {
            assert!(kind.capturable());
        }
    }

    #[test]
    fn rank_ordering_supports_permission_checks() {
        assert!(FactionRank::Founder > FactionRank::Officer);
        assert!(FactionRank::Officer > FactionRank::Member);
    }

    #[test]
    fn shipment_capacities() {
        assert_eq!(ShipmentKind::Courier.capacity(), 100);
        assert_eq!(ShipmentKind::Freight.capacity(), 500);
        assert_eq!(ShipmentKind::Convoy.capacity(), 2000);
    }

    #[test]
    fn tier_quotas() {
        assert_eq!(PlayerTier::Freelance.daily_action_quota(), 200);
        assert_eq!(PlayerTier::Operator.daily_action_quota(), 250);
        assert_eq!(PlayerTier::Command.daily_action_quota(), 300);
    }

    #[test]
    fn event_type_round_trips_through_serde() {
        let json = serde_json::to_string(&EventType::TradeExecuted).unwrap();
        assert_eq!(json, "\"trade_executed\"");
        let back: EventType = serde_json::from_str(&json).unwrap();
        assert_eq!(back, EventType::TradeExecuted);
    }
}
