//! Shared type definitions for the Burnrate simulation.
//!
//! This crate is the single source of truth for all types used across the
//! Burnrate workspace: typed identifiers, domain enums with their fixed
//! game constants, and the aggregate entity structs the storage layer
//! persists and the world model caches.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe UUID wrappers for all entity identifiers
//! - [`enums`] -- Enumeration types (zones, resources, tiers, events)
//! - [`structs`] -- Core entity structs (players, zones, shipments, orders)

pub mod enums;
pub mod ids;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use enums::{
    ActorKind, CombatOutcome, ContractKind, ContractStatus, EventType, FactionRank,
    FactionRelation, Freshness, IntelTargetKind, LicenseKind, OrderSide, PlayerTier, Resource,
    ScoreCategory, ShipmentKind, ShipmentStatus, UnitKind, ZoneKind,
};
pub use ids::{
    ContractId, DoctrineId, EventId, FactionId, IntelId, OrderId, PlayerId, RouteId, ShipmentId,
    UnitId, WebhookId, ZoneId,
};
pub use structs::{
    ConditionalOrder, Contract, ContractParty, ContractTerms, DailyWithdrawal, Doctrine, Event,
    Faction, FactionMember, IntelReport, IntelSnapshot, IntelTarget, Inventory, LicenseSet,
    MarketOrder, Player, PriceTrigger, Route, RouteObservation, SeasonScore, Shipment, TwapOrder,
    Unit, UnitAssignment, WebhookRegistration, Zone, ZoneObservation,
};
