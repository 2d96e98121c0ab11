//! The in-memory world model.
//!
//! [`WorldState`] is the only legal source of truth while a tick's
//! pipeline runs: stages read and mutate this structure and never re-read
//! from storage mid-pipeline. The server wraps it in a `tokio::sync::RwLock`;
//! the tick pipeline holds the write guard for its entire run, so player
//! actions stall until the tick commits.
//!
//! Persistence is write-through at a layer above: callers serialize the
//! transformation, persist it, and only then release the guard that
//! publishes the updated view.

use std::collections::{BTreeMap, VecDeque};

use burnrate_types::{
    Contract, ContractId, Event, Faction, FactionId, IntelId, IntelReport, Player, PlayerId,
    RouteId, Shipment, ShipmentId, ShipmentStatus, Unit, UnitAssignment, UnitId, WebhookId,
    WebhookRegistration,
};
use burnrate_market::MarketState;
use burnrate_world::WorldGraph;

use crate::clock::WorldClock;
use crate::season::SeasonScores;

/// Maximum events retained in the in-memory log served by `GET /events`.
const EVENT_LOG_CAP: usize = 2_000;

/// The complete mutable simulation state.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct WorldState {
    /// The world clock.
    pub clock: WorldClock,
    /// Zones and routes.
    pub graph: WorldGraph,
    /// Players keyed by ID.
    pub players: BTreeMap<PlayerId, Player>,
    /// API key -> player index.
    pub api_keys: BTreeMap<String, PlayerId>,
    /// Lowercased player name -> player index (uniqueness).
    pub player_names: BTreeMap<String, PlayerId>,
    /// Factions keyed by ID.
    pub factions: BTreeMap<FactionId, Faction>,
    /// Shipments keyed by ID, including terminal ones (history).
    pub shipments: BTreeMap<ShipmentId, Shipment>,
    /// Units keyed by ID.
    pub units: BTreeMap<UnitId, Unit>,
    /// All market state.
    pub market: MarketState,
    /// Contracts keyed by ID.
    pub contracts: BTreeMap<ContractId, Contract>,
    /// Raw intel reports keyed by ID.
    pub intel: BTreeMap<IntelId, IntelReport>,
    /// Webhook registrations keyed by ID.
    pub webhooks: BTreeMap<WebhookId, WebhookRegistration>,
    /// Season score rows.
    pub scores: SeasonScores,
    /// Recent events, newest last, capped.
    pub event_log: VecDeque<Event>,
    /// Events awaiting webhook dispatch, drained each tick.
    pub outbox: Vec<Event>,
}

impl WorldState {
    /// Assemble a world from a generated graph and a fresh clock.
    pub fn new(graph: WorldGraph, clock: WorldClock) -> Self {
        Self {
            clock,
            graph,
            players: BTreeMap::new(),
            api_keys: BTreeMap::new(),
            player_names: BTreeMap::new(),
            factions: BTreeMap::new(),
            shipments: BTreeMap::new(),
            units: BTreeMap::new(),
            market: MarketState::new(),
            contracts: BTreeMap::new(),
            intel: BTreeMap::new(),
            webhooks: BTreeMap::new(),
            scores: SeasonScores::new(),
            event_log: VecDeque::new(),
            outbox: Vec::new(),
        }
    }

    /// Append an event to the log and the webhook outbox.
    pub fn record_event(&mut self, event: Event) {
        self.outbox.push(event.clone());
        self.event_log.push_back(event);
        while self.event_log.len() > EVENT_LOG_CAP {
            self.event_log.pop_front();
        }
    }

    /// Append a batch of events.
    pub fn record_events(&mut self, events: Vec<Event>) {
        for event in events {
            self.record_event(event);
        }
    }

    /// Resolve an API key to a player ID.
    pub fn player_by_key(&self, api_key: &str) -> Option<PlayerId> {
        self.api_keys.get(api_key).copied()
    }

    /// Whether a player name (case-insensitive) is taken.
    pub fn name_taken(&self, name: &str) -> bool {
        self.player_names.contains_key(&name.to_lowercase())
    }

    /// Index a freshly created player.
    pub fn index_player(&mut self, player: Player) {
        self.api_keys.insert(player.api_key.clone(), player.id);
        self.player_names
            .insert(player.name.to_lowercase(), player.id);
        self.players.insert(player.id, player);
    }

    /// A player's units, oldest first (maintenance liquidation order).
    pub fn units_of_player(&self, owner: PlayerId) -> Vec<UnitId> {
        let mut units: Vec<(u64, UnitId)> = self
            .units
            .values()
            .filter(|u| u.owner == owner)
            .map(|u| (u.created_tick, u.id))
            .collect();
        units.sort_unstable();
        units.into_iter().map(|(_, id)| id).collect()
    }

    /// Raiders currently deployed on a route.
    pub fn raiders_on_route(&self, route: RouteId) -> Vec<&Unit> {
        self.units
            .values()
            .filter(|u| matches!(u.assignment, Some(UnitAssignment::Raider(r)) if r == route))
            .collect()
    }

    /// A player's shipments, newest first.
    pub fn shipments_of_player(&self, owner: PlayerId) -> Vec<&Shipment> {
        let mut shipments: Vec<&Shipment> = self
            .shipments
            .values()
            .filter(|s| s.owner == owner)
            .collect();
        shipments.sort_by_key(|s| std::cmp::Reverse(s.created_tick));
        shipments
    }

    /// IDs of in-transit shipments, in stable order.
    pub fn in_transit_shipments(&self) -> Vec<ShipmentId> {
        self.shipments
            .values()
            .filter(|s| s.status == ShipmentStatus::InTransit)
            .map(|s| s.id)
            .collect()
    }

    /// Intel reports visible to a player: their own plus, when they are in
    /// a faction, every report gathered by a *current* member. Membership
    /// changes affect visibility from the current tick forward because
    /// the union is computed against the live member list.
    pub fn intel_visible_to(&self, player: PlayerId) -> Vec<&IntelReport> {
        let faction = self.players.get(&player).and_then(|p| p.faction);
        let members: Vec<PlayerId> = faction
            .and_then(|id| self.factions.get(&id))
            .map(|f| f.members.iter().map(|m| m.player).collect())
            .unwrap_or_default();

        self.intel
            .values()
            .filter(|r| r.gatherer == player || members.contains(&r.gatherer))
            .collect()
    }

    /// Whether a player (directly or via faction intel) holds a Fresh
    /// route report. Drives the raider intel bonus.
    pub fn has_fresh_route_intel(&self, player: PlayerId, route: RouteId, tick: u64) -> bool {
        self.intel_visible_to(player).iter().any(|r| {
            matches!(r.target, burnrate_types::IntelTarget::Route(id) if id == route)
                && crate::intel::is_fresh(r.gathered_tick, tick)
        })
    }

    /// Adjust a player's reputation and score positive gains
    /// (+2 points per reputation point) into the current season.
    pub fn award_reputation(&mut self, player: PlayerId, delta: i64) {
        let season = self.clock.season();
        if let Some(p) = self.players.get_mut(&player) {
            p.reputation = p.reputation.saturating_add(delta);
            if delta > 0 {
                self.scores.add(
                    season,
                    player.into_inner(),
                    burnrate_types::ActorKind::Player,
                    burnrate_types::ScoreCategory::ReputationGained,
                    delta.saturating_mul(2),
                );
            }
        }
    }

    /// Accumulate season points for a player.
    pub fn score_player(
        &mut self,
        player: PlayerId,
        category: burnrate_types::ScoreCategory,
        points: i64,
    ) {
        let season = self.clock.season();
        self.scores.add(
            season,
            player.into_inner(),
            burnrate_types::ActorKind::Player,
            category,
            points,
        );
    }

    /// Accumulate season points for a faction.
    pub fn score_faction(
        &mut self,
        faction: FactionId,
        category: burnrate_types::ScoreCategory,
        points: i64,
    ) {
        let season = self.clock.season();
        self.scores.add(
            season,
            faction.into_inner(),
            burnrate_types::ActorKind::Faction,
            category,
            points,
        );
    }

    /// Count of a player's open (non-terminal) posted contracts.
    pub fn open_contracts_of(&self, poster: PlayerId) -> usize {
        self.contracts
            .values()
            .filter(|c| {
                matches!(
                    c.status,
                    burnrate_types::ContractStatus::Open | burnrate_types::ContractStatus::Accepted
                ) && matches!(c.poster, burnrate_types::ContractParty::Player(p) if p == poster)
            })
            .count()
    }
}
