//! Season scoring and the end-of-season hard reset.
//!
//! Score deltas are emitted by the action processor and the tick engine
//! into per-(season, entity) rows. `zones_controlled` is recomputed at
//! every tick boundary from held zones and their compliance streaks; all
//! other categories accumulate.

use std::collections::BTreeMap;

use burnrate_types::{
    ActorKind, ContractStatus, Event, EventType, Inventory, ScoreCategory, SeasonScore,
};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde_json::json;
use uuid::Uuid;

use crate::state::WorldState;

/// Starting credit balance, granted at join and restored at season reset.
pub const STARTING_CREDITS: i64 = 500;

/// The compliance-streak multiplier applied to zone-control scoring.
pub fn streak_multiplier(streak: u32) -> Decimal {
    match streak {
        0..=4 => Decimal::ONE,
        5..=19 => Decimal::new(12, 1),
        20..=49 => Decimal::new(15, 1),
        50..=99 => Decimal::TWO,
        _ => Decimal::new(3, 0),
    }
}

/// All score rows, keyed by (season, entity).
///
/// Serialized as an entry list: the composite key cannot be a JSON
/// object key, and the table is part of the persisted world aggregate.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct SeasonScores {
    #[serde(with = "entry_list")]
    rows: BTreeMap<(u32, Uuid), SeasonScore>,
}

/// Serde adapter for the composite-keyed row map: `[[key, value], ...]`.
mod entry_list {
    use std::collections::BTreeMap;

    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S, K, V>(map: &BTreeMap<K, V>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
        K: Serialize,
        V: Serialize,
    {
        serializer.collect_seq(map.iter())
    }

    pub fn deserialize<'de, D, K, V>(deserializer: D) -> Result<BTreeMap<K, V>, D::Error>
    where
        D: Deserializer<'de>,
        K: Deserialize<'de> + Ord,
        V: Deserialize<'de>,
    {
        let entries: Vec<(K, V)> = Vec::deserialize(deserializer)?;
        Ok(entries.into_iter().collect())
    }
}

impl SeasonScores {
    /// Empty score table.
    pub const fn new() -> Self {
        Self {
            rows: BTreeMap::new(),
        }
    }

    /// The row for (season, entity), created on first touch.
    pub fn entry(&mut self, season: u32, entity: Uuid, kind: ActorKind) -> &mut SeasonScore {
        self.rows
            .entry((season, entity))
            .or_insert_with(|| SeasonScore::new(season, entity, kind))
    }

    /// Accumulate points into a category.
    pub fn add(
        &mut self,
        season: u32,
        entity: Uuid,
        kind: ActorKind,
        category: ScoreCategory,
        points: i64,
    ) {
        if points != 0 {
            self.entry(season, entity, kind).add(category, points);
        }
    }

    /// Overwrite a recomputed category.
    pub fn set(
        &mut self,
        season: u32,
        entity: Uuid,
        kind: ActorKind,
        category: ScoreCategory,
        points: i64,
    ) {
        self.entry(season, entity, kind).set(category, points);
    }

    /// Look up a row.
    pub fn get(&self, season: u32, entity: Uuid) -> Option<&SeasonScore> {
        self.rows.get(&(season, entity))
    }

    /// Iterate over every row across all seasons.
    pub fn rows(&self) -> impl Iterator<Item = &SeasonScore> {
        self.rows.values()
    }

    /// Insert a restored row (world load path).
    pub fn insert_row(&mut self, row: SeasonScore) {
        self.rows.insert((row.season, row.entity), row);
    }

    /// All rows for a season, sorted by derived total descending.
    pub fn leaderboard(&self, season: u32, limit: usize) -> Vec<&SeasonScore> {
        let mut rows: Vec<&SeasonScore> = self
            .rows
            .iter()
            .filter(|((s, _), _)| *s == season)
            .map(|(_, row)| row)
            .collect();
        rows.sort_by_key(|row| std::cmp::Reverse(row.total()));
        rows.truncate(limit);
        rows
    }
}

/// Execute the season reset against the whole world.
///
/// Archival is the storage layer's job (rows for the outgoing season are
/// simply left in place under their season number). In memory this:
/// clears zone ownership and stockpiles, normalizes player inventories to
/// starting credits, halves reputation (floor), deletes shipments, units,
/// market orders, active contracts, and intel, empties faction
/// treasuries, and advances the season counter. Accounts, licenses,
/// faction identities, and memberships survive.
pub fn apply_reset(state: &mut WorldState) -> Event {
    let previous = state.clock.season();
    let tick = state.clock.tick();

    for zone in state.graph.zones_mut() {
        zone.owner = None;
        zone.supply_level = Decimal::ZERO;
        zone.compliance_streak = 0;
        zone.su_stockpile = 0;
        zone.medkit_stockpile = 0;
        zone.comms_stockpile = 0;
        zone.inventory.clear();
        zone.garrison = 0;
        zone.collapsed = false;
    }

    for player in state.players.values_mut() {
        player.inventory = Inventory::with_credits(STARTING_CREDITS);
        player.reputation = player.reputation.div_euclid(2);
    }

    state.shipments.clear();
    state.units.clear();
    state.market.clear();
    state
        .contracts
        .retain(|_, c| !matches!(c.status, ContractStatus::Open | ContractStatus::Accepted));
    state.intel.clear();

    for faction in state.factions.values_mut() {
        faction.treasury = Inventory::default();
        faction.withdrawals.clear();
    }

    state.clock.begin_next_season();

    tracing::info!(
        previous_season = previous,
        new_season = state.clock.season(),
        tick,
        "season reset applied"
    );

    Event::now(
        EventType::SeasonReset,
        tick,
        None,
        ActorKind::System,
        json!({
            "previous_season": previous,
            "new_season": state.clock.season(),
        }),
    )
}

/// Recompute the `zones_controlled` category for every faction at a tick
/// boundary: the sum over held zones of the streak multiplier, rounded.
///
/// Every known faction is visited, not just the current owners: the
/// category is a replacement, so a faction whose last zone collapsed or
/// was captured must drop back to zero rather than keep its stale value.
pub fn recompute_zone_control(state: &mut WorldState) {
    let season = state.clock.season();
    let mut per_faction: BTreeMap<Uuid, Decimal> = BTreeMap::new();
    for zone in state.graph.zones() {
        if let Some(owner) = zone.owner {
            let slot = per_faction.entry(owner.into_inner()).or_insert(Decimal::ZERO);
            *slot += streak_multiplier(zone.compliance_streak);
        }
    }

    let faction_ids: Vec<Uuid> = state.factions.keys().map(|id| id.into_inner()).collect();
    for entity in faction_ids {
        let rounded = per_faction
            .get(&entity)
            .map_or(0, |points| points.round().to_i64().unwrap_or(0));
        state
            .scores
            .set(season, entity, ActorKind::Faction, ScoreCategory::ZonesControlled, rounded);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn multiplier_brackets() {
        assert_eq!(streak_multiplier(0), Decimal::ONE);
        assert_eq!(streak_multiplier(4), Decimal::ONE);
        assert_eq!(streak_multiplier(5), Decimal::new(12, 1));
        assert_eq!(streak_multiplier(19), Decimal::new(12, 1));
        assert_eq!(streak_multiplier(20), Decimal::new(15, 1));
        assert_eq!(streak_multiplier(50), Decimal::TWO);
        assert_eq!(streak_multiplier(100), Decimal::new(3, 0));
        assert_eq!(streak_multiplier(9_999), Decimal::new(3, 0));
    }

    #[test]
    fn leaderboard_sorts_by_total() {
        let mut scores = SeasonScores::new();
        let a = Uuid::now_v7();
        let b = Uuid::now_v7();
        scores.add(1, a, ActorKind::Player, ScoreCategory::SupplyDelivered, 10);
        scores.add(1, b, ActorKind::Player, ScoreCategory::ContractsCompleted, 50);
        scores.add(2, a, ActorKind::Player, ScoreCategory::SupplyDelivered, 999);

        let board = scores.leaderboard(1, 10);
        assert_eq!(board.len(), 2);
        assert_eq!(board[0].entity, b);
        assert_eq!(board[1].entity, a);
    }
}
