//! Deterministic starting-world generation.
//!
//! [`generate_world`] builds a connected graph of 40-60 zones from a seed.
//! The same seed always produces the same world, which keeps test
//! fixtures and replay stable.
//!
//! Layout strategy: hubs are created first, every later zone links back to
//! a random earlier zone (guaranteeing a single connected component), then
//! extra cross links are added for route diversity. Every link is a pair
//! of directed routes sharing distance, risk, and chokepoint.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::Decimal;

use burnrate_types::{Resource, Route, RouteId, Zone, ZoneId, ZoneKind};

use crate::error::WorldError;
use crate::graph::WorldGraph;

/// Upper bound on total zones; junction count is trimmed to fit.
const MAX_ZONES: usize = 60;

/// Hub names. Hubs are spawn points, so the pool matches the max count.
const HUB_NAMES: [&str; 4] = ["Relay North", "Relay South", "Relay East", "Relay West"];

const FACTORY_NAMES: [&str; 12] = [
    "Ironworks", "Cannery Row", "Foundry Hill", "Gearage", "Smelter Flats", "Looms",
    "Chemworks", "Assembly Nine", "Rolling Mill", "Kiln Yards", "Pressworks", "Dynamo",
];

const FIELD_NAMES: [&str; 16] = [
    "Ashfield", "Tarpit Flats", "Granary Vale", "Fiber Downs", "Redrock Pit", "Wellhead",
    "Harvest Bend", "Cottonreach", "Slagmoor", "Derrick Row", "Millet Plain", "Hempstead",
    "Orecliff", "Petrol Basin", "Wheatmarch", "Thistledown",
];

const JUNCTION_NAMES: [&str; 15] = [
    "Crossing One", "Crossing Two", "Crossing Three", "Crossing Four", "Crossing Five",
    "Crossing Six", "Crossing Seven", "Crossing Eight", "Crossing Nine", "Crossing Ten",
    "Crossing Eleven", "Crossing Twelve", "Crossing Thirteen", "Crossing Fourteen",
    "Crossing Fifteen",
];

const FRONT_NAMES: [&str; 10] = [
    "The Salient", "Broken Ridge", "Shellline", "Mud Reach", "Wire Gap", "The Pocket",
    "Ember Line", "Crater Row", "Forward Epsilon", "The Hinge",
];

const STRONGHOLD_NAMES: [&str; 5] = [
    "Bastion Prime", "The Citadel", "Keystone", "Fort Anchor", "High Redoubt",
];

/// Generate a complete starting world from a seed.
///
/// # Errors
///
/// Returns [`WorldError`] if graph assembly fails; with valid name pools
/// this only happens on internal invariant violations.
pub fn generate_world(seed: u64) -> Result<WorldGraph, WorldError> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut graph = WorldGraph::new();

    let hub_count = rng.random_range(3..=4usize);
    let factory_count = rng.random_range(8..=12usize);
    let field_count = rng.random_range(12..=16usize);
    let front_count = rng.random_range(6..=10usize);
    let stronghold_count = rng.random_range(3..=5usize);
    let mut junction_count = rng.random_range(10..=15usize);

    let others = hub_count + factory_count + field_count + front_count + stronghold_count;
    junction_count = junction_count.min(MAX_ZONES.saturating_sub(others)).max(1);

    let mut zone_ids: Vec<ZoneId> = Vec::new();

    // Hubs first: the backbone grows outward from them, and players spawn
    // there.
    spawn_zones(&mut graph, &mut zone_ids, ZoneKind::Hub, hub_count, &HUB_NAMES)?;
    spawn_zones(&mut graph, &mut zone_ids, ZoneKind::Junction, junction_count, &JUNCTION_NAMES)?;
    spawn_zones(&mut graph, &mut zone_ids, ZoneKind::Factory, factory_count, &FACTORY_NAMES)?;

    // Fields get a raw resource each, cycling through the four raws.
    let field_start = zone_ids.len();
    spawn_zones(&mut graph, &mut zone_ids, ZoneKind::Field, field_count, &FIELD_NAMES)?;
    for (offset, id) in zone_ids[field_start..].iter().enumerate() {
        if let Some(zone) = graph.zone_mut(*id) {
            zone.field_resource = Some(Resource::RAW[offset % Resource::RAW.len()]);
        }
    }

    spawn_zones(&mut graph, &mut zone_ids, ZoneKind::Front, front_count, &FRONT_NAMES)?;
    spawn_zones(&mut graph, &mut zone_ids, ZoneKind::Stronghold, stronghold_count, &STRONGHOLD_NAMES)?;

    // Spanning backbone: each zone after the first links to a random
    // earlier zone, keeping the graph a single component.
    for i in 1..zone_ids.len() {
        let back = rng.random_range(0..i);
        link(&mut graph, &mut rng, zone_ids[i], zone_ids[back])?;
    }

    // Cross links for route diversity.
    let extra = zone_ids.len() / 2;
    let mut added = 0usize;
    let mut attempts = 0usize;
    while added < extra && attempts < extra * 10 {
        attempts += 1;
        let a = zone_ids[rng.random_range(0..zone_ids.len())];
        let b = zone_ids[rng.random_range(0..zone_ids.len())];
        if a == b || graph.route_between(a, b).is_some() {
            continue;
        }
        link(&mut graph, &mut rng, a, b)?;
        added += 1;
    }

    tracing::info!(
        zones = graph.zone_count(),
        routes = graph.route_count(),
        seed,
        "starting world generated"
    );

    Ok(graph)
}

/// Create `count` zones of a kind, naming them from the pool.
fn spawn_zones(
    graph: &mut WorldGraph,
    zone_ids: &mut Vec<ZoneId>,
    kind: ZoneKind,
    count: usize,
    names: &[&str],
) -> Result<(), WorldError> {
    for i in 0..count {
        let name = names
            .get(i)
            .map_or_else(|| format!("{kind:?} {}", i + 1), |n| (*n).to_owned());
        let zone = Zone::new(ZoneId::new(), name, kind);
        zone_ids.push(zone.id);
        graph.add_zone(zone)?;
    }
    Ok(())
}

/// Link two zones with a pair of directed routes sharing characteristics.
///
/// Routes touching a Front or Stronghold carry elevated base risk.
fn link(
    graph: &mut WorldGraph,
    rng: &mut StdRng,
    a: ZoneId,
    b: ZoneId,
) -> Result<(), WorldError> {
    let contested = [a, b].iter().any(|id| {
        graph
            .zone(*id)
            .is_some_and(|z| matches!(z.kind, ZoneKind::Front | ZoneKind::Stronghold))
    });

    let distance = rng.random_range(1..=4u32);
    let capacity = rng.random_range(5..=20u32);
    let risk_pct = if contested {
        rng.random_range(10..=30i64)
    } else {
        rng.random_range(0..=20i64)
    };
    let base_risk = Decimal::new(risk_pct, 2);
    let chokepoint = Decimal::new(rng.random_range(10..=30i64), 1);

    for (from, to) in [(a, b), (b, a)] {
        graph.add_route(Route {
            id: RouteId::new(),
            from_zone: from,
            to_zone: to,
            distance_ticks: distance,
            capacity_per_tick: capacity,
            base_risk,
            chokepoint,
        })?;
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;

    #[test]
    fn world_size_is_in_bounds() {
        let graph = generate_world(7).unwrap();
        assert!(graph.zone_count() >= 40, "got {}", graph.zone_count());
        assert!(graph.zone_count() <= 60, "got {}", graph.zone_count());
    }

    #[test]
    fn kind_counts_match_ranges() {
        let graph = generate_world(7).unwrap();
        let hubs = graph.zones_of_kind(ZoneKind::Hub).len();
        let strongholds = graph.zones_of_kind(ZoneKind::Stronghold).len();
        assert!((3..=4).contains(&hubs));
        assert!((3..=5).contains(&strongholds));
    }

    #[test]
    fn generation_is_deterministic_per_seed() {
        let first = generate_world(42).unwrap();
        let second = generate_world(42).unwrap();
        assert_eq!(first.zone_count(), second.zone_count());
        assert_eq!(first.route_count(), second.route_count());
        let names: BTreeSet<String> = first.zones().map(|z| z.name.clone()).collect();
        let names2: BTreeSet<String> = second.zones().map(|z| z.name.clone()).collect();
        assert_eq!(names, names2);
    }

    #[test]
    fn every_field_has_a_raw_resource() {
        let graph = generate_world(3).unwrap();
        for id in graph.zones_of_kind(ZoneKind::Field) {
            let zone = graph.zone(id).unwrap();
            let resource = zone.field_resource.unwrap();
            assert!(resource.is_raw());
        }
    }

    #[test]
    fn world_is_connected() {
        let graph = generate_world(11).unwrap();
        let ids = graph.zone_ids();
        let start = ids[0];
        let mut seen: BTreeSet<ZoneId> = BTreeSet::new();
        let mut frontier = vec![start];
        while let Some(zone) = frontier.pop() {
            if !seen.insert(zone) {
                continue;
            }
            for (next, _) in graph.neighbors(zone) {
                frontier.push(next);
            }
        }
        assert_eq!(seen.len(), ids.len(), "unreachable zones exist");
    }

    #[test]
    fn risks_stay_within_spec_range() {
        let graph = generate_world(5).unwrap();
        for route in graph.routes() {
            assert!(route.base_risk >= Decimal::ZERO);
            assert!(route.base_risk <= Decimal::new(30, 2));
            assert!(route.chokepoint >= Decimal::ONE);
            assert!(route.chokepoint <= Decimal::new(30, 1));
            assert!(route.distance_ticks >= 1);
        }
    }
}
