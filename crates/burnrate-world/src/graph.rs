//! World graph: zones as nodes, routes as weighted directed edges.
//!
//! The [`WorldGraph`] is the spatial backbone of the simulation. It stores
//! all [`Zone`] nodes and [`Route`] edges and provides neighbor lookups,
//! direct-route queries, and shipment-path validation.
//!
//! Internally, an adjacency map indexes outbound routes per zone:
//! `BTreeMap<ZoneId, Vec<RouteId>>`. Routes are directed; world generation
//! emits a separate route row per direction.

use std::collections::BTreeMap;

use burnrate_types::{Route, RouteId, Zone, ZoneId, ZoneKind};

use crate::error::WorldError;

/// The world graph holding all zones and routes.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct WorldGraph {
    /// All zones indexed by their identifier.
    zones: BTreeMap<ZoneId, Zone>,
    /// All routes indexed by their identifier.
    routes: BTreeMap<RouteId, Route>,
    /// Outbound adjacency: zone -> route IDs departing from it.
    outbound: BTreeMap<ZoneId, Vec<RouteId>>,
}

impl WorldGraph {
    /// Create an empty world graph.
    pub const fn new() -> Self {
        Self {
            zones: BTreeMap::new(),
            routes: BTreeMap::new(),
            outbound: BTreeMap::new(),
        }
    }

    // -------------------------------------------------------------------
    // Zone operations
    // -------------------------------------------------------------------

    /// Add a zone to the graph.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::DuplicateZone`] if a zone with the same ID
    /// already exists.
    pub fn add_zone(&mut self, zone: Zone) -> Result<(), WorldError> {
        let id = zone.id;
        if self.zones.contains_key(&id) {
            return Err(WorldError::DuplicateZone(id));
        }
        self.zones.insert(id, zone);
        self.outbound.entry(id).or_default();
        Ok(())
    }

    /// Get an immutable reference to a zone.
    pub fn zone(&self, id: ZoneId) -> Option<&Zone> {
        self.zones.get(&id)
    }

    /// Get a mutable reference to a zone.
    pub fn zone_mut(&mut self, id: ZoneId) -> Option<&mut Zone> {
        self.zones.get_mut(&id)
    }

    /// Number of zones in the graph.
    pub fn zone_count(&self) -> usize {
        self.zones.len()
    }

    /// All zone IDs.
    pub fn zone_ids(&self) -> Vec<ZoneId> {
        self.zones.keys().copied().collect()
    }

    /// Iterate over all zones immutably.
    pub fn zones(&self) -> impl Iterator<Item = &Zone> {
        self.zones.values()
    }

    /// Iterate over all zones mutably.
    pub fn zones_mut(&mut self) -> impl Iterator<Item = &mut Zone> {
        self.zones.values_mut()
    }

    /// IDs of all zones of the given kind.
    pub fn zones_of_kind(&self, kind: ZoneKind) -> Vec<ZoneId> {
        self.zones
            .values()
            .filter(|z| z.kind == kind)
            .map(|z| z.id)
            .collect()
    }

    // -------------------------------------------------------------------
    // Route operations
    // -------------------------------------------------------------------

    /// Add a directed route to the graph.
    ///
    /// Both endpoints must already exist and the distance must be at
    /// least 1 tick.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::ZoneNotFound`] if either endpoint is missing,
    /// [`WorldError::DuplicateRoute`] if the route ID already exists, or
    /// [`WorldError::ZeroDistance`] for a zero-length route.
    pub fn add_route(&mut self, route: Route) -> Result<(), WorldError> {
        if !self.zones.contains_key(&route.from_zone) {
            return Err(WorldError::ZoneNotFound(route.from_zone));
        }
        if !self.zones.contains_key(&route.to_zone) {
            return Err(WorldError::ZoneNotFound(route.to_zone));
        }
        if self.routes.contains_key(&route.id) {
            return Err(WorldError::DuplicateRoute(route.id));
        }
        if route.distance_ticks == 0 {
            return Err(WorldError::ZeroDistance(route.id));
        }

        let id = route.id;
        let from = route.from_zone;
        self.routes.insert(id, route);
        self.outbound.entry(from).or_default().push(id);
        Ok(())
    }

    /// Get an immutable reference to a route.
    pub fn route(&self, id: RouteId) -> Option<&Route> {
        self.routes.get(&id)
    }

    /// Number of routes in the graph.
    pub fn route_count(&self) -> usize {
        self.routes.len()
    }

    /// Iterate over all routes immutably.
    pub fn routes(&self) -> impl Iterator<Item = &Route> {
        self.routes.values()
    }

    /// All routes departing from a zone.
    pub fn routes_from(&self, zone: ZoneId) -> Vec<&Route> {
        self.outbound
            .get(&zone)
            .map(|ids| ids.iter().filter_map(|id| self.routes.get(id)).collect())
            .unwrap_or_default()
    }

    // -------------------------------------------------------------------
    // Graph queries
    // -------------------------------------------------------------------

    /// Zones directly reachable from the given zone, with the route taken.
    pub fn neighbors(&self, zone: ZoneId) -> Vec<(ZoneId, RouteId)> {
        let Some(route_ids) = self.outbound.get(&zone) else {
            return Vec::new();
        };
        route_ids
            .iter()
            .filter_map(|id| self.routes.get(id).map(|r| (r.to_zone, r.id)))
            .collect()
    }

    /// The direct route from `from` to `to`, if one exists.
    pub fn route_between(&self, from: ZoneId, to: ZoneId) -> Option<&Route> {
        let route_ids = self.outbound.get(&from)?;
        route_ids
            .iter()
            .filter_map(|id| self.routes.get(id))
            .find(|r| r.to_zone == to)
    }

    /// Validate a shipment path: at least two zones, every zone exists,
    /// and every consecutive pair is connected by a direct route.
    ///
    /// Returns the routes traversed, in order.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::PathTooShort`], [`WorldError::ZoneNotFound`],
    /// or [`WorldError::NoRoute`] on the first violation.
    pub fn validate_path(&self, path: &[ZoneId]) -> Result<Vec<&Route>, WorldError> {
        if path.len() < 2 {
            return Err(WorldError::PathTooShort);
        }
        for id in path {
            if !self.zones.contains_key(id) {
                return Err(WorldError::ZoneNotFound(*id));
            }
        }
        let mut legs = Vec::with_capacity(path.len() - 1);
        for pair in path.windows(2) {
            let (from, to) = (pair[0], pair[1]);
            let route = self
                .route_between(from, to)
                .ok_or(WorldError::NoRoute { from, to })?;
            legs.push(route);
        }
        Ok(legs)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;

    fn make_zone(kind: ZoneKind, name: &str) -> Zone {
        Zone::new(ZoneId::new(), name, kind)
    }

    fn make_route(from: ZoneId, to: ZoneId, distance: u32) -> Route {
        Route {
            id: RouteId::new(),
            from_zone: from,
            to_zone: to,
            distance_ticks: distance,
            capacity_per_tick: 10,
            base_risk: Decimal::new(10, 2),
            chokepoint: Decimal::new(15, 1),
        }
    }

    fn two_zone_graph() -> (WorldGraph, ZoneId, ZoneId) {
        let mut graph = WorldGraph::new();
        let a = make_zone(ZoneKind::Hub, "Relay North");
        let b = make_zone(ZoneKind::Field, "Ashfield");
        let (ida, idb) = (a.id, b.id);
        graph.add_zone(a).unwrap();
        graph.add_zone(b).unwrap();
        graph.add_route(make_route(ida, idb, 2)).unwrap();
        (graph, ida, idb)
    }

    #[test]
    fn duplicate_zone_rejected() {
        let mut graph = WorldGraph::new();
        let zone = make_zone(ZoneKind::Hub, "Relay North");
        let copy = zone.clone();
        graph.add_zone(zone).unwrap();
        assert!(matches!(
            graph.add_zone(copy),
            Err(WorldError::DuplicateZone(_))
        ));
    }

    #[test]
    fn route_requires_both_endpoints() {
        let mut graph = WorldGraph::new();
        let a = make_zone(ZoneKind::Hub, "Relay North");
        let ida = a.id;
        graph.add_zone(a).unwrap();
        let result = graph.add_route(make_route(ida, ZoneId::new(), 1));
        assert!(matches!(result, Err(WorldError::ZoneNotFound(_))));
    }

    #[test]
    fn zero_distance_route_rejected() {
        let (mut graph, a, b) = two_zone_graph();
        let result = graph.add_route(make_route(a, b, 0));
        assert!(matches!(result, Err(WorldError::ZeroDistance(_))));
    }

    #[test]
    fn routes_are_directed() {
        let (graph, a, b) = two_zone_graph();
        assert!(graph.route_between(a, b).is_some());
        assert!(graph.route_between(b, a).is_none());
        assert_eq!(graph.neighbors(a).len(), 1);
        assert!(graph.neighbors(b).is_empty());
    }

    #[test]
    fn path_validation_walks_every_leg() {
        let mut graph = WorldGraph::new();
        let a = make_zone(ZoneKind::Hub, "Relay North");
        let b = make_zone(ZoneKind::Junction, "Crossing Seven");
        let c = make_zone(ZoneKind::Front, "Salient");
        let (ida, idb, idc) = (a.id, b.id, c.id);
        graph.add_zone(a).unwrap();
        graph.add_zone(b).unwrap();
        graph.add_zone(c).unwrap();
        graph.add_route(make_route(ida, idb, 1)).unwrap();
        graph.add_route(make_route(idb, idc, 3)).unwrap();

        let legs = graph.validate_path(&[ida, idb, idc]).unwrap();
        assert_eq!(legs.len(), 2);
        assert_eq!(legs[0].distance_ticks, 1);
        assert_eq!(legs[1].distance_ticks, 3);

        // Skipping the junction has no direct route.
        assert!(matches!(
            graph.validate_path(&[ida, idc]),
            Err(WorldError::NoRoute { .. })
        ));
        assert!(matches!(
            graph.validate_path(&[ida]),
            Err(WorldError::PathTooShort)
        ));
    }
}
