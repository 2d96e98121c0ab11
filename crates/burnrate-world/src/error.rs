//! Error types for world graph operations.

use burnrate_types::{RouteId, ZoneId};

/// Errors that can occur when building or querying the world graph.
#[derive(Debug, thiserror::Error)]
pub enum WorldError {
    /// A zone with the same ID already exists.
    #[error("duplicate zone: {0}")]
    DuplicateZone(ZoneId),

    /// A route with the same ID already exists.
    #[error("duplicate route: {0}")]
    DuplicateRoute(RouteId),

    /// A referenced zone does not exist.
    #[error("zone not found: {0}")]
    ZoneNotFound(ZoneId),

    /// A route's distance was below the minimum of 1 tick.
    #[error("route {0} has zero distance")]
    ZeroDistance(RouteId),

    /// No direct route connects two zones.
    #[error("no route from {from} to {to}")]
    NoRoute {
        /// Origin zone.
        from: ZoneId,
        /// Destination zone.
        to: ZoneId,
    },

    /// A shipment path was empty or had a single entry.
    #[error("path must contain at least two zones")]
    PathTooShort,
}
