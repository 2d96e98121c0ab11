//! Type-safe identifier wrappers around [`Uuid`].
//!
//! Every entity in the simulation has a strongly-typed ID to prevent
//! accidental mixing of identifiers at compile time. All IDs use UUID v7
//! (time-ordered) for efficient database indexing.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Generates a newtype wrapper around [`Uuid`] with standard derives.
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Create a new identifier using UUID v7 (time-ordered).
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            /// Return the inner [`Uuid`] value.
            pub const fn into_inner(self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<Uuid> for $name {
            fn from(id: Uuid) -> Self {
                Self(id)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_id! {
    /// Unique identifier for a player account.
    PlayerId
}

define_id! {
    /// Unique identifier for a zone (node in the world graph).
    ZoneId
}

define_id! {
    /// Unique identifier for a route (directed edge in the world graph).
    RouteId
}

define_id! {
    /// Unique identifier for a faction.
    FactionId
}

define_id! {
    /// Unique identifier for a shipment in transit.
    ShipmentId
}

define_id! {
    /// Unique identifier for a combat unit (escort or raider).
    UnitId
}

define_id! {
    /// Unique identifier for a market order.
    OrderId
}

define_id! {
    /// Unique identifier for a contract posting.
    ContractId
}

define_id! {
    /// Unique identifier for an intel report.
    IntelId
}

define_id! {
    /// Unique identifier for an event in the audit log.
    EventId
}

define_id! {
    /// Unique identifier for a webhook registration.
    WebhookId
}

define_id! {
    /// Unique identifier for a faction doctrine document.
    DoctrineId
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_distinct_types() {
        let player = PlayerId::new();
        let zone = ZoneId::new();
        // These are different types -- the compiler enforces no mixing.
        assert_ne!(player.into_inner(), Uuid::nil());
        assert_ne!(zone.into_inner(), Uuid::nil());
    }

    #[test]
    fn ids_serialize_as_bare_uuids() {
        let id = ZoneId::new();
        let json = serde_json::to_string(&id).unwrap_or_default();
        // Transparent serde: no wrapper object, just the UUID string.
        assert!(json.starts_with('"'));
        let back: ZoneId = serde_json::from_str(&json).unwrap_or_default();
        assert_eq!(back, id);
    }

    #[test]
    fn v7_ids_are_time_ordered() {
        let first = EventId::new();
        let second = EventId::new();
        assert!(first <= second);
    }
}
