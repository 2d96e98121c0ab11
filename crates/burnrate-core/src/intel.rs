//! Intel projection with freshness-driven decay.
//!
//! Reports are stored raw and projected to the current tick on every
//! read. The projection is pure: the same stored record can be rendered
//! Fresh, Stale, and Expired at different ticks without any storage
//! mutation. Only the deletion sweep (every 50 ticks, age >= 200)
//! touches storage.

use burnrate_types::{
    Freshness, IntelId, IntelReport, IntelSnapshot, IntelTarget, PlayerId,
};
use rust_decimal::prelude::ToPrimitive;
use serde_json::json;

/// Age below which a report is Fresh and served unmodified.
pub const FRESH_MAX_AGE: u64 = 10;

/// Age below which a report is Stale (degraded); at or above, Expired.
pub const STALE_MAX_AGE: u64 = 50;

/// Age at or above which a report is hard-deleted by the sweep.
pub const DELETE_AGE: u64 = 200;

/// The sweep runs every this many ticks.
pub const SWEEP_INTERVAL: u64 = 50;

/// Width of the numeric ranges Stale values are rounded into.
const RANGE_WIDTH: u32 = 25;

/// A report projected to a specific tick.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct ProjectedIntel {
    /// The underlying report.
    pub id: IntelId,
    /// The observer.
    pub gatherer: PlayerId,
    /// What was observed.
    pub target: IntelTarget,
    /// When it was observed.
    pub gathered_tick: u64,
    /// Age at projection time.
    pub age: u64,
    /// Freshness bucket.
    pub freshness: Freshness,
    /// Signal quality, 0-100, monotone non-increasing with age.
    pub signal_quality: u8,
    /// The decayed payload.
    pub data: serde_json::Value,
}

/// The freshness bucket for a given age.
pub const fn freshness(age: u64) -> Freshness {
    if age < FRESH_MAX_AGE {
        Freshness::Fresh
    } else if age < STALE_MAX_AGE {
        Freshness::Stale
    } else {
        Freshness::Expired
    }
}

/// Signal quality for a given age: 100 while Fresh, a linear ramp from
/// 100 down to 0 across the Stale window, 0 once Expired.
pub fn signal_quality(age: u64) -> u8 {
    match freshness(age) {
        Freshness::Fresh => 100,
        Freshness::Expired => 0,
        Freshness::Stale => {
            let into_stale = age.saturating_sub(FRESH_MAX_AGE);
            let window = STALE_MAX_AGE - FRESH_MAX_AGE;
            let quality = 100u64.saturating_sub(into_stale.saturating_mul(100) / window);
            quality.min(100) as u8
        }
    }
}

/// Round a value into its enclosing range, e.g. 63 -> "50-75".
fn range_of(value: u32) -> String {
    let lo = (value / RANGE_WIDTH) * RANGE_WIDTH;
    let hi = lo + RANGE_WIDTH;
    format!("{lo}-{hi}")
}

/// Project a report to the current tick.
pub fn project(report: &IntelReport, current_tick: u64) -> ProjectedIntel {
    let age = current_tick.saturating_sub(report.gathered_tick);
    let bucket = freshness(age);
    let quality = signal_quality(age);

    let data = match (bucket, &report.snapshot) {
        (Freshness::Fresh, snapshot) => {
            serde_json::to_value(snapshot).unwrap_or_else(|_| json!({}))
        }
        (Freshness::Stale, IntelSnapshot::Zone(zone)) => {
            let supply = zone.supply_level.to_u32().unwrap_or(0);
            json!({
                "kind": "zone",
                "name": zone.name,
                "zone_kind": zone.kind,
                "owner": zone.owner,
                "supply_level": range_of(supply),
                "su_stockpile": range_of(zone.su_stockpile),
                "garrison": range_of(zone.garrison),
            })
        }
        (Freshness::Stale, IntelSnapshot::Route(route)) => {
            json!({
                "kind": "route",
                "base_risk": route.base_risk.round_dp(1),
                "chokepoint": route.chokepoint,
                "capacity_per_tick": route.capacity_per_tick,
            })
        }
        (Freshness::Expired, IntelSnapshot::Zone(zone)) => {
            json!({ "kind": "zone", "last_seen_owner": zone.owner })
        }
        (Freshness::Expired, IntelSnapshot::Route(_)) => {
            json!({ "kind": "route" })
        }
    };

    ProjectedIntel {
        id: report.id,
        gatherer: report.gatherer,
        target: report.target,
        gathered_tick: report.gathered_tick,
        age,
        freshness: bucket,
        signal_quality: quality,
        data,
    }
}

/// Whether a report should be hard-deleted at the given tick.
pub const fn should_delete(gathered_tick: u64, current_tick: u64) -> bool {
    current_tick.saturating_sub(gathered_tick) >= DELETE_AGE
}

/// Whether a report counts as Fresh at the given tick (raider intel bonus).
pub const fn is_fresh(gathered_tick: u64, current_tick: u64) -> bool {
    current_tick.saturating_sub(gathered_tick) < FRESH_MAX_AGE
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use burnrate_types::{IntelSnapshot, ZoneKind, ZoneObservation};
    use rust_decimal::Decimal;

    use super::*;

    fn zone_report(gathered_tick: u64) -> IntelReport {
        IntelReport {
            id: IntelId::new(),
            gatherer: PlayerId::new(),
            faction: None,
            target: IntelTarget::Zone(burnrate_types::ZoneId::new()),
            gathered_tick,
            snapshot: IntelSnapshot::Zone(ZoneObservation {
                name: "Salient".to_owned(),
                kind: ZoneKind::Front,
                owner: None,
                supply_level: Decimal::new(63, 0),
                su_stockpile: 63,
                garrison: 4,
                medkit_stockpile: 12,
                comms_stockpile: 7,
            }),
            signal_quality: 100,
        }
    }

    #[test]
    fn freshness_boundaries() {
        assert_eq!(freshness(0), Freshness::Fresh);
        assert_eq!(freshness(9), Freshness::Fresh);
        assert_eq!(freshness(10), Freshness::Stale);
        assert_eq!(freshness(49), Freshness::Stale);
        assert_eq!(freshness(50), Freshness::Expired);
    }

    #[test]
    fn signal_quality_is_monotone_non_increasing() {
        let mut last = 100u8;
        for age in 0..260 {
            let q = signal_quality(age);
            assert!(q <= last, "quality rose at age {age}");
            last = q;
        }
        assert_eq!(signal_quality(0), 100);
        assert_eq!(signal_quality(30), 50);
        assert_eq!(signal_quality(50), 0);
    }

    #[test]
    fn fresh_projection_is_unmodified() {
        let report = zone_report(100);
        let projected = project(&report, 105);
        assert_eq!(projected.freshness, Freshness::Fresh);
        assert_eq!(projected.signal_quality, 100);
        assert_eq!(projected.data["data"]["su_stockpile"], 63);
    }

    #[test]
    fn stale_projection_rounds_to_ranges() {
        let report = zone_report(100);
        let projected = project(&report, 120);
        assert_eq!(projected.freshness, Freshness::Stale);
        assert_eq!(projected.data["supply_level"], "50-75");
        assert_eq!(projected.data["su_stockpile"], "50-75");
        // Stockpiles are redacted entirely when stale.
        assert!(projected.data.get("medkit_stockpile").is_none());
    }

    #[test]
    fn expired_projection_keeps_only_owner() {
        let report = zone_report(100);
        let projected = project(&report, 160);
        assert_eq!(projected.freshness, Freshness::Expired);
        assert_eq!(projected.signal_quality, 0);
        assert!(projected.data.get("last_seen_owner").is_some());
        assert!(projected.data.get("supply_level").is_none());
    }

    #[test]
    fn deletion_threshold() {
        assert!(!should_delete(100, 299));
        assert!(should_delete(100, 300));
    }
}
