//! Battle statistics models.

use serde::{Deserialize, Serialize};

use super::VehicleId;

/// Cumulative account totals across all vehicles and battles.
///
/// Fetched once per account from the account-info endpoint. The five WN8
/// fields may later be corrected downward to exclude battles on vehicles
/// missing from the expected-values table; `battles` is never corrected.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateStats {
    /// Total battles fought
    pub battles: u64,

    /// Total damage dealt
    pub damage_dealt: u64,

    /// Total enemies spotted
    pub spotted: u64,

    /// Total enemy vehicles destroyed
    pub frags: u64,

    /// Total capture points dropped while defending
    pub dropped_capture_points: u64,

    /// Total battles won
    pub wins: u64,
}

/// Battle count on a single vehicle for one account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VehicleBattleRecord {
    pub vehicle_id: VehicleId,
    pub battles: u64,
}

/// Cumulative totals for the five WN8 measures on a single vehicle.
///
/// The shape of one row of the corrective per-vehicle query; unlike
/// [`AggregateStats`] there is no battle count.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VehicleTotals {
    pub damage_dealt: u64,
    pub spotted: u64,
    pub frags: u64,
    pub dropped_capture_points: u64,
    pub wins: u64,
}

/// Totals for one vehicle of one account, as returned by the corrective
/// per-vehicle statistics query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VehicleStatsRecord {
    pub vehicle_id: VehicleId,
    pub totals: VehicleTotals,
}

/// Per-account expected totals, accumulated as `battles * coefficient` over
/// every vehicle the account has played that the reference table covers.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ExpectedTotals {
    pub damage: f64,
    pub spot: f64,
    pub frag: f64,
    pub defense: f64,
    pub win: f64,
}
