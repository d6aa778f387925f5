//! Expected-value (reference coefficient) models.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::VehicleId;

/// Skill-neutral average performance benchmarks for one vehicle.
///
/// `win_ratio` is a percentage (e.g. 48.9), as published in the dataset; it
/// is scaled down by 100 when expected win totals are accumulated.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExpectedCoefficients {
    /// Average damage per battle
    pub damage_ratio: f64,

    /// Average spots per battle
    pub spot_ratio: f64,

    /// Average frags per battle
    pub kill_ratio: f64,

    /// Average dropped capture points per battle
    pub defense_ratio: f64,

    /// Average win rate, in percent
    pub win_ratio: f64,
}

/// The full reference table, keyed by vehicle id.
///
/// Loaded at most once per run and read-only afterwards, so it can be shared
/// across concurrent chunk processing without synchronization.
pub type ExpectedValues = HashMap<VehicleId, ExpectedCoefficients>;
