//! Reconciliation of per-vehicle battle counts against the reference table.
//!
//! Two steps: accumulate expected totals over the vehicles the table covers,
//! collecting the ids it does not; then correct the account's raw aggregate
//! totals by subtracting its performance on those uncovered vehicles, so both
//! sides of every ratio describe the same set of battles.

use tracing::warn;

use crate::models::{
    AccountId, AggregateStats, ExpectedTotals, ExpectedValues, VehicleBattleRecord, VehicleId,
};
use crate::source::StatsSource;

/// Accumulate expected totals for one account's vehicle battle records.
///
/// Returns the totals over all vehicles present in the reference table, plus
/// the ids of vehicles the account has played that the table does not cover.
pub fn accumulate_expected(
    records: &[VehicleBattleRecord],
    expected_values: &ExpectedValues,
) -> (ExpectedTotals, Vec<VehicleId>) {
    let mut totals = ExpectedTotals::default();
    let mut missing = Vec::new();

    for record in records {
        match expected_values.get(&record.vehicle_id) {
            Some(coeffs) => {
                let battles = record.battles as f64;
                totals.damage += coeffs.damage_ratio * battles;
                totals.spot += coeffs.spot_ratio * battles;
                totals.frag += coeffs.kill_ratio * battles;
                totals.defense += coeffs.defense_ratio * battles;
                // win_ratio is published as a percentage
                totals.win += (coeffs.win_ratio / 100.0) * battles;
            }
            None => missing.push(record.vehicle_id),
        }
    }

    (totals, missing)
}

/// Subtract an account's totals on vehicles absent from the reference table.
///
/// With no missing vehicles the stats are returned unchanged. The correction
/// is all-or-nothing: if the corrective query fails, the uncorrected stats
/// are returned rather than a partially-subtracted result. A successful
/// response is taken as the source's complete answer for the requested
/// vehicles, and every returned row is applied.
pub async fn correct_aggregate<S: StatsSource + ?Sized>(
    source: &S,
    account_id: AccountId,
    stats: AggregateStats,
    missing_vehicles: &[VehicleId],
) -> AggregateStats {
    if missing_vehicles.is_empty() {
        return stats;
    }

    match source
        .fetch_vehicle_stats_for(account_id, missing_vehicles)
        .await
    {
        Ok(rows) => {
            let mut corrected = stats;
            for row in rows {
                let t = row.totals;
                corrected.damage_dealt = corrected.damage_dealt.saturating_sub(t.damage_dealt);
                corrected.spotted = corrected.spotted.saturating_sub(t.spotted);
                corrected.frags = corrected.frags.saturating_sub(t.frags);
                corrected.dropped_capture_points = corrected
                    .dropped_capture_points
                    .saturating_sub(t.dropped_capture_points);
                corrected.wins = corrected.wins.saturating_sub(t.wins);
            }
            corrected
        }
        Err(e) => {
            warn!(
                "Corrective fetch for account {} failed ({}); keeping uncorrected totals",
                account_id, e
            );
            stats
        }
    }
}
