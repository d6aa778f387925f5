//! In-memory statistics source for tests and offline experiments.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::models::{AccountId, AggregateStats, VehicleBattleRecord, VehicleId, VehicleStatsRecord};

use super::{SourceError, StatsSource};

/// Canned-data [`StatsSource`] with per-query failure switches.
///
/// Accounts not registered with a builder method behave like accounts the
/// remote source has no data for: they are absent from every response.
#[derive(Default)]
pub struct MockSource {
    aggregate: HashMap<AccountId, AggregateStats>,
    vehicles: HashMap<AccountId, Vec<VehicleBattleRecord>>,
    vehicle_stats: HashMap<AccountId, Vec<VehicleStatsRecord>>,
    fail_aggregate: bool,
    fail_vehicles: bool,
    fail_corrections: bool,
    fail_aggregate_containing: Option<AccountId>,
    delay: Option<Duration>,
    aggregate_batches: Mutex<Vec<usize>>,
    correction_calls: AtomicUsize,
}

impl MockSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an account with both stat families.
    pub fn with_account(
        mut self,
        id: AccountId,
        stats: AggregateStats,
        vehicles: Vec<VehicleBattleRecord>,
    ) -> Self {
        self.aggregate.insert(id, stats);
        self.vehicles.insert(id, vehicles);
        self
    }

    /// Register aggregate stats only (the account will be missing from the
    /// vehicle-battle response).
    pub fn with_aggregate_only(mut self, id: AccountId, stats: AggregateStats) -> Self {
        self.aggregate.insert(id, stats);
        self
    }

    /// Register vehicle battles only (the account will be missing from the
    /// aggregate-stats response).
    pub fn with_vehicles_only(mut self, id: AccountId, vehicles: Vec<VehicleBattleRecord>) -> Self {
        self.vehicles.insert(id, vehicles);
        self
    }

    /// Register per-vehicle totals served by the corrective query.
    pub fn with_vehicle_stats(mut self, id: AccountId, rows: Vec<VehicleStatsRecord>) -> Self {
        self.vehicle_stats.insert(id, rows);
        self
    }

    /// Fail every aggregate-stats query.
    pub fn failing_aggregate(mut self) -> Self {
        self.fail_aggregate = true;
        self
    }

    /// Fail aggregate-stats queries whose batch contains the given account.
    pub fn failing_aggregate_for(mut self, id: AccountId) -> Self {
        self.fail_aggregate_containing = Some(id);
        self
    }

    /// Fail every vehicle-battle query.
    pub fn failing_vehicles(mut self) -> Self {
        self.fail_vehicles = true;
        self
    }

    /// Fail every corrective query.
    pub fn failing_corrections(mut self) -> Self {
        self.fail_corrections = true;
        self
    }

    /// Delay every aggregate-stats query, to exercise cancellation windows.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Batch sizes of the aggregate-stats queries issued so far.
    pub fn aggregate_batches(&self) -> Vec<usize> {
        self.aggregate_batches.lock().unwrap().clone()
    }

    /// Number of corrective queries issued so far.
    pub fn correction_calls(&self) -> usize {
        self.correction_calls.load(Ordering::SeqCst)
    }

    fn unavailable() -> SourceError {
        SourceError::Api {
            code: 504,
            message: "SOURCE_NOT_AVAILABLE".to_string(),
        }
    }
}

#[async_trait]
impl StatsSource for MockSource {
    async fn fetch_aggregate_stats(
        &self,
        account_ids: &[AccountId],
    ) -> Result<HashMap<AccountId, AggregateStats>, SourceError> {
        self.aggregate_batches
            .lock()
            .unwrap()
            .push(account_ids.len());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if self.fail_aggregate {
            return Err(Self::unavailable());
        }
        if let Some(poison) = self.fail_aggregate_containing {
            if account_ids.contains(&poison) {
                return Err(Self::unavailable());
            }
        }

        Ok(account_ids
            .iter()
            .filter_map(|id| self.aggregate.get(id).map(|stats| (*id, *stats)))
            .collect())
    }

    async fn fetch_vehicle_battles(
        &self,
        account_ids: &[AccountId],
    ) -> Result<HashMap<AccountId, Vec<VehicleBattleRecord>>, SourceError> {
        if self.fail_vehicles {
            return Err(Self::unavailable());
        }

        Ok(account_ids
            .iter()
            .filter_map(|id| self.vehicles.get(id).map(|records| (*id, records.clone())))
            .collect())
    }

    async fn fetch_vehicle_stats_for(
        &self,
        account_id: AccountId,
        vehicle_ids: &[VehicleId],
    ) -> Result<Vec<VehicleStatsRecord>, SourceError> {
        self.correction_calls.fetch_add(1, Ordering::SeqCst);

        if self.fail_corrections {
            return Err(Self::unavailable());
        }

        Ok(self
            .vehicle_stats
            .get(&account_id)
            .map(|rows| {
                rows.iter()
                    .filter(|row| vehicle_ids.contains(&row.vehicle_id))
                    .copied()
                    .collect()
            })
            .unwrap_or_default())
    }
}
