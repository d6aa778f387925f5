//! Statistics data source abstraction.
//!
//! The scoring pipeline consumes battle statistics through the
//! [`StatsSource`] trait so the remote API can be swapped for an in-memory
//! double in tests. The live implementation is [`WargamingApi`].

use std::collections::HashMap;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{AccountId, AggregateStats, VehicleBattleRecord, VehicleId, VehicleStatsRecord};

mod mock;
mod wargaming;

pub use mock::MockSource;
pub use wargaming::WargamingApi;

/// Errors from a statistics source.
///
/// The scoring pipeline absorbs these at chunk granularity (a failed batch
/// means "no data for every account in it"); only the corrective query
/// failure has its own recovery path (uncorrected stats).
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error {code}: {message}")]
    Api { code: u32, message: String },

    #[error("Malformed API response: {0}")]
    Json(#[from] serde_json::Error),
}

/// Remote provider of per-account battle statistics.
///
/// Every query takes at most one batch of account ids; partitioning a larger
/// id list into batches is the caller's job (the remote side enforces a
/// maximum of 100 ids per request). Accounts with no data are omitted from
/// result maps, never defaulted.
#[async_trait]
pub trait StatsSource: Send + Sync {
    /// Fetch cumulative account totals for one batch of accounts.
    async fn fetch_aggregate_stats(
        &self,
        account_ids: &[AccountId],
    ) -> Result<HashMap<AccountId, AggregateStats>, SourceError>;

    /// Fetch per-vehicle battle counts for one batch of accounts.
    async fn fetch_vehicle_battles(
        &self,
        account_ids: &[AccountId],
    ) -> Result<HashMap<AccountId, Vec<VehicleBattleRecord>>, SourceError>;

    /// Fetch per-vehicle totals for a single account, restricted to the
    /// given vehicle ids. Used by the corrective pass of reconciliation.
    async fn fetch_vehicle_stats_for(
        &self,
        account_id: AccountId,
        vehicle_ids: &[VehicleId],
    ) -> Result<Vec<VehicleStatsRecord>, SourceError>;
}
