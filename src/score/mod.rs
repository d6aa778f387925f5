//! Scoring pipeline orchestration.
//!
//! Coordinates the WN8 pipeline for a list of accounts:
//! 1. Partition the ids into batches of at most the configured size
//! 2. For each batch, fetch aggregate stats and per-vehicle battles
//!    concurrently and join
//! 3. Reconcile against the expected-values table, correcting for vehicles
//!    the table does not cover
//! 4. Compute the score for every account present in both responses

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::calculate;
use crate::models::{AccountId, ExpectedValues};
use crate::reconcile;
use crate::source::StatsSource;

/// Result of a scoring run.
///
/// `scores` holds every account for which both stat families were available;
/// accounts the source had no data for are simply absent. Batch-level fetch
/// failures are recorded in `errors` and never abort the run.
#[derive(Debug, Clone)]
pub struct ScoreOutcome {
    pub scores: HashMap<AccountId, f64>,
    pub cancelled: bool,
    pub errors: Vec<String>,
    pub duration: Duration,
}

/// Stat selector for a scoring run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatKind {
    /// WN8 composite score
    Wn8,
    /// Win ratio in percent
    WinRatio,
}

/// Scoring pipeline over a statistics source and a loaded reference table.
pub struct Scorer<S> {
    source: S,
    expected_values: ExpectedValues,
    batch_size: usize,
    cancel_token: Arc<RwLock<bool>>,
}

impl<S: StatsSource> Scorer<S> {
    /// Create a scorer. `batch_size` is the maximum ids per remote request.
    pub fn new(source: S, expected_values: ExpectedValues, batch_size: usize) -> Self {
        Self {
            source,
            expected_values,
            batch_size: batch_size.max(1),
            cancel_token: Arc::new(RwLock::new(false)),
        }
    }

    /// Request cancellation of the current run. Takes effect at the next
    /// batch boundary; scores computed so far are still returned.
    pub async fn cancel(&self) {
        *self.cancel_token.write().await = true;
    }

    /// Compute the selected stat for a list of accounts.
    pub async fn run(&self, account_ids: &[AccountId], stat: StatKind) -> ScoreOutcome {
        match stat {
            StatKind::Wn8 => self.score_accounts(account_ids).await,
            StatKind::WinRatio => self.win_ratios(account_ids).await,
        }
    }

    /// Compute WN8 scores for a list of accounts.
    ///
    /// Accounts absent from either the aggregate-stats or the vehicle-battle
    /// response are excluded from the result, not defaulted to zero. A batch
    /// whose fetch fails contributes no scores; remaining batches proceed.
    pub async fn score_accounts(&self, account_ids: &[AccountId]) -> ScoreOutcome {
        *self.cancel_token.write().await = false;

        let start = std::time::Instant::now();
        info!(
            "Scoring {} accounts in batches of {}",
            account_ids.len(),
            self.batch_size
        );

        let mut scores = HashMap::new();
        let mut errors = Vec::new();
        let mut cancelled = false;

        for batch in account_ids.chunks(self.batch_size) {
            if *self.cancel_token.read().await {
                warn!(
                    "Scoring cancelled; returning {} scores computed so far",
                    scores.len()
                );
                cancelled = true;
                break;
            }

            // The two stat families are independent reads; issue them
            // concurrently and join before reconciling.
            let (stats_result, vehicles_result) = tokio::join!(
                self.source.fetch_aggregate_stats(batch),
                self.source.fetch_vehicle_battles(batch),
            );

            let (mut stats_map, vehicles_map) = match (stats_result, vehicles_result) {
                (Ok(stats), Ok(vehicles)) => (stats, vehicles),
                (Err(e), _) | (_, Err(e)) => {
                    warn!(
                        "Batch of {} accounts failed ({}); treating as no data",
                        batch.len(),
                        e
                    );
                    errors.push(e.to_string());
                    continue;
                }
            };

            for account_id in batch {
                // Scoring needs both stat families.
                let (Some(stats), Some(records)) =
                    (stats_map.remove(account_id), vehicles_map.get(account_id))
                else {
                    continue;
                };

                let (expected, missing) =
                    reconcile::accumulate_expected(records, &self.expected_values);
                let corrected =
                    reconcile::correct_aggregate(&self.source, *account_id, stats, &missing).await;

                scores.insert(*account_id, calculate::wn8(&corrected, &expected));
            }
        }

        let duration = start.elapsed();
        info!(
            "Scored {} of {} accounts in {:?}",
            scores.len(),
            account_ids.len(),
            duration
        );

        ScoreOutcome {
            scores,
            cancelled,
            errors,
            duration,
        }
    }

    /// Compute win ratios (percent) for a list of accounts.
    ///
    /// Only the aggregate-stats query is needed; the same batching,
    /// exclusion, and failure-absorption rules apply.
    pub async fn win_ratios(&self, account_ids: &[AccountId]) -> ScoreOutcome {
        *self.cancel_token.write().await = false;

        let start = std::time::Instant::now();
        let mut scores = HashMap::new();
        let mut errors = Vec::new();
        let mut cancelled = false;

        for batch in account_ids.chunks(self.batch_size) {
            if *self.cancel_token.read().await {
                cancelled = true;
                break;
            }

            match self.source.fetch_aggregate_stats(batch).await {
                Ok(stats_map) => {
                    for (account_id, stats) in stats_map {
                        scores.insert(account_id, calculate::win_ratio(&stats));
                    }
                }
                Err(e) => {
                    warn!(
                        "Batch of {} accounts failed ({}); treating as no data",
                        batch.len(),
                        e
                    );
                    errors.push(e.to_string());
                }
            }
        }

        ScoreOutcome {
            scores,
            cancelled,
            errors,
            duration: start.elapsed(),
        }
    }
}
