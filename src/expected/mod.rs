//! Expected-values reference cache.
//!
//! Loads the per-vehicle expected-performance table published by modxvm,
//! caching the raw document locally so that subsequent runs are fully
//! offline. The table is loaded at most once per run and is read-only for
//! the remainder of execution.

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::fs;
use tracing::{debug, info};

use crate::models::{ExpectedCoefficients, ExpectedValues, VehicleId};

/// Published location of the WN8 expected-values dataset.
pub const EXPECTED_VALUES_URL: &str = "https://static.modxvm.com/wn8-data-exp/json/wn8exp.json";

/// Errors that can occur while obtaining the expected-values table.
///
/// All of these are fatal for a scoring run: without the reference table no
/// score can be computed, and a malformed table must never be silently
/// substituted with stale or partial data.
#[derive(Debug, Error)]
pub enum ExpectedError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed expected-values dataset: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Root of the published wn8exp.json document.
#[derive(Debug, Deserialize)]
struct ExpectedValuesDocument {
    data: Vec<VehicleEntry>,
}

/// One vehicle row of the dataset. The field set is externally versioned;
/// anything missing or unrecognized fails the parse.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct VehicleEntry {
    #[serde(rename = "IDNum")]
    id_num: u32,

    #[serde(rename = "expDamage")]
    exp_damage: f64,

    #[serde(rename = "expSpot")]
    exp_spot: f64,

    #[serde(rename = "expFrag")]
    exp_frag: f64,

    #[serde(rename = "expDef")]
    exp_def: f64,

    #[serde(rename = "expWinRate")]
    exp_win_rate: f64,
}

/// Metadata stored alongside the cached dataset after a network fetch.
/// Informational only; cache freshness is decided by file existence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheMetadata {
    pub url: String,
    pub fetched_at: DateTime<Utc>,
    pub content_length: usize,
}

/// Disk-backed provider of the expected-values table.
pub struct ExpectedValuesCache {
    client: reqwest::Client,
    url: String,
    cache_path: PathBuf,
}

impl ExpectedValuesCache {
    /// Create a cache reading/writing the given path, fetching from the
    /// published dataset URL on a cache miss.
    pub fn new(cache_path: PathBuf, timeout: Duration) -> Result<Self, ExpectedError> {
        Self::with_url(cache_path, EXPECTED_VALUES_URL, timeout)
    }

    /// Create a cache fetching from a custom URL.
    pub fn with_url(
        cache_path: PathBuf,
        url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ExpectedError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: url.into(),
            cache_path,
        })
    }

    /// Path of the cached dataset.
    pub fn cache_path(&self) -> &Path {
        &self.cache_path
    }

    /// Load the expected-values table.
    ///
    /// If a cached copy exists it is parsed and returned without any network
    /// access; otherwise the dataset is fetched once, persisted, and parsed.
    pub async fn load(&self) -> Result<ExpectedValues, ExpectedError> {
        if self.cache_path.exists() {
            debug!("Loading expected values from {:?}", self.cache_path);
            let raw = fs::read_to_string(&self.cache_path).await?;
            return parse_expected_values(&raw);
        }

        self.refresh().await
    }

    /// Fetch the dataset from the network and rewrite the cache.
    pub async fn refresh(&self) -> Result<ExpectedValues, ExpectedError> {
        info!("Fetching expected values from {}", self.url);

        let response = self.client.get(&self.url).send().await?;
        let response = response.error_for_status()?;
        let body = response.text().await?;

        // Parse before persisting so a malformed download never poisons the
        // cache for later runs.
        let values = parse_expected_values(&body)?;
        self.persist(&body).await?;

        info!("Cached {} vehicle entries to {:?}", values.len(), self.cache_path);
        Ok(values)
    }

    /// Persist the raw response body verbatim.
    ///
    /// Written to a temp file and renamed into place so a concurrent reader
    /// never observes a partially-written cache.
    async fn persist(&self, body: &str) -> Result<(), ExpectedError> {
        if let Some(parent) = self.cache_path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let tmp_path = self.cache_path.with_extension("json.tmp");
        fs::write(&tmp_path, body).await?;
        fs::rename(&tmp_path, &self.cache_path).await?;

        let meta = CacheMetadata {
            url: self.url.clone(),
            fetched_at: Utc::now(),
            content_length: body.len(),
        };
        fs::write(self.meta_path(), serde_json::to_string_pretty(&meta)?).await?;

        Ok(())
    }

    /// Path of the sidecar metadata file.
    fn meta_path(&self) -> PathBuf {
        self.cache_path.with_extension("meta.json")
    }
}

/// Parse the raw wn8exp.json document into the coefficient table.
fn parse_expected_values(raw: &str) -> Result<ExpectedValues, ExpectedError> {
    let document: ExpectedValuesDocument = serde_json::from_str(raw)?;

    let mut values = ExpectedValues::with_capacity(document.data.len());
    for entry in document.data {
        values.insert(
            VehicleId::new(entry.id_num),
            ExpectedCoefficients {
                damage_ratio: entry.exp_damage,
                spot_ratio: entry.exp_spot,
                kill_ratio: entry.exp_frag,
                defense_ratio: entry.exp_def,
                win_ratio: entry.exp_win_rate,
            },
        );
    }

    Ok(values)
}
