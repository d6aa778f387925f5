//! Wargaming public API client.
//!
//! Speaks the `{status, data}` envelope of the Wargaming REST API. All
//! endpoint specifics are isolated in this module so API changes are easy to
//! fix.

use std::collections::HashMap;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::config::ApiConfig;
use crate::models::{
    AccountId, AggregateStats, VehicleBattleRecord, VehicleId, VehicleStatsRecord, VehicleTotals,
};

use super::{SourceError, StatsSource};

// ── Request field lists ─────────────────────────────────────────────────────

const ACCOUNT_INFO_FIELDS: &[&str] = &[
    "statistics.all.battles",
    "statistics.all.damage_dealt",
    "statistics.all.spotted",
    "statistics.all.frags",
    "statistics.all.dropped_capture_points",
    "statistics.all.wins",
];

const ACCOUNT_TANKS_FIELDS: &[&str] = &["tank_id", "statistics.battles"];

const TANK_STATS_FIELDS: &[&str] = &[
    "tank_id",
    "all.damage_dealt",
    "all.spotted",
    "all.frags",
    "all.dropped_capture_points",
    "all.wins",
];

// ── Envelope and response models ────────────────────────────────────────────

/// The outer `{status, data}` envelope every Wargaming endpoint returns.
#[derive(Debug, Deserialize)]
struct ApiEnvelope<T> {
    status: String,
    error: Option<ApiErrorBody>,
    data: Option<T>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    code: u32,
    message: String,
}

#[derive(Debug, Deserialize)]
struct AccountInfoEntry {
    statistics: AccountStatistics,
}

#[derive(Debug, Deserialize)]
struct AccountStatistics {
    all: AccountAllStats,
}

#[derive(Debug, Deserialize)]
struct AccountAllStats {
    battles: u64,
    damage_dealt: u64,
    spotted: u64,
    frags: u64,
    dropped_capture_points: u64,
    wins: u64,
}

#[derive(Debug, Deserialize)]
struct AccountTankEntry {
    tank_id: u32,
    statistics: TankBattleCount,
}

#[derive(Debug, Deserialize)]
struct TankBattleCount {
    battles: u64,
}

#[derive(Debug, Deserialize)]
struct TankStatsEntry {
    tank_id: u32,
    all: TankAllStats,
}

#[derive(Debug, Deserialize)]
struct TankAllStats {
    damage_dealt: u64,
    spotted: u64,
    frags: u64,
    dropped_capture_points: u64,
    wins: u64,
}

#[derive(Debug, Deserialize)]
struct AccountListRow {
    nickname: String,
    account_id: u64,
}

// ── Client ──────────────────────────────────────────────────────────────────

/// Wargaming API client.
pub struct WargamingApi {
    client: reqwest::Client,
    config: ApiConfig,
}

impl WargamingApi {
    /// Create a new client from API configuration.
    pub fn new(config: ApiConfig) -> Result<Self, SourceError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;
        Ok(Self { client, config })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}/", self.config.base_url.trim_end_matches('/'), path)
    }

    /// Issue one GET request and unwrap the `{status, data}` envelope.
    async fn get_data<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<T, SourceError> {
        let url = self.endpoint(path);
        debug!("GET {} ({} params)", url, params.len());

        let response = self
            .client
            .get(&url)
            .query(&[("application_id", self.config.application_id.as_str())])
            .query(params)
            .send()
            .await?
            .error_for_status()?;

        let body = response.text().await?;
        let envelope: ApiEnvelope<T> = serde_json::from_str(&body)?;

        if envelope.status != "ok" {
            let (code, message) = match envelope.error {
                Some(e) => (e.code, e.message),
                None => (0, format!("status {}", envelope.status)),
            };
            return Err(SourceError::Api { code, message });
        }

        envelope.data.ok_or(SourceError::Api {
            code: 0,
            message: "ok response without data".to_string(),
        })
    }

    /// Resolve player names to account ids via the account-list endpoint.
    ///
    /// Names unknown to the API are simply absent from the result map.
    pub async fn fetch_account_ids(
        &self,
        names: &[String],
    ) -> Result<HashMap<String, AccountId>, SourceError> {
        let params = [
            ("search", names.join(",")),
            ("type", "exact".to_string()),
        ];

        let rows: Vec<AccountListRow> = self.get_data("account/list", &params).await?;

        Ok(rows
            .into_iter()
            .map(|row| (row.nickname, AccountId::new(row.account_id)))
            .collect())
    }
}

/// Join account ids into the comma-separated request form.
fn join_ids(account_ids: &[AccountId]) -> String {
    account_ids
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

/// Parse a Wargaming data map key back into an account id.
///
/// Responses key `data` by the stringified account id; a key that does not
/// parse is a malformed entry and is skipped with a warning.
fn parse_account_key(key: &str) -> Option<AccountId> {
    match key.parse::<AccountId>() {
        Ok(id) => Some(id),
        Err(_) => {
            warn!("Skipping unparsable account key in response: {}", key);
            None
        }
    }
}

#[async_trait::async_trait]
impl StatsSource for WargamingApi {
    async fn fetch_aggregate_stats(
        &self,
        account_ids: &[AccountId],
    ) -> Result<HashMap<AccountId, AggregateStats>, SourceError> {
        let params = [
            ("account_id", join_ids(account_ids)),
            ("fields", ACCOUNT_INFO_FIELDS.join(",")),
        ];

        let data: HashMap<String, Option<AccountInfoEntry>> =
            self.get_data("account/info", &params).await?;

        let mut stats = HashMap::new();
        for (key, entry) in data {
            let Some(account_id) = parse_account_key(&key) else {
                continue;
            };
            // null entry means the account has no data; omit it
            if let Some(entry) = entry {
                let all = entry.statistics.all;
                stats.insert(
                    account_id,
                    AggregateStats {
                        battles: all.battles,
                        damage_dealt: all.damage_dealt,
                        spotted: all.spotted,
                        frags: all.frags,
                        dropped_capture_points: all.dropped_capture_points,
                        wins: all.wins,
                    },
                );
            }
        }
        Ok(stats)
    }

    async fn fetch_vehicle_battles(
        &self,
        account_ids: &[AccountId],
    ) -> Result<HashMap<AccountId, Vec<VehicleBattleRecord>>, SourceError> {
        let params = [
            ("account_id", join_ids(account_ids)),
            ("fields", ACCOUNT_TANKS_FIELDS.join(",")),
        ];

        let data: HashMap<String, Option<Vec<AccountTankEntry>>> =
            self.get_data("account/tanks", &params).await?;

        let mut records = HashMap::new();
        for (key, entry) in data {
            let Some(account_id) = parse_account_key(&key) else {
                continue;
            };
            if let Some(tanks) = entry {
                let vehicle_records = tanks
                    .into_iter()
                    .map(|tank| VehicleBattleRecord {
                        vehicle_id: VehicleId::new(tank.tank_id),
                        battles: tank.statistics.battles,
                    })
                    .collect();
                records.insert(account_id, vehicle_records);
            }
        }
        Ok(records)
    }

    async fn fetch_vehicle_stats_for(
        &self,
        account_id: AccountId,
        vehicle_ids: &[VehicleId],
    ) -> Result<Vec<VehicleStatsRecord>, SourceError> {
        let tank_ids = vehicle_ids
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(",");
        let params = [
            ("account_id", account_id.to_string()),
            ("tank_id", tank_ids),
            ("fields", TANK_STATS_FIELDS.join(",")),
        ];

        let data: HashMap<String, Option<Vec<TankStatsEntry>>> =
            self.get_data("tanks/stats", &params).await?;

        let rows = data
            .into_iter()
            .find(|(key, _)| parse_account_key(key) == Some(account_id))
            .and_then(|(_, entry)| entry)
            .unwrap_or_default();

        Ok(rows
            .into_iter()
            .map(|row| VehicleStatsRecord {
                vehicle_id: VehicleId::new(row.tank_id),
                totals: VehicleTotals {
                    damage_dealt: row.all.damage_dealt,
                    spotted: row.all.spotted,
                    frags: row.all.frags,
                    dropped_capture_points: row.all.dropped_capture_points,
                    wins: row.all.wins,
                },
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> ApiConfig {
        ApiConfig {
            application_id: "test-app".to_string(),
            base_url: "https://api.worldoftanks.eu/wot/".to_string(),
            batch_size: 100,
            timeout_seconds: 5,
        }
    }

    #[test]
    fn test_endpoint_building() {
        let api = WargamingApi::new(test_config()).unwrap();
        assert_eq!(
            api.endpoint("account/info"),
            "https://api.worldoftanks.eu/wot/account/info/"
        );

        let mut config = test_config();
        config.base_url = "https://api.worldoftanks.eu/wot".to_string();
        let api = WargamingApi::new(config).unwrap();
        assert_eq!(
            api.endpoint("account/tanks"),
            "https://api.worldoftanks.eu/wot/account/tanks/"
        );
    }

    #[test]
    fn test_join_ids() {
        let ids = vec![AccountId::new(1), AccountId::new(22), AccountId::new(333)];
        assert_eq!(join_ids(&ids), "1,22,333");
        assert_eq!(join_ids(&[]), "");
    }

    #[test]
    fn test_envelope_ok_with_account_info() {
        let body = r#"{
            "status": "ok",
            "data": {
                "500123456": {
                    "statistics": {
                        "all": {
                            "battles": 1000,
                            "damage_dealt": 250000,
                            "spotted": 1200,
                            "frags": 900,
                            "dropped_capture_points": 400,
                            "wins": 520
                        }
                    }
                },
                "500999999": null
            }
        }"#;

        let envelope: ApiEnvelope<HashMap<String, Option<AccountInfoEntry>>> =
            serde_json::from_str(body).unwrap();

        assert_eq!(envelope.status, "ok");
        let data = envelope.data.unwrap();
        assert!(data.get("500123456").unwrap().is_some());
        // null marks an account with no data
        assert!(data.get("500999999").unwrap().is_none());

        let all = &data
            .get("500123456")
            .unwrap()
            .as_ref()
            .unwrap()
            .statistics
            .all;
        assert_eq!(all.battles, 1000);
        assert_eq!(all.wins, 520);
    }

    #[test]
    fn test_envelope_error_status() {
        let body = r#"{
            "status": "error",
            "error": {
                "code": 407,
                "message": "REQUEST_LIMIT_EXCEEDED",
                "field": null,
                "value": null
            }
        }"#;

        let envelope: ApiEnvelope<HashMap<String, Option<AccountInfoEntry>>> =
            serde_json::from_str(body).unwrap();

        assert_eq!(envelope.status, "error");
        let error = envelope.error.unwrap();
        assert_eq!(error.code, 407);
        assert_eq!(error.message, "REQUEST_LIMIT_EXCEEDED");
        assert!(envelope.data.is_none());
    }

    #[test]
    fn test_account_tanks_parsing() {
        let body = r#"{
            "status": "ok",
            "data": {
                "500123456": [
                    {"tank_id": 1, "statistics": {"battles": 150}},
                    {"tank_id": 513, "statistics": {"battles": 75}}
                ]
            }
        }"#;

        let envelope: ApiEnvelope<HashMap<String, Option<Vec<AccountTankEntry>>>> =
            serde_json::from_str(body).unwrap();

        let data = envelope.data.unwrap();
        let tanks = data.get("500123456").unwrap().as_ref().unwrap();
        assert_eq!(tanks.len(), 2);
        assert_eq!(tanks[0].tank_id, 1);
        assert_eq!(tanks[1].statistics.battles, 75);
    }

    #[test]
    fn test_account_list_parsing() {
        let body = r#"{
            "status": "ok",
            "data": [
                {"nickname": "player_one", "account_id": 500123456},
                {"nickname": "player_two", "account_id": 3000000001}
            ]
        }"#;

        let envelope: ApiEnvelope<Vec<AccountListRow>> = serde_json::from_str(body).unwrap();
        let rows = envelope.data.unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].nickname, "player_one");
        // account ids beyond 2^31 must survive
        assert_eq!(rows[1].account_id, 3_000_000_001);
    }

    #[test]
    fn test_parse_account_key() {
        assert_eq!(parse_account_key("500123456"), Some(AccountId::new(500123456)));
        assert_eq!(parse_account_key("not-a-number"), None);
    }
}
