//! Persistence boundary
//!
//! `FarmStore` is what the gateways read from. `MemoryStore` keeps
//! everything in process and can be seeded from a JSON file.

use super::types::{
    AdvisoryLogEntry, CommunityPost, CostBreakdown, CostRecord, MarketRecord, SatelliteSummary,
    ScanResult, SoilReport,
};
use crate::{KisanError, Result};
use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Document-store reads keyed by user, crop or region
///
/// Implementations return whatever exists; absence is an empty result, never an error.
/// Errors are reserved for transport or decoding failures.
#[async_trait]
pub trait FarmStore: Send + Sync {
    /// All price records for a crop, in store order
    async fn market_records(&self, crop: &str) -> Result<Vec<MarketRecord>>;

    /// All soil reports of a farmer, unordered
    async fn soil_reports(&self, user_id: &str) -> Result<Vec<SoilReport>>;

    /// All scans of a farmer, unordered
    async fn scans(&self, user_id: &str) -> Result<Vec<ScanResult>>;

    /// Saved cost breakdown for a farmer's crop
    async fn cost_inputs(&self, user_id: &str, crop: &str) -> Result<Option<CostBreakdown>>;

    /// Latest satellite summary for a farmer's plot
    async fn satellite_summary(&self, user_id: &str) -> Result<Option<SatelliteSummary>>;

    /// Community posts, optionally restricted to one crop
    async fn community_posts(&self, crop: Option<&str>) -> Result<Vec<CommunityPost>>;

    /// Append an answered advisory
    async fn record_advisory(&self, entry: AdvisoryLogEntry) -> Result<()>;
}

/// Everything a `MemoryStore` holds; also the JSON seed file layout
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FarmData {
    #[serde(default)]
    pub market_records: Vec<MarketRecord>,
    #[serde(default)]
    pub soil_reports: Vec<SoilReport>,
    #[serde(default)]
    pub scans: Vec<ScanResult>,
    #[serde(default)]
    pub costs: Vec<CostRecord>,
    #[serde(default)]
    pub satellite: Vec<SatelliteSummary>,
    #[serde(default)]
    pub community_posts: Vec<CommunityPost>,
    #[serde(default)]
    pub advisories: Vec<AdvisoryLogEntry>,
}

/// In-process store
#[derive(Default)]
pub struct MemoryStore {
    data: RwLock<FarmData>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding `data`
    pub fn from_data(data: FarmData) -> Self {
        Self {
            data: RwLock::new(data),
        }
    }

    /// Load a JSON seed file
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).inspect_err(|e| {
            tracing::error!(path = %path.display(), error = %e, "failed to read farm data");
        })?;
        let data: FarmData = serde_json::from_str(&content).map_err(|e| {
            KisanError::gateway(format!("failed to parse {}: {}", path.display(), e))
        })?;
        tracing::info!(
            path = %path.display(),
            market_records = data.market_records.len(),
            soil_reports = data.soil_reports.len(),
            scans = data.scans.len(),
            "loaded farm data"
        );
        Ok(Self::from_data(data))
    }

    pub fn add_market_record(&self, record: MarketRecord) {
        self.data.write().market_records.push(record);
    }

    pub fn add_soil_report(&self, report: SoilReport) {
        self.data.write().soil_reports.push(report);
    }

    pub fn add_scan(&self, scan: ScanResult) {
        self.data.write().scans.push(scan);
    }

    pub fn add_costs(&self, record: CostRecord) {
        self.data.write().costs.push(record);
    }

    pub fn add_satellite_summary(&self, summary: SatelliteSummary) {
        self.data.write().satellite.push(summary);
    }

    pub fn add_community_post(&self, post: CommunityPost) {
        self.data.write().community_posts.push(post);
    }

    /// Advisories recorded so far
    pub fn advisories(&self) -> Vec<AdvisoryLogEntry> {
        self.data.read().advisories.clone()
    }
}

fn same_key(a: &str, b: &str) -> bool {
    a.trim().eq_ignore_ascii_case(b.trim())
}

#[async_trait]
impl FarmStore for MemoryStore {
    async fn market_records(&self, crop: &str) -> Result<Vec<MarketRecord>> {
        Ok(self
            .data
            .read()
            .market_records
            .iter()
            .filter(|r| same_key(&r.crop, crop))
            .cloned()
            .collect())
    }

    async fn soil_reports(&self, user_id: &str) -> Result<Vec<SoilReport>> {
        Ok(self
            .data
            .read()
            .soil_reports
            .iter()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn scans(&self, user_id: &str) -> Result<Vec<ScanResult>> {
        Ok(self
            .data
            .read()
            .scans
            .iter()
            .filter(|s| s.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn cost_inputs(&self, user_id: &str, crop: &str) -> Result<Option<CostBreakdown>> {
        Ok(self
            .data
            .read()
            .costs
            .iter()
            .rev()
            .find(|c| c.user_id == user_id && same_key(&c.crop, crop))
            .map(|c| c.costs))
    }

    async fn satellite_summary(&self, user_id: &str) -> Result<Option<SatelliteSummary>> {
        Ok(self
            .data
            .read()
            .satellite
            .iter()
            .filter(|s| s.user_id == user_id)
            .max_by_key(|s| s.observed_at)
            .cloned())
    }

    async fn community_posts(&self, crop: Option<&str>) -> Result<Vec<CommunityPost>> {
        Ok(self
            .data
            .read()
            .community_posts
            .iter()
            .filter(|p| crop.map_or(true, |c| same_key(&p.crop, c)))
            .cloned()
            .collect())
    }

    async fn record_advisory(&self, entry: AdvisoryLogEntry) -> Result<()> {
        self.data.write().advisories.push(entry);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone, Utc};
    use tempfile::TempDir;

    fn record(crop: &str, region: &str) -> MarketRecord {
        MarketRecord {
            crop: crop.to_string(),
            region: region.to_string(),
            prices: vec![crate::data::PricePoint {
                date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                price: 2000.0,
            }],
        }
    }

    #[tokio::test]
    async fn test_market_records_match_case_insensitively() {
        let store = MemoryStore::new();
        store.add_market_record(record("Wheat", "Punjab"));
        store.add_market_record(record("Rice", "Punjab"));

        let found = store.market_records(" wheat ").await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].crop, "Wheat");
    }

    #[tokio::test]
    async fn test_cost_inputs_prefers_latest_entry() {
        let store = MemoryStore::new();
        store.add_costs(CostRecord {
            user_id: "u1".into(),
            crop: "cotton".into(),
            costs: CostBreakdown {
                seed: 100.0,
                ..CostBreakdown::default()
            },
        });
        store.add_costs(CostRecord {
            user_id: "u1".into(),
            crop: "cotton".into(),
            costs: CostBreakdown {
                seed: 200.0,
                ..CostBreakdown::default()
            },
        });

        let costs = store.cost_inputs("u1", "Cotton").await.unwrap().unwrap();
        assert_eq!(costs.seed, 200.0);
        assert!(store.cost_inputs("u2", "cotton").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_satellite_summary_picks_latest_observation() {
        let store = MemoryStore::new();
        for (day, ndvi) in [(1, 0.3), (5, 0.6), (3, 0.4)] {
            store.add_satellite_summary(SatelliteSummary {
                user_id: "u1".into(),
                ndvi,
                soil_moisture: 20.0,
                observed_at: Utc.with_ymd_and_hms(2024, 6, day, 0, 0, 0).unwrap(),
                note: None,
            });
        }
        let latest = store.satellite_summary("u1").await.unwrap().unwrap();
        assert_eq!(latest.ndvi, 0.6);
    }

    #[tokio::test]
    async fn test_record_advisory_appends() {
        let store = MemoryStore::new();
        store
            .record_advisory(AdvisoryLogEntry {
                user_id: "u1".into(),
                query: "q".into(),
                advice_text: "a".into(),
                created_at: Utc::now(),
            })
            .await
            .unwrap();
        assert_eq!(store.advisories().len(), 1);
    }

    #[test]
    fn test_from_json_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("farm.json");
        std::fs::write(
            &path,
            r#"{
                "marketRecords": [
                    { "crop": "onion", "region": "Nashik", "prices": [ { "date": "2024-03-01", "price": 1800.0 } ] }
                ],
                "soilReports": [
                    {
                        "id": "s1", "userId": "u1", "pH": 6.8,
                        "nitrogen": "Low", "phosphorus": "Medium", "potassium": "High",
                        "organicCarbon": 0.45, "electricalConductivity": 0.3,
                        "region": "Nashik", "createdAt": "2024-02-01T00:00:00Z"
                    }
                ]
            }"#,
        )
        .unwrap();

        let store = MemoryStore::from_json_file(&path).unwrap();
        let data = store.data.read();
        assert_eq!(data.market_records.len(), 1);
        assert_eq!(data.soil_reports[0].ph, 6.8);
        assert!(data.scans.is_empty());
    }

    #[test]
    fn test_from_json_file_reports_parse_errors() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("farm.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            MemoryStore::from_json_file(&path),
            Err(KisanError::Gateway(_))
        ));
    }

    #[test]
    fn test_from_json_file_missing_is_io_error() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            MemoryStore::from_json_file(&dir.path().join("absent.json")),
            Err(KisanError::Io(_))
        ));
    }
}
