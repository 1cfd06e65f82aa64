//! Farm records returned by the data gateways

use chrono::{DateTime, NaiveDate, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Ordinal nutrient rating from a soil test
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
pub enum NutrientLevel {
    Low,
    Medium,
    High,
}

/// One soil health card
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SoilReport {
    pub id: String,
    pub user_id: String,
    #[serde(rename = "pH")]
    pub ph: f64,
    pub nitrogen: NutrientLevel,
    pub phosphorus: NutrientLevel,
    pub potassium: NutrientLevel,
    pub organic_carbon: f64,
    pub electrical_conductivity: f64,
    pub region: String,
    pub created_at: DateTime<Utc>,
}

/// A saved crop disease scan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanResult {
    pub id: String,
    pub user_id: String,
    pub crop: String,
    pub diagnosis: String,
    pub confidence: f64,
    pub created_at: DateTime<Utc>,
}

/// Read-only snapshot of a farmer's recent records, most recent first
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FarmerHistory {
    pub soil_reports: Vec<SoilReport>,
    pub scans: Vec<ScanResult>,
}

impl FarmerHistory {
    pub fn is_empty(&self) -> bool {
        self.soil_reports.is_empty() && self.scans.is_empty()
    }

    pub fn latest_soil_report(&self) -> Option<&SoilReport> {
        self.soil_reports.first()
    }
}

/// Dated market price
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub price: f64,
}

/// Stored price history for one crop in one region
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketRecord {
    pub crop: String,
    pub region: String,
    /// Oldest first
    pub prices: Vec<PricePoint>,
}

/// How a quote was found
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    /// Same crop, same region
    Exact,
    /// Same crop, another region
    OtherRegion,
}

/// Market price answer for a crop+region key
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketQuote {
    pub crop: String,
    /// Region the prices come from, which differs from the requested one on fallback
    pub region: String,
    pub latest_price: f64,
    pub historical_prices: Vec<PricePoint>,
    pub match_kind: MatchKind,
}

impl MarketQuote {
    /// Build a quote from a record; `None` when the record has no prices
    pub fn from_record(record: &MarketRecord, match_kind: MatchKind) -> Option<Self> {
        let latest = record.prices.last()?;
        Some(Self {
            crop: record.crop.clone(),
            region: record.region.clone(),
            latest_price: latest.price,
            historical_prices: record.prices.clone(),
            match_kind,
        })
    }
}

/// Mocked remote-sensing summary for a farmer's plot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SatelliteSummary {
    pub user_id: String,
    /// Normalized difference vegetation index, -1.0..=1.0
    pub ndvi: f64,
    /// Volumetric soil moisture percentage
    pub soil_moisture: f64,
    pub observed_at: DateTime<Utc>,
    #[serde(default)]
    pub note: Option<String>,
}

/// Mocked community forum post
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommunityPost {
    pub author: String,
    pub crop: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

/// Itemized cultivation costs for one season
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CostBreakdown {
    /// Seed cost
    #[serde(default)]
    pub seed: f64,
    /// Fertilizer cost
    #[serde(default)]
    pub fertilizer: f64,
    /// Pesticide cost
    #[serde(default)]
    pub pesticide: f64,
    /// Labour cost
    #[serde(default)]
    pub labor: f64,
    /// Irrigation cost
    #[serde(default)]
    pub irrigation: f64,
    /// Transport cost
    #[serde(default)]
    pub transport: f64,
    /// Any other cost
    #[serde(default)]
    pub other: f64,
}

/// Stored cost entry for a farmer's crop
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CostRecord {
    pub user_id: String,
    pub crop: String,
    pub costs: CostBreakdown,
}

/// One answered advisory, kept for the farmer's history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdvisoryLogEntry {
    pub user_id: String,
    pub query: String,
    pub advice_text: String,
    pub created_at: DateTime<Utc>,
}
