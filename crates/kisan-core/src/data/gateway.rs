//! Data gateways
//!
//! Bounded, recency-limited reads over a [`FarmStore`]. "Not found" is an
//! empty or `None` result; only store failures are errors.

use super::store::FarmStore;
use super::types::{
    AdvisoryLogEntry, CommunityPost, CostBreakdown, FarmerHistory, MarketQuote, MatchKind,
    SatelliteSummary,
};
use crate::config::AdvisoryConfig;
use crate::{KisanError, Result};
use std::future::Future;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Read access to farm records used by the specialist flows
#[derive(Clone)]
pub struct Gateways {
    store: Arc<dyn FarmStore>,
    soil_report_limit: usize,
    scan_limit: usize,
    community_limit: usize,
}

impl Gateways {
    pub fn new(store: Arc<dyn FarmStore>, config: &AdvisoryConfig) -> Self {
        Self {
            store,
            soil_report_limit: config.soil_report_limit,
            scan_limit: config.scan_limit,
            community_limit: config.community_limit,
        }
    }

    /// Price quote for crop+region: exact match, then same crop in any region, else `None`
    pub async fn market_quote(&self, crop: &str, region: &str) -> Result<Option<MarketQuote>> {
        let records = self.store.market_records(crop).await?;

        let exact = records
            .iter()
            .filter(|r| r.region.trim().eq_ignore_ascii_case(region.trim()))
            .find_map(|r| MarketQuote::from_record(r, MatchKind::Exact));
        if exact.is_some() {
            return Ok(exact);
        }

        let fallback = records
            .iter()
            .find_map(|r| MarketQuote::from_record(r, MatchKind::OtherRegion));
        if let Some(quote) = &fallback {
            tracing::debug!(
                crop,
                requested = region,
                served = %quote.region,
                "no exact market match, using another region"
            );
        }
        Ok(fallback)
    }

    /// Most recent soil reports and scans of a farmer
    pub async fn farmer_history(&self, user_id: &str) -> Result<FarmerHistory> {
        let (mut soil_reports, mut scans) = tokio::try_join!(
            self.store.soil_reports(user_id),
            self.store.scans(user_id)
        )?;

        soil_reports.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        soil_reports.truncate(self.soil_report_limit);
        scans.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        scans.truncate(self.scan_limit);

        Ok(FarmerHistory {
            soil_reports,
            scans,
        })
    }

    pub async fn cost_inputs(&self, user_id: &str, crop: &str) -> Result<Option<CostBreakdown>> {
        self.store.cost_inputs(user_id, crop).await
    }

    pub async fn satellite_summary(&self, user_id: &str) -> Result<Option<SatelliteSummary>> {
        self.store.satellite_summary(user_id).await
    }

    /// Newest community posts, optionally for one crop
    pub async fn community_posts(&self, crop: Option<&str>) -> Result<Vec<CommunityPost>> {
        let mut posts = self.store.community_posts(crop).await?;
        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        posts.truncate(self.community_limit);
        Ok(posts)
    }

    /// Store an answered advisory without waiting for the write
    pub fn spawn_record_advisory(&self, entry: AdvisoryLogEntry) {
        let store = Arc::clone(&self.store);
        tokio::spawn(async move {
            let user_id = entry.user_id.clone();
            if let Err(e) = store.record_advisory(entry).await {
                tracing::warn!(user_id = %user_id, error = %e, "failed to record advisory");
            }
        });
    }
}

/// Run a gateway future unless `cancel` fires first
pub async fn guarded<T, F>(cancel: &CancellationToken, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(KisanError::Cancelled),
        result = fut => result,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{
        MarketRecord, MemoryStore, NutrientLevel, PricePoint, ScanResult, SoilReport,
    };
    use chrono::{NaiveDate, TimeZone, Utc};
    use pretty_assertions::assert_eq;

    fn prices(values: &[f64]) -> Vec<PricePoint> {
        values
            .iter()
            .enumerate()
            .map(|(i, price)| PricePoint {
                date: NaiveDate::from_ymd_opt(2024, 1, 1 + i as u32).unwrap(),
                price: *price,
            })
            .collect()
    }

    fn market_store() -> Arc<MemoryStore> {
        let store = Arc::new(MemoryStore::new());
        store.add_market_record(MarketRecord {
            crop: "wheat".into(),
            region: "Punjab".into(),
            prices: prices(&[2100.0, 2150.0, 2200.0]),
        });
        store.add_market_record(MarketRecord {
            crop: "wheat".into(),
            region: "Haryana".into(),
            prices: prices(&[2050.0, 2125.0]),
        });
        store.add_market_record(MarketRecord {
            crop: "onion".into(),
            region: "Nashik".into(),
            prices: vec![],
        });
        store
    }

    fn gateways(store: Arc<MemoryStore>) -> Gateways {
        Gateways::new(store, &AdvisoryConfig::default())
    }

    #[tokio::test]
    async fn test_exact_match_latest_price_is_last_history_entry() {
        let gw = gateways(market_store());
        let quote = gw.market_quote("wheat", "Haryana").await.unwrap().unwrap();
        assert_eq!(quote.match_kind, MatchKind::Exact);
        assert_eq!(quote.region, "Haryana");
        assert_eq!(
            quote.latest_price,
            quote.historical_prices.last().unwrap().price
        );
        assert_eq!(quote.latest_price, 2125.0);
    }

    #[tokio::test]
    async fn test_fallback_uses_other_region_latest_price() {
        let gw = gateways(market_store());
        let quote = gw.market_quote("Wheat", "Bihar").await.unwrap().unwrap();
        assert_eq!(quote.match_kind, MatchKind::OtherRegion);
        assert_eq!(quote.region, "Punjab");
        assert_eq!(quote.latest_price, 2200.0);
    }

    #[tokio::test]
    async fn test_no_match_is_none() {
        let gw = gateways(market_store());
        assert!(gw.market_quote("maize", "Punjab").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_empty_history_never_matches() {
        let gw = gateways(market_store());
        assert!(gw.market_quote("onion", "Nashik").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_history_empty_user_is_empty_not_error() {
        let gw = gateways(market_store());
        let history = gw.farmer_history("nobody").await.unwrap();
        assert!(history.soil_reports.is_empty());
        assert!(history.scans.is_empty());
        assert!(history.is_empty());
    }

    #[tokio::test]
    async fn test_history_is_recent_first_and_bounded() {
        let store = Arc::new(MemoryStore::new());
        for day in 1..=4 {
            store.add_soil_report(SoilReport {
                id: format!("s{}", day),
                user_id: "u1".into(),
                ph: 6.5,
                nitrogen: NutrientLevel::Low,
                phosphorus: NutrientLevel::Medium,
                potassium: NutrientLevel::High,
                organic_carbon: 0.5,
                electrical_conductivity: 0.2,
                region: "Pune".into(),
                created_at: Utc.with_ymd_and_hms(2024, 1, day, 0, 0, 0).unwrap(),
            });
        }
        for day in 1..=12 {
            store.add_scan(ScanResult {
                id: format!("c{}", day),
                user_id: "u1".into(),
                crop: "tomato".into(),
                diagnosis: "early blight".into(),
                confidence: 0.8,
                created_at: Utc.with_ymd_and_hms(2024, 2, day, 0, 0, 0).unwrap(),
            });
        }

        let history = gateways(store).farmer_history("u1").await.unwrap();
        let soil_ids: Vec<&str> = history.soil_reports.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(soil_ids, vec!["s4", "s3"]);
        assert_eq!(history.scans.len(), 10);
        assert_eq!(history.scans[0].id, "c12");
        assert_eq!(history.scans[9].id, "c3");
    }

    #[tokio::test]
    async fn test_guarded_returns_cancelled() {
        let token = CancellationToken::new();
        token.cancel();
        let result: Result<()> = guarded(&token, std::future::pending()).await;
        assert!(matches!(result, Err(KisanError::Cancelled)));
    }

    #[tokio::test]
    async fn test_spawn_record_advisory_is_eventually_stored() {
        let store = Arc::new(MemoryStore::new());
        let gw = gateways(store.clone());
        gw.spawn_record_advisory(AdvisoryLogEntry {
            user_id: "u1".into(),
            query: "q".into(),
            advice_text: "a".into(),
            created_at: Utc::now(),
        });
        for _ in 0..50 {
            if !store.advisories().is_empty() {
                break;
            }
            tokio::task::yield_now().await;
        }
        assert_eq!(store.advisories().len(), 1);
    }
}
