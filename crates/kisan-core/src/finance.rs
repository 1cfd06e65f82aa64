//! Deterministic farm arithmetic
//!
//! Everything numeric the advisors talk about is computed here and handed to
//! the model as input. The model only narrates.

use crate::data::{CostBreakdown, PricePoint};
use serde::{Deserialize, Serialize};

impl CostBreakdown {
    /// Sum of every itemized cost
    pub fn total(&self) -> f64 {
        self.seed
            + self.fertilizer
            + self.pesticide
            + self.labor
            + self.irrigation
            + self.transport
            + self.other
    }

    /// Items as (label, amount), for prompts and reports
    pub fn items(&self) -> [(&'static str, f64); 7] {
        [
            ("seed", self.seed),
            ("fertilizer", self.fertilizer),
            ("pesticide", self.pesticide),
            ("labor", self.labor),
            ("irrigation", self.irrigation),
            ("transport", self.transport),
            ("other", self.other),
        ]
    }

    /// Largest single cost item
    pub fn largest_item(&self) -> (&'static str, f64) {
        self.items()
            .into_iter()
            .fold(("seed", f64::MIN), |best, item| {
                if item.1 > best.1 {
                    item
                } else {
                    best
                }
            })
    }
}

/// Season profitability figures
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfitabilityFigures {
    pub total_cost: f64,
    pub total_revenue: f64,
    pub net_profit: f64,
    /// Percent; `None` when nothing was spent
    pub roi: Option<f64>,
}

impl ProfitabilityFigures {
    /// `actual_yield` and `market_price` must use the same unit (e.g. quintals and price per quintal)
    pub fn compute(costs: &CostBreakdown, actual_yield: f64, market_price: f64) -> Self {
        let total_cost = costs.total();
        let total_revenue = actual_yield * market_price;
        let net_profit = total_revenue - total_cost;
        let roi = if total_cost > 0.0 {
            Some(net_profit / total_cost * 100.0)
        } else {
            None
        };

        Self {
            total_cost,
            total_revenue,
            net_profit,
            roi,
        }
    }

    /// Price per unit at which revenue covers cost
    pub fn break_even_price(&self, actual_yield: f64) -> Option<f64> {
        if actual_yield > 0.0 {
            Some(self.total_cost / actual_yield)
        } else {
            None
        }
    }
}

/// Direction of recent prices
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum PriceTrend {
    Rising,
    Falling,
    Stable,
}

/// Change under this percentage counts as stable
const STABLE_BAND_PERCENT: f64 = 2.0;

/// Summary statistics over a price history
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceStats {
    pub latest: f64,
    pub average: f64,
    pub min: f64,
    pub max: f64,
    /// Latest price relative to the average, percent
    pub deviation_from_average: f64,
    /// Latest price relative to the previous point, percent; `None` with one point
    pub change_from_previous: Option<f64>,
    pub trend: PriceTrend,
}

impl PriceStats {
    /// `None` for an empty history
    pub fn from_history(prices: &[PricePoint]) -> Option<Self> {
        let latest = prices.last()?.price;
        let count = prices.len() as f64;
        let average = prices.iter().map(|p| p.price).sum::<f64>() / count;
        let min = prices.iter().map(|p| p.price).fold(f64::INFINITY, f64::min);
        let max = prices
            .iter()
            .map(|p| p.price)
            .fold(f64::NEG_INFINITY, f64::max);

        let change_from_previous = prices
            .len()
            .checked_sub(2)
            .map(|i| percentage_change(prices[i].price, latest));

        // Trend compares the latest point with the first one
        let overall = percentage_change(prices[0].price, latest);
        let trend = if overall > STABLE_BAND_PERCENT {
            PriceTrend::Rising
        } else if overall < -STABLE_BAND_PERCENT {
            PriceTrend::Falling
        } else {
            PriceTrend::Stable
        };

        Some(Self {
            latest,
            average,
            min,
            max,
            deviation_from_average: percentage_change(average, latest),
            change_from_previous,
            trend,
        })
    }
}

/// `(to - from) / from * 100`, zero when `from` is zero
pub fn percentage_change(from: f64, to: f64) -> f64 {
    if from == 0.0 {
        0.0
    } else {
        (to - from) / from * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    fn sample_costs() -> CostBreakdown {
        CostBreakdown {
            seed: 1000.0,
            fertilizer: 500.0,
            pesticide: 200.0,
            labor: 800.0,
            irrigation: 300.0,
            transport: 150.0,
            other: 50.0,
        }
    }

    fn history(values: &[f64]) -> Vec<PricePoint> {
        values
            .iter()
            .enumerate()
            .map(|(i, price)| PricePoint {
                date: NaiveDate::from_ymd_opt(2024, 3, 1 + i as u32).unwrap(),
                price: *price,
            })
            .collect()
    }

    #[test]
    fn test_reference_profitability() {
        // 30 quintals at 1000 per quintal gives 30,000 revenue
        let figures = ProfitabilityFigures::compute(&sample_costs(), 30.0, 1000.0);
        assert_eq!(figures.total_cost, 3000.0);
        assert_eq!(figures.total_revenue, 30_000.0);
        assert_eq!(figures.net_profit, 27_000.0);
        assert_eq!(figures.roi, Some(900.0));
    }

    #[test]
    fn test_identities_hold() {
        let costs = CostBreakdown {
            seed: 1234.5,
            labor: 987.25,
            ..CostBreakdown::default()
        };
        let figures = ProfitabilityFigures::compute(&costs, 12.5, 2310.0);
        assert_eq!(figures.total_revenue, 12.5 * 2310.0);
        assert_eq!(figures.net_profit, figures.total_revenue - figures.total_cost);
        let roi = figures.roi.unwrap();
        assert!((roi - figures.net_profit / figures.total_cost * 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_zero_cost_has_no_roi() {
        let figures = ProfitabilityFigures::compute(&CostBreakdown::default(), 10.0, 100.0);
        assert_eq!(figures.roi, None);
        assert_eq!(figures.net_profit, 1000.0);
    }

    #[test]
    fn test_loss_gives_negative_roi() {
        let figures = ProfitabilityFigures::compute(&sample_costs(), 1.0, 1500.0);
        assert_eq!(figures.net_profit, -1500.0);
        assert_eq!(figures.roi, Some(-50.0));
    }

    #[test]
    fn test_break_even_price() {
        let figures = ProfitabilityFigures::compute(&sample_costs(), 30.0, 1000.0);
        assert_eq!(figures.break_even_price(30.0), Some(100.0));
        assert_eq!(figures.break_even_price(0.0), None);
    }

    #[test]
    fn test_largest_item() {
        assert_eq!(sample_costs().largest_item(), ("seed", 1000.0));
    }

    #[test]
    fn test_price_stats_rising() {
        let stats = PriceStats::from_history(&history(&[1000.0, 1100.0, 1200.0])).unwrap();
        assert_eq!(stats.latest, 1200.0);
        assert_eq!(stats.average, 1100.0);
        assert_eq!(stats.min, 1000.0);
        assert_eq!(stats.max, 1200.0);
        assert_eq!(stats.trend, PriceTrend::Rising);
        let change = stats.change_from_previous.unwrap();
        assert!((change - 100.0 / 11.0).abs() < 1e-9);
        assert!((stats.deviation_from_average - 100.0 / 11.0).abs() < 1e-9);
    }

    #[test]
    fn test_price_stats_stable_and_single_point() {
        let stats = PriceStats::from_history(&history(&[1000.0, 1010.0])).unwrap();
        assert_eq!(stats.trend, PriceTrend::Stable);

        let single = PriceStats::from_history(&history(&[900.0])).unwrap();
        assert_eq!(single.change_from_previous, None);
        assert_eq!(single.deviation_from_average, 0.0);
        assert_eq!(single.trend, PriceTrend::Stable);
    }

    #[test]
    fn test_price_stats_falling_and_empty() {
        let stats = PriceStats::from_history(&history(&[1000.0, 900.0])).unwrap();
        assert_eq!(stats.trend, PriceTrend::Falling);
        assert!(PriceStats::from_history(&[]).is_none());
    }

    #[test]
    fn test_percentage_change_zero_base() {
        assert_eq!(percentage_change(0.0, 10.0), 0.0);
        assert_eq!(percentage_change(50.0, 75.0), 50.0);
    }
}
