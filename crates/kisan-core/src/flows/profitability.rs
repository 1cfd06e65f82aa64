//! Profitability specialist
//!
//! Cost inputs and the market price are fetched concurrently and both must be
//! present. All figures come from [`ProfitabilityFigures`]; the model only
//! writes the narrative around them.

use super::{FarmerContext, FlowContext, PromptTemplate, SpecialistKind};
use crate::data::CostBreakdown;
use crate::finance::ProfitabilityFigures;
use crate::{KisanError, Result};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

pub(crate) const TEMPLATE: PromptTemplate = PromptTemplate::new(
    "profitability_analysis",
    r#"Explain the season's profitability for {{crop}} to the farmer.

Write every text field in {{language}}.

Itemized costs:
{{cost_items}}

Figures (already computed, use them exactly):
- yield: {{yield}} quintals
- price: {{price}} per quintal ({{price_source}})
- total cost: {{total_cost}}
- total revenue: {{total_revenue}}
- net profit: {{net_profit}}
- return on investment: {{roi}}
- break-even price: {{break_even}}
- largest cost item: {{largest_item}}

Summarize whether the crop paid off, suggest practical ways to cut the largest
costs, and give a short outlook for the next season."#,
);

/// Arguments for the profitability specialist
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct ProfitabilityArgs {
    /// Crop being evaluated
    pub crop: String,
    /// Market region used to look up the selling price
    #[serde(default)]
    pub region: Option<String>,
    /// Harvested or expected yield in quintals
    pub actual_yield: f64,
    /// Selling price per quintal; the latest market price is used when absent
    #[serde(default)]
    pub market_price: Option<f64>,
    /// Itemized costs; the farmer's recorded costs are used when absent
    #[serde(default)]
    pub costs: Option<CostBreakdown>,
}

/// The model's narrative around the computed figures
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProfitabilityNarrative {
    /// Whether the crop paid off and why
    pub summary: String,
    /// Concrete ways to lower costs
    pub cost_saving_tips: Vec<String>,
    /// Short outlook for the next season
    pub outlook: String,
}

/// Where the selling price came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum PriceSource {
    /// Given in the request
    Provided,
    /// Latest mandi price of a region
    Market { region: String },
}

/// Profitability specialist report
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfitabilityReport {
    pub crop: String,
    pub actual_yield: f64,
    pub market_price: f64,
    pub price_source: PriceSource,
    pub costs: CostBreakdown,
    #[serde(flatten)]
    pub figures: ProfitabilityFigures,
    pub break_even_price: Option<f64>,
    pub narrative: ProfitabilityNarrative,
}

fn rupees(value: f64) -> String {
    format!("₹{:.2}", value)
}

pub async fn run(
    ctx: &FlowContext,
    farmer: &FarmerContext,
    args: ProfitabilityArgs,
) -> Result<ProfitabilityReport> {
    if !args.actual_yield.is_finite() || args.actual_yield < 0.0 {
        return Err(KisanError::invalid_request(format!(
            "yield must be a non-negative number, got {}",
            args.actual_yield
        )));
    }
    if let Some(price) = args.market_price {
        if !price.is_finite() || price < 0.0 {
            return Err(KisanError::invalid_request(format!(
                "market price must be a non-negative number, got {}",
                price
            )));
        }
    }

    if let Some(costs) = &args.costs {
        if let Some((label, amount)) = costs
            .items()
            .into_iter()
            .find(|(_, amount)| !amount.is_finite() || *amount < 0.0)
        {
            return Err(KisanError::invalid_request(format!(
                "{} cost must be a non-negative number, got {}",
                label, amount
            )));
        }
    }

    let region = args.region.clone().unwrap_or_default();
    let costs = async {
        match args.costs {
            Some(costs) => Ok(Some(costs)),
            None => {
                ctx.gateway(ctx.gateways.cost_inputs(&farmer.user_id, &args.crop))
                    .await
            }
        }
    };
    let price = async {
        match args.market_price {
            Some(price) => Ok(Some((price, PriceSource::Provided))),
            None => ctx
                .gateway(ctx.gateways.market_quote(&args.crop, &region))
                .await
                .map(|quote| {
                    quote.map(|q| (q.latest_price, PriceSource::Market { region: q.region }))
                }),
        }
    };
    let (costs, price) = tokio::try_join!(costs, price)?;

    let costs = costs.ok_or_else(|| {
        KisanError::not_found(format!("no cost inputs recorded for {}", args.crop))
    })?;
    let (market_price, price_source) = price
        .ok_or_else(|| KisanError::not_found(format!("no market price for {}", args.crop)))?;

    let figures = ProfitabilityFigures::compute(&costs, args.actual_yield, market_price);
    let break_even_price = figures.break_even_price(args.actual_yield);
    let (largest_label, largest_amount) = costs.largest_item();

    let cost_items = costs
        .items()
        .iter()
        .map(|(label, amount)| format!("- {}: {}", label, rupees(*amount)))
        .collect::<Vec<_>>()
        .join("\n");

    let vars = [
        ("language", farmer.language.display_name().to_string()),
        ("crop", args.crop.clone()),
        ("cost_items", cost_items),
        ("yield", format!("{}", args.actual_yield)),
        ("price", rupees(market_price)),
        (
            "price_source",
            match &price_source {
                PriceSource::Provided => "given by the farmer".to_string(),
                PriceSource::Market { region } => format!("latest mandi price in {}", region),
            },
        ),
        ("total_cost", rupees(figures.total_cost)),
        ("total_revenue", rupees(figures.total_revenue)),
        ("net_profit", rupees(figures.net_profit)),
        (
            "roi",
            figures
                .roi
                .map(|roi| format!("{:.1}%", roi))
                .unwrap_or_else(|| "not defined, nothing was spent".to_string()),
        ),
        (
            "break_even",
            break_even_price
                .map(rupees)
                .unwrap_or_else(|| "not defined, no yield".to_string()),
        ),
        (
            "largest_item",
            format!("{} ({})", largest_label, rupees(largest_amount)),
        ),
    ];
    let narrative: ProfitabilityNarrative =
        ctx.generate(SpecialistKind::Profitability, &vars).await?;

    Ok(ProfitabilityReport {
        crop: args.crop,
        actual_yield: args.actual_yield,
        market_price,
        price_source,
        costs,
        figures,
        break_even_price,
        narrative,
    })
}
