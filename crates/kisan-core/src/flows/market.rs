//! Market forecast specialist

use super::{FarmerContext, FlowContext, PromptTemplate, SpecialistKind};
use crate::data::{CommunityPost, MarketQuote, MatchKind};
use crate::finance::PriceStats;
use crate::Result;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

pub(crate) const TEMPLATE: PromptTemplate = PromptTemplate::new(
    "market_forecast",
    r#"Forecast the near-term mandi price for {{crop}} and advise the farmer on selling.

Write every text field in {{language}}.

Prices are from {{region}}. {{match_note}}
Price history, oldest first:
{{price_history}}

Computed statistics:
- latest price: {{latest}}
- average: {{average}} (range {{min}} to {{max}})
- latest vs average: {{deviation}}
- change since previous reading: {{change}}
- overall trend: {{trend}}

What other farmers are saying:
{{community}}

Explain the trend in plain words, give a short forecast for the coming weeks
and recommend whether to sell now, hold, or sell part of the harvest."#,
);

/// Arguments for the market specialist
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct MarketArgs {
    /// Crop name, e.g. onion or wheat
    pub crop: String,
    /// Mandi, district or state; another region is used when it has no prices
    #[serde(default)]
    pub region: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum SellAdvice {
    SellNow,
    Hold,
    SellPartially,
}

/// The model's reading of the price data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct MarketOutlook {
    /// Expected price movement over the coming weeks
    pub forecast: String,
    pub recommendation: SellAdvice,
    /// Why the recommendation fits the data
    pub rationale: String,
}

/// Market specialist report
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketForecast {
    pub crop: String,
    pub requested_region: Option<String>,
    /// `None` when no region has prices for the crop
    pub quote: Option<MarketQuote>,
    pub stats: Option<PriceStats>,
    pub outlook: Option<MarketOutlook>,
}

fn money(value: f64) -> String {
    format!("₹{:.2}", value)
}

fn percent(value: f64) -> String {
    format!("{:+.1}%", value)
}

fn describe_community(posts: &[CommunityPost]) -> String {
    if posts.is_empty() {
        return "No recent posts.".to_string();
    }
    posts
        .iter()
        .map(|p| format!("- {} ({}): {}", p.author, p.created_at.format("%Y-%m-%d"), p.text))
        .collect::<Vec<_>>()
        .join("\n")
}

pub async fn run(
    ctx: &FlowContext,
    farmer: &FarmerContext,
    args: MarketArgs,
) -> Result<MarketForecast> {
    let region = args.region.clone().unwrap_or_default();
    let (quote, posts) = tokio::try_join!(
        ctx.gateway(ctx.gateways.market_quote(&args.crop, &region)),
        ctx.gateway(ctx.gateways.community_posts(Some(args.crop.as_str()))),
    )?;

    let Some((quote, stats)) =
        quote.and_then(|q| PriceStats::from_history(&q.historical_prices).map(|s| (q, s)))
    else {
        tracing::debug!(crop = %args.crop, region = %region, "no market data, skipping forecast");
        return Ok(MarketForecast {
            crop: args.crop,
            requested_region: args.region,
            quote: None,
            stats: None,
            outlook: None,
        });
    };

    let match_note = match quote.match_kind {
        MatchKind::Exact => String::new(),
        MatchKind::OtherRegion if region.is_empty() => {
            "No region was given, so the nearest available market is used.".to_string()
        }
        MatchKind::OtherRegion => format!(
            "{} had no prices for this crop; tell the farmer the figures come from {}.",
            region, quote.region
        ),
    };

    let price_history = quote
        .historical_prices
        .iter()
        .map(|p| format!("- {}: {}", p.date, money(p.price)))
        .collect::<Vec<_>>()
        .join("\n");

    let vars = [
        ("language", farmer.language.display_name().to_string()),
        ("crop", quote.crop.clone()),
        ("region", quote.region.clone()),
        ("match_note", match_note),
        ("price_history", price_history),
        ("latest", money(stats.latest)),
        ("average", money(stats.average)),
        ("min", money(stats.min)),
        ("max", money(stats.max)),
        ("deviation", percent(stats.deviation_from_average)),
        (
            "change",
            stats
                .change_from_previous
                .map(percent)
                .unwrap_or_else(|| "only one reading".to_string()),
        ),
        ("trend", format!("{:?}", stats.trend).to_lowercase()),
        ("community", describe_community(&posts)),
    ];
    let outlook: MarketOutlook = ctx.generate(SpecialistKind::Market, &vars).await?;

    Ok(MarketForecast {
        crop: args.crop,
        requested_region: args.region,
        quote: Some(quote),
        stats: Some(stats),
        outlook: Some(outlook),
    })
}
