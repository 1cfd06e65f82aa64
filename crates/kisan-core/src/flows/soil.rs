//! Soil analysis specialist

use super::{FarmerContext, FlowContext, PromptTemplate, SpecialistKind};
use crate::data::SoilReport;
use crate::Result;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

pub(crate) const TEMPLATE: PromptTemplate = PromptTemplate::new(
    "soil_analysis",
    r#"Interpret the farmer's soil health card and plan fertilizer use.

Write every text field in {{language}}.

Crop of interest: {{crop}}
Region: {{region}}

Soil health cards, most recent first:
{{soil_reports}}

pH classes are already assigned. Explain what each nutrient level means for
the crop, list the deficiencies that need correcting, and recommend products
with a dose per acre and timing. Prefer locally available fertilizers and
organic options where they work. When no soil card is available, say so in
the summary and give general guidance for the crop instead."#,
);

/// Arguments for the soil specialist
#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
pub struct SoilArgs {
    /// Crop the farmer is growing or planning, if mentioned
    #[serde(default)]
    pub crop: Option<String>,
}

/// Acidity band of a pH reading
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhClass {
    StronglyAcidic,
    SlightlyAcidic,
    Neutral,
    SlightlyAlkaline,
    StronglyAlkaline,
}

impl PhClass {
    pub fn from_ph(ph: f64) -> Self {
        if ph < 5.5 {
            PhClass::StronglyAcidic
        } else if ph < 6.5 {
            PhClass::SlightlyAcidic
        } else if ph <= 7.5 {
            PhClass::Neutral
        } else if ph <= 8.5 {
            PhClass::SlightlyAlkaline
        } else {
            PhClass::StronglyAlkaline
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PhClass::StronglyAcidic => "strongly acidic",
            PhClass::SlightlyAcidic => "slightly acidic",
            PhClass::Neutral => "neutral",
            PhClass::SlightlyAlkaline => "slightly alkaline",
            PhClass::StronglyAlkaline => "strongly alkaline",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct FertilizerRecommendation {
    /// Nutrient being corrected, e.g. nitrogen
    pub nutrient: String,
    /// Product to apply, e.g. urea or vermicompost
    pub product: String,
    /// Quantity per acre with unit
    pub dose_per_acre: String,
    /// When to apply relative to sowing
    pub timing: String,
}

/// The model's reading of the soil card
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SoilAssessment {
    /// Short interpretation of the soil condition
    pub summary: String,
    /// Nutrients or properties that need correcting
    pub deficiencies: Vec<String>,
    pub recommendations: Vec<FertilizerRecommendation>,
}

/// Soil specialist report
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SoilAnalysis {
    /// Card the assessment is based on; `None` when the farmer has none
    pub report_id: Option<String>,
    pub ph: Option<f64>,
    pub ph_class: Option<PhClass>,
    pub assessment: SoilAssessment,
}

fn describe_report(report: &SoilReport) -> String {
    format!(
        "- {} ({}): pH {:.1} ({}), nitrogen {:?}, phosphorus {:?}, potassium {:?}, \
         organic carbon {:.2}%, electrical conductivity {:.2} dS/m",
        report.created_at.format("%Y-%m-%d"),
        report.region,
        report.ph,
        PhClass::from_ph(report.ph).label(),
        report.nitrogen,
        report.phosphorus,
        report.potassium,
        report.organic_carbon,
        report.electrical_conductivity,
    )
}

pub async fn run(ctx: &FlowContext, farmer: &FarmerContext, args: SoilArgs) -> Result<SoilAnalysis> {
    let history = ctx
        .gateway(ctx.gateways.farmer_history(&farmer.user_id))
        .await?;
    let latest = history.latest_soil_report();

    let soil_reports = if history.soil_reports.is_empty() {
        "No soil health card on record.".to_string()
    } else {
        history
            .soil_reports
            .iter()
            .map(describe_report)
            .collect::<Vec<_>>()
            .join("\n")
    };

    let vars = [
        ("language", farmer.language.display_name().to_string()),
        (
            "crop",
            args.crop.unwrap_or_else(|| "not specified".to_string()),
        ),
        (
            "region",
            latest
                .map(|r| r.region.clone())
                .unwrap_or_else(|| "unknown".to_string()),
        ),
        ("soil_reports", soil_reports),
    ];
    let assessment: SoilAssessment = ctx.generate(SpecialistKind::Soil, &vars).await?;

    Ok(SoilAnalysis {
        report_id: latest.map(|r| r.id.clone()),
        ph: latest.map(|r| r.ph),
        ph_class: latest.map(|r| PhClass::from_ph(r.ph)),
        assessment,
    })
}
