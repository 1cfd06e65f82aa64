//! Field health specialist, backed by the satellite summary

use super::{FarmerContext, FlowContext, PromptTemplate, SpecialistKind};
use crate::data::SatelliteSummary;
use crate::Result;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

pub(crate) const TEMPLATE: PromptTemplate = PromptTemplate::new(
    "field_health",
    r#"Assess the health of the farmer's field from satellite readings.

Write every text field in {{language}}.

The farmer is asking about: {{focus}}

Observed on {{observed_at}}:
- NDVI: {{ndvi}} ({{vigour}} vegetation)
- soil moisture: {{soil_moisture}}%
- note: {{note}}

Classify the field as healthy, watch or stressed, describe what the readings
suggest in plain words and list actions such as irrigation or scouting."#,
);

/// Arguments for the field health specialist
#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
pub struct FieldHealthArgs {
    /// What the farmer wants to know, in a few words
    #[serde(default)]
    pub focus: Option<String>,
}

/// Vegetation density band of an NDVI reading
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VegetationVigour {
    Sparse,
    Low,
    Moderate,
    Dense,
}

impl VegetationVigour {
    pub fn from_ndvi(ndvi: f64) -> Self {
        match ndvi {
            v if v < 0.2 => VegetationVigour::Sparse,
            v if v < 0.4 => VegetationVigour::Low,
            v if v < 0.6 => VegetationVigour::Moderate,
            _ => VegetationVigour::Dense,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum FieldStatus {
    Healthy,
    Watch,
    Stressed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct FieldHealthAssessment {
    pub status: FieldStatus,
    /// What the readings suggest about the crop
    pub observations: String,
    pub actions: Vec<String>,
}

/// Field health report; empty when no satellite pass covers the farm
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldHealthReport {
    pub observation: Option<SatelliteSummary>,
    pub vigour: Option<VegetationVigour>,
    pub assessment: Option<FieldHealthAssessment>,
}

pub async fn run(
    ctx: &FlowContext,
    farmer: &FarmerContext,
    args: FieldHealthArgs,
) -> Result<FieldHealthReport> {
    let Some(summary) = ctx
        .gateway(ctx.gateways.satellite_summary(&farmer.user_id))
        .await?
    else {
        tracing::debug!(user_id = %farmer.user_id, "no satellite summary");
        return Ok(FieldHealthReport {
            observation: None,
            vigour: None,
            assessment: None,
        });
    };

    let vigour = VegetationVigour::from_ndvi(summary.ndvi);
    let vars = [
        ("language", farmer.language.display_name().to_string()),
        (
            "focus",
            args.focus
                .unwrap_or_else(|| "the current state of the crop".to_string()),
        ),
        ("observed_at", summary.observed_at.format("%Y-%m-%d").to_string()),
        ("ndvi", format!("{:.2}", summary.ndvi)),
        ("vigour", format!("{:?}", vigour).to_lowercase()),
        ("soil_moisture", format!("{:.0}", summary.soil_moisture)),
        (
            "note",
            summary.note.clone().unwrap_or_else(|| "none".to_string()),
        ),
    ];
    let assessment: FieldHealthAssessment = ctx.generate(SpecialistKind::Satellite, &vars).await?;

    Ok(FieldHealthReport {
        observation: Some(summary),
        vigour: Some(vigour),
        assessment: Some(assessment),
    })
}
