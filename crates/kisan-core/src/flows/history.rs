//! Farm history specialist

use super::{prompt_json, FarmerContext, FlowContext, PromptTemplate, SpecialistKind};
use crate::data::ScanResult;
use crate::Result;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub(crate) const TEMPLATE: PromptTemplate = PromptTemplate::new(
    "farm_history",
    r#"Review this farmer's records and point out patterns.

Write every text field in {{language}}.

The farmer is asking about: {{focus}}

Soil health cards, most recent first:
{{soil_reports}}

Crop disease scans, most recent first:
{{scans}}

Most frequent diagnosis: {{top_diagnosis}}

Summarize what the records show, name problems that keep coming back and
suggest next steps. When there are no records, say that plainly and suggest
a soil test and a first crop scan."#,
);

/// Arguments for the history specialist
#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
pub struct HistoryArgs {
    /// What the farmer wants to know, in a few words
    #[serde(default)]
    pub focus: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct HistoryInsights {
    pub summary: String,
    /// Problems seen more than once
    pub recurring_issues: Vec<String>,
    pub next_steps: Vec<String>,
}

/// History specialist report
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryReview {
    pub soil_report_count: usize,
    pub scan_count: usize,
    pub top_diagnosis: Option<DiagnosisCount>,
    pub insights: HistoryInsights,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiagnosisCount {
    pub diagnosis: String,
    pub count: usize,
}

/// Most frequent diagnosis, ties going to the most recent one
pub fn top_diagnosis(scans: &[ScanResult]) -> Option<DiagnosisCount> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for scan in scans {
        *counts
            .entry(scan.diagnosis.trim().to_lowercase())
            .or_default() += 1;
    }

    // Scans are most recent first, so the first to reach the max wins
    let mut best: Option<DiagnosisCount> = None;
    for scan in scans {
        let key = scan.diagnosis.trim().to_lowercase();
        let count = counts.get(&key).copied().unwrap_or_default();
        if best.as_ref().map_or(true, |b| count > b.count) {
            best = Some(DiagnosisCount {
                diagnosis: scan.diagnosis.trim().to_string(),
                count,
            });
        }
    }
    best
}

pub async fn run(ctx: &FlowContext, farmer: &FarmerContext, args: HistoryArgs) -> Result<HistoryReview> {
    let history = ctx
        .gateway(ctx.gateways.farmer_history(&farmer.user_id))
        .await?;
    let top = top_diagnosis(&history.scans);

    let vars = [
        ("language", farmer.language.display_name().to_string()),
        (
            "focus",
            args.focus
                .unwrap_or_else(|| "their farm in general".to_string()),
        ),
        (
            "soil_reports",
            if history.soil_reports.is_empty() {
                "None on record.".to_string()
            } else {
                prompt_json(&history.soil_reports)
            },
        ),
        (
            "scans",
            if history.scans.is_empty() {
                "None on record.".to_string()
            } else {
                prompt_json(&history.scans)
            },
        ),
        (
            "top_diagnosis",
            top.as_ref()
                .map(|t| format!("{} ({} scans)", t.diagnosis, t.count))
                .unwrap_or_else(|| "none".to_string()),
        ),
    ];
    let insights: HistoryInsights = ctx.generate(SpecialistKind::History, &vars).await?;

    Ok(HistoryReview {
        soil_report_count: history.soil_reports.len(),
        scan_count: history.scans.len(),
        top_diagnosis: top,
        insights,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::MemoryStore;
    use crate::flows::fixtures::{context, farmer};
    use crate::llm::testing::ScriptedProvider;
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    const INSIGHTS: &str = r#"{"summary":"Blight keeps returning.","recurringIssues":["early blight"],"nextSteps":["Rotate crops"]}"#;

    fn scan(id: &str, day: u32, diagnosis: &str) -> ScanResult {
        ScanResult {
            id: id.into(),
            user_id: "farmer-1".into(),
            crop: "tomato".into(),
            diagnosis: diagnosis.into(),
            confidence: 0.9,
            created_at: Utc.with_ymd_and_hms(2024, 7, day, 0, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_top_diagnosis_counts_case_insensitively() {
        let scans = vec![
            scan("3", 3, "Leaf Curl"),
            scan("2", 2, "early blight"),
            scan("1", 1, "Early Blight "),
        ];
        let top = top_diagnosis(&scans).unwrap();
        assert_eq!(top.diagnosis, "early blight");
        assert_eq!(top.count, 2);
    }

    #[test]
    fn test_top_diagnosis_tie_prefers_recent() {
        let scans = vec![scan("2", 2, "leaf curl"), scan("1", 1, "early blight")];
        assert_eq!(top_diagnosis(&scans).unwrap().diagnosis, "leaf curl");
        assert_eq!(top_diagnosis(&[]), None);
    }

    #[tokio::test]
    async fn test_review_counts_records() {
        let store = Arc::new(MemoryStore::new());
        store.add_scan(scan("a", 1, "early blight"));
        store.add_scan(scan("b", 5, "early blight"));
        let provider = Arc::new(ScriptedProvider::new().with_text(INSIGHTS));
        let ctx = context(provider.clone(), store);

        let review = run(&ctx, &farmer(), HistoryArgs::default()).await.unwrap();
        assert_eq!(review.scan_count, 2);
        assert_eq!(review.soil_report_count, 0);
        assert_eq!(review.top_diagnosis.unwrap().count, 2);
        assert_eq!(review.insights.recurring_issues, vec!["early blight"]);

        let prompt = provider.requests()[0].messages[0].text().to_string();
        assert!(prompt.contains("early blight (2 scans)"));
    }

    #[tokio::test]
    async fn test_empty_history_still_reviews() {
        let provider = Arc::new(ScriptedProvider::new().with_text(INSIGHTS));
        let ctx = context(provider.clone(), Arc::new(MemoryStore::new()));

        let review = run(&ctx, &farmer(), HistoryArgs::default()).await.unwrap();
        assert_eq!(review.scan_count, 0);
        assert!(review.top_diagnosis.is_none());
        let prompt = provider.requests()[0].messages[0].text().to_string();
        assert!(prompt.contains("None on record."));
    }
}
