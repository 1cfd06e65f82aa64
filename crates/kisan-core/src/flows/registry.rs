//! Specialist registry
//!
//! Maps each [`SpecialistKind`] to its tool name, description, argument and
//! output schemas, and instruction template.

use super::schema::schema_of;
use super::template::PromptTemplate;
use super::{history, market, profitability, satellite, soil};
use crate::llm::ToolDeclaration;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// The fixed set of specialists the orchestrator can call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpecialistKind {
    Soil,
    Market,
    Profitability,
    History,
    Satellite,
}

impl SpecialistKind {
    pub const ALL: [SpecialistKind; 5] = [
        SpecialistKind::Soil,
        SpecialistKind::Market,
        SpecialistKind::Profitability,
        SpecialistKind::History,
        SpecialistKind::Satellite,
    ];

    /// Name the model uses to call this specialist
    pub fn tool_name(&self) -> &'static str {
        match self {
            SpecialistKind::Soil => "soil_analysis",
            SpecialistKind::Market => "market_forecast",
            SpecialistKind::Profitability => "profitability_analysis",
            SpecialistKind::History => "farm_history",
            SpecialistKind::Satellite => "field_health",
        }
    }

    pub fn from_tool_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.tool_name() == name.trim())
    }

    fn index(&self) -> usize {
        Self::ALL
            .iter()
            .position(|kind| kind == self)
            .unwrap_or_default()
    }
}

impl fmt::Display for SpecialistKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tool_name())
    }
}

/// Everything needed to declare and run one specialist
#[derive(Debug, Clone)]
pub struct SpecialistSpec {
    pub kind: SpecialistKind,
    pub description: &'static str,
    pub template: PromptTemplate,
    /// Schema of the tool arguments the model supplies
    pub input_schema: Value,
    /// Schema the model's structured answer must match
    pub output_schema: Value,
}

impl SpecialistSpec {
    pub fn tool_name(&self) -> &'static str {
        self.kind.tool_name()
    }

    pub fn declaration(&self) -> ToolDeclaration {
        ToolDeclaration {
            name: self.tool_name().to_string(),
            description: self.description.to_string(),
            parameters: self.input_schema.clone(),
        }
    }
}

/// Registry of all specialists, schemas generated once at construction
#[derive(Debug, Clone)]
pub struct SpecialistRegistry {
    specs: Vec<SpecialistSpec>,
}

impl SpecialistRegistry {
    pub fn standard() -> Self {
        let specs = SpecialistKind::ALL
            .into_iter()
            .map(|kind| match kind {
                SpecialistKind::Soil => SpecialistSpec {
                    kind,
                    description: "Interpret the farmer's latest soil health card and recommend \
                                  fertilizer doses. Use for questions about soil, nutrients, \
                                  manure or fertilizer.",
                    template: soil::TEMPLATE,
                    input_schema: schema_of::<soil::SoilArgs>(),
                    output_schema: schema_of::<soil::SoilAssessment>(),
                },
                SpecialistKind::Market => SpecialistSpec {
                    kind,
                    description: "Look up mandi prices for a crop, summarize the trend and \
                                  advise whether to sell now or hold. Use for price and \
                                  selling questions.",
                    template: market::TEMPLATE,
                    input_schema: schema_of::<market::MarketArgs>(),
                    output_schema: schema_of::<market::MarketOutlook>(),
                },
                SpecialistKind::Profitability => SpecialistSpec {
                    kind,
                    description: "Compute cost, revenue, net profit and ROI for a crop from \
                                  the farmer's costs, yield and market price. Use for profit, \
                                  loss or cost questions.",
                    template: profitability::TEMPLATE,
                    input_schema: schema_of::<profitability::ProfitabilityArgs>(),
                    output_schema: schema_of::<profitability::ProfitabilityNarrative>(),
                },
                SpecialistKind::History => SpecialistSpec {
                    kind,
                    description: "Review the farmer's past soil reports and crop disease \
                                  scans for recurring problems. Use when past issues matter \
                                  or the farmer refers to earlier seasons.",
                    template: history::TEMPLATE,
                    input_schema: schema_of::<history::HistoryArgs>(),
                    output_schema: schema_of::<history::HistoryInsights>(),
                },
                SpecialistKind::Satellite => SpecialistSpec {
                    kind,
                    description: "Assess current field health from satellite vegetation \
                                  index and soil moisture. Use for irrigation, crop stress \
                                  or growth questions.",
                    template: satellite::TEMPLATE,
                    input_schema: schema_of::<satellite::FieldHealthArgs>(),
                    output_schema: schema_of::<satellite::FieldHealthAssessment>(),
                },
            })
            .collect();

        Self { specs }
    }

    pub fn get(&self, kind: SpecialistKind) -> &SpecialistSpec {
        &self.specs[kind.index()]
    }

    pub fn lookup(&self, tool_name: &str) -> Option<&SpecialistSpec> {
        SpecialistKind::from_tool_name(tool_name).map(|kind| self.get(kind))
    }

    pub fn iter(&self) -> impl Iterator<Item = &SpecialistSpec> {
        self.specs.iter()
    }

    /// Declarations for every specialist, in registry order
    pub fn tool_declarations(&self) -> Vec<ToolDeclaration> {
        self.specs.iter().map(SpecialistSpec::declaration).collect()
    }
}

impl Default for SpecialistRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_tool_names_round_trip() {
        for kind in SpecialistKind::ALL {
            assert_eq!(SpecialistKind::from_tool_name(kind.tool_name()), Some(kind));
        }
        assert_eq!(SpecialistKind::from_tool_name("weather"), None);
    }

    #[test]
    fn test_tool_names_unique() {
        let names: HashSet<_> = SpecialistKind::ALL.iter().map(|k| k.tool_name()).collect();
        assert_eq!(names.len(), SpecialistKind::ALL.len());
    }

    #[test]
    fn test_registry_order_matches_kinds() {
        let registry = SpecialistRegistry::standard();
        for kind in SpecialistKind::ALL {
            assert_eq!(registry.get(kind).kind, kind);
        }
        assert_eq!(
            registry.lookup("market_forecast").map(|s| s.kind),
            Some(SpecialistKind::Market)
        );
    }

    #[test]
    fn test_schemas_are_objects() {
        let registry = SpecialistRegistry::standard();
        for spec in registry.iter() {
            assert_eq!(spec.input_schema["type"], "object", "{}", spec.tool_name());
            assert!(spec.input_schema["properties"].is_object());
            assert_eq!(spec.output_schema["type"], "object", "{}", spec.tool_name());
            assert!(!spec.output_schema["required"].as_array().unwrap().is_empty());
        }
    }

    #[test]
    fn test_templates_ask_for_language() {
        let registry = SpecialistRegistry::standard();
        for spec in registry.iter() {
            assert!(
                spec.template.placeholders().contains(&"language"),
                "{} template has no language placeholder",
                spec.tool_name()
            );
        }
    }

    #[test]
    fn test_profitability_arguments_schema() {
        let registry = SpecialistRegistry::standard();
        let schema = &registry.get(SpecialistKind::Profitability).input_schema;
        let required: Vec<&str> = schema["required"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(|v| v.as_str())
            .collect();
        assert!(required.contains(&"crop"));
        assert!(required.contains(&"actual_yield"));
        assert!(!required.contains(&"costs"));
        assert_eq!(schema["properties"]["costs"]["properties"]["seed"]["type"], "number");
    }

    #[test]
    fn test_declarations_cover_all_specialists() {
        let declarations = SpecialistRegistry::standard().tool_declarations();
        let names: Vec<&str> = declarations.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "soil_analysis",
                "market_forecast",
                "profitability_analysis",
                "farm_history",
                "field_health"
            ]
        );
    }
}
