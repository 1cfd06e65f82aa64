//! JSON schemas for tool arguments and structured model output

use crate::llm::strip_code_fences;
use crate::{KisanError, Result};
use schemars::gen::SchemaSettings;
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Keywords providers reject or ignore in function and response schemas
const UNSUPPORTED_KEYWORDS: &[&str] = &[
    "$schema",
    "title",
    "definitions",
    "format",
    "default",
    "minimum",
    "maximum",
];

/// Inline, provider-friendly schema for `T`
pub fn schema_of<T: JsonSchema>() -> Value {
    let settings = SchemaSettings::openapi3().with(|s| {
        s.inline_subschemas = true;
        s.meta_schema = None;
    });
    let root = settings.into_generator().into_root_schema_for::<T>();
    let mut value = serde_json::to_value(root).unwrap_or_default();
    sanitize(&mut value);

    // Function declarations need an explicit properties map
    if value.get("type").and_then(|t| t.as_str()) == Some("object")
        && value.get("properties").is_none()
    {
        value["properties"] = Value::Object(Default::default());
    }
    value
}

fn sanitize(value: &mut Value) {
    match value {
        Value::Object(map) => {
            for keyword in UNSUPPORTED_KEYWORDS {
                map.remove(*keyword);
            }
            for (key, child) in map.iter_mut() {
                if key == "properties" {
                    // Field names are data here, only their schemas get cleaned
                    if let Value::Object(fields) = child {
                        fields.values_mut().for_each(sanitize);
                    }
                } else {
                    sanitize(child);
                }
            }
        }
        Value::Array(items) => items.iter_mut().for_each(sanitize),
        _ => {}
    }
}

/// Parse model output into the flow's declared output type
///
/// Anything that does not deserialize into `T` is rejected.
pub fn parse_output<T: DeserializeOwned>(flow: &str, content: &str) -> Result<T> {
    let cleaned = strip_code_fences(content);
    if cleaned.is_empty() {
        return Err(KisanError::schema(flow, "model returned an empty completion"));
    }
    serde_json::from_str(cleaned).map_err(|e| KisanError::schema(flow, e.to_string()))
}
