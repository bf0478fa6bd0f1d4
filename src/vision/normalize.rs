//! Analysis payload normalization
//!
//! The upstream model's output is not schema-guaranteed: keys go missing,
//! numbers arrive as strings, and sometimes the structured fields only
//! exist inside the raw reply text. Normalization always produces a
//! complete, well-typed analysis; it never fails.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::client::extract_json;

/// Display label when the model detected nothing
const UNIDENTIFIED_FOOD: &str = "Unidentified food";

/// Recommendation text for the upstream-failure fallback
const COULD_NOT_ANALYZE: &str =
    "The image could not be analyzed. Please try again with a clearer photo of the meal.";

/// Nutrient estimates from the vision model
///
/// These bypass the food catalog entirely; they feed the restriction engine
/// directly.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EstimatedTotals {
    pub energy: f64,
    pub sodium: f64,
    pub potassium: f64,
    pub phosphorus: f64,
    pub protein: f64,
}

/// A fully-defaulted analysis result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizedAnalysis {
    pub detected_items: Vec<String>,
    pub totals: EstimatedTotals,
    pub recommendation: String,
    /// The model's own compatibility claim
    pub renal_compatible: bool,
    pub raw_text: String,
    /// Human-readable summary built from the detected items
    pub display_name: String,
    /// True when the upstream call itself failed
    pub analysis_failed: bool,
}

/// Normalize an upstream payload into a complete analysis
///
/// Every expected key gets a default when missing; `recomendaciones` and
/// `compatibilidad_renal` are lifted out of `texto_original` when the model
/// only produced them there.
pub fn normalize(payload: &Value) -> NormalizedAnalysis {
    // texto_original is sometimes a string, sometimes an already-parsed
    // sub-object; either may hold fields the top level is missing
    let nested = nested_payload(payload);

    let mut detected_items = string_list(&payload["alimentos_detectados"]).unwrap_or_default();
    if detected_items.is_empty() {
        if let Some(n) = &nested {
            detected_items = string_list(&n["alimentos_detectados"]).unwrap_or_default();
        }
    }

    let totals = parse_totals(&payload["totales"])
        .or_else(|| nested.as_ref().and_then(|n| parse_totals(&n["totales"])))
        .unwrap_or_default();

    let recommendation = non_empty_str(&payload["recomendaciones"])
        .or_else(|| nested.as_ref().and_then(|n| non_empty_str(&n["recomendaciones"])))
        .unwrap_or_default();

    let renal_compatible = payload["compatibilidad_renal"]
        .as_bool()
        .or_else(|| nested.as_ref().and_then(|n| n["compatibilidad_renal"].as_bool()))
        .unwrap_or(false);

    let raw_text = match &payload["texto_original"] {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    };

    NormalizedAnalysis {
        display_name: display_name(&detected_items),
        detected_items,
        totals,
        recommendation,
        renal_compatible,
        raw_text,
        analysis_failed: false,
    }
}

/// The defined fallback when the upstream call errored or timed out
pub fn normalize_failure(reason: &str) -> NormalizedAnalysis {
    NormalizedAnalysis {
        detected_items: Vec::new(),
        totals: EstimatedTotals::default(),
        recommendation: COULD_NOT_ANALYZE.to_string(),
        renal_compatible: false,
        raw_text: reason.to_string(),
        display_name: UNIDENTIFIED_FOOD.to_string(),
        analysis_failed: true,
    }
}

/// Build a summary name from the detected-item list
///
/// All items joined when three or fewer; otherwise the first three plus a
/// "+N more" suffix; a fixed label when empty.
pub fn display_name(items: &[String]) -> String {
    match items.len() {
        0 => UNIDENTIFIED_FOOD.to_string(),
        1..=3 => items.join(", "),
        n => format!("{} +{} more", items[..3].join(", "), n - 3),
    }
}

/// texto_original as a payload: already an object, or a string to parse
fn nested_payload(payload: &Value) -> Option<Value> {
    match &payload["texto_original"] {
        Value::Object(_) => Some(payload["texto_original"].clone()),
        Value::String(s) => extract_json(s),
        _ => None,
    }
}

fn string_list(value: &Value) -> Option<Vec<String>> {
    let array = value.as_array()?;
    Some(
        array
            .iter()
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect(),
    )
}

fn non_empty_str(value: &Value) -> Option<String> {
    value
        .as_str()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn parse_totals(value: &Value) -> Option<EstimatedTotals> {
    let map = value.as_object()?;
    Some(EstimatedTotals {
        energy: number(map.get("energia")),
        sodium: number(map.get("sodio")),
        potassium: number(map.get("potasio")),
        phosphorus: number(map.get("fosforo")),
        protein: number(map.get("proteinas")),
    })
}

/// Numbers sometimes arrive as strings; both count, anything else is zero
fn number(value: Option<&Value>) -> f64 {
    match value {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(0.0),
        _ => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_payload_gets_full_defaults() {
        let analysis = normalize(&json!({}));

        assert!(analysis.detected_items.is_empty());
        assert_eq!(analysis.totals, EstimatedTotals::default());
        assert_eq!(analysis.recommendation, "");
        assert!(!analysis.renal_compatible);
        assert_eq!(analysis.display_name, UNIDENTIFIED_FOOD);
        assert!(!analysis.analysis_failed);
    }

    #[test]
    fn test_complete_payload() {
        let payload = json!({
            "alimentos_detectados": ["Grilled chicken", "White rice"],
            "totales": {
                "energia": 520,
                "sodio": 480,
                "potasio": 620,
                "fosforo": 310,
                "proteinas": 42
            },
            "recomendaciones": "Moderate portion, suitable once a week.",
            "compatibilidad_renal": true,
            "texto_original": "..."
        });

        let analysis = normalize(&payload);
        assert_eq!(analysis.detected_items.len(), 2);
        assert_eq!(analysis.totals.sodium, 480.0);
        assert_eq!(analysis.totals.protein, 42.0);
        assert!(analysis.renal_compatible);
        assert_eq!(analysis.display_name, "Grilled chicken, White rice");
    }

    #[test]
    fn test_numbers_as_strings_tolerated() {
        let payload = json!({
            "totales": { "energia": "350", "sodio": "900.5", "potasio": null }
        });

        let analysis = normalize(&payload);
        assert_eq!(analysis.totals.energy, 350.0);
        assert_eq!(analysis.totals.sodium, 900.5);
        assert_eq!(analysis.totals.potassium, 0.0);
    }

    #[test]
    fn test_fields_lifted_from_nested_object() {
        let payload = json!({
            "alimentos_detectados": ["Soup"],
            "texto_original": {
                "recomendaciones": "High in sodium, avoid.",
                "compatibilidad_renal": false
            }
        });

        let analysis = normalize(&payload);
        assert_eq!(analysis.recommendation, "High in sodium, avoid.");
        assert!(!analysis.renal_compatible);
    }

    #[test]
    fn test_fields_lifted_from_fenced_text() {
        let inner = "```json\n{\"recomendaciones\": \"Low sodium, fine daily.\", \"compatibilidad_renal\": true}\n```";
        let payload = json!({
            "alimentos_detectados": ["Salad"],
            "texto_original": inner
        });

        let analysis = normalize(&payload);
        assert_eq!(analysis.recommendation, "Low sodium, fine daily.");
        assert!(analysis.renal_compatible);
    }

    #[test]
    fn test_detected_items_lifted_from_text() {
        let inner = "```json\n{\"alimentos_detectados\": [\"Bread\", \"Cheese\"]}\n```";
        let payload = json!({ "texto_original": inner });

        let analysis = normalize(&payload);
        assert_eq!(analysis.detected_items, vec!["Bread", "Cheese"]);
    }

    #[test]
    fn test_display_name_truncation() {
        let items: Vec<String> = ["a", "b", "c"].iter().map(|s| s.to_string()).collect();
        assert_eq!(display_name(&items), "a, b, c");

        let items: Vec<String> = ["a", "b", "c", "d", "e"].iter().map(|s| s.to_string()).collect();
        assert_eq!(display_name(&items), "a, b, c +2 more");

        assert_eq!(display_name(&[]), UNIDENTIFIED_FOOD);
    }

    #[test]
    fn test_failure_fallback() {
        let analysis = normalize_failure("request timed out after 60s");

        assert!(analysis.analysis_failed);
        assert!(!analysis.renal_compatible);
        assert_eq!(analysis.totals, EstimatedTotals::default());
        assert_eq!(analysis.display_name, UNIDENTIFIED_FOOD);
        assert!(analysis.recommendation.contains("could not be analyzed"));
    }
}
