//! Vision model HTTP client
//!
//! Sends a base64 food image to the OpenAI chat-completions API and
//! extracts the structured analysis JSON from the reply. One attempt, one
//! timeout, no retries; every failure collapses into `VisionError` for the
//! normalizer's fallback path to absorb.

use reqwest::header;
use serde_json::{json, Value};
use thiserror::Error;

use super::config::VisionConfig;

const API_URL: &str = "https://api.openai.com/v1/chat/completions";

/// The analysis prompt. The upstream contract fixes the JSON field names;
/// the nutrient estimates come back keyed in Spanish.
const ANALYSIS_PROMPT: &str = r#"
Analyze this food image and identify the following:
1. Which foods are present in the image?
2. Estimate the approximate nutritional values of the main dish or food:
   calories, sodium (mg), potassium (mg), phosphorus (mg), protein (g)
3. Is this meal suitable for people with chronic kidney disease?
   Take the portion size into account, and how many days per week it could
   be eaten without problems.

Format your answer as JSON with the following fields:
{
  "alimentos_detectados": [list of foods],
  "totales": {
    "energia": calories_value,
    "sodio": sodium_value,
    "potasio": potassium_value,
    "fosforo": phosphorus_value,
    "proteinas": protein_value
  },
  "recomendaciones": "text with recommendations for renal patients",
  "compatibilidad_renal": boolean
}
"#;

/// Upstream analysis call failures
#[derive(Debug, Error)]
pub enum VisionError {
    #[error("No vision API key configured")]
    MissingApiKey,

    #[error("Vision API request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Vision API returned status {status}: {body}")]
    BadStatus { status: u16, body: String },

    #[error("Could not extract analysis JSON from response: {0}")]
    MalformedResponse(String),
}

/// The parsed upstream payload plus the raw reply text
#[derive(Debug, Clone)]
pub struct RawAnalysis {
    pub payload: Value,
    pub raw_text: String,
}

/// Client for the external food-recognition model
pub struct VisionClient {
    config: VisionConfig,
    http: reqwest::Client,
}

impl VisionClient {
    pub fn new(config: VisionConfig) -> Self {
        Self {
            config,
            http: reqwest::Client::new(),
        }
    }

    /// Analyze a base64-encoded food image
    pub async fn analyze(&self, image_base64: &str) -> Result<RawAnalysis, VisionError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or(VisionError::MissingApiKey)?;

        let body = json!({
            "model": self.config.model,
            "messages": [
                {
                    "role": "system",
                    "content": "You are a nutritionist specialized in chronic kidney disease."
                },
                {
                    "role": "user",
                    "content": [
                        { "type": "text", "text": ANALYSIS_PROMPT },
                        {
                            "type": "image_url",
                            "image_url": { "url": format!("data:image/jpeg;base64,{}", image_base64) }
                        }
                    ]
                }
            ],
            "max_tokens": self.config.max_tokens,
            "temperature": self.config.temperature
        });

        let response = self
            .http
            .post(API_URL)
            .header(header::AUTHORIZATION, format!("Bearer {}", api_key))
            .header(header::CONTENT_TYPE, "application/json")
            .timeout(self.config.timeout)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(VisionError::BadStatus {
                status: status.as_u16(),
                body,
            });
        }

        let reply: Value = response.json().await?;
        let content = reply["choices"][0]["message"]["content"]
            .as_str()
            .ok_or_else(|| {
                VisionError::MalformedResponse("missing choices[0].message.content".to_string())
            })?;

        let mut payload = extract_json(content).ok_or_else(|| {
            VisionError::MalformedResponse(format!("no JSON object in reply: {}", content))
        })?;

        // Keep the original reply text alongside the parsed fields
        if let Some(obj) = payload.as_object_mut() {
            obj.insert("texto_original".to_string(), Value::String(content.to_string()));
        }

        Ok(RawAnalysis {
            payload,
            raw_text: content.to_string(),
        })
    }
}

/// Parse the reply directly, or pull a fenced ```json block out of it
pub fn extract_json(text: &str) -> Option<Value> {
    if let Ok(value) = serde_json::from_str::<Value>(text.trim()) {
        if value.is_object() {
            return Some(value);
        }
    }

    let fenced = extract_fenced_block(text)?;
    serde_json::from_str(fenced.trim()).ok().filter(Value::is_object)
}

/// The contents of the first ```json ... ``` (or plain ```) fence
fn extract_fenced_block(text: &str) -> Option<&str> {
    let start = text.find("```")?;
    let after_fence = &text[start + 3..];

    // Skip an optional language tag on the fence line
    let content_start = after_fence.find('\n')?;
    let content = &after_fence[content_start + 1..];

    let end = content.find("```")?;
    Some(&content[..end])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_json_direct() {
        let value = extract_json(r#"{"compatibilidad_renal": true}"#).unwrap();
        assert_eq!(value["compatibilidad_renal"], true);
    }

    #[test]
    fn test_extract_json_fenced() {
        let text = "Here is the analysis:\n```json\n{\"totales\": {\"sodio\": 120}}\n```\nDone.";
        let value = extract_json(text).unwrap();
        assert_eq!(value["totales"]["sodio"], 120);
    }

    #[test]
    fn test_extract_json_fenced_without_language_tag() {
        let text = "```\n{\"alimentos_detectados\": []}\n```";
        let value = extract_json(text).unwrap();
        assert!(value["alimentos_detectados"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_extract_json_none_for_prose() {
        assert!(extract_json("I could not identify any food.").is_none());
    }

    #[test]
    fn test_extract_json_rejects_non_objects() {
        assert!(extract_json("42").is_none());
        assert!(extract_json("[1, 2, 3]").is_none());
    }
}
