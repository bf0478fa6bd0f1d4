//! Vision model configuration
//!
//! An explicit configuration object constructed once at startup and passed
//! into the client; nothing reads the environment after this point.

use std::time::Duration;

/// Configuration for the external vision-model call
#[derive(Debug, Clone)]
pub struct VisionConfig {
    /// API key; None disables analysis (tools return the fallback payload)
    pub api_key: Option<String>,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f64,
    /// Per-request timeout; the call gets no retries
    pub timeout: Duration,
}

impl Default for VisionConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: "gpt-4o".to_string(),
            max_tokens: 4000,
            temperature: 0.2,
            timeout: Duration::from_secs(60),
        }
    }
}

impl VisionConfig {
    /// Build configuration from environment variables, with defaults
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let api_key = std::env::var("RDM_OPENAI_API_KEY")
            .or_else(|_| std::env::var("OPENAI_API_KEY"))
            .ok()
            .filter(|k| !k.trim().is_empty());

        let model = std::env::var("RDM_VISION_MODEL").unwrap_or(defaults.model);

        let max_tokens = std::env::var("RDM_VISION_MAX_TOKENS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.max_tokens);

        let temperature = std::env::var("RDM_VISION_TEMPERATURE")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.temperature);

        let timeout = std::env::var("RDM_VISION_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(defaults.timeout);

        Self {
            api_key,
            model,
            max_tokens,
            temperature,
            timeout,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = VisionConfig::default();
        assert_eq!(config.model, "gpt-4o");
        assert_eq!(config.max_tokens, 4000);
        assert_eq!(config.timeout, Duration::from_secs(60));
        assert!(config.api_key.is_none());
    }
}
