//! Generation backend configuration.

use std::time::Duration;

/// Environment variable overriding the endpoint base URL.
pub const ENV_BASE_URL: &str = "VARENA_LLM_BASE_URL";
/// Environment variable carrying the API key.
pub const ENV_API_KEY: &str = "VARENA_LLM_API_KEY";
/// Environment variable overriding the model rotation, comma separated.
pub const ENV_MODELS: &str = "VARENA_LLM_MODELS";

const DEFAULT_BASE_URL: &str = "https://api-inference.modelscope.cn/v1";

/// Default rotation, probed in order at startup. First healthy wins.
const DEFAULT_MODELS: [&str; 4] = [
    "ZhipuAI/GLM-4.7-Flash",
    "Qwen/Qwen3-8B",
    "Qwen/Qwen3-32B",
    "Qwen/Qwen2.5-7B-Instruct",
];

/// Settings for the HTTP generation adapter.
#[derive(Debug, Clone)]
pub struct GenerationConfig {
    /// OpenAI-compatible endpoint base (no trailing slash).
    pub base_url: String,
    /// Bearer token, if the endpoint needs one.
    pub api_key: Option<String>,
    /// Candidate models, tried in order.
    pub models: Vec<String>,
    /// Per-model budget for the startup health probe.
    pub probe_timeout: Duration,
    /// Budget for a single generation request.
    pub request_timeout: Duration,
    /// Retries against the active model before rotating.
    pub max_attempts: u32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
            models: DEFAULT_MODELS.iter().map(ToString::to_string).collect(),
            probe_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(60),
            max_attempts: 3,
        }
    }
}

impl GenerationConfig {
    /// Build from the environment, defaulting anything unset.
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(url) = std::env::var(ENV_BASE_URL) {
            config.base_url = url.trim_end_matches('/').to_string();
        }
        if let Ok(key) = std::env::var(ENV_API_KEY) {
            if !key.trim().is_empty() {
                config.api_key = Some(key);
            }
        }
        if let Ok(models) = std::env::var(ENV_MODELS) {
            let parsed = parse_model_list(&models);
            if !parsed.is_empty() {
                config.models = parsed;
            }
        }
        config
    }

    /// The chat completions URL.
    #[must_use]
    pub fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

/// Split a comma-separated model list, dropping empty entries.
#[must_use]
pub fn parse_model_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .map(ToString::to_string)
        .collect()
}
