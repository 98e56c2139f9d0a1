use std::env;

use anyhow::{Result, bail};

pub const DEFAULT_BASE_URL: &str = "https://api.groq.com/openai/v1";
pub const DEFAULT_MODEL: &str = "llama-3.3-70b-versatile";
pub const DEFAULT_ARXIV_BASE_URL: &str = "https://export.arxiv.org";

/// Capabilities declared for the configured model.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelInfo {
    pub family: String,
    pub vision: bool,
    pub function_calling: bool,
    pub json_output: bool,
}

impl Default for ModelInfo {
    fn default() -> Self {
        Self {
            family: "llama3".to_string(),
            vision: false,
            function_calling: true,
            json_output: true,
        }
    }
}

/// Settings for the chat-completion backend and the paper catalog.
///
/// `api_key` is empty until a credential is bound with [`Config::with_credential`];
/// the pipeline does that per run.
#[derive(Clone)]
pub struct Config {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub model_info: ModelInfo,
    pub temperature: f32,
    pub max_tokens: u32,
    /// Per-request HTTP timeout in seconds
    pub timeout: u64,
    pub arxiv_base_url: String,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("api_key", &if self.api_key.is_empty() { "<unset>" } else { "<redacted>" })
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("model_info", &self.model_info)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("timeout", &self.timeout)
            .field("arxiv_base_url", &self.arxiv_base_url)
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            model_info: ModelInfo::default(),
            temperature: 0.2,
            max_tokens: 2048,
            timeout: 120,
            arxiv_base_url: DEFAULT_ARXIV_BASE_URL.to_string(),
        }
    }
}

impl Config {
    /// Load settings from the environment, falling back to defaults.
    pub fn load() -> Result<Self> {
        let mut cfg = Self::default();

        if let Ok(key) = env::var("GROQ_API_KEY") {
            cfg.api_key = key.trim().to_string();
        }
        if let Ok(url) = env::var("LITREV_BASE_URL") {
            cfg.base_url = url.trim_end_matches('/').to_string();
        }
        if let Ok(model) = env::var("LITREV_MODEL") {
            cfg.model = model;
        }
        if let Ok(raw) = env::var("LITREV_TEMPERATURE") {
            cfg.temperature = raw
                .parse()
                .map_err(|e| anyhow::anyhow!("LITREV_TEMPERATURE must be a number: {e}"))?;
        }
        if let Ok(raw) = env::var("LITREV_MAX_TOKENS") {
            cfg.max_tokens = raw
                .parse()
                .map_err(|e| anyhow::anyhow!("LITREV_MAX_TOKENS must be an integer: {e}"))?;
        }
        if let Ok(raw) = env::var("LITREV_TIMEOUT_SECS") {
            cfg.timeout = raw
                .parse()
                .map_err(|e| anyhow::anyhow!("LITREV_TIMEOUT_SECS must be an integer: {e}"))?;
        }
        if let Ok(url) = env::var("ARXIV_BASE_URL") {
            cfg.arxiv_base_url = url.trim_end_matches('/').to_string();
        }

        tracing::debug!(config = ?cfg, "Loaded configuration");
        Ok(cfg)
    }

    /// Copy of this config bound to the given credential.
    pub fn with_credential(&self, credential: &str) -> Self {
        let mut cfg = self.clone();
        cfg.api_key = credential.trim().to_string();
        cfg
    }

    pub fn validate(&self) -> Result<()> {
        if self.api_key.trim().is_empty() {
            bail!("API key is required");
        }
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            bail!("base_url must start with http:// or https://, got '{}'", self.base_url);
        }
        if self.model.trim().is_empty() {
            bail!("model must not be empty");
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            bail!("temperature must be within [0.0, 2.0], got {}", self.temperature);
        }
        if self.max_tokens == 0 {
            bail!("max_tokens must be positive");
        }
        if self.timeout == 0 {
            bail!("timeout must be positive");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_groq_backend() {
        let cfg = Config::default();
        assert_eq!(cfg.model, "llama-3.3-70b-versatile");
        assert_eq!(cfg.base_url, "https://api.groq.com/openai/v1");
        assert_eq!(cfg.max_tokens, 2048);
        assert!((cfg.temperature - 0.2).abs() < f32::EPSILON);
        assert!(cfg.model_info.function_calling);
        assert!(cfg.model_info.json_output);
        assert!(!cfg.model_info.vision);
    }

    #[test]
    fn validate_requires_credential() {
        let cfg = Config::default();
        assert!(cfg.validate().is_err());
        assert!(cfg.with_credential("  key ").validate().is_ok());
        assert_eq!(cfg.with_credential("  key ").api_key, "key");
    }

    #[test]
    fn validate_rejects_out_of_range_values() {
        let mut cfg = Config::default().with_credential("k");
        cfg.temperature = 3.0;
        assert!(cfg.validate().is_err());

        let mut cfg = Config::default().with_credential("k");
        cfg.base_url = "ftp://example".to_string();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn debug_redacts_api_key() {
        let cfg = Config::default().with_credential("secret-value");
        let printed = format!("{cfg:?}");
        assert!(!printed.contains("secret-value"));
        assert!(printed.contains("<redacted>"));
    }
}
