//! Credentials and model selection from the environment

use crewcraft_error::Result;
use crewcraft_llm::error::missing_credential;
use crewcraft_llm::provider::{DEFAULT_MODEL, OPENAI_BASE_URL};
use crewcraft_llm::ProviderConfig;

pub const ENV_OPENAI_API_KEY: &str = "OPENAI_API_KEY";
pub const ENV_OPENAI_MODEL_NAME: &str = "OPENAI_MODEL_NAME";
pub const ENV_OPENAI_API_BASE: &str = "OPENAI_API_BASE";
pub const ENV_SERPER_API_KEY: &str = "SERPER_API_KEY";

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub openai_api_key: Option<String>,
    pub model: String,
    pub base_url: String,
    pub serper_api_key: Option<String>,
}

impl Settings {
    /// Read the process environment, after loading `.env` if there is one
    pub fn from_env() -> Self {
        if let Ok(path) = dotenv::dotenv() {
            tracing::debug!(path = %path.display(), "loaded .env");
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        Self {
            openai_api_key: non_empty(ENV_OPENAI_API_KEY),
            model: non_empty(ENV_OPENAI_MODEL_NAME).unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            base_url: non_empty(ENV_OPENAI_API_BASE).unwrap_or_else(|| OPENAI_BASE_URL.to_string()),
            serper_api_key: non_empty(ENV_SERPER_API_KEY),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Provider settings; the OpenAI key is required unless a custom endpoint is used
    pub fn provider_config(&self) -> Result<ProviderConfig> {
        let custom_endpoint = self.base_url.trim_end_matches('/') != OPENAI_BASE_URL;
        match &self.openai_api_key {
            Some(key) => Ok(ProviderConfig::openai(key)
                .with_base_url(&self.base_url)
                .with_model(&self.model)),
            None if custom_endpoint => Ok(ProviderConfig::local(&self.base_url, &self.model)),
            None => Err(missing_credential(ENV_OPENAI_API_KEY).with_operation("config::provider")),
        }
    }
}
