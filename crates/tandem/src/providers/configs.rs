use std::env;

use crate::errors::ProviderError;

pub const DEFAULT_HOST: &str = "https://api.openai.com";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Configuration for an OpenAI-compatible chat-completion endpoint.
///
/// Read once at startup; nothing mutates it afterwards.
#[derive(Debug, Clone)]
pub struct OpenAiProviderConfig {
    pub host: String,
    pub api_key: String,
    pub model: String,
    pub temperature: Option<f32>,
    pub max_tokens: Option<i32>,
}

impl OpenAiProviderConfig {
    pub fn new(host: String, api_key: String, model: String) -> Self {
        Self {
            host,
            api_key,
            model,
            temperature: None,
            max_tokens: None,
        }
    }

    /// Build the config from the environment.
    ///
    /// `OPENAI_API_KEY` is required; a missing credential aborts startup
    /// rather than failing later mid-run. `OPENAI_HOST` and `OPENAI_MODEL`
    /// fall back to defaults. A local `.env` file is honored.
    pub fn from_env() -> Result<Self, ProviderError> {
        dotenv::dotenv().ok();

        let api_key = env::var("OPENAI_API_KEY")
            .map_err(|_| ProviderError::MissingCredential("OPENAI_API_KEY".to_string()))?;
        let host = env::var("OPENAI_HOST").unwrap_or_else(|_| DEFAULT_HOST.to_string());
        let model = env::var("OPENAI_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());

        Ok(Self::new(host, api_key, model))
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: i32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}
