use crate::prelude::*;
use rcoach_core::gemini::{
    response_text, GenerateContentRequest, GenerateContentResponse, DEFAULT_API_BASE,
    DEFAULT_MODEL,
};
use std::time::Duration;

/// Gemini connection options shared by the commands that call the API.
#[derive(Debug, Clone, clap::Args)]
pub struct GeminiOptions {
    /// Gemini API key
    #[clap(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Gemini model name
    #[clap(long, env = "GEMINI_MODEL", default_value = DEFAULT_MODEL)]
    pub model: String,

    /// Base URL of the Generative Language API
    #[clap(long, env = "GEMINI_API_BASE", default_value = DEFAULT_API_BASE)]
    pub api_base: String,

    /// Abort upstream calls after this many seconds (no limit when unset)
    #[clap(long, env = "RCOACH_TIMEOUT_SECS")]
    pub timeout_secs: Option<u64>,
}

/// Gemini configuration, resolved once at startup.
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: String,
    pub model: String,
    pub api_base: String,
    pub timeout: Option<Duration>,
}

impl GeminiConfig {
    /// Resolve options into a configuration. A missing or blank API key is an error.
    pub fn from_options(options: GeminiOptions) -> Result<Self> {
        let api_key = options
            .api_key
            .filter(|key| !key.trim().is_empty())
            .ok_or_eyre("GEMINI_API_KEY is missing. Set it in the environment or in a .env file.")?;

        Ok(Self {
            api_key,
            model: options.model,
            api_base: options.api_base.trim_end_matches('/').to_string(),
            timeout: options.timeout_secs.map(Duration::from_secs),
        })
    }

    /// `generateContent` URL for the configured model, without the key.
    pub fn endpoint(&self) -> String {
        f!("{}/models/{}:generateContent", self.api_base, self.model)
    }
}

/// HTTP client for the Gemini `generateContent` endpoint.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    config: GeminiConfig,
    http: reqwest::Client,
}

impl GeminiClient {
    pub fn new(config: GeminiConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder
            .build()
            .map_err(|e| eyre!("Failed to build HTTP client: {}", e))?;

        Ok(Self { config, http })
    }

    pub fn config(&self) -> &GeminiConfig {
        &self.config
    }

    /// Send a prompt and return the generated text.
    ///
    /// The body is decoded whatever the HTTP status, so an `error.message`
    /// from the API ends up in the returned error.
    pub async fn generate(&self, prompt: &str) -> Result<String, Error> {
        let endpoint = self.config.endpoint();
        debug!("POST {} ({} prompt chars)", endpoint, prompt.len());

        let response = self
            .http
            .post(&endpoint)
            .query(&[("key", self.config.api_key.as_str())])
            .json(&GenerateContentRequest::from_prompt(prompt))
            .send()
            .await
            // The URL carries the API key, keep it out of error messages.
            .map_err(|e| Error::Upstream(f!("Failed to reach Gemini API: {}", e.without_url())))?;

        let status = response.status();
        let body: GenerateContentResponse = response.json().await.map_err(|e| {
            Error::Upstream(f!(
                "Failed to parse Gemini API response (HTTP {}): {}",
                status,
                e.without_url()
            ))
        })?;
        debug!("Gemini API response (HTTP {}): {:?}", status, body);

        Ok(response_text(&body)?.to_string())
    }
}
