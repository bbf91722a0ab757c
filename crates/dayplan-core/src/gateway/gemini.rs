//! Google Gemini `generateContent` backend.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Value, json};
use tracing::{debug, error};

use super::{GenerationError, Generator};

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

/// Longest slice of an error body carried into an error message.
const MAX_ERROR_BODY: usize = 300;

/// Connection settings for [`GeminiGenerator`].
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    /// `None` makes the generator unavailable.
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
    pub timeout: Duration,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_owned(),
            base_url: DEFAULT_BASE_URL.to_owned(),
            timeout: Duration::from_secs(120),
        }
    }
}

impl GeminiConfig {
    /// Defaults with the API key taken from `GEMINI_API_KEY`.
    pub fn from_env() -> Self {
        Self {
            api_key: std::env::var(API_KEY_ENV).ok().filter(|k| !k.trim().is_empty()),
            ..Self::default()
        }
    }
}

/// Generator backed by the Gemini REST API with schema-constrained JSON output.
pub struct GeminiGenerator {
    client: Client,
    config: GeminiConfig,
}

impl GeminiGenerator {
    pub fn new(mut config: GeminiConfig) -> Result<Self, GenerationError> {
        config.base_url = config.base_url.trim_end_matches('/').to_owned();
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| GenerationError::Unavailable(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client, config })
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.config.base_url, self.config.model
        )
    }

    fn request_body(prompt: &str, schema: &Value) -> Value {
        json!({
            "contents": [{ "role": "user", "parts": [{ "text": prompt }] }],
            "generation_config": {
                "response_mime_type": "application/json",
                "response_schema": schema,
            }
        })
    }
}

/// Concatenated text parts of the first candidate, if any.
fn candidate_text(data: &Value) -> Option<String> {
    let parts = data["candidates"].get(0)?["content"]["parts"].as_array()?;
    let text: String = parts.iter().filter_map(|p| p["text"].as_str()).collect();
    if text.trim().is_empty() { None } else { Some(text) }
}

fn truncate_body(body: &str) -> String {
    if body.len() <= MAX_ERROR_BODY {
        return body.to_owned();
    }
    let mut end = MAX_ERROR_BODY;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &body[..end])
}

#[async_trait]
impl Generator for GeminiGenerator {
    fn name(&self) -> &str {
        "gemini"
    }

    fn ensure_available(&self) -> Result<(), GenerationError> {
        match self.config.api_key.as_deref() {
            Some(key) if !key.trim().is_empty() => Ok(()),
            _ => Err(GenerationError::Unavailable(format!(
                "no Gemini API key configured (set {API_KEY_ENV})"
            ))),
        }
    }

    async fn generate(&self, prompt: &str, schema: &Value) -> Result<String, GenerationError> {
        self.ensure_available()?;
        let api_key = self.config.api_key.as_deref().unwrap_or_default();

        debug!(model = %self.config.model, prompt_len = prompt.len(), "calling Gemini");
        let resp = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", api_key)
            .json(&Self::request_body(prompt, schema))
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "Gemini request failed");
                GenerationError::Unavailable(format!("request to Gemini failed: {e}"))
            })?;

        let status = resp.status();
        let body = resp.text().await.map_err(|e| {
            GenerationError::Unavailable(format!("failed to read Gemini response: {e}"))
        })?;

        if !status.is_success() {
            error!(status = %status, "Gemini API error");
            return Err(GenerationError::Unavailable(format!(
                "Gemini returned {status}: {}",
                truncate_body(&body)
            )));
        }

        let data: Value = serde_json::from_str(&body).map_err(|e| GenerationError::Validation {
            raw: body.clone(),
            reason: format!("Gemini response is not JSON: {e}"),
        })?;

        candidate_text(&data).ok_or_else(|| GenerationError::Validation {
            raw: body,
            reason: "Gemini response carried no candidate text".to_owned(),
        })
    }
}
