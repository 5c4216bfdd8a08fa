//! Language model clients

use crate::config::LlmConfig;
use crate::error::{AppError, Result};
use crate::metrics::{LLM_REQUESTS_TOTAL, LLM_REQUEST_DURATION_SECONDS};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error};

/// Text completion backend used by the concierge
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Label used in logs, metrics and errors
    fn provider(&self) -> &str;

    /// Complete `prompt`, returning the generated text
    async fn complete(&self, prompt: &str) -> Result<String>;
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Client for an OpenAI-compatible chat completions endpoint
pub struct HttpLanguageModel {
    client: Client,
    provider: String,
    endpoint: String,
    model: String,
    api_key: String,
    max_tokens: u32,
    temperature: f32,
}

impl HttpLanguageModel {
    pub fn new(config: &LlmConfig, api_key: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AppError::Configuration(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            provider: config.provider.clone(),
            endpoint: config.endpoint.clone(),
            model: config.model.clone(),
            api_key: api_key.into(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
        })
    }

    fn failure(&self, message: impl Into<String>) -> AppError {
        AppError::LanguageModel {
            provider: self.provider.clone(),
            message: message.into(),
        }
    }

    async fn request(&self, prompt: &str) -> Result<String> {
        let payload = ChatCompletionRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AppError::Timeout(format!("{} request timed out", self.provider))
                } else {
                    self.failure(format!("Request failed: {}", e))
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(self.failure(format!("API returned status {}: {}", status, body)));
        }

        let completion: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| self.failure(format!("Invalid response body: {}", e)))?;

        completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| self.failure("Unexpected response structure"))
    }
}

#[async_trait]
impl LanguageModel for HttpLanguageModel {
    fn provider(&self) -> &str {
        &self.provider
    }

    async fn complete(&self, prompt: &str) -> Result<String> {
        let start = Instant::now();
        let result = self.request(prompt).await;

        LLM_REQUEST_DURATION_SECONDS
            .with_label_values(&[&self.provider])
            .observe(start.elapsed().as_secs_f64());

        match &result {
            Ok(text) => {
                LLM_REQUESTS_TOTAL
                    .with_label_values(&[&self.provider, "success"])
                    .inc();
                debug!(provider = %self.provider, chars = text.len(), "Completion received");
            }
            Err(e) => {
                LLM_REQUESTS_TOTAL
                    .with_label_values(&[&self.provider, "error"])
                    .inc();
                error!(provider = %self.provider, error = %e, "Completion failed");
            }
        }

        result
    }
}

/// Stand-in used when no API key is configured; every call fails
#[derive(Debug, Default, Clone)]
pub struct UnconfiguredModel;

#[async_trait]
impl LanguageModel for UnconfiguredModel {
    fn provider(&self) -> &str {
        "unconfigured"
    }

    async fn complete(&self, _prompt: &str) -> Result<String> {
        Err(AppError::LanguageModel {
            provider: "unconfigured".to_string(),
            message: "No language model API key configured".to_string(),
        })
    }
}

/// Build the model named by `config`
pub fn create_language_model(config: &LlmConfig) -> Result<Arc<dyn LanguageModel>> {
    match config.resolve_api_key() {
        Some(key) => {
            tracing::info!(provider = %config.provider, model = %config.model, "Language model configured");
            Ok(Arc::new(HttpLanguageModel::new(config, key)?))
        }
        None => {
            tracing::warn!(
                provider = %config.provider,
                "No language model API key found, chat answers will use the fallback text"
            );
            Ok(Arc::new(UnconfiguredModel))
        }
    }
}
