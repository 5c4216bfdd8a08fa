use crate::models::CompanyProfile;
use crate::retrieval::RetrievalConfig;
use crate::search::SearchConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server configuration
    pub server: ServerConfig,

    /// Observability configuration
    pub observability: ObservabilityConfig,

    /// Relevance weights, thresholds and cache settings
    #[serde(default)]
    pub retrieval: RetrievalConfig,

    /// Content index configuration
    #[serde(default)]
    pub search: SearchConfig,

    /// Guided tour storage
    #[serde(default)]
    pub tour: TourConfig,

    /// Language model endpoint
    pub llm: LlmConfig,

    /// Conversation handling
    #[serde(default)]
    pub chat: ChatConfig,

    /// Company the concierge represents
    pub company: CompanyProfile,
}

impl Config {
    /// Load configuration from file and environment
    pub fn load() -> Result<Self, config::ConfigError> {
        let config_path =
            std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config/default.toml".to_string());

        config::Config::builder()
            // Start with default values
            .add_source(config::File::from_str(
                include_str!("../config/default.toml"),
                config::FileFormat::Toml,
            ))
            // Override with config file if it exists
            .add_source(config::File::with_name(&config_path).required(false))
            // Override with environment variables (prefix: CONCIERGE_)
            .add_source(
                config::Environment::with_prefix("CONCIERGE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }

    /// Effective configuration as TOML, with the API key masked
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        let mut redacted = self.clone();
        if redacted.llm.api_key.is_some() {
            redacted.llm.api_key = Some("********".to_string());
        }
        toml::to_string_pretty(&redacted)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// HTTP server host
    #[serde(default = "default_host")]
    pub host: String,

    /// HTTP server port
    #[serde(default = "default_http_port")]
    pub http_port: u16,

    /// Request timeout (seconds)
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Allowed CORS origins; empty allows any origin
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Enable JSON logging
    #[serde(default)]
    pub json_logs: bool,

    /// Service name
    #[serde(default = "default_service_name")]
    pub service_name: String,

    /// Enable Prometheus metrics
    #[serde(default = "default_true")]
    pub prometheus_enabled: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TourConfig {
    /// Storage backend type
    #[serde(default)]
    pub backend: StorageBackend,

    /// Path for the embedded database (sled)
    pub path: Option<PathBuf>,

    /// JSON file of steps and quizzes loaded at startup
    pub seed_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackend {
    #[default]
    Memory,
    Sled,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Provider label used in logs and metrics
    #[serde(default = "default_llm_provider")]
    pub provider: String,

    /// OpenAI-compatible chat completions URL
    #[serde(default = "default_llm_endpoint")]
    pub endpoint: String,

    /// Model name
    #[serde(default = "default_llm_model")]
    pub model: String,

    /// API key; takes precedence over `api_key_env`
    pub api_key: Option<String>,

    /// Environment variable holding the API key
    pub api_key_env: Option<String>,

    /// Request timeout (seconds)
    #[serde(default = "default_llm_timeout")]
    pub timeout_secs: u64,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

impl LlmConfig {
    /// Configured API key, read from the environment when needed
    pub fn resolve_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .or_else(|| {
                self.api_key_env
                    .as_ref()
                    .and_then(|name| std::env::var(name).ok())
            })
            .filter(|key| !key.trim().is_empty())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    /// Turns of conversation kept per visitor
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,

    /// Idle time (seconds) after which a visitor session is dropped
    #[serde(default = "default_session_ttl")]
    pub session_ttl_secs: u64,

    /// Maximum visitor sessions held in memory
    #[serde(default = "default_max_sessions")]
    pub max_sessions: u64,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            history_limit: default_history_limit(),
            session_ttl_secs: default_session_ttl(),
            max_sessions: default_max_sessions(),
        }
    }
}

// Default value functions
fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_http_port() -> u16 {
    8080
}

fn default_request_timeout() -> u64 {
    30
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_service_name() -> String {
    "tour-concierge".to_string()
}

fn default_true() -> bool {
    true
}

fn default_llm_provider() -> String {
    "groq".to_string()
}

fn default_llm_endpoint() -> String {
    "https://api.groq.com/openai/v1/chat/completions".to_string()
}

fn default_llm_model() -> String {
    "llama3-8b-8192".to_string()
}

fn default_llm_timeout() -> u64 {
    30
}

fn default_max_tokens() -> u32 {
    1024
}

fn default_temperature() -> f32 {
    0.7
}

fn default_history_limit() -> usize {
    10
}

fn default_session_ttl() -> u64 {
    3600
}

fn default_max_sessions() -> u64 {
    10_000
}
