use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Main configuration structure for storysync
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Config {
    /// Directory holding the outline, index, narrative and embedding files
    #[serde(default = "default_data_dir")]
    pub data_dir: String,

    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Propagation and write-policy configuration
    #[serde(default)]
    pub sync: SyncConfig,

    /// Embedding store configuration
    #[serde(default)]
    pub embedding: EmbeddingConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_data_dir() -> String {
    "data".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            server: ServerConfig::default(),
            sync: SyncConfig::default(),
            embedding: EmbeddingConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ServerConfig {
    /// Host to bind to
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,

    /// Whether to enable permissive CORS
    #[serde(default = "default_true")]
    pub enable_cors: bool,

    /// Maximum accepted request body size
    #[serde(default = "default_body_limit_bytes")]
    pub body_limit_bytes: usize,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

const fn default_port() -> u16 {
    3456
}

const fn default_true() -> bool {
    true
}

const fn default_body_limit_bytes() -> usize {
    10 * 1024 * 1024
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            enable_cors: default_true(),
            body_limit_bytes: default_body_limit_bytes(),
        }
    }
}

/// Propagation timing and API write policy
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct SyncConfig {
    /// Quiet period after the last file event before a pass runs
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// Delay between the end of a pass and releasing the re-entrancy lock
    #[serde(default = "default_lock_release_ms")]
    pub lock_release_ms: u64,

    /// Clock jitter absorbed by the API conflict check
    #[serde(default = "default_conflict_tolerance_ms")]
    pub conflict_tolerance_ms: i64,

    /// Maximum number of cards accepted in one API write
    #[serde(default = "default_card_limit")]
    pub card_limit: usize,
}

const fn default_debounce_ms() -> u64 {
    80
}

const fn default_lock_release_ms() -> u64 {
    150
}

const fn default_conflict_tolerance_ms() -> i64 {
    5
}

const fn default_card_limit() -> usize {
    100
}

impl SyncConfig {
    pub const fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub const fn lock_release(&self) -> Duration {
        Duration::from_millis(self.lock_release_ms)
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
            lock_release_ms: default_lock_release_ms(),
            conflict_tolerance_ms: default_conflict_tolerance_ms(),
            card_limit: default_card_limit(),
        }
    }
}

/// Embedding store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct EmbeddingConfig {
    /// Provider used to vectorise text: null or openai
    #[serde(default = "default_embedding_provider")]
    pub provider: String,

    /// Embedding model (openai provider only)
    #[serde(default = "default_embedding_model")]
    pub model: String,

    /// Base URL of an OpenAI-compatible embeddings API
    #[serde(default = "default_embedding_base_url")]
    pub base_url: String,

    /// API key (can also be set via OPENAI_API_KEY env var)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Request timeout in seconds
    #[serde(default = "default_embedding_timeout")]
    pub timeout_secs: u64,
}

fn default_embedding_provider() -> String {
    "null".to_string()
}

fn default_embedding_model() -> String {
    "text-embedding-3-small".to_string()
}

fn default_embedding_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

const fn default_embedding_timeout() -> u64 {
    30
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: default_embedding_provider(),
            model: default_embedding_model(),
            base_url: default_embedding_base_url(),
            api_key: None,
            timeout_secs: default_embedding_timeout(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: json or pretty
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Directory for a daily-rolling JSON log file (stdout only if unset)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_dir: Option<String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            log_dir: None,
        }
    }
}
