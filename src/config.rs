//! Configuration System
//!
//! Handles loading configuration from files and environment variables.
//! Supports TOML config files and environment variable overrides.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::backend::OpenAiConfig;
use crate::govern::{PricingConfig, RatePolicy};
use crate::monitor::{HealthThresholds, DEFAULT_COOLDOWN_SECS};
use crate::pipeline::PipelineConfig;

/// Main configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub backend: OpenAiConfig,

    #[serde(default)]
    pub pipeline: PipelineConfig,

    #[serde(default)]
    pub limits: LimitsConfig,

    #[serde(default)]
    pub monitor: MonitorConfig,

    #[serde(default)]
    pub pricing: PricingConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Per-endpoint rate-limit policies
#[derive(Debug, Clone, Deserialize)]
pub struct LimitsConfig {
    #[serde(default = "default_translate_policy")]
    pub translate: RatePolicy,

    #[serde(default = "default_ocr_policy")]
    pub ocr: RatePolicy,

    #[serde(default = "default_health_policy")]
    pub health: RatePolicy,

    #[serde(default = "default_cost_policy")]
    pub cost: RatePolicy,

    #[serde(default = "default_glossary_policy")]
    pub glossary: RatePolicy,

    #[serde(default = "default_alerts_policy")]
    pub alerts: RatePolicy,
}

fn default_translate_policy() -> RatePolicy {
    RatePolicy::new(50, 3600)
}

fn default_ocr_policy() -> RatePolicy {
    RatePolicy::new(20, 3600)
}

fn default_health_policy() -> RatePolicy {
    RatePolicy::new(30, 3600)
}

fn default_cost_policy() -> RatePolicy {
    RatePolicy::new(100, 3600)
}

fn default_glossary_policy() -> RatePolicy {
    RatePolicy::new(10, 3600)
}

fn default_alerts_policy() -> RatePolicy {
    RatePolicy::new(50, 3600)
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            translate: default_translate_policy(),
            ocr: default_ocr_policy(),
            health: default_health_policy(),
            cost: default_cost_policy(),
            glossary: default_glossary_policy(),
            alerts: default_alerts_policy(),
        }
    }
}

impl LimitsConfig {
    /// Policy for a named endpoint; unnamed endpoints get the general budget
    pub fn policy_for(&self, endpoint: &str) -> RatePolicy {
        match endpoint {
            "translate" => self.translate,
            "ocr" => self.ocr,
            "health" => self.health,
            "cost" | "usage" => self.cost,
            "glossary" => self.glossary,
            "alerts" => self.alerts,
            _ => RatePolicy::default(),
        }
    }
}

/// Health monitor configuration
#[derive(Debug, Clone, Deserialize)]
pub struct MonitorConfig {
    #[serde(default)]
    pub thresholds: HealthThresholds,

    #[serde(default = "default_cooldown_secs")]
    pub alert_cooldown_secs: u64,
}

fn default_cooldown_secs() -> u64 {
    DEFAULT_COOLDOWN_SECS
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            thresholds: HealthThresholds::default(),
            alert_cooldown_secs: default_cooldown_secs(),
        }
    }
}

/// Data directory and glossary location
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: String,

    /// Glossary CSV used to (re)build the corpus
    pub glossary_path: Option<String>,
}

fn default_data_dir() -> String {
    dirs::data_local_dir()
        .map(|p| p.join("lexibridge").to_string_lossy().to_string())
        .unwrap_or_else(|| "./lexibridge_data".to_string())
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            glossary_path: None,
        }
    }
}

/// API server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8090
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl ApiConfig {
    /// Get the socket address string
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,
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
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        Ok(config)
    }

    /// Load configuration from environment variables only
    pub fn from_env() -> Self {
        let mut config = Config::default();
        config.apply_env_overrides();
        config
    }

    /// Load configuration with environment variable overrides
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load from default locations or environment
    pub fn load_default() -> Self {
        let config_paths = [
            dirs::config_dir().map(|p| p.join("lexibridge").join("config.toml")),
            Some(PathBuf::from("/etc/lexibridge/config.toml")),
            Some(PathBuf::from("./config.toml")),
        ];

        for path_opt in config_paths.iter().flatten() {
            if path_opt.exists() {
                match Self::load_with_env(path_opt) {
                    Ok(config) => {
                        tracing::info!("Loaded config from {:?}", path_opt);
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load config from {:?}: {}", path_opt, e);
                    }
                }
            }
        }

        tracing::info!("Using default config with environment overrides");
        Self::from_env()
    }

    /// Apply environment variable overrides to an existing config
    fn apply_env_overrides(&mut self) {
        // Backend overrides
        if let Ok(key) = std::env::var("LEXIBRIDGE_API_KEY") {
            self.backend.api_key = key;
        }
        if let Ok(url) = std::env::var("LEXIBRIDGE_BACKEND_URL") {
            self.backend.base_url = url;
        }
        if let Ok(model) = std::env::var("LEXIBRIDGE_CHAT_MODEL") {
            self.backend.chat_model = model;
        }

        // Storage overrides
        if let Ok(data_dir) = std::env::var("LEXIBRIDGE_DATA_DIR") {
            self.storage.data_dir = data_dir;
        }
        if let Ok(path) = std::env::var("LEXIBRIDGE_GLOSSARY_PATH") {
            self.storage.glossary_path = Some(path);
        }

        // API overrides
        if let Ok(host) = std::env::var("LEXIBRIDGE_API_HOST") {
            self.api.host = host;
        }
        if let Ok(port) = std::env::var("LEXIBRIDGE_API_PORT") {
            if let Ok(p) = port.parse() {
                self.api.port = p;
            }
        }

        // Logging overrides
        if let Ok(level) = std::env::var("LEXIBRIDGE_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(format) = std::env::var("LEXIBRIDGE_LOG_FORMAT") {
            self.logging.format = format;
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend: OpenAiConfig::default(),
            pipeline: PipelineConfig::default(),
            limits: LimitsConfig::default(),
            monitor: MonitorConfig::default(),
            pricing: PricingConfig::default(),
            storage: StorageConfig::default(),
            api: ApiConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("Failed to parse config file {path:?}: {error}")]
    Parse { path: PathBuf, error: String },
}

/// Generate a default config file content
pub fn generate_default_config() -> String {
    r#"# LexiBridge Configuration
#
# Environment variables override these settings:
# - LEXIBRIDGE_API_KEY
# - LEXIBRIDGE_BACKEND_URL
# - LEXIBRIDGE_CHAT_MODEL
# - LEXIBRIDGE_DATA_DIR
# - LEXIBRIDGE_GLOSSARY_PATH
# - LEXIBRIDGE_API_HOST
# - LEXIBRIDGE_API_PORT
# - LEXIBRIDGE_LOG_LEVEL
# - LEXIBRIDGE_LOG_FORMAT

[backend]
# Base URL for the OpenAI-compatible API
base_url = "https://api.openai.com"

# API key (prefer LEXIBRIDGE_API_KEY)
api_key = ""

# Embedding model and its vector dimension
embedding_model = "text-embedding-3-small"
dimension = 1536

# Chat model (must accept image input for OCR)
chat_model = "gpt-4o-mini"

# Request timeout in milliseconds
request_timeout_ms = 30000

# Maximum retry attempts for transient failures
max_retries = 3

[pipeline]
# Glossary entries retrieved per query
top_k = 3

# Maximum accepted query length in characters
max_input_chars = 10000

# Sampling temperature for generation
temperature = 0.3

# Output token budget per generation call
max_output_tokens = 500

[pipeline.image]
# Maximum accepted upload size in bytes (10 MB)
max_bytes = 10485760

# Longest edge after resizing, in pixels
max_dimension = 2048

# JPEG re-encode quality
jpeg_quality = 95

[limits.translate]
limit = 50
window_secs = 3600

[limits.ocr]
limit = 20
window_secs = 3600

[limits.health]
limit = 30
window_secs = 3600

[limits.cost]
limit = 100
window_secs = 3600

[limits.glossary]
limit = 10
window_secs = 3600

[limits.alerts]
limit = 50
window_secs = 3600

[monitor]
# Seconds between repeated alerts of the same type
alert_cooldown_secs = 300

[monitor.thresholds]
memory_percent = 85.0
disk_percent = 90.0
cpu_percent = 90.0
error_rate = 0.1
latency_secs = 5.0

[pricing]
# Dollars per million tokens
embedding_per_mtok = 0.020
completion_per_mtok = 0.150

[storage]
# Directory for the persisted corpus, usage log, and alert log
data_dir = "~/.local/share/lexibridge"

# Glossary CSV used to build the corpus
# glossary_path = "./glossary.csv"

[api]
host = "0.0.0.0"
port = 8090

[logging]
# Log level: trace, debug, info, warn, error
level = "info"

# Log format: pretty (for development) or json (for production)
format = "pretty"
"#
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.limits.translate.limit, 50);
        assert_eq!(config.limits.ocr.limit, 20);
        assert_eq!(config.pipeline.top_k, 3);
        assert_eq!(config.api.port, 8090);
    }

    #[test]
    fn test_policy_for_unknown_endpoint() {
        let limits = LimitsConfig::default();
        let policy = limits.policy_for("something-else");
        assert_eq!(policy, RatePolicy::default());
    }

    #[test]
    fn test_generated_default_parses() {
        let content = generate_default_config();
        let config: Config = toml::from_str(&content).unwrap();
        assert_eq!(config.limits.glossary.limit, 10);
        assert_eq!(config.monitor.alert_cooldown_secs, 300);
        assert_eq!(config.pipeline.image.max_dimension, 2048);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "[api]\nport = 9000").unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.api.port, 9000);
        assert_eq!(config.limits.translate.limit, 50);
    }
}
