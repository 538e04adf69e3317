use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

use crate::ConfigSource;

pub const DEFAULT_TEXT_BASE_URL: &str = "https://openrouter.ai/api/v1/chat/completions";
pub const DEFAULT_TEXT_MODEL: &str = "anthropic/claude-3-haiku";
pub const DEFAULT_TEMPERATURE: f32 = 0.7;
pub const DEFAULT_MAX_TOKENS: u32 = 4000;
pub const DEFAULT_TEXT_TIMEOUT_SECS: u64 = 120;
pub const DEFAULT_REFERER: &str = "https://github.com/PtsPuf/augur";
pub const DEFAULT_TITLE: &str = "augur";

pub const DEFAULT_IMAGE_MODEL_ID: &str = "4";
pub const DEFAULT_IMAGE_SIZE: u32 = 1024;
pub const DEFAULT_SUBMIT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_POLL_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_INITIAL_DELAY_MS: u64 = 2000;
pub const DEFAULT_BACKOFF_MULTIPLIER: f64 = 1.5;
pub const DEFAULT_MAX_DELAY_MS: u64 = 30_000;
pub const DEFAULT_MAX_ATTEMPTS: u32 = 10;

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8080;

/// Configuration for augur.
///
/// Resolved with precedence CLI > environment > config file > defaults; each
/// value's origin is kept in `source_attribution` under its dotted key
/// (`text.model`, `server.port`, ...).
///
/// ```toml
/// [text]
/// model = "anthropic/claude-3-haiku"
/// temperature = 0.7
///
/// [image]
/// base_url = "https://api-key.fusionbrain.ai/"
/// max_attempts = 10
///
/// [server]
/// port = 8080
/// ```
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub text: TextConfig,
    pub image: ImageConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub source_attribution: HashMap<String, ConfigSource>,
}

/// Chat-completion service settings
#[derive(Debug, Clone)]
pub struct TextConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout_secs: u64,
    /// Sent as `HTTP-Referer`
    pub referer: String,
    /// Sent as `X-Title`
    pub title: String,
}

impl TextConfig {
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for TextConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_TEXT_BASE_URL.to_string(),
            model: DEFAULT_TEXT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
            timeout_secs: DEFAULT_TEXT_TIMEOUT_SECS,
            referer: DEFAULT_REFERER.to_string(),
            title: DEFAULT_TITLE.to_string(),
        }
    }
}

/// Image service settings, including the polling schedule
#[derive(Debug, Clone)]
pub struct ImageConfig {
    pub api_key: Option<String>,
    pub secret: Option<String>,
    /// Service root; the `key/api/v1/text2image/...` paths are appended
    pub base_url: Option<String>,
    pub model_id: String,
    pub width: u32,
    pub height: u32,
    pub submit_timeout_secs: u64,
    pub poll_timeout_secs: u64,
    pub initial_delay_ms: u64,
    pub backoff_multiplier: f64,
    pub max_delay_ms: u64,
    pub max_attempts: u32,
}

impl ImageConfig {
    #[must_use]
    pub fn submit_timeout(&self) -> Duration {
        Duration::from_secs(self.submit_timeout_secs)
    }

    #[must_use]
    pub fn poll_timeout(&self) -> Duration {
        Duration::from_secs(self.poll_timeout_secs)
    }
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            secret: None,
            base_url: None,
            model_id: DEFAULT_IMAGE_MODEL_ID.to_string(),
            width: DEFAULT_IMAGE_SIZE,
            height: DEFAULT_IMAGE_SIZE,
            submit_timeout_secs: DEFAULT_SUBMIT_TIMEOUT_SECS,
            poll_timeout_secs: DEFAULT_POLL_TIMEOUT_SECS,
            initial_delay_ms: DEFAULT_INITIAL_DELAY_MS,
            backoff_multiplier: DEFAULT_BACKOFF_MULTIPLIER,
            max_delay_ms: DEFAULT_MAX_DELAY_MS,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
        }
    }
}

impl ServerConfig {
    #[must_use]
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone, Default)]
pub struct LoggingConfig {
    pub verbose: bool,
    pub json: bool,
}

/// On-disk TOML layout. Every field is optional so a file only overrides
/// what it names.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct TomlConfig {
    #[serde(default)]
    pub text: TomlText,
    #[serde(default)]
    pub image: TomlImage,
    #[serde(default)]
    pub server: TomlServer,
    #[serde(default)]
    pub logging: TomlLogging,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct TomlText {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub model: Option<String>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub timeout_secs: Option<u64>,
    pub referer: Option<String>,
    pub title: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct TomlImage {
    pub api_key: Option<String>,
    pub secret: Option<String>,
    pub base_url: Option<String>,
    pub model_id: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub submit_timeout_secs: Option<u64>,
    pub poll_timeout_secs: Option<u64>,
    pub initial_delay_ms: Option<u64>,
    pub backoff_multiplier: Option<f64>,
    pub max_delay_ms: Option<u64>,
    pub max_attempts: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct TomlServer {
    pub host: Option<String>,
    pub port: Option<u16>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct TomlLogging {
    pub verbose: Option<bool>,
    pub json: Option<bool>,
}
