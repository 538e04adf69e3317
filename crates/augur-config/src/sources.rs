use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use augur_utils::redaction::mask_secret;

use crate::Config;

/// Where a configuration value came from, highest precedence first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    Cli,
    Env(String),
    ConfigFile(PathBuf),
    Programmatic,
    Default,
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cli => write!(f, "cli"),
            Self::Env(var) => write!(f, "env ({var})"),
            Self::ConfigFile(path) => write!(f, "config ({})", path.display()),
            Self::Programmatic => write!(f, "programmatic"),
            Self::Default => write!(f, "default"),
        }
    }
}

impl Config {
    /// Effective configuration as key -> (value, source), secrets masked
    #[must_use]
    pub fn effective_config(&self) -> BTreeMap<String, (String, String)> {
        let mut config = BTreeMap::new();

        let mut add = |key: &str, value: Option<String>| {
            let source = self
                .source_attribution
                .get(key)
                .map_or_else(|| ConfigSource::Default.to_string(), ToString::to_string);
            let value = value.unwrap_or_else(|| "(unset)".to_string());
            config.insert(key.to_string(), (value, source));
        };

        add("text.api_key", self.text.api_key.as_deref().map(mask_secret));
        add("text.base_url", Some(self.text.base_url.clone()));
        add("text.model", Some(self.text.model.clone()));
        add("text.temperature", Some(self.text.temperature.to_string()));
        add("text.max_tokens", Some(self.text.max_tokens.to_string()));
        add("text.timeout_secs", Some(self.text.timeout_secs.to_string()));

        add("image.api_key", self.image.api_key.as_deref().map(mask_secret));
        add("image.secret", self.image.secret.as_deref().map(mask_secret));
        add("image.base_url", self.image.base_url.clone());
        add("image.model_id", Some(self.image.model_id.clone()));
        add("image.width", Some(self.image.width.to_string()));
        add("image.height", Some(self.image.height.to_string()));
        add("image.submit_timeout_secs", Some(self.image.submit_timeout_secs.to_string()));
        add("image.poll_timeout_secs", Some(self.image.poll_timeout_secs.to_string()));
        add("image.initial_delay_ms", Some(self.image.initial_delay_ms.to_string()));
        add("image.backoff_multiplier", Some(self.image.backoff_multiplier.to_string()));
        add("image.max_delay_ms", Some(self.image.max_delay_ms.to_string()));
        add("image.max_attempts", Some(self.image.max_attempts.to_string()));

        add("server.host", Some(self.server.host.clone()));
        add("server.port", Some(self.server.port.to_string()));

        add("logging.verbose", Some(self.logging.verbose.to_string()));
        add("logging.json", Some(self.logging.json.to_string()));

        config
    }
}
