use std::time::Duration;

use augur_utils::error::ConfigError;

use crate::{Config, ConfigSource};

impl Config {
    /// Create a builder for programmatic configuration.
    ///
    /// ```rust
    /// use augur_config::Config;
    ///
    /// let config = Config::builder()
    ///     .text_api_key("sk-or-v1-example")
    ///     .image_credentials("key", "secret")
    ///     .image_base_url("https://api-key.fusionbrain.ai/")
    ///     .port(9000)
    ///     .build()
    ///     .expect("valid config");
    /// assert_eq!(config.server.port, 9000);
    /// ```
    #[must_use]
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::new()
    }
}

/// Builder for programmatic configuration.
///
/// Values set here are attributed to `ConfigSource::Programmatic`. Nothing is
/// read from the environment or the filesystem.
#[derive(Debug, Clone, Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn mark(&mut self, key: &str) {
        self.config
            .source_attribution
            .insert(key.to_string(), ConfigSource::Programmatic);
    }

    #[must_use]
    pub fn text_api_key(mut self, key: impl Into<String>) -> Self {
        self.config.text.api_key = Some(key.into());
        self.mark("text.api_key");
        self
    }

    #[must_use]
    pub fn text_base_url(mut self, url: impl Into<String>) -> Self {
        self.config.text.base_url = url.into();
        self.mark("text.base_url");
        self
    }

    #[must_use]
    pub fn text_model(mut self, model: impl Into<String>) -> Self {
        self.config.text.model = model.into();
        self.mark("text.model");
        self
    }

    #[must_use]
    pub fn text_timeout(mut self, timeout: Duration) -> Self {
        self.config.text.timeout_secs = timeout.as_secs();
        self.mark("text.timeout_secs");
        self
    }

    #[must_use]
    pub fn image_credentials(mut self, key: impl Into<String>, secret: impl Into<String>) -> Self {
        self.config.image.api_key = Some(key.into());
        self.config.image.secret = Some(secret.into());
        self.mark("image.api_key");
        self.mark("image.secret");
        self
    }

    #[must_use]
    pub fn image_base_url(mut self, url: impl Into<String>) -> Self {
        self.config.image.base_url = Some(url.into());
        self.mark("image.base_url");
        self
    }

    /// Set the polling schedule: first delay, growth factor, per-delay cap
    /// and attempt limit.
    #[must_use]
    pub fn poll_schedule(mut self, initial: Duration, multiplier: f64, max_delay: Duration, max_attempts: u32) -> Self {
        let image = &mut self.config.image;
        image.initial_delay_ms = u64::try_from(initial.as_millis()).unwrap_or(u64::MAX);
        image.backoff_multiplier = multiplier;
        image.max_delay_ms = u64::try_from(max_delay.as_millis()).unwrap_or(u64::MAX);
        image.max_attempts = max_attempts;
        for key in [
            "image.initial_delay_ms",
            "image.backoff_multiplier",
            "image.max_delay_ms",
            "image.max_attempts",
        ] {
            self.mark(key);
        }
        self
    }

    #[must_use]
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.config.server.host = host.into();
        self.mark("server.host");
        self
    }

    #[must_use]
    pub fn port(mut self, port: u16) -> Self {
        self.config.server.port = port;
        self.mark("server.port");
        self
    }

    #[must_use]
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.config.logging.verbose = verbose;
        self.mark("logging.verbose");
        self
    }

    /// Build and validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns the same errors as [`Config::validate`].
    pub fn build(self) -> Result<Config, ConfigError> {
        self.config.validate()?;
        Ok(self.config)
    }
}
