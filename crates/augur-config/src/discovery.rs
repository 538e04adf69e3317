use std::collections::HashMap;
use std::path::{Path, PathBuf};

use augur_utils::error::ConfigError;
use tracing::debug;

use crate::model::TomlConfig;
use crate::{CliArgs, Config, ConfigSource};

/// Name of the config file picked up from the working directory
pub const CONFIG_FILE_NAME: &str = "augur.toml";

/// Environment variable names read during discovery
pub mod env_keys {
    pub const CONFIG_PATH: &str = "AUGUR_CONFIG";
    pub const TEXT_API_KEY: &str = "OPENROUTER_API_KEY";
    pub const TEXT_MODEL: &str = "OPENROUTER_MODEL";
    pub const IMAGE_API_KEY: &str = "KANDINSKY_API_KEY";
    pub const IMAGE_SECRET: &str = "KANDINSKY_SECRET";
    pub const IMAGE_URL: &str = "KANDINSKY_URL";
    pub const PORT: &str = "PORT";

    pub const ALL: [&str; 7] = [CONFIG_PATH, TEXT_API_KEY, TEXT_MODEL, IMAGE_API_KEY, IMAGE_SECRET, IMAGE_URL, PORT];
}

/// The environment variables discovery cares about, captured once.
///
/// Discovery reads from a snapshot rather than the live process environment
/// so tests can supply variables without mutating global state.
#[derive(Debug, Clone, Default)]
pub struct EnvSnapshot {
    vars: HashMap<String, String>,
}

impl EnvSnapshot {
    /// Capture the process environment, loading `.env` first when the text
    /// API key is not already set.
    #[must_use]
    pub fn from_process() -> Self {
        if std::env::var_os(env_keys::TEXT_API_KEY).is_none() {
            match dotenvy::dotenv() {
                Ok(path) => debug!(path = %path.display(), "Loaded .env file"),
                Err(err) => debug!(error = %err, "No .env file loaded"),
            }
        }
        Self::from_pairs(
            env_keys::ALL
                .iter()
                .filter_map(|key| std::env::var(key).ok().map(|value| (key.to_string(), value))),
        )
    }

    /// Build a snapshot from explicit pairs. Blank values are ignored.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let vars = pairs
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .filter(|(_, v)| !v.trim().is_empty())
            .collect();
        Self { vars }
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }
}

fn apply<T>(
    slot: &mut T,
    value: Option<T>,
    key: &str,
    source: &ConfigSource,
    attribution: &mut HashMap<String, ConfigSource>,
) {
    if let Some(value) = value {
        *slot = value;
        attribution.insert(key.to_string(), source.clone());
    }
}

impl Config {
    /// Discover and load configuration with precedence CLI > env > file > defaults.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` when an explicitly named config file is missing,
    /// a file fails to parse, or an environment value has the wrong type.
    pub fn discover(cli_args: &CliArgs) -> Result<Self, ConfigError> {
        let start_dir = std::env::current_dir().map_err(|err| ConfigError::InvalidValue {
            key: "current_dir".to_string(),
            value: err.to_string(),
        })?;
        Self::discover_from(&start_dir, cli_args, &EnvSnapshot::from_process())
    }

    /// Path-driven variant of [`Config::discover`] used by tests.
    ///
    /// # Errors
    ///
    /// See [`Config::discover`].
    pub fn discover_from(start_dir: &Path, cli_args: &CliArgs, env: &EnvSnapshot) -> Result<Self, ConfigError> {
        let mut config = Config::default();

        if let Some(path) = Self::discover_config_file(start_dir, cli_args, env)? {
            let file_config = Self::load_config_file(&path)?;
            config.apply_file(file_config, &ConfigSource::ConfigFile(path));
        }

        config.apply_env(env)?;
        config.apply_cli(cli_args);

        Ok(config)
    }

    /// Resolve the config file: `--config`, then `$AUGUR_CONFIG`, then
    /// `augur.toml` in `start_dir` when present.
    fn discover_config_file(
        start_dir: &Path,
        cli_args: &CliArgs,
        env: &EnvSnapshot,
    ) -> Result<Option<PathBuf>, ConfigError> {
        let explicit = cli_args
            .config_path
            .clone()
            .or_else(|| env.get(env_keys::CONFIG_PATH).map(PathBuf::from));

        if let Some(path) = explicit {
            if !path.is_file() {
                return Err(ConfigError::NotFound {
                    path: path.display().to_string(),
                });
            }
            return Ok(Some(path));
        }

        let candidate = start_dir.join(CONFIG_FILE_NAME);
        Ok(candidate.is_file().then_some(candidate))
    }

    pub(crate) fn load_config_file(path: &Path) -> Result<TomlConfig, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|err| ConfigError::InvalidFile {
            path: path.display().to_string(),
            reason: err.to_string(),
        })?;
        debug!(path = %path.display(), "Loading config file");
        toml::from_str(&content).map_err(|err| ConfigError::InvalidFile {
            path: path.display().to_string(),
            reason: err.to_string(),
        })
    }

    fn apply_file(&mut self, file: TomlConfig, source: &ConfigSource) {
        let attr = &mut self.source_attribution;

        let text = file.text;
        apply(&mut self.text.api_key, text.api_key.map(Some), "text.api_key", source, attr);
        apply(&mut self.text.base_url, text.base_url, "text.base_url", source, attr);
        apply(&mut self.text.model, text.model, "text.model", source, attr);
        apply(&mut self.text.temperature, text.temperature, "text.temperature", source, attr);
        apply(&mut self.text.max_tokens, text.max_tokens, "text.max_tokens", source, attr);
        apply(&mut self.text.timeout_secs, text.timeout_secs, "text.timeout_secs", source, attr);
        apply(&mut self.text.referer, text.referer, "text.referer", source, attr);
        apply(&mut self.text.title, text.title, "text.title", source, attr);

        let image = file.image;
        apply(&mut self.image.api_key, image.api_key.map(Some), "image.api_key", source, attr);
        apply(&mut self.image.secret, image.secret.map(Some), "image.secret", source, attr);
        apply(&mut self.image.base_url, image.base_url.map(Some), "image.base_url", source, attr);
        apply(&mut self.image.model_id, image.model_id, "image.model_id", source, attr);
        apply(&mut self.image.width, image.width, "image.width", source, attr);
        apply(&mut self.image.height, image.height, "image.height", source, attr);
        apply(
            &mut self.image.submit_timeout_secs,
            image.submit_timeout_secs,
            "image.submit_timeout_secs",
            source,
            attr,
        );
        apply(
            &mut self.image.poll_timeout_secs,
            image.poll_timeout_secs,
            "image.poll_timeout_secs",
            source,
            attr,
        );
        apply(
            &mut self.image.initial_delay_ms,
            image.initial_delay_ms,
            "image.initial_delay_ms",
            source,
            attr,
        );
        apply(
            &mut self.image.backoff_multiplier,
            image.backoff_multiplier,
            "image.backoff_multiplier",
            source,
            attr,
        );
        apply(&mut self.image.max_delay_ms, image.max_delay_ms, "image.max_delay_ms", source, attr);
        apply(&mut self.image.max_attempts, image.max_attempts, "image.max_attempts", source, attr);

        apply(&mut self.server.host, file.server.host, "server.host", source, attr);
        apply(&mut self.server.port, file.server.port, "server.port", source, attr);

        apply(&mut self.logging.verbose, file.logging.verbose, "logging.verbose", source, attr);
        apply(&mut self.logging.json, file.logging.json, "logging.json", source, attr);
    }

    fn apply_env(&mut self, env: &EnvSnapshot) -> Result<(), ConfigError> {
        let attr = &mut self.source_attribution;
        let string_var = |key: &str| env.get(key).map(|v| v.trim().to_string());
        let source = |key: &str| ConfigSource::Env(key.to_string());

        apply(
            &mut self.text.api_key,
            string_var(env_keys::TEXT_API_KEY).map(Some),
            "text.api_key",
            &source(env_keys::TEXT_API_KEY),
            attr,
        );
        apply(
            &mut self.text.model,
            string_var(env_keys::TEXT_MODEL),
            "text.model",
            &source(env_keys::TEXT_MODEL),
            attr,
        );
        apply(
            &mut self.image.api_key,
            string_var(env_keys::IMAGE_API_KEY).map(Some),
            "image.api_key",
            &source(env_keys::IMAGE_API_KEY),
            attr,
        );
        apply(
            &mut self.image.secret,
            string_var(env_keys::IMAGE_SECRET).map(Some),
            "image.secret",
            &source(env_keys::IMAGE_SECRET),
            attr,
        );
        apply(
            &mut self.image.base_url,
            string_var(env_keys::IMAGE_URL).map(Some),
            "image.base_url",
            &source(env_keys::IMAGE_URL),
            attr,
        );

        let port = match string_var(env_keys::PORT) {
            Some(raw) => Some(raw.parse::<u16>().map_err(|_| ConfigError::InvalidValue {
                key: env_keys::PORT.to_string(),
                value: raw.clone(),
            })?),
            None => None,
        };
        apply(&mut self.server.port, port, "server.port", &source(env_keys::PORT), attr);

        Ok(())
    }

    fn apply_cli(&mut self, cli_args: &CliArgs) {
        let attr = &mut self.source_attribution;
        let source = ConfigSource::Cli;
        apply(&mut self.server.port, cli_args.port, "server.port", &source, attr);
        apply(&mut self.text.model, cli_args.text_model.clone(), "text.model", &source, attr);
        apply(&mut self.logging.verbose, cli_args.verbose, "logging.verbose", &source, attr);
        apply(&mut self.logging.json, cli_args.log_json, "logging.json", &source, attr);
    }
}
