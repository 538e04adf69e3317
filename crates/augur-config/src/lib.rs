//! Configuration management for augur
//!
//! Hierarchical configuration with precedence CLI > environment > config
//! file > defaults. Config files are TOML with optional `[text]`, `[image]`,
//! `[server]` and `[logging]` sections.

mod builder;
mod cli_args;
mod discovery;
mod model;
mod sources;
mod validation;

pub use builder::ConfigBuilder;
pub use cli_args::CliArgs;
pub use discovery::{CONFIG_FILE_NAME, EnvSnapshot, env_keys};
pub use model::*;
pub use sources::ConfigSource;

#[cfg(any(test, feature = "test-utils"))]
impl Config {
    /// A fully populated config pointing at the given upstream base URLs
    pub fn for_testing(text_base_url: &str, image_base_url: &str) -> Self {
        let mut config = Config::default();
        config.text.api_key = Some("sk-or-v1-test-key-0000000000000000".to_string());
        config.text.base_url = text_base_url.to_string();
        config.image.api_key = Some("test-image-key".to_string());
        config.image.secret = Some("test-image-secret".to_string());
        config.image.base_url = Some(image_base_url.to_string());
        config
    }
}
