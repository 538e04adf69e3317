//! augur - illustrated three-part readings
//!
//! A reading is produced in five steps: a text model writes a three-part
//! narrative from the user's [`Profile`], the narrative is split into three
//! segments, an image prompt is derived for each segment, three image jobs
//! run concurrently, and the results are assembled index-aligned into a
//! [`ResultBundle`].
//!
//! augur can be used in two ways:
//! - **CLI / service**: `augur serve` exposes the HTTP API, `augur predict`
//!   runs one reading from the terminal
//! - **Library**: build a [`PredictionEngine`] (from a [`Config`] or from your
//!   own [`TextGenerator`] and [`ImageGenerator`]) and call
//!   [`PredictionEngine::request_prediction`]
//!
//! ```no_run
//! use augur::{Config, PredictionEngine, Profile, Topic};
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::builder()
//!     .text_api_key("sk-or-v1-...")
//!     .image_credentials("key", "secret")
//!     .image_base_url("https://api-key.fusionbrain.ai/")
//!     .build()?;
//! let engine = PredictionEngine::from_config(&config)?;
//! let profile = Profile::new("Anna", "15.03.1990", "Should I change jobs?", Topic::Career);
//! let bundle = engine.request_prediction(&profile).await?;
//! println!("{}", bundle.segments[0]);
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod server;

pub use augur_config::{CliArgs, Config, ConfigBuilder, ConfigSource};
pub use augur_engine::{
    Conversation, ConversationStep, ImagePromptSource, ImagePromptTable, NarrativePromptBuilder, PredictionEngine,
    PromptRule, Stage, split,
};
pub use augur_llm::{ImageGenerator, TextGenerator};
pub use augur_utils::error::{
    ConfigError, ErrorKind, FanOutError, GenError, ImageError, PollError, PredictionError, ProfileError, SubmitError,
    UserFriendlyError,
};
pub use augur_utils::exit_codes::ExitCode;
pub use augur_utils::types::{Profile, ResultBundle, Segments, Topic};
