//! Prediction orchestration for augur.
//!
//! [`PredictionEngine`] drives one reading end to end: it renders the
//! narrative prompt, generates the text, splits it into three segments,
//! derives an image prompt per segment and fans the image jobs out
//! concurrently. Transport concerns (sessions, HTTP) stay outside this crate;
//! the [`Conversation`] state machine is provided for front-ends that collect
//! a profile turn by turn.

// Re-export shared crates so downstream code can reach them through the engine.
pub use augur_config as config;
pub use augur_llm as llm;

pub use augur_utils::error;
pub use augur_utils::logging;
pub use augur_utils::redaction;
#[cfg(any(test, feature = "test-utils"))]
pub use augur_utils::test_support;
pub use augur_utils::types;

pub mod conversation;
pub mod fanout;
pub mod image_prompt;
pub mod narrative;
pub mod orchestrator;
pub mod splitter;

pub use conversation::{Conversation, ConversationStep, Turn};
pub use fanout::FanOutCoordinator;
pub use image_prompt::{ImagePromptSource, ImagePromptTable, PromptRule};
pub use narrative::NarrativePromptBuilder;
pub use orchestrator::{PredictionEngine, Stage};
pub use splitter::split;
