//! Clients for the two upstream generation services
//!
//! [`TextGenerator`] turns a prompt into narrative text over a chat-completion
//! API. [`ImageGenerator`] turns a prompt into image bytes through a
//! submit-then-poll job API. Both traits are the seams the orchestration core
//! depends on, so tests and alternative providers can stand in for the HTTP
//! implementations.

mod chat;
mod http_client;
pub mod image;

pub use augur_utils::error::{GenError, ImageError, PollError, SubmitError};
pub use chat::{ChatCompletionClient, ChatSettings, SYSTEM_PROMPT, TextGenerator};
pub use http_client::HttpClient;
pub use image::{BackoffPolicy, HttpImageApi, ImageApi, ImageGenerationClient, ImageGenerator, JobSnapshot, StatusCheckError};

use thiserror::Error;

/// Errors constructing a client from configuration
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LlmSetupError {
    #[error("failed to build HTTP client: {0}")]
    HttpClient(String),

    #[error("missing configuration: {0}")]
    MissingConfig(&'static str),
}
