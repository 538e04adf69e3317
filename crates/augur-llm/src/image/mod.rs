//! Image generation: an asynchronous submit-then-poll job API
//!
//! [`ImageApi`] is the raw remote API (one call per HTTP request);
//! [`ImageGenerationClient`] layers the polling schedule and terminal-state
//! handling on top of any `ImageApi`.

mod api;
mod backoff;
mod client;
mod http;

pub use api::{ImageApi, JobSnapshot, StatusCheckError};
pub use backoff::BackoffPolicy;
pub use client::{ImageGenerationClient, ImageGenerator};
pub use http::HttpImageApi;
