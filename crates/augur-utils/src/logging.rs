//! Logging infrastructure for augur
//!
//! One `tracing` subscriber is installed per process by [`init_tracing`].
//! Request handling runs inside a [`prediction_span`], and each fan-out worker
//! inside an [`image_job_span`], so every event carries the request id and
//! slot index without repeating them at each call site.

use std::io::IsTerminal;
use tracing::{Level, error, info, span};
use tracing_subscriber::{
    EnvFilter,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

use crate::redaction::redact_secrets;

/// Check if colored output should be used.
///
/// Returns true only if stderr is a terminal and `NO_COLOR` is not set.
fn use_color() -> bool {
    std::io::stderr().is_terminal() && std::env::var_os("NO_COLOR").is_none()
}

/// Default filter directive when `RUST_LOG` is unset
#[must_use]
pub fn default_filter(verbose: bool) -> &'static str {
    if verbose { "augur=debug,info" } else { "augur=info,warn" }
}

/// Initialize the global tracing subscriber.
///
/// `RUST_LOG` overrides the default filter. With `json` set, events are
/// written as one JSON object per line; otherwise a compact human format is
/// used, with span close events when `verbose` is set.
///
/// # Errors
///
/// Fails if a global subscriber is already installed.
pub fn init_tracing(verbose: bool, json: bool) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter(verbose)))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    if json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_span_list(false)
                    .with_writer(std::io::stderr),
            )
            .try_init()?;
    } else if verbose {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_line_number(false)
                    .with_file(false)
                    .with_span_events(FmtSpan::CLOSE)
                    .with_ansi(use_color())
                    .with_writer(std::io::stderr)
                    .compact(),
            )
            .try_init()?;
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_line_number(false)
                    .with_file(false)
                    .with_ansi(use_color())
                    .with_writer(std::io::stderr)
                    .compact(),
            )
            .try_init()?;
    }

    Ok(())
}

/// Span covering one prediction request
pub fn prediction_span(request_id: &str, topic: &str) -> tracing::Span {
    span!(
        Level::INFO,
        "prediction_request",
        request_id = %request_id,
        topic = %topic,
    )
}

/// Span covering one fan-out slot
pub fn image_job_span(index: usize) -> tracing::Span {
    span!(Level::INFO, "image_job", index = index)
}

/// Log a pipeline stage transition
pub fn log_stage(request_id: &str, stage: &str) {
    info!(request_id = %request_id, stage = %stage, "Prediction stage");
}

/// Log a failed request. The message is redacted before it is emitted.
pub fn log_prediction_error(request_id: &str, stage: &str, error: &str, duration_ms: u128) {
    let sanitized = redact_secrets(error);
    error!(
        request_id = %request_id,
        stage = %stage,
        duration_ms = %duration_ms,
        error = %sanitized,
        "Prediction failed"
    );
}
