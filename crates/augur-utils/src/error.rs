use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Coarse classification shared by every failure in the pipeline.
///
/// | Kind | Raised by |
/// |------|-----------|
/// | `Transport` | connection failures and timeouts on either client |
/// | `Protocol` | non-2xx statuses and undecodable bodies |
/// | `Content` | a well-formed reply with nothing usable in it |
/// | `GenerationFailed` | the image service reported a failed job |
/// | `GenerationCensored` | the image service refused the prompt |
/// | `GenerationTimeout` | polling ran out of attempts |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Transport,
    Protocol,
    Content,
    GenerationFailed,
    GenerationCensored,
    GenerationTimeout,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport => write!(f, "transport"),
            Self::Protocol => write!(f, "protocol"),
            Self::Content => write!(f, "content"),
            Self::GenerationFailed => write!(f, "generation_failed"),
            Self::GenerationCensored => write!(f, "generation_censored"),
            Self::GenerationTimeout => write!(f, "generation_timeout"),
        }
    }
}

/// Trait for providing user-friendly error reporting with context and suggestions
pub trait UserFriendlyError {
    /// Get a user-friendly error message
    fn user_message(&self) -> String;

    /// Get contextual information about the error
    fn context(&self) -> Option<String>;

    /// Get suggested actions to resolve the error
    fn suggestions(&self) -> Vec<String>;

    /// Get the error category for grouping similar errors
    fn category(&self) -> ErrorCategory;
}

/// Categories of errors for better organization and handling
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Validation,
    TextGeneration,
    ImageGeneration,
    Network,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Configuration => write!(f, "Configuration"),
            Self::Validation => write!(f, "Validation"),
            Self::TextGeneration => write!(f, "Text Generation"),
            Self::ImageGeneration => write!(f, "Image Generation"),
            Self::Network => write!(f, "Network"),
        }
    }
}

/// Failures of the chat-completion client. No retries happen at this layer.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GenError {
    #[error("network error: {0}")]
    Network(String),

    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    /// `body` is redacted and truncated before it is stored here
    #[error("unexpected status {status}: {body}")]
    BadStatus { status: u16, body: String },

    #[error("response contained no choices")]
    EmptyResponse,

    #[error("failed to decode response: {0}")]
    Decode(String),
}

impl GenError {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Network(_) | Self::Timeout(_) => ErrorKind::Transport,
            Self::BadStatus { .. } | Self::Decode(_) => ErrorKind::Protocol,
            Self::EmptyResponse => ErrorKind::Content,
        }
    }
}

impl UserFriendlyError for GenError {
    fn user_message(&self) -> String {
        match self {
            Self::Network(msg) => format!("Could not reach the text service: {msg}"),
            Self::Timeout(duration) => format!("The text service did not answer within {duration:?}"),
            Self::BadStatus { status, .. } => format!("The text service rejected the request (HTTP {status})"),
            Self::EmptyResponse => "The text service returned an empty reply".to_string(),
            Self::Decode(msg) => format!("The text service sent an unreadable reply: {msg}"),
        }
    }

    fn context(&self) -> Option<String> {
        match self {
            Self::BadStatus { body, .. } if !body.is_empty() => Some(format!("Response body: {body}")),
            Self::EmptyResponse => Some("The completion had no choices or a blank message.".to_string()),
            _ => None,
        }
    }

    fn suggestions(&self) -> Vec<String> {
        match self {
            Self::Network(_) | Self::Timeout(_) => vec![
                "Check network connectivity to the text service".to_string(),
                "Retry the request; long readings can take up to two minutes".to_string(),
            ],
            Self::BadStatus { status, .. } if *status == 401 || *status == 403 => vec![
                "Verify OPENROUTER_API_KEY is set and valid".to_string(),
            ],
            Self::BadStatus { status: 429, .. } => vec!["Wait and retry; the provider is rate limiting".to_string()],
            Self::BadStatus { .. } => vec!["Check the configured model name and base URL".to_string()],
            Self::EmptyResponse | Self::Decode(_) => vec!["Retry the request".to_string()],
        }
    }

    fn category(&self) -> ErrorCategory {
        match self.kind() {
            ErrorKind::Transport => ErrorCategory::Network,
            _ => ErrorCategory::TextGeneration,
        }
    }
}

/// Failures submitting an image job
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SubmitError {
    #[error("network error: {0}")]
    Network(String),

    #[error("unexpected status {status}: {body}")]
    BadStatus { status: u16, body: String },

    /// Includes a 2xx reply that carries no job id
    #[error("failed to decode response: {0}")]
    Decode(String),
}

impl SubmitError {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Network(_) => ErrorKind::Transport,
            Self::BadStatus { .. } | Self::Decode(_) => ErrorKind::Protocol,
        }
    }
}

/// Terminal failures while waiting for an image job
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PollError {
    #[error("generation failed: {0}")]
    Failed(String),

    #[error("image was censored")]
    Censored,

    #[error("max attempts reached ({attempts})")]
    Timeout { attempts: u32 },

    #[error("failed to decode status: {0}")]
    Decode(String),
}

impl PollError {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Failed(_) => ErrorKind::GenerationFailed,
            Self::Censored => ErrorKind::GenerationCensored,
            Self::Timeout { .. } => ErrorKind::GenerationTimeout,
            Self::Decode(_) => ErrorKind::Protocol,
        }
    }
}

/// Either phase of `generate_image`
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ImageError {
    #[error("submit failed: {0}")]
    Submit(#[from] SubmitError),

    #[error("{0}")]
    Poll(#[from] PollError),
}

impl ImageError {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Submit(err) => err.kind(),
            Self::Poll(err) => err.kind(),
        }
    }
}

impl UserFriendlyError for ImageError {
    fn user_message(&self) -> String {
        match self {
            Self::Submit(SubmitError::Network(msg)) => format!("Could not reach the image service: {msg}"),
            Self::Submit(SubmitError::BadStatus { status, .. }) => {
                format!("The image service rejected the job (HTTP {status})")
            }
            Self::Submit(SubmitError::Decode(msg)) => format!("The image service sent an unreadable reply: {msg}"),
            Self::Poll(PollError::Failed(reason)) => format!("Image generation failed: {reason}"),
            Self::Poll(PollError::Censored) => "The image service refused the prompt".to_string(),
            Self::Poll(PollError::Timeout { attempts }) => {
                format!("The image was not ready after {attempts} status checks")
            }
            Self::Poll(PollError::Decode(msg)) => format!("Unreadable job status: {msg}"),
        }
    }

    fn context(&self) -> Option<String> {
        match self {
            Self::Poll(PollError::Timeout { .. }) => {
                Some("Jobs are polled with exponential backoff starting at two seconds.".to_string())
            }
            _ => None,
        }
    }

    fn suggestions(&self) -> Vec<String> {
        match self {
            Self::Submit(SubmitError::BadStatus { status, .. }) if *status == 401 || *status == 403 => {
                vec!["Verify KANDINSKY_API_KEY and KANDINSKY_SECRET".to_string()]
            }
            Self::Submit(_) => vec!["Check KANDINSKY_URL and network connectivity".to_string()],
            Self::Poll(PollError::Censored) => vec!["Rephrase the question".to_string()],
            Self::Poll(_) => vec!["Retry the request".to_string()],
        }
    }

    fn category(&self) -> ErrorCategory {
        match self.kind() {
            ErrorKind::Transport => ErrorCategory::Network,
            _ => ErrorCategory::ImageGeneration,
        }
    }
}

/// One failed slot of a fan-out
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageFailure {
    /// Zero-based slot index
    pub index: usize,
    pub error: ImageError,
}

impl fmt::Display for ImageFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "error generating image {}: {}", self.index + 1, self.error)
    }
}

/// Aggregate of every failed slot, ordered by index
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FanOutError {
    failures: Vec<ImageFailure>,
}

impl FanOutError {
    /// Sorts the failures by index. Returns `None` for an empty list.
    #[must_use]
    pub fn new(mut failures: Vec<ImageFailure>) -> Option<Self> {
        if failures.is_empty() {
            return None;
        }
        failures.sort_by_key(|failure| failure.index);
        Some(Self { failures })
    }

    #[must_use]
    pub fn failures(&self) -> &[ImageFailure] {
        &self.failures
    }

    /// Kind of the lowest-index failure
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        self.failures
            .first()
            .map_or(ErrorKind::GenerationFailed, |failure| failure.error.kind())
    }
}

impl fmt::Display for FanOutError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, failure) in self.failures.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{failure}")?;
        }
        Ok(())
    }
}

impl std::error::Error for FanOutError {}

/// The first fatal stage of a prediction request
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PredictionError {
    #[error("Error getting prediction: {0}")]
    Text(#[from] GenError),

    #[error("Error generating images: {0}")]
    Images(#[from] FanOutError),
}

impl PredictionError {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Text(err) => err.kind(),
            Self::Images(err) => err.kind(),
        }
    }
}

impl UserFriendlyError for PredictionError {
    fn user_message(&self) -> String {
        match self {
            Self::Text(err) => err.user_message(),
            Self::Images(err) => format!("{} of 3 images could not be generated", err.failures().len()),
        }
    }

    fn context(&self) -> Option<String> {
        match self {
            Self::Text(err) => err.context(),
            Self::Images(err) => Some(err.to_string()),
        }
    }

    fn suggestions(&self) -> Vec<String> {
        match self {
            Self::Text(err) => err.suggestions(),
            Self::Images(err) => err
                .failures()
                .first()
                .map(|failure| failure.error.suggestions())
                .unwrap_or_default(),
        }
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::Text(err) => err.category(),
            Self::Images(_) => ErrorCategory::ImageGeneration,
        }
    }
}

/// Configuration-related errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid configuration file {path}: {reason}")]
    InvalidFile { path: String, reason: String },

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),

    #[error("Invalid configuration value for {key}: {value}")]
    InvalidValue { key: String, value: String },

    #[error("Configuration file not found at {path}")]
    NotFound { path: String },

    #[error("Configuration validation failed: {}", .errors.join("; "))]
    ValidationFailed { errors: Vec<String> },
}

impl UserFriendlyError for ConfigError {
    fn user_message(&self) -> String {
        match self {
            Self::InvalidFile { path, reason } => {
                format!("Configuration file {path} has invalid format: {reason}")
            }
            Self::MissingRequired(key) => format!("Required configuration '{key}' is missing"),
            Self::InvalidValue { key, value } => {
                format!("Configuration '{key}' has invalid value: {value}")
            }
            Self::NotFound { path } => format!("Configuration file not found: {path}"),
            Self::ValidationFailed { errors } => format!(
                "Configuration validation failed with {} error(s): {}",
                errors.len(),
                errors.join(", ")
            ),
        }
    }

    fn context(&self) -> Option<String> {
        match self {
            Self::InvalidFile { .. } => Some(
                "Configuration files are TOML with optional [text], [image], [server] and [logging] sections."
                    .to_string(),
            ),
            Self::NotFound { .. } => Some(
                "augur reads --config, then $AUGUR_CONFIG, then ./augur.toml when it exists.".to_string(),
            ),
            Self::MissingRequired(_) | Self::ValidationFailed { .. } => {
                Some("Credentials for both upstream services are required to serve readings.".to_string())
            }
            Self::InvalidValue { .. } => None,
        }
    }

    fn suggestions(&self) -> Vec<String> {
        match self {
            Self::InvalidFile { .. } => vec!["Check the file with a TOML validator".to_string()],
            Self::NotFound { .. } => vec!["Pass an existing path with --config".to_string()],
            Self::MissingRequired(_) | Self::ValidationFailed { .. } => vec![
                "Set OPENROUTER_API_KEY, KANDINSKY_API_KEY, KANDINSKY_SECRET and KANDINSKY_URL".to_string(),
                "Or put them in a .env file in the working directory".to_string(),
            ],
            Self::InvalidValue { key, .. } => vec![format!("Correct the value of '{key}'")],
        }
    }

    fn category(&self) -> ErrorCategory {
        ErrorCategory::Configuration
    }
}

/// Rejected profile input, reported to callers as a 4xx
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProfileError {
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    #[error("invalid date in {field}: '{value}' (expected DD.MM.YYYY)")]
    InvalidDate { field: &'static str, value: String },

    #[error("unknown topic: '{0}'")]
    UnknownTopic(String),
}

impl UserFriendlyError for ProfileError {
    fn user_message(&self) -> String {
        self.to_string()
    }

    fn context(&self) -> Option<String> {
        None
    }

    fn suggestions(&self) -> Vec<String> {
        match self {
            Self::MissingField(field) => vec![format!("Provide a non-empty '{field}'")],
            Self::InvalidDate { .. } => vec!["Use the format DD.MM.YYYY, e.g. 15.03.1990".to_string()],
            Self::UnknownTopic(_) => vec!["Use one of: love, health, career, decision".to_string()],
        }
    }

    fn category(&self) -> ErrorCategory {
        ErrorCategory::Validation
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn failure(index: usize, error: PollError) -> ImageFailure {
        ImageFailure {
            index,
            error: ImageError::Poll(error),
        }
    }

    #[test]
    fn test_fan_out_error_orders_and_joins_failures() {
        let err = FanOutError::new(vec![
            failure(2, PollError::Censored),
            failure(0, PollError::Failed("bad prompt".to_string())),
        ])
        .unwrap();

        assert_eq!(
            err.to_string(),
            "error generating image 1: generation failed: bad prompt; error generating image 3: image was censored"
        );
        assert_eq!(err.kind(), ErrorKind::GenerationFailed);
    }

    #[test]
    fn test_fan_out_error_requires_failures() {
        assert!(FanOutError::new(Vec::new()).is_none());
    }

    #[test]
    fn test_prediction_error_messages() {
        let err = PredictionError::from(GenError::EmptyResponse);
        assert_eq!(err.to_string(), "Error getting prediction: response contained no choices");
        assert_eq!(err.kind(), ErrorKind::Content);

        let fan_out = FanOutError::new(vec![failure(1, PollError::Timeout { attempts: 10 })]).unwrap();
        let err = PredictionError::from(fan_out);
        assert_eq!(
            err.to_string(),
            "Error generating images: error generating image 2: max attempts reached (10)"
        );
        assert_eq!(err.kind(), ErrorKind::GenerationTimeout);
        assert_eq!(err.category(), ErrorCategory::ImageGeneration);
    }

    #[test]
    fn test_error_kinds() {
        assert_eq!(GenError::Timeout(Duration::from_secs(120)).kind(), ErrorKind::Transport);
        assert_eq!(
            GenError::BadStatus {
                status: 500,
                body: String::new()
            }
            .kind(),
            ErrorKind::Protocol
        );
        assert_eq!(
            ImageError::from(SubmitError::Network("refused".to_string())).kind(),
            ErrorKind::Transport
        );
        assert_eq!(ImageError::from(PollError::Censored).kind(), ErrorKind::GenerationCensored);
    }

    #[test]
    fn test_config_error_suggests_env_keys() {
        let err = ConfigError::MissingRequired("text.api_key".to_string());
        assert!(err.suggestions().iter().any(|s| s.contains("OPENROUTER_API_KEY")));
        assert_eq!(err.category(), ErrorCategory::Configuration);
    }
}
