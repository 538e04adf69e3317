//! Shared foundation for the augur workspace: the data model, the error
//! taxonomy, exit codes, logging and secret redaction.

pub mod error;
pub mod exit_codes;
pub mod logging;
pub mod redaction;
pub mod types;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_support;

pub use error::{
    ConfigError, ErrorCategory, ErrorKind, FanOutError, GenError, ImageError, ImageFailure, PollError,
    PredictionError, ProfileError, SubmitError, UserFriendlyError,
};
pub use exit_codes::ExitCode;
pub use types::{
    GenerationResult, ImageJob, JobId, JobStatus, Profile, ResultBundle, SEGMENT_COUNT, Segments, Topic,
};
