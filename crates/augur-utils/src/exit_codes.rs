//! Process exit codes for the `augur` binary.
//!
//! | Code | Constant | Description |
//! |------|----------|-------------|
//! | 0 | `SUCCESS` | Operation completed successfully |
//! | 1 | `INTERNAL` | General/internal failure |
//! | 2 | `CLI_ARGS` | Invalid CLI arguments, profile input or configuration |
//! | 3 | `PREDICTION_FAILED` | Text or image generation failed |

use crate::error::{ConfigError, PredictionError, ProfileError};

/// Type-safe process exit code.
///
/// ```rust
/// use augur_utils::exit_codes::ExitCode;
///
/// assert_eq!(ExitCode::SUCCESS.as_i32(), 0);
/// assert_eq!(ExitCode::from_i32(3), ExitCode::PREDICTION_FAILED);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitCode(i32);

impl ExitCode {
    /// Success - operation completed successfully
    pub const SUCCESS: ExitCode = ExitCode(0);

    /// Internal error - general failure
    pub const INTERNAL: ExitCode = ExitCode(1);

    /// CLI arguments error - invalid arguments, profile or configuration
    pub const CLI_ARGS: ExitCode = ExitCode(2);

    /// Prediction failed - an upstream generation stage failed
    pub const PREDICTION_FAILED: ExitCode = ExitCode(3);

    /// Get the numeric exit code value.
    #[must_use]
    pub const fn as_i32(self) -> i32 {
        self.0
    }

    /// Create an ExitCode from a raw i32 value.
    #[must_use]
    pub const fn from_i32(code: i32) -> Self {
        ExitCode(code)
    }
}

impl From<i32> for ExitCode {
    fn from(code: i32) -> Self {
        ExitCode(code)
    }
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code.0
    }
}

impl From<&ConfigError> for ExitCode {
    fn from(_: &ConfigError) -> Self {
        ExitCode::CLI_ARGS
    }
}

impl From<&ProfileError> for ExitCode {
    fn from(_: &ProfileError) -> Self {
        ExitCode::CLI_ARGS
    }
}

impl From<&PredictionError> for ExitCode {
    fn from(_: &PredictionError) -> Self {
        ExitCode::PREDICTION_FAILED
    }
}
