//! User-facing error output

use augur_utils::error::UserFriendlyError;
use augur_utils::redaction::redact_secrets;

/// Render an error with its context and suggestions, redacted.
#[must_use]
pub fn display_for_user(error: &dyn UserFriendlyError) -> String {
    let mut output = format!("Error: {}\n", error.user_message());

    if let Some(context) = error.context() {
        output.push_str(&format!("\nContext: {context}\n"));
    }

    let suggestions = error.suggestions();
    if !suggestions.is_empty() {
        output.push_str("\nSuggestions:\n");
        for suggestion in suggestions {
            output.push_str(&format!("  • {suggestion}\n"));
        }
    }

    redact_secrets(&output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use augur_utils::error::{ConfigError, GenError, PredictionError};

    #[test]
    fn test_report_lists_suggestions() {
        let err = ConfigError::MissingRequired("text.api_key".to_string());
        let report = display_for_user(&err);
        assert!(report.starts_with("Error: "));
        assert!(report.contains("Suggestions:"));
    }

    #[test]
    fn test_report_is_redacted() {
        let err = PredictionError::Text(GenError::BadStatus {
            status: 401,
            body: "bad key Bearer abcdefghijklmnopqrstuvwxyz".to_string(),
        });
        let report = display_for_user(&err);
        assert!(!report.contains("abcdefghijklmnopqrstuvwxyz"));
    }
}
