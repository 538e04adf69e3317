use augur_utils::error::ConfigError;

use crate::Config;

fn is_blank(value: Option<&str>) -> bool {
    value.is_none_or(|v| v.trim().is_empty())
}

impl Config {
    /// Validate configuration values. Startup-fatal for `serve` and `predict`.
    ///
    /// Every problem is collected, so one run reports all missing credentials.
    ///
    /// # Errors
    ///
    /// `ConfigError::ValidationFailed` listing each problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors = self.range_errors();

        if is_blank(self.text.api_key.as_deref()) {
            errors.push("text.api_key is required (OPENROUTER_API_KEY)".to_string());
        }
        if is_blank(self.image.api_key.as_deref()) {
            errors.push("image.api_key is required (KANDINSKY_API_KEY)".to_string());
        }
        if is_blank(self.image.secret.as_deref()) {
            errors.push("image.secret is required (KANDINSKY_SECRET)".to_string());
        }
        if is_blank(self.image.base_url.as_deref()) {
            errors.push("image.base_url is required (KANDINSKY_URL)".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::ValidationFailed { errors })
        }
    }

    /// Numeric and URL checks that do not involve credentials
    pub(crate) fn range_errors(&self) -> Vec<String> {
        let mut errors = Vec::new();
        let text = &self.text;
        let image = &self.image;

        if !text.base_url.starts_with("http://") && !text.base_url.starts_with("https://") {
            errors.push(format!("text.base_url must be an http(s) URL, got '{}'", text.base_url));
        }
        if let Some(url) = image.base_url.as_deref()
            && !url.trim().is_empty()
            && !url.starts_with("http://")
            && !url.starts_with("https://")
        {
            errors.push(format!("image.base_url must be an http(s) URL, got '{url}'"));
        }
        if text.model.trim().is_empty() {
            errors.push("text.model must not be empty".to_string());
        }
        if !(0.0..=2.0).contains(&text.temperature) {
            errors.push(format!("text.temperature must be within 0.0..=2.0, got {}", text.temperature));
        }
        if text.max_tokens == 0 || text.max_tokens > 32_000 {
            errors.push(format!("text.max_tokens must be within 1..=32000, got {}", text.max_tokens));
        }
        if text.timeout_secs == 0 || text.timeout_secs > 600 {
            errors.push(format!("text.timeout_secs must be within 1..=600, got {}", text.timeout_secs));
        }

        for (key, size) in [("image.width", image.width), ("image.height", image.height)] {
            if !(64..=2048).contains(&size) {
                errors.push(format!("{key} must be within 64..=2048, got {size}"));
            }
        }
        if image.submit_timeout_secs == 0 {
            errors.push("image.submit_timeout_secs must be greater than 0".to_string());
        }
        if image.poll_timeout_secs == 0 {
            errors.push("image.poll_timeout_secs must be greater than 0".to_string());
        }
        if image.initial_delay_ms == 0 {
            errors.push("image.initial_delay_ms must be greater than 0".to_string());
        }
        if !(1.0..=10.0).contains(&image.backoff_multiplier) {
            errors.push(format!(
                "image.backoff_multiplier must be within 1.0..=10.0, got {}",
                image.backoff_multiplier
            ));
        }
        if image.max_delay_ms < image.initial_delay_ms {
            errors.push(format!(
                "image.max_delay_ms ({}) must not be below image.initial_delay_ms ({})",
                image.max_delay_ms, image.initial_delay_ms
            ));
        }
        if image.max_attempts == 0 || image.max_attempts > 100 {
            errors.push(format!("image.max_attempts must be within 1..=100, got {}", image.max_attempts));
        }

        errors
    }
}
