use augur_config::ImageConfig;
use std::time::Duration;

/// Exponential polling schedule. Attempt `n` (zero-based) waits
/// `initial * multiplier^n`, capped at `max_delay`, before it queries.
#[derive(Debug, Clone, PartialEq)]
pub struct BackoffPolicy {
    pub initial: Duration,
    pub multiplier: f64,
    pub max_delay: Duration,
    pub max_attempts: u32,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            initial: Duration::from_secs(2),
            multiplier: 1.5,
            max_delay: Duration::from_secs(30),
            max_attempts: 10,
        }
    }
}

impl BackoffPolicy {
    #[must_use]
    pub fn from_config(config: &ImageConfig) -> Self {
        Self {
            initial: Duration::from_millis(config.initial_delay_ms),
            multiplier: config.backoff_multiplier,
            max_delay: Duration::from_millis(config.max_delay_ms),
            max_attempts: config.max_attempts,
        }
    }

    /// Delay before zero-based attempt `attempt`
    ///
    /// Never negative: a negative multiplier yields a zero delay.
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        let secs = self.initial.as_secs_f64() * self.multiplier.powi(exponent);
        let cap = self.max_delay.as_secs_f64();
        if !secs.is_finite() || secs >= cap {
            return self.max_delay;
        }
        Duration::from_secs_f64(secs.max(0.0))
    }

    /// Every delay in order, one per attempt
    pub fn schedule(&self) -> impl Iterator<Item = Duration> + '_ {
        (0..self.max_attempts).map(|attempt| self.delay_for(attempt))
    }

    /// Total sleep time when every attempt is used
    #[must_use]
    pub fn worst_case(&self) -> Duration {
        self.schedule().sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_schedule_grows_then_caps() {
        let policy = BackoffPolicy::default();
        let delays: Vec<Duration> = policy.schedule().collect();

        assert_eq!(delays.len(), 10);
        assert_eq!(delays[0], Duration::from_secs(2));
        assert_eq!(delays[1], Duration::from_secs(3));
        assert_eq!(delays[2], Duration::from_millis(4500));
        assert_eq!(delays[3], Duration::from_millis(6750));
        assert_eq!(delays[7], Duration::from_secs(30));
        assert_eq!(delays[9], Duration::from_secs(30));
        assert!(delays.windows(2).all(|pair| pair[0] <= pair[1]));
    }

    #[test]
    fn test_worst_case_is_about_two_and_a_half_minutes() {
        let total = BackoffPolicy::default().worst_case();
        assert!(total > Duration::from_secs(150), "{total:?}");
        assert!(total < Duration::from_secs(160), "{total:?}");
    }

    #[test]
    fn test_from_config_matches_default() {
        assert_eq!(BackoffPolicy::from_config(&ImageConfig::default()), BackoffPolicy::default());
    }

    #[test]
    fn test_huge_attempt_saturates_at_cap() {
        let policy = BackoffPolicy::default();
        assert_eq!(policy.delay_for(u32::MAX), Duration::from_secs(30));
    }

    #[test]
    fn test_negative_multiplier_does_not_panic() {
        let policy = BackoffPolicy {
            multiplier: -1.5,
            ..BackoffPolicy::default()
        };
        assert_eq!(policy.delay_for(0), Duration::from_secs(2));
        assert_eq!(policy.delay_for(1), Duration::ZERO);
        assert_eq!(policy.delay_for(2), Duration::from_millis(4500));
        assert_eq!(policy.schedule().count(), 10);
    }
}
