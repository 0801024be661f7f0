//! Back-off policy for the demo server's accept loop.

use std::time::Duration;

/// Exponential back-off applied when `accept()` fails.
///
/// A failure waits `initial_delay`, each further consecutive failure waits
/// twice as long as the previous one up to `max_delay`, and a successful
/// accept resets the delay.
///
/// # Default Values
/// - `initial_delay`: 10 milliseconds
/// - `max_delay`: 1 second
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BackoffConfig {
    /// Delay after the first failure.
    pub initial_delay: Duration,
    /// Ceiling on the delay between retries.
    pub max_delay: Duration,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_millis(10),
            max_delay: Duration::from_secs(1),
        }
    }
}

impl BackoffConfig {
    /// Raise both delays to at least one millisecond and order them.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::time::Duration;
    ///
    /// use sni_peek::server::BackoffConfig;
    ///
    /// let inverted = BackoffConfig {
    ///     initial_delay: Duration::from_millis(50),
    ///     max_delay: Duration::ZERO,
    /// }
    /// .normalized();
    /// assert_eq!(inverted.initial_delay, Duration::from_millis(1));
    /// assert_eq!(inverted.max_delay, Duration::from_millis(50));
    /// ```
    #[must_use]
    pub fn normalized(self) -> Self {
        let floor = Duration::from_millis(1);
        let initial = self.initial_delay.max(floor);
        let max = self.max_delay.max(floor);
        Self {
            initial_delay: initial.min(max),
            max_delay: initial.max(max),
        }
    }

    /// Delay to use after a failure that followed a wait of `current`.
    #[must_use]
    pub fn next_delay(&self, current: Duration) -> Duration {
        current.saturating_mul(2).min(self.max_delay)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use rstest::rstest;

    use super::BackoffConfig;

    #[rstest]
    #[case(Duration::from_millis(10), Duration::from_millis(20))]
    #[case(Duration::from_millis(600), Duration::from_secs(1))]
    #[case(Duration::from_secs(1), Duration::from_secs(1))]
    fn delay_doubles_up_to_ceiling(#[case] current: Duration, #[case] expected: Duration) {
        assert_eq!(BackoffConfig::default().next_delay(current), expected);
    }

    #[test]
    fn normalized_keeps_valid_config() {
        let config = BackoffConfig::default();
        assert_eq!(config.normalized(), config);
    }
}
