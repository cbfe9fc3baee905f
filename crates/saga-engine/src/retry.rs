use std::time::Duration;

/// Exponential backoff between attempts of one step.
///
/// The delay before attempt `i + 1` (zero-based `i`) is `base_delay * 2^i`,
/// capped at `max_delay`. With the default config (1 s base, 60 s cap) the
/// doubling stops after the sixth retry; raise `max_delay_ms` for uncapped
/// doubling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    base_delay: Duration,
    max_delay: Duration,
}

impl RetryPolicy {
    #[must_use]
    pub fn new(base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            base_delay,
            max_delay,
        }
    }

    #[must_use]
    pub fn base_delay(&self) -> Duration {
        self.base_delay
    }

    #[must_use]
    pub fn max_delay(&self) -> Duration {
        self.max_delay
    }

    /// Delay to wait after the failed attempt with zero-based index `attempt_index`.
    #[must_use]
    pub fn delay_for(&self, attempt_index: u32) -> Duration {
        let factor = 1_u32.checked_shl(attempt_index).unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(Duration::from_secs(1), Duration::from_secs(60))
    }
}

/// Attempt budget resolved for one step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct StepPolicy {
    pub(crate) max_retries: u32,
    pub(crate) timeout: Duration,
}

impl StepPolicy {
    /// Step overrides win over defaults. At least one attempt is always made.
    pub(crate) fn resolve(
        max_retries: Option<u32>,
        timeout: Option<Duration>,
        default_max_retries: u32,
        default_timeout: Duration,
    ) -> Self {
        Self {
            max_retries: max_retries.unwrap_or(default_max_retries).max(1),
            timeout: timeout.unwrap_or(default_timeout),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delay_doubles_per_attempt() {
        let policy = RetryPolicy::new(Duration::from_millis(100), Duration::from_secs(60));

        assert_eq!(policy.delay_for(0), Duration::from_millis(100));
        assert_eq!(policy.delay_for(1), Duration::from_millis(200));
        assert_eq!(policy.delay_for(2), Duration::from_millis(400));
        assert_eq!(policy.delay_for(5), Duration::from_millis(3200));
    }

    #[test]
    fn delay_is_capped() {
        let policy = RetryPolicy::new(Duration::from_secs(1), Duration::from_secs(10));

        assert_eq!(policy.delay_for(3), Duration::from_secs(8));
        assert_eq!(policy.delay_for(4), Duration::from_secs(10));
        assert_eq!(policy.delay_for(200), Duration::from_secs(10));
    }

    #[test]
    fn large_cap_keeps_exact_doubling() {
        let base = Duration::from_secs(1);
        let policy = RetryPolicy::new(base, Duration::MAX);

        for i in 0..20 {
            assert_eq!(policy.delay_for(i), base * 2_u32.pow(i));
        }
    }

    #[test]
    fn step_overrides_take_precedence() {
        let policy = StepPolicy::resolve(
            Some(5),
            Some(Duration::from_secs(2)),
            3,
            Duration::from_secs(30),
        );

        assert_eq!(policy.max_retries, 5);
        assert_eq!(policy.timeout, Duration::from_secs(2));
    }

    #[test]
    fn zero_retries_still_attempts_once() {
        let policy = StepPolicy::resolve(Some(0), None, 3, Duration::from_secs(30));

        assert_eq!(policy.max_retries, 1);
        assert_eq!(policy.timeout, Duration::from_secs(30));
    }
}
