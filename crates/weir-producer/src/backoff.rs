//! Retry backoff policy

use std::time::Duration;

/// Capped exponential backoff.
///
/// The delay for retry `n` is `base * multiplier^n`, capped at `cap`, and
/// further clamped by [`BackoffPolicy::delay_within`] so a wait never
/// extends past the batch's remaining delivery budget.
#[derive(Debug, Clone)]
pub(crate) struct BackoffPolicy {
    base: Duration,
    cap: Duration,
    multiplier: f64,
}

impl BackoffPolicy {
    pub(crate) fn new(base: Duration, cap: Duration, multiplier: f64) -> Self {
        Self {
            base,
            cap,
            multiplier,
        }
    }

    /// Delay before the retry following completed attempt number
    /// `attempt` (0-based)
    pub(crate) fn delay_for(&self, attempt: u32) -> Duration {
        // powi saturates to +inf well before attempt 1024; min() with the
        // cap keeps the arithmetic finite
        let factor = self.multiplier.powi(attempt.min(1024) as i32);
        let delay_ms = (self.base.as_millis() as f64 * factor).min(self.cap.as_millis() as f64);
        Duration::from_millis(delay_ms as u64)
    }

    /// Delay clamped so the wait fits inside the remaining delivery budget
    pub(crate) fn delay_within(&self, attempt: u32, remaining: Duration) -> Duration {
        self.delay_for(attempt).min(remaining)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> BackoffPolicy {
        BackoffPolicy::new(Duration::from_millis(100), Duration::from_secs(10), 2.0)
    }

    #[test]
    fn test_exponential_growth() {
        let policy = policy();
        assert_eq!(policy.delay_for(0), Duration::from_millis(100));
        assert_eq!(policy.delay_for(1), Duration::from_millis(200));
        assert_eq!(policy.delay_for(2), Duration::from_millis(400));
        assert_eq!(policy.delay_for(3), Duration::from_millis(800));
    }

    #[test]
    fn test_cap_applies() {
        let policy = policy();
        assert_eq!(policy.delay_for(20), Duration::from_secs(10));
        assert_eq!(policy.delay_for(1000), Duration::from_secs(10));
    }

    #[test]
    fn test_clamped_to_remaining_budget() {
        let policy = policy();
        let clamped = policy.delay_within(3, Duration::from_millis(50));
        assert_eq!(clamped, Duration::from_millis(50));

        let unclamped = policy.delay_within(0, Duration::from_secs(5));
        assert_eq!(unclamped, Duration::from_millis(100));
    }

    #[test]
    fn test_multiplier_one_is_constant() {
        let policy = BackoffPolicy::new(Duration::from_millis(500), Duration::from_secs(10), 1.0);
        assert_eq!(policy.delay_for(0), Duration::from_millis(500));
        assert_eq!(policy.delay_for(7), Duration::from_millis(500));
    }
}
