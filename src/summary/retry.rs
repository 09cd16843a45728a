//! Retry schedule for backend calls.
//!
//! The schedule is plain state so callers decide when to sleep and tests can
//! inspect the delays without waiting for them.

use std::time::Duration;

/// How often and how patiently a failing call is retried.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts, the first one included.
    pub max_attempts: u32,
    /// Delay before the first retry; doubles for each further retry.
    pub base_delay: Duration,
    /// Upper bound on any single delay.
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    /// A policy that makes exactly one attempt.
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Delay before retry number `retry` (0 for the first retry).
    pub fn delay_for_retry(&self, retry: u32) -> Duration {
        let factor = 2u32.checked_pow(retry).unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }

    pub fn state(&self) -> RetryState {
        RetryState {
            policy: self.clone(),
            attempts: 0,
        }
    }
}

/// Attempts made so far against one [`RetryPolicy`].
#[derive(Debug, Clone)]
pub struct RetryState {
    policy: RetryPolicy,
    attempts: u32,
}

impl RetryState {
    /// Record the start of an attempt and return its 1-based number.
    pub fn begin_attempt(&mut self) -> u32 {
        self.attempts += 1;
        self.attempts
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Delay to wait before the next attempt, or `None` once attempts are used up.
    pub fn next_delay(&self) -> Option<Duration> {
        if self.attempts >= self.policy.max_attempts {
            None
        } else {
            Some(self.policy.delay_for_retry(self.attempts.saturating_sub(1)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schedule_doubles_and_caps() {
        let policy = RetryPolicy {
            max_attempts: 10,
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_millis(500),
        };

        assert_eq!(policy.delay_for_retry(0), Duration::from_millis(100));
        assert_eq!(policy.delay_for_retry(1), Duration::from_millis(200));
        assert_eq!(policy.delay_for_retry(2), Duration::from_millis(400));
        assert_eq!(policy.delay_for_retry(3), Duration::from_millis(500));
        assert_eq!(policy.delay_for_retry(64), Duration::from_millis(500));
    }

    #[test]
    fn test_state_runs_out() {
        let policy = RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(60),
        };
        let mut state = policy.state();

        assert_eq!(state.begin_attempt(), 1);
        assert_eq!(state.next_delay(), Some(Duration::from_secs(1)));
        assert_eq!(state.begin_attempt(), 2);
        assert_eq!(state.next_delay(), Some(Duration::from_secs(2)));
        assert_eq!(state.begin_attempt(), 3);
        assert_eq!(state.next_delay(), None);
        assert_eq!(state.attempts(), 3);
    }

    #[test]
    fn test_no_retry() {
        let mut state = RetryPolicy::no_retry().state();
        state.begin_attempt();
        assert_eq!(state.next_delay(), None);
    }
}
