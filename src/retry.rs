//! Exponential backoff with jitter, shared by `Promise::retry` and
//! `retryOn` (spec §4.5). The schedule itself is the same shape the
//! teacher's task-retry layer uses for failed node executions.

use rand::Rng;
use std::time::Duration;

/// Backoff configuration for a retry loop.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Delay before the first retry.
    pub base_delay: Duration,
    /// Multiplier applied to the delay after each attempt.
    pub multiplier: f64,
    /// Upper bound no computed delay may exceed.
    pub max_delay: Duration,
    /// Fraction of the computed delay randomized in either direction, to
    /// avoid synchronized retry storms across many Promises.
    pub jitter: f64,
}

impl RetryPolicy {
    /// A fixed delay with no backoff growth or jitter.
    pub fn fixed(delay: Duration) -> Self {
        RetryPolicy {
            base_delay: delay,
            multiplier: 1.0,
            max_delay: delay,
            jitter: 0.0,
        }
    }

    /// Exponential backoff doubling each attempt, capped at `max_delay`,
    /// with 20% jitter.
    pub fn exponential(base_delay: Duration, max_delay: Duration) -> Self {
        RetryPolicy {
            base_delay,
            multiplier: 2.0,
            max_delay,
            jitter: 0.2,
        }
    }
}

/// Tracks progress through a [`RetryPolicy`]'s schedule across attempts.
pub struct RetryState {
    policy: RetryPolicy,
    attempt: u32,
}

impl RetryState {
    pub fn new(policy: RetryPolicy) -> Self {
        RetryState { policy, attempt: 0 }
    }

    /// The delay to wait before the next attempt, advancing internal state.
    pub fn next_delay(&mut self) -> Duration {
        let exp = self.policy.multiplier.powi(self.attempt as i32);
        self.attempt += 1;
        let raw = self.policy.base_delay.mul_f64(exp).min(self.policy.max_delay);
        if self.policy.jitter <= 0.0 {
            return raw;
        }
        let mut rng = rand::thread_rng();
        let jitter_factor = 1.0 + rng.gen_range(-self.policy.jitter..=self.policy.jitter);
        raw.mul_f64(jitter_factor.max(0.0))
    }

    /// How many attempts have been started so far.
    pub fn attempts(&self) -> u32 {
        self.attempt
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_policy_never_grows() {
        let mut state = RetryState::new(RetryPolicy::fixed(Duration::from_millis(50)));
        assert_eq!(state.next_delay(), Duration::from_millis(50));
        assert_eq!(state.next_delay(), Duration::from_millis(50));
    }

    #[test]
    fn exponential_policy_is_capped() {
        let mut state = RetryState::new(RetryPolicy {
            base_delay: Duration::from_millis(100),
            multiplier: 2.0,
            max_delay: Duration::from_millis(250),
            jitter: 0.0,
        });
        assert_eq!(state.next_delay(), Duration::from_millis(100));
        assert_eq!(state.next_delay(), Duration::from_millis(200));
        assert_eq!(state.next_delay(), Duration::from_millis(250));
        assert_eq!(state.attempts(), 3);
    }
}
