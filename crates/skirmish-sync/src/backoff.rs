//! Exponential backoff between reconnection attempts.
//!
//! Retry `n` (0-based) waits `initial_delay * multiplier^n`, capped at
//! `max_delay`. With the defaults that is 1 s, 2 s, 4 s, 8 s, 16 s and then
//! 30 s for every remaining retry, ten retries in total.

use std::time::Duration;

use rand::Rng;

/// Configuration for reconnection backoff.
#[derive(Debug, Clone, PartialEq)]
pub struct ReconnectConfig {
    /// Delay before the first retry. Default: 1 s.
    pub initial_delay: Duration,
    /// Multiplier applied per retry. Default: 2.0.
    pub backoff_multiplier: f64,
    /// Upper bound on any single delay. Default: 30 s.
    pub max_delay: Duration,
    /// Retries allowed after the initial attempt. Default: 10.
    pub max_attempts: u32,
    /// Jitter factor in `0.0..1.0`, applied as a uniform ±jitter scale on
    /// the uncapped delay. Default: 0.0 (deterministic schedule).
    pub jitter: f64,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(1),
            backoff_multiplier: 2.0,
            max_delay: Duration::from_secs(30),
            max_attempts: 10,
            jitter: 0.0,
        }
    }
}

impl ReconnectConfig {
    /// Un-jittered delay before retry `attempt` (0-based).
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.scaled(attempt, 1.0)
    }

    fn scaled(&self, attempt: u32, factor: f64) -> Duration {
        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        let secs =
            self.initial_delay.as_secs_f64() * self.backoff_multiplier.powi(exponent) * factor;
        let max = self.max_delay.as_secs_f64();
        if !secs.is_finite() || secs >= max {
            return self.max_delay;
        }
        Duration::from_secs_f64(secs.max(0.0))
    }
}

/// Tracks the retry count for one subscription and hands out delays.
#[derive(Debug, Clone)]
pub struct ReconnectState {
    config: ReconnectConfig,
    attempts: u32,
}

impl ReconnectState {
    /// Create a new state from the given config.
    pub fn new(config: ReconnectConfig) -> Self {
        Self {
            config,
            attempts: 0,
        }
    }

    /// Compute the delay before the next retry and advance the counter.
    /// Returns `None` once `max_attempts` retries have been handed out.
    pub fn next_delay(&mut self) -> Option<Duration> {
        if self.attempts >= self.config.max_attempts {
            return None;
        }

        let factor = if self.config.jitter > 0.0 {
            let jitter = self.config.jitter.min(1.0);
            rand::rng().random_range((1.0 - jitter)..=(1.0 + jitter))
        } else {
            1.0
        };
        let delay = self.config.scaled(self.attempts, factor);
        self.attempts += 1;
        Some(delay)
    }

    /// Forget past failures. Called after a successful sync.
    pub fn reset(&mut self) {
        self.attempts = 0;
    }

    /// Number of retries handed out since the last reset.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn config(&self) -> &ReconnectConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(values: &[u64]) -> Vec<Duration> {
        values.iter().copied().map(Duration::from_millis).collect()
    }

    #[test]
    fn test_default_schedule() {
        let mut state = ReconnectState::new(ReconnectConfig::default());
        let delays: Vec<Duration> = std::iter::from_fn(|| state.next_delay()).collect();
        assert_eq!(
            delays,
            ms(&[1000, 2000, 4000, 8000, 16000, 30000, 30000, 30000, 30000, 30000])
        );
        assert_eq!(state.attempts(), 10);
        assert_eq!(state.next_delay(), None);
    }

    #[test]
    fn test_reset_restarts_schedule() {
        let mut state = ReconnectState::new(ReconnectConfig::default());
        state.next_delay();
        state.next_delay();
        state.next_delay();
        state.reset();
        assert_eq!(state.attempts(), 0);
        assert_eq!(state.next_delay(), Some(Duration::from_secs(1)));
    }

    #[test]
    fn test_delay_for_is_capped() {
        let config = ReconnectConfig::default();
        assert_eq!(config.delay_for(4), Duration::from_secs(16));
        assert_eq!(config.delay_for(5), Duration::from_secs(30));
        assert_eq!(config.delay_for(1000), Duration::from_secs(30));
        assert_eq!(config.delay_for(u32::MAX), Duration::from_secs(30));
    }

    #[test]
    fn test_zero_attempts_gives_up_immediately() {
        let mut state = ReconnectState::new(ReconnectConfig {
            max_attempts: 0,
            ..ReconnectConfig::default()
        });
        assert_eq!(state.next_delay(), None);
    }

    #[test]
    fn test_jitter_stays_in_range() {
        let config = ReconnectConfig {
            jitter: 0.25,
            max_attempts: 1000,
            ..ReconnectConfig::default()
        };
        let mut state = ReconnectState::new(config);
        for _ in 0..200 {
            state.reset();
            let first = state.next_delay().unwrap();
            assert!(first >= Duration::from_millis(750), "{first:?}");
            assert!(first <= Duration::from_millis(1250), "{first:?}");
        }
        for _ in 0..50 {
            let delay = state.next_delay().unwrap();
            assert!(delay <= Duration::from_secs(30));
        }
    }
}
