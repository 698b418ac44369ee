//! Rate-limit handling policy for the fetch loop.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;

/// Controls how the fetch loop reacts to an exhausted rate-limit window.
///
/// The default policy waits out every window, matching the API's own
/// guidance: sleep until the reset time advertised in the response headers,
/// then retry the same request. A bounded policy gives up after a fixed
/// number of waits, surfacing [`FetchError::RateLimited`] to the caller.
///
/// [`FetchError::RateLimited`]: crate::github::FetchError::RateLimited
#[derive(Clone)]
pub struct RateLimitPolicy {
    max_waits: Option<u32>,
    min_sleep: Duration,
    clock: Arc<dyn Fn() -> i64 + Send + Sync>,
}

impl Default for RateLimitPolicy {
    fn default() -> Self {
        Self {
            max_waits: None,
            min_sleep: Duration::from_secs(1),
            clock: Arc::new(|| Utc::now().timestamp()),
        }
    }
}

impl fmt::Debug for RateLimitPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RateLimitPolicy")
            .field("max_waits", &self.max_waits)
            .field("min_sleep", &self.min_sleep)
            .finish()
    }
}

impl RateLimitPolicy {
    /// Policy that waits out every rate-limit window (the default).
    #[must_use]
    pub fn unbounded() -> Self {
        Self::default()
    }

    /// Policy that gives up after `max_waits` rate-limit sleeps per call.
    #[must_use]
    pub fn bounded(max_waits: u32) -> Self {
        Self {
            max_waits: Some(max_waits),
            ..Self::default()
        }
    }

    /// Set the minimum sleep applied even when the reset time has passed.
    #[must_use]
    pub fn with_min_sleep(mut self, min_sleep: Duration) -> Self {
        self.min_sleep = min_sleep;
        self
    }

    /// Replace the wall-clock source used to compute wait durations.
    ///
    /// The closure returns the current Unix timestamp in seconds. Tests use
    /// this to make sleep arithmetic deterministic.
    #[must_use]
    pub fn with_clock<F>(mut self, clock: F) -> Self
    where
        F: Fn() -> i64 + Send + Sync + 'static,
    {
        self.clock = Arc::new(clock);
        self
    }

    /// Number of waits allowed per call, or `None` for unbounded.
    #[must_use]
    pub fn max_waits(&self) -> Option<u32> {
        self.max_waits
    }

    /// How long to sleep for a window that resets at `reset_epoch`
    /// (Unix seconds). Clamped below by the minimum sleep, so a reset
    /// in the past still pauses briefly before retrying.
    #[must_use]
    pub fn wait_duration(&self, reset_epoch: i64) -> Duration {
        let now = (self.clock)();
        let delta = reset_epoch.saturating_sub(now).max(0) as u64;
        Duration::from_secs(delta).max(self.min_sleep)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wait_duration_counts_down_to_the_reset_time() {
        let policy = RateLimitPolicy::default().with_clock(|| 1_000_000);
        assert_eq!(
            policy.wait_duration(1_000_042),
            Duration::from_secs(42),
            "future reset should wait the full delta"
        );
    }

    #[test]
    fn wait_duration_floors_at_the_minimum_sleep() {
        let policy = RateLimitPolicy::default().with_clock(|| 1_000_000);

        // Reset already passed.
        assert_eq!(policy.wait_duration(999_000), Duration::from_secs(1));
        // Reset header missing entirely is treated as epoch zero by the caller.
        assert_eq!(policy.wait_duration(0), Duration::from_secs(1));
        // Reset exactly now.
        assert_eq!(policy.wait_duration(1_000_000), Duration::from_secs(1));
    }

    #[test]
    fn min_sleep_is_configurable() {
        let policy = RateLimitPolicy::default()
            .with_clock(|| 500)
            .with_min_sleep(Duration::from_secs(5));
        assert_eq!(policy.wait_duration(400), Duration::from_secs(5));
        assert_eq!(policy.wait_duration(530), Duration::from_secs(30));
    }

    #[test]
    fn bounded_and_unbounded_budgets() {
        assert_eq!(RateLimitPolicy::unbounded().max_waits(), None);
        assert_eq!(RateLimitPolicy::bounded(3).max_waits(), Some(3));
        assert_eq!(RateLimitPolicy::default().max_waits(), None);
    }
}
