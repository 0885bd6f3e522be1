use tracing::debug;

/// Backoff policy: maps (attempt, cumulative retry seconds) to the next
/// delay in seconds. Must be pure; the counter owns all mutation.
pub type RetryStrategy = Box<dyn Fn(u32, f64) -> f64 + Send + Sync>;

/// Floor applied to every computed delay so a broken strategy cannot
/// busy-loop the connect path.
pub const MIN_DELAY_SECS: f64 = 0.1;

/// Default backoff: half a second per attempt, capped at five seconds.
/// The counter pre-increments, so `attempt` is always >= 1 here.
pub fn default_retry_strategy(attempt: u32, _total_retry_time: f64) -> f64 {
    (0.5 * attempt as f64).min(5.0)
}

/// Tracks reconnect attempts and the total time spent waiting between them.
///
/// `delay()` is the only mutation point: it bumps the attempt number,
/// asks the strategy for a delay, clamps it to [`MIN_DELAY_SECS`], and
/// accumulates it. `reset()` (called after a successful ping) zeroes the
/// attempt number only; cumulative time keeps growing for the lifetime of
/// the owning manager.
#[derive(Debug, Default)]
pub struct RetryStrategyCounter {
    attempt: u32,
    total_retry_time: f64,
}

impl RetryStrategyCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compute the next delay. Increments the attempt number *before*
    /// invoking the strategy, so the first call passes attempt=1.
    pub fn delay(&mut self, strategy: &dyn Fn(u32, f64) -> f64) -> f64 {
        self.attempt += 1;

        let mut delay = strategy(self.attempt, self.total_retry_time);
        if delay < MIN_DELAY_SECS {
            delay = MIN_DELAY_SECS;
        }

        self.total_retry_time += delay;

        debug!(
            attempt = self.attempt,
            delay_secs = delay,
            total_retry_secs = self.total_retry_time,
            "retry after delay"
        );

        delay
    }

    /// Start the next burst of retries from attempt 1 again.
    /// Cumulative retry time is deliberately left untouched.
    pub fn reset(&mut self) {
        debug!("reset retry counter");
        self.attempt = 0;
    }

    #[inline]
    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    #[inline]
    pub fn total_retry_time(&self) -> f64 {
        self.total_retry_time
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_strategy_ramps_and_caps() {
        let mut c = RetryStrategyCounter::new();

        // attempt 1 => 0.5s
        assert_eq!(c.delay(&default_retry_strategy), 0.5);

        // attempts 2..=9
        for _ in 2..10 {
            c.delay(&default_retry_strategy);
        }

        // attempt 10 hits the 5s ceiling
        assert_eq!(c.delay(&default_retry_strategy), 5.0);

        // and stays there (attempt 20)
        for _ in 11..20 {
            c.delay(&default_retry_strategy);
        }
        assert_eq!(c.attempt(), 19);
        assert_eq!(c.delay(&default_retry_strategy), 5.0);
        assert_eq!(c.attempt(), 20);
    }

    #[test]
    fn delay_never_goes_below_the_floor() {
        let mut c = RetryStrategyCounter::new();

        assert_eq!(c.delay(&|_, _| 0.0), MIN_DELAY_SECS);
        assert_eq!(c.delay(&|_, _| -3.0), MIN_DELAY_SECS);
        assert_eq!(c.delay(&|_, _| 0.0999), MIN_DELAY_SECS);

        // A sane value passes through untouched.
        assert_eq!(c.delay(&|_, _| 2.5), 2.5);
    }

    #[test]
    fn cumulative_time_is_monotonic() {
        let mut c = RetryStrategyCounter::new();

        let mut last = 0.0;
        for _ in 0..8 {
            c.delay(&default_retry_strategy);
            assert!(c.total_retry_time() >= last);
            last = c.total_retry_time();
        }

        // Even a zero-returning strategy accumulates the floor.
        c.delay(&|_, _| 0.0);
        assert!(c.total_retry_time() > last);
    }

    #[test]
    fn reset_zeroes_attempt_but_keeps_cumulative_time() {
        let mut c = RetryStrategyCounter::new();

        c.delay(&default_retry_strategy);
        c.delay(&default_retry_strategy);
        let accumulated = c.total_retry_time();
        assert!(accumulated > 0.0);

        c.reset();
        assert_eq!(c.attempt(), 0);
        assert_eq!(c.total_retry_time(), accumulated);

        // Next delay behaves as if no prior attempts occurred...
        let seen = std::sync::Mutex::new(Vec::new());
        c.delay(&|attempt, total| {
            seen.lock().unwrap().push((attempt, total));
            1.0
        });
        let calls = seen.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, 1);
        // ...while cumulative time carried over from before the reset.
        assert_eq!(calls[0].1, accumulated);
    }
}
