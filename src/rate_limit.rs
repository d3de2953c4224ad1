//! Per-endpoint sliding-window rate limiting.
//!
//! Bounds request volume to the upstream API per endpoint name. Timestamps
//! older than the window are dropped on every check, so windows never grow
//! without bound. The limiter is advisory at the process level — it does not
//! coordinate across processes or machines.

use std::collections::{HashMap, VecDeque};
use std::time::{Duration, Instant};

/// Sliding-window request counter, keyed by endpoint name.
///
/// Each endpoint has an independent window; exhausting one never blocks
/// another. Check-and-record is a single read-modify-write — the owner holds
/// it behind a lock when calls run concurrently.
pub struct RateLimiter {
    window: Duration,
    max_requests: usize,
    windows: HashMap<String, VecDeque<Instant>>,
}

impl RateLimiter {
    pub fn new(window: Duration, max_requests: usize) -> Self {
        Self {
            window,
            max_requests,
            windows: HashMap::new(),
        }
    }

    /// Record the current instant against `endpoint`, drop timestamps older
    /// than the window, and return whether the call is within quota.
    ///
    /// The count includes the call being checked, so with a ceiling of N the
    /// first N calls in a window pass and call N+1 is refused.
    pub fn check(&mut self, endpoint: &str) -> bool {
        let now = Instant::now();
        let timestamps = self.windows.entry(endpoint.to_string()).or_default();

        if let Some(cutoff) = now.checked_sub(self.window) {
            while timestamps.front().is_some_and(|ts| *ts < cutoff) {
                timestamps.pop_front();
            }
        }

        timestamps.push_back(now);
        timestamps.len() <= self.max_requests
    }

    /// Number of recorded timestamps for an endpoint (for testing).
    #[cfg(test)]
    fn recorded(&self, endpoint: &str) -> usize {
        self.windows.get(endpoint).map_or(0, VecDeque::len)
    }
}
