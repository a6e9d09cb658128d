//! Exponential backoff for system failures

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Retry budget and delay schedule for api_error / crashed matches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Consecutive system failures before the operator is asked to step in
    pub max_retries: u32,
    pub base_delay_ms: u64,
    /// Growth factor per consecutive failure
    pub multiplier: f64,
    /// Upper bound on a single delay (None = unbounded)
    pub max_delay_ms: Option<u64>,
    /// Random spread as a fraction of the delay, in `[0, 1]`
    pub jitter: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay_ms: 1000,
            multiplier: 2.0,
            max_delay_ms: Some(60_000),
            jitter: 0.0,
        }
    }
}

impl RetryPolicy {
    /// Delay before retry number `retry` (1-based): `base * multiplier^(retry-1)`.
    pub fn delay_for(&self, retry: u32) -> Duration {
        let exponent = retry.saturating_sub(1) as i32;
        let mut millis = self.base_delay_ms as f64 * self.multiplier.powi(exponent);
        if let Some(cap) = self.max_delay_ms {
            millis = millis.min(cap as f64);
        }
        if self.jitter > 0.0 {
            let spread = millis * self.jitter;
            millis += rand::thread_rng().gen_range(-spread..=spread);
        }
        Duration::from_millis(millis.max(0.0).round() as u64)
    }

    /// True once `failures` consecutive failures have used up the budget.
    pub fn exhausted(&self, failures: u32) -> bool {
        failures >= self.max_retries
    }
}
