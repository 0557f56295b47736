//! Exponential backoff with jitter for transient upstream faults.

use std::thread;
use std::time::Duration;

use log::debug;
use rand::Rng;

/// Retry policy: bounded attempts, exponential backoff, random jitter.
/// One policy value is shared by every call site that retries, so the shape
/// of "retry this" lives in one place instead of inside each network call.
#[derive(Debug, Clone, Copy)]
pub struct BackoffPolicy {
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub max_jitter_ms: u64,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        BackoffPolicy {
            max_attempts: 3,
            base_delay_ms: 1000,
            max_jitter_ms: 1000,
        }
    }
}

impl BackoffPolicy {
    /// Run `op` until it succeeds or the attempt limit is reached;
    /// returns the last error in that case. Sleeps `base * 2^(attempt-1)`
    /// plus jitter between attempts.
    pub fn run<T, E, F>(&self, mut op: F) -> Result<T, E>
    where
        F: FnMut() -> Result<T, E>,
        E: std::fmt::Display,
    {
        let attempts = self.max_attempts.max(1);
        let mut last_err = None;

        for attempt in 1..=attempts {
            match op() {
                Ok(value) => return Ok(value),
                Err(err) => {
                    debug!("attempt {}/{} failed: {}", attempt, attempts, err);
                    last_err = Some(err);
                    if attempt < attempts {
                        self.sleep_before(attempt + 1);
                    }
                }
            }
        }

        Err(last_err.expect("at least one attempt was made"))
    }

    fn sleep_before(&self, attempt: u32) {
        let backoff = self.base_delay_ms.saturating_mul(1 << (attempt - 2).min(16));
        let jitter = if self.max_jitter_ms > 0 {
            rand::thread_rng().gen_range(0..self.max_jitter_ms)
        } else {
            0
        };
        let total = backoff + jitter;
        if total > 0 {
            thread::sleep(Duration::from_millis(total));
        }
    }
}
