//! Request pacing for the sequential quote fetch.
//!
//! A fixed delay precedes every provider call, with a coarse pause at the
//! start of each batch. When the provider signals throttling the delay
//! escalates until the next successful call.
//!
//! Delays are expressed in abstract time units so tests can run the same
//! policy with a zero-length unit.

use std::time::Duration;
use tracing::{debug, info, warn};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Pacing configuration. All delays are multiples of `unit`.
#[derive(Debug, Clone, PartialEq)]
pub struct PacingConfig {
    /// Length of one time unit.
    pub unit: Duration,
    /// Delay before each request while the provider is healthy.
    pub base_delay: f64,
    /// Delay before each request after a throttling signal.
    pub throttled_delay: f64,
    /// Every `batch_every`-th request (0-based index) also waits `batch_pause`.
    /// `0` disables the batch pause.
    pub batch_every: usize,
    pub batch_pause: f64,
    /// Substrings of an error message that indicate provider throttling.
    pub rate_limit_markers: Vec<String>,
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            unit: Duration::from_secs(1),
            base_delay: 1.5,
            throttled_delay: 10.0,
            batch_every: 30,
            batch_pause: 15.0,
            rate_limit_markers: vec![
                "Try after a while".to_string(),
                "Too Many Requests".to_string(),
                "Rate limited".to_string(),
            ],
        }
    }
}

impl PacingConfig {
    /// Same policy with every wait collapsed to zero.
    pub fn instant() -> Self {
        Self {
            unit: Duration::ZERO,
            ..Self::default()
        }
    }
}

// ---------------------------------------------------------------------------
// Pacer
// ---------------------------------------------------------------------------

/// Fixed-delay-with-escalation rate limiter for sequential provider calls.
#[derive(Debug)]
pub struct Pacer {
    config: PacingConfig,
    current_delay: f64,
    requests: usize,
}

impl Pacer {
    pub fn new(config: PacingConfig) -> Self {
        let current_delay = config.base_delay;
        Self {
            config,
            current_delay,
            requests: 0,
        }
    }

    /// Current per-request delay in time units.
    pub fn current_delay(&self) -> f64 {
        self.current_delay
    }

    pub fn is_throttled(&self) -> bool {
        self.current_delay != self.config.base_delay
    }

    /// Number of requests paced so far.
    pub fn requests(&self) -> usize {
        self.requests
    }

    fn at_batch_boundary(&self) -> bool {
        self.requests.checked_rem(self.config.batch_every) == Some(0)
    }

    /// Total wait (in time units) owed before the next request.
    pub fn next_wait(&self) -> f64 {
        let batch_pause = if self.at_batch_boundary() {
            self.config.batch_pause
        } else {
            0.0
        };
        self.current_delay + batch_pause
    }

    /// Sleep for whatever the next request is owed, then count it.
    pub async fn wait(&mut self) {
        let units = self.next_wait();
        if self.at_batch_boundary() && self.requests > 0 {
            info!(
                requests = self.requests,
                pause = self.config.batch_pause,
                "Batch boundary, pausing"
            );
        }
        self.requests += 1;

        let wait = match Duration::try_from_secs_f64(self.config.unit.as_secs_f64() * units) {
            Ok(wait) => wait,
            Err(e) => {
                warn!(units, error = %e, "Wait not representable, not sleeping");
                Duration::ZERO
            }
        };
        if !wait.is_zero() {
            tokio::time::sleep(wait).await;
        }
    }

    /// A request succeeded: drop back to the base delay.
    pub fn record_success(&mut self) {
        if self.is_throttled() {
            debug!(delay = self.config.base_delay, "Provider recovered, restoring base delay");
        }
        self.current_delay = self.config.base_delay;
    }

    /// The provider signalled throttling: escalate the delay.
    pub fn record_throttled(&mut self) {
        info!(
            from = self.current_delay,
            to = self.config.throttled_delay,
            "Rate limit signalled, slowing down"
        );
        self.current_delay = self.config.throttled_delay;
    }

    /// Whether an error message carries one of the configured rate-limit signatures.
    pub fn is_rate_limit_signal(&self, message: &str) -> bool {
        self.config
            .rate_limit_markers
            .iter()
            .any(|marker| message.contains(marker.as_str()))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
