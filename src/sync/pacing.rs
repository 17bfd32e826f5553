//! Inter-submission pacing.
//!
//! A fixed pause follows every successful submission. In adaptive mode the
//! pause after a failed submission grows exponentially with jitter (up to
//! 10% extra) and resets to the base pause on the next success.

use std::time::Duration;

use rand::Rng;

use crate::config::PacingConfig;

/// Tracks submission outcomes and sleeps accordingly.
#[derive(Debug, Clone)]
pub struct Pacer {
    config: PacingConfig,
    consecutive_failures: u32,
}

impl Pacer {
    pub fn new(config: PacingConfig) -> Self {
        Self {
            config,
            consecutive_failures: 0,
        }
    }

    /// A pacer that never sleeps.
    pub fn disabled() -> Self {
        Self::new(PacingConfig {
            pause_ms: 0,
            adaptive: false,
            max_pause_ms: 0,
        })
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    /// Record a successful submission and sleep the base pause.
    pub async fn after_success(&mut self) {
        self.consecutive_failures = 0;
        sleep_for(self.base()).await;
    }

    /// Record a failed submission; sleeps only in adaptive mode.
    pub async fn after_failure(&mut self) {
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
        if let Some(delay) = self.failure_pause() {
            tracing::debug!(
                failures = self.consecutive_failures,
                delay_ms = delay.as_millis() as u64,
                "Backing off after failed submission"
            );
            sleep_for(delay).await;
        }
    }

    fn base(&self) -> Duration {
        Duration::from_millis(self.config.pause_ms)
    }

    /// Pause owed after the current run of failures, if any.
    pub fn failure_pause(&self) -> Option<Duration> {
        if !self.config.adaptive || self.consecutive_failures == 0 {
            return None;
        }
        Some(backoff(
            self.consecutive_failures,
            self.config.pause_ms,
            self.config.max_pause_ms,
        ))
    }
}

async fn sleep_for(delay: Duration) {
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
}

/// Exponential backoff: `base * 2^failures`, capped, plus up to 10% jitter.
fn backoff(failures: u32, base_ms: u64, max_ms: u64) -> Duration {
    let factor = 2u64.saturating_pow(failures);
    let capped = base_ms.saturating_mul(factor).min(max_ms);

    let jitter_range = capped / 10;
    let jitter = if jitter_range > 0 {
        rand::thread_rng().gen_range(0..jitter_range)
    } else {
        0
    };
    Duration::from_millis(capped + jitter)
}
