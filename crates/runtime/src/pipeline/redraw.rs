//! Cooperative wait for the external redraw signal.
//!
//! After toggling mods the character may be redrawn asynchronously. The
//! pipeline polls the mod service with exponentially growing intervals
//! until the redraw settles, the overall timeout passes, or a newer
//! operation cancels the wait.

use std::time::Duration;

use tokio_util::sync::CancellationToken;

use super::Clock;

/// Tunable parameters of the redraw wait.
#[derive(Debug, Clone, PartialEq)]
pub struct RedrawWaitConfig {
    /// Delay before the second poll.
    pub initial_delay: Duration,
    /// Upper bound on the delay between polls.
    pub max_delay: Duration,
    /// Factor by which the delay grows after each poll.
    pub multiplier: f64,
    /// Give up waiting after this long and let the operation return.
    pub timeout: Duration,
}

impl Default for RedrawWaitConfig {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_millis(10),
            max_delay: Duration::from_secs(1),
            multiplier: 2.0,
            timeout: Duration::from_secs(5),
        }
    }
}

/// How a redraw wait ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum RedrawWait {
    /// Nothing was redrawing, or the redraw finished.
    Settled,
    /// A newer operation superseded this one.
    Cancelled,
    /// The redraw was still running when the timeout passed.
    TimedOut,
}

/// Shortest delay between two polls.
pub const MIN_POLL_DELAY: Duration = Duration::from_millis(1);

/// Calculate the next poll delay, clamped to [`RedrawWaitConfig::max_delay`]
/// and never below [`MIN_POLL_DELAY`].
pub fn next_delay(current: Duration, config: &RedrawWaitConfig) -> Duration {
    let next_ms = (current.as_millis() as f64 * config.multiplier) as u64;
    Duration::from_millis(next_ms)
        .min(config.max_delay)
        .max(MIN_POLL_DELAY)
}

/// Polls `is_redrawing` until it reports false.
///
/// Cancellation is checked before every poll and raced against every sleep.
pub async fn wait_for_redraw(
    is_redrawing: impl Fn() -> bool,
    clock: &dyn Clock,
    config: &RedrawWaitConfig,
    cancel: &CancellationToken,
) -> RedrawWait {
    let started = clock.now();
    let mut delay = config.initial_delay.max(MIN_POLL_DELAY);
    let mut polls = 0u32;

    loop {
        if cancel.is_cancelled() {
            tracing::debug!(polls, "redraw wait superseded by a newer operation");
            return RedrawWait::Cancelled;
        }
        if !is_redrawing() {
            return RedrawWait::Settled;
        }

        let elapsed = (clock.now() - started).to_std().unwrap_or_default();
        if elapsed >= config.timeout {
            tracing::warn!(
                polls,
                elapsed_ms = elapsed.as_millis() as u64,
                "redraw still running, giving up the wait"
            );
            return RedrawWait::TimedOut;
        }

        polls += 1;
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::debug!(polls, "redraw wait superseded by a newer operation");
                return RedrawWait::Cancelled;
            }
            _ = clock.sleep(delay) => {}
        }
        delay = next_delay(delay, config);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;
    use crate::pipeline::{ManualClock, SystemClock};

    #[test]
    fn next_delay_grows_and_clamps() {
        let config = RedrawWaitConfig {
            max_delay: Duration::from_millis(50),
            ..RedrawWaitConfig::default()
        };
        assert_eq!(next_delay(Duration::from_millis(10), &config), Duration::from_millis(20));
        assert_eq!(next_delay(Duration::from_millis(40), &config), Duration::from_millis(50));
    }

    #[test]
    fn next_delay_never_reaches_zero() {
        let config = RedrawWaitConfig {
            initial_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            multiplier: 0.0,
            ..RedrawWaitConfig::default()
        };
        assert_eq!(next_delay(Duration::ZERO, &config), MIN_POLL_DELAY);
        assert_eq!(next_delay(Duration::from_millis(30), &config), MIN_POLL_DELAY);
    }

    #[tokio::test]
    async fn zero_delays_still_reach_the_timeout() {
        let clock = ManualClock::default();
        let start = clock.now();
        let config = RedrawWaitConfig {
            initial_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            multiplier: 1.0,
            timeout: Duration::from_millis(50),
        };
        let polls = AtomicU32::new(0);
        let result = wait_for_redraw(
            || {
                polls.fetch_add(1, Ordering::SeqCst);
                true
            },
            &clock,
            &config,
            &CancellationToken::new(),
        )
        .await;

        assert_eq!(result, RedrawWait::TimedOut);
        assert!((clock.now() - start).to_std().unwrap() >= config.timeout);
        assert!(polls.load(Ordering::SeqCst) <= 51);
    }

    #[tokio::test]
    async fn settles_immediately_when_idle() {
        let clock = ManualClock::default();
        let result = wait_for_redraw(
            || false,
            &clock,
            &RedrawWaitConfig::default(),
            &CancellationToken::new(),
        )
        .await;
        assert_eq!(result, RedrawWait::Settled);
    }

    #[tokio::test]
    async fn settles_after_redraw_finishes() {
        let clock = ManualClock::default();
        let remaining = AtomicU32::new(3);
        let result = wait_for_redraw(
            || {
                remaining
                    .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                    .is_ok()
            },
            &clock,
            &RedrawWaitConfig::default(),
            &CancellationToken::new(),
        )
        .await;
        assert_eq!(result, RedrawWait::Settled);
    }

    #[tokio::test]
    async fn gives_up_after_timeout() {
        let clock = ManualClock::default();
        let start = clock.now();
        let config = RedrawWaitConfig::default();
        let result = wait_for_redraw(|| true, &clock, &config, &CancellationToken::new()).await;

        assert_eq!(result, RedrawWait::TimedOut);
        let waited = (clock.now() - start).to_std().unwrap();
        assert!(waited >= config.timeout);
        assert!(waited < config.timeout + config.max_delay + config.max_delay);
    }

    #[tokio::test]
    async fn cancelled_token_ends_the_wait() {
        let clock = ManualClock::default();
        let cancel = CancellationToken::new();
        cancel.cancel();
        let result = wait_for_redraw(|| true, &clock, &RedrawWaitConfig::default(), &cancel).await;
        assert_eq!(result, RedrawWait::Cancelled);
    }

    #[tokio::test]
    async fn cancellation_interrupts_a_real_sleep() {
        let cancel = CancellationToken::new();
        let config = RedrawWaitConfig {
            initial_delay: Duration::from_secs(60),
            timeout: Duration::from_secs(600),
            ..RedrawWaitConfig::default()
        };
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            trigger.cancel();
        });

        let result = wait_for_redraw(|| true, &SystemClock, &config, &cancel).await;
        assert_eq!(result, RedrawWait::Cancelled);
    }
}
