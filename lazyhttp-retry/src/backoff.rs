//! Backoff strategies pace the attempts of one retry sequence.

use std::time::Duration;

use retry_policies::{RetryDecision, RetryPolicy};
use web_time::SystemTime;

/// A stateful generator of waits for one retry sequence.
///
/// Every call advances the strategy. `Some(wait)` tells the caller to wait and try again,
/// `None` tells it to stop. Once `None` has been returned the sequence is over; a strategy is
/// never reused for another sequence, a [`BackoffFactory`] hands out a fresh one instead.
pub trait Backoff: Send {
    fn next_backoff(&mut self) -> Option<Duration>;
}

/// Produces a fresh [`Backoff`] for every retry sequence.
///
/// Implemented for any `Fn() -> impl Backoff`, so both `NoopBackoff::new` and
/// `|| LimitedTriesBackoff::new(interval, 5)` are factories.
pub trait BackoffFactory: Send + Sync + 'static {
    fn backoff(&self) -> Box<dyn Backoff>;
}

impl<F, B> BackoffFactory for F
where
    F: Fn() -> B + Send + Sync + 'static,
    B: Backoff + 'static,
{
    fn backoff(&self) -> Box<dyn Backoff> {
        Box::new(self())
    }
}

/// Never waits and never retries.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopBackoff;

impl NoopBackoff {
    pub const fn new() -> Self {
        NoopBackoff
    }
}

impl Backoff for NoopBackoff {
    fn next_backoff(&mut self) -> Option<Duration> {
        None
    }
}

/// Waits a fixed interval between attempts and allows `tries` attempts in total.
///
/// The first `tries - 1` calls return the interval and the next one stops the sequence, so a
/// transport driving it sends the request `tries` times at most: the first send plus
/// `tries - 1` retries. `tries` counts attempts, not retries. Zero behaves like one.
#[derive(Debug, Clone)]
pub struct LimitedTriesBackoff {
    interval: Duration,
    remaining: u32,
}

impl LimitedTriesBackoff {
    pub fn new(interval: Duration, tries: u32) -> Self {
        LimitedTriesBackoff {
            interval,
            remaining: tries.saturating_sub(1),
        }
    }
}

impl Backoff for LimitedTriesBackoff {
    fn next_backoff(&mut self) -> Option<Duration> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        Some(self.interval)
    }
}

/// Drives a [`retry_policies::RetryPolicy`], such as
/// [`ExponentialBackoff`](crate::policies::ExponentialBackoff), as a [`Backoff`].
///
///```rust
///     use std::time::Duration;
///     use lazyhttp_retry::{policies::ExponentialBackoff, PolicyBackoff, RetryTransport};
///
///     let policy = ExponentialBackoff::builder()
///         .retry_bounds(Duration::from_millis(100), Duration::from_secs(5))
///         .build_with_max_retries(3);
///
///     let transport = RetryTransport::builder()
///         .with_backoff(move || PolicyBackoff::new(policy.clone()))
///         .build();
///```
#[derive(Debug)]
pub struct PolicyBackoff<P> {
    policy: P,
    started: SystemTime,
    n_past_retries: u32,
}

impl<P: RetryPolicy> PolicyBackoff<P> {
    pub fn new(policy: P) -> Self {
        PolicyBackoff {
            policy,
            started: SystemTime::now(),
            n_past_retries: 0,
        }
    }
}

impl<P: RetryPolicy + Send> Backoff for PolicyBackoff<P> {
    fn next_backoff(&mut self) -> Option<Duration> {
        match self.policy.should_retry(self.started, self.n_past_retries) {
            RetryDecision::Retry { execute_after } => {
                self.n_past_retries += 1;
                // A decision in the past means retry right away.
                Some(
                    execute_after
                        .duration_since(SystemTime::now())
                        .unwrap_or_default(),
                )
            }
            RetryDecision::DoNotRetry => None,
        }
    }
}
