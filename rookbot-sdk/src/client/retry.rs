//! Retry policies.
//!
//! A [`RetryPolicy`] bundles a classifier (which errors are worth another
//! attempt), a backoff shape and a wall-clock budget. Policies compose by
//! sequential application: the inner [`retry`] call only ever surfaces the
//! errors its own policy gives up on, and the outer policy classifies those.
//!
//! ```ignore
//! retry(&server, || retry(&transport, || attempt())).await
//! ```

use std::future::Future;
use std::time::Duration;

use rand::Rng;
use tokio::time::Instant;
use tracing::{debug, warn};

use super::ClientError;

/// Delay shape between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    /// The same delay before every retry.
    Constant(Duration),
    /// `base * 2^attempt`, optionally capped.
    Exponential {
        base: Duration,
        ceiling: Option<Duration>,
    },
}

impl Backoff {
    /// Delay before retry number `attempt` (zero-based), without jitter.
    pub fn delay(&self, attempt: u32) -> Duration {
        match *self {
            Backoff::Constant(interval) => interval,
            Backoff::Exponential { base, ceiling } => {
                let delay = base.saturating_mul(2u32.saturating_pow(attempt));
                match ceiling {
                    Some(ceiling) => delay.min(ceiling),
                    None => delay,
                }
            }
        }
    }
}

/// Spread `delay` over `[delay / 2, delay]`.
pub fn jittered(delay: Duration) -> Duration {
    let half = delay / 2;
    half + half.mul_f64(rand::rng().random::<f64>())
}

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Name used in log lines.
    pub name: &'static str,
    pub backoff: Backoff,
    /// Give up once this much time has passed since the first attempt.
    pub max_elapsed: Duration,
    pub jitter: bool,
    /// Returns `true` for errors that may succeed on a later attempt.
    pub retryable: fn(&ClientError) -> bool,
}

impl RetryPolicy {
    /// Connection-level failures: retry quickly at a constant interval.
    pub fn transport() -> Self {
        Self {
            name: "transport",
            backoff: Backoff::Constant(Duration::from_millis(100)),
            max_elapsed: Duration::from_secs(60),
            jitter: false,
            retryable: ClientError::is_transport,
        }
    }

    /// 5xx responses: back off exponentially to give the server room.
    pub fn server() -> Self {
        Self {
            name: "server",
            backoff: Backoff::Exponential {
                base: Duration::from_secs(1),
                ceiling: None,
            },
            max_elapsed: Duration::from_secs(300),
            jitter: false,
            retryable: ClientError::is_server_error,
        }
    }

    pub fn with_backoff(mut self, backoff: Backoff) -> Self {
        self.backoff = backoff;
        self
    }

    pub fn with_max_elapsed(mut self, max_elapsed: Duration) -> Self {
        self.max_elapsed = max_elapsed;
        self
    }

    fn next_delay(&self, attempt: u32) -> Duration {
        let delay = self.backoff.delay(attempt);
        if self.jitter { jittered(delay) } else { delay }
    }
}

/// Run `op` until it succeeds, fails with an error `policy` does not retry,
/// or the policy's time budget runs out.
///
/// A sleep never extends past the budget, so the last attempt happens at
/// the deadline at the latest.
pub async fn retry<T, F, Fut>(policy: &RetryPolicy, mut op: F) -> Result<T, ClientError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ClientError>>,
{
    let started = Instant::now();
    let mut attempt = 0u32;
    loop {
        let err = match op().await {
            Ok(value) => return Ok(value),
            Err(err) if !(policy.retryable)(&err) => return Err(err),
            Err(err) => err,
        };

        let elapsed = started.elapsed();
        if elapsed >= policy.max_elapsed {
            warn!(
                policy = policy.name,
                attempts = attempt + 1,
                elapsed_ms = elapsed.as_millis() as u64,
                error = %err,
                "Giving up after retry budget was exhausted"
            );
            return Err(err);
        }

        let delay = policy.next_delay(attempt).min(policy.max_elapsed - elapsed);
        debug!(
            policy = policy.name,
            attempt = attempt + 1,
            delay_ms = delay.as_millis() as u64,
            error = %err,
            "Retrying request"
        );
        tokio::time::sleep(delay).await;
        attempt = attempt.saturating_add(1);
    }
}
