//! Bounded retry with a recovery action between attempts.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{error, warn};

use crate::config::RetryConfig;

/// Attempt count and spacing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub max_attempts: u32,
    /// Wait between a failed attempt's recovery and the next attempt.
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
        }
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self::new(config.max_attempts, config.delay())
    }
}

/// An operation that can be attempted repeatedly, with a recovery step that
/// runs after every failed attempt that will be retried.
pub trait Recoverable: Send {
    type Output: Send;
    type Error: fmt::Display + Send;

    /// `attempt` is 1-based.
    fn attempt(
        &mut self,
        attempt: u32,
    ) -> impl Future<Output = Result<Self::Output, Self::Error>> + Send;

    fn recover(&mut self, error: &Self::Error) -> impl Future<Output = ()> + Send;
}

#[derive(Debug)]
pub enum RetryError<E> {
    /// Every attempt failed; `last` is the final attempt's error.
    Exhausted { attempts: u32, last: E },
    /// Shutdown was requested while waiting to retry.
    Cancelled { attempts: u32, last: E },
}

impl<E> RetryError<E> {
    pub fn attempts(&self) -> u32 {
        match self {
            RetryError::Exhausted { attempts, .. } | RetryError::Cancelled { attempts, .. } => {
                *attempts
            }
        }
    }

    pub fn last_error(&self) -> &E {
        match self {
            RetryError::Exhausted { last, .. } | RetryError::Cancelled { last, .. } => last,
        }
    }
}

impl<E: fmt::Display> fmt::Display for RetryError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RetryError::Exhausted { attempts, last } => {
                write!(f, "gave up after {attempts} attempts: {last}")
            }
            RetryError::Cancelled { attempts, last } => {
                write!(f, "cancelled after {attempts} attempts: {last}")
            }
        }
    }
}

/// Run `op` up to `policy.max_attempts` times.
///
/// After a failed attempt that will be retried, `op.recover` runs and then
/// the policy delay elapses; cancelling `shutdown` cuts the delay short and
/// ends the loop. Recovery does not run after the final attempt.
pub async fn retry_with_recovery<R: Recoverable>(
    policy: RetryPolicy,
    op: &mut R,
    shutdown: &CancellationToken,
) -> Result<R::Output, RetryError<R::Error>> {
    let mut attempt = 1;
    loop {
        let error = match op.attempt(attempt).await {
            Ok(output) => return Ok(output),
            Err(e) => e,
        };

        if attempt >= policy.max_attempts {
            error!(
                event = "core.refresh.retry_exhausted",
                attempts = attempt,
                error = %error,
            );
            return Err(RetryError::Exhausted {
                attempts: attempt,
                last: error,
            });
        }

        warn!(
            event = "core.refresh.attempt_failed",
            attempt = attempt,
            max_attempts = policy.max_attempts,
            error = %error,
        );
        op.recover(&error).await;

        tokio::select! {
            _ = shutdown.cancelled() => {
                return Err(RetryError::Cancelled { attempts: attempt, last: error });
            }
            _ = tokio::time::sleep(policy.delay) => {}
        }
        attempt += 1;
    }
}
