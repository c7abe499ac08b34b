//! Retry policy for mutating driver calls.
//!
//! The default policy retries once, immediately. Backoff doubles after every
//! failed attempt and is capped at `max_backoff`.

use std::{future::Future, time::Duration};
use serde::{Deserialize, Serialize};

use crate::{config::duration_ms, error::FacadeResult};


#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Number of attempts made after the first one fails.
    pub max_retries: u32,
    /// Delay before the first retry.
    #[serde(with = "duration_ms")]
    pub initial_backoff: Duration,
    /// Upper bound for any single delay.
    #[serde(with = "duration_ms")]
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 1,
            initial_backoff: Duration::ZERO,
            max_backoff: Duration::ZERO,
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries.
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_backoff(mut self, initial: Duration, max: Duration) -> Self {
        self.initial_backoff = initial;
        self.max_backoff = max;
        self
    }

    /// Delay to wait before retry number `retry` (1-based).
    pub fn backoff_for(&self, retry: u32) -> Duration {
        if self.initial_backoff.is_zero() || retry == 0 {
            return Duration::ZERO;
        }

        let factor = 2u32.saturating_pow(retry - 1);

        self.initial_backoff
            .checked_mul(factor)
            .unwrap_or(self.max_backoff)
            .min(self.max_backoff)
    }

    /// Runs `attempt` until it succeeds or the retries are exhausted, returning
    /// the last error in the latter case.
    pub async fn run<T, F, Fut>(&self, operation: &str, mut attempt: F) -> FacadeResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = FacadeResult<T>>,
    {
        let mut retry = 0;

        loop {
            match attempt().await {
                Ok(value) => return Ok(value),
                Err(err) if retry < self.max_retries => {
                    retry += 1;
                    tracing::warn!(operation, attempt = retry, error = %err, "driver call failed, retrying");

                    let delay = self.backoff_for(retry);
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                }
                Err(err) => return Err(err),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FacadeError;

    #[test]
    fn default_policy_retries_once_without_delay() {
        let policy = RetryPolicy::default();

        assert_eq!(policy.max_retries, 1);
        assert_eq!(policy.backoff_for(1), Duration::ZERO);
    }

    #[test]
    fn backoff_doubles_and_caps() {
        let policy = RetryPolicy::default()
            .with_max_retries(5)
            .with_backoff(Duration::from_millis(10), Duration::from_millis(35));

        assert_eq!(policy.backoff_for(1), Duration::from_millis(10));
        assert_eq!(policy.backoff_for(2), Duration::from_millis(20));
        assert_eq!(policy.backoff_for(3), Duration::from_millis(35));
        assert_eq!(policy.backoff_for(40), Duration::from_millis(35));
    }

    #[tokio::test]
    async fn run_succeeds_after_transient_failure() {
        let mut calls = 0;
        let result = RetryPolicy::default()
            .run("insert_one", || {
                calls += 1;
                let current = calls;
                async move {
                    if current == 1 {
                        Err(FacadeError::Driver("transient".into()))
                    } else {
                        Ok(current)
                    }
                }
            })
            .await;

        assert_eq!(result, Ok(2));
    }

    #[tokio::test]
    async fn run_returns_last_error_when_exhausted() {
        let mut calls = 0;
        let result: FacadeResult<()> = RetryPolicy::default()
            .with_max_retries(2)
            .run("delete_one", || {
                calls += 1;
                let current = calls;
                async move { Err(FacadeError::Driver(format!("failure {}", current))) }
            })
            .await;

        assert_eq!(result, Err(FacadeError::Driver("failure 3".into())));
        assert_eq!(calls, 3);
    }

    #[tokio::test]
    async fn none_policy_makes_a_single_attempt() {
        let mut calls = 0;
        let result: FacadeResult<()> = RetryPolicy::none()
            .run("replace_one", || {
                calls += 1;
                async { Err(FacadeError::Driver("down".into())) }
            })
            .await;

        assert!(result.is_err());
        assert_eq!(calls, 1);
    }
}
