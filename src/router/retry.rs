//! Exponential backoff for re-attempting one provider.

use crate::llm::error::ProviderError;
use crate::router::config::ProviderConfig;
use std::future::Future;
use std::ops::ControlFlow;
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
    pub jitter: bool,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
            jitter: false,
        }
    }

    pub fn for_provider(config: &ProviderConfig, jitter: bool) -> Self {
        Self {
            max_retries: config.max_retries,
            base_delay: config.base_delay(),
            jitter,
        }
    }

    /// Delay before retry `attempt` (1-indexed): `base_delay × 2^(attempt−1)`
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        let delay = self.base_delay.saturating_mul(1u32 << exponent);

        if self.jitter {
            let jitter = (rand::random::<f64>() - 0.5) * 0.2;
            delay.mul_f64(1.0 + jitter)
        } else {
            delay
        }
    }

    /// Re-attempt after `first_error` until success, a stop signal, or the budget runs out.
    ///
    /// `attempt` receives the 1-indexed retry number. It returns
    /// `ControlFlow::Break` to finish with a result, or `ControlFlow::Continue`
    /// with the error of a failure that may be retried again. Running out of
    /// retries yields the last error seen.
    pub async fn retry<T, F, Fut>(&self, first_error: ProviderError, mut attempt: F) -> Result<T, ProviderError>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = ControlFlow<Result<T, ProviderError>, ProviderError>>,
    {
        let mut last_error = first_error;

        for retry in 1..=self.max_retries {
            let delay = self.delay_for(retry);
            debug!(
                "Retrying {} ({}/{}) in {:?}",
                last_error.provider, retry, self.max_retries, delay
            );
            tokio::time::sleep(delay).await;

            match attempt(retry).await {
                ControlFlow::Break(result) => return result,
                ControlFlow::Continue(error) => last_error = error,
            }
        }

        Err(last_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::types::ProviderId;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn test_exponential_delays() {
        let policy = RetryPolicy::new(3, Duration::from_millis(100));
        assert_eq!(policy.delay_for(1), Duration::from_millis(100));
        assert_eq!(policy.delay_for(2), Duration::from_millis(200));
        assert_eq!(policy.delay_for(3), Duration::from_millis(400));
    }

    #[test]
    fn test_jitter_stays_within_ten_percent() {
        let policy = RetryPolicy {
            jitter: true,
            ..RetryPolicy::new(3, Duration::from_millis(1000))
        };
        for _ in 0..100 {
            let delay = policy.delay_for(1);
            assert!(delay >= Duration::from_millis(900));
            assert!(delay <= Duration::from_millis(1100));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausted_retries_return_last_error() {
        let policy = RetryPolicy::new(3, Duration::from_millis(100));
        let calls = Arc::new(AtomicU32::new(0));
        let started = tokio::time::Instant::now();

        let result: Result<(), ProviderError> = policy
            .retry(ProviderError::retryable(ProviderId::Groq, "first"), |n| {
                let calls = calls.clone();
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    ControlFlow::Continue(ProviderError::retryable(
                        ProviderId::Groq,
                        format!("retry {}", n),
                    ))
                }
            })
            .await;

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(result.unwrap_err().message, "retry 3");
        // 100 + 200 + 400
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_millis(700));
        assert!(elapsed < Duration::from_millis(750));
    }

    #[tokio::test(start_paused = true)]
    async fn test_break_stops_early() {
        let policy = RetryPolicy::new(5, Duration::from_millis(10));
        let calls = Arc::new(AtomicU32::new(0));

        let result = policy
            .retry(ProviderError::retryable(ProviderId::Mistral, "first"), |n| {
                let calls = calls.clone();
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    if n == 2 {
                        ControlFlow::Break(Ok(n))
                    } else {
                        ControlFlow::Continue(ProviderError::retryable(ProviderId::Mistral, "again"))
                    }
                }
            })
            .await;

        assert_eq!(result.unwrap(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_zero_retries_returns_first_error() {
        let policy = RetryPolicy::new(0, Duration::from_millis(10));
        let result: Result<(), ProviderError> = policy
            .retry(ProviderError::fatal(ProviderId::OpenAi, "original"), |_| async {
                ControlFlow::Break(Ok(()))
            })
            .await;
        assert_eq!(result.unwrap_err().message, "original");
    }
}
