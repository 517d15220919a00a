use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

/// Indicates whether an error should be retried or treated as fatal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDisposition {
    Retry,
    Stop,
}

/// Result of running an operation under the retry policy.
#[derive(Debug)]
pub enum RetryError<E> {
    /// The error was considered fatal and should bubble up immediately.
    Fatal(E),
    /// The error was retryable, but the configured attempts were exhausted.
    AttemptsExceeded(E),
}

impl<E> RetryError<E> {
    pub fn into_inner(self) -> E {
        match self {
            RetryError::Fatal(e) | RetryError::AttemptsExceeded(e) => e,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: usize,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    /// Two attempts in total, one to thirty seconds apart.
    fn default() -> Self {
        Self {
            max_attempts: 2,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: usize, base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
            max_delay: if max_delay.is_zero() {
                base_delay
            } else {
                max_delay
            },
        }
    }

    /// No waiting between attempts.
    pub fn immediate(max_attempts: usize) -> Self {
        Self::new(max_attempts, Duration::ZERO, Duration::ZERO)
    }

    /// Executes the operation with the configured retry policy. `op`
    /// receives the 1-based attempt number.
    pub async fn run<F, Fut, T, E, Classifier>(
        &self,
        op: F,
        classify: Classifier,
    ) -> Result<T, RetryError<E>>
    where
        F: FnMut(usize) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        Classifier: Fn(&E) -> RetryDisposition,
    {
        self.run_until_cancelled(&CancellationToken::new(), op, classify)
            .await
    }

    /// Like [`run`](Self::run), but a cancelled token cuts the backoff
    /// sleep short and surfaces the last error as fatal.
    pub async fn run_until_cancelled<F, Fut, T, E, Classifier>(
        &self,
        cancel: &CancellationToken,
        mut op: F,
        classify: Classifier,
    ) -> Result<T, RetryError<E>>
    where
        F: FnMut(usize) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        Classifier: Fn(&E) -> RetryDisposition,
    {
        let mut attempt = 0;

        loop {
            match op(attempt + 1).await {
                Ok(result) => return Ok(result),
                Err(err) => match classify(&err) {
                    RetryDisposition::Stop => return Err(RetryError::Fatal(err)),
                    RetryDisposition::Retry => {
                        if attempt + 1 >= self.max_attempts {
                            return Err(RetryError::AttemptsExceeded(err));
                        }

                        let delay = self.backoff_delay(attempt);
                        tokio::select! {
                            _ = cancel.cancelled() => return Err(RetryError::Fatal(err)),
                            _ = sleep(delay) => {}
                        }
                        attempt += 1;
                    }
                },
            }
        }
    }

    pub fn backoff_delay(&self, attempt: usize) -> Duration {
        if self.base_delay.is_zero() {
            return Duration::from_millis(0);
        }

        let factor = 1u128 << attempt.min(16);
        let base_ms = self.base_delay.as_millis();
        let delay_ms = base_ms.saturating_mul(factor);
        let capped = delay_ms.min(self.max_delay.as_millis());
        Duration::from_millis(capped as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    };

    #[test]
    fn backoff_doubles_and_caps() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.backoff_delay(0), Duration::from_secs(1));
        assert_eq!(policy.backoff_delay(1), Duration::from_secs(2));
        assert_eq!(policy.backoff_delay(4), Duration::from_secs(16));
        assert_eq!(policy.backoff_delay(5), Duration::from_secs(30));
        assert_eq!(policy.backoff_delay(60), Duration::from_secs(30));
    }

    #[tokio::test]
    async fn retries_until_attempts_exhausted() {
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = calls.clone();
        let result: Result<(), _> = RetryPolicy::immediate(3)
            .run(
                move |attempt| {
                    seen.fetch_add(1, Ordering::SeqCst);
                    async move { Err::<(), _>(attempt) }
                },
                |_| RetryDisposition::Retry,
            )
            .await;

        assert!(matches!(result, Err(RetryError::AttemptsExceeded(3))));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn stop_disposition_is_fatal_on_first_error() {
        let result: Result<(), _> = RetryPolicy::immediate(5)
            .run(|attempt| async move { Err::<(), _>(attempt) }, |_| RetryDisposition::Stop)
            .await;
        assert!(matches!(result, Err(RetryError::Fatal(1))));
    }

    #[tokio::test]
    async fn succeeds_on_later_attempt() {
        let result = RetryPolicy::immediate(2)
            .run(
                |attempt| async move { if attempt == 2 { Ok(attempt) } else { Err("boom") } },
                |_| RetryDisposition::Retry,
            )
            .await;
        assert_eq!(result.unwrap(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_interrupts_backoff() {
        let token = CancellationToken::new();
        token.cancel();
        let policy = RetryPolicy::new(5, Duration::from_secs(60), Duration::from_secs(60));
        let result: Result<(), _> = policy
            .run_until_cancelled(&token, |_| async { Err::<(), _>("down") }, |_| {
                RetryDisposition::Retry
            })
            .await;
        assert!(matches!(result, Err(RetryError::Fatal("down"))));
    }
}
