use std::time::Duration;

/// Retry policy for transient store failures: few attempts, exponential
/// backoff capped at 5 seconds. Non-transient errors are returned on the
/// first attempt; everything outside this policy is try-once-per-tick.
#[derive(Clone)]
pub struct RetryPolicy {
    pub max_attempts: usize,
    pub base_backoff: Duration,
    pub max_backoff: Duration,
    pub jitter_max: Option<Duration>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_backoff: Duration::from_millis(250),
            max_backoff: Duration::from_secs(5),
            jitter_max: Some(Duration::from_millis(100)),
        }
    }
}

/// Retry `f` while `is_transient` classifies the error as retryable.
pub async fn retry_transient<F, Fut, T, E, C>(
    policy: RetryPolicy,
    is_transient: C,
    mut f: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, E>>,
    C: Fn(&E) -> bool,
{
    let mut attempts_left = policy.max_attempts;
    let mut backoff = policy.base_backoff;

    loop {
        match f().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                attempts_left = attempts_left.saturating_sub(1);
                if attempts_left == 0 || !is_transient(&err) {
                    return Err(err);
                }

                let wait = match policy.jitter_max {
                    Some(jitter_max) => {
                        let jitter_ms = jitter_max.as_millis() as u64;
                        let extra = if jitter_ms == 0 {
                            0
                        } else {
                            rand::random::<u64>() % (jitter_ms + 1)
                        };
                        backoff + Duration::from_millis(extra)
                    }
                    None => backoff,
                };
                tokio::time::sleep(wait).await;

                backoff = std::cmp::min(backoff * 2, policy.max_backoff);
            }
        }
    }
}

/// Store errors worth a second attempt: connection-level failures, not
/// command rejections.
pub fn is_transient_mongo_error(err: &mongodb::error::Error) -> bool {
    use mongodb::error::ErrorKind;
    matches!(
        *err.kind,
        ErrorKind::Io(_) | ErrorKind::ServerSelection { .. } | ErrorKind::ConnectionPoolCleared { .. }
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn fast_policy() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 3,
            base_backoff: Duration::from_millis(1),
            max_backoff: Duration::from_millis(10),
            jitter_max: None,
        }
    }

    #[tokio::test]
    async fn transient_errors_are_retried_to_success() {
        let counter = AtomicUsize::new(0);

        let res: Result<usize, &'static str> =
            retry_transient(fast_policy(), |_| true, || async {
                let n = counter.fetch_add(1, Ordering::SeqCst);
                if n < 2 {
                    Err("timeout")
                } else {
                    Ok(n)
                }
            })
            .await;

        assert!(res.is_ok());
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn non_transient_errors_fail_immediately() {
        let counter = AtomicUsize::new(0);

        let res: Result<(), &'static str> =
            retry_transient(fast_policy(), |e| *e != "denied", || async {
                counter.fetch_add(1, Ordering::SeqCst);
                Err("denied")
            })
            .await;

        assert!(res.is_err());
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn attempts_are_capped() {
        let counter = AtomicUsize::new(0);

        let res: Result<(), &'static str> =
            retry_transient(fast_policy(), |_| true, || async {
                counter.fetch_add(1, Ordering::SeqCst);
                Err("timeout")
            })
            .await;

        assert!(res.is_err());
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }
}
