use super::{BoxFuture, Interceptor, SendFn};
use crate::retry::{RetryPolicy, RetryPredicate};
use crate::{logging, Error, Request, Response, Result};
use std::sync::Arc;
use std::time::Duration;
use tracing::Level;

/// Re-drives the inner chain after a retryable failure, with exponential backoff.
///
/// Each attempt gets a fresh copy of the request, so interceptors inside this
/// one (timeout, error mapping) run once per attempt. An optional deadline
/// bounds the whole operation, backoff delays included.
#[derive(Clone)]
pub struct RetryInterceptor {
    policy: RetryPolicy,
    predicate: Arc<dyn RetryPredicate>,
    deadline: Option<Duration>,
}

impl RetryInterceptor {
    /// Creates a retry interceptor with no overall deadline.
    pub fn new(policy: RetryPolicy, predicate: Arc<dyn RetryPredicate>) -> Self {
        Self {
            policy,
            predicate,
            deadline: None,
        }
    }

    /// Fails the whole operation with [`Error::Timeout`] once `deadline`
    /// passes. `None` lets it run until success or until the retry budget runs out.
    pub fn with_deadline(mut self, deadline: Option<Duration>) -> Self {
        self.deadline = deadline;
        self
    }
}

impl std::fmt::Debug for RetryInterceptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetryInterceptor")
            .field("policy", &self.policy)
            .field("deadline", &self.deadline)
            .finish_non_exhaustive()
    }
}

impl Interceptor for RetryInterceptor {
    fn name(&self) -> &'static str {
        "retry"
    }

    fn wrap(&self, next: SendFn) -> SendFn {
        let policy = self.policy.clone();
        let predicate = self.predicate.clone();
        let deadline = self.deadline;
        Arc::new(move |request: Request| -> BoxFuture<'static, Result<Response>> {
            let attempts = retry_loop(next.clone(), policy.clone(), predicate.clone(), request);
            Box::pin(async move {
                let Some(deadline) = deadline else {
                    return attempts.await;
                };
                match tokio::time::timeout(deadline, attempts).await {
                    Ok(result) => result,
                    Err(_) => {
                        if logging::enabled(Level::DEBUG) {
                            tracing::debug!(
                                timeout_ms = deadline.as_millis(),
                                "Retrying request timed out"
                            );
                        }
                        Err(Error::Timeout { after: deadline })
                    }
                }
            })
        })
    }
}

async fn retry_loop(
    next: SendFn,
    policy: RetryPolicy,
    predicate: Arc<dyn RetryPredicate>,
    request: Request,
) -> Result<Response> {
    let mut attempt = 0;
    loop {
        attempt += 1;

        let error = match next(request.clone()).await {
            Ok(mut response) => {
                response.attempts = attempt;
                return Ok(response);
            }
            Err(e) => e,
        };

        if logging::enabled(Level::WARN) {
            tracing::warn!(
                error = %error,
                attempt = attempt,
                path = %request.path,
                "Request failed"
            );
        }

        if !predicate.should_retry(&error, attempt) {
            return Err(error);
        }

        let Some(delay) = policy.delay_for_attempt(attempt) else {
            return Err(Error::MaxRetriesExceeded {
                attempts: attempt,
                last_error: Box::new(error),
            });
        };

        if logging::is_debug_enabled() {
            tracing::debug!(
                delay_ms = delay.as_millis(),
                attempt = attempt,
                "Retrying request after delay"
            );
        }
        tokio::time::sleep(delay).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retry::RetryOnRetryable;
    use http::{HeaderMap, StatusCode};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Instant;
    use url::Url;

    fn policy(max_retries: Option<usize>) -> RetryPolicy {
        RetryPolicy {
            initial: Duration::from_millis(1),
            multiplier: 2.0,
            max: Duration::from_millis(2),
            max_retries,
        }
    }

    /// Fails with `failure` for the first `failures` calls, then succeeds.
    fn flaky(failures: usize, failure: fn() -> Error) -> (SendFn, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_clone = calls.clone();
        let send: SendFn = Arc::new(move |_request: Request| -> BoxFuture<'static, Result<Response>> {
            let count = calls_clone.fetch_add(1, Ordering::SeqCst);
            Box::pin(async move {
                if count < failures {
                    Err(failure())
                } else {
                    Ok(Response::new(
                        StatusCode::OK,
                        HeaderMap::new(),
                        String::new(),
                        Url::parse("http://localhost/").unwrap(),
                    ))
                }
            })
        });
        (send, calls)
    }

    fn timeout() -> Error {
        Error::Timeout {
            after: Duration::from_millis(10),
        }
    }

    fn bad_request() -> Error {
        Error::ConfigurationError("not retryable".into())
    }

    #[tokio::test]
    async fn test_retries_until_success() {
        let (transport, calls) = flaky(3, timeout);
        let send = RetryInterceptor::new(policy(None), Arc::new(RetryOnRetryable)).wrap(transport);

        let response = send(Request::new("/")).await.unwrap();

        assert_eq!(response.attempts, 4);
        assert!(response.was_retried());
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_non_retryable_fails_first_attempt() {
        let (transport, calls) = flaky(5, bad_request);
        let send = RetryInterceptor::new(policy(None), Arc::new(RetryOnRetryable)).wrap(transport);

        let result = send(Request::new("/")).await;

        assert!(matches!(result, Err(Error::ConfigurationError(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_max_retries_exceeded() {
        let (transport, calls) = flaky(usize::MAX, timeout);
        let send =
            RetryInterceptor::new(policy(Some(2)), Arc::new(RetryOnRetryable)).wrap(transport);

        match send(Request::new("/")).await {
            Err(Error::MaxRetriesExceeded {
                attempts,
                last_error,
            }) => {
                // 1 initial attempt + 2 retries
                assert_eq!(attempts, 3);
                assert!(matches!(*last_error, Error::Timeout { .. }));
            }
            other => panic!("Expected MaxRetriesExceeded, got {:?}", other),
        }
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_deadline_bounds_unlimited_retries() {
        let (transport, calls) = flaky(usize::MAX, timeout);
        let send = RetryInterceptor::new(policy(None), Arc::new(RetryOnRetryable))
            .with_deadline(Some(Duration::from_millis(50)))
            .wrap(transport);

        let start = Instant::now();
        let result = send(Request::new("/")).await;

        assert!(matches!(result, Err(Error::Timeout { after }) if after == Duration::from_millis(50)));
        assert!(start.elapsed() < Duration::from_secs(1));
        assert!(calls.load(Ordering::SeqCst) > 1);
    }

    #[tokio::test]
    async fn test_deadline_does_not_affect_fast_success() {
        let (transport, _) = flaky(2, timeout);
        let send = RetryInterceptor::new(policy(None), Arc::new(RetryOnRetryable))
            .with_deadline(Some(Duration::from_secs(5)))
            .wrap(transport);

        let response = send(Request::new("/")).await.unwrap();
        assert_eq!(response.attempts, 3);
    }
}
