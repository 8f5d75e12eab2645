use super::{BoxFuture, Interceptor, SendFn};
use crate::{logging, Error, Request, Response, Result};
use std::sync::Arc;
use std::time::Duration;
use tracing::Level;

/// Rejects an attempt that takes longer than the configured timeout.
///
/// The inner future is dropped when the deadline passes, cancelling the
/// in-flight request. `None` disables the deadline.
#[derive(Debug, Clone, Copy)]
pub struct TimeoutInterceptor {
    timeout: Option<Duration>,
}

impl TimeoutInterceptor {
    pub fn new(timeout: Option<Duration>) -> Self {
        Self { timeout }
    }
}

impl Interceptor for TimeoutInterceptor {
    fn name(&self) -> &'static str {
        "timeout"
    }

    fn wrap(&self, next: SendFn) -> SendFn {
        let Some(timeout) = self.timeout else {
            return next;
        };

        Arc::new(move |request: Request| -> BoxFuture<'static, Result<Response>> {
            let attempt = next(request);
            Box::pin(async move {
                match tokio::time::timeout(timeout, attempt).await {
                    Ok(result) => result,
                    Err(_) => {
                        if logging::enabled(Level::DEBUG) {
                            tracing::debug!(timeout_ms = timeout.as_millis(), "Request timed out");
                        }
                        Err(Error::Timeout { after: timeout })
                    }
                }
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::{HeaderMap, StatusCode};
    use std::time::Instant;
    use url::Url;

    fn slow(delay: Duration) -> SendFn {
        Arc::new(move |_request: Request| -> BoxFuture<'static, Result<Response>> {
            Box::pin(async move {
                tokio::time::sleep(delay).await;
                Ok(Response::new(
                    StatusCode::OK,
                    HeaderMap::new(),
                    String::new(),
                    Url::parse("http://localhost/").unwrap(),
                ))
            })
        })
    }

    #[tokio::test]
    async fn test_times_out_slow_attempt() {
        let send = TimeoutInterceptor::new(Some(Duration::from_millis(50)))
            .wrap(slow(Duration::from_secs(5)));

        let start = Instant::now();
        let result = send(Request::new("/")).await;

        assert!(matches!(result, Err(Error::Timeout { after }) if after == Duration::from_millis(50)));
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_disabled_timeout_waits() {
        let send = TimeoutInterceptor::new(None).wrap(slow(Duration::from_millis(100)));
        assert!(send(Request::new("/")).await.is_ok());
    }
}
