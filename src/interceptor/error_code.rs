use super::{BoxFuture, Interceptor, SendFn};
use crate::{logging, Error, Request, Response, Result};
use std::sync::Arc;
use tracing::Level;

/// Turns every non-2xx response into [`Error::HttpError`].
///
/// Successful responses pass through untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct ErrorCodeInterceptor;

impl Interceptor for ErrorCodeInterceptor {
    fn name(&self) -> &'static str {
        "error-code"
    }

    fn wrap(&self, next: SendFn) -> SendFn {
        Arc::new(move |request: Request| -> BoxFuture<'static, Result<Response>> {
            let attempt = next(request);
            Box::pin(async move {
                let response = attempt.await?;
                let status = response.status;
                if status.is_success() {
                    return Ok(response);
                }

                if status.is_client_error() && logging::enabled(Level::DEBUG) {
                    tracing::debug!(
                        status = status.as_u16(),
                        response = %response.raw_body,
                        "Client error (4xx)"
                    );
                } else if status.is_server_error() && logging::enabled(Level::DEBUG) {
                    tracing::debug!(
                        status = status.as_u16(),
                        response = %response.raw_body,
                        "Server error (5xx)"
                    );
                }

                Err(Error::HttpError {
                    status,
                    response: Box::new(response),
                })
            })
        })
    }
}
