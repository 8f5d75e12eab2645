//! Interceptors layered around the transport.
//!
//! A client is a single [`SendFn`]. Each interceptor takes the function it
//! wraps (`next`) and returns a new one with the same signature, so the chain
//! is built by folding interceptors over the base transport. Requests flow
//! outermost to innermost; responses and errors flow back the other way.
//!
//! The client installs, outermost first:
//!
//! | name | interceptor | installed |
//! |---|---|---|
//! | `mime` | [`MimeInterceptor`] | unless `mime` is `false` |
//! | `hawk-auth` | [`HawkInterceptor`] | when `auth.hawk` is set |
//! | `path-prefix` | [`PathPrefixInterceptor`] | always |
//! | `retry` | [`RetryInterceptor`] | unless `retry` is `false` |
//! | `timeout` | [`TimeoutInterceptor`] | always |
//! | `error-code` | [`ErrorCodeInterceptor`] | always |

mod error_code;
mod hawk;
pub mod mime;
mod path_prefix;
mod retry;
mod timeout;

pub use error_code::ErrorCodeInterceptor;
pub use hawk::HawkInterceptor;
pub use mime::MimeInterceptor;
pub use path_prefix::{prefixed, PathPrefixInterceptor};
pub use retry::RetryInterceptor;
pub use timeout::TimeoutInterceptor;

use crate::{Request, Response, Result};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// Type alias for a boxed future returning a result.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// The signature shared by the transport, every interceptor and the client.
pub type SendFn = Arc<dyn Fn(Request) -> BoxFuture<'static, Result<Response>> + Send + Sync>;

/// A request/response transform layered around a [`SendFn`].
pub trait Interceptor: Send + Sync {
    /// Short name used for introspection and logging.
    fn name(&self) -> &'static str;

    /// Wraps `next`, returning a function with the same signature.
    fn wrap(&self, next: SendFn) -> SendFn;
}

/// Wraps `transport` with a single interceptor.
pub fn chain(transport: SendFn, interceptor: &dyn Interceptor) -> SendFn {
    interceptor.wrap(transport)
}

/// An ordered list of interceptors, outermost first.
#[derive(Clone, Default)]
pub struct InterceptorChain {
    interceptors: Vec<Arc<dyn Interceptor>>,
}

impl std::fmt::Debug for InterceptorChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InterceptorChain")
            .field("interceptors", &self.names())
            .finish()
    }
}

impl InterceptorChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an interceptor. It will sit inside every interceptor pushed before it.
    pub fn push(&mut self, interceptor: Arc<dyn Interceptor>) {
        self.interceptors.push(interceptor);
    }

    pub fn is_empty(&self) -> bool {
        self.interceptors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.interceptors.len()
    }

    /// Interceptor names, outermost first.
    pub fn names(&self) -> Vec<&'static str> {
        self.interceptors.iter().map(|i| i.name()).collect()
    }

    /// Wraps `transport` with every interceptor in the chain.
    ///
    /// Interceptors are applied in reverse order so that the first one pushed
    /// is the first to see a request.
    pub fn wrap(&self, transport: SendFn) -> SendFn {
        self.interceptors
            .iter()
            .rev()
            .fold(transport, |next, interceptor| chain(next, interceptor.as_ref()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::{HeaderMap, HeaderValue, StatusCode};
    use std::sync::Mutex;
    use url::Url;

    /// Appends its tag to the `x-trace` header on the way in.
    struct Tag(&'static str);

    impl Interceptor for Tag {
        fn name(&self) -> &'static str {
            self.0
        }

        fn wrap(&self, next: SendFn) -> SendFn {
            let tag = self.0;
            Arc::new(move |mut request: Request| {
                let trace = match request.header("x-trace") {
                    Some(existing) => format!("{},{}", existing, tag),
                    None => tag.to_string(),
                };
                request
                    .headers
                    .insert("x-trace", HeaderValue::from_str(&trace).unwrap());
                next(request)
            })
        }
    }

    #[tokio::test]
    async fn test_first_pushed_sees_request_first() {
        let seen = Arc::new(Mutex::new(None));
        let seen_clone = seen.clone();
        let transport: SendFn = Arc::new(move |request: Request| -> BoxFuture<'static, Result<Response>> {
            *seen_clone.lock().unwrap() = request.header("x-trace").map(str::to_string);
            Box::pin(async move {
                Ok(Response::new(
                    StatusCode::OK,
                    HeaderMap::new(),
                    String::new(),
                    Url::parse("http://localhost/").unwrap(),
                ))
            })
        });

        let mut chain = InterceptorChain::new();
        chain.push(Arc::new(Tag("outer")));
        chain.push(Arc::new(Tag("inner")));
        assert_eq!(chain.names(), vec!["outer", "inner"]);
        assert_eq!(chain.len(), 2);

        let send = chain.wrap(transport);
        send(Request::new("/")).await.unwrap();

        assert_eq!(seen.lock().unwrap().as_deref(), Some("outer,inner"));
    }
}
