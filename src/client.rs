//! The callable REST client and the builder that composes its interceptor chain.
//!
//! A [`Client`] is one [`SendFn`]: the base transport wrapped, outermost
//! first, by content negotiation, Hawk authentication, path prefixing, retry,
//! timeout and error mapping. Which of these are installed is decided once, at
//! build time, from the [`ResolvedConfig`].

use crate::config::{MimeSetting, ResolvedConfig, RetrySetting};
use crate::interceptor::{
    ErrorCodeInterceptor, HawkInterceptor, InterceptorChain, MimeInterceptor,
    PathPrefixInterceptor, RetryInterceptor, SendFn, TimeoutInterceptor,
};
use crate::retry::{RetryOnRetryable, RetryPredicate};
use crate::transport::reqwest_transport;
use crate::{logging, Entity, Request, Response, Result};
use http::Method;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tracing::Level;

/// A configured REST client.
///
/// Cloning is cheap; clones share the chain and the underlying connection
/// pool. Concurrent calls are independent of each other.
///
/// # Examples
///
/// ```no_run
/// use rest_chain::{create_client, ClientOptions, Request, RetryPolicyOptions};
/// use serde_json::json;
///
/// # async fn example() -> Result<(), rest_chain::Error> {
/// let client = create_client(
///     ClientOptions::new("http://localhost:8000/api")
///         .retry(RetryPolicyOptions::new().initial(100.0).multiplier(2.0).max(10_000.0))
///         .timeout_ms(5_000.0)
///         .mime(rest_chain::MimeOptions::new("application/json")),
/// )?;
///
/// let response = client
///     .call(Request::new("log").with_entity(json!({"tags": ["info"], "data": "hello"})))
///     .await?;
/// println!("Logged in {:?} after {} attempt(s)", response.latency, response.attempts);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    send: SendFn,
    interceptors: Vec<&'static str>,
    config: ResolvedConfig,
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("base_url", &self.inner.config.base_url)
            .field("interceptors", &self.inner.interceptors)
            .finish()
    }
}

impl Client {
    /// Creates a `ClientBuilder` for an already-resolved configuration.
    pub fn builder(config: ResolvedConfig) -> ClientBuilder {
        ClientBuilder::new(config)
    }

    /// The configuration this client was built from.
    pub fn config(&self) -> &ResolvedConfig {
        &self.inner.config
    }

    /// Installed interceptor names, outermost first.
    pub fn interceptors(&self) -> &[&'static str] {
        &self.inner.interceptors
    }

    /// The composed chain as a bare function.
    pub fn send_fn(&self) -> SendFn {
        self.inner.send.clone()
    }

    /// Sends one logical request through the chain.
    ///
    /// Resolves once a 2xx response arrives, or fails with the error that
    /// ended the operation: a non-retryable failure, the last failure after
    /// the retry budget ran out, or a failure raised before any I/O.
    pub async fn call(&self, request: Request) -> Result<Response> {
        let start_time = Instant::now();
        let method = request.effective_method();
        let path = request.path.clone();

        let mut response = (self.inner.send)(request).await?;
        response.latency = start_time.elapsed();

        if logging::enabled(Level::INFO) {
            tracing::info!(
                method = %method,
                path = %path,
                status = response.status.as_u16(),
                latency_ms = response.latency.as_millis(),
                attempts = response.attempts,
                "Received HTTP response"
            );
        }

        Ok(response)
    }

    /// Makes a GET request to `path`.
    pub async fn get(&self, path: impl Into<String>) -> Result<Response> {
        self.call(Request::new(path).with_method(Method::GET)).await
    }

    /// Makes a POST request to `path` with `body` as a JSON entity.
    pub async fn post<T: Serialize + ?Sized>(
        &self,
        path: impl Into<String>,
        body: &T,
    ) -> Result<Response> {
        self.send_with_body(Method::POST, path, body).await
    }

    /// Makes a PUT request to `path` with `body` as a JSON entity.
    pub async fn put<T: Serialize + ?Sized>(
        &self,
        path: impl Into<String>,
        body: &T,
    ) -> Result<Response> {
        self.send_with_body(Method::PUT, path, body).await
    }

    /// Makes a PATCH request to `path` with `body` as a JSON entity.
    pub async fn patch<T: Serialize + ?Sized>(
        &self,
        path: impl Into<String>,
        body: &T,
    ) -> Result<Response> {
        self.send_with_body(Method::PATCH, path, body).await
    }

    /// Makes a DELETE request to `path`.
    pub async fn delete(&self, path: impl Into<String>) -> Result<Response> {
        self.call(Request::new(path).with_method(Method::DELETE)).await
    }

    async fn send_with_body<T: Serialize + ?Sized>(
        &self,
        method: Method,
        path: impl Into<String>,
        body: &T,
    ) -> Result<Response> {
        let request = Request::new(path)
            .with_method(method)
            .with_entity(Entity::json(body)?);
        self.call(request).await
    }
}

/// Composes the interceptor chain for a [`ResolvedConfig`].
///
/// # Examples
///
/// ```
/// use rest_chain::{resolve, Client, ClientOptions};
///
/// # fn example() -> Result<(), rest_chain::Error> {
/// let config = resolve(&ClientOptions::new("http://localhost:8000").mime(false))?;
/// let client = Client::builder(config).build()?;
///
/// assert_eq!(
///     client.interceptors(),
///     ["path-prefix", "retry", "timeout", "error-code"]
/// );
/// # Ok(())
/// # }
/// ```
pub struct ClientBuilder {
    config: ResolvedConfig,
    retry_predicate: Option<Arc<dyn RetryPredicate>>,
    transport: Option<SendFn>,
    http_client: Option<reqwest::Client>,
}

impl ClientBuilder {
    pub fn new(config: ResolvedConfig) -> Self {
        Self {
            config,
            retry_predicate: None,
            transport: None,
            http_client: None,
        }
    }

    /// Sets the predicate that decides which failures are retried.
    ///
    /// Defaults to [`RetryOnRetryable`].
    pub fn retry_predicate(mut self, predicate: Box<dyn RetryPredicate>) -> Self {
        self.retry_predicate = Some(Arc::from(predicate));
        self
    }

    /// Replaces the base transport. Takes precedence over [`Self::http_client`].
    pub fn transport(mut self, transport: SendFn) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Uses a preconfigured `reqwest::Client` for the base transport.
    pub fn http_client(mut self, client: reqwest::Client) -> Self {
        self.http_client = Some(client);
        self
    }

    /// The interceptors this configuration installs, outermost first.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::ConfigurationError`] if the Hawk credentials
    /// cannot be turned into a signing key.
    pub fn interceptor_chain(&self) -> Result<InterceptorChain> {
        let config = &self.config;
        let mut chain = InterceptorChain::new();

        if let MimeSetting::Enabled(mime) = &config.mime {
            chain.push(Arc::new(MimeInterceptor::new(mime.mime.clone())));
        }

        if let Some(hawk) = config.hawk() {
            if logging::is_debug_enabled() {
                tracing::debug!(id = %hawk.credentials.id, "chaining hawk-auth interceptor");
            }
            chain.push(Arc::new(HawkInterceptor::new(hawk, config.base_url.clone())?));
        }

        chain.push(Arc::new(PathPrefixInterceptor::new(config.base_url.clone())));

        if let RetrySetting::Enabled(policy) = &config.retry {
            let predicate = self
                .retry_predicate
                .clone()
                .unwrap_or_else(|| Arc::new(RetryOnRetryable));
            // The timeout also bounds the retrying operation as a whole.
            chain.push(Arc::new(
                RetryInterceptor::new(policy.clone(), predicate).with_deadline(config.timeout()),
            ));
        }

        chain.push(Arc::new(TimeoutInterceptor::new(config.timeout())));
        chain.push(Arc::new(ErrorCodeInterceptor));

        Ok(chain)
    }

    /// Builds the client.
    ///
    /// # Errors
    ///
    /// See [`Self::interceptor_chain`].
    pub fn build(self) -> Result<Client> {
        let chain = self.interceptor_chain()?;
        let interceptors = chain.names();

        let transport = match (self.transport, self.http_client) {
            (Some(transport), _) => transport,
            (None, Some(client)) => reqwest_transport(client),
            (None, None) => reqwest_transport(reqwest::Client::new()),
        };

        if logging::is_debug_enabled() {
            tracing::debug!(
                base_url = %self.config.base_url,
                interceptors = ?interceptors,
                "Built REST client"
            );
        }

        Ok(Client {
            inner: Arc::new(ClientInner {
                send: chain.wrap(transport),
                interceptors,
                config: self.config,
            }),
        })
    }
}
