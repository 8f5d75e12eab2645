use super::{path_prefix::prefixed, BoxFuture, Interceptor, SendFn};
use crate::config::HawkOptions;
use crate::request::build_url;
use crate::{logging, Error, Request, Response, Result};
use http::header::AUTHORIZATION;
use http::HeaderValue;
use std::sync::Arc;

/// Signs every request with a Hawk `Authorization` header.
///
/// The MAC covers the method, host, port and path (with query) of the final
/// target URL. Relative paths are resolved against the base URL here, so the
/// signature does not depend on where the path-prefix interceptor sits.
#[derive(Clone)]
pub struct HawkInterceptor {
    inner: Arc<Signer>,
}

struct Signer {
    credentials: hawk::Credentials,
    ext: Option<String>,
    prefix: String,
}

impl HawkInterceptor {
    /// Creates a signer from validated options.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigurationError`] for an unsupported algorithm or an
    /// unusable key.
    pub fn new(options: &HawkOptions, prefix: impl Into<String>) -> Result<Self> {
        let algorithm = match options.credentials.algorithm.as_str() {
            "sha256" => hawk::SHA256,
            "sha384" => hawk::SHA384,
            "sha512" => hawk::SHA512,
            other => {
                return Err(Error::ConfigurationError(format!(
                    "unsupported hawk algorithm: {}",
                    other
                )))
            }
        };
        let key = hawk::Key::new(options.credentials.key.as_bytes(), algorithm)
            .map_err(|e| Error::ConfigurationError(format!("invalid hawk key: {}", e)))?;

        if options.sntp == Some(true) && logging::is_debug_enabled() {
            tracing::debug!("hawk sntp requested; signing with the local clock");
        }

        Ok(Self {
            inner: Arc::new(Signer {
                credentials: hawk::Credentials {
                    id: options.credentials.id.clone(),
                    key,
                },
                ext: options.ext.clone(),
                prefix: prefix.into(),
            }),
        })
    }

    /// Computes the `Authorization` header value for `request`.
    pub fn authorization(&self, request: &Request) -> Result<HeaderValue> {
        self.inner.authorization(request)
    }
}

impl Signer {
    fn authorization(&self, request: &Request) -> Result<HeaderValue> {
        let url = build_url(&prefixed(&self.prefix, &request.path), &request.params)?;
        let method = request.effective_method();

        let header = hawk::RequestBuilder::from_url(method.as_str(), &url)
            .map_err(|e| Error::Auth(e.to_string()))?
            .ext(self.ext.as_deref())
            .request()
            .make_header(&self.credentials)
            .map_err(|e| Error::Auth(e.to_string()))?;

        HeaderValue::from_str(&format!("Hawk {}", header)).map_err(|e| Error::Auth(e.to_string()))
    }
}

impl std::fmt::Debug for HawkInterceptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HawkInterceptor")
            .field("id", &self.inner.credentials.id)
            .field("ext", &self.inner.ext)
            .finish_non_exhaustive()
    }
}

impl Interceptor for HawkInterceptor {
    fn name(&self) -> &'static str {
        "hawk-auth"
    }

    fn wrap(&self, next: SendFn) -> SendFn {
        let signer = self.inner.clone();
        Arc::new(move |mut request: Request| -> BoxFuture<'static, Result<Response>> {
            match signer.authorization(&request) {
                Ok(value) => {
                    request.headers.insert(AUTHORIZATION, value);
                    next(request)
                }
                Err(e) => Box::pin(async move { Err(e) }),
            }
        })
    }
}
