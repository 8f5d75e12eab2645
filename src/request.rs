//! The request descriptor passed through the interceptor chain.

use crate::{Entity, Result};
use http::{HeaderMap, HeaderName, HeaderValue, Method};
use url::Url;

/// A single logical request.
///
/// `path` starts out relative to the client's base URL; the path-prefix
/// interceptor rewrites it into a fully-qualified URL before it reaches the
/// transport. Interceptors may rewrite any field.
#[derive(Debug, Clone, Default)]
pub struct Request {
    /// The HTTP method. When unset, `POST` is used if there is an entity and
    /// `GET` otherwise.
    pub method: Option<Method>,

    /// The request path, relative to the base URL or fully-qualified.
    pub path: String,

    /// The request body.
    pub entity: Option<Entity>,

    /// Headers for this request.
    pub headers: HeaderMap,

    /// Query parameters, appended in order.
    pub params: Vec<(String, String)>,
}

impl Request {
    /// Creates a request for `path` with no method, entity or headers.
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Default::default()
        }
    }

    /// Sets the HTTP method.
    pub fn with_method(mut self, method: Method) -> Self {
        self.method = Some(method);
        self
    }

    /// Sets the request body.
    pub fn with_entity(mut self, entity: impl Into<Entity>) -> Self {
        self.entity = Some(entity.into());
        self
    }

    /// Adds a header to the request.
    ///
    /// # Errors
    ///
    /// Returns an error if the header name or value is invalid.
    pub fn with_header(
        mut self,
        name: impl AsRef<str>,
        value: impl AsRef<str>,
    ) -> Result<Self> {
        let name = HeaderName::try_from(name.as_ref())
            .map_err(|e| crate::Error::ConfigurationError(format!("Invalid header name: {}", e)))?;
        let value = HeaderValue::try_from(value.as_ref())
            .map_err(|e| crate::Error::ConfigurationError(format!("Invalid header value: {}", e)))?;
        self.headers.insert(name, value);
        Ok(self)
    }

    /// Adds a query parameter to the request.
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((key.into(), value.into()));
        self
    }

    /// The method that will be sent on the wire.
    pub fn effective_method(&self) -> Method {
        match &self.method {
            Some(method) => method.clone(),
            None if self.entity.is_some() => Method::POST,
            None => Method::GET,
        }
    }

    /// Returns the value of a header, if present and valid UTF-8.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)?.to_str().ok()
    }

    /// The target URL: `path` with the query parameters appended.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::InvalidUrl`] if `path` is not fully-qualified.
    pub fn url(&self) -> Result<Url> {
        build_url(&self.path, &self.params)
    }
}

pub(crate) fn build_url(path: &str, params: &[(String, String)]) -> Result<Url> {
    let mut url = Url::parse(path)?;
    if !params.is_empty() {
        url.query_pairs_mut().extend_pairs(params);
    }
    Ok(url)
}
