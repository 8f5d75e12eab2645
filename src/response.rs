//! Response type carried back through the interceptor chain.
//!
//! The transport fills in the status, headers and raw body. Interceptors refine
//! it on the way out: content negotiation decodes the entity, retry records the
//! attempt count and the client records total latency.

use crate::{Entity, Error, Result};
use http::{HeaderMap, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use url::Url;

/// An HTTP response.
///
/// # Examples
///
/// ```no_run
/// use rest_chain::{create_client, ClientOptions, Request};
/// use serde::Deserialize;
///
/// #[derive(Deserialize)]
/// struct Ack {
///     id: u64,
/// }
///
/// # async fn example() -> Result<(), rest_chain::Error> {
/// let client = create_client(ClientOptions::new("http://localhost:8000"))?;
/// let response = client.call(Request::new("/events/1")).await?;
///
/// let ack: Ack = response.json()?;
/// println!("Ack {} after {} attempt(s)", ack.id, response.attempts);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Response {
    /// The HTTP status code.
    pub status: StatusCode,

    /// The response headers.
    pub headers: HeaderMap,

    /// The response body. `Text` as received, or `Json` once decoded by
    /// the content-negotiation interceptor.
    pub entity: Entity,

    /// The raw response body exactly as received.
    pub raw_body: String,

    /// The URL the final attempt was sent to.
    pub url: Url,

    /// The number of attempts made to obtain this response.
    pub attempts: usize,

    /// Time from the client call until this response was produced, including
    /// all retries and backoff delays.
    pub latency: Duration,
}

impl Response {
    /// Creates a response for a single attempt.
    pub fn new(status: StatusCode, headers: HeaderMap, raw_body: String, url: Url) -> Self {
        Self {
            status,
            headers,
            entity: Entity::Text(raw_body.clone()),
            raw_body,
            url,
            attempts: 1,
            latency: Duration::ZERO,
        }
    }

    /// Returns `true` for 2xx statuses.
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Returns `true` if the request required retries.
    pub fn was_retried(&self) -> bool {
        self.attempts > 1
    }

    /// Returns a header value by name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)?.to_str().ok()
    }

    /// Returns the `Content-Type` header, if any.
    pub fn content_type(&self) -> Option<&str> {
        self.header(http::header::CONTENT_TYPE.as_str())
    }

    /// Deserializes the entity into `T`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DeserializationFailed`] if the entity does not match `T`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        self.entity
            .parse()
            .map_err(|e| Error::DeserializationFailed {
                raw_response: self.raw_body.clone(),
                serde_error: e.to_string(),
                status: self.status,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::HeaderValue;
    use serde::Deserialize;

    fn response(status: u16, body: &str) -> Response {
        let mut headers = HeaderMap::new();
        headers.insert("content-type", HeaderValue::from_static("application/json"));
        Response::new(
            StatusCode::from_u16(status).unwrap(),
            headers,
            body.to_string(),
            Url::parse("http://localhost:8000/log").unwrap(),
        )
    }

    #[derive(Debug, Deserialize)]
    struct Ack {
        id: u32,
    }

    #[test]
    fn test_new_response_is_single_attempt_text() {
        let response = response(200, r#"{"id":7}"#);
        assert_eq!(response.attempts, 1);
        assert!(!response.was_retried());
        assert_eq!(response.entity, Entity::Text(r#"{"id":7}"#.to_string()));
        assert_eq!(response.content_type(), Some("application/json"));
    }

    #[test]
    fn test_json_reports_deserialization_failure() {
        let ok = response(200, r#"{"id":7}"#);
        assert_eq!(ok.json::<Ack>().unwrap().id, 7);

        let bad = response(200, "oops");
        match bad.json::<Ack>() {
            Err(Error::DeserializationFailed {
                raw_response,
                status,
                ..
            }) => {
                assert_eq!(raw_response, "oops");
                assert_eq!(status, StatusCode::OK);
            }
            other => panic!("Expected DeserializationFailed, got {:?}", other),
        }
    }
}
