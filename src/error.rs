//! Error types for configuration and requests.
//!
//! Configuration errors come back from [`crate::resolve`] and client
//! construction, before any request exists. Every other variant is a request
//! error, delivered through the future returned by [`crate::Client::call`].

use crate::Response;
use http::StatusCode;
use std::time::Duration;

/// The error type for this crate.
///
/// # Examples
///
/// ```no_run
/// use rest_chain::{create_client, ClientOptions, Error, Request};
///
/// # async fn example() -> Result<(), Error> {
/// let client = create_client(ClientOptions::new("http://localhost:8000"))?;
///
/// match client.call(Request::new("/log").with_entity("{}")).await {
///     Ok(response) => println!("Logged: {}", response.status),
///     Err(Error::HttpError { status, response }) => {
///         eprintln!("HTTP error {}: {}", status, response.raw_body);
///     }
///     Err(e) => eprintln!("Other error: {}", e),
/// }
/// # Ok(())
/// # }
/// ```
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// A network-level error occurred (connection refused, DNS failure, etc.).
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// An attempt did not complete within the configured timeout.
    #[error("Request timed out after {after:?}")]
    Timeout {
        /// The timeout that elapsed.
        after: Duration,
    },

    /// A response body could not be decoded.
    ///
    /// Preserves the raw body and the serde message for debugging.
    #[error("Failed to deserialize response (status {status}): {serde_error}")]
    DeserializationFailed {
        /// The raw response body that failed to deserialize
        raw_response: String,
        /// The serde error message
        serde_error: String,
        /// The HTTP status code
        status: StatusCode,
    },

    /// The server returned a non-2xx status.
    ///
    /// Carries the complete response so callers can inspect the entity.
    #[error("HTTP error {status}: {}", .response.raw_body)]
    HttpError {
        /// The HTTP status code
        status: StatusCode,
        /// The full response
        response: Box<Response>,
    },

    /// The options were rejected.
    ///
    /// Raised before any client exists; never retried.
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// The retry budget was exhausted.
    #[error("Max retries exceeded after {attempts} attempts: {last_error}")]
    MaxRetriesExceeded {
        /// The number of attempts made
        attempts: usize,
        /// The error from the final attempt
        last_error: Box<Error>,
    },

    /// The request entity could not be serialized.
    #[error("Failed to serialize request: {0}")]
    SerializationFailed(String),

    /// No converter is registered for the request's MIME type.
    #[error("Unknown MIME type: {0}")]
    UnknownMime(String),

    /// The authentication header could not be computed.
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// The request target is not a valid URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl Error {
    /// Returns `true` if this error is potentially retryable.
    ///
    /// Network errors, timeouts, 5xx and 429 responses are retryable.
    ///
    /// # Examples
    ///
    /// ```
    /// use rest_chain::Error;
    /// use std::time::Duration;
    ///
    /// assert!(Error::Timeout { after: Duration::from_millis(100) }.is_retryable());
    /// assert!(!Error::ConfigurationError("baseUrl is required".into()).is_retryable());
    /// ```
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Network(_) => true,
            Error::Timeout { .. } => true,
            Error::HttpError { status, .. } => {
                status.is_server_error() || *status == StatusCode::TOO_MANY_REQUESTS
            }
            Error::DeserializationFailed { .. }
            | Error::ConfigurationError(_)
            | Error::MaxRetriesExceeded { .. }
            | Error::SerializationFailed(_)
            | Error::UnknownMime(_)
            | Error::Auth(_)
            | Error::InvalidUrl(_) => false,
        }
    }

    /// Returns `true` for errors raised while validating options.
    pub fn is_configuration_error(&self) -> bool {
        matches!(self, Error::ConfigurationError(_))
    }

    /// Returns the HTTP status code if this error has one.
    ///
    /// Looks through [`Error::MaxRetriesExceeded`] to the final attempt.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Error::HttpError { status, .. } => Some(*status),
            Error::DeserializationFailed { status, .. } => Some(*status),
            Error::MaxRetriesExceeded { last_error, .. } => last_error.status(),
            _ => None,
        }
    }

    /// Returns the response behind an [`Error::HttpError`], if any.
    pub fn response(&self) -> Option<&Response> {
        match self {
            Error::HttpError { response, .. } => Some(response),
            Error::MaxRetriesExceeded { last_error, .. } => last_error.response(),
            _ => None,
        }
    }

    /// Returns the raw response body if this error has one.
    pub fn raw_response(&self) -> Option<&str> {
        match self {
            Error::HttpError { response, .. } => Some(&response.raw_body),
            Error::DeserializationFailed { raw_response, .. } => Some(raw_response),
            Error::MaxRetriesExceeded { last_error, .. } => last_error.raw_response(),
            _ => None,
        }
    }
}

/// A specialized `Result` type for this crate.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;
    use http::HeaderMap;
    use url::Url;

    fn http_error(status: u16, body: &str) -> Error {
        let status = StatusCode::from_u16(status).unwrap();
        Error::HttpError {
            status,
            response: Box::new(Response::new(
                status,
                HeaderMap::new(),
                body.to_string(),
                Url::parse("http://localhost:8000/log").unwrap(),
            )),
        }
    }

    #[test]
    fn test_retryable_statuses() {
        assert!(http_error(500, "").is_retryable());
        assert!(http_error(503, "").is_retryable());
        assert!(http_error(429, "").is_retryable());
        assert!(!http_error(401, "").is_retryable());
        assert!(!http_error(404, "").is_retryable());
    }

    #[test]
    fn test_accessors_see_through_max_retries() {
        let err = Error::MaxRetriesExceeded {
            attempts: 3,
            last_error: Box::new(http_error(503, "unavailable")),
        };
        assert_eq!(err.status(), Some(StatusCode::SERVICE_UNAVAILABLE));
        assert_eq!(err.raw_response(), Some("unavailable"));
        assert!(err.response().is_some());
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_configuration_error_classification() {
        assert!(Error::ConfigurationError("baseUrl is required".into()).is_configuration_error());
        assert!(!http_error(400, "").is_configuration_error());
    }
}
