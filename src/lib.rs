//! # rest-chain - A configurable REST client factory
//!
//! rest-chain turns a small set of options into a callable HTTP client. Each
//! request passes through a chain of interceptors around a `reqwest`
//! transport: content negotiation, optional Hawk signing, base-URL prefixing,
//! retry with exponential backoff, a timeout and mapping of
//! non-2xx statuses to errors.
//!
//! ## Quick Start
//!
//! ```no_run
//! use rest_chain::{create_client, ClientOptions, MimeOptions, Request};
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), rest_chain::Error> {
//!     let client = create_client(
//!         ClientOptions::new("http://localhost:8000/api")
//!             .retry(true)
//!             .timeout_ms(10_000.0)
//!             .mime(MimeOptions::new("application/json")),
//!     )?;
//!
//!     let event = json!({"tags": ["info"], "data": "hello"});
//!     let response = client.call(Request::new("log").with_entity(event)).await?;
//!     println!("Status {} in {:?}", response.status, response.latency);
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Options
//!
//! | key | default | |
//! |---|---|---|
//! | `baseUrl` | required | prefixed to every relative path |
//! | `retry` | `{initial: 100, multiplier: 2, max: 3600000}` | `false` disables, `true` uses the defaults |
//! | `timeout` | `30000` | milliseconds, per attempt and for the whole call; `<= 0` disables |
//! | `mime` | `{}` | `false` disables content negotiation |
//! | `auth.hawk` | unset | `{credentials: {id, key, algorithm}, ext?, sntp?}` |
//! | `logLevel` | `WARN` | process-wide |
//!
//! Options are validated before any client exists:
//!
//! ```
//! use rest_chain::{create_client, ClientOptions};
//!
//! let err = create_client(ClientOptions::default()).unwrap_err();
//! assert_eq!(err.to_string(), "Configuration error: baseUrl is required");
//! ```
//!
//! ## Error Handling
//!
//! Non-2xx responses fail with [`Error::HttpError`], which carries the whole
//! response (with its decoded entity):
//!
//! ```no_run
//! use rest_chain::{create_client, ClientOptions, Error, Request};
//!
//! # async fn example() -> Result<(), Error> {
//! # let client = create_client(ClientOptions::new("http://localhost:8000"))?;
//! match client.call(Request::new("/endpoint")).await {
//!     Ok(response) => println!("Success: {:?}", response.entity),
//!     Err(Error::HttpError { status, response }) => {
//!         eprintln!("HTTP error {}: {}", status, response.raw_body);
//!     }
//!     Err(Error::MaxRetriesExceeded { attempts, last_error }) => {
//!         eprintln!("Gave up after {} attempts: {}", attempts, last_error);
//!     }
//!     Err(e) => eprintln!("Other error: {}", e),
//! }
//! # Ok(())
//! # }
//! ```

mod client;
pub mod config;
mod entity;
mod error;
pub mod interceptor;
pub mod logging;
mod request;
mod response;
pub mod retry;
pub mod transport;

pub use client::{Client, ClientBuilder};
pub use config::{
    resolve, resolve_value, AuthOptions, ClientOptions, HawkCredentials, HawkOptions,
    MimeOptions, MimeSetting, ResolvedConfig, RetryPolicyOptions, RetrySetting,
};
pub use entity::Entity;
pub use error::{Error, Result};
pub use logging::LogLevel;
pub use request::Request;
pub use response::Response;
pub use retry::{RetryPolicy, RetryPredicate};

/// Resolves `options` and builds a client with the default transport.
///
/// # Errors
///
/// Returns [`Error::ConfigurationError`] if the options are invalid.
pub fn create_client(options: ClientOptions) -> Result<Client> {
    let config = resolve(&options)?;
    Client::builder(config).build()
}
