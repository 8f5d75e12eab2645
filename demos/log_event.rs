//! Sends a log event to a remote logging endpoint.
//!
//! This example shows how to:
//! - Build a client from options, with retry, timeout and JSON content negotiation
//! - Optionally sign requests with Hawk credentials
//! - Inspect the response and the errors a call can end with
//!
//! Run with: `cargo run --example log_event -- http://localhost:8000/api`
//!
//! Set `HAWK_ID` and `HAWK_KEY` to sign requests.

use rest_chain::{
    create_client, ClientOptions, Error, HawkCredentials, HawkOptions, MimeOptions, Request,
    RetryPolicyOptions,
};
use serde_json::json;

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Initialize tracing for logging
    tracing_subscriber::fmt()
        .with_env_filter("rest_chain=debug,log_event=info")
        .init();

    let base_url = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "http://localhost:8000/api".to_string());

    let mut options = ClientOptions::new(base_url)
        .retry(
            RetryPolicyOptions::new()
                .initial(100.0)
                .multiplier(2.0)
                .max(2_000.0)
                .max_retries(5),
        )
        .timeout_ms(5_000.0)
        .mime(MimeOptions::new("application/json"))
        .log_level("DEBUG");

    if let (Ok(id), Ok(key)) = (std::env::var("HAWK_ID"), std::env::var("HAWK_KEY")) {
        options = options.hawk(HawkOptions::new(HawkCredentials::new(id, key, "sha256")));
    }

    let client = create_client(options)?;
    println!("Interceptors: {:?}", client.interceptors());

    let event = json!({
        "tags": ["info", "demo"],
        "data": {"message": "hello from rest-chain"},
    });

    match client.call(Request::new("log").with_entity(event)).await {
        Ok(response) => {
            println!("Status: {}", response.status);
            println!("Entity: {:?}", response.entity);
            println!("Attempts: {}", response.attempts);
            println!("Latency: {:?}", response.latency);
        }
        Err(Error::HttpError { status, response }) => {
            println!("Server rejected the event ({}): {}", status, response.raw_body);
        }
        Err(Error::MaxRetriesExceeded {
            attempts,
            last_error,
        }) => {
            println!("Gave up after {} attempts: {}", attempts, last_error);
        }
        Err(e) => return Err(e),
    }

    Ok(())
}
