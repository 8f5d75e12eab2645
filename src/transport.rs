//! The base transport: a [`SendFn`] that performs the HTTP exchange with `reqwest`.
//!
//! The transport expects a fully-qualified URL and a body in wire form. It does
//! not judge status codes; a 500 is a successful exchange at this level.

use crate::interceptor::{BoxFuture, SendFn};
use crate::{logging, Entity, Error, Request, Response, Result};
use std::sync::Arc;

/// Wraps `client` as the innermost function of an interceptor chain.
pub fn reqwest_transport(client: reqwest::Client) -> SendFn {
    Arc::new(move |request: Request| -> BoxFuture<'static, Result<Response>> {
        let client = client.clone();
        Box::pin(async move { execute(&client, request).await })
    })
}

async fn execute(client: &reqwest::Client, request: Request) -> Result<Response> {
    let url = request.url()?;
    let method = request.effective_method();

    let body = match request.entity {
        None => None,
        Some(Entity::Text(text)) => Some(text),
        Some(Entity::Json(_)) => {
            return Err(Error::SerializationFailed(
                "entity must be serialized before it reaches the transport".to_string(),
            ))
        }
    };

    if logging::is_debug_enabled() {
        tracing::debug!(
            method = %method,
            url = %url,
            "Executing HTTP request"
        );
    }

    let mut builder = client.request(method, url).headers(request.headers);
    if let Some(body) = body {
        builder = builder.body(body);
    }

    let response = builder.send().await?;

    let status = response.status();
    let headers = response.headers().clone();
    let url = response.url().clone();
    let raw_body = response.text().await?;

    Ok(Response::new(status, headers, raw_body, url))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_json_entity_rejected_before_io() {
        let send = reqwest_transport(reqwest::Client::new());
        // Port 1 is never listened on; reaching the network would fail differently.
        let request = Request::new("http://127.0.0.1:1/log").with_entity(json!({"a": 1}));

        assert!(matches!(
            send(request).await,
            Err(Error::SerializationFailed(_))
        ));
    }

    #[tokio::test]
    async fn test_relative_path_rejected() {
        let send = reqwest_transport(reqwest::Client::new());
        assert!(matches!(
            send(Request::new("log")).await,
            Err(Error::InvalidUrl(_))
        ));
    }
}
