//! Content negotiation.
//!
//! On the way in, [`MimeInterceptor`] picks the request's MIME type, fills in
//! `Content-Type` and `Accept`, and serializes `Json` entities with the
//! matching converter. On the way out it decodes JSON response bodies, both
//! for successful responses and for the response carried by
//! [`Error::HttpError`], including one wrapped in [`Error::MaxRetriesExceeded`].

use super::{BoxFuture, Interceptor, SendFn};
use crate::{Entity, Error, Request, Response, Result};
use http::header::{ACCEPT, CONTENT_TYPE};
use http::HeaderValue;
use serde_json::Value;
use std::sync::Arc;

/// MIME type used when neither the request nor the configuration names one.
pub const DEFAULT_MIME: &str = "text/plain";

const ACCEPT_FALLBACKS: &str = "application/json;q=0.8, text/plain;q=0.5, */*;q=0.2";

/// The content-negotiation interceptor.
#[derive(Debug, Clone, Default)]
pub struct MimeInterceptor {
    mime: Option<Arc<str>>,
}

impl MimeInterceptor {
    /// `mime` is used for requests without a `Content-Type` header.
    pub fn new(mime: Option<String>) -> Self {
        Self {
            mime: mime.map(Arc::from),
        }
    }
}

impl Interceptor for MimeInterceptor {
    fn name(&self) -> &'static str {
        "mime"
    }

    fn wrap(&self, next: SendFn) -> SendFn {
        let mime = self.mime.clone();
        Arc::new(move |request: Request| -> BoxFuture<'static, Result<Response>> {
            let prepared = prepare(request, mime.as_deref());
            let next = next.clone();
            Box::pin(async move {
                match next(prepared?).await {
                    Ok(response) => decode(response),
                    Err(e) => Err(decode_error(e)),
                }
            })
        })
    }
}

fn prepare(mut request: Request, mime: Option<&str>) -> Result<Request> {
    let content_type = request
        .header(CONTENT_TYPE.as_str())
        .or(mime)
        .unwrap_or(DEFAULT_MIME)
        .to_string();

    if !request.headers.contains_key(ACCEPT) {
        let accept = format!("{}, {}", content_type, ACCEPT_FALLBACKS);
        request.headers.insert(ACCEPT, header_value(&accept)?);
    }

    let Some(entity) = request.entity.take() else {
        return Ok(request);
    };

    if !request.headers.contains_key(CONTENT_TYPE) {
        request
            .headers
            .insert(CONTENT_TYPE, header_value(&content_type)?);
    }

    request.entity = Some(match entity {
        Entity::Json(value) => Entity::Text(serialize(&content_type, &value)?),
        text @ Entity::Text(_) => text,
    });
    Ok(request)
}

fn header_value(value: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value).map_err(|_| Error::UnknownMime(value.to_string()))
}

/// The media type without parameters, lowercased: `Application/JSON; charset=utf-8`
/// becomes `application/json`.
pub fn essence(mime: &str) -> String {
    mime.split(';').next().unwrap_or_default().trim().to_ascii_lowercase()
}

/// Returns `true` for `application/json` and any `+json` structured syntax.
pub fn is_json(mime: &str) -> bool {
    let essence = essence(mime);
    essence == "application/json" || essence.ends_with("+json")
}

/// Serializes `value` for the given MIME type.
///
/// # Errors
///
/// Returns [`Error::UnknownMime`] when no converter handles `mime`.
pub fn serialize(mime: &str, value: &Value) -> Result<String> {
    if is_json(mime) {
        return serde_json::to_string(value).map_err(|e| Error::SerializationFailed(e.to_string()));
    }
    match essence(mime).as_str() {
        "text/plain" => Ok(match value {
            Value::String(text) => text.clone(),
            other => other.to_string(),
        }),
        other => Err(Error::UnknownMime(other.to_string())),
    }
}

fn decode(mut response: Response) -> Result<Response> {
    if !has_json_body(&response) {
        return Ok(response);
    }
    match serde_json::from_str(&response.raw_body) {
        Ok(value) => {
            response.entity = Entity::Json(value);
            Ok(response)
        }
        Err(e) => Err(Error::DeserializationFailed {
            raw_response: response.raw_body,
            serde_error: e.to_string(),
            status: response.status,
        }),
    }
}

fn decode_error(error: Error) -> Error {
    match error {
        Error::HttpError { status, response } => Error::HttpError {
            status,
            response: Box::new(decode_lenient(*response)),
        },
        Error::MaxRetriesExceeded {
            attempts,
            last_error,
        } => Error::MaxRetriesExceeded {
            attempts,
            last_error: Box::new(decode_error(*last_error)),
        },
        other => other,
    }
}

// Error bodies are informational; a malformed one stays as text.
fn decode_lenient(mut response: Response) -> Response {
    if has_json_body(&response) {
        if let Ok(value) = serde_json::from_str(&response.raw_body) {
            response.entity = Entity::Json(value);
        }
    }
    response
}

fn has_json_body(response: &Response) -> bool {
    response.content_type().is_some_and(is_json) && !response.raw_body.trim().is_empty()
}
