//! Integration tests using wiremock to simulate HTTP servers.

use rest_chain::{
    create_client, ClientOptions, Entity, Error, HawkCredentials, HawkOptions, MimeOptions,
    Request, RetryPolicyOptions,
};
use serde_json::json;
use std::str::FromStr;
use std::time::{Duration, Instant};
use wiremock::matchers::{body_json, body_string, header, method, path};
use wiremock::{Mock, MockServer, Respond, ResponseTemplate};

const HAWK_ID: &str = "dh37fgj492je";
const HAWK_KEY: &str = "werxhqb98rpaxn39848xrunpaw3489ruxnpa98w4rxn";

fn fast_retry() -> RetryPolicyOptions {
    RetryPolicyOptions::new().initial(1.0).multiplier(2.0).max(2.0)
}

fn event() -> serde_json::Value {
    json!({"tags": ["info"], "data": "hello"})
}

#[tokio::test]
async fn test_post_event() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/log"))
        .and(header("content-type", "application/json"))
        .and(body_json(event()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"logged": true})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = create_client(
        ClientOptions::new(format!("{}/api/", mock_server.uri()))
            .mime(MimeOptions::new("application/json")),
    )
    .unwrap();

    let response = client
        .call(Request::new("log").with_entity(event()))
        .await
        .unwrap();

    assert_eq!(response.status.as_u16(), 200);
    assert_eq!(response.entity, Entity::Json(json!({"logged": true})));
    assert_eq!(response.attempts, 1);
    assert!(!response.was_retried());
}

#[tokio::test]
async fn test_mime_disabled_sends_string_entity() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/log"))
        .and(body_string(r#"{"tags":["info"],"data":"hello"}"#))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = create_client(ClientOptions::new(mock_server.uri()).mime(false)).unwrap();

    let response = client
        .call(Request::new("/log").with_entity(event().to_string()))
        .await
        .unwrap();

    assert_eq!(response.status.as_u16(), 200);
}

#[tokio::test]
async fn test_mime_disabled_rejects_structured_entity() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let client = create_client(ClientOptions::new(mock_server.uri()).mime(false)).unwrap();

    let result = client.call(Request::new("/log").with_entity(event())).await;

    assert!(matches!(result, Err(Error::SerializationFailed(_))));
}

#[tokio::test]
async fn test_retry_disabled_fails_on_first_attempt() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(503).set_body_string("Service Unavailable"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = create_client(ClientOptions::new(mock_server.uri()).retry(false)).unwrap();

    match client.get("/flaky").await {
        Err(Error::HttpError { status, response }) => {
            assert_eq!(status.as_u16(), 503);
            assert_eq!(response.raw_body, "Service Unavailable");
        }
        other => panic!("Expected HttpError, got {:?}", other),
    }
}

#[tokio::test]
async fn test_retry_true_uses_default_policy() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/ok"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&mock_server)
        .await;

    let client = create_client(ClientOptions::new(mock_server.uri()).retry(true)).unwrap();

    let response = client.get("/ok").await.unwrap();
    assert_eq!(response.status.as_u16(), 204);
}

#[tokio::test]
async fn test_retry_recovers_after_server_errors() {
    let mock_server = MockServer::start().await;

    // First two calls fail, third succeeds
    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .mount(&mock_server)
        .await;

    let client = create_client(ClientOptions::new(mock_server.uri()).retry(fast_retry())).unwrap();

    let response = client.get("/flaky").await.unwrap();

    assert_eq!(response.attempts, 3);
    assert!(response.was_retried());
    assert_eq!(response.entity, Entity::Json(json!({"ok": true})));
}

#[tokio::test]
async fn test_concurrent_requests_are_independent() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/log"))
        .respond_with(ResponseTemplate::new(200))
        .expect(10)
        .mount(&mock_server)
        .await;

    let client = create_client(
        ClientOptions::new(mock_server.uri())
            .retry(fast_retry())
            .timeout_ms(100.0),
    )
    .unwrap();

    let handles: Vec<_> = (0..10)
        .map(|i| {
            let client = client.clone();
            tokio::spawn(async move { client.post("/log", &json!({"n": i})).await })
        })
        .collect();

    for handle in handles {
        let response = handle.await.unwrap().unwrap();
        assert_eq!(response.status.as_u16(), 200);
    }
}

#[tokio::test]
async fn test_slow_server_times_out() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
        .mount(&mock_server)
        .await;

    let client = create_client(
        ClientOptions::new(mock_server.uri())
            .retry(false)
            .timeout_ms(100.0),
    )
    .unwrap();

    let start = Instant::now();
    let result = client.get("/slow").await;

    assert!(matches!(result, Err(Error::Timeout { .. })));
    assert!(start.elapsed() < Duration::from_secs(1));
}

#[tokio::test]
async fn test_unknown_path_rejects() {
    let mock_server = MockServer::start().await;

    let client = create_client(
        ClientOptions::new(mock_server.uri())
            .retry(fast_retry())
            .timeout_ms(500.0),
    )
    .unwrap();

    let start = Instant::now();
    let err = client.get("XXX").await.unwrap_err();

    assert_eq!(err.status().map(|s| s.as_u16()), Some(404));
    assert!(start.elapsed() < Duration::from_secs(1));
}

#[tokio::test]
async fn test_unreachable_host_rejects_within_timeout() {
    let client = create_client(
        ClientOptions::new("http://127.0.0.1:1")
            .retry(fast_retry())
            .timeout_ms(10.0),
    )
    .unwrap();

    let start = Instant::now();
    let result = tokio::time::timeout(Duration::from_secs(3), client.get("XXX"))
        .await
        .expect("call should settle within its timeout");

    assert!(result.is_err());
    assert!(start.elapsed() < Duration::from_secs(1));
}

#[tokio::test]
async fn test_unreachable_host_exhausts_retries() {
    let client = create_client(
        ClientOptions::new("http://127.0.0.1:1")
            .retry(fast_retry().max_retries(2))
            .timeout_ms(1_000.0),
    )
    .unwrap();

    match client.get("/log").await {
        Err(Error::MaxRetriesExceeded {
            attempts,
            last_error,
        }) => {
            assert_eq!(attempts, 3);
            assert!(last_error.is_retryable());
        }
        other => panic!("Expected MaxRetriesExceeded, got {:?}", other),
    }
}

#[tokio::test]
async fn test_configuration_error_before_any_request() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let result = create_client(
        ClientOptions::new(mock_server.uri()).retry(RetryPolicyOptions::new().multiplier(-1.0)),
    );

    match result {
        Err(Error::ConfigurationError(message)) => {
            assert_eq!(message, "retry.multiplier must be > 0")
        }
        other => panic!("Expected ConfigurationError, got {:?}", other.map(|_| ())),
    }
}

/// Accepts only requests carrying a valid Hawk header for the test credentials.
struct HawkServer;

impl Respond for HawkServer {
    fn respond(&self, request: &wiremock::Request) -> ResponseTemplate {
        let unauthorized = ResponseTemplate::new(401).set_body_string("Unauthorized");

        let Some(value) = request
            .headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
        else {
            return unauthorized;
        };
        let Some(fields) = value.strip_prefix("Hawk ") else {
            return unauthorized;
        };
        let Ok(header) = hawk::Header::from_str(fields) else {
            return unauthorized;
        };

        let url = &request.url;
        let resource = match url.query() {
            Some(query) => format!("{}?{}", url.path(), query),
            None => url.path().to_string(),
        };
        let key = hawk::Key::new(HAWK_KEY.as_bytes(), hawk::SHA256).unwrap();
        let valid = hawk::RequestBuilder::new(
            request.method.as_str(),
            url.host_str().unwrap_or_default(),
            url.port_or_known_default().unwrap_or(80),
            &resource,
        )
        .request()
        .validate_header(&header, &key, Duration::from_secs(60));

        if valid && header.id.as_deref() == Some(HAWK_ID) {
            ResponseTemplate::new(200).set_body_json(json!({"authenticated": true}))
        } else {
            unauthorized
        }
    }
}

#[tokio::test]
async fn test_hawk_authentication() {
    let mock_server = MockServer::start().await;

    Mock::given(path("/api/log"))
        .respond_with(HawkServer)
        .mount(&mock_server)
        .await;

    let base_url = format!("{}/api", mock_server.uri());
    let credentials = HawkCredentials::new(HAWK_ID, HAWK_KEY, "sha256");

    let signed = create_client(
        ClientOptions::new(base_url.clone())
            .retry(false)
            .hawk(HawkOptions::new(credentials)),
    )
    .unwrap();
    let response = signed
        .call(Request::new("log").with_entity(event()).with_param("page", "1"))
        .await
        .unwrap();
    assert_eq!(response.entity, Entity::Json(json!({"authenticated": true})));

    let unsigned = create_client(ClientOptions::new(base_url).retry(false)).unwrap();
    let err = unsigned
        .call(Request::new("log").with_entity(event()))
        .await
        .unwrap_err();
    assert_eq!(err.status().map(|s| s.as_u16()), Some(401));
}
