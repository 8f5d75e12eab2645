//! Client options and their resolution into a validated configuration.
//!
//! [`resolve`] merges caller options over the built-in defaults, expands the
//! `retry: true` shorthand, validates every field and applies the log level.
//! Merging happens on a JSON tree, so nested objects combine key by key:
//! `retry: { initial: 5 }` keeps the default `multiplier` and `max`.

use crate::logging::{self, LogLevel};
use crate::retry::RetryPolicy;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::time::Duration;
use url::Url;

/// Default delay before the first retry, in milliseconds.
pub const DEFAULT_RETRY_INITIAL_MS: f64 = 100.0;
/// Default backoff multiplier.
pub const DEFAULT_RETRY_MULTIPLIER: f64 = 2.0;
/// Default cap on the retry delay, in milliseconds (one hour).
pub const DEFAULT_RETRY_MAX_MS: f64 = 3_600_000.0;
/// Default timeout, in milliseconds.
pub const DEFAULT_TIMEOUT_MS: f64 = 30_000.0;

const HAWK_ALGORITHMS: [&str; 3] = ["sha256", "sha384", "sha512"];

/// Options supplied by the caller. Every field except `base_url` is optional.
///
/// Options can be built fluently or deserialized from JSON using the same keys
/// as the option table (`baseUrl`, `retry`, `timeout`, `mime`, `auth`,
/// `logLevel`).
///
/// # Examples
///
/// ```
/// use rest_chain::{ClientOptions, RetryPolicyOptions};
///
/// let options = ClientOptions::new("http://localhost:8000")
///     .retry(RetryPolicyOptions::new().initial(1.0).multiplier(2.0).max(2.0))
///     .timeout_ms(10.0)
///     .log_level("DEBUG");
///
/// let config = rest_chain::resolve(&options).unwrap();
/// assert_eq!(config.timeout_ms, 10.0);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientOptions {
    /// Prefix for every request path. Required.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    /// Retry policy, or `false` to disable retries.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry: Option<RetryOption>,

    /// Timeout in milliseconds, applied to each attempt and to the call as a
    /// whole. Non-positive or non-finite disables it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<f64>,

    /// Content negotiation settings, or `false` to disable it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mime: Option<MimeOption>,

    /// Request authentication.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth: Option<AuthOptions>,

    /// Process-wide log level for this crate's events.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,
}

impl ClientOptions {
    /// Creates options with the given base URL and everything else defaulted.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: Some(base_url.into()),
            ..Default::default()
        }
    }

    /// Reads options from a JSON object.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigurationError`] if the value does not have the
    /// shape of the option table.
    pub fn from_json(value: Value) -> Result<Self> {
        serde_json::from_value(value)
            .map_err(|e| Error::ConfigurationError(format!("invalid options: {}", e)))
    }

    /// Sets the retry policy. Accepts `bool` or [`RetryPolicyOptions`].
    pub fn retry(mut self, retry: impl Into<RetryOption>) -> Self {
        self.retry = Some(retry.into());
        self
    }

    /// Sets the timeout in milliseconds.
    pub fn timeout_ms(mut self, timeout: f64) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sets the timeout.
    pub fn timeout(self, timeout: Duration) -> Self {
        self.timeout_ms(timeout.as_secs_f64() * 1000.0)
    }

    /// Sets content negotiation. Accepts `bool` or [`MimeOptions`].
    pub fn mime(mut self, mime: impl Into<MimeOption>) -> Self {
        self.mime = Some(mime.into());
        self
    }

    /// Enables Hawk authentication.
    pub fn hawk(mut self, hawk: HawkOptions) -> Self {
        self.auth = Some(AuthOptions { hawk: Some(hawk) });
        self
    }

    /// Sets the log level (`TRACE`, `DEBUG`, `INFO`, `WARN` or `ERROR`).
    pub fn log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = Some(level.into());
        self
    }
}

/// The `retry` option: a boolean switch or an explicit policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RetryOption {
    /// `true` uses the default policy, `false` disables retries.
    Enabled(bool),
    /// Policy fields; missing ones take their defaults.
    Policy(RetryPolicyOptions),
}

impl From<bool> for RetryOption {
    fn from(enabled: bool) -> Self {
        RetryOption::Enabled(enabled)
    }
}

impl From<RetryPolicyOptions> for RetryOption {
    fn from(policy: RetryPolicyOptions) -> Self {
        RetryOption::Policy(policy)
    }
}

/// Retry policy fields, all in milliseconds except `multiplier`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetryPolicyOptions {
    /// Delay before the first retry. Must be > 0.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub initial: Option<f64>,
    /// Factor applied to the delay after each failure. Must be > 0.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub multiplier: Option<f64>,
    /// Upper bound on the delay. Must be > 0.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    /// Maximum number of retries. Unbounded when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_retries: Option<u64>,
}

impl RetryPolicyOptions {
    /// Creates empty retry options; unset fields take the defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the delay before the first retry, in milliseconds.
    pub fn initial(mut self, ms: f64) -> Self {
        self.initial = Some(ms);
        self
    }

    /// Sets the backoff growth factor.
    pub fn multiplier(mut self, multiplier: f64) -> Self {
        self.multiplier = Some(multiplier);
        self
    }

    /// Sets the cap on a single backoff delay, in milliseconds.
    pub fn max(mut self, ms: f64) -> Self {
        self.max = Some(ms);
        self
    }

    /// Sets the maximum number of retries after the first attempt.
    pub fn max_retries(mut self, retries: u64) -> Self {
        self.max_retries = Some(retries);
        self
    }
}

/// The `mime` option: a boolean switch or interceptor settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MimeOption {
    /// `false` disables content negotiation; `true` keeps the defaults.
    Enabled(bool),
    /// Content negotiation settings.
    Config(MimeOptions),
}

impl From<bool> for MimeOption {
    fn from(enabled: bool) -> Self {
        MimeOption::Enabled(enabled)
    }
}

impl From<MimeOptions> for MimeOption {
    fn from(options: MimeOptions) -> Self {
        MimeOption::Config(options)
    }
}

/// Content negotiation settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MimeOptions {
    /// MIME type for request entities that carry no `Content-Type` header.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mime: Option<String>,
}

impl MimeOptions {
    /// Uses `mime` for requests without a `Content-Type` header.
    pub fn new(mime: impl Into<String>) -> Self {
        Self {
            mime: Some(mime.into()),
        }
    }
}

/// Authentication settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuthOptions {
    /// Hawk request signing.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hawk: Option<HawkOptions>,
}

/// Hawk request signing settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HawkOptions {
    /// Shared credentials.
    pub credentials: HawkCredentials,
    /// Application-specific data included in the MAC.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ext: Option<String>,
    /// Accepted for compatibility. The local clock is always used.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sntp: Option<bool>,
}

impl HawkOptions {
    /// Creates Hawk settings with no `ext` data.
    pub fn new(credentials: HawkCredentials) -> Self {
        Self {
            credentials,
            ext: None,
            sntp: None,
        }
    }

    /// Sets the application-specific data included in the MAC.
    pub fn ext(mut self, ext: impl Into<String>) -> Self {
        self.ext = Some(ext.into());
        self
    }
}

/// Hawk credentials: key identifier, shared key and MAC algorithm.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct HawkCredentials {
    pub id: String,
    pub key: String,
    /// One of `sha256`, `sha384`, `sha512`.
    pub algorithm: String,
}

impl HawkCredentials {
    /// Creates credentials from a key id, shared key and algorithm name.
    pub fn new(id: impl Into<String>, key: impl Into<String>, algorithm: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            key: key.into(),
            algorithm: algorithm.into(),
        }
    }
}

impl std::fmt::Debug for HawkCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HawkCredentials")
            .field("id", &self.id)
            .field("key", &"[REDACTED]")
            .field("algorithm", &self.algorithm)
            .finish()
    }
}

/// Whether the retry interceptor is installed, and with which policy.
#[derive(Debug, Clone, PartialEq)]
pub enum RetrySetting {
    Disabled,
    Enabled(RetryPolicy),
}

/// Whether the content-negotiation interceptor is installed, and how.
#[derive(Debug, Clone, PartialEq)]
pub enum MimeSetting {
    Disabled,
    Enabled(MimeOptions),
}

/// A validated configuration with every default applied.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedConfig {
    /// Absolute URL prefixed to every relative request path.
    pub base_url: String,
    pub retry: RetrySetting,
    /// Timeout in milliseconds, as supplied.
    pub timeout_ms: f64,
    pub mime: MimeSetting,
    pub auth: Option<AuthOptions>,
    pub log_level: LogLevel,
}

impl ResolvedConfig {
    /// The timeout, or `None` when disabled (non-positive or non-finite).
    pub fn timeout(&self) -> Option<Duration> {
        if self.timeout_ms.is_finite() && self.timeout_ms > 0.0 {
            Some(millis(self.timeout_ms))
        } else {
            None
        }
    }

    /// The Hawk settings, if authentication is configured.
    pub fn hawk(&self) -> Option<&HawkOptions> {
        self.auth.as_ref()?.hawk.as_ref()
    }
}

/// Validates `options`, merges them over the defaults and applies the log level.
///
/// # Errors
///
/// Returns [`Error::ConfigurationError`] naming the first invalid field. No
/// client is built and no request is attempted in that case.
///
/// # Examples
///
/// ```
/// use rest_chain::{resolve, ClientOptions, RetryPolicyOptions};
///
/// let err = resolve(&ClientOptions::default()).unwrap_err();
/// assert_eq!(err.to_string(), "Configuration error: baseUrl is required");
///
/// let err = resolve(
///     &ClientOptions::new("http://localhost:8000").retry(RetryPolicyOptions::new().initial(0.0)),
/// )
/// .unwrap_err();
/// assert!(err.is_configuration_error());
/// ```
pub fn resolve(options: &ClientOptions) -> Result<ResolvedConfig> {
    // JSON has no NaN or infinity; they would serialize as null.
    let non_finite_timeout = options.timeout.filter(|t| !t.is_finite());

    let mut value = serde_json::to_value(options)
        .map_err(|e| Error::ConfigurationError(format!("invalid options: {}", e)))?;
    if non_finite_timeout.is_some() {
        if let Some(fields) = value.as_object_mut() {
            fields.insert("timeout".to_string(), json!(0));
        }
    }

    let mut resolved = resolve_value(&value)?;
    if let Some(timeout) = non_finite_timeout {
        resolved.timeout_ms = timeout;
    }
    Ok(resolved)
}

/// Like [`resolve`], for options held as raw JSON.
///
/// Type mismatches are reported with the same messages as range violations,
/// e.g. `{"timeout": "soon"}` fails with `timeout must be a Number`.
pub fn resolve_value(options: &Value) -> Result<ResolvedConfig> {
    let mut config = defaults();
    match options {
        Value::Null => {}
        Value::Object(_) => deep_merge(&mut config, options),
        _ => return Err(invalid("options must be an object")),
    }

    if let Some(retry) = config.get_mut("retry") {
        if *retry == Value::Bool(true) {
            *retry = default_retry();
        }
    }

    validate(&config)?;

    let log_level =
        LogLevel::parse_or_default(config.get("logLevel").and_then(Value::as_str));
    logging::set_log_level(log_level);

    let resolved = to_resolved(&config, log_level)?;
    if logging::is_debug_enabled() {
        tracing::debug!(config = ?resolved, "Resolved REST client configuration");
    }
    Ok(resolved)
}

fn default_retry() -> Value {
    json!({
        "initial": DEFAULT_RETRY_INITIAL_MS,
        "multiplier": DEFAULT_RETRY_MULTIPLIER,
        "max": DEFAULT_RETRY_MAX_MS,
    })
}

fn defaults() -> Value {
    json!({
        "retry": default_retry(),
        "logLevel": LogLevel::default().to_string(),
        "timeout": DEFAULT_TIMEOUT_MS,
        "mime": {},
    })
}

/// Recursive merge of `source` into `target`: objects combine key by key,
/// anything else replaces the target value.
fn deep_merge(target: &mut Value, source: &Value) {
    match (target, source) {
        (Value::Object(target), Value::Object(source)) => {
            for (key, value) in source {
                match target.get_mut(key) {
                    Some(existing) if existing.is_object() && value.is_object() => {
                        deep_merge(existing, value)
                    }
                    _ => {
                        target.insert(key.clone(), value.clone());
                    }
                }
            }
        }
        (target, source) => *target = source.clone(),
    }
}

fn invalid(message: impl Into<String>) -> Error {
    Error::ConfigurationError(message.into())
}

fn validate(config: &Value) -> Result<()> {
    let base_url = config
        .get("baseUrl")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| invalid("baseUrl is required"))?;
    let url = Url::parse(base_url)
        .map_err(|e| invalid(format!("baseUrl must be an absolute URL: {}", e)))?;
    if url.cannot_be_a_base() {
        return Err(invalid("baseUrl must be an absolute URL"));
    }

    match config.get("retry") {
        None | Some(Value::Bool(_)) => {}
        Some(Value::Object(retry)) => {
            for field in ["initial", "multiplier", "max"] {
                check_positive(retry, field)?;
            }
            if let Some(max_retries) = retry.get("maxRetries") {
                if max_retries.as_u64().is_none() {
                    return Err(invalid("retry.maxRetries must be a non-negative integer"));
                }
            }
        }
        Some(_) => return Err(invalid("retry must be a boolean or an object")),
    }

    if let Some(timeout) = config.get("timeout") {
        if !timeout.is_number() {
            return Err(invalid("timeout must be a Number"));
        }
    }

    match config.get("mime") {
        None | Some(Value::Bool(_)) => {}
        Some(Value::Object(mime)) => {
            if let Some(mime) = mime.get("mime") {
                if !mime.is_string() {
                    return Err(invalid("mime.mime must be a String"));
                }
            }
        }
        Some(_) => return Err(invalid("mime must be a boolean or an object")),
    }

    if let Some(auth) = config.get("auth") {
        let auth = auth
            .as_object()
            .ok_or_else(|| invalid("auth must be an object"))?;
        if let Some(hawk) = auth.get("hawk") {
            validate_hawk(hawk)?;
        }
    }

    Ok(())
}

fn check_positive(retry: &Map<String, Value>, field: &str) -> Result<()> {
    match retry.get(field) {
        None => Ok(()),
        Some(value) => match value.as_f64() {
            Some(n) if n.is_finite() && n > 0.0 => Ok(()),
            _ => Err(invalid(format!("retry.{} must be > 0", field))),
        },
    }
}

fn validate_hawk(hawk: &Value) -> Result<()> {
    let hawk = hawk
        .as_object()
        .ok_or_else(|| invalid("auth.hawk must be an object"))?;
    let credentials = hawk
        .get("credentials")
        .and_then(Value::as_object)
        .ok_or_else(|| invalid("auth.hawk.credentials is required"))?;

    for field in ["id", "key"] {
        if !credentials.get(field).is_some_and(Value::is_string) {
            return Err(invalid(format!(
                "auth.hawk.credentials.{} must be a String",
                field
            )));
        }
    }

    let algorithm = credentials.get("algorithm").and_then(Value::as_str);
    if !algorithm.is_some_and(|a| HAWK_ALGORITHMS.contains(&a)) {
        return Err(invalid(format!(
            "auth.hawk.credentials.algorithm must be one of {}",
            HAWK_ALGORITHMS.join(", ")
        )));
    }

    if let Some(ext) = hawk.get("ext") {
        if !ext.is_string() {
            return Err(invalid("auth.hawk.ext must be a String"));
        }
    }
    Ok(())
}

fn to_resolved(config: &Value, log_level: LogLevel) -> Result<ResolvedConfig> {
    let base_url = config
        .get("baseUrl")
        .and_then(Value::as_str)
        .ok_or_else(|| invalid("baseUrl is required"))?
        .to_string();

    let retry = match config.get("retry") {
        Some(Value::Bool(false)) => RetrySetting::Disabled,
        Some(Value::Object(retry)) => {
            let field = |name: &str, default: f64| {
                retry.get(name).and_then(Value::as_f64).unwrap_or(default)
            };
            RetrySetting::Enabled(RetryPolicy {
                initial: millis(field("initial", DEFAULT_RETRY_INITIAL_MS)),
                multiplier: field("multiplier", DEFAULT_RETRY_MULTIPLIER),
                max: millis(field("max", DEFAULT_RETRY_MAX_MS)),
                max_retries: retry
                    .get("maxRetries")
                    .and_then(Value::as_u64)
                    .map(|n| usize::try_from(n).unwrap_or(usize::MAX)),
            })
        }
        _ => RetrySetting::Enabled(RetryPolicy::default()),
    };

    let timeout_ms = config
        .get("timeout")
        .and_then(Value::as_f64)
        .unwrap_or(DEFAULT_TIMEOUT_MS);

    let mime = match config.get("mime") {
        Some(Value::Bool(false)) => MimeSetting::Disabled,
        Some(Value::Object(mime)) => MimeSetting::Enabled(MimeOptions {
            mime: mime.get("mime").and_then(Value::as_str).map(str::to_string),
        }),
        _ => MimeSetting::Enabled(MimeOptions::default()),
    };

    let auth = match config.get("auth") {
        Some(auth) => Some(
            serde_json::from_value::<AuthOptions>(auth.clone())
                .map_err(|e| invalid(format!("invalid auth: {}", e)))?,
        ),
        None => None,
    };

    Ok(ResolvedConfig {
        base_url,
        retry,
        timeout_ms,
        mime,
        auth,
        log_level,
    })
}

/// Converts a positive millisecond count to a `Duration`, saturating.
pub(crate) fn millis(ms: f64) -> Duration {
    if ms.fract() == 0.0 && ms >= 0.0 && ms < u64::MAX as f64 {
        Duration::from_millis(ms as u64)
    } else {
        Duration::try_from_secs_f64(ms / 1000.0).unwrap_or(Duration::MAX)
    }
}
