//! Minimal HTTP client with safe logging, a configurable retry policy, and OAuth signing.
//!
//! - Request options: `Auth`, query params, timeout
//! - Redacts sensitive query params and never logs secret values
//! - Rate limits (429) either wait for the advertised reset or count as retryable,
//!   depending on [`RetryPolicy::wait_on_rate_limit`]
//! - 5xx and network failures retry up to [`RetryPolicy::retry_count`] times,
//!   spaced by [`RetryPolicy::retry_delay`]
//! - Optional *raw* request/response logging via `TIMELINE_HTTP_RAW=1`
//!
//! Example (no_run):
//! ```rust
//! # async fn demo() -> Result<(), timeline_http::HttpError> {
//! let client = timeline_http::HttpClient::new("https://api.example.com")?;
//! let got: serde_json::Value = client
//!     .get_json("v1/items", timeline_http::RequestOpts::default())
//!     .await?;
//! # Ok(()) }
//! ```
//!
//! Security: logs only ever include the auth kind (oauth1/none), not the secret,
//! and the raw curl rendering redacts the `Authorization` header.

pub mod oauth;

pub use oauth::OAuthCredentials;

use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue, RETRY_AFTER};
use reqwest::{Client, Method, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::borrow::Cow;
use std::env;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use thiserror::Error;
use tokio::time::sleep;

// ==============================
// Raw logging toggles
// ==============================

const RAW_ENV: &str = "TIMELINE_HTTP_RAW";
const RAW_MAX_BODY: usize = 64 * 1024; // cap raw body logs (64 KiB)

fn raw_enabled() -> bool {
    matches!(
        env::var(RAW_ENV).as_deref(),
        Ok("1") | Ok("true") | Ok("yes")
    )
}

/// Render a best-effort curl command for repro/debug, with secrets redacted.
fn make_curl(method: &Method, url: &Url, headers: &HeaderMap) -> String {
    let mut parts = vec!["curl".to_string(), format!("-X{}", method)];
    for (name, val) in headers.iter() {
        let mut v = val.to_str().unwrap_or("").to_string();
        if name == AUTHORIZATION {
            v = "<redacted>".into();
        }
        parts.push(format!(
            "-H '{}: {}'",
            name.as_str(),
            v.replace('\'', r"'\''")
        ));
    }
    parts.push(format!("'{}'", url.as_str()));
    parts.join(" ")
}

/// Redact sensitive headers for logging
fn redact_headers(h: &HeaderMap) -> Vec<(String, String)> {
    h.iter()
        .map(|(k, v)| {
            let key = k.as_str().to_string();
            let mut val = v.to_str().unwrap_or("").to_string();
            if key.eq_ignore_ascii_case("authorization") || key.eq_ignore_ascii_case("set-cookie")
            {
                val = "<redacted>".into();
            }
            (key, val)
        })
        .collect()
}

// ==============================
// Errors
// ==============================

#[derive(Debug, Error)]
pub enum HttpError {
    #[error("invalid URL: {0}")]
    Url(String),
    #[error("request build failed: {0}")]
    Build(String),
    #[error("network error: {0}")]
    Network(String),
    #[error("decode error: {0}, body_snippet: {1}")]
    Decode(String, String),
    #[error("server returned error {status}: {message}, request_id={request_id}")]
    Api {
        status: StatusCode,
        message: String,
        request_id: String,
    },
}

impl HttpError {
    /// HTTP status for API errors, `None` for transport/decoding failures.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            HttpError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

// ==============================
// Auth, retry policy & request options
// ==============================

/// Request signing; leave `RequestOpts::auth` unset for anonymous calls.
#[derive(Clone, Debug)]
pub enum Auth<'a> {
    /// `Authorization: OAuth ...` signed per request (fresh nonce/timestamp each attempt).
    OAuth1(&'a OAuthCredentials),
}

/// How the client reacts to rate limits and transient failures.
///
/// ```
/// use timeline_http::RetryPolicy;
/// use std::time::Duration;
///
/// let policy = RetryPolicy::default();
/// assert!(policy.wait_on_rate_limit);
/// assert_eq!(policy.retry_count, 3);
/// assert_eq!(policy.retry_delay, Duration::from_secs(3));
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Sleep until the rate-limit window resets instead of failing on 429.
    pub wait_on_rate_limit: bool,
    /// Extra attempts for 5xx/network failures (and 429 when not waiting).
    pub retry_count: usize,
    /// Pause between those attempts.
    pub retry_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            wait_on_rate_limit: true,
            retry_count: 3,
            retry_delay: Duration::from_secs(3),
        }
    }
}

/// Per-request tuning knobs for the HTTP client.
///
/// ```
/// use timeline_http::RequestOpts;
/// use std::time::Duration;
///
/// let opts = RequestOpts {
///     timeout: Some(Duration::from_secs(30)),
///     query: Some(vec![("count", "200".into())]),
///     ..Default::default()
/// };
///
/// assert_eq!(opts.timeout.unwrap().as_secs(), 30);
/// assert!(opts.auth.is_none());
/// ```
#[derive(Clone, Debug, Default)]
pub struct RequestOpts<'a> {
    pub timeout: Option<Duration>,
    pub auth: Option<Auth<'a>>,
    pub query: Option<Vec<(&'a str, Cow<'a, str>)>>, // e.g. [("screen_name", "jack".into())]
}

// ==============================
// Client
// ==============================

#[derive(Clone)]
pub struct HttpClient {
    base: Url,
    inner: Client,
    pub default_timeout: Duration,
    pub retry: RetryPolicy,
}

impl HttpClient {
    /// Construct a client anchored to a base URL.
    ///
    /// ```no_run
    /// use timeline_http::{HttpClient, HttpError};
    /// use std::time::Duration;
    ///
    /// let client = HttpClient::new("https://api.example.com")?;
    /// assert_eq!(client.default_timeout, Duration::from_secs(15));
    /// assert_eq!(client.retry.retry_count, 3);
    /// # Ok::<(), HttpError>(())
    /// ```
    pub fn new(base: &str) -> Result<Self, HttpError> {
        let base = Url::parse(base).map_err(|e| HttpError::Url(e.to_string()))?;
        let inner = Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .build()
            .map_err(|e| HttpError::Build(e.to_string()))?;
        Ok(Self {
            base,
            inner,
            default_timeout: Duration::from_secs(15),
            retry: RetryPolicy::default(),
        })
    }

    /// Override the default timeout returned by [`HttpClient::new`].
    pub fn with_timeout(mut self, dur: Duration) -> Self {
        self.default_timeout = dur;
        self
    }

    /// Replace the rate-limit/retry policy returned by [`HttpClient::new`].
    ///
    /// ```no_run
    /// use timeline_http::{HttpClient, HttpError, RetryPolicy};
    ///
    /// let client = HttpClient::new("https://api.example.com")?.with_retry_policy(RetryPolicy {
    ///     retry_count: 5,
    ///     ..RetryPolicy::default()
    /// });
    /// assert_eq!(client.retry.retry_count, 5);
    /// # Ok::<(), HttpError>(())
    /// ```
    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry = policy;
        self
    }

    /// GET JSON with per-request options (headers/query/auth/timeout).
    pub async fn get_json<T>(&self, path: &str, opts: RequestOpts<'_>) -> Result<T, HttpError>
    where
        T: DeserializeOwned,
    {
        self.request_json_internal(Method::GET, path, opts).await
    }

    // ==============================
    // Core request implementation
    // ==============================

    async fn request_json_internal<T>(
        &self,
        method: Method,
        path: &str,
        opts: RequestOpts<'_>,
    ) -> Result<T, HttpError>
    where
        T: DeserializeOwned,
    {
        let url = self
            .base
            .join(path)
            .map_err(|e| HttpError::Url(e.to_string()))?;

        let pairs: Vec<(&str, &str)> = opts
            .query
            .as_ref()
            .map(|q| q.iter().map(|(k, v)| (*k, v.as_ref())).collect())
            .unwrap_or_default();

        let auth_kind = match &opts.auth {
            Some(Auth::OAuth1(_)) => "oauth1",
            None => "none",
        };
        let redacted_q = redact_query(&pairs);
        let timeout = opts.timeout.unwrap_or(self.default_timeout);
        let policy = &self.retry;

        let mut attempt = 0usize;
        let mut rate_limit_waits = 0usize;

        loop {
            // ----- Build request -----
            let mut headers = HeaderMap::new();
            if let Some(Auth::OAuth1(creds)) = &opts.auth {
                let value = oauth::authorization_header(
                    creds,
                    method.as_str(),
                    &signature_base_url(&url),
                    &pairs,
                )?;
                let value = HeaderValue::from_str(&value)
                    .map_err(|e| HttpError::Build(format!("invalid Authorization header: {e}")))?;
                headers.insert(AUTHORIZATION, value);
            }

            let rb = self
                .inner
                .request(method.clone(), url.clone())
                .timeout(timeout)
                .query(&pairs)
                .headers(headers.clone());

            // Lightweight request id without extra deps
            let req_id = format!(
                "r{:x}",
                SystemTime::now()
                    .duration_since(UNIX_EPOCH)
                    .unwrap_or_default()
                    .as_nanos()
            );

            tracing::debug!(
                req_id=%req_id,
                attempt=attempt + 1,
                retry_count=policy.retry_count,
                method=%method,
                host_path=%format!("{}{}", url.host_str().unwrap_or("-"), url.path()),
                query=?redacted_q,
                timeout_ms=timeout.as_millis() as u64,
                auth_kind,
                "http.request.start"
            );

            if raw_enabled() {
                let mut shown = url.clone();
                shown.query_pairs_mut().extend_pairs(redacted_q.iter());
                let curl = make_curl(&method, &shown, &headers);
                tracing::debug!(target: "http.raw", %req_id, %curl, "request");
            }

            // ----- Send -----
            let t0 = std::time::Instant::now();
            let resp = match rb.send().await {
                Ok(resp) => resp,
                Err(err) => {
                    let message = err.to_string();
                    if attempt < policy.retry_count {
                        attempt += 1;
                        tracing::warn!(
                            req_id=%req_id,
                            attempt,
                            retry_count=policy.retry_count,
                            backoff_ms=policy.retry_delay.as_millis() as u64,
                            message=%message,
                            "http.retrying.network_send"
                        );
                        sleep(policy.retry_delay).await;
                        continue;
                    }
                    tracing::warn!(
                        req_id=%req_id,
                        attempt,
                        message=%message,
                        "http.network_error.send"
                    );
                    return Err(HttpError::Network(message));
                }
            };
            let status = resp.status();
            let resp_headers = resp.headers().clone();
            let bytes = match resp.bytes().await {
                Ok(bytes) => bytes,
                Err(err) => {
                    let message = err.to_string();
                    if attempt < policy.retry_count {
                        attempt += 1;
                        tracing::warn!(
                            req_id=%req_id,
                            attempt,
                            retry_count=policy.retry_count,
                            backoff_ms=policy.retry_delay.as_millis() as u64,
                            message=%message,
                            "http.retrying.network_body"
                        );
                        sleep(policy.retry_delay).await;
                        continue;
                    }
                    tracing::warn!(
                        req_id=%req_id,
                        attempt,
                        message=%message,
                        "http.network_error.body"
                    );
                    return Err(HttpError::Network(message));
                }
            };
            let dur_ms = t0.elapsed().as_millis() as u64;

            let req_hdr_id = resp_headers
                .get("x-request-id")
                .or_else(|| resp_headers.get("x-transaction-id"))
                .and_then(|v| v.to_str().ok())
                .unwrap_or("-");

            let limit = header_str(&resp_headers, "x-rate-limit-limit");
            let remain = header_str(&resp_headers, "x-rate-limit-remaining");
            let reset = header_str(&resp_headers, "x-rate-limit-reset");

            tracing::debug!(
                req_id=%req_id,
                %status,
                duration_ms=dur_ms,
                body_len=bytes.len(),
                x_request_id=%req_hdr_id,
                rate_limit.limit=?limit,
                rate_limit.remaining=?remain,
                rate_limit.reset=?reset,
                "http.response.headers"
            );

            if raw_enabled() {
                let hdrs = redact_headers(&resp_headers);
                let truncated = bytes.len() > RAW_MAX_BODY;
                let text = String::from_utf8_lossy(&bytes[..bytes.len().min(RAW_MAX_BODY)]);
                tracing::info!(
                    target:"http.raw",
                    %req_id,
                    status=%status,
                    duration_ms=dur_ms,
                    headers=?hdrs,
                    body=%text,
                    truncated
                );
            }

            let snippet = snip_body(&bytes);
            tracing::trace!(
                req_id=%req_id,
                body_snippet=%snippet,
                "http.response.body_snippet"
            );

            // ----- Success path -----
            if status.is_success() {
                return serde_json::from_slice::<T>(&bytes).map_err(|e| {
                    tracing::warn!(
                        req_id=%req_id,
                        serde_line=%e.line(),
                        serde_col=%e.column(),
                        serde_err=%e.to_string(),
                        body_snippet=%snippet,
                        "http.response.decode_error"
                    );
                    HttpError::Decode(e.to_string(), snippet)
                });
            }

            let message = extract_error_message(&bytes);
            let is_429 = status == StatusCode::TOO_MANY_REQUESTS;
            let is_5xx = status.is_server_error();

            // ----- Rate limited: wait for the window to reset -----
            if is_429 && policy.wait_on_rate_limit {
                rate_limit_waits += 1;
                let delay =
                    rate_limit_delay(&resp_headers, now_epoch_secs(), policy.retry_delay);
                tracing::warn!(
                    req_id=%req_id,
                    %status,
                    rate_limit_waits,
                    wait_ms=delay.as_millis() as u64,
                    message=%message,
                    "http.rate_limited.waiting"
                );
                sleep(delay).await;
                continue;
            }

            // ----- Transient: retry with fixed spacing -----
            if (is_429 || is_5xx) && attempt < policy.retry_count {
                attempt += 1;
                tracing::warn!(
                    req_id=%req_id,
                    %status,
                    attempt,
                    retry_count=policy.retry_count,
                    backoff_ms=policy.retry_delay.as_millis() as u64,
                    message=%message,
                    body_snippet=%snippet,
                    "http.retrying"
                );
                sleep(policy.retry_delay).await;
                continue;
            }

            tracing::warn!(
                req_id=%req_id,
                %status,
                message=%message,
                x_request_id=%req_hdr_id,
                body_snippet=%snippet,
                "http.error"
            );
            return Err(HttpError::Api {
                status,
                message,
                request_id: req_hdr_id.to_string(),
            });
        }
    }
}

// ==============================
// Helpers
// ==============================

/// Scheme, host, non-default port and path; the query is signed separately.
fn signature_base_url(url: &Url) -> String {
    let mut base = format!("{}://{}", url.scheme(), url.host_str().unwrap_or_default());
    if let Some(port) = url.port() {
        base.push_str(&format!(":{port}"));
    }
    base.push_str(url.path());
    base
}

fn header_str<'h>(h: &'h HeaderMap, name: &str) -> Option<&'h str> {
    h.get(name).and_then(|v| v.to_str().ok())
}

fn now_epoch_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// `Retry-After` wins; otherwise sleep until `x-rate-limit-reset` (epoch seconds) plus one
/// second. Never shorter than `floor`.
fn rate_limit_delay(h: &HeaderMap, now: u64, floor: Duration) -> Duration {
    let advertised = header_str(h, RETRY_AFTER.as_str())
        .and_then(|v| v.trim().parse().ok())
        .or_else(|| {
            let reset: u64 = header_str(h, "x-rate-limit-reset")?.trim().parse().ok()?;
            Some(reset.saturating_sub(now) + 1)
        })
        .map(Duration::from_secs);
    advertised.map_or(floor, |d| d.max(floor))
}

fn extract_error_message(body: &[u8]) -> String {
    // Twitter v1.1: {"errors":[{"code":88,"message":"Rate limit exceeded"}]}
    #[derive(Deserialize)]
    struct TwErrors {
        errors: Vec<TwErr>,
    }
    #[derive(Deserialize)]
    struct TwErr {
        #[serde(default)]
        code: Option<i64>,
        #[serde(default)]
        message: String,
    }

    // Generic: {"error":"..."} or {"detail":"..."}
    #[derive(Deserialize)]
    struct Msg {
        #[serde(default)]
        error: String,
        #[serde(default)]
        detail: String,
    }

    if let Ok(tw) = serde_json::from_slice::<TwErrors>(body) {
        if let Some(first) = tw.errors.into_iter().next() {
            if !first.message.is_empty() {
                return match first.code {
                    Some(code) => format!("{} (code {code})", first.message),
                    None => first.message,
                };
            }
        }
    }
    if let Ok(m) = serde_json::from_slice::<Msg>(body) {
        if !m.error.is_empty() {
            return m.error;
        }
        if !m.detail.is_empty() {
            return m.detail;
        }
    }
    snip_body(body)
}

fn snip_body(body: &[u8]) -> String {
    let mut snip = String::from_utf8_lossy(body).to_string();
    if snip.len() > 500 {
        let mut cut = 500;
        while !snip.is_char_boundary(cut) {
            cut -= 1;
        }
        snip.truncate(cut);
        snip.push_str("...");
    }
    snip
}

fn redact_query(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
    pairs
        .iter()
        .map(|(k, v)| {
            let is_secret = matches!(
                k.to_ascii_lowercase().as_str(),
                "access_token"
                    | "authorization"
                    | "oauth_token"
                    | "oauth_signature"
                    | "key"
                    | "api_key"
                    | "token"
                    | "secret"
                    | "consumer_secret"
            );
            (
                (*k).to_string(),
                if is_secret {
                    "<redacted>".to_string()
                } else {
                    (*v).to_string()
                },
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};
    use wiremock::matchers::{header_exists, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn quick_policy(wait_on_rate_limit: bool, retry_count: usize) -> RetryPolicy {
        RetryPolicy {
            wait_on_rate_limit,
            retry_count,
            retry_delay: Duration::from_millis(0),
        }
    }

    fn test_creds() -> OAuthCredentials {
        OAuthCredentials {
            consumer_key: "ck".into(),
            consumer_secret: "cs".into(),
            access_token: "at".into(),
            access_secret: "as".into(),
        }
    }

    #[test]
    fn retry_after_beats_reset_header() {
        let mut h = HeaderMap::new();
        h.insert(RETRY_AFTER, HeaderValue::from_static("7"));
        h.insert("x-rate-limit-reset", HeaderValue::from_static("1000"));
        assert_eq!(
            rate_limit_delay(&h, 900, Duration::ZERO),
            Duration::from_secs(7)
        );
    }

    #[test]
    fn reset_header_counts_down_from_now() {
        let mut h = HeaderMap::new();
        h.insert("x-rate-limit-reset", HeaderValue::from_static("1000"));
        assert_eq!(
            rate_limit_delay(&h, 990, Duration::ZERO),
            Duration::from_secs(11)
        );
        // already past the reset: just the one second of slack
        assert_eq!(
            rate_limit_delay(&h, 2000, Duration::ZERO),
            Duration::from_secs(1)
        );
    }

    #[test]
    fn retry_delay_floors_the_rate_limit_wait() {
        let floor = Duration::from_secs(3);
        let mut h = HeaderMap::new();
        h.insert(RETRY_AFTER, HeaderValue::from_static("0"));
        assert_eq!(rate_limit_delay(&h, 0, floor), floor);
        assert_eq!(rate_limit_delay(&HeaderMap::new(), 0, floor), floor);

        h.insert(RETRY_AFTER, HeaderValue::from_static("60"));
        assert_eq!(rate_limit_delay(&h, 0, floor), Duration::from_secs(60));
    }

    #[test]
    fn twitter_error_envelope_is_unpacked() {
        let body = br#"{"errors":[{"code":88,"message":"Rate limit exceeded"}]}"#;
        assert_eq!(extract_error_message(body), "Rate limit exceeded (code 88)");
        assert_eq!(extract_error_message(br#"{"error":"Not authorized."}"#), "Not authorized.");
        assert_eq!(extract_error_message(b"plain failure"), "plain failure");
    }

    #[test]
    fn signature_url_keeps_port_and_drops_query() {
        let url = Url::parse("http://127.0.0.1:8080/1.1/x.json?a=b").unwrap();
        assert_eq!(signature_base_url(&url), "http://127.0.0.1:8080/1.1/x.json");
        let url = Url::parse("https://api.twitter.com/1.1/x.json").unwrap();
        assert_eq!(signature_base_url(&url), "https://api.twitter.com/1.1/x.json");
    }

    #[test]
    fn secret_query_params_are_redacted() {
        let redacted = redact_query(&[("screen_name", "jack"), ("oauth_token", "abc")]);
        assert_eq!(redacted[0].1, "jack");
        assert_eq!(redacted[1].1, "<redacted>");
    }

    #[tokio::test]
    async fn signs_requests_and_sends_query() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/1.1/items.json"))
            .and(query_param("count", "5"))
            .and(header_exists("authorization"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([1, 2, 3])))
            .expect(1)
            .mount(&server)
            .await;

        let client = HttpClient::new(&server.uri()).unwrap();
        let creds = test_creds();
        let got: Value = client
            .get_json(
                "1.1/items.json",
                RequestOpts {
                    auth: Some(Auth::OAuth1(&creds)),
                    query: Some(vec![("count", "5".into())]),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(got, json!([1, 2, 3]));
    }

    #[tokio::test]
    async fn waits_out_rate_limit_then_succeeds() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "0"))
            .up_to_n_times(2)
            .with_priority(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
            .mount(&server)
            .await;

        // zero retries: rate-limit waits must not consume the retry budget
        let client = HttpClient::new(&server.uri())
            .unwrap()
            .with_retry_policy(quick_policy(true, 0));
        let got: Value = client.get_json("x", RequestOpts::default()).await.unwrap();
        assert_eq!(got, json!({"ok": true}));
    }

    #[tokio::test]
    async fn zero_retry_after_still_waits_the_retry_delay() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "0"))
            .up_to_n_times(1)
            .with_priority(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;

        let client = HttpClient::new(&server.uri())
            .unwrap()
            .with_retry_policy(RetryPolicy {
                wait_on_rate_limit: true,
                retry_count: 0,
                retry_delay: Duration::from_millis(150),
            });
        let started = std::time::Instant::now();
        let _: Value = client.get_json("x", RequestOpts::default()).await.unwrap();
        assert!(started.elapsed() >= Duration::from_millis(150));
    }

    #[tokio::test]
    async fn rate_limit_without_waiting_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(429).set_body_json(
                json!({"errors":[{"code":88,"message":"Rate limit exceeded"}]}),
            ))
            .expect(2)
            .mount(&server)
            .await;

        let client = HttpClient::new(&server.uri())
            .unwrap()
            .with_retry_policy(quick_policy(false, 1));
        let err = client
            .get_json::<Value>("x", RequestOpts::default())
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(StatusCode::TOO_MANY_REQUESTS));
        assert!(err.to_string().contains("Rate limit exceeded"));
    }

    #[tokio::test]
    async fn server_errors_retry_up_to_budget() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .expect(3)
            .mount(&server)
            .await;

        let client = HttpClient::new(&server.uri())
            .unwrap()
            .with_retry_policy(quick_policy(true, 2));
        let err = client
            .get_json::<Value>("x", RequestOpts::default())
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(StatusCode::SERVICE_UNAVAILABLE));
    }

    #[tokio::test]
    async fn client_errors_are_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(401).set_body_json(
                json!({"errors":[{"code":32,"message":"Could not authenticate you."}]}),
            ))
            .expect(1)
            .mount(&server)
            .await;

        let client = HttpClient::new(&server.uri())
            .unwrap()
            .with_retry_policy(quick_policy(true, 3));
        let err = client
            .get_json::<Value>("x", RequestOpts::default())
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(StatusCode::UNAUTHORIZED));
    }

    #[tokio::test]
    async fn undecodable_body_is_a_decode_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
            .mount(&server)
            .await;

        let client = HttpClient::new(&server.uri()).unwrap();
        let err = client
            .get_json::<Value>("x", RequestOpts::default())
            .await
            .unwrap_err();
        assert!(matches!(err, HttpError::Decode(_, ref snippet) if snippet == "<html>"));
    }
}
