//! Minimal HTTP client with safe logging for the planner's two outbound calls.
//!
//! - Request options: headers, query params, optional timeout
//! - Redacts sensitive headers and never logs their values
//! - One attempt per call: failures surface immediately to the caller
//! - Optional *raw* request/response logging via `WAYFINDER_HTTP_RAW=1`
//!
//! Two shapes of call are supported. [`HttpClient::post_json_text`] sends a
//! JSON body and hands back the response body as text, read exactly once,
//! without judging the status code; callers that distrust the peer decide
//! what the text means. [`HttpClient::get_json`] is the strict variant:
//! non-2xx is an [`HttpError::Api`] and the body must decode into `T`.
//!
//! Example (no_run):
//! ```rust
//! # async fn demo() -> Result<(), wayfinder_http::HttpError> {
//! let client = wayfinder_http::HttpClient::new("https://api.example.com")?;
//! let got: serde_json::Value = client
//!     .get_json("v1/items", wayfinder_http::RequestOpts::default())
//!     .await?;
//! # Ok(()) }
//! ```
//!
//! Observability: structured `tracing` events are emitted for request start,
//! response headers, body snippets (truncated), final errors, and
//! (optionally) raw request/response lines (target `http.raw`).

use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use reqwest::{Client, Method, StatusCode, Url};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::borrow::Cow;
use std::env;
use std::time::{Duration, Instant};
use thiserror::Error;

// ==============================
// Raw logging toggles
// ==============================

const RAW_ENV: &str = "WAYFINDER_HTTP_RAW";
const RAW_MAX_BODY: usize = 64 * 1024; // cap raw body logs (64 KiB)
const SNIPPET_MAX: usize = 500;

fn raw_enabled() -> bool {
    matches!(
        env::var(RAW_ENV).as_deref(),
        Ok("1") | Ok("true") | Ok("yes")
    )
}

fn is_sensitive_header(name: &str) -> bool {
    matches!(
        name.to_ascii_lowercase().as_str(),
        "authorization" | "cookie" | "set-cookie" | "x-api-key" | "proxy-authorization"
    )
}

/// Render a best-effort curl command for repro/debug, with secrets redacted.
fn make_curl(method: &Method, url: &Url, headers: &HeaderMap, body: Option<&[u8]>) -> String {
    let mut parts = vec!["curl".to_string(), format!("-X{}", method)];
    for (name, val) in headers.iter() {
        let v = if is_sensitive_header(name.as_str()) {
            "<redacted>".to_string()
        } else {
            val.to_str().unwrap_or("").to_string()
        };
        parts.push(format!(
            "-H '{}: {}'",
            name.as_str(),
            v.replace('\'', r"'\''")
        ));
    }
    if let Some(bytes) = body {
        if let Ok(s) = std::str::from_utf8(bytes) {
            let mut s = s.to_string();
            if s.len() > RAW_MAX_BODY {
                truncate_on_boundary(&mut s, RAW_MAX_BODY);
                s.push('…');
            }
            parts.push(format!("-d '{}'", s.replace('\'', r"'\''")));
        } else {
            parts.push(format!("--data-binary @- # ({} bytes)", bytes.len()));
        }
    }
    parts.push(format!("'{}'", url.as_str()));
    parts.join(" ")
}

/// Redact sensitive headers for logging
fn redact_headers(h: &HeaderMap) -> Vec<(String, String)> {
    h.iter()
        .map(|(k, v)| {
            let key = k.as_str().to_string();
            let val = if is_sensitive_header(&key) {
                "<redacted>".to_string()
            } else {
                v.to_str().unwrap_or("").to_string()
            };
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

// ==============================
// Request Options
// ==============================

/// Per-request tuning knobs for the HTTP client.
///
/// ```
/// use wayfinder_http::RequestOpts;
/// use std::borrow::Cow;
/// use std::time::Duration;
///
/// let opts = RequestOpts {
///     timeout: Some(Duration::from_secs(30)),
///     query: Some(vec![("q", Cow::Borrowed("Lalbagh"))]),
///     ..Default::default()
/// };
///
/// assert_eq!(opts.timeout.unwrap().as_secs(), 30);
/// ```
#[derive(Clone, Debug, Default)]
pub struct RequestOpts<'a> {
    /// Overrides the client's default timeout for this call.
    pub timeout: Option<Duration>,
    pub headers: Option<HeaderMap>,
    pub query: Option<Vec<(&'a str, Cow<'a, str>)>>, // e.g. [("q", "term".into())]
}

/// A response body read once as text, with the metadata callers may log.
#[derive(Clone, Debug)]
pub struct TextResponse {
    pub status: StatusCode,
    pub content_type: Option<String>,
    pub body: String,
}

// ==============================
// Client
// ==============================

#[derive(Clone)]
pub struct HttpClient {
    base: Url,
    inner: Client,
    default_headers: HeaderMap,
    /// `None` means the call waits as long as the transport does.
    pub default_timeout: Option<Duration>,
    connect_timeout: Option<Duration>,
}

fn build_client(connect_timeout: Option<Duration>) -> Result<Client, HttpError> {
    let mut builder = Client::builder();
    if let Some(t) = connect_timeout {
        builder = builder.connect_timeout(t);
    }
    builder.build().map_err(|e| HttpError::Build(e.to_string()))
}

impl HttpClient {
    /// Construct a client anchored to a base URL.
    ///
    /// ```no_run
    /// use wayfinder_http::{HttpClient, HttpError};
    ///
    /// let client = HttpClient::new("https://api.example.com")?;
    /// assert_eq!(client.default_timeout, None);
    /// # Ok::<(), HttpError>(())
    /// ```
    pub fn new(base: &str) -> Result<Self, HttpError> {
        let base = Url::parse(base).map_err(|e| HttpError::Url(e.to_string()))?;
        Ok(Self {
            base,
            inner: build_client(None)?,
            default_headers: HeaderMap::new(),
            default_timeout: None,
            connect_timeout: None,
        })
    }

    /// Set a default timeout applied to every call without its own. The same
    /// bound caps connection setup; `None` leaves both unbounded.
    ///
    /// ```no_run
    /// use wayfinder_http::{HttpClient, HttpError};
    /// use std::time::Duration;
    ///
    /// let client = HttpClient::new("https://api.example.com")?
    ///     .with_timeout(Some(Duration::from_secs(2)));
    /// assert_eq!(client.default_timeout, Some(Duration::from_secs(2)));
    /// # Ok::<(), HttpError>(())
    /// ```
    pub fn with_timeout(mut self, dur: Option<Duration>) -> Self {
        self.default_timeout = dur;
        if self.connect_timeout != dur {
            match build_client(dur) {
                Ok(inner) => {
                    self.inner = inner;
                    self.connect_timeout = dur;
                }
                // The request timeout still bounds the whole call.
                Err(e) => tracing::warn!(error = %e, "http.client.rebuild_failed"),
            }
        }
        self
    }

    /// Bound on connection setup, if any.
    pub fn connect_timeout(&self) -> Option<Duration> {
        self.connect_timeout
    }

    /// Attach a header sent with every request (e.g. `User-Agent`).
    pub fn with_default_header(
        mut self,
        name: reqwest::header::HeaderName,
        value: &str,
    ) -> Result<Self, HttpError> {
        let value = HeaderValue::from_str(value)
            .map_err(|e| HttpError::Build(format!("invalid header {name}: {e}")))?;
        self.default_headers.insert(name, value);
        Ok(self)
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    /// GET and decode JSON; non-2xx responses are errors.
    pub async fn get_json<T>(&self, path: &str, opts: RequestOpts<'_>) -> Result<T, HttpError>
    where
        T: DeserializeOwned,
    {
        let sent = self.send::<()>(Method::GET, path, None, &opts).await?;
        let snippet = snip_body(sent.body.as_bytes());

        if !sent.status.is_success() {
            let message = extract_error_message(sent.body.as_bytes());
            tracing::warn!(
                req_id=%sent.req_id,
                status=%sent.status,
                message=%message,
                body_snippet=%snippet,
                "http.error"
            );
            return Err(HttpError::Api {
                status: sent.status,
                message,
                request_id: sent.req_id,
            });
        }

        serde_json::from_str::<T>(&sent.body).map_err(|e| {
            tracing::warn!(
                req_id=%sent.req_id,
                serde_line=%e.line(),
                serde_col=%e.column(),
                serde_err=%e.to_string(),
                body_snippet=%snippet,
                "http.response.decode_error"
            );
            HttpError::Decode(e.to_string(), snippet)
        })
    }

    /// POST a JSON body and return the response body as text, whatever the status.
    pub async fn post_json_text<B>(
        &self,
        path: &str,
        body: &B,
        opts: RequestOpts<'_>,
    ) -> Result<TextResponse, HttpError>
    where
        B: Serialize + ?Sized,
    {
        let sent = self.send(Method::POST, path, Some(body), &opts).await?;
        Ok(TextResponse {
            status: sent.status,
            content_type: sent.content_type,
            body: sent.body,
        })
    }

    fn resolve(&self, path: &str) -> Result<Url, HttpError> {
        if path.is_empty() {
            return Ok(self.base.clone());
        }
        self.base
            .join(path)
            .map_err(|e| HttpError::Url(e.to_string()))
    }

    // ==============================
    // Core request implementation
    // ==============================

    async fn send<B>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        opts: &RequestOpts<'_>,
    ) -> Result<Sent, HttpError>
    where
        B: Serialize + ?Sized,
    {
        let url = self.resolve(path)?;
        let mut rb = self.inner.request(method.clone(), url.clone());

        let timeout = opts.timeout.or(self.default_timeout);
        if let Some(t) = timeout {
            rb = rb.timeout(t);
        }

        if let Some(q) = &opts.query {
            let pairs: Vec<(&str, &str)> = q.iter().map(|(k, v)| (*k, v.as_ref())).collect();
            rb = rb.query(&pairs);
        }

        // Serialize up front so the exact bytes can be logged.
        let mut request_body_bytes: Option<Vec<u8>> = None;
        if let Some(b) = body {
            let bytes = serde_json::to_vec(b).map_err(|e| HttpError::Build(e.to_string()))?;
            request_body_bytes = Some(bytes.clone());
            rb = rb.header(CONTENT_TYPE, "application/json").body(bytes);
        }

        let mut merged = self.default_headers.clone();
        if let Some(hdrs) = &opts.headers {
            for (k, v) in hdrs.iter() {
                merged.insert(k, v.clone());
            }
        }
        rb = rb.headers(merged.clone());

        let req_id = format!("r{}", uuid::Uuid::new_v4().simple());

        tracing::debug!(
            req_id=%req_id,
            method=%method,
            host_path=%format!("{}{}", url.host_str().unwrap_or("-"), url.path()),
            query=?opts.query,
            timeout_ms=?timeout.map(|t| t.as_millis() as u64),
            has_body=%body.is_some(),
            "http.request.start"
        );

        if raw_enabled() {
            let curl = make_curl(&method, &url, &merged, request_body_bytes.as_deref());
            tracing::debug!(target: "http.raw", %req_id, %curl, "request");
        }

        let t0 = Instant::now();
        let resp = rb.send().await.map_err(|err| {
            let message = err.to_string();
            tracing::warn!(req_id=%req_id, message=%message, "http.network_error.send");
            HttpError::Network(message)
        })?;

        let status = resp.status();
        let headers = resp.headers().clone();
        // The body stream is consumed here and never read again.
        let text = resp.text().await.map_err(|err| {
            let message = err.to_string();
            tracing::warn!(req_id=%req_id, message=%message, "http.network_error.body");
            HttpError::Network(message)
        })?;
        let dur_ms = t0.elapsed().as_millis() as u64;

        let content_type = headers
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        tracing::debug!(
            req_id=%req_id,
            %status,
            duration_ms=dur_ms,
            body_len=text.len(),
            content_type=?content_type,
            "http.response.headers"
        );

        if raw_enabled() {
            let hdrs = redact_headers(&headers);
            let mut body_snip = text.clone();
            let truncated = body_snip.len() > RAW_MAX_BODY;
            if truncated {
                truncate_on_boundary(&mut body_snip, RAW_MAX_BODY);
            }
            tracing::info!(
                target:"http.raw",
                %req_id,
                status=%status,
                duration_ms=dur_ms,
                headers=?hdrs,
                body=%body_snip,
                truncated
            );
        }

        tracing::trace!(
            req_id=%req_id,
            body_snippet=%snip_body(text.as_bytes()),
            "http.response.body_snippet"
        );

        Ok(Sent {
            req_id,
            status,
            content_type,
            body: text,
        })
    }
}

struct Sent {
    req_id: String,
    status: StatusCode,
    content_type: Option<String>,
    body: String,
}

// ==============================
// Helpers
// ==============================

fn extract_error_message(body: &[u8]) -> String {
    // Nested: {"error":{"message":"..."}}
    #[derive(Deserialize)]
    struct NestedEnv {
        error: NestedDetail,
    }
    #[derive(Deserialize)]
    struct NestedDetail {
        message: String,
    }

    // Generic: {"message":"..."} or {"detail":"..."} or {"error":"..."}
    #[derive(Deserialize)]
    struct Msg {
        #[serde(default)]
        message: String,
        #[serde(default)]
        detail: String,
        #[serde(default)]
        error: String,
    }

    if let Ok(env) = serde_json::from_slice::<NestedEnv>(body) {
        return env.error.message;
    }
    if let Ok(m) = serde_json::from_slice::<Msg>(body) {
        if !m.message.is_empty() {
            return m.message;
        }
        if !m.detail.is_empty() {
            return m.detail;
        }
        if !m.error.is_empty() {
            return m.error;
        }
    }
    snip_body(body)
}

fn truncate_on_boundary(s: &mut String, max: usize) {
    let mut cut = max.min(s.len());
    while cut > 0 && !s.is_char_boundary(cut) {
        cut -= 1;
    }
    s.truncate(cut);
}

fn snip_body(body: &[u8]) -> String {
    let mut snip = String::from_utf8_lossy(body).to_string();
    if snip.len() > SNIPPET_MAX {
        truncate_on_boundary(&mut snip, SNIPPET_MAX);
        snip.push_str("...");
    }
    snip
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::{AUTHORIZATION, HeaderName};

    #[test]
    fn error_message_prefers_nested_then_flat_fields() {
        assert_eq!(
            extract_error_message(br#"{"error":{"message":"boom"}}"#),
            "boom"
        );
        assert_eq!(extract_error_message(br#"{"detail":"nope"}"#), "nope");
        assert_eq!(extract_error_message(br#"{"error":"flat"}"#), "flat");
        assert_eq!(extract_error_message(b"plain text"), "plain text");
    }

    #[test]
    fn snippets_are_capped_on_char_boundaries() {
        let long = "é".repeat(400);
        let snip = snip_body(long.as_bytes());
        assert!(snip.ends_with("..."));
        assert!(snip.len() <= SNIPPET_MAX + 3);
    }

    #[test]
    fn curl_and_header_logs_redact_secrets() {
        let mut h = HeaderMap::new();
        h.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc"));
        h.insert(
            HeaderName::from_static("user-agent"),
            HeaderValue::from_static("wayfinder-test"),
        );
        let url = Url::parse("https://example.com/search?q=x").unwrap();
        let curl = make_curl(&Method::GET, &url, &h, None);
        assert!(!curl.contains("abc"));
        assert!(curl.contains("wayfinder-test"));

        let redacted = redact_headers(&h);
        assert!(redacted
            .iter()
            .any(|(k, v)| k == "authorization" && v == "<redacted>"));
    }

    #[test]
    fn empty_path_resolves_to_base() {
        let client = HttpClient::new("http://localhost:5678/webhook/plan-trip").unwrap();
        let url = client.resolve("").unwrap();
        assert_eq!(url.as_str(), "http://localhost:5678/webhook/plan-trip");
    }

    #[test]
    fn connect_timeout_follows_the_default_timeout() {
        let client = HttpClient::new("http://localhost:5678/").unwrap();
        assert_eq!(client.connect_timeout(), None);

        let unbounded = client.clone().with_timeout(None);
        assert_eq!(unbounded.default_timeout, None);
        assert_eq!(unbounded.connect_timeout(), None);

        let bounded = client.with_timeout(Some(Duration::from_secs(3)));
        assert_eq!(bounded.connect_timeout(), Some(Duration::from_secs(3)));

        let cleared = bounded.with_timeout(None);
        assert_eq!(cleared.connect_timeout(), None);
    }
}
