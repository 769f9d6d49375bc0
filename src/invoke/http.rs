//! HTTP invoker - executes built requests under a bounded timeout
//!
//! HTTP status codes are surfaced as data, never as invocation failure: a
//! completed 4xx/5xx response is still a [`InvocationResult::Success`] so
//! callers decide the semantics. Only transport failures and deadline
//! overruns produce failure variants. Retries are layered above, in the
//! workflow executor.

use std::time::{Duration, Instant};

use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use super::request::BuiltRequest;
use crate::plugins::HttpMethod;

/// Default per-request timeout in milliseconds
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

/// Classified outcome of one invocation attempt
///
/// Constructed once per attempt and never mutated afterwards.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum InvocationResult {
    /// The request completed with an HTTP response, whatever the status code
    Success {
        /// Numeric HTTP status
        http_status: u16,
        /// Raw response body text
        raw_body: String,
        /// Best-effort JSON parse of the body; the raw string when the body
        /// is not valid JSON
        parsed_body: Value,
        /// Wall-clock duration of the attempt
        duration_ms: u64,
    },
    /// The response could not be read or the request was malformed
    ApplicationError {
        /// Failure description
        message: String,
        /// Status code, when a response line was received
        http_status: Option<u16>,
        /// Partial body, when any was received
        raw_body: Option<String>,
        /// Wall-clock duration of the attempt
        duration_ms: u64,
    },
    /// The deadline elapsed before a response completed
    Timeout {
        /// The URL that was attempted
        request_url: String,
        /// Wall-clock duration of the attempt
        duration_ms: u64,
    },
    /// Connection, DNS, or TLS failure
    TransportError {
        /// Failure description
        message: String,
        /// Wall-clock duration of the attempt
        duration_ms: u64,
    },
}

impl InvocationResult {
    /// Whether the invocation completed with an HTTP response
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// Whether the invocation hit its deadline
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    /// HTTP status code, when one was received
    #[must_use]
    pub const fn http_status(&self) -> Option<u16> {
        match self {
            Self::Success { http_status, .. } => Some(*http_status),
            Self::ApplicationError { http_status, .. } => *http_status,
            _ => None,
        }
    }

    /// Wall-clock duration of the attempt
    #[must_use]
    pub const fn duration_ms(&self) -> u64 {
        match self {
            Self::Success { duration_ms, .. }
            | Self::ApplicationError { duration_ms, .. }
            | Self::Timeout { duration_ms, .. }
            | Self::TransportError { duration_ms, .. } => *duration_ms,
        }
    }

    /// Parsed body on success
    #[must_use]
    pub const fn parsed_body(&self) -> Option<&Value> {
        match self {
            Self::Success { parsed_body, .. } => Some(parsed_body),
            _ => None,
        }
    }
}

/// Executes built requests with an explicit per-request deadline
#[derive(Debug, Clone, Default)]
pub struct HttpInvoker {
    client: reqwest::Client,
}

impl HttpInvoker {
    /// Create an invoker with a default client
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an invoker over an existing client (shared connection pools)
    #[must_use]
    pub const fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Execute `request`, classifying the outcome.
    ///
    /// `timeout_ms` falls back to [`DEFAULT_TIMEOUT_MS`]. The call always
    /// returns within the timeout plus bounded connect/read slack; it never
    /// waits unbounded.
    pub async fn invoke(
        &self,
        request: &BuiltRequest,
        timeout_ms: Option<u64>,
    ) -> InvocationResult {
        let timeout = Duration::from_millis(timeout_ms.unwrap_or(DEFAULT_TIMEOUT_MS));
        let started = Instant::now();

        let mut builder = self
            .client
            .request(to_reqwest_method(request.method), request.url.clone())
            .timeout(timeout);
        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }
        if let Some((username, password)) = &request.basic_auth {
            builder = builder.basic_auth(username, Some(password));
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = match builder.send().await {
            Ok(response) => response,
            Err(e) => return classify_send_error(&e, &request.url, started),
        };

        let http_status = response.status().as_u16();
        let raw_body = match response.text().await {
            Ok(text) => text,
            Err(e) if e.is_timeout() => {
                return InvocationResult::Timeout {
                    request_url: request.url.to_string(),
                    duration_ms: elapsed_ms(started),
                };
            }
            Err(e) => {
                return InvocationResult::ApplicationError {
                    message: format!("failed to read response body: {e}"),
                    http_status: Some(http_status),
                    raw_body: None,
                    duration_ms: elapsed_ms(started),
                };
            }
        };

        // Parse failures degrade to the raw text; they never fail the call.
        let parsed_body = serde_json::from_str::<Value>(&raw_body)
            .unwrap_or_else(|_| Value::String(raw_body.clone()));

        let duration_ms = elapsed_ms(started);
        debug!(
            method = %request.method,
            url = %request.url,
            http_status,
            duration_ms,
            "invocation completed"
        );

        InvocationResult::Success {
            http_status,
            raw_body,
            parsed_body,
            duration_ms,
        }
    }
}

fn classify_send_error(
    error: &reqwest::Error,
    url: &url::Url,
    started: Instant,
) -> InvocationResult {
    let duration_ms = elapsed_ms(started);
    if error.is_timeout() {
        InvocationResult::Timeout {
            request_url: url.to_string(),
            duration_ms,
        }
    } else {
        InvocationResult::TransportError {
            message: error.to_string(),
            duration_ms,
        }
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}

const fn to_reqwest_method(method: HttpMethod) -> reqwest::Method {
    match method {
        HttpMethod::Get => reqwest::Method::GET,
        HttpMethod::Post => reqwest::Method::POST,
        HttpMethod::Put => reqwest::Method::PUT,
        HttpMethod::Patch => reqwest::Method::PATCH,
        HttpMethod::Delete => reqwest::Method::DELETE,
    }
}
