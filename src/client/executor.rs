//! Retrying request executor for outbound provider calls
//!
//! Transient failures (no response at all, 429, 5xx) are retried a bounded
//! number of times with exponential backoff between attempts; other client
//! errors surface immediately. Terminal errors carry a normalized message,
//! never raw transport internals.

use crate::config::RetryConfig;
use crate::utils::backoff::{backoff_delay, jittered_backoff_delay};
use crate::utils::error::{Error, Result};
use reqwest::{Method, Response, StatusCode};
use serde_json::Value;
use tracing::{debug, warn};

/// One outbound request, rebuilt for every attempt so retries are safe.
#[derive(Debug, Clone)]
pub struct RequestSpec {
    /// HTTP method
    pub method: Method,
    /// Absolute request URL
    pub url: String,
    /// Bearer token, if the upstream wants one
    pub bearer_token: Option<String>,
    /// JSON body, if any
    pub json_body: Option<Value>,
}

impl RequestSpec {
    /// POST with a JSON body, the shape provider calls take.
    pub fn post_json(url: impl Into<String>, body: Value) -> Self {
        Self {
            method: Method::POST,
            url: url.into(),
            bearer_token: None,
            json_body: Some(body),
        }
    }

    /// Plain GET.
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: Method::GET,
            url: url.into(),
            bearer_token: None,
            json_body: None,
        }
    }

    /// Attach a bearer token.
    pub fn with_bearer(mut self, token: impl Into<String>) -> Self {
        self.bearer_token = Some(token.into());
        self
    }
}

/// HTTP client with bounded retries and backoff between attempts.
///
/// Each attempt is bounded by the configured per-request timeout,
/// independent of the retry budget.
pub struct ResilientClient {
    http: reqwest::Client,
    retry: RetryConfig,
}

impl ResilientClient {
    /// Build the client from retry settings.
    pub fn new(retry: &RetryConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(retry.request_timeout())
            .build()
            .map_err(Error::HttpClient)?;

        Ok(Self {
            http,
            retry: retry.clone(),
        })
    }

    /// Issue the request, retrying transient failures up to the configured
    /// budget.
    ///
    /// Returns the first success, fails fast on non-retryable upstream
    /// rejections (4xx other than 429), and otherwise surfaces the last
    /// failure with a normalized message.
    pub async fn execute(&self, spec: &RequestSpec) -> Result<Response> {
        let max_attempts = self.retry.max_retries + 1;
        let mut last_failure: Option<Error> = None;

        for attempt in 0..max_attempts {
            if attempt > 0 {
                let delay = if self.retry.jitter {
                    jittered_backoff_delay(
                        attempt - 1,
                        self.retry.base_delay(),
                        self.retry.max_delay(),
                    )
                } else {
                    backoff_delay(attempt - 1, self.retry.base_delay(), self.retry.max_delay())
                };
                debug!(
                    "Retrying {} {} in {:?} (attempt {}/{})",
                    spec.method,
                    spec.url,
                    delay,
                    attempt + 1,
                    max_attempts
                );
                tokio::time::sleep(delay).await;
            }

            match self.send_once(spec).await {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        if attempt > 0 {
                            debug!("{} {} succeeded on attempt {}", spec.method, spec.url, attempt + 1);
                        }
                        return Ok(response);
                    }
                    if !is_retryable_status(status) {
                        // The upstream meant it; retrying will not help.
                        return Err(rejection_error(response).await);
                    }
                    warn!(
                        "{} {} returned {} (attempt {}/{})",
                        spec.method,
                        spec.url,
                        status,
                        attempt + 1,
                        max_attempts
                    );
                    last_failure = Some(rejection_error(response).await);
                }
                Err(e) => {
                    warn!(
                        "{} {} failed: {} (attempt {}/{})",
                        spec.method,
                        spec.url,
                        e,
                        attempt + 1,
                        max_attempts
                    );
                    last_failure = Some(normalize_transport_error(e));
                }
            }
        }

        Err(last_failure.unwrap_or_else(|| Error::Upstream {
            status: None,
            message: "request failed".to_string(),
        }))
    }

    async fn send_once(&self, spec: &RequestSpec) -> std::result::Result<Response, reqwest::Error> {
        let mut request = self.http.request(spec.method.clone(), &spec.url);
        if let Some(token) = &spec.bearer_token {
            request = request.bearer_auth(token);
        }
        if let Some(body) = &spec.json_body {
            request = request.json(body);
        }
        request.send().await
    }
}

/// Transient statuses worth another attempt.
fn is_retryable_status(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

/// Turn an error response into [`Error::Upstream`], preferring the message
/// the server put in its body over anything lower-level.
async fn rejection_error(response: Response) -> Error {
    let status = response.status();
    let message = match response.json::<Value>().await {
        Ok(body) => extract_error_message(&body)
            .unwrap_or_else(|| format!("upstream returned {status}")),
        Err(_) => format!("upstream returned {status}"),
    };

    Error::Upstream {
        status: Some(status.as_u16()),
        message,
    }
}

/// Providers wrap failures as `{"error": {"message": ...}}` or a bare
/// top-level `message`.
fn extract_error_message(body: &Value) -> Option<String> {
    body.get("error")
        .and_then(|e| e.get("message"))
        .or_else(|| body.get("message"))
        .and_then(Value::as_str)
        .map(str::to_string)
}

fn normalize_transport_error(e: reqwest::Error) -> Error {
    let message = if e.is_timeout() {
        "request timed out".to_string()
    } else if e.is_connect() {
        "could not reach upstream service".to_string()
    } else {
        format!("request failed: {e}")
    };

    Error::Upstream {
        status: None,
        message,
    }
}
