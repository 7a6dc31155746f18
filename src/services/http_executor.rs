//! One logged HTTP attempt per call.
//!
//! [`HttpExecutor::execute`] builds the request from a [`RequestDescriptor`],
//! performs the exchange under the descriptor's timeout, writes exactly one
//! audit entry whatever happens, and hands back either a [`ResultEnvelope`]
//! or the [`ExecutionError`] that ended the attempt.

use crate::constants::network::{DEFAULT_METHOD, DEFAULT_TIMEOUT_SECS, MAX_REDIRECTS};
use crate::constants::protocols::ALLOWED_HTTP;
use crate::errors::{ExecutionError, ToolError};
use crate::services::logger::Logger;
use crate::services::request_log::RequestLog;
use futures::StreamExt;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, COOKIE};
use reqwest::{Client, Method};
use serde::Serialize;
use std::collections::BTreeMap;
use std::error::Error;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Inputs of a single attempt. Built fresh per invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestDescriptor {
    pub method: String,
    pub url: String,
    pub headers: BTreeMap<String, String>,
    pub cookies: BTreeMap<String, String>,
    pub body: String,
    pub timeout: Duration,
}

impl RequestDescriptor {
    /// Uppercases `method`; an empty method means GET. Surrounding
    /// whitespace is kept and rejected when the request is built.
    pub fn new(method: &str, url: impl Into<String>) -> Self {
        let method = if method.is_empty() {
            DEFAULT_METHOD.to_string()
        } else {
            method.to_uppercase()
        };
        Self {
            method,
            url: url.into(),
            headers: BTreeMap::new(),
            cookies: BTreeMap::new(),
            body: String::new(),
            timeout: Duration::from_secs_f64(DEFAULT_TIMEOUT_SECS),
        }
    }

    pub fn with_headers(mut self, headers: BTreeMap<String, String>) -> Self {
        self.headers = headers;
        self
    }

    pub fn with_cookies(mut self, cookies: BTreeMap<String, String>) -> Self {
        self.cookies = cookies;
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// `Cookie` header value for the cookie map, `name=value` pairs in key order.
    pub fn cookie_header(&self) -> Option<String> {
        if self.cookies.is_empty() {
            return None;
        }
        Some(
            self.cookies
                .iter()
                .map(|(name, value)| format!("{}={}", name, value))
                .collect::<Vec<_>>()
                .join("; "),
        )
    }
}

/// What one attempt produced, as seen by the audit log.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<'a> {
    Success {
        status: u16,
        headers: &'a BTreeMap<String, String>,
        body: &'a str,
    },
    Failure {
        error: String,
        partial_status: Option<u16>,
    },
}

/// Returned to the caller after a successful attempt. The body is never
/// truncated here; only the audit preview is.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultEnvelope {
    pub method: String,
    pub url: String,
    pub status_code: u16,
    pub response_headers: BTreeMap<String, String>,
    pub response_content: String,
    pub response_length: usize,
    pub request_headers: BTreeMap<String, String>,
    pub request_cookies: BTreeMap<String, String>,
    pub request_body: String,
    pub logged_to: String,
}

#[derive(Clone)]
pub struct HttpExecutor {
    logger: Logger,
    client: Client,
    request_log: Arc<RequestLog>,
}

impl HttpExecutor {
    pub fn new(logger: Logger, request_log: Arc<RequestLog>) -> Result<Self, ToolError> {
        let client = Client::builder()
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .build()
            .map_err(|err| ToolError::internal(format!("Failed to build HTTP client: {}", err)))?;
        Ok(Self {
            logger: logger.child("http"),
            client,
            request_log,
        })
    }

    pub async fn execute(
        &self,
        descriptor: RequestDescriptor,
    ) -> Result<ResultEnvelope, ExecutionError> {
        let (status, headers, body) = match self.attempt(&descriptor).await {
            Ok(parts) => parts,
            Err(err) => {
                let outcome = Outcome::Failure {
                    error: err.to_string(),
                    partial_status: err.status(),
                };
                self.request_log.record(&descriptor, &outcome);
                self.logger.warn(
                    "HTTP request failed",
                    Some(&serde_json::json!({
                        "method": descriptor.method,
                        "url": descriptor.url,
                        "error": err.to_string(),
                    })),
                );
                return Err(err);
            }
        };

        let location = self.request_log.record(
            &descriptor,
            &Outcome::Success {
                status,
                headers: &headers,
                body: &body,
            },
        );
        self.logger.debug(
            "HTTP request completed",
            Some(&serde_json::json!({
                "method": descriptor.method,
                "url": descriptor.url,
                "status": status,
                "bytes": body.len(),
            })),
        );

        let RequestDescriptor {
            method,
            url,
            headers: request_headers,
            cookies: request_cookies,
            body: request_body,
            ..
        } = descriptor;
        Ok(ResultEnvelope {
            method,
            url,
            status_code: status,
            response_headers: headers,
            response_length: body.len(),
            response_content: body,
            request_headers,
            request_cookies,
            request_body,
            logged_to: location.to_string(),
        })
    }

    async fn attempt(
        &self,
        descriptor: &RequestDescriptor,
    ) -> Result<(u16, BTreeMap<String, String>, String), ExecutionError> {
        let request = self.build_request(descriptor)?;
        let response = self
            .client
            .execute(request)
            .await
            .map_err(|err| classify_send_error(err, descriptor.timeout))?;
        let status = response.status().as_u16();
        let headers = flatten_headers(response.headers());
        let body = read_body(response, status, descriptor.timeout).await?;
        Ok((status, headers, body))
    }

    fn build_request(
        &self,
        descriptor: &RequestDescriptor,
    ) -> Result<reqwest::Request, ExecutionError> {
        let method = Method::from_bytes(descriptor.method.as_bytes()).map_err(|_| {
            ExecutionError::Construction(format!("invalid HTTP method: {:?}", descriptor.method))
        })?;
        let url = parse_url(&descriptor.url)?;
        let headers = build_header_map(descriptor)?;
        let mut builder = self
            .client
            .request(method, url)
            .headers(headers)
            .timeout(descriptor.timeout);
        if !descriptor.body.is_empty() {
            builder = builder.body(descriptor.body.clone());
        }
        builder
            .build()
            .map_err(|err| ExecutionError::Construction(error_chain(&err)))
    }
}

fn parse_url(raw: &str) -> Result<Url, ExecutionError> {
    let parsed = Url::parse(raw)
        .map_err(|err| ExecutionError::Construction(format!("invalid URL {:?}: {}", raw, err)))?;
    let scheme = parsed.scheme();
    if !ALLOWED_HTTP
        .iter()
        .any(|allowed| allowed.trim_end_matches(':') == scheme)
    {
        return Err(ExecutionError::Construction(format!(
            "unsupported protocol scheme {:?}",
            scheme
        )));
    }
    Ok(parsed)
}

/// Caller headers plus the cookie map folded into `Cookie`.
fn build_header_map(descriptor: &RequestDescriptor) -> Result<HeaderMap, ExecutionError> {
    let mut map = HeaderMap::new();
    for (key, value) in &descriptor.headers {
        let name = HeaderName::from_bytes(key.as_bytes()).map_err(|_| {
            ExecutionError::Construction(format!("invalid header name: {:?}", key))
        })?;
        let value = HeaderValue::from_bytes(value.as_bytes()).map_err(|_| {
            ExecutionError::Construction(format!("invalid value for header {:?}", key))
        })?;
        map.insert(name, value);
    }
    if let Some(cookies) = descriptor.cookie_header() {
        let combined = match map.get(COOKIE) {
            Some(existing) => {
                format!("{}; {}", String::from_utf8_lossy(existing.as_bytes()), cookies)
            }
            None => cookies,
        };
        let value = HeaderValue::from_bytes(combined.as_bytes()).map_err(|_| {
            ExecutionError::Construction("invalid cookie name or value".to_string())
        })?;
        map.insert(COOKIE, value);
    }
    Ok(map)
}

/// First value per header name; later repeats are dropped.
pub fn flatten_headers(headers: &HeaderMap) -> BTreeMap<String, String> {
    let mut out = BTreeMap::new();
    for (name, value) in headers {
        out.entry(name.as_str().to_string())
            .or_insert_with(|| String::from_utf8_lossy(value.as_bytes()).into_owned());
    }
    out
}

async fn read_body(
    response: reqwest::Response,
    status: u16,
    timeout: Duration,
) -> Result<String, ExecutionError> {
    let mut buffer = Vec::new();
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|err| {
            if err.is_timeout() {
                timeout_error(timeout)
            } else {
                ExecutionError::Read {
                    status,
                    message: error_chain(&err),
                }
            }
        })?;
        buffer.extend_from_slice(&chunk);
    }
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}

fn classify_send_error(err: reqwest::Error, timeout: Duration) -> ExecutionError {
    if err.is_timeout() {
        return timeout_error(timeout);
    }
    if err.is_builder() {
        return ExecutionError::Construction(error_chain(&err));
    }
    ExecutionError::Network(error_chain(&err))
}

fn timeout_error(timeout: Duration) -> ExecutionError {
    ExecutionError::Timeout(format!(
        "HTTP request timed out after {}s",
        timeout.as_secs_f64()
    ))
}

/// `err` followed by each of its sources, joined with ": ".
fn error_chain(err: &dyn Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !message.contains(&text) {
            message.push_str(": ");
            message.push_str(&text);
        }
        source = cause.source();
    }
    message
}
