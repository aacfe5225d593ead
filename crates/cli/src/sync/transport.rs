// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Transport abstraction for HTTP communication.
//!
//! Provides a trait-based transport layer that enables:
//! - Real HTTP requests through reqwest for production
//! - Mock transports for unit testing

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

/// Error type for transport operations.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The request did not complete within the timeout.
    #[error("request timed out: {0}")]
    Timeout(String),

    /// No response could be obtained (DNS, refused, reset, TLS).
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// The HTTP client could not be constructed.
    #[error("transport setup failed: {0}")]
    Setup(String),
}

/// Result type for transport operations.
pub type TransportResult<T> = Result<T, TransportError>;

/// HTTP method used by the sync protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Delete,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Method::Get => write!(f, "GET"),
            Method::Post => write!(f, "POST"),
            Method::Delete => write!(f, "DELETE"),
        }
    }
}

/// A request ready to send.
#[derive(Clone, PartialEq)]
pub struct HttpRequest {
    pub method: Method,
    /// Absolute URL including the query string.
    pub url: String,
    /// Bearer token for the `Authorization` header.
    pub bearer: Option<String>,
    /// JSON body.
    pub body: Option<serde_json::Value>,
}

impl fmt::Debug for HttpRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpRequest")
            .field("method", &self.method)
            .field("url", &self.url)
            .field("authorized", &self.bearer.is_some())
            .field("body", &self.body.is_some())
            .finish()
    }
}

/// A response with any status code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Transport trait for request/response communication.
///
/// This trait abstracts over the actual transport mechanism, allowing
/// for easy testing with mock implementations. Non-2xx statuses are
/// responses, not transport errors.
pub trait Transport: Send + Sync {
    /// Send a request and wait for the full response.
    fn execute(
        &self,
        request: HttpRequest,
    ) -> Pin<Box<dyn Future<Output = TransportResult<HttpResponse>> + Send + '_>>;
}

/// HTTP transport implementation using reqwest.
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    /// Default per-request timeout.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

    /// Create a transport whose requests time out after `timeout`.
    pub fn new(timeout: Duration) -> TransportResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("kamisync/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| TransportError::Setup(e.to_string()))?;
        Ok(HttpTransport { client })
    }
}

impl Transport for HttpTransport {
    fn execute(
        &self,
        request: HttpRequest,
    ) -> Pin<Box<dyn Future<Output = TransportResult<HttpResponse>> + Send + '_>> {
        Box::pin(async move {
            let mut builder = match request.method {
                Method::Get => self.client.get(&request.url),
                Method::Post => self.client.post(&request.url),
                Method::Delete => self.client.delete(&request.url),
            };
            if let Some(token) = &request.bearer {
                builder = builder.bearer_auth(token);
            }
            if let Some(body) = &request.body {
                builder = builder.json(body);
            }

            let response = builder.send().await.map_err(classify)?;
            let status = response.status().as_u16();
            let body = response.text().await.map_err(classify)?;
            Ok(HttpResponse { status, body })
        })
    }
}

fn classify(e: reqwest::Error) -> TransportError {
    if e.is_timeout() {
        TransportError::Timeout(e.to_string())
    } else {
        TransportError::ConnectionFailed(error_chain(&e))
    }
}

/// Render an error with its sources, since reqwest's top-level message
/// rarely names the underlying cause.
fn error_chain(e: &dyn std::error::Error) -> String {
    let mut message = e.to_string();
    let mut source = e.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
