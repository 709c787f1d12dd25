//! Outbound request plumbing: the request descriptor, the transport seam,
//! the reqwest-backed implementation and the retry wrapper.

pub mod http;
pub mod retry;

pub use http::HttpTransport;
pub use retry::{RetryMode, RetryPolicy, RetryingTransport};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use url::Url;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Patch,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fully resolved request for one item. Built fresh per item.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestDescriptor {
    pub method: HttpMethod,
    pub url: Url,
    pub body: Option<Value>,
    pub query: Option<Map<String, Value>>,
}

impl RequestDescriptor {
    pub fn path(&self) -> &str {
        self.url.path()
    }
}

/// Envelope returned by a transport. The processor emits only `body`.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Value,
}

impl ApiResponse {
    pub fn ok(body: Value) -> Self {
        Self { status: 200, body }
    }
}

/// A single failed attempt.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum TransportFailure {
    /// The service answered with a non-success status.
    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },
    /// The request never got an answer (connect, timeout, reset).
    #[error("Request failed: {0}")]
    Network(String),
    /// The credential provider refused to hand out a token.
    #[error("Credential resolution failed: {0}")]
    Credentials(String),
}

impl TransportFailure {
    /// Connection-level failures, 408, 429 and 5xx.
    pub fn is_transient(&self) -> bool {
        match self {
            TransportFailure::Network(_) => true,
            TransportFailure::Status { status, .. } => {
                *status == 408 || *status == 429 || *status >= 500
            }
            TransportFailure::Credentials(_) => false,
        }
    }
}

/// Executes one request against the remote service. Implementations attach
/// authentication themselves.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: &RequestDescriptor) -> Result<ApiResponse, TransportFailure>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn send(&self, request: &RequestDescriptor) -> Result<ApiResponse, TransportFailure> {
        (**self).send(request).await
    }
}
