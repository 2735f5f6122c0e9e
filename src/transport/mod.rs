//! Credentialed access to the recipe API.
//!
//! A transport only fails for network-level reasons. Any HTTP status,
//! success or not, comes back as an [`ApiResponse`] so callers can tell a
//! server-reported rejection apart from "couldn't reach the server".

pub mod http;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

pub use http::HttpTransport;

/// Session-info endpoint.
pub const USER_INFORMATION_PATH: &str = "/user_information";

#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    /// Decoded JSON body, `Null` when the body was empty or not JSON.
    pub body: Value,
}

impl ApiResponse {
    pub fn new(status: u16, body: Value) -> Self {
        Self { status, body }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum TransportError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out")]
    Timeout,

    #[error("Invalid request path '{0}'")]
    InvalidPath(String),
}

#[async_trait]
pub trait ApiTransport: Send + Sync {
    /// Issue a credentialed GET for `path` relative to the API base URL.
    async fn get(&self, path: &str) -> Result<ApiResponse, TransportError>;
}
