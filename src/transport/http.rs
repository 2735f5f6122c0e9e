use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, info, warn};
use url::Url;

use super::{ApiResponse, ApiTransport, TransportError};
use crate::error::{RecipeStateError, Result};

/// reqwest-backed transport.
///
/// Keeps a cookie store so the session cookie set at login is sent with
/// every request, and applies one timeout to every request.
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpTransport {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let mut base_url = Url::parse(base_url).map_err(|e| {
            RecipeStateError::Config(format!("Invalid API base URL '{}': {}", base_url, e))
        })?;
        // Url::join replaces the last path segment unless the base ends in '/'
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let client = reqwest::Client::builder()
            .cookie_store(true)
            .timeout(timeout)
            .build()
            .map_err(|e| RecipeStateError::Transport(format!("Failed to build HTTP client: {}", e)))?;

        info!("HTTP transport ready for {}", base_url);
        Ok(Self { client, base_url })
    }

    /// Resolve an endpoint path against the base URL.
    pub fn endpoint(&self, path: &str) -> std::result::Result<Url, TransportError> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|_| TransportError::InvalidPath(path.to_string()))
    }
}

#[async_trait]
impl ApiTransport for HttpTransport {
    async fn get(&self, path: &str) -> std::result::Result<ApiResponse, TransportError> {
        let url = self.endpoint(path)?;
        debug!("GET {}", url);

        let response = self.client.get(url.clone()).send().await.map_err(|e| {
            if e.is_timeout() {
                warn!("GET {} timed out", url);
                TransportError::Timeout
            } else {
                warn!("GET {} failed: {}", url, e);
                TransportError::Network(e.to_string())
            }
        })?;

        let status = response.status().as_u16();
        let text = response.text().await.map_err(|e| {
            if e.is_timeout() {
                TransportError::Timeout
            } else {
                TransportError::Network(format!("Failed to read response body from '{}': {}", url, e))
            }
        })?;

        let body = if text.trim().is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&text).unwrap_or_else(|e| {
                debug!("Response from {} is not JSON ({}), treating body as null", url, e);
                Value::Null
            })
        };

        debug!("GET {} -> {}", url, status);
        Ok(ApiResponse::new(status, body))
    }
}
