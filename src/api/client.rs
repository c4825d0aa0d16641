//! HTTP client for the messages endpoint, direct or through a relay.

use super::ModelClient;
use crate::config::{ApiConfig, RoutingMode};
use crate::error::ApiError;
use crate::types::{MessagesRequest, MessagesResponse};
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, warn};

pub const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Client for the messages API.
pub struct ApiClient {
    http: reqwest::Client,
    mode: RoutingMode,
}

impl ApiClient {
    /// Build a client from API configuration, using its timeout.
    pub fn new(config: &ApiConfig) -> Self {
        Self::with_timeout(config, config.timeout())
    }

    pub fn with_timeout(config: &ApiConfig, timeout: Duration) -> Self {
        Self {
            http: build_http_client(timeout),
            mode: config.mode(),
        }
    }

    pub fn mode(&self) -> &RoutingMode {
        &self.mode
    }
}

/// Build an HTTP client with timeout applied.
fn build_http_client(timeout: Duration) -> reqwest::Client {
    // Fall back to reqwest defaults if builder creation fails for any reason.
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .unwrap_or_else(|_| reqwest::Client::new())
}

#[async_trait]
impl ModelClient for ApiClient {
    async fn send(&self, request: &MessagesRequest) -> Result<MessagesResponse, ApiError> {
        let mut req = self.http.post(self.mode.endpoint()).json(request);
        // The relay attaches credentials server-side.
        if let RoutingMode::Direct { api_key, .. } = &self.mode {
            req = req
                .header("x-api-key", api_key)
                .header("anthropic-version", ANTHROPIC_VERSION);
        }
        debug!(
            mode = self.mode.label(),
            messages = request.messages.len(),
            "sending model request"
        );

        let response = req.send().await?;
        if !response.status().is_success() {
            let code = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            warn!(mode = self.mode.label(), status = code, "model request failed");
            return Err(ApiError::Status { code, body });
        }

        let bytes = response.bytes().await?;
        serde_json::from_slice::<MessagesResponse>(&bytes)
            .map_err(|e| ApiError::InvalidResponse(e.to_string()))
    }
}
