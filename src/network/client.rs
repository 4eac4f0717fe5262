// SPDX-License-Identifier: GPL-3.0-only
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

use crate::config::Config;
use crate::error::SyncError;
use crate::network::request::NetworkRequest;

const ACCEPT_JSON: &str = "application/json";
const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Typed request executor for the catalog backend.
///
/// Every request carries the static access token (when configured) and the
/// fixed `Accept` header. Retry and backoff are left to callers.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: Url,
    token_header: String,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(
        base_url: Url,
        token_header: String,
        token: Option<String>,
        timeout: Duration,
    ) -> Result<Self, SyncError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("fakenft-sync/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| SyncError::Unexpected(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url,
            token_header,
            token,
        })
    }

    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        Ok(Self::new(
            config.base_url()?,
            config.token_header.clone(),
            config.api_token.clone(),
            config.request_timeout(),
        )?)
    }

    fn build_request(&self, request: &NetworkRequest) -> Result<reqwest::RequestBuilder, SyncError> {
        let url = self.base_url.join(request.path.trim_start_matches('/'))?;
        let mut builder = self
            .client
            .request(request.method.as_reqwest(), url)
            .header(ACCEPT, ACCEPT_JSON);

        if let Some(ref token) = self.token {
            builder = builder.header(self.token_header.as_str(), token.as_str());
        }

        if let Some(ref body) = request.form_body {
            builder = builder
                .header(CONTENT_TYPE, FORM_CONTENT_TYPE)
                .body(body.clone());
        }

        Ok(builder)
    }

    /// Execute a request and return the raw response body
    pub async fn send(&self, request: NetworkRequest) -> Result<String, SyncError> {
        debug!(method = %request.method, path = %request.path, "Sending backend request");

        let response = self.build_request(&request)?.send().await?;
        let status = response.status();

        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            warn!(method = %request.method, path = %request.path, status = %status, body = %text, "Backend request failed");
            return Err(SyncError::Network(format!("HTTP status {}", status.as_u16())));
        }

        Ok(response.text().await?)
    }

    /// Execute a request and decode its JSON response body
    pub async fn send_json<T: DeserializeOwned>(&self, request: NetworkRequest) -> Result<T, SyncError> {
        let body = self.send(request).await?;
        Ok(serde_json::from_str(&body)?)
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }
}
