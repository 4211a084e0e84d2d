//! Thin authenticated REST wrappers over the platform backends
//!
//! Each wrapper issues one request and maps the response into the typed
//! data model. Transport failures, non-2xx statuses, and body decoding
//! failures are distinguished in [`ApiError`] so callers can reduce them to
//! the fallback behavior the flow requires.

mod catalog;
mod enterprise;
mod subsidy;

use std::sync::Arc;
use std::time::Duration;

use reqwest::{Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::config::PortalConfig;

/// Error type for the REST service wrappers
#[derive(Debug, Error)]
pub enum ApiError {
    /// Transport-level failure (connection, TLS, timeout)
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Non-2xx response from the backend
    #[error("HTTP {status} from {url}")]
    Http { status: StatusCode, url: String },

    /// Response body did not match the expected shape
    #[error("Failed to decode response from {url}: {message}")]
    Decode { url: String, message: String },
}

/// Shared authenticated HTTP client for all backend services
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    config: Arc<PortalConfig>,
    bearer_token: Option<String>,
}

impl ApiClient {
    /// Build a client from configuration
    pub fn new(config: Arc<PortalConfig>) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.api.timeout_secs))
            .build()?;
        Ok(Self { http, config, bearer_token: None })
    }

    /// Attach a JWT bearer token to every request
    pub fn with_bearer_token(mut self, token: impl Into<String>) -> Self {
        self.bearer_token = Some(token.into());
        self
    }

    /// Configuration this client was built from
    pub fn config(&self) -> &PortalConfig {
        &self.config
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        let builder = self.http.request(method, url);
        match &self.bearer_token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Issue the request, enforce a 2xx status, and decode the JSON body
    async fn send_json<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
    ) -> Result<T, ApiError> {
        let response = builder.send().await?;
        let url = response.url().to_string();
        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Http { status, url });
        }
        response
            .json::<T>()
            .await
            .map_err(|error| ApiError::Decode { url, message: error.to_string() })
    }

    /// Issue the request and enforce a 2xx status, discarding the body
    async fn send_expect_success(&self, builder: RequestBuilder) -> Result<(), ApiError> {
        let response = builder.send().await?;
        let url = response.url().to_string();
        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Http { status, url });
        }
        Ok(())
    }
}
