// Client for the OpenAI-compatible backend.
//
// This module provides the one outbound HTTP client of the proxy. It speaks
// the completion protocol shared by the OpenAI API and LiteLLM gateways:
// - POST {base_url}/chat/completions, buffered or as a byte stream
// - GET {base_url}/models
//
// Non-success statuses are captured with their body so handlers can forward
// them to the caller verbatim. The configured timeout bounds call setup
// (through response headers); the lifetime of an already-started stream is
// unbounded.
use std::time::Duration;

use reqwest::{Client, Response, StatusCode};
use thiserror::Error;
use tokio::time::timeout;
use tracing::{debug, error};

use crate::config::BackendConfig;
use crate::types::{CompletionRequest, CompletionResponse, ModelListResponse};

// Errors that can occur when interacting with the backend.
#[derive(Debug, Error)]
pub enum BackendError {
    // HTTP request errors (connection failures, protocol errors, etc.)
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    // Non-success statuses returned by the backend, body preserved
    #[error("Backend API error: {status} - {body}")]
    ApiError {
        // HTTP status code returned by the backend
        status: StatusCode,
        // Response body provided by the backend
        body: String,
    },

    // The backend did not answer within the configured setup window
    #[error("Backend request timed out after {0:?}")]
    Timeout(Duration),
}

// Client for the OpenAI-compatible backend.
//
// Cheap to clone; the underlying reqwest client is reference-counted and
// safe for concurrent reuse across request tasks.
#[derive(Clone)]
pub struct BackendClient {
    // HTTP client for making API requests
    client: Client,

    // Base URL of the backend service, without trailing slash
    base_url: String,

    // Bearer token; None when no key is configured
    api_key: Option<String>,

    // Wall-clock bound on call setup
    timeout: Duration,
}

impl BackendClient {
    // Creates a new backend client from validated configuration.
    pub fn new(config: &BackendConfig) -> Self {
        let api_key = if config.api_key.is_empty() {
            None
        } else {
            Some(config.api_key.clone())
        };

        Self {
            client: Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }

    //--------------------------------------------------------------------------
    // Public API Methods
    //--------------------------------------------------------------------------

    // Sends a completion request and buffers the full JSON response.
    pub async fn complete(
        &self,
        request: &CompletionRequest,
    ) -> Result<CompletionResponse, BackendError> {
        let response = self.complete_raw(request).await?;
        Ok(response.json().await?)
    }

    // Sends a completion request and returns the raw response so the caller
    // can take the body as a byte stream. Used for the streaming path.
    pub async fn complete_raw(
        &self,
        request: &CompletionRequest,
    ) -> Result<Response, BackendError> {
        let url = format!("{}/chat/completions", self.base_url);
        self.send(self.client.post(url).json(request)).await
    }

    // Fetches the backend's model list.
    pub async fn list_models(&self) -> Result<ModelListResponse, BackendError> {
        let url = format!("{}/models", self.base_url);
        let response = self.send(self.client.get(url)).await?;
        Ok(response.json().await?)
    }

    //--------------------------------------------------------------------------
    // Helper Methods
    //--------------------------------------------------------------------------

    // Applies authentication and the setup timeout to a prepared request,
    // mapping non-success statuses into ApiError with the body intact.
    async fn send(&self, builder: reqwest::RequestBuilder) -> Result<Response, BackendError> {
        let builder = match &self.api_key {
            Some(key) => builder.bearer_auth(key),
            None => builder,
        };

        let response = timeout(self.timeout, builder.send())
            .await
            .map_err(|_| BackendError::Timeout(self.timeout))?
            .map_err(|e| {
                error!("Request to backend failed: {}", e);
                BackendError::RequestError(e)
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            error!("Backend API error: {} - {}", status, body);
            return Err(BackendError::ApiError { status, body });
        }

        debug!("Successfully received response from backend");
        Ok(response)
    }
}
