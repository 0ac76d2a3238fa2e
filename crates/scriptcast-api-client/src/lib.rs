//! HTTP client for the scriptcast backend.
//!
//! Provides a minimal client with optional auth (Bearer token or X-API-Key),
//! generic GET/POST helpers, and domain methods (upload, generate, exports,
//! status, logs). The client implements [`BackendGateway`] so the workflow crate
//! can drive it directly.
//!
//! [`BackendGateway`]: scriptcast_core::BackendGateway

pub mod api;

use reqwest::{Client, RequestBuilder, Response};
use scriptcast_core::models::BackendReply;
use scriptcast_core::{ClientConfig, GatewayError};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;

/// Authentication strategy for the API.
#[derive(Clone, Debug)]
pub enum Auth {
    /// `Authorization: Bearer {token}`
    Bearer(String),
    /// `X-API-Key: {key}`
    XApiKey(String),
}

/// HTTP client for the backend with optional auth.
#[derive(Clone, Debug)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    prefix: String,
    auth: Option<Auth>,
}

impl ApiClient {
    pub fn new(
        base_url: &str,
        prefix: &str,
        timeout: Duration,
        auth: Option<Auth>,
    ) -> Result<Self, GatewayError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| GatewayError::Transport(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            prefix: prefix.trim_end_matches('/').to_string(),
            auth,
        })
    }

    /// Build from loaded configuration. An API key, if configured, is sent as `X-API-Key`.
    pub fn from_config(config: &ClientConfig) -> Result<Self, GatewayError> {
        Self::new(
            &config.api_url,
            &config.api_prefix,
            config.timeout(),
            config.api_key.clone().map(Auth::XApiKey),
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Full URL of an endpoint path such as `"/upload"`.
    pub fn build_url(&self, path: &str) -> String {
        format!("{}{}{}", self.base_url, self.prefix, path)
    }

    fn apply_auth(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.auth {
            Some(Auth::Bearer(token)) => {
                request.header("Authorization", format!("Bearer {}", token))
            }
            Some(Auth::XApiKey(key)) => request.header("X-API-Key", key.as_str()),
            None => request,
        }
    }

    /// GET an endpoint and classify the body.
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, GatewayError> {
        let request = self.apply_auth(self.client.get(self.build_url(path)));
        let value = self.send(request).await?;
        decode_reply(value)
    }

    /// POST a JSON body and classify the response.
    pub async fn post_json<T: DeserializeOwned, B: serde::Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, GatewayError> {
        let request = self.apply_auth(self.client.post(self.build_url(path)).json(body));
        let value = self.send(request).await?;
        decode_reply(value)
    }

    /// POST a multipart form and classify the response.
    pub async fn post_multipart<T: DeserializeOwned>(
        &self,
        path: &str,
        form: reqwest::multipart::Form,
    ) -> Result<T, GatewayError> {
        let request = self.apply_auth(self.client.post(self.build_url(path)).multipart(form));
        let value = self.send(request).await?;
        decode_reply(value)
    }

    /// Send a request and return the JSON body of a 2xx response.
    async fn send(&self, request: RequestBuilder) -> Result<Value, GatewayError> {
        let response = request.send().await.map_err(map_transport_error)?;
        let response = ensure_success(response).await?;
        response
            .json::<Value>()
            .await
            .map_err(|e| GatewayError::Decode(e.to_string()))
    }
}

async fn ensure_success(response: Response) -> Result<Response, GatewayError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());
    Err(GatewayError::Status {
        status: status.as_u16(),
        body,
    })
}

fn map_transport_error(err: reqwest::Error) -> GatewayError {
    if err.is_timeout() {
        GatewayError::Timeout(err.to_string())
    } else {
        GatewayError::Transport(err.to_string())
    }
}

fn decode_reply<T: DeserializeOwned>(value: Value) -> Result<T, GatewayError> {
    BackendReply::from_value(value)
        .map_err(|e| GatewayError::Decode(e.to_string()))?
        .into_result()
}

// Re-export domain response types for convenience.
pub use scriptcast_core::models::{
    BackendLogLine, ConnectionStatus, OutputFile, ProductGroup, TaskCounters,
};
