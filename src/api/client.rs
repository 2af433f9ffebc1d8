use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use super::types::{ApiResponse, ControlAction, ControlRequest, ServerConfig, StatusPayload};
use crate::types::constants::DEFAULT_REQUEST_TIMEOUT_MS;
use crate::types::{MonitorError, Result};

/// Stateless request/response client for the dashboard backend.
///
/// Every method is a single HTTP call that returns the parsed response
/// envelope or fails with a transport/parse error. There is no retry and no
/// session state at this layer; callers that want retry own that policy.
///
/// # Example
///
/// ```no_run
/// use rvc_monitor_rs::api::RequestClient;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = RequestClient::new("http://192.168.2.21:5000/api")?;
/// let status = client.get_status().await?;
/// if let Some(payload) = status.data {
///     println!("{}: {}", payload.device_info.product_name, payload.device_status);
/// }
/// # Ok(())
/// # }
/// ```
pub struct RequestClient {
    http: reqwest::Client,
    base_url: String,
}

impl RequestClient {
    /// Creates a client with the fixed 10 s request timeout.
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        Self::with_timeout(base_url, Duration::from_millis(DEFAULT_REQUEST_TIMEOUT_MS))
    }

    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Device status plus static device info.
    pub async fn get_status(&self) -> Result<ApiResponse<StatusPayload>> {
        self.get_json("/status").await
    }

    /// All nodes known to the backend.
    pub async fn get_all_nodes(&self) -> Result<ApiResponse<Value>> {
        self.get_json("/nodes").await
    }

    /// Status of a single node.
    pub async fn get_node_status(&self, node_id: &str) -> Result<ApiResponse<Value>> {
        self.get_json(&format!("/node/{}", node_id)).await
    }

    /// Sends a control command to the device.
    pub async fn control_device(
        &self,
        action: ControlAction,
        params: Value,
    ) -> Result<ApiResponse<Value>> {
        let body = ControlRequest { action, params };
        self.post_json("/control", &body).await
    }

    /// Current backend configuration.
    pub async fn get_config(&self) -> Result<ApiResponse<ServerConfig>> {
        self.get_json("/config").await
    }

    /// Updates the backend configuration (the backend reconnects its
    /// upstream device server as a side effect).
    pub async fn update_config(&self, config: &ServerConfig) -> Result<ApiResponse<Value>> {
        self.post_json("/config", config).await
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<ApiResponse<T>> {
        let url = format!("{}{}", self.base_url, path);
        let response = self.http.get(&url).send().await?;
        Self::parse_response(response).await
    }

    async fn post_json<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<ApiResponse<T>> {
        let url = format!("{}{}", self.base_url, path);
        let response = self.http.post(&url).json(body).send().await?;
        Self::parse_response(response).await
    }

    async fn parse_response<T: DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<ApiResponse<T>> {
        let status = response.status();
        if !status.is_success() {
            // The backend puts its reason in the error envelope's message.
            let message = response
                .json::<ApiResponse<Value>>()
                .await
                .ok()
                .and_then(|body| body.message)
                .unwrap_or_else(|| status.to_string());
            return Err(MonitorError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response.json::<ApiResponse<T>>().await?)
    }
}
