use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Outcome marker carried by every backend response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseStatus {
    Success,
    Error,
}

/// Response envelope used by every endpoint of the dashboard backend:
/// `{"status": "success"|"error", "data"?: ..., "message"?: ...}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub status: ResponseStatus,
    // No serde(default) here: on a generic field it would put a `T: Default`
    // bound on the derived impl, and a missing Option already reads as None.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn is_success(&self) -> bool {
        self.status == ResponseStatus::Success
    }
}

/// Static device identity reported alongside live status.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeviceInfo {
    #[serde(default)]
    pub product_name: String,
    #[serde(default)]
    pub hardware_version: String,
    #[serde(default)]
    pub software_version: String,
    #[serde(default)]
    pub ip_address: String,
}

/// Payload of `GET /status`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusPayload {
    pub device_info: DeviceInfo,
    /// Live device state; shape depends on the device model, so it stays
    /// untyped here.
    #[serde(default)]
    pub device_status: Value,
}

/// Commands accepted by `POST /control`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlAction {
    Start,
    Stop,
    Pause,
    Resume,
    ReturnToBase,
}

impl ControlAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Stop => "stop",
            Self::Pause => "pause",
            Self::Resume => "resume",
            Self::ReturnToBase => "return_to_base",
        }
    }
}

impl std::fmt::Display for ControlAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Body of `POST /control`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControlRequest {
    pub action: ControlAction,
    #[serde(default)]
    pub params: Value,
}

/// Backend configuration document (`GET /config` / `POST /config`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerConfig {
    /// WebSocket URL of the upstream device server.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matter_server_url: Option<String>,
}
