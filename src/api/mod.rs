mod client;
mod types;

pub use client::RequestClient;
pub use types::{
    ApiResponse, ControlAction, ControlRequest, DeviceInfo, ResponseStatus, ServerConfig,
    StatusPayload,
};
