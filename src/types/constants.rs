/// Envelope type carrying device status payloads. All other types are
/// ignored on the inbound channel.
pub const STATUS_UPDATE_EVENT: &str = "status_update";

/// Port the dashboard backend serves the push channel on.
pub const DEFAULT_WS_PORT: u16 = 5005;

/// Default reconnect attempt cap.
pub const DEFAULT_MAX_RECONNECT_ATTEMPTS: u32 = 5;

/// Default delay between reconnect attempts (milliseconds).
pub const DEFAULT_RECONNECT_INTERVAL_MS: u64 = 3000;

/// Request client timeout (milliseconds).
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 10_000;
