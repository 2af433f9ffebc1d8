use thiserror::Error;

/// Errors surfaced by the monitoring connectivity layer.
#[derive(Error, Debug)]
pub enum MonitorError {
    /// WebSocket protocol error (handshake failed, invalid frame, etc.)
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// General connection error with descriptive message
    #[error("Connection error: {0}")]
    Connection(String),

    /// Invalid configuration (bad endpoint URL, zero reconnect interval, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// HTTP transport error from the request client
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Backend replied with a non-success status
    #[error("API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    /// URL parsing error (malformed endpoint URL)
    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),
}

/// Convenience type alias for `Result<T, MonitorError>`.
pub type Result<T> = std::result::Result<T, MonitorError>;
