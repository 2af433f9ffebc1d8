use std::time::Duration;

use crate::types::constants::{
    DEFAULT_MAX_RECONNECT_ATTEMPTS, DEFAULT_RECONNECT_INTERVAL_MS, DEFAULT_WS_PORT,
};

/// Configuration for the push channel.
///
/// Only `endpoint_url` may change after construction (via
/// [`ChannelManager::set_endpoint`](crate::client::ChannelManager::set_endpoint));
/// the retry policy fields are fixed for the lifetime of the manager.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelConfig {
    /// WebSocket endpoint, e.g. `ws://192.168.2.21:5005`.
    pub endpoint_url: String,
    /// How many automatic reconnect attempts follow an unplanned close
    /// before the channel goes quiescent.
    pub max_reconnect_attempts: u32,
    /// Fixed delay between reconnect attempts.
    pub reconnect_interval: Duration,
}

impl ChannelConfig {
    pub fn new(endpoint_url: impl Into<String>) -> Self {
        Self {
            endpoint_url: endpoint_url.into(),
            ..Self::default()
        }
    }
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            endpoint_url: default_endpoint("127.0.0.1", false),
            max_reconnect_attempts: DEFAULT_MAX_RECONNECT_ATTEMPTS,
            reconnect_interval: Duration::from_millis(DEFAULT_RECONNECT_INTERVAL_MS),
        }
    }
}

/// Derives the push endpoint from a host, matching the page transport:
/// `wss://` when the dashboard is served over TLS, `ws://` otherwise.
pub fn default_endpoint(host: &str, secure: bool) -> String {
    let scheme = if secure { "wss" } else { "ws" };
    format!("{}://{}:{}", scheme, host, DEFAULT_WS_PORT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_endpoint_matches_page_transport() {
        assert_eq!(default_endpoint("192.168.2.21", false), "ws://192.168.2.21:5005");
        assert_eq!(default_endpoint("rvc.local", true), "wss://rvc.local:5005");
    }

    #[test]
    fn test_default_policy() {
        let config = ChannelConfig::new("ws://10.0.0.7:5005");
        assert_eq!(config.endpoint_url, "ws://10.0.0.7:5005");
        assert_eq!(config.max_reconnect_attempts, 5);
        assert_eq!(config.reconnect_interval, Duration::from_millis(3000));
    }
}
