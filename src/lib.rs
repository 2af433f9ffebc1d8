//! # rvc-monitor-rs
//!
//! Connectivity layer for the RVC device-monitoring dashboard: a persistent
//! push channel for live status updates plus a stateless request client for
//! the control API.
//!
//! The push channel is the core of this crate. [`ChannelManager`] owns one
//! WebSocket connection, decodes `{"type", "data"}` event envelopes, and
//! delivers `status_update` payloads to registered listeners. Unplanned
//! connection loss is recovered with a bounded, fixed-delay reconnect policy;
//! an explicit disconnect suppresses reconnection until the next explicit
//! connect.
//!
//! ## Example
//!
//! ```no_run
//! use rvc_monitor_rs::{ChannelConfig, ChannelManager};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let manager = ChannelManager::new(ChannelConfig::new("ws://192.168.2.21:5005"))?;
//!
//!     manager.subscribe(|status| {
//!         println!("status update: {status}");
//!     }).await;
//!
//!     manager.connect().await?;
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod client;
pub mod infrastructure;
pub mod messaging;
pub mod types;

pub use api::RequestClient;
pub use client::{ChannelManager, ChannelManagerBuilder, ConnectionState};
pub use messaging::{ListenerId, StatusListener};
pub use types::{default_endpoint, ChannelConfig, EventEnvelope, MonitorError, Result};
