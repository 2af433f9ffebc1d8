pub mod config;
pub mod constants;
pub mod envelope;
pub mod error;

pub use config::{default_endpoint, ChannelConfig};
pub use constants::STATUS_UPDATE_EVENT;
pub use envelope::EventEnvelope;
pub use error::{MonitorError, Result};
