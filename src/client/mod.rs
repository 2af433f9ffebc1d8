// Module declarations
mod builder;
mod connection;
mod core;
mod state;

// Public API exports
pub use builder::ChannelManagerBuilder;
pub use connection::{ConnectionManager, ConnectionState};
pub use core::ChannelManager;
pub use state::ManagerState;
