mod dispatch;

pub use dispatch::{ListenerId, StatusDispatcher, StatusListener};
