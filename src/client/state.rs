use tokio::sync::watch;

use super::connection::ConnectionState;
use crate::infrastructure::{ReconnectTimer, TaskManager};
use crate::messaging::StatusDispatcher;

/// Consolidated mutable state for the channel manager.
/// Using a single struct reduces lock contention.
pub struct ManagerState {
    /// Registered status listeners, in registration order
    pub dispatcher: StatusDispatcher,

    /// Background task handles (read loop)
    pub task_manager: TaskManager,

    /// Retry budget for the bounded reconnect policy
    pub reconnect_timer: ReconnectTimer,

    /// Whether the last disconnect was explicit (suppresses auto-reconnect
    /// until the next explicit connect)
    pub was_manual_disconnect: bool,

    /// Sender for state change notifications
    pub state_change_tx: Option<watch::Sender<(ConnectionState, bool)>>,
}

impl ManagerState {
    pub fn new(reconnect_timer: ReconnectTimer) -> Self {
        Self {
            dispatcher: StatusDispatcher::new(),
            task_manager: TaskManager::new(),
            reconnect_timer,
            was_manual_disconnect: false,
            state_change_tx: None,
        }
    }

    /// Notify state change watchers
    pub fn notify_state_change(&self, state: ConnectionState, manual: bool) {
        if let Some(tx) = &self.state_change_tx {
            if tx.send((state, manual)).is_err() {
                tracing::debug!(?state, "state change watcher gone, notification dropped");
            }
        }
    }
}
