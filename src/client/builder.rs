use std::sync::Arc;

use tokio::sync::{watch, Mutex, RwLock};
use url::Url;

use super::{ChannelManager, ConnectionManager, ConnectionState, ManagerState};
use crate::infrastructure::ReconnectTimer;
use crate::types::{ChannelConfig, MonitorError, Result};

/// Validated construction for [`ChannelManager`].
pub struct ChannelManagerBuilder {
    config: ChannelConfig,
}

impl ChannelManagerBuilder {
    /// Validates the configuration up front so a bad endpoint fails at
    /// construction rather than on the first connect.
    pub fn new(config: ChannelConfig) -> Result<Self> {
        Url::parse(&config.endpoint_url)?;

        if config.reconnect_interval.is_zero() {
            return Err(MonitorError::Config(
                "reconnect interval must be greater than zero".to_string(),
            ));
        }

        Ok(Self { config })
    }

    /// Builds the manager and spawns its reconnection watcher task.
    ///
    /// The watcher observes state transitions and runs the bounded retry
    /// loop whenever the channel drops without an explicit disconnect. It
    /// exits when the manager is shut down.
    pub fn build(self) -> ChannelManager {
        let timer = ReconnectTimer::new(
            self.config.max_reconnect_attempts,
            self.config.reconnect_interval,
        );
        let mut manager_state = ManagerState::new(timer);

        let (state_tx, state_rx) = watch::channel((ConnectionState::Disconnected, false));
        manager_state.state_change_tx = Some(state_tx);

        let manager = ChannelManager {
            config: Arc::new(RwLock::new(self.config)),
            connection: Arc::new(ConnectionManager::new()),
            state: Arc::new(RwLock::new(manager_state)),
            dial_lock: Arc::new(Mutex::new(())),
        };

        let manager_for_watcher = manager.clone();
        tokio::spawn(async move {
            let mut rx = state_rx;

            while rx.changed().await.is_ok() {
                let (state, was_manual) = *rx.borrow_and_update();

                if matches!(state, ConnectionState::Disconnected) && !was_manual {
                    tracing::info!("watcher detected unplanned disconnect");
                    manager_for_watcher.try_reconnect().await;
                }
            }
            tracing::debug!("reconnection watcher finished");
        });

        manager
    }
}
