use std::sync::Arc;

use futures::stream::StreamExt;
use serde_json::Value;
use tokio::sync::{Mutex, RwLock};
use url::Url;

use super::{ChannelManagerBuilder, ConnectionManager, ConnectionState, ManagerState};
use crate::messaging::{ListenerId, StatusListener};
use crate::types::{ChannelConfig, EventEnvelope, Result};

/// Manager for the dashboard's push channel.
///
/// Owns a single WebSocket connection to the monitoring backend, decodes
/// inbound event envelopes, and fans `status_update` payloads out to
/// registered listeners. Unplanned connection loss is recovered under a
/// bounded, fixed-delay reconnect policy; listeners simply stop receiving
/// during an outage and need no intervention of their own.
///
/// The manager is an explicitly constructed component: create one, pass it
/// by reference to whoever needs it, call [`shutdown`](Self::shutdown) when
/// done. Cloning is cheap and clones share the same channel.
///
/// # Example
///
/// ```no_run
/// use rvc_monitor_rs::{ChannelConfig, ChannelManager};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let manager = ChannelManager::new(ChannelConfig::new("ws://192.168.2.21:5005"))?;
///
/// let id = manager.subscribe(|status| {
///     println!("device status: {status}");
/// }).await;
///
/// manager.connect().await?;
/// // ... later
/// manager.unsubscribe(id).await;
/// manager.shutdown().await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct ChannelManager {
    pub(crate) config: Arc<RwLock<ChannelConfig>>,
    pub(crate) connection: Arc<ConnectionManager>,
    pub(crate) state: Arc<RwLock<ManagerState>>,
    /// Serializes dialing so concurrent connect paths cannot open a second
    /// socket.
    pub(crate) dial_lock: Arc<Mutex<()>>,
}

impl ChannelManager {
    /// Creates a new manager and spawns its reconnection watcher.
    ///
    /// No connection is attempted until [`connect`](Self::connect) is called.
    ///
    /// # Errors
    ///
    /// Returns [`MonitorError::Config`](crate::MonitorError::Config) if the
    /// endpoint URL does not parse or the reconnect interval is zero.
    pub fn new(config: ChannelConfig) -> Result<Self> {
        ChannelManagerBuilder::new(config).map(|builder| builder.build())
    }

    /// Set connection state and notify watchers
    async fn set_state(&self, new_state: ConnectionState) {
        self.connection.set_state(new_state).await;

        let state = self.state.read().await;
        state.notify_state_change(new_state, state.was_manual_disconnect);
    }

    /// Set manual disconnect flag and notify watchers
    async fn set_manual_disconnect(&self, manual: bool) {
        let mut state = self.state.write().await;
        state.was_manual_disconnect = manual;

        let conn_state = self.connection.state().await;
        state.notify_state_change(conn_state, manual);
    }

    /// Establishes the push connection.
    ///
    /// No-op when already connected (or a connection attempt is in flight).
    /// An explicit call re-arms the retry budget and clears the
    /// suppress-reconnect flag left behind by [`disconnect`](Self::disconnect),
    /// so a channel that exhausted its retries is always recoverable from here.
    ///
    /// # Errors
    ///
    /// Returns the handshake error when the socket cannot be opened. The
    /// failure also enters the reconnect path, exactly as an unplanned close
    /// would, so the caller does not need to retry.
    pub async fn connect(&self) -> Result<()> {
        {
            let state = self.connection.state().await;
            if state == ConnectionState::Connected || state == ConnectionState::Connecting {
                return Ok(());
            }
        }

        {
            let mut state = self.state.write().await;
            state.was_manual_disconnect = false;
            state.reconnect_timer.reset();
        }

        self.try_open().await
    }

    /// Single connection attempt. Shared by `connect()` and the reconnect
    /// loop; does not touch the retry budget on failure.
    pub(crate) async fn try_open(&self) -> Result<()> {
        let _dialing = self.dial_lock.lock().await;

        // Re-check under the lock: a concurrent caller may have finished
        // dialing while we waited for it.
        {
            let state = self.connection.state().await;
            if state == ConnectionState::Connected || state == ConnectionState::Connecting {
                return Ok(());
            }
        }

        self.set_state(ConnectionState::Connecting).await;

        let endpoint = self.config.read().await.endpoint_url.clone();
        let url = match Url::parse(&endpoint) {
            Ok(url) => url,
            Err(e) => {
                tracing::error!(%endpoint, error = %e, "push endpoint does not parse");
                self.set_state(ConnectionState::Disconnected).await;
                return Err(e.into());
            }
        };
        tracing::info!(%endpoint, "connecting to push channel");

        let ws_stream = match tokio_tungstenite::connect_async(url.as_str()).await {
            Ok((stream, _response)) => stream,
            Err(e) => {
                tracing::error!(%endpoint, error = %e, "push channel connect failed");
                // Same path as an unplanned close: the watcher picks this up.
                self.set_state(ConnectionState::Disconnected).await;
                return Err(e.into());
            }
        };

        let (write_half, mut read_half) = ws_stream.split();
        self.connection.set_writer(write_half).await;

        // Spawn the read loop, tracked so disconnect can abort it
        let manager = self.clone();
        {
            let mut state = self.state.write().await;
            state.task_manager.spawn(async move {
                tracing::debug!("read task started");
                while let Some(frame) = read_half.next().await {
                    use tokio_tungstenite::tungstenite::Message;

                    match frame {
                        Ok(Message::Text(text)) => {
                            manager.handle_frame(text.as_str()).await;
                        }
                        Ok(Message::Close(frame)) => {
                            tracing::warn!(?frame, "server closed push channel");
                            manager.set_state(ConnectionState::Disconnected).await;
                            break;
                        }
                        Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => {}
                        Ok(Message::Binary(data)) => {
                            tracing::warn!(len = data.len(), "ignoring binary frame");
                        }
                        Ok(Message::Frame(_)) => {}
                        Err(e) => {
                            tracing::error!(error = %e, "push channel read error");
                            manager.set_state(ConnectionState::Disconnected).await;
                            break;
                        }
                    }
                }
                tracing::debug!("read task finished");
            });
        }

        self.state.write().await.reconnect_timer.reset();
        self.set_state(ConnectionState::Connected).await;

        tracing::info!("push channel connected");
        Ok(())
    }

    /// Decodes one inbound frame and delivers actionable payloads.
    ///
    /// Malformed frames are logged and dropped; they never change channel
    /// state. Envelope types other than `status_update` are ignored.
    async fn handle_frame(&self, text: &str) {
        let envelope = match serde_json::from_str::<EventEnvelope>(text) {
            Ok(envelope) => envelope,
            Err(e) => {
                tracing::warn!(error = %e, raw = text, "dropping malformed frame");
                return;
            }
        };

        if !envelope.is_status_update() {
            tracing::debug!(envelope_type = %envelope.r#type, "ignoring envelope type");
            return;
        }

        let state = self.state.read().await;
        state.dispatcher.dispatch(&envelope.data);
    }

    /// Closes the push connection.
    ///
    /// Marks the disconnect as explicit, so neither the transport close event
    /// nor a reconnect already waiting on its timer will re-open the channel.
    /// The suppression holds until the next explicit [`connect`](Self::connect).
    ///
    /// # Errors
    ///
    /// Returns an error if the close handshake fails (rare).
    pub async fn disconnect(&self) -> Result<()> {
        // Set the flag first: even when no socket is live, a reconnect may be
        // waiting on its timer and must see the suppression.
        self.set_manual_disconnect(true).await;

        {
            let state = self.connection.state().await;
            if state == ConnectionState::Disconnected {
                return Ok(());
            }
        }

        tracing::info!("disconnecting push channel");

        {
            let mut state = self.state.write().await;
            state.task_manager.abort_all();
        }

        self.connection.close().await?;
        self.set_state(ConnectionState::Disconnected).await;

        Ok(())
    }

    /// Replaces the push endpoint.
    ///
    /// No-op when `url` equals the current endpoint. Otherwise the retry
    /// budget is re-armed for the new target and, if currently connected,
    /// the channel performs one `disconnect()` followed by one `connect()`
    /// against the new URL, in that order.
    pub async fn set_endpoint(&self, url: impl Into<String>) -> Result<()> {
        let url = url.into();
        Url::parse(&url)?;
        {
            let config = self.config.read().await;
            if config.endpoint_url == url {
                return Ok(());
            }
        }

        tracing::info!(endpoint = %url, "replacing push endpoint");
        self.config.write().await.endpoint_url = url;
        self.state.write().await.reconnect_timer.reset();

        if self.connection.is_connected().await {
            self.disconnect().await?;
            self.connect().await?;
        }

        Ok(())
    }

    /// Registers a status listener and returns its handle.
    ///
    /// Listeners receive the `data` payload of every `status_update`
    /// envelope, in registration order, for as long as the channel is
    /// connected. A handle already registered stays registered once;
    /// dropping out is explicit via [`unsubscribe`](Self::unsubscribe).
    pub async fn subscribe<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&Value) + Send + Sync + 'static,
    {
        self.state.write().await.dispatcher.insert(listener)
    }

    /// Registers a listener under a handle the caller already holds.
    ///
    /// No-op (returns `false`) when the handle is still registered, so
    /// re-registering the same listener cannot double deliveries.
    pub async fn subscribe_with_id(&self, id: ListenerId, listener: StatusListener) -> bool {
        self.state.write().await.dispatcher.insert_with_id(id, listener)
    }

    /// Removes a status listener. No-op if the handle is not registered.
    pub async fn unsubscribe(&self, id: ListenerId) -> bool {
        self.state.write().await.dispatcher.remove(id)
    }

    /// Number of currently registered listeners.
    pub async fn listener_count(&self) -> usize {
        self.state.read().await.dispatcher.len()
    }

    pub async fn is_connected(&self) -> bool {
        self.connection.is_connected().await
    }

    pub async fn state(&self) -> ConnectionState {
        self.connection.state().await
    }

    /// Current push endpoint.
    pub async fn endpoint(&self) -> String {
        self.config.read().await.endpoint_url.clone()
    }

    /// Bounded reconnect loop, entered by the watcher on any unplanned
    /// close. Fixed delay between attempts; stops when the budget runs out,
    /// the channel comes back up, or an explicit disconnect intervenes.
    pub(crate) async fn try_reconnect(&self) {
        loop {
            {
                let state = self.state.read().await;
                if state.was_manual_disconnect {
                    tracing::debug!("explicit disconnect, not reconnecting");
                    return;
                }
            }
            {
                let conn = self.connection.state().await;
                if conn == ConnectionState::Connected || conn == ConnectionState::Connecting {
                    return;
                }
            }

            let delay = {
                let mut state = self.state.write().await;
                state.reconnect_timer.next_delay()
            };
            let Some(delay) = delay else {
                tracing::warn!("reconnect attempts exhausted, channel stays disconnected");
                return;
            };

            let attempt = self.state.read().await.reconnect_timer.attempts();
            tracing::info!(attempt, delay_ms = delay.as_millis() as u64, "scheduling reconnect");
            tokio::time::sleep(delay).await;

            // An explicit disconnect or connect while we were waiting
            // retracts the attempt; only one socket may be dialed at a time.
            if self.state.read().await.was_manual_disconnect {
                tracing::debug!("disconnect landed during reconnect delay, stopping");
                return;
            }
            {
                let conn = self.connection.state().await;
                if conn == ConnectionState::Connected || conn == ConnectionState::Connecting {
                    return;
                }
            }

            match self.try_open().await {
                Ok(()) => {
                    tracing::info!("push channel reconnected");
                    return;
                }
                Err(e) => {
                    tracing::error!(error = %e, "reconnect attempt failed");
                }
            }
        }
    }

    /// Disposes of the manager: disconnects and stops the reconnection
    /// watcher. The manager cannot be reused afterwards.
    pub async fn shutdown(&self) -> Result<()> {
        self.disconnect().await?;
        self.state.write().await.state_change_tx = None;
        Ok(())
    }
}
