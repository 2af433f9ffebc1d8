use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use serde_json::Value;

/// Handle identifying a registered status listener.
///
/// Rust closures have no stable identity of their own, so the registry keys
/// listeners by this handle: registration hands one out, removal takes one
/// back, and re-inserting under an existing id has no effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Callback receiving the `data` payload of each `status_update` envelope.
/// Borrowed for the duration of the call only.
pub type StatusListener = Arc<dyn Fn(&Value) + Send + Sync>;

/// Order-preserving registry of status listeners.
///
/// Delivery is a synchronous multicast in registration order; a panicking
/// listener is caught and logged so it cannot block delivery to the
/// listeners registered after it or destabilize the channel.
pub struct StatusDispatcher {
    next_id: u64,
    listeners: Vec<(ListenerId, StatusListener)>,
}

impl StatusDispatcher {
    pub fn new() -> Self {
        Self {
            next_id: 0,
            listeners: Vec::new(),
        }
    }

    /// Registers a listener and returns its handle.
    pub fn insert<F>(&mut self, listener: F) -> ListenerId
    where
        F: Fn(&Value) + Send + Sync + 'static,
    {
        self.next_id += 1;
        let id = ListenerId(self.next_id);
        self.listeners.push((id, Arc::new(listener)));
        id
    }

    /// Registers a listener under an existing handle. No-op (returns `false`)
    /// if the id is already present, so double registration cannot produce
    /// double delivery.
    pub fn insert_with_id(&mut self, id: ListenerId, listener: StatusListener) -> bool {
        if self.contains(id) {
            return false;
        }
        self.next_id = self.next_id.max(id.0);
        self.listeners.push((id, listener));
        true
    }

    /// Removes a listener. Returns `false` if it was not registered.
    pub fn remove(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(registered, _)| *registered != id);
        self.listeners.len() != before
    }

    pub fn contains(&self, id: ListenerId) -> bool {
        self.listeners.iter().any(|(registered, _)| *registered == id)
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    /// Delivers a status payload to every listener, in registration order.
    pub fn dispatch(&self, data: &Value) {
        for (id, listener) in &self.listeners {
            if catch_unwind(AssertUnwindSafe(|| listener(data))).is_err() {
                tracing::warn!(listener = id.0, "status listener panicked, continuing delivery");
            }
        }
    }
}

impl Default for StatusDispatcher {
    fn default() -> Self {
        Self::new()
    }
}
