use tokio::task::JoinHandle;

/// Tracks the channel's background tasks so an explicit disconnect can
/// tear them down.
pub struct TaskManager {
    handles: Vec<JoinHandle<()>>,
}

impl TaskManager {
    pub fn new() -> Self {
        Self {
            handles: Vec::new(),
        }
    }

    /// Spawn a task and track it. Handles of tasks that already ran to
    /// completion are pruned here, so reconnect churn cannot grow the list
    /// without bound.
    pub fn spawn<F>(&mut self, future: F)
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        self.handles.retain(|handle| !handle.is_finished());
        let handle = tokio::spawn(future);
        self.handles.push(handle);
    }

    /// Number of tracked (not yet pruned) tasks.
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Abort all tasks without waiting
    pub fn abort_all(&mut self) {
        for handle in &self.handles {
            handle.abort();
        }
        self.handles.clear();
    }
}

impl Default for TaskManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_spawn_prunes_finished_handles() {
        let mut tasks = TaskManager::new();
        for _ in 0..10 {
            tasks.spawn(async {});
        }
        // Let the spawned no-ops run to completion.
        tokio::time::sleep(Duration::from_millis(50)).await;

        tasks.spawn(std::future::pending::<()>());
        assert_eq!(tasks.len(), 1, "finished handles are pruned on spawn");
        tasks.abort_all();
        assert!(tasks.is_empty());
    }
}
