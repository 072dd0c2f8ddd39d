use std::{collections::HashMap, time::Duration};

use tokio::{
    sync::{watch, Notify, RwLock},
    time::Instant,
};
use tracing::debug;

use crate::{data_model::CommandResult, utils::get_epoch_time_in_ms};

/// Ceiling for result waits. Larger than the command-poll ceiling because
/// producers wait out long-running commands here.
pub const MAX_RESULT_WAIT: Duration = Duration::from_secs(300);

/// Results keyed by command id, last write wins, plus the waiter registry
/// for parked `/results/{id}?wait=true` requests.
pub struct ResultStore {
    results: RwLock<HashMap<String, CommandResult>>,
    notify: Notify,
}

impl ResultStore {
    pub fn new() -> Self {
        Self {
            results: RwLock::new(HashMap::new()),
            notify: Notify::new(),
        }
    }

    /// Inserts or overwrites the result for a command and wakes every
    /// parked waiter. Waiters filter by command id themselves.
    pub async fn put(&self, result: CommandResult) {
        {
            let mut results = self.results.write().await;
            debug!(
                command_id = result.command_id,
                success = result.success,
                "result stored"
            );
            results.insert(result.command_id.clone(), result);
        }
        self.notify.notify_waiters();
    }

    pub async fn get(&self, command_id: &str) -> Option<CommandResult> {
        self.results.read().await.get(command_id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.results.read().await.len()
    }

    /// Waits for the result of one command. Resolves `None` on timeout,
    /// which the HTTP layer reports distinctly from a missing result; no
    /// batching window applies since a waiter matches exactly one id.
    pub async fn wait_for(
        &self,
        command_id: &str,
        timeout: Duration,
        mut shutdown: watch::Receiver<bool>,
    ) -> Option<CommandResult> {
        let deadline = Instant::now() + timeout.min(MAX_RESULT_WAIT);
        loop {
            if *shutdown.borrow() {
                return None;
            }
            let mut notified = std::pin::pin!(self.notify.notified());
            notified.as_mut().enable();
            if let Some(result) = self.get(command_id).await {
                return Some(result);
            }
            tokio::select! {
                _ = notified.as_mut() => {}
                _ = tokio::time::sleep_until(deadline) => return self.get(command_id).await,
                _ = shutdown.changed() => return None,
            }
        }
    }

    /// Removes every result older than `max_age` and returns how many were
    /// evicted. Results exactly at the boundary survive the sweep.
    pub async fn sweep_expired(&self, max_age: Duration) -> usize {
        let cutoff = get_epoch_time_in_ms().saturating_sub(max_age.as_millis() as u64);
        self.sweep_older_than(cutoff).await
    }

    async fn sweep_older_than(&self, cutoff: u64) -> usize {
        let mut results = self.results.write().await;
        let len_before = results.len();
        results.retain(|_, result| result.timestamp >= cutoff);
        len_before - results.len()
    }

    /// Drops every stored result and returns how many were removed.
    pub async fn clear(&self) -> usize {
        let mut results = self.results.write().await;
        let removed = results.len();
        results.clear();
        removed
    }
}
