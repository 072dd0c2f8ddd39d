use std::time::Duration;

use tokio::{
    sync::{watch, Notify, RwLock},
    time::Instant,
};
use tracing::debug;

use crate::data_model::Command;

/// Ceiling for caller-supplied poll timeouts. Kept below the 60s idle
/// timeout common to reverse proxies so a held poll is never cut mid-flight.
pub const MAX_POLL_TIMEOUT: Duration = Duration::from_secs(55);

/// How long a satisfied poll lingers to coalesce rapid back-to-back
/// submissions into a single response.
pub const BATCH_WINDOW: Duration = Duration::from_millis(50);

/// Pending commands in insertion order, plus the waiter registry for
/// parked `/commands/poll` requests.
pub struct CommandQueue {
    pending: RwLock<Vec<Command>>,
    notify: Notify,
}

impl CommandQueue {
    pub fn new() -> Self {
        Self {
            pending: RwLock::new(Vec::new()),
            notify: Notify::new(),
        }
    }

    /// Inserts a command and wakes every parked poller. Duplicate ids are
    /// the caller's responsibility; ids are generated, so collisions do
    /// not occur in practice.
    pub async fn submit(&self, command: Command) {
        {
            let mut pending = self.pending.write().await;
            debug!(
                command_id = command.id,
                command_type = command.command_type,
                "command queued"
            );
            pending.push(command);
        }
        self.notify.notify_waiters();
    }

    /// Atomically returns every pending command and empties the queue.
    pub async fn drain_all(&self) -> Vec<Command> {
        let mut pending = self.pending.write().await;
        std::mem::take(&mut *pending)
    }

    /// Removes a command if it is still pending. Returns false when the
    /// command was already handed to a poller; an in-flight command cannot
    /// be recalled.
    pub async fn cancel(&self, id: &str) -> bool {
        let mut pending = self.pending.write().await;
        let len_before = pending.len();
        pending.retain(|c| c.id != id);
        let cancelled = pending.len() != len_before;
        if cancelled {
            debug!(command_id = id, "command cancelled");
        }
        cancelled
    }

    pub async fn contains(&self, id: &str) -> bool {
        self.pending.read().await.iter().any(|c| c.id == id)
    }

    pub async fn len(&self) -> usize {
        self.pending.read().await.len()
    }

    /// Long-poll suspension point.
    ///
    /// Returns immediately with whatever is pending. Otherwise parks until
    /// a submission arrives, then holds the response open for
    /// [`BATCH_WINDOW`] so submissions landing within milliseconds of each
    /// other ride the same response. Resolves with an empty vec once the
    /// deadline passes with nothing to deliver, which is a valid outcome,
    /// not an error.
    pub async fn wait_for_commands(
        &self,
        timeout: Duration,
        mut shutdown: watch::Receiver<bool>,
    ) -> Vec<Command> {
        let existing = self.drain_all().await;
        if !existing.is_empty() {
            debug!(count = existing.len(), "long poll satisfied from queue");
            return existing;
        }

        let deadline = Instant::now() + timeout.min(MAX_POLL_TIMEOUT);
        loop {
            if *shutdown.borrow() {
                return Vec::new();
            }
            // Register interest before re-checking the queue; a submission
            // landing between the check and the select would otherwise be
            // a lost wakeup.
            let mut notified = std::pin::pin!(self.notify.notified());
            notified.as_mut().enable();
            if !self.pending.read().await.is_empty() {
                tokio::time::sleep(BATCH_WINDOW).await;
                let batch = self.drain_all().await;
                if !batch.is_empty() {
                    debug!(count = batch.len(), "long poll returning batch");
                    return batch;
                }
                // A concurrent poller won the drain race; keep waiting
                // for our own commands or deadline.
                continue;
            }
            tokio::select! {
                _ = notified.as_mut() => {}
                _ = tokio::time::sleep_until(deadline) => {
                    // The deadline also drains stragglers inserted without
                    // a notification reaching this waiter.
                    return self.drain_all().await;
                }
                _ = shutdown.changed() => return Vec::new(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::utils::get_epoch_time_in_ms;

    fn command(id: &str, command_type: &str) -> Command {
        Command {
            id: id.to_string(),
            command_type: command_type.to_string(),
            target: None,
            payload: serde_json::json!({}),
            timestamp: get_epoch_time_in_ms(),
        }
    }

    fn shutdown_pair() -> (watch::Sender<bool>, watch::Receiver<bool>) {
        watch::channel(false)
    }

    #[tokio::test]
    async fn drain_returns_everything_once_in_order() {
        let queue = CommandQueue::new();
        queue.submit(command("c1", "createNode")).await;
        queue.submit(command("c2", "setStyle")).await;
        queue.submit(command("c3", "bindVariable")).await;

        let drained = queue.drain_all().await;
        let ids: Vec<&str> = drained.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["c1", "c2", "c3"]);

        assert!(queue.drain_all().await.is_empty());
        assert_eq!(queue.len().await, 0);
    }

    #[tokio::test]
    async fn cancel_reports_presence() {
        let queue = CommandQueue::new();
        queue.submit(command("c1", "createNode")).await;

        assert!(queue.contains("c1").await);
        assert!(queue.cancel("c1").await);
        assert!(!queue.contains("c1").await);
        assert!(!queue.cancel("c1").await);
        assert!(!queue.cancel("never-queued").await);
    }

    #[tokio::test(start_paused = true)]
    async fn empty_poll_resolves_at_deadline() {
        let queue = CommandQueue::new();
        let (_tx, rx) = shutdown_pair();

        let start = Instant::now();
        let got = queue.wait_for_commands(Duration::from_secs(5), rx).await;
        assert!(got.is_empty());
        assert!(start.elapsed() >= Duration::from_secs(5));
    }

    #[tokio::test(start_paused = true)]
    async fn poll_timeout_is_clamped() {
        let queue = CommandQueue::new();
        let (_tx, rx) = shutdown_pair();

        let start = Instant::now();
        let got = queue.wait_for_commands(Duration::from_secs(600), rx).await;
        assert!(got.is_empty());
        assert!(start.elapsed() >= MAX_POLL_TIMEOUT);
        assert!(start.elapsed() < Duration::from_secs(60));
    }

    #[tokio::test(start_paused = true)]
    async fn parked_poll_wakes_within_batch_window() {
        let queue = Arc::new(CommandQueue::new());
        let (_tx, rx) = shutdown_pair();

        let poller = {
            let queue = queue.clone();
            tokio::spawn(async move { queue.wait_for_commands(Duration::from_secs(30), rx).await })
        };
        tokio::time::sleep(Duration::from_millis(5)).await;

        let start = Instant::now();
        queue.submit(command("c1", "ping")).await;
        let got = poller.await.unwrap();

        assert_eq!(got.len(), 1);
        assert_eq!(got[0].id, "c1");
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn rapid_submissions_ride_one_response() {
        let queue = Arc::new(CommandQueue::new());
        let (_tx, rx) = shutdown_pair();

        let poller = {
            let queue = queue.clone();
            tokio::spawn(async move { queue.wait_for_commands(Duration::from_secs(30), rx).await })
        };
        tokio::time::sleep(Duration::from_millis(5)).await;

        queue.submit(command("c1", "createNode")).await;
        queue.submit(command("c2", "setStyle")).await;
        queue.submit(command("c3", "bindVariable")).await;

        let got = poller.await.unwrap();
        let ids: Vec<&str> = got.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["c1", "c2", "c3"]);
        assert!(queue.drain_all().await.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn losing_poller_keeps_waiting() {
        let queue = Arc::new(CommandQueue::new());
        let (_tx, rx_a) = shutdown_pair();
        let rx_b = rx_a.clone();

        let poller_a = {
            let queue = queue.clone();
            tokio::spawn(async move {
                let start = Instant::now();
                let got = queue.wait_for_commands(Duration::from_secs(2), rx_a).await;
                (got, start.elapsed())
            })
        };
        tokio::time::sleep(Duration::from_millis(1)).await;
        let poller_b = {
            let queue = queue.clone();
            tokio::spawn(async move {
                let start = Instant::now();
                let got = queue.wait_for_commands(Duration::from_secs(2), rx_b).await;
                (got, start.elapsed())
            })
        };
        tokio::time::sleep(Duration::from_millis(1)).await;

        queue.submit(command("c1", "ping")).await;

        let (got_a, elapsed_a) = poller_a.await.unwrap();
        let (got_b, elapsed_b) = poller_b.await.unwrap();

        // Exactly one poller gets the command; the other waits out its own
        // deadline instead of resolving empty early.
        let mut all: Vec<&str> = got_a
            .iter()
            .chain(got_b.iter())
            .map(|c| c.id.as_str())
            .collect();
        all.sort_unstable();
        assert_eq!(all, vec!["c1"]);
        let loser_elapsed = if got_a.is_empty() { elapsed_a } else { elapsed_b };
        assert!(loser_elapsed >= Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_resolves_parked_poll() {
        let queue = Arc::new(CommandQueue::new());
        let (tx, rx) = shutdown_pair();

        let poller = {
            let queue = queue.clone();
            tokio::spawn(async move { queue.wait_for_commands(Duration::from_secs(30), rx).await })
        };
        tokio::time::sleep(Duration::from_millis(5)).await;

        let start = Instant::now();
        tx.send(true).unwrap();
        let got = poller.await.unwrap();
        assert!(got.is_empty());
        assert!(start.elapsed() < Duration::from_secs(1));
    }
}
