use std::{sync::Arc, time::Duration};

use tokio::sync::watch;
use tracing::info;

use crate::state_store::BridgeState;

/// Periodic TTL eviction of stored results, independent of any request.
pub struct ResultSweeper {
    state: Arc<BridgeState>,
    max_age: Duration,
    interval: Duration,
    shutdown_rx: watch::Receiver<bool>,
}

impl ResultSweeper {
    pub fn new(
        state: Arc<BridgeState>,
        max_age: Duration,
        interval: Duration,
        shutdown_rx: watch::Receiver<bool>,
    ) -> Self {
        Self {
            state,
            max_age,
            interval,
            shutdown_rx,
        }
    }

    pub async fn start(mut self) {
        loop {
            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {
                    let removed = self.state.result_store.sweep_expired(self.max_age).await;
                    if removed > 0 {
                        info!(removed, "evicted expired results");
                    }
                }
                _ = self.shutdown_rx.changed() => {
                    info!("result sweeper shutting down");
                    return;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{data_model::CommandResult, utils::get_epoch_time_in_ms};

    #[tokio::test(start_paused = true)]
    async fn sweeps_on_interval_and_stops_on_shutdown() {
        let state = BridgeState::new();
        state
            .result_store
            .put(CommandResult {
                command_id: "stale".to_string(),
                success: true,
                data: None,
                error: None,
                node_id: None,
                node_ids: None,
                timestamp: get_epoch_time_in_ms().saturating_sub(10 * 60 * 1000),
            })
            .await;

        let sweeper = ResultSweeper::new(
            state.clone(),
            Duration::from_secs(300),
            Duration::from_secs(60),
            state.shutdown_rx(),
        );
        let handle = tokio::spawn(sweeper.start());

        tokio::time::sleep(Duration::from_secs(61)).await;
        assert!(state.result_store.get("stale").await.is_none());

        state.shutdown();
        handle.await.unwrap();
    }
}
