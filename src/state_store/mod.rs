use std::{sync::Arc, time::Duration};

use tokio::sync::watch;
use tracing::info;

use crate::data_model::{Command, CommandResult};

pub mod command_queue;
pub mod log_stream;
pub mod result_store;

use command_queue::CommandQueue;
use log_stream::LogStream;
use result_store::ResultStore;

/// Owner of every broker-side structure: the pending command queue, the
/// result store, and the log streams with their run-state tracker. All
/// mutation goes through the methods of these stores; HTTP handlers never
/// touch the interior state directly.
pub struct BridgeState {
    pub command_queue: CommandQueue,
    pub result_store: ResultStore,
    pub log_stream: LogStream,
    shutdown_tx: watch::Sender<bool>,
}

impl BridgeState {
    pub fn new() -> Arc<Self> {
        let (shutdown_tx, _) = watch::channel(false);
        Arc::new(Self {
            command_queue: CommandQueue::new(),
            result_store: ResultStore::new(),
            log_stream: LogStream::new(),
            shutdown_tx,
        })
    }

    pub fn shutdown_rx(&self) -> watch::Receiver<bool> {
        self.shutdown_tx.subscribe()
    }

    /// Resolves every parked long-poll with an empty outcome and stops the
    /// sweeper loop. The stores themselves need no teardown.
    pub fn shutdown(&self) {
        info!("resolving outstanding long polls for shutdown");
        let _ = self.shutdown_tx.send(true);
    }

    /// Long-poll for pending commands; see
    /// [`CommandQueue::wait_for_commands`].
    pub async fn wait_for_commands(&self, timeout: Duration) -> Vec<Command> {
        self.command_queue
            .wait_for_commands(timeout, self.shutdown_rx())
            .await
    }

    /// Long-poll for one command's result; see [`ResultStore::wait_for`].
    pub async fn wait_for_result(
        &self,
        command_id: &str,
        timeout: Duration,
    ) -> Option<CommandResult> {
        self.result_store
            .wait_for(command_id, timeout, self.shutdown_rx())
            .await
    }
}
