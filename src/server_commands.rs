use std::{collections::HashMap, sync::Arc};

use anyhow::Result;
use async_trait::async_trait;
use tracing::{error, info};

use crate::{data_model::CommandResult, state_store::BridgeState, utils::get_epoch_time_in_ms};

/// A command type the broker executes itself instead of handing to the
/// plugin, e.g. website extraction. The submit endpoint answers 202 for
/// these and the outcome lands in the result store like any other result.
#[async_trait]
pub trait ServerCommand: Send + Sync {
    /// Command type string that routes to this handler.
    fn command_type(&self) -> &str;

    async fn execute(&self, payload: serde_json::Value) -> Result<serde_json::Value>;
}

#[derive(Default)]
pub struct ServerCommandRegistry {
    handlers: HashMap<String, Arc<dyn ServerCommand>>,
}

impl ServerCommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, handler: Arc<dyn ServerCommand>) {
        self.handlers
            .insert(handler.command_type().to_string(), handler);
    }

    pub fn get(&self, command_type: &str) -> Option<Arc<dyn ServerCommand>> {
        self.handlers.get(command_type).cloned()
    }
}

/// Runs a server-side command off the request path and stores its outcome.
/// Execution failures become `success: false` results, never HTTP errors;
/// the broker's contract ends at delivery.
pub fn spawn_execution(
    handler: Arc<dyn ServerCommand>,
    state: Arc<BridgeState>,
    command_id: String,
    payload: serde_json::Value,
) {
    tokio::spawn(async move {
        info!(
            command_id,
            command_type = handler.command_type(),
            "executing server-side command"
        );
        state
            .log_stream
            .set_running(command_id.clone(), handler.command_type().to_string())
            .await;
        let result = match handler.execute(payload).await {
            Ok(data) => CommandResult {
                command_id: command_id.clone(),
                success: true,
                data: Some(data),
                error: None,
                node_id: None,
                node_ids: None,
                timestamp: get_epoch_time_in_ms(),
            },
            Err(e) => {
                error!(command_id, "server-side command failed: {e:?}");
                CommandResult {
                    command_id: command_id.clone(),
                    success: false,
                    data: None,
                    error: Some(e.to_string()),
                    node_id: None,
                    node_ids: None,
                    timestamp: get_epoch_time_in_ms(),
                }
            }
        };
        state.log_stream.clear_running().await;
        state.result_store.put(result).await;
    });
}
