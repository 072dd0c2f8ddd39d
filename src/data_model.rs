use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

fn empty_payload() -> serde_json::Value {
    serde_json::Value::Object(serde_json::Map::new())
}

/// A command queued by a producer, waiting to be handed to the plugin.
///
/// Immutable once created. It leaves the pending queue the moment it is
/// handed to a poll response, or earlier if cancelled.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Command {
    pub id: String,
    #[serde(rename = "type")]
    pub command_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    #[serde(default = "empty_payload")]
    pub payload: serde_json::Value,
    pub timestamp: u64,
}

/// Outcome of executing a command, keyed by command id.
///
/// A later submission with the same command id overwrites the earlier one.
/// Domain failures are carried here as `success: false` plus `error`; they
/// are never surfaced as HTTP errors by the broker.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CommandResult {
    pub command_id: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_ids: Option<Vec<String>>,
    pub timestamp: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    #[default]
    Info,
    Success,
    Error,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LogEntry {
    pub timestamp: u64,
    pub message: String,
    #[serde(rename = "type")]
    pub level: LogLevel,
}

/// Derived single-slot state: the command the plugin is executing right now.
///
/// The design assumes the plugin executes commands strictly sequentially, so
/// at most one of these exists at a time.
#[derive(Debug, Clone)]
pub struct RunningCommand {
    pub command_id: String,
    pub command_type: String,
    pub start_time: u64,
}
