use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use tracing::error;
use utoipa::{IntoParams, ToSchema};

use crate::data_model::{Command, LogEntry, LogLevel};

#[derive(Debug, ToSchema, Serialize, Deserialize)]
pub struct BridgeAPIError {
    #[serde(skip)]
    status_code: StatusCode,
    message: String,
}

impl BridgeAPIError {
    pub fn new(status_code: StatusCode, message: &str) -> Self {
        Self {
            status_code,
            message: message.to_string(),
        }
    }

    pub fn bad_request(message: &str) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn not_found(message: &str) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn request_timeout(message: &str) -> Self {
        Self::new(StatusCode::REQUEST_TIMEOUT, message)
    }
}

impl IntoResponse for BridgeAPIError {
    fn into_response(self) -> Response {
        error!("API Error: {} - {}", self.status_code, self.message);
        (self.status_code, self.message).into_response()
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SubmitCommandRequest {
    #[serde(rename = "type")]
    pub command_type: Option<String>,
    pub target: Option<String>,
    pub payload: Option<serde_json::Value>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CommandQueued {
    pub success: bool,
    pub command_id: String,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CommandList {
    pub commands: Vec<Command>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, IntoParams)]
pub struct PollParams {
    /// Poll timeout in milliseconds, clamped server-side.
    pub timeout: Option<u64>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubmitResultRequest {
    pub command_id: Option<String>,
    #[serde(default)]
    pub success: bool,
    pub data: Option<serde_json::Value>,
    pub error: Option<String>,
    pub node_id: Option<String>,
    pub node_ids: Option<Vec<String>>,
    pub timestamp: Option<u64>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Ack {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl Ack {
    pub fn new(message: &str) -> Self {
        Self {
            success: true,
            message: Some(message.to_string()),
        }
    }

    pub fn bare() -> Self {
        Self {
            success: true,
            message: None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema, IntoParams)]
pub struct ResultQueryParams {
    /// Hold the request open until the result arrives.
    #[serde(default)]
    pub wait: bool,
    /// Wait timeout in milliseconds, clamped server-side.
    pub timeout: Option<u64>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ResultStatus {
    Completed,
    Pending,
    Unknown,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResultStatusResponse {
    pub command_id: String,
    pub status: ResultStatus,
    pub has_result: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub success: Option<bool>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AppendLogRequest {
    pub message: Option<String>,
    #[serde(rename = "type", default)]
    pub level: LogLevel,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, IntoParams)]
pub struct LogsParams {
    /// Entry count cap; absent or 0 means the server default.
    pub limit: Option<usize>,
}

/// Log entry as served to clients; `time` is a wall-clock rendering of the
/// timestamp for humans skimming the log view.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LogEntryView {
    pub timestamp: u64,
    pub message: String,
    #[serde(rename = "type")]
    pub level: LogLevel,
    pub time: String,
}

impl From<LogEntry> for LogEntryView {
    fn from(entry: LogEntry) -> Self {
        Self {
            time: format_clock_time(entry.timestamp),
            timestamp: entry.timestamp,
            message: entry.message,
            level: entry.level,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LogsResponse {
    pub count: usize,
    pub logs: Vec<LogEntryView>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorsResponse {
    pub count: usize,
    pub errors: Vec<LogEntryView>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RunningCommandResponse {
    pub running: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elapsed_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elapsed_formatted: Option<String>,
}

impl RunningCommandResponse {
    pub fn idle() -> Self {
        Self {
            running: false,
            command_id: None,
            command_type: None,
            elapsed_ms: None,
            elapsed_formatted: None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: u64,
    pub pending_commands: usize,
    pub stored_results: usize,
    pub version: String,
}

/// Renders an epoch-ms timestamp as UTC `HH:MM:SS`.
pub fn format_clock_time(timestamp_ms: u64) -> String {
    let seconds_of_day = (timestamp_ms / 1000) % 86_400;
    format!(
        "{:02}:{:02}:{:02}",
        seconds_of_day / 3600,
        (seconds_of_day / 60) % 60,
        seconds_of_day % 60
    )
}

/// Human-readable duration: `456ms`, `5s 200ms`, `1m 23s`.
pub fn format_duration(ms: u64) -> String {
    if ms < 1000 {
        return format!("{ms}ms");
    }
    let seconds = ms / 1000;
    let remaining_ms = ms % 1000;
    if seconds < 60 {
        return if remaining_ms > 0 {
            format!("{seconds}s {remaining_ms}ms")
        } else {
            format!("{seconds}s")
        };
    }
    let minutes = seconds / 60;
    let remaining_seconds = seconds % 60;
    if remaining_seconds > 0 {
        format!("{minutes}m {remaining_seconds}s")
    } else {
        format!("{minutes}m")
    }
}
