use axum::{
    extract::{Query, State},
    Json,
};

use super::RouteState;
use crate::http_objects::{
    format_duration,
    Ack,
    AppendLogRequest,
    BridgeAPIError,
    ErrorsResponse,
    LogsParams,
    LogsResponse,
    RunningCommandResponse,
};

const DEFAULT_LOG_LIMIT: usize = 50;

/// Append a log entry from the plugin
#[utoipa::path(
    post,
    path = "/logs",
    tag = "bridge",
    request_body = AppendLogRequest,
    responses(
        (status = 200, description = "Entry recorded", body = Ack),
        (status = 400, description = "Missing required field: message"),
    ),
)]
pub async fn append_log(
    State(state): State<RouteState>,
    Json(req): Json<AppendLogRequest>,
) -> Result<Json<Ack>, BridgeAPIError> {
    let Some(message) = req.message else {
        return Err(BridgeAPIError::bad_request(
            "Missing required field: message",
        ));
    };
    state.bridge_state.log_stream.append(message, req.level).await;
    Ok(Json(Ack::bare()))
}

/// Fetch recent log entries
#[utoipa::path(
    get,
    path = "/logs",
    tag = "bridge",
    params(LogsParams),
    responses(
        (status = 200, description = "The last `limit` entries", body = LogsResponse),
    ),
)]
pub async fn get_logs(
    State(state): State<RouteState>,
    Query(params): Query<LogsParams>,
) -> Json<LogsResponse> {
    // limit=0 falls back to the default, like a missing limit.
    let limit = params
        .limit
        .filter(|limit| *limit > 0)
        .unwrap_or(DEFAULT_LOG_LIMIT);
    let logs = state.bridge_state.log_stream.tail(Some(limit)).await;
    Json(LogsResponse {
        count: logs.len(),
        logs: logs.into_iter().map(Into::into).collect(),
    })
}

/// Clear the main log; the error list is untouched
#[utoipa::path(
    delete,
    path = "/logs",
    tag = "bridge",
    responses(
        (status = 200, description = "Main log cleared", body = Ack),
    ),
)]
pub async fn clear_logs(State(state): State<RouteState>) -> Json<Ack> {
    state.bridge_state.log_stream.clear().await;
    Json(Ack::new("Logs cleared"))
}

/// Fetch every error entry recorded since the last clear
#[utoipa::path(
    get,
    path = "/logs/errors",
    tag = "bridge",
    responses(
        (status = 200, description = "All persisted errors", body = ErrorsResponse),
    ),
)]
pub async fn get_errors(State(state): State<RouteState>) -> Json<ErrorsResponse> {
    let errors = state.bridge_state.log_stream.errors().await;
    Json(ErrorsResponse {
        count: errors.len(),
        errors: errors.into_iter().map(Into::into).collect(),
    })
}

/// Clear the error list only
#[utoipa::path(
    delete,
    path = "/logs/errors",
    tag = "bridge",
    responses(
        (status = 200, description = "Errors cleared", body = Ack),
    ),
)]
pub async fn clear_errors(State(state): State<RouteState>) -> Json<Ack> {
    state.bridge_state.log_stream.clear_errors().await;
    Json(Ack::new("Errors cleared"))
}

/// What the plugin is executing right now, if anything
#[utoipa::path(
    get,
    path = "/logs/running",
    tag = "bridge",
    responses(
        (status = 200, description = "Current run-state", body = RunningCommandResponse),
    ),
)]
pub async fn running_command(State(state): State<RouteState>) -> Json<RunningCommandResponse> {
    match state.bridge_state.log_stream.running().await {
        Some(running) => Json(RunningCommandResponse {
            running: true,
            command_id: Some(running.command_id),
            command_type: Some(running.command_type),
            elapsed_formatted: Some(format_duration(running.elapsed_ms)),
            elapsed_ms: Some(running.elapsed_ms),
        }),
        None => Json(RunningCommandResponse::idle()),
    }
}
