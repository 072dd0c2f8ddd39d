use std::time::Duration;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use super::RouteState;
use crate::{
    data_model::Command,
    http_objects::{Ack, BridgeAPIError, CommandList, CommandQueued, PollParams, SubmitCommandRequest},
    server_commands,
    utils::get_epoch_time_in_ms,
};

const DEFAULT_POLL_TIMEOUT_MS: u64 = 30_000;

/// Queue a command for the plugin, or kick off a server-side one
#[utoipa::path(
    post,
    path = "/commands",
    tag = "bridge",
    request_body = SubmitCommandRequest,
    responses(
        (status = 201, description = "Command queued", body = CommandQueued),
        (status = 202, description = "Server-side execution started", body = CommandQueued),
        (status = 400, description = "Missing required field: type"),
    ),
)]
pub async fn submit_command(
    State(state): State<RouteState>,
    Json(req): Json<SubmitCommandRequest>,
) -> Result<(StatusCode, Json<CommandQueued>), BridgeAPIError> {
    let Some(command_type) = req.command_type else {
        return Err(BridgeAPIError::bad_request("Missing required field: type"));
    };
    let payload = req
        .payload
        .unwrap_or_else(|| serde_json::Value::Object(Default::default()));
    let command_id = Uuid::new_v4().to_string();

    if let Some(handler) = state.server_commands.get(&command_type) {
        server_commands::spawn_execution(
            handler,
            state.bridge_state.clone(),
            command_id.clone(),
            payload,
        );
        return Ok((
            StatusCode::ACCEPTED,
            Json(CommandQueued {
                success: true,
                command_id,
                message: "Execution started. Poll /results/{commandId}?wait=true for results."
                    .to_string(),
            }),
        ));
    }

    let command = Command {
        id: command_id.clone(),
        command_type,
        target: req.target,
        payload,
        timestamp: get_epoch_time_in_ms(),
    };
    state.bridge_state.command_queue.submit(command).await;

    Ok((
        StatusCode::CREATED,
        Json(CommandQueued {
            success: true,
            command_id,
            message: "Command queued successfully".to_string(),
        }),
    ))
}

/// Non-blocking drain of every pending command
#[utoipa::path(
    get,
    path = "/commands",
    tag = "bridge",
    responses(
        (status = 200, description = "Pending commands, removed from the queue", body = CommandList),
    ),
)]
pub async fn drain_commands(State(state): State<RouteState>) -> Json<CommandList> {
    let commands = state.bridge_state.command_queue.drain_all().await;
    Json(CommandList { commands })
}

/// Long-poll for commands; empty on timeout
#[utoipa::path(
    get,
    path = "/commands/poll",
    tag = "bridge",
    params(PollParams),
    responses(
        (status = 200, description = "Commands, possibly none if the poll timed out", body = CommandList),
    ),
)]
pub async fn poll_commands(
    State(state): State<RouteState>,
    Query(params): Query<PollParams>,
) -> Json<CommandList> {
    let timeout = Duration::from_millis(params.timeout.unwrap_or(DEFAULT_POLL_TIMEOUT_MS));
    let commands = state.bridge_state.wait_for_commands(timeout).await;
    Json(CommandList { commands })
}

/// Cancel a command that has not been handed off yet
#[utoipa::path(
    delete,
    path = "/commands/{id}",
    tag = "bridge",
    responses(
        (status = 200, description = "Command cancelled", body = Ack),
        (status = 404, description = "Not found or already delivered"),
    ),
)]
pub async fn cancel_command(
    State(state): State<RouteState>,
    Path(id): Path<String>,
) -> Result<Json<Ack>, BridgeAPIError> {
    if state.bridge_state.command_queue.cancel(&id).await {
        Ok(Json(Ack::new("Command cancelled")))
    } else {
        Err(BridgeAPIError::not_found(
            "Command not found or already executed",
        ))
    }
}
