use std::time::Duration;

use axum::{
    extract::{Path, Query, State},
    Json,
};

use super::RouteState;
use crate::{
    data_model::CommandResult,
    http_objects::{
        Ack,
        BridgeAPIError,
        ResultQueryParams,
        ResultStatus,
        ResultStatusResponse,
        SubmitResultRequest,
    },
    utils::get_epoch_time_in_ms,
};

const DEFAULT_RESULT_WAIT_MS: u64 = 30_000;

/// Record the outcome of a command; overwrites any earlier result
#[utoipa::path(
    post,
    path = "/results",
    tag = "bridge",
    request_body = SubmitResultRequest,
    responses(
        (status = 200, description = "Result recorded", body = Ack),
        (status = 400, description = "Missing required field: commandId"),
    ),
)]
pub async fn submit_result(
    State(state): State<RouteState>,
    Json(req): Json<SubmitResultRequest>,
) -> Result<Json<Ack>, BridgeAPIError> {
    let Some(command_id) = req.command_id else {
        return Err(BridgeAPIError::bad_request(
            "Missing required field: commandId",
        ));
    };
    let result = CommandResult {
        command_id,
        success: req.success,
        data: req.data,
        error: req.error,
        node_id: req.node_id,
        node_ids: req.node_ids,
        timestamp: req.timestamp.unwrap_or_else(get_epoch_time_in_ms),
    };
    state.bridge_state.result_store.put(result).await;
    Ok(Json(Ack::new("Result recorded")))
}

/// Drop every stored result, for operators resetting a wedged exchange
#[utoipa::path(
    delete,
    path = "/results",
    tag = "bridge",
    responses(
        (status = 200, description = "All results dropped", body = Ack),
    ),
)]
pub async fn clear_results(State(state): State<RouteState>) -> Json<Ack> {
    let removed = state.bridge_state.result_store.clear().await;
    Json(Ack::new(&format!("Cleared {removed} results")))
}

/// Fetch a result, optionally holding the request open until it arrives
#[utoipa::path(
    get,
    path = "/results/{id}",
    tag = "bridge",
    params(ResultQueryParams),
    responses(
        (status = 200, description = "The stored result", body = CommandResult),
        (status = 404, description = "No result yet (no-wait mode)"),
        (status = 408, description = "Timed out waiting (wait mode)"),
    ),
)]
pub async fn get_result(
    State(state): State<RouteState>,
    Path(id): Path<String>,
    Query(params): Query<ResultQueryParams>,
) -> Result<Json<CommandResult>, BridgeAPIError> {
    if params.wait {
        let timeout = Duration::from_millis(params.timeout.unwrap_or(DEFAULT_RESULT_WAIT_MS));
        return state
            .bridge_state
            .wait_for_result(&id, timeout)
            .await
            .map(Json)
            .ok_or_else(|| BridgeAPIError::request_timeout("Timeout waiting for result"));
    }
    state
        .bridge_state
        .result_store
        .get(&id)
        .await
        .map(Json)
        .ok_or_else(|| BridgeAPIError::not_found("Result not found"))
}

/// Non-blocking status probe for a command
#[utoipa::path(
    get,
    path = "/results/{id}/status",
    tag = "bridge",
    responses(
        (status = 200, description = "Where the command currently stands", body = ResultStatusResponse),
    ),
)]
pub async fn result_status(
    State(state): State<RouteState>,
    Path(id): Path<String>,
) -> Json<ResultStatusResponse> {
    let result = state.bridge_state.result_store.get(&id).await;
    let pending = state.bridge_state.command_queue.contains(&id).await;

    let status = if result.is_some() {
        ResultStatus::Completed
    } else if pending {
        ResultStatus::Pending
    } else {
        ResultStatus::Unknown
    };
    Json(ResultStatusResponse {
        command_id: id,
        has_result: result.is_some(),
        success: result.map(|r| r.success),
        status,
    })
}
