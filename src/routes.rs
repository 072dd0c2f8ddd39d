use std::sync::Arc;

use axum::{
    extract::{MatchedPath, Request, State},
    http::Method,
    routing::{delete, get, post},
    Json,
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    http_objects::{
        Ack,
        AppendLogRequest,
        BridgeAPIError,
        CommandList,
        CommandQueued,
        ErrorsResponse,
        HealthResponse,
        LogEntryView,
        LogsResponse,
        ResultStatus,
        ResultStatusResponse,
        RunningCommandResponse,
        SubmitCommandRequest,
        SubmitResultRequest,
    },
    server_commands::ServerCommandRegistry,
    state_store::BridgeState,
    utils::get_epoch_time_in_ms,
};

mod commands;
mod logs;
mod results;

#[derive(OpenApi)]
#[openapi(
    paths(
        commands::submit_command,
        commands::drain_commands,
        commands::poll_commands,
        commands::cancel_command,
        results::submit_result,
        results::clear_results,
        results::get_result,
        results::result_status,
        logs::append_log,
        logs::get_logs,
        logs::clear_logs,
        logs::get_errors,
        logs::clear_errors,
        logs::running_command,
        health,
    ),
    components(
        schemas(
            BridgeAPIError,
            SubmitCommandRequest,
            CommandQueued,
            CommandList,
            SubmitResultRequest,
            Ack,
            ResultStatus,
            ResultStatusResponse,
            AppendLogRequest,
            LogEntryView,
            LogsResponse,
            ErrorsResponse,
            RunningCommandResponse,
            HealthResponse,
            crate::data_model::Command,
            crate::data_model::CommandResult,
            crate::data_model::LogEntry,
            crate::data_model::LogLevel,
        )
    ),
    tags(
        (name = "bridge", description = "Command/result exchange broker API")
    )
)]
struct ApiDoc;

#[derive(Clone)]
pub struct RouteState {
    pub bridge_state: Arc<BridgeState>,
    pub server_commands: Arc<ServerCommandRegistry>,
}

pub fn create_routes(route_state: RouteState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_origin(Any)
        .allow_headers(Any);

    Router::new()
        .merge(SwaggerUi::new("/docs/swagger").url("/docs/openapi.json", ApiDoc::openapi()))
        .route("/", get(index))
        .route(
            "/commands",
            post(commands::submit_command).with_state(route_state.clone()),
        )
        .route(
            "/commands",
            get(commands::drain_commands).with_state(route_state.clone()),
        )
        .route(
            "/commands/poll",
            get(commands::poll_commands).with_state(route_state.clone()),
        )
        .route(
            "/commands/{id}",
            delete(commands::cancel_command).with_state(route_state.clone()),
        )
        .route(
            "/results",
            post(results::submit_result).with_state(route_state.clone()),
        )
        .route(
            "/results",
            delete(results::clear_results).with_state(route_state.clone()),
        )
        .route(
            "/results/{id}",
            get(results::get_result).with_state(route_state.clone()),
        )
        .route(
            "/results/{id}/status",
            get(results::result_status).with_state(route_state.clone()),
        )
        .route(
            "/logs",
            post(logs::append_log).with_state(route_state.clone()),
        )
        .route("/logs", get(logs::get_logs).with_state(route_state.clone()))
        .route(
            "/logs",
            delete(logs::clear_logs).with_state(route_state.clone()),
        )
        .route(
            "/logs/errors",
            get(logs::get_errors).with_state(route_state.clone()),
        )
        .route(
            "/logs/errors",
            delete(logs::clear_errors).with_state(route_state.clone()),
        )
        .route(
            "/logs/running",
            get(logs::running_command).with_state(route_state.clone()),
        )
        .route("/health", get(health).with_state(route_state.clone()))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &Request| {
                    let method = req.method();
                    let uri = req.uri();

                    let matched_path = req
                        .extensions()
                        .get::<MatchedPath>()
                        .map(|matched_path| matched_path.as_str());

                    tracing::debug_span!("request", %method, %uri, matched_path)
                })
                .on_failure(()),
        )
        .layer(cors)
}

async fn index() -> &'static str {
    "Bridge Server"
}

/// Liveness plus a queue depth snapshot
#[utoipa::path(
    get,
    path = "/health",
    tag = "bridge",
    responses(
        (status = 200, description = "Server is up", body = HealthResponse),
    ),
)]
async fn health(State(state): State<RouteState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        timestamp: get_epoch_time_in_ms(),
        pending_commands: state.bridge_state.command_queue.len().await,
        stored_results: state.bridge_state.result_store.len().await,
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
