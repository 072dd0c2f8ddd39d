use std::{net::SocketAddr, sync::Arc};

use anyhow::Result;
use axum_server::Handle;
use tokio::signal;
use tracing::info;

use crate::{
    config::ServerConfig,
    routes::{create_routes, RouteState},
    server_commands::ServerCommandRegistry,
    state_store::BridgeState,
    sweeper::ResultSweeper,
};

#[derive(Clone)]
pub struct Service {
    pub config: ServerConfig,
    pub bridge_state: Arc<BridgeState>,
    pub server_commands: Arc<ServerCommandRegistry>,
}

impl Service {
    pub fn new(config: ServerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            bridge_state: BridgeState::new(),
            server_commands: Arc::new(ServerCommandRegistry::new()),
        })
    }

    pub async fn start(&self) -> Result<()> {
        let sweeper = ResultSweeper::new(
            self.bridge_state.clone(),
            self.config.result_ttl(),
            self.config.sweep_interval(),
            self.bridge_state.shutdown_rx(),
        );
        tokio::spawn(sweeper.start());

        let route_state = RouteState {
            bridge_state: self.bridge_state.clone(),
            server_commands: self.server_commands.clone(),
        };

        let handle = Handle::new();
        let handle_sh = handle.clone();
        let bridge_state = self.bridge_state.clone();
        tokio::spawn(async move {
            shutdown_signal(handle_sh, bridge_state).await;
            info!("graceful shutdown signal received, shutting down server gracefully");
        });

        let addr: SocketAddr = self.config.listen_addr.parse()?;
        info!("server api listening on {}", self.config.listen_addr);
        let routes = create_routes(route_state);
        axum_server::bind(addr)
            .handle(handle)
            .serve(routes.into_make_service())
            .await?;

        Ok(())
    }
}

async fn shutdown_signal(handle: Handle, bridge_state: Arc<BridgeState>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
        },
        _ = terminate => {
        },
    }
    bridge_state.shutdown();
    handle.shutdown();
    info!("signal received, shutting down server gracefully");
}
