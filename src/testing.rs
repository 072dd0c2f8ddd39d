use anyhow::Result;
use axum::Router;
use tracing::subscriber;
use tracing_subscriber::{layer::SubscriberExt, Layer};

use crate::{
    config::ServerConfig,
    routes::{create_routes, RouteState},
    service::Service,
};

pub struct TestService {
    pub service: Service,
}

impl TestService {
    pub fn new() -> Result<Self> {
        let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("trace"));
        let _ = subscriber::set_global_default(
            tracing_subscriber::registry()
                .with(tracing_subscriber::fmt::layer().with_filter(env_filter)),
        );

        let service = Service::new(ServerConfig::default())?;
        Ok(Self { service })
    }

    /// Router wired to this service's state, for request-level tests.
    pub fn router(&self) -> Router {
        create_routes(RouteState {
            bridge_state: self.service.bridge_state.clone(),
            server_commands: self.service.server_commands.clone(),
        })
    }
}
