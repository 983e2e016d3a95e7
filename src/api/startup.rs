//! Router assembly and server lifecycle

use super::handlers;
use crate::{
    config::ServerConfig,
    error::Result,
    pipeline::RemovalPipeline,
    remover::BackgroundRemover,
    services::ImageFetcher,
};
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::{future::Future, net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// Shared, read-only request state
#[derive(Clone, Debug)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    pub pipeline: RemovalPipeline,
    pub fetcher: ImageFetcher,
}

impl AppState {
    /// Assemble state from a validated configuration and a remover
    ///
    /// # Errors
    /// - Invalid configuration
    /// - HTTP client construction failure
    pub fn new(config: ServerConfig, remover: Arc<dyn BackgroundRemover>) -> Result<Self> {
        config.validate()?;
        let fetcher = ImageFetcher::new(config.fetch_timeout)?;
        Ok(Self {
            config: Arc::new(config),
            pipeline: RemovalPipeline::new(remover),
            fetcher,
        })
    }
}

/// Build the service router
pub fn build_router(state: AppState) -> Router {
    let mut router = Router::new()
        .route("/health", get(handlers::health_check))
        .route("/remove-bg", post(handlers::remove_background))
        .route("/remove-bg-url", post(handlers::remove_background_from_url));

    if state.config.serve_demo {
        router = router.route("/", get(handlers::demo_page));
    }

    router
        .layer(DefaultBodyLimit::max(state.config.body_limit()))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bound, not yet running HTTP server
pub struct Application {
    listener: TcpListener,
    router: Router,
    local_addr: SocketAddr,
}

impl Application {
    /// Bind the configured address and build the router
    ///
    /// Port 0 binds an ephemeral port; see [`Application::port`].
    pub async fn build(config: ServerConfig, remover: Arc<dyn BackgroundRemover>) -> Result<Self> {
        let addr = config.socket_addr();
        let state = AppState::new(config, remover)?;
        let router = build_router(state);

        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!(%addr, error = %e, "Failed to bind TCP listener");
            e
        })?;
        let local_addr = listener.local_addr()?;

        tracing::info!(addr = %local_addr, "Listening");

        Ok(Self {
            listener,
            router,
            local_addr,
        })
    }

    #[must_use]
    pub fn port(&self) -> u16 {
        self.local_addr.port()
    }

    #[must_use]
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Serve until the process is killed
    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        axum::serve(self.listener, self.router).await
    }

    /// Serve until `signal` resolves, then drain in-flight requests
    pub async fn run_with_shutdown<F>(self, signal: F) -> std::io::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        axum::serve(self.listener, self.router)
            .with_graceful_shutdown(signal)
            .await
    }
}
