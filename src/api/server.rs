//! API Server
//!
//! HTTP server setup: middleware stack, socket binding, and graceful
//! shutdown. Tracing is initialized by the binary, not here, so tests
//! can mount the app without touching the global subscriber.

use super::{
    handlers::AppState,
    middleware::{create_cors_layer, request_id_middleware},
    routes::create_router,
};
use crate::engine::GameEngine;
use std::{net::SocketAddr, sync::Arc};
use tokio::signal;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};
use tracing::info;

/// Wagering API server
pub struct ApiServer {
    engine: Arc<GameEngine>,
}

impl ApiServer {
    pub fn new(engine: Arc<GameEngine>) -> Self {
        Self { engine }
    }

    /// Start the API server
    pub async fn run(self) -> Result<(), Box<dyn std::error::Error>> {
        let addr = self.get_socket_addr()?;
        let app = self.create_app();

        info!("🌐 Starting Luckbox API Server");
        info!("   Listen: http://{}", addr);
        self.log_server_info();

        let listener = tokio::net::TcpListener::bind(addr).await?;

        info!("✅ API Server running");

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        info!("🛑 API Server stopped gracefully");
        Ok(())
    }

    /// Create the application with the full middleware stack
    pub fn create_app(&self) -> axum::Router {
        let server = &self.engine.config().server;
        let allowed_origins = server.allowed_origins.clone();
        let request_timeout = server.request_timeout();

        let state = Arc::new(AppState {
            engine: self.engine.clone(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            started_at: chrono::Utc::now(),
        });

        create_router(state)
            // Request ID middleware (first for tracing)
            .layer(axum::middleware::from_fn(request_id_middleware))

            // CORS layer (before timeout to handle preflight)
            .layer(create_cors_layer(allowed_origins))

            // Timeout layer
            .layer(TimeoutLayer::new(request_timeout))

            // Tracing layer (last for complete request tracing)
            .layer(TraceLayer::new_for_http())
    }

    /// Get socket address from config
    fn get_socket_addr(&self) -> Result<SocketAddr, Box<dyn std::error::Error>> {
        let server = &self.engine.config().server;
        Ok(SocketAddr::from((
            server.host.parse::<std::net::IpAddr>()?,
            server.port,
        )))
    }

    /// Log server information
    fn log_server_info(&self) {
        let config = self.engine.config();

        info!("📋 Server Configuration:");
        info!("   Ledger: {}", config.ledger.base_url);
        info!("   CORS: {:?}", config.server.allowed_origins);
        info!("   Request timeout: {}s", config.server.request_timeout_secs);
        info!(
            "   Rate guard: {} actions per {}ms window",
            config.sessions.rate_max_actions, config.sessions.rate_window_millis
        );

        info!("📊 Available endpoints:");
        info!("   GET  /health          - Health check");
        info!("   GET  /status          - Service status");
        info!("   POST /api/action      - Game actions");
        info!("   POST /api/findUser    - User lookup");
        info!("   POST /api/createUser  - User creation");
        info!("   GET  /metrics         - Prometheus metrics");
    }
}

/// Wait for shutdown signal
async fn shutdown_signal() {
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
            info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            info!("Received terminate signal");
        },
    }
}
