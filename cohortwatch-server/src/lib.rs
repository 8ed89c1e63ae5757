//! cohortwatch-server - relay of cohort bus events to WebSocket viewers
//!
//! This crate owns the [`relay::SubscriptionManager`] that follows one cohort
//! topic at a time, and the HTTP and WebSocket surface through which viewers
//! watch it and operators switch cohorts.

mod error;
pub mod http;
pub mod relay;
mod state;
pub mod ws;

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;

pub use error::ServerError;
pub use http::create_router;
pub use state::AppState;

/// The relay server
pub struct RelayServer {
    config: ServerConfig,
    state: Arc<AppState>,
}

impl RelayServer {
    /// Create a server with custom state
    pub fn with_state(config: ServerConfig, state: Arc<AppState>) -> Self {
        Self { config, state }
    }

    /// Get the server configuration
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Get the shared application state
    pub fn state(&self) -> Arc<AppState> {
        Arc::clone(&self.state)
    }

    /// Run the server, binding to the configured address
    pub async fn run(self) -> Result<(), ServerError> {
        self.run_until(std::future::pending()).await
    }

    /// Run the server until `shutdown` resolves, then close the active subscription
    pub async fn run_until(
        self,
        shutdown: impl Future<Output = ()> + Send + 'static,
    ) -> Result<(), ServerError> {
        let addr = self.config.addr();
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| ServerError::Bind {
                addr: addr.clone(),
                source: e,
            })?;

        tracing::info!("cohortwatch server listening on {}", addr);
        self.serve(listener, shutdown).await
    }

    /// Run the server on an already-bound listener (for testing)
    pub async fn run_with_listener(self, listener: TcpListener) -> Result<(), ServerError> {
        self.serve(listener, std::future::pending()).await
    }

    async fn serve(
        self,
        listener: TcpListener,
        shutdown: impl Future<Output = ()> + Send + 'static,
    ) -> Result<(), ServerError> {
        let router = create_router(Arc::clone(&self.state));
        let result = axum::serve(
            listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| ServerError::Internal(e.to_string()));

        self.state.relay.shutdown().await;
        tracing::info!("cohortwatch server stopped");
        result
    }
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Host address to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 7433,
        }
    }
}

impl ServerConfig {
    /// Create a new ServerConfig with the specified host and port
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Returns the socket address string (e.g., "0.0.0.0:7433")
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
