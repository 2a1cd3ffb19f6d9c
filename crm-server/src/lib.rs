//! crm-server - HTTP server for ChurchCRM plugin management
//!
//! This crate owns the [`crm_core::PluginManager`] and exposes it as JSON
//! endpoints under `/api`, guarded by the API-key admin middleware.

mod error;
pub mod http;
pub mod middleware;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use crm_core::PluginManager;
use tokio::net::TcpListener;

pub use error::{ApiError, ServerError};
pub use http::create_router;
pub use middleware::{ApiKey, AuthConfig, AuthLayer, auth_middleware};
pub use state::AppState;

/// The plugin management server
pub struct PluginServer {
    config: ServerConfig,
    state: Arc<AppState>,
}

impl PluginServer {
    /// Create a server around an initialised plugin manager
    pub fn new(config: ServerConfig, manager: PluginManager) -> Self {
        Self {
            config,
            state: Arc::new(AppState::new(manager)),
        }
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
        let addr = self.config.addr();
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| ServerError::Bind {
                addr: addr.clone(),
                source: e,
            })?;

        tracing::info!("crm server listening on {}", addr);
        self.run_with_listener(listener).await
    }

    /// Serve on an already bound listener
    pub async fn run_with_listener(self, listener: TcpListener) -> Result<(), ServerError> {
        let router = create_router(self.state, AuthLayer::new(self.config.auth));
        axum::serve(
            listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .map_err(|e| ServerError::Internal(e.to_string()))?;

        Ok(())
    }
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Host address to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// API-key authentication
    pub auth: AuthConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 7780,
            auth: AuthConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Create a new ServerConfig with the specified host and port
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            auth: AuthConfig::default(),
        }
    }

    /// Builder: set authentication
    pub fn with_auth(mut self, auth: AuthConfig) -> Self {
        self.auth = auth;
        self
    }

    /// Returns the socket address string (e.g., "127.0.0.1:7780")
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
