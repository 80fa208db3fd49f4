//! HTTP server implementation.
//!
//! [`EdgeServer`] owns the execution context and runs the HTTP surface
//! until shutdown. While it runs, a background ticker increments the engine
//! epoch once per millisecond so per-request epoch deadlines measure
//! wall-clock time.

use std::net::SocketAddr;
use std::time::Duration;

use tokio::net::TcpListener;
use tracing::info;

use edge_dispatch_common::{GatewayError, RuntimeConfig};
use edge_dispatch_core::ModuleSource;

use crate::router::build_router;
use crate::state::AppState;

/// Configuration for the HTTP server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind the server.
    pub bind_addr: SocketAddr,
    /// Request timeout in seconds.
    pub request_timeout_secs: u64,
    /// Enable graceful shutdown on SIGTERM/SIGINT.
    pub graceful_shutdown: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8080".parse().unwrap(),
            request_timeout_secs: 30,
            graceful_shutdown: true,
        }
    }
}

impl ServerConfig {
    /// Create a new server config with custom bind address.
    pub fn with_bind_addr(mut self, addr: SocketAddr) -> Self {
        self.bind_addr = addr;
        self
    }

    /// Create a new server config with custom timeout.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.request_timeout_secs = secs;
        self
    }

    /// Get the request timeout as Duration.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Dispatch gateway HTTP server.
pub struct EdgeServer {
    /// Application state.
    state: AppState,
    /// Server configuration.
    config: ServerConfig,
}

impl EdgeServer {
    /// Create a new server instance around one handler module.
    ///
    /// # Errors
    ///
    /// Returns an error if the engine cannot be initialized. A bad module
    /// source does not fail here; it surfaces on the first dispatched
    /// event as a diagnostic response.
    pub fn new(
        runtime_config: &RuntimeConfig,
        server_config: ServerConfig,
        module_source: ModuleSource,
        entry: &str,
    ) -> Result<Self, GatewayError> {
        let state = AppState::new(runtime_config, module_source, entry)?;

        Ok(Self {
            state,
            config: server_config,
        })
    }

    /// Get a reference to the application state.
    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Get the server configuration.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Run the server until shutdown.
    ///
    /// Blocks until the server is shut down via signal (SIGTERM/SIGINT)
    /// if graceful shutdown is enabled.
    ///
    /// # Errors
    ///
    /// Returns an error if the server cannot bind to the address.
    pub async fn run(self) -> Result<(), GatewayError> {
        let epoch_ticker = self.spawn_epoch_ticker();

        let app = build_router(self.state, self.config.request_timeout());

        let listener = TcpListener::bind(&self.config.bind_addr)
            .await
            .map_err(|e| GatewayError::invalid_config(format!("Failed to bind: {e}")))?;

        info!(addr = %self.config.bind_addr, "Starting HTTP server");

        if self.config.graceful_shutdown {
            axum::serve(listener, app)
                .with_graceful_shutdown(shutdown_signal())
                .await
                .map_err(|e| GatewayError::invalid_config(format!("Server error: {e}")))?;
        } else {
            axum::serve(listener, app)
                .await
                .map_err(|e| GatewayError::invalid_config(format!("Server error: {e}")))?;
        }

        if let Some(ticker) = epoch_ticker {
            ticker.abort();
        }

        info!("Server shutdown complete");
        Ok(())
    }

    /// Spawn the epoch ticker when epoch interruption is enabled.
    fn spawn_epoch_ticker(&self) -> Option<tokio::task::JoinHandle<()>> {
        if !self.state.engine().config().epoch_interruption {
            return None;
        }

        let engine = self.state.engine().clone();
        Some(tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_millis(1));
            loop {
                interval.tick().await;
                engine.increment_epoch();
            }
        }))
    }
}

/// Wait for shutdown signal (SIGTERM or SIGINT).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!("Shutdown signal received");
}
