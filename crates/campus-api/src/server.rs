//! Listener lifecycle.
//!
//! [`start_server`] binds the configured address, serves the campus router
//! and returns once the caller's shutdown future resolves and in-flight
//! requests have drained.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;

use crate::router::build_router;
use crate::state::AppState;

/// Where the API listens.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Interface to bind, e.g. `127.0.0.1` or `0.0.0.0` for all.
    pub host: String,
    /// Port to bind. `0` lets the OS choose.
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_owned(),
            port: 3000,
        }
    }
}

/// Failures that end the server.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// The listen address is malformed or already taken.
    #[error("cannot listen: {0}")]
    Bind(String),

    /// Accepting or serving connections failed.
    #[error("server failed: {0}")]
    Serve(String),
}

/// Serve the campus API on `config` until `shutdown` resolves.
///
/// # Errors
///
/// [`ServerError::Bind`] if the address cannot be parsed or bound,
/// [`ServerError::Serve`] if serving stops on an I/O error.
pub async fn start_server<F>(
    config: &ServerConfig,
    state: Arc<AppState>,
    shutdown: F,
) -> Result<(), ServerError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = format!("{}:{}", config.host, config.port)
        .parse::<SocketAddr>()
        .map_err(|e| ServerError::Bind(format!("{}:{}: {e}", config.host, config.port)))?;
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| ServerError::Bind(format!("{addr}: {e}")))?;
    let local = listener.local_addr().unwrap_or(addr);

    tracing::info!(addr = %local, "Campus API listening");
    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| ServerError::Serve(e.to_string()))?;
    tracing::info!(addr = %local, "Campus API stopped");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listen_on(host: &str, port: u16) -> ServerConfig {
        ServerConfig {
            host: host.to_owned(),
            port,
        }
    }

    #[tokio::test]
    async fn unparsable_host_is_a_bind_error() {
        let state = Arc::new(AppState::in_memory());
        let result = start_server(&listen_on("campus gateway", 3000), state, async {}).await;
        assert!(matches!(result, Err(ServerError::Bind(_))));
    }

    #[tokio::test]
    async fn returns_once_shutdown_resolves() {
        let state = Arc::new(AppState::in_memory());
        let result = start_server(&listen_on("127.0.0.1", 0), state, async {}).await;
        assert!(result.is_ok());
    }
}
