//! HTTP server bootstrap.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use crate::router::build_router;
use crate::state::AppState;

/// Errors that can occur while starting the server.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// The listen address could not be bound.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        /// The requested address.
        addr: String,
        /// The underlying I/O error.
        source: std::io::Error,
    },
}

/// Bind the listener and spawn the server task.
///
/// Returns the bound address (useful when binding port 0 in tests) and
/// the serve task handle.
///
/// # Errors
///
/// Returns [`ServerError::Bind`] if the address cannot be bound.
pub async fn spawn_server(
    addr: &str,
    state: Arc<AppState>,
    allowed_origins: &[String],
) -> Result<(SocketAddr, JoinHandle<()>), ServerError> {
    let listener = TcpListener::bind(addr).await.map_err(|source| ServerError::Bind {
        addr: addr.to_owned(),
        source,
    })?;
    let local_addr = listener.local_addr().map_err(|source| ServerError::Bind {
        addr: addr.to_owned(),
        source,
    })?;

    let router = build_router(state, allowed_origins);
    let handle = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, router).await {
            tracing::error!(error = %e, "API server exited");
        }
    });

    tracing::info!(%local_addr, "API server listening");
    Ok((local_addr, handle))
}
