use tokio::signal;

pub mod auth;
pub mod config;
pub mod error;
pub mod gateway;
pub mod middleware;
pub mod orders;
pub mod store;
pub mod users;

/// Resolves when the process receives Ctrl+C or SIGTERM.
///
/// Passed to `axum::serve(..).with_graceful_shutdown(..)` by all three
/// service binaries so in-flight requests drain before exit.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
