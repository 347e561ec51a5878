// ============================================================================
// Orders Service binary
// ============================================================================

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use storefront::config::ServiceConfig;
use storefront::orders::{create_router, OrdersContext};

#[tokio::main]
async fn main() -> Result<()> {
    let config = ServiceConfig::orders_from_env();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.rust_log.clone()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("=== Orders Service Starting ===");
    info!("Port: {}", config.port);

    let context = Arc::new(OrdersContext::new());
    let app = create_router(context);

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port)
        .parse()
        .context("Failed to parse bind address")?;

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .context("Failed to bind to address")?;

    info!("Orders service listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(storefront::shutdown_signal())
        .await
        .context("Failed to start server")?;

    Ok(())
}
