// ============================================================================
// API Gateway binary
// ============================================================================

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use storefront::config::GatewayConfig;
use storefront::gateway::{create_router, GatewayContext};

#[tokio::main]
async fn main() -> Result<()> {
    let config = GatewayConfig::from_env();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.rust_log.clone()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("=== API Gateway Starting ===");
    info!("Port: {}", config.port);
    info!("Users service: {}", config.users_service_url);
    info!("Orders service: {}", config.orders_service_url);

    let context = Arc::new(GatewayContext::new(&config));
    let app = create_router(context);

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port)
        .parse()
        .context("Failed to parse bind address")?;

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .context("Failed to bind to address")?;

    info!("API Gateway listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(storefront::shutdown_signal())
        .await
        .context("Failed to start server")?;

    Ok(())
}
