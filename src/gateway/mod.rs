// ============================================================================
// API Gateway
// ============================================================================
//
// Single entry point for all client requests. It handles:
// - JWT verification on protected routes
// - Request forwarding to the users and orders services
// - Per-backend circuit breaking with static fallbacks
// - Concurrent fan-out for the user details aggregation
//
// The gateway holds no business data; backends stay reachable directly on
// their own ports, the gateway adds the auth and resilience layer.
//
// ============================================================================

pub mod circuit_breaker;
pub mod extractors;
pub mod routes;
pub mod service_client;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use serde_json::json;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::auth::AuthManager;
use crate::config::GatewayConfig;
use service_client::ServiceClient;

/// Shared state for all gateway routes.
pub struct GatewayContext {
    pub auth: AuthManager,
    pub users: ServiceClient,
    pub orders: ServiceClient,
}

impl GatewayContext {
    pub fn new(config: &GatewayConfig) -> Self {
        Self {
            auth: AuthManager::new(&config.jwt_secret, config.token_ttl_secs),
            users: ServiceClient::new(
                "users",
                config.users_service_url.clone(),
                json!({ "error": "Users service temporarily unavailable" }),
                config.breaker.clone(),
            ),
            orders: ServiceClient::new(
                "orders",
                config.orders_service_url.clone(),
                json!({ "error": "Orders service temporarily unavailable" }),
                config.breaker.clone(),
            ),
        }
    }
}

/// Create the gateway router with all routes and middleware.
pub fn create_router(context: Arc<GatewayContext>) -> Router {
    Router::new()
        // Public routes
        .route("/health", get(routes::health))
        .route("/users/register", post(routes::register))
        .route("/users/login", post(routes::login))
        // Protected routes
        .route("/users/me", get(routes::me))
        .route("/users", get(routes::list_users))
        .route("/users/:id", get(routes::get_user))
        .route("/users/:id/details", get(routes::user_details))
        .route("/orders", get(routes::list_orders).post(routes::create_order))
        // Middleware (order matters - last added runs first)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(middleware::from_fn(crate::middleware::request_logging))
                .layer(CorsLayer::permissive())
                .into_inner(),
        )
        .with_state(context)
}
