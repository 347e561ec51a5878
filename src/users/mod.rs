// ============================================================================
// Users Service
// ============================================================================
//
// Backend service owning the user records. Registration hashes passwords
// and enforces unique emails; login verifies credentials against the stored
// hash. Plain CRUD plus health and status probes round out the surface.
//
// ============================================================================

pub mod handlers;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use serde::Serialize;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::store::MemoryStore;

/// A stored user record. The password hash never appears in responses.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: u64,
    pub email: String,
    pub name: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
}

/// Users service state.
pub struct UsersContext {
    pub store: MemoryStore<User>,
}

impl UsersContext {
    pub fn new() -> Self {
        Self {
            store: MemoryStore::new(),
        }
    }
}

impl Default for UsersContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Create the users service router.
pub fn create_router(context: Arc<UsersContext>) -> Router {
    Router::new()
        .route("/users/register", post(handlers::register))
        .route("/users/login", post(handlers::login))
        .route("/users/health", get(handlers::health))
        .route("/users/status", get(handlers::status))
        .route("/users", get(handlers::list_users))
        .route(
            "/users/:id",
            get(handlers::get_user)
                .put(handlers::update_user)
                .delete(handlers::delete_user),
        )
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(middleware::from_fn(crate::middleware::request_logging))
                .layer(CorsLayer::permissive())
                .into_inner(),
        )
        .with_state(context)
}
