// ============================================================================
// Orders Service
// ============================================================================
//
// Backend service owning the order records. Every order belongs to a user
// by id; any extra fields supplied at creation ride along untouched. CRUD
// plus health and status probes.
//
// ============================================================================

pub mod handlers;

use axum::{middleware, routing::get, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::store::MemoryStore;

/// A stored order record.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: u64,
    pub user_id: u64,
    #[serde(flatten)]
    pub fields: serde_json::Map<String, serde_json::Value>,
}

/// Orders service state.
pub struct OrdersContext {
    pub store: MemoryStore<Order>,
}

impl OrdersContext {
    pub fn new() -> Self {
        Self {
            store: MemoryStore::new(),
        }
    }
}

impl Default for OrdersContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Create the orders service router.
pub fn create_router(context: Arc<OrdersContext>) -> Router {
    Router::new()
        .route("/orders/health", get(handlers::health))
        .route("/orders/status", get(handlers::status))
        .route(
            "/orders",
            get(handlers::list_orders).post(handlers::create_order),
        )
        .route(
            "/orders/:id",
            get(handlers::get_order)
                .put(handlers::update_order)
                .delete(handlers::delete_order),
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
