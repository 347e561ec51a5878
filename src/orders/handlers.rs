// ============================================================================
// Orders Service Handlers
// ============================================================================
//
// Endpoints:
// - GET    /orders         - list orders, optionally filtered by userId
// - POST   /orders         - create an order for a user
// - GET    /orders/:id     - fetch one order
// - PUT    /orders/:id     - replace an order's fields
// - DELETE /orders/:id     - remove an order
// - GET    /orders/health  - health probe
// - GET    /orders/status  - status banner
//
// ============================================================================

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::error::AppError;
use crate::orders::{Order, OrdersContext};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrdersQuery {
    pub user_id: Option<u64>,
}

/// Order payload for create and replace. Unknown fields collect into the
/// flattened map and are stored verbatim.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderPayload {
    pub user_id: Option<u64>,
    #[serde(flatten)]
    pub fields: serde_json::Map<String, Value>,
}

/// GET /orders
pub async fn list_orders(
    State(ctx): State<Arc<OrdersContext>>,
    Query(query): Query<OrdersQuery>,
) -> impl IntoResponse {
    let mut orders = ctx.store.list().await;
    if let Some(user_id) = query.user_id {
        orders.retain(|order| order.user_id == user_id);
    }

    (StatusCode::OK, Json(orders))
}

/// POST /orders
pub async fn create_order(
    State(ctx): State<Arc<OrdersContext>>,
    Json(payload): Json<OrderPayload>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = payload
        .user_id
        .ok_or_else(|| AppError::validation("userId is required"))?;

    let mut fields = payload.fields;
    // The store owns id assignment
    fields.remove("id");

    let order = ctx
        .store
        .create(|id| Order {
            id,
            user_id,
            fields,
        })
        .await;

    tracing::info!(order_id = order.id, user_id = user_id, "Order created");
    Ok((StatusCode::CREATED, Json(order)))
}

/// GET /orders/:id
pub async fn get_order(
    State(ctx): State<Arc<OrdersContext>>,
    Path(id): Path<u64>,
) -> Result<impl IntoResponse, AppError> {
    let order = ctx
        .store
        .get(id)
        .await
        .ok_or_else(|| AppError::not_found("Order not found"))?;

    Ok((StatusCode::OK, Json(order)))
}

/// PUT /orders/:id
///
/// Replaces the order's fields wholesale; the id stays, and a missing
/// userId keeps the current owner.
pub async fn update_order(
    State(ctx): State<Arc<OrdersContext>>,
    Path(id): Path<u64>,
    Json(payload): Json<OrderPayload>,
) -> Result<impl IntoResponse, AppError> {
    let mut fields = payload.fields;
    fields.remove("id");

    let updated = ctx
        .store
        .update(id, |order| {
            if let Some(user_id) = payload.user_id {
                order.user_id = user_id;
            }
            order.fields = fields;
        })
        .await
        .ok_or_else(|| AppError::not_found("Order not found"))?;

    tracing::info!(order_id = id, "Order updated");
    Ok((StatusCode::OK, Json(updated)))
}

/// DELETE /orders/:id
pub async fn delete_order(
    State(ctx): State<Arc<OrdersContext>>,
    Path(id): Path<u64>,
) -> Result<impl IntoResponse, AppError> {
    let deleted = ctx
        .store
        .delete(id)
        .await
        .ok_or_else(|| AppError::not_found("Order not found"))?;

    tracing::info!(order_id = id, "Order deleted");
    Ok((
        StatusCode::OK,
        Json(json!({ "message": "Order deleted", "deletedOrder": deleted })),
    ))
}

/// GET /orders/health
pub async fn health() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(json!({
            "status": "OK",
            "service": "Orders Service",
            "timestamp": Utc::now().to_rfc3339(),
        })),
    )
}

/// GET /orders/status
pub async fn status() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(json!({ "status": "Orders service is running" })),
    )
}
