// ============================================================================
// Gateway Routes
// ============================================================================
//
// The public surface of the gateway:
// - POST /users/register     - forward registration to the users service
// - POST /users/login        - forward credentials, issue an access token
// - GET  /users/me           - echo the verified token claims
// - GET  /users              - forward the user listing
// - GET  /users/:id          - forward a single user lookup
// - GET  /users/:id/details  - fan out to both services and join the result
// - GET  /orders             - forward the order listing
// - POST /orders             - inject the caller id, forward order creation
// - GET  /health             - gateway status plus per-backend circuit state
//
// Backend errors below 500 are relayed with their original status and body.
// Everything else (5xx, timeouts, unreachable backends, open circuits) comes
// back as a generic 500 via AppError.
//
// ============================================================================

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::error::AppError;
use crate::gateway::extractors::AuthenticatedUser;
use crate::gateway::service_client::Upstream;
use crate::gateway::GatewayContext;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrdersQuery {
    pub user_id: Option<u64>,
}

/// Relay a completed backend response as-is.
fn relay(upstream: Upstream) -> Response {
    (upstream.status, Json(upstream.body)).into_response()
}

/// POST /users/register
pub async fn register(
    State(ctx): State<Arc<GatewayContext>>,
    Json(payload): Json<Value>,
) -> Result<Response, AppError> {
    let upstream = ctx.users.post("/users/register", &payload).await?;
    Ok(relay(upstream))
}

/// POST /users/login
///
/// The users service checks the credentials; the gateway turns a confirmed
/// identity into a signed token. Any login outcome the backend reports that
/// does not name a user collapses into the same 401.
pub async fn login(
    State(ctx): State<Arc<GatewayContext>>,
    Json(payload): Json<Value>,
) -> Result<impl IntoResponse, AppError> {
    // 1. Let the users service verify the credentials
    let upstream = ctx.users.post("/users/login", &payload).await?;

    // 2. Only a successful response naming a user id counts
    let (id, email) = match (
        upstream.body.get("id").and_then(Value::as_u64),
        upstream.body.get("email").and_then(Value::as_str),
    ) {
        (Some(id), Some(email)) if upstream.status.is_success() => (id, email.to_string()),
        _ => return Err(AppError::auth("Invalid credentials")),
    };

    // 3. Issue the access token
    let token = ctx.auth.issue(id, &email)?;

    tracing::info!(user_id = id, "Login succeeded");
    Ok((StatusCode::OK, Json(json!({ "token": token }))))
}

/// GET /users/me
pub async fn me(user: AuthenticatedUser) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(json!({ "message": "Access granted", "user": user.0 })),
    )
}

/// GET /users
pub async fn list_users(
    State(ctx): State<Arc<GatewayContext>>,
    _user: AuthenticatedUser,
) -> Result<Response, AppError> {
    let upstream = ctx.users.get("/users").await?;
    Ok(relay(upstream))
}

/// GET /users/:id
pub async fn get_user(
    State(ctx): State<Arc<GatewayContext>>,
    _user: AuthenticatedUser,
    Path(id): Path<u64>,
) -> Result<Response, AppError> {
    let upstream = ctx.users.get(&format!("/users/{}", id)).await?;
    Ok(relay(upstream))
}

/// GET /users/:id/details
///
/// Fans out to both backends at once and joins the results: the user record
/// plus only the orders owned by that user. The user outcome is decided
/// first, so an unknown user reports 404 no matter how the orders fetch
/// went.
pub async fn user_details(
    State(ctx): State<Arc<GatewayContext>>,
    _user: AuthenticatedUser,
    Path(id): Path<u64>,
) -> Result<Response, AppError> {
    // The path has to outlive both futures in the join
    let user_path = format!("/users/{}", id);
    let (user_result, orders_result) =
        tokio::join!(ctx.users.get(&user_path), ctx.orders.get("/orders"));

    let user = user_result?;
    if !user.status.is_success() {
        return Ok(relay(user));
    }

    let orders = orders_result?;
    if !orders.status.is_success() {
        return Ok(relay(orders));
    }

    let owned: Vec<Value> = match orders.body {
        Value::Array(items) => items
            .into_iter()
            .filter(|order| order.get("userId").and_then(Value::as_u64) == Some(id))
            .collect(),
        _ => Vec::new(),
    };

    Ok((
        StatusCode::OK,
        Json(json!({ "user": user.body, "orders": owned })),
    )
        .into_response())
}

/// GET /orders
pub async fn list_orders(
    State(ctx): State<Arc<GatewayContext>>,
    _user: AuthenticatedUser,
    Query(query): Query<OrdersQuery>,
) -> Result<Response, AppError> {
    let upstream = match query.user_id {
        Some(user_id) => {
            ctx.orders
                .get_with_query("/orders", &[("userId", user_id.to_string())])
                .await?
        }
        None => ctx.orders.get("/orders").await?,
    };
    Ok(relay(upstream))
}

/// POST /orders
///
/// The owning user always comes from the verified token; a userId in the
/// request body is overwritten.
pub async fn create_order(
    State(ctx): State<Arc<GatewayContext>>,
    user: AuthenticatedUser,
    Json(payload): Json<Value>,
) -> Result<Response, AppError> {
    let payload = match payload {
        Value::Object(mut fields) => {
            fields.insert("userId".to_string(), json!(user.0.id));
            Value::Object(fields)
        }
        _ => json!({ "userId": user.0.id }),
    };

    let upstream = ctx.orders.post("/orders", &payload).await?;
    Ok(relay(upstream))
}

/// GET /health
///
/// Always 200 while the gateway itself is up; the body carries the circuit
/// state of each backend so degraded dependencies are visible here and only
/// here.
pub async fn health(State(ctx): State<Arc<GatewayContext>>) -> impl IntoResponse {
    let circuits = json!({
        "users": ctx.users.circuit_state().await.as_str(),
        "orders": ctx.orders.circuit_state().await.as_str(),
    });

    (
        StatusCode::OK,
        Json(json!({ "status": "API Gateway is running", "circuits": circuits })),
    )
}
