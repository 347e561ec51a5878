// ============================================================================
// Users Service Handlers
// ============================================================================
//
// Endpoints:
// - POST   /users/register - create a user with a hashed password
// - POST   /users/login    - verify credentials, return the user record
// - GET    /users          - list all users
// - GET    /users/:id      - fetch one user
// - PUT    /users/:id      - merge-update a user
// - DELETE /users/:id      - remove a user
// - GET    /users/health   - health probe
// - GET    /users/status   - status banner
//
// ============================================================================

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use bcrypt::{hash, verify, DEFAULT_COST};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

use crate::error::AppError;
use crate::users::{User, UsersContext};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    pub email: Option<String>,
    pub name: Option<String>,
    pub password: Option<String>,
}

/// POST /users/register
pub async fn register(
    State(ctx): State<Arc<UsersContext>>,
    Json(request): Json<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    // 1. All three fields are required and non-empty
    let (email, password, name) = match (request.email, request.password, request.name) {
        (Some(email), Some(password), Some(name))
            if !email.is_empty() && !password.is_empty() && !name.is_empty() =>
        {
            (email, password, name)
        }
        _ => {
            return Err(AppError::validation(
                "Email, password and name are required",
            ))
        }
    };

    // 2. Emails are unique across the store
    if ctx.store.find(|user| user.email == email).await.is_some() {
        return Err(AppError::conflict("Email already registered"));
    }

    // 3. Store the record; only the hash survives, never the password
    let password_hash = hash(&password, DEFAULT_COST)?;
    let user = ctx
        .store
        .create(|id| User {
            id,
            email,
            name,
            password_hash,
        })
        .await;

    tracing::info!(user_id = user.id, "User registered");
    Ok((StatusCode::CREATED, Json(user)))
}

/// POST /users/login
pub async fn login(
    State(ctx): State<Arc<UsersContext>>,
    Json(request): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    // Unknown email and wrong password reject identically
    let user = match ctx.store.find(|user| user.email == request.email).await {
        Some(user) => user,
        None => return Err(AppError::auth("Invalid credentials")),
    };

    if !verify(&request.password, &user.password_hash)? {
        return Err(AppError::auth("Invalid credentials"));
    }

    tracing::debug!(user_id = user.id, "Credentials verified");
    Ok((StatusCode::OK, Json(user)))
}

/// GET /users
pub async fn list_users(State(ctx): State<Arc<UsersContext>>) -> impl IntoResponse {
    let users = ctx.store.list().await;
    (StatusCode::OK, Json(users))
}

/// GET /users/:id
pub async fn get_user(
    State(ctx): State<Arc<UsersContext>>,
    Path(id): Path<u64>,
) -> Result<impl IntoResponse, AppError> {
    let user = ctx
        .store
        .get(id)
        .await
        .ok_or_else(|| AppError::not_found("User not found"))?;

    Ok((StatusCode::OK, Json(user)))
}

/// PUT /users/:id
///
/// Merge-update: only the supplied fields change, and a new password is
/// hashed before it replaces the old one.
pub async fn update_user(
    State(ctx): State<Arc<UsersContext>>,
    Path(id): Path<u64>,
    Json(request): Json<UpdateUserRequest>,
) -> Result<impl IntoResponse, AppError> {
    let password_hash = match request.password {
        Some(ref password) => Some(hash(password, DEFAULT_COST)?),
        None => None,
    };

    let updated = ctx
        .store
        .update(id, |user| {
            if let Some(email) = request.email {
                user.email = email;
            }
            if let Some(name) = request.name {
                user.name = name;
            }
            if let Some(new_hash) = password_hash {
                user.password_hash = new_hash;
            }
        })
        .await
        .ok_or_else(|| AppError::not_found("User not found"))?;

    tracing::info!(user_id = id, "User updated");
    Ok((StatusCode::OK, Json(updated)))
}

/// DELETE /users/:id
pub async fn delete_user(
    State(ctx): State<Arc<UsersContext>>,
    Path(id): Path<u64>,
) -> Result<impl IntoResponse, AppError> {
    let deleted = ctx
        .store
        .delete(id)
        .await
        .ok_or_else(|| AppError::not_found("User not found"))?;

    tracing::info!(user_id = id, "User deleted");
    Ok((
        StatusCode::OK,
        Json(json!({ "message": "User deleted", "deletedUser": deleted })),
    ))
}

/// GET /users/health
pub async fn health() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(json!({
            "status": "OK",
            "service": "Users Service",
            "timestamp": Utc::now().to_rfc3339(),
        })),
    )
}

/// GET /users/status
pub async fn status() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(json!({ "status": "Users service is running" })),
    )
}
