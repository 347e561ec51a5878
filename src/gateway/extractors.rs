use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
    response::{IntoResponse, Response},
};
use std::sync::Arc;

use crate::auth::Claims;
use crate::error::AppError;
use crate::gateway::GatewayContext;

/// Verified caller identity, extracted from the `Authorization` header.
///
/// A missing header is reported as "No token provided"; a present but
/// unusable token as "Invalid or expired token". Both reject with 401.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub Claims);

#[async_trait]
impl FromRequestParts<Arc<GatewayContext>> for AuthenticatedUser {
    type Rejection = Response;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<GatewayContext>,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = match parts.headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok()) {
            Some(value) => value,
            None => return Err(AppError::auth("No token provided").into_response()),
        };

        let token = match auth_header.strip_prefix("Bearer ") {
            Some(token) => token,
            None => return Err(AppError::auth("Invalid or expired token").into_response()),
        };

        let claims = state.auth.verify(token).map_err(|e| {
            tracing::warn!(error = %e, "Token verification failed");
            AppError::Jwt(e).into_response()
        })?;

        Ok(AuthenticatedUser(claims))
    }
}
