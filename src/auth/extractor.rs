//! Axum extractors for authenticated callers.
//!
//! `AuthUser` validates the `Authorization: Bearer <jwt>` header and loads
//! the caller's claims. `AdminUser` additionally requires the admin role.
//! Auth failures short-circuit before any business logic runs.

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};

use super::jwt;
use crate::error::ApiError;
use crate::AppState;

#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: i32,
    pub role: String,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role == "admin"
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(AUTHORIZATION)
            .ok_or_else(|| ApiError::Auth("Authorization header is required".to_string()))?
            .to_str()
            .map_err(|_| ApiError::Auth("invalid Authorization header".to_string()))?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or_else(|| ApiError::Auth("expected 'Bearer <token>'".to_string()))?;

        claims_to_user(state, token)
    }
}

/// Caller with the admin role; everyone else gets 403.
#[derive(Debug, Clone)]
pub struct AdminUser(pub AuthUser);

impl FromRequestParts<AppState> for AdminUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        if !user.is_admin() {
            return Err(ApiError::Forbidden("admin role required".to_string()));
        }
        Ok(AdminUser(user))
    }
}

/// Token verification shared with the WebSocket handler, which carries the
/// JWT in a query parameter instead of a header.
pub fn claims_to_user(state: &AppState, token: &str) -> Result<AuthUser, ApiError> {
    let claims = jwt::verify(&state.config.jwt_secret, token)
        .map_err(|e| ApiError::Auth(format!("invalid token: {}", e)))?;
    Ok(AuthUser {
        user_id: claims.sub,
        role: claims.role,
    })
}
