use axum::{extract::State, http::StatusCode, Json};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, IntoActiveModel, QueryFilter, Set,
};

use crate::auth::extractor::AuthUser;
use crate::auth::{jwt, password};
use crate::entities::{prelude::*, users};
use crate::error::ApiError;
use crate::models::user::{
    AuthResponse, LoginRequest, SignupRequest, UpdateProfileRequest, UserResponse,
};
use crate::services::audit;
use crate::AppState;

pub async fn signup(
    State(state): State<AppState>,
    Json(payload): Json<SignupRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), ApiError> {
    let email = payload.email.trim().to_lowercase();
    if email.is_empty() || !email.contains('@') {
        return Err(ApiError::Validation("a valid email is required".to_string()));
    }
    if payload.password.len() < 8 {
        return Err(ApiError::Validation(
            "password must be at least 8 characters".to_string(),
        ));
    }
    if payload.display_name.trim().is_empty() {
        return Err(ApiError::Validation("display_name is required".to_string()));
    }

    let existing = Users::find()
        .filter(users::Column::Email.eq(&email))
        .one(&state.db)
        .await?;
    if existing.is_some() {
        return Err(ApiError::Conflict("email is already registered".to_string()));
    }

    let salt = password::generate_salt();
    let hash = password::hash(&state.config.jwt_secret, &salt, &payload.password);

    let new_user = users::ActiveModel {
        email: Set(email),
        password_salt: Set(salt),
        password_hash: Set(hash),
        display_name: Set(payload.display_name.trim().to_string()),
        role: Set("user".to_string()),
        suspended: Set(false),
        ..Default::default()
    };
    let user = new_user.insert(&state.db).await?;

    audit::record(
        &state.db,
        Some(user.id),
        "user.signup",
        "user",
        Some(user.id.to_string()),
        None,
    )
    .await;

    let token = jwt::issue(&state.config.jwt_secret, user.id, &user.role)
        .map_err(|e| ApiError::Internal(format!("failed to issue token: {}", e)))?;

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            token,
            user: user.into(),
        }),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let email = payload.email.trim().to_lowercase();

    let user = Users::find()
        .filter(users::Column::Email.eq(&email))
        .one(&state.db)
        .await?
        .ok_or_else(|| ApiError::Auth("invalid credentials".to_string()))?;

    if !password::verify(
        &state.config.jwt_secret,
        &user.password_salt,
        &payload.password,
        &user.password_hash,
    ) {
        return Err(ApiError::Auth("invalid credentials".to_string()));
    }

    if user.suspended {
        return Err(ApiError::Forbidden("account is suspended".to_string()));
    }

    audit::record(
        &state.db,
        Some(user.id),
        "user.login",
        "user",
        Some(user.id.to_string()),
        None,
    )
    .await;

    let token = jwt::issue(&state.config.jwt_secret, user.id, &user.role)
        .map_err(|e| ApiError::Internal(format!("failed to issue token: {}", e)))?;

    Ok(Json(AuthResponse {
        token,
        user: user.into(),
    }))
}

pub async fn me(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<UserResponse>, ApiError> {
    let user = Users::find_by_id(user.user_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| ApiError::NotFound("user not found".to_string()))?;

    Ok(Json(user.into()))
}

pub async fn update_me(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<UpdateProfileRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    let existing = Users::find_by_id(user.user_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| ApiError::NotFound("user not found".to_string()))?;

    let mut active = existing.into_active_model();
    if let Some(display_name) = payload.display_name {
        if display_name.trim().is_empty() {
            return Err(ApiError::Validation("display_name cannot be empty".to_string()));
        }
        active.display_name = Set(display_name.trim().to_string());
    }
    if let Some(wallet_address) = payload.wallet_address {
        active.wallet_address = Set(Some(wallet_address));
    }
    active.updated_at = Set(chrono::Utc::now().into());

    let updated = active.update(&state.db).await?;

    audit::record(
        &state.db,
        Some(user.user_id),
        "user.profile_updated",
        "user",
        Some(user.user_id.to_string()),
        None,
    )
    .await;

    Ok(Json(updated.into()))
}
