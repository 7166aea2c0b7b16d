use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, IntoActiveModel, QueryFilter, QueryOrder, Set,
};

use crate::auth::extractor::AuthUser;
use crate::entities::{prelude::*, tokens};
use crate::error::ApiError;
use crate::models::event::{EventKind, UserEvent};
use crate::models::token::{CreateTokenRequest, TokenResponse, UpdateTokenRequest};
use crate::services::audit;
use crate::AppState;

const DEFAULT_DECIMALS: i16 = 6;

pub async fn create_token(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateTokenRequest>,
) -> Result<(StatusCode, Json<TokenResponse>), ApiError> {
    let name = payload.name.trim().to_string();
    if name.is_empty() {
        return Err(ApiError::Validation("name is required".to_string()));
    }

    let symbol = payload.symbol.trim().to_uppercase();
    if symbol.is_empty() || symbol.chars().count() > 12 {
        return Err(ApiError::Validation(
            "symbol must be 1-12 characters".to_string(),
        ));
    }

    let decimals = payload.decimals.unwrap_or(DEFAULT_DECIMALS);
    if !(0..=18).contains(&decimals) {
        return Err(ApiError::Validation("decimals must be 0-18".to_string()));
    }

    let total_supply = payload.total_supply.unwrap_or(Decimal::ZERO);
    if total_supply < Decimal::ZERO {
        return Err(ApiError::Validation(
            "total_supply cannot be negative".to_string(),
        ));
    }

    let existing = Tokens::find()
        .filter(tokens::Column::OwnerId.eq(user.user_id))
        .filter(tokens::Column::Symbol.eq(&symbol))
        .one(&state.db)
        .await?;
    if existing.is_some() {
        return Err(ApiError::Conflict(format!(
            "token with symbol {} already exists",
            symbol
        )));
    }

    let new_token = tokens::ActiveModel {
        owner_id: Set(user.user_id),
        name: Set(name),
        symbol: Set(symbol),
        policy_id: Set(payload.policy_id),
        decimals: Set(decimals),
        total_supply: Set(total_supply),
        ..Default::default()
    };
    let token = new_token.insert(&state.db).await?;

    audit::record(
        &state.db,
        Some(user.user_id),
        "token.created",
        "token",
        Some(token.id.to_string()),
        Some(serde_json::json!({ "symbol": token.symbol })),
    )
    .await;

    state.broadcaster.broadcast(UserEvent::new(
        user.user_id,
        EventKind::TokenCreated,
        serde_json::json!({ "id": token.id, "symbol": token.symbol }),
    ));

    Ok((StatusCode::CREATED, Json(token.into())))
}

pub async fn list_tokens(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<Vec<TokenResponse>>, ApiError> {
    let tokens = Tokens::find()
        .filter(tokens::Column::OwnerId.eq(user.user_id))
        .order_by_desc(tokens::Column::CreatedAt)
        .all(&state.db)
        .await?;

    Ok(Json(tokens.into_iter().map(Into::into).collect()))
}

pub async fn get_token(
    State(state): State<AppState>,
    user: AuthUser,
    Path(token_id): Path<i32>,
) -> Result<Json<TokenResponse>, ApiError> {
    let token = find_owned(&state, &user, token_id).await?;
    Ok(Json(token.into()))
}

pub async fn update_token(
    State(state): State<AppState>,
    user: AuthUser,
    Path(token_id): Path<i32>,
    Json(payload): Json<UpdateTokenRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    let token = find_owned(&state, &user, token_id).await?;

    let mut active = token.into_active_model();
    if let Some(name) = payload.name {
        if name.trim().is_empty() {
            return Err(ApiError::Validation("name cannot be empty".to_string()));
        }
        active.name = Set(name.trim().to_string());
    }
    if let Some(policy_id) = payload.policy_id {
        active.policy_id = Set(Some(policy_id));
    }
    active.updated_at = Set(chrono::Utc::now().into());

    let updated = active.update(&state.db).await?;

    audit::record(
        &state.db,
        Some(user.user_id),
        "token.updated",
        "token",
        Some(token_id.to_string()),
        None,
    )
    .await;

    Ok(Json(updated.into()))
}

/// Token lookup with row-level authorization: non-owned rows are reported
/// as absent. Admins may read any token.
async fn find_owned(
    state: &AppState,
    user: &AuthUser,
    token_id: i32,
) -> Result<tokens::Model, ApiError> {
    let mut query = Tokens::find_by_id(token_id);
    if !user.is_admin() {
        query = query.filter(tokens::Column::OwnerId.eq(user.user_id));
    }
    query
        .one(&state.db)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("token {} not found", token_id)))
}
