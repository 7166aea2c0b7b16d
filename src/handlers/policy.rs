use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, IntoActiveModel, ModelTrait, QueryFilter,
    QueryOrder, Set,
};

use crate::auth::extractor::AuthUser;
use crate::entities::{prelude::*, security_policies};
use crate::error::ApiError;
use crate::models::policy::{CreatePolicyRequest, PolicyResponse, UpdatePolicyRequest};
use crate::services::audit;
use crate::AppState;

pub async fn create_policy(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreatePolicyRequest>,
) -> Result<(StatusCode, Json<PolicyResponse>), ApiError> {
    let policy_type = payload.config.policy_type();
    let config = serde_json::to_value(&payload.config)
        .map_err(|e| ApiError::Internal(format!("failed to serialize policy config: {}", e)))?;

    let new_policy = security_policies::ActiveModel {
        user_id: Set(user.user_id),
        policy_type: Set(policy_type.to_string()),
        config: Set(config),
        active: Set(true),
        ..Default::default()
    };
    let policy = new_policy.insert(&state.db).await?;

    audit::record(
        &state.db,
        Some(user.user_id),
        "policy.created",
        "security_policy",
        Some(policy.id.to_string()),
        Some(serde_json::json!({ "type": policy.policy_type })),
    )
    .await;

    Ok((StatusCode::CREATED, Json(policy.into())))
}

pub async fn list_policies(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<Vec<PolicyResponse>>, ApiError> {
    let policies = SecurityPolicies::find()
        .filter(security_policies::Column::UserId.eq(user.user_id))
        .order_by_desc(security_policies::Column::CreatedAt)
        .all(&state.db)
        .await?;

    Ok(Json(policies.into_iter().map(Into::into).collect()))
}

pub async fn update_policy(
    State(state): State<AppState>,
    user: AuthUser,
    Path(policy_id): Path<i32>,
    Json(payload): Json<UpdatePolicyRequest>,
) -> Result<Json<PolicyResponse>, ApiError> {
    let policy = find_owned(&state, &user, policy_id).await?;

    let mut active = policy.into_active_model();
    if let Some(is_active) = payload.active {
        active.active = Set(is_active);
    }
    if let Some(config) = payload.config {
        active.policy_type = Set(config.policy_type().to_string());
        active.config = Set(serde_json::to_value(&config)
            .map_err(|e| ApiError::Internal(format!("failed to serialize policy config: {}", e)))?);
    }
    active.updated_at = Set(chrono::Utc::now().into());

    let updated = active.update(&state.db).await?;

    audit::record(
        &state.db,
        Some(user.user_id),
        "policy.updated",
        "security_policy",
        Some(policy_id.to_string()),
        None,
    )
    .await;

    Ok(Json(updated.into()))
}

pub async fn delete_policy(
    State(state): State<AppState>,
    user: AuthUser,
    Path(policy_id): Path<i32>,
) -> Result<StatusCode, ApiError> {
    let policy = find_owned(&state, &user, policy_id).await?;
    policy.delete(&state.db).await?;

    audit::record(
        &state.db,
        Some(user.user_id),
        "policy.deleted",
        "security_policy",
        Some(policy_id.to_string()),
        None,
    )
    .await;

    Ok(StatusCode::NO_CONTENT)
}

async fn find_owned(
    state: &AppState,
    user: &AuthUser,
    policy_id: i32,
) -> Result<security_policies::Model, ApiError> {
    SecurityPolicies::find_by_id(policy_id)
        .filter(security_policies::Column::UserId.eq(user.user_id))
        .one(&state.db)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("policy {} not found", policy_id)))
}
