//! Admin reporting and user management. Every route requires the admin
//! role via the `AdminUser` extractor.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, IntoActiveModel, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};
use serde::Deserialize;

use crate::auth::extractor::AdminUser;
use crate::entities::{audit_logs, prelude::*, users};
use crate::error::ApiError;
use crate::models::user::UserResponse;
use crate::services::audit;
use crate::AppState;

const DEFAULT_PAGE_SIZE: u64 = 50;
const MAX_PAGE_SIZE: u64 = 200;

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    #[serde(default)]
    pub page: u64,
    pub per_page: Option<u64>,
}

impl PageQuery {
    fn per_page(&self) -> u64 {
        self.per_page.unwrap_or(DEFAULT_PAGE_SIZE).min(MAX_PAGE_SIZE)
    }
}

pub async fn stats(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> Result<Json<serde_json::Value>, ApiError> {
    let users = Users::find().count(&state.db).await?;
    let suspended_users = Users::find()
        .filter(users::Column::Suspended.eq(true))
        .count(&state.db)
        .await?;
    let tokens = Tokens::find().count(&state.db).await?;
    let transactions = Transactions::find().count(&state.db).await?;
    let sponsorships = GaslessSponsorships::find().count(&state.db).await?;
    let payments = PaymentTransactions::find().count(&state.db).await?;

    Ok(Json(serde_json::json!({
        "users": users,
        "suspended_users": suspended_users,
        "tokens": tokens,
        "transactions": transactions,
        "sponsorships": sponsorships,
        "payments": payments,
    })))
}

pub async fn list_users(
    State(state): State<AppState>,
    _admin: AdminUser,
    Query(page): Query<PageQuery>,
) -> Result<Json<Vec<UserResponse>>, ApiError> {
    let users = Users::find()
        .order_by_asc(users::Column::Id)
        .paginate(&state.db, page.per_page())
        .fetch_page(page.page)
        .await?;

    Ok(Json(users.into_iter().map(Into::into).collect()))
}

pub async fn suspend_user(
    State(state): State<AppState>,
    admin: AdminUser,
    Path(user_id): Path<i32>,
) -> Result<Json<UserResponse>, ApiError> {
    set_suspended(&state, &admin, user_id, true).await
}

pub async fn unsuspend_user(
    State(state): State<AppState>,
    admin: AdminUser,
    Path(user_id): Path<i32>,
) -> Result<Json<UserResponse>, ApiError> {
    set_suspended(&state, &admin, user_id, false).await
}

async fn set_suspended(
    state: &AppState,
    admin: &AdminUser,
    user_id: i32,
    suspended: bool,
) -> Result<Json<UserResponse>, ApiError> {
    let user = Users::find_by_id(user_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("user {} not found", user_id)))?;

    let mut active = user.into_active_model();
    active.suspended = Set(suspended);
    active.updated_at = Set(chrono::Utc::now().into());
    let updated = active.update(&state.db).await?;

    audit::record(
        &state.db,
        Some(admin.0.user_id),
        if suspended { "user.suspended" } else { "user.unsuspended" },
        "user",
        Some(user_id.to_string()),
        None,
    )
    .await;

    Ok(Json(updated.into()))
}

pub async fn list_audit(
    State(state): State<AppState>,
    _admin: AdminUser,
    Query(page): Query<PageQuery>,
) -> Result<Json<Vec<audit_logs::Model>>, ApiError> {
    let entries = AuditLogs::find()
        .order_by_desc(audit_logs::Column::CreatedAt)
        .paginate(&state.db, page.per_page())
        .fetch_page(page.page)
        .await?;

    Ok(Json(entries))
}
