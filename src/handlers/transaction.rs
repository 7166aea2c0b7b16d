use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder};

use crate::auth::extractor::AuthUser;
use crate::entities::{prelude::*, transactions};
use crate::error::ApiError;
use crate::models::transaction::{
    CreateTransactionRequest, TransactionResponse, UpdateTransactionStatusRequest,
};
use crate::services::recorder;
use crate::AppState;

pub async fn create_transaction(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateTransactionRequest>,
) -> Result<(StatusCode, Json<TransactionResponse>), ApiError> {
    let tx = recorder::create_transaction(
        &state.db,
        &state.broadcaster,
        user.user_id,
        payload.token_id,
        payload.tx_type,
        payload.amount,
        payload.origin_hash,
        payload.metadata,
    )
    .await?;

    Ok((StatusCode::CREATED, Json(tx.into())))
}

pub async fn list_transactions(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<Vec<TransactionResponse>>, ApiError> {
    let txs = Transactions::find()
        .filter(transactions::Column::UserId.eq(user.user_id))
        .order_by_desc(transactions::Column::CreatedAt)
        .all(&state.db)
        .await?;

    Ok(Json(txs.into_iter().map(Into::into).collect()))
}

pub async fn get_transaction(
    State(state): State<AppState>,
    user: AuthUser,
    Path(transaction_id): Path<i32>,
) -> Result<Json<TransactionResponse>, ApiError> {
    let tx = Transactions::find_by_id(transaction_id)
        .filter(transactions::Column::UserId.eq(user.user_id))
        .one(&state.db)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("transaction {} not found", transaction_id)))?;

    Ok(Json(tx.into()))
}

pub async fn update_transaction_status(
    State(state): State<AppState>,
    user: AuthUser,
    Path(transaction_id): Path<i32>,
    Json(payload): Json<UpdateTransactionStatusRequest>,
) -> Result<Json<TransactionResponse>, ApiError> {
    let tx = recorder::update_status(
        &state.db,
        &state.broadcaster,
        user.user_id,
        transaction_id,
        payload.status,
    )
    .await?;

    Ok(Json(tx.into()))
}
