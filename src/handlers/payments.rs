use axum::{body::Bytes, extract::State, http::HeaderMap, Json};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};

use crate::auth::extractor::AuthUser;
use crate::entities::{payment_transactions, prelude::*, subscription_plans, user_subscriptions};
use crate::error::ApiError;
use crate::models::billing::{
    CheckoutResponse, PlanResponse, SubscribeRequest, SubscriptionResponse, WebhookEvent,
};
use crate::services::{audit, webhook};
use crate::AppState;

pub async fn list_plans(
    State(state): State<AppState>,
) -> Result<Json<Vec<PlanResponse>>, ApiError> {
    let plans = SubscriptionPlans::find()
        .filter(subscription_plans::Column::Active.eq(true))
        .order_by_asc(subscription_plans::Column::PriceCents)
        .all(&state.db)
        .await?;

    Ok(Json(plans.into_iter().map(Into::into).collect()))
}

pub async fn subscribe(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<SubscribeRequest>,
) -> Result<Json<CheckoutResponse>, ApiError> {
    let plan = SubscriptionPlans::find_by_id(payload.plan_id)
        .filter(subscription_plans::Column::Active.eq(true))
        .one(&state.db)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("plan {} not found", payload.plan_id)))?;

    let session = state
        .payments
        .create_checkout_session(user.user_id, &plan.external_id)
        .await?;

    // Record the pending payment; the webhook flips it to a final state
    let pending = payment_transactions::ActiveModel {
        user_id: Set(Some(user.user_id)),
        external_id: Set(session.id.clone()),
        amount_cents: Set(plan.price_cents),
        currency: Set(plan.currency.clone()),
        status: Set("pending".to_string()),
        ..Default::default()
    };
    pending.insert(&state.db).await?;

    audit::record(
        &state.db,
        Some(user.user_id),
        "payment.checkout_started",
        "payment",
        Some(session.id.clone()),
        Some(serde_json::json!({ "plan": plan.external_id })),
    )
    .await;

    Ok(Json(CheckoutResponse {
        checkout_url: session.url,
        payment_id: session.id,
    }))
}

pub async fn my_subscription(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<Option<SubscriptionResponse>>, ApiError> {
    let subscription = UserSubscriptions::find()
        .filter(user_subscriptions::Column::UserId.eq(user.user_id))
        .order_by_desc(user_subscriptions::Column::UpdatedAt)
        .one(&state.db)
        .await?;

    Ok(Json(subscription.map(Into::into)))
}

/// Payment gateway webhook. The signature covers the raw body, so the body
/// is taken as bytes and parsed only after verification.
pub async fn payment_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<serde_json::Value>, ApiError> {
    let signature = headers
        .get("x-webhook-signature")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::Auth("missing webhook signature".to_string()))?;

    if !webhook::verify_signature(&state.config.webhook_secret, &body, signature) {
        return Err(ApiError::Auth("invalid webhook signature".to_string()));
    }

    let event: WebhookEvent = serde_json::from_slice(&body)
        .map_err(|e| ApiError::Validation(format!("malformed webhook payload: {}", e)))?;

    tracing::info!("processing webhook event {} ({})", event.id, event.event_type);
    webhook::apply_event(&state.db, &event).await?;

    audit::record(
        &state.db,
        None,
        "webhook.processed",
        "payment_event",
        Some(event.id.clone()),
        Some(serde_json::json!({ "event_type": event.event_type })),
    )
    .await;

    Ok(Json(serde_json::json!({ "received": true })))
}
