//! Payment webhook reconciler.
//!
//! Verifies the HMAC-SHA256 signature over the raw body, then idempotently
//! upserts local billing rows keyed by the gateway's own object ids.
//! Delivery is at-least-once: replaying a payload leaves the rows in the
//! same final state as processing it once.

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel, QueryFilter,
    Set,
};
use sha2::Sha256;

use crate::entities::{payment_transactions, subscription_plans, user_subscriptions};
use crate::error::ApiError;
use crate::models::billing::{PaymentEventData, PlanEventData, SubscriptionEventData, WebhookEvent};

type HmacSha256 = Hmac<Sha256>;

/// Check the `X-Webhook-Signature` header (hex HMAC-SHA256 of the raw
/// body) against the shared secret. Constant-time comparison via the MAC.
pub fn verify_signature(secret: &str, body: &[u8], signature_hex: &str) -> bool {
    let Ok(signature) = hex::decode(signature_hex) else {
        return false;
    };
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .expect("HMAC accepts keys of any length");
    mac.update(body);
    mac.verify_slice(&signature).is_ok()
}

/// Hex HMAC signature of a payload. Used by tests and by anything that
/// needs to re-sign a payload for the gateway.
pub fn sign(secret: &str, body: &[u8]) -> String {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .expect("HMAC accepts keys of any length");
    mac.update(body);
    hex::encode(mac.finalize().into_bytes())
}

/// Apply one gateway event. Unknown event types are acknowledged and
/// logged; the gateway stops retrying either way.
pub async fn apply_event(db: &DatabaseConnection, event: &WebhookEvent) -> Result<(), ApiError> {
    match event.event_type.as_str() {
        "payment.succeeded" => upsert_payment(db, &event.data, "succeeded").await,
        "payment.failed" => upsert_payment(db, &event.data, "failed").await,
        "payment.refunded" => upsert_payment(db, &event.data, "refunded").await,
        "subscription.created" | "subscription.updated" => upsert_subscription(db, &event.data).await,
        "subscription.canceled" => cancel_subscription(db, &event.data).await,
        "plan.created" | "plan.updated" => upsert_plan(db, &event.data).await,
        other => {
            tracing::warn!("ignoring unknown webhook event type: {}", other);
            Ok(())
        }
    }
}

async fn upsert_payment(
    db: &DatabaseConnection,
    data: &serde_json::Value,
    status: &str,
) -> Result<(), ApiError> {
    let data: PaymentEventData = serde_json::from_value(data.clone())
        .map_err(|e| ApiError::Validation(format!("malformed payment event: {}", e)))?;

    let existing = payment_transactions::Entity::find()
        .filter(payment_transactions::Column::ExternalId.eq(&data.payment_id))
        .one(db)
        .await?;

    match existing {
        Some(payment) => {
            if payment.status == status {
                // Duplicate delivery, nothing to do
                return Ok(());
            }
            let mut active = payment.into_active_model();
            active.status = Set(status.to_string());
            active.updated_at = Set(Utc::now().into());
            active.update(db).await?;
        }
        None => {
            let new_payment = payment_transactions::ActiveModel {
                user_id: Set(data.user_id),
                external_id: Set(data.payment_id.clone()),
                amount_cents: Set(data.amount_cents),
                currency: Set(data.currency.clone()),
                status: Set(status.to_string()),
                ..Default::default()
            };
            new_payment.insert(db).await?;
        }
    }

    Ok(())
}

async fn upsert_subscription(
    db: &DatabaseConnection,
    data: &serde_json::Value,
) -> Result<(), ApiError> {
    let data: SubscriptionEventData = serde_json::from_value(data.clone())
        .map_err(|e| ApiError::Validation(format!("malformed subscription event: {}", e)))?;

    let plan_id = match &data.plan_external_id {
        Some(external_id) => subscription_plans::Entity::find()
            .filter(subscription_plans::Column::ExternalId.eq(external_id))
            .one(db)
            .await?
            .map(|p| p.id),
        None => None,
    };

    let period_end = data
        .current_period_end
        .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0));

    let existing = user_subscriptions::Entity::find()
        .filter(user_subscriptions::Column::ExternalId.eq(&data.subscription_id))
        .one(db)
        .await?;

    match existing {
        Some(sub) => {
            let mut active = sub.into_active_model();
            active.status = Set(data.status.clone());
            active.plan_id = Set(plan_id);
            active.current_period_end = Set(period_end.map(Into::into));
            active.updated_at = Set(Utc::now().into());
            active.update(db).await?;
        }
        None => {
            let new_sub = user_subscriptions::ActiveModel {
                user_id: Set(data.user_id),
                plan_id: Set(plan_id),
                external_id: Set(data.subscription_id.clone()),
                status: Set(data.status.clone()),
                current_period_end: Set(period_end.map(Into::into)),
                ..Default::default()
            };
            new_sub.insert(db).await?;
        }
    }

    Ok(())
}

async fn cancel_subscription(
    db: &DatabaseConnection,
    data: &serde_json::Value,
) -> Result<(), ApiError> {
    let data: SubscriptionEventData = serde_json::from_value(data.clone())
        .map_err(|e| ApiError::Validation(format!("malformed subscription event: {}", e)))?;

    let existing = user_subscriptions::Entity::find()
        .filter(user_subscriptions::Column::ExternalId.eq(&data.subscription_id))
        .one(db)
        .await?;

    if let Some(sub) = existing {
        if sub.status != "canceled" {
            let mut active = sub.into_active_model();
            active.status = Set("canceled".to_string());
            active.updated_at = Set(Utc::now().into());
            active.update(db).await?;
        }
    } else {
        // Cancellation for a subscription we never saw; record it anyway
        let new_sub = user_subscriptions::ActiveModel {
            user_id: Set(data.user_id),
            external_id: Set(data.subscription_id.clone()),
            status: Set("canceled".to_string()),
            ..Default::default()
        };
        new_sub.insert(db).await?;
    }

    Ok(())
}

async fn upsert_plan(db: &DatabaseConnection, data: &serde_json::Value) -> Result<(), ApiError> {
    let data: PlanEventData = serde_json::from_value(data.clone())
        .map_err(|e| ApiError::Validation(format!("malformed plan event: {}", e)))?;

    let existing = subscription_plans::Entity::find()
        .filter(subscription_plans::Column::ExternalId.eq(&data.plan_id))
        .one(db)
        .await?;

    match existing {
        Some(plan) => {
            let mut active = plan.into_active_model();
            active.name = Set(data.name.clone());
            active.price_cents = Set(data.price_cents);
            active.currency = Set(data.currency.clone());
            active.interval = Set(data.interval.clone());
            active.active = Set(data.active);
            active.update(db).await?;
        }
        None => {
            let new_plan = subscription_plans::ActiveModel {
                external_id: Set(data.plan_id.clone()),
                name: Set(data.name.clone()),
                price_cents: Set(data.price_cents),
                currency: Set(data.currency.clone()),
                interval: Set(data.interval.clone()),
                active: Set(data.active),
                ..Default::default()
            };
            new_plan.insert(db).await?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signature_roundtrip() {
        let body = br#"{"id":"evt_1","event_type":"payment.succeeded","data":{}}"#;
        let sig = sign("whsec_test", body);
        assert!(verify_signature("whsec_test", body, &sig));
    }

    #[test]
    fn tampered_body_fails_verification() {
        let body = br#"{"id":"evt_1"}"#;
        let sig = sign("whsec_test", body);
        assert!(!verify_signature("whsec_test", br#"{"id":"evt_2"}"#, &sig));
    }

    #[test]
    fn wrong_secret_fails_verification() {
        let body = b"payload";
        let sig = sign("whsec_test", body);
        assert!(!verify_signature("whsec_other", body, &sig));
    }

    #[test]
    fn non_hex_signature_fails_verification() {
        assert!(!verify_signature("whsec_test", b"payload", "not hex at all"));
    }
}
