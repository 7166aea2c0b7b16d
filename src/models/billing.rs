//! Billing mirror types and payment-gateway webhook payloads.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize)]
pub struct PlanResponse {
    pub id: i32,
    pub external_id: String,
    pub name: String,
    pub price_cents: i32,
    pub currency: String,
    pub interval: String,
}

impl From<crate::entities::subscription_plans::Model> for PlanResponse {
    fn from(model: crate::entities::subscription_plans::Model) -> Self {
        Self {
            id: model.id,
            external_id: model.external_id,
            name: model.name,
            price_cents: model.price_cents,
            currency: model.currency,
            interval: model.interval,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SubscribeRequest {
    pub plan_id: i32,
}

#[derive(Debug, Clone, Serialize)]
pub struct CheckoutResponse {
    pub checkout_url: String,
    pub payment_id: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SubscriptionResponse {
    pub id: i32,
    pub plan_id: Option<i32>,
    pub external_id: String,
    pub status: String,
    pub current_period_end: Option<String>,
}

impl From<crate::entities::user_subscriptions::Model> for SubscriptionResponse {
    fn from(model: crate::entities::user_subscriptions::Model) -> Self {
        Self {
            id: model.id,
            plan_id: model.plan_id,
            external_id: model.external_id,
            status: model.status,
            current_period_end: model.current_period_end.map(|t| t.to_rfc3339()),
        }
    }
}

/// Event envelope delivered by the payment gateway. Delivery is
/// at-least-once; `id` is the gateway's own event id and `data` carries the
/// object the event is about, keyed by the gateway object id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookEvent {
    pub id: String,
    pub event_type: String,
    pub data: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentEventData {
    pub payment_id: String,
    pub amount_cents: i32,
    #[serde(default = "default_currency")]
    pub currency: String,
    /// Our user id, echoed back from checkout session metadata
    pub user_id: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscriptionEventData {
    pub subscription_id: String,
    pub plan_external_id: Option<String>,
    pub user_id: i32,
    pub status: String,
    /// Unix seconds
    pub current_period_end: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanEventData {
    pub plan_id: String,
    pub name: String,
    pub price_cents: i32,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default = "default_interval")]
    pub interval: String,
    #[serde(default = "default_true")]
    pub active: bool,
}

fn default_currency() -> String {
    "usd".to_string()
}

fn default_interval() -> String {
    "month".to_string()
}

fn default_true() -> bool {
    true
}
