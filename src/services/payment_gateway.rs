//! Payment gateway HTTP client.
//!
//! Thin wrapper around the provider's checkout-session API. The provider
//! owns the billing lifecycle; we only start sessions here and mirror the
//! resulting state via webhooks.

use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

#[derive(Clone)]
pub struct PaymentGatewayClient {
    client: Client,
    api_key: String,
    base_url: String,
}

#[derive(Debug, Serialize)]
struct CheckoutSessionRequest<'a> {
    plan_id: &'a str,
    /// Echoed back to us in webhook payloads
    metadata: CheckoutMetadata,
}

#[derive(Debug, Serialize)]
struct CheckoutMetadata {
    user_id: i32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutSession {
    pub id: String,
    pub url: String,
}

impl PaymentGatewayClient {
    pub fn new(api_key: String, base_url: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
            base_url,
        }
    }

    pub async fn create_checkout_session(
        &self,
        user_id: i32,
        plan_external_id: &str,
    ) -> Result<CheckoutSession, ApiError> {
        tracing::info!(
            "creating checkout session for user {} on plan {}",
            user_id,
            plan_external_id
        );

        let url = format!("{}/checkout/sessions", self.base_url);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&CheckoutSessionRequest {
                plan_id: plan_external_id,
                metadata: CheckoutMetadata { user_id },
            })
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(ApiError::Internal(format!(
                "payment gateway error {}: {}",
                status, error_text
            )));
        }

        Ok(response.json::<CheckoutSession>().await?)
    }
}
