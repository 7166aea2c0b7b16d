//! Token request/response types.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize)]
pub struct CreateTokenRequest {
    pub name: String,
    pub symbol: String,
    pub policy_id: Option<String>,
    /// Defaults to 6 when omitted
    pub decimals: Option<i16>,
    /// Defaults to 0 when omitted
    pub total_supply: Option<Decimal>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateTokenRequest {
    pub name: Option<String>,
    pub policy_id: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TokenResponse {
    pub id: i32,
    pub owner_id: i32,
    pub name: String,
    pub symbol: String,
    pub policy_id: Option<String>,
    pub decimals: i16,
    pub total_supply: Decimal,
    pub created_at: String,
    pub updated_at: String,
}

impl From<crate::entities::tokens::Model> for TokenResponse {
    fn from(model: crate::entities::tokens::Model) -> Self {
        Self {
            id: model.id,
            owner_id: model.owner_id,
            name: model.name,
            symbol: model.symbol,
            policy_id: model.policy_id,
            decimals: model.decimals,
            total_supply: model.total_supply,
            created_at: model.created_at.to_rfc3339(),
            updated_at: model.updated_at.to_rfc3339(),
        }
    }
}
