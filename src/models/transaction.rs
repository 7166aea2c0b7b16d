//! Transaction types and status enums.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TxType {
    Mint,
    Burn,
    Transfer,
}

impl std::fmt::Display for TxType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TxType::Mint => write!(f, "mint"),
            TxType::Burn => write!(f, "burn"),
            TxType::Transfer => write!(f, "transfer"),
        }
    }
}

impl std::str::FromStr for TxType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mint" => Ok(TxType::Mint),
            "burn" => Ok(TxType::Burn),
            "transfer" => Ok(TxType::Transfer),
            _ => Err(format!("Unknown transaction type: {}", s)),
        }
    }
}

/// Status progresses: pending → confirmed | failed. Terminal states do not
/// transition further.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TxStatus {
    Pending,
    Confirmed,
    Failed,
}

impl TxStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, TxStatus::Confirmed | TxStatus::Failed)
    }
}

impl std::fmt::Display for TxStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TxStatus::Pending => write!(f, "pending"),
            TxStatus::Confirmed => write!(f, "confirmed"),
            TxStatus::Failed => write!(f, "failed"),
        }
    }
}

impl std::str::FromStr for TxStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(TxStatus::Pending),
            "confirmed" => Ok(TxStatus::Confirmed),
            "failed" => Ok(TxStatus::Failed),
            _ => Err(format!("Unknown transaction status: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateTransactionRequest {
    pub token_id: i32,
    #[serde(rename = "type")]
    pub tx_type: TxType,
    pub amount: Decimal,
    pub origin_hash: Option<String>,
    pub metadata: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateTransactionStatusRequest {
    pub status: TxStatus,
}

#[derive(Debug, Clone, Serialize)]
pub struct TransactionResponse {
    pub id: i32,
    pub token_id: i32,
    pub user_id: i32,
    #[serde(rename = "type")]
    pub tx_type: String,
    pub amount: Decimal,
    pub status: String,
    pub origin_hash: Option<String>,
    pub metadata: Option<serde_json::Value>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<crate::entities::transactions::Model> for TransactionResponse {
    fn from(model: crate::entities::transactions::Model) -> Self {
        Self {
            id: model.id,
            token_id: model.token_id,
            user_id: model.user_id,
            tx_type: model.tx_type,
            amount: model.amount,
            status: model.status,
            origin_hash: model.origin_hash,
            metadata: model.metadata,
            created_at: model.created_at.to_rfc3339(),
            updated_at: model.updated_at.to_rfc3339(),
        }
    }
}
