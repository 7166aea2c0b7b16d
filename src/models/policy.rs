//! Security policy types.
//!
//! Policy config is a tagged union keyed by policy type, so each variant
//! carries its own strongly-typed fields instead of a free-form JSON blob.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyType {
    RateLimit,
    AmountLimit,
    TimeLock,
    Whitelist,
}

impl std::fmt::Display for PolicyType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PolicyType::RateLimit => write!(f, "rate_limit"),
            PolicyType::AmountLimit => write!(f, "amount_limit"),
            PolicyType::TimeLock => write!(f, "time_lock"),
            PolicyType::Whitelist => write!(f, "whitelist"),
        }
    }
}

impl std::str::FromStr for PolicyType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "rate_limit" => Ok(PolicyType::RateLimit),
            "amount_limit" => Ok(PolicyType::AmountLimit),
            "time_lock" => Ok(PolicyType::TimeLock),
            "whitelist" => Ok(PolicyType::Whitelist),
            _ => Err(format!("Unknown policy type: {}", s)),
        }
    }
}

/// Typed policy configuration. Serialized into the `config` JSON column
/// with a `type` tag matching the row's `policy_type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PolicyConfig {
    RateLimit {
        window_hours: u32,
        max_transactions: u32,
    },
    AmountLimit {
        max_amount: Decimal,
    },
    TimeLock {
        /// Allowed UTC hours of day (0-23)
        allowed_hours: Vec<u8>,
    },
    Whitelist {
        allowed_ips: Vec<String>,
    },
}

impl PolicyConfig {
    pub fn policy_type(&self) -> PolicyType {
        match self {
            PolicyConfig::RateLimit { .. } => PolicyType::RateLimit,
            PolicyConfig::AmountLimit { .. } => PolicyType::AmountLimit,
            PolicyConfig::TimeLock { .. } => PolicyType::TimeLock,
            PolicyConfig::Whitelist { .. } => PolicyType::Whitelist,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreatePolicyRequest {
    pub config: PolicyConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdatePolicyRequest {
    pub active: Option<bool>,
    pub config: Option<PolicyConfig>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PolicyResponse {
    pub id: i32,
    pub policy_type: String,
    pub config: serde_json::Value,
    pub active: bool,
    pub created_at: String,
}

impl From<crate::entities::security_policies::Model> for PolicyResponse {
    fn from(model: crate::entities::security_policies::Model) -> Self {
        Self {
            id: model.id,
            policy_type: model.policy_type,
            config: model.config,
            active: model.active,
            created_at: model.created_at.to_rfc3339(),
        }
    }
}
