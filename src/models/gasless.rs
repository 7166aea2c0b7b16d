//! Gasless sponsorship types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Status progresses: pending → sponsored → executed | failed.
/// An expired sponsorship that never reached `executed` reads as `failed`
/// (lazy expiry, no background sweep).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SponsorshipStatus {
    Pending,
    Sponsored,
    Executed,
    Failed,
}

impl SponsorshipStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, SponsorshipStatus::Executed | SponsorshipStatus::Failed)
    }
}

impl std::fmt::Display for SponsorshipStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SponsorshipStatus::Pending => write!(f, "pending"),
            SponsorshipStatus::Sponsored => write!(f, "sponsored"),
            SponsorshipStatus::Executed => write!(f, "executed"),
            SponsorshipStatus::Failed => write!(f, "failed"),
        }
    }
}

impl std::str::FromStr for SponsorshipStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(SponsorshipStatus::Pending),
            "sponsored" => Ok(SponsorshipStatus::Sponsored),
            "executed" => Ok(SponsorshipStatus::Executed),
            "failed" => Ok(SponsorshipStatus::Failed),
            _ => Err(format!("Unknown sponsorship status: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SponsorRequest {
    pub transaction_id: i32,
    pub estimated_fee: Decimal,
}

#[derive(Debug, Clone, Serialize)]
pub struct SponsorshipResponse {
    pub id: i32,
    pub transaction_id: i32,
    pub sponsor_address: String,
    pub estimated_fee: Decimal,
    pub nonce: i64,
    pub status: String,
    pub expires_at: String,
    pub created_at: String,
}

impl SponsorshipResponse {
    /// Build a response applying lazy expiry: an expired row that never
    /// reached `executed` is reported as `failed`.
    pub fn from_model_at(
        model: crate::entities::gasless_sponsorships::Model,
        now: DateTime<Utc>,
    ) -> Self {
        let status = effective_status(&model, now);
        Self {
            id: model.id,
            transaction_id: model.transaction_id,
            sponsor_address: model.sponsor_address,
            estimated_fee: model.estimated_fee,
            nonce: model.nonce,
            status: status.to_string(),
            expires_at: model.expires_at.to_rfc3339(),
            created_at: model.created_at.to_rfc3339(),
        }
    }
}

/// Expiry-aware status of a sponsorship row.
pub fn effective_status(
    model: &crate::entities::gasless_sponsorships::Model,
    now: DateTime<Utc>,
) -> SponsorshipStatus {
    let stored: SponsorshipStatus = model
        .status
        .parse()
        .unwrap_or(SponsorshipStatus::Failed);
    if stored != SponsorshipStatus::Executed && model.expires_at.with_timezone(&Utc) <= now {
        SponsorshipStatus::Failed
    } else {
        stored
    }
}
