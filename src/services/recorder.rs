//! Transaction and gasless-sponsorship recorder.
//!
//! Owns the two state machines:
//!   transaction:  pending → confirmed | failed
//!   sponsorship:  pending → sponsored → executed | failed
//!
//! Nonce allocation is max(existing)+1 starting at 1, inserted under the
//! unique (user_id, nonce) index with a bounded retry on conflict, so two
//! concurrent sponsor calls for one user cannot share a nonce.

use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel, QueryFilter,
    QueryOrder, Set, SqlErr,
};

use crate::entities::{gasless_sponsorships, tokens, transactions};
use crate::error::ApiError;
use crate::models::event::{EventKind, UserEvent};
use crate::models::gasless::{effective_status, SponsorshipStatus};
use crate::models::transaction::{TxStatus, TxType};
use crate::services::broadcaster::EventBroadcaster;
use crate::services::policy::{self, ActionDescriptor, Decision};

/// Sponsorships expire 30 minutes after allocation.
const SPONSORSHIP_TTL_MINUTES: i64 = 30;

/// Attempts before giving up on a nonce collision.
const NONCE_RETRY_ATTEMPTS: u32 = 3;

pub async fn create_transaction(
    db: &DatabaseConnection,
    broadcaster: &EventBroadcaster,
    user_id: i32,
    token_id: i32,
    tx_type: TxType,
    amount: Decimal,
    origin_hash: Option<String>,
    metadata: Option<serde_json::Value>,
) -> Result<transactions::Model, ApiError> {
    if amount <= Decimal::ZERO {
        return Err(ApiError::Validation(
            "amount must be greater than zero".to_string(),
        ));
    }

    // Ownership check: a token owned by someone else is indistinguishable
    // from an absent one.
    let token = tokens::Entity::find_by_id(token_id)
        .filter(tokens::Column::OwnerId.eq(user_id))
        .one(db)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("token {} not found", token_id)))?;

    let new_tx = transactions::ActiveModel {
        token_id: Set(token.id),
        user_id: Set(user_id),
        tx_type: Set(tx_type.to_string()),
        amount: Set(amount),
        status: Set(TxStatus::Pending.to_string()),
        origin_hash: Set(origin_hash),
        metadata: Set(metadata),
        ..Default::default()
    };

    let tx = new_tx.insert(db).await?;

    crate::services::audit::record(
        db,
        Some(user_id),
        "transaction.created",
        "transaction",
        Some(tx.id.to_string()),
        Some(serde_json::json!({ "type": tx.tx_type, "amount": tx.amount })),
    )
    .await;

    broadcaster.broadcast(UserEvent::new(
        user_id,
        EventKind::TransactionUpdated,
        serde_json::json!({ "id": tx.id, "status": tx.status }),
    ));

    Ok(tx)
}

/// Move a transaction out of `pending`. Confirming a mint or burn adjusts
/// the token supply; a burn past zero is rejected and nothing changes.
pub async fn update_status(
    db: &DatabaseConnection,
    broadcaster: &EventBroadcaster,
    user_id: i32,
    transaction_id: i32,
    new_status: TxStatus,
) -> Result<transactions::Model, ApiError> {
    let tx = transactions::Entity::find_by_id(transaction_id)
        .filter(transactions::Column::UserId.eq(user_id))
        .one(db)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("transaction {} not found", transaction_id)))?;

    let current: TxStatus = tx
        .status
        .parse()
        .map_err(|e: String| ApiError::Internal(e))?;

    if current.is_terminal() {
        return Err(ApiError::Conflict(format!(
            "transaction {} is already {}",
            transaction_id, current
        )));
    }
    if new_status == TxStatus::Pending {
        return Err(ApiError::Validation(
            "cannot transition back to pending".to_string(),
        ));
    }

    if new_status == TxStatus::Confirmed {
        apply_supply_change(db, &tx).await?;
    }

    let mut active = tx.into_active_model();
    active.status = Set(new_status.to_string());
    active.updated_at = Set(Utc::now().into());
    let updated = active.update(db).await?;

    crate::services::audit::record(
        db,
        Some(user_id),
        "transaction.status_changed",
        "transaction",
        Some(updated.id.to_string()),
        Some(serde_json::json!({ "status": updated.status })),
    )
    .await;

    broadcaster.broadcast(UserEvent::new(
        user_id,
        EventKind::TransactionUpdated,
        serde_json::json!({ "id": updated.id, "status": updated.status }),
    ));

    Ok(updated)
}

/// Supply update on confirmation. Separate round trip from the status
/// write, not atomic with it (acknowledged weakness).
async fn apply_supply_change(
    db: &DatabaseConnection,
    tx: &transactions::Model,
) -> Result<(), ApiError> {
    let tx_type: TxType = tx
        .tx_type
        .parse()
        .map_err(|e: String| ApiError::Internal(e))?;

    let delta = match tx_type {
        TxType::Mint => tx.amount,
        TxType::Burn => -tx.amount,
        TxType::Transfer => return Ok(()),
    };

    let token = tokens::Entity::find_by_id(tx.token_id)
        .one(db)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("token {} not found", tx.token_id)))?;

    let new_supply = token.total_supply + delta;
    if new_supply < Decimal::ZERO {
        return Err(ApiError::Validation(format!(
            "burn of {} exceeds total supply {}",
            tx.amount, token.total_supply
        )));
    }

    let mut active = token.into_active_model();
    active.total_supply = Set(new_supply);
    active.updated_at = Set(Utc::now().into());
    active.update(db).await?;

    Ok(())
}

/// Sponsor a pending transaction: policy check, nonce allocation, 30-minute
/// expiry. Returns the sponsorship row in `sponsored` status.
pub async fn sponsor(
    db: &DatabaseConnection,
    broadcaster: &EventBroadcaster,
    user_id: i32,
    transaction_id: i32,
    estimated_fee: Decimal,
    sponsor_address: &str,
    origin_ip: Option<String>,
) -> Result<gasless_sponsorships::Model, ApiError> {
    if estimated_fee <= Decimal::ZERO {
        return Err(ApiError::Validation(
            "estimated_fee must be greater than zero".to_string(),
        ));
    }

    let tx = transactions::Entity::find_by_id(transaction_id)
        .filter(transactions::Column::UserId.eq(user_id))
        .one(db)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("transaction {} not found", transaction_id)))?;

    if tx.status != TxStatus::Pending.to_string() {
        return Err(ApiError::Conflict(format!(
            "transaction {} is {}, only pending transactions can be sponsored",
            transaction_id, tx.status
        )));
    }

    let existing = gasless_sponsorships::Entity::find()
        .filter(gasless_sponsorships::Column::TransactionId.eq(transaction_id))
        .one(db)
        .await?;
    if existing.is_some() {
        return Err(ApiError::Conflict(format!(
            "transaction {} already has a sponsorship",
            transaction_id
        )));
    }

    let action = ActionDescriptor {
        kind: "sponsor".to_string(),
        amount: estimated_fee,
        timestamp: Utc::now(),
        origin_ip,
    };
    match policy::evaluate_for_user(db, user_id, &action).await {
        Decision::Allow => {}
        Decision::Deny {
            policy_type,
            reason,
        } => {
            crate::services::audit::record(
                db,
                Some(user_id),
                "gasless.denied",
                "transaction",
                Some(transaction_id.to_string()),
                Some(serde_json::json!({ "policy": policy_type.to_string(), "reason": reason })),
            )
            .await;
            return Err(ApiError::PolicyDenied {
                policy_type: policy_type.to_string(),
                reason,
            });
        }
    }

    let sponsorship =
        insert_with_fresh_nonce(db, user_id, transaction_id, estimated_fee, sponsor_address)
            .await?;

    crate::services::audit::record(
        db,
        Some(user_id),
        "gasless.sponsored",
        "sponsorship",
        Some(sponsorship.id.to_string()),
        Some(serde_json::json!({ "nonce": sponsorship.nonce, "fee": sponsorship.estimated_fee })),
    )
    .await;

    broadcaster.broadcast(UserEvent::new(
        user_id,
        EventKind::GaslessTransactionSponsored,
        serde_json::json!({
            "id": sponsorship.id,
            "transaction_id": sponsorship.transaction_id,
            "nonce": sponsorship.nonce,
            "expires_at": sponsorship.expires_at.to_rfc3339(),
        }),
    ));

    Ok(sponsorship)
}

/// Allocate max(nonce)+1 and insert. The unique (user_id, nonce) index
/// catches concurrent allocations; the loser recomputes and retries.
async fn insert_with_fresh_nonce(
    db: &DatabaseConnection,
    user_id: i32,
    transaction_id: i32,
    estimated_fee: Decimal,
    sponsor_address: &str,
) -> Result<gasless_sponsorships::Model, ApiError> {
    for attempt in 0..NONCE_RETRY_ATTEMPTS {
        let highest = gasless_sponsorships::Entity::find()
            .filter(gasless_sponsorships::Column::UserId.eq(user_id))
            .order_by_desc(gasless_sponsorships::Column::Nonce)
            .one(db)
            .await?;
        let nonce = highest.map(|s| s.nonce + 1).unwrap_or(1);

        let new_sponsorship = gasless_sponsorships::ActiveModel {
            transaction_id: Set(transaction_id),
            user_id: Set(user_id),
            sponsor_address: Set(sponsor_address.to_string()),
            estimated_fee: Set(estimated_fee),
            nonce: Set(nonce),
            status: Set(SponsorshipStatus::Sponsored.to_string()),
            expires_at: Set((Utc::now() + Duration::minutes(SPONSORSHIP_TTL_MINUTES)).into()),
            ..Default::default()
        };

        match new_sponsorship.insert(db).await {
            Ok(sponsorship) => return Ok(sponsorship),
            Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                tracing::warn!(
                    "nonce {} for user {} taken concurrently (attempt {}), retrying",
                    nonce,
                    user_id,
                    attempt + 1
                );
                continue;
            }
            Err(e) => return Err(e.into()),
        }
    }

    Err(ApiError::Conflict(
        "could not allocate a sponsorship nonce, please retry".to_string(),
    ))
}

/// Mark a sponsored row executed. An expired sponsorship never becomes
/// `executed`; it is persisted as `failed` instead.
pub async fn execute(
    db: &DatabaseConnection,
    user_id: i32,
    sponsorship_id: i32,
) -> Result<gasless_sponsorships::Model, ApiError> {
    let sponsorship = gasless_sponsorships::Entity::find_by_id(sponsorship_id)
        .filter(gasless_sponsorships::Column::UserId.eq(user_id))
        .one(db)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("sponsorship {} not found", sponsorship_id)))?;

    let now = Utc::now();
    match effective_status(&sponsorship, now) {
        SponsorshipStatus::Sponsored => {
            let mut active = sponsorship.into_active_model();
            active.status = Set(SponsorshipStatus::Executed.to_string());
            active.updated_at = Set(now.into());
            Ok(active.update(db).await?)
        }
        SponsorshipStatus::Failed if sponsorship.status != SponsorshipStatus::Failed.to_string() => {
            // Lazily persist the expiry
            let mut active = sponsorship.into_active_model();
            active.status = Set(SponsorshipStatus::Failed.to_string());
            active.updated_at = Set(now.into());
            active.update(db).await?;
            Err(ApiError::Conflict(format!(
                "sponsorship {} has expired",
                sponsorship_id
            )))
        }
        other => Err(ApiError::Conflict(format!(
            "sponsorship {} is {}, cannot execute",
            sponsorship_id, other
        ))),
    }
}
