//! Security policy evaluator.
//!
//! Given a caller, an action descriptor and the caller's active policies,
//! returns allow/deny plus a reason. Evaluation is read-only; the caller
//! logs the outcome. All active policies are ANDed and the first violation
//! short-circuits.
//!
//! A failed history lookup or an unparseable config on an active policy
//! denies the action: rate limiting is a safety control, so the evaluator
//! fails closed.

use chrono::{DateTime, Duration, Timelike, Utc};
use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter};

use crate::entities::{gasless_sponsorships, security_policies, transactions};
use crate::models::policy::{PolicyConfig, PolicyType};

/// The action being judged.
#[derive(Debug, Clone)]
pub struct ActionDescriptor {
    /// `sponsor`, `mint`, `burn` or `transfer`
    pub kind: String,
    pub amount: Decimal,
    pub timestamp: DateTime<Utc>,
    pub origin_ip: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    Allow,
    Deny {
        policy_type: PolicyType,
        reason: String,
    },
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow)
    }
}

/// Evaluate one policy against an action.
///
/// `recent_count` is the number of prior actions of the same kind inside
/// the policy's trailing window; `None` means the history lookup failed
/// and a rate-limit policy denies.
pub fn check(
    config: &PolicyConfig,
    action: &ActionDescriptor,
    recent_count: Option<u64>,
) -> Decision {
    match config {
        PolicyConfig::RateLimit {
            window_hours,
            max_transactions,
        } => match recent_count {
            Some(count) if count >= *max_transactions as u64 => Decision::Deny {
                policy_type: PolicyType::RateLimit,
                reason: format!(
                    "{} {} actions in the last {}h (max {})",
                    count, action.kind, window_hours, max_transactions
                ),
            },
            Some(_) => Decision::Allow,
            None => Decision::Deny {
                policy_type: PolicyType::RateLimit,
                reason: "action history unavailable".to_string(),
            },
        },
        PolicyConfig::AmountLimit { max_amount } => {
            // Exactly max_amount is allowed; one unit above is denied
            if action.amount > *max_amount {
                Decision::Deny {
                    policy_type: PolicyType::AmountLimit,
                    reason: format!("amount {} exceeds limit {}", action.amount, max_amount),
                }
            } else {
                Decision::Allow
            }
        }
        PolicyConfig::TimeLock { allowed_hours } => {
            let hour = action.timestamp.hour() as u8;
            if allowed_hours.contains(&hour) {
                Decision::Allow
            } else {
                Decision::Deny {
                    policy_type: PolicyType::TimeLock,
                    reason: format!("hour {} UTC is outside the allowed window", hour),
                }
            }
        }
        PolicyConfig::Whitelist { allowed_ips } => match &action.origin_ip {
            Some(ip) if allowed_ips.iter().any(|allowed| allowed == ip) => Decision::Allow,
            Some(ip) => Decision::Deny {
                policy_type: PolicyType::Whitelist,
                reason: format!("origin {} is not whitelisted", ip),
            },
            None => Decision::Deny {
                policy_type: PolicyType::Whitelist,
                reason: "request origin unknown".to_string(),
            },
        },
    }
}

/// Evaluate all active policies of a user against an action.
pub async fn evaluate_for_user(
    db: &DatabaseConnection,
    user_id: i32,
    action: &ActionDescriptor,
) -> Decision {
    let policies = match security_policies::Entity::find()
        .filter(security_policies::Column::UserId.eq(user_id))
        .filter(security_policies::Column::Active.eq(true))
        .all(db)
        .await
    {
        Ok(policies) => policies,
        Err(e) => {
            tracing::error!("policy lookup failed for user {}: {}", user_id, e);
            return Decision::Deny {
                policy_type: PolicyType::RateLimit,
                reason: "policy lookup unavailable".to_string(),
            };
        }
    };

    for policy in policies {
        let config: PolicyConfig = match serde_json::from_value(policy.config.clone()) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!(
                    "policy {} for user {} has unparseable config: {}",
                    policy.id,
                    user_id,
                    e
                );
                let policy_type = policy
                    .policy_type
                    .parse()
                    .unwrap_or(PolicyType::RateLimit);
                return Decision::Deny {
                    policy_type,
                    reason: "policy config invalid".to_string(),
                };
            }
        };

        let recent_count = match &config {
            PolicyConfig::RateLimit { window_hours, .. } => {
                recent_action_count(db, user_id, action, *window_hours).await
            }
            _ => None,
        };

        let decision = check(&config, action, recent_count);
        if !decision.is_allowed() {
            return decision;
        }
    }

    Decision::Allow
}

/// Count prior actions of the same kind inside the trailing window.
/// The cutoff comparison is `>=`, counting actions exactly on the boundary
/// (deny-safe). Returns None on lookup failure.
async fn recent_action_count(
    db: &DatabaseConnection,
    user_id: i32,
    action: &ActionDescriptor,
    window_hours: u32,
) -> Option<u64> {
    let cutoff = action.timestamp - Duration::hours(window_hours as i64);

    let result = if action.kind == "sponsor" {
        gasless_sponsorships::Entity::find()
            .filter(gasless_sponsorships::Column::UserId.eq(user_id))
            .filter(gasless_sponsorships::Column::CreatedAt.gte(cutoff))
            .count(db)
            .await
    } else {
        transactions::Entity::find()
            .filter(transactions::Column::UserId.eq(user_id))
            .filter(transactions::Column::TxType.eq(&action.kind))
            .filter(transactions::Column::CreatedAt.gte(cutoff))
            .count(db)
            .await
    };

    match result {
        Ok(count) => Some(count),
        Err(e) => {
            tracing::error!("rate-limit history lookup failed for user {}: {}", user_id, e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn action(amount: Decimal) -> ActionDescriptor {
        ActionDescriptor {
            kind: "sponsor".to_string(),
            amount,
            timestamp: Utc.with_ymd_and_hms(2026, 8, 20, 14, 30, 0).unwrap(),
            origin_ip: Some("10.0.0.1".to_string()),
        }
    }

    #[test]
    fn rate_limit_denies_at_max() {
        let config = PolicyConfig::RateLimit {
            window_hours: 1,
            max_transactions: 1,
        };
        assert!(check(&config, &action(dec!(1)), Some(0)).is_allowed());
        // count == max denies
        assert!(!check(&config, &action(dec!(1)), Some(1)).is_allowed());
        assert!(!check(&config, &action(dec!(1)), Some(5)).is_allowed());
    }

    #[test]
    fn rate_limit_fails_closed_on_missing_history() {
        let config = PolicyConfig::RateLimit {
            window_hours: 1,
            max_transactions: 100,
        };
        let decision = check(&config, &action(dec!(1)), None);
        assert_eq!(
            decision,
            Decision::Deny {
                policy_type: PolicyType::RateLimit,
                reason: "action history unavailable".to_string(),
            }
        );
    }

    #[test]
    fn amount_limit_boundary_is_inclusive() {
        let config = PolicyConfig::AmountLimit {
            max_amount: dec!(1000),
        };
        assert!(check(&config, &action(dec!(999)), None).is_allowed());
        // exactly the limit is allowed
        assert!(check(&config, &action(dec!(1000)), None).is_allowed());
        // one unit above is denied
        assert!(!check(&config, &action(dec!(1000.000000000001)), None).is_allowed());
    }

    #[test]
    fn time_lock_checks_utc_hour() {
        let config = PolicyConfig::TimeLock {
            allowed_hours: vec![9, 10, 11, 12, 13, 14],
        };
        assert!(check(&config, &action(dec!(1)), None).is_allowed()); // 14:30 UTC

        let config = PolicyConfig::TimeLock {
            allowed_hours: vec![0, 1, 2],
        };
        assert!(!check(&config, &action(dec!(1)), None).is_allowed());
    }

    #[test]
    fn whitelist_requires_listed_origin() {
        let config = PolicyConfig::Whitelist {
            allowed_ips: vec!["10.0.0.1".to_string(), "192.168.1.5".to_string()],
        };
        assert!(check(&config, &action(dec!(1)), None).is_allowed());

        let mut denied = action(dec!(1));
        denied.origin_ip = Some("172.16.0.9".to_string());
        assert!(!check(&config, &denied, None).is_allowed());

        // missing origin denies
        let mut unknown = action(dec!(1));
        unknown.origin_ip = None;
        assert!(!check(&config, &unknown, None).is_allowed());
    }
}
