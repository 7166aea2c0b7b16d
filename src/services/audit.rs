//! Append-only audit log writes.
//!
//! Audit failures are logged and never fail the caller's request.

use sea_orm::{ActiveModelTrait, DatabaseConnection, Set};

use crate::entities::audit_logs;

pub async fn record(
    db: &DatabaseConnection,
    user_id: Option<i32>,
    action: &str,
    resource: &str,
    resource_id: Option<String>,
    detail: Option<serde_json::Value>,
) {
    let entry = audit_logs::ActiveModel {
        user_id: Set(user_id),
        action: Set(action.to_string()),
        resource: Set(resource.to_string()),
        resource_id: Set(resource_id),
        detail: Set(detail),
        ..Default::default()
    };

    if let Err(e) = entry.insert(db).await {
        tracing::error!(
            "failed to write audit log ({} {} by {:?}): {}",
            action,
            resource,
            user_id,
            e
        );
    }
}
