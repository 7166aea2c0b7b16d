use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use chrono::Utc;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder};

use crate::auth::extractor::AuthUser;
use crate::entities::{gasless_sponsorships, prelude::*};
use crate::error::ApiError;
use crate::models::gasless::{SponsorRequest, SponsorshipResponse};
use crate::services::recorder;
use crate::AppState;

pub async fn sponsor(
    State(state): State<AppState>,
    user: AuthUser,
    headers: HeaderMap,
    Json(payload): Json<SponsorRequest>,
) -> Result<(StatusCode, Json<SponsorshipResponse>), ApiError> {
    let origin_ip = client_ip(&headers);

    let sponsorship = recorder::sponsor(
        &state.db,
        &state.broadcaster,
        user.user_id,
        payload.transaction_id,
        payload.estimated_fee,
        &state.config.sponsor_address,
        origin_ip,
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(SponsorshipResponse::from_model_at(sponsorship, Utc::now())),
    ))
}

pub async fn list_sponsorships(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<Vec<SponsorshipResponse>>, ApiError> {
    let rows = GaslessSponsorships::find()
        .filter(gasless_sponsorships::Column::UserId.eq(user.user_id))
        .order_by_desc(gasless_sponsorships::Column::CreatedAt)
        .all(&state.db)
        .await?;

    let now = Utc::now();
    Ok(Json(
        rows.into_iter()
            .map(|row| SponsorshipResponse::from_model_at(row, now))
            .collect(),
    ))
}

pub async fn get_sponsorship(
    State(state): State<AppState>,
    user: AuthUser,
    Path(sponsorship_id): Path<i32>,
) -> Result<Json<SponsorshipResponse>, ApiError> {
    let row = GaslessSponsorships::find_by_id(sponsorship_id)
        .filter(gasless_sponsorships::Column::UserId.eq(user.user_id))
        .one(&state.db)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("sponsorship {} not found", sponsorship_id)))?;

    Ok(Json(SponsorshipResponse::from_model_at(row, Utc::now())))
}

pub async fn execute_sponsorship(
    State(state): State<AppState>,
    user: AuthUser,
    Path(sponsorship_id): Path<i32>,
) -> Result<Json<SponsorshipResponse>, ApiError> {
    let row = recorder::execute(&state.db, user.user_id, sponsorship_id).await?;
    Ok(Json(SponsorshipResponse::from_model_at(row, Utc::now())))
}

/// Client origin for whitelist policies. Behind a proxy the first
/// X-Forwarded-For hop is the client.
fn client_ip(headers: &HeaderMap) -> Option<String> {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_ip_takes_first_forwarded_hop() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", "203.0.113.7, 10.0.0.1".parse().unwrap());
        assert_eq!(client_ip(&headers), Some("203.0.113.7".to_string()));
    }

    #[test]
    fn client_ip_absent_without_header() {
        assert_eq!(client_ip(&HeaderMap::new()), None);
    }
}
