//! Auth and profile request/response types.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize)]
pub struct SignupRequest {
    pub email: String,
    pub password: String,
    pub display_name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateProfileRequest {
    pub display_name: Option<String>,
    pub wallet_address: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UserResponse {
    pub id: i32,
    pub email: String,
    pub display_name: String,
    pub wallet_address: Option<String>,
    pub role: String,
    pub suspended: bool,
    pub created_at: String,
}

impl From<crate::entities::users::Model> for UserResponse {
    fn from(model: crate::entities::users::Model) -> Self {
        Self {
            id: model.id,
            email: model.email,
            display_name: model.display_name,
            wallet_address: model.wallet_address,
            role: model.role,
            suspended: model.suspended,
            created_at: model.created_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserResponse,
}
