//! Authentication DTOs

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::application::identity::AuthResult;

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    /// Username or email
    #[validate(length(min = 1, max = 254, message = "username is required"))]
    pub username: String,
    #[validate(length(min = 1, message = "password is required"))]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub token_type: String,
    pub expires_in: i64,
    pub user: UserInfo,
}

#[derive(Debug, Serialize)]
pub struct UserInfo {
    pub id: String,
    pub username: String,
    pub role: String,
}

impl From<AuthResult> for LoginResponse {
    fn from(result: AuthResult) -> Self {
        Self {
            token: result.token.into_string(),
            token_type: result.token_type,
            expires_in: result.expires_in,
            user: UserInfo {
                id: result.user.id,
                username: result.user.username,
                role: result.user.role,
            },
        }
    }
}
