//! Authentication API handlers

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Json};
use tracing::error;

use super::dto::{LoginRequest, LoginResponse};
use crate::application::identity::{IdentityError, IdentityService};
use crate::auth::principal::Principal;
use crate::interfaces::http::common::{ApiResponse, ValidatedJson};

/// Auth state
#[derive(Clone)]
pub struct AuthHandlerState {
    pub identity: Arc<IdentityService>,
}

type ErrorResponse = (StatusCode, Json<ApiResponse<()>>);

/// `POST /api/auth/login`
pub async fn login(
    State(state): State<AuthHandlerState>,
    ValidatedJson(request): ValidatedJson<LoginRequest>,
) -> Result<Json<ApiResponse<LoginResponse>>, ErrorResponse> {
    match state.identity.login(&request.username, &request.password).await {
        Ok(result) => Ok(Json(ApiResponse::success(LoginResponse::from(result)))),
        Err(IdentityError::InvalidCredentials) => Err((
            StatusCode::UNAUTHORIZED,
            Json(ApiResponse::error("Invalid credentials")),
        )),
        Err(e) => {
            error!("login failed: {}", e);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::error("Internal server error")),
            ))
        }
    }
}

/// `GET /api/auth/me`: the authenticated caller.
pub async fn get_current_user(principal: Principal) -> Json<ApiResponse<Principal>> {
    Json(ApiResponse::success(principal))
}

/// `GET /api/auth/admin`: same as `me`, behind the admin role check.
pub async fn get_admin_profile(principal: Principal) -> Json<ApiResponse<Principal>> {
    Json(ApiResponse::success(principal))
}
