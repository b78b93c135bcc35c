//! API router

use std::sync::Arc;

use axum::{
    extract::FromRef,
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::application::identity::IdentityService;
use crate::interfaces::http::middleware::{admin_middleware, auth_middleware, AuthState};
use crate::interfaces::http::modules::{auth, health};

/// State shared by all routes. Handlers extract their own slice via `FromRef`.
#[derive(Clone)]
pub struct AppState {
    pub auth: AuthState,
    pub identity: Arc<IdentityService>,
}

impl FromRef<AppState> for AuthState {
    fn from_ref(s: &AppState) -> Self {
        s.auth.clone()
    }
}

impl FromRef<AppState> for auth::AuthHandlerState {
    fn from_ref(s: &AppState) -> Self {
        auth::AuthHandlerState {
            identity: Arc::clone(&s.identity),
        }
    }
}

/// Build the API router. Every route goes through the authentication
/// gate; public routes are let through by the gate itself.
pub fn create_api_router(state: AppState) -> Router {
    let admin_routes = Router::new()
        .route("/api/auth/admin", get(auth::get_admin_profile))
        .route_layer(middleware::from_fn(admin_middleware));

    Router::new()
        .route("/health", get(health::health_check))
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/me", get(auth::get_current_user))
        .merge(admin_routes)
        .layer(middleware::from_fn_with_state(
            state.auth.clone(),
            auth_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
