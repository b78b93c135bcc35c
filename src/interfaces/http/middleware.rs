//! Authentication middleware for Axum
//!
//! `auth_middleware` runs the [`AuthenticationGate`] for every request and
//! stores the resulting [`Principal`] in the request extensions. Clients
//! only ever see a generic 401; the specific reason goes to the log.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::{FromRequestParts, State},
    http::{header, request::Parts, HeaderValue, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::warn;

use crate::auth::gate::{AuthenticationGate, GateDecision, Rejection};
use crate::auth::principal::Principal;

/// Authentication state shared by all requests
#[derive(Clone)]
pub struct AuthState {
    pub gate: Arc<AuthenticationGate>,
}

impl IntoResponse for Rejection {
    fn into_response(self) -> Response {
        let mut response = (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "message": self.public_message() })),
        )
            .into_response();
        response
            .headers_mut()
            .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        response
    }
}

/// Bearer token authentication middleware
pub async fn auth_middleware(
    State(auth_state): State<AuthState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let decision = auth_state.gate.evaluate(
        request.uri().path(),
        request.headers().get(header::AUTHORIZATION),
    );

    match decision {
        GateDecision::PassThrough => next.run(request).await,
        GateDecision::Authenticated(principal) => {
            request.extensions_mut().insert(principal);
            next.run(request).await
        }
        GateDecision::Rejected(rejection) => rejection.into_response(),
    }
}

/// Requires an authenticated principal with the admin role.
pub async fn admin_middleware(request: Request<Body>, next: Next) -> Response {
    let Some(principal) = request.extensions().get::<Principal>() else {
        return Rejection::MissingCredentials.into_response();
    };

    if !principal.is_admin() {
        warn!(
            path = request.uri().path(),
            subject = %principal.subject,
            "rejected: insufficient permissions"
        );
        return (
            StatusCode::FORBIDDEN,
            Json(json!({ "message": "Insufficient permissions." })),
        )
            .into_response();
    }

    next.run(request).await
}

impl<S> FromRequestParts<S> for Principal
where
    S: Send + Sync,
{
    type Rejection = crate::auth::gate::Rejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Principal>()
            .cloned()
            .ok_or(Rejection::MissingCredentials)
    }
}
