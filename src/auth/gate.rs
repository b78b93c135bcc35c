//! Per-request authentication decision
//!
//! Turns a request path and its raw `Authorization` header into one of:
//! pass-through (public route), an authenticated [`Principal`], or a
//! rejection. Transport-agnostic; the axum glue lives in
//! `interfaces::http::middleware`.

use std::sync::Arc;

use axum::http::HeaderValue;
use tracing::{debug, warn};

use super::error::VerifyError;
use super::principal::Principal;
use super::verifier::TokenVerifier;
use crate::config::ConfigError;
use crate::shared::clock::Clock;

const BEARER_PREFIX: &str = "Bearer ";

/// Route prefixes that skip authentication.
#[derive(Debug, Clone, Default)]
pub struct PublicRoutes {
    prefixes: Vec<String>,
}

impl PublicRoutes {
    /// Every prefix must start with `/`. Matching ignores ASCII case.
    pub fn new<I, S>(prefixes: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut normalized = Vec::new();
        for prefix in prefixes {
            let prefix = prefix.as_ref().trim();
            if !prefix.starts_with('/') {
                return Err(ConfigError::InvalidPublicRoute(prefix.to_string()));
            }
            let prefix = prefix.trim_end_matches('/');
            normalized.push(prefix.to_ascii_lowercase());
        }
        Ok(Self {
            prefixes: normalized,
        })
    }

    /// `path` equals a prefix or continues it with a new segment.
    pub fn matches(&self, path: &str) -> bool {
        let path = path.to_ascii_lowercase();
        self.prefixes.iter().any(|prefix| {
            if prefix.is_empty() {
                return true;
            }
            match path.strip_prefix(prefix.as_str()) {
                Some(rest) => rest.is_empty() || rest.starts_with('/'),
                None => false,
            }
        })
    }

    pub fn prefixes(&self) -> &[String] {
        &self.prefixes
    }
}

/// Why a request was turned away.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    /// No `Authorization: Bearer <token>` header
    MissingCredentials,
    /// Token present but not valid
    InvalidToken(VerifyError),
}

impl Rejection {
    /// Client-facing message. Never distinguishes between token failures.
    pub fn public_message(&self) -> &'static str {
        match self {
            Self::MissingCredentials => "missing or invalid authorization header",
            Self::InvalidToken(_) => "Invalid or expired token.",
        }
    }
}

/// Outcome for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    /// Public route: continue without identity
    PassThrough,
    /// Token verified
    Authenticated(Principal),
    Rejected(Rejection),
}

/// Authentication gate shared by all request handlers.
///
/// Holds only immutable state, so concurrent requests need no locking.
pub struct AuthenticationGate {
    verifier: TokenVerifier,
    public_routes: PublicRoutes,
    clock: Arc<dyn Clock>,
}

impl AuthenticationGate {
    pub fn new(verifier: TokenVerifier, public_routes: PublicRoutes, clock: Arc<dyn Clock>) -> Self {
        Self {
            verifier,
            public_routes,
            clock,
        }
    }

    pub fn evaluate(&self, path: &str, authorization: Option<&HeaderValue>) -> GateDecision {
        if self.public_routes.matches(path) {
            debug!(path, "public route, skipping authentication");
            return GateDecision::PassThrough;
        }

        let Some(token) = authorization.and_then(extract_bearer) else {
            warn!(path, "rejected: missing or invalid authorization header");
            return GateDecision::Rejected(Rejection::MissingCredentials);
        };

        match self.verifier.verify(token, self.clock.now()) {
            Ok(claims) => {
                debug!(path, subject = %claims.subject, "token verified");
                GateDecision::Authenticated(Principal::from(claims))
            }
            Err(e) => {
                warn!(path, reason = e.reason(), "rejected: token verification failed");
                GateDecision::Rejected(Rejection::InvalidToken(e))
            }
        }
    }
}

/// Token from `Bearer <token>`. The scheme is case-sensitive; surrounding
/// whitespace is ignored.
pub fn extract_bearer(value: &HeaderValue) -> Option<&str> {
    let value = value.to_str().ok()?.trim();
    let token = value.strip_prefix(BEARER_PREFIX)?.trim();
    if token.is_empty() {
        None
    } else {
        Some(token)
    }
}
