//! Token claims
//!
//! The payload carried by every token. Key spelling is fixed here and
//! shared by the issuer and the verifier.

use serde::{Deserialize, Serialize};

use super::error::IssueError;

/// Identity claims (payload of a token).
///
/// Serialized as `{"sub","role","userId","iat","exp"[,"jti"]}` in that order,
/// so identical claims always produce identical bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimSet {
    /// Subject (login name of the principal)
    #[serde(rename = "sub")]
    pub subject: String,
    /// Role name
    pub role: String,
    /// Stable identifier of the principal
    #[serde(rename = "userId")]
    pub user_id: String,
    /// Issued at (Unix seconds)
    #[serde(rename = "iat")]
    pub issued_at: i64,
    /// Expiration (Unix seconds)
    #[serde(rename = "exp")]
    pub expires_at: i64,
    /// Token ID
    #[serde(rename = "jti", default, skip_serializing_if = "Option::is_none")]
    pub token_id: Option<String>,
}

impl ClaimSet {
    pub fn new(
        subject: impl Into<String>,
        role: impl Into<String>,
        user_id: impl Into<String>,
        issued_at: i64,
        expires_at: i64,
    ) -> Self {
        Self {
            subject: subject.into(),
            role: role.into(),
            user_id: user_id.into(),
            issued_at,
            expires_at,
            token_id: None,
        }
    }

    /// Attach a token ID
    pub fn with_token_id(mut self, token_id: impl Into<String>) -> Self {
        self.token_id = Some(token_id.into());
        self
    }

    /// Check the creation-time invariants.
    pub fn validate(&self) -> Result<(), IssueError> {
        for (claim, value) in [
            ("sub", &self.subject),
            ("role", &self.role),
            ("userId", &self.user_id),
        ] {
            if value.is_empty() {
                return Err(IssueError::EmptyClaim(claim));
            }
        }
        if self.expires_at <= self.issued_at {
            return Err(IssueError::InvalidLifetime {
                issued_at: self.issued_at,
                expires_at: self.expires_at,
            });
        }
        Ok(())
    }

    /// Whether the claims are expired at `now` (expiry instant included).
    pub fn is_expired_at(&self, now: i64) -> bool {
        now >= self.expires_at
    }

    /// Canonical JSON bytes.
    pub fn to_canonical_json(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }
}
