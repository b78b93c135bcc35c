//! Token issuance

use chrono::Duration;

use super::claims::ClaimSet;
use super::codec;
use super::error::IssueError;
use super::secret::SecretKey;
use super::token::{encoded_header, Token};

/// Source of `jti` values. Uniqueness is the generator's concern.
pub trait TokenIdGenerator: Send + Sync {
    fn next_id(&self) -> String;
}

/// Random UUID v4 token IDs
#[derive(Debug, Default, Clone, Copy)]
pub struct UuidTokenIds;

impl TokenIdGenerator for UuidTokenIds {
    fn next_id(&self) -> String {
        uuid::Uuid::new_v4().to_string()
    }
}

/// Sign `claims` with `secret`.
///
/// Pure: identical claims and secret always give the identical token.
pub fn issue(claims: &ClaimSet, secret: &SecretKey) -> Result<Token, IssueError> {
    claims.validate()?;

    let header = encoded_header();
    let payload = codec::encode(claims.to_canonical_json()?);
    let signature = sign_input(secret, &format!("{}.{}", header, payload));

    Ok(Token::from_parts(&header, &payload, &signature))
}

/// Encoded HMAC-SHA256 over `header.payload`.
pub(crate) fn sign_input(secret: &SecretKey, signing_input: &str) -> String {
    codec::encode(secret.sign(signing_input.as_bytes()))
}

/// Issues tokens with a fixed lifetime.
#[derive(Debug, Clone)]
pub struct TokenIssuer {
    secret: SecretKey,
    lifetime: Duration,
}

impl TokenIssuer {
    pub fn new(secret: SecretKey, lifetime: Duration) -> Self {
        Self { secret, lifetime }
    }

    pub fn issue(&self, claims: &ClaimSet) -> Result<Token, IssueError> {
        issue(claims, &self.secret)
    }

    /// Claims valid from `now` for the configured lifetime.
    pub fn claims_for(
        &self,
        subject: &str,
        role: &str,
        user_id: &str,
        now: i64,
        token_id: Option<String>,
    ) -> ClaimSet {
        ClaimSet {
            subject: subject.to_string(),
            role: role.to_string(),
            user_id: user_id.to_string(),
            issued_at: now,
            expires_at: now + self.lifetime.num_seconds(),
            token_id,
        }
    }

    pub fn lifetime_seconds(&self) -> i64 {
        self.lifetime.num_seconds()
    }
}
