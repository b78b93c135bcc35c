//! Login use-case: credential check, then token issuance
//!
//! HTTP handlers stay thin and delegate here.

use std::sync::{Arc, OnceLock};

use thiserror::Error;
use tracing::{error, info, warn};

use super::credentials::{CredentialStore, UserRecord};
use crate::auth::error::IssueError;
use crate::auth::issuer::{TokenIdGenerator, TokenIssuer};
use crate::auth::password::{hash_password, verify_password};
use crate::auth::token::Token;
use crate::shared::clock::Clock;

#[derive(Debug, Error)]
pub enum IdentityError {
    /// Unknown user and wrong password look the same to the caller.
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("failed to issue token: {0}")]
    Issue(#[from] IssueError),

    #[error("credential store error: {0}")]
    Store(String),

    #[error("stored password hash for user {user_id} is unusable: {source}")]
    CorruptHash {
        user_id: String,
        #[source]
        source: bcrypt::BcryptError,
    },
}

/// Hash checked against when the login names no user, so both failure
/// paths do the same bcrypt work.
fn dummy_hash() -> Option<&'static str> {
    static DUMMY: OnceLock<Option<String>> = OnceLock::new();
    DUMMY
        .get_or_init(|| hash_password("token-gate-unknown-user").ok())
        .as_deref()
}

/// Authentication result returned after a successful login
#[derive(Debug, Clone)]
pub struct AuthResult {
    pub token: Token,
    pub token_type: String,
    pub expires_in: i64,
    pub user: UserRecord,
}

pub struct IdentityService {
    store: Arc<dyn CredentialStore>,
    issuer: TokenIssuer,
    clock: Arc<dyn Clock>,
    token_ids: Arc<dyn TokenIdGenerator>,
}

impl IdentityService {
    pub fn new(
        store: Arc<dyn CredentialStore>,
        issuer: TokenIssuer,
        clock: Arc<dyn Clock>,
        token_ids: Arc<dyn TokenIdGenerator>,
    ) -> Self {
        Self {
            store,
            issuer,
            clock,
            token_ids,
        }
    }

    /// Authenticate by username or email and return a bearer token.
    pub async fn login(&self, login: &str, password: &str) -> Result<AuthResult, IdentityError> {
        let Some(user) = self.store.find_by_login(login).await? else {
            let password = password.to_string();
            tokio::task::spawn_blocking(move || {
                if let Some(hash) = dummy_hash() {
                    let _ = verify_password(&password, hash);
                }
            })
            .await
            .map_err(|e| IdentityError::Store(e.to_string()))?;

            warn!(login, "login failed: unknown user");
            return Err(IdentityError::InvalidCredentials);
        };

        // bcrypt blocks, run it off the async workers
        let password = password.to_string();
        let hash = user.password_hash.clone();
        let valid = tokio::task::spawn_blocking(move || verify_password(&password, &hash))
            .await
            .map_err(|e| IdentityError::Store(e.to_string()))?
            .map_err(|source| {
                error!(user_id = %user.id, error = %source, "stored password hash is unusable");
                IdentityError::CorruptHash {
                    user_id: user.id.clone(),
                    source,
                }
            })?;

        if !valid {
            warn!(login, "login failed: wrong password");
            return Err(IdentityError::InvalidCredentials);
        }

        let claims = self.issuer.claims_for(
            &user.username,
            &user.role,
            &user.id,
            self.clock.now(),
            Some(self.token_ids.next_id()),
        );
        let token = self.issuer.issue(&claims)?;

        info!(user_id = %user.id, username = %user.username, "user logged in");

        Ok(AuthResult {
            token,
            token_type: "Bearer".into(),
            expires_in: self.issuer.lifetime_seconds(),
            user,
        })
    }
}
