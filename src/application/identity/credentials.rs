//! Credential lookup

use std::collections::HashMap;

use async_trait::async_trait;
use serde::Serialize;

use super::service::IdentityError;
use crate::config::{ConfigError, UserConfig};

/// Stored account
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserRecord {
    pub id: String,
    pub username: String,
    pub email: Option<String>,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: String,
}

/// Where login looks users up.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Find a user by exact username, or by email ignoring ASCII case.
    async fn find_by_login(&self, login: &str) -> Result<Option<UserRecord>, IdentityError>;
}

/// Users seeded from the `[[users]]` config section.
#[derive(Debug, Default)]
pub struct InMemoryCredentialStore {
    users: HashMap<String, UserRecord>,
}

impl InMemoryCredentialStore {
    pub fn new(users: impl IntoIterator<Item = UserRecord>) -> Self {
        Self {
            users: users
                .into_iter()
                .map(|u| (u.username.clone(), u))
                .collect(),
        }
    }

    /// Build from config entries, rejecting blank fields, duplicate
    /// usernames and password hashes that are not bcrypt.
    pub fn from_config(users: &[UserConfig]) -> Result<Self, ConfigError> {
        let mut records: HashMap<String, UserRecord> = HashMap::new();

        for user in users {
            if user.username.trim().is_empty() || user.id.trim().is_empty() {
                return Err(ConfigError::InvalidUser(
                    "id and username must not be empty".to_string(),
                ));
            }
            if user.role.trim().is_empty() {
                return Err(ConfigError::InvalidUser(format!(
                    "user '{}' has an empty role",
                    user.username
                )));
            }
            if !user.password_hash.starts_with("$2") {
                return Err(ConfigError::InvalidUser(format!(
                    "user '{}' password_hash is not a bcrypt hash",
                    user.username
                )));
            }
            if records.contains_key(&user.username) {
                return Err(ConfigError::InvalidUser(format!(
                    "duplicate username '{}'",
                    user.username
                )));
            }

            records.insert(
                user.username.clone(),
                UserRecord {
                    id: user.id.clone(),
                    username: user.username.clone(),
                    email: user.email.clone(),
                    password_hash: user.password_hash.clone(),
                    role: user.role.clone(),
                },
            );
        }

        Ok(Self { users: records })
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn find_by_login(&self, login: &str) -> Result<Option<UserRecord>, IdentityError> {
        if let Some(user) = self.users.get(login) {
            return Ok(Some(user.clone()));
        }

        Ok(self
            .users
            .values()
            .find(|u| {
                u.email
                    .as_deref()
                    .is_some_and(|email| email.eq_ignore_ascii_case(login))
            })
            .cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user_config(username: &str, email: Option<&str>) -> UserConfig {
        UserConfig {
            id: format!("id-{}", username),
            username: username.to_string(),
            email: email.map(str::to_string),
            password_hash: "$2b$04$0000000000000000000000000000000000000000000000000000".to_string(),
            role: "Member".to_string(),
        }
    }

    #[tokio::test]
    async fn test_find_by_username_and_email() {
        let store = InMemoryCredentialStore::from_config(&[
            user_config("alice", Some("Alice@Example.com")),
            user_config("bob", None),
        ])
        .unwrap();

        assert_eq!(store.len(), 2);

        let by_name = store.find_by_login("alice").await.unwrap().unwrap();
        assert_eq!(by_name.id, "id-alice");

        let by_email = store.find_by_login("alice@example.com").await.unwrap().unwrap();
        assert_eq!(by_email.username, "alice");

        assert!(store.find_by_login("ALICE").await.unwrap().is_none());
        assert!(store.find_by_login("carol").await.unwrap().is_none());
    }

    #[test]
    fn test_rejects_duplicate_usernames() {
        let err = InMemoryCredentialStore::from_config(&[
            user_config("alice", None),
            user_config("alice", None),
        ])
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidUser(_)));
    }

    #[test]
    fn test_rejects_plaintext_password() {
        let mut user = user_config("alice", None);
        user.password_hash = "hunter2".to_string();
        let err = InMemoryCredentialStore::from_config(&[user]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidUser(_)));
        assert!(!err.to_string().contains("hunter2"));
    }

    #[test]
    fn test_password_hash_is_not_serialized() {
        let record = UserRecord {
            id: "u-1".to_string(),
            username: "alice".to_string(),
            email: None,
            password_hash: "$2b$04$secret".to_string(),
            role: "Member".to_string(),
        };
        let json = serde_json::to_string(&record).unwrap();
        assert!(!json.contains("password"));
    }
}
