use serde::Serialize;

use super::claims::ClaimSet;

/// Administrator role name
pub const ADMIN_ROLE: &str = "Admin";

/// Authenticated caller, attached to the request after verification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Principal {
    pub subject: String,
    pub role: String,
    pub user_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_id: Option<String>,
    pub expires_at: i64,
}

impl Principal {
    pub fn has_role(&self, role: &str) -> bool {
        self.role.eq_ignore_ascii_case(role)
    }

    pub fn is_admin(&self) -> bool {
        self.has_role(ADMIN_ROLE)
    }
}

impl From<ClaimSet> for Principal {
    fn from(claims: ClaimSet) -> Self {
        Self {
            subject: claims.subject,
            role: claims.role,
            user_id: claims.user_id,
            token_id: claims.token_id,
            expires_at: claims.expires_at,
        }
    }
}
