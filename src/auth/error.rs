use thiserror::Error;

/// Issuance preconditions that were not met.
#[derive(Debug, Error)]
pub enum IssueError {
    #[error("claim '{0}' must not be empty")]
    EmptyClaim(&'static str),

    #[error("expiration {expires_at} is not after issued-at {issued_at}")]
    InvalidLifetime { issued_at: i64, expires_at: i64 },

    #[error("claims serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Why a presented token was not accepted.
///
/// Internal only: clients always see the same generic 401.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VerifyError {
    #[error("token is not three base64-url segments")]
    Malformed,

    #[error("unsupported token header")]
    UnsupportedAlgorithm,

    #[error("signature mismatch")]
    SignatureMismatch,

    #[error("payload is not a valid claim set")]
    MalformedPayload,

    #[error("token expired")]
    Expired,

    #[error("missing claim '{0}'")]
    MissingClaim(&'static str),
}

impl VerifyError {
    /// Short stable label for logs.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::Malformed => "malformed",
            Self::UnsupportedAlgorithm => "unsupported_algorithm",
            Self::SignatureMismatch => "signature_mismatch",
            Self::MalformedPayload => "malformed_payload",
            Self::Expired => "expired",
            Self::MissingClaim(_) => "missing_claim",
        }
    }
}
