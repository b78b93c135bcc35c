//! Bearer token protocol
//!
//! HS256-signed, JWT-shaped tokens: base64url codec, claim set, signing
//! secret, issuance, verification and the per-request authentication gate.

pub mod claims;
pub mod codec;
pub mod error;
pub mod gate;
pub mod issuer;
pub mod password;
pub mod principal;
pub mod secret;
pub mod token;
pub mod verifier;

pub use claims::ClaimSet;
pub use error::{IssueError, VerifyError};
pub use gate::{AuthenticationGate, GateDecision, PublicRoutes, Rejection};
pub use issuer::{issue, TokenIdGenerator, TokenIssuer, UuidTokenIds};
pub use password::{hash_password, verify_password};
pub use principal::{Principal, ADMIN_ROLE};
pub use secret::{generate_secret_hex, SecretKey, MIN_SECRET_LEN};
pub use token::Token;
pub use verifier::{verify, TokenVerifier};
