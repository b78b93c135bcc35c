//! Identity module: credential lookup and login
//!
//! `IdentityService` checks a username/email and password against a
//! [`CredentialStore`] and issues a bearer token for the matching user.

pub mod credentials;
pub mod service;

pub use credentials::{CredentialStore, InMemoryCredentialStore, UserRecord};
pub use service::{AuthResult, IdentityError, IdentityService};
