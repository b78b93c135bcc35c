pub mod identity;

pub use identity::{AuthResult, CredentialStore, IdentityError, IdentityService};
