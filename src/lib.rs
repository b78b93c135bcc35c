//! # Token Gate
//!
//! Stateless bearer-token authentication for HTTP services: HS256-signed,
//! JWT-shaped tokens issued at login and checked by a per-request gate.
//!
//! ## Architecture
//!
//! - **auth**: token protocol (codec, claims, secret, issuer, verifier, gate)
//! - **application**: login use-case and credential store
//! - **interfaces**: axum router, gate middleware and handlers
//! - **shared**: clock and shutdown plumbing
//! - **config** / **server**: startup validation and service lifecycle

pub mod application;
pub mod auth;
pub mod config;
pub mod interfaces;
pub mod server;
pub mod shared;

pub use config::{default_config_path, AppConfig, AuthSettings, ConfigError};
pub use server::{build_router, init_tracing, ServerError, ServerHandle, ServerOptions};
