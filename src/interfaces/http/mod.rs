//! HTTP REST API interfaces
//!
//! - `middleware`: authentication gate and admin role check
//! - `modules`: request handlers grouped by resource
//! - `router`: API router and shared state

pub mod common;
pub mod middleware;
pub mod modules;
pub mod router;

pub use router::{create_api_router, AppState};
