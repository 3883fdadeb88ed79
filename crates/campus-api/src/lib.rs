//! HTTP API for the campus event registration service.
//!
//! This crate provides an Axum server exposing events, registrations,
//! accounts and the seat-accounting audit as JSON over REST. All state
//! lives behind a [`CampusStore`](campus_registry::CampusStore) chosen at
//! startup, so the same router serves the in-memory and `PostgreSQL`
//! backends.
//!
//! The acting user travels with each request in the `X-User-Id` header
//! and is resolved by the [`ActingUser`] extractor. Event and account
//! management need an administrator, resolved by [`AdminUser`].

pub mod error;
pub mod extract;
pub mod handlers;
pub mod router;
pub mod server;
pub mod state;

// Re-export primary types for convenience.
pub use error::ApiError;
pub use extract::{ActingUser, AdminUser, USER_HEADER};
pub use router::build_router;
pub use server::{ServerConfig, ServerError, start_server};
pub use state::AppState;
