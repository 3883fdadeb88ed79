//! `PostgreSQL` storage backend for the campus event registration service.
//!
//! # Modules
//!
//! - [`postgres`] -- Connection pool, configuration and migrations
//! - [`event_store`] -- The `events` table
//! - [`registration_store`] -- The `registrations` table and seat counter
//! - [`user_store`] -- The `users` table
//! - [`store`] -- [`PgCampusStore`], the `CampusStore` implementation
//! - [`error`] -- Shared error types

pub mod error;
pub mod event_store;
pub mod postgres;
pub mod registration_store;
pub mod store;
pub mod user_store;

// Re-export primary types for convenience.
pub use error::DbError;
pub use event_store::{EventRow, EventStore};
pub use postgres::{PostgresConfig, PostgresPool};
pub use registration_store::{RegistrationRow, RegistrationStore};
pub use store::PgCampusStore;
pub use user_store::{UserRow, UserStore};
