//! Shared type definitions for the campus event registration service.
//!
//! This crate is the single source of truth for the entities exchanged
//! between the registry core, the storage backends and the HTTP API. Types
//! flow to `TypeScript` via `ts-rs` for the browser client.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe UUID wrappers for events, registrations and users
//! - [`enums`] -- Event categories and account roles
//! - [`structs`] -- Events, registrations and user accounts
//! - [`requests`] -- Validated input payloads and list filters

pub mod enums;
pub mod ids;
pub mod requests;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use enums::{Category, Role};
pub use ids::{EventId, RegistrationId, UserId};
pub use requests::{EventFilter, NewEvent, NewUser, RegisterRequest};
pub use structs::{Event, Registration, User};

/// Re-exported so callers can inspect validation failures without a direct
/// dependency on `validator`.
pub use validator::ValidationErrors;
