//! Event store, registration ledger and seat accounting for the campus
//! event registration service.
//!
//! Every registration occupies one seat of one event. The registry keeps
//! each event's `registered` counter in lockstep with its registrations:
//!
//! ```text
//! for every event E:
//!   E.registered == count(active registrations of E)
//!   0 <= E.registered <= E.capacity
//! for every (event, user):
//!   at most one active registration
//! ```
//!
//! # Modules
//!
//! - [`event_store`] -- Events, each behind its own slot lock.
//! - [`ledger`] -- Registrations and the only code that moves seat counters.
//! - [`accounts`] -- User accounts with unique student numbers.
//! - [`audit`] -- Checks the laws above over a snapshot.
//! - [`store`] -- The [`CampusStore`] backend trait and the in-memory backend.
//!
//! # Concurrency
//!
//! Registration and cancellation on the same event are serialized by the
//! event's slot lock, so `N` concurrent registrations against `C` free seats
//! admit exactly `min(N, C)` of them. Operations on different events run in
//! parallel.
//!
//! # Usage
//!
//! ```
//! use campus_registry::{CampusStore, MemoryStore, RegistryError};
//! use campus_types::{NewEvent, UserId};
//! use chrono::{NaiveDate, NaiveTime};
//!
//! # tokio_test_block(async {
//! let store = MemoryStore::new();
//! let event = store
//!     .create_event(NewEvent {
//!         title: "Robotics Club".into(),
//!         date: NaiveDate::from_ymd_opt(2026, 11, 12),
//!         time: NaiveTime::from_hms_opt(16, 0, 0),
//!         location: "Lab 3".into(),
//!         capacity: Some(1),
//!         ..NewEvent::default()
//!     })
//!     .await?;
//!
//! store.register(event.id, UserId::new()).await?;
//! let full = store.register(event.id, UserId::new()).await;
//! assert!(matches!(full, Err(RegistryError::CapacityExceeded { .. })));
//! # Ok::<(), RegistryError>(())
//! # });
//! # fn tokio_test_block<F: std::future::Future>(f: F) -> F::Output {
//! #     tokio::runtime::Builder::new_current_thread().build().map(|rt| rt.block_on(f)).unwrap_or_else(|e| panic!("{e}"))
//! # }
//! ```

pub mod accounts;
pub mod audit;
pub mod error;
pub mod event_store;
pub mod ledger;
pub mod store;

pub use accounts::AccountDirectory;
pub use audit::{AuditResult, InvariantViolation, verify_invariants};
pub use error::RegistryError;
pub use event_store::{EventStore, sort_by_schedule};
pub use ledger::RegistrationLedger;
pub use store::{CampusStore, MemoryStore};
