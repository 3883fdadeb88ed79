//! Error types for the registry core.
//!
//! [`RegistryError`] is the single error type returned by every event,
//! registration and account operation, whichever backend serves it. All
//! variants are recoverable and meant to be reported to the caller.

use campus_types::{EventId, RegistrationId, UserId, ValidationErrors};

/// Errors returned by registry operations.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// The event does not exist (or was deleted).
    #[error("event {0} not found")]
    EventNotFound(EventId),

    /// The registration does not exist (or was already cancelled).
    #[error("registration {0} not found")]
    RegistrationNotFound(RegistrationId),

    /// The user account does not exist.
    #[error("user {0} not found")]
    UserNotFound(UserId),

    /// No account has this student number.
    #[error("no account with student number {0}")]
    StudentNotFound(String),

    /// Every seat of the event is taken.
    #[error("event {event_id} is full ({capacity} seats)")]
    CapacityExceeded {
        /// The full event.
        event_id: EventId,
        /// Its capacity.
        capacity: u32,
    },

    /// The user already holds a seat at the event.
    #[error("user {user_id} is already registered for event {event_id}")]
    DuplicateRegistration {
        /// The event.
        event_id: EventId,
        /// The user holding the existing registration.
        user_id: UserId,
    },

    /// Another account already uses this student number.
    #[error("student number {0} is already in use")]
    DuplicateStudentNo(String),

    /// The event cannot be deleted while registrations reference it.
    #[error("event {event_id} still has {registered} registration(s)")]
    EventInUse {
        /// The event.
        event_id: EventId,
        /// Number of active registrations.
        registered: u32,
    },

    /// Malformed create-event or create-account input.
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationErrors),

    /// The storage layer failed. No partial state was written.
    #[error("storage error: {0}")]
    Storage(String),
}

impl RegistryError {
    /// Whether the error means the addressed entity does not exist.
    pub const fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::EventNotFound(_)
                | Self::RegistrationNotFound(_)
                | Self::UserNotFound(_)
                | Self::StudentNotFound(_)
        )
    }
}
