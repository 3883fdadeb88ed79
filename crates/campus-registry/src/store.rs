//! The storage seam between the HTTP layer and the backends.
//!
//! [`CampusStore`] is implemented by [`MemoryStore`] here and by the
//! `PostgreSQL` store in `campus-db`. Both guarantee that a failed call
//! leaves no partial state behind.

use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;
use campus_types::{
    Event, EventFilter, EventId, NewEvent, NewUser, Registration, RegistrationId, User, UserId,
};

use crate::accounts::AccountDirectory;
use crate::audit::{AuditResult, verify_invariants};
use crate::error::RegistryError;
use crate::event_store::EventStore;
use crate::ledger::RegistrationLedger;

/// Everything the service needs from a storage backend.
#[async_trait]
pub trait CampusStore: Send + Sync {
    /// Validate and add a new event with no registrations.
    async fn create_event(&self, draft: NewEvent) -> Result<Event, RegistryError>;

    /// Fetch one event.
    async fn get_event(&self, event_id: EventId) -> Result<Event, RegistryError>;

    /// Events passing `filter`, ordered by date, then time.
    async fn list_events(&self, filter: EventFilter) -> Result<Vec<Event>, RegistryError>;

    /// Delete an event that has no active registrations.
    async fn delete_event(&self, event_id: EventId) -> Result<(), RegistryError>;

    /// Give `user_id` a seat at `event_id`.
    async fn register(
        &self,
        event_id: EventId,
        user_id: UserId,
    ) -> Result<Registration, RegistryError>;

    /// Release the seat held by `registration_id`.
    async fn cancel(&self, registration_id: RegistrationId) -> Result<(), RegistryError>;

    /// Fetch one registration.
    async fn get_registration(
        &self,
        registration_id: RegistrationId,
    ) -> Result<Registration, RegistryError>;

    /// Registrations held by `user_id`, newest first.
    async fn list_by_user(&self, user_id: UserId) -> Result<Vec<Registration>, RegistryError>;

    /// Registrations for `event_id`, oldest first.
    async fn list_by_event(&self, event_id: EventId) -> Result<Vec<Registration>, RegistryError>;

    /// Validate and add a user account.
    async fn create_user(&self, input: NewUser) -> Result<User, RegistryError>;

    /// Fetch one user account.
    async fn get_user(&self, user_id: UserId) -> Result<User, RegistryError>;

    /// The account holding a student number.
    async fn find_user_by_student_no(&self, student_no: &str) -> Result<User, RegistryError>;

    /// Every user account, ordered by name.
    async fn list_users(&self) -> Result<Vec<User>, RegistryError>;

    /// Check the seat-accounting laws over a consistent snapshot.
    async fn audit(&self) -> Result<AuditResult, RegistryError>;
}

/// Process-local backend. State is lost on restart.
#[derive(Debug)]
pub struct MemoryStore {
    ledger: RegistrationLedger,
    accounts: AccountDirectory,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            ledger: RegistrationLedger::new(Arc::new(EventStore::new())),
            accounts: AccountDirectory::new(),
        }
    }

    fn events(&self) -> &EventStore {
        self.ledger.events()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CampusStore for MemoryStore {
    async fn create_event(&self, draft: NewEvent) -> Result<Event, RegistryError> {
        self.events().create(draft).await
    }

    async fn get_event(&self, event_id: EventId) -> Result<Event, RegistryError> {
        self.events().get(event_id).await
    }

    async fn list_events(&self, filter: EventFilter) -> Result<Vec<Event>, RegistryError> {
        Ok(self.events().list(filter).await)
    }

    async fn delete_event(&self, event_id: EventId) -> Result<(), RegistryError> {
        self.events().delete(event_id).await
    }

    async fn register(
        &self,
        event_id: EventId,
        user_id: UserId,
    ) -> Result<Registration, RegistryError> {
        self.ledger.register(event_id, user_id).await
    }

    async fn cancel(&self, registration_id: RegistrationId) -> Result<(), RegistryError> {
        self.ledger.cancel(registration_id).await
    }

    async fn get_registration(
        &self,
        registration_id: RegistrationId,
    ) -> Result<Registration, RegistryError> {
        self.ledger.get(registration_id).await
    }

    async fn list_by_user(&self, user_id: UserId) -> Result<Vec<Registration>, RegistryError> {
        Ok(self.ledger.list_by_user(user_id).await)
    }

    async fn list_by_event(&self, event_id: EventId) -> Result<Vec<Registration>, RegistryError> {
        self.ledger.list_by_event(event_id).await
    }

    async fn create_user(&self, input: NewUser) -> Result<User, RegistryError> {
        self.accounts.create(input).await
    }

    async fn get_user(&self, user_id: UserId) -> Result<User, RegistryError> {
        self.accounts.get(user_id).await
    }

    async fn find_user_by_student_no(&self, student_no: &str) -> Result<User, RegistryError> {
        self.accounts.find_by_student_no(student_no).await
    }

    async fn list_users(&self) -> Result<Vec<User>, RegistryError> {
        Ok(self.accounts.list().await)
    }

    async fn audit(&self) -> Result<AuditResult, RegistryError> {
        // Holding every slot freezes those counters and their registrations.
        // Events created after the slot list was taken are not frozen and
        // stay out of this audit.
        let slots = self.events().all_slots().await;
        let mut guards = Vec::with_capacity(slots.len());
        for slot in &slots {
            guards.push(slot.lock().await);
        }

        let events: Vec<Event> = guards
            .iter()
            .filter_map(|g| g.live().ok().cloned())
            .collect();
        let frozen: BTreeSet<EventId> = events.iter().map(|e| e.id).collect();
        let registrations = self.ledger.snapshot_for(&frozen).await;
        drop(guards);

        Ok(verify_invariants(&events, &registrations))
    }
}
