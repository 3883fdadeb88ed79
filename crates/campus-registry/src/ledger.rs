//! The registration ledger: who holds which seat.
//!
//! [`RegistrationLedger`] keeps every active [`Registration`] and is the
//! only code that moves an event's `registered` counter. A registration or
//! cancellation runs entirely under the event's slot lock:
//!
//! ```text
//! lock slot(event)
//!   check event is live             -> EventNotFound
//!   check registered < capacity     -> CapacityExceeded
//!   lock book
//!     check (event, user) is free   -> DuplicateRegistration
//!     insert registration
//!   registered += 1
//! unlock
//! ```
//!
//! Cancellation re-reads the registration under the slot lock before it
//! touches the counter, so of two racing cancels exactly one releases the
//! seat and the other sees `RegistrationNotFound`.
//!
//! Every fallible step happens before the first write, so a rejected
//! request leaves both the book and the counter untouched.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use campus_types::{EventId, Registration, RegistrationId, UserId};
use tokio::sync::RwLock;

use crate::error::RegistryError;
use crate::event_store::EventStore;

/// Active registrations, indexed by id and by (event, user) seat.
#[derive(Debug, Default)]
struct Book {
    by_id: BTreeMap<RegistrationId, Registration>,
    by_seat: BTreeMap<(EventId, UserId), RegistrationId>,
}

/// Ledger of active registrations, bound to the event store whose seat
/// counters it maintains.
#[derive(Debug)]
pub struct RegistrationLedger {
    events: Arc<EventStore>,
    book: RwLock<Book>,
}

impl RegistrationLedger {
    /// Create an empty ledger over `events`.
    pub fn new(events: Arc<EventStore>) -> Self {
        Self {
            events,
            book: RwLock::new(Book::default()),
        }
    }

    /// The event store this ledger maintains.
    pub const fn events(&self) -> &Arc<EventStore> {
        &self.events
    }

    /// Give `user_id` a seat at `event_id`.
    ///
    /// # Errors
    ///
    /// - [`RegistryError::EventNotFound`] if the event does not exist.
    /// - [`RegistryError::CapacityExceeded`] if every seat is taken.
    /// - [`RegistryError::DuplicateRegistration`] if the user already holds
    ///   a seat at this event.
    pub async fn register(
        &self,
        event_id: EventId,
        user_id: UserId,
    ) -> Result<Registration, RegistryError> {
        let slot = self.events.slot(event_id).await?;
        let mut guard = slot.lock().await;

        let next = guard.count_after_admit().inspect_err(|e| {
            tracing::warn!(%event_id, %user_id, error = %e, "Registration rejected");
        })?;

        let registration = {
            let mut book = self.book.write().await;
            if book.by_seat.contains_key(&(event_id, user_id)) {
                tracing::warn!(%event_id, %user_id, "Duplicate registration rejected");
                return Err(RegistryError::DuplicateRegistration { event_id, user_id });
            }

            let registration = Registration::new(event_id, user_id);
            book.by_seat.insert((event_id, user_id), registration.id);
            book.by_id.insert(registration.id, registration.clone());
            registration
        };
        guard.set_registered(next);

        tracing::info!(
            registration_id = %registration.id,
            %event_id,
            %user_id,
            registered = next,
            "Registration created"
        );
        Ok(registration)
    }

    /// Release the seat held by `registration_id`.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::RegistrationNotFound`] if there is no such
    /// registration (including one that was cancelled concurrently).
    pub async fn cancel(&self, registration_id: RegistrationId) -> Result<(), RegistryError> {
        let event_id = self
            .book
            .read()
            .await
            .by_id
            .get(&registration_id)
            .map(|r| r.event_id)
            .ok_or(RegistryError::RegistrationNotFound(registration_id))?;

        let slot = match self.events.slot(event_id).await {
            Ok(slot) => slot,
            Err(e) => {
                // Cancelled and its event deleted since the lookup above.
                if !self.book.read().await.by_id.contains_key(&registration_id) {
                    return Err(RegistryError::RegistrationNotFound(registration_id));
                }
                return Err(RegistryError::Storage(format!(
                    "registration {registration_id} references a missing event: {e}"
                )));
            }
        };
        let mut guard = slot.lock().await;

        // A concurrent cancel may have won the slot first; only the one that
        // still finds the registration releases a seat.
        let next = {
            let mut book = self.book.write().await;
            let Some(seat) = book
                .by_id
                .get(&registration_id)
                .map(|r| (r.event_id, r.user_id))
            else {
                return Err(RegistryError::RegistrationNotFound(registration_id));
            };
            let next = guard.count_after_release()?;
            book.by_id.remove(&registration_id);
            book.by_seat.remove(&seat);
            next
        };
        guard.set_registered(next);

        tracing::info!(%registration_id, %event_id, registered = next, "Registration cancelled");
        Ok(())
    }

    /// Fetch a single registration.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::RegistrationNotFound`] if there is no such
    /// registration.
    pub async fn get(&self, registration_id: RegistrationId) -> Result<Registration, RegistryError> {
        self.book
            .read()
            .await
            .by_id
            .get(&registration_id)
            .cloned()
            .ok_or(RegistryError::RegistrationNotFound(registration_id))
    }

    /// Registrations held by `user_id`, newest first.
    pub async fn list_by_user(&self, user_id: UserId) -> Vec<Registration> {
        let mut registrations: Vec<Registration> = self
            .book
            .read()
            .await
            .by_id
            .values()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect();
        registrations.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        registrations
    }

    /// Registrations for `event_id`, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::EventNotFound`] if the event does not exist.
    pub async fn list_by_event(
        &self,
        event_id: EventId,
    ) -> Result<Vec<Registration>, RegistryError> {
        self.events.get(event_id).await?;

        let mut registrations: Vec<Registration> = self
            .book
            .read()
            .await
            .by_id
            .values()
            .filter(|r| r.event_id == event_id)
            .cloned()
            .collect();
        registrations.sort_by(|a, b| (a.created_at, a.id).cmp(&(b.created_at, b.id)));
        Ok(registrations)
    }

    /// Number of active registrations across all events.
    pub async fn len(&self) -> usize {
        self.book.read().await.by_id.len()
    }

    /// Whether no registrations are active.
    pub async fn is_empty(&self) -> bool {
        self.book.read().await.by_id.is_empty()
    }

    /// Registrations an audit over the `frozen` events should see: those of
    /// frozen events plus those whose event no longer exists at all.
    /// Registrations of events created after the freeze are left out.
    ///
    /// The caller must hold the slot lock of every frozen event.
    pub(crate) async fn snapshot_for(&self, frozen: &BTreeSet<EventId>) -> Vec<Registration> {
        let present = self.events.slot_map().await;
        let book = self.book.read().await;
        book.by_id
            .values()
            .filter(|r| frozen.contains(&r.event_id) || !present.contains_key(&r.event_id))
            .cloned()
            .collect()
    }
}

#[cfg(test)]
#[allow(clippy::panic, clippy::arithmetic_side_effects)]
mod tests {
    use campus_types::{Category, Event, NewEvent};
    use chrono::{NaiveDate, NaiveTime};
    use tokio::task::JoinSet;

    use super::*;

    async fn ledger_with_event(capacity: u32) -> (Arc<RegistrationLedger>, Event) {
        let events = Arc::new(EventStore::new());
        let created = events
            .create(NewEvent {
                title: String::from("Spring Concert"),
                description: String::new(),
                date: NaiveDate::from_ymd_opt(2027, 4, 18),
                time: NaiveTime::from_hms_opt(20, 0, 0),
                location: String::from("Open Air Stage"),
                capacity: Some(capacity),
                category: Category::Social,
            })
            .await;
        let event = created.unwrap_or_else(|e| panic!("event setup failed: {e}"));
        (Arc::new(RegistrationLedger::new(events)), event)
    }

    async fn registered(ledger: &RegistrationLedger, event_id: EventId) -> u32 {
        ledger.events().get(event_id).await.map(|e| e.registered).unwrap_or(u32::MAX)
    }

    #[tokio::test]
    async fn register_takes_one_seat() {
        let (ledger, event) = ledger_with_event(3).await;
        let user = UserId::new();

        let result = ledger.register(event.id, user).await;
        assert!(result.is_ok());
        if let Ok(reg) = result {
            assert_eq!(reg.event_id, event.id);
            assert_eq!(reg.user_id, user);
        }
        assert_eq!(registered(&ledger, event.id).await, 1);
        assert_eq!(ledger.len().await, 1);
    }

    #[tokio::test]
    async fn register_unknown_event_is_not_found() {
        let (ledger, _) = ledger_with_event(3).await;
        let result = ledger.register(EventId::new(), UserId::new()).await;
        assert!(matches!(result, Err(RegistryError::EventNotFound(_))));
        assert!(ledger.is_empty().await);
    }

    #[tokio::test]
    async fn full_event_rejects_without_creating_registration() {
        let (ledger, event) = ledger_with_event(2).await;
        assert!(ledger.register(event.id, UserId::new()).await.is_ok());
        assert!(ledger.register(event.id, UserId::new()).await.is_ok());

        let result = ledger.register(event.id, UserId::new()).await;
        assert!(matches!(
            result,
            Err(RegistryError::CapacityExceeded { capacity: 2, .. })
        ));
        assert_eq!(registered(&ledger, event.id).await, 2);
        assert_eq!(ledger.len().await, 2);
    }

    #[tokio::test]
    async fn second_registration_by_same_user_is_duplicate() {
        let (ledger, event) = ledger_with_event(5).await;
        let user = UserId::new();

        assert!(ledger.register(event.id, user).await.is_ok());
        let again = ledger.register(event.id, user).await;
        assert!(matches!(
            again,
            Err(RegistryError::DuplicateRegistration { user_id, .. }) if user_id == user
        ));
        assert_eq!(registered(&ledger, event.id).await, 1);
    }

    #[tokio::test]
    async fn cancel_releases_seat_and_hides_registration() {
        let (ledger, event) = ledger_with_event(5).await;
        let user = UserId::new();
        let reg = ledger.register(event.id, user).await;
        assert!(reg.is_ok());
        let Ok(reg) = reg else { return };

        assert!(ledger.cancel(reg.id).await.is_ok());
        assert_eq!(registered(&ledger, event.id).await, 0);
        assert!(ledger.list_by_user(user).await.is_empty());
        assert_eq!(ledger.list_by_event(event.id).await.map(|r| r.len()).ok(), Some(0));

        let twice = ledger.cancel(reg.id).await;
        assert!(matches!(twice, Err(RegistryError::RegistrationNotFound(id)) if id == reg.id));
        assert_eq!(registered(&ledger, event.id).await, 0);
    }

    #[tokio::test]
    async fn cancelled_user_may_register_again() {
        let (ledger, event) = ledger_with_event(1).await;
        let user = UserId::new();
        let first = ledger.register(event.id, user).await;
        assert!(first.is_ok());
        if let Ok(reg) = first {
            assert!(ledger.cancel(reg.id).await.is_ok());
        }
        assert!(ledger.register(event.id, user).await.is_ok());
    }

    #[tokio::test]
    async fn single_seat_scenario() {
        let (ledger, event) = ledger_with_event(1).await;
        let alice = UserId::new();
        let bob = UserId::new();

        let alice_reg = ledger.register(event.id, alice).await;
        assert!(alice_reg.is_ok());
        assert_eq!(registered(&ledger, event.id).await, 1);

        assert!(matches!(
            ledger.register(event.id, bob).await,
            Err(RegistryError::CapacityExceeded { .. })
        ));

        if let Ok(reg) = alice_reg {
            assert!(ledger.cancel(reg.id).await.is_ok());
        }
        assert_eq!(registered(&ledger, event.id).await, 0);

        assert!(ledger.register(event.id, bob).await.is_ok());
        assert_eq!(registered(&ledger, event.id).await, 1);
    }

    #[tokio::test]
    async fn list_by_user_is_newest_first() {
        let events = Arc::new(EventStore::new());
        let mut ids = Vec::new();
        for day in 1..=3 {
            let created = events
                .create(NewEvent {
                    title: format!("Lecture {day}"),
                    description: String::new(),
                    date: NaiveDate::from_ymd_opt(2026, 11, day),
                    time: NaiveTime::from_hms_opt(9, 0, 0),
                    location: String::from("Room 101"),
                    capacity: Some(10),
                    category: Category::Academic,
                })
                .await;
            let event = created.unwrap_or_else(|e| panic!("event setup failed: {e}"));
            ids.push(event.id);
        }
        let ledger = RegistrationLedger::new(events);
        let user = UserId::new();
        let mut made = Vec::new();
        for id in &ids {
            let reg = ledger.register(*id, user).await;
            let reg = reg.unwrap_or_else(|e| panic!("registration failed: {e}"));
            made.push(reg.id);
        }
        made.reverse();
        assert_eq!(made.len(), 3);

        let listed: Vec<RegistrationId> =
            ledger.list_by_user(user).await.into_iter().map(|r| r.id).collect();
        assert_eq!(listed, made);
        assert!(ledger.list_by_user(UserId::new()).await.is_empty());
    }

    #[tokio::test]
    async fn list_by_event_unknown_event_is_not_found() {
        let (ledger, _) = ledger_with_event(1).await;
        let result = ledger.list_by_event(EventId::new()).await;
        assert!(matches!(result, Err(RegistryError::EventNotFound(_))));
    }

    #[tokio::test]
    async fn event_with_registrations_cannot_be_deleted() {
        let (ledger, event) = ledger_with_event(2).await;
        let reg = ledger.register(event.id, UserId::new()).await;
        assert!(reg.is_ok());

        let refused = ledger.events().delete(event.id).await;
        assert!(matches!(
            refused,
            Err(RegistryError::EventInUse { registered: 1, .. })
        ));

        if let Ok(reg) = reg {
            assert!(ledger.cancel(reg.id).await.is_ok());
        }
        assert!(ledger.events().delete(event.id).await.is_ok());
        assert!(matches!(
            ledger.register(event.id, UserId::new()).await,
            Err(RegistryError::EventNotFound(_))
        ));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_registrations_never_overshoot_capacity() {
        const CAPACITY: u32 = 7;
        const REQUESTS: usize = 64;

        let (ledger, event) = ledger_with_event(CAPACITY).await;
        let mut tasks = JoinSet::new();
        for _ in 0..REQUESTS {
            let ledger = Arc::clone(&ledger);
            tasks.spawn(async move { ledger.register(event.id, UserId::new()).await });
        }

        let mut admitted = 0_u32;
        let mut refused = 0_usize;
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(Ok(_)) => admitted += 1,
                Ok(Err(RegistryError::CapacityExceeded { .. })) => refused += 1,
                other => panic!("unexpected outcome: {other:?}"),
            }
        }

        assert_eq!(admitted, CAPACITY);
        assert_eq!(refused, REQUESTS - CAPACITY as usize);
        assert_eq!(registered(&ledger, event.id).await, CAPACITY);
        assert_eq!(ledger.len().await, CAPACITY as usize);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_duplicates_admit_exactly_one() {
        let (ledger, event) = ledger_with_event(50).await;
        let user = UserId::new();
        let mut tasks = JoinSet::new();
        for _ in 0..16 {
            let ledger = Arc::clone(&ledger);
            tasks.spawn(async move { ledger.register(event.id, user).await });
        }

        let mut admitted = 0;
        let mut duplicates = 0;
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(Ok(_)) => admitted += 1,
                Ok(Err(RegistryError::DuplicateRegistration { .. })) => duplicates += 1,
                other => panic!("unexpected outcome: {other:?}"),
            }
        }

        assert_eq!(admitted, 1);
        assert_eq!(duplicates, 15);
        assert_eq!(registered(&ledger, event.id).await, 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn racing_cancels_release_the_last_seat_once() {
        let (ledger, event) = ledger_with_event(1).await;
        let reg = ledger.register(event.id, UserId::new()).await;
        let reg = reg.unwrap_or_else(|e| panic!("registration failed: {e}"));

        // Park both cancels behind the event's slot so they contend for it.
        let Ok(slot) = ledger.events().slot(event.id).await else {
            panic!("slot lookup failed");
        };
        let held = slot.lock().await;
        let first = tokio::spawn({
            let ledger = Arc::clone(&ledger);
            async move { ledger.cancel(reg.id).await }
        });
        let second = tokio::spawn({
            let ledger = Arc::clone(&ledger);
            async move { ledger.cancel(reg.id).await }
        });
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        drop(held);

        let outcomes = [first.await, second.await];
        let released = outcomes
            .iter()
            .filter(|o| matches!(o, Ok(Ok(()))))
            .count();
        let not_found = outcomes
            .iter()
            .filter(|o| matches!(o, Ok(Err(RegistryError::RegistrationNotFound(id))) if *id == reg.id))
            .count();
        assert_eq!((released, not_found), (1, 1), "outcomes: {outcomes:?}");
        assert_eq!(registered(&ledger, event.id).await, 0);
        assert!(ledger.is_empty().await);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn cancel_racing_register_keeps_counter_in_step() {
        for _ in 0..32 {
            let (ledger, event) = ledger_with_event(1).await;
            let holder = ledger.register(event.id, UserId::new()).await;
            let holder = holder.unwrap_or_else(|e| panic!("registration failed: {e}"));

            let cancel = tokio::spawn({
                let ledger = Arc::clone(&ledger);
                async move { ledger.cancel(holder.id).await }
            });
            let register = tokio::spawn({
                let ledger = Arc::clone(&ledger);
                async move { ledger.register(event.id, UserId::new()).await }
            });

            let cancelled = cancel.await;
            assert!(matches!(cancelled, Ok(Ok(()))), "cancel: {cancelled:?}");
            let admitted: u32 = match register.await {
                Ok(Ok(_)) => 1,
                Ok(Err(RegistryError::CapacityExceeded { .. })) => 0,
                other => panic!("unexpected outcome: {other:?}"),
            };

            let listed = ledger.list_by_event(event.id).await.map(|r| r.len()).ok();
            assert_eq!(listed, Some(admitted as usize));
            assert_eq!(registered(&ledger, event.id).await, admitted);
        }
    }
}
