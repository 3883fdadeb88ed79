//! In-memory event store.
//!
//! Every event lives in its own [`EventSlot`] behind a [`Mutex`]. The slot
//! lock is the serialization point for everything that touches the
//! event's seat counter: registration, cancellation and deletion all hold
//! it for their whole check-then-act sequence, so operations on different
//! events never contend.
//!
//! # Lock order
//!
//! A slot lock may be held while taking the slot map lock or the ledger
//! book lock, never the other way around. Code that needs several slots
//! clones the `Arc`s out of the map first and then locks them in id order.
//! The audit, holding every slot, reads the map and then the book; nothing
//! waits on the map while holding the book.

use std::collections::BTreeMap;
use std::sync::Arc;

use campus_types::{Event, EventFilter, EventId, NewEvent};
use tokio::sync::{Mutex, RwLock, RwLockReadGuard};

use crate::error::RegistryError;

// ---------------------------------------------------------------------------
// Event slot
// ---------------------------------------------------------------------------

/// One event plus its liveness flag.
///
/// `removed` is set under the slot lock before the slot leaves the map, so
/// a caller that fetched the slot just before deletion still sees the
/// event as gone once it gets the lock.
#[derive(Debug)]
pub(crate) struct EventSlot {
    event: Event,
    removed: bool,
}

impl EventSlot {
    fn new(event: Event) -> Self {
        Self {
            event,
            removed: false,
        }
    }

    /// The event, or `EventNotFound` if it was deleted.
    pub(crate) fn live(&self) -> Result<&Event, RegistryError> {
        if self.removed {
            return Err(RegistryError::EventNotFound(self.event.id));
        }
        Ok(&self.event)
    }

    /// The seat count after admitting one more registration.
    pub(crate) fn count_after_admit(&self) -> Result<u32, RegistryError> {
        let event = self.live()?;
        if event.is_full() {
            return Err(RegistryError::CapacityExceeded {
                event_id: event.id,
                capacity: event.capacity,
            });
        }
        event.registered.checked_add(1).ok_or_else(|| {
            RegistryError::Storage(format!("seat counter overflow on event {}", event.id))
        })
    }

    /// The seat count after releasing one registration.
    pub(crate) fn count_after_release(&self) -> Result<u32, RegistryError> {
        let event = self.live()?;
        event.registered.checked_sub(1).ok_or_else(|| {
            RegistryError::Storage(format!(
                "event {} has no seats to release",
                event.id
            ))
        })
    }

    /// Overwrite the seat count. Only the registration ledger calls this,
    /// with a value from [`count_after_admit`] or [`count_after_release`].
    ///
    /// [`count_after_admit`]: EventSlot::count_after_admit
    /// [`count_after_release`]: EventSlot::count_after_release
    pub(crate) fn set_registered(&mut self, registered: u32) {
        self.event.registered = registered;
    }
}

// ---------------------------------------------------------------------------
// Event store
// ---------------------------------------------------------------------------

/// In-memory store of campus events.
#[derive(Debug, Default)]
pub struct EventStore {
    slots: RwLock<BTreeMap<EventId, Arc<Mutex<EventSlot>>>>,
}

impl EventStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate `draft` and add it as a new event with no registrations.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Validation`] if a required field is
    /// missing or malformed.
    pub async fn create(&self, draft: NewEvent) -> Result<Event, RegistryError> {
        let event = draft.into_event()?;
        self.slots
            .write()
            .await
            .insert(event.id, Arc::new(Mutex::new(EventSlot::new(event.clone()))));

        tracing::info!(
            event_id = %event.id,
            title = event.title,
            capacity = event.capacity,
            "Event created"
        );
        Ok(event)
    }

    /// Fetch a single event.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::EventNotFound`] if there is no such event.
    pub async fn get(&self, event_id: EventId) -> Result<Event, RegistryError> {
        let slot = self.slot(event_id).await?;
        let guard = slot.lock().await;
        guard.live().cloned()
    }

    /// List events passing `filter`, ordered by date, then time, then id.
    pub async fn list(&self, filter: EventFilter) -> Vec<Event> {
        let mut events = Vec::new();
        for slot in self.all_slots().await {
            let guard = slot.lock().await;
            if let Ok(event) = guard.live() {
                if filter.matches(event) {
                    events.push(event.clone());
                }
            }
        }
        sort_by_schedule(&mut events);
        events
    }

    /// Delete an event that has no active registrations.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::EventNotFound`] if there is no such event,
    /// or [`RegistryError::EventInUse`] if registrations still reference it.
    pub async fn delete(&self, event_id: EventId) -> Result<(), RegistryError> {
        let slot = self.slot(event_id).await?;
        let mut guard = slot.lock().await;
        let registered = guard.live()?.registered;
        if registered > 0 {
            tracing::warn!(%event_id, registered, "Refusing to delete event with registrations");
            return Err(RegistryError::EventInUse {
                event_id,
                registered,
            });
        }

        guard.removed = true;
        self.slots.write().await.remove(&event_id);

        tracing::info!(%event_id, "Event deleted");
        Ok(())
    }

    /// Number of events in the store.
    pub async fn len(&self) -> usize {
        self.slots.read().await.len()
    }

    /// Whether the store holds no events.
    pub async fn is_empty(&self) -> bool {
        self.slots.read().await.is_empty()
    }

    /// The slot of one event. The map lock is released before returning.
    pub(crate) async fn slot(
        &self,
        event_id: EventId,
    ) -> Result<Arc<Mutex<EventSlot>>, RegistryError> {
        self.slots
            .read()
            .await
            .get(&event_id)
            .cloned()
            .ok_or(RegistryError::EventNotFound(event_id))
    }

    /// Every slot, in event id order. The map lock is released before
    /// returning.
    pub(crate) async fn all_slots(&self) -> Vec<Arc<Mutex<EventSlot>>> {
        self.slots.read().await.values().cloned().collect()
    }

    /// Read guard over the slot map, for callers that must see the set of
    /// live events and the ledger book at the same instant.
    pub(crate) async fn slot_map(
        &self,
    ) -> RwLockReadGuard<'_, BTreeMap<EventId, Arc<Mutex<EventSlot>>>> {
        self.slots.read().await
    }
}

/// Order events by date, then start time, then id.
pub fn sort_by_schedule(events: &mut [Event]) {
    events.sort_by(|a, b| (a.date, a.time, a.id).cmp(&(b.date, b.time, b.id)));
}
