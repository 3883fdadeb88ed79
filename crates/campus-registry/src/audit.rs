//! Seat-accounting audit.
//!
//! Given a consistent snapshot of every event and every active
//! registration, the audit checks three laws:
//!
//! ```text
//! for each event E:
//!   E.registered == count(registrations with event_id == E.id)
//!   E.registered <= E.capacity
//! for each (event, user):
//!   count(registrations) <= 1
//! ```
//!
//! It also reports registrations whose event no longer exists. Both
//! backends produce their snapshot under a lock or a repeatable-read
//! transaction, so a violation here points at a real accounting bug.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use campus_types::{Event, EventId, Registration, RegistrationId, UserId};
use serde::Serialize;

/// The outcome of an audit run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "violations", rename_all = "snake_case")]
pub enum AuditResult {
    /// Every law holds.
    Consistent,
    /// One or more laws are broken.
    Violations(Vec<InvariantViolation>),
}

impl AuditResult {
    /// Whether every law holds.
    pub const fn is_consistent(&self) -> bool {
        matches!(self, Self::Consistent)
    }
}

/// A single broken accounting law.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InvariantViolation {
    /// The stored seat counter disagrees with the registrations.
    CountMismatch {
        /// The event.
        event_id: EventId,
        /// Its stored counter.
        registered: u32,
        /// Number of registrations that reference it.
        actual: u32,
    },
    /// More seats are taken than the event has.
    OverCapacity {
        /// The event.
        event_id: EventId,
        /// Its stored counter.
        registered: u32,
        /// Its capacity.
        capacity: u32,
    },
    /// A user holds more than one seat at the same event.
    DuplicateSeat {
        /// The event.
        event_id: EventId,
        /// The user.
        user_id: UserId,
        /// Number of registrations for the pair.
        count: u32,
    },
    /// A registration references an event that does not exist.
    OrphanedRegistration {
        /// The registration.
        registration_id: RegistrationId,
        /// The missing event.
        event_id: EventId,
    },
}

impl fmt::Display for InvariantViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CountMismatch {
                event_id,
                registered,
                actual,
            } => write!(
                f,
                "event {event_id} counts {registered} seat(s) but has {actual} registration(s)"
            ),
            Self::OverCapacity {
                event_id,
                registered,
                capacity,
            } => write!(
                f,
                "event {event_id} has {registered} registration(s) for {capacity} seat(s)"
            ),
            Self::DuplicateSeat {
                event_id,
                user_id,
                count,
            } => write!(
                f,
                "user {user_id} holds {count} registrations for event {event_id}"
            ),
            Self::OrphanedRegistration {
                registration_id,
                event_id,
            } => write!(
                f,
                "registration {registration_id} references missing event {event_id}"
            ),
        }
    }
}

/// Check the seat-accounting laws over a snapshot.
pub fn verify_invariants(events: &[Event], registrations: &[Registration]) -> AuditResult {
    let mut per_event: BTreeMap<EventId, u32> = BTreeMap::new();
    let mut per_seat: BTreeMap<(EventId, UserId), u32> = BTreeMap::new();

    for reg in registrations {
        let n = per_event.entry(reg.event_id).or_insert(0);
        *n = n.saturating_add(1);
        let n = per_seat.entry((reg.event_id, reg.user_id)).or_insert(0);
        *n = n.saturating_add(1);
    }

    let mut violations = Vec::new();

    for event in events {
        let actual = per_event.get(&event.id).copied().unwrap_or(0);
        if event.registered != actual {
            violations.push(InvariantViolation::CountMismatch {
                event_id: event.id,
                registered: event.registered,
                actual,
            });
        }
        if event.registered > event.capacity {
            violations.push(InvariantViolation::OverCapacity {
                event_id: event.id,
                registered: event.registered,
                capacity: event.capacity,
            });
        }
    }

    for ((event_id, user_id), count) in per_seat {
        if count > 1 {
            violations.push(InvariantViolation::DuplicateSeat {
                event_id,
                user_id,
                count,
            });
        }
    }

    let known: BTreeSet<EventId> = events.iter().map(|e| e.id).collect();
    for reg in registrations {
        if !known.contains(&reg.event_id) {
            violations.push(InvariantViolation::OrphanedRegistration {
                registration_id: reg.id,
                event_id: reg.event_id,
            });
        }
    }

    if violations.is_empty() {
        AuditResult::Consistent
    } else {
        for v in &violations {
            tracing::error!(violation = %v, "Seat accounting violation");
        }
        AuditResult::Violations(violations)
    }
}
