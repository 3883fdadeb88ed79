//! Core entity structs: events, registrations and user accounts.
//!
//! Field names serialize in camelCase so the browser client can read
//! `eventId`, `userId` and `studentNo` directly.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::{Category, Role};
use crate::ids::{EventId, RegistrationId, UserId};

// ---------------------------------------------------------------------------
// Event
// ---------------------------------------------------------------------------

/// A schedulable campus activity with a finite number of seats.
///
/// `registered` is owned by the registration ledger: it is only ever
/// changed by a registration or a cancellation, one seat at a time, and
/// always satisfies `registered <= capacity`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct Event {
    /// Stable event identifier.
    pub id: EventId,
    /// Short human-readable title.
    pub title: String,
    /// Free-form description (may be empty).
    pub description: String,
    /// Calendar day the event takes place.
    pub date: NaiveDate,
    /// Start time on that day.
    pub time: NaiveTime,
    /// Where the event takes place.
    pub location: String,
    /// Kind of activity.
    pub category: Category,
    /// Maximum number of active registrations. Always positive.
    pub capacity: u32,
    /// Current number of active registrations.
    pub registered: u32,
    /// When the event was created.
    pub created_at: DateTime<Utc>,
}

impl Event {
    /// Whether every seat is taken.
    pub const fn is_full(&self) -> bool {
        self.registered >= self.capacity
    }

    /// Number of seats still available.
    pub const fn seats_left(&self) -> u32 {
        self.capacity.saturating_sub(self.registered)
    }
}

// ---------------------------------------------------------------------------
// Registration
// ---------------------------------------------------------------------------

/// One user's claim on one seat of one event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct Registration {
    /// Registration identifier.
    pub id: RegistrationId,
    /// The event the seat belongs to.
    pub event_id: EventId,
    /// The user holding the seat.
    pub user_id: UserId,
    /// When the registration was made. Serialized as `date`.
    #[serde(rename = "date")]
    pub created_at: DateTime<Utc>,
}

impl Registration {
    /// Create a registration stamped with the current time.
    pub fn new(event_id: EventId, user_id: UserId) -> Self {
        Self {
            id: RegistrationId::new(),
            event_id,
            user_id,
            created_at: Utc::now(),
        }
    }
}

// ---------------------------------------------------------------------------
// User
// ---------------------------------------------------------------------------

/// A user account (student or administrator).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct User {
    /// Account identifier. This is the value sent in `X-User-Id`.
    pub id: UserId,
    /// Full name.
    pub name: String,
    /// University student number. Unique across accounts.
    pub student_no: String,
    /// Contact phone number, if given.
    pub phone_no: Option<String>,
    /// Account role.
    pub role: Role,
    /// When the account was created.
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Whether this account may manage events and accounts.
    pub const fn is_admin(&self) -> bool {
        matches!(self.role, Role::Admin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_event(capacity: u32, registered: u32) -> Event {
        Event {
            id: EventId::new(),
            title: String::from("Rust Workshop"),
            description: String::new(),
            date: NaiveDate::from_ymd_opt(2026, 11, 3).unwrap_or_default(),
            time: NaiveTime::from_hms_opt(14, 0, 0).unwrap_or_default(),
            location: String::from("Hall B"),
            category: Category::Academic,
            capacity,
            registered,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn full_event_has_no_seats_left() {
        let event = sample_event(2, 2);
        assert!(event.is_full());
        assert_eq!(event.seats_left(), 0);

        let open = sample_event(3, 1);
        assert!(!open.is_full());
        assert_eq!(open.seats_left(), 2);
    }

    #[test]
    fn registration_serializes_camel_case_with_date() {
        let reg = Registration::new(EventId::new(), UserId::new());
        let json = serde_json::to_value(&reg).unwrap_or_default();
        assert!(json.get("eventId").is_some());
        assert!(json.get("userId").is_some());
        assert!(json.get("date").is_some());
        assert!(json.get("created_at").is_none());
    }

    #[test]
    fn event_serializes_registered_and_capacity() {
        let event = sample_event(40, 12);
        let json = serde_json::to_value(&event).unwrap_or_default();
        assert_eq!(json["capacity"], 40);
        assert_eq!(json["registered"], 12);
        assert_eq!(json["category"], "akademik");
        assert_eq!(json["date"], "2026-11-03");
    }
}
