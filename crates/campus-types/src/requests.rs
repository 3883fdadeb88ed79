//! Request payloads for creating events and accounts.
//!
//! Every field carries a serde default so a missing field reaches
//! validation and is reported by name, instead of failing deserialization
//! with an opaque message.

use chrono::{NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use ts_rs::TS;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::enums::{Category, Role};
use crate::ids::{EventId, UserId};
use crate::structs::{Event, User};

/// Maximum length of short text fields (title, location, name).
const MAX_SHORT_TEXT: u64 = 200;

/// Maximum length of an event description.
const MAX_DESCRIPTION: u64 = 4000;

/// Maximum length of a student or phone number.
const MAX_NUMBER_TEXT: u64 = 32;

/// Reject strings that are empty once surrounding whitespace is removed.
fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank"));
    }
    Ok(())
}

/// Build a single-field `required` error.
fn required(field: &'static str) -> ValidationErrors {
    let mut errors = ValidationErrors::new();
    errors.add(field, ValidationError::new("required"));
    errors
}

/// A seat count as clients send it: a JSON number, or the text of a form
/// field.
#[derive(Deserialize)]
#[serde(untagged)]
enum SeatCount {
    Number(u32),
    Text(String),
}

/// Read `capacity` from a number or a numeric string. A blank string counts
/// as missing so validation reports it by name.
fn seats_from_number_or_text<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<SeatCount>::deserialize(deserializer)? {
        None => Ok(None),
        Some(SeatCount::Number(seats)) => Ok(Some(seats)),
        Some(SeatCount::Text(text)) => {
            let text = text.trim();
            if text.is_empty() {
                return Ok(None);
            }
            text.parse().map(Some).map_err(|_| {
                serde::de::Error::custom(format!("capacity {text:?} is not a seat count"))
            })
        }
    }
}

// ---------------------------------------------------------------------------
// NewEvent
// ---------------------------------------------------------------------------

/// Administrator input for creating an event.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate, TS)]
#[serde(default, rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct NewEvent {
    /// Event title. Required, not blank.
    #[validate(length(min = 1, max = MAX_SHORT_TEXT), custom(function = "not_blank"))]
    pub title: String,
    /// Optional description.
    #[validate(length(max = MAX_DESCRIPTION))]
    pub description: String,
    /// Calendar day. Required.
    #[validate(required)]
    pub date: Option<NaiveDate>,
    /// Start time. Required.
    #[validate(required)]
    pub time: Option<NaiveTime>,
    /// Venue. Required, not blank.
    #[validate(length(min = 1, max = MAX_SHORT_TEXT), custom(function = "not_blank"))]
    pub location: String,
    /// Number of seats. Required, at least one. Sent as a number or as a
    /// numeric string.
    #[validate(required, range(min = 1))]
    #[serde(deserialize_with = "seats_from_number_or_text")]
    pub capacity: Option<u32>,
    /// Kind of activity. Defaults to [`Category::Other`].
    pub category: Category,
}

impl NewEvent {
    /// Validate the draft and build an [`Event`] with no registrations.
    ///
    /// Text fields are trimmed.
    pub fn into_event(self) -> Result<Event, ValidationErrors> {
        self.validate()?;

        let date = self.date.ok_or_else(|| required("date"))?;
        let time = self.time.ok_or_else(|| required("time"))?;
        let capacity = self.capacity.ok_or_else(|| required("capacity"))?;

        Ok(Event {
            id: EventId::new(),
            title: self.title.trim().to_owned(),
            description: self.description.trim().to_owned(),
            date,
            time,
            location: self.location.trim().to_owned(),
            category: self.category,
            capacity,
            registered: 0,
            created_at: Utc::now(),
        })
    }
}

// ---------------------------------------------------------------------------
// NewUser
// ---------------------------------------------------------------------------

/// Administrator input for creating a user account.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate, TS)]
#[serde(default, rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct NewUser {
    /// Full name. Required, not blank.
    #[validate(length(min = 1, max = MAX_SHORT_TEXT), custom(function = "not_blank"))]
    pub name: String,
    /// Student number. Required, not blank, unique.
    #[validate(length(min = 1, max = MAX_NUMBER_TEXT), custom(function = "not_blank"))]
    pub student_no: String,
    /// Contact phone number.
    #[validate(length(max = MAX_NUMBER_TEXT))]
    pub phone_no: Option<String>,
    /// Account role. Defaults to [`Role::Student`].
    pub role: Role,
}

impl NewUser {
    /// Validate the input and build a [`User`].
    ///
    /// Text fields are trimmed and an empty phone number becomes `None`.
    pub fn into_user(self) -> Result<User, ValidationErrors> {
        self.validate()?;

        let phone_no = self
            .phone_no
            .map(|p| p.trim().to_owned())
            .filter(|p| !p.is_empty());

        Ok(User {
            id: UserId::new(),
            name: self.name.trim().to_owned(),
            student_no: self.student_no.trim().to_owned(),
            phone_no,
            role: self.role,
            created_at: Utc::now(),
        })
    }
}

// ---------------------------------------------------------------------------
// Queries and commands
// ---------------------------------------------------------------------------

/// Filter for listing events.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventFilter {
    /// Only return events of this category.
    pub category: Option<Category>,
}

impl EventFilter {
    /// Whether `event` passes this filter.
    pub fn matches(&self, event: &Event) -> bool {
        self.category.is_none_or(|c| c == event.category)
    }
}

/// Body of a registration request. The registering user comes from the
/// request context, never from the body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct RegisterRequest {
    /// The event to take a seat in.
    pub event_id: EventId,
}
