//! Operations on the `events` table.
//!
//! The seat counter `registered` is never written here except by
//! [`RegistrationStore`](crate::RegistrationStore), which changes it in the
//! same transaction as the registration row.

use campus_registry::RegistryError;
use campus_types::{Category, Event, EventFilter, EventId, NewEvent};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::DbError;

/// Columns selected for an [`EventRow`].
pub(crate) const EVENT_COLUMNS: &str =
    "id, title, description, date, time, location, category, capacity, registered, created_at";

/// Operations on the `events` table.
pub struct EventStore<'a> {
    pool: &'a PgPool,
}

impl<'a> EventStore<'a> {
    /// Create an event store bound to a connection pool.
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Validate `draft` and insert it as a new event with no registrations.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Rejected`] with a validation error for a bad draft,
    /// or [`DbError::Postgres`] if the insert fails.
    pub async fn insert(&self, draft: NewEvent) -> Result<Event, DbError> {
        let event = draft.into_event().map_err(RegistryError::from)?;

        sqlx::query(
            r"INSERT INTO events (id, title, description, date, time, location, category, capacity, registered, created_at)
              VALUES ($1, $2, $3, $4, $5, $6, $7, $8, 0, $9)",
        )
        .bind(event.id.into_inner())
        .bind(&event.title)
        .bind(&event.description)
        .bind(event.date)
        .bind(event.time)
        .bind(&event.location)
        .bind(event.category.as_str())
        .bind(to_db_count(event.capacity)?)
        .bind(event.created_at)
        .execute(self.pool)
        .await?;

        tracing::info!(
            event_id = %event.id,
            title = event.title,
            capacity = event.capacity,
            "Event created"
        );
        Ok(event)
    }

    /// Fetch one event.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Rejected`] with `EventNotFound` if there is no such
    /// event.
    pub async fn get(&self, event_id: EventId) -> Result<Event, DbError> {
        let row = sqlx::query_as::<_, EventRow>(&format!(
            "SELECT {EVENT_COLUMNS} FROM events WHERE id = $1"
        ))
        .bind(event_id.into_inner())
        .fetch_optional(self.pool)
        .await?;

        row.ok_or(RegistryError::EventNotFound(event_id))?
            .try_into()
    }

    /// List events passing `filter`, ordered by date, then time, then id.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the query fails.
    pub async fn list(&self, filter: EventFilter) -> Result<Vec<Event>, DbError> {
        let rows = sqlx::query_as::<_, EventRow>(&format!(
            r"SELECT {EVENT_COLUMNS} FROM events
              WHERE $1::TEXT IS NULL OR category = $1
              ORDER BY date, time, id"
        ))
        .bind(filter.category.map(Category::as_str))
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(Event::try_from).collect()
    }

    /// Delete an event that has no active registrations.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Rejected`] with `EventNotFound` if there is no such
    /// event, or with `EventInUse` if registrations still reference it.
    pub async fn delete(&self, event_id: EventId) -> Result<(), DbError> {
        let deleted = sqlx::query("DELETE FROM events WHERE id = $1 AND registered = 0")
            .bind(event_id.into_inner())
            .execute(self.pool)
            .await?;

        if deleted.rows_affected() == 0 {
            let event = self.get(event_id).await?;
            tracing::warn!(
                %event_id,
                registered = event.registered,
                "Refusing to delete event with registrations"
            );
            return Err(RegistryError::EventInUse {
                event_id,
                registered: event.registered,
            }
            .into());
        }

        tracing::info!(%event_id, "Event deleted");
        Ok(())
    }
}

/// A row from the `events` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct EventRow {
    /// Event UUID.
    pub id: Uuid,
    /// Title.
    pub title: String,
    /// Description.
    pub description: String,
    /// Calendar day.
    pub date: NaiveDate,
    /// Start time.
    pub time: NaiveTime,
    /// Venue.
    pub location: String,
    /// Category wire name.
    pub category: String,
    /// Seat count.
    pub capacity: i32,
    /// Active registrations.
    pub registered: i32,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl TryFrom<EventRow> for Event {
    type Error = DbError;

    fn try_from(row: EventRow) -> Result<Self, Self::Error> {
        let category = Category::parse(&row.category)
            .ok_or_else(|| DbError::Decode(format!("unknown category {:?}", row.category)))?;
        Ok(Self {
            id: EventId::from(row.id),
            title: row.title,
            description: row.description,
            date: row.date,
            time: row.time,
            location: row.location,
            category,
            capacity: from_db_count(row.capacity)?,
            registered: from_db_count(row.registered)?,
            created_at: row.created_at,
        })
    }
}

/// Convert a seat count to the `INTEGER` column type.
pub(crate) fn to_db_count(n: u32) -> Result<i32, DbError> {
    i32::try_from(n).map_err(|e| DbError::Decode(format!("seat count {n} out of range: {e}")))
}

/// Convert an `INTEGER` column back to a seat count.
pub(crate) fn from_db_count(n: i32) -> Result<u32, DbError> {
    u32::try_from(n).map_err(|e| DbError::Decode(format!("negative seat count {n}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(category: &str, registered: i32) -> EventRow {
        EventRow {
            id: Uuid::now_v7(),
            title: String::from("Film Night"),
            description: String::new(),
            date: NaiveDate::from_ymd_opt(2026, 10, 30).unwrap_or_default(),
            time: NaiveTime::from_hms_opt(21, 0, 0).unwrap_or_default(),
            location: String::from("Cinema Hall"),
            category: category.to_owned(),
            capacity: 80,
            registered,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn row_converts_to_event() {
        let event = Event::try_from(row("sosyal", 12));
        assert!(event.is_ok());
        if let Ok(e) = event {
            assert_eq!(e.category, Category::Social);
            assert_eq!(e.capacity, 80);
            assert_eq!(e.registered, 12);
        }
    }

    #[test]
    fn unknown_category_is_corrupt() {
        assert!(matches!(
            Event::try_from(row("concert", 0)),
            Err(DbError::Decode(_))
        ));
    }

    #[test]
    fn negative_counter_is_corrupt() {
        assert!(matches!(
            Event::try_from(row("social", -1)),
            Err(DbError::Decode(_))
        ));
    }

    #[test]
    fn oversized_capacity_is_rejected() {
        assert!(to_db_count(u32::MAX).is_err());
        assert_eq!(to_db_count(150).ok(), Some(150));
    }
}
