//! Operations on the `registrations` table and the seat counter.
//!
//! Registration and cancellation each run in one transaction that changes
//! the registration row and `events.registered` together:
//!
//! ```text
//! register:
//!   UPDATE events SET registered = registered + 1
//!     WHERE id = $event AND registered < capacity      -- row lock, seat claimed
//!   INSERT INTO registrations ... ON CONFLICT DO NOTHING
//!   COMMIT   (or drop the transaction: both writes roll back)
//!
//! cancel:
//!   DELETE FROM registrations WHERE id = $reg RETURNING event_id
//!   UPDATE events SET registered = registered - 1 WHERE id = $event
//!   COMMIT
//! ```
//!
//! The conditional `UPDATE` takes the event's row lock, so concurrent
//! registrations for the same event queue behind each other and re-check
//! the capacity predicate against the committed counter.

use campus_registry::RegistryError;
use campus_types::{EventId, Registration, RegistrationId, UserId};
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::DbError;
use crate::event_store::EventStore;

/// Operations on the `registrations` table.
pub struct RegistrationStore<'a> {
    pool: &'a PgPool,
}

impl<'a> RegistrationStore<'a> {
    /// Create a registration store bound to a connection pool.
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Give `user_id` a seat at `event_id`.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Rejected`] with `EventNotFound`,
    /// `CapacityExceeded` or `DuplicateRegistration`; in each case nothing
    /// was written.
    pub async fn register(
        &self,
        event_id: EventId,
        user_id: UserId,
    ) -> Result<Registration, DbError> {
        let mut tx = self.pool.begin().await?;

        let claimed: Option<(i32,)> = sqlx::query_as(
            r"UPDATE events SET registered = registered + 1
              WHERE id = $1 AND registered < capacity
              RETURNING registered",
        )
        .bind(event_id.into_inner())
        .fetch_optional(&mut *tx)
        .await?;

        let Some((registered,)) = claimed else {
            drop(tx);
            let event = EventStore::new(self.pool).get(event_id).await?;
            tracing::warn!(%event_id, %user_id, capacity = event.capacity, "Registration rejected: event full");
            return Err(RegistryError::CapacityExceeded {
                event_id,
                capacity: event.capacity,
            }
            .into());
        };

        let registration = Registration::new(event_id, user_id);
        let inserted: Option<(Uuid,)> = sqlx::query_as(
            r"INSERT INTO registrations (id, event_id, user_id, created_at)
              VALUES ($1, $2, $3, $4)
              ON CONFLICT (event_id, user_id) DO NOTHING
              RETURNING id",
        )
        .bind(registration.id.into_inner())
        .bind(event_id.into_inner())
        .bind(user_id.into_inner())
        .bind(registration.created_at)
        .fetch_optional(&mut *tx)
        .await?;

        if inserted.is_none() {
            tx.rollback().await?;
            tracing::warn!(%event_id, %user_id, "Duplicate registration rejected");
            return Err(RegistryError::DuplicateRegistration { event_id, user_id }.into());
        }

        tx.commit().await?;

        tracing::info!(
            registration_id = %registration.id,
            %event_id,
            %user_id,
            registered,
            "Registration created"
        );
        Ok(registration)
    }

    /// Release the seat held by `registration_id`.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Rejected`] with `RegistrationNotFound` if there is
    /// no such registration.
    pub async fn cancel(&self, registration_id: RegistrationId) -> Result<(), DbError> {
        let mut tx = self.pool.begin().await?;

        let removed: Option<(Uuid,)> =
            sqlx::query_as("DELETE FROM registrations WHERE id = $1 RETURNING event_id")
                .bind(registration_id.into_inner())
                .fetch_optional(&mut *tx)
                .await?;

        let Some((event_uuid,)) = removed else {
            return Err(RegistryError::RegistrationNotFound(registration_id).into());
        };
        let event_id = EventId::from(event_uuid);

        let released: Option<(i32,)> = sqlx::query_as(
            r"UPDATE events SET registered = registered - 1
              WHERE id = $1 AND registered > 0
              RETURNING registered",
        )
        .bind(event_uuid)
        .fetch_optional(&mut *tx)
        .await?;

        let Some((registered,)) = released else {
            tx.rollback().await?;
            return Err(DbError::Decode(format!(
                "event {event_id} has no seats to release for registration {registration_id}"
            )));
        };

        tx.commit().await?;

        tracing::info!(%registration_id, %event_id, registered, "Registration cancelled");
        Ok(())
    }

    /// Fetch one registration.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Rejected`] with `RegistrationNotFound` if there is
    /// no such registration.
    pub async fn get(&self, registration_id: RegistrationId) -> Result<Registration, DbError> {
        let row = sqlx::query_as::<_, RegistrationRow>(
            "SELECT id, event_id, user_id, created_at FROM registrations WHERE id = $1",
        )
        .bind(registration_id.into_inner())
        .fetch_optional(self.pool)
        .await?;

        Ok(row
            .ok_or(RegistryError::RegistrationNotFound(registration_id))?
            .into())
    }

    /// Registrations held by `user_id`, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the query fails.
    pub async fn list_by_user(&self, user_id: UserId) -> Result<Vec<Registration>, DbError> {
        let rows = sqlx::query_as::<_, RegistrationRow>(
            r"SELECT id, event_id, user_id, created_at FROM registrations
              WHERE user_id = $1
              ORDER BY created_at DESC, id DESC",
        )
        .bind(user_id.into_inner())
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Registration::from).collect())
    }

    /// Registrations for `event_id`, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Rejected`] with `EventNotFound` if the event does
    /// not exist.
    pub async fn list_by_event(&self, event_id: EventId) -> Result<Vec<Registration>, DbError> {
        EventStore::new(self.pool).get(event_id).await?;

        let rows = sqlx::query_as::<_, RegistrationRow>(
            r"SELECT id, event_id, user_id, created_at FROM registrations
              WHERE event_id = $1
              ORDER BY created_at, id",
        )
        .bind(event_id.into_inner())
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Registration::from).collect())
    }

    /// Number of active registrations for `event_id`, counted from rows.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the query fails.
    pub async fn count_for_event(&self, event_id: EventId) -> Result<u32, DbError> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM registrations WHERE event_id = $1")
                .bind(event_id.into_inner())
                .fetch_one(self.pool)
                .await?;
        u32::try_from(count)
            .map_err(|e| DbError::Decode(format!("registration count {count}: {e}")))
    }
}

/// A row from the `registrations` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RegistrationRow {
    /// Registration UUID.
    pub id: Uuid,
    /// Event UUID.
    pub event_id: Uuid,
    /// User UUID.
    pub user_id: Uuid,
    /// When the registration was made.
    pub created_at: DateTime<Utc>,
}

impl From<RegistrationRow> for Registration {
    fn from(row: RegistrationRow) -> Self {
        Self {
            id: RegistrationId::from(row.id),
            event_id: EventId::from(row.event_id),
            user_id: UserId::from(row.user_id),
            created_at: row.created_at,
        }
    }
}
