//! [`CampusStore`] over `PostgreSQL`.

use async_trait::async_trait;
use campus_registry::{AuditResult, CampusStore, RegistryError, verify_invariants};
use campus_types::{
    Event, EventFilter, EventId, NewEvent, NewUser, Registration, RegistrationId, User, UserId,
};

use crate::error::DbError;
use crate::event_store::{EVENT_COLUMNS, EventRow, EventStore};
use crate::postgres::PostgresPool;
use crate::registration_store::{RegistrationRow, RegistrationStore};
use crate::user_store::UserStore;

/// Durable backend. Seat accounting is enforced by transactions and the
/// schema's `CHECK` and `UNIQUE` constraints.
#[derive(Debug, Clone)]
pub struct PgCampusStore {
    db: PostgresPool,
}

impl PgCampusStore {
    /// Wrap a connected pool. Migrations must already have run.
    pub const fn new(db: PostgresPool) -> Self {
        Self { db }
    }

    /// The underlying pool.
    pub const fn db(&self) -> &PostgresPool {
        &self.db
    }

    fn events(&self) -> EventStore<'_> {
        EventStore::new(self.db.pool())
    }

    fn registrations(&self) -> RegistrationStore<'_> {
        RegistrationStore::new(self.db.pool())
    }

    fn users(&self) -> UserStore<'_> {
        UserStore::new(self.db.pool())
    }

    /// Load every event and registration from one repeatable-read snapshot.
    async fn snapshot(&self) -> Result<(Vec<Event>, Vec<Registration>), DbError> {
        let mut tx = self.db.pool().begin().await?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ READ ONLY")
            .execute(&mut *tx)
            .await?;

        let event_rows =
            sqlx::query_as::<_, EventRow>(&format!("SELECT {EVENT_COLUMNS} FROM events"))
                .fetch_all(&mut *tx)
                .await?;
        let registration_rows = sqlx::query_as::<_, RegistrationRow>(
            "SELECT id, event_id, user_id, created_at FROM registrations",
        )
        .fetch_all(&mut *tx)
        .await?;
        tx.commit().await?;

        let events = event_rows
            .into_iter()
            .map(Event::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        let registrations = registration_rows
            .into_iter()
            .map(Registration::from)
            .collect();
        Ok((events, registrations))
    }
}

#[async_trait]
impl CampusStore for PgCampusStore {
    async fn create_event(&self, draft: NewEvent) -> Result<Event, RegistryError> {
        self.events().insert(draft).await.map_err(RegistryError::from)
    }

    async fn get_event(&self, event_id: EventId) -> Result<Event, RegistryError> {
        self.events().get(event_id).await.map_err(RegistryError::from)
    }

    async fn list_events(&self, filter: EventFilter) -> Result<Vec<Event>, RegistryError> {
        self.events().list(filter).await.map_err(RegistryError::from)
    }

    async fn delete_event(&self, event_id: EventId) -> Result<(), RegistryError> {
        self.events().delete(event_id).await.map_err(RegistryError::from)
    }

    async fn register(
        &self,
        event_id: EventId,
        user_id: UserId,
    ) -> Result<Registration, RegistryError> {
        self.registrations().register(event_id, user_id).await.map_err(RegistryError::from)
    }

    async fn cancel(&self, registration_id: RegistrationId) -> Result<(), RegistryError> {
        self.registrations().cancel(registration_id).await.map_err(RegistryError::from)
    }

    async fn get_registration(
        &self,
        registration_id: RegistrationId,
    ) -> Result<Registration, RegistryError> {
        self.registrations().get(registration_id).await.map_err(RegistryError::from)
    }

    async fn list_by_user(&self, user_id: UserId) -> Result<Vec<Registration>, RegistryError> {
        self.registrations().list_by_user(user_id).await.map_err(RegistryError::from)
    }

    async fn list_by_event(&self, event_id: EventId) -> Result<Vec<Registration>, RegistryError> {
        self.registrations().list_by_event(event_id).await.map_err(RegistryError::from)
    }

    async fn create_user(&self, input: NewUser) -> Result<User, RegistryError> {
        self.users().insert(input).await.map_err(RegistryError::from)
    }

    async fn get_user(&self, user_id: UserId) -> Result<User, RegistryError> {
        self.users().get(user_id).await.map_err(RegistryError::from)
    }

    async fn find_user_by_student_no(&self, student_no: &str) -> Result<User, RegistryError> {
        self.users()
            .get_by_student_no(student_no)
            .await
            .map_err(RegistryError::from)
    }

    async fn list_users(&self) -> Result<Vec<User>, RegistryError> {
        self.users().list().await.map_err(RegistryError::from)
    }

    async fn audit(&self) -> Result<AuditResult, RegistryError> {
        let (events, registrations) = self.snapshot().await?;
        Ok(verify_invariants(&events, &registrations))
    }
}
